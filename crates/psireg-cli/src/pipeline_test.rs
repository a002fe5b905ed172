use psireg_core::Role;
use psireg_scraper::FetchOptions;
use wiremock::matchers::{method, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::*;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, d).unwrap()
}

fn pipeline(server: &MockServer, data_dir: &std::path::Path) -> Pipeline {
    let options = FetchOptions {
        timeout_secs: 5,
        user_agent: "psireg-test/0.1".to_owned(),
        max_concurrent: 2,
        max_retries: 0,
        backoff_base_ms: 0,
    };
    let client = RegisterClient::new(&server.uri(), &options).expect("failed to build test client");
    Pipeline::new(client, SnapshotStore::new(data_dir), 30)
}

fn pharmacy_block(reg: i64, name: &str, supervising: Option<&str>) -> String {
    let supervising = supervising.unwrap_or("N/A");
    format!(
        r#"<div class="result-item">
  <h3 class="result-name">{name}</h3>
  <p class="result-address">{reg} Main Street ,Tralee</p>
  <ul class="result-details">
    <li><span class="label">PSI Registration Number:</span><span class="value">{reg}</span></li>
    <li><span class="label">Superintendent Pharmacist:</span><span class="value">Sam Superintendent</span></li>
    <li><span class="label">Supervising Pharmacist:</span><span class="value">{supervising}</span></li>
    <li><span class="label">Opening Hours:</span>
      <ul class="value"><li>Monday: 09:00 to 18:00</li></ul>
    </li>
  </ul>
</div>"#
    )
}

fn page(blocks: &[String], page: u32, last: u32) -> String {
    format!(
        r#"<html><body>{}<div class="pagination"><h4>Page {page} of {last}</h4></div></body></html>"#,
        blocks.concat()
    )
}

async fn serve_pharmacy_pages(server: &MockServer, pages: &[String]) {
    server.reset().await;
    for (i, body) in pages.iter().enumerate() {
        Mock::given(method("GET"))
            .and(query_param("type", "0"))
            .and(query_param("page", (i + 1).to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.clone()))
            .mount(server)
            .await;
    }
}

fn options(date: NaiveDate, bootstrap: bool) -> ScrapeOptions {
    ScrapeOptions {
        date,
        bootstrap,
        force: false,
    }
}

fn count_containing(lines: &[String], needle: &str) -> usize {
    lines.iter().filter(|l| l.contains(needle)).count()
}

#[tokio::test]
async fn two_day_run_reports_each_transition_once() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    // day 11: 101 staffed, 102 vacant, 103 staffed, 104 staffed
    serve_pharmacy_pages(
        &server,
        &[
            page(
                &[
                    pharmacy_block(101, "Becomes Vacant Pharmacy", Some("Ann One")),
                    pharmacy_block(102, "Gets Filled Pharmacy", None),
                ],
                1,
                2,
            ),
            page(
                &[
                    pharmacy_block(103, "Closing Pharmacy", Some("Cat Three")),
                    pharmacy_block(104, "Steady Pharmacy", Some("Dan Four")),
                ],
                2,
                2,
            ),
        ],
    )
    .await;
    let first = pipeline.scrape(EntityKind::Pharmacy, &options(day(11), true)).await.unwrap();
    assert_eq!(first.records, 4);
    assert!(first.events.is_empty());

    // day 12: 101 vacant, 102 filled, 103 gone, 105 new
    serve_pharmacy_pages(
        &server,
        &[
            page(
                &[
                    pharmacy_block(101, "Becomes Vacant Pharmacy", None),
                    pharmacy_block(102, "Gets Filled Pharmacy", Some("Bea Two")),
                ],
                1,
                2,
            ),
            page(
                &[
                    pharmacy_block(104, "Steady Pharmacy", Some("Dan Four")),
                    pharmacy_block(105, "Brand New Pharmacy", Some("Eve Five")),
                ],
                2,
                2,
            ),
        ],
    )
    .await;
    let second = pipeline.scrape(EntityKind::Pharmacy, &options(day(12), false)).await.unwrap();
    assert!(second.lost_pages.is_empty());
    assert_eq!(second.records, 4);

    let log = std::fs::read_to_string(dir.path().join("pharmacy-events-2022-01-12.log")).unwrap();
    let lines: Vec<String> = log.lines().map(str::to_owned).collect();
    assert_eq!(lines, second.events);

    assert_eq!(count_containing(&lines, "NEW VACANCY"), 1);
    assert_eq!(count_containing(&lines, "VACANCY FILLED"), 1);
    assert_eq!(count_containing(&lines, "ADDED"), 1);
    assert_eq!(count_containing(&lines, "REMOVED"), 1);
    assert!(lines.iter().any(|l| l.starts_with("NEW VACANCY") && l.contains("#101")));
    assert!(lines.iter().any(|l| l.starts_with("VACANCY FILLED") && l.contains("#102")));
    assert!(lines.iter().any(|l| l.starts_with("ADDED") && l.contains("#105")));
    assert!(lines.iter().any(|l| l.starts_with("REMOVED") && l.contains("#103")));

    let store = SnapshotStore::new(dir.path());
    let snapshot: Vec<Pharmacy> = store
        .read_snapshot(EntityKind::Pharmacy, day(12))
        .unwrap()
        .unwrap();
    let by_reg = |reg: i64| snapshot.iter().find(|p| p.registration_number == reg).unwrap();

    assert_eq!(by_reg(101).vacant_since(Role::Supervising), Some(day(12)));
    assert_eq!(by_reg(102).vacant_since(Role::Supervising), None);
    assert_eq!(by_reg(104).vacant_since(Role::Supervising), None);
    assert_eq!(by_reg(101).address.as_deref(), Some("101 Main Street, Tralee"));
    assert_eq!(
        by_reg(104).opening_hours.as_ref().map(psireg_core::OpeningHours::weekly_hours),
        Some(9.0)
    );

    let diff = pipeline.diff(day(12)).unwrap();
    assert_eq!(
        diff,
        vec![
            "ADDED: Brand New Pharmacy, 105 Main Street, Tralee (#105)".to_owned(),
            "REMOVED: Closing Pharmacy, 103 Main Street, Tralee (#103)".to_owned(),
        ]
    );
}

#[tokio::test]
async fn vacancy_date_is_kept_on_later_runs() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());
    let vacant = vec![page(&[pharmacy_block(7, "Quiet Pharmacy", None)], 1, 1)];

    serve_pharmacy_pages(&server, &vacant).await;
    pipeline.scrape(EntityKind::Pharmacy, &options(day(11), true)).await.unwrap();
    let second = pipeline.scrape(EntityKind::Pharmacy, &options(day(12), false)).await.unwrap();
    let third = pipeline.scrape(EntityKind::Pharmacy, &options(day(13), false)).await.unwrap();
    assert!(second.events.is_empty());
    assert!(third.events.is_empty());

    let store = SnapshotStore::new(dir.path());
    let snapshot: Vec<Pharmacy> = store
        .read_snapshot(EntityKind::Pharmacy, day(13))
        .unwrap()
        .unwrap();
    assert_eq!(snapshot[0].vacant_since(Role::Supervising), Some(day(11)));
}

#[tokio::test]
async fn pharmacy_run_without_baseline_fails_unless_bootstrapping() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    let err = pipeline
        .scrape(EntityKind::Pharmacy, &options(day(12), false))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::NoBaseline { .. })
    ));
    assert!(!dir.path().join("pharmacy-data-2022-01-12.json").exists());

    serve_pharmacy_pages(&server, &[page(&[pharmacy_block(3, "First Day Pharmacy", None)], 1, 1)]).await;
    let summary = pipeline
        .scrape(EntityKind::Pharmacy, &options(day(12), true))
        .await
        .unwrap();
    assert_eq!(summary.records, 1);
    assert!(summary.events.is_empty());
    assert_eq!(summary.snapshot, dir.path().join("pharmacy-data-2022-01-12.json"));

    let store = SnapshotStore::new(dir.path());
    let snapshot: Vec<Pharmacy> = store
        .read_snapshot(EntityKind::Pharmacy, day(12))
        .unwrap()
        .unwrap();
    assert_eq!(snapshot[0].vacant_since(Role::Supervising), Some(day(12)));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("pharmacy-events-2022-01-12.log")).unwrap(),
        ""
    );
}

#[tokio::test]
async fn unmarked_vacancy_in_baseline_keeps_the_baseline_date() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    // an older snapshot written before vacancy markers existed
    let mut quiet = Pharmacy::new(7, "Quiet Pharmacy");
    quiet.superintendent_pharmacist = Some("Sam Superintendent".to_owned());
    SnapshotStore::new(dir.path())
        .write_snapshot(EntityKind::Pharmacy, day(11), &[quiet], false)
        .unwrap();

    serve_pharmacy_pages(&server, &[page(&[pharmacy_block(7, "Quiet Pharmacy", None)], 1, 1)]).await;
    let summary = pipeline
        .scrape(EntityKind::Pharmacy, &options(day(12), false))
        .await
        .unwrap();
    assert!(summary.events.is_empty(), "unexpected events: {:?}", summary.events);

    let store = SnapshotStore::new(dir.path());
    let snapshot: Vec<Pharmacy> = store
        .read_snapshot(EntityKind::Pharmacy, day(12))
        .unwrap()
        .unwrap();
    assert_eq!(snapshot[0].vacant_since(Role::Supervising), Some(day(11)));
    assert_eq!(snapshot[0].vacant_since(Role::Superintendent), None);
}

#[tokio::test]
async fn lost_page_keeps_its_pharmacies_and_markers() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    serve_pharmacy_pages(
        &server,
        &[
            page(&[pharmacy_block(201, "Front Page Pharmacy", Some("Ann One"))], 1, 2),
            page(&[pharmacy_block(202, "Back Page Pharmacy", None)], 2, 2),
        ],
    )
    .await;
    pipeline.scrape(EntityKind::Pharmacy, &options(day(11), true)).await.unwrap();

    server.reset().await;
    Mock::given(method("GET"))
        .and(query_param("type", "0"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[pharmacy_block(201, "Front Page Pharmacy", Some("Ann One"))],
            1,
            2,
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(query_param("type", "0"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let summary = pipeline
        .scrape(EntityKind::Pharmacy, &options(day(12), false))
        .await
        .unwrap();
    assert_eq!(summary.lost_pages, vec![2]);
    assert_eq!(summary.records, 2);
    assert_eq!(count_containing(&summary.events, "REMOVED"), 0);
    assert_eq!(count_containing(&summary.events, "ADDED"), 0);

    let store = SnapshotStore::new(dir.path());
    let snapshot: Vec<Pharmacy> = store
        .read_snapshot(EntityKind::Pharmacy, day(12))
        .unwrap()
        .unwrap();
    let carried = snapshot.iter().find(|p| p.registration_number == 202).unwrap();
    assert_eq!(carried.vacant_since(Role::Supervising), Some(day(11)));
}

#[tokio::test]
async fn existing_snapshot_needs_force() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());
    serve_pharmacy_pages(&server, &[page(&[pharmacy_block(1, "Only Pharmacy", Some("A"))], 1, 1)]).await;

    pipeline.scrape(EntityKind::Pharmacy, &options(day(12), true)).await.unwrap();
    let err = pipeline
        .scrape(EntityKind::Pharmacy, &options(day(12), true))
        .await
        .unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::SnapshotExists { .. })
    ));

    let forced = ScrapeOptions {
        force: true,
        ..options(day(12), true)
    };
    pipeline.scrape(EntityKind::Pharmacy, &forced).await.unwrap();
}

#[tokio::test]
async fn person_register_needs_no_baseline_and_drops_duplicates() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let pipeline = pipeline(&server, dir.path());

    let person = |name: &str, reg: i64| {
        format!(
            r#"<div class="result-item">
  <h3 class="result-name">{name}</h3>
  <p class="result-address"><!-- 1 Quay Street<br>Galway --></p>
  <ul class="result-details">
    <li><span class="label">Registration Number:</span><span class="value">{reg}</span></li>
  </ul>
</div>"#
        )
    };
    Mock::given(method("GET"))
        .and(query_param("type", "1"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(
            &[person("Jane Doe", 11), person("Jane Doe Again", 11), person("Joe Bloggs", 12)],
            1,
            1,
        )))
        .mount(&server)
        .await;

    let summary = pipeline
        .scrape(EntityKind::Pharmacist, &options(day(12), false))
        .await
        .unwrap();
    assert_eq!(summary.records, 2);
    assert!(summary.events.is_empty());

    let store = SnapshotStore::new(dir.path());
    let people: Vec<Person> = store
        .read_snapshot(EntityKind::Pharmacist, day(12))
        .unwrap()
        .unwrap();
    assert_eq!(people[0].name, "Jane Doe");
    assert_eq!(people[0].address.as_deref(), Some("1 Quay Street, Galway"));
    assert_eq!(people[1].registration_number, Some(12));
}

#[test]
fn carry_forward_adds_only_unseen_pharmacies() {
    let mut records = vec![Pharmacy::new(1, "Seen Today")];
    let previous = vec![Pharmacy::new(1, "Seen Yesterday"), Pharmacy::new(2, "Unseen")];
    assert_eq!(carry_forward_unseen(&mut records, &previous), 1);
    let names: Vec<&str> = records.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Seen Today", "Unseen"]);
}

#[test]
fn dedupe_keeps_first_occurrence() {
    let records = vec![
        Pharmacy::new(1, "First"),
        Pharmacy::new(2, "Other"),
        Pharmacy::new(1, "Second"),
    ];
    let kept = dedupe_by(records, EntityKind::Pharmacy, |p| Some(p.registration_number));
    let names: Vec<&str> = kept.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["First", "Other"]);
}
