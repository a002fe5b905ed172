//! Concurrent multi-page fetches for `RegisterClient`.

use std::ops::RangeInclusive;

use futures::stream::{self, StreamExt};
use psireg_core::EntityKind;

use crate::pagination::{estimate_page_count, last_page_from_html};
use crate::types::{FetchedPage, PageBatch};

use super::RegisterClient;

impl RegisterClient {
    /// Fetches pages `1..=page_count` concurrently.
    ///
    /// At most `max_concurrent` requests are in flight at once. Pages arrive
    /// in completion order. A page that still fails after retries is logged
    /// and listed in [`PageBatch::lost_pages`]; the other pages are
    /// unaffected.
    pub async fn fetch_pages(&self, kind: EntityKind, page_count: u32) -> PageBatch {
        self.fetch_page_range(kind, 1..=page_count).await
    }

    /// Fetches every page in `pages` concurrently. See [`Self::fetch_pages`].
    pub async fn fetch_page_range(&self, kind: EntityKind, pages: RangeInclusive<u32>) -> PageBatch {
        let results: Vec<(u32, Option<String>)> = stream::iter(pages)
            .map(|page| async move {
                match self.fetch_page(kind, page).await {
                    Ok(html) => (page, Some(html)),
                    Err(err) => {
                        tracing::warn!(%kind, page, error = %err, "lost register page");
                        (page, None)
                    }
                }
            })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        let mut batch = PageBatch::default();
        for (page, html) in results {
            match html {
                Some(html) => batch.pages.push(FetchedPage { page, html }),
                None => batch.lost_pages.push(page),
            }
        }
        batch.lost_pages.sort_unstable();
        batch
    }

    /// Fetches a whole register.
    ///
    /// Page 1 is fetched first and its pagination footer gives the last page.
    /// If the footer is missing (or page 1 is lost) the page count is
    /// estimated from `previous_count`, the record count of the last
    /// snapshot. The remaining pages are then fetched concurrently.
    pub async fn fetch_register(&self, kind: EntityKind, previous_count: Option<usize>) -> PageBatch {
        let mut batch = self.fetch_page_range(kind, 1..=1).await;

        let discovered = batch
            .pages
            .first()
            .and_then(|first| last_page_from_html(&first.html));
        let page_count = match discovered {
            Some(count) => count,
            None => {
                let estimate = estimate_page_count(previous_count.unwrap_or(0));
                tracing::warn!(
                    %kind,
                    previous_count,
                    estimate,
                    "no pagination footer on page 1; estimating page count"
                );
                estimate
            }
        };
        tracing::info!(%kind, page_count, "fetching register pages");

        if page_count > 1 {
            batch.merge(self.fetch_page_range(kind, 2..=page_count).await);
        }
        batch.lost_pages.sort_unstable();
        batch
    }
}
