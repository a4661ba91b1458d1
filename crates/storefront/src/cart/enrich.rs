//! Record-detail enrichment.
//!
//! The cart endpoint only knows quantities and last-seen prices; current
//! price, stock, artwork, and group come from the catalog. Enrichment
//! launches one fetch per line - all at once, no deduplication, no assumed
//! completion order - and merges each snapshot into the first line with a
//! matching record id as the fetches settle. A fetch that fails or returns
//! nothing leaves its line at pre-enrichment values and still counts toward
//! completion, so enrichment always terminates.
//!
//! Dropping the returned future aborts every in-flight fetch; nothing can
//! touch the lines after teardown.

use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::warn;

use spindle_core::RecordId;

use super::backend::CatalogBackend;
use super::line::{CartLine, RecordSnapshot};

/// Enrich every line with its catalog snapshot.
///
/// Resolves once all fetches have settled (immediately for an empty cart).
/// The input vector is replaced wholesale on each merge; callers get a
/// fresh allocation, never a view into shared state.
pub async fn enrich_lines(
    catalog: Arc<dyn CatalogBackend>,
    lines: Vec<CartLine>,
) -> Vec<CartLine> {
    let total = lines.len();
    if total == 0 {
        return lines;
    }

    let mut fetches = JoinSet::new();
    for line in &lines {
        let catalog = Arc::clone(&catalog);
        let record_id = line.record_id;
        fetches.spawn(async move {
            let result = catalog.fetch_record(record_id).await;
            (record_id, result)
        });
    }

    let mut enriched = lines;
    let mut completed = 0usize;
    while let Some(settled) = fetches.join_next().await {
        completed += 1;
        match settled {
            Ok((record_id, Ok(Some(snapshot)))) => {
                enriched = merge_snapshot(enriched, record_id, &snapshot);
            }
            Ok((record_id, Ok(None))) => {
                warn!(%record_id, "no record details found");
            }
            Ok((record_id, Err(error))) => {
                warn!(%record_id, %error, "failed to load record details");
            }
            Err(join_error) => {
                warn!(%join_error, "record detail fetch task failed");
            }
        }
    }
    debug_assert_eq!(completed, total);

    enriched
}

/// Merge a snapshot into the first line with a matching record id,
/// replacing the sequence immutably. Empty or zero snapshot fields keep the
/// line's existing values; quantity is never touched, so the line total
/// stays derived from the existing quantity.
fn merge_snapshot(
    lines: Vec<CartLine>,
    record_id: RecordId,
    snapshot: &RecordSnapshot,
) -> Vec<CartLine> {
    let Some(index) = lines.iter().position(|line| line.record_id == record_id) else {
        return lines;
    };

    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == index {
                merged_line(line, snapshot)
            } else {
                line
            }
        })
        .collect()
}

fn merged_line(line: CartLine, snapshot: &RecordSnapshot) -> CartLine {
    CartLine {
        title: pick(&snapshot.title, &line.title),
        image_ref: pick(&snapshot.image_ref, &line.image_ref),
        unit_price: if snapshot.price.is_zero() {
            line.unit_price
        } else {
            snapshot.price
        },
        stock: snapshot.stock.or(line.stock),
        group_label: snapshot.group_label.clone(),
        record: Some(snapshot.clone()),
        ..line
    }
}

fn pick(fresh: &str, existing: &str) -> String {
    if fresh.is_empty() {
        existing.to_owned()
    } else {
        fresh.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use spindle_core::{CartId, CartLineId, Price};

    use super::super::backend::BackendError;
    use super::*;

    /// Catalog fake: canned snapshots per record id, everything else fails.
    struct FakeCatalog {
        snapshots: HashMap<i32, RecordSnapshot>,
        missing: Vec<i32>,
        fetches: AtomicU32,
        delay: Duration,
    }

    impl FakeCatalog {
        fn new() -> Self {
            Self {
                snapshots: HashMap::new(),
                missing: Vec::new(),
                fetches: AtomicU32::new(0),
                delay: Duration::ZERO,
            }
        }

        fn with_snapshot(mut self, record_id: i32, snapshot: RecordSnapshot) -> Self {
            self.snapshots.insert(record_id, snapshot);
            self
        }

        fn with_missing(mut self, record_id: i32) -> Self {
            self.missing.push(record_id);
            self
        }
    }

    #[async_trait]
    impl CatalogBackend for FakeCatalog {
        async fn fetch_record(
            &self,
            record_id: RecordId,
        ) -> Result<Option<RecordSnapshot>, BackendError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.missing.contains(&record_id.as_i32()) {
                return Ok(None);
            }
            self.snapshots
                .get(&record_id.as_i32())
                .cloned()
                .map(Some)
                .ok_or_else(|| BackendError::Transport("record service down".to_owned()))
        }
    }

    fn line(record_id: i32, quantity: u32, price: f64) -> CartLine {
        CartLine {
            line_id: CartLineId::new(record_id),
            cart_id: CartId::new(1),
            record_id: RecordId::new(record_id),
            quantity,
            unit_price: Price::from_f64_lossy(price),
            title: "Stale Title".to_owned(),
            image_ref: "img/stale.jpg".to_owned(),
            group_label: "N/A".to_owned(),
            stock: None,
            record: None,
        }
    }

    fn snapshot(title: &str, price: f64, stock: u32) -> RecordSnapshot {
        RecordSnapshot {
            title: title.to_owned(),
            image_ref: "img/fresh.jpg".to_owned(),
            price: Price::from_f64_lossy(price),
            stock: Some(stock),
            group_label: "Fresh Group".to_owned(),
        }
    }

    #[tokio::test]
    async fn test_empty_cart_completes_immediately() {
        let catalog = Arc::new(FakeCatalog::new());
        let enriched = enrich_lines(Arc::clone(&catalog) as Arc<dyn CatalogBackend>, vec![]).await;
        assert!(enriched.is_empty());
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_successful_merge() {
        let catalog = Arc::new(FakeCatalog::new().with_snapshot(1, snapshot("Fresh", 12.5, 9)));
        let enriched =
            enrich_lines(catalog as Arc<dyn CatalogBackend>, vec![line(1, 2, 10.0)]).await;

        assert_eq!(enriched[0].title, "Fresh");
        assert_eq!(enriched[0].unit_price, Price::from_f64_lossy(12.5));
        assert_eq!(enriched[0].stock, Some(9));
        assert_eq!(enriched[0].group_label, "Fresh Group");
        // Line total re-derives with the existing quantity.
        assert_eq!(enriched[0].line_total(), Price::from_f64_lossy(25.0));
        assert!(enriched[0].record.is_some());
    }

    #[tokio::test]
    async fn test_all_failing_fetches_still_terminate() {
        let catalog = Arc::new(FakeCatalog::new());
        let lines = vec![line(1, 1, 5.0), line(2, 1, 6.0)];
        let enriched = enrich_lines(
            Arc::clone(&catalog) as Arc<dyn CatalogBackend>,
            lines.clone(),
        )
        .await;

        assert_eq!(enriched, lines);
        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_null_snapshot_treated_as_failure() {
        let catalog = Arc::new(FakeCatalog::new().with_missing(1));
        let lines = vec![line(1, 1, 5.0)];
        let enriched = enrich_lines(catalog as Arc<dyn CatalogBackend>, lines.clone()).await;
        assert_eq!(enriched, lines);
    }

    #[tokio::test]
    async fn test_duplicate_record_ids_fetch_twice_first_match_merges() {
        let catalog = Arc::new(FakeCatalog::new().with_snapshot(1, snapshot("Fresh", 12.5, 9)));
        let lines = vec![line(1, 1, 5.0), line(1, 3, 5.0)];
        let enriched = enrich_lines(
            Arc::clone(&catalog) as Arc<dyn CatalogBackend>,
            lines,
        )
        .await;

        assert_eq!(catalog.fetches.load(Ordering::SeqCst), 2);
        // Both merges land on the first matching line.
        assert_eq!(enriched[0].title, "Fresh");
        assert_eq!(enriched[1].title, "Stale Title");
    }

    #[tokio::test]
    async fn test_partial_failure_leaves_other_lines_enriched() {
        let catalog = Arc::new(
            FakeCatalog::new()
                .with_snapshot(2, snapshot("Fresh Two", 8.0, 3)),
        );
        let enriched = enrich_lines(
            catalog as Arc<dyn CatalogBackend>,
            vec![line(1, 1, 5.0), line(2, 1, 6.0)],
        )
        .await;

        assert_eq!(enriched[0].title, "Stale Title");
        assert_eq!(enriched[1].title, "Fresh Two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_run_concurrently() {
        let mut catalog = FakeCatalog::new();
        catalog.delay = Duration::from_secs(1);
        for id in 1..=4 {
            catalog = catalog.with_snapshot(id, snapshot("Fresh", 1.0, 1));
        }
        let catalog = Arc::new(catalog);

        let lines = (1..=4).map(|id| line(id, 1, 1.0)).collect();
        let started = tokio::time::Instant::now();
        enrich_lines(catalog as Arc<dyn CatalogBackend>, lines).await;

        // Four one-second fetches overlapping, not back to back.
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_empty_snapshot_fields_keep_existing_values() {
        let sparse = RecordSnapshot {
            title: String::new(),
            image_ref: String::new(),
            price: Price::ZERO,
            stock: None,
            group_label: "N/A".to_owned(),
        };
        let catalog = Arc::new(FakeCatalog::new().with_snapshot(1, sparse));
        let enriched =
            enrich_lines(catalog as Arc<dyn CatalogBackend>, vec![line(1, 2, 10.0)]).await;

        assert_eq!(enriched[0].title, "Stale Title");
        assert_eq!(enriched[0].image_ref, "img/stale.jpg");
        assert_eq!(enriched[0].unit_price, Price::from_f64_lossy(10.0));
    }
}
