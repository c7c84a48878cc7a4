use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use super::ports::OrderSink;
use crate::model::OrderGenerator;

/// Outcome of a loading run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Highest order identifier durably committed.
    pub rows_committed: u64,
    pub batches: u64,
    pub cancelled: bool,
}

/// The main application service that drives the load: generate a batch,
/// persist it, report progress, repeat until the target count is reached.
/// It is generic over the `OrderSink` port, allowing for dependency
/// injection.
pub struct BulkLoaderService<S: OrderSink> {
    generator: OrderGenerator,
    sink: S,
    target_count: u64,
    batch_size: u64,
    cancel: CancellationToken,
}

impl<S: OrderSink> BulkLoaderService<S> {
    pub fn new(generator: OrderGenerator, sink: S, target_count: u64, batch_size: u64) -> Self {
        BulkLoaderService {
            generator,
            sink,
            target_count,
            batch_size,
            cancel: CancellationToken::new(),
        }
    }

    /// The token is only checked between batches; a batch in flight always
    /// runs to its commit.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Executes the entire load, strictly sequentially: batch K is
    /// generated and committed before batch K+1 begins. The final batch is
    /// clamped so the last identifier equals the target count exactly.
    pub async fn run(&mut self) -> Result<LoadReport> {
        anyhow::ensure!(self.batch_size > 0, "batch size must be positive");

        let mut report = LoadReport {
            rows_committed: 0,
            batches: 0,
            cancelled: false,
        };

        let mut start_id = 1u64;
        while start_id <= self.target_count {
            if self.cancel.is_cancelled() {
                report.cancelled = true;
                tracing::warn!("Stopping after {} committed rows", report.rows_committed);
                break;
            }

            let count = self.batch_size.min(self.target_count - start_id + 1);
            let records = self.generator.generate_batch(start_id, count);
            self.sink
                .insert_batch(&records)
                .await
                .with_context(|| format!("failed to persist batch starting at order {start_id}"))?;

            let high_water = start_id + count - 1;
            report.rows_committed = high_water;
            report.batches += 1;
            tracing::info!("Inserted {high_water} rows");

            start_id += count;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GenerationProfile, OrderRecord};

    /// Records every batch it is handed, in order.
    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Vec<OrderRecord>>,
    }

    impl OrderSink for RecordingSink {
        async fn insert_batch(&mut self, records: &[OrderRecord]) -> Result<()> {
            self.batches.push(records.to_vec());
            Ok(())
        }
    }

    /// Fails once the given number of batches has been accepted.
    struct FailingSink {
        accepted: usize,
        fail_after: usize,
    }

    impl OrderSink for FailingSink {
        async fn insert_batch(&mut self, _records: &[OrderRecord]) -> Result<()> {
            if self.accepted == self.fail_after {
                anyhow::bail!("duplicate key on order_id");
            }
            self.accepted += 1;
            Ok(())
        }
    }

    fn service(target_count: u64, batch_size: u64) -> BulkLoaderService<RecordingSink> {
        let generator = OrderGenerator::seeded(GenerationProfile::default(), 7);
        BulkLoaderService::new(generator, RecordingSink::default(), target_count, batch_size)
    }

    fn batch_ids(batches: &[Vec<OrderRecord>]) -> Vec<Vec<u64>> {
        batches
            .iter()
            .map(|batch| batch.iter().map(|r| r.order_id).collect())
            .collect()
    }

    #[tokio::test]
    async fn final_batch_is_clamped_to_the_target() {
        let mut service = service(5, 2);
        let report = service.run().await.unwrap();

        assert_eq!(
            batch_ids(&service.sink.batches),
            vec![vec![1, 2], vec![3, 4], vec![5]]
        );
        assert_eq!(
            report,
            LoadReport {
                rows_committed: 5,
                batches: 3,
                cancelled: false
            }
        );
    }

    #[tokio::test]
    async fn remainder_batch_ends_exactly_at_the_target() {
        let mut service = service(120, 50);
        let report = service.run().await.unwrap();

        let sizes: Vec<usize> = service.sink.batches.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(service.sink.batches[2].last().unwrap().order_id, 120);
        assert_eq!(report.rows_committed, 120);
    }

    #[tokio::test]
    async fn exact_multiple_produces_no_remainder_batch() {
        let mut service = service(1_000_000, 50_000);
        let report = service.run().await.unwrap();

        assert_eq!(report.batches, 20);
        assert!(service.sink.batches.iter().all(|b| b.len() == 50_000));
        assert_eq!(report.rows_committed, 1_000_000);
    }

    #[tokio::test]
    async fn identifiers_cover_the_full_range_without_gaps() {
        let mut service = service(1_037, 100);
        service.run().await.unwrap();

        let ids: Vec<u64> = service
            .sink
            .batches
            .iter()
            .flatten()
            .map(|r| r.order_id)
            .collect();
        assert_eq!(ids, (1..=1_037).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn sink_failure_aborts_the_run() {
        let generator = OrderGenerator::seeded(GenerationProfile::default(), 7);
        let sink = FailingSink {
            accepted: 0,
            fail_after: 2,
        };
        let mut service = BulkLoaderService::new(generator, sink, 10, 3);

        let error = service.run().await.unwrap_err();
        assert!(error.to_string().contains("batch starting at order 7"));
        assert_eq!(service.sink.accepted, 2);
    }

    #[tokio::test]
    async fn cancellation_stops_between_batches() {
        let mut service = service(10, 3);
        service.cancellation_token().cancel();

        let report = service.run().await.unwrap();
        assert!(report.cancelled);
        assert_eq!(report.rows_committed, 0);
        assert!(service.sink.batches.is_empty());
    }

    #[tokio::test]
    async fn zero_batch_size_is_rejected() {
        let mut service = service(10, 0);
        assert!(service.run().await.is_err());
    }
}
