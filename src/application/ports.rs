use crate::model::OrderRecord;

/// A contract for durably persisting one generated batch: a single
/// multi-row insert followed by a commit. On failure the batch is not
/// retried; whatever the storage layer's transaction semantics left
/// behind is final.
pub trait OrderSink {
    fn insert_batch(&mut self, records: &[OrderRecord])
    -> impl Future<Output = anyhow::Result<()>>;
}
