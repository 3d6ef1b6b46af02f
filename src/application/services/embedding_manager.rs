use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::application::RetryPolicy;
use crate::domain::{
    ports::EmbeddingProducer, CacheStatus, CancellationToken, Document, DocumentCorpus,
    DomainError, EmbeddingRecord, ReconcileReport,
};
use crate::infrastructure::VectorCache;

/// Brings the vector cache up to date with a corpus.
///
/// Only stale or missing documents are embedded, in fixed-size batches. Each
/// successful batch is written to the cache and persisted before the next one
/// starts, so a later failure never loses earlier progress. A batch that still
/// fails after retries, or cannot be persisted, is recorded in `failed_ids`
/// and skipped. Entries for documents that left the corpus are pruned.
///
/// Reconciliation and cache clearing are serialised by an internal lock;
/// readers of the cache are never blocked by it.
pub struct EmbeddingManager {
    producer: Arc<dyn EmbeddingProducer>,
    cache: Arc<VectorCache>,
    retry: RetryPolicy,
    batch_size: usize,
    writer: Mutex<()>,
}

impl EmbeddingManager {
    pub fn new(
        producer: Arc<dyn EmbeddingProducer>,
        cache: Arc<VectorCache>,
        retry: RetryPolicy,
        batch_size: usize,
    ) -> Self {
        Self {
            producer,
            cache,
            retry,
            batch_size: batch_size.max(1),
            writer: Mutex::new(()),
        }
    }

    pub fn cache(&self) -> &Arc<VectorCache> {
        &self.cache
    }

    #[instrument(skip(self, corpus), fields(documents = corpus.len()))]
    pub async fn reconcile(
        &self,
        corpus: &DocumentCorpus,
        force_regenerate: bool,
    ) -> Result<ReconcileReport, DomainError> {
        let _writer = self.writer.lock().await;
        let started = Instant::now();
        let mut report = ReconcileReport::default();

        let mut pending: Vec<&Document> = Vec::new();
        for doc in corpus.unique_documents() {
            if !force_regenerate && self.cache.is_fresh(doc) {
                report.reused_count += 1;
            } else {
                pending.push(doc);
            }
        }

        let batches = pending.len().div_ceil(self.batch_size);
        let cancel = CancellationToken::new();

        for (batch_no, batch) in pending.chunks(self.batch_size).enumerate() {
            let outcome = match self.embed_batch(batch, &cancel).await {
                Ok(records) => self.commit(records).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(()) => {
                    report.embedded_count += batch.len();
                    info!(
                        batch = batch_no + 1,
                        batches,
                        size = batch.len(),
                        "batch embedded"
                    );
                }
                Err(e) => {
                    warn!(
                        batch = batch_no + 1,
                        batches,
                        size = batch.len(),
                        error = %e,
                        "batch failed, continuing"
                    );
                    report
                        .failed_ids
                        .extend(batch.iter().map(|doc| doc.id.clone()));
                }
            }
        }

        // An empty corpus means ingestion produced nothing, not that every
        // document was deleted.
        if !corpus.is_empty() {
            report.removed_count = self.prune(corpus).await;
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            embedded = report.embedded_count,
            reused = report.reused_count,
            failed = report.failed_ids.len(),
            removed = report.removed_count,
            duration_ms = report.duration_ms,
            "reconciliation finished"
        );
        Ok(report)
    }

    /// Empties the cache and deletes its file.
    pub async fn clear_cache(&self) -> Result<(), DomainError> {
        let _writer = self.writer.lock().await;
        self.cache.clear().await
    }

    pub async fn cache_status(&self) -> CacheStatus {
        self.cache.status().await
    }

    /// Writes a batch and persists it. If the file cannot be written the batch
    /// is rolled back so memory never holds entries missing from disk.
    async fn commit(&self, records: Vec<EmbeddingRecord>) -> Result<(), DomainError> {
        let ids: Vec<String> = records.iter().map(|r| r.document_id.clone()).collect();
        let previous: Vec<EmbeddingRecord> =
            ids.iter().filter_map(|id| self.cache.get(id)).collect();

        self.cache.put_all(records)?;
        if let Err(e) = self.cache.persist().await {
            let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
            self.cache.remove(&ids);
            if let Err(restore) = self.cache.put_all(previous) {
                warn!(error = %restore, "could not restore previous entries");
            }
            return Err(e);
        }
        Ok(())
    }

    /// Drops entries for documents no longer in the corpus.
    async fn prune(&self, corpus: &DocumentCorpus) -> usize {
        let removed = self.cache.retain_ids(|id| corpus.contains(id));
        if removed > 0 {
            info!(removed, "pruned entries for removed documents");
            if let Err(e) = self.cache.persist().await {
                warn!(error = %e, "could not persist pruned cache");
            }
        }
        removed
    }

    async fn embed_batch(
        &self,
        batch: &[&Document],
        cancel: &CancellationToken,
    ) -> Result<Vec<EmbeddingRecord>, DomainError> {
        let texts: Vec<&str> = batch.iter().map(|doc| doc.text.as_str()).collect();
        let texts = &texts;
        let producer = &self.producer;

        let vectors = self
            .retry
            .run("embed_batch", cancel, move || producer.embed_batch(texts))
            .await?;

        if vectors.len() != batch.len() {
            return Err(DomainError::permanent(format!(
                "embedding returned {} vectors for {} documents",
                vectors.len(),
                batch.len()
            )));
        }

        let dimension = self.cache.dimension();
        batch
            .iter()
            .zip(vectors)
            .map(|(doc, vector)| {
                if vector.dimension() != dimension {
                    return Err(DomainError::permanent(format!(
                        "embedding for {} has dimension {}, expected {dimension}",
                        doc.id,
                        vector.dimension()
                    )));
                }
                Ok(EmbeddingRecord::new(doc, vector, self.cache.model_name()))
            })
            .collect()
    }
}
