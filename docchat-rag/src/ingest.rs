//! Document ingestion: dedup, extract, chunk, index.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{info, warn};

use crate::chunking::Chunker;
use crate::document::{Chunk, Document, Upload};
use crate::error::{RagError, Result};
use crate::extract::TextExtractor;
use crate::index::AddReport;
use crate::session::SessionState;

/// What an ingestion call did with each upload.
#[derive(Debug, Default)]
pub struct IngestReport {
    /// Names newly recorded as ingested, in upload order.
    pub ingested: Vec<String>,
    /// Names skipped because they were already ingested or repeated in the call.
    pub skipped: Vec<String>,
    /// Uploads rejected during extraction. These stay retryable.
    pub failed: Vec<(String, RagError)>,
    /// Number of chunks produced from the extracted documents.
    pub chunk_count: usize,
    /// Per-batch indexing outcomes; `None` when there was nothing to index.
    pub index: Option<AddReport>,
}

impl IngestReport {
    /// `true` when every upload was skipped as a duplicate.
    pub fn is_nothing_to_do(&self) -> bool {
        self.ingested.is_empty() && self.failed.is_empty() && self.index.is_none()
    }
}

/// Turns uploads into index entries and records their names on the session.
pub struct IngestionPipeline {
    extractor: Arc<dyn TextExtractor>,
    chunker: Arc<dyn Chunker>,
}

impl IngestionPipeline {
    pub fn new(extractor: Arc<dyn TextExtractor>, chunker: Arc<dyn Chunker>) -> Self {
        Self { extractor, chunker }
    }

    /// Extract an upload into a [`Document`] named after it.
    pub fn extract(&self, upload: &Upload) -> Result<Document> {
        let pages = self.extractor.extract(&upload.name, &upload.bytes)?;
        Ok(Document { name: upload.name.clone(), pages })
    }

    /// Chunk every page of `document`, in page order.
    pub fn chunk_document(&self, document: &Document) -> Vec<Chunk> {
        document.pages.iter().flat_map(|page| self.chunker.chunk(page)).collect()
    }

    /// Ingest the uploads not yet seen by this session.
    ///
    /// Uploads whose name is already ingested, or that repeat an earlier name
    /// in the same call, are skipped. An upload that fails extraction is
    /// reported in [`IngestReport::failed`] and not marked ingested. Every
    /// successfully extracted upload is marked ingested, even if it produced
    /// no chunks or some of its batches failed to index.
    pub async fn ingest(&self, state: &mut SessionState, uploads: &[Upload]) -> IngestReport {
        let mut report = IngestReport::default();
        let mut seen = HashSet::new();
        let mut pending = Vec::new();

        for upload in uploads {
            if state.is_ingested(&upload.name) || !seen.insert(upload.name.as_str()) {
                report.skipped.push(upload.name.clone());
            } else {
                pending.push(upload);
            }
        }

        if pending.is_empty() {
            info!(skipped = report.skipped.len(), "no new documents to ingest");
            return report;
        }

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut extracted = Vec::new();
        for upload in pending {
            if upload.name.trim().is_empty() {
                warn!("rejecting upload with an empty name");
                report.failed.push((
                    upload.name.clone(),
                    RagError::ExtractionError {
                        document: upload.name.clone(),
                        message: "document name must not be empty".to_string(),
                    },
                ));
                continue;
            }

            match self.extract(upload) {
                Ok(document) => {
                    let document_chunks = self.chunk_document(&document);
                    info!(
                        document = %document.name,
                        pages = document.pages.len(),
                        chunks = document_chunks.len(),
                        "extracted document"
                    );
                    chunks.extend(document_chunks);
                    extracted.push(document.name);
                }
                Err(e) => {
                    warn!(document = %upload.name, error = %e, "extraction failed");
                    report.failed.push((upload.name.clone(), e));
                }
            }
        }

        report.chunk_count = chunks.len();
        if !chunks.is_empty() {
            report.index = Some(state.index_mut().add_chunks(chunks).await);
        }

        for name in &extracted {
            state.mark_ingested(name.clone());
        }
        report.ingested = extracted;

        info!(
            ingested = report.ingested.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            chunks = report.chunk_count,
            "ingestion finished"
        );
        report
    }
}
