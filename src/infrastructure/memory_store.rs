//! In-memory snapshot store

use super::GenogramStore;
use crate::codec::GenogramDocument;
use crate::errors::GenogramResult;
use crate::value_objects::DocumentId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredSnapshot {
    snapshot: GenogramDocument,
    saved_at: DateTime<Utc>,
}

/// Store keeping the latest snapshot per document in memory
#[derive(Debug, Default)]
pub struct InMemoryGenogramStore {
    documents: RwLock<HashMap<DocumentId, StoredSnapshot>>,
    writes: AtomicUsize,
}

impl InMemoryGenogramStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful writes across all documents
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// When the document was last written
    pub async fn saved_at(&self, document: DocumentId) -> Option<DateTime<Utc>> {
        self.documents
            .read()
            .await
            .get(&document)
            .map(|stored| stored.saved_at)
    }
}

#[async_trait]
impl GenogramStore for InMemoryGenogramStore {
    async fn save(&self, document: DocumentId, snapshot: &GenogramDocument) -> GenogramResult<()> {
        self.documents.write().await.insert(
            document,
            StoredSnapshot {
                snapshot: snapshot.clone(),
                saved_at: Utc::now(),
            },
        );
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn load(&self, document: DocumentId) -> GenogramResult<Option<GenogramDocument>> {
        Ok(self
            .documents
            .read()
            .await
            .get(&document)
            .map(|stored| stored.snapshot.clone()))
    }
}
