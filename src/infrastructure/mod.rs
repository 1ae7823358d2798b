//! Persistence boundary
//!
//! The autosave coordinator talks to storage only through `GenogramStore`. Both
//! calls are fallible and asynchronous; implementations map their own failures
//! to `GenogramError::PersistenceFailure`.

mod memory_store;

pub use memory_store::InMemoryGenogramStore;

use crate::codec::GenogramDocument;
use crate::errors::GenogramResult;
use crate::value_objects::DocumentId;
use async_trait::async_trait;

/// External store of genogram snapshots keyed by document
#[async_trait]
pub trait GenogramStore: Send + Sync {
    /// Persist a snapshot, replacing whatever the document held
    async fn save(&self, document: DocumentId, snapshot: &GenogramDocument) -> GenogramResult<()>;

    /// Read the latest snapshot of a document, `None` if it was never saved
    async fn load(&self, document: DocumentId) -> GenogramResult<Option<GenogramDocument>>;
}
