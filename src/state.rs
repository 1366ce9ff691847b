use sqlx::PgPool;
use std::sync::Arc;

use crate::storage::AttachmentStore;

/// Shared per-request dependencies: the connection pool and the attachment
/// store. The store is injected here rather than held in a module global so
/// tests can swap in a fake backend.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub attachments: Arc<dyn AttachmentStore>,
}

impl AppState {
    pub fn new(pool: PgPool, attachments: Arc<dyn AttachmentStore>) -> Self {
        Self { pool, attachments }
    }
}
