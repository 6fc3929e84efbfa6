//! Append-only audit logging.
//!
//! Every governance-caused effect on a trading decision is recorded here and
//! discoverable with a single query by symbol and time range. The store port
//! is synchronous: the read-hot resolver appends entries and must never
//! await on the hot path.

use std::sync::RwLock;

use thiserror::Error;

use crate::models::{AuditLogEntry, AuditQuery};

/// Audit storage errors. Storage unavailability is escalated, not swallowed.
#[derive(Debug, Error)]
pub enum AuditError {
    /// The backing store rejected the write.
    #[error("audit storage unavailable: {0}")]
    StorageUnavailable(String),
}

/// Append-only audit storage port.
///
/// Implementations must preserve append order and never update or delete
/// entries.
pub trait AuditStore: Send + Sync {
    /// Append an entry. Synchronous and durable for the store's definition
    /// of durability.
    fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError>;

    /// Query entries matching the filters, ordered by timestamp.
    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Whether the store is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory audit store.
///
/// Suitable for tests and single-process deployments; durable adapters plug
/// in behind the same port.
#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditStore for InMemoryAuditStore {
    fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        let mut entries = self.entries.write().unwrap();
        entries.push(entry);
        Ok(())
    }

    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError> {
        let entries = self.entries.read().unwrap();
        let mut matched: Vec<AuditLogEntry> = entries
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        matched.sort_by_key(|e| e.timestamp);
        Ok(matched)
    }

    fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }
}

/// The audit logger: a thin front over the store port that escalates
/// storage failures loudly before propagating them.
pub struct AuditLogger {
    store: std::sync::Arc<dyn AuditStore>,
}

impl AuditLogger {
    /// Create a logger over a store.
    #[must_use]
    pub fn new(store: std::sync::Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Create a logger over a fresh in-memory store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(std::sync::Arc::new(InMemoryAuditStore::new()))
    }

    /// Append an entry.
    ///
    /// # Errors
    ///
    /// Propagates storage unavailability after logging it; callers decide
    /// whether the surrounding operation can proceed.
    pub fn append(&self, entry: AuditLogEntry) -> Result<(), AuditError> {
        if let Err(e) = self.store.append(entry) {
            tracing::error!(error = %e, "Audit append failed");
            return Err(e);
        }
        Ok(())
    }

    /// Query entries, ordered by timestamp.
    pub fn query(&self, query: &AuditQuery) -> Result<Vec<AuditLogEntry>, AuditError> {
        self.store.query(query)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}
