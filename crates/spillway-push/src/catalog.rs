//! Table and destination catalogs.
//!
//! The controller only ever sees the two lookup traits; the in-memory
//! catalogs here are the default implementations for embedded use and
//! tests. Lookups are pure and safe to call concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use spillway_connectors::Destination;

use crate::types::{DestinationId, TableId, TableRef};

/// Read-only lookup of table definitions.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Resolves a table by id.
    async fn table(&self, id: TableId) -> Option<TableRef>;
}

/// Read-only lookup of destinations.
#[async_trait]
pub trait DestinationStore: Send + Sync {
    /// Resolves a destination by id.
    async fn destination(&self, id: DestinationId) -> Option<Arc<dyn Destination>>;
}

/// In-memory table catalog.
#[derive(Default)]
pub struct MemoryTableStore {
    tables: RwLock<HashMap<TableId, TableRef>>,
}

impl MemoryTableStore {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `table` under `id`, replacing any previous definition.
    pub fn register(&self, id: TableId, table: TableRef) {
        self.tables.write().insert(id, table);
    }

    /// Removes and returns the table under `id`.
    pub fn remove(&self, id: TableId) -> Option<TableRef> {
        self.tables.write().remove(&id)
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn table(&self, id: TableId) -> Option<TableRef> {
        self.tables.read().get(&id).cloned()
    }
}

/// In-memory destination catalog.
#[derive(Default)]
pub struct MemoryDestinationStore {
    destinations: RwLock<HashMap<DestinationId, Arc<dyn Destination>>>,
}

impl MemoryDestinationStore {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `destination` under `id`, replacing any previous one.
    pub fn register(&self, id: DestinationId, destination: Arc<dyn Destination>) {
        self.destinations.write().insert(id, destination);
    }

    /// Removes and returns the destination under `id`.
    pub fn remove(&self, id: DestinationId) -> Option<Arc<dyn Destination>> {
        self.destinations.write().remove(&id)
    }
}

#[async_trait]
impl DestinationStore for MemoryDestinationStore {
    async fn destination(&self, id: DestinationId) -> Option<Arc<dyn Destination>> {
        self.destinations.read().get(&id).cloned()
    }
}
