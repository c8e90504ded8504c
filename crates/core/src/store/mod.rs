//! Document storage.
//!
//! [`DocumentStore`] is the persistence collaborator of the registry and the assembler. It
//! supports get, create, update, delete, list and list-by-ancestor over any [`Document`] type.
//! Identifiers and timestamps are assigned by the store on create.
//!
//! Two implementations are provided:
//! - [`MemoryStore`]: process-local, used by tests and ephemeral runs
//! - [`YamlStore`]: one YAML file per document in a sharded directory tree
//!
//! Atomicity across documents is not provided; callers perform every check that can fail before
//! their first write.

mod memory;
mod yaml;

pub use memory::MemoryStore;
pub use yaml::YamlStore;

use crate::entities::{Document, EntityKind, Stored};
use crate::error::ClinicResult;
use clinic_uuid::ShardableUuid;

pub trait DocumentStore: Send + Sync {
    /// Fetches a document, or `None` if there is no document of type `T` with this id.
    fn get<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<Option<Stored<T>>>;

    /// Persists a new document under a fresh identifier.
    fn create<T: Document>(&self, data: T) -> ClinicResult<Stored<T>>;

    /// Replaces the body of an existing document, keeping its id and creation time.
    ///
    /// Returns `None` if the document does not exist; nothing is written in that case.
    fn update<T: Document>(&self, id: &ShardableUuid, data: T)
        -> ClinicResult<Option<Stored<T>>>;

    /// Removes a document. Returns `false` if it did not exist.
    fn delete<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<bool>;

    /// Lists every document of type `T`, oldest first.
    fn list<T: Document>(&self) -> ClinicResult<Vec<Stored<T>>>;

    /// Lists the documents of type `T` that reference `id` as their ancestor of kind `kind`.
    fn list_by_ancestor<T: Document>(
        &self,
        kind: EntityKind,
        id: &ShardableUuid,
    ) -> ClinicResult<Vec<Stored<T>>> {
        Ok(self
            .list::<T>()?
            .into_iter()
            .filter(|stored| stored.data.has_ancestor(kind, id))
            .collect())
    }

    /// Counts the documents of type `T` under the given ancestor.
    ///
    /// Used to guard deletes, so implementations must not skip documents they cannot read.
    fn count_by_ancestor<T: Document>(
        &self,
        kind: EntityKind,
        id: &ShardableUuid,
    ) -> ClinicResult<usize> {
        self.list_by_ancestor::<T>(kind, id).map(|items| items.len())
    }
}

/// A store selected at startup.
#[derive(Debug)]
pub enum StoreBackend {
    Memory(MemoryStore),
    Yaml(YamlStore),
}

impl DocumentStore for StoreBackend {
    fn get<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<Option<Stored<T>>> {
        match self {
            StoreBackend::Memory(store) => store.get(id),
            StoreBackend::Yaml(store) => store.get(id),
        }
    }

    fn create<T: Document>(&self, data: T) -> ClinicResult<Stored<T>> {
        match self {
            StoreBackend::Memory(store) => store.create(data),
            StoreBackend::Yaml(store) => store.create(data),
        }
    }

    fn update<T: Document>(
        &self,
        id: &ShardableUuid,
        data: T,
    ) -> ClinicResult<Option<Stored<T>>> {
        match self {
            StoreBackend::Memory(store) => store.update(id, data),
            StoreBackend::Yaml(store) => store.update(id, data),
        }
    }

    fn delete<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<bool> {
        match self {
            StoreBackend::Memory(store) => store.delete::<T>(id),
            StoreBackend::Yaml(store) => store.delete::<T>(id),
        }
    }

    fn list<T: Document>(&self) -> ClinicResult<Vec<Stored<T>>> {
        match self {
            StoreBackend::Memory(store) => store.list(),
            StoreBackend::Yaml(store) => store.list(),
        }
    }

    fn count_by_ancestor<T: Document>(
        &self,
        kind: EntityKind,
        id: &ShardableUuid,
    ) -> ClinicResult<usize> {
        match self {
            StoreBackend::Memory(store) => store.count_by_ancestor::<T>(kind, id),
            StoreBackend::Yaml(store) => store.count_by_ancestor::<T>(kind, id),
        }
    }
}

/// Orders listings oldest first, breaking ties by id.
pub(crate) fn sort_stored<T>(items: &mut [Stored<T>]) {
    items.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}
