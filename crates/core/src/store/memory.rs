use super::{sort_stored, DocumentStore};
use crate::entities::{Document, EntityKind, Stored};
use crate::error::{ClinicError, ClinicResult};
use chrono::Utc;
use clinic_uuid::ShardableUuid;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

type Key = (EntityKind, ShardableUuid);

/// In-process store keeping every document as a JSON value.
///
/// Documents go through the same serialisation as on disk, so validation performed while
/// deserializing (non-empty names, canonical ids) applies here too.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<Key, serde_json::Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> ClinicResult<RwLockReadGuard<'_, HashMap<Key, serde_json::Value>>> {
        self.documents
            .read()
            .map_err(|_| ClinicError::StoreLockPoisoned)
    }

    fn write(&self) -> ClinicResult<RwLockWriteGuard<'_, HashMap<Key, serde_json::Value>>> {
        self.documents
            .write()
            .map_err(|_| ClinicError::StoreLockPoisoned)
    }
}

fn decode<T: Document>(value: &serde_json::Value) -> ClinicResult<Stored<T>> {
    Stored::<T>::deserialize(value).map_err(ClinicError::Deserialization)
}

fn encode<T: Document>(stored: &Stored<T>) -> ClinicResult<serde_json::Value> {
    serde_json::to_value(stored).map_err(ClinicError::Serialization)
}

impl DocumentStore for MemoryStore {
    fn get<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<Option<Stored<T>>> {
        let documents = self.read()?;
        documents
            .get(&(T::KIND, id.clone()))
            .map(decode::<T>)
            .transpose()
    }

    fn create<T: Document>(&self, data: T) -> ClinicResult<Stored<T>> {
        let now = Utc::now();
        let stored = Stored {
            id: ShardableUuid::new(),
            created_at: now,
            updated_at: now,
            data,
        };
        let value = encode(&stored)?;

        self.write()?.insert((T::KIND, stored.id.clone()), value);
        Ok(stored)
    }

    fn update<T: Document>(
        &self,
        id: &ShardableUuid,
        data: T,
    ) -> ClinicResult<Option<Stored<T>>> {
        let mut documents = self.write()?;
        let key = (T::KIND, id.clone());
        let Some(existing) = documents.get(&key) else {
            return Ok(None);
        };
        let existing = decode::<T>(existing)?;

        let stored = Stored {
            id: existing.id,
            created_at: existing.created_at,
            updated_at: Utc::now(),
            data,
        };
        documents.insert(key, encode(&stored)?);
        Ok(Some(stored))
    }

    fn delete<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<bool> {
        Ok(self.write()?.remove(&(T::KIND, id.clone())).is_some())
    }

    fn list<T: Document>(&self) -> ClinicResult<Vec<Stored<T>>> {
        let documents = self.read()?;
        let mut items = documents
            .iter()
            .filter(|((kind, _), _)| *kind == T::KIND)
            .map(|(_, value)| decode::<T>(value))
            .collect::<ClinicResult<Vec<_>>>()?;
        sort_stored(&mut items);
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Department, DepartmentDetails, Hospital};
    use clinic_types::NonEmptyText;

    fn hospital(name: &str) -> Hospital {
        Hospital {
            name: NonEmptyText::new(name).expect("non-empty"),
            address: String::new(),
            phone: String::new(),
        }
    }

    #[test]
    fn test_create_then_get() {
        let store = MemoryStore::new();
        let created = store.create(hospital("City General")).expect("create");

        let fetched = store
            .get::<Hospital>(&created.id)
            .expect("get")
            .expect("hospital should exist");
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_get_is_scoped_by_kind() {
        let store = MemoryStore::new();
        let created = store.create(hospital("City General")).expect("create");

        assert!(store
            .get::<Department>(&created.id)
            .expect("get")
            .is_none());
    }

    #[test]
    fn test_update_keeps_identity() {
        let store = MemoryStore::new();
        let created = store.create(hospital("City General")).expect("create");

        let updated = store
            .update(&created.id, hospital("City General Hospital"))
            .expect("update")
            .expect("hospital should exist");

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
        assert_eq!(updated.data.name.as_str(), "City General Hospital");
    }

    #[test]
    fn test_update_missing_writes_nothing() {
        let store = MemoryStore::new();
        let id = ShardableUuid::new();

        assert!(store.update(&id, hospital("Ghost")).expect("update").is_none());
        assert!(store.list::<Hospital>().expect("list").is_empty());
    }

    #[test]
    fn test_delete_and_list_by_ancestor() {
        let store = MemoryStore::new();
        let a = store.create(hospital("A")).expect("create");
        let b = store.create(hospital("B")).expect("create");
        for (hospital_id, name) in [(&a.id, "Cardiology"), (&a.id, "Neurology"), (&b.id, "ENT")] {
            store
                .create(Department {
                    hospital_id: hospital_id.clone(),
                    details: DepartmentDetails {
                        name: NonEmptyText::new(name).expect("non-empty"),
                        description: String::new(),
                    },
                })
                .expect("create");
        }

        let of_a = store
            .list_by_ancestor::<Department>(EntityKind::Hospital, &a.id)
            .expect("list");
        assert_eq!(of_a.len(), 2);

        assert!(store.delete::<Hospital>(&b.id).expect("delete"));
        assert!(!store.delete::<Hospital>(&b.id).expect("delete"));
        assert_eq!(store.list::<Hospital>().expect("list").len(), 1);
    }
}
