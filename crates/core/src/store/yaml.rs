//! File-backed document store.
//!
//! ## Storage Layout
//!
//! ```text
//! <data_dir>/
//!   hospitals/
//!     <s1>/
//!       <s2>/
//!         <uuid>/
//!           record.yaml
//!   departments/ ...
//!   prescriptions/ ...
//! ```
//!
//! where `s1` and `s2` are the first four hex characters of the document id.

use super::{sort_stored, DocumentStore};
use crate::constants::RECORD_FILENAME;
use crate::entities::{Document, EntityKind, Stored};
use crate::error::{ClinicError, ClinicResult};
use chrono::Utc;
use clinic_uuid::ShardableUuid;
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each document as `record.yaml` in its own sharded directory.
#[derive(Clone, Debug)]
pub struct YamlStore {
    root: PathBuf,
}

impl YamlStore {
    /// Creates a store rooted at `root`. Directories are created lazily on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir<T: Document>(&self) -> PathBuf {
        self.root.join(T::KIND.dir_name())
    }

    fn document_dir<T: Document>(&self, id: &ShardableUuid) -> PathBuf {
        id.sharded_dir(&self.kind_dir::<T>())
    }

    fn read_record<T: Document>(path: &Path) -> ClinicResult<Stored<T>> {
        let contents = fs::read_to_string(path).map_err(ClinicError::FileRead)?;
        serde_yaml::from_str(&contents).map_err(ClinicError::YamlDeserialization)
    }

    /// Writes through a temporary file so a crash never leaves a half-written record.
    fn write_record<T: Document>(dir: &Path, stored: &Stored<T>) -> ClinicResult<()> {
        let yaml = serde_yaml::to_string(stored).map_err(ClinicError::YamlSerialization)?;
        fs::create_dir_all(dir).map_err(ClinicError::StorageDirCreation)?;

        let tmp = dir.join(format!("{}.tmp", RECORD_FILENAME));
        fs::write(&tmp, yaml).map_err(ClinicError::FileWrite)?;
        fs::rename(&tmp, dir.join(RECORD_FILENAME)).map_err(ClinicError::FileWrite)
    }
}

impl DocumentStore for YamlStore {
    fn get<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<Option<Stored<T>>> {
        let path = self.document_dir::<T>(id).join(RECORD_FILENAME);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    fn create<T: Document>(&self, data: T) -> ClinicResult<Stored<T>> {
        let now = Utc::now();
        let stored = Stored {
            id: ShardableUuid::new(),
            created_at: now,
            updated_at: now,
            data,
        };

        Self::write_record(&self.document_dir::<T>(&stored.id), &stored)?;
        Ok(stored)
    }

    fn update<T: Document>(
        &self,
        id: &ShardableUuid,
        data: T,
    ) -> ClinicResult<Option<Stored<T>>> {
        let Some(existing) = self.get::<T>(id)? else {
            return Ok(None);
        };

        let stored = Stored {
            id: existing.id,
            created_at: existing.created_at,
            updated_at: Utc::now(),
            data,
        };
        Self::write_record(&self.document_dir::<T>(id), &stored)?;
        Ok(Some(stored))
    }

    fn delete<T: Document>(&self, id: &ShardableUuid) -> ClinicResult<bool> {
        let dir = self.document_dir::<T>(id);
        if !dir.join(RECORD_FILENAME).is_file() {
            return Ok(false);
        }
        fs::remove_dir_all(&dir).map_err(ClinicError::FileDelete)?;
        Ok(true)
    }

    /// Walks `<kind>/<s1>/<s2>/<uuid>/record.yaml`. Files that cannot be read or parsed are
    /// logged and skipped.
    fn list<T: Document>(&self) -> ClinicResult<Vec<Stored<T>>> {
        self.scan(Scan::Lenient)
    }

    /// Counts without skipping: an unreadable record might be a dependent, so it is an error.
    fn count_by_ancestor<T: Document>(
        &self,
        kind: EntityKind,
        id: &ShardableUuid,
    ) -> ClinicResult<usize> {
        Ok(self
            .scan::<T>(Scan::Strict)?
            .iter()
            .filter(|stored| stored.data.has_ancestor(kind, id))
            .count())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Scan {
    /// Log and skip unreadable entries.
    Lenient,
    /// Fail on the first unreadable entry.
    Strict,
}

impl YamlStore {
    fn scan<T: Document>(&self, mode: Scan) -> ClinicResult<Vec<Stored<T>>> {
        let mut items = Vec::new();

        let kind_dir = self.kind_dir::<T>();
        if !kind_dir.is_dir() {
            return Ok(items);
        }
        for s1_path in Self::subdirs(&kind_dir, mode)? {
            for s2_path in Self::subdirs(&s1_path, mode)? {
                for id_path in Self::subdirs(&s2_path, mode)? {
                    let record_path = id_path.join(RECORD_FILENAME);
                    if !record_path.is_file() {
                        continue;
                    }

                    match Self::read_record::<T>(&record_path) {
                        Ok(stored) => items.push(stored),
                        Err(e) if mode == Scan::Strict => return Err(e),
                        Err(e) => {
                            tracing::warn!(
                                "failed to load {}: {} - {}",
                                T::KIND,
                                record_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        sort_stored(&mut items);
        Ok(items)
    }

    fn subdirs(dir: &Path, mode: Scan) -> ClinicResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(dir) {
            Ok(it) => it,
            Err(e) if mode == Scan::Strict => return Err(ClinicError::FileRead(e)),
            Err(_) => return Ok(Vec::new()),
        };
        let mut dirs = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) if entry.path().is_dir() => dirs.push(entry.path()),
                Ok(_) => {}
                Err(e) if mode == Scan::Strict => return Err(ClinicError::FileRead(e)),
                Err(_) => {}
            }
        }
        Ok(dirs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Hospital;
    use clinic_types::NonEmptyText;
    use tempfile::TempDir;

    fn hospital(name: &str) -> Hospital {
        Hospital {
            name: NonEmptyText::new(name).expect("non-empty"),
            address: "1 Main Road".into(),
            phone: "0123".into(),
        }
    }

    #[test]
    fn test_create_writes_sharded_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = YamlStore::new(temp_dir.path());

        let created = store.create(hospital("City General")).expect("create");

        let canonical = created.id.to_string();
        let expected = temp_dir
            .path()
            .join("hospitals")
            .join(&canonical[0..2])
            .join(&canonical[2..4])
            .join(&canonical)
            .join(RECORD_FILENAME);
        assert!(expected.is_file(), "record.yaml should exist at {:?}", expected);

        let yaml = fs::read_to_string(&expected).expect("read record");
        assert!(yaml.contains("name: City General"));
        assert!(yaml.contains("created_at:"));
    }

    #[test]
    fn test_round_trip_through_disk() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = YamlStore::new(temp_dir.path());
        let created = store.create(hospital("City General")).expect("create");

        let fetched = store
            .get::<Hospital>(&created.id)
            .expect("get")
            .expect("hospital should exist");
        assert_eq!(fetched, created);
    }

    #[test]
    fn test_update_and_delete() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = YamlStore::new(temp_dir.path());
        let created = store.create(hospital("City General")).expect("create");

        let updated = store
            .update(&created.id, hospital("Renamed"))
            .expect("update")
            .expect("hospital should exist");
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(
            store
                .get::<Hospital>(&created.id)
                .expect("get")
                .expect("exists")
                .data
                .name
                .as_str(),
            "Renamed"
        );

        assert!(store.delete::<Hospital>(&created.id).expect("delete"));
        assert!(store.get::<Hospital>(&created.id).expect("get").is_none());
        assert!(!store.delete::<Hospital>(&created.id).expect("delete"));
        assert!(store
            .update(&created.id, hospital("Gone"))
            .expect("update")
            .is_none());
    }

    #[test]
    fn test_list_skips_unparseable_records() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = YamlStore::new(temp_dir.path());
        store.create(hospital("A")).expect("create");
        store.create(hospital("B")).expect("create");

        let broken = ShardableUuid::new().sharded_dir(&temp_dir.path().join("hospitals"));
        fs::create_dir_all(&broken).expect("create dir");
        fs::write(broken.join(RECORD_FILENAME), "name: [unterminated").expect("write");

        let listed = store.list::<Hospital>().expect("list");
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at <= listed[1].created_at);
    }

    #[test]
    fn test_list_of_missing_kind_is_empty() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = YamlStore::new(temp_dir.path());

        assert!(store.list::<Hospital>().expect("list").is_empty());
        assert!(store
            .list_by_ancestor::<Hospital>(EntityKind::Doctor, &ShardableUuid::new())
            .expect("list")
            .is_empty());
    }

    #[test]
    fn test_count_by_ancestor_fails_on_unreadable_record() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let store = YamlStore::new(temp_dir.path());
        let h = store.create(hospital("City General")).expect("create");

        assert_eq!(
            store
                .count_by_ancestor::<Hospital>(EntityKind::Hospital, &h.id)
                .expect("count"),
            0
        );

        let broken = ShardableUuid::new().sharded_dir(&temp_dir.path().join("hospitals"));
        fs::create_dir_all(&broken).expect("create dir");
        fs::write(broken.join(RECORD_FILENAME), "name: [unterminated").expect("write");

        let err = store
            .count_by_ancestor::<Hospital>(EntityKind::Hospital, &h.id)
            .expect_err("unreadable record must not be skipped");
        assert!(matches!(err, ClinicError::YamlDeserialization(_)));
        assert_eq!(store.list::<Hospital>().expect("list").len(), 1);
    }
}
