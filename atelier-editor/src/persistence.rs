/*
    Atelier - layered mockup composition engine
    Copyright (C) 2025 meetzli

    This program is free software: you can redistribute it and/or modify
    it under the terms of the GNU Affero General Public License as published
    by the Free Software Foundation, either version 3 of the License, or
    (at your option) any later version.
*/

//! Design storage with a local fallback.
//!
//! The remote store is treated as opaque blob storage. Whenever it fails the
//! same JSON record shape is written to a small local cache instead, and the
//! caller learns where the data ended up.

use std::collections::{HashMap, VecDeque};

use atelier_core::{DesignPayload, DesignRecord};
use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::StoreError;

/// Key of the single list the local cache lives under.
pub const LOCAL_NAMESPACE: &str = "atelier.designs";
pub const LOCAL_CAPACITY: usize = 10;

pub trait DesignStore {
    /// Stores a new design and returns its id.
    fn save(&mut self, name: &str, data: &DesignPayload) -> Result<String, StoreError>;
    fn list(&self) -> Result<Vec<DesignRecord>, StoreError>;
    fn load(&self, id: &str) -> Result<DesignRecord, StoreError>;
    fn delete(&mut self, id: &str) -> Result<(), StoreError>;
}

impl<T: DesignStore + ?Sized> DesignStore for Box<T> {
    fn save(&mut self, name: &str, data: &DesignPayload) -> Result<String, StoreError> {
        (**self).save(name, data)
    }

    fn list(&self) -> Result<Vec<DesignRecord>, StoreError> {
        (**self).list()
    }

    fn load(&self, id: &str) -> Result<DesignRecord, StoreError> {
        (**self).load(id)
    }

    fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}

/// Browser-local-storage-like string store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Box<T> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        (**self).set(key, value)
    }
}

#[derive(Debug, Default, Clone)]
pub struct MemoryKeyValueStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// The last [`LOCAL_CAPACITY`] designs as one JSON list, oldest first.
#[derive(Debug, Clone)]
pub struct LocalCache<K> {
    kv: K,
    capacity: usize,
}

impl<K: KeyValueStore> LocalCache<K> {
    pub fn new(kv: K) -> Self {
        Self::with_capacity(kv, LOCAL_CAPACITY)
    }

    pub fn with_capacity(kv: K, capacity: usize) -> Self {
        Self {
            kv,
            capacity: capacity.max(1),
        }
    }

    fn read(&self) -> Result<VecDeque<DesignRecord>, StoreError> {
        match self.kv.get(LOCAL_NAMESPACE) {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(VecDeque::new()),
        }
    }

    fn write(&mut self, records: &VecDeque<DesignRecord>) -> Result<(), StoreError> {
        let json = serde_json::to_string(records)?;
        self.kv.set(LOCAL_NAMESPACE, json)
    }

    pub fn save(&mut self, name: &str, data: &DesignPayload) -> Result<DesignRecord, StoreError> {
        let mut records = self.read()?;
        let now = Utc::now();
        let record = DesignRecord {
            id: format!("local-{}", Uuid::new_v4()),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
            data: data.clone(),
        };
        records.push_back(record.clone());
        while records.len() > self.capacity {
            if let Some(evicted) = records.pop_front() {
                debug!(id = %evicted.id, "evicted oldest local design");
            }
        }
        self.write(&records)?;
        Ok(record)
    }

    /// Most recent first.
    pub fn list(&self) -> Result<Vec<DesignRecord>, StoreError> {
        Ok(self.read()?.into_iter().rev().collect())
    }

    pub fn load(&self, id: &str) -> Result<DesignRecord, StoreError> {
        self.read()?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn delete(&mut self, id: &str) -> Result<(), StoreError> {
        let mut records = self.read()?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        self.write(&records)
    }

    pub fn len(&self) -> usize {
        self.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreLocation {
    Remote,
    LocalOnly,
}

/// A store result plus where it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Stored<T> {
    pub value: T,
    pub location: StoreLocation,
}

impl<T> Stored<T> {
    fn remote(value: T) -> Self {
        Self { value, location: StoreLocation::Remote }
    }

    fn local(value: T) -> Self {
        Self { value, location: StoreLocation::LocalOnly }
    }
}

/// Remote store first, local cache whenever the remote call fails.
pub struct FallbackStore<R, K> {
    remote: R,
    local: LocalCache<K>,
}

impl<R: DesignStore, K: KeyValueStore> FallbackStore<R, K> {
    pub fn new(remote: R, local: LocalCache<K>) -> Self {
        Self { remote, local }
    }

    pub fn local(&self) -> &LocalCache<K> {
        &self.local
    }

    pub fn save(&mut self, name: &str, data: &DesignPayload) -> Result<Stored<String>, StoreError> {
        match self.remote.save(name, data) {
            Ok(id) => Ok(Stored::remote(id)),
            Err(e) => {
                warn!(error = %e, "remote save failed, saving locally");
                self.local.save(name, data).map(|r| Stored::local(r.id))
            }
        }
    }

    pub fn list(&self) -> Result<Stored<Vec<DesignRecord>>, StoreError> {
        match self.remote.list() {
            Ok(records) => Ok(Stored::remote(records)),
            Err(e) => {
                warn!(error = %e, "remote list failed, listing local designs");
                self.local.list().map(Stored::local)
            }
        }
    }

    pub fn load(&self, id: &str) -> Result<Stored<DesignRecord>, StoreError> {
        match self.remote.load(id) {
            Ok(record) => Ok(Stored::remote(record)),
            Err(e) => {
                warn!(id, error = %e, "remote load failed, trying local cache");
                self.local.load(id).map(Stored::local)
            }
        }
    }

    pub fn delete(&mut self, id: &str) -> Result<Stored<()>, StoreError> {
        match self.remote.delete(id) {
            Ok(()) => Ok(Stored::remote(())),
            Err(e) => {
                warn!(id, error = %e, "remote delete failed, deleting locally");
                self.local.delete(id).map(Stored::local)
            }
        }
    }
}
