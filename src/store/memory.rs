//! In-memory tree store for tests and local runs
//!
//! Thread-safe via `RwLock`. Not durable: data is lost on restart.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::RwLock;

use super::{path_segments, push_key, StoreError, TreeStore};

pub struct MemoryTree {
    root: RwLock<Value>,
    seq: AtomicU32,
}

impl MemoryTree {
    pub fn new() -> Self {
        Self::with_root(Value::Object(Map::new()))
    }

    /// Start from an existing JSON document.
    pub fn with_root(root: Value) -> Self {
        Self {
            root: RwLock::new(root),
            seq: AtomicU32::new(0),
        }
    }

    /// Copy of the whole tree.
    pub fn snapshot(&self) -> Result<Value, StoreError> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Value>, StoreError> {
        self.root.read().map_err(|e| StoreError::Backend(e.to_string()))
    }

    fn write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Value>, StoreError> {
        self.root.write().map_err(|e| StoreError::Backend(e.to_string()))
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Walk to `segments`, creating objects along the way.
fn node_mut<'a>(root: &'a mut Value, segments: &[&str]) -> &'a mut Value {
    let mut node = root;
    for seg in segments {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = &mut node[*seg];
    }
    node
}

/// Walk to `segments` without creating anything.
fn existing_mut<'a>(root: &'a mut Value, segments: &[&str]) -> Option<&'a mut Value> {
    segments.iter().try_fold(root, |node, seg| node.get_mut(*seg))
}

fn set_at(root: &mut Value, segments: &[&str], value: Value) {
    let Some((last, parents)) = segments.split_last() else {
        *root = value;
        return;
    };
    if value.is_null() {
        if let Some(map) = existing_mut(root, parents).and_then(Value::as_object_mut) {
            map.remove(*last);
        }
        return;
    }
    let parent = node_mut(root, parents);
    if !parent.is_object() {
        *parent = Value::Object(Map::new());
    }
    parent[*last] = value;
}

#[async_trait]
impl TreeStore for MemoryTree {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = path_segments(path)?;
        let root = self.read()?;
        let mut node = &*root;
        for seg in segments {
            match node.get(seg) {
                Some(child) => node = child,
                None => return Ok(None),
            }
        }
        Ok((!node.is_null()).then(|| node.clone()))
    }

    async fn set(&self, path: &str, value: Value) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        set_at(&mut *self.write()?, &segments, value);
        Ok(())
    }

    async fn update(&self, path: &str, fields: Map<String, Value>) -> Result<(), StoreError> {
        let segments = path_segments(path)?;
        let mut root = self.write()?;
        let target = node_mut(&mut root, &segments);
        if !target.is_object() {
            *target = Value::Object(Map::new());
        }
        for (key, value) in fields {
            match target.as_object_mut() {
                Some(map) if value.is_null() => {
                    map.remove(&key);
                }
                Some(map) => {
                    map.insert(key, value);
                }
                None => {}
            }
        }
        Ok(())
    }

    async fn push(&self, path: &str, value: Value) -> Result<String, StoreError> {
        let key = push_key(
            chrono::Utc::now().timestamp_millis(),
            self.seq.fetch_add(1, Ordering::Relaxed),
        );
        let mut segments = path_segments(path)?;
        segments.push(&key);
        set_at(&mut *self.write()?, &segments, value);
        Ok(key)
    }

    async fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.set(path, Value::Null).await
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
