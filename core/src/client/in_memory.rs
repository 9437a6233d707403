use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{MigrationError, Result};

use super::{EntityKind, HostApi};

#[derive(Default)]
struct Store {
    /// Documents served by `fetch`, keyed by resource.
    resources: BTreeMap<String, Vec<Value>>,
    saved: Vec<(EntityKind, i64, Value)>,
    deleted: Vec<String>,
    public_layers: Vec<i64>,
    next_id: i64,
    failing_resources: Vec<String>,
}

/// [HostApi] that keeps everything in memory. Saved records get ids counting up from a
/// configurable start and are listed again under their collection resource.
pub struct InMemoryHost {
    store: Mutex<Store>,
}

impl InMemoryHost {
    pub fn new(first_id: i64) -> Self {
        Self {
            store: Mutex::new(Store {
                next_id: first_id,
                ..Default::default()
            }),
        }
    }

    pub fn with_resource(self, resource: &str, documents: Vec<Value>) -> Self {
        self.lock()
            .resources
            .insert(resource.to_string(), documents);
        self
    }

    /// Makes every request for `resource` fail with a transport error.
    pub fn failing(self, resource: &str) -> Self {
        self.lock().failing_resources.push(resource.to_string());
        self
    }

    /// Records saved so far, in save order.
    pub fn saved(&self, kind: EntityKind) -> Vec<(i64, Value)> {
        self.lock()
            .saved
            .iter()
            .filter(|(k, _, _)| *k == kind)
            .map(|(_, id, doc)| (*id, doc.clone()))
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.lock().deleted.clone()
    }

    pub fn public_layers(&self) -> Vec<i64> {
        self.lock().public_layers.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        match self.store.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn unavailable(resource: &str) -> MigrationError {
    MigrationError::Transport(format!("{resource} is unavailable"))
}

#[async_trait]
impl HostApi for InMemoryHost {
    async fn fetch(&self, resource: &str) -> Result<Vec<Value>> {
        let store = self.lock();
        if store.failing_resources.iter().any(|r| r == resource) {
            return Err(unavailable(resource));
        }
        Ok(store.resources.get(resource).cloned().unwrap_or_default())
    }

    async fn save(&self, kind: EntityKind, document: &Value) -> Result<i64> {
        let mut store = self.lock();
        if store.failing_resources.iter().any(|r| r == kind.collection()) {
            return Err(unavailable(kind.collection()));
        }
        let id = store.next_id;
        store.next_id += 1;
        let mut listed = document.clone();
        if let Some(object) = listed.as_object_mut() {
            object.insert("id".to_string(), Value::from(id));
        }
        store
            .resources
            .entry(kind.collection().to_string())
            .or_default()
            .push(listed);
        store.saved.push((kind, id, document.clone()));
        Ok(id)
    }

    async fn delete(&self, resource: &str) -> Result<()> {
        let mut store = self.lock();
        if let Some((collection, id)) = resource.rsplit_once('/') {
            let id: Option<i64> = id.parse().ok();
            if let Some(documents) = store.resources.get_mut(collection) {
                documents.retain(|d| d.get("id").and_then(Value::as_i64) != id);
            }
        }
        store.deleted.push(resource.to_string());
        Ok(())
    }

    async fn make_layer_public(&self, id: i64) -> Result<()> {
        self.lock().public_layers.push(id);
        Ok(())
    }
}
