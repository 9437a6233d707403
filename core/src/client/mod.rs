use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

pub mod http;
pub mod in_memory;

pub use http::HttpHost;
pub use in_memory::InMemoryHost;

/// Kinds of records the target system stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Layer,
    Application,
}

impl EntityKind {
    /// Collection resource records of this kind are created in and listed from.
    pub fn collection(&self) -> &'static str {
        match self {
            EntityKind::Layer => "layers",
            EntityKind::Application => "applications",
        }
    }
}

/// Access to the REST API of a source or target installation. Resources are paths relative to
/// the host's base URL.
#[async_trait]
pub trait HostApi: Send + Sync {
    /// Lists the documents of a collection resource.
    async fn fetch(&self, resource: &str) -> Result<Vec<Value>>;

    /// Creates one record and returns the id the host assigned to it.
    async fn save(&self, kind: EntityKind, document: &Value) -> Result<i64>;

    async fn delete(&self, resource: &str) -> Result<()>;

    /// Grants public read access to a saved layer.
    async fn make_layer_public(&self, id: i64) -> Result<()>;
}

/// Interprets a list response. Hosts answer either with a bare array or with a single object
/// when a collection holds exactly one record.
pub(crate) fn into_documents(body: Value) -> Vec<Value> {
    match body {
        Value::Array(documents) => documents,
        Value::Null => vec![],
        other => vec![other],
    }
}
