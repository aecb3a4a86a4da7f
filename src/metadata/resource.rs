//! Backend resource interface
//!
//! The suggestion engine needs exactly one capability from its host: posting
//! a named resource request to the data-source backend and getting JSON back.
//! This abstraction allows for:
//! - Plugging in whatever transport the host uses
//! - Easy testing with mock implementations
//! - Typed decoding of the five metadata resources in one place

use crate::error::{ResourceError, ResourceResult};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

/// Resource-call capability provided by the host
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Post `body` to the backend resource named `path`
    ///
    /// # Errors
    /// Any transport or backend failure. The metadata cache treats every
    /// error the same way: no data for that key yet.
    async fn post_resource(&self, path: &str, body: Value) -> ResourceResult<Value>;
}

#[async_trait]
impl<T: ResourceClient + ?Sized> ResourceClient for Arc<T> {
    async fn post_resource(&self, path: &str, body: Value) -> ResourceResult<Value> {
        (**self).post_resource(path, body).await
    }
}

/// The metadata resources the backend serves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceRequest<'a> {
    Defaults,
    Catalogs,
    Schemas {
        catalog: Option<&'a str>,
    },
    Tables {
        catalog: Option<&'a str>,
        schema: &'a str,
    },
    /// `table` is fully qualified
    Columns {
        table: &'a str,
    },
}

impl ResourceRequest<'_> {
    pub fn path(&self) -> &'static str {
        match self {
            ResourceRequest::Defaults => "defaults",
            ResourceRequest::Catalogs => "catalogs",
            ResourceRequest::Schemas { .. } => "schemas",
            ResourceRequest::Tables { .. } => "tables",
            ResourceRequest::Columns { .. } => "columns",
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ResourceRequest::Defaults | ResourceRequest::Catalogs => Value::Object(Map::new()),
            ResourceRequest::Schemas { catalog } => {
                let mut body = Map::new();
                if let Some(catalog) = catalog {
                    body.insert("catalog".into(), json!(catalog));
                }
                Value::Object(body)
            }
            ResourceRequest::Tables { catalog, schema } => {
                let mut body = Map::new();
                if let Some(catalog) = catalog {
                    body.insert("catalog".into(), json!(catalog));
                }
                body.insert("schema".into(), json!(schema));
                Value::Object(body)
            }
            ResourceRequest::Columns { table } => json!({ "table": table }),
        }
    }
}

/// Post `request` through `client` and decode the response.
pub async fn fetch<C, T>(client: &C, request: ResourceRequest<'_>) -> ResourceResult<T>
where
    C: ResourceClient + ?Sized,
    T: DeserializeOwned,
{
    let resource = request.path();
    let value = client.post_resource(resource, request.body()).await?;
    serde_json::from_value(value).map_err(|source| ResourceError::Malformed { resource, source })
}

/// Response of the `defaults` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    pub default_catalog: String,
    pub default_schema: String,
}

/// One entry of the `columns` resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}
