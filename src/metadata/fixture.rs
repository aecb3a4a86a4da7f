//! In-process metadata backend
//!
//! Serves the five metadata resources from a TOML description of catalogs,
//! schemas, tables and columns, answering the way the warehouse backend does:
//! requests without a catalog (or schema) resolve against the defaults.
//!
//! ```toml
//! default_catalog = "main"
//! default_schema = "default"
//!
//! [[catalogs]]
//! name = "main"
//!
//! [[catalogs.schemas]]
//! name = "default"
//!
//! [[catalogs.schemas.tables]]
//! name = "orders"
//! columns = [{ name = "id", type = "bigint" }]
//! ```

use crate::error::{ConfigError, ConfigResult, ResourceError, ResourceResult};
use crate::metadata::resource::{ColumnInfo, Defaults, ResourceClient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

/// Metadata served by [`MetadataFixture`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetadataFixture {
    #[serde(default)]
    pub default_catalog: Option<String>,
    #[serde(default)]
    pub default_schema: Option<String>,
    #[serde(default)]
    pub catalogs: Vec<FixtureCatalog>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCatalog {
    pub name: String,
    #[serde(default)]
    pub schemas: Vec<FixtureSchema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSchema {
    pub name: String,
    #[serde(default)]
    pub tables: Vec<FixtureTable>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureTable {
    pub name: String,
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
}

impl MetadataFixture {
    pub fn from_toml(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load a fixture file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::NotFound(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    fn catalog(&self, name: Option<&str>) -> ResourceResult<&FixtureCatalog> {
        let name = name
            .or(self.default_catalog.as_deref())
            .ok_or_else(|| ResourceError::Backend("no catalog given and no default".into()))?;
        self.catalogs
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| ResourceError::Backend(format!("catalog '{name}' not found")))
    }

    fn schema(&self, catalog: Option<&str>, schema: Option<&str>) -> ResourceResult<&FixtureSchema> {
        let catalog = self.catalog(catalog)?;
        let name = schema
            .or(self.default_schema.as_deref())
            .ok_or_else(|| ResourceError::Backend("no schema given and no default".into()))?;
        catalog
            .schemas
            .iter()
            .find(|s| s.name == name)
            .ok_or_else(|| {
                ResourceError::Backend(format!("schema '{}.{}' not found", catalog.name, name))
            })
    }

    /// Resolve `table`, `schema.table` or `catalog.schema.table`
    fn table(&self, reference: &str) -> ResourceResult<&FixtureTable> {
        let parts: Vec<&str> = reference.split('.').collect();
        let (catalog, schema, name) = match parts.as_slice() {
            [table] => (None, None, *table),
            [schema, table] => (None, Some(*schema), *table),
            [catalog, schema, table] => (Some(*catalog), Some(*schema), *table),
            _ => {
                return Err(ResourceError::Backend(format!(
                    "invalid table reference '{reference}'"
                )));
            }
        };
        self.schema(catalog, schema)?
            .tables
            .iter()
            .find(|t| t.name == name)
            .ok_or_else(|| ResourceError::Backend(format!("table '{reference}' not found")))
    }

    fn respond(&self, path: &str, body: &Value) -> ResourceResult<Value> {
        let response = match path {
            "defaults" => {
                let (Some(catalog), Some(schema)) = (&self.default_catalog, &self.default_schema)
                else {
                    return Err(ResourceError::Backend("no defaults configured".into()));
                };
                serde_json::to_value(Defaults {
                    default_catalog: catalog.clone(),
                    default_schema: schema.clone(),
                })
            }
            "catalogs" => serde_json::to_value(names(&self.catalogs, |c| &c.name)),
            "schemas" => {
                let catalog = self.catalog(str_param(body, "catalog"))?;
                serde_json::to_value(names(&catalog.schemas, |s| &s.name))
            }
            "tables" => {
                let schema = str_param(body, "schema")
                    .ok_or_else(|| ResourceError::Backend("missing 'schema' parameter".into()))?;
                let schema = self.schema(str_param(body, "catalog"), Some(schema))?;
                serde_json::to_value(names(&schema.tables, |t| &t.name))
            }
            "columns" => {
                let table = str_param(body, "table")
                    .ok_or_else(|| ResourceError::Backend("missing 'table' parameter".into()))?;
                serde_json::to_value(&self.table(table)?.columns)
            }
            other => return Err(ResourceError::UnknownResource(other.to_string())),
        };
        response.map_err(|e| ResourceError::Backend(e.to_string()))
    }
}

fn str_param<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

fn names<T>(items: &[T], name: impl Fn(&T) -> &String) -> Vec<&str> {
    items.iter().map(|item| name(item).as_str()).collect()
}

#[async_trait]
impl ResourceClient for MetadataFixture {
    async fn post_resource(&self, path: &str, body: Value) -> ResourceResult<Value> {
        self.respond(path, &body)
    }
}
