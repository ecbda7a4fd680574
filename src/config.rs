use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct WarehouseConfig {
    pub host: String,
    pub http_path: String,
    pub token: String,
    pub catalog: String,
    pub schema: String,
}

impl WarehouseConfig {
    /// Fully qualified name of a table in the configured catalog and schema.
    pub fn table(&self, name: &str) -> String {
        format!("{}.{}.{}", self.catalog, self.schema, name)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobsConfig {
    pub host: String,
    pub token: String,
    pub job_id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub warehouse: WarehouseConfig,
    pub jobs: JobsConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let host = required("DATABRICKS_INSTANCE")?;
        let token = required("DATABRICKS_TOKEN")?;
        let warehouse = WarehouseConfig {
            host: host.clone(),
            http_path: required("DATABRICKS_HTTP_PATH")?,
            token: token.clone(),
            catalog: std::env::var("WAREHOUSE_CATALOG").unwrap_or_else(|_| "pesu".into()),
            schema: std::env::var("WAREHOUSE_SCHEMA").unwrap_or_else(|_| "assessment".into()),
        };
        let jobs = JobsConfig {
            host,
            token,
            job_id: required("DATABRICKS_JOB_ID")?
                .trim()
                .parse::<i64>()
                .context("DATABRICKS_JOB_ID must be an integer")?,
        };
        Ok(Self { warehouse, jobs })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("{key} is not set"))
}

/// Base URL for a workspace host; a bare hostname gets `https://`.
pub fn base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}
