use std::time::Duration;

use anyhow::{bail, Context};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, instrument, warn};

use crate::config::{base_url, WarehouseConfig};

const STATEMENTS_PATH: &str = "/api/2.0/sql/statements";
const POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Parameter bound to a `:name` marker in a statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatementParameter {
    pub name: String,
    pub value: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sql_type: Option<&'static str>,
}

/// A SQL statement with its bound parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub sql: String,
    pub parameters: Vec<StatementParameter>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            parameters: Vec::new(),
        }
    }

    pub fn bind(mut self, name: &str, value: impl Into<String>) -> Self {
        self.parameters.push(StatementParameter {
            name: name.to_string(),
            value: value.into(),
            sql_type: None,
        });
        self
    }

    pub fn bind_typed(mut self, name: &str, value: impl Into<String>, sql_type: &'static str) -> Self {
        self.parameters.push(StatementParameter {
            name: name.to_string(),
            value: value.into(),
            sql_type: Some(sql_type),
        });
        self
    }
}

/// One result row keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Map<String, Value>);

impl Row {
    pub fn from_columns(columns: &[String], cells: Vec<Value>) -> Self {
        columns.iter().cloned().zip(cells).collect()
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// Deserialize the row into a record by field name.
    pub fn decode<T: DeserializeOwned>(self) -> anyhow::Result<T> {
        serde_json::from_value(Value::Object(self.0)).context("decode warehouse row")
    }
}

impl FromIterator<(String, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Run a write and return the number of affected rows.
    async fn execute(&self, statement: Statement) -> anyhow::Result<u64>;
    /// Run a read and return every row of the result.
    async fn query(&self, statement: Statement) -> anyhow::Result<Vec<Row>>;
}

/// Databricks SQL warehouse reached through the Statement Execution API.
#[derive(Debug, Clone)]
pub struct DatabricksWarehouse {
    base_url: String,
    warehouse_id: String,
    token: String,
    poll_interval: Duration,
}

impl DatabricksWarehouse {
    pub fn new(config: &WarehouseConfig) -> anyhow::Result<Self> {
        let warehouse_id = config
            .http_path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|id| !id.is_empty())
            .with_context(|| format!("no warehouse id in http path {:?}", config.http_path))?
            .to_string();
        Ok(Self {
            base_url: base_url(&config.host),
            warehouse_id,
            token: config.token.clone(),
            poll_interval: POLL_INTERVAL,
        })
    }

    /// Opens a connection that lives for a single statement.
    fn connect(&self) -> anyhow::Result<Connection<'_>> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("interview-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build warehouse http client")?;
        Ok(Connection { http, warehouse: self })
    }
}

#[async_trait]
impl Warehouse for DatabricksWarehouse {
    #[instrument(skip_all)]
    async fn execute(&self, statement: Statement) -> anyhow::Result<u64> {
        let conn = self.connect()?;
        let rows = conn.run(&statement).await?;
        let affected = rows
            .first()
            .and_then(|row| row.get("num_affected_rows"))
            .and_then(|v| match v {
                Value::String(s) => s.parse::<u64>().ok(),
                Value::Number(n) => n.as_u64(),
                _ => None,
            })
            .unwrap_or(0);
        debug!(affected, "statement executed");
        Ok(affected)
    }

    #[instrument(skip_all)]
    async fn query(&self, statement: Statement) -> anyhow::Result<Vec<Row>> {
        let conn = self.connect()?;
        let rows = conn.run(&statement).await?;
        debug!(rows = rows.len(), "query returned");
        Ok(rows)
    }
}

struct Connection<'a> {
    http: reqwest::Client,
    warehouse: &'a DatabricksWarehouse,
}

impl Connection<'_> {
    async fn run(&self, statement: &Statement) -> anyhow::Result<Vec<Row>> {
        let url = format!("{}{}", self.warehouse.base_url, STATEMENTS_PATH);
        let body = ExecuteRequest {
            warehouse_id: &self.warehouse.warehouse_id,
            statement: &statement.sql,
            parameters: &statement.parameters,
            wait_timeout: "50s",
            on_wait_timeout: "CONTINUE",
            disposition: "INLINE",
            format: "JSON_ARRAY",
        };

        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.warehouse.token)
            .json(&body)
            .send()
            .await
            .context("send statement to warehouse")?;
        let mut parsed = read_statement(res).await?;

        // A statement still queued or running after the sync wait keeps going
        // server side; check on it until it settles.
        while matches!(parsed.status.state.as_str(), "PENDING" | "RUNNING") {
            let id = parsed
                .statement_id
                .clone()
                .context("running statement has no statement_id")?;
            debug!(statement_id = %id, state = %parsed.status.state, "waiting on statement");
            tokio::time::sleep(self.warehouse.poll_interval).await;
            parsed = self.status(&id).await?;
        }

        if parsed.status.state != "SUCCEEDED" {
            let message = parsed
                .status
                .error
                .and_then(|e| e.message)
                .unwrap_or_else(|| format!("statement {}", parsed.status.state));
            warn!(statement_id = ?parsed.statement_id, state = %parsed.status.state, "statement did not succeed");
            bail!(message);
        }

        let columns: Vec<String> = parsed
            .manifest
            .map(|m| m.schema.columns.into_iter().map(|c| c.name).collect())
            .unwrap_or_default();

        let mut rows = Vec::new();
        let mut chunk = parsed.result;
        while let Some(data) = chunk.take() {
            rows.extend(
                data.data_array
                    .into_iter()
                    .map(|cells| Row::from_columns(&columns, cells)),
            );
            if let Some(link) = data.next_chunk_internal_link {
                chunk = Some(self.next_chunk(&link).await?);
            }
        }
        Ok(rows)
    }

    async fn status(&self, statement_id: &str) -> anyhow::Result<StatementResponse> {
        let url = format!(
            "{}{}/{}",
            self.warehouse.base_url, STATEMENTS_PATH, statement_id
        );
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.warehouse.token)
            .send()
            .await
            .context("poll statement status")?;
        read_statement(res).await
    }

    async fn next_chunk(&self, link: &str) -> anyhow::Result<ResultData> {
        let url = format!("{}{}", self.warehouse.base_url, link);
        let res = self
            .http
            .get(&url)
            .bearer_auth(&self.warehouse.token)
            .send()
            .await
            .context("fetch result chunk")?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            bail!("warehouse returned {status} for result chunk: {text}");
        }
        res.json().await.context("parse result chunk")
    }
}

async fn read_statement(res: reqwest::Response) -> anyhow::Result<StatementResponse> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        bail!("warehouse returned {status}: {text}");
    }
    res.json().await.context("parse statement response")
}

#[derive(Serialize)]
struct ExecuteRequest<'a> {
    warehouse_id: &'a str,
    statement: &'a str,
    parameters: &'a [StatementParameter],
    wait_timeout: &'static str,
    on_wait_timeout: &'static str,
    disposition: &'static str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct StatementResponse {
    statement_id: Option<String>,
    status: StatementStatus,
    manifest: Option<Manifest>,
    result: Option<ResultData>,
}

#[derive(Debug, Deserialize)]
struct StatementStatus {
    state: String,
    error: Option<ServiceError>,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Manifest {
    schema: ResultSchema,
}

#[derive(Debug, Deserialize)]
struct ResultSchema {
    #[serde(default)]
    columns: Vec<Column>,
}

#[derive(Debug, Deserialize)]
struct Column {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ResultData {
    #[serde(default)]
    data_array: Vec<Vec<Value>>,
    next_chunk_internal_link: Option<String>,
}
