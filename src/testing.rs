//! In-memory doubles for the warehouse and the job orchestrator.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{body::Body, http::Request, Router};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::config::{AppConfig, JobsConfig, WarehouseConfig};
use crate::jobs::{JobLauncher, NotebookParams, RunOutcome};
use crate::state::AppState;
use crate::warehouse::{Row, Statement, Warehouse};

/// Stores inserted rows per table and answers `WHERE col = :col` reads.
#[derive(Default)]
pub struct FakeWarehouse {
    tables: Mutex<HashMap<String, Vec<Row>>>,
    statements: Mutex<Vec<Statement>>,
    failure: Option<String>,
}

impl FakeWarehouse {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn insert_row(&self, table: &str, row: Row) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .push(row);
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every statement seen so far, in order.
    pub fn statements(&self) -> Vec<Statement> {
        self.statements.lock().unwrap().clone()
    }

    fn record(&self, statement: &Statement) -> anyhow::Result<()> {
        self.statements.lock().unwrap().push(statement.clone());
        match &self.failure {
            Some(msg) => Err(anyhow::anyhow!(msg.clone())),
            None => Ok(()),
        }
    }
}

fn table_after(sql: &str, keyword: &str) -> Option<String> {
    let mut words = sql.split_whitespace();
    words.find(|w| w.eq_ignore_ascii_case(keyword))?;
    words.next().map(|t| t.to_string())
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    async fn execute(&self, statement: Statement) -> anyhow::Result<u64> {
        self.record(&statement)?;
        let table = table_after(&statement.sql, "INTO").expect("insert names a table");
        let row = statement
            .parameters
            .iter()
            .map(|p| (p.name.clone(), Value::String(p.value.clone())))
            .collect();
        self.insert_row(&table, row);
        Ok(1)
    }

    async fn query(&self, statement: Statement) -> anyhow::Result<Vec<Row>> {
        self.record(&statement)?;
        let table = table_after(&statement.sql, "FROM").expect("select names a table");
        let rows = self
            .rows(&table)
            .into_iter()
            .filter(|row| {
                statement.parameters.iter().all(|p| {
                    row.get(&p.name).and_then(Value::as_str) == Some(p.value.as_str())
                })
            })
            .collect();
        Ok(rows)
    }
}

/// Records every run-now call and answers with a fixed outcome.
pub struct FakeJobs {
    pub calls: Mutex<Vec<(i64, NotebookParams)>>,
    outcome: RunOutcome,
}

impl FakeJobs {
    pub fn answering(outcome: RunOutcome) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            outcome,
        }
    }
}

impl Default for FakeJobs {
    fn default() -> Self {
        Self::answering(RunOutcome::Started { run_id: Some(1001) })
    }
}

#[async_trait]
impl JobLauncher for FakeJobs {
    async fn run_now(&self, job_id: i64, params: NotebookParams) -> anyhow::Result<RunOutcome> {
        self.calls.lock().unwrap().push((job_id, params));
        Ok(self.outcome.clone())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        warehouse: WarehouseConfig {
            host: "fake.cloud.databricks.com".into(),
            http_path: "/sql/1.0/warehouses/fake".into(),
            token: "fake".into(),
            catalog: "pesu".into(),
            schema: "assessment".into(),
        },
        jobs: JobsConfig {
            host: "fake.cloud.databricks.com".into(),
            token: "fake".into(),
            job_id: 42,
        },
    }
}

pub fn fake_state(warehouse: Arc<FakeWarehouse>, jobs: Arc<FakeJobs>) -> AppState {
    AppState::from_parts(Arc::new(test_config()), warehouse, jobs)
}

/// POSTs a JSON body through the router and returns status and decoded body.
pub async fn post_json(app: Router, uri: &str, body: Value) -> (axum::http::StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let res = app.oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
