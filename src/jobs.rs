use std::collections::BTreeMap;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::{base_url, JobsConfig};

const RUN_NOW_PATH: &str = "/api/2.0/jobs/run-now";

/// String parameters handed to the job's notebook.
pub type NotebookParams = BTreeMap<String, String>;

/// What the orchestrator said about a run-now request.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Started { run_id: Option<i64> },
    Rejected { status: u16, details: Value },
}

#[async_trait]
pub trait JobLauncher: Send + Sync {
    async fn run_now(&self, job_id: i64, params: NotebookParams) -> anyhow::Result<RunOutcome>;
}

/// Databricks Jobs API client.
#[derive(Clone)]
pub struct DatabricksJobs {
    base_url: String,
    token: String,
    http: reqwest::Client,
}

impl DatabricksJobs {
    pub fn new(config: &JobsConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("interview-gateway/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build jobs http client")?;
        Ok(Self {
            base_url: base_url(&config.host),
            token: config.token.clone(),
            http,
        })
    }
}

#[derive(Serialize)]
struct RunNowRequest<'a> {
    job_id: i64,
    notebook_params: &'a NotebookParams,
}

#[derive(Deserialize)]
struct RunNowResponse {
    run_id: Option<i64>,
}

#[async_trait]
impl JobLauncher for DatabricksJobs {
    #[instrument(skip(self, params))]
    async fn run_now(&self, job_id: i64, params: NotebookParams) -> anyhow::Result<RunOutcome> {
        let url = format!("{}{}", self.base_url, RUN_NOW_PATH);
        let res = self
            .http
            .post(&url)
            .bearer_auth(&self.token)
            .json(&RunNowRequest {
                job_id,
                notebook_params: &params,
            })
            .send()
            .await
            .context("send run-now request")?;

        let status = res.status();
        if status == reqwest::StatusCode::OK {
            let body: RunNowResponse = res.json().await.context("parse run-now response")?;
            debug!(job_id, run_id = ?body.run_id, "run-now accepted");
            return Ok(RunOutcome::Started { run_id: body.run_id });
        }

        let text = res.text().await.unwrap_or_default();
        let details = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
        warn!(job_id, %status, "run-now rejected");
        Ok(RunOutcome::Rejected {
            status: status.as_u16(),
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{all_of, matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    fn jobs_for(server: &Server) -> DatabricksJobs {
        DatabricksJobs::new(&JobsConfig {
            host: format!("http://{}", server.addr()),
            token: "secret-token".into(),
            job_id: 77,
        })
        .expect("jobs client builds")
    }

    fn params() -> NotebookParams {
        [("role", "Backend"), ("techstack", "Go,SQL")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn run_now_returns_run_id_on_ok() {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", RUN_NOW_PATH),
                request::headers(contains(key("authorization"))),
                request::body(json_decoded(eq(json!({
                    "job_id": 77,
                    "notebook_params": {"role": "Backend", "techstack": "Go,SQL"}
                })))),
            ])
            .respond_with(json_encoded(json!({"run_id": 455644833, "number_in_job": 1}))),
        );

        let outcome = jobs_for(&server).run_now(77, params()).await.unwrap();
        assert_eq!(outcome, RunOutcome::Started { run_id: Some(455644833) });
    }

    #[tokio::test]
    async fn run_now_passes_back_json_error_body() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", RUN_NOW_PATH)).respond_with(
                status_code(400).body(
                    r#"{"error_code":"INVALID_PARAMETER_VALUE","message":"Job 77 does not exist."}"#,
                ),
            ),
        );

        let outcome = jobs_for(&server).run_now(77, params()).await.unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Rejected {
                status: 400,
                details: json!({
                    "error_code": "INVALID_PARAMETER_VALUE",
                    "message": "Job 77 does not exist."
                }),
            }
        );
    }

    #[tokio::test]
    async fn run_now_keeps_non_json_error_body_as_text() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", RUN_NOW_PATH))
                .respond_with(status_code(502).body("Bad Gateway")),
        );

        let outcome = jobs_for(&server).run_now(77, params()).await.unwrap();
        assert_eq!(
            outcome,
            RunOutcome::Rejected {
                status: 502,
                details: json!("Bad Gateway"),
            }
        );
    }
}
