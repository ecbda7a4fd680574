use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::questions::repo_types::GeneratedQuestion;

/// Request body for starting a question-generation run.
#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    pub user_id: String,
    pub role: String,
    pub level: String,
    pub techstack: Vec<String>,
    #[serde(rename = "type")]
    pub question_type: String,
    pub amount: u32,
}

/// Both shapes are sent with 200; clients tell them apart by the `error` key.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum GenerateQuestionsResponse {
    Started {
        message: &'static str,
        run_id: Option<i64>,
        user_id: String,
    },
    Rejected {
        error: &'static str,
        details: Value,
    },
}

#[derive(Debug, Deserialize)]
pub struct FetchQuestionsRequest {
    pub question_id: String,
}

#[derive(Debug, Serialize)]
pub struct FetchQuestionsResponse {
    pub user_id: String, // echoes the requested question_id
    pub questions: Vec<GeneratedQuestion>,
}
