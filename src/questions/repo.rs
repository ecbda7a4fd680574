use anyhow::Context;

use crate::questions::repo_types::GeneratedQuestion;
use crate::warehouse::{Row, Statement, Warehouse};

impl GeneratedQuestion {
    /// All rows stored under one question set id.
    pub async fn list_by_question_id(
        db: &dyn Warehouse,
        table: &str,
        question_id: &str,
    ) -> anyhow::Result<Vec<GeneratedQuestion>> {
        let stmt = Statement::new(format!(
            "SELECT question_id, user_id, questions, generated_at FROM {table} \
             WHERE question_id = :question_id"
        ))
        .bind("question_id", question_id);

        db.query(stmt)
            .await
            .context("fetch generated questions")?
            .into_iter()
            .map(Row::decode)
            .collect()
    }
}
