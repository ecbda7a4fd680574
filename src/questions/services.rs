use crate::jobs::NotebookParams;
use crate::questions::dto::GenerateQuestionsRequest;

/// Builds the notebook parameters for a generation run. Every value is a string.
pub fn notebook_params(req: &GenerateQuestionsRequest) -> NotebookParams {
    [
        ("user_id", req.user_id.clone()),
        ("role", req.role.clone()),
        ("level", req.level.clone()),
        ("techstack", req.techstack.join(",")),
        ("type", req.question_type.clone()),
        ("amount", req.amount.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}
