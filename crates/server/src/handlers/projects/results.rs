use axum::{extract::Path, Json};
use serde::Serialize;

/// Single finding reported by a CI run.
#[derive(Serialize)]
pub(super) struct Finding {
    #[serde(rename = "type")]
    kind: &'static str,
    message: &'static str,
    line: u32,
}

/// JSON response body.
#[derive(Serialize)]
pub(super) struct ResultsResponse {
    status: &'static str,
    project_id: String,
    findings: Vec<Finding>,
}

/// Get CI analysis results of a project.
///
/// Results of provisioned workflow runs are not collected yet, so this route
/// responds with the same placeholder findings for every project identifier.
// TODO: query workflow runs of the provisioned repository via the GitHub Actions API.
pub(super) async fn results(Path(project_id): Path<String>) -> Json<ResultsResponse> {
    Json(ResultsResponse {
        status: "completed",
        project_id,
        findings: vec![
            Finding {
                kind: "warning",
                message: "Unused variable found",
                line: 10,
            },
            Finding {
                kind: "error",
                message: "Syntax error",
                line: 15,
            },
            Finding {
                kind: "info",
                message: "Code complexity is high",
                line: 0,
            },
        ],
    })
}
