use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use axum_derive_error::ErrorResponse;
use common::{
    config::{self, Config, Credentials},
    github::{self, CreatedRepository, ProvisionError},
};
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};
use validator::Validate;

use crate::{
    scanner::{self, AnalysisReport},
    storage::{Storage, StoredFile},
    validation::{ValidatedJson, ValidatedQuery},
};

/// Errors that may occur during the analysis request handling.
#[derive(ErrorResponse, Display, Error)]
pub(super) enum AnalyzeError {
    /// Project directory or the requested file does not exist.
    #[status(StatusCode::NOT_FOUND)]
    #[display(fmt = "File not found")]
    ProjectNotFound,
}

/// Analysis request, accepted either as a JSON body or a query string.
#[derive(Deserialize, Validate)]
pub(super) struct AnalyzeRequest {
    /// Project identifier returned from the upload route.
    #[serde(default)]
    #[validate(length(min = 1, message = "missing project_id"))]
    project_id: String,

    /// Sanitized file name returned from the upload route.
    #[serde(default)]
    #[validate(length(min = 1, message = "missing filename"))]
    filename: String,
}

/// Outcome of GitHub repository provisioning.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum GithubActions {
    /// Repository was created, and the file was pushed into it.
    Created {
        success: bool,

        #[serde(flatten)]
        repository: CreatedRepository,

        /// Whether GitHub accepted the workflow file.
        workflow_configured: bool,
    },

    /// GitHub rejected one of the provisioning requests.
    Rejected { success: bool, error: String },

    /// Provisioning could not be performed at all.
    Failed { error: String },
}

/// JSON response body.
#[derive(Serialize)]
pub(super) struct AnalyzeResponse {
    static_analysis: AnalysisReport,
    github_actions: Option<GithubActions>,
    project_id: String,
}

/// Analyze a previously uploaded file, using a JSON request body.
pub(super) async fn analyze(
    Extension(config): Extension<Arc<Config>>,
    State(storage): State<Arc<Storage>>,
    ValidatedJson(request): ValidatedJson<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    analyze_project(&config, &storage, request).await
}

/// Analyze a previously uploaded file, using a query string.
pub(super) async fn analyze_query(
    Extension(config): Extension<Arc<Config>>,
    State(storage): State<Arc<Storage>>,
    ValidatedQuery(request): ValidatedQuery<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    analyze_project(&config, &storage, request).await
}

/// Run the static scan and, if GitHub credentials are configured, provision a repository.
///
/// Provisioning failures never fail the request, they are reported inline instead.
async fn analyze_project(
    config: &Config,
    storage: &Storage,
    request: AnalyzeRequest,
) -> Result<Json<AnalyzeResponse>, AnalyzeError> {
    let file = storage
        .locate(&request.project_id, &request.filename)
        .await
        .ok_or(AnalyzeError::ProjectNotFound)?;

    let project_id = file.project_id.to_string();
    let static_analysis = scanner::scan(&file.path).await;

    info!(
        %project_id,
        filename = %file.filename,
        warnings = static_analysis.warnings.len(),
        errors = static_analysis.errors.len(),
        "static analysis completed"
    );

    let github_actions = match config.github.credentials() {
        Some(credentials) => Some(
            provision(&config.github, credentials, &project_id, &file)
                .await
                .unwrap_or_else(|err| {
                    warn!(%project_id, %err, "repository provisioning failed");
                    GithubActions::Failed {
                        error: err.to_string(),
                    }
                }),
        ),
        None => None,
    };

    Ok(Json(AnalyzeResponse {
        static_analysis,
        github_actions,
        project_id,
    }))
}

/// Create a repository for the project, push the file and its analysis workflow.
async fn provision(
    config: &config::Github,
    credentials: Credentials<'_>,
    project_id: &str,
    file: &StoredFile,
) -> Result<GithubActions, anyhow::Error> {
    let content = fs::read_to_string(&file.path).await?;
    let client = github::ConfiguredClient::new(config, credentials)?;
    let repo_name = github::repository_name(project_id);

    let repository = match client
        .create_repository(&repo_name, &file.filename, &content)
        .await
    {
        Ok(repository) => repository,
        Err(ProvisionError::Http(err)) => return Err(err.into()),
        Err(err) => {
            warn!(%project_id, %err, "GitHub rejected repository provisioning");
            return Ok(GithubActions::Rejected {
                success: false,
                error: err.to_string(),
            });
        }
    };

    let workflow_configured = client
        .setup_workflow(&repo_name, file.language.key())
        .await;

    info!(
        %project_id,
        repo_url = %repository.repo_url,
        workflow_configured,
        "repository provisioned"
    );

    Ok(GithubActions::Created {
        success: true,
        repository,
        workflow_configured,
    })
}
