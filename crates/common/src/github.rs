//! GitHub repository provisioning.
//!
//! Provisioning is a fixed sequence of REST API calls: create a private repository,
//! push the uploaded file into it and push an analysis workflow definition.
//! Calls are never retried, and nothing is rolled back when a later step fails.

pub mod workflow;

use base64::{engine::general_purpose::STANDARD, Engine};
use derive_more::{Display, Error, From};
use reqwest::{header::ACCEPT, Client, Method, RequestBuilder, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn};

use crate::config::{self, Credentials};

pub use workflow::WorkflowTemplate;

/// Path of the workflow file inside provisioned repositories.
pub const WORKFLOW_PATH: &str = ".github/workflows/analyze.yml";

/// `User-Agent` header value, which is required by the GitHub API.
const USER_AGENT: &str = "code-analysis-service";

/// GitHub API media type.
const GITHUB_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Repository provisioning errors.
#[derive(Debug, Display, From, Error)]
pub enum ProvisionError {
    /// Repository creation request was rejected.
    #[display(fmt = "Failed to create repo: {}", _0)]
    #[from(ignore)]
    RepoCreationFailed(#[error(not(source))] String),

    /// File content upload request was rejected.
    #[display(fmt = "Failed to upload file: {}", _0)]
    #[from(ignore)]
    FileUploadFailed(#[error(not(source))] String),

    /// Transport-level or response decoding error.
    Http(reqwest::Error),
}

/// Successfully provisioned repository.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CreatedRepository {
    /// Repository web URL.
    pub repo_url: String,

    /// Repository name.
    pub repo_name: String,

    /// Repository GitHub Actions page URL.
    pub actions_url: String,
}

#[derive(Deserialize)]
struct RepositoryResponse {
    html_url: String,
}

/// Derive a repository name from a project identifier.
pub fn repository_name(project_id: &str) -> String {
    let prefix: String = project_id.chars().take(8).collect();
    format!("code-analysis-{prefix}")
}

/// Configured GitHub API client.
pub struct ConfiguredClient<'a> {
    config: &'a config::Github,
    credentials: Credentials<'a>,
    client: Client,
}

impl<'a> ConfiguredClient<'a> {
    /// Create new [`ConfiguredClient`] from the provided [`Github`] configuration.
    ///
    /// [`Github`]: config::Github
    pub fn new(
        config: &'a config::Github,
        credentials: Credentials<'a>,
    ) -> Result<ConfiguredClient<'a>, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout())
            .build()?;

        Ok(ConfiguredClient {
            config,
            credentials,
            client,
        })
    }

    /// Create a new private repository and push a single file into it.
    ///
    /// A repository that was created before a failed file upload is left in place.
    #[instrument(skip(self, content), err)]
    pub async fn create_repository(
        &self,
        repo_name: &str,
        filename: &str,
        content: &str,
    ) -> Result<CreatedRepository, ProvisionError> {
        debug!("creating repository");

        let response = self
            .request(Method::POST, "/user/repos")
            .json(&json!({
                "name": repo_name,
                "description": format!("Code analysis for {filename}"),
                "private": true,
                "auto_init": false,
            }))
            .send()
            .await?;

        if !is_accepted(response.status()) {
            return Err(ProvisionError::RepoCreationFailed(response.text().await?));
        }

        let repo_url = response.json::<RepositoryResponse>().await?.html_url;

        debug!("uploading file contents");

        let response = self
            .put_contents(
                repo_name,
                filename,
                &format!("Add {filename} for analysis"),
                content.as_bytes(),
            )
            .await?;

        if !is_accepted(response.status()) {
            return Err(ProvisionError::FileUploadFailed(response.text().await?));
        }

        Ok(CreatedRepository {
            actions_url: format!("{repo_url}/actions"),
            repo_url,
            repo_name: repo_name.to_string(),
        })
    }

    /// Push an analysis workflow for the provided language key into the repository.
    ///
    /// Returns `true` if GitHub accepted the workflow file.
    #[instrument(skip(self))]
    pub async fn setup_workflow(&self, repo_name: &str, language: &str) -> bool {
        let document = match WorkflowTemplate::for_language(language).render() {
            Ok(document) => document,
            Err(err) => {
                warn!(%err, "unable to render workflow");
                return false;
            }
        };

        match self
            .put_contents(
                repo_name,
                WORKFLOW_PATH,
                "Add GitHub Actions workflow",
                document.as_bytes(),
            )
            .await
        {
            Ok(response) => {
                let status = response.status();
                if !is_accepted(status) {
                    warn!(%status, "workflow upload was rejected");
                }
                is_accepted(status)
            }
            Err(err) => {
                warn!(%err, "unable to upload workflow");
                false
            }
        }
    }

    /// Create a file in the repository using the contents API.
    async fn put_contents(
        &self,
        repo_name: &str,
        path: &str,
        message: &str,
        content: &[u8],
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.request(
            Method::PUT,
            &format!(
                "/repos/{}/{repo_name}/contents/{path}",
                self.credentials.username
            ),
        )
        .json(&json!({
            "message": message,
            "content": STANDARD.encode(content),
        }))
        .send()
        .await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(
                method,
                format!("{}{path}", self.config.url.trim_end_matches('/')),
            )
            .bearer_auth(self.credentials.token)
            .header(ACCEPT, GITHUB_MEDIA_TYPE)
    }
}

fn is_accepted(status: StatusCode) -> bool {
    matches!(status, StatusCode::OK | StatusCode::CREATED)
}

#[cfg(test)]
mod tests {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::{json, Value};
    use wiremock::{
        matchers::{body_json, header, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    fn github_config(server: &MockServer) -> config::Github {
        config::Github {
            token: Some(String::from("ghp_test")),
            username: Some(String::from("octocat")),
            url: server.uri(),
            timeout: 5,
        }
    }

    async fn mount_repository_creation(server: &MockServer, status: u16) {
        Mock::given(method("POST"))
            .and(path("/user/repos"))
            .and(header("Authorization", "Bearer ghp_test"))
            .and(body_json(json!({
                "name": "code-analysis-1234abcd",
                "description": "Code analysis for main.py",
                "private": true,
                "auto_init": false,
            })))
            .respond_with(if status == 201 {
                ResponseTemplate::new(201).set_body_json(json!({
                    "html_url": "https://github.com/octocat/code-analysis-1234abcd"
                }))
            } else {
                ResponseTemplate::new(status).set_body_string("name already exists on this account")
            })
            .mount(server)
            .await;
    }

    #[test]
    fn repository_names() {
        assert_eq!(
            repository_name("1234abcd-5678-90ef-1234-567890abcdef"),
            "code-analysis-1234abcd"
        );
        assert_eq!(repository_name("abc"), "code-analysis-abc");
    }

    #[tokio::test]
    async fn create_repository() {
        let server = MockServer::start().await;
        mount_repository_creation(&server, 201).await;

        Mock::given(method("PUT"))
            .and(path("/repos/octocat/code-analysis-1234abcd/contents/main.py"))
            .and(body_json(json!({
                "message": "Add main.py for analysis",
                "content": STANDARD.encode("print('hello')\n"),
            })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let config = github_config(&server);
        let client = ConfiguredClient::new(&config, config.credentials().unwrap()).unwrap();

        let repository = client
            .create_repository("code-analysis-1234abcd", "main.py", "print('hello')\n")
            .await
            .unwrap();

        assert_eq!(
            repository,
            CreatedRepository {
                repo_url: String::from("https://github.com/octocat/code-analysis-1234abcd"),
                repo_name: String::from("code-analysis-1234abcd"),
                actions_url: String::from(
                    "https://github.com/octocat/code-analysis-1234abcd/actions"
                ),
            }
        );
    }

    #[tokio::test]
    async fn repository_creation_failure() {
        let server = MockServer::start().await;
        mount_repository_creation(&server, 422).await;

        let config = github_config(&server);
        let client = ConfiguredClient::new(&config, config.credentials().unwrap()).unwrap();

        let err = client
            .create_repository("code-analysis-1234abcd", "main.py", "print('hello')\n")
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::RepoCreationFailed(_)));
        assert_eq!(
            err.to_string(),
            "Failed to create repo: name already exists on this account"
        );
    }

    #[tokio::test]
    async fn file_upload_failure() {
        let server = MockServer::start().await;
        mount_repository_creation(&server, 201).await;

        Mock::given(method("PUT"))
            .and(path("/repos/octocat/code-analysis-1234abcd/contents/main.py"))
            .respond_with(ResponseTemplate::new(409).set_body_string("conflict"))
            .mount(&server)
            .await;

        let config = github_config(&server);
        let client = ConfiguredClient::new(&config, config.credentials().unwrap()).unwrap();

        let err = client
            .create_repository("code-analysis-1234abcd", "main.py", "print('hello')\n")
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::FileUploadFailed(_)));
        assert_eq!(err.to_string(), "Failed to upload file: conflict");
    }

    #[tokio::test]
    async fn unreachable_api() {
        let config = config::Github {
            token: Some(String::from("ghp_test")),
            username: Some(String::from("octocat")),
            url: String::from("http://127.0.0.1:1"),
            timeout: 1,
        };
        let client = ConfiguredClient::new(&config, config.credentials().unwrap()).unwrap();

        let err = client
            .create_repository("code-analysis-1234abcd", "main.py", "")
            .await
            .unwrap_err();

        assert!(matches!(err, ProvisionError::Http(_)));
        assert!(!client.setup_workflow("code-analysis-1234abcd", "python").await);
    }

    /// Decode the workflow document pushed by every received request.
    async fn pushed_workflows(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap()
            .into_iter()
            .map(|request| {
                let body: Value = serde_json::from_slice(&request.body).unwrap();
                assert_eq!(body["message"], "Add GitHub Actions workflow");

                let content = STANDARD
                    .decode(body["content"].as_str().unwrap())
                    .unwrap();
                String::from_utf8(content).unwrap()
            })
            .collect()
    }

    #[tokio::test]
    async fn unknown_language_workflow() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path(
                "/repos/octocat/code-analysis-1234abcd/contents/.github/workflows/analyze.yml",
            ))
            .respond_with(ResponseTemplate::new(201))
            .expect(3)
            .mount(&server)
            .await;

        let config = github_config(&server);
        let client = ConfiguredClient::new(&config, config.credentials().unwrap()).unwrap();

        for language in ["ruby", "python", "javascript"] {
            assert!(client.setup_workflow("code-analysis-1234abcd", language).await);
        }

        let workflows = pushed_workflows(&server).await;

        assert_eq!(workflows[0], workflows[1]);
        assert_ne!(workflows[1], workflows[2]);
        assert_eq!(workflows[1], WorkflowTemplate::Python.render().unwrap());
        assert_eq!(workflows[2], WorkflowTemplate::JavaScript.render().unwrap());
    }

    #[tokio::test]
    async fn rejected_workflow() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;

        let config = github_config(&server);
        let client = ConfiguredClient::new(&config, config.credentials().unwrap()).unwrap();

        assert!(!client.setup_workflow("code-analysis-1234abcd", "python").await);
    }
}
