use std::{net::SocketAddr, path::PathBuf, time::Duration};

use byte_unit::n_mib_bytes;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

#[cfg(feature = "logging")]
use tracing_subscriber::filter::LevelFilter;

/// HTTP server configuration.
#[derive(Deserialize)]
pub struct Server {
    /// Address, that HTTP server will listen on.
    #[serde(default = "default_address")]
    pub address: SocketAddr,

    /// Max request body size accepted by the upload route, in bytes.
    #[serde(default = "default_upload_limit")]
    pub upload_limit: usize,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            address: default_address(),
            upload_limit: default_upload_limit(),
        }
    }
}

fn default_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 5000))
}

fn default_upload_limit() -> usize {
    n_mib_bytes!(10) as usize
}

/// Uploaded project storage configuration.
#[derive(Deserialize)]
pub struct Storage {
    /// Root directory, under which every project receives its own subdirectory.
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("/tmp/uploads")
}

/// GitHub repository provisioning configuration.
///
/// Repository provisioning is enabled only when both
/// [`token`](Github::token) and [`username`](Github::username) are set.
#[derive(Deserialize)]
pub struct Github {
    /// Personal access token used as a bearer token.
    #[serde(default)]
    pub token: Option<String>,

    /// Account name that owns provisioned repositories.
    #[serde(default)]
    pub username: Option<String>,

    /// GitHub REST API base URL.
    #[serde(default = "default_github_url")]
    pub url: String,

    /// Timeout applied to every outgoing API request, in seconds.
    #[serde(default = "default_github_timeout")]
    pub timeout: u64,
}

impl Default for Github {
    fn default() -> Self {
        Self {
            token: None,
            username: None,
            url: default_github_url(),
            timeout: default_github_timeout(),
        }
    }
}

fn default_github_url() -> String {
    String::from("https://api.github.com")
}

fn default_github_timeout() -> u64 {
    30
}

/// Borrowed GitHub account credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Credentials<'a> {
    /// Bearer token.
    pub token: &'a str,

    /// Account name.
    pub username: &'a str,
}

impl Github {
    /// Get configured credentials, if both token and account name are present.
    ///
    /// Empty values are treated as absent.
    pub fn credentials(&self) -> Option<Credentials<'_>> {
        let token = self.token.as_deref().filter(|token| !token.is_empty())?;
        let username = self
            .username
            .as_deref()
            .filter(|username| !username.is_empty())?;

        Some(Credentials { token, username })
    }

    /// Get request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}

/// Implementation of [`serde`]'s deserializer for [`FromStr`] types.
#[cfg(feature = "logging")]
fn deserialize_from_str<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: std::str::FromStr,
    T::Err: std::error::Error,
    D: serde::de::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    std::str::FromStr::from_str(&s).map_err(serde::de::Error::custom)
}

/// Logging configuration.
#[cfg(feature = "logging")]
#[derive(Deserialize)]
pub struct Logging {
    /// Log level.
    #[serde(deserialize_with = "deserialize_from_str")]
    pub level: LevelFilter,
}

#[cfg(feature = "logging")]
impl Default for Logging {
    fn default() -> Self {
        Self {
            level: LevelFilter::WARN,
        }
    }
}

/// General configuration.
#[derive(Deserialize)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: Server,

    /// Upload storage configuration.
    #[serde(default)]
    pub storage: Storage,

    /// GitHub provisioning configuration.
    #[serde(default)]
    pub github: Github,

    /// Logging configuration.
    #[cfg(feature = "logging")]
    #[serde(default)]
    pub logging: Logging,
}

impl Config {
    /// Create new config using default configuration file or environment variables.
    ///
    /// Besides `CONFIG_`-prefixed variables, plain `GITHUB_TOKEN` and `GITHUB_USERNAME`
    /// variables are accepted as GitHub credentials.
    ///
    /// See [`Env`] for more details on how to use environment variables configuration.
    ///
    /// [`Env`]: figment::providers::Env
    pub fn new(path: Option<PathBuf>) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// Layered configuration sources, lowest priority first.
    fn figment(path: Option<PathBuf>) -> Figment {
        Figment::new()
            .merge(Toml::file(path.unwrap_or(PathBuf::from("Config.toml"))))
            .merge(Env::prefixed("CONFIG_").split("_"))
            .merge(Env::raw().only(&["GITHUB_TOKEN", "GITHUB_USERNAME"]).split("_"))
    }

    /// Create new config suitable for running unit tests.
    ///
    /// GitHub provisioning is disabled, and uploads are stored under `storage_path`.
    #[cfg(feature = "test-utils")]
    pub fn for_tests(storage_path: PathBuf) -> Self {
        Self {
            server: Server {
                address: "127.0.0.1:5000".parse().unwrap(),
                upload_limit: default_upload_limit(),
            },
            storage: Storage { path: storage_path },
            github: Github::default(),
            #[cfg(feature = "logging")]
            logging: Logging::default(),
        }
    }
}
