use std::{error::Error, io::Cursor, sync::Arc};

use axum::{
    async_trait,
    body::Body,
    http::Request,
    response::Response,
    Router,
};
use common::config::Config;
use common_multipart_rfc7578::client::multipart;
use hyper::body::{self, Bytes, HttpBody};
use serde::Serialize;
use tempfile::TempDir;
use tower::ServiceExt;

use crate::storage::Storage;

/// Isolated server environment with its own upload directory.
pub(crate) struct TestEnv {
    config: Arc<Config>,
    storage: Arc<Storage>,
    _dir: TempDir,
}

impl TestEnv {
    /// Create a new environment with GitHub provisioning disabled.
    pub(crate) async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a new environment, adjusting the test configuration beforehand.
    pub(crate) async fn with_config<F: FnOnce(&mut Config)>(f: F) -> Self {
        let dir = tempfile::tempdir().expect("unable to create temporary directory");

        let mut config = Config::for_tests(dir.path().join("uploads"));
        f(&mut config);

        let storage = Storage::open(&config.storage.path)
            .await
            .expect("unable to open storage");

        Self {
            config: Arc::new(config),
            storage: Arc::new(storage),
            _dir: dir,
        }
    }

    pub(crate) fn router(&self) -> Router {
        crate::app_router(self.storage.clone(), self.config.clone())
    }

    /// Upload a file using the `multipart/form-data` upload route.
    pub(crate) async fn upload(&self, filename: &str, contents: &str) -> Response {
        let mut form = multipart::Form::default();
        form.add_reader_file("file", Cursor::new(contents.as_bytes().to_vec()), filename);

        self.router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/upload")
                    .header("Content-Type", form.content_type())
                    .body(Body::wrap_stream(multipart::Body::from(form)))
                    .unwrap(),
            )
            .await
            .unwrap()
    }
}

pub(crate) trait RequestBodyExt: Sized {
    fn from_json<B: Serialize>(val: B) -> Self;
}

impl<T> RequestBodyExt for T
where
    T: HttpBody + From<Vec<u8>>,
{
    fn from_json<B: Serialize>(val: B) -> Self {
        T::from(serde_json::to_vec(&val).expect("unable to serialize"))
    }
}

#[async_trait(?Send)]
pub(crate) trait ResponseBodyExt {
    async fn bytes(self) -> Bytes;

    async fn json(self) -> serde_json::Value;
}

#[async_trait(?Send)]
impl<T> ResponseBodyExt for T
where
    T: HttpBody,
    T::Error: Error,
{
    async fn bytes(self) -> Bytes {
        body::to_bytes(self)
            .await
            .expect("unable to convert to bytes")
    }

    async fn json(self) -> serde_json::Value {
        serde_json::from_slice(&self.bytes().await).expect("unable to convert to json")
    }
}
