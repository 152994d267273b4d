use std::{io, sync::Arc};

use axum::{
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use axum_derive_error::ErrorResponse;
use common::language;
use derive_more::{Display, Error, From};
use serde::Serialize;
use tracing::info;

use crate::storage::{sanitize_filename, Storage};

/// Name of the multipart form field that carries the uploaded file.
const FILE_FIELD: &str = "file";

/// Errors that may occur during the file upload process.
#[derive(ErrorResponse, Display, From, Error)]
pub(super) enum UploadError {
    /// Storage-related error.
    IoError(io::Error),

    /// `multipart/form-data` request handling error.
    #[status(StatusCode::BAD_REQUEST)]
    #[from(ignore)]
    MultipartError(MultipartError),

    /// Request body exceeded the configured upload limit.
    #[status(StatusCode::PAYLOAD_TOO_LARGE)]
    #[display(fmt = "File too large")]
    FileTooLarge,

    /// Request didn't have a file field in it.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "No file part")]
    NoFileUpload,

    /// File field had an empty file name.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "No selected file")]
    NoSelectedFile,

    /// File extension is not in the list of supported languages.
    #[status(StatusCode::BAD_REQUEST)]
    #[display(fmt = "File type not allowed")]
    InvalidFileType,
}

impl From<MultipartError> for UploadError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::FileTooLarge
        } else {
            Self::MultipartError(err)
        }
    }
}

/// JSON response body.
#[derive(Serialize)]
pub(super) struct UploadResponse {
    /// Status message.
    message: &'static str,

    /// Generated project identifier.
    project_id: String,

    /// Sanitized file name, which must be used to reference the file later.
    filename: String,

    /// Detected language label.
    language: &'static str,

    /// Absolute path to the stored file.
    file_path: String,
}

/// Upload a single source file as a new project.
///
/// This route accepts a `multipart/form-data` form with a `file` field. The file
/// name must have an extension of one of the supported languages.
pub(super) async fn upload(
    State(storage): State<Arc<Storage>>,
    mut data: Multipart,
) -> Result<Json<UploadResponse>, UploadError> {
    let mut upload = None;

    while let Some(field) = data.next_field().await? {
        if field.name() == Some(FILE_FIELD) {
            let filename = field.file_name().unwrap_or_default().to_string();
            upload = Some((filename, field.bytes().await?));
            break;
        }
    }

    let (filename, contents) = upload.ok_or(UploadError::NoFileUpload)?;

    if filename.is_empty() {
        return Err(UploadError::NoSelectedFile);
    }

    if !language::is_allowed(&filename) {
        return Err(UploadError::InvalidFileType);
    }

    let filename = sanitize_filename(&filename);

    if !language::is_allowed(&filename) {
        return Err(UploadError::InvalidFileType);
    }

    let file = storage.store(&filename, &contents).await?;

    info!(
        project_id = %file.project_id,
        filename = %file.filename,
        language = %file.language,
        size = file.size,
        "stored uploaded file"
    );

    Ok(Json(UploadResponse {
        message: "File uploaded successfully",
        project_id: file.project_id.to_string(),
        filename: file.filename,
        language: file.language.label(),
        file_path: file.path.display().to_string(),
    }))
}
