//! On-disk project storage.
//!
//! Every project is a directory named after its UUID under the storage root,
//! holding exactly one uploaded file:
//!
//! ```text
//! <root>/<project id>/<sanitized file name>
//! ```
//!
//! Project directories are written once during upload and never modified afterwards.

use std::{
    io,
    path::{Path, PathBuf},
};

use common::language::Language;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::fs;
use unicode_normalization::UnicodeNormalization;
use uuid::Uuid;

/// Characters that are not allowed to appear in stored file names.
static UNSAFE_CHARACTERS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^A-Za-z0-9_.-]").expect("invalid regex string"));

/// Make a user-provided file name safe to use as a single path component.
///
/// Letters are folded to ASCII through their compatibility decomposition, so
/// `résumé.rb` becomes `resume.rb`. Path separators and whitespace are collapsed
/// into underscores, any other character outside of `[A-Za-z0-9_.-]` is dropped,
/// and leading or trailing dots and underscores are trimmed. The result may be empty.
pub(crate) fn sanitize_filename(filename: &str) -> String {
    let folded: String = filename.nfkd().filter(char::is_ascii).collect();

    let joined = folded
        .replace(['/', '\\'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    UNSAFE_CHARACTERS
        .replace_all(&joined, "")
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}

/// File stored inside of a project directory.
#[derive(Debug)]
pub(crate) struct StoredFile {
    /// Owning project identifier.
    pub project_id: Uuid,

    /// Sanitized file name.
    pub filename: String,

    /// Language detected from the file extension.
    pub language: Language,

    /// File size, in bytes.
    pub size: u64,

    /// Absolute file path.
    pub path: PathBuf,
}

/// Project storage rooted at a single directory.
pub(crate) struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Open the storage, creating its root directory if necessary.
    pub(crate) async fn open(root: &Path) -> io::Result<Self> {
        fs::create_dir_all(root).await?;

        Ok(Self {
            root: fs::canonicalize(root).await?,
        })
    }

    /// Store file contents under a freshly generated project identifier.
    ///
    /// The provided file name must already be sanitized with [`sanitize_filename`].
    pub(crate) async fn store(&self, filename: &str, contents: &[u8]) -> io::Result<StoredFile> {
        let project_id = Uuid::new_v4();

        let project_dir = self.root.join(project_id.to_string());
        fs::create_dir_all(&project_dir).await?;

        let path = project_dir.join(filename);
        fs::write(&path, contents).await?;

        Ok(StoredFile {
            project_id,
            filename: filename.to_string(),
            language: Language::from_filename(filename),
            size: contents.len() as u64,
            path,
        })
    }

    /// Locate a previously stored file.
    ///
    /// Returns [`None`] if the project or the file does not exist. Identifiers that
    /// are not UUIDs and file names that are not sanitized can never name a stored
    /// file, and are reported as missing as well. Any accepted UUID spelling
    /// (braced, uppercase, simple or URN) resolves to the canonical identifier
    /// returned in [`StoredFile::project_id`].
    pub(crate) async fn locate(&self, project_id: &str, filename: &str) -> Option<StoredFile> {
        let project_id = Uuid::parse_str(project_id).ok()?;

        if filename.is_empty() || sanitize_filename(filename) != filename {
            return None;
        }

        let path = self.root.join(project_id.to_string()).join(filename);

        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Some(StoredFile {
                project_id,
                filename: filename.to_string(),
                language: Language::from_filename(filename),
                size: metadata.len(),
                path,
            }),
            _ => None,
        }
    }
}
