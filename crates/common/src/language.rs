//! Closed set of source languages accepted for upload.
//!
//! Language detection is driven purely by the file extension and never fails:
//! anything outside of [`Language::SUPPORTED`] degrades to [`Language::Unknown`].

use std::fmt;

/// Source code language, detected from a file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    Java,
    Cpp,
    C,
    Go,
    Rust,
    TypeScript,
    Php,
    Ruby,
    Unknown,
}

impl Language {
    /// Languages that are accepted for upload.
    pub const SUPPORTED: [Language; 10] = [
        Language::Python,
        Language::JavaScript,
        Language::Java,
        Language::Cpp,
        Language::C,
        Language::Go,
        Language::Rust,
        Language::TypeScript,
        Language::Php,
        Language::Ruby,
    ];

    /// Detect language from a file extension, ignoring its case.
    pub fn from_extension(extension: &str) -> Language {
        Self::SUPPORTED
            .into_iter()
            .find(|language| {
                language
                    .extension()
                    .is_some_and(|known| known.eq_ignore_ascii_case(extension))
            })
            .unwrap_or(Language::Unknown)
    }

    /// Detect language of the provided file name.
    pub fn from_filename(filename: &str) -> Language {
        extension(filename)
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// File extension associated with this language.
    pub fn extension(&self) -> Option<&'static str> {
        Some(match self {
            Language::Python => "py",
            Language::JavaScript => "js",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
            Language::Rust => "rs",
            Language::TypeScript => "ts",
            Language::Php => "php",
            Language::Ruby => "rb",
            Language::Unknown => return None,
        })
    }

    /// Human-readable language label.
    pub fn label(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::Cpp => "C++",
            Language::C => "C",
            Language::Go => "Go",
            Language::Rust => "Rust",
            Language::TypeScript => "TypeScript",
            Language::Php => "PHP",
            Language::Ruby => "Ruby",
            Language::Unknown => "Unknown",
        }
    }

    /// Lowercase machine-readable key, used to pick CI workflow templates.
    pub fn key(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Go => "go",
            Language::Rust => "rust",
            Language::TypeScript => "typescript",
            Language::Php => "php",
            Language::Ruby => "ruby",
            Language::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Get the extension of a file name, which is everything after the last dot.
pub fn extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, extension)| extension)
}

/// Check whether the file name has an extension of a supported language.
pub fn is_allowed(filename: &str) -> bool {
    Language::from_filename(filename) != Language::Unknown
}
