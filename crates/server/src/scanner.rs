//! Line-based static checks.
//!
//! The scanner does not parse source code. It only flags overly long lines and
//! tab indentation, and collects a few basic file metrics.

use std::path::Path;

use serde::{ser::SerializeMap, Serialize, Serializer};
use tokio::fs;

/// Max visible line length, in characters.
const MAX_LINE_LENGTH: usize = 120;

/// Length of the code snippet attached to long line warnings, in characters.
const SNIPPET_LENGTH: usize = 50;

/// Glyph that replaces tab characters in code snippets.
const TAB_GLYPH: &str = "→";

/// Warning attached to a single line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Warning {
    /// 1-indexed line number.
    pub line: usize,

    /// Human-readable description.
    pub message: String,

    /// Code snippet of the offending line.
    pub code: String,
}

/// Basic file metrics.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub(crate) struct Metrics {
    /// Total count of lines.
    pub total_lines: usize,

    /// Count of lines that contain anything besides whitespace.
    pub non_empty_lines: usize,

    /// File size reported by the filesystem, in bytes.
    pub file_size: u64,
}

/// Static scan results.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct AnalysisReport {
    /// Errors that prevented the scan from completing.
    pub errors: Vec<String>,

    /// Per-line warnings, in line order.
    pub warnings: Vec<Warning>,

    /// File metrics, serialized as an empty object if the file could not be read.
    #[serde(serialize_with = "serialize_metrics")]
    pub metrics: Option<Metrics>,
}

fn serialize_metrics<S: Serializer>(
    metrics: &Option<Metrics>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match metrics {
        Some(metrics) => metrics.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

/// Scan the file at the provided path.
///
/// Read errors never fail the scan, instead they are recorded in [`AnalysisReport::errors`].
pub(crate) async fn scan(path: &Path) -> AnalysisReport {
    let mut report = AnalysisReport::default();

    let source = match fs::read_to_string(path).await {
        Ok(source) => source,
        Err(err) => {
            report.errors.push(err.to_string());
            return report;
        }
    };

    let file_size = match fs::metadata(path).await {
        Ok(metadata) => metadata.len(),
        Err(err) => {
            report.errors.push(err.to_string());
            return report;
        }
    };

    let mut total_lines = 0;
    let mut non_empty_lines = 0;

    for (idx, line) in lines(&source).enumerate() {
        total_lines += 1;

        if !line.trim().is_empty() {
            non_empty_lines += 1;
        }

        check_line(idx + 1, line, &mut report.warnings);
    }

    report.metrics = Some(Metrics {
        total_lines,
        non_empty_lines,
        file_size,
    });

    report
}

/// Split source code into lines.
///
/// Unlike [`str::lines`], a lone `\r` is also accepted as a line terminator, so
/// files with classic Mac OS line endings are not scanned as a single line.
fn lines(source: &str) -> impl Iterator<Item = &str> {
    let mut rest = source;

    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }

        let end = rest.find(['\n', '\r']).unwrap_or(rest.len());
        let line = &rest[..end];

        let terminator = if rest[end..].starts_with("\r\n") {
            2
        } else {
            usize::from(end < rest.len())
        };
        rest = &rest[end + terminator..];

        Some(line)
    })
}

/// Run every line check, pushing found issues into `warnings`.
///
/// Length is measured without trailing whitespace. Both checks are independent,
/// so a single line may produce two warnings.
fn check_line(number: usize, line: &str, warnings: &mut Vec<Warning>) {
    let visible = line.trim_end();
    let length = visible.chars().count();

    if length > MAX_LINE_LENGTH {
        let code = if length > SNIPPET_LENGTH {
            let snippet: String = visible.chars().take(SNIPPET_LENGTH).collect();
            format!("{snippet}...")
        } else {
            visible.to_string()
        };

        warnings.push(Warning {
            line: number,
            message: format!("Line too long ({length} characters)"),
            code,
        });
    }

    if line.contains('\t') {
        warnings.push(Warning {
            line: number,
            message: String::from("Tab character found, use spaces instead"),
            code: line.replace('\t', TAB_GLYPH),
        });
    }
}
