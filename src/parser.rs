//! Front matter parser
//!
//! Splits a source file into its YAML front matter (as a JSON value) and the
//! body the stage chain works on. Front matter is optional. Data files
//! (`.yml`, `.yaml`) are parsed whole and keep their text as the body.

use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{LatheError, LatheResult};

/// Delimiter for frontmatter sections
const FRONTMATTER_DELIMITER: &str = "---";

/// Result of extracting frontmatter from content
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedFrontmatter {
    /// The raw YAML content of the frontmatter
    pub yaml: String,
    /// The content body after the frontmatter
    pub body: String,
    /// Line number where frontmatter ends (for error reporting)
    pub end_line: usize,
}

/// Parsed source: front matter data plus the remaining body
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSource {
    pub data: Value,
    pub body: String,
}

/// Extract frontmatter from file content
///
/// Returns `Ok(None)` when the file doesn't open with a `---` line.
///
/// # Example
/// ```text
/// ---
/// title: Home
/// $render: _layout.html
/// ---
/// # Page content here
/// ```
pub fn extract_frontmatter(content: &str, file: &Path) -> LatheResult<Option<ExtractedFrontmatter>> {
    let mut lines = content.split_inclusive('\n');
    let yaml_start = match lines.next() {
        Some(first) if first.trim_end() == FRONTMATTER_DELIMITER => first.len(),
        _ => return Ok(None),
    };

    let mut offset = yaml_start;
    for (index, line) in lines.enumerate() {
        if line.trim_end() == FRONTMATTER_DELIMITER {
            let yaml = content[yaml_start..offset].to_string();
            let body = content[offset + line.len()..].to_string();
            return Ok(Some(ExtractedFrontmatter {
                yaml,
                body,
                end_line: index + 2,
            }));
        }
        offset += line.len();
    }

    Err(LatheError::InvalidFrontmatter {
        file: file.to_path_buf(),
        message: "front matter opened with '---' is never closed".to_string(),
    })
}

/// Parse frontmatter YAML into a JSON value
///
/// An empty block yields an empty object.
pub fn parse_frontmatter(yaml: &str, file: &Path, first_line: usize) -> LatheResult<Value> {
    if yaml.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    let value: Value = serde_yaml_ng::from_str(yaml).map_err(|e| LatheError::InvalidFrontmatter {
        file: file.to_path_buf(),
        message: format_yaml_error(yaml, &e, first_line),
    })?;
    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        other => Ok(other),
    }
}

/// Parse a source file's text
pub fn parse_source(content: &str, file: &Path) -> LatheResult<ParsedSource> {
    if is_data_file(file) {
        let data = parse_frontmatter(content, file, 1)?;
        return Ok(ParsedSource {
            data: match data {
                Value::Object(_) => data,
                _ => Value::Object(Map::new()),
            },
            body: content.to_string(),
        });
    }

    match extract_frontmatter(content, file)? {
        Some(extracted) => Ok(ParsedSource {
            data: parse_frontmatter(&extracted.yaml, file, 2)?,
            body: extracted.body,
        }),
        None => Ok(ParsedSource {
            data: Value::Object(Map::new()),
            body: content.to_string(),
        }),
    }
}

fn is_data_file(file: &Path) -> bool {
    matches!(
        file.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}

fn format_yaml_error(yaml: &str, err: &serde_yaml_ng::Error, first_line: usize) -> String {
    let Some(location) = err.location() else {
        return format!("Invalid YAML - {}", err);
    };

    // location lines are 1-based within the YAML block
    let line = location.line();
    let file_line = line + first_line - 1;
    let mut message = format!("Line {}: Invalid YAML - {}", file_line, err);
    if let Some(snippet) = yaml.lines().nth(line.saturating_sub(1)) {
        message.push_str(&format!("\n  {} | {}", file_line, snippet));
        message.push_str(&format!(
            "\n  {} | {}^",
            " ".repeat(file_line.to_string().len()),
            " ".repeat(location.column().saturating_sub(1))
        ));
    }
    if err.to_string().contains("mapping values are not allowed") {
        message.push_str("\nHint: Strings with colons need quotes: title: \"My: Page\"");
    }
    message
}
