//! Reading and rewriting the `---` delimited frontmatter block of a markdown file
//!
//! The block is YAML. It must be a mapping with string keys; key order is
//! kept from the file and written back unchanged.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::document::Frontmatter;
use super::error::BackendError;

pub const DELIMITER: &str = "---";

/// Result of locating the frontmatter block in a file
#[derive(Debug, PartialEq, Eq)]
enum Split<'a> {
    /// No block; the whole file is body
    Body(&'a str),
    Block { block: &'a str, body: &'a str },
    Unterminated,
}

fn split(content: &str) -> Split<'_> {
    let mut offset = 0;
    let mut block_start = 0;
    for line in content.split_inclusive('\n') {
        let trimmed = line.trim_end();
        if offset == 0 {
            if trimmed != DELIMITER {
                return Split::Body(content);
            }
            block_start = line.len();
        } else if trimmed == DELIMITER {
            return Split::Block {
                block: &content[block_start..offset],
                body: &content[offset + line.len()..],
            };
        }
        offset += line.len();
    }

    if offset == 0 {
        Split::Body(content)
    } else {
        Split::Unterminated
    }
}

/// Read and parse the frontmatter of the file at `path`
pub fn read_file(path: &Path) -> Result<Frontmatter, BackendError> {
    let content = fs::read_to_string(path)?;
    let display = path.display().to_string();
    match split(&content) {
        Split::Body(_) => Ok(Frontmatter::new()),
        Split::Block { block, .. } => parse_block(block, &display),
        Split::Unterminated => Err(BackendError::Parse {
            path: display,
            message: "frontmatter block is not closed".to_string(),
        }),
    }
}

/// Replace the frontmatter block of the file at `path`, keeping its body
pub fn write_file(path: &Path, frontmatter: &Frontmatter) -> Result<(), BackendError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err.into()),
    };
    let body = match split(&content) {
        Split::Body(body) => body,
        Split::Block { body, .. } => body,
        Split::Unterminated => {
            return Err(BackendError::Parse {
                path: path.display().to_string(),
                message: "frontmatter block is not closed".to_string(),
            })
        }
    };

    let rendered = format!("{DELIMITER}\n{}{DELIMITER}\n{body}", render_block(frontmatter)?);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, rendered)?;
    Ok(())
}

/// Parse the text between the delimiters.
///
/// An empty block, or one holding only comments, is empty frontmatter.
pub fn parse_block(block: &str, path: &str) -> Result<Frontmatter, BackendError> {
    let error = |message: String| BackendError::Parse {
        path: path.to_string(),
        message,
    };

    let blank = block.lines().all(|line| {
        let trimmed = line.trim();
        trimmed.is_empty() || trimmed.starts_with('#')
    });
    if blank {
        return Ok(Frontmatter::new());
    }

    let value: Value = serde_yaml_ng::from_str(block).map_err(|e| error(e.to_string()))?;
    match value {
        Value::Null => Ok(Frontmatter::new()),
        Value::Object(map) => Ok(Frontmatter::from(map)),
        other => Err(error(format!(
            "expected a mapping of keys to values, found {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "nothing",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

/// Render frontmatter as YAML, without delimiters
pub fn render_block(frontmatter: &Frontmatter) -> Result<String, BackendError> {
    if frontmatter.is_empty() {
        return Ok(String::new());
    }
    serde_yaml_ng::to_string(frontmatter).map_err(|e| BackendError::Format(e.to_string()))
}
