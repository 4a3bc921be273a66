//! Frontmatter export to and import from `.xlsx` workbooks
//!
//! Layout of the first sheet: the first row holds relative paths starting at
//! the second column, the first column holds keys starting at the second row.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde_json::{Number, Value};
use umya_spreadsheet::{reader, writer, Worksheet};

use super::document::Frontmatter;
use super::error::BackendError;
use super::frontmatter;

const LIST_SEPARATOR: &str = ", ";

/// Render a value as the text shown in a cell
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(cell_text)
            .collect::<Vec<_>>()
            .join(LIST_SEPARATOR),
        Value::Object(_) => value.to_string(),
    }
}

/// Parse cell text back into a value
pub fn parse_cell(text: &str) -> Value {
    if text.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if text.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if let Ok(int) = text.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Some(number) = text.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(number);
    }
    if text.contains(LIST_SEPARATOR) {
        return Value::Array(
            text.split(LIST_SEPARATOR)
                .map(|item| parse_cell(item.trim()))
                .collect(),
        );
    }
    if text.starts_with('{') && text.ends_with('}') {
        if let Ok(value) = serde_json::from_str(text) {
            return value;
        }
    }
    Value::String(text.to_string())
}

/// Build the sheet for `data` (relative path -> frontmatter)
pub fn build_rows(data: &BTreeMap<String, Frontmatter>) -> Vec<Vec<String>> {
    let mut seen = HashSet::new();
    let mut keys: Vec<&String> = Vec::new();
    for frontmatter in data.values() {
        for key in frontmatter.keys() {
            if seen.insert(key) {
                keys.push(key);
            }
        }
    }

    let mut header = vec![String::new()];
    header.extend(data.keys().cloned());

    let mut rows = vec![header];
    for key in keys {
        let mut row = vec![key.clone()];
        row.extend(
            data.values()
                .map(|fm| fm.get(key).map(cell_text).unwrap_or_default()),
        );
        rows.push(row);
    }
    rows
}

fn workbook_error(err: impl std::fmt::Display) -> BackendError {
    BackendError::Format(format!("spreadsheet: {}", err))
}

/// Write the sheet for `data` to the workbook at `destination`
pub fn export(data: &BTreeMap<String, Frontmatter>, destination: &Path) -> Result<(), BackendError> {
    let rows = build_rows(data);
    let mut book = umya_spreadsheet::new_file();
    let sheet = book
        .get_sheet_mut(&0)
        .ok_or_else(|| workbook_error("new workbook has no sheet"))?;

    for (row, cells) in (1u32..).zip(&rows) {
        for (col, text) in (1u32..).zip(cells) {
            if !text.is_empty() {
                sheet.get_cell_mut((col, row)).set_value(text.as_str());
            }
        }
    }

    writer::xlsx::write(&book, destination).map_err(workbook_error)?;
    tracing::info!("Exported {} documents to {}", data.len(), destination.display());
    Ok(())
}

fn cell(sheet: &Worksheet, col: u32, row: u32) -> String {
    sheet
        .get_cell((col, row))
        .map(|cell| cell.get_value().to_string())
        .unwrap_or_default()
}

/// Read the first sheet of the workbook at `source` into rows.
///
/// Paths are read across the first row and keys down the first column, each
/// up to the first empty cell.
pub fn read_rows(source: &Path) -> Result<Vec<Vec<String>>, BackendError> {
    let book = reader::xlsx::read(source).map_err(workbook_error)?;
    let sheet = book
        .get_sheet(&0)
        .ok_or_else(|| workbook_error("workbook has no sheet"))?;

    let width = (2u32..).take_while(|&col| !cell(sheet, col, 1).is_empty()).count() as u32;
    let height = (2u32..).take_while(|&row| !cell(sheet, 1, row).is_empty()).count() as u32;

    Ok((1..=height + 1)
        .map(|row| (1..=width + 1).map(|col| cell(sheet, col, row)).collect())
        .collect())
}

/// Read a sheet back into relative path -> frontmatter, skipping empty cells
pub fn parse_rows(rows: &[Vec<String>]) -> BTreeMap<String, Frontmatter> {
    let Some(header) = rows.first() else {
        return BTreeMap::new();
    };
    let paths: Vec<&String> = header
        .iter()
        .skip(1)
        .take_while(|path| !path.is_empty())
        .collect();

    let mut data: BTreeMap<String, Frontmatter> = BTreeMap::new();
    for row in rows.iter().skip(1) {
        let Some(key) = row.first().filter(|key| !key.is_empty()) else {
            break;
        };
        for (col, path) in paths.iter().enumerate() {
            let Some(cell) = row.get(col + 1).filter(|cell| !cell.is_empty()) else {
                continue;
            };
            data.entry(path.to_string())
                .or_default()
                .set(key.clone(), parse_cell(cell));
        }
    }
    data
}

/// Import a sheet, writing each column's frontmatter under `base_directory`
pub fn import(source: &Path, base_directory: &Path) -> Result<String, BackendError> {
    let data = parse_rows(&read_rows(source)?);

    let mut written = 0;
    let mut failed = 0;
    for (relative, frontmatter) in &data {
        let target = base_directory.join(relative.trim_start_matches(['/', '\\']));
        match frontmatter::write_file(&target, frontmatter) {
            Ok(()) => written += 1,
            Err(err) => {
                tracing::warn!("Failed to import frontmatter into {}: {}", target.display(), err);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        Ok(format!("Import finished: {written} files written, {failed} failed"))
    } else {
        Ok(format!("Import finished: {written} files written"))
    }
}
