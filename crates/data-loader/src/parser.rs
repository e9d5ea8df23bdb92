//! Parsers for the four bundle artifacts.
//!
//! - model:          JSON factorization weights
//! - item features:  JSON CSR matrix (`shape`, `indptr`, `indices`, `data`)
//! - mappings:       JSON (`user_to_idx`, `idx_to_item`, `user_seen`, `top_k`)
//! - trending:       CSV table with an `article_id` column, rows in rank order
//!
//! Parsers only check that each artifact is well-formed on its own.
//! Cross-artifact checks live in `bundle.rs`.

use crate::error::{DataLoadError, Result};
use crate::types::{ItemId, Mappings};
use scorer::{FactorizationModel, SparseMatrix};
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Column of the trending table holding article ids
pub const TRENDING_ID_COLUMN: &str = "article_id";

/// Display name for error messages: the file name, or the full path if it has none
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Open an artifact, mapping a missing file to `ArtifactNotFound`
fn open_artifact(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => DataLoadError::ArtifactNotFound {
            name: file_label(path),
            path: path.display().to_string(),
        },
        _ => DataLoadError::IoError(e),
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let reader = BufReader::new(open_artifact(path)?);
    serde_json::from_reader(reader).map_err(|source| DataLoadError::JsonError {
        file: file_label(path),
        source,
    })
}

/// Parse the model artifact and check its weight shapes
pub fn parse_model(path: &Path) -> Result<FactorizationModel> {
    let model: FactorizationModel = read_json(path)?;
    model.validate()?;
    Ok(model)
}

/// Parse the item-feature matrix and check the CSR structure
pub fn parse_item_features(path: &Path) -> Result<SparseMatrix> {
    let matrix: SparseMatrix = read_json(path)?;
    matrix.validate()?;
    Ok(matrix)
}

/// Parse the mappings artifact.
///
/// Missing `user_to_idx`, `idx_to_item` or `user_seen` keys fail here;
/// `top_k` falls back to its default.
pub fn parse_mappings(path: &Path) -> Result<Mappings> {
    let mappings: Mappings = read_json(path)?;
    if mappings.top_k == 0 {
        return Err(DataLoadError::InvalidValue {
            field: "top_k".to_string(),
            value: "0".to_string(),
        });
    }
    Ok(mappings)
}

/// Split one CSV record into cells.
///
/// Commas inside double-quoted fields do not split, `""` inside quotes is a
/// literal quote, and the quotes themselves are dropped. Records never span
/// lines.
fn split_record(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => cells.push(std::mem::take(&mut cell)),
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

/// Strip whitespace and a UTF-8 BOM from a CSV cell
fn clean_cell(cell: &str) -> &str {
    cell.trim().trim_start_matches('\u{feff}').trim()
}

/// Parse the trending table into an ordered list of item ids.
///
/// The first non-empty line is the header; the `article_id` column may be at
/// any position and other columns are ignored. Row order is rank order.
pub fn parse_trending(path: &Path) -> Result<Vec<ItemId>> {
    let file = file_label(path);
    let reader = BufReader::new(open_artifact(path)?);

    let mut id_column: Option<usize> = None;
    let mut trending = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        let line_trimmed = line.trim();
        if line_trimmed.is_empty() {
            continue; // Skip empty lines
        }

        let Some(column) = id_column else {
            // Header row
            let position = split_record(line_trimmed)
                .iter()
                .position(|name| clean_cell(name) == TRENDING_ID_COLUMN)
                .ok_or_else(|| DataLoadError::MissingColumn {
                    file: file.clone(),
                    column: TRENDING_ID_COLUMN.to_string(),
                })?;
            id_column = Some(position);
            continue;
        };

        let cells = split_record(line_trimmed);
        let cell = cells
            .get(column)
            .ok_or_else(|| DataLoadError::ParseError {
                file: file.clone(),
                line: line_no,
                reason: format!("Missing {}", TRENDING_ID_COLUMN),
            })?;

        let item_id: ItemId = clean_cell(cell).parse().map_err(|e| DataLoadError::ParseError {
            file: file.clone(),
            line: line_no,
            reason: format!("Invalid {}: {}", TRENDING_ID_COLUMN, e),
        })?;

        trending.push(item_id);
    }

    if id_column.is_none() {
        return Err(DataLoadError::MissingColumn {
            file,
            column: TRENDING_ID_COLUMN.to_string(),
        });
    }

    Ok(trending)
}
