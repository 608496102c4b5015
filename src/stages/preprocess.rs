use std::path::Path;

use crate::dataset::{choose_text_column, Table};
use crate::error::{Result, TalkSenseError};
use crate::text::clean_text;

use super::CLEAN_TEXT_COLUMN;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessSummary {
    pub rows: usize,
    pub text_column: String,
}

/// Cleans the detected text column of `input` into a `clean_text` column.
pub fn run(input: &Path, output: &Path) -> Result<PreprocessSummary> {
    let mut table = Table::read_csv(input)?;
    tracing::info!(path = ?input, rows = table.len(), "loaded raw data");

    let text_column = choose_text_column(&table).ok_or_else(|| {
        TalkSenseError::EmptyDataset(format!("{} has no columns", input.display()))
    })?;

    let cleaned = table
        .column(&text_column)?
        .into_iter()
        .map(clean_text)
        .collect();
    table.set_column(CLEAN_TEXT_COLUMN, cleaned)?;
    table.write_csv(output)?;

    tracing::info!(path = ?output, rows = table.len(), column = %text_column, "wrote cleaned data");
    Ok(PreprocessSummary {
        rows: table.len(),
        text_column,
    })
}
