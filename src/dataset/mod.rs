//! CSV tables, text-column detection and the train/test split.
mod columns;
mod split;
mod table;

pub use columns::choose_text_column;
pub use split::{train_test_split, SplitIndices};
pub use table::{header_looks_like_data, Table, HEADERLESS_COLUMNS};

use std::path::Path;

use crate::error::{Result, TalkSenseError};

/// Writes a single-column label file with `name` as its header.
pub fn write_labels<P: AsRef<Path>>(path: P, name: &str, labels: &[String]) -> Result<()> {
    let rows = labels.iter().map(|label| vec![label.clone()]).collect();
    Table::new(vec![name.to_string()], rows).write_csv(path)
}

/// Reads the first column of a label file written by [`write_labels`].
pub fn read_labels<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| TalkSenseError::file(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let mut labels = Vec::new();
    for record in reader.records() {
        let record = record?;
        labels.push(record.get(0).unwrap_or_default().to_string());
    }
    Ok(labels)
}
