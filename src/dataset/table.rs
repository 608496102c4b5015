use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use crate::error::{Result, TalkSenseError};

/// Column names given to a headerless file with exactly four columns.
pub const HEADERLESS_COLUMNS: [&str; 4] = ["id", "topic", "sentiment", "text"];

/// Header cells longer than this are taken to be data, not column names.
const MAX_HEADER_CELL_CHARS: usize = 50;

/// An in-memory CSV table of string cells. Missing cells are empty strings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Returns `true` when a tentative header row reads like natural text.
pub fn header_looks_like_data(cells: &[String]) -> bool {
    cells
        .iter()
        .any(|cell| cell.chars().count() > MAX_HEADER_CELL_CHARS || cell.contains(' '))
}

fn read_records<R: Read>(reader: R) -> Result<Vec<Vec<String>>> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for record in csv_reader.records() {
        let record = record?;
        records.push(record.iter().map(str::to_string).collect());
    }
    Ok(records)
}

impl Table {
    /// Builds a table, padding short rows with empty cells and naming any
    /// column the header did not cover.
    pub fn new(mut columns: Vec<String>, mut rows: Vec<Vec<String>>) -> Self {
        let width = rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(columns.len()))
            .max()
            .unwrap_or(0);

        for idx in columns.len()..width {
            columns.push(format!("Unnamed_{idx}"));
        }
        for row in &mut rows {
            row.resize(width, String::new());
        }

        Self { columns, rows }
    }

    /// Reads a CSV of unknown shape, guessing whether it has a header.
    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TalkSenseError::file(path, e))?;
        let table = Self::from_reader(file)?;
        tracing::debug!(?path, rows = table.len(), columns = ?table.columns, "read csv");
        Ok(table)
    }

    /// Reads a CSV whose first record is always the header, such as the files
    /// written by [`Table::write_csv`].
    pub fn read_csv_with_header<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TalkSenseError::file(path, e))?;
        let table = Self::from_reader_with_header(file)?;
        tracing::debug!(?path, rows = table.len(), columns = ?table.columns, "read csv");
        Ok(table)
    }

    /// Reads CSV, deciding from the first record whether the file has a header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut records = read_records(reader)?.into_iter();
        let Some(first) = records.next() else {
            return Ok(Self::default());
        };

        if header_looks_like_data(&first) {
            let mut rows = vec![first];
            rows.extend(records);
            let width = rows.iter().map(Vec::len).max().unwrap_or(0);
            let columns = if width == HEADERLESS_COLUMNS.len() {
                tracing::info!(
                    columns = ?HEADERLESS_COLUMNS,
                    "csv has no header, assigning column names"
                );
                HEADERLESS_COLUMNS.iter().map(|c| c.to_string()).collect()
            } else {
                tracing::info!(width, "csv has no header, using positional column names");
                (0..width).map(|idx| idx.to_string()).collect()
            };
            Ok(Self::new(columns, rows))
        } else {
            Ok(Self::new(first, records.collect()))
        }
    }

    pub fn from_reader_with_header<R: Read>(reader: R) -> Result<Self> {
        let mut records = read_records(reader)?.into_iter();
        match records.next() {
            Some(header) => Ok(Self::new(header, records.collect())),
            None => Ok(Self::default()),
        }
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TalkSenseError::file(parent, e))?;
        }
        let file = File::create(path).map_err(|e| TalkSenseError::file(path, e))?;
        self.to_writer(file)
    }

    pub fn to_writer<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new().from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, in row order.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .map(move |row| row.get(index).map_or("", String::as_str))
    }

    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let index = self
            .column_index(name)
            .ok_or_else(|| TalkSenseError::MissingColumn(name.to_string()))?;
        Ok(self.column_values(index).collect())
    }

    /// Replaces the named column, or appends it when absent.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(TalkSenseError::LengthMismatch {
                what: "column values vs rows",
                left: values.len(),
                right: self.rows.len(),
            });
        }

        match self.column_index(name) {
            Some(index) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[index] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_file_with_header() {
        let csv = "id,sentiment,text\n1,Positive,great game\n2,Negative,\n";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), ["id", "sentiment", "text"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("text").unwrap(), vec!["great game", ""]);
    }

    #[test]
    fn headerless_four_columns_get_names() {
        let csv = "2401,Borderlands,Positive,im getting on borderlands and i will murder you all\n\
                   2402,Borderlands,Negative,so bad\n";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), HEADERLESS_COLUMNS);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("sentiment").unwrap(), vec!["Positive", "Negative"]);
    }

    #[test]
    fn headerless_other_width_gets_positional_names() {
        let csv = "Positive,what a lovely day it is\nNegative,awful\n";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), ["0", "1"]);
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn short_rows_are_padded() {
        let csv = "a,b,c\n1\n1,2,3,4\n";
        let table = Table::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), ["a", "b", "c", "Unnamed_3"]);
        assert_eq!(table.rows()[0], vec!["1", "", "", ""]);
    }

    #[test]
    fn padded_header_survives_a_round_trip() {
        let table = Table::from_reader("a,b\n1,2,3\n".as_bytes()).unwrap();
        let mut buffer = Vec::new();
        table.to_writer(&mut buffer).unwrap();
        let guessed = Table::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(guessed.columns(), ["a", "b", "Unnamed_2"]);
    }

    #[test]
    fn header_is_trusted_when_asked() {
        let csv = "tweet text,label\nhello there,Positive\n";
        let table = Table::from_reader_with_header(csv.as_bytes()).unwrap();
        assert_eq!(table.columns(), ["tweet text", "label"]);
        assert_eq!(table.len(), 1);
        assert!(Table::from_reader_with_header("".as_bytes()).unwrap().is_empty());
    }

    #[test]
    fn empty_input_is_an_empty_table() {
        let table = Table::from_reader("".as_bytes()).unwrap();
        assert!(table.is_empty());
        assert!(table.columns().is_empty());
    }

    #[test]
    fn set_column_appends_then_overwrites() {
        let mut table = Table::new(
            vec!["text".into()],
            vec![vec!["A".into()], vec!["B".into()]],
        );
        table.set_column("clean", vec!["a".into(), "b".into()]).unwrap();
        table.set_column("clean", vec!["x".into(), "y".into()]).unwrap();
        assert_eq!(table.columns(), ["text", "clean"]);
        assert_eq!(table.column("clean").unwrap(), vec!["x", "y"]);
        assert!(table.set_column("clean", vec![]).is_err());
    }

    #[test]
    fn write_then_read_keeps_header() {
        let table = Table::new(
            vec!["text".into(), "sentiment".into()],
            vec![vec!["hello, world".into(), "Positive".into()]],
        );
        let mut buffer = Vec::new();
        table.to_writer(&mut buffer).unwrap();
        let reread = Table::from_reader(buffer.as_slice()).unwrap();
        assert_eq!(reread, table);
    }
}
