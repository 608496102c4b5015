use super::table::Table;

fn is_numeric(cell: &str) -> bool {
    cell.trim().parse::<f64>().is_ok()
}

fn median(mut values: Vec<usize>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_unstable();
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) as f64 / 2.0
    } else {
        values[mid] as f64
    }
}

/// A column is text-like unless every non-empty cell parses as a number.
fn is_text_like(table: &Table, index: usize) -> bool {
    let mut non_empty = table
        .column_values(index)
        .filter(|cell| !cell.trim().is_empty())
        .peekable();
    non_empty.peek().is_some() && !non_empty.all(is_numeric)
}

/// Picks the column holding the free text.
///
/// A column whose name contains `text` wins outright. Otherwise the text-like
/// column with the longest median cell wins, and the last column is the
/// fallback. Returns `None` only for a table without columns.
pub fn choose_text_column(table: &Table) -> Option<String> {
    let columns = table.columns();

    if let Some(name) = columns
        .iter()
        .find(|name| name.to_lowercase().contains("text"))
    {
        tracing::info!(column = %name, "text column chosen by name");
        return Some(name.clone());
    }

    let mut best: Option<(usize, f64)> = None;
    for index in 0..columns.len() {
        if !is_text_like(table, index) {
            continue;
        }
        let lengths = table
            .column_values(index)
            .map(|cell| cell.chars().count())
            .collect();
        let score = median(lengths);
        if best.map_or(true, |(_, top)| score > top) {
            best = Some((index, score));
        }
    }

    if let Some((index, median_len)) = best {
        let name = columns[index].clone();
        tracing::info!(column = %name, median_len, "text column chosen by median length");
        return Some(name);
    }

    let name = columns.last().cloned();
    if let Some(name) = &name {
        tracing::warn!(column = %name, "no text-like column found, falling back to last column");
    }
    name
}
