use crate::model::{CONFIDENCE_COLUMN, FieldRecord, PageTable};

/// Mean of the confidences that are present; `None` when none are.
pub(crate) fn mean_confidence(records: &[FieldRecord]) -> Option<f64> {
    let present = records
        .iter()
        .filter_map(|record| record.confidence)
        .collect::<Vec<_>>();
    if present.is_empty() {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let count = present.len() as f64;
    Some(present.iter().sum::<f64>() / count)
}

/// Pivots one page's records into a single row keyed by field name.
///
/// Returns `None` when the page produced no fields. A repeated field name keeps
/// the column position of its first occurrence and the value of its last one.
/// A field named `Confidence` is dropped from the cells; its score still counts
/// toward the page mean, which owns that column.
#[must_use]
pub fn build_page_table(page_index: usize, records: &[FieldRecord]) -> Option<PageTable> {
    let mut cells: Vec<(String, Option<String>)> = Vec::new();
    for record in records {
        if record.name == CONFIDENCE_COLUMN {
            continue;
        }
        let value = record.effective_value().map(str::to_string);
        match cells.iter_mut().find(|(name, _)| *name == record.name) {
            Some(cell) => cell.1 = value,
            None => cells.push((record.name.clone(), value)),
        }
    }
    if cells.is_empty() {
        return None;
    }

    Some(PageTable::new(
        page_index,
        cells,
        mean_confidence(records),
    ))
}
