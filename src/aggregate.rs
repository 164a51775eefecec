use crate::error::ExtractError;
use crate::model::{CONFIDENCE_COLUMN, DocumentRow, DocumentTable, PageTable};

pub const DEFAULT_NAME_LABEL: &str = "NOME";

/// Picks the field that is relabelled as the document's name column.
///
/// Precondition: the extractor emits the name field last, so it sits directly
/// before the `Confidence` column appended by the page builder. The choice is
/// positional, not semantic: a page whose fields arrive in another order gets
/// the wrong field labelled as the name. Swap this function for a lookup by
/// field name once the model's schema is known.
#[must_use]
pub fn designated_name_column(page: &PageTable) -> Option<usize> {
    page.cells().len().checked_sub(1)
}

/// Concatenates page tables in page order and applies the canonical layout.
///
/// Layout: `[name_label, Confidence, ...remaining fields in first-appearance order]`.
/// Empty page tables are dropped; if nothing remains the result is
/// [`ExtractError::NoDataExtracted`].
pub fn aggregate(pages: Vec<PageTable>, name_label: &str) -> Result<DocumentTable, ExtractError> {
    let mut pages = pages
        .into_iter()
        .filter(|page| !page.is_empty())
        .collect::<Vec<_>>();
    if pages.is_empty() {
        return Err(ExtractError::NoDataExtracted);
    }
    pages.sort_by_key(PageTable::page_index);

    let mut field_columns: Vec<String> = Vec::new();
    let mut rows = Vec::with_capacity(pages.len());

    for page in &pages {
        let name_index = designated_name_column(page);
        let mut name = None;
        let mut cells = Vec::with_capacity(page.cells().len().saturating_sub(1));

        for (index, (field, value)) in page.cells().iter().enumerate() {
            if Some(index) == name_index {
                name.clone_from(value);
                continue;
            }
            if !field_columns.contains(field) {
                field_columns.push(field.clone());
            }
            cells.push((field.clone(), value.clone()));
        }

        rows.push(DocumentRow {
            page_index: page.page_index(),
            name,
            confidence: page.confidence(),
            cells,
        });
    }

    let mut columns = Vec::with_capacity(field_columns.len() + 2);
    columns.push(name_label.to_string());
    columns.push(CONFIDENCE_COLUMN.to_string());
    columns.extend(field_columns);

    Ok(DocumentTable { columns, rows })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{DEFAULT_NAME_LABEL, aggregate, designated_name_column};
    use crate::error::ExtractError;
    use crate::model::{FieldRecord, PageTable};
    use crate::page_table::build_page_table;

    fn page(index: usize, fields: &[(&str, &str, f64)]) -> PageTable {
        let records = fields
            .iter()
            .map(|(name, value, confidence)| FieldRecord::new(*name, Some(*value), Some(*confidence)))
            .collect::<Vec<_>>();
        build_page_table(index, &records).expect("fixture page should have fields")
    }

    #[test]
    fn name_column_is_the_last_field_before_confidence() {
        let table = page(0, &[("Valor", "1", 0.5), ("Nome", "Ana", 0.5)]);
        assert_eq!(designated_name_column(&table), Some(1));
    }

    #[test]
    fn canonical_layout_moves_name_and_confidence_first() {
        let pages = vec![
            page(0, &[("Valor", "100", 0.9), ("Nome", "Ana", 0.8)]),
            page(
                1,
                &[
                    ("Valor", "200", 0.95),
                    ("Data", "2024-01-01", 0.85),
                    ("Nome", "Bruno", 0.99),
                ],
            ),
        ];

        let table = aggregate(pages, DEFAULT_NAME_LABEL).expect("aggregation should succeed");
        assert_eq!(table.columns(), &["NOME", "Confidence", "Valor", "Data"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.rows()[0].name.as_deref(), Some("Ana"));
        assert_eq!(table.rows()[0].get("Data"), None);
        assert_eq!(table.rows()[1].get("Data"), Some("2024-01-01"));
    }

    #[test]
    fn label_replaces_designated_field_name() {
        let pages = vec![page(0, &[("Cliente", "Ana", 1.0)])];
        let table = aggregate(pages, "NAME").expect("aggregation should succeed");
        assert_eq!(table.columns(), &["NAME", "Confidence"]);
        assert_eq!(table.rows()[0].name.as_deref(), Some("Ana"));
    }

    #[test]
    fn extracted_confidence_field_does_not_duplicate_the_column() {
        let pages = vec![page(
            0,
            &[("Confidence", "HIGH", 0.4), ("Valor", "1", 0.6), ("Nome", "Ana", 0.8)],
        )];
        let table = aggregate(pages, DEFAULT_NAME_LABEL).expect("aggregation should succeed");
        assert_eq!(table.columns(), &["NOME", "Confidence", "Valor"]);
        assert_eq!(table.rows()[0].name.as_deref(), Some("Ana"));
    }

    #[test]
    fn rows_follow_page_order() {
        let pages = vec![
            page(4, &[("Nome", "late", 1.0)]),
            page(1, &[("Nome", "early", 1.0)]),
        ];
        let table = aggregate(pages, DEFAULT_NAME_LABEL).expect("aggregation should succeed");
        let names = table
            .rows()
            .iter()
            .map(|row| row.name.as_deref())
            .collect::<Vec<_>>();
        assert_eq!(names, vec![Some("early"), Some("late")]);
    }

    #[test]
    fn no_pages_is_no_data() {
        let error = aggregate(Vec::new(), DEFAULT_NAME_LABEL).expect_err("empty input must fail");
        assert!(matches!(error, ExtractError::NoDataExtracted));
    }
}
