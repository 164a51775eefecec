use serde::Serialize;

pub const CONFIDENCE_COLUMN: &str = "Confidence";

/// One field recognized on one page by the extraction service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldRecord {
    pub name: String,
    pub value: Option<String>,
    pub content: Option<String>,
    pub confidence: Option<f64>,
}

impl FieldRecord {
    #[must_use]
    pub fn new(name: impl Into<String>, value: Option<&str>, confidence: Option<f64>) -> Self {
        Self {
            name: name.into(),
            value: value.map(str::to_string),
            content: None,
            confidence,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    /// The recognized value, or the raw text content when the service gave no value.
    #[must_use]
    pub fn effective_value(&self) -> Option<&str> {
        non_empty(self.value.as_deref()).or_else(|| non_empty(self.content.as_deref()))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    pub index: usize,
    pub png: Vec<u8>,
}

/// Single-row table built from one page's fields.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTable {
    page_index: usize,
    cells: Vec<(String, Option<String>)>,
    confidence: Option<f64>,
}

impl PageTable {
    pub(crate) fn new(
        page_index: usize,
        cells: Vec<(String, Option<String>)>,
        confidence: Option<f64>,
    ) -> Self {
        Self {
            page_index,
            cells,
            confidence,
        }
    }

    #[must_use]
    pub fn page_index(&self) -> usize {
        self.page_index
    }

    #[must_use]
    pub fn cells(&self) -> &[(String, Option<String>)] {
        &self.cells
    }

    #[must_use]
    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(field, _)| field == name)
            .and_then(|(_, value)| value.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRow {
    pub page_index: usize,
    pub name: Option<String>,
    pub confidence: Option<f64>,
    pub cells: Vec<(String, Option<String>)>,
}

impl DocumentRow {
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == field)
            .and_then(|(_, value)| value.as_deref())
    }
}

/// Aggregated table for a whole document.
///
/// Column 0 is the relabelled name field, column 1 is the page confidence and
/// the remaining columns are field names in first-appearance order. Rows stay
/// sparse until [`DocumentTable::materialize`] lays them out over `columns`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentTable {
    pub(crate) columns: Vec<String>,
    pub(crate) rows: Vec<DocumentRow>,
}

impl DocumentTable {
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn rows(&self) -> &[DocumentRow] {
        &self.rows
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Field columns after the name and confidence columns.
    #[must_use]
    pub fn field_columns(&self) -> &[String] {
        self.columns.get(2..).unwrap_or_default()
    }

    /// Fixed-width rendering: one `Option<String>` per column, `None` for empty cells.
    #[must_use]
    pub fn materialize(&self) -> Vec<Vec<Option<String>>> {
        self.rows
            .iter()
            .map(|row| {
                let mut out = Vec::with_capacity(self.columns.len());
                out.push(row.name.clone());
                out.push(row.confidence.map(|confidence| confidence.to_string()));
                out.extend(
                    self.field_columns()
                        .iter()
                        .map(|field| row.get(field).map(str::to_string)),
                );
                out
            })
            .collect()
    }
}
