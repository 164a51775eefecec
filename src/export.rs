use std::path::Path;
use std::str::FromStr;

use csv::WriterBuilder;
use rust_xlsxwriter::{Format, Workbook};

use crate::error::ExtractError;
use crate::model::DocumentTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Xlsx,
    Csv,
}

impl ExportFormat {
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Xlsx => "dados_extraidos.xlsx",
            Self::Csv => "dados_extraidos.csv",
        }
    }

    #[must_use]
    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.ms-excel",
            Self::Csv => "text/csv; charset=utf-8",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(Self::Xlsx),
            "csv" => Ok(Self::Csv),
            other => Err(format!("unknown export format '{other}', expected xlsx or csv")),
        }
    }
}

fn cell_position(row: usize, col: usize) -> Result<(u32, u16), ExtractError> {
    let row = u32::try_from(row)
        .map_err(|_| ExtractError::InvalidOption(format!("row {row} exceeds sheet limits")))?;
    let col = u16::try_from(col)
        .map_err(|_| ExtractError::InvalidOption(format!("column {col} exceeds sheet limits")))?;
    Ok((row, col))
}

/// Writes the table as a single-sheet workbook: a bold header row, then one row per page.
///
/// The confidence column is stored as a number; empty cells are left blank.
pub fn export_xlsx(table: &DocumentTable) -> Result<Vec<u8>, ExtractError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, label) in table.columns().iter().enumerate() {
        let (row, col) = cell_position(0, col)?;
        worksheet.write_string_with_format(row, col, label, &header_format)?;
    }

    for (index, document_row) in table.rows().iter().enumerate() {
        let (row, _) = cell_position(index + 1, 0)?;
        if let Some(name) = &document_row.name {
            worksheet.write_string(row, 0, name)?;
        }
        if let Some(confidence) = document_row.confidence {
            worksheet.write_number(row, 1, confidence)?;
        }
        for (offset, field) in table.field_columns().iter().enumerate() {
            if let Some(value) = document_row.get(field) {
                let (row, col) = cell_position(index + 1, offset + 2)?;
                worksheet.write_string(row, col, value)?;
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub fn export_csv(table: &DocumentTable, delimiter: u8) -> Result<String, ExtractError> {
    let mut writer = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::<u8>::new());
    writer.write_record(table.columns())?;
    for row in table.materialize() {
        writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or_default()))?;
    }
    writer.flush()?;

    let bytes = writer
        .into_inner()
        .map_err(|error| ExtractError::Csv(error.into_error().into()))?;
    String::from_utf8(bytes)
        .map_err(|error| ExtractError::InvalidOption(format!("invalid utf-8 csv output: {error}")))
}

pub fn export_bytes(
    table: &DocumentTable,
    format: ExportFormat,
    delimiter: u8,
) -> Result<Vec<u8>, ExtractError> {
    match format {
        ExportFormat::Xlsx => export_xlsx(table),
        ExportFormat::Csv => export_csv(table, delimiter).map(String::into_bytes),
    }
}

pub fn write_export(
    path: &Path,
    table: &DocumentTable,
    format: ExportFormat,
    delimiter: u8,
) -> Result<(), ExtractError> {
    let bytes = export_bytes(table, format, delimiter)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
