mod aggregate;
mod config;
mod display;
mod error;
mod export;
mod extractor;
mod model;
mod options;
mod page_table;
mod pdf_info;
mod rasterize;
mod warning;

use chrono::{DateTime, Utc};
use serde::Serialize;

pub use aggregate::{DEFAULT_NAME_LABEL, aggregate, designated_name_column};
pub use config::{DEFAULT_CONFIG_PATH, FileConfig, ServiceConfig};
pub use display::render_text_table;
pub use error::ExtractError;
pub use export::{ExportFormat, export_bytes, export_csv, export_xlsx, write_export};
pub use extractor::{API_VERSION, FieldExtractor, FormRecognizerClient};
pub use model::{CONFIDENCE_COLUMN, DocumentRow, DocumentTable, FieldRecord, PageImage, PageTable};
pub use options::{DEFAULT_DPI, DEFAULT_PAGE_CAP, ExtractOptions};
pub use page_table::build_page_table;
pub use pdf_info::count_pages;
pub use rasterize::{PageRasterizer, PdfiumRasterizer};
pub use warning::{ExtractWarning, WarningCode};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub page_count: usize,
    pub pages_processed: usize,
    pub pages_with_fields: usize,
    pub row_count: usize,
    pub columns: Vec<String>,
    pub generated_at: DateTime<Utc>,
    pub warnings: Vec<ExtractWarning>,
}

/// Runs one PDF through rasterization, field extraction and aggregation.
///
/// Pages are handled strictly in order and only the first `options.page_cap`
/// are rendered. Each page's extraction finishes before the next page is
/// rendered, and any extractor failure aborts the whole document. When no page
/// yields a field the result is [`ExtractError::NoDataExtracted`].
///
/// The rasterizer is the only reader of `pdf`; the page count in the report
/// is the one it returns.
pub fn extract_document(
    pdf: &[u8],
    config: &ServiceConfig,
    rasterizer: &dyn PageRasterizer,
    extractor: &dyn FieldExtractor,
    options: &ExtractOptions,
) -> Result<(DocumentTable, ExtractionReport), ExtractError> {
    options.validate()?;
    tracing::info!(
        bytes = pdf.len(),
        page_cap = options.page_cap,
        model = config.model_id(),
        "extracting document"
    );

    let mut pages = Vec::new();
    let mut warnings = Vec::new();
    let mut pages_processed = 0_usize;

    let page_count = rasterizer.visit_pages(pdf, options.page_cap, &mut |image| {
        pages_processed += 1;
        let records = extractor.analyze(config.model_id(), &image.png)?;
        tracing::debug!(page = image.index, fields = records.len(), "page analyzed");

        let unscored = records
            .iter()
            .filter(|record| record.confidence.is_none())
            .count();
        if unscored > 0 {
            warnings.push(
                ExtractWarning::new(
                    WarningCode::MissingConfidence,
                    format!("{unscored} field(s) had no confidence and were left out of the mean"),
                )
                .with_page(image.index),
            );
        }

        match build_page_table(image.index, &records) {
            Some(table) => pages.push(table),
            None => {
                tracing::warn!(page = image.index, "no fields extracted from page");
                warnings.push(
                    ExtractWarning::new(WarningCode::EmptyPage, "no fields extracted from page")
                        .with_page(image.index),
                );
            }
        }
        Ok(())
    })?;

    if page_count > options.page_cap {
        tracing::warn!(
            skipped = page_count - options.page_cap,
            "page cap reached, remaining pages ignored"
        );
        warnings.push(ExtractWarning::new(
            WarningCode::PageCapReached,
            format!(
                "only the first {} of {page_count} pages were processed",
                options.page_cap
            ),
        ));
    }

    let pages_with_fields = pages.len();
    let table = aggregate(pages, &options.name_label)?;

    let report = ExtractionReport {
        page_count,
        pages_processed,
        pages_with_fields,
        row_count: table.row_count(),
        columns: table.columns().to_vec(),
        generated_at: Utc::now(),
        warnings,
    };
    tracing::info!(
        rows = report.row_count,
        columns = report.columns.len(),
        "document extracted"
    );

    Ok((table, report))
}

/// Serializes the table in the format chosen by `options`.
pub fn export_document(
    table: &DocumentTable,
    options: &ExtractOptions,
) -> Result<Vec<u8>, ExtractError> {
    export_bytes(table, options.format, options.delimiter)
}
