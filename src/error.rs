use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("failed to render page {page}: {message}")]
    Render { page: usize, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extraction service error: {0}")]
    Service(String),

    #[error("invalid service response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no data could be extracted from the document")]
    NoDataExtracted,

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("XLSX write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("invalid option: {0}")]
    InvalidOption(String),
}

impl ExtractError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "config_error",
            Self::Io(_) => "io_error",
            Self::PdfLoad(_) => "pdf_load_error",
            Self::Render { .. } => "render_error",
            Self::Http(_) | Self::Service(_) | Self::Json(_) => "extraction_error",
            Self::NoDataExtracted => "no_data_extracted",
            Self::Csv(_) | Self::Xlsx(_) => "export_error",
            Self::InvalidOption(_) => "invalid_option",
        }
    }

    /// True for the empty-result outcome, which is reported to the user rather than treated as a crash.
    #[must_use]
    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoDataExtracted)
    }
}
