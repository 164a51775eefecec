use std::time::Duration;

use crate::aggregate::DEFAULT_NAME_LABEL;
use crate::error::ExtractError;
use crate::export::ExportFormat;

pub const DEFAULT_PAGE_CAP: usize = 5;
pub const DEFAULT_DPI: f32 = 72.0;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractOptions {
    pub page_cap: usize,
    pub name_label: String,
    pub dpi: f32,
    pub format: ExportFormat,
    pub delimiter: u8,
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            page_cap: DEFAULT_PAGE_CAP,
            name_label: DEFAULT_NAME_LABEL.to_string(),
            dpi: DEFAULT_DPI,
            format: ExportFormat::Xlsx,
            delimiter: b',',
            poll_interval: Duration::from_secs(1),
            max_polls: 120,
        }
    }
}

impl ExtractOptions {
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.page_cap == 0 {
            return Err(ExtractError::InvalidOption(
                "page_cap must be at least 1".to_string(),
            ));
        }
        if self.name_label.trim().is_empty() {
            return Err(ExtractError::InvalidOption(
                "name_label cannot be empty".to_string(),
            ));
        }
        if !(self.dpi.is_finite() && self.dpi > 0.0) {
            return Err(ExtractError::InvalidOption(format!(
                "dpi must be positive, got {}",
                self.dpi
            )));
        }
        if self.poll_interval.is_zero() {
            return Err(ExtractError::InvalidOption(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_polls == 0 {
            return Err(ExtractError::InvalidOption(
                "max_polls must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::ExtractOptions;

    #[test]
    fn defaults_cap_at_five_pages() {
        let options = ExtractOptions::default();
        assert_eq!(options.page_cap, 5);
        assert_eq!(options.name_label, "NOME");
        assert!(options.validate().is_ok());
    }

    #[test]
    fn rejects_zero_page_cap() {
        let options = ExtractOptions {
            page_cap: 0,
            ..ExtractOptions::default()
        };
        let err = options.validate().expect_err("zero cap should fail");
        assert!(err.to_string().contains("page_cap"));
    }

    #[test]
    fn rejects_blank_label_and_bad_dpi() {
        let blank = ExtractOptions {
            name_label: "  ".to_string(),
            ..ExtractOptions::default()
        };
        assert!(blank.validate().is_err());

        let dpi = ExtractOptions {
            dpi: 0.0,
            ..ExtractOptions::default()
        };
        assert!(dpi.validate().is_err());
    }

    #[test]
    fn rejects_zero_poll_interval() {
        let options = ExtractOptions {
            poll_interval: Duration::ZERO,
            ..ExtractOptions::default()
        };
        let err = options.validate().expect_err("zero poll interval should fail");
        assert!(err.to_string().contains("poll_interval"));
    }
}
