use lopdf::Document;

use crate::error::ExtractError;

/// Number of pages in the PDF, failing if the bytes are not a readable PDF.
pub fn count_pages(pdf: &[u8]) -> Result<usize, ExtractError> {
    let document = Document::load_mem(pdf)?;
    Ok(document.get_pages().len())
}

#[cfg(test)]
mod tests {
    use super::count_pages;

    #[test]
    fn rejects_non_pdf_bytes() {
        let err = count_pages(b"definitely not a pdf").expect_err("garbage should fail");
        assert_eq!(err.code(), "pdf_load_error");
    }
}
