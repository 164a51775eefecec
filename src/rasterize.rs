//! Page rasterization: PDF page → PNG bytes.
//!
//! The pipeline only sees the [`PageRasterizer`] trait. [`PdfiumRasterizer`]
//! is the production implementation; it needs the pdfium shared library,
//! looked up in the working directory first and then on the system path.

use std::io::Cursor;

use image::ImageFormat;
use pdfium_render::prelude::*;

use crate::error::ExtractError;
use crate::model::PageImage;
use crate::options::DEFAULT_DPI;

pub trait PageRasterizer {
    /// Renders pages `0..min(limit, page_count)` in order, handing each one to
    /// `visit` before the next page is rendered. Returns the document's page count.
    fn visit_pages(
        &self,
        pdf: &[u8],
        limit: usize,
        visit: &mut dyn FnMut(PageImage) -> Result<(), ExtractError>,
    ) -> Result<usize, ExtractError>;
}

pub struct PdfiumRasterizer {
    pdfium: Pdfium,
    dpi: f32,
}

impl PdfiumRasterizer {
    pub fn new() -> Result<Self, ExtractError> {
        Self::with_dpi(DEFAULT_DPI)
    }

    pub fn with_dpi(dpi: f32) -> Result<Self, ExtractError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(|error| ExtractError::Config(format!("failed to bind pdfium: {error}")))?;

        Ok(Self {
            pdfium: Pdfium::new(bindings),
            dpi,
        })
    }

    fn render_page(&self, page: &PdfPage, index: usize) -> Result<Vec<u8>, ExtractError> {
        let scale = self.dpi / 72.0;
        #[allow(clippy::cast_possible_truncation)]
        let pixel_width = (page.width().value * scale).round() as i32;
        #[allow(clippy::cast_possible_truncation)]
        let pixel_height = (page.height().value * scale).round() as i32;

        let bitmap = page
            .render_with_config(
                &PdfRenderConfig::new()
                    .set_target_width(pixel_width)
                    .set_target_height(pixel_height)
                    .render_form_data(true)
                    .render_annotations(true),
            )
            .map_err(|error| ExtractError::Render {
                page: index,
                message: error.to_string(),
            })?;

        let mut png = Vec::new();
        bitmap
            .as_image()
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|error| ExtractError::Render {
                page: index,
                message: error.to_string(),
            })?;
        Ok(png)
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn visit_pages(
        &self,
        pdf: &[u8],
        limit: usize,
        visit: &mut dyn FnMut(PageImage) -> Result<(), ExtractError>,
    ) -> Result<usize, ExtractError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(pdf, None)
            .map_err(|error| ExtractError::Render {
                page: 0,
                message: format!("failed to open PDF: {error}"),
            })?;

        let pages = document.pages();
        let page_count = usize::from(pages.len());

        for (index, page) in pages.iter().enumerate().take(limit) {
            let png = self.render_page(&page, index)?;
            tracing::debug!(page = index, bytes = png.len(), "rendered page");
            visit(PageImage { index, png })?;
        }

        Ok(page_count)
    }
}
