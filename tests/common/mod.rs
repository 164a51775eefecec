#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use formscan::{
    ExtractError, FieldExtractor, FieldRecord, PageImage, PageRasterizer, ServiceConfig,
    count_pages,
};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Builds an in-memory PDF with one page per entry, each showing its label.
pub fn create_test_pdf(labels: &[&str]) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut page_ids = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![50.into(), 780.into()]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id);
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids.iter().map(|id| (*id).into()).collect::<Vec<_>>(),
            "Count" => i64::try_from(page_ids.len())?,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

pub fn test_config() -> ServiceConfig {
    ServiceConfig::new("https://example.cognitiveservices.azure.com/", "test-key", "test-model")
        .expect("test config should be valid")
}

/// Stands in for pdfium: each "image" is just the page index as text.
pub struct FakeRasterizer {
    pub log: EventLog,
}

impl PageRasterizer for FakeRasterizer {
    fn visit_pages(
        &self,
        pdf: &[u8],
        limit: usize,
        visit: &mut dyn FnMut(PageImage) -> Result<(), ExtractError>,
    ) -> Result<usize, ExtractError> {
        let page_count = count_pages(pdf)?;
        for index in 0..page_count.min(limit) {
            self.log.borrow_mut().push(format!("render {index}"));
            visit(PageImage {
                index,
                png: index.to_string().into_bytes(),
            })?;
        }
        Ok(page_count)
    }
}

/// Renders a fixed number of pages without parsing the input, like a renderer
/// that repairs files a strict parser rejects.
pub struct LenientRasterizer {
    pub page_count: usize,
    pub log: EventLog,
}

impl PageRasterizer for LenientRasterizer {
    fn visit_pages(
        &self,
        _pdf: &[u8],
        limit: usize,
        visit: &mut dyn FnMut(PageImage) -> Result<(), ExtractError>,
    ) -> Result<usize, ExtractError> {
        for index in 0..self.page_count.min(limit) {
            self.log.borrow_mut().push(format!("render {index}"));
            visit(PageImage {
                index,
                png: index.to_string().into_bytes(),
            })?;
        }
        Ok(self.page_count)
    }
}

/// Returns canned fields per page and can be told to fail on one page.
pub struct ScriptedExtractor {
    pub pages: Vec<Vec<FieldRecord>>,
    pub fail_on: Option<usize>,
    pub log: EventLog,
}

impl FieldExtractor for ScriptedExtractor {
    fn analyze(&self, model_id: &str, image: &[u8]) -> Result<Vec<FieldRecord>, ExtractError> {
        let index = std::str::from_utf8(image)
            .ok()
            .and_then(|text| text.parse::<usize>().ok())
            .ok_or_else(|| ExtractError::Service("unexpected image payload".to_string()))?;
        self.log
            .borrow_mut()
            .push(format!("analyze {index} with {model_id}"));

        if self.fail_on == Some(index) {
            return Err(ExtractError::Service("quota exceeded".to_string()));
        }
        Ok(self.pages.get(index).cloned().unwrap_or_default())
    }
}

pub fn field(name: &str, value: &str, confidence: f64) -> FieldRecord {
    FieldRecord::new(name, Some(value), Some(confidence))
}
