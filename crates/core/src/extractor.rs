use crate::error::IngestError;
use lopdf::Document;

/// An uploaded document: raw PDF bytes plus the filename shown to the user.
#[derive(Debug, Clone)]
pub struct PdfSource {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl PdfSource {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub name: String,
    pub reason: String,
}

/// Outcome of a best-effort extraction pass over a batch of documents.
/// Unreadable files are collected here instead of aborting the batch.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    pub text: String,
    pub skipped: Vec<SkippedDocument>,
}

pub trait PdfExtractor {
    fn extract_text(&self, source: &PdfSource) -> Result<String, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_text(&self, source: &PdfSource) -> Result<String, IngestError> {
        let document = Document::load_mem(&source.bytes)
            .map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut text = String::new();
        for (page_no, _page_id) in document.get_pages() {
            let page_text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            // Pages without extractable text contribute nothing.
            if !page_text.trim().is_empty() {
                text.push_str(&page_text);
            }
        }

        Ok(text)
    }
}

/// Extracts the concatenated text of every document, input order then page
/// order. Per-file failures are non-fatal and reported as skips; an empty
/// input batch yields an empty report.
pub fn extract_documents(sources: &[PdfSource]) -> ExtractionReport {
    extract_documents_with(&LopdfExtractor, sources)
}

pub fn extract_documents_with(
    extractor: &dyn PdfExtractor,
    sources: &[PdfSource],
) -> ExtractionReport {
    let mut report = ExtractionReport::default();

    for source in sources {
        match extractor.extract_text(source) {
            Ok(text) => report.text.push_str(&text),
            Err(error) => report.skipped.push(SkippedDocument {
                name: source.name.clone(),
                reason: error.to_string(),
            }),
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{pdf_with_text, pdf_without_text};

    #[test]
    fn empty_batch_yields_empty_report() {
        let report = extract_documents(&[]);
        assert!(report.text.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn unreadable_pdf_is_skipped_not_fatal() {
        let sources = vec![
            PdfSource::new("broken.pdf", b"%PDF-1.4\n%broken".to_vec()),
            PdfSource::new("ok.pdf", pdf_with_text("The sky is blue.")),
        ];

        let report = extract_documents(&sources);
        assert!(report.text.contains("The sky is blue."));
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "broken.pdf");
    }

    #[test]
    fn image_only_pdf_contributes_no_text() {
        let sources = vec![PdfSource::new("scan.pdf", pdf_without_text())];
        let report = extract_documents(&sources);
        assert!(report.text.trim().is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn documents_are_concatenated_in_input_order() {
        let sources = vec![
            PdfSource::new("a.pdf", pdf_with_text("First document.")),
            PdfSource::new("b.pdf", pdf_with_text("Second document.")),
        ];

        let report = extract_documents(&sources);
        let first = report
            .text
            .find("First document.")
            .expect("first document text should be present");
        let second = report
            .text
            .find("Second document.")
            .expect("second document text should be present");
        assert!(first < second);
    }
}
