use std::fs;
use std::path::Path;

use lopdf::Document as PdfDocument;
use tracing::{debug, instrument};

use crate::error::{Result, ReviewError};
use crate::models::{Document, DocumentType};

/// Extract the full text of an uploaded document
#[instrument(skip(document), fields(kind = ?document.document_type, bytes = document.bytes.len()))]
pub fn extract_text(document: &Document) -> Result<String> {
    let text = match document.document_type {
        DocumentType::Pdf => extract_pdf(&document.bytes)?,
        DocumentType::PlainText => std::str::from_utf8(&document.bytes)
            .map(str::to_string)
            .map_err(|e| ReviewError::Extraction(format!("Text file is not valid UTF-8: {e}")))?,
    };

    debug!(chars = text.len(), "Extracted resume text");

    Ok(text)
}

/// Load a resume from disk, resolving its type from the extension
pub fn read_document(path: impl AsRef<Path>) -> Result<Document> {
    let path = path.as_ref();
    let document_type = DocumentType::from_path(path)?;
    let bytes = fs::read(path).map_err(|e| {
        ReviewError::Extraction(format!("Failed to read {}: {e}", path.display()))
    })?;

    Ok(Document::new(bytes, document_type))
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    let pdf = PdfDocument::load_mem(bytes)
        .map_err(|e| ReviewError::Extraction(format!("Failed to parse PDF: {e}")))?;

    if pdf.is_encrypted() {
        return Err(ReviewError::Extraction("PDF is encrypted".to_string()));
    }

    // get_pages is keyed by page number, so iteration follows document order
    let pages = pdf
        .get_pages()
        .keys()
        .map(|&number| {
            pdf.extract_text(&[number])
                .map(|text| text.trim_end_matches(['\r', '\n']).to_string())
                .map_err(|e| {
                    ReviewError::Extraction(format!(
                        "Failed to extract text from page {number}: {e}"
                    ))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(pages = pages.len(), "Extracted PDF pages");

    Ok(join_pages(&pages))
}

fn join_pages(pages: &[String]) -> String {
    pages.join("\n")
}
