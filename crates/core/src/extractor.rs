use crate::error::ExtractError;
use crate::models::DocumentFormat;
use lopdf::Document as PdfDocument;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;

pub trait TextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError>;
}

#[derive(Debug, Default)]
pub struct LopdfExtractor;

impl TextExtractor for LopdfExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        // lopdf can panic on some malformed object streams.
        let parsed = catch_unwind(AssertUnwindSafe(|| extract_pdf_pages(bytes)));
        match parsed {
            Ok(result) => result,
            Err(_) => Err(pdf_error("parser panicked on malformed input")),
        }
    }
}

fn extract_pdf_pages(bytes: &[u8]) -> Result<String, ExtractError> {
    let document = PdfDocument::load_mem(bytes).map_err(pdf_error)?;

    let mut pages = Vec::new();
    for (page_no, _page_id) in document.get_pages() {
        let text = document
            .extract_text(&[page_no])
            .map_err(|error| pdf_error(format!("page {page_no}: {error}")))?;

        if !text.trim().is_empty() {
            pages.push(text);
        }
    }

    Ok(pages.join("\n"))
}

fn pdf_error(details: impl ToString) -> ExtractError {
    ExtractError::Extraction {
        format: DocumentFormat::Pdf.to_string(),
        details: details.to_string(),
    }
}

/// Reads `word/document.xml` out of the DOCX zip container, one line per paragraph.
#[derive(Debug, Default)]
pub struct DocxExtractor;

impl TextExtractor for DocxExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|error| docx_error(format!("not a zip container: {error}")))?;

        let mut document_xml = String::new();
        archive
            .by_name("word/document.xml")
            .map_err(|error| docx_error(format!("cannot find word/document.xml: {error}")))?
            .read_to_string(&mut document_xml)
            .map_err(|error| docx_error(format!("cannot read word/document.xml: {error}")))?;

        parse_document_xml(&document_xml)
    }
}

fn parse_document_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut text = String::new();
    let mut paragraph = String::new();
    let mut in_text = false;
    // Text boxes nest whole paragraphs inside a run; they are not body text.
    let mut text_box_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) if element.name().as_ref() == b"w:txbxContent" => {
                text_box_depth += 1;
            }
            Ok(Event::End(element)) if element.name().as_ref() == b"w:txbxContent" => {
                text_box_depth = text_box_depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(error) => {
                return Err(docx_error(format!(
                    "xml error at position {}: {error}",
                    reader.buffer_position()
                )))
            }
            Ok(_) if text_box_depth > 0 => {}
            Ok(Event::Start(element)) => match element.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:p" => paragraph.clear(),
                _ => {}
            },
            Ok(Event::Empty(element)) => match element.name().as_ref() {
                b"w:tab" => paragraph.push('\t'),
                b"w:br" | b"w:cr" => paragraph.push('\n'),
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::End(element)) => match element.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    text.push_str(&paragraph);
                    text.push('\n');
                    paragraph.clear();
                }
                _ => {}
            },
            Ok(Event::Text(content)) if in_text => {
                let unescaped = content
                    .unescape()
                    .map_err(|error| docx_error(format!("bad text node: {error}")))?;
                paragraph.push_str(&unescaped);
            }
            _ => {}
        }
    }

    Ok(text)
}

fn docx_error(details: String) -> ExtractError {
    ExtractError::Extraction {
        format: DocumentFormat::Docx.to_string(),
        details,
    }
}

#[derive(Debug, Default)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, ExtractError> {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|error| ExtractError::Decoding {
                valid_up_to: error.valid_up_to(),
                details: error.to_string(),
            })
    }
}

/// Extracts and normalizes text for a declared format.
pub fn extract(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    let raw = match format {
        DocumentFormat::Pdf => LopdfExtractor.extract_text(bytes)?,
        DocumentFormat::Docx => DocxExtractor.extract_text(bytes)?,
        DocumentFormat::Txt => PlainTextExtractor.extract_text(bytes)?,
    };

    Ok(normalize_extracted_text(&raw))
}

/// Unifies line endings and strips characters the models choke on.
///
/// Spacing is otherwise left alone so chunk offsets stay positional.
pub fn normalize_extracted_text(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(current) = chars.next() {
        match current {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                normalized.push('\n');
            }
            '\u{000c}' => normalized.push('\n'),
            '\u{a0}' => normalized.push(' '),
            '\0' => {}
            other => normalized.push(other),
        }
    }

    normalized
}

/// Reads a file from disk as an upload: its file name and raw bytes.
pub fn read_upload(path: &Path) -> Result<(String, Vec<u8>), ExtractError> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ExtractError::UnsupportedFormat(format!("path has no file name: {}", path.display()))
        })?
        .to_string();

    let bytes = std::fs::read(path)?;
    Ok((filename, bytes))
}
