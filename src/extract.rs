/// Text extraction for uploaded files
///
/// Turns an uploaded blob into plain UTF-8 text based on its declared MIME
/// type, falling back to the file extension. Word and PowerPoint files are
/// read straight out of their ZIP container, keeping only the visible text
/// runs; workbooks go through `calamine`.

use std::io::{Cursor, Read};

use calamine::Reader;
use regex::Regex;
use thiserror::Error;

const MIME_TEXT: &str = "text/plain";
const MIME_MARKDOWN: &str = "text/markdown";
const MIME_CSV: &str = "text/csv";
const MIME_DOCX: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
const MIME_PPTX: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";
const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
const MIME_XLS: &str = "application/vnd.ms-excel";

/// Separator placed between slides of a presentation
pub const SLIDE_SEPARATOR: &str = "\n---\n";

/// Separator placed between sheets of a workbook
pub const SHEET_SEPARATOR: &str = "\n";

/// Errors raised while extracting text
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),

    #[error("{0}")]
    ExtractionFailed(String),
}

impl From<zip::result::ZipError> for ExtractError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::ExtractionFailed(e.to_string())
    }
}

impl From<calamine::Error> for ExtractError {
    fn from(e: calamine::Error) -> Self {
        Self::ExtractionFailed(e.to_string())
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(e: std::io::Error) -> Self {
        Self::ExtractionFailed(e.to_string())
    }
}

/// File formats text can be pulled out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    PlainText,
    Csv,
    Docx,
    Pptx,
    Spreadsheet,
}

impl DocumentFormat {
    /// Work out the format from a MIME type, then from the file extension
    pub fn detect(mime: Option<&str>, filename: Option<&str>) -> Option<Self> {
        let by_mime = mime.and_then(|m| {
            let essence = m.split(';').next().unwrap_or(m).trim().to_ascii_lowercase();
            match essence.as_str() {
                MIME_TEXT | MIME_MARKDOWN => Some(Self::PlainText),
                MIME_CSV => Some(Self::Csv),
                MIME_DOCX => Some(Self::Docx),
                MIME_PPTX => Some(Self::Pptx),
                MIME_XLSX | MIME_XLS => Some(Self::Spreadsheet),
                _ => None,
            }
        });

        by_mime.or_else(|| {
            let ext = filename?.rsplit_once('.')?.1.to_ascii_lowercase();
            match ext.as_str() {
                "txt" | "md" => Some(Self::PlainText),
                "csv" => Some(Self::Csv),
                "docx" => Some(Self::Docx),
                "pptx" => Some(Self::Pptx),
                "xlsx" | "xls" => Some(Self::Spreadsheet),
                _ => None,
            }
        })
    }
}

/// Extract plain text from an uploaded blob
pub fn extract_text(
    bytes: &[u8],
    mime: Option<&str>,
    filename: Option<&str>,
) -> Result<String, ExtractError> {
    let format = DocumentFormat::detect(mime, filename).ok_or_else(|| {
        ExtractError::UnsupportedFormat(
            mime.or(filename).unwrap_or("unknown").to_string(),
        )
    })?;

    tracing::debug!("Extracting text from {:?} upload ({} bytes)", format, bytes.len());

    match format {
        DocumentFormat::PlainText => decode_utf8(bytes),
        DocumentFormat::Csv => extract_csv(bytes),
        DocumentFormat::Docx => extract_docx(bytes),
        DocumentFormat::Pptx => extract_pptx(bytes),
        DocumentFormat::Spreadsheet => extract_spreadsheet(bytes),
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String, ExtractError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ExtractError::ExtractionFailed(e.to_string()))
}

/// Cells joined by ", ", rows by newlines
fn extract_csv(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| ExtractError::ExtractionFailed(e.to_string()))?;
        rows.push(record.iter().collect::<Vec<_>>().join(", "));
    }
    Ok(rows.join("\n"))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;

    text_runs(&xml, "w:p", "w:t")
}

fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_unstable();

    let mut texts = Vec::with_capacity(slides.len());
    for (_, name) in slides {
        let mut xml = String::new();
        archive.by_name(&name)?.read_to_string(&mut xml)?;
        texts.push(text_runs(&xml, "a:p", "a:t")?);
    }
    Ok(texts.join(SLIDE_SEPARATOR))
}

/// Every sheet as comma-separated rows, sheets in workbook order
fn extract_spreadsheet(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut workbook = calamine::open_workbook_auto_from_rs(Cursor::new(bytes))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let rows: Vec<String> = range
            .rows()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .collect();
        sheets.push(rows.join("\n"));
    }
    Ok(sheets.join(SHEET_SEPARATOR))
}

/// Concatenate `run_tag` text per `paragraph_tag`, one paragraph per line
fn text_runs(xml: &str, paragraph_tag: &str, run_tag: &str) -> Result<String, ExtractError> {
    let run = Regex::new(&format!(r"<{run_tag}(?:\s[^>]*)?>([^<]*)</{run_tag}>"))
        .map_err(|e| ExtractError::ExtractionFailed(e.to_string()))?;

    let paragraphs: Vec<String> = xml
        .split(&format!("</{paragraph_tag}>"))
        .map(|paragraph| {
            run.captures_iter(paragraph)
                .filter_map(|c| c.get(1))
                .map(|m| unescape_xml(m.as_str()))
                .collect::<String>()
        })
        .filter(|p| !p.is_empty())
        .collect();

    Ok(paragraphs.join("\n"))
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
