//! DOCX (Microsoft Word) text extraction.
//!
//! Reads `word/document.xml` from the OOXML archive and returns the body
//! paragraphs one per line. Run-level tabs and breaks are kept as `\t` and `\n`.

use crate::error::{DoclexError, Result};
use roxmltree::{Document, Node};
use std::io::{Cursor, Read};
use zip::ZipArchive;

const WORDPROCESSING_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";

/// Extract the paragraph text of a DOCX document.
///
/// # Errors
///
/// Returns `DoclexError::Parsing` if the bytes are not a ZIP archive, the archive has
/// no `word/document.xml`, or the XML is malformed.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String> {
    let document_xml = read_document_xml(bytes)
        .map_err(|e| DoclexError::parsing(format!("Failed to extract text from DOCX: {}", e.reason())))?;

    let doc = Document::parse(&document_xml)
        .map_err(|e| DoclexError::parsing_with_source("Failed to extract text from DOCX: malformed document.xml", e))?;

    let Some(body) = doc.root_element().children().find(|n| is_w(n, "body")) else {
        return Ok(String::new());
    };

    let paragraphs: Vec<String> = body.children().filter(|n| is_w(n, "p")).map(paragraph_text).collect();

    Ok(paragraphs.join("\n").trim().to_string())
}

fn read_document_xml(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| DoclexError::parsing(format!("File is not a DOCX archive: {}", e)))?;

    let mut file = archive
        .by_name("word/document.xml")
        .map_err(|_| DoclexError::parsing("Archive has no word/document.xml"))?;

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| DoclexError::parsing(format!("Failed to read document.xml: {}", e)))?;

    Ok(content)
}

fn is_w(node: &Node<'_, '_>, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local && node.tag_name().namespace() == Some(WORDPROCESSING_NS)
}

fn paragraph_text(paragraph: Node<'_, '_>) -> String {
    let mut text = String::new();
    for node in paragraph.descendants() {
        if is_w(&node, "t") {
            if let Some(value) = node.text() {
                text.push_str(value);
            }
        } else if is_w(&node, "tab") {
            text.push('\t');
        } else if is_w(&node, "br") || is_w(&node, "cr") {
            text.push('\n');
        }
    }
    text
}
