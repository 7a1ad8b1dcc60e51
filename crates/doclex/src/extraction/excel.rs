//! Excel spreadsheet text extraction using `calamine`.
//!
//! Every worksheet becomes a `Sheet: <name>` header followed by one line per
//! non-blank row, cells separated by tabs. Sheets are separated by a blank line.
//!
//! ```text
//! Sheet: People
//! Name	City
//! John Smith	New York
//!
//! Sheet: Totals
//! Q1	100
//! ```
use calamine::{Data, Range, Reader};
use std::fmt::Write as FmtWrite;
use std::io::Cursor;

use crate::error::{DoclexError, Result};

/// Extract tab-separated text from XLSX or XLS bytes.
///
/// `file_extension` selects the container format (`"xls"` for legacy binary
/// workbooks, anything else is read as Office Open XML).
pub fn extract_excel_text(data: &[u8], file_extension: &str) -> Result<String> {
    let cursor = Cursor::new(data);

    match file_extension.trim_start_matches('.').to_lowercase().as_str() {
        "xls" => {
            let workbook = calamine::Xls::new(cursor)
                .map_err(|e| DoclexError::parsing(format!("Failed to extract text from XLSX: {}", e)))?;
            workbook_text(workbook)
        }
        _ => {
            let workbook = calamine::Xlsx::new(cursor)
                .map_err(|e| DoclexError::parsing(format!("Failed to extract text from XLSX: {}", e)))?;
            workbook_text(workbook)
        }
    }
}

/// Render every sheet in workbook order. A sheet that cannot be read fails the
/// whole workbook.
fn workbook_text<RS, R>(mut workbook: R) -> Result<String>
where
    RS: std::io::Read + std::io::Seek,
    R: Reader<RS>,
    R::Error: Into<calamine::Error>,
{
    let mut text = String::new();

    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name).map_err(|e| {
            let err: calamine::Error = e.into();
            DoclexError::parsing_with_source(
                format!("Failed to extract text from XLSX: sheet '{}': {}", name, err),
                err,
            )
        })?;
        sheet_text_into(&mut text, &name, &range);
    }

    Ok(text.trim().to_string())
}

fn sheet_text_into(buffer: &mut String, name: &str, range: &Range<Data>) {
    buffer.push_str("Sheet: ");
    buffer.push_str(name);
    buffer.push('\n');

    // Ranges start at the first used cell; pad so columns line up with column A.
    let leading_columns = range.start().map(|(_, col)| col as usize).unwrap_or(0);

    let mut line = String::new();
    for row in range.rows() {
        line.clear();
        for _ in 0..leading_columns {
            line.push('\t');
        }
        for (i, cell) in row.iter().enumerate() {
            if i > 0 {
                line.push('\t');
            }
            format_cell_value_into(&mut line, cell);
        }
        if !line.trim().is_empty() {
            buffer.push_str(&line);
            buffer.push('\n');
        }
    }

    buffer.push('\n');
}

#[inline]
fn format_cell_value_into(buffer: &mut String, data: &Data) {
    match data {
        Data::Empty => {}
        Data::String(s) => buffer.push_str(s),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < 1e15 {
                let _ = write!(buffer, "{}", *f as i64);
            } else {
                let _ = write!(buffer, "{}", f);
            }
        }
        Data::Int(i) => {
            let _ = write!(buffer, "{}", i);
        }
        Data::Bool(b) => buffer.push_str(if *b { "True" } else { "False" }),
        Data::DateTime(dt) => {
            if let Some(datetime) = dt.as_datetime() {
                let _ = write!(buffer, "{}", datetime.format("%Y-%m-%d %H:%M:%S"));
            } else {
                let _ = write!(buffer, "{}", dt.as_f64());
            }
        }
        Data::Error(e) => {
            let _ = write!(buffer, "{}", e);
        }
        Data::DateTimeIso(s) | Data::DurationIso(s) => buffer.push_str(s),
    }
}
