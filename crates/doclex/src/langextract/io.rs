//! JSON Lines persistence for annotated documents.

use super::data::AnnotatedDocument;
use crate::error::{DoclexError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Write one document per line.
pub fn save_annotated_documents(documents: &[AnnotatedDocument], path: &Path) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for document in documents {
        serde_json::to_writer(&mut writer, document)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;
    Ok(())
}

/// Read every non-blank line back into a document.
pub fn load_annotated_documents(path: &Path) -> Result<Vec<AnnotatedDocument>> {
    let reader = BufReader::new(File::open(path)?);
    let mut documents = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let document = serde_json::from_str(&line).map_err(|e| {
            DoclexError::serialization_with_source(format!("Invalid document on line {}: {}", line_no + 1, e), e)
        })?;
        documents.push(document);
    }

    Ok(documents)
}
