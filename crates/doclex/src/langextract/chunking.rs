//! Splitting long documents into model-sized chunks.

/// A slice of the source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    pub index: usize,
    pub text: String,
    /// Character (not byte) offset of the chunk in the document.
    pub char_offset: usize,
}

impl TextChunk {
    /// Nothing worth sending to a model.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Split `text` into chunks of at most `max_chars` characters.
///
/// A chunk ends after the last whitespace character inside its window, so words
/// are not cut unless a single run of non-whitespace is longer than the window.
/// Concatenating the chunks in order reproduces `text` exactly.
pub fn chunk_text(text: &str, max_chars: usize) -> Vec<TextChunk> {
    let max_chars = max_chars.max(1);

    // byte offset of every char, plus the end of the string
    let mut boundaries: Vec<usize> = text.char_indices().map(|(byte, _)| byte).collect();
    let total_chars = boundaries.len();
    boundaries.push(text.len());

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < total_chars {
        let window_end = (start + max_chars).min(total_chars);
        let mut end = window_end;

        if window_end < total_chars {
            let window = &text[boundaries[start]..boundaries[window_end]];
            if let Some((byte, ch)) = window.char_indices().rev().find(|(_, c)| c.is_whitespace()) {
                let kept = window[..byte + ch.len_utf8()].chars().count();
                end = start + kept;
            }
        }

        chunks.push(TextChunk {
            index: chunks.len(),
            text: text[boundaries[start]..boundaries[end]].to_string(),
            char_offset: start,
        });
        start = end;
    }

    chunks
}
