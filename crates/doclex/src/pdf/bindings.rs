use super::error::PdfError;
use once_cell::sync::Lazy;
use pdfium_render::prelude::*;
use std::sync::Mutex;

/// Outcome of the first attempt to load the system Pdfium library.
enum InitializationState {
    Uninitialized,
    Initialized,
    Failed(String),
}

/// A missing library is remembered so later PDFs go straight to the fallback parser.
static PDFIUM_STATE: Lazy<Mutex<InitializationState>> = Lazy::new(|| Mutex::new(InitializationState::Uninitialized));

/// Bind to the system Pdfium library.
///
/// The first failure is cached; subsequent calls return it without probing the
/// filesystem again.
pub(crate) fn bind_pdfium() -> Result<Box<dyn PdfiumLibraryBindings>, PdfError> {
    let mut state = PDFIUM_STATE
        .lock()
        .map_err(|e| PdfError::LibraryUnavailable(format!("Failed to acquire lock on Pdfium state: {}", e)))?;

    if let InitializationState::Failed(err) = &*state {
        return Err(PdfError::LibraryUnavailable(format!(
            "Pdfium initialization previously failed: {}",
            err
        )));
    }

    match Pdfium::bind_to_system_library() {
        Ok(bindings) => {
            *state = InitializationState::Initialized;
            Ok(bindings)
        }
        Err(e) => {
            let message = e.to_string();
            tracing::debug!("Pdfium system library not available: {}", message);
            *state = InitializationState::Failed(message.clone());
            Err(PdfError::LibraryUnavailable(message))
        }
    }
}
