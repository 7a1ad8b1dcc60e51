//! Configuration and upload gatekeeping.
//!
//! - **Configuration** (`config`): settings loaded from file and environment
//! - **Formats** (`formats`): extension-based file type detection and validation

pub mod config;
pub mod formats;

pub use config::Settings;
pub use formats::{FileType, detect_file_type, validate_file};
