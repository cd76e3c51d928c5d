//! Utility modules.

pub mod file;
pub mod text;

pub use file::{calculate_checksum, is_hidden, read_file_content};
pub use text::{char_len, has_text};
