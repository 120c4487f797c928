//! XML-to-structured-record extraction, with three-level inheritance
//! flattening (family → subfamily → device).

mod document;
mod extract;
mod scope;

pub use document::PdscDocument;
pub use extract::{device_name, extract_board_aliases, extract_device};
