//! Address records and the carrier typographic rules used to print them.

pub mod error;
pub mod format;
pub mod model;
pub mod postal_code;

pub use error::AddressError;
pub use format::{
    destination_lines, max_chars, max_chars_for_canvas, normalize_number, sender_lines,
    street_line, truncate_line, NO_NUMBER,
};
pub use model::{Address, AddressRecord, Sender, SenderIssue, SenderRecord};
pub use postal_code::PostalCode;
