//! String-to-code encoding for categorical survey answers and labels.

mod category;
mod set;

pub use category::CategoryEncoder;
pub use set::EncoderSet;
pub(crate) use set::fingerprint_bytes;
