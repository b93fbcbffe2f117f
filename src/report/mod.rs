//! Result transcript handling.
//!
//! A model's answers accumulate in one append-only transcript file per
//! model and experiment. Each batch contributes one block:
//!
//! ```text
//! d1.com, d2.com
//! ---------------
//! d1.com|Y|0.9
//! d2.com|N|0.8
//! ***************
//! ```
//!
//! [`writer`] appends blocks as responses arrive; [`parser`] recovers the
//! sent domains and candidate classification lines from the whole buffer.

pub mod parser;
pub mod writer;

pub use parser::{parse_transcript, ParsedTranscript};
pub use writer::{append_result_block, read_transcript};

/// Separator between a sent batch and the model output that answers it.
pub const BATCH_SEPARATOR: &str = "---------------";

/// Separator terminating one request/response block.
pub const BLOCK_SEPARATOR: &str = "***************";
