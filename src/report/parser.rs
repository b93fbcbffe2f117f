//! Transcript parser.
//!
//! The transcript is split into blocks on the block separator. A block that
//! contains the batch separator has been answered: the text before the
//! first separator occurrence is the comma-joined batch that was sent, the
//! text after it is the model's raw output. Blocks without a batch
//! separator (typically a trailing partial block) are skipped.
//!
//! Parsing is idempotent over a growing buffer: re-parsing the same buffer
//! yields the same result, and parsing a buffer with a new block appended
//! yields the previous results as a strict prefix.

use super::{BATCH_SEPARATOR, BLOCK_SEPARATOR};

/// One answered block: the batch line and the model output that follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct AnsweredBlock<'a> {
    batch: &'a str,
    output: &'a str,
}

/// Split a block chunk into its batch and output parts, if answered.
fn answered(chunk: &str) -> Option<AnsweredBlock<'_>> {
    let (batch, output) = chunk.split_once(BATCH_SEPARATOR)?;
    Some(AnsweredBlock { batch, output })
}

/// Everything recovered from a transcript buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTranscript {
    /// Domains sent to the model, in transcript order, duplicates kept.
    pub sent_domains: Vec<String>,
    /// Candidate classification lines, in transcript order.
    pub classification_lines: Vec<String>,
}

/// Parse an accumulated transcript buffer.
///
/// Tolerates buffers built incrementally across many request/response
/// cycles; a trailing block that has not been answered yet is ignored.
pub fn parse_transcript(buffer: &str) -> ParsedTranscript {
    let mut transcript = ParsedTranscript::default();

    for chunk in buffer.split(BLOCK_SEPARATOR) {
        let Some(block) = answered(chunk) else {
            continue;
        };

        transcript.sent_domains.extend(
            block
                .batch
                .trim()
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
        );
        transcript.classification_lines.extend(
            block
                .output
                .trim()
                .lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        );
    }

    transcript
}
