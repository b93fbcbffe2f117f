//! Transcript writer.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use crate::error::{EvalError, Result};

use super::{BATCH_SEPARATOR, BLOCK_SEPARATOR};

/// Append one request/response block to a transcript file.
///
/// Creates the file on first write. `batch_line` is the comma-joined batch
/// exactly as it was sent.
pub fn append_result_block(
    path: impl AsRef<Path>,
    batch_line: &str,
    response: &str,
) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path.as_ref())?;
    write!(
        file,
        "{batch_line}\n{BATCH_SEPARATOR}\n{response}\n{BLOCK_SEPARATOR}\n"
    )?;
    Ok(())
}

/// Read a whole transcript file.
///
/// Fails with [`EvalError::NotFound`] when no transcript exists yet.
pub fn read_transcript(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(EvalError::NotFound(format!(
            "transcript '{}'",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}
