//! Shared helpers for command handlers.

use std::io::ErrorKind;
use std::path::Path;

use tokio::io::{AsyncBufRead, AsyncReadExt, BufReader};

use crate::error::CliError;

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Open `path` (or stdin for `-`) for line-by-line reading.
pub async fn open_input(path: &Path) -> Result<Box<dyn AsyncBufRead + Unpin + Send>, CliError> {
    if is_stdin(path) {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    match tokio::fs::File::open(path).await {
        Ok(file) => Ok(Box::new(BufReader::new(file))),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(CliError::InputNotFound {
            path: path.display().to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

/// Read all of `path` (or stdin for `-`) into a string.
pub async fn read_input(path: &Path) -> Result<String, CliError> {
    let mut reader = open_input(path).await?;
    let mut text = String::new();
    reader.read_to_string(&mut text).await?;
    Ok(text)
}
