use std::io;
use std::path::Path;
use std::process::ExitStatus;

use thiserror::Error;
use tokio::process::Command;

#[derive(Error, Debug)]
pub enum DiskError {
    #[error("failed to run df: {0}")]
    Io(#[from] io::Error),
    #[error("df exited with {0}")]
    Status(ExitStatus),
    #[error("unexpected df output: {0:?}")]
    Parse(String),
}

/// Free space left on the filesystem holding `dir`, as `df -h` prints it (e.g. "12G").
pub async fn available_space(dir: &Path) -> Result<String, DiskError> {
    let output = Command::new("df").arg("-h").arg(dir).output().await?;
    if !output.status.success() {
        return Err(DiskError::Status(output.status));
    }
    parse_df_output(&String::from_utf8_lossy(&output.stdout))
}

/// Extract the "Avail" column from `df` output.
///
/// The data row may be wrapped onto a second line when the filesystem name is
/// long, so all fields after the header are read as one row.
pub fn parse_df_output(output: &str) -> Result<String, DiskError> {
    let mut lines = output.lines();
    let header = lines.next().unwrap_or_default();
    if !header.contains("Avail") {
        return Err(DiskError::Parse(output.to_string()));
    }
    lines
        .flat_map(str::split_whitespace)
        .nth(3)
        .map(str::to_string)
        .ok_or_else(|| DiskError::Parse(output.to_string()))
}
