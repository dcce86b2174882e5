//! Change-gated persistence of rendered feeds

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::Result;
use crate::change::has_changed;

/// What happened (or would happen) to an output file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was missing or its content differed
    Written,
    /// Only the stamp properties differed; the file was left alone
    Unchanged,
}

impl std::fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteOutcome::Written => write!(f, "written"),
            WriteOutcome::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// Read the previous document; a missing file means there is none.
pub fn read_previous(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Decide what [`write_if_changed`] would do without touching the file
pub fn plan(path: &Path, document: &str) -> Result<WriteOutcome> {
    let previous = read_previous(path)?;
    Ok(if has_changed(previous.as_deref(), document) {
        WriteOutcome::Written
    } else {
        WriteOutcome::Unchanged
    })
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "forecast.ics".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

/// Write `document` and flush it to disk before it can be renamed over a feed
fn write_synced(path: &Path, document: &str) -> std::io::Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(document.as_bytes())?;
    file.sync_all()
}

/// Replace `path` with `document` unless only the stamps changed.
///
/// The document goes to a sibling temp file first and is renamed into
/// place, so a failure leaves the previous file intact.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_if_changed(path: &Path, document: &str) -> Result<WriteOutcome> {
    if plan(path, document)? == WriteOutcome::Unchanged {
        info!("Forecast unchanged, keeping existing file");
        return Ok(WriteOutcome::Unchanged);
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let temp = temp_path(path);
    debug!("Writing {} bytes to {}", document.len(), temp.display());
    if let Err(e) = write_synced(&temp, document).and_then(|()| fs::rename(&temp, path)) {
        let _ = fs::remove_file(&temp);
        return Err(e.into());
    }

    info!("Forecast written");
    Ok(WriteOutcome::Written)
}
