use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::OutputRecord;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to serialize output records: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl OutputError {
    fn write(path: &Path, source: io::Error) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Replaces the output artifact in one step: the records go to a sibling
/// temp file that is then renamed over `path`.
pub fn write_output(path: &Path, records: &[OutputRecord]) -> Result<(), OutputError> {
    let mut json = serde_json::to_string_pretty(records)?;
    json.push('\n');

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|err| OutputError::write(parent, err))?;
    }

    let temp_path = temp_path_for(path);
    fs::write(&temp_path, json).map_err(|err| OutputError::write(&temp_path, err))?;

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(OutputError::write(path, err));
    }

    Ok(())
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "output.json".to_string());
    path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
}
