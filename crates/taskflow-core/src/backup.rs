use std::fs;
use std::io::Write;
use std::path::{
  Path,
  PathBuf
};

use anyhow::{
  Context,
  anyhow
};
use chrono::NaiveDate;
use taskflow_shared::BackupFile;
use tempfile::NamedTempFile;
use tracing::{
  debug,
  info
};

/// Writes the backup into `dir`
/// atomically and returns the final
/// path.
#[tracing::instrument(skip(backup), fields(size = backup.bytes.len()))]
pub fn save(
  dir: &Path,
  backup: &BackupFile,
  today: NaiveDate
) -> anyhow::Result<PathBuf> {
  fs::create_dir_all(dir).with_context(
    || {
      format!(
        "failed to create {}",
        dir.display()
      )
    }
  )?;

  let path =
    dir.join(backup.file_name(today));
  debug!(file = %path.display(), "writing backup atomically");

  let mut temp = NamedTempFile::new_in(dir)
    .with_context(|| {
      format!(
        "failed to create temp file in \
         {}",
        dir.display()
      )
    })?;
  temp.write_all(&backup.bytes)?;
  temp.flush()?;
  temp.persist(&path).map_err(|err| {
    anyhow!(
      "failed to persist {}: {}",
      path.display(),
      err
    )
  })?;

  info!(file = %path.display(), "backup saved");
  Ok(path)
}
