use chrono::{DateTime, NaiveDateTime, Utc};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    errors::CurrencyError,
    utils::{app_data_dir, ensure_dir, write_atomic},
};

use super::{PersistenceAdapter, Result};

const BLOB_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const SAVES_DIR: &str = "saves";
const BACKUP_DIR: &str = "backups";
const DEFAULT_RETENTION: usize = 5;

/// Filesystem-backed blob storage: one JSON file per tag plus rolling
/// timestamped backups of the previous contents.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    saves_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonFileStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let root = root.unwrap_or_else(app_data_dir);
        let saves_dir = root.join(SAVES_DIR);
        let backups_dir = root.join(BACKUP_DIR);
        ensure_dir(&saves_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            saves_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn blob_path(&self, tag: &str) -> PathBuf {
        self.saves_dir
            .join(format!("{}.{}", canonical_name(tag), BLOB_EXTENSION))
    }

    pub fn backup_path(&self, tag: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(tag).join(backup_name)
    }

    fn backup_dir(&self, tag: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(tag))
    }

    /// Backup file names for `tag`, newest first.
    pub fn list_backups(&self, tag: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(tag);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
                entries.push(name.to_string());
            }
        }
        entries.sort_by(|a, b| parse_backup_key(b).cmp(&parse_backup_key(a)));
        Ok(entries)
    }

    /// Copies a backup over the live blob and returns its bytes.
    pub fn restore_backup(&self, tag: &str, backup_name: &str) -> Result<Vec<u8>> {
        let backup_path = self.backup_path(tag, backup_name);
        if !backup_path.exists() {
            return Err(CurrencyError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let bytes = fs::read(&backup_path)?;
        write_atomic(&self.blob_path(tag), &bytes)?;
        tracing::info!(tag, backup = backup_name, "restored blob from backup");
        Ok(bytes)
    }

    fn backup_existing_file(&self, tag: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(tag);
        ensure_dir(&dir)?;
        let stem = format!(
            "{}_{}",
            canonical_name(tag),
            Utc::now().format(BACKUP_TIMESTAMP_FORMAT)
        );
        // Saves within the same second get a `-N` suffix instead of
        // overwriting the earlier backup.
        let mut backup_path = dir.join(format!("{}.{}", stem, BLOB_EXTENSION));
        let mut sequence = 0u32;
        while backup_path.exists() {
            sequence += 1;
            backup_path = dir.join(format!("{}-{}.{}", stem, sequence, BLOB_EXTENSION));
        }
        fs::copy(path, &backup_path)?;
        self.prune_backups(tag)
    }

    fn prune_backups(&self, tag: &str) -> Result<()> {
        let backups = self.list_backups(tag)?;
        for entry in backups.iter().skip(self.retention) {
            if let Err(err) = fs::remove_file(self.backup_path(tag, entry)) {
                tracing::warn!(tag, backup = %entry, %err, "failed to prune backup");
            }
        }
        Ok(())
    }
}

impl PersistenceAdapter for JsonFileStorage {
    fn get(&self, tag: &str) -> Result<Option<Vec<u8>>> {
        let path = self.blob_path(tag);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    fn save(&self, tag: &str, bytes: &[u8]) -> Result<()> {
        let path = self.blob_path(tag);
        self.backup_existing_file(tag, &path)?;
        write_atomic(&path, bytes)?;
        tracing::debug!(tag, path = %path.display(), bytes = bytes.len(), "blob written");
        Ok(())
    }
}

fn canonical_name(tag: &str) -> String {
    let sanitized: String = tag
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' => c,
            _ => '_',
        })
        .collect();
    if sanitized.trim_matches('_').is_empty() {
        "blob".into()
    } else {
        sanitized
    }
}

/// Sort key of a backup name: its timestamp, then the same-second sequence.
/// Minute-precision names from older releases still parse.
fn parse_backup_key(name: &str) -> Option<(DateTime<Utc>, u32)> {
    let stem = name.strip_suffix(&format!(".{}", BLOB_EXTENSION))?;
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() < 3 {
        return None;
    }
    let date_part = parts[parts.len() - 2];
    let (time_part, sequence) = match parts[parts.len() - 1].split_once('-') {
        Some((time, sequence)) => (time, sequence.parse::<u32>().ok()?),
        None => (parts[parts.len() - 1], 0),
    };
    if !is_digits(date_part, 8) {
        return None;
    }
    let format = if is_digits(time_part, 6) {
        "%Y%m%d%H%M%S"
    } else if is_digits(time_part, 4) {
        "%Y%m%d%H%M"
    } else {
        return None;
    };
    NaiveDateTime::parse_from_str(&format!("{}{}", date_part, time_part), format)
        .ok()
        .map(|naive| (DateTime::from_naive_utc_and_offset(naive, Utc), sequence))
}

fn is_digits(value: &str, len: usize) -> bool {
    value.len() == len && value.chars().all(|c| c.is_ascii_digit())
}
