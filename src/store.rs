//! Durable storage for finished conversations.
//!
//! Orders and sales leads are written one file per record and never
//! overwritten. Wellness check-ins share a single JSON array file that is
//! read, extended and atomically replaced under both an in-process mutex and
//! an advisory file lock, so concurrent sessions cannot lose each other's
//! entries. A log that is not a JSON array is moved aside to a timestamped
//! `.bak` file before a new one is started; a log that cannot be read at all
//! is left untouched and the save fails.

use crate::config::StoreConfig;
use crate::error::{AgentError, Result};
use crate::session::{LeadRecord, OrderRecord, WellnessEntry};
use chrono::Local;
use fs2::FileExt;
use serde::Serialize;
use serde_json::Value;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Gives up on finding a free filename after this many suffixes
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Outcome of reading the check-in log
enum HistoryRead {
    Missing,
    /// Raw entries, kept as JSON so entries we cannot interpret survive a rewrite
    Loaded(Vec<Value>),
    /// The file was read but is not a JSON array
    Malformed(String),
    /// The file exists but could not be read at all
    Unreadable(io::Error),
}

pub struct RecordStore {
    config: StoreConfig,
    history_lock: Mutex<()>,
}

impl RecordStore {
    pub fn new(config: StoreConfig) -> Self {
        Self {
            config,
            history_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Write a finished order to `order_<timestamp>.json`.
    ///
    /// Returns the path written. If another record already claimed the
    /// timestamp-derived name, a `-N` suffix is appended.
    pub fn save_order(&self, record: &OrderRecord) -> Result<PathBuf> {
        let path = save_new(&self.config.orders_dir, &record.file_stem(), record)?;
        log::info!("☕ Order saved to {}", path.display());
        Ok(path)
    }

    /// Write a captured sales lead to `lead_<timestamp>.json`
    pub fn save_lead(&self, record: &LeadRecord) -> Result<PathBuf> {
        let path = save_new(&self.config.leads_dir, &record.file_stem(), record)?;
        log::info!("💼 Lead saved to {}", path.display());
        Ok(path)
    }

    /// Every saved order, oldest first. Unreadable files are skipped.
    pub fn load_orders(&self) -> Vec<OrderRecord> {
        let dir = &self.config.orders_dir;
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                log::warn!("Could not list orders in {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut orders: Vec<(OrderRecord, u32)> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| is_order_file(path))
            .filter_map(|path| {
                let parsed: std::result::Result<OrderRecord, String> =
                    fs::read_to_string(&path)
                        .map_err(|e| e.to_string())
                        .and_then(|body| serde_json::from_str(&body).map_err(|e| e.to_string()));
                match parsed {
                    Ok(record) => Some((record, collision_suffix(&path))),
                    Err(e) => {
                        log::warn!("Skipping unreadable order {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();

        // Same-timestamp orders were suffixed -1, -2, ... in the order they were saved
        orders.sort_by(|(a, a_suffix), (b, b_suffix)| {
            a.timestamp
                .cmp(&b.timestamp)
                .then(a_suffix.cmp(b_suffix))
        });
        orders.into_iter().map(|(record, _)| record).collect()
    }

    /// Append a check-in to the history log, creating it if needed
    pub fn save_checkin(&self, entry: &WellnessEntry) -> Result<PathBuf> {
        let log_path = &self.config.wellness_log;
        let _guard = self
            .history_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| AgentError::persistence(parent, e))?;
        }

        let lock_path = sibling_path(log_path, "lock");
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| AgentError::persistence(&lock_path, e))?;
        lock_file
            .lock_exclusive()
            .map_err(|e| AgentError::persistence(&lock_path, e))?;

        let result = self.append_locked(entry);

        if let Err(e) = FileExt::unlock(&lock_file) {
            log::warn!("Failed to release {}: {}", lock_path.display(), e);
        }

        result
    }

    fn append_locked(&self, entry: &WellnessEntry) -> Result<PathBuf> {
        let log_path = &self.config.wellness_log;

        let mut history = match self.read_history() {
            HistoryRead::Missing => Vec::new(),
            HistoryRead::Loaded(history) => history,
            HistoryRead::Unreadable(e) => return Err(AgentError::persistence(log_path, e)),
            HistoryRead::Malformed(reason) => {
                let backup = free_backup_path(log_path)?;
                log::warn!(
                    "Check-in log {} is malformed ({}); moving it to {} and starting fresh",
                    log_path.display(),
                    reason,
                    backup.display()
                );
                fs::rename(log_path, &backup).map_err(|e| AgentError::persistence(&backup, e))?;
                Vec::new()
            }
        };

        history.push(serde_json::to_value(entry)?);
        let body = serde_json::to_string_pretty(&history)?;
        write_atomic(log_path, body.as_bytes())?;

        log::info!(
            "🌱 Check-in saved to {} ({} total)",
            log_path.display(),
            history.len()
        );
        Ok(log_path.clone())
    }

    /// Every saved check-in, oldest first.
    ///
    /// A missing, unreadable or malformed log reads as empty history.
    /// Individual entries that cannot be interpreted are skipped.
    pub fn load_history(&self) -> Vec<WellnessEntry> {
        match self.read_history() {
            HistoryRead::Missing => {
                log::info!(
                    "No existing check-in log at {}",
                    self.config.wellness_log.display()
                );
                Vec::new()
            }
            HistoryRead::Loaded(raw) => {
                let total = raw.len();
                let history: Vec<WellnessEntry> = raw
                    .into_iter()
                    .enumerate()
                    .filter_map(|(index, value)| match serde_json::from_value(value) {
                        Ok(entry) => Some(entry),
                        Err(e) => {
                            log::warn!("Skipping check-in #{} in the log: {}", index + 1, e);
                            None
                        }
                    })
                    .collect();
                log::debug!("Loaded {} of {} previous check-ins", history.len(), total);
                history
            }
            HistoryRead::Unreadable(e) => {
                log::warn!(
                    "Could not read check-in log {}: {}",
                    self.config.wellness_log.display(),
                    e
                );
                Vec::new()
            }
            HistoryRead::Malformed(reason) => {
                log::warn!(
                    "Ignoring malformed check-in log {}: {}",
                    self.config.wellness_log.display(),
                    reason
                );
                Vec::new()
            }
        }
    }

    /// Most recent check-in, or `None` when there is no history yet
    pub fn load_last(&self) -> Option<WellnessEntry> {
        self.load_history().pop()
    }

    fn read_history(&self) -> HistoryRead {
        let path = &self.config.wellness_log;
        let body = match fs::read(path) {
            Ok(body) => body,
            Err(e) if e.kind() == ErrorKind::NotFound => return HistoryRead::Missing,
            Err(e) => return HistoryRead::Unreadable(e),
        };

        if body.iter().all(u8::is_ascii_whitespace) {
            return HistoryRead::Loaded(Vec::new());
        }

        // Bytes that are not UTF-8 fail here too and are treated as malformed content
        match serde_json::from_slice(&body) {
            Ok(history) => HistoryRead::Loaded(history),
            Err(e) => HistoryRead::Malformed(e.to_string()),
        }
    }
}

/// Serialize `record` into a new `<stem>.json` under `dir`, never replacing a file
fn save_new<T: Serialize>(dir: &Path, stem: &str, record: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir).map_err(|e| AgentError::persistence(dir, e))?;

    let body = serde_json::to_string_pretty(record)?;

    for attempt in 0..MAX_NAME_ATTEMPTS {
        let name = if attempt == 0 {
            format!("{}.json", stem)
        } else {
            format!("{}-{}.json", stem, attempt)
        };
        let path = dir.join(name);

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(AgentError::persistence(&path, e)),
        };

        fill_new_file(&path, &mut file, |file| {
            file.write_all(body.as_bytes())?;
            file.sync_all()
        })?;
        return Ok(path);
    }

    Err(AgentError::persistence(
        dir,
        io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free filename for {}", stem),
        ),
    ))
}

/// Run `write` on a file we just created; a failed write removes the file again
fn fill_new_file<F>(path: &Path, file: &mut File, write: F) -> Result<()>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    if let Err(e) = write(file) {
        if let Err(cleanup) = fs::remove_file(path) {
            log::warn!("Could not remove partial file {}: {}", path.display(), cleanup);
        }
        return Err(AgentError::persistence(path, e));
    }
    Ok(())
}

fn is_order_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.starts_with("order_") && name.ends_with(".json"))
        .unwrap_or(false)
}

/// The `N` of a `<stem>-N.json` collision name, 0 for the unsuffixed name
fn collision_suffix(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit_once('-'))
        .and_then(|(_, n)| n.parse().ok())
        .unwrap_or(0)
}

/// `<log>.bak.<timestamp>`, with a `-N` suffix if that name is taken
fn free_backup_path(log_path: &Path) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S_%6f").to_string();

    (0..MAX_NAME_ATTEMPTS)
        .map(|attempt| match attempt {
            0 => sibling_path(log_path, &format!("bak.{}", stamp)),
            n => sibling_path(log_path, &format!("bak.{}-{}", stamp, n)),
        })
        .find(|candidate| !candidate.exists())
        .ok_or_else(|| {
            AgentError::persistence(
                log_path,
                io::Error::new(ErrorKind::AlreadyExists, "no free backup name"),
            )
        })
}

/// `<file>.<suffix>` next to `path`
fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "records".to_string());
    path.with_file_name(format!("{}.{}", name, suffix))
}

/// Write to a temp file in the same directory, then rename over `path`
fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp_path = sibling_path(path, "tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| AgentError::persistence(&tmp_path, e))?;
    tmp_file
        .write_all(contents)
        .and_then(|_| tmp_file.sync_all())
        .map_err(|e| AgentError::persistence(&tmp_path, e))?;
    drop(tmp_file);

    fs::rename(&tmp_path, path).map_err(|e| AgentError::persistence(path, e))
}
