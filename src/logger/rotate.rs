//! @acp:module "Log Rotation"
//! @acp:summary "Dated log files rolled by size and pruned by count"
//! @acp:domain cli
//! @acp:layer service

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use chrono::format::{Item, StrftimeItems};
use chrono::Local;

use crate::error::{CliError, Result};

const EXTENSION: &str = "log";

/// Parse `"20m"`-style sizes: bytes, or a `k`/`m`/`g` suffix
pub fn parse_size(size: &str) -> Result<u64> {
    let size = size.trim().to_ascii_lowercase();
    let (digits, unit) = match size.char_indices().last() {
        Some((index, 'k')) => (&size[..index], 1024),
        Some((index, 'm')) => (&size[..index], 1024 * 1024),
        Some((index, 'g')) => (&size[..index], 1024 * 1024 * 1024),
        _ => (size.as_str(), 1),
    };

    digits
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|count| *count > 0)
        .and_then(|count| count.checked_mul(unit))
        .ok_or_else(|| CliError::config(format!("`{size}` is not a valid log size")))
}

fn validate_pattern(pattern: &str) -> Result<()> {
    let invalid = pattern.is_empty()
        || pattern.contains(['/', '\\'])
        || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error));
    if invalid {
        return Err(CliError::config(format!(
            "`{pattern}` is not a usable date pattern for log files"
        )));
    }
    Ok(())
}

struct Active {
    stamp: String,
    index: u32,
    file: File,
    written: u64,
}

/// @acp:summary "Writer that keeps `<dir>/<date>[.<n>].log` within size and count limits"
pub struct RotatingFile {
    dir: PathBuf,
    date_pattern: String,
    max_size: u64,
    max_files: usize,
    active: Option<Active>,
}

impl RotatingFile {
    pub fn new(
        dir: impl Into<PathBuf>,
        date_pattern: impl Into<String>,
        max_size: u64,
        max_files: usize,
    ) -> Result<Self> {
        let dir = dir.into();
        let date_pattern = date_pattern.into();
        validate_pattern(&date_pattern)?;
        if max_size == 0 {
            return Err(CliError::config("log files need a maximum size above zero"));
        }
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            date_pattern,
            max_size,
            max_files: max_files.max(1),
            active: None,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File currently written to, if any write happened yet
    pub fn current_path(&self) -> Option<PathBuf> {
        self.active
            .as_ref()
            .map(|active| self.path_for(&active.stamp, active.index))
    }

    fn path_for(&self, stamp: &str, index: u32) -> PathBuf {
        if index == 0 {
            self.dir.join(format!("{stamp}.{EXTENSION}"))
        } else {
            self.dir.join(format!("{stamp}.{index}.{EXTENSION}"))
        }
    }

    /// Open the first file for `stamp` at or after `index` that still has room
    fn open(&self, stamp: String, mut index: u32) -> io::Result<Active> {
        loop {
            let path = self.path_for(&stamp, index);
            let written = fs::metadata(&path).map(|meta| meta.len()).unwrap_or(0);
            if written < self.max_size {
                let file = OpenOptions::new().create(true).append(true).open(&path)?;
                return Ok(Active {
                    stamp,
                    index,
                    file,
                    written,
                });
            }
            index = index
                .checked_add(1)
                .ok_or_else(|| io::Error::other(format!("no room left for `{stamp}` logs")))?;
        }
    }

    fn active_for(&mut self, stamp: String, incoming: u64) -> io::Result<&mut Active> {
        let next = match self.active.take() {
            Some(active) if active.stamp != stamp => Some((stamp, 0)),
            Some(active) if active.written > 0 && active.written + incoming > self.max_size => {
                Some((active.stamp, active.index + 1))
            }
            Some(active) => {
                self.active = Some(active);
                None
            }
            None => Some((stamp, 0)),
        };

        if let Some((stamp, index)) = next {
            let opened = self.open(stamp, index)?;
            self.active = Some(opened);
            self.prune()?;
        }

        self.active
            .as_mut()
            .ok_or_else(|| io::Error::other("log file is not open"))
    }

    /// Write `buf` to the file for the date `stamp`
    fn write_stamped(&mut self, stamp: String, buf: &[u8]) -> io::Result<usize> {
        let active = self.active_for(stamp, buf.len() as u64)?;
        active.file.write_all(buf)?;
        active.written += buf.len() as u64;
        Ok(buf.len())
    }

    /// Delete the oldest log files beyond `max_files`
    fn prune(&self) -> io::Result<()> {
        let mut logs: Vec<(SystemTime, u32, PathBuf)> = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(EXTENSION) {
                continue;
            }
            let modified = fs::metadata(&path)?
                .modified()
                .unwrap_or(SystemTime::UNIX_EPOCH);
            logs.push((modified, roll_index(&path), path));
        }
        if logs.len() <= self.max_files {
            return Ok(());
        }

        let current = self.current_path();
        logs.sort();
        let excess = logs.len() - self.max_files;
        for (_, _, path) in logs
            .into_iter()
            .filter(|(_, _, path)| Some(path) != current.as_ref())
            .take(excess)
        {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// `3` for `day.3.log`, `0` for `day.log`
fn roll_index(path: &Path) -> u32 {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .and_then(|stem| stem.rsplit_once('.'))
        .and_then(|(_, index)| index.parse().ok())
        .unwrap_or(0)
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let stamp = Local::now().format(&self.date_pattern).to_string();
        self.write_stamped(stamp, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.active.as_mut() {
            Some(active) => active.file.flush(),
            None => Ok(()),
        }
    }
}

/// Cloneable handle handed to the file layer as its writer factory
#[derive(Clone)]
pub(crate) struct SharedFile(Arc<Mutex<RotatingFile>>);

impl SharedFile {
    pub(crate) fn new(file: RotatingFile) -> Self {
        Self(Arc::new(Mutex::new(file)))
    }
}

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log_files(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("20m").unwrap(), 20 * 1024 * 1024);
        assert_eq!(parse_size("512K").unwrap(), 512 * 1024);
        assert_eq!(parse_size("1g").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size("300").unwrap(), 300);
        assert!(parse_size("m").is_err());
        assert!(parse_size("0k").is_err());
        assert!(parse_size("lots").is_err());
        assert!(parse_size("99999999999g").is_err());
        assert_eq!(parse_size("18446744073709551615").unwrap(), u64::MAX);
    }

    #[test]
    fn test_zero_max_size_is_rejected() {
        let dir = TempDir::new().unwrap();
        let err = RotatingFile::new(dir.path(), "day", 0, 3).err().unwrap();
        assert!(matches!(err, CliError::Configuration(_)));
    }

    #[test]
    fn test_new_date_starts_a_fresh_file() {
        let dir = TempDir::new().unwrap();
        let mut file = RotatingFile::new(dir.path(), "%Y", 4, 5).unwrap();

        file.write_stamped("2026-01-01".into(), b"aaaa").unwrap();
        file.write_stamped("2026-01-01".into(), b"bb").unwrap();
        file.write_stamped("2026-01-02".into(), b"cc").unwrap();

        assert_eq!(
            log_files(dir.path()),
            vec!["2026-01-01.1.log", "2026-01-01.log", "2026-01-02.log"]
        );
        assert_eq!(
            file.current_path(),
            Some(dir.path().join("2026-01-02.log"))
        );
        assert_eq!(fs::read_to_string(dir.path().join("2026-01-02.log")).unwrap(), "cc");
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        let dir = TempDir::new().unwrap();
        assert!(RotatingFile::new(dir.path(), "%Q", 100, 3).is_err());
        assert!(RotatingFile::new(dir.path(), "%Y/%m", 100, 3).is_err());
        assert!(RotatingFile::new(dir.path(), "", 100, 3).is_err());
    }

    #[test]
    fn test_rolls_to_numbered_file_when_full() {
        let dir = TempDir::new().unwrap();
        let mut file = RotatingFile::new(dir.path(), "day", 10, 5).unwrap();

        file.write_all(b"123456").unwrap();
        file.write_all(b"789012").unwrap();
        file.write_all(b"345").unwrap();

        assert_eq!(log_files(dir.path()), vec!["day.1.log", "day.log"]);
        assert_eq!(fs::read_to_string(dir.path().join("day.log")).unwrap(), "123456");
        assert_eq!(
            fs::read_to_string(dir.path().join("day.1.log")).unwrap(),
            "789012345"
        );
    }

    #[test]
    fn test_prunes_to_max_files() {
        let dir = TempDir::new().unwrap();
        let mut file = RotatingFile::new(dir.path(), "day", 4, 2).unwrap();
        for chunk in [b"aaaa", b"bbbb", b"cccc", b"dddd"] {
            file.write_all(chunk).unwrap();
        }

        let names = log_files(dir.path());
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"day.3.log".to_string()));
    }

    #[test]
    fn test_reopen_resumes_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("day.log"), "old\n").unwrap();

        let mut file = RotatingFile::new(dir.path(), "day", 100, 3).unwrap();
        file.write_all(b"new\n").unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("day.log")).unwrap(),
            "old\nnew\n"
        );
    }
}
