//! Size-based log file rotation.
//!
//! The active file is `<stem>.<ext>`. When a write would push it past the size
//! limit, files shift one place: `<stem>.<ext>` becomes `<stem>.1.<ext>`,
//! `<stem>.1.<ext>` becomes `<stem>.2.<ext>`, and the oldest beyond the file
//! count is deleted.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Writer that rolls its file over once it reaches `max_size` bytes.
///
/// At most `max_files` files exist at once, the active one included. A
/// `max_size` of zero disables rotation.
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    max_size: u64,
    max_files: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    pub fn open(path: impl Into<PathBuf>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();
        Ok(Self {
            path,
            max_size,
            max_files: max_files.max(1),
            file,
            written,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the `index`-th rotated file.
    pub fn rotated_path(&self, index: usize) -> PathBuf {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let name = match self.path.extension() {
            Some(ext) => format!("{stem}.{index}.{}", ext.to_string_lossy()),
            None => format!("{stem}.{index}"),
        };
        self.path.with_file_name(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;
        let backups = self.max_files - 1;

        if backups > 0 {
            let oldest = self.rotated_path(backups);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..backups).rev() {
                let from = self.rotated_path(index);
                if from.exists() {
                    fs::rename(&from, self.rotated_path(index + 1))?;
                }
            }
            fs::rename(&self.path, self.rotated_path(1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.max_size > 0 && self.written > 0 && self.written + buf.len() as u64 > self.max_size {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
