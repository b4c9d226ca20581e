//! Self-deleting scratch files and directories.

use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::{Builder, NamedTempFile, TempDir};

use crate::error::{HarnessError, Result};
use crate::structured_log::sha256_hex;

fn scratch_err(what: &'static str) -> impl FnOnce(std::io::Error) -> HarnessError {
    move |source| HarnessError::Scratch { what, source }
}

/// Temporary file under the OS temp dir, removed on drop.
#[derive(Debug)]
pub struct ScratchFile {
    inner: NamedTempFile,
}

impl ScratchFile {
    pub fn new(prefix: &str) -> Result<Self> {
        let inner = Builder::new()
            .prefix(prefix)
            .tempfile()
            .map_err(scratch_err("create file"))?;
        Ok(Self { inner })
    }

    /// Create and fill in one step.
    pub fn with_contents(prefix: &str, bytes: &[u8]) -> Result<Self> {
        let mut file = Self::new(prefix)?;
        file.write_all(bytes)?;
        Ok(file)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Append `bytes` and flush.
    pub fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let file = self.inner.as_file_mut();
        file.write_all(bytes).map_err(scratch_err("write"))?;
        file.flush().map_err(scratch_err("flush"))
    }

    /// Read the whole file from the start.
    pub fn read_back(&mut self) -> Result<Vec<u8>> {
        let file = self.inner.as_file_mut();
        file.seek(SeekFrom::Start(0)).map_err(scratch_err("seek"))?;
        let mut out = Vec::new();
        file.read_to_end(&mut out).map_err(scratch_err("read"))?;
        Ok(out)
    }

    pub fn sha256(&mut self) -> Result<String> {
        Ok(sha256_hex(&self.read_back()?))
    }
}

/// Temporary directory, removed with its contents on drop.
#[derive(Debug)]
pub struct ScratchDir {
    inner: TempDir,
}

impl ScratchDir {
    pub fn new(prefix: &str) -> Result<Self> {
        let inner = Builder::new()
            .prefix(prefix)
            .tempdir()
            .map_err(scratch_err("create dir"))?;
        Ok(Self { inner })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// Path of `name` inside the directory (not created).
    #[must_use]
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.inner.path().join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_file_round_trips_and_cleans_up() {
        let path;
        {
            let mut file = ScratchFile::with_contents("focalkit-", b"hello").unwrap();
            file.write_all(b" world").unwrap();
            assert_eq!(file.read_back().unwrap(), b"hello world");
            assert_eq!(file.sha256().unwrap().len(), 64);
            path = file.path().to_path_buf();
            assert!(path.exists());
        }
        assert!(!path.exists());
    }

    #[test]
    fn scratch_dir_removes_children() {
        let inner;
        {
            let dir = ScratchDir::new("focalkit-dir-").unwrap();
            inner = dir.file_path("log.jsonl");
            std::fs::write(&inner, b"{}").unwrap();
            assert!(inner.exists());
        }
        assert!(!inner.exists());
    }

    #[test]
    fn early_return_still_cleans_up() {
        fn fails_midway(slot: &mut Option<PathBuf>) -> Result<()> {
            let file = ScratchFile::new("focalkit-early-")?;
            *slot = Some(file.path().to_path_buf());
            Err(HarnessError::UnknownSuite("midway".into()))
        }
        let mut seen = None;
        assert!(fails_midway(&mut seen).is_err());
        assert!(!seen.unwrap().exists());
    }
}
