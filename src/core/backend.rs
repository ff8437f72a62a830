// Backing byte-sequence collaborators for the store: files on disk or an in-memory buffer.
// Resources are acquired per call and never held open between loads and saves.
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::core::error::{Error, ErrorKind};

pub trait Backend {
    /// Whole contents, or `None` when the resource does not exist.
    fn read(&self) -> Result<Option<Vec<u8>>, Error>;

    /// Replace the whole contents. Not atomic.
    fn write(&mut self, bytes: &[u8]) -> Result<(), Error>;
}

#[derive(Clone, Debug)]
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Backend for FileBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, Error> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::new(io_error_kind(&err))
                .with_message("failed to read record file")
                .with_path(&self.path)
                .with_source(err)),
        }
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&self.path)
            .map_err(|err| write_error(err, &self.path))?;
        file.write_all(bytes)
            .map_err(|err| write_error(err, &self.path))?;
        file.flush().map_err(|err| write_error(err, &self.path))?;
        Ok(())
    }
}

fn write_error(err: io::Error, path: &Path) -> Error {
    Error::new(io_error_kind(&err))
        .with_message("failed to write record file")
        .with_path(path)
        .with_source(err)
}

fn io_error_kind(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        _ => ErrorKind::Io,
    }
}

/// In-memory backing bytes; `None` until first written.
#[derive(Clone, Debug, Default)]
pub struct MemoryBackend {
    bytes: Option<Vec<u8>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: Some(bytes.into()),
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

impl Backend for MemoryBackend {
    fn read(&self) -> Result<Option<Vec<u8>>, Error> {
        Ok(self.bytes.clone())
    }

    fn write(&mut self, bytes: &[u8]) -> Result<(), Error> {
        self.bytes = Some(bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Backend, FileBackend, MemoryBackend};
    use crate::core::error::ErrorKind;

    #[test]
    fn missing_file_reads_as_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::new(dir.path().join("absent.rec"));
        assert_eq!(backend.read().expect("read"), None);
    }

    #[test]
    fn write_overwrites_in_full() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("users.rec");
        let mut backend = FileBackend::new(&path);
        backend.write(b"[user]\nname: a much longer first version\n").expect("write");
        backend.write(b"[user]\n").expect("write");
        assert_eq!(backend.read().expect("read"), Some(b"[user]\n".to_vec()));
    }

    #[test]
    fn write_into_missing_directory_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut backend = FileBackend::new(dir.path().join("nope").join("users.rec"));
        let err = backend.write(b"").expect_err("missing parent");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn directory_path_is_an_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backend = FileBackend::new(dir.path());
        let err = backend.read().expect_err("directory");
        assert_eq!(err.kind(), ErrorKind::Io);
    }

    #[test]
    fn memory_backend_starts_absent() {
        let mut backend = MemoryBackend::new();
        assert_eq!(backend.read().expect("read"), None);
        backend.write(b"x").expect("write");
        assert_eq!(backend.bytes(), Some(&b"x"[..]));
    }
}
