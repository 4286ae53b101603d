use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("download directory {path:?} is a file")]
    NotADirectory { path: PathBuf },
    #[error("cannot prepare download directory {path:?}: {source}")]
    DownloadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("writing artifact failed: {0}")]
    Io(#[from] io::Error),
}

/// Makes sure downloads have somewhere to land. Missing parents are created;
/// a regular file at `dir` is refused rather than replaced.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    let unusable = |source: io::Error| PersistError::DownloadDir {
        path: dir.to_path_buf(),
        source,
    };
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PersistError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(unusable)
        }
        Err(err) => Err(unusable(err)),
    }
}

/// Streams a downloaded artifact into a temp file next to its destination
/// and renames it into place once complete. A failed or abandoned download
/// leaves nothing behind under the final name.
pub struct ArtifactWriter {
    dir: PathBuf,
    tmp: NamedTempFile,
    written: u64,
}

impl ArtifactWriter {
    pub fn create(dir: &Path) -> Result<Self, PersistError> {
        ensure_output_dir(dir)?;
        let tmp = NamedTempFile::new_in(dir).map_err(|source| PersistError::DownloadDir {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            tmp,
            written: 0,
        })
    }

    pub fn write_chunk(&mut self, chunk: &[u8]) -> Result<(), PersistError> {
        self.tmp.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Moves the finished file to `{dir}/{filename}`, replacing any previous copy.
    pub fn persist(mut self, filename: &str) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(filename);
        self.tmp.flush()?;
        self.tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        self.tmp
            .persist(&target)
            .map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
