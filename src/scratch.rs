//! Per-job scratch directory (C14): every job gets its own `tempfile`-backed
//! root, released on every exit path — including a panic unwind — because
//! release rides on `TempDir`'s `Drop`, not an explicit cleanup call.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use uuid::Uuid;

use crate::error::{WorkerError, WorkerResult};

pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> WorkerResult<Self> {
        let dir = TempDir::new()
            .map_err(|e| WorkerError::transient(format!("cannot create scratch dir: {e}")))?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `temp/NN_original-name` — the deterministic input-artifact naming
    /// scheme (§3), `NN` 1-based and zero-padded to two digits.
    pub fn input_path(&self, index: usize, original_name: &str) -> PathBuf {
        let stem = Path::new(original_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| original_name.to_string());
        self.dir.path().join(format!("{index:02}_{stem}"))
    }

    /// `{stem}_{runId}_{stage}.pdf`, an 8-hex-char nonce guarding against
    /// collisions between intermediate files of the same name within one
    /// job (scratch roots never collide across jobs, but a stage may run
    /// more than once within a job).
    pub fn intermediate_path(&self, stem: &str, stage: &str) -> PathBuf {
        let nonce = &Uuid::new_v4().simple().to_string()[..8];
        self.dir
            .path()
            .join(format!("{stem}_{nonce}_{stage}.pdf"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_path_pads_index_and_keeps_basename() {
        let scratch = ScratchDir::new().unwrap();
        let path = scratch.input_path(3, "report.pdf");
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "03_report.pdf");
    }

    #[test]
    fn intermediate_paths_are_unique() {
        let scratch = ScratchDir::new().unwrap();
        let a = scratch.intermediate_path("doc", "normalize");
        let b = scratch.intermediate_path("doc", "normalize");
        assert_ne!(a, b);
    }
}
