//! Deflate-zip bundling for the tools whose output is "several files", per
//! spec.md §6's on-disk formats list (`split`, `pdf-to-jpg`).

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::error::{WorkerError, WorkerResult};

pub fn zip_files(paths: &[PathBuf], output: &Path) -> WorkerResult<()> {
    let file = File::create(output)
        .map_err(|e| WorkerError::transient(format!("cannot create zip output: {e}")))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for path in paths {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| WorkerError::transient("zip member has no filename"))?;
        writer
            .start_file(name, options)
            .map_err(|e| WorkerError::transient(format!("cannot start zip entry: {e}")))?;
        let mut contents = Vec::new();
        File::open(path)
            .map_err(|e| WorkerError::transient(format!("cannot open zip member: {e}")))?
            .read_to_end(&mut contents)
            .map_err(|e| WorkerError::transient(format!("cannot read zip member: {e}")))?;
        writer
            .write_all(&contents)
            .map_err(|e| WorkerError::transient(format!("cannot write zip entry: {e}")))?;
    }

    writer
        .finish()
        .map_err(|e| WorkerError::transient(format!("cannot finalize zip archive: {e}")))?;
    Ok(())
}
