//! Output units and atomic file writes

use log::{debug, warn};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use crate::CodegenError;

/// One generated translation unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CUnit {
    pub header: String,
    pub body: String,
}

impl CUnit {
    /// Header and body as a single source file
    pub fn combined(&self) -> String {
        format!("{}\n{}", self.header, self.body)
    }

    /// Body that pulls the header in by name, for split output
    pub fn source_with_include(&self, header_name: &str) -> String {
        format!("#include \"{}\"\n\n{}", header_name, self.body)
    }

    /// Write the unit to `source`, or to `source` plus `header` when split.
    /// Each file is replaced atomically. A failure while staging leaves
    /// every destination untouched; a failed rename can leave files renamed
    /// before it already replaced.
    pub fn write_to(&self, source: &Path, header: Option<&Path>) -> Result<(), CodegenError> {
        match header {
            None => write_atomic(source, &self.combined()),
            Some(header) => {
                let name = header
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| io_error(header, "header path has no file name"))?;
                write_all_atomic(&[
                    (header, self.header.clone()),
                    (source, self.source_with_include(&name)),
                ])
            }
        }
    }
}

fn io_error(path: &Path, message: impl ToString) -> CodegenError {
    CodegenError::Io {
        path: path.display().to_string(),
        message: message.to_string(),
    }
}

fn temp_path(path: &Path) -> Result<PathBuf, CodegenError> {
    let name = path.file_name().ok_or_else(|| io_error(path, "path has no file name"))?;
    let mut temp = name.to_os_string();
    temp.push(format!(".{}.tmp", std::process::id()));
    Ok(path.with_file_name(temp))
}

fn stage(path: &Path, contents: &str) -> Result<PathBuf, CodegenError> {
    let temp = temp_path(path)?;
    let result = (|| {
        let mut writer = BufWriter::new(File::create(&temp)?);
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
        writer.get_ref().sync_all()
    })();
    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(io_error(path, e));
    }
    Ok(temp)
}

/// Write through a sibling temporary and rename it into place, so readers
/// see either the old file or the complete new one.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), CodegenError> {
    write_all_atomic(&[(path, contents.to_string())])
}

/// Stage every file before renaming any of them
pub fn write_all_atomic(files: &[(&Path, String)]) -> Result<(), CodegenError> {
    let mut staged = Vec::with_capacity(files.len());
    for (path, contents) in files {
        match stage(path, contents) {
            Ok(temp) => staged.push((temp, *path)),
            Err(e) => {
                for (temp, _) in &staged {
                    let _ = fs::remove_file(temp);
                }
                return Err(e);
            }
        }
    }
    for (i, (temp, path)) in staged.iter().enumerate() {
        if let Err(e) = fs::rename(temp, path) {
            for (rest, _) in &staged[i..] {
                let _ = fs::remove_file(rest);
            }
            if i > 0 {
                warn!("{} of {} output files were replaced before the failure", i, staged.len());
            }
            return Err(io_error(path, e));
        }
        debug!("wrote {}", path.display());
    }
    Ok(())
}
