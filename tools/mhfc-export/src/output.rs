//! Writing finished documents to disk

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use mhfc_common::asset_to_dir;

use crate::error::{ExportError, ExportResult};

/// Write a fully encoded document, creating parent directories as needed
pub fn write_document(path: &Path, data: &[u8]) -> ExportResult<()> {
    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(data).map_err(io_err)?;
    writer.flush().map_err(io_err)?;
    Ok(())
}

/// Filesystem path of a resource location below `output_dir`
///
/// `mod:path` lands in `<output_dir>/assets/<mod>/<path>`.
pub fn resolve_output(output_dir: &Path, location: &str) -> ExportResult<PathBuf> {
    Ok(output_dir.join(asset_to_dir(location)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("assets/mhfc/models/x.mcmd");
        write_document(&path, b"MHFC MDL").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"MHFC MDL");
    }

    #[test]
    fn test_resolve_output() {
        let out = resolve_output(Path::new("out"), "mhfc:models/rathalos/body.mcmd").unwrap();
        assert_eq!(out, Path::new("out/assets/mhfc/models/rathalos/body.mcmd"));

        let bare = resolve_output(Path::new("out"), "models/a.mcmd").unwrap();
        assert_eq!(bare, Path::new("out/assets/minecraft/models/a.mcmd"));

        assert!(resolve_output(Path::new("out"), "a:b:c").is_err());
    }

    #[test]
    fn test_write_failure_is_io_error() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"").unwrap();

        let err = write_document(&blocker.join("nested.mcanm"), b"").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
