use crate::domain::{DvrError, DvrResult};
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

pub fn write_text_artifact(path: &Path, content: &str) -> DvrResult<()> {
    fs::write(path, normalize_text_artifact(content)).map_err(|source| {
        DvrError::io_system(
            "IO.WRITE_ARTIFACT",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })
}

/// Starter and job scripts are launched directly, so they carry the owner execute bit.
pub fn write_executable_artifact(path: &Path, content: &str) -> DvrResult<()> {
    write_text_artifact(path, content)?;
    mark_executable(path)
}

/// Writes a text artifact that must not already exist. The existing file is left untouched.
pub fn create_new_text_artifact(
    path: &Path,
    content: &str,
    placeholder: &'static str,
) -> DvrResult<()> {
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|source| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                DvrError::io_system(
                    placeholder,
                    format!("'{}' already exists", path.display()),
                )
            } else {
                DvrError::io_system(
                    placeholder,
                    format!("failed to create '{}': {}", path.display(), source),
                )
            }
        })?;
    file.write_all(normalize_text_artifact(content).as_bytes())
        .map_err(|source| {
            DvrError::io_system(
                "IO.WRITE_ARTIFACT",
                format!("failed to write '{}': {}", path.display(), source),
            )
        })
}

pub fn read_text_artifact(path: &Path) -> DvrResult<String> {
    fs::read_to_string(path).map_err(|source| {
        DvrError::io_system(
            "IO.READ_ARTIFACT",
            format!("failed to read '{}': {}", path.display(), source),
        )
    })
}

pub fn ensure_directory(path: &Path) -> DvrResult<()> {
    fs::create_dir_all(path).map_err(|source| {
        DvrError::io_system(
            "IO.CREATE_DIRECTORY",
            format!("failed to create directory '{}': {}", path.display(), source),
        )
    })
}

pub fn copy_artifact(source: &Path, destination: &Path) -> DvrResult<()> {
    fs::copy(source, destination).map(|_| ()).map_err(|error| {
        DvrError::io_system(
            "IO.COPY_ARTIFACT",
            format!(
                "failed to copy '{}' to '{}': {}",
                source.display(),
                destination.display(),
                error
            ),
        )
    })
}

/// One CSV row per item; the header comes from the row type's field names.
pub fn write_csv_artifact<T: Serialize>(path: &Path, rows: &[T]) -> DvrResult<()> {
    let csv_error = |source: csv::Error| {
        DvrError::io_system(
            "IO.WRITE_CSV",
            format!("failed to write '{}': {}", path.display(), source),
        )
    };
    let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;
    for row in rows {
        writer.serialize(row).map_err(csv_error)?;
    }
    writer.flush().map_err(|source| {
        DvrError::io_system(
            "IO.WRITE_CSV",
            format!("failed to flush '{}': {}", path.display(), source),
        )
    })
}

#[cfg(unix)]
fn mark_executable(path: &Path) -> DvrResult<()> {
    use std::os::unix::fs::PermissionsExt;

    let io_error = |source: std::io::Error| {
        DvrError::io_system(
            "IO.SET_PERMISSIONS",
            format!("failed to mark '{}' executable: {}", path.display(), source),
        )
    };
    let mut permissions = fs::metadata(path).map_err(io_error)?.permissions();
    permissions.set_mode(permissions.mode() | 0o755);
    fs::set_permissions(path, permissions).map_err(io_error)
}

#[cfg(not(unix))]
fn mark_executable(_path: &Path) -> DvrResult<()> {
    Ok(())
}
