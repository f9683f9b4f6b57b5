//! Atomic file writes shared by the stores.

use std::path::Path;
use storybooker_error::{StorageError, StorageErrorKind, StorybookerResult};

/// Write `bytes` to `path` through a temporary file and rename.
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> StorybookerResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                parent.display(),
                e
            )))
        })?;
    }

    let temp_path = path.with_extension("tmp");
    tokio::fs::write(&temp_path, bytes).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
    })?;

    tokio::fs::rename(&temp_path, path).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            path.display(),
            e
        )))
    })?;
    Ok(())
}

/// Keep `[A-Za-z0-9_-]`, map everything else to `_`.
pub(crate) fn safe_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    if stem.is_empty() { "asset".to_string() } else { stem }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_stem() {
        assert_eq!(safe_file_stem("page_0"), "page_0");
        assert_eq!(safe_file_stem("../cover"), "___cover");
        assert_eq!(safe_file_stem(""), "asset");
    }
}
