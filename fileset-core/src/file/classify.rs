use std::fs::Metadata;
use std::io;
use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::fs;

use crate::error::{FileSetError, Result};

/// Existence and type of a path, from a single `lstat`.
///
/// A symbolic link reports `is_symlink` only: its target is not followed, so
/// a link to a file is neither `is_file` nor `is_directory`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Classification {
    pub exists: bool,
    pub is_file: bool,
    pub is_directory: bool,
    pub is_symlink: bool,
}

impl Classification {
    pub fn absent() -> Self {
        Self::default()
    }

    fn from_metadata(metadata: &Metadata) -> Self {
        let file_type = metadata.file_type();
        Self {
            exists: true,
            is_file: file_type.is_file(),
            is_directory: file_type.is_dir(),
            is_symlink: file_type.is_symlink(),
        }
    }
}

/// Which member types an entry set keeps.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TypeFilter {
    Files,
    Directories,
    #[default]
    Unfiltered,
}

impl TypeFilter {
    pub fn accepts(self, classification: &Classification) -> bool {
        match self {
            TypeFilter::Files => classification.is_file,
            TypeFilter::Directories => classification.is_directory,
            TypeFilter::Unfiltered => true,
        }
    }
}

/// Snapshot of the metadata this crate cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryStats {
    pub classification: Classification,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl EntryStats {
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            classification: Classification::from_metadata(metadata),
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
        }
    }

    /// Modification time in milliseconds since the Unix epoch.
    pub fn last_modified_millis(&self) -> Option<i64> {
        self.modified.map(|modified| modified.timestamp_millis())
    }
}

/// `lstat` a path, mapping "not found" to `None`. Every other failure is an
/// error.
pub async fn stat(path: &Path) -> Result<Option<EntryStats>> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) => Ok(Some(EntryStats::from_metadata(&metadata))),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FileSetError::io(path, e)),
    }
}

pub async fn classify(path: &Path) -> Result<Classification> {
    Ok(stat(path)
        .await?
        .map(|stats| stats.classification)
        .unwrap_or_default())
}

/// Keep the paths whose current classification passes `filter`. Every path is
/// classified again, nothing is assumed from how it was found.
pub async fn retain_by_type<P: AsRef<Path>>(paths: Vec<P>, filter: TypeFilter) -> Result<Vec<P>> {
    if filter == TypeFilter::Unfiltered {
        return Ok(paths);
    }

    let mut kept = Vec::with_capacity(paths.len());
    for path in paths {
        if filter.accepts(&classify(path.as_ref()).await?) {
            kept.push(path);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_classify_missing_is_all_false() {
        let temp = tempdir().unwrap();
        let classification = classify(&temp.path().join("nope")).await.unwrap();
        assert_eq!(classification, Classification::absent());
        assert!(stat(&temp.path().join("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_classify_file_and_directory() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("a.txt");
        std_fs::write(&file, "content").unwrap();

        let classification = classify(&file).await.unwrap();
        assert!(classification.exists);
        assert!(classification.is_file);
        assert!(!classification.is_directory);

        let classification = classify(temp.path()).await.unwrap();
        assert!(classification.is_directory);
        assert!(!classification.is_file);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_classify_symlink_is_not_followed() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("a.txt");
        let link = temp.path().join("link.txt");
        std_fs::write(&file, "content").unwrap();
        std::os::unix::fs::symlink(&file, &link).unwrap();

        let classification = classify(&link).await.unwrap();
        assert!(classification.exists);
        assert!(classification.is_symlink);
        assert!(!classification.is_file);
    }

    #[tokio::test]
    async fn test_stats_size_and_mtime() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("a.txt");
        std_fs::write(&file, "12345").unwrap();

        let stats = stat(&file).await.unwrap().unwrap();
        assert_eq!(stats.size, 5);
        assert!(stats.last_modified_millis().unwrap() > 0);
    }

    #[tokio::test]
    async fn test_retain_by_type() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("a.txt");
        let dir = temp.path().join("sub");
        std_fs::write(&file, "").unwrap();
        std_fs::create_dir(&dir).unwrap();
        let missing = temp.path().join("gone");

        let paths = vec![file.clone(), dir.clone(), missing.clone()];
        assert_eq!(
            retain_by_type(paths.clone(), TypeFilter::Files).await.unwrap(),
            vec![file]
        );
        assert_eq!(
            retain_by_type(paths.clone(), TypeFilter::Directories)
                .await
                .unwrap(),
            vec![dir]
        );
        assert_eq!(
            retain_by_type(paths.clone(), TypeFilter::Unfiltered)
                .await
                .unwrap(),
            paths
        );
    }
}
