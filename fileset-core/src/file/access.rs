use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use crate::config::Encoding;
use crate::error::{FileSetError, Result};

/// Filesystem primitives used by entry sets and entities. Missing paths come
/// back as `None`/`false`, every other failure is an error carrying the path.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileAccess {
    pub encoding: Encoding,
}

impl FileAccess {
    pub fn new(encoding: Encoding) -> Self {
        Self { encoding }
    }

    pub async fn read_bytes(&self, path: &Path) -> Result<Option<Vec<u8>>> {
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FileSetError::io(path, e)),
        }
    }

    pub async fn read_text(&self, path: &Path) -> Result<Option<String>> {
        self.read_bytes(path)
            .await?
            .map(|bytes| self.encoding.decode(bytes))
            .transpose()
    }

    /// Create or truncate `path`, creating missing parent directories.
    pub async fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        let bytes = self.encoding.encode(content)?;
        ensure_parent(path).await?;
        fs::write(path, bytes)
            .await
            .map_err(|e| FileSetError::io(path, e))
    }

    /// Append to `path`, creating it and its parents when missing. With
    /// `new_line`, content lands on its own line unless the file did not
    /// exist yet.
    pub async fn append_text(&self, path: &Path, content: &str, new_line: bool) -> Result<()> {
        ensure_parent(path).await?;
        let existed = exists(path).await?;
        let content = if existed && new_line {
            format!("\n{content}")
        } else {
            content.to_string()
        };
        let bytes = self.encoding.encode(&content)?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| FileSetError::io(path, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| FileSetError::io(path, e))?;
        file.flush().await.map_err(|e| FileSetError::io(path, e))
    }
}

pub async fn exists(path: &Path) -> Result<bool> {
    fs::try_exists(path)
        .await
        .map_err(|e| FileSetError::io(path, e))
}

/// `mkdir -p`. An existing directory is a success.
pub async fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .await
        .map_err(|e| FileSetError::io(path, e))
}

pub async fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent).await,
        _ => Ok(()),
    }
}

/// Remove a file, symlink or directory tree. Returns false when nothing was
/// there.
pub async fn remove(path: &Path) -> Result<bool> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(FileSetError::io(path, e)),
    };

    let removed = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };
    match removed {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(FileSetError::io(path, e)),
    }
}

/// Copy a file, symlink or directory tree to `destination`.
///
/// Directories are merged into an existing destination directory. Existing
/// destination files are replaced when `overwrite` is set and left alone
/// otherwise. A file never replaces a directory, and a directory is never
/// copied into itself. Returns the number of files and links written.
pub async fn copy(source: &Path, destination: &Path, overwrite: bool) -> Result<u64> {
    let metadata = fs::symlink_metadata(source)
        .await
        .map_err(|e| FileSetError::io(source, e))?;
    reject_nested(source, destination)?;

    if !metadata.is_dir() {
        ensure_parent(destination).await?;
        return copy_leaf(source, destination, metadata.is_symlink(), overwrite).await;
    }

    if let Some(existing) = lstat(destination).await? {
        if !existing.is_dir() {
            return Err(FileSetError::NotADirectory {
                path: destination.to_path_buf(),
            });
        }
    }

    let mut written = 0;
    for entry in WalkDir::new(source).follow_links(false) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(source).to_path_buf();
            FileSetError::io(path, io::Error::other(e))
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = destination.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            ensure_dir(&target).await?;
        } else {
            written += copy_leaf(entry.path(), &target, file_type.is_symlink(), overwrite).await?;
        }
    }
    Ok(written)
}

async fn copy_leaf(source: &Path, target: &Path, is_symlink: bool, overwrite: bool) -> Result<u64> {
    if let Some(existing) = lstat(target).await? {
        if existing.is_dir() {
            return Err(FileSetError::NotAFile {
                path: target.to_path_buf(),
            });
        }
        if !overwrite {
            return Ok(0);
        }
        fs::remove_file(target)
            .await
            .map_err(|e| FileSetError::io(target, e))?;
    }

    if is_symlink {
        let link = fs::read_link(source)
            .await
            .map_err(|e| FileSetError::io(source, e))?;
        symlink(&link, target).await?;
    } else {
        fs::copy(source, target)
            .await
            .map_err(|e| FileSetError::io(target, e))?;
    }
    Ok(1)
}

/// Move `source` to `destination`. An existing destination is replaced only
/// by the same kind of entry: a file or link replaces a file or link, a
/// directory replaces an empty directory. Falls back to copy and delete when
/// a rename cannot cross filesystems.
pub async fn move_path(source: &Path, destination: &Path) -> Result<()> {
    let metadata = fs::symlink_metadata(source)
        .await
        .map_err(|e| FileSetError::io(source, e))?;
    if source == destination {
        return Ok(());
    }
    reject_nested(source, destination)?;
    ensure_parent(destination).await?;
    clear_destination(metadata.is_dir(), destination).await?;

    match fs::rename(source, destination).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy(source, destination, true).await?;
            remove(source).await?;
            Ok(())
        }
        Err(e) => Err(FileSetError::io(source, e)),
    }
}

async fn clear_destination(source_is_dir: bool, destination: &Path) -> Result<()> {
    let Some(existing) = lstat(destination).await? else {
        return Ok(());
    };

    let cleared = match (source_is_dir, existing.is_dir()) {
        (false, false) => fs::remove_file(destination).await,
        (true, true) => fs::remove_dir(destination).await,
        (false, true) => {
            return Err(FileSetError::NotAFile {
                path: destination.to_path_buf(),
            })
        }
        (true, false) => {
            return Err(FileSetError::NotADirectory {
                path: destination.to_path_buf(),
            })
        }
    };
    cleared.map_err(|e| FileSetError::io(destination, e))
}

/// Fail when `destination` is `source` itself or lies inside it.
fn reject_nested(source: &Path, destination: &Path) -> Result<()> {
    let source_abs = std::path::absolute(source).map_err(|e| FileSetError::io(source, e))?;
    let destination_abs =
        std::path::absolute(destination).map_err(|e| FileSetError::io(destination, e))?;
    if destination_abs.starts_with(&source_abs) {
        return Err(FileSetError::NestedDestination {
            from: source.to_path_buf(),
            to: destination.to_path_buf(),
        });
    }
    Ok(())
}

async fn lstat(path: &Path) -> Result<Option<std::fs::Metadata>> {
    match fs::symlink_metadata(path).await {
        Ok(metadata) => Ok(Some(metadata)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(FileSetError::io(path, e)),
    }
}

/// Create a symbolic link at `link` pointing to `target`.
pub async fn symlink(target: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    let created = fs::symlink(target, link).await;
    #[cfg(windows)]
    let created = if fs::metadata(target).await.map(|m| m.is_dir()).unwrap_or(false) {
        fs::symlink_dir(target, link).await
    } else {
        fs::symlink_file(target, link).await
    };
    created.map_err(|e| FileSetError::io(link, e))
}

/// Direct children of a directory, sorted by name.
pub async fn list_directory(path: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(path)
        .await
        .map_err(|e| FileSetError::io(path, e))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| FileSetError::io(path, e))?
    {
        paths.push(entry.path());
    }
    paths.sort();
    Ok(paths)
}

/// Total size in bytes of every file below `path`.
pub fn directory_size(path: &Path) -> Result<u64> {
    let mut total = 0;
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.map_err(|e| {
            let failed = e.path().unwrap_or(path).to_path_buf();
            FileSetError::io(failed, io::Error::other(e))
        })?;
        if entry.file_type().is_file() {
            let metadata = entry
                .metadata()
                .map_err(|e| FileSetError::io(entry.path(), io::Error::other(e)))?;
            total += metadata.len();
        }
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as std_fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_read_missing_is_none() {
        let temp = tempdir().unwrap();
        let access = FileAccess::default();
        assert!(access
            .read_text(&temp.path().join("nope.txt"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_write_creates_parents() {
        let temp = tempdir().unwrap();
        let access = FileAccess::default();
        let path = temp.path().join("out/nested/file.txt");

        access.write_text(&path, "hello").await.unwrap();
        assert_eq!(std_fs::read_to_string(&path).unwrap(), "hello");
        assert_eq!(
            access.read_text(&path).await.unwrap().as_deref(),
            Some("hello")
        );
    }

    #[tokio::test]
    async fn test_write_latin1() {
        let temp = tempdir().unwrap();
        let access = FileAccess::new(Encoding::Latin1);
        let path = temp.path().join("latin1.txt");

        access.write_text(&path, "é").await.unwrap();
        assert_eq!(std_fs::read(&path).unwrap(), vec![0xE9]);
        assert_eq!(access.read_text(&path).await.unwrap().unwrap(), "é");
    }

    #[tokio::test]
    async fn test_append_new_line_only_after_first_write() {
        let temp = tempdir().unwrap();
        let access = FileAccess::default();
        let path = temp.path().join("log/app.log");

        access.append_text(&path, "first", true).await.unwrap();
        access.append_text(&path, "second", true).await.unwrap();
        access.append_text(&path, "-tail", false).await.unwrap();
        assert_eq!(
            std_fs::read_to_string(&path).unwrap(),
            "first\nsecond-tail"
        );
    }

    #[tokio::test]
    async fn test_remove_file_directory_and_missing() {
        let temp = tempdir().unwrap();
        let file = temp.path().join("a.txt");
        let dir = temp.path().join("tree");
        std_fs::write(&file, "x").unwrap();
        std_fs::create_dir_all(dir.join("deep/er")).unwrap();
        std_fs::write(dir.join("deep/er/b.txt"), "y").unwrap();

        assert!(remove(&file).await.unwrap());
        assert!(remove(&dir).await.unwrap());
        assert!(!remove(&file).await.unwrap());
        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_copy_tree() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("src");
        std_fs::create_dir_all(source.join("sub")).unwrap();
        std_fs::write(source.join("a.txt"), "a").unwrap();
        std_fs::write(source.join("sub/b.txt"), "b").unwrap();

        let destination = temp.path().join("dst");
        let written = copy(&source, &destination, true).await.unwrap();
        assert_eq!(written, 2);
        assert_eq!(
            std_fs::read_to_string(destination.join("sub/b.txt")).unwrap(),
            "b"
        );
        assert!(source.join("a.txt").exists());
    }

    #[tokio::test]
    async fn test_copy_without_overwrite_keeps_existing() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("a.txt");
        let destination = temp.path().join("b.txt");
        std_fs::write(&source, "new").unwrap();
        std_fs::write(&destination, "old").unwrap();

        assert_eq!(copy(&source, &destination, false).await.unwrap(), 0);
        assert_eq!(std_fs::read_to_string(&destination).unwrap(), "old");

        assert_eq!(copy(&source, &destination, true).await.unwrap(), 1);
        assert_eq!(std_fs::read_to_string(&destination).unwrap(), "new");
    }

    #[tokio::test]
    async fn test_move_path_replaces_destination() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("a.txt");
        let destination = temp.path().join("moved/b.txt");
        std_fs::write(&source, "a").unwrap();
        std_fs::create_dir_all(destination.parent().unwrap()).unwrap();
        std_fs::write(&destination, "old").unwrap();

        move_path(&source, &destination).await.unwrap();
        assert!(!source.exists());
        assert_eq!(std_fs::read_to_string(&destination).unwrap(), "a");
    }

    #[tokio::test]
    async fn test_copy_file_never_replaces_directory() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("a.txt");
        let dist = temp.path().join("dist");
        std_fs::write(&source, "a").unwrap();
        std_fs::create_dir_all(dist.join("keep")).unwrap();
        std_fs::write(dist.join("keep/important.bin"), "data").unwrap();

        let err = copy(&source, &dist, true).await.unwrap_err();
        assert!(matches!(err, FileSetError::NotAFile { .. }));
        assert!(dist.join("keep/important.bin").exists());
    }

    #[tokio::test]
    async fn test_copy_directory_onto_file_fails() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("src");
        let destination = temp.path().join("dst");
        std_fs::create_dir(&source).unwrap();
        std_fs::write(source.join("a.txt"), "a").unwrap();
        std_fs::write(&destination, "file").unwrap();

        let err = copy(&source, &destination, true).await.unwrap_err();
        assert!(matches!(err, FileSetError::NotADirectory { .. }));
        assert_eq!(std_fs::read_to_string(&destination).unwrap(), "file");
    }

    #[tokio::test]
    async fn test_copy_into_own_subtree_fails() {
        let temp = tempdir().unwrap();
        let assets = temp.path().join("assets");
        std_fs::create_dir_all(&assets).unwrap();
        std_fs::write(assets.join("logo.svg"), "<svg/>").unwrap();

        let err = copy(&assets, &assets.join("backup/assets"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, FileSetError::NestedDestination { .. }));
        assert!(!assets.join("backup").exists());

        let err = copy(&assets.join("logo.svg"), &assets.join("logo.svg"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, FileSetError::NestedDestination { .. }));
        assert_eq!(
            std_fs::read_to_string(assets.join("logo.svg")).unwrap(),
            "<svg/>"
        );
    }

    #[tokio::test]
    async fn test_move_file_never_replaces_directory() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("a.txt");
        let dist = temp.path().join("dist");
        std_fs::write(&source, "a").unwrap();
        std_fs::create_dir_all(dist.join("keep")).unwrap();
        std_fs::write(dist.join("keep/important.bin"), "data").unwrap();

        let err = move_path(&source, &dist).await.unwrap_err();
        assert!(matches!(err, FileSetError::NotAFile { .. }));
        assert!(source.exists());
        assert!(dist.join("keep/important.bin").exists());
    }

    #[tokio::test]
    async fn test_move_directory_over_directories() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("src");
        std_fs::create_dir(&source).unwrap();
        std_fs::write(source.join("a.txt"), "a").unwrap();

        let full = temp.path().join("full");
        std_fs::create_dir(&full).unwrap();
        std_fs::write(full.join("keep.txt"), "keep").unwrap();
        assert!(move_path(&source, &full).await.is_err());
        assert!(full.join("keep.txt").exists());
        assert!(source.exists());

        let empty = temp.path().join("empty");
        std_fs::create_dir(&empty).unwrap();
        move_path(&source, &empty).await.unwrap();
        assert_eq!(std_fs::read_to_string(empty.join("a.txt")).unwrap(), "a");

        let file = temp.path().join("file");
        std_fs::write(&file, "f").unwrap();
        let err = move_path(&empty, &file).await.unwrap_err();
        assert!(matches!(err, FileSetError::NotADirectory { .. }));
    }

    #[tokio::test]
    async fn test_move_missing_source_fails() {
        let temp = tempdir().unwrap();
        let err = move_path(&temp.path().join("nope"), &temp.path().join("dest"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_list_and_size() {
        let temp = tempdir().unwrap();
        std_fs::write(temp.path().join("b.txt"), "12").unwrap();
        std_fs::create_dir(temp.path().join("a")).unwrap();
        std_fs::write(temp.path().join("a/c.txt"), "345").unwrap();

        let listed = list_directory(temp.path()).await.unwrap();
        assert_eq!(
            listed,
            vec![temp.path().join("a"), temp.path().join("b.txt")]
        );
        assert_eq!(directory_size(temp.path()).unwrap(), 5);
    }

    #[tokio::test]
    async fn test_ensure_dir_is_idempotent() {
        let temp = tempdir().unwrap();
        let dir = temp.path().join("x/y");
        ensure_dir(&dir).await.unwrap();
        ensure_dir(&dir).await.unwrap();
        assert!(dir.is_dir());
    }
}
