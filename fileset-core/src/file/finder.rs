use std::path::PathBuf;

use crate::config::Options;
use crate::error::Result;
use crate::file::classify::{self, TypeFilter};
use crate::file::entity::{DirectoryEntity, Entity, FileEntity, NodeState};
use crate::file::glob::{self, ResolveMode};

/// Expand `pattern` and wrap every match that passes `filter` in an entity.
/// Matches that are neither files nor directories are skipped.
pub async fn find(filter: TypeFilter, pattern: &str, options: &Options) -> Result<Vec<Entity>> {
    let mut entities = Vec::new();
    for path in glob::resolve(pattern, ResolveMode::ExistingOnly, options)? {
        if let Some(entity) = entity_from_path(path, filter).await? {
            entities.push(entity);
        }
    }
    Ok(entities)
}

pub async fn find_files(pattern: &str, options: &Options) -> Result<Vec<FileEntity>> {
    Ok(find(TypeFilter::Files, pattern, options)
        .await?
        .into_iter()
        .filter_map(Entity::into_file)
        .collect())
}

pub async fn find_directories(pattern: &str, options: &Options) -> Result<Vec<DirectoryEntity>> {
    Ok(find(TypeFilter::Directories, pattern, options)
        .await?
        .into_iter()
        .filter_map(Entity::into_directory)
        .collect())
}

/// Stat `path` and build the matching entity, already resolved.
pub async fn entity_from_path(path: PathBuf, filter: TypeFilter) -> Result<Option<Entity>> {
    let Some(stats) = classify::stat(&path).await? else {
        return Ok(None);
    };
    let classification = stats.classification;
    if !filter.accepts(&classification) {
        return Ok(None);
    }

    let state = NodeState::resolved(path, Some(stats));
    let entity = if classification.is_file {
        Entity::File(FileEntity::from_state(state))
    } else if classification.is_directory {
        Entity::Directory(DirectoryEntity::from_state(state))
    } else {
        return Ok(None);
    };
    Ok(Some(entity))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::entity::PathNode;
    use std::fs;
    use tempfile::tempdir;

    fn tree() -> tempfile::TempDir {
        let temp = tempdir().unwrap();
        fs::create_dir_all(temp.path().join("src/nested")).unwrap();
        fs::write(temp.path().join("src/a.rs"), "").unwrap();
        fs::write(temp.path().join("src/b.rs"), "").unwrap();
        temp
    }

    #[tokio::test]
    async fn test_find_types() {
        let temp = tree();
        let options = Options::default().with_cwd(temp.path());

        let all = find(TypeFilter::Unfiltered, "src/*", &options).await.unwrap();
        assert_eq!(all.len(), 3);

        let files = find_files("src/*", &options).await.unwrap();
        assert_eq!(
            files.iter().map(|f| f.path().to_path_buf()).collect::<Vec<_>>(),
            vec![temp.path().join("src/a.rs"), temp.path().join("src/b.rs")]
        );
        assert!(files.iter().all(|f| f.is_resolved()));

        let directories = find_directories("src/*", &options).await.unwrap();
        assert_eq!(directories.len(), 1);
        assert_eq!(directories[0].path(), temp.path().join("src/nested"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_symlinks_are_skipped() {
        let temp = tree();
        std::os::unix::fs::symlink(temp.path().join("src/a.rs"), temp.path().join("src/link.rs"))
            .unwrap();
        let options = Options::default().with_cwd(temp.path());

        let all = find(TypeFilter::Unfiltered, "src/*.rs", &options).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_entity_from_missing_path() {
        let temp = tempdir().unwrap();
        let entity = entity_from_path(temp.path().join("nope"), TypeFilter::Unfiltered)
            .await
            .unwrap();
        assert!(entity.is_none());
    }
}
