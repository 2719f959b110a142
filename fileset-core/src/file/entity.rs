//! Single-path handles.
//!
//! An entity wraps one path and caches what an `lstat` said about it. The
//! cache is filled lazily by the first query that needs it, or explicitly by
//! [`PathNode::refresh`], and is dropped whenever the entity is pointed at a
//! new path. Constructing an entity never touches the filesystem.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{Map, Value};

use crate::codec::{Codec, DotEnv, Json, Json5, Raw, Yaml};
use crate::config::{Encoding, Options};
use crate::error::{FileSetError, Result};
use crate::file::access::{self, FileAccess};
use crate::file::classify::{self, EntryStats, TypeFilter};
use crate::file::finder;
use crate::file::resolver::{anchor_destination, expand_home, resolve_destination, PathParts};

/// Path, decomposed name and cached stats shared by every entity kind.
#[derive(Debug, Clone)]
pub struct NodeState {
    path: PathBuf,
    parts: PathParts,
    stats: Option<EntryStats>,
    resolved: bool,
}

impl NodeState {
    /// Unresolved state for `path`. `~` is expanded, nothing is read.
    pub fn new(path: &str) -> Result<Self> {
        if path.is_empty() {
            return Err(FileSetError::MissingPath);
        }
        Ok(Self::unresolved(expand_home(path)))
    }

    /// State for a path whose stats were just taken.
    pub(crate) fn resolved(path: PathBuf, stats: Option<EntryStats>) -> Self {
        Self {
            parts: PathParts::new(&path),
            path,
            stats,
            resolved: true,
        }
    }

    fn unresolved(path: PathBuf) -> Self {
        Self {
            parts: PathParts::new(&path),
            path,
            stats: None,
            resolved: false,
        }
    }

    fn reset(&mut self, path: PathBuf) {
        *self = Self::unresolved(path);
    }
}

/// What [`PathNode::move_to`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The destination was taken and overwriting was not allowed.
    AlreadyExists,
    /// The destination was replaced.
    Overridden,
    Moved,
}

/// What [`FileEntity::load`] found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    NotFound,
}

/// Capabilities common to files and directories.
#[async_trait]
pub trait PathNode: Send + Sync {
    fn state(&self) -> &NodeState;

    fn state_mut(&mut self) -> &mut NodeState;

    fn path(&self) -> &Path {
        &self.state().path
    }

    fn parts(&self) -> &PathParts {
        &self.state().parts
    }

    /// Cached stats, `None` when unresolved or missing.
    fn stats(&self) -> Option<&EntryStats> {
        self.state().stats.as_ref()
    }

    fn is_resolved(&self) -> bool {
        self.state().resolved
    }

    /// Point the entity at another path. Cached stats are dropped.
    fn set_path(&mut self, path: &str) -> Result<()> {
        if path.is_empty() {
            return Err(FileSetError::MissingPath);
        }
        self.state_mut().reset(expand_home(path));
        Ok(())
    }

    /// Forget cached state. The path is kept.
    fn dispose(&mut self) {
        let path = self.path().to_path_buf();
        self.state_mut().reset(path);
    }

    /// Stat the path again and cache the result.
    async fn refresh(&mut self) -> Result<()> {
        let path = self.path().to_path_buf();
        let stats = classify::stat(&path).await?;
        let state = self.state_mut();
        state.stats = stats;
        state.resolved = true;
        Ok(())
    }

    /// Cached stats, taking them first if the entity is unresolved.
    async fn resolved_stats(&mut self) -> Result<Option<EntryStats>> {
        if !self.is_resolved() {
            self.refresh().await?;
        }
        Ok(self.stats().cloned())
    }

    async fn exists(&mut self) -> Result<bool> {
        Ok(self.resolved_stats().await?.is_some())
    }

    async fn is_file(&mut self) -> Result<bool> {
        Ok(self
            .resolved_stats()
            .await?
            .is_some_and(|stats| stats.classification.is_file))
    }

    async fn is_directory(&mut self) -> Result<bool> {
        Ok(self
            .resolved_stats()
            .await?
            .is_some_and(|stats| stats.classification.is_directory))
    }

    async fn is_symbolic_link(&mut self) -> Result<bool> {
        Ok(self
            .resolved_stats()
            .await?
            .is_some_and(|stats| stats.classification.is_symlink))
    }

    /// Exists and is not a symbolic link.
    async fn is_real(&mut self) -> Result<bool> {
        Ok(self
            .resolved_stats()
            .await?
            .is_some_and(|stats| !stats.classification.is_symlink))
    }

    async fn last_modified(&mut self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.resolved_stats().await?.and_then(|stats| stats.modified))
    }

    async fn ensure_parents(&self) -> Result<()> {
        access::ensure_parent(self.path()).await
    }

    /// Copy to `to` and return the path written. A trailing separator on
    /// `to` copies into that directory. The entity keeps its path.
    async fn copy_to(&self, to: &str, overwrite: bool) -> Result<PathBuf> {
        if to.is_empty() {
            return Err(FileSetError::MissingPath);
        }
        let target = resolve_destination(&anchor_destination(to, None), self.path());
        access::copy(self.path(), &target, overwrite).await?;
        Ok(target)
    }

    /// Move to `to`, resolved against the entity's own directory when
    /// relative. On success the entity follows the move and becomes
    /// unresolved.
    async fn move_to(&mut self, to: &str, overwrite: bool) -> Result<MoveOutcome> {
        if to.is_empty() {
            return Err(FileSetError::MissingPath);
        }
        let destination = anchor_destination(to, Some(self.parts().base.as_path()));
        let target = resolve_destination(&destination, self.path());

        let taken = access::exists(&target).await?;
        if taken && !overwrite {
            return Ok(MoveOutcome::AlreadyExists);
        }

        access::move_path(self.path(), &target).await?;
        self.state_mut().reset(target);
        Ok(if taken {
            MoveOutcome::Overridden
        } else {
            MoveOutcome::Moved
        })
    }

    /// Create a symbolic link at `to` pointing at this entity.
    async fn link_to(&self, to: &str) -> Result<PathBuf> {
        if to.is_empty() {
            return Err(FileSetError::MissingPath);
        }
        let link = resolve_destination(&anchor_destination(to, None), self.path());
        let target = std::path::absolute(self.path()).map_err(|e| FileSetError::io(self.path(), e))?;
        access::ensure_parent(&link).await?;
        access::symlink(&target, &link).await?;
        Ok(link)
    }

    /// Remove the path. Returns false when nothing was there.
    async fn delete(&mut self) -> Result<bool> {
        let removed = access::remove(self.path()).await?;
        let state = self.state_mut();
        state.stats = None;
        state.resolved = true;
        Ok(removed)
    }
}

/// Content handed to [`FileEntity::process`].
pub enum Content<V> {
    /// Read: decode the buffer and return the value.
    Absent,
    /// Replace the buffer with the encoded value.
    Value(V),
    /// Decode, apply, encode back.
    Transform(Box<dyn FnOnce(V) -> V + Send>),
}

impl<V> Content<V> {
    pub fn transform(f: impl FnOnce(V) -> V + Send + 'static) -> Self {
        Self::Transform(Box::new(f))
    }
}

impl<V> From<V> for Content<V> {
    fn from(value: V) -> Self {
        Self::Value(value)
    }
}

impl<V: fmt::Debug> fmt::Debug for Content<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => f.write_str("Absent"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Transform(_) => f.write_str("Transform(..)"),
        }
    }
}

/// Result of a content call: the decoded value for reads, the entity for
/// writes so calls can be chained.
#[derive(Debug)]
pub enum Processed<'a, E, V> {
    Decoded(V),
    Chained(&'a mut E),
}

impl<'a, E, V> Processed<'a, E, V> {
    pub fn into_value(self) -> Option<V> {
        match self {
            Self::Decoded(value) => Some(value),
            Self::Chained(_) => None,
        }
    }

    pub fn into_entity(self) -> Option<&'a mut E> {
        match self {
            Self::Chained(entity) => Some(entity),
            Self::Decoded(_) => None,
        }
    }
}

/// A file with an in-memory text buffer.
///
/// The buffer is filled by [`load`](Self::load), edited through the content
/// methods and written by [`save`](Self::save). Content methods start from an
/// empty buffer when nothing was loaded.
#[derive(Debug, Clone)]
pub struct FileEntity {
    state: NodeState,
    data: Option<String>,
    encoding: Encoding,
}

impl FileEntity {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self::from_state(NodeState::new(path)?))
    }

    pub(crate) fn from_state(state: NodeState) -> Self {
        Self {
            state,
            data: None,
            encoding: Encoding::default(),
        }
    }

    /// Existing regular files matching `pattern`.
    pub async fn find(pattern: &str, options: &Options) -> Result<Vec<FileEntity>> {
        finder::find_files(pattern, options).await
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn set_encoding(&mut self, encoding: Encoding) -> &mut Self {
        self.encoding = encoding;
        self
    }

    fn access(&self) -> FileAccess {
        FileAccess::new(self.encoding)
    }

    /// Read the file into the buffer. A missing file empties the buffer.
    pub async fn load(&mut self) -> Result<LoadOutcome> {
        self.data = self.access().read_text(self.path()).await?;
        Ok(match self.data {
            Some(_) => LoadOutcome::Loaded,
            None => LoadOutcome::NotFound,
        })
    }

    /// Create the file empty. An existing file is left alone unless `force`
    /// is set. Returns whether anything was written.
    pub async fn create(&mut self, force: bool) -> Result<bool> {
        self.refresh().await?;
        if self.stats().is_some() && !force {
            return Ok(false);
        }
        self.data = Some(String::new());
        self.save().await
    }

    /// Size in bytes as of now, `None` when missing.
    pub async fn size(&mut self) -> Result<Option<u64>> {
        self.refresh().await?;
        Ok(self.stats().map(|stats| stats.size))
    }

    /// Write the buffer to the entity's path. Returns false when there is no
    /// buffer to write.
    pub async fn save(&mut self) -> Result<bool> {
        let Some(data) = &self.data else {
            return Ok(false);
        };
        if classify::classify(self.path()).await?.is_directory {
            return Err(FileSetError::NotAFile {
                path: self.path().to_path_buf(),
            });
        }
        self.access().write_text(self.path(), data).await?;
        self.refresh().await?;
        Ok(true)
    }

    /// Write the buffer to `new_path` and follow it there. A trailing
    /// separator keeps the current file name.
    pub async fn save_as(&mut self, new_path: &str) -> Result<bool> {
        if new_path.is_empty() {
            return Err(FileSetError::MissingPath);
        }
        if self.data.is_none() {
            return Ok(false);
        }
        let target = resolve_destination(&anchor_destination(new_path, None), self.path());
        self.state.reset(target);
        self.save().await
    }

    /// Add `content` to the buffer, on a new line when `new_line` is set and
    /// the buffer is not empty.
    pub fn append(&mut self, content: &str, new_line: bool) -> &mut Self {
        let data = self.data.get_or_insert_with(String::new);
        if new_line && !data.is_empty() {
            data.push('\n');
        }
        data.push_str(content);
        self
    }

    /// Replace every match of `pattern` in the buffer.
    pub fn replace(&mut self, pattern: &Regex, replacement: &str) -> &mut Self {
        if let Some(data) = &mut self.data {
            *data = pattern.replace_all(data, replacement).into_owned();
        }
        self
    }

    /// Fill `{{key}}` placeholders from `values`. Dotted keys look into
    /// nested objects, unknown keys become empty.
    pub fn template(&mut self, values: &Map<String, Value>) -> &mut Self {
        if let Some(data) = &self.data {
            self.data = Some(render_template(data, values));
        }
        self
    }

    /// Run `codec` over the buffer.
    pub fn process<C: Codec>(
        &mut self,
        codec: &C,
        content: Content<C::Value>,
    ) -> Result<Processed<'_, Self, C::Value>> {
        let raw = self.data.as_deref().unwrap_or_default();
        let encoded = match content {
            Content::Absent => return Ok(Processed::Decoded(codec.decode(raw)?)),
            Content::Value(value) => codec.encode(&value)?,
            Content::Transform(transform) => codec.encode(&transform(codec.decode(raw)?))?,
        };
        self.data = Some(encoded);
        Ok(Processed::Chained(self))
    }

    pub fn content(&mut self, content: Content<String>) -> Result<Processed<'_, Self, String>> {
        self.process(&Raw, content)
    }

    pub fn json(&mut self, content: Content<Value>) -> Result<Processed<'_, Self, Value>> {
        self.process(&Json::default(), content)
    }

    pub fn json_with_indent(
        &mut self,
        content: Content<Value>,
        indent: Option<usize>,
    ) -> Result<Processed<'_, Self, Value>> {
        self.process(&Json::new(indent), content)
    }

    pub fn json5(&mut self, content: Content<Value>) -> Result<Processed<'_, Self, Value>> {
        self.process(&Json5::default(), content)
    }

    pub fn yaml(&mut self, content: Content<Value>) -> Result<Processed<'_, Self, Value>> {
        self.process(&Yaml, content)
    }

    pub fn dot_env(
        &mut self,
        content: Content<Map<String, Value>>,
    ) -> Result<Processed<'_, Self, Map<String, Value>>> {
        self.process(&DotEnv, content)
    }
}

#[async_trait]
impl PathNode for FileEntity {
    fn state(&self) -> &NodeState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }

    fn dispose(&mut self) {
        self.data = None;
        let path = self.state.path.clone();
        self.state.reset(path);
    }
}

fn render_template(template: &str, values: &Map<String, Value>) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open + 2..].find("}}") else {
            break;
        };
        rendered.push_str(&rest[..open]);
        let key = rest[open + 2..open + 2 + close].trim();
        rendered.push_str(&lookup(values, key));
        rest = &rest[open + 2 + close + 2..];
    }
    rendered.push_str(rest);
    rendered
}

fn lookup(values: &Map<String, Value>, key: &str) -> String {
    let mut segments = key.split('.');
    let found = segments
        .next()
        .and_then(|first| values.get(first))
        .and_then(|value| segments.try_fold(value, |value, segment| value.get(segment)));

    match found {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// A directory.
#[derive(Debug, Clone)]
pub struct DirectoryEntity {
    state: NodeState,
}

impl DirectoryEntity {
    pub fn new(path: &str) -> Result<Self> {
        Ok(Self::from_state(NodeState::new(path)?))
    }

    pub(crate) fn from_state(state: NodeState) -> Self {
        Self { state }
    }

    /// Existing directories matching `pattern`.
    pub async fn find(pattern: &str, options: &Options) -> Result<Vec<DirectoryEntity>> {
        finder::find_directories(pattern, options).await
    }

    /// Create the directory and any missing parents.
    pub async fn create(&mut self) -> Result<()> {
        if classify::classify(self.path()).await?.is_file {
            return Err(FileSetError::NotADirectory {
                path: self.path().to_path_buf(),
            });
        }
        access::ensure_dir(self.path()).await?;
        self.refresh().await
    }

    /// Bytes used by every file below the directory. Zero when missing.
    pub async fn size(&self) -> Result<u64> {
        if !access::exists(self.path()).await? {
            return Ok(0);
        }
        let path = self.path().to_path_buf();
        tokio::task::spawn_blocking(move || access::directory_size(&path))
            .await
            .map_err(|e| FileSetError::io(self.path(), std::io::Error::other(e)))?
    }

    /// Direct children, sorted.
    pub async fn list(&self) -> Result<Vec<PathBuf>> {
        access::list_directory(self.path()).await
    }

    /// Entities for the direct children that pass `filter`.
    pub async fn children(&self, filter: TypeFilter) -> Result<Vec<Entity>> {
        let mut children = Vec::new();
        for path in self.list().await? {
            if let Some(entity) = finder::entity_from_path(path, filter).await? {
                children.push(entity);
            }
        }
        Ok(children)
    }

    /// Delete the directory with its content and create it again empty.
    pub async fn clean(&mut self) -> Result<()> {
        self.delete().await?;
        self.create().await
    }
}

#[async_trait]
impl PathNode for DirectoryEntity {
    fn state(&self) -> &NodeState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut NodeState {
        &mut self.state
    }
}

/// A discovered path, typed by what it was when found.
#[derive(Debug, Clone)]
pub enum Entity {
    File(FileEntity),
    Directory(DirectoryEntity),
}

impl Entity {
    pub fn path(&self) -> &Path {
        self.node().path()
    }

    pub fn node(&self) -> &dyn PathNode {
        match self {
            Entity::File(file) => file,
            Entity::Directory(directory) => directory,
        }
    }

    pub fn node_mut(&mut self) -> &mut dyn PathNode {
        match self {
            Entity::File(file) => file,
            Entity::Directory(directory) => directory,
        }
    }

    pub fn into_file(self) -> Option<FileEntity> {
        match self {
            Entity::File(file) => Some(file),
            Entity::Directory(_) => None,
        }
    }

    pub fn into_directory(self) -> Option<DirectoryEntity> {
        match self {
            Entity::Directory(directory) => Some(directory),
            Entity::File(_) => None,
        }
    }
}
