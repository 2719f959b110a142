use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::OnceCell;
use tracing::Level;

use crate::codec::{Codec, Json, Yaml};
use crate::config::{Encoding, Options};
use crate::error::{FileSetError, Result};
use crate::file::access::{self, FileAccess};
use crate::file::classify::{self, EntryStats, TypeFilter};
use crate::file::digest;
use crate::file::glob::{self, has_glob_meta, ResolveMode};
use crate::file::resolver::{anchor_destination, resolve_destination};
use crate::report::{default_reporter, Reporter};

/// How an entry set turns its pattern into members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    /// Matches that are regular files.
    ExistingFiles,
    /// Matches that are directories.
    ExistingFolders,
    /// Every match.
    #[default]
    Unfiltered,
    /// No members at all: the pattern names a path about to be created.
    ForceNew,
}

impl Selection {
    fn resolve_mode(self) -> ResolveMode {
        match self {
            Selection::ForceNew => ResolveMode::ForceEmpty,
            _ => ResolveMode::ExistingOnly,
        }
    }

    fn type_filter(self) -> TypeFilter {
        match self {
            Selection::ExistingFiles => TypeFilter::Files,
            Selection::ExistingFolders => TypeFilter::Directories,
            Selection::Unfiltered | Selection::ForceNew => TypeFilter::Unfiltered,
        }
    }
}

/// A glob pattern together with the paths it resolved to.
///
/// Members keep resolution order and are only replaced wholesale: by a
/// re-filter, by [`EntrySet::move_to`] and by [`EntrySet::delete`]. What is on
/// disk is not watched, the member list is a snapshot.
///
/// Content operations (`read`, `write`, `append`, `alter` and their JSON and
/// YAML forms) work on a single target: the only member, or the pattern
/// itself when nothing matched. This is how a set created with
/// [`EntrySet::target`] writes a file that does not exist yet.
pub struct EntrySet {
    pattern: String,
    members: Vec<PathBuf>,
    selection: Selection,
    options: Options,
    access: FileAccess,
    reporter: Arc<dyn Reporter>,
    stats: OnceCell<Option<EntryStats>>,
}

impl fmt::Debug for EntrySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntrySet")
            .field("pattern", &self.pattern)
            .field("members", &self.members)
            .field("selection", &self.selection)
            .finish_non_exhaustive()
    }
}

pub struct EntrySetBuilder {
    pattern: String,
    selection: Selection,
    options: Options,
    reporter: Option<Arc<dyn Reporter>>,
}

impl EntrySetBuilder {
    pub fn selection(mut self, selection: Selection) -> Self {
        self.selection = selection;
        self
    }

    pub fn options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Report to `reporter` instead of the one picked by `Options::verbose`.
    pub fn reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub async fn build(self) -> Result<EntrySet> {
        let members = glob::resolve(&self.pattern, self.selection.resolve_mode(), &self.options)?;
        let members = classify::retain_by_type(members, self.selection.type_filter()).await?;
        let reporter = self
            .reporter
            .unwrap_or_else(|| default_reporter(self.options.verbose));

        Ok(EntrySet {
            pattern: self.pattern,
            members,
            selection: self.selection,
            access: FileAccess::new(self.options.encoding),
            options: self.options,
            reporter,
            stats: OnceCell::new(),
        })
    }
}

impl EntrySet {
    pub fn builder(pattern: impl Into<String>) -> EntrySetBuilder {
        EntrySetBuilder {
            pattern: pattern.into(),
            selection: Selection::default(),
            options: Options::default(),
            reporter: None,
        }
    }

    /// Existing files matching `pattern`.
    pub async fn files(pattern: impl Into<String>) -> Result<Self> {
        Self::builder(pattern)
            .selection(Selection::ExistingFiles)
            .build()
            .await
    }

    /// Existing directories matching `pattern`.
    pub async fn folders(pattern: impl Into<String>) -> Result<Self> {
        Self::builder(pattern)
            .selection(Selection::ExistingFolders)
            .build()
            .await
    }

    /// Everything matching `pattern`.
    pub async fn any(pattern: impl Into<String>) -> Result<Self> {
        Self::builder(pattern)
            .selection(Selection::Unfiltered)
            .build()
            .await
    }

    /// A path that does not exist yet. The set starts with no members.
    pub async fn target(path: impl Into<String>) -> Result<Self> {
        Self::builder(path)
            .selection(Selection::ForceNew)
            .build()
            .await
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn members(&self) -> &[PathBuf] {
        &self.members
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn encoding(&self) -> Encoding {
        self.access.encoding
    }

    /// Encoding for this set's later reads and writes. Other sets keep their own.
    pub fn set_encoding(&mut self, encoding: Encoding) {
        self.options.encoding = encoding;
        self.access.encoding = encoding;
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// True when at least one member is targeted.
    pub fn exists(&self) -> bool {
        !self.members.is_empty()
    }

    pub async fn only_existing_files(&mut self) -> Result<()> {
        self.refilter(Selection::ExistingFiles).await
    }

    pub async fn only_existing_folders(&mut self) -> Result<()> {
        self.refilter(Selection::ExistingFolders).await
    }

    async fn refilter(&mut self, selection: Selection) -> Result<()> {
        let members = std::mem::take(&mut self.members);
        self.members = classify::retain_by_type(members, selection.type_filter()).await?;
        self.selection = selection;
        Ok(())
    }

    /// Call `visit` on every member in order and collect what it returns.
    pub fn all<T>(&self, visit: impl FnMut(&Path) -> T) -> Vec<T> {
        self.members.iter().map(PathBuf::as_path).map(visit).collect()
    }

    /// Recursively delete every member. Members already gone are skipped
    /// silently. Returns the number of members and leaves the set empty.
    pub async fn delete(&mut self) -> Result<usize> {
        self.reporter
            .report(Level::INFO, &format!("delete {} ...", self.pattern));

        for member in &self.members {
            access::remove(member).await?;
            self.reporter
                .report(Level::DEBUG, &format!("deleted {}", member.display()));
        }

        let count = self.members.len();
        self.members.clear();
        Ok(count)
    }

    pub async fn remove(&mut self) -> Result<usize> {
        self.delete().await
    }

    /// Move every member. A destination ending with a separator is a
    /// directory receiving each member under its own name, anything else is
    /// the new path of every member. Members become the new paths.
    pub async fn move_to(&mut self, destination: &str) -> Result<usize> {
        self.reporter
            .report(Level::INFO, &format!("move {} to {destination} ...", self.pattern));
        let destination = self.anchor_destination(destination)?;

        let mut moved = Vec::with_capacity(self.members.len());
        for member in &self.members {
            let target = resolve_destination(&destination, member);
            access::move_path(member, &target).await?;
            self.reporter.report(
                Level::DEBUG,
                &format!("{} moved to {}", member.display(), target.display()),
            );
            moved.push(target);
        }

        let count = moved.len();
        self.members = moved;
        Ok(count)
    }

    /// Copy every member (directories recursively), replacing existing
    /// files. Same destination rules as [`EntrySet::move_to`]. Members are
    /// left unchanged.
    pub async fn copy_to(&self, destination: &str) -> Result<usize> {
        self.reporter
            .report(Level::INFO, &format!("copy {} to {destination} ...", self.pattern));
        let destination = self.anchor_destination(destination)?;

        for member in &self.members {
            let target = resolve_destination(&destination, member);
            access::copy(member, &target, true).await?;
            self.reporter.report(
                Level::DEBUG,
                &format!("{} copied to {}", member.display(), target.display()),
            );
        }
        Ok(self.members.len())
    }

    /// Create every member as a directory, or the pattern itself when there
    /// are no members. Existing directories are fine.
    pub async fn create_folders(&self) -> Result<()> {
        if self.members.is_empty() {
            return access::ensure_dir(&self.literal_target()?).await;
        }
        for member in &self.members {
            access::ensure_dir(member).await?;
        }
        Ok(())
    }

    pub async fn ensure_folders(&self) -> Result<()> {
        self.create_folders().await
    }

    /// Text of the single target, `None` when it does not exist.
    pub async fn read(&self) -> Result<Option<String>> {
        self.access.read_text(&self.single_target()?).await
    }

    /// Bytes of the single target, without decoding.
    pub async fn read_raw(&self) -> Result<Option<Vec<u8>>> {
        self.access.read_bytes(&self.single_target()?).await
    }

    /// Create or truncate the single target, creating parent directories.
    pub async fn write(&self, content: &str) -> Result<()> {
        self.access.write_text(&self.single_target()?, content).await
    }

    /// Append to the single target. With `new_line`, content goes on its own
    /// line, except when the target is created by this call.
    pub async fn append(&self, content: &str, new_line: bool) -> Result<()> {
        self.access
            .append_text(&self.single_target()?, content, new_line)
            .await
    }

    /// Read, transform and write back the single target. `transform` gets
    /// `None` when the target does not exist. Nothing guards against another
    /// writer between the read and the write.
    pub async fn alter<F>(&self, transform: F) -> Result<()>
    where
        F: FnOnce(Option<String>) -> String,
    {
        let target = self.single_target()?;
        let current = self.access.read_text(&target).await?;
        self.access.write_text(&target, &transform(current)).await
    }

    /// Decode the single target as JSON. `None` when it does not exist.
    pub async fn read_json<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        self.read()
            .await?
            .map(|raw| Json::default().decode_as(&raw))
            .transpose()
    }

    /// Write `value` as JSON, indented per `Options::json_indent`.
    pub async fn write_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        self.write_json_indented(value, self.options.json_indent)
            .await
    }

    /// Write `value` as JSON with `indent` spaces, compact when `None`.
    pub async fn write_json_indented<T: Serialize + ?Sized>(
        &self,
        value: &T,
        indent: Option<usize>,
    ) -> Result<()> {
        self.write(&Json::new(indent).encode_from(value)?).await
    }

    pub async fn alter_json<T, U, F>(&self, transform: F) -> Result<()>
    where
        T: DeserializeOwned,
        U: Serialize,
        F: FnOnce(Option<T>) -> U,
    {
        self.alter_json_indented(transform, self.options.json_indent)
            .await
    }

    /// `alter_json` writing back with `indent` spaces, compact when `None`.
    pub async fn alter_json_indented<T, U, F>(
        &self,
        transform: F,
        indent: Option<usize>,
    ) -> Result<()>
    where
        T: DeserializeOwned,
        U: Serialize,
        F: FnOnce(Option<T>) -> U,
    {
        let current = self.read_json::<T>().await?;
        self.write_json_indented(&transform(current), indent).await
    }

    pub async fn read_yaml(&self) -> Result<Option<serde_json::Value>> {
        self.read().await?.as_deref().map(|raw| Yaml.decode(raw)).transpose()
    }

    pub async fn write_yaml(&self, value: &serde_json::Value) -> Result<()> {
        self.write(&Yaml.encode(value)?).await
    }

    /// Stats of the only member, fetched once and kept for the lifetime of
    /// the set. `None` unless there is exactly one member.
    pub async fn file_stats(&self) -> Result<Option<EntryStats>> {
        let [member] = self.members.as_slice() else {
            return Ok(None);
        };
        let stats = self
            .stats
            .get_or_try_init(|| classify::stat(member))
            .await?;
        Ok(stats.clone())
    }

    pub async fn last_modified(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.file_stats().await?.and_then(|stats| stats.modified))
    }

    pub async fn size(&self) -> Result<Option<u64>> {
        Ok(self.file_stats().await?.map(|stats| stats.size))
    }

    /// Fingerprint of the member list, optionally covering each member's
    /// modification time and size.
    pub async fn generate_file_list_hash(
        &self,
        include_last_modified: bool,
        include_size: bool,
    ) -> Result<String> {
        digest::file_list_hash(&self.members, include_last_modified, include_size).await
    }

    fn single_target(&self) -> Result<PathBuf> {
        match self.members.as_slice() {
            [] => self.literal_target(),
            [member] => Ok(member.clone()),
            members => Err(FileSetError::NotSingleTarget {
                pattern: self.pattern.clone(),
                count: members.len(),
            }),
        }
    }

    /// The pattern taken as a plain path. A pattern that still holds glob
    /// syntax matched nothing and names no single path.
    fn literal_target(&self) -> Result<PathBuf> {
        if has_glob_meta(&self.pattern) {
            return Err(FileSetError::NotSingleTarget {
                pattern: self.pattern.clone(),
                count: 0,
            });
        }
        glob::resolve(&self.pattern, ResolveMode::Literal, &self.options)?
            .pop()
            .ok_or(FileSetError::MissingPath)
    }

    /// Expand `~` and anchor on `cwd`, keeping a trailing separator.
    fn anchor_destination(&self, destination: &str) -> Result<String> {
        if destination.is_empty() {
            return Err(FileSetError::MissingPath);
        }
        Ok(anchor_destination(destination, self.options.cwd.as_deref()))
    }
}
