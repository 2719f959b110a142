use std::path::{Path, PathBuf};

use fileset_core::{EntrySet, Options, Selection};
use tempfile::TempDir;

/// A scratch directory with options anchored on it.
pub struct Fixture {
    pub dir: TempDir,
    pub options: Options,
}

impl Fixture {
    pub fn new() -> Self {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();

        let dir = TempDir::new().unwrap();
        let options = Options::default().with_cwd(dir.path());
        Fixture { dir, options }
    }

    #[allow(dead_code)]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    #[allow(dead_code)]
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    /// Write `content` to `relative`, creating parents.
    #[allow(dead_code)]
    pub fn touch(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.path(relative);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    #[allow(dead_code)]
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.path(relative)).unwrap()
    }

    #[allow(dead_code)]
    pub async fn set(&self, pattern: &str, selection: Selection) -> EntrySet {
        EntrySet::builder(pattern)
            .selection(selection)
            .options(self.options.clone())
            .build()
            .await
            .unwrap()
    }
}
