use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{FileSetError, Result};

/// Text encoding used when reading and writing file content.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::VariantArray,
)]
pub enum Encoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    #[strum(to_string = "utf-8", serialize = "utf8")]
    Utf8,
    #[serde(rename = "latin1", alias = "iso-8859-1")]
    #[strum(to_string = "latin1", serialize = "iso-8859-1")]
    Latin1,
}

impl Encoding {
    /// Decode raw bytes into text. Invalid utf-8 is a decode error, latin1
    /// maps every byte to one character.
    pub fn decode(self, bytes: Vec<u8>) -> Result<String> {
        match self {
            Encoding::Utf8 => {
                String::from_utf8(bytes).map_err(|e| FileSetError::decode("utf-8", e))
            }
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }

    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Encoding::Utf8 => Ok(text.as_bytes().to_vec()),
            Encoding::Latin1 => text
                .chars()
                .map(|character| {
                    u8::try_from(u32::from(character)).map_err(|_| FileSetError::Unencodable {
                        encoding: self,
                        character,
                    })
                })
                .collect(),
        }
    }
}

fn default_include_dotfiles() -> bool {
    true
}

fn default_case_sensitive() -> bool {
    true
}

fn default_json_indent() -> Option<usize> {
    Some(2)
}

fn default_verbose() -> bool {
    true
}

/// Options shared by every entry set and entity lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Base directory for relative patterns and destinations. Defaults to the
    /// process working directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Wildcards match names starting with a dot.
    #[serde(default = "default_include_dotfiles")]
    pub include_dotfiles: bool,

    #[serde(default = "default_case_sensitive")]
    pub case_sensitive: bool,

    #[serde(default)]
    pub encoding: Encoding,

    /// Indentation width for written JSON. `None` writes compact JSON.
    #[serde(default = "default_json_indent")]
    pub json_indent: Option<usize>,

    /// Report batch operations through tracing. Has no effect on results.
    #[serde(default = "default_verbose")]
    pub verbose: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cwd: None,
            include_dotfiles: default_include_dotfiles(),
            case_sensitive: default_case_sensitive(),
            encoding: Encoding::default(),
            json_indent: default_json_indent(),
            verbose: default_verbose(),
        }
    }
}

impl Options {
    /// Load options from a TOML file. A missing file yields the defaults.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options from {path:?}"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse options from {path:?}"))
            .map_err(FileSetError::from)
    }

    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        toml::from_str(contents).context("Invalid options TOML")
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_json_indent(mut self, indent: Option<usize>) -> Self {
        self.json_indent = indent;
        self
    }

    pub fn quiet(mut self) -> Self {
        self.verbose = false;
        self
    }

    /// Anchor a relative path on `cwd` when one is configured.
    pub fn anchor(&self, path: &Path) -> PathBuf {
        match &self.cwd {
            Some(cwd) if path.is_relative() => cwd.join(path),
            _ => path.to_path_buf(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::VariantArray;

    #[test]
    fn test_defaults_from_empty_toml() {
        let options = Options::from_toml_str("").unwrap();
        assert_eq!(options, Options::default());
        assert!(options.include_dotfiles);
        assert_eq!(options.json_indent, Some(2));
    }

    #[test]
    fn test_partial_toml() {
        let options = Options::from_toml_str(
            r#"
            cwd = "/srv/site"
            encoding = "latin1"
            verbose = false
            "#,
        )
        .unwrap();
        assert_eq!(options.cwd, Some(PathBuf::from("/srv/site")));
        assert_eq!(options.encoding, Encoding::Latin1);
        assert!(!options.verbose);
        assert!(options.case_sensitive);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("options.toml");
        std::fs::write(&path, "verbose = \"maybe\"").unwrap();
        let err = Options::from_path(&path).unwrap_err();
        assert!(matches!(err, FileSetError::Config(_)));
        assert!(err.to_string().contains("Failed to parse options"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let options = Options::from_path(&temp.path().join("absent.toml")).unwrap();
        assert_eq!(options, Options::default());
    }

    #[test]
    fn test_encoding_names() {
        for encoding in Encoding::VARIANTS {
            assert_eq!(Encoding::from_str(&encoding.to_string()).unwrap(), *encoding);
        }
        assert_eq!(Encoding::from_str("utf8").unwrap(), Encoding::Utf8);
    }

    #[test]
    fn test_latin1() {
        let bytes = Encoding::Latin1.encode("café").unwrap();
        assert_eq!(bytes, vec![b'c', b'a', b'f', 0xE9]);
        assert_eq!(Encoding::Latin1.decode(bytes).unwrap(), "café");

        let err = Encoding::Latin1.encode("€").unwrap_err();
        assert!(matches!(err, FileSetError::Unencodable { character: '€', .. }));
    }

    #[test]
    fn test_invalid_utf8_is_rejected() {
        let err = Encoding::Utf8.decode(vec![b'o', b'k', 0xFF]).unwrap_err();
        assert!(matches!(err, FileSetError::Decode { format: "utf-8", .. }));
        assert_eq!(Encoding::Utf8.decode("ok".into()).unwrap(), "ok");
    }

    #[test]
    fn test_anchor() {
        let options = Options::default().with_cwd("/base");
        assert_eq!(options.anchor(Path::new("a/b")), PathBuf::from("/base/a/b"));
        assert_eq!(options.anchor(Path::new("/abs")), PathBuf::from("/abs"));
        assert_eq!(
            Options::default().anchor(Path::new("a")),
            PathBuf::from("a")
        );
    }
}
