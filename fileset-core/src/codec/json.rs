use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::Codec;
use crate::error::{FileSetError, Result};

pub const DEFAULT_INDENT: usize = 2;

/// JSON through `serde_json`. `indent: None` writes compact output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Json {
    pub indent: Option<usize>,
}

impl Json {
    pub fn new(indent: Option<usize>) -> Self {
        Self { indent }
    }

    /// Decode into any deserializable type.
    pub fn decode_as<T: DeserializeOwned>(&self, raw: &str) -> Result<T> {
        serde_json::from_str(raw).map_err(|e| FileSetError::decode(self.name(), e))
    }

    /// Encode any serializable value with this codec's indent.
    pub fn encode_from<T: Serialize + ?Sized>(&self, value: &T) -> Result<String> {
        write_indented(value, self.indent).map_err(|e| FileSetError::encode(self.name(), e))
    }
}

impl Default for Json {
    fn default() -> Self {
        Self::new(Some(DEFAULT_INDENT))
    }
}

impl Codec for Json {
    type Value = Value;

    fn name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, raw: &str) -> Result<Value> {
        self.decode_as(raw)
    }

    fn encode(&self, value: &Value) -> Result<String> {
        self.encode_from(value)
    }
}

/// Serialize as JSON with `indent` spaces per level, compact when `None`.
pub(crate) fn write_indented<T: Serialize + ?Sized>(
    value: &T,
    indent: Option<usize>,
) -> serde_json::Result<String> {
    let Some(width) = indent else {
        return serde_json::to_string(value);
    };

    let indent = vec![b' '; width];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
    value.serialize(&mut serializer)?;
    String::from_utf8(buffer).map_err(serde::ser::Error::custom)
}
