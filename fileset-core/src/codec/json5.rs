use serde_json::Value;

use super::json::{write_indented, DEFAULT_INDENT};
use super::Codec;
use crate::error::{FileSetError, Result};

/// JSON5 input (comments, trailing commas, unquoted keys). Output is
/// indented JSON, which every JSON5 reader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Json5 {
    pub indent: Option<usize>,
}

impl Json5 {
    pub fn new(indent: Option<usize>) -> Self {
        Self { indent }
    }
}

impl Default for Json5 {
    fn default() -> Self {
        Self::new(Some(DEFAULT_INDENT))
    }
}

impl Codec for Json5 {
    type Value = Value;

    fn name(&self) -> &'static str {
        "json5"
    }

    fn decode(&self, raw: &str) -> Result<Value> {
        json5::from_str(raw).map_err(|e| FileSetError::decode(self.name(), e))
    }

    fn encode(&self, value: &Value) -> Result<String> {
        write_indented(value, self.indent).map_err(|e| FileSetError::encode(self.name(), e))
    }
}
