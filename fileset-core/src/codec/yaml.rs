use serde_json::Value;

use super::Codec;
use crate::error::{FileSetError, Result};

#[derive(Debug, Clone, Copy, Default)]
pub struct Yaml;

impl Codec for Yaml {
    type Value = Value;

    fn name(&self) -> &'static str {
        "yaml"
    }

    fn decode(&self, raw: &str) -> Result<Value> {
        serde_yaml::from_str(raw).map_err(|e| FileSetError::decode(self.name(), e))
    }

    fn encode(&self, value: &Value) -> Result<String> {
        serde_yaml::to_string(value).map_err(|e| FileSetError::encode(self.name(), e))
    }
}
