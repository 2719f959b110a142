use serde_json::{Map, Value};

use super::Codec;
use crate::error::Result;

/// `KEY=value` lines.
///
/// Comment lines are kept as keys with an empty value so they survive a
/// decode/encode cycle in place. Values may contain `=`, and one pair of
/// matching surrounding quotes is removed. Lines without `=` are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotEnv;

impl Codec for DotEnv {
    type Value = Map<String, Value>;

    fn name(&self) -> &'static str {
        "dotenv"
    }

    fn decode(&self, raw: &str) -> Result<Map<String, Value>> {
        let mut entries = Map::new();
        for line in raw.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                entries.insert(line.to_string(), Value::String(String::new()));
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            entries.insert(
                key.trim().to_string(),
                Value::String(unquote(value.trim()).to_string()),
            );
        }
        Ok(entries)
    }

    fn encode(&self, entries: &Map<String, Value>) -> Result<String> {
        let mut buffer = String::new();
        for (key, value) in entries {
            if key.starts_with('#') {
                buffer.push_str(key);
            } else {
                buffer.push_str(key);
                buffer.push('=');
                buffer.push_str(&scalar_to_string(value));
            }
            buffer.push('\n');
        }
        Ok(buffer)
    }
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
