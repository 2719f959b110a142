use super::Codec;
use crate::error::Result;

/// Text passed through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Raw;

impl Codec for Raw {
    type Value = String;

    fn name(&self) -> &'static str {
        "raw"
    }

    fn decode(&self, raw: &str) -> Result<String> {
        Ok(raw.to_string())
    }

    fn encode(&self, value: &String) -> Result<String> {
        Ok(value.clone())
    }
}
