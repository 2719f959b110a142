//! Content codecs.
//!
//! Each codec is a decode/encode pair for one text format. Codecs hold no
//! state beyond their formatting settings, and the caller picks one by the
//! operation it invokes rather than by looking at a file extension.

pub mod dotenv;
pub mod json;
pub mod json5;
pub mod raw;
pub mod yaml;

pub use dotenv::DotEnv;
pub use json::Json;
pub use json5::Json5;
pub use raw::Raw;
pub use yaml::Yaml;

use crate::error::Result;

pub trait Codec {
    type Value;

    /// Format name used in error messages.
    fn name(&self) -> &'static str;

    fn decode(&self, raw: &str) -> Result<Self::Value>;

    fn encode(&self, value: &Self::Value) -> Result<String>;
}
