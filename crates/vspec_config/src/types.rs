//! Schema of `vspec.toml`.

use indexmap::IndexMap;
use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Parsed configuration. Every field is optional in the file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecConfig {
    /// Module to report on instead of the first definition.
    #[serde(default)]
    pub top: Option<String>,

    /// Directories searched by `` `include ``, before any `-I` flags.
    #[serde(default)]
    pub include_dirs: Vec<PathBuf>,

    /// Predefined macros as `NAME` or `NAME=VALUE`.
    ///
    /// A single string is accepted as a one-element list.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub defines: Vec<String>,

    /// Description column of the parameter table, keyed by parameter name.
    #[serde(default)]
    pub parameters: IndexMap<String, String>,

    /// Description column of the port table, keyed by port name.
    #[serde(default)]
    pub ports: IndexMap<String, String>,
}

impl SpecConfig {
    /// Description for a parameter, or `""`.
    pub fn parameter_description(&self, name: &str) -> &str {
        self.parameters.get(name).map_or("", String::as_str)
    }

    /// Description for a port, or `""`.
    pub fn port_description(&self, name: &str) -> &str {
        self.ports.get(name).map_or("", String::as_str)
    }
}

fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut out = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                out.push(val);
            }
            Ok(out)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
