//! JSON form of token maps: a flat object of string values.

use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::TokenMap;
use crate::error::{Error, Result};

const FORMAT: &str = "JSON";

fn json_error(e: serde_json::Error) -> Error {
    Error::format(FORMAT, e.to_string())
}

pub(super) fn parse(text: &str) -> Result<TokenMap> {
    serde_json::from_str(text).map_err(json_error)
}

pub(super) fn parse_array(text: &str) -> Result<Vec<TokenMap>> {
    serde_json::from_str(text).map_err(json_error)
}

pub(super) fn to_string(tokens: &TokenMap) -> Result<String> {
    serde_json::to_string(tokens).map_err(json_error)
}

pub(super) fn to_string_array(maps: &[TokenMap]) -> Result<String> {
    serde_json::to_string(maps).map_err(json_error)
}

impl Serialize for TokenMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let entries = self.entries.read();
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (key, value) in entries.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Collects object members in source order; a repeated key keeps its first
/// position and its last value.
struct TokenMapVisitor;

impl<'de> Visitor<'de> for TokenMapVisitor {
    type Value = TokenMap;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a flat object of string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<TokenMap, A::Error> {
        let tokens = TokenMap::new();
        while let Some((key, value)) = access.next_entry::<String, String>()? {
            tokens.set(key, value);
        }
        Ok(tokens)
    }
}

impl<'de> Deserialize<'de> for TokenMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(TokenMapVisitor)
    }
}
