use serde::de::{Deserialize, Deserializer, Error, Visitor};
use std::collections::BTreeMap;
use std::fmt;

/// Strings, numbers, booleans and null can be deserialized into a RelaxedString
///
/// Null becomes the empty string, which callers treat as unset.
/// Pipeline inputs are often written by hand as json, and `{"RETRIES": 3}`
/// should mean the same thing as `{"RETRIES": "3"}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RelaxedString(String);

impl From<RelaxedString> for String {
    fn from(rs: RelaxedString) -> String {
        rs.0
    }
}

impl<'de> Deserialize<'de> for RelaxedString {
    fn deserialize<D>(deserializer: D) -> Result<RelaxedString, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(RelaxedStringVisitor)
    }
}

struct RelaxedStringVisitor;

macro_rules! visit_tostring {
    ( $name:ident, $type:ty ) => {
        fn $name<E>(self, v: $type) -> Result<Self::Value, E>
        where
            E: Error,
        {
            self.visit_string(v.to_string())
        }
    };
}

/// RelaxedStringVisitor will visit numbers, bools, strings and null
impl<'de> Visitor<'de> for RelaxedStringVisitor {
    type Value = RelaxedString;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string, number, boolean or null")
    }

    fn visit_unit<E>(self) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(RelaxedString(String::new()))
    }

    fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
    where
        E: Error,
    {
        Ok(RelaxedString(v))
    }

    visit_tostring!(visit_bool, bool);
    visit_tostring!(visit_str, &str);
    visit_tostring!(visit_i64, i64);
    visit_tostring!(visit_u64, u64);
    visit_tostring!(visit_f64, f64);
}

/// Parse a json object of relaxed strings into a plain string map
pub fn parse_string_map(raw: &str) -> serde_json::Result<BTreeMap<String, String>> {
    let map: BTreeMap<String, RelaxedString> = serde_json::from_str(raw)?;
    Ok(map.into_iter().map(|(k, v)| (k, v.into())).collect())
}
