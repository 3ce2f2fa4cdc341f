//! Lenient deserializers for fields the Alerts API types inconsistently.
//!
//! `creationDate` and the correlation trigger parameters are documented as
//! strings but are sent as JSON numbers by some API versions. Both shapes are
//! accepted and kept as strings; `null` is treated as absent.

use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    String(String),
    U64(u64),
    I64(i64),
    F64(f64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::String(s) => s,
            StringOrNumber::U64(v) => v.to_string(),
            StringOrNumber::I64(v) => v.to_string(),
            StringOrNumber::F64(v) => v.to_string(),
        }
    }
}

pub(crate) fn string_from_number_or_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(opt_string_from_number_or_string(deserializer)?.unwrap_or_default())
}

pub(crate) fn opt_string_from_number_or_string<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<StringOrNumber>::deserialize(deserializer)?;
    Ok(value.map(String::from))
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
