use serde::de::{self, Deserialize, Deserializer};
use tracing::debug;

// Custom deserializer to ensure `amount` is always treated as a string
pub fn number_to_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;

    debug!("Deserializing value for string: {:?}", value);

    match value {
        serde_json::Value::Number(num) => Ok(num.to_string()),
        serde_json::Value::String(s) => Ok(s),
        _ => Err(de::Error::custom("Expected a string or a number")),
    }
}

// Custom deserializer to handle both number and string inputs for Option<u64>
pub fn string_or_number_to_option_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;

    debug!("Deserializing value for Option<u64>: {:?}", value);

    match value {
        serde_json::Value::Number(num) => num.as_u64()
            .map(Some)
            .ok_or_else(|| de::Error::custom("Invalid number for u64")),
        serde_json::Value::String(s) => s.trim().parse::<u64>()
            .map(Some)
            .map_err(|_| de::Error::custom("Invalid string for u64")),
        serde_json::Value::Null => Ok(None),
        _ => Err(de::Error::custom("Expected a string, number, or null")),
    }
}

// Same as above for decimals, which must fit in a u8
pub fn string_or_number_to_option_u8<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = string_or_number_to_option_u64(deserializer)?;
    value
        .map(|n| u8::try_from(n).map_err(|_| de::Error::custom("Invalid number for u8")))
        .transpose()
}
