use serde::{Deserialize, Deserializer};

// query strings carry everything as text; a page that does not parse is treated
// as if it was not given at all, so the default page applies
pub fn deserialize_lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.trim().parse::<i64>().ok()))
}
