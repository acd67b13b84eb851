pub mod project;
pub mod role;
pub mod session;
pub mod user;

pub use project::*;
pub use role::*;
pub use session::*;
pub use user::*;

use serde::{de, Deserialize, Deserializer};

/// Accept flags the way the registry backend emits them: `true`, `1` or `"true"`.
pub(crate) fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Int(value) => Ok(value == 1),
        Flag::Text(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid flag value: {}", other))),
        },
    }
}
