//! Platform identifiers.
//!
//! Users and guilds are addressed by 64-bit snowflakes. The newtypes keep the
//! two from being mixed up in map keys and log fields.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error returned when an identifier string is not a decimal snowflake.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid identifier: {0:?}")]
pub struct ParseIdError(pub String);

macro_rules! snowflake_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim()
                    .parse::<u64>()
                    .map($name)
                    .map_err(|_| ParseIdError(s.to_string()))
            }
        }

        impl From<u64> for $name {
            fn from(v: u64) -> Self {
                $name(v)
            }
        }
    };
}

snowflake_id!(
    /// A chat-platform user.
    UserId
);

snowflake_id!(
    /// A guild (server / tenant).
    GuildId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: UserId = "123456789012345678".parse().unwrap();
        assert_eq!(id.get(), 123456789012345678);
        assert_eq!(id.to_string(), "123456789012345678");
        assert!("abc".parse::<GuildId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let id = GuildId(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: GuildId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }
}
