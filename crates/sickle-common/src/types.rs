//! Discord id newtypes shared by the store, relay and command crates.
//!
//! These are plain `u64` wrappers so that crates without a serenity
//! dependency can still talk about channels, guilds, users and roles.
//! Zero is used as "not configured" throughout the configuration.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Returns the raw snowflake value.
            pub const fn get(self) -> u64 {
                self.0
            }

            /// Whether this id refers to something, i.e. is non-zero.
            pub const fn is_set(self) -> bool {
                self.0 != 0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }
    };
}

snowflake!(
    /// A Discord channel ID.
    ChannelId
);
snowflake!(
    /// A Discord guild (server) ID.
    GuildId
);
snowflake!(
    /// A Discord user ID.
    UserId
);
snowflake!(
    /// A Discord role ID.
    RoleId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_set() {
        assert!(!ChannelId(0).is_set());
        assert!(ChannelId(123).is_set());
        assert!(!GuildId::default().is_set());
    }

    #[test]
    fn test_parse_and_display() {
        let user: UserId = " 1234567890 ".parse().unwrap();
        assert_eq!(user, UserId(1234567890));
        assert_eq!(user.to_string(), "1234567890");
        assert!("abc".parse::<RoleId>().is_err());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&GuildId(42)).unwrap();
        assert_eq!(json, "42");
        let parsed: GuildId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, GuildId(42));
    }
}
