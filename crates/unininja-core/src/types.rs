//! Identifier types
//!
//! Every identifier here ends up as a path segment of a Unistats URL, so they
//! are restricted to characters that need no escaping.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::DomainError;
use crate::lenient::scalar_to_string;

fn is_path_safe(s: &str) -> bool {
    !s.is_empty()
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

macro_rules! path_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap an identifier
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                let trimmed = value.trim();
                if is_path_safe(trimmed) {
                    Ok(Self(trimmed.to_string()))
                } else {
                    Err(DomainError::InvalidIdentifier(value))
                }
            }

            /// Borrow the identifier as a string slice
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Unwrap into the owned string
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                let value = serde_json::Value::deserialize(deserializer)?;
                let raw = scalar_to_string(&value).ok_or_else(|| {
                    serde::de::Error::custom(format!(
                        concat!(stringify!($name), " must be a string or number, got {}"),
                        value
                    ))
                })?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

path_identifier!(
    /// UK provider reference number of an institution (`pubukprn`).
    ///
    /// This is the join key between the Unistats API and the document store.
    Pubukprn
);

path_identifier!(
    /// Unistats course identifier (`kiscourseid`)
    CourseId
);

path_identifier!(
    /// Unistats study mode (`KisMode`), exposed to clients as `isFullTime`
    StudyMode
);
