// SPDX-License-Identifier: MIT OR Apache-2.0
//! Open-ended string identifiers for functions, features, behaviours and
//! variants.
//!
//! The wire format uses plain strings, and test data may name capabilities
//! this crate has never heard of. Each identifier is therefore a transparent
//! newtype over `String`; the closed vocabulary lives in [`crate::vocab`].

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The raw identifier.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }
    };
}

string_id!(
    /// A function in the language's processing pipeline (`parse`, `get_int`, ...).
    ///
    /// Validation names double as function identifiers.
    FunctionId
);

string_id!(
    /// An optional language feature (`comments`, `multiline`, ...).
    FeatureId
);

string_id!(
    /// One choice from a mutually-exclusive behaviour group.
    BehaviorId
);

string_id!(
    /// A named specification profile.
    VariantId
);
