//! Typed identifiers for ledger entities.
//!
//! Categories and expenses use UUIDs. Income ids are free-form strings:
//! freshly generated ones hold a UUID, but backups may carry any
//! non-empty text.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Declares an identifier newtype.
///
/// `uuid` ids are `Copy` and parse from any form [`Uuid::parse_str`]
/// accepts. `string` ids own their text.
macro_rules! define_id {
    (@display $name:ident) => {
        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
    ($(#[$meta:meta])* uuid $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh random (v4) id.
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Parses the textual form of the id.
            ///
            /// # Errors
            ///
            /// Returns [`uuid::Error`] if `raw` is not a UUID.
            #[inline]
            pub fn parse(raw: &str) -> Result<Self, uuid::Error> {
                Uuid::parse_str(raw).map(Self)
            }
        }

        impl From<Uuid> for $name {
            #[inline]
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        define_id!(@display $name);
    };
    ($(#[$meta:meta])* string $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps an existing id.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// A fresh id holding a random UUID string.
            #[inline]
            #[must_use]
            pub fn generate() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// The id text.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        define_id!(@display $name);
    };
}

define_id! {
    /// Identifies a spending category.
    uuid CategoryId
}

define_id! {
    /// Identifies an expense record.
    uuid ExpenseId
}

define_id! {
    /// Identifies an income record.
    string IncomeId
}
