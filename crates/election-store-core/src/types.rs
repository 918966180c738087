//! Strong identifier types for the Election Store.
//!
//! Every row identity is a newtype over the storage engine's generated
//! integer id, so an office id can never be passed where a voter id is
//! expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wrap a raw storage id.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// The raw storage id.
            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }

        impl From<i64> for $name {
            fn from(raw: i64) -> Self {
                Self(raw)
            }
        }
    };
}

row_id!(
    /// Identity of an [`Election`](crate::Election) row.
    ElectionId,
    "election"
);
row_id!(
    /// Identity of an [`Office`](crate::Office) row.
    OfficeId,
    "office"
);
row_id!(
    /// Identity of a [`Candidate`](crate::Candidate) row.
    CandidateId,
    "candidate"
);
row_id!(
    /// Identity of a voter [`Registration`](crate::Registration) row.
    VoterId,
    "voter"
);
