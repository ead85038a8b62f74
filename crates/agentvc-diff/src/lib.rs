//! Structural diff engine for agent cards.
//!
//! Compares two card snapshots field by field and reports skill membership
//! changes keyed by skill `id`. Unknown top-level fields are carried by the
//! card but never diffed.
//!
//! # Key Types
//!
//! - [`CardDiff`] -- the full comparison result
//! - [`FieldChange`] -- one changed top-level field with its old/new values

pub mod card_diff;
pub mod error;

pub use card_diff::{diff_cards, CardDiff, FieldChange, DIFFED_FIELDS};
pub use error::{DiffError, DiffResult};
