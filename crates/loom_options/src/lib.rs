//! # loom_options
//!
//! Dimension schema and option normalization for Loom.
//!
//! A template describes its configuration axes as [`Dimension`]s. End users
//! pick values with tokens such as `deployment=vercel` or `features=auth+billing`;
//! [`normalize`] validates those tokens against the schema and produces a
//! deterministic [`ResolvedSelection`].
//!
//! ## Example
//!
//! ```rust
//! use loom_options::{normalize, Dimension, DimensionSet};
//!
//! let dimensions = DimensionSet::new(vec![
//!     Dimension::single("database", ["postgres", "sqlite"]).with_default("sqlite"),
//!     Dimension::multi("features", ["auth", "billing"]),
//! ])
//! .unwrap();
//!
//! let selection = normalize(&["database=postgres", "billing", "auth"], &dimensions).unwrap();
//! assert!(selection.has_in("database", "postgres"));
//! assert_eq!(selection.values_of("features"), vec!["auth", "billing"]);
//! ```

pub mod error;
pub mod normalizer;
pub mod schema;
pub mod selection;

pub use error::{OptionsError, OptionsResult};
pub use normalizer::{normalize, OptionNormalizer};
pub use schema::{
    DefaultValue, Dimension, DimensionKind, DimensionSet, ValuePolicy, CAPABILITY_DIMENSION,
};
pub use selection::{ResolvedSelection, SelectionValue};
