//! # FacetDB Core
//!
//! Incremental derived indexes over a path-addressable document store.
//!
//! A [`Store`] holds top-level records (string key → [`Value`]). A
//! caller registers one map function per index; whenever a record
//! changes, each index recomputes only that record's contribution,
//! using a reverse-link table to undo the old contribution in time
//! proportional to the record's own output.
//!
//! Index keys are heterogeneous (numbers, strings, arrays, maps) and
//! compare under the single total order provided by
//! [`facetdb_collate`].
//!
//! ## Usage
//!
//! ```
//! use facetdb_core::{Emission, Store, Value};
//!
//! let mut store = Store::new();
//! store.set("4398756", Value::map(vec![
//!     ("name".to_string(), Value::from("bananas")),
//!     ("color".to_string(), Value::from("yellow")),
//! ]))?;
//!
//! store.derived("by_color", |_k, v, _emit| {
//!     Ok(match v.get("color") {
//!         Some(color) => Emission::Pair(color.clone(), v.clone()),
//!         None => Emission::Skip,
//!     })
//! })?;
//!
//! let by_color = store.index("by_color").unwrap();
//! assert!(by_color.get(&Value::from("yellow"))?.is_some());
//! # Ok::<(), facetdb_core::CoreError>(())
//! ```
//!
//! Map functions may also fan one record out into many entries by
//! calling [`Emitter::emit`] repeatedly, or skip a record entirely.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod derived;
mod error;
pub mod path;
mod registry;
mod store;

pub use derived::{Derived, Emission, Emitter, MapFn};
pub use error::{CoreError, CoreResult, MapError};
pub use store::Store;

// The collation layer is part of the public API surface.
pub use facetdb_collate::{
    decode_key, encode_key, CollateError, CollateResult, CollatedKey, Value,
};
