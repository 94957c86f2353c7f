//! Catalog building and request dispatch for Vista.
//!
//! The runtime turns an introspected schema into virtual tables and turns a
//! host list request into SQL against the remote database. It knows nothing
//! about a particular driver: database access goes through [`DataSource`].

pub mod adapter;
pub mod catalog;
pub mod executor;
pub mod pattern;
pub mod predicate;
pub mod sink;
pub mod synthesize;

pub use adapter::{DataSource, RecordStream};
pub use catalog::{Catalog, RAW_QUERY_TABLE};
pub use predicate::{Escaped, PredicateRenderer, Verbatim};
pub use sink::RowSink;
pub use synthesize::{KeyColumn, Requirement, TableKind, VirtualColumn, VirtualTable, synthesize};
