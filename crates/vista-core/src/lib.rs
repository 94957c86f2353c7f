//! Shared types for Vista.
//!
//! Vista exposes the tables of a relational schema, discovered at connection
//! time, as virtual tables for a host query engine. This crate holds the pieces
//! every other crate agrees on: the schema model produced by introspection, the
//! host's scalar type system and the mapping onto it, filter predicates, result
//! records, connection configuration and the error kinds.

pub mod config;
pub mod error;
pub mod model;
pub mod type_map;
pub mod value;

pub use config::{ConfigError, ConnectionConfig};
pub use error::{BoxError, Error, Result};
pub use model::{
    ColumnModel, ColumnTypeDescriptor, HostType, NativeType, NetworkKind, TableModel,
};
pub use type_map::map_type;
pub use value::{Operator, QualValue, Qualifier, ResultRecord, Value};
