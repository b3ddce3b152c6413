//! sf-core - Core library for sqlfake
//!
//! Object references and their normalization, generated names for
//! temporary objects, the value and tabular data model shared by every
//! crate, and configuration.

pub mod config;
pub mod dialect;
pub mod error;
pub mod kind;
pub mod naming;
pub mod param;
pub mod reference;
pub mod table;
pub mod value;

pub use config::{ComparisonOptions, Config, DatabaseConfig, NamingConfig};
pub use dialect::Dialect;
pub use error::{CoreError, CoreResult};
pub use kind::ObjectKind;
pub use naming::NameGenerator;
pub use param::{Parameter, ParameterDirection};
pub use reference::ObjectReference;
pub use table::{Column, TabularResult};
pub use value::{FromSqlValue, SqlValue};
