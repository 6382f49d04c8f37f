pub mod bind;
pub mod builder;
pub mod config;
pub mod database_info;
pub mod dialect;
pub mod error;
pub mod ident;
pub mod utils;
pub mod value;

pub use builder::{count, delete, insert, select, select_columns, update, Operation, QueryBuilder};
pub use config::{ConnectionSettings, DbConfig};
pub use database_info::DatabaseInfo;
pub use dialect::{Dialect, Flavor};
pub use error::{QueryError, Result};
pub use ident::{escape_identifier, IdentPolicy};
pub use utils::validate_direction;
pub use value::BindValue;
