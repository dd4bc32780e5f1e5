// restbase-core/src/lib.rs
// Query engine, mutation engine and in-memory document store for the
// restbase mock REST server. Transport-free: the HTTP layer lives in
// restbase-server.

pub mod error;
pub mod inflect;
pub mod logging;
pub mod mutation;
pub mod plan;
pub mod predicate;
pub mod schema;
pub mod store;
pub mod transform;
pub mod value_utils;

// Public exports
pub use error::{FieldError, RestError, Result};
pub use logging::{get_log_level, set_log_level, LogLevel};
pub use plan::{QueryPlan, SortOrder};
pub use predicate::{FilterOp, Predicate};
pub use schema::CompiledSchema;
pub use store::{ResourceShape, Store};
pub use transform::ListPage;
