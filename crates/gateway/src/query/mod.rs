//! Declarative query translation.
//!
//! Callers describe a list query as named operator groups, each mapping a
//! field name to an operand:
//!
//! ```json
//! { "eq": { "status": "open" }, "gt": { "total": 5 }, "lt": { "total": 10 } }
//! ```
//!
//! [`translate`] turns those groups into the store's native filter
//! structure (`{"status": "open", "total": {"$gt": 5, "$lt": 10}}`).
//!
//! # Operators
//!
//! | Group | Native form |
//! |-------|-------------|
//! | `eq` | `field: value` |
//! | `ne` | `$ne` |
//! | `lt` / `le` | `$lt` / `$lte` |
//! | `gt` / `ge` | `$gt` / `$gte` |
//! | `like` | `$regex` |
//! | `in` | `$in` |
//! | `geo` | `$within: { $centerSphere: [center, radius / 6378] }` |
//!
//! Operators on the same field merge into one operator document. `eq` is
//! plain value equality and cannot be combined with another operator on the
//! same field.
//!
//! # Examples
//!
//! ```
//! use helios_gateway::query::{translate, Operator, QuerySpec};
//! use serde_json::json;
//!
//! let spec = QuerySpec::new()
//!     .with(Operator::Eq, "a", json!(1))
//!     .with(Operator::Gt, "b", json!(5));
//!
//! let filter = translate(&spec).unwrap();
//! assert_eq!(filter.to_value(), json!({"a": 1, "b": {"$gt": 5}}));
//! ```

mod filter;
mod operator;
mod options;
mod spec;

pub use filter::{EARTH_RADIUS_KM, Filter, translate};
pub use operator::Operator;
pub use options::{FindOptions, Projection, SortDirection, SortKey, SortSpec};
pub use spec::{GeoRadius, QuerySpec};
