//! Lamina Core - in-memory columnar data engine
//!
//! This crate provides the core functionality:
//! - Value: nullable tagged cell values with runtime types
//! - Types: runtime type hierarchy and common-ancestor inference
//! - Series: a single named column with a lazily inferred element type
//! - DataFrame: uniquely-named, equal-length columns with structural equality
//! - Grouping: first-occurrence-ordered group-by with multi-expression aggregation
//! - Expansion: reshaping sequence-valued columns into scalar columns

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Table module - ordered, uniquely-named columns and structural equality
pub mod dataframe;

/// Error types shared by every engine operation
pub mod error;

/// Per-row expressions and column-set expansion
pub mod expand;

/// Grouping and aggregation for series and tables
pub mod grouped;

/// Parallel execution configuration
pub mod parallel;

/// Series module - a single named column of nullable values
pub mod series;

/// Runtime type hierarchy and common-ancestor computation
pub mod types;

/// Cell values and kind tags
pub mod value;

pub use dataframe::DataFrame;
pub use error::{DataError, DataResult};
pub use expand::ColExpr;
pub use grouped::{AggExpr, AggOp, GroupedDataFrame, GroupedSeries};
pub use parallel::{parallel_threshold, set_parallel_threshold, ParallelConfig};
pub use series::Series;
pub use types::TypeRef;
pub use value::{Kind, Obj, Value};
