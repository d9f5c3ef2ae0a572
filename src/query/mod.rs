//! Evaluation of Mongo-style filter, sort and projection documents over
//! in-process BSON documents.

mod eval;
mod parse;
mod types;

pub use eval::{compare_bson, compare_docs, eval_filter};
pub use parse::{parse_filter, parse_projection, parse_sort};
pub use types::{CmpOp, Filter, Order, Projection, SortSpec};
pub(crate) use types::MAX_PROJECTION_FIELDS;
