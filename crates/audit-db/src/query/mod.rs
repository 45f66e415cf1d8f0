//! Dynamic SQL building blocks
//!
//! Model tables and columns come from the registry at runtime, so the
//! statements touching them are assembled as strings with quoted
//! identifiers and typed bind values.

mod bind;
mod ident;
mod union;

pub use bind::{bind_query, bind_query_as, BindValue};
pub use ident::{quote_ident, quote_literal};
pub use union::{build_union_query, UnionQuery};
