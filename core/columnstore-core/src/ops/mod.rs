//! Relational/aggregate operators over columns and intermediate results.

pub mod aggregate;
pub mod fetch;
pub mod join;
pub mod print;
pub mod scan;
