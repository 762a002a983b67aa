//! # columnstore-core
//!
//! An in-memory column-store query engine: a data model of databases,
//! tables and dense integer columns; B+tree and sorted secondary indexes,
//! clustered or unclustered; scan/fetch/aggregate/join operators; a
//! batched shared-scan scheduler with cooperative worker parallelism; and
//! a per-client namespace of named intermediate results.
//!
//! This crate is the embeddable engine library. It has no knowledge of the
//! stream-socket wire protocol — that framing, plus the command-language
//! parser's integration with a live socket, lives in the `columnstore-server`
//! binary crate. What this crate exposes is everything from the dense
//! column storage up through [`dispatcher::dispatch`]: given one already
//! line-parsed [`parser::ParsedCommand`], resolve it against an [`Engine`]
//! and a [`ClientContext`], execute it, and return the outcome.
//!
//! ## Module structure
//! - [`model`] — database → table → column data model and insert paths
//! - [`index`] — B+tree and sorted secondary indexes
//! - [`ops`] — scan, fetch, aggregate, join and print operators
//! - [`batch`] — the shared-scan batch scheduler
//! - [`client_context`] — per-client handle table
//! - [`engine`] — the engine handle (current database, config)
//! - [`dispatcher`] — turns a parsed command into an executed result
//! - [`parser`] — command-language grammar (§6 EBNF)
//! - [`persistence`] — catalog dump/restore
//! - [`joinmap`] — chained-bucket hash map backing the hash join
//! - [`config`] — tunable engine parameters
//! - [`error`] — unified error type and wire status-code mapping
//! - [`logging`] — `tracing`-based logging, gated behind the `logging` feature

pub mod batch;
pub mod client_context;
pub mod config;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod index;
pub mod joinmap;
pub mod logging;
pub mod model;
pub mod ops;
pub mod parser;
pub mod persistence;
pub mod result;

pub use client_context::ClientContext;
pub use config::EngineConfig;
pub use dispatcher::{dispatch, Batch, Dispatched};
pub use engine::Engine;
pub use error::{CsError, CsResult, StatusCode};
pub use result::ResultValue;
