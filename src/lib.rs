//! Blockfall (workspace facade crate).
//!
//! The simulation lives in dedicated crates under `crates/`; this package
//! re-exports them as `blockfall::{core,types}` and adds the line-oriented
//! JSON session driver used by the `blockfall` binary.

pub use blockfall_core as core;
pub use blockfall_types as types;

pub mod protocol;
pub mod session;
