//! Base types and error handling.
//!
//! - [`NetError`](neterror::NetError): the crate-wide error type
//! - [`IoResultExt`](context::IoResultExt): context helpers for IO results

pub mod context;
pub mod neterror;
