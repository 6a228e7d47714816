//! JSON-RPC 2.0 types used on the session bridge.
//!
//! The protocol exchanges plain (non-batched) JSON-RPC 2.0 calls whose
//! `params` and `result` fields carry arbitrary JSON values verbatim.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod error;
pub mod request;
pub mod response;

pub use error::{ErrorCode, RpcError};
pub use request::{RpcRequest, Version, next_id};
pub use response::{ResponseOutcome, RpcResponse};
