//! API gateway request/response contract.

pub mod types;

pub use types::{GatewayRequest, GatewayResponse};
