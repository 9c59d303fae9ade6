//! The commission engine public API.
//!
//! Thin, backend-agnostic wrappers over the [`crate::traits`] contracts. The server crate holds one of each,
//! parameterised with the concrete database backend.
pub mod merchant_api;
pub mod order_flow_api;
pub mod payout_api;
