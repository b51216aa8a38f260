//! Adapters for the external environmental data providers.
//!
//! Each adapter owns its provider's wire format and normalizes it into a
//! payload shaped for our own API. Provider errors are folded into
//! [`AppError::Upstream`](crate::error::AppError::Upstream): a non-2xx
//! reply carries the upstream status, transport and parse failures carry
//! none.

pub mod openaq;
pub mod openweather;
