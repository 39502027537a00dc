//! Cerebras API integration
//!
//! Error model, streaming progress types, and rate-limit coordination for
//! the Cerebras chat completion API.

pub mod error;
pub mod progress;
pub mod ratelimit;
