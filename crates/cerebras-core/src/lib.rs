//! Core library for the Cerebras chat backend
//!
//! Hosts the pieces of the backend that need real coordination logic,
//! chiefly rate-limit handling shared across concurrent chat requests.

pub mod ai;
