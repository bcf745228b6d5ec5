//! Provider specific [`ClientWrapper`](crate::client_wrapper::ClientWrapper) implementations.
//!
//! Each submodule offers a concrete client that speaks a particular vendor's
//! generation API while conforming to the uniform finagent contract.

pub mod gemini;
