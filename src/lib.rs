//! graphchat is a chat relay for LangGraph-style orchestration services.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] defines the wire types (threads, thread state, messages, run
//!   payloads) and the HTTP client for the remote service.
//! - [`core`] owns the backend seam, SSE decoding, the thread client, the
//!   message relay, chat sessions, and configuration.
//! - [`server`] exposes the relay endpoint, the upstream pass-through and a
//!   health probe over axum.
//! - [`utils`] holds URL, auth-header and logging helpers.
//!
//! Runtime entrypoints live in the binary crate (`src/main.rs`) and route
//! through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod server;
pub mod utils;
