pub mod backend;
pub mod config;
pub mod error;
pub mod memory;
pub mod relay;
pub mod session;
pub mod stream;
pub mod threads;
