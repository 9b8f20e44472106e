pub mod data;
pub mod io;
pub mod keys;
pub mod printing;
pub mod resolve;

pub use data::{path_display, Config, ServerConfig};
pub use io::ConfigError;
pub use resolve::{Overrides, ResolvedConfig};
