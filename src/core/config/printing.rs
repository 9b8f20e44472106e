use std::io::{self, Write};
use std::path::Path;

use crate::core::config::data::path_display;
use crate::core::config::resolve::ResolvedConfig;

impl ResolvedConfig {
    pub fn print_all(&self, config_path: &Path) {
        let stdout = io::stdout();
        let _ = self.write_all(&mut stdout.lock(), config_path);
    }

    pub fn write_all<W: Write>(&self, out: &mut W, config_path: &Path) -> io::Result<()> {
        writeln!(out, "Current configuration ({}):", path_display(config_path))?;
        writeln!(out, "  api-url: {}", self.api_url)?;
        match self.masked_api_key() {
            Some(masked) => writeln!(out, "  api-key: {masked}")?,
            None => writeln!(out, "  api-key: (unset)")?,
        }
        writeln!(out, "  assistant-id: {}", self.assistant_id)?;
        writeln!(out, "  server-bind: {}", self.bind)?;
        writeln!(out, "  server-port: {}", self.port)?;
        writeln!(out, "  max-duration: {}s", self.max_duration.as_secs())?;
        Ok(())
    }
}
