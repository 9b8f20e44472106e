use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::{Message, Role};

const DEFAULT_FILTER: &str = "graphchat=info,tower_http=info";
const VERBOSE_FILTER: &str = "graphchat=debug,tower_http=debug";

/// Install the global subscriber. `RUST_LOG` wins over `verbose`.
pub fn init_tracing(verbose: bool) {
    let fallback = if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Plain-text transcript of a conversation, appended one message at a time.
pub struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    /// Open (creating if needed) `path` for appending. Fails early when the
    /// file is not writable.
    pub fn open(path: impl Into<PathBuf>) -> std::io::Result<Self> {
        let path = path.into();
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        file.flush()?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn log_message(&self, message: &Message) -> std::io::Result<()> {
        let text = message.text();
        let entry = match &message.role {
            Role::User => format!("You: {text}"),
            Role::Assistant if text.is_empty() => return Ok(()),
            Role::Assistant => text,
            Role::System | Role::Tool | Role::Other(_) => format!("## {text}"),
        };
        self.write_entry(&entry)
    }

    fn write_entry(&self, content: &str) -> std::io::Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::with_capacity(64 * 1024, file);

        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }
        // Blank line between messages
        writeln!(writer)?;

        writer.flush()
    }
}
