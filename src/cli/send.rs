//! One-shot "send" command: stream a single reply to stdout.

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use futures_util::StreamExt;
use tracing::debug;

use crate::api::{Message, ThreadId};
use crate::cli::CliContext;
use crate::core::relay::{MessageRelay, MessageStream, SendMessage};
use crate::core::stream::{MessageEventKind, StreamEvent};
use crate::utils::logging::TranscriptLog;

pub async fn run_send(
    ctx: &CliContext,
    thread: Option<String>,
    log: Option<PathBuf>,
    prompt: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        return Err("Usage: graphchat send <prompt>".into());
    }

    let transcript = log.map(TranscriptLog::open).transpose()?;
    let relay = MessageRelay::new(ctx.http_backend()?, ctx.resolved.assistant_id.clone());

    let user = Message::user(prompt);
    if let Some(transcript) = &transcript {
        transcript.log_message(&user)?;
    }

    let stream = relay
        .send_message(SendMessage {
            thread_id: thread.map(ThreadId::from),
            messages: vec![user],
        })
        .await?;

    // Ctrl+C stops reading; the remote run is left alone.
    let cancel = stream.cancel_token();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("cancelling stream");
            cancel.cancel();
        }
    });
    let reply = print_reply(stream, &mut io::stdout()).await;
    ctrl_c.abort();

    let reply = reply?;
    if let Some(transcript) = &transcript {
        transcript.log_message(&Message::assistant(reply))?;
    }
    Ok(())
}

/// Write the assistant's reply to `out` as it arrives and return the full
/// text. Deltas are appended; partial and complete messages only contribute
/// the part of that message not yet printed. Separate assistant messages in
/// one run (say, before and after a tool call) are joined by a newline.
pub async fn print_reply<W: Write>(
    mut stream: MessageStream,
    out: &mut W,
) -> Result<String, Box<dyn Error>> {
    let mut reply = String::new();
    let mut current_id: Option<String> = None;
    let mut current = String::new();
    let mut needs_separator = false;

    while let Some(event) = stream.next().await {
        let (kind, message) = match event? {
            StreamEvent::End => break,
            StreamEvent::Message { kind, message, .. } if message.is_assistant() => {
                (kind, message)
            }
            _ => continue,
        };

        if message.id.is_some() && message.id != current_id {
            current_id = message.id.clone();
            current.clear();
            needs_separator = !reply.is_empty();
        }

        let text = message.text();
        let fresh = match kind {
            MessageEventKind::Delta => text,
            MessageEventKind::Partial | MessageEventKind::Complete => {
                match text.strip_prefix(current.as_str()) {
                    Some(rest) => rest.to_string(),
                    None => continue,
                }
            }
        };
        if fresh.is_empty() {
            continue;
        }

        if needs_separator {
            writeln!(out)?;
            reply.push('\n');
            needs_separator = false;
        }
        write!(out, "{fresh}")?;
        out.flush()?;
        current.push_str(&fresh);
        reply.push_str(&fresh);
    }
    writeln!(out)?;
    Ok(reply)
}
