use std::error::Error;

use crate::api::ThreadId;
use crate::cli::CliContext;
use crate::core::threads::ThreadClient;

pub async fn run_new_thread(ctx: &CliContext) -> Result<(), Box<dyn Error>> {
    let client = ThreadClient::new(ctx.http_backend()?);
    let thread = client.create_thread().await?;
    println!("{}", thread.thread_id);
    Ok(())
}

pub async fn run_state(ctx: &CliContext, thread_id: String) -> Result<(), Box<dyn Error>> {
    let client = ThreadClient::new(ctx.http_backend()?);
    let state = client.get_thread_state(&ThreadId::new(thread_id)).await?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}
