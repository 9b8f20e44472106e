use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tracing::info;

use crate::cli::CliContext;
use crate::core::backend::SharedBackend;
use crate::core::config::{Overrides, ResolvedConfig};
use crate::core::memory::InMemoryBackend;
use crate::core::relay::MessageRelay;
use crate::server::proxy::UpstreamProxy;
use crate::server::{self, AppState};

pub async fn run_serve(
    ctx: &CliContext,
    bind: Option<String>,
    port: Option<u16>,
    offline: bool,
) -> Result<(), Box<dyn Error>> {
    let resolved = ResolvedConfig::resolve(
        &ctx.config,
        &Overrides {
            bind,
            port,
            ..ctx.overrides.clone()
        },
    );
    let ip: IpAddr = resolved
        .bind
        .parse()
        .map_err(|err| format!("Invalid bind address '{}': {err}", resolved.bind))?;
    let addr = SocketAddr::new(ip, resolved.port);

    let state = if offline {
        info!("serving from the in-memory backend");
        let backend: SharedBackend = Arc::new(InMemoryBackend::new());
        AppState::new(
            MessageRelay::new(backend, resolved.assistant_id.clone()),
            resolved.max_duration,
        )
    } else {
        info!(api_url = %resolved.api_url, "relaying to orchestration service");
        let client = ctx.http_client()?;
        AppState::new(
            MessageRelay::new(ctx.http_backend()?, resolved.assistant_id.clone()),
            resolved.max_duration,
        )
        .with_proxy(UpstreamProxy::new(
            client,
            &resolved.api_url,
            resolved.api_key.clone(),
        ))
    };

    server::serve(state, addr).await?;
    Ok(())
}
