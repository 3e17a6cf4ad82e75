use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use clap::Parser;
use festival_mind::{config::Config, router::Router, server::FestivalMindServer};
use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ServiceExt, transport::stdio};
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

/// Festival review desk MCP server.
#[derive(Debug, Parser)]
#[command(name = "festival-mcp", version)]
struct Args {
    /// Serve over streamable HTTP at this address instead of stdio
    /// (overrides FEST_HTTP_ADDR)
    #[arg(long)]
    http: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logging (respect RUST_LOG, default warn)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let mut cfg = Config::load()?;
    if args.http.is_some() {
        cfg.http_addr = args.http;
    }

    let server = FestivalMindServer::new(cfg.clone()).await?;
    let router = Router(server);

    match cfg.http_addr.clone() {
        Some(addr) => serve_http(router, cfg, addr).await,
        None => {
            let svc = router.serve(stdio()).await?;
            svc.waiting().await?;
            Ok(())
        }
    }
}

async fn serve_http(router: Router, cfg: Config, addr: String) -> anyhow::Result<()> {
    let service = StreamableHttpService::new(
        move || Ok(router.clone()),
        LocalSessionManager::default().into(),
        Default::default(),
    );

    let mut app = axum::Router::new().nest_service("/mcp", service);
    if cfg.bearer_token.is_some() {
        app = app.layer(axum::middleware::from_fn_with_state(
            Arc::new(cfg.clone()),
            require_token,
        ));
    }
    let app = app
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(|_: BoxError| async {
                    StatusCode::REQUEST_TIMEOUT
                }))
                .timeout(Duration::from_secs(60)),
        )
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("festival-mind listening on http://{addr}/mcp");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn require_token(
    axum::extract::State(cfg): axum::extract::State<Arc<Config>>,
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let Some(expected) = cfg.bearer_token.as_deref() else {
        return next.run(req).await;
    };

    let header_ok = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token == expected);

    let url_ok = cfg.allow_token_in_url
        && req.uri().query().is_some_and(|q| {
            q.split('&')
                .any(|pair| pair.strip_prefix("token=") == Some(expected))
        });

    if header_ok || url_ok {
        next.run(req).await
    } else {
        StatusCode::UNAUTHORIZED.into_response()
    }
}
