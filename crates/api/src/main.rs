use clap::Parser;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use tickerdash_core::controller::Controller;
use tickerdash_core::domain::display::Slot;
use tickerdash_core::market::yahoo::YahooFinanceClient;
use tickerdash_core::market::MarketDataClient;
use tickerdash_core::session::SessionStore;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod routes;

const DEFAULT_PORT: u16 = 8050;

#[derive(Debug, Parser)]
#[command(name = "tickerdash_api")]
struct Args {
    /// Port to listen on. Falls back to $PORT, then 8050.
    #[arg(long)]
    port: Option<u16>,

    /// Address to bind. Falls back to $BIND_ADDR, then 0.0.0.0.
    #[arg(long)]
    bind: Option<IpAddr>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = tickerdash_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let market: Arc<dyn MarketDataClient> = match YahooFinanceClient::from_settings(&settings) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            return Err(e);
        }
    };
    let forecaster = match tickerdash_core::forecast::from_settings(&settings, market.clone()) {
        Ok(f) => f,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            return Err(e);
        }
    };

    tracing::info!(
        provider = market.provider_name(),
        base_url = settings.market_data_base_url(),
        "market data client ready"
    );

    let state = routes::AppState::new(
        Controller::new(market, forecaster).with_failure_hook(Arc::new(capture_rule_failure)),
        SessionStore::from_env(),
    );

    let app = routes::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::new(resolve_bind(args.bind), resolve_port(args.port));
    tracing::info!(%addr, "dashboard listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn capture_rule_failure(slot: Slot, err: &anyhow::Error) {
    sentry::with_scope(
        |scope| scope.set_tag("slot", format!("{slot:?}")),
        || sentry_anyhow::capture_anyhow(err),
    );
}

fn resolve_port(arg: Option<u16>) -> u16 {
    arg.or_else(|| std::env::var("PORT").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(DEFAULT_PORT)
}

fn resolve_bind(arg: Option<IpAddr>) -> IpAddr {
    arg.or_else(|| std::env::var("BIND_ADDR").ok().and_then(|v| v.parse().ok()))
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &tickerdash_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
