// wttr_exporter - Prometheus metrics exporter for wttr.in
//
// Copyright 2023 Nick Pillitteri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//

use axum::routing::get;
use axum::Router;
use clap::Parser;
use prometheus_client::registry::Registry;
use reqwest::Client;
use std::error::Error;
use std::io;
use std::net::SocketAddr;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{self, SignalKind};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::Level;
use wttr_exporter::client::WttrClient;
use wttr_exporter::http::{self, RequestContext};
use wttr_exporter::journal::Journal;
use wttr_exporter::metrics::WeatherMetrics;
use wttr_exporter::poll::Poller;

const DEFAULT_LOG_LEVEL: Level = Level::INFO;
const DEFAULT_BIND_ADDR: ([u8; 4], u16) = ([0, 0, 0, 0], 9200);
const DEFAULT_REFRESH_SECS: u64 = 3600;
const DEFAULT_BACKOFF_SECS: u64 = 600;
const DEFAULT_TIMEOUT_MILLIS: u64 = 10000;
const DEFAULT_API_URL: &str = "https://wttr.in/";
const DEFAULT_JOURNAL_PATH: &str = "log";

#[derive(Debug, Parser)]
#[clap(name = "wttr_exporter", version = clap::crate_version!())]
struct WttrExporterApplication {
    /// Location to fetch current weather conditions for. Anything the wttr.in
    /// location path accepts works here, e.g. a city name or an airport code.
    #[clap(long)]
    location: String,

    /// Base URL for the wttr.in API
    #[clap(long, default_value_t = DEFAULT_API_URL.into())]
    api_url: String,

    /// Logging verbosity. Allowed values are 'trace', 'debug', 'info', 'warn', and 'error'
    /// (case insensitive)
    #[clap(long, default_value_t = DEFAULT_LOG_LEVEL)]
    log_level: Level,

    /// Fetch current conditions at this interval after a successful poll, in seconds.
    #[clap(long, default_value_t = DEFAULT_REFRESH_SECS)]
    refresh_secs: u64,

    /// Retry at this interval after a failed poll, in seconds.
    #[clap(long, default_value_t = DEFAULT_BACKOFF_SECS)]
    backoff_secs: u64,

    /// Timeout for fetching current conditions from the wttr.in API, in milliseconds.
    #[clap(long, default_value_t = DEFAULT_TIMEOUT_MILLIS)]
    timeout_millis: u64,

    /// Path of the append-only journal that records the outcome of every poll.
    #[clap(long, default_value_t = DEFAULT_JOURNAL_PATH.into())]
    journal: String,

    /// Address to bind to. By default, wttr_exporter will bind to public address since
    /// the purpose is to expose metrics to an external system (Prometheus or another
    /// agent for ingestion)
    #[clap(long, default_value_t = DEFAULT_BIND_ADDR.into())]
    bind: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let opts = WttrExporterApplication::parse();
    tracing::subscriber::set_global_default(
        tracing_subscriber::FmtSubscriber::builder()
            .with_max_level(opts.log_level)
            .finish(),
    )
    .expect("failed to set tracing subscriber");

    if opts.location.trim().is_empty() {
        tracing::error!("location must be a non-empty string");
        process::exit(1);
    }

    let timeout = Duration::from_millis(opts.timeout_millis);
    let http_client = Client::builder().timeout(timeout).build().unwrap_or_else(|e| {
        tracing::error!(message = "unable to initialize HTTP client", error = %e);
        process::exit(1)
    });

    let journal = Journal::open(&opts.journal).unwrap_or_else(|e| {
        tracing::error!(message = "unable to open journal for appending", path = %opts.journal, error = %e);
        process::exit(1)
    });

    let mut registry = Registry::default();
    let metrics = WeatherMetrics::new(&mut registry);
    let client = WttrClient::new(http_client, &opts.api_url);
    let poller = Poller::new(
        client,
        opts.location.clone(),
        metrics,
        journal,
        Duration::from_secs(opts.refresh_secs),
        Duration::from_secs(opts.backoff_secs),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(poller.run(shutdown_rx));

    let context = Arc::new(RequestContext::new(registry));
    let app = Router::new()
        .route("/metrics", get(http::text_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(context);

    let server = axum::Server::try_bind(&opts.bind).unwrap_or_else(|e| {
        tracing::error!(message = "error binding to address", address = %opts.bind, error = %e);
        process::exit(1)
    });

    tracing::info!(message = "server started", address = %opts.bind, api_url = %opts.api_url);
    server
        .serve(app.into_make_service())
        .with_graceful_shutdown(async move {
            // Wait for either SIGTERM or SIGINT to shutdown
            tokio::select! {
                _ = sigterm() => {}
                _ = sigint() => {}
            }

            // Stop the poll loop too; the server stopping on its own doesn't
            let _ = shutdown_tx.send(true);
        })
        .await?;

    tracing::info!("server shutdown");
    Ok(())
}

/// Return after the first SIGTERM signal received by this process
async fn sigterm() -> io::Result<()> {
    unix::signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// Return after the first SIGINT signal received by this process
async fn sigint() -> io::Result<()> {
    unix::signal(SignalKind::interrupt())?.recv().await;
    Ok(())
}
