// src/bin/ticker_server.rs
use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use dotenv::dotenv;
use log::{info, warn};

use ticker_meta_cache::server::{self, AppState};
use ticker_meta_cache::source;
use ticker_meta_cache::{TickerMetaConfig, TickerMetaService};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = TickerMetaConfig::from_env().context("Invalid configuration")?;
    let service = TickerMetaService::connect(&config).await?;

    let ticker_source = match &config.source {
        Some(source_config) => Some(source::from_config(source_config)?),
        None => {
            warn!("No ticker source configured; POST /admin/rebuild is disabled");
            None
        }
    };

    let bind_address = format!("0.0.0.0:{}", config.port);
    let state = web::Data::new(AppState::new(config, service, ticker_source));

    info!("🚀 Ticker meta cache server running on http://{}", bind_address);
    info!("📋 Available endpoints:");
    info!("  • GET  /autocomplete?q=   - Company name autocomplete");
    info!("  • GET  /tickers/resolve?q= - Resolve by company name or ticker");
    info!("  • GET  /tickers/company/{{name}}");
    info!("  • GET  /tickers/symbol/{{ticker}}");
    info!("  • POST /admin/rebuild     - Rebuild index from the configured source");
    info!("  • GET  /health            - Health check");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Logger::default())
            .configure(server::configure)
            .default_service(web::to(server::cors_handler))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
