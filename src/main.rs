/// Portfolio Site - portfolio content service
///
/// Serves category-filtered project and skill listings backed by a headless
/// content store, and accepts contact form submissions into the same store.

mod api;
mod config;
mod contact;
mod content;
mod context;
mod error;
mod jobs;
mod listing;
mod metrics;
mod rate_limit;
mod server;
mod session;

use config::{LoggingConfig, ServerConfig};
use context::AppContext;
use error::PortfolioResult;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> PortfolioResult<()> {
    // Load configuration
    let config = ServerConfig::from_env()?;

    init_tracing(&config.logging);
    print_banner();

    let ctx = Arc::new(AppContext::new(config).await?);

    // Start background jobs
    let scheduler = Arc::new(jobs::JobScheduler::new(Arc::clone(&ctx)));
    scheduler.start();

    server::serve((*ctx).clone()).await?;

    Ok(())
}

/// Initialize logging; `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!("portfolio_site={},tower_http=debug", logging.level).into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_banner() {
    println!(
        r#"
    ____             __  ____      ___
   / __ \____  _____/ /_/ __/___  / (_)___
  / /_/ / __ \/ ___/ __/ /_/ __ \/ / / __ \
 / ____/ /_/ / /  / /_/ __/ /_/ / / / /_/ /
/_/    \____/_/   \__/_/  \____/_/_/\____/

        Portfolio content service v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
