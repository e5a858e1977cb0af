/// Application context and dependency injection
use crate::{
    config::{ContentBackendConfig, ServerConfig},
    content::{AssetUrlResolver, ContentClient, InMemoryContentStore, SanityClient, SanityClientConfig},
    error::PortfolioResult,
    rate_limit::RateLimiter,
    session::SessionRegistry,
};
use std::{sync::Arc, time::Duration};
use tracing::{info, warn};

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<ServerConfig>,
    pub content: Arc<dyn ContentClient>,
    pub assets: AssetUrlResolver,
    pub sessions: Arc<SessionRegistry>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: ServerConfig) -> PortfolioResult<Self> {
        config.validate()?;

        let content = Self::build_content_client(&config.content.backend).await?;
        Ok(Self::with_content(config, content))
    }

    /// Assemble the context around an already constructed store client
    pub fn with_content(config: ServerConfig, content: Arc<dyn ContentClient>) -> Self {
        let (project_id, dataset) = config.content.backend.asset_scope();
        let assets = AssetUrlResolver::new(config.content.cdn_url.as_str(), project_id, dataset);

        let sessions = Arc::new(SessionRegistry::new(
            content.clone(),
            assets.clone(),
            config.listing.clone(),
            &config.sessions,
        ));
        let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));

        Self {
            config: Arc::new(config),
            content,
            assets,
            sessions,
            rate_limiter,
        }
    }

    async fn build_content_client(backend: &ContentBackendConfig) -> PortfolioResult<Arc<dyn ContentClient>> {
        match backend {
            ContentBackendConfig::Sanity {
                project_id,
                dataset,
                api_version,
                token,
                use_cdn,
                api_host,
                request_timeout_secs,
            } => {
                let mut client_config = SanityClientConfig::new(project_id.as_str(), dataset.as_str());
                client_config.api_version = api_version.clone();
                client_config.token = token.clone();
                client_config.use_cdn = *use_cdn;
                client_config.api_host = api_host.clone();
                client_config.timeout = request_timeout_secs.map(Duration::from_secs);

                if token.is_none() {
                    warn!("No content store token configured; contact submissions will fail");
                }
                info!(project_id = %project_id, dataset = %dataset, "Using hosted content store");
                Ok(Arc::new(SanityClient::new(client_config)?))
            }
            ContentBackendConfig::Memory { seed_file } => {
                let store = match seed_file {
                    Some(path) => {
                        info!(path = %path.display(), "Seeding in-memory content store");
                        InMemoryContentStore::from_seed_file(path).await?
                    }
                    None => {
                        info!("Using empty in-memory content store");
                        InMemoryContentStore::default()
                    }
                };
                Ok(Arc::new(store))
            }
        }
    }

    /// Base URL of this service
    pub fn service_url(&self) -> String {
        format!(
            "http://{}:{}",
            self.config.service.hostname, self.config.service.port
        )
    }
}
