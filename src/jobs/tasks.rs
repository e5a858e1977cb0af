/// Background task implementations
use crate::{
    content::DocumentQuery,
    context::AppContext,
    error::PortfolioResult,
};

/// Unmount sessions that have been idle past the TTL
pub async fn sweep_idle_sessions(ctx: &AppContext) -> PortfolioResult<usize> {
    Ok(ctx.sessions.sweep_idle().await)
}

/// Health check - verify the content store answers queries
pub async fn health_check(ctx: &AppContext) -> PortfolioResult<()> {
    let probe = DocumentQuery::of_type("skills").project(["_id"]).to_string();
    ctx.content.fetch(&probe).await?;
    Ok(())
}
