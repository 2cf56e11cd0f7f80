use bmpresence_client::renewal::RenewalScheduler;
use bmpresence_client::{AppState, Settings};
use dotenv::dotenv;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> bmpresence_client::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded, API at {}", config.api.base_url);

    // Build state; this restores the stored session against the backend
    let state = AppState::new(config).await?;

    let session = state.session.current_session();
    match session.user {
        Some(user) => info!(username = %user.username, "Session restored"),
        None => info!("No active session, login required"),
    }

    // Background renewal runs only if enabled by configuration
    let scheduler = RenewalScheduler::new(state.session.clone(), state.config.renewal.clone());
    scheduler.start();

    // Keep the process alive while the renewal task runs; dropping the
    // scheduler would abort it.
    if scheduler.is_running() {
        info!("Renewal active, press Ctrl+C to exit");
        tokio::signal::ctrl_c().await?;
        scheduler.stop();
    }

    Ok(())
}
