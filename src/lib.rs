pub mod api;
pub mod config;
pub mod error;
pub mod forms;
pub mod guards;
pub mod http;
pub mod renewal;
pub mod session;
pub mod store;

use std::sync::Arc;

pub use error::{AppError, AuthError, StorageError, TransportError, ValidationError};
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use guards::{GuardDecision, NavTarget, Navigator, Route};
pub use session::{RegisterData, Session, SessionController, User};
pub use store::TokenStore;

/// Client state shared across all UI surfaces: configuration, the durable
/// token store and the session controller built on top of it.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub store: Arc<TokenStore>,
    pub session: Arc<SessionController>,
}

impl AppState {
    pub async fn new(config: Settings) -> Result<Self> {
        Self::with_navigator(config, None).await
    }

    /// Builds the file-backed token store, then bootstraps the session
    /// controller (which runs the automatic restore-session pass).
    pub async fn with_navigator(
        config: Settings,
        navigator: Option<Arc<dyn Navigator>>,
    ) -> Result<Self> {
        let backend = store::FileBackend::new(&config.storage.dir)?;
        let store = Arc::new(TokenStore::new(Box::new(backend)));
        let config = Arc::new(config);
        let session =
            SessionController::bootstrap(config.clone(), store.clone(), navigator).await;

        Ok(Self {
            config,
            store,
            session,
        })
    }
}
