pub mod models;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::{AuthError, TransportError};
use crate::guards::{NavTarget, Navigator, Route};
use crate::http::AuthHttpClient;
use crate::store::TokenStore;

pub use models::{RegisterData, Session, User};
use models::{ApiStatus, LoginResponse, RenewResponse, RestoreResponse};

const LOGIN_FALLBACK_MSG: &str = "Nome utente o password non corretti";
const REGISTER_FALLBACK_MSG: &str = "Errore durante la registrazione";
const CHANGE_PASSWORD_FALLBACK_MSG: &str = "Password attuale non corretta";

/// Idle/InFlight state for one operation. Redundant concurrent calls are
/// dropped while a guard is held; the guard releases on drop, so a cancelled
/// operation cannot wedge the flag.
#[derive(Default)]
struct OpFlag(AtomicBool);

impl OpFlag {
    fn try_begin(&self) -> Option<OpGuard<'_>> {
        self.0
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Acquire)
            .ok()?;
        Some(OpGuard(&self.0))
    }
}

struct OpGuard<'a>(&'a AtomicBool);

impl Drop for OpGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the authentication state as an observable value and coordinates it
/// with the token store. The only writer of the token store.
pub struct SessionController {
    config: Arc<Settings>,
    store: Arc<TokenStore>,
    http: AuthHttpClient,
    navigator: Option<Arc<dyn Navigator>>,
    state: watch::Sender<Session>,
    login_flag: OpFlag,
    restore_flag: OpFlag,
    renew_flag: OpFlag,
}

impl SessionController {
    /// Seeds the observable state synchronously from the token store. Callers
    /// that want the stored token reconciled against the backend should use
    /// [`SessionController::bootstrap`].
    pub fn new(
        config: Arc<Settings>,
        store: Arc<TokenStore>,
        navigator: Option<Arc<dyn Navigator>>,
    ) -> Self {
        let initial = Session {
            token: store.get_token(),
            user: store.get_stored_user(),
        };
        let (state, _) = watch::channel(initial);
        let http = AuthHttpClient::new(reqwest::Client::new(), store.clone());

        Self {
            config,
            store,
            http,
            navigator,
            state,
            login_flag: OpFlag::default(),
            restore_flag: OpFlag::default(),
            renew_flag: OpFlag::default(),
        }
    }

    /// Constructs the controller and runs the automatic restore-session pass.
    pub async fn bootstrap(
        config: Arc<Settings>,
        store: Arc<TokenStore>,
        navigator: Option<Arc<dyn Navigator>>,
    ) -> Arc<Self> {
        let controller = Arc::new(Self::new(config, store, navigator));
        controller.restore_session().await;
        controller
    }

    /// Latest session value and every subsequent change, in the order the
    /// controller applied them.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn current_session(&self) -> Session {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.borrow().is_authenticated()
    }

    /// Authenticates against the backend. At most one login is in flight at a
    /// time; a call issued while another is pending returns immediately
    /// without side effects.
    pub async fn login(&self, username: &str, password: &str) -> crate::Result<()> {
        let Some(_guard) = self.login_flag.try_begin() else {
            debug!("login already in flight, dropping call");
            return Ok(());
        };

        let url = self.config.api.endpoint("/auth/login");
        let response = self
            .http
            .send(
                self.http
                    .post_bypass(&url)
                    .json(&serde_json::json!({ "username": username, "password": password })),
            )
            .await
            .map_err(|err| {
                debug!(error = %err, "login request failed");
                TransportError::Unreachable(
                    "Errore durante il tentativo di accesso. \
                     Verifica la connessione e che il server sia disponibile."
                        .to_string(),
                )
            })?;

        let status = response.status();
        let body: LoginResponse = response.json().await.map_err(|_| {
            TransportError::InvalidResponse(format!(
                "Il server non è disponibile o non risponde correttamente. \
                 Verifica che il backend sia in esecuzione su {}",
                self.config.api.base_url
            ))
        })?;

        if !status.is_success() || !body.success {
            let message = body
                .message
                .unwrap_or_else(|| LOGIN_FALLBACK_MSG.to_string());
            return Err(AuthError::Rejected(message).into());
        }

        let (Some(token), Some(user)) = (body.token, body.user) else {
            return Err(AuthError::Rejected(LOGIN_FALLBACK_MSG.to_string()).into());
        };

        self.store.set_token(&token)?;
        self.store.set_user(&user)?;
        info!(username = %user.username, "login successful");
        self.publish(Session {
            token: Some(token),
            user: Some(user),
        });
        Ok(())
    }

    /// Clears the session locally no matter what the backend says. The
    /// backend call is fire-and-forget; its failure is logged, not surfaced.
    pub fn logout(&self) {
        let url = self.config.api.endpoint("/auth/logout");
        let token = self.store.get_token();
        let http = self.http.clone();
        tokio::spawn(async move {
            let mut builder = http.post_bypass(&url);
            if let Some(token) = token {
                builder = builder.bearer_auth(token);
            }
            if let Err(err) = http.send(builder).await {
                warn!(error = %err, "logout request failed");
            }
        });

        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear token store on logout");
        }
        self.publish(Session::anonymous());
        info!("logged out");

        if let Some(navigator) = &self.navigator {
            navigator.navigate(NavTarget::to(Route::Login));
        }
    }

    /// Registration does not imply login; session state is left untouched.
    pub async fn register(&self, data: &RegisterData) -> crate::Result<()> {
        let url = self.config.api.endpoint("/auth/register");
        let response = self
            .http
            .send(self.http.post_bypass(&url).json(data))
            .await
            .map_err(|err| {
                debug!(error = %err, "register request failed");
                TransportError::Unreachable(
                    "Errore durante la registrazione. \
                     Verifica la connessione e che il server sia disponibile."
                        .to_string(),
                )
            })?;

        let status = response.status();
        let body: ApiStatus = response.json().await.map_err(|_| {
            TransportError::InvalidResponse(REGISTER_FALLBACK_MSG.to_string())
        })?;

        if !status.is_success() || !body.success {
            let message = body
                .message
                .unwrap_or_else(|| REGISTER_FALLBACK_MSG.to_string());
            return Err(AuthError::Rejected(message).into());
        }
        Ok(())
    }

    /// Requires an existing token, sent as the bearer credential.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> crate::Result<()> {
        let token = self
            .store
            .get_token()
            .ok_or(AuthError::NotAuthenticated)?;

        let url = self.config.api.endpoint("/auth/change-password");
        let response = self
            .http
            .send(self.http.post_bypass(&url).bearer_auth(token).json(
                &serde_json::json!({
                    "currentPassword": current_password,
                    "newPassword": new_password,
                }),
            ))
            .await
            .map_err(|err| {
                debug!(error = %err, "change-password request failed");
                TransportError::Unreachable(
                    "Errore durante il cambio password. \
                     Verifica la connessione e che il server sia disponibile."
                        .to_string(),
                )
            })?;

        let status = response.status();
        let body: ApiStatus = response.json().await.map_err(|_| {
            TransportError::InvalidResponse(CHANGE_PASSWORD_FALLBACK_MSG.to_string())
        })?;

        if !status.is_success() || !body.success {
            let message = body
                .message
                .unwrap_or_else(|| CHANGE_PASSWORD_FALLBACK_MSG.to_string());
            return Err(AuthError::Rejected(message).into());
        }
        Ok(())
    }

    /// Reconciles the stored token against the backend. On success the cached
    /// user is refreshed (token unchanged); on any failure the session is
    /// cleared entirely. Never surfaces an error.
    pub async fn restore_session(&self) {
        let Some(_guard) = self.restore_flag.try_begin() else {
            debug!("restore-session already in flight, dropping call");
            return;
        };
        let Some(token) = self.store.get_token() else {
            return;
        };

        let url = self.config.api.endpoint("/auth/restore-session");
        let response = self
            .http
            .send(
                self.http
                    .post_bypass(&url)
                    .json(&serde_json::json!({ "token": token })),
            )
            .await;

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, "restore-session request failed, clearing session");
                self.clear_session();
                return;
            }
        };

        if !response.status().is_success() {
            // Invalid or expired token
            info!("stored token rejected by backend, clearing session");
            self.clear_session();
            return;
        }

        match response.json::<RestoreResponse>().await {
            Ok(RestoreResponse {
                success: true,
                user: Some(user),
            }) => {
                if let Err(err) = self.store.set_user(&user) {
                    warn!(error = %err, "failed to persist restored user");
                }
                info!(username = %user.username, "session restored");
                self.publish(Session {
                    token: Some(token),
                    user: Some(user),
                });
            }
            Ok(_) => {
                info!("restore-session unsuccessful, clearing session");
                self.clear_session();
            }
            Err(err) => {
                warn!(error = %err, "restore-session response malformed, clearing session");
                self.clear_session();
            }
        }
    }

    /// Best-effort token renewal. On success only the token is replaced;
    /// failure leaves the existing token and state untouched.
    pub async fn renew_token(&self) {
        let Some(_guard) = self.renew_flag.try_begin() else {
            debug!("renew-token already in flight, dropping call");
            return;
        };
        let Some(token) = self.store.get_token() else {
            return;
        };

        let url = self.config.api.endpoint("/auth/renew-token");
        let response = self
            .http
            .send(
                self.http
                    .post_bypass(&url)
                    .json(&serde_json::json!({ "token": token })),
            )
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "renew-token rejected");
                return;
            }
            Err(err) => {
                warn!(error = %err, "renew-token request failed");
                return;
            }
        };

        match response.json::<RenewResponse>().await {
            Ok(body) if body.success => {
                if let Some(new_token) = body.token {
                    if let Err(err) = self.store.set_token(&new_token) {
                        warn!(error = %err, "failed to persist renewed token");
                        return;
                    }
                    debug!("token renewed");
                    let user = self.current_user();
                    self.publish(Session {
                        token: Some(new_token),
                        user,
                    });
                }
            }
            Ok(_) => warn!("renew-token unsuccessful"),
            Err(err) => warn!(error = %err, "renew-token response malformed"),
        }
    }

    /// Overwrites the cached user after a profile edit. The token is not
    /// touched.
    pub fn update_current_user(&self, user: User) -> crate::Result<()> {
        self.store.set_user(&user)?;
        let token = self.state.borrow().token.clone();
        self.publish(Session {
            token,
            user: Some(user),
        });
        Ok(())
    }

    /// Shared reqwest client with the interceptor applied; API bindings reuse
    /// it so all non-auth traffic carries the bearer credential.
    pub fn http_client(&self) -> AuthHttpClient {
        self.http.clone()
    }

    fn clear_session(&self) {
        if let Err(err) = self.store.clear() {
            warn!(error = %err, "failed to clear token store");
        }
        self.publish(Session::anonymous());
    }

    fn publish(&self, session: Session) {
        // send_replace delivers even with no subscribers; each call is one
        // atomic state transition, so observers see changes in order.
        self.state.send_replace(session);
    }
}
