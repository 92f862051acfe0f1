//! The session lifecycle state machine.
//!
//! `SessionController` is the sole writer of the token slot and the session
//! value. Every transition leaves the two consistent: a token is never left
//! persisted unless the verifier has accepted it, and `current_user` is
//! never set from anything but a verifier response.

use tracing::{debug, error, info, warn};

use crate::api::AuthBackend;
use crate::models::{BearerToken, Credentials, Identity, RegistrationData};

use super::{AuthOutcome, Redirect, Session, TokenStore};

/// Generic message for a login that failed for any reason other than a
/// rejection the server explained.
pub const LOGIN_FAILED: &str = "Login failed";

/// Generic message for a failed registration.
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// Returned when the exchange issued a token the verifier then refused.
pub const USER_INFO_FAILED: &str = "Failed to retrieve user info";

pub struct SessionController<B, S> {
    backend: B,
    store: S,
    session: Session,
    initialized: bool,
}

impl<B: AuthBackend, S: TokenStore> SessionController<B, S> {
    pub fn new(backend: B, store: S) -> Self {
        Self {
            backend,
            store,
            session: Session::default(),
            initialized: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn current_user(&self) -> Option<&Identity> {
        self.session.current_user()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn token_store(&self) -> &S {
        &self.store
    }

    /// Tear the controller down, handing back its collaborators
    pub fn into_parts(self) -> (B, S) {
        (self.backend, self.store)
    }

    /// Rehydrate the session from the stored token.
    ///
    /// Runs once per controller; later calls do nothing. A stored token is
    /// only trusted after the verifier accepts it. Anything else purges it.
    pub async fn initialize(&mut self) {
        if self.initialized {
            debug!("Session already initialized");
            return;
        }
        self.initialized = true;

        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("No stored token");
                self.session.end();
                return;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read stored token");
                self.roll_back();
                return;
            }
        };

        match self.backend.verify(&token).await {
            Ok(identity) => {
                info!("Session restored");
                self.session.establish(identity);
            }
            Err(e) if e.is_transport() => {
                error!(error = %e, "Failed to verify stored token");
                self.roll_back();
            }
            Err(e) => {
                debug!(error = %e, "Stored token rejected");
                self.roll_back();
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) -> AuthOutcome {
        self.login_with(&Credentials::new(username, password)).await
    }

    /// Exchange credentials for a token, persist it, then re-verify it.
    ///
    /// The session only changes once the verifier has accepted the new
    /// token. If it does not, the token just written is cleared again.
    pub async fn login_with(&mut self, credentials: &Credentials) -> AuthOutcome {
        let raw = match self.backend.exchange_login(credentials).await {
            Ok(raw) => raw,
            Err(e) if e.is_transport() => {
                error!(error = %e, "Login error");
                return AuthOutcome::failure(LOGIN_FAILED);
            }
            Err(e) => {
                warn!(error = %e, "Login rejected");
                return AuthOutcome::failure(e.user_message(LOGIN_FAILED));
            }
        };

        let token = BearerToken::from_raw(&raw);
        if let Err(e) = self.store.set(&token) {
            error!(error = %e, "Failed to persist token");
            self.roll_back();
            return AuthOutcome::failure(LOGIN_FAILED);
        }

        match self.backend.verify(&token).await {
            Ok(identity) => {
                info!("Login successful");
                self.session.establish(identity);
                AuthOutcome::success(Redirect::Profile)
            }
            Err(e) if e.is_transport() => {
                error!(error = %e, "Failed to verify new token");
                self.roll_back();
                AuthOutcome::failure(LOGIN_FAILED)
            }
            Err(e) => {
                warn!(error = %e, "New token rejected by verifier");
                self.roll_back();
                AuthOutcome::failure(USER_INFO_FAILED)
            }
        }
    }

    /// Submit a registration. A success does not sign the user in.
    pub async fn register(&self, data: &RegistrationData) -> AuthOutcome {
        match self.backend.exchange_register(data).await {
            Ok(()) => {
                info!("Registration accepted");
                AuthOutcome::success(Redirect::RegistrationComplete)
            }
            Err(e) if e.is_transport() => {
                error!(error = %e, "Register error");
                AuthOutcome::failure(REGISTRATION_FAILED)
            }
            Err(e) => {
                warn!(error = %e, "Registration rejected");
                AuthOutcome::failure(e.user_message(REGISTRATION_FAILED))
            }
        }
    }

    /// Drop the local session. Never touches the network and always
    /// succeeds.
    pub fn logout(&mut self) -> AuthOutcome {
        self.roll_back();
        info!("Logged out");
        AuthOutcome::success(Redirect::Landing)
    }

    /// Empty the token slot and the session together
    fn roll_back(&mut self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored token");
        }
        self.session.end();
    }
}

// ============================================================================
// Tests
// ============================================================================
