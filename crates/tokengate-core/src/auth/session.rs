use crate::models::Identity;

/// The externally visible session state.
///
/// `current_user` is `Some` only while a token accepted by the verifier is
/// held; it is never filled from unverified data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    current_user: Option<Identity>,
}

impl Session {
    pub fn current_user(&self) -> Option<&Identity> {
        self.current_user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub(crate) fn establish(&mut self, identity: Identity) {
        self.current_user = Some(identity);
    }

    pub(crate) fn end(&mut self) {
        self.current_user = None;
    }
}

/// Where the application should navigate after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Unauthenticated landing page
    Landing,
    /// Signed-in user's profile
    Profile,
    /// Confirmation shown after a registration is accepted
    RegistrationComplete,
}

impl Redirect {
    pub fn path(&self) -> &'static str {
        match self {
            Redirect::Landing => "/",
            Redirect::Profile => "/profile",
            Redirect::RegistrationComplete => "/success",
        }
    }
}

/// Result of a session transition. The controller only states the intent;
/// performing the navigation is up to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success { redirect_to: Redirect },
    Error { message: String },
}

impl AuthOutcome {
    pub(crate) fn success(redirect_to: Redirect) -> Self {
        AuthOutcome::Success { redirect_to }
    }

    pub(crate) fn failure(message: impl Into<String>) -> Self {
        AuthOutcome::Error {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, AuthOutcome::Success { .. })
    }

    /// `None` on success, the user-facing message otherwise
    pub fn error(&self) -> Option<&str> {
        match self {
            AuthOutcome::Success { .. } => None,
            AuthOutcome::Error { message } => Some(message),
        }
    }

    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            AuthOutcome::Success { redirect_to } => Some(*redirect_to),
            AuthOutcome::Error { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_establish_and_end() {
        let mut session = Session::default();
        assert!(!session.is_authenticated());

        session.establish(Identity::new(json!({"id": 1})).unwrap());
        assert!(session.is_authenticated());
        assert_eq!(session.current_user().unwrap().field("id"), Some(&json!(1)));

        session.end();
        assert!(session.current_user().is_none());
    }

    #[test]
    fn test_redirect_paths() {
        assert_eq!(Redirect::Landing.path(), "/");
        assert_eq!(Redirect::Profile.path(), "/profile");
        assert_eq!(Redirect::RegistrationComplete.path(), "/success");
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = AuthOutcome::success(Redirect::Profile);
        assert!(ok.is_success());
        assert_eq!(ok.error(), None);
        assert_eq!(ok.redirect(), Some(Redirect::Profile));

        let err = AuthOutcome::failure("Login failed");
        assert!(!err.is_success());
        assert_eq!(err.error(), Some("Login failed"));
        assert_eq!(err.redirect(), None);
    }
}
