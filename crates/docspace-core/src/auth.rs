//! Login and signup forms.
//!
//! There is no guard against double submission here: every call to
//! [`AuthForms::begin_login`] produces a request.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::api::{Backend, Credentials, LoginGrant, Registration};
use crate::error::ApiError;
use crate::session::{Session, TokenStore};
use crate::state::StatusLine;

pub const LOGIN_SUCCESS_MESSAGE: &str = "Login successful! Redirecting…";
pub const SIGNUP_SUCCESS_MESSAGE: &str = "Account created! You can now log in.";
pub const MISSING_FIELDS_MESSAGE: &str = "Please fill in all fields.";
pub const UNREACHABLE_MESSAGE: &str = "Unable to reach the authentication service.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPanel {
    Login,
    Signup,
}

/// Work the view performs once a fixed delay has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredAction {
    OpenDashboard,
    ShowLogin,
}

pub trait AuthView {
    fn show_panel(&mut self, panel: AuthPanel);
    fn show_message(&mut self, panel: AuthPanel, status: StatusLine);
    fn schedule(&mut self, action: DeferredAction, delay: Duration);
}

fn failure_text(err: &ApiError) -> String {
    if err.is_transport() {
        UNREACHABLE_MESSAGE.to_string()
    } else {
        err.auth_message()
    }
}

fn all_filled(fields: &[&str]) -> bool {
    fields.iter().all(|f| !f.trim().is_empty())
}

pub struct AuthForms {
    visible: AuthPanel,
    store: Arc<dyn TokenStore>,
    redirect_delay: Duration,
}

impl AuthForms {
    pub fn new(store: Arc<dyn TokenStore>, redirect_delay: Duration) -> Self {
        Self {
            visible: AuthPanel::Login,
            store,
            redirect_delay,
        }
    }

    pub fn visible(&self) -> AuthPanel {
        self.visible
    }

    pub fn show_login<V: AuthView + ?Sized>(&mut self, view: &mut V) {
        self.visible = AuthPanel::Login;
        view.show_panel(AuthPanel::Login);
    }

    pub fn show_signup<V: AuthView + ?Sized>(&mut self, view: &mut V) {
        self.visible = AuthPanel::Signup;
        view.show_panel(AuthPanel::Signup);
    }

    pub fn begin_login<V: AuthView + ?Sized>(
        &mut self,
        email: &str,
        password: &str,
        view: &mut V,
    ) -> Option<Credentials> {
        if !all_filled(&[email, password]) {
            view.show_message(AuthPanel::Login, StatusLine::error(MISSING_FIELDS_MESSAGE));
            return None;
        }
        view.show_message(AuthPanel::Login, StatusLine::info("Signing in…"));
        Some(Credentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        })
    }

    pub fn finish_login<V: AuthView + ?Sized>(
        &mut self,
        result: Result<LoginGrant, ApiError>,
        view: &mut V,
    ) {
        let grant = match result {
            Ok(grant) => grant,
            Err(err) => {
                warn!("Login failed: {}", err);
                view.show_message(AuthPanel::Login, StatusLine::error(failure_text(&err)));
                return;
            }
        };

        let session = Session {
            access_token: grant.access_token,
            token_type: grant.token_type,
        };
        if let Err(e) = session.save(self.store.as_ref()) {
            warn!("Could not persist session: {}", e);
            view.show_message(
                AuthPanel::Login,
                StatusLine::error(format!("Could not save session: {}", e)),
            );
            return;
        }

        info!("Login succeeded");
        let message = grant
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| LOGIN_SUCCESS_MESSAGE.to_string());
        view.show_message(AuthPanel::Login, StatusLine::success(message));
        view.schedule(DeferredAction::OpenDashboard, self.redirect_delay);
    }

    /// Returns whether a request was issued.
    pub async fn login<B, V>(&mut self, email: &str, password: &str, backend: &B, view: &mut V) -> bool
    where
        B: Backend + ?Sized,
        V: AuthView + ?Sized,
    {
        let Some(credentials) = self.begin_login(email, password, view) else {
            return false;
        };
        let result = backend.login(&credentials).await;
        self.finish_login(result, view);
        true
    }

    pub fn begin_signup<V: AuthView + ?Sized>(
        &mut self,
        full_name: &str,
        email: &str,
        password: &str,
        department: &str,
        view: &mut V,
    ) -> Option<Registration> {
        if !all_filled(&[full_name, email, password, department]) {
            view.show_message(AuthPanel::Signup, StatusLine::error(MISSING_FIELDS_MESSAGE));
            return None;
        }
        view.show_message(AuthPanel::Signup, StatusLine::info("Creating account…"));
        Some(Registration {
            full_name: full_name.trim().to_string(),
            email: email.trim().to_string(),
            password: password.to_string(),
            department: department.trim().to_string(),
        })
    }

    pub fn finish_signup<V: AuthView + ?Sized>(&mut self, result: Result<(), ApiError>, view: &mut V) {
        match result {
            Ok(()) => {
                info!("Signup succeeded");
                view.show_message(AuthPanel::Signup, StatusLine::success(SIGNUP_SUCCESS_MESSAGE));
                view.schedule(DeferredAction::ShowLogin, self.redirect_delay);
            }
            Err(err) => {
                warn!("Signup failed: {}", err);
                view.show_message(AuthPanel::Signup, StatusLine::error(failure_text(&err)));
            }
        }
    }

    pub async fn signup<B, V>(
        &mut self,
        registration: &Registration,
        backend: &B,
        view: &mut V,
    ) -> bool
    where
        B: Backend + ?Sized,
        V: AuthView + ?Sized,
    {
        let Some(registration) = self.begin_signup(
            &registration.full_name,
            &registration.email,
            &registration.password,
            &registration.department,
            view,
        ) else {
            return false;
        };
        let result = backend.signup(&registration).await;
        self.finish_signup(result, view);
        true
    }
}
