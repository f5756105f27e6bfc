//! Front controller dispatch
//!
//! Decides the view for one request from the decoded action, the session
//! record and, for `logonAction`, the credential lookup. The caller owns the
//! session; dispatch returns the record it should keep.

use std::sync::Arc;

use tracing::info;

use crate::{
    action::Action,
    error::ControlResult,
    models::{Credentials, LoggedInUser, SessionRecord},
    verifier::{CredentialVerifier, Verification},
    view::View,
};

/// Result of dispatching one request
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub view: View,
    pub session: SessionRecord,
    /// Credentials were submitted by this request and rejected
    pub login_failed: bool,
}

#[derive(Clone)]
pub struct FrontController {
    verifier: Arc<dyn CredentialVerifier>,
}

impl FrontController {
    pub fn new(verifier: Arc<dyn CredentialVerifier>) -> Self {
        Self { verifier }
    }

    /// Select the view for `action`.
    ///
    /// An already active user is sent home whatever the action, including a
    /// repeated `logonAction`, whose credentials are then ignored.
    /// `credentials` is only read for `logonAction`; `None` counts as two
    /// empty fields.
    pub async fn dispatch(
        &self,
        action: &Action,
        session: SessionRecord,
        credentials: Option<Credentials>,
    ) -> ControlResult<Dispatch> {
        if session.is_authenticated() {
            return Ok(Dispatch {
                view: View::Home,
                session,
                login_failed: false,
            });
        }

        match action {
            Action::LogonAction => {
                let credentials = credentials.unwrap_or_default();
                let candidate = LoggedInUser::candidate(&credentials);

                let user = match self.verifier.verify(&credentials).await? {
                    Verification::Verified(profile) => {
                        info!("User {} logged in", candidate.user_id);
                        candidate.activate(profile)
                    }
                    Verification::Rejected => {
                        info!("Login rejected for user {:?}", candidate.user_id);
                        candidate
                    }
                };

                let (view, login_failed) = if user.active {
                    (View::Home, false)
                } else {
                    (View::Logon, true)
                };
                Ok(Dispatch {
                    view,
                    session: session.replace_user(user),
                    login_failed,
                })
            }
            Action::Logon | Action::Home | Action::Unknown(_) => Ok(Dispatch {
                view: View::Logon,
                session,
                login_failed: false,
            }),
        }
    }
}
