//! Views the controller forwards to
//!
//! Forwarding renders the selected template into the response of the current
//! request. The client is never redirected, so its URL keeps naming the
//! action it asked for.

use axum::response::Html;
use minijinja::{Environment, context};

use crate::{error::ControlResult, models::SessionRecord};

pub const LOGON_VIEW: &str = "/user/logon.html";
pub const HOME_VIEW: &str = "/user/home.html";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Shown to clients that are not logged in
    Logon,
    Home,
}

impl View {
    pub fn path(self) -> &'static str {
        match self {
            View::Logon => LOGON_VIEW,
            View::Home => HOME_VIEW,
        }
    }

    fn template_name(self) -> &'static str {
        self.path().trim_start_matches('/')
    }
}

/// Template environment holding both views
pub struct ViewRenderer {
    env: Environment<'static>,
}

impl ViewRenderer {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(
            View::Logon.template_name(),
            include_str!("../templates/user/logon.html"),
        )?;
        env.add_template(
            View::Home.template_name(),
            include_str!("../templates/user/home.html"),
        )?;
        Ok(Self { env })
    }

    /// Render `view` for the given session
    ///
    /// `login_failed` shows the rejection notice on the logon view.
    pub fn forward(
        &self,
        view: View,
        session: &SessionRecord,
        login_failed: bool,
    ) -> ControlResult<Html<String>> {
        let template = self.env.get_template(view.template_name())?;
        let body = template.render(context! {
            view => view.path(),
            user => &session.user,
            login_failed => login_failed,
        })?;
        Ok(Html(body))
    }
}
