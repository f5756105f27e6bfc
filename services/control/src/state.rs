//! Application state shared across handlers

use std::sync::Arc;

use crate::{controller::FrontController, session::SessionManager, view::ViewRenderer};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub controller: FrontController,
    pub sessions: SessionManager,
    pub views: Arc<ViewRenderer>,
}
