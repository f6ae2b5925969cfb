use crate::download::Downloader;
use crate::player::Session;

/// Shared application state injected into all route handlers via axum::extract::State.
/// Both members are handles; cloning them is cheap and they all talk to the same
/// session actor and download broadcaster.
#[derive(Clone)]
pub struct AppState {
    pub session: Session,
    pub downloader: Downloader,
}
