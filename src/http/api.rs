use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use crate::disk;
use crate::http::reply::Reply;
use crate::http::state::AppState;
use crate::player::{Outcome, OutcomeKind, SessionError};

/// HTTP status for a session outcome. Accepted requests are 200, rejections
/// map to the closest client error.
pub fn outcome_status(outcome: &Outcome) -> StatusCode {
    match outcome.kind() {
        OutcomeKind::AlreadyPlaying => StatusCode::CONFLICT,
        OutcomeKind::InvalidMovie | OutcomeKind::NoMovie => StatusCode::NOT_FOUND,
        OutcomeKind::InvalidCommand => StatusCode::BAD_REQUEST,
        OutcomeKind::Started
        | OutcomeKind::Stopped
        | OutcomeKind::CommandAccepted
        | OutcomeKind::Current => StatusCode::OK,
    }
}

fn outcome_response(outcome: Outcome) -> Response {
    (outcome_status(&outcome), Json(Reply::from(&outcome))).into_response()
}

fn error_response(error: &SessionError) -> Response {
    let status = match error {
        SessionError::Catalog { .. } | SessionError::Process(_) => {
            tracing::error!("{}", error);
            StatusCode::INTERNAL_SERVER_ERROR
        }
        SessionError::Closed => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(Reply::from(error))).into_response()
}

fn session_response(result: Result<Outcome, SessionError>) -> Response {
    match result {
        Ok(outcome) => outcome_response(outcome),
        Err(e) => error_response(&e),
    }
}

pub async fn version(State(state): State<AppState>) -> Json<Reply> {
    Json(Reply::detail("version", state.session.version()))
}

pub async fn movies(State(state): State<AppState>) -> Response {
    match state.session.list_movies().await {
        Ok(movies) => Json(Reply::detail("movies", movies)).into_response(),
        Err(e) => error_response(&e),
    }
}

pub async fn current_movie(State(state): State<AppState>) -> Response {
    outcome_response(state.session.current_movie())
}

pub async fn play(State(state): State<AppState>, Path(movie): Path<String>) -> Response {
    session_response(state.session.play(&movie).await)
}

pub async fn stop(State(state): State<AppState>) -> Response {
    session_response(state.session.stop().await)
}

pub async fn command(State(state): State<AppState>, Path(name): Path<String>) -> Response {
    session_response(state.session.send_command(&name).await)
}

pub async fn disk_space(State(state): State<AppState>) -> Response {
    match disk::available_space(state.session.media_dir()).await {
        Ok(available) => Json(Reply::disk(available)).into_response(),
        Err(e) => {
            tracing::warn!("Disk space unavailable: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(Reply::failure("disk_error", e.to_string())),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
}

pub async fn download(
    State(state): State<AppState>,
    Json(request): Json<DownloadRequest>,
) -> Response {
    match state.downloader.download(&request.url) {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(Reply::detail("download", request.url.trim())),
        )
            .into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(Reply::failure("invalid_url", e.to_string())),
        )
            .into_response(),
    }
}
