//! Event channel: a WebSocket carrying JSON frames `{"event": ..., "data": ...}`.
//!
//! Every connection sees each session transition, no matter which client
//! (or the player exiting on its own) caused it.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;

use crate::disk;
use crate::download::DownloadEvent;
use crate::http::reply::Reply;
use crate::http::state::AppState;
use crate::player::{Outcome, SessionError, SessionEvent};

/// Message from client to server.
#[derive(Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    Movies,
    Disk,
    CurrentMovie,
    Download(String),
    Play(String),
    Stop,
    Command(String),
}

/// Message from server to client.
#[derive(Debug, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome,
    Movies(Reply),
    Disk(Reply),
    CurrentMovie(Reply),
    Stop,
    Download(Reply),
    Command(Reply),
    Error(Reply),
}

type WsSink = SplitSink<WebSocket, Message>;

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut session_events = state.session.subscribe();
    let mut downloads = state.downloader.subscribe();

    tracing::info!("Event channel client connected");

    if send_all(&mut sender, greeting(&state).await).await.is_err() {
        return;
    }

    loop {
        let outgoing = tokio::select! {
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => {
                        tracing::debug!("Received {:?}", message);
                        dispatch(&state, message).await
                    }
                    Err(e) => vec![ServerMessage::Error(Reply::failure("invalid_message", e.to_string()))],
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => continue,
                Some(Err(e)) => {
                    tracing::debug!("Event channel error: {}", e);
                    break;
                }
            },
            event = session_events.recv() => match event {
                Ok(event) => session_frames(&event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Event channel missed {} session events", skipped);
                    resync(&state)
                }
                Err(RecvError::Closed) => break,
            },
            event = downloads.recv() => match event {
                Ok(event) => download_frames(&state, &event).await,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("Event channel missed {} download events", skipped);
                    snapshot(&state).await
                }
                Err(RecvError::Closed) => break,
            },
        };

        if send_all(&mut sender, outgoing).await.is_err() {
            break;
        }
    }

    tracing::info!("Event channel client disconnected");
}

/// Frames sent to a client as soon as it connects.
pub async fn greeting(state: &AppState) -> Vec<ServerMessage> {
    let mut frames = vec![ServerMessage::Welcome];
    frames.extend(snapshot(state).await);
    frames
}

/// Frames every client receives for a session transition: `stop` when the
/// session went idle, then the new `current_movie`.
pub fn session_frames(event: &SessionEvent) -> Vec<ServerMessage> {
    match event {
        SessionEvent::Started(movie) => vec![ServerMessage::CurrentMovie(Reply::from(
            &Outcome::Current(movie.clone()),
        ))],
        SessionEvent::Stopped(_) | SessionEvent::Exited { .. } => vec![
            ServerMessage::Stop,
            ServerMessage::CurrentMovie(Reply::from(&Outcome::NoMovie)),
        ],
    }
}

/// Frames every client receives for a download event. A finished download
/// may have added a movie and used disk space, so everything is refreshed.
pub async fn download_frames(state: &AppState, event: &DownloadEvent) -> Vec<ServerMessage> {
    match event {
        DownloadEvent::Started { .. } => Vec::new(),
        DownloadEvent::Finished { .. } => snapshot(state).await,
    }
}

/// Current state after missed transitions.
fn resync(state: &AppState) -> Vec<ServerMessage> {
    let current = state.session.current_movie();
    let mut frames = Vec::with_capacity(2);
    if current == Outcome::NoMovie {
        frames.push(ServerMessage::Stop);
    }
    frames.push(ServerMessage::CurrentMovie(Reply::from(&current)));
    frames
}

/// Replies owed to the client that sent `message`. Session changes it causes
/// reach every client through the session broadcast instead.
pub async fn dispatch(state: &AppState, message: ClientMessage) -> Vec<ServerMessage> {
    match message {
        ClientMessage::Movies => vec![movies(state).await],
        ClientMessage::Disk => vec![disk_space(state).await],
        ClientMessage::CurrentMovie => vec![current_movie(state)],
        ClientMessage::Download(url) => match state.downloader.download(&url) {
            Ok(()) => vec![ServerMessage::Download(Reply::detail("download", url.trim()))],
            Err(e) => vec![ServerMessage::Error(Reply::failure("invalid_url", e.to_string()))],
        },
        ClientMessage::Play(movie) => rejections(state.session.play(&movie).await),
        ClientMessage::Stop => rejections(state.session.stop().await),
        ClientMessage::Command(name) => match state.session.send_command(&name).await {
            Ok(outcome) if !outcome.is_rejection() => {
                vec![ServerMessage::Command(Reply::from(&outcome))]
            }
            other => rejections(other),
        },
    }
}

fn rejections(result: Result<Outcome, SessionError>) -> Vec<ServerMessage> {
    match result {
        Ok(outcome) if outcome.is_rejection() => vec![ServerMessage::Error(Reply::from(&outcome))],
        Ok(_) => Vec::new(),
        Err(e) => vec![ServerMessage::Error(Reply::from(&e))],
    }
}

/// Catalog, disk and session state; sent on connect and after each download.
async fn snapshot(state: &AppState) -> Vec<ServerMessage> {
    vec![movies(state).await, disk_space(state).await, current_movie(state)]
}

async fn movies(state: &AppState) -> ServerMessage {
    match state.session.list_movies().await {
        Ok(movies) => ServerMessage::Movies(Reply::detail("movies", movies)),
        Err(e) => ServerMessage::Error(Reply::from(&e)),
    }
}

fn current_movie(state: &AppState) -> ServerMessage {
    ServerMessage::CurrentMovie(Reply::from(&state.session.current_movie()))
}

async fn disk_space(state: &AppState) -> ServerMessage {
    match disk::available_space(state.session.media_dir()).await {
        Ok(available) => ServerMessage::Disk(Reply::disk(available)),
        Err(e) => ServerMessage::Error(Reply::failure("disk_error", e.to_string())),
    }
}

async fn send_all(sender: &mut WsSink, messages: Vec<ServerMessage>) -> Result<(), axum::Error> {
    for message in messages {
        match serde_json::to_string(&message) {
            Ok(json) => sender.send(Message::Text(json.into())).await?,
            Err(e) => tracing::warn!("Failed to serialize {:?}: {}", message, e),
        }
    }
    Ok(())
}
