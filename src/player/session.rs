//! The playback session: one actor task owns the player process, every
//! mutation is a message to it.
//!
//! `play`, `stop` and `send_command` are handled one at a time by the actor,
//! which makes the "already playing" check and the spawn a single step.
//! Process exit arrives on a second channel consumed by the same loop.
//! Readers get the current movie from a `watch` snapshot without a round trip;
//! observers follow every transition on a broadcast channel.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, watch};

use super::catalog;
use super::commands;
use super::outcome::Outcome;
use super::process::{Launch, ProcessController, ProcessError, ProcessHost};

pub const API_VERSION: &str = "Raspberry Pi Movie Player API 2.0";

const REQUEST_QUEUE: usize = 32;
const EVENT_BUFFER: usize = 32;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("cannot read media directory {}: {source}", path.display())]
    Catalog {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Process(#[from] ProcessError),
    #[error("playback session is no longer running")]
    Closed,
}

/// Where the movies are and how to play them.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub media_dir: PathBuf,
    pub player: String,
    pub player_args: Vec<String>,
    /// Process name passed to `killall` on stop.
    pub kill_name: String,
}

impl SessionConfig {
    fn launch(&self, movie: &str) -> Launch {
        let mut args = self.player_args.clone();
        args.push(self.media_dir.join(movie).to_string_lossy().into_owned());
        Launch {
            program: self.player.clone(),
            args,
            cwd: self.media_dir.clone(),
        }
    }
}

type Reply = oneshot::Sender<Result<Outcome, SessionError>>;

enum Request {
    Play { movie: String, reply: Reply },
    Stop { reply: oneshot::Sender<Outcome> },
    Command { name: String, reply: Reply },
}

struct ProcessExit {
    generation: u64,
    code: Option<i32>,
}

/// A change of the current movie, in the order the session made it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started(String),
    /// Stopped on request.
    Stopped(String),
    /// The player went away on its own; `code` is `None` if it was signalled
    /// or its status could not be collected.
    Exited { movie: String, code: Option<i32> },
}

impl SessionEvent {
    /// True when the session is idle after this event.
    pub fn is_idle(&self) -> bool {
        !matches!(self, SessionEvent::Started(_))
    }
}

/// Handle to the playback session. Cheap to clone; every transport handler
/// gets its own copy.
#[derive(Clone)]
pub struct Session {
    requests: mpsc::Sender<Request>,
    current: watch::Receiver<Option<String>>,
    events: broadcast::Sender<SessionEvent>,
    media_dir: Arc<Path>,
}

impl Session {
    /// Start the session actor on the current tokio runtime.
    pub fn spawn(config: SessionConfig, host: Arc<dyn ProcessHost>) -> Self {
        let (requests_tx, requests_rx) = mpsc::channel(REQUEST_QUEUE);
        let (exits_tx, exits_rx) = mpsc::unbounded_channel();
        let (current_tx, current_rx) = watch::channel(None);
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        let media_dir: Arc<Path> = Arc::from(config.media_dir.as_path());

        let actor = SessionActor {
            controller: ProcessController::new(host, config.kill_name.clone()),
            config,
            exits: exits_tx,
            current: current_tx,
            events: events.clone(),
        };
        tokio::spawn(actor.run(requests_rx, exits_rx));

        Self {
            requests: requests_tx,
            current: current_rx,
            events,
            media_dir,
        }
    }

    /// Playable files of the media directory, sorted.
    pub async fn list_movies(&self) -> Result<Vec<String>, SessionError> {
        read_catalog(&self.media_dir).await
    }

    pub async fn play(&self, movie: &str) -> Result<Outcome, SessionError> {
        let movie = movie.to_string();
        self.request(|reply| Request::Play { movie, reply }).await?
    }

    pub async fn stop(&self) -> Result<Outcome, SessionError> {
        self.request(|reply| Request::Stop { reply }).await
    }

    pub async fn send_command(&self, name: &str) -> Result<Outcome, SessionError> {
        let name = name.to_string();
        self.request(|reply| Request::Command { name, reply }).await?
    }

    pub fn current_movie(&self) -> Outcome {
        match self.current.borrow().as_deref() {
            Some(movie) => Outcome::Current(movie.to_string()),
            None => Outcome::NoMovie,
        }
    }

    pub fn version(&self) -> &'static str {
        API_VERSION
    }

    /// Every transition from now on. A receiver that falls more than
    /// `EVENT_BUFFER` events behind gets `Lagged` and should resync from
    /// [`Session::current_movie`].
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> Request,
    ) -> Result<T, SessionError> {
        let (reply, response) = oneshot::channel();
        self.requests
            .send(make(reply))
            .await
            .map_err(|_| SessionError::Closed)?;
        response.await.map_err(|_| SessionError::Closed)
    }
}

async fn read_catalog(dir: &Path) -> Result<Vec<String>, SessionError> {
    catalog::read_movies(dir.to_path_buf())
        .await
        .map_err(|source| SessionError::Catalog {
            path: dir.to_path_buf(),
            source,
        })
}

struct SessionActor {
    config: SessionConfig,
    controller: ProcessController,
    exits: mpsc::UnboundedSender<ProcessExit>,
    current: watch::Sender<Option<String>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionActor {
    async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        mut exits: mpsc::UnboundedReceiver<ProcessExit>,
    ) {
        loop {
            // Exits first: a request queued after the player died must see it gone.
            tokio::select! {
                biased;
                Some(exit) = exits.recv() => self.process_exited(exit),
                request = requests.recv() => match request {
                    Some(request) => self.handle(request).await,
                    None => break,
                },
            }
        }

        // Every handle is gone; do not leave the player running unowned.
        if let Some(movie) = self.controller.terminate() {
            tracing::info!("Session closed, stopped {}", movie);
        }
    }

    async fn handle(&mut self, request: Request) {
        // A dropped reply receiver only means the caller went away.
        match request {
            Request::Play { movie, reply } => {
                let result = self.play(movie).await;
                let _ = reply.send(result);
            }
            Request::Stop { reply } => {
                let _ = reply.send(self.stop());
            }
            Request::Command { name, reply } => {
                let result = self.send_command(name).await;
                let _ = reply.send(result);
            }
        }
    }

    async fn play(&mut self, movie: String) -> Result<Outcome, SessionError> {
        if let Some(current) = self.controller.current() {
            tracing::debug!("Refusing to play {}: {} is playing", movie, current);
            return Ok(Outcome::AlreadyPlaying(current.to_string()));
        }

        // The listing is not re-checked at spawn time; a file removed in
        // between is handed to the player as is.
        let movies = read_catalog(&self.config.media_dir).await?;
        if !movies.contains(&movie) {
            tracing::debug!("Refusing to play {}: not in catalog", movie);
            return Ok(Outcome::InvalidMovie);
        }

        let launch = self.config.launch(&movie);
        let exits = self.exits.clone();
        self.controller.start(&movie, &launch, move |generation, code| {
            let _ = exits.send(ProcessExit { generation, code });
        })?;
        tracing::info!("Playing {}", movie);
        self.transition(SessionEvent::Started(movie.clone()));
        Ok(Outcome::Started(movie))
    }

    fn stop(&mut self) -> Outcome {
        match self.controller.terminate() {
            Some(movie) => {
                tracing::info!("Stopped {}", movie);
                self.transition(SessionEvent::Stopped(movie));
                Outcome::Stopped
            }
            None => Outcome::NoMovie,
        }
    }

    async fn send_command(&mut self, name: String) -> Result<Outcome, SessionError> {
        if !self.controller.is_active() {
            return Ok(Outcome::NoMovie);
        }
        let Some(keys) = commands::lookup(&name) else {
            tracing::debug!("Unknown command {:?}", name);
            return Ok(Outcome::InvalidCommand(commands::valid_commands()));
        };
        match self.controller.write(keys).await {
            Ok(()) => {
                tracing::debug!("Sent {} to player", name);
                Ok(Outcome::CommandAccepted(name))
            }
            // The player died and its exit has not been reported yet.
            Err(ProcessError::Write(e)) if e.kind() == io::ErrorKind::BrokenPipe => {
                if let Some(movie) = self.controller.release() {
                    tracing::info!("Player for {} is gone: {}", movie, e);
                    self.transition(SessionEvent::Exited { movie, code: None });
                }
                Ok(Outcome::NoMovie)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn process_exited(&mut self, exit: ProcessExit) {
        match self.controller.exited(exit.generation) {
            Some(movie) => {
                tracing::info!("Player for {} exited with code {:?}", movie, exit.code);
                self.transition(SessionEvent::Exited {
                    movie,
                    code: exit.code,
                });
            }
            None => tracing::debug!(
                "Ignoring exit of earlier player (generation {}, code {:?})",
                exit.generation,
                exit.code
            ),
        }
    }

    /// Update the snapshot, then tell observers. Receivers of the event
    /// always read a snapshot at least as new as the event.
    fn transition(&self, event: SessionEvent) {
        let current = self.controller.current().map(str::to_string);
        self.current.send_replace(current);
        let _ = self.events.send(event);
    }
}
