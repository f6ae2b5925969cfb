//! Player process spawning and control.

use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::oneshot;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to spawn {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("a player process is already running")]
    AlreadyRunning,
    #[error("no player process is running")]
    NoProcess,
    #[error("failed to write to player stdin: {0}")]
    Write(#[from] io::Error),
}

/// Invoked once with the exit code when the player terminates.
/// `None` when the process was ended by a signal or its status is unknown.
pub type ExitCallback = Box<dyn FnOnce(Option<i32>) + Send + 'static>;

/// What to run for a movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// A live player process.
#[async_trait]
pub trait PlayerProcess: Send {
    /// Write raw bytes to the process's standard input.
    async fn write_stdin(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Ask the process to die. Does not wait for it.
    fn kill(&mut self) -> io::Result<()>;

    fn id(&self) -> Option<u32>;
}

/// The operating system side of process control.
pub trait ProcessHost: Send + Sync {
    /// Start `launch` with a writable stdin. `on_exit` fires once the process ends,
    /// whether on its own or after [`PlayerProcess::kill`].
    fn spawn(
        &self,
        launch: &Launch,
        on_exit: ExitCallback,
    ) -> Result<Box<dyn PlayerProcess>, ProcessError>;

    /// Best-effort termination of every process called `name`.
    fn kill_by_name(&self, name: &str);
}

/// [`ProcessHost`] backed by `tokio::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemHost;

struct SystemProcess {
    pid: Option<u32>,
    stdin: Option<ChildStdin>,
    kill_tx: Option<oneshot::Sender<()>>,
}

#[async_trait]
impl PlayerProcess for SystemProcess {
    async fn write_stdin(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "player stdin is closed"))?;
        stdin.write_all(bytes).await?;
        stdin.flush().await
    }

    fn kill(&mut self) -> io::Result<()> {
        // Closing stdin first lets a player that is still reading shut down cleanly.
        self.stdin = None;
        let delivered = self
            .kill_tx
            .take()
            .is_some_and(|tx| tx.send(()).is_ok());
        if !delivered {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "player process already exited",
            ));
        }
        Ok(())
    }

    fn id(&self) -> Option<u32> {
        self.pid
    }
}

/// Wait for the child to exit, killing it first if asked to, then report the exit code.
async fn supervise(mut child: Child, kill_rx: oneshot::Receiver<()>, on_exit: ExitCallback) {
    let exited = tokio::select! {
        status = child.wait() => Some(status),
        Ok(()) = kill_rx => None,
    };
    let status = match exited {
        Some(status) => status,
        None => {
            if let Err(e) = child.start_kill() {
                tracing::debug!("Player kill signal failed: {}", e);
            }
            child.wait().await
        }
    };
    let code = match status {
        Ok(status) => status.code(),
        Err(e) => {
            tracing::warn!("Failed to collect player exit status: {}", e);
            None
        }
    };
    on_exit(code);
}

impl ProcessHost for SystemHost {
    fn spawn(
        &self,
        launch: &Launch,
        on_exit: ExitCallback,
    ) -> Result<Box<dyn PlayerProcess>, ProcessError> {
        tracing::info!("Spawning {} {:?} in {}", launch.program, launch.args, launch.cwd.display());

        let mut child = Command::new(&launch.program)
            .args(&launch.args)
            .current_dir(&launch.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                program: launch.program.clone(),
                source,
            })?;

        let pid = child.id();
        let stdin = child.stdin.take();
        let (kill_tx, kill_rx) = oneshot::channel();
        tokio::spawn(supervise(child, kill_rx, on_exit));

        Ok(Box::new(SystemProcess {
            pid,
            stdin,
            kill_tx: Some(kill_tx),
        }))
    }

    fn kill_by_name(&self, name: &str) {
        let spawned = Command::new("killall")
            .arg(name)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn();
        let mut child = match spawned {
            Ok(child) => child,
            Err(e) => {
                tracing::warn!("Failed to run killall {}: {}", name, e);
                return;
            }
        };
        let name = name.to_string();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) => tracing::debug!("killall {} exited with {}", name, status),
                Err(e) => tracing::warn!("killall {} failed: {}", name, e),
            }
        });
    }
}

struct Running {
    movie: String,
    process: Box<dyn PlayerProcess>,
    generation: u64,
}

/// Owns zero or one player process together with the movie it plays.
///
/// The movie name and the process handle live in one `Option`, so one is
/// never present without the other.
pub struct ProcessController {
    host: Arc<dyn ProcessHost>,
    kill_name: String,
    running: Option<Running>,
    next_generation: u64,
}

impl ProcessController {
    pub fn new(host: Arc<dyn ProcessHost>, kill_name: impl Into<String>) -> Self {
        Self {
            host,
            kill_name: kill_name.into(),
            running: None,
            next_generation: 0,
        }
    }

    /// Spawn the player for `movie`.
    ///
    /// `on_exit` receives the generation returned here together with the exit
    /// code, so a late notification from an earlier process can be told apart.
    pub fn start<F>(&mut self, movie: &str, launch: &Launch, on_exit: F) -> Result<u64, ProcessError>
    where
        F: FnOnce(u64, Option<i32>) + Send + 'static,
    {
        if self.running.is_some() {
            return Err(ProcessError::AlreadyRunning);
        }
        let generation = self.next_generation;
        let process = self
            .host
            .spawn(launch, Box::new(move |code| on_exit(generation, code)))?;
        self.next_generation += 1;
        tracing::debug!("Player for {} started (pid {:?})", movie, process.id());
        self.running = Some(Running {
            movie: movie.to_string(),
            process,
            generation,
        });
        Ok(generation)
    }

    pub async fn write(&mut self, bytes: &[u8]) -> Result<(), ProcessError> {
        let running = self.running.as_mut().ok_or(ProcessError::NoProcess)?;
        running.process.write_stdin(bytes).await?;
        Ok(())
    }

    /// Kill the player by name and through its handle, then forget it.
    ///
    /// Ownership is released even when neither kill worked; nothing waits for
    /// the process to actually die. Returns the movie that was playing.
    pub fn terminate(&mut self) -> Option<String> {
        let mut running = self.running.take()?;
        self.host.kill_by_name(&self.kill_name);
        if let Err(e) = running.process.kill() {
            tracing::warn!("Failed to kill player for {}: {}", running.movie, e);
        }
        Some(running.movie)
    }

    /// Forget the player without signalling it, for a process already known
    /// to be dead. Its exit notification, if still to come, is then stale.
    pub fn release(&mut self) -> Option<String> {
        self.running.take().map(|running| running.movie)
    }

    /// Record the exit of the process started as `generation`.
    /// Returns the movie it was playing, or `None` for a stale notification.
    pub fn exited(&mut self, generation: u64) -> Option<String> {
        match &self.running {
            Some(running) if running.generation == generation => {
                self.running.take().map(|running| running.movie)
            }
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.running.is_some()
    }

    pub fn current(&self) -> Option<&str> {
        self.running.as_ref().map(|running| running.movie.as_str())
    }
}
