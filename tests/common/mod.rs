#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use pimovie::player::{
    ExitCallback, Launch, PlayerProcess, ProcessError, ProcessHost, Session, SessionConfig,
};

pub const KILL_NAME: &str = "/usr/bin/omxplayer.bin";

#[derive(Default)]
pub struct Recorded {
    pub spawns: Vec<Launch>,
    pub writes: Vec<Vec<u8>>,
    pub kills: usize,
    pub killed_names: Vec<String>,
    exits: Vec<Option<ExitCallback>>,
}

/// Process host that never starts anything. Records every call and lets the
/// test decide when a "process" exits.
#[derive(Default)]
pub struct FakeHost {
    recorded: Arc<Mutex<Recorded>>,
    fail_spawn: bool,
    fail_kill: bool,
    fail_write: bool,
}

impl FakeHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_spawn() -> Arc<Self> {
        Arc::new(Self { fail_spawn: true, ..Self::default() })
    }

    /// Kill signals are "lost": the handle reports failure.
    pub fn failing_kill() -> Arc<Self> {
        Arc::new(Self { fail_kill: true, ..Self::default() })
    }

    /// Every stdin write fails as if the player had already exited.
    pub fn failing_write() -> Arc<Self> {
        Arc::new(Self { fail_write: true, ..Self::default() })
    }

    pub fn spawns(&self) -> Vec<Launch> {
        self.recorded.lock().unwrap().spawns.clone()
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.recorded.lock().unwrap().writes.clone()
    }

    pub fn kills(&self) -> usize {
        self.recorded.lock().unwrap().kills
    }

    pub fn killed_names(&self) -> Vec<String> {
        self.recorded.lock().unwrap().killed_names.clone()
    }

    /// Simulate the `index`-th spawned process exiting with `code`.
    pub fn exit(&self, index: usize, code: Option<i32>) {
        let callback = self.recorded.lock().unwrap().exits[index].take();
        if let Some(callback) = callback {
            callback(code);
        }
    }
}

struct FakeProcess {
    recorded: Arc<Mutex<Recorded>>,
    fail_kill: bool,
    fail_write: bool,
}

#[async_trait]
impl PlayerProcess for FakeProcess {
    async fn write_stdin(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.fail_write {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "broken pipe"));
        }
        self.recorded.lock().unwrap().writes.push(bytes.to_vec());
        Ok(())
    }

    fn kill(&mut self) -> io::Result<()> {
        self.recorded.lock().unwrap().kills += 1;
        if self.fail_kill {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "kill refused"));
        }
        Ok(())
    }

    fn id(&self) -> Option<u32> {
        None
    }
}

impl ProcessHost for FakeHost {
    fn spawn(
        &self,
        launch: &Launch,
        on_exit: ExitCallback,
    ) -> Result<Box<dyn PlayerProcess>, ProcessError> {
        if self.fail_spawn {
            return Err(ProcessError::SpawnFailed {
                program: launch.program.clone(),
                source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
            });
        }
        let mut recorded = self.recorded.lock().unwrap();
        recorded.spawns.push(launch.clone());
        recorded.exits.push(Some(on_exit));
        Ok(Box::new(FakeProcess {
            recorded: Arc::clone(&self.recorded),
            fail_kill: self.fail_kill,
            fail_write: self.fail_write,
        }))
    }

    fn kill_by_name(&self, name: &str) {
        self.recorded.lock().unwrap().killed_names.push(name.to_string());
    }
}

/// Temporary media directory holding empty files with the given names.
pub fn media_dir(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for file in files {
        std::fs::write(dir.path().join(file), b"").unwrap();
    }
    dir
}

pub fn session_config(media_dir: &Path) -> SessionConfig {
    SessionConfig {
        media_dir: media_dir.to_path_buf(),
        player: "omxplayer".to_string(),
        player_args: vec!["-o".to_string(), "hdmi".to_string()],
        kill_name: KILL_NAME.to_string(),
    }
}

pub fn spawn_session(host: &Arc<FakeHost>, media_dir: &Path) -> Session {
    Session::spawn(session_config(media_dir), Arc::clone(host) as Arc<dyn ProcessHost>)
}
