//! Deterministic **in‑process stand‑ins** for the store, SSH and logger
//! capabilities used by `redis_tunnel_core::Connector`.
//!
//! Every fake shares one [`EventLog`], so tests can assert both *what*
//! happened and *in which order* (e.g. that the tunnel is torn down only
//! after the success callback returned).

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use log::Level;
use redis_tunnel_core::connections::ssh::{ForwardRule, SshSession, SshTarget, SshTransport};
use redis_tunnel_core::connections::store::{StoreConnector, StoreHandle};
use redis_tunnel_core::core::clock::FixedClock;
use redis_tunnel_core::core::connector::{ConnectCallbacks, Logger};
use redis_tunnel_core::{ConnectionError, Connector};

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().unwrap().push(event.into());
    }

    pub fn all(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.all().iter().filter(|e| e.starts_with(prefix)).count()
    }
}

// ── store ──────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreMode {
    Healthy,
    OpenFails,
    ProbeFails,
}

#[derive(Clone)]
pub struct FakeStore {
    pub events: EventLog,
    pub mode: StoreMode,
}

pub struct FakeHandle {
    pub host: String,
    pub port: u16,
    pub password: String,
    pub db: u32,
    events: EventLog,
    fail_probe: bool,
}

impl StoreConnector for FakeStore {
    type Handle = FakeHandle;

    fn open(
        &self,
        host: &str,
        port: u16,
        password: &str,
        db: u32,
    ) -> Result<FakeHandle, ConnectionError> {
        self.events.push(format!("store-open {host}:{port}/{db}"));
        if self.mode == StoreMode::OpenFails {
            return Err(ConnectionError::StoreError("Connection refused".into()));
        }
        Ok(FakeHandle {
            host: host.to_string(),
            port,
            password: password.to_string(),
            db,
            events: self.events.clone(),
            fail_probe: self.mode == StoreMode::ProbeFails,
        })
    }
}

impl StoreHandle for FakeHandle {
    fn probe_random_key(&mut self) -> Result<(), ConnectionError> {
        self.events.push("probe");
        if self.fail_probe {
            return Err(ConnectionError::StoreError(
                "NOAUTH Authentication required.".into(),
            ));
        }
        Ok(())
    }
}

// ── ssh ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SshMode {
    Healthy,
    ConnectFails,
    NotConnected,
    ForwardFails,
}

#[derive(Clone)]
pub struct FakeSsh {
    pub events: EventLog,
    pub mode: SshMode,
    pub live_sessions: Arc<Mutex<usize>>,
    pub forward_rules: Arc<Mutex<Vec<ForwardRule>>>,
}

pub struct FakeSession {
    events: EventLog,
    mode: SshMode,
    connected: bool,
    live_sessions: Arc<Mutex<usize>>,
    forward_rules: Arc<Mutex<Vec<ForwardRule>>>,
}

pub struct FakeForward {
    events: EventLog,
}

impl FakeSsh {
    pub fn live(&self) -> usize {
        *self.live_sessions.lock().unwrap()
    }

    pub fn rules(&self) -> Vec<ForwardRule> {
        self.forward_rules.lock().unwrap().clone()
    }
}

impl SshTransport for FakeSsh {
    type Session = FakeSession;

    fn session(&self, target: &SshTarget<'_>) -> FakeSession {
        self.events.push(format!(
            "ssh-session {}@{}:{}",
            target.user, target.host, target.port
        ));
        *self.live_sessions.lock().unwrap() += 1;
        FakeSession {
            events: self.events.clone(),
            mode: self.mode,
            connected: false,
            live_sessions: self.live_sessions.clone(),
            forward_rules: self.forward_rules.clone(),
        }
    }
}

impl SshSession for FakeSession {
    type Forward = FakeForward;

    fn connect(&mut self) -> Result<(), ConnectionError> {
        self.events.push("ssh-connect");
        match self.mode {
            SshMode::ConnectFails => Err(ConnectionError::SshError(
                "Connection refused".into(),
            )),
            SshMode::NotConnected => Ok(()),
            _ => {
                self.connected = true;
                Ok(())
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn forward_local(&mut self, rule: &ForwardRule) -> Result<FakeForward, ConnectionError> {
        if self.mode == SshMode::ForwardFails {
            return Err(ConnectionError::ForwardError(
                "cannot listen on 127.0.0.1:6379: Address already in use".into(),
            ));
        }
        self.forward_rules.lock().unwrap().push(rule.clone());
        self.events.push(format!(
            "forward-start {}:{}->{}:{}",
            rule.local_addr, rule.local_port, rule.remote_addr, rule.remote_port
        ));
        Ok(FakeForward {
            events: self.events.clone(),
        })
    }
}

impl Drop for FakeForward {
    fn drop(&mut self) {
        self.events.push("forward-stop");
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.events.push("ssh-close");
        *self.live_sessions.lock().unwrap() -= 1;
    }
}

// ── logger & callbacks ─────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingLogger(Arc<Mutex<Vec<(Level, String)>>>);

impl RecordingLogger {
    pub fn lines(&self) -> Vec<(Level, String)> {
        self.0.lock().unwrap().clone()
    }

    pub fn at(&self, level: Level) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m)
            .collect()
    }
}

impl Logger for RecordingLogger {
    fn log(&self, level: Level, message: &str) {
        self.0.lock().unwrap().push((level, message.to_string()));
    }
}

/// Counts outcomes and keeps the last handle for inspection.
pub struct Recorder {
    events: EventLog,
    pub successes: usize,
    pub errors: usize,
    pub handle: Option<FakeHandle>,
}

impl Recorder {
    pub fn new(events: &EventLog) -> Self {
        Self {
            events: events.clone(),
            successes: 0,
            errors: 0,
            handle: None,
        }
    }
}

impl ConnectCallbacks<FakeHandle> for Recorder {
    fn on_success(&mut self, handle: FakeHandle) {
        self.events.push("on_success");
        self.successes += 1;
        self.handle = Some(handle);
    }

    fn on_error(&mut self) {
        self.events.push("on_error");
        self.errors += 1;
    }
}

// ── harness ────────────────────────────────────────────────────────────────

pub struct Harness {
    pub events: EventLog,
    pub ssh: FakeSsh,
    pub logger: RecordingLogger,
    pub connector: Connector<FakeStore, FakeSsh, RecordingLogger, FixedClock>,
}

pub fn harness(store_mode: StoreMode, ssh_mode: SshMode) -> Harness {
    //   Logs will appear only when you run with `-- --nocapture`
    //   or when the test fails.
    let _ = env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();

    let events = EventLog::default();
    let ssh = FakeSsh {
        events: events.clone(),
        mode: ssh_mode,
        live_sessions: Arc::new(Mutex::new(0)),
        forward_rules: Arc::new(Mutex::new(Vec::new())),
    };
    let store = FakeStore {
        events: events.clone(),
        mode: store_mode,
    };
    let logger = RecordingLogger::default();
    let connector = Connector::new(store, ssh.clone())
        .with_logger(logger.clone())
        .with_clock(FixedClock::default());

    Harness {
        events,
        ssh,
        logger,
        connector,
    }
}
