//! Local port-forwarding on top of an `ssh2::Session`.
//!
//! libssh2 can open `direct-tcpip` channels but has no listener of its own,
//! so [`LocalForward`] binds the local socket and runs a worker thread that
//! accepts clients and pumps bytes between each client and its channel.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, error, info};
use ssh2::{Channel, Session};

use super::ForwardRule;
use crate::connections::errors::ConnectionError;

/// A started forward. Dropping it stops the worker and closes every tunnel.
pub struct LocalForward {
    rule: ForwardRule,
    local_addr: SocketAddr,
    stop_flag: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
}

impl LocalForward {
    /// Bind `rule.local_addr:rule.local_port` and start forwarding through `session`.
    pub fn start(session: Session, rule: &ForwardRule) -> Result<Self, ConnectionError> {
        let listener = TcpListener::bind((rule.local_addr.as_str(), rule.local_port)).map_err(|e| {
            ConnectionError::ForwardError(format!(
                "cannot listen on {}:{}: {}",
                rule.local_addr, rule.local_port, e
            ))
        })?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let stop_flag = Arc::new(AtomicBool::new(false));
        let stop_clone = stop_flag.clone();
        let remote = (rule.remote_addr.clone(), rule.remote_port);

        let worker = thread::Builder::new()
            .name(format!("forward-{}", local_addr.port()))
            .spawn(move || forward_loop(session, listener, remote, stop_clone))?;

        info!(
            "Forwarding {} -> {}:{}",
            local_addr, rule.remote_addr, rule.remote_port
        );

        Ok(Self {
            rule: rule.clone(),
            local_addr,
            stop_flag,
            worker: Some(worker),
        })
    }

    pub fn rule(&self) -> &ForwardRule {
        &self.rule
    }

    /// Address actually bound, useful when the rule asked for port 0.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for LocalForward {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::SeqCst);
        if let Some(jh) = self.worker.take() {
            let _ = jh.join();
        }
        debug!("Forward on {} stopped", self.local_addr);
    }
}

fn forward_loop(
    session: Session,
    listener: TcpListener,
    remote: (String, u16),
    stop_flag: Arc<AtomicBool>,
) {
    let mut tunnels: Vec<Tunnel> = Vec::new();
    let mut buf = [0u8; 16 * 1024];

    while !stop_flag.load(Ordering::SeqCst) {
        let mut busy = false;

        match listener.accept() {
            Ok((stream, peer)) => {
                busy = true;
                match Tunnel::open(&session, stream, &remote) {
                    Ok(tunnel) => {
                        debug!("Tunnel opened for {}", peer);
                        tunnels.push(tunnel);
                    }
                    Err(e) => error!("Cannot open channel to {}:{}: {}", remote.0, remote.1, e),
                }
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => {
                error!("Forward listener error: {}", e);
                break;
            }
        }

        for tunnel in tunnels.iter_mut() {
            busy |= tunnel.pump(&mut buf);
        }
        tunnels.retain(|t| !t.closed);

        if !busy {
            thread::sleep(Duration::from_millis(2));
        }
    }

    for mut tunnel in tunnels {
        let _ = tunnel.channel.close();
    }
}

/// One accepted local client and its `direct-tcpip` channel.
struct Tunnel {
    stream: TcpStream,
    channel: Channel,
    to_remote: Vec<u8>,
    to_local: Vec<u8>,
    local_eof: bool,
    eof: PendingEof,
    closed: bool,
}

/// Outbound half-close. In non-blocking mode `send_eof` may need several tries.
#[derive(Debug, Default)]
struct PendingEof {
    pending: bool,
}

impl PendingEof {
    fn request(&mut self) {
        self.pending = true;
    }

    fn is_pending(&self) -> bool {
        self.pending
    }

    /// Record one `send_eof` attempt. `Ok(true)` once the EOF is out.
    fn attempt(&mut self, result: std::io::Result<()>) -> std::io::Result<bool> {
        match result {
            Ok(()) => {
                self.pending = false;
                Ok(true)
            }
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Tunnel {
    fn open(
        session: &Session,
        stream: TcpStream,
        remote: &(String, u16),
    ) -> Result<Self, ConnectionError> {
        // Channel setup is a request/response exchange; do it blocking, pump non-blocking.
        session.set_blocking(true);
        let channel = session.channel_direct_tcpip(&remote.0, remote.1, None);
        session.set_blocking(false);
        let channel = channel?;

        stream.set_nonblocking(true)?;
        stream.set_nodelay(true).ok();

        Ok(Self {
            stream,
            channel,
            to_remote: Vec::new(),
            to_local: Vec::new(),
            local_eof: false,
            eof: PendingEof::default(),
            closed: false,
        })
    }

    /// Move whatever is ready in either direction. Returns true if any bytes moved.
    fn pump(&mut self, buf: &mut [u8]) -> bool {
        let mut progressed = false;

        // local -> remote
        if self.to_remote.is_empty() && !self.local_eof {
            match self.stream.read(buf) {
                Ok(0) => {
                    self.local_eof = true;
                    self.eof.request();
                    progressed = true;
                }
                Ok(n) => {
                    self.to_remote.extend_from_slice(&buf[..n]);
                    progressed = true;
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => return self.fail("local read", e),
            }
        }
        if !self.to_remote.is_empty() {
            match self.channel.write(&self.to_remote) {
                Ok(n) => {
                    self.to_remote.drain(..n);
                    progressed = true;
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => return self.fail("channel write", e),
            }
        }
        if self.eof.is_pending() && self.to_remote.is_empty() {
            let sent = self.channel.send_eof().map_err(std::io::Error::from);
            match self.eof.attempt(sent) {
                Ok(true) => progressed = true,
                Ok(false) => {}
                Err(e) => return self.fail("channel eof", e),
            }
        }

        // remote -> local
        if self.to_local.is_empty() {
            match self.channel.read(buf) {
                Ok(0) => {
                    if self.channel.eof() {
                        self.closed = true;
                        progressed = true;
                    }
                }
                Ok(n) => {
                    self.to_local.extend_from_slice(&buf[..n]);
                    progressed = true;
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => return self.fail("channel read", e),
            }
        }
        if !self.to_local.is_empty() {
            match self.stream.write(&self.to_local) {
                Ok(n) => {
                    self.to_local.drain(..n);
                    progressed = true;
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {}
                Err(e) => return self.fail("local write", e),
            }
        }

        progressed
    }

    fn fail(&mut self, what: &str, e: std::io::Error) -> bool {
        debug!("Tunnel closed on {}: {}", what, e);
        self.closed = true;
        true
    }
}
