use log::Level;

use crate::connections::ssh::{ForwardRule, SshSession, SshTransport};
use crate::connections::store::{StoreConnector, StoreHandle};
use crate::core::clock::{Clock, Stopwatch, SystemClock};
use crate::core::config::ConnectionConfig;
use crate::core::messages::{Language, Message};

/// Log target used by [`FacadeLogger`].
pub const LOG_TARGET: &str = "redis_tunnel";

/// Sink for the connector's diagnostics.
pub trait Logger {
    fn log(&self, level: Level, message: &str);
}

/// Forwards to the `log` facade under [`LOG_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeLogger;

impl Logger for FacadeLogger {
    fn log(&self, level: Level, message: &str) {
        log::log!(target: LOG_TARGET, level, "{}", message);
    }
}

/// Receives the outcome of [`Connector::connect`]. Exactly one of the two
/// methods is called per `connect`. Both default to doing nothing, so `()`
/// is the "no callbacks" choice.
pub trait ConnectCallbacks<H> {
    fn on_success(&mut self, handle: H) {
        drop(handle);
    }

    fn on_error(&mut self) {}
}

impl<H> ConnectCallbacks<H> for () {}

impl<H, T: ConnectCallbacks<H> + ?Sized> ConnectCallbacks<H> for &mut T {
    fn on_success(&mut self, handle: H) {
        (**self).on_success(handle)
    }

    fn on_error(&mut self) {
        (**self).on_error()
    }
}

/// Closure pair adapter.
pub struct Callbacks<S, E> {
    on_success: Option<S>,
    on_error: Option<E>,
}

impl<S, E> Callbacks<S, E> {
    pub fn new(on_success: S, on_error: E) -> Self {
        Self {
            on_success: Some(on_success),
            on_error: Some(on_error),
        }
    }
}

impl<H, S: FnOnce(H), E: FnOnce()> ConnectCallbacks<H> for Callbacks<S, E> {
    fn on_success(&mut self, handle: H) {
        if let Some(f) = self.on_success.take() {
            f(handle);
        }
    }

    fn on_error(&mut self) {
        if let Some(f) = self.on_error.take() {
            f();
        }
    }
}

/// Only a success closure; errors are logged and otherwise ignored.
pub struct OnSuccess<S>(Option<S>);

impl<S> OnSuccess<S> {
    pub fn new(f: S) -> Self {
        Self(Some(f))
    }
}

impl<H, S: FnOnce(H)> ConnectCallbacks<H> for OnSuccess<S> {
    fn on_success(&mut self, handle: H) {
        if let Some(f) = self.0.take() {
            f(handle);
        }
    }
}

/// Only an error closure; a successful handle is dropped straight away.
pub struct OnError<E>(Option<E>);

impl<E> OnError<E> {
    pub fn new(f: E) -> Self {
        Self(Some(f))
    }
}

impl<H, E: FnOnce()> ConnectCallbacks<H> for OnError<E> {
    fn on_error(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

/// Opens store connections, directly or through an SSH local port-forward.
///
/// Each [`connect`](Connector::connect) is independent; the connector holds no
/// per-call state and can be shared between threads when its parts can.
pub struct Connector<S, T, L = FacadeLogger, C = SystemClock> {
    store: S,
    ssh: T,
    logger: L,
    clock: C,
}

impl<S: StoreConnector, T: SshTransport> Connector<S, T> {
    pub fn new(store: S, ssh: T) -> Self {
        Self {
            store,
            ssh,
            logger: FacadeLogger,
            clock: SystemClock::new(),
        }
    }
}

#[cfg(all(feature = "redis", feature = "ssh"))]
impl Connector<crate::RedisStore, crate::Ssh2Transport> {
    /// Redis over libssh2, logging through the `log` facade.
    pub fn redis() -> Self {
        Self::new(crate::RedisStore, crate::Ssh2Transport)
    }
}

impl<S, T, L, C> Connector<S, T, L, C> {
    pub fn with_logger<L2: Logger>(self, logger: L2) -> Connector<S, T, L2, C> {
        Connector {
            store: self.store,
            ssh: self.ssh,
            logger,
            clock: self.clock,
        }
    }

    pub fn with_clock<C2: Clock>(self, clock: C2) -> Connector<S, T, L, C2> {
        Connector {
            store: self.store,
            ssh: self.ssh,
            logger: self.logger,
            clock,
        }
    }
}

impl<S, T, L, C> Connector<S, T, L, C>
where
    S: StoreConnector,
    T: SshTransport,
    L: Logger,
    C: Clock,
{
    /// Connect according to `config` and report through `callbacks`.
    ///
    /// Failures never propagate: each one is logged and turned into
    /// `on_error()`. On success `on_success` receives the live handle, which
    /// the caller owns from then on.
    ///
    /// With `tunnel_enabled` the SSH session and its forwarded port live only
    /// for the duration of this call. They are released after `on_success`
    /// returns, so a tunneled handle must be used from inside the callback.
    /// Keeping it and using it later talks to a closed local port.
    pub fn connect<Cb>(&self, config: &ConnectionConfig, mut callbacks: Cb)
    where
        Cb: ConnectCallbacks<S::Handle>,
    {
        if let Err(e) = config.validate() {
            self.report(
                Level::Error,
                config.language,
                Message::InvalidConfig { reason: e.reason() },
            );
            callbacks.on_error();
            return;
        }

        if config.tunnel_enabled {
            self.connect_tunneled(config, &mut callbacks);
        } else {
            self.connect_direct(config, &mut callbacks);
        }
    }

    fn connect_direct<Cb>(&self, config: &ConnectionConfig, callbacks: &mut Cb)
    where
        Cb: ConnectCallbacks<S::Handle>,
    {
        let watch = Stopwatch::start(&self.clock);
        self.open_store(config, watch, callbacks);
    }

    fn connect_tunneled<Cb>(&self, config: &ConnectionConfig, callbacks: &mut Cb)
    where
        Cb: ConnectCallbacks<S::Handle>,
    {
        let lang = config.language;
        let mut watch = Stopwatch::start(&self.clock);

        let mut session = self.ssh.session(&config.ssh_target());
        if let Err(e) = session.connect() {
            self.report(
                Level::Warn,
                lang,
                Message::SshUnavailable { reason: e.reason() },
            );
            callbacks.on_error();
            return;
        }
        if !session.is_connected() {
            self.report(Level::Warn, lang, Message::SshNotReady);
            callbacks.on_error();
            return;
        }
        if config.debug {
            self.report(
                Level::Info,
                lang,
                Message::SshConnected {
                    elapsed_ms: watch.elapsed_ms(),
                },
            );
        }

        let rule = ForwardRule::loopback(config.store_port);
        let forward = match session.forward_local(&rule) {
            Ok(forward) => forward,
            Err(e) => {
                self.report(
                    Level::Warn,
                    lang,
                    Message::ForwardUnavailable { reason: e.reason() },
                );
                callbacks.on_error();
                return;
            }
        };

        watch.restart();
        self.open_store(config, watch, callbacks);

        // Teardown happens only after the callbacks above have returned.
        drop(forward);
        drop(session);
    }

    /// Open a client, probe it, and hand it to the caller.
    fn open_store<Cb>(&self, config: &ConnectionConfig, watch: Stopwatch<'_, C>, callbacks: &mut Cb)
    where
        Cb: ConnectCallbacks<S::Handle>,
    {
        let lang = config.language;
        let probed = self
            .store
            .open(
                &config.store_host,
                config.store_port,
                &config.store_password,
                config.store_db,
            )
            .and_then(|mut handle| handle.probe_random_key().map(|()| handle));

        let handle = match probed {
            Ok(handle) => handle,
            Err(e) => {
                self.report(
                    Level::Error,
                    lang,
                    Message::StoreUnavailable { reason: e.reason() },
                );
                callbacks.on_error();
                return;
            }
        };

        if config.debug {
            self.report(
                Level::Info,
                lang,
                Message::StoreConnected {
                    elapsed_ms: watch.elapsed_ms(),
                },
            );
        }

        let task = Stopwatch::start(&self.clock);
        callbacks.on_success(handle);
        if config.debug {
            self.report(
                Level::Info,
                lang,
                Message::TaskCompleted {
                    elapsed_ms: task.elapsed_ms(),
                },
            );
        }
    }

    fn report(&self, level: Level, language: Language, message: Message) {
        self.logger.log(level, &message.render(language));
    }
}
