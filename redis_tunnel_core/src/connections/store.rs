use super::errors::ConnectionError;

/// Opens clients for the key-value store.
///
/// `open` only has to produce a client object; whether a socket is actually
/// established is up to the implementation. Reachability is decided by
/// [`StoreHandle::probe_random_key`].
pub trait StoreConnector {
    type Handle: StoreHandle;

    fn open(
        &self,
        host: &str,
        port: u16,
        password: &str,
        db: u32,
    ) -> Result<Self::Handle, ConnectionError>;
}

/// A live, caller-owned store client.
pub trait StoreHandle {
    /// Cheap read-only round trip used as a liveness check. The fetched key is discarded.
    fn probe_random_key(&mut self) -> Result<(), ConnectionError>;
}
