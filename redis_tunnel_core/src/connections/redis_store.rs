use redis::{IntoConnectionInfo, Value};

use super::errors::ConnectionError;
use super::store::{StoreConnector, StoreHandle};

/// [`StoreConnector`] backed by the synchronous `redis` client.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisStore;

impl StoreConnector for RedisStore {
    type Handle = RedisHandle;

    fn open(
        &self,
        host: &str,
        port: u16,
        password: &str,
        db: u32,
    ) -> Result<RedisHandle, ConnectionError> {
        let mut info = (host.to_string(), port).into_connection_info()?;
        info.redis.db = i64::from(db);
        if !password.is_empty() {
            info.redis.password = Some(password.to_string());
        }
        let client = redis::Client::open(info)?;
        let connection = client.get_connection()?;
        Ok(RedisHandle {
            connection,
            db,
        })
    }
}

/// A connected Redis client handed to the success callback.
pub struct RedisHandle {
    connection: redis::Connection,
    db: u32,
}

impl RedisHandle {
    /// Database index the connection selected.
    pub fn db(&self) -> u32 {
        self.db
    }

    /// Borrow the underlying connection for typed `redis` commands.
    pub fn connection(&mut self) -> &mut redis::Connection {
        &mut self.connection
    }

    /// Run one command given as words, e.g. `["SET", "k", "v"]`.
    pub fn execute<S: AsRef<str>>(&mut self, words: &[S]) -> Result<Value, ConnectionError> {
        let (name, args) = words
            .split_first()
            .ok_or_else(|| ConnectionError::Other("empty command".into()))?;
        let mut cmd = redis::cmd(name.as_ref());
        for arg in args {
            cmd.arg(arg.as_ref());
        }
        Ok(cmd.query(&mut self.connection)?)
    }
}

impl StoreHandle for RedisHandle {
    fn probe_random_key(&mut self) -> Result<(), ConnectionError> {
        redis::cmd("RANDOMKEY").query::<Option<Vec<u8>>>(&mut self.connection)?;
        Ok(())
    }
}
