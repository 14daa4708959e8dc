use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::{info, warn};
use redis_tunnel_core::{
    ConnectCallbacks, ConnectionConfig, ConnectionError, Connector, HostKeyPolicy, Language,
    Profile, ProfileStore, RedisHandle,
};

use super::render::format_value;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "redis-tunnel", version, subcommand_required = true)]
pub struct Args {
    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to Redis, directly or through SSH, and run commands
    Connect {
        /// Start from a saved profile; flags override its fields
        #[arg(long)]
        profile: Option<String>,
        #[command(flatten)]
        settings: Settings,
        /// Command to run once connected, e.g. -c "GET mykey" (repeatable)
        #[arg(short = 'c', long = "command")]
        commands: Vec<String>,
    },
    /// Manage saved connection profiles
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Create a profile, or update an existing one with the given flags
    Save {
        name: String,
        #[command(flatten)]
        settings: Settings,
    },
    /// List saved profiles
    List,
    /// Show one profile (passwords are never printed)
    Show { name: String },
    /// Delete a profile and its stored passwords
    Delete { name: String },
}

/// Connection flags. Unset flags keep the value of the profile (or the default).
#[derive(clap::Args, Debug, Default)]
pub struct Settings {
    /// Redis host (through the tunnel this is usually 127.0.0.1)
    #[arg(long)]
    pub host: Option<String>,
    /// Redis port, also used for both ends of the SSH forward
    #[arg(long)]
    pub port: Option<u16>,
    /// Redis password
    #[arg(long)]
    pub password: Option<String>,
    /// Redis database index
    #[arg(long)]
    pub db: Option<u32>,
    /// Log connection timings
    #[arg(long, conflicts_with = "no_debug")]
    pub debug: bool,
    /// Stop logging connection timings even if the profile enables it
    #[arg(long)]
    pub no_debug: bool,
    /// Language of diagnostic messages: en or zh
    #[arg(long)]
    pub lang: Option<Language>,

    /// Tunnel through SSH
    #[arg(long, conflicts_with = "no_ssh")]
    pub ssh: bool,
    /// Connect directly even if the profile uses SSH
    #[arg(long)]
    pub no_ssh: bool,
    /// SSH server host
    #[arg(long)]
    pub ssh_host: Option<String>,
    /// SSH server port
    #[arg(long)]
    pub ssh_port: Option<u16>,
    /// Username for SSH authentication
    #[arg(long)]
    pub ssh_user: Option<String>,
    /// Password for SSH authentication
    #[arg(long)]
    pub ssh_password: Option<String>,
    /// known_hosts file used to verify the SSH server (default ~/.ssh/known_hosts).
    /// Turns host key verification back on.
    #[arg(long, conflicts_with = "insecure_trust_on_first_use")]
    pub known_hosts: Option<PathBuf>,
    /// Verify the SSH host key against known_hosts even if the profile trusts any key
    #[arg(long, conflicts_with = "insecure_trust_on_first_use")]
    pub verify_host_keys: bool,
    /// Accept any SSH host key without verification. Insecure.
    #[arg(long)]
    pub insecure_trust_on_first_use: bool,
}

impl Settings {
    pub fn apply(self, mut config: ConnectionConfig) -> ConnectionConfig {
        if let Some(host) = self.host {
            config.store_host = host;
        }
        if let Some(port) = self.port {
            config.store_port = port;
        }
        if let Some(password) = self.password {
            config.store_password = password;
        }
        if let Some(db) = self.db {
            config.store_db = db;
        }
        if self.debug {
            config.debug = true;
        }
        if self.no_debug {
            config.debug = false;
        }
        if let Some(lang) = self.lang {
            config.language = lang;
        }

        if self.ssh {
            config.tunnel_enabled = true;
        }
        if self.no_ssh {
            config.tunnel_enabled = false;
        }
        if let Some(host) = self.ssh_host {
            config.ssh_host = host;
        }
        if let Some(port) = self.ssh_port {
            config.ssh_port = port;
        }
        if let Some(user) = self.ssh_user {
            config.ssh_user = user;
        }
        if let Some(password) = self.ssh_password {
            config.ssh_password = password;
        }
        if let Some(path) = self.known_hosts {
            config.known_hosts_file = Some(path);
            config.host_key_policy = HostKeyPolicy::KnownHosts;
        }
        if self.verify_host_keys {
            config.host_key_policy = HostKeyPolicy::KnownHosts;
        }
        if self.insecure_trust_on_first_use {
            config.host_key_policy = HostKeyPolicy::InsecureTrustOnFirstUse;
        }
        config
    }
}

/// Returns `Ok(false)` when the connection or a command failed.
pub fn run_cli(args: Args) -> Result<bool, ConnectionError> {
    match args.command {
        Command::Connect {
            profile,
            settings,
            commands,
        } => run_connect(profile, settings, commands),
        Command::Profile { action } => run_profile(action),
    }
}

fn run_connect(
    profile: Option<String>,
    settings: Settings,
    commands: Vec<String>,
) -> Result<bool, ConnectionError> {
    let base = match profile {
        Some(name) => {
            ProfileStore::new()?
                .load(&name)?
                .ok_or_else(|| ConnectionError::ConfigError(format!("no profile named '{name}'")))?
                .config
        }
        None => ConnectionConfig::default(),
    };
    let config = settings.apply(base);

    if config.tunnel_enabled {
        if config.host_key_policy == HostKeyPolicy::InsecureTrustOnFirstUse {
            warn!("SSH host key verification is disabled for this connection");
        }
        info!(
            "Connecting to Redis {}:{} via SSH {}@{}:{}",
            config.store_host, config.store_port, config.ssh_user, config.ssh_host, config.ssh_port
        );
    } else {
        info!("Connecting to Redis {}:{}", config.store_host, config.store_port);
    }

    let mut runner = CommandRunner::new(commands);
    Connector::redis().connect(&config, &mut runner);
    Ok(runner.succeeded())
}

/// Runs the requested commands from inside the success callback, while the
/// SSH forward (if any) is still open.
struct CommandRunner {
    commands: Vec<String>,
    connected: bool,
    failed: bool,
}

impl CommandRunner {
    fn new(commands: Vec<String>) -> Self {
        Self {
            commands,
            connected: false,
            failed: false,
        }
    }

    fn succeeded(&self) -> bool {
        self.connected && !self.failed
    }
}

impl ConnectCallbacks<RedisHandle> for CommandRunner {
    fn on_success(&mut self, mut handle: RedisHandle) {
        self.connected = true;
        if self.commands.is_empty() {
            println!("Connected (db {})", handle.db());
            return;
        }
        for line in &self.commands {
            let words: Vec<&str> = line.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            match handle.execute(words.as_slice()) {
                Ok(value) => println!("{}", format_value(&value)),
                Err(e) => {
                    eprintln!("(error) {}", e.reason());
                    self.failed = true;
                }
            }
        }
    }

    fn on_error(&mut self) {
        self.failed = true;
    }
}

fn run_profile(action: ProfileAction) -> Result<bool, ConnectionError> {
    let store = ProfileStore::new()?;
    match action {
        ProfileAction::Save { name, settings } => {
            let base = store
                .load(&name)?
                .map(|p| p.config)
                .unwrap_or_default();
            let profile = Profile::new(name, settings.apply(base));
            profile.config.validate()?;
            store.save(&profile)?;
            info!("Saved profile '{}'", profile.name());
        }
        ProfileAction::List => {
            let profiles = store.list()?;
            if profiles.is_empty() {
                println!("No saved profiles.");
            }
            for profile in profiles {
                println!("{:<20} {}", profile.name(), describe(&profile.config));
            }
        }
        ProfileAction::Show { name } => match store.load(&name)? {
            Some(profile) => {
                println!("name:      {}", profile.name());
                println!("target:    {}", describe(&profile.config));
                println!("debug:     {}", profile.config.debug);
                println!("language:  {}", profile.config.language);
                if profile.config.tunnel_enabled {
                    println!("host keys: {:?}", profile.config.host_key_policy);
                    if let Some(path) = &profile.config.known_hosts_file {
                        println!("known_hosts: {}", path.display());
                    }
                }
            }
            None => {
                eprintln!("No profile named '{name}'");
                return Ok(false);
            }
        },
        ProfileAction::Delete { name } => {
            if store.delete(&name)? {
                info!("Deleted profile '{}'", name);
            } else {
                eprintln!("No profile named '{name}'");
                return Ok(false);
            }
        }
    }
    Ok(true)
}

/// One-line summary of where a config connects to.
fn describe(config: &ConnectionConfig) -> String {
    let store = format!(
        "{}:{} db {}",
        config.store_host, config.store_port, config.store_db
    );
    if config.tunnel_enabled {
        format!(
            "{} via {}@{}:{}",
            store, config.ssh_user, config.ssh_host, config.ssh_port
        )
    } else {
        store
    }
}
