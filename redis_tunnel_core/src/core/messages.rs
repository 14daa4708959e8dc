//! Diagnostic text in the two supported languages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Chinese,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Language::English),
            "zh" | "cn" | "chinese" | "中文" => Ok(Language::Chinese),
            other => Err(format!("unknown language '{other}' (expected en or zh)")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => f.write_str("en"),
            Language::Chinese => f.write_str("zh"),
        }
    }
}

/// Every line the connector may log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    StoreConnected { elapsed_ms: u128 },
    TaskCompleted { elapsed_ms: u128 },
    StoreUnavailable { reason: String },
    SshConnected { elapsed_ms: u128 },
    SshUnavailable { reason: String },
    SshNotReady,
    ForwardUnavailable { reason: String },
    InvalidConfig { reason: String },
}

impl Message {
    pub fn render(&self, language: Language) -> String {
        match (self, language) {
            (Message::StoreConnected { elapsed_ms }, Language::English) => {
                format!("Connected Redis Successfully (Spent {elapsed_ms}ms)")
            }
            (Message::StoreConnected { elapsed_ms }, Language::Chinese) => {
                format!("Redis连接成功 (耗时{elapsed_ms}ms)")
            }
            (Message::TaskCompleted { elapsed_ms }, Language::English) => {
                format!("Task Completed (Spent {elapsed_ms}ms)")
            }
            (Message::TaskCompleted { elapsed_ms }, Language::Chinese) => {
                format!("任务完成 (耗时{elapsed_ms}ms)")
            }
            (Message::StoreUnavailable { reason }, Language::English) => {
                format!("Unable to connect to Redis: {reason}")
            }
            (Message::StoreUnavailable { reason }, Language::Chinese) => {
                format!("无法连接Redis: {reason}")
            }
            (Message::SshConnected { elapsed_ms }, Language::English) => {
                format!("Successfully connected SSH (Spent {elapsed_ms}ms)")
            }
            (Message::SshConnected { elapsed_ms }, Language::Chinese) => {
                format!("SSH连接成功 (耗时{elapsed_ms}ms)")
            }
            (Message::SshUnavailable { reason }, Language::English) => {
                format!("Unable to connect to SSH: {reason}")
            }
            (Message::SshUnavailable { reason }, Language::Chinese) => {
                format!("无法通过SSH连接服务器: {reason}")
            }
            (Message::SshNotReady, Language::English) => {
                "Unable to connect to SSH, make sure the port is available".to_string()
            }
            (Message::SshNotReady, Language::Chinese) => {
                "无法通过SSH连接服务器，请确保端口开放".to_string()
            }
            (Message::ForwardUnavailable { reason }, Language::English) => {
                format!("Unable to forward the Redis port over SSH: {reason}")
            }
            (Message::ForwardUnavailable { reason }, Language::Chinese) => {
                format!("无法通过SSH转发Redis端口: {reason}")
            }
            (Message::InvalidConfig { reason }, Language::English) => {
                format!("Invalid connection settings: {reason}")
            }
            (Message::InvalidConfig { reason }, Language::Chinese) => {
                format!("连接配置无效: {reason}")
            }
        }
    }
}
