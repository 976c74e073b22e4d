use std::{collections::HashMap, net::SocketAddr};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const SERVER_NAME: &str = "aex";

/// 测试应用配置
///
/// 所有字段都有默认值，`{}` 即为合法配置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub server_name: String,
    /// 模拟调用的对端地址
    pub peer_addr: SocketAddr,
    /// 每个模拟请求都会先写入的请求头
    pub default_headers: HashMap<String, String>,
    pub environment: HashMap<String, String>,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            server_name: SERVER_NAME.to_string(),
            peer_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            default_headers: HashMap::new(),
            environment: HashMap::new(),
        }
    }
}

impl ApplicationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("Invalid application config")
    }

    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    pub fn with_default_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }

    pub fn env(&self, key: &str) -> Option<&str> {
        self.environment.get(key).map(String::as_str)
    }
}
