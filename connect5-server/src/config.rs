//! 服务端配置（来自环境变量）

use anyhow::{Context, Result};
use protocol::NetworkConfig;

/// 服务端配置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub network: NetworkConfig,
    /// 打开调试日志
    pub debug: bool,
}

impl ServerConfig {
    /// 从进程环境变量读取 `HOST` / `PORT` / `DEBUG`
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源读取，缺省项使用默认值
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut network = NetworkConfig::default();

        if let Some(host) = lookup("HOST").filter(|h| !h.trim().is_empty()) {
            network.host = host.trim().to_string();
        }
        if let Some(port) = lookup("PORT") {
            network.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT 不是合法端口: {:?}", port))?;
        }

        let debug = lookup("DEBUG")
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        Ok(Self { network, debug })
    }

    /// 服务端与协议层的日志级别指令
    pub fn log_directives(&self) -> [&'static str; 2] {
        if self.debug {
            ["connect5_server=debug", "protocol=debug"]
        } else {
            ["connect5_server=info", "protocol=info"]
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            network: NetworkConfig::default(),
            debug: false,
        }
    }
}
