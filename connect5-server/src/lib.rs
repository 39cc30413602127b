//! 五子连珠对局服务端
//!
//! 包含:
//! - 对局状态机
//! - 玩家席位管理
//! - 事件分发与广播
//! - 环境变量配置

pub mod config;
pub mod registry;
pub mod server;
pub mod session;

pub use config::ServerConfig;
pub use registry::Registry;
pub use server::{handle_connection, serve, Hub, Outbox};
pub use session::{Departure, GameSession, JoinOutcome, Placement, SessionPhase};
