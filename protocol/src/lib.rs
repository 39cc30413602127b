//! 五子连珠（重力落子）共享协议库
//!
//! 包含:
//! - 棋盘模型：重力落子、胜负与和棋判定
//! - 玩家编号与颜色
//! - 消息类型定义 (ClientMessage, ServerMessage, GameSnapshot)
//! - 传输层抽象 (Connector, Connection, Listener traits)
//! - 帧编解码 (FrameReader, FrameWriter)

mod board;
mod constants;
mod error;
mod message;
mod player;
mod transport;

pub use board::Board;
pub use constants::*;
pub use error::{GameError, ProtocolError, Result};
pub use message::{
    ClientMessage, DrawMarker, ErrorCode, GameSnapshot, Outcome, PlayerInfo, ServerMessage,
    WinnerInfo,
};
pub use player::{Color, ConnectionId, PlayerNum};
pub use transport::{
    Connection, Connector, FrameReader, FrameWriter, Listener, NetworkConfig, TcpConnection,
    TcpConnector, TcpListener,
};
