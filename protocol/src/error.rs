//! 错误类型定义

use thiserror::Error;

use crate::message::ErrorCode;

/// 对局规则错误
///
/// 全部可由用户重试恢复，只回复给发起请求的连接。
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameError {
    /// 房间已满
    #[error("Game is full! Only 2 players allowed.")]
    SessionFull,

    /// 游戏已开始，不能加入
    #[error("Game already in progress!")]
    AlreadyStarted,

    /// 游戏未开始
    #[error("Game has not started yet!")]
    NotStarted,

    /// 游戏已结束
    #[error("Game is over!")]
    GameOver,

    /// 该连接已加入
    #[error("You already joined!")]
    AlreadyJoined,

    /// 玩家名过长
    #[error("Player name is too long! At most {max} characters.", max = crate::constants::MAX_NAME_LEN)]
    NameTooLong,

    /// 该连接不是玩家
    #[error("You are not in this game!")]
    NotAPlayer,

    /// 不是你的回合
    #[error("It's not your turn!")]
    NotYourTurn,

    /// 列号越界
    #[error("Invalid column!")]
    InvalidColumn,

    /// 该列已满
    #[error("Column is full!")]
    ColumnFull,

    /// 人数不足，不能重开
    #[error("Need two players to reset the game!")]
    NotEnoughPlayers,
}

impl GameError {
    /// 对应的错误码
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::SessionFull => ErrorCode::SessionFull,
            GameError::AlreadyStarted => ErrorCode::AlreadyStarted,
            GameError::NotStarted => ErrorCode::NotStarted,
            GameError::GameOver => ErrorCode::GameOver,
            GameError::AlreadyJoined => ErrorCode::AlreadyJoined,
            GameError::NameTooLong => ErrorCode::NameTooLong,
            GameError::NotAPlayer => ErrorCode::NotAPlayer,
            GameError::NotYourTurn => ErrorCode::NotYourTurn,
            GameError::InvalidColumn => ErrorCode::InvalidColumn,
            GameError::ColumnFull => ErrorCode::ColumnFull,
            GameError::NotEnoughPlayers => ErrorCode::NotEnoughPlayers,
        }
    }
}

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON 序列化错误
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,
}

impl ProtocolError {
    /// 是否只是单帧内容无法解析（连接本身仍可用）
    pub fn is_malformed_frame(&self) -> bool {
        matches!(self, ProtocolError::Json(_))
    }
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
