//! 消息类型定义
//!
//! 线上格式统一为 `{"event": <事件名>, "data": <负载>}`。

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::player::{Color, ConnectionId, PlayerNum};

/// 玩家信息（快照中的 players 条目）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub connection_id: ConnectionId,
    pub name: String,
    pub color: Color,
    pub player_num: PlayerNum,
}

impl PlayerInfo {
    /// 作为胜者展示的信息
    pub fn as_winner(&self) -> WinnerInfo {
        WinnerInfo {
            name: self.name.clone(),
            color: self.color,
            player_num: self.player_num,
        }
    }
}

/// 胜者信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinnerInfo {
    pub name: String,
    pub color: Color,
    pub player_num: PlayerNum,
}

/// 和棋标记，线上为 `{"draw": true}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawMarker {
    pub draw: bool,
}

/// 对局结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome {
    /// 某方连成五子
    Win(WinnerInfo),
    /// 棋盘下满仍无人获胜
    Draw(DrawMarker),
}

impl Outcome {
    pub fn draw() -> Self {
        Outcome::Draw(DrawMarker { draw: true })
    }

    pub fn is_draw(&self) -> bool {
        matches!(self, Outcome::Draw(_))
    }
}

/// 完整的对局快照，客户端以此为准
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    /// 按行展开的棋盘，`null` 为空
    pub board: Vec<Vec<Option<PlayerNum>>>,
    pub players: Vec<PlayerInfo>,
    pub current_turn: PlayerNum,
    pub game_started: bool,
    pub winner: Option<Outcome>,
    pub player_count: usize,
}

/// 客户端发送给服务端的消息
///
/// `join` 的负载字段全部可选，整个 `data` 也可以省略。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// 加入对局
    Join {
        #[serde(default)]
        player_name: Option<String>,
    },
    /// 在某列落子（范围由服务端校验）
    DropPiece { col: i64 },
    /// 重新开局
    ResetGame,
}

impl<'de> Deserialize<'de> for ClientMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "snake_case")]
        enum Event {
            Join,
            DropPiece,
            ResetGame,
        }

        #[derive(Deserialize)]
        struct Envelope {
            event: Event,
            #[serde(default)]
            data: Option<serde_json::Value>,
        }

        #[derive(Deserialize)]
        struct JoinData {
            #[serde(default)]
            player_name: Option<String>,
        }

        #[derive(Deserialize)]
        struct DropPieceData {
            col: i64,
        }

        let envelope = Envelope::deserialize(deserializer)?;
        match envelope.event {
            Event::Join => {
                let player_name = match envelope.data {
                    Some(data) => {
                        JoinData::deserialize(data)
                            .map_err(D::Error::custom)?
                            .player_name
                    }
                    None => None,
                };
                Ok(ClientMessage::Join { player_name })
            }
            Event::DropPiece => {
                let data = envelope.data.ok_or_else(|| D::Error::missing_field("data"))?;
                let DropPieceData { col } =
                    DropPieceData::deserialize(data).map_err(D::Error::custom)?;
                Ok(ClientMessage::DropPiece { col })
            }
            Event::ResetGame => Ok(ClientMessage::ResetGame),
        }
    }
}

/// 服务端发送给客户端的消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// 加入成功（仅发给加入者）
    Joined {
        player_num: PlayerNum,
        player_name: String,
        color: Color,
    },
    /// 双方到齐，游戏开始
    GameStarted { message: String },
    /// 落子动画提示
    PieceDropped {
        row: usize,
        col: usize,
        player_num: PlayerNum,
        color: Color,
    },
    /// 有人获胜
    GameWon(WinnerInfo),
    /// 和棋
    GameDraw {},
    /// 棋盘已重置
    GameReset {},
    /// 完整状态快照
    GameState(GameSnapshot),
    /// 错误消息（仅发给发起方）
    Error { code: ErrorCode, message: String },
}

/// 错误码定义
///
/// 线上格式为数值，如 `200`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // === 房间相关 (1xx) ===
    /// 房间已满
    SessionFull = 100,
    /// 已经加入
    AlreadyJoined = 101,
    /// 不是本局玩家
    NotAPlayer = 102,
    /// 人数不足
    NotEnoughPlayers = 103,
    /// 玩家名过长
    NameTooLong = 104,

    // === 游戏相关 (2xx) ===
    /// 不是你的回合
    NotYourTurn = 200,
    /// 游戏已开始
    AlreadyStarted = 201,
    /// 游戏未开始
    NotStarted = 202,
    /// 游戏已结束
    GameOver = 203,

    // === 落子相关 (3xx) ===
    /// 列号无效
    InvalidColumn = 300,
    /// 该列已满
    ColumnFull = 301,

    // === 系统相关 (5xx) ===
    /// 无法解析的消息
    MalformedMessage = 500,
}

impl ErrorCode {
    /// 全部错误码
    pub const ALL: [ErrorCode; 12] = [
        ErrorCode::SessionFull,
        ErrorCode::AlreadyJoined,
        ErrorCode::NotAPlayer,
        ErrorCode::NotEnoughPlayers,
        ErrorCode::NameTooLong,
        ErrorCode::NotYourTurn,
        ErrorCode::AlreadyStarted,
        ErrorCode::NotStarted,
        ErrorCode::GameOver,
        ErrorCode::InvalidColumn,
        ErrorCode::ColumnFull,
        ErrorCode::MalformedMessage,
    ];
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code as u16
    }
}

impl TryFrom<u16> for ErrorCode {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        ErrorCode::ALL
            .into_iter()
            .find(|&code| u16::from(code) == value)
            .ok_or_else(|| format!("unknown error code: {value}"))
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}
