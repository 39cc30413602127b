//! 玩家编号与颜色

use std::fmt;

use serde::{Deserialize, Serialize};

/// 连接 ID（由传输层分配）
pub type ConnectionId = u64;

/// 玩家编号（1 号先手执红，2 号后手执蓝）
///
/// 线上格式为整数 `1` / `2`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlayerNum {
    One,
    Two,
}

impl PlayerNum {
    /// 全部编号，按分配顺序
    pub const ALL: [PlayerNum; 2] = [PlayerNum::One, PlayerNum::Two];

    /// 获取对方编号
    pub fn opponent(&self) -> PlayerNum {
        match self {
            PlayerNum::One => PlayerNum::Two,
            PlayerNum::Two => PlayerNum::One,
        }
    }

    /// 由编号决定的棋子颜色
    pub fn color(&self) -> Color {
        match self {
            PlayerNum::One => Color::Red,
            PlayerNum::Two => Color::Blue,
        }
    }

    pub fn as_u8(&self) -> u8 {
        match self {
            PlayerNum::One => 1,
            PlayerNum::Two => 2,
        }
    }
}

impl From<PlayerNum> for u8 {
    fn from(num: PlayerNum) -> Self {
        num.as_u8()
    }
}

impl TryFrom<u8> for PlayerNum {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PlayerNum::One),
            2 => Ok(PlayerNum::Two),
            other => Err(format!("invalid player number: {other}")),
        }
    }
}

impl fmt::Display for PlayerNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// 棋子颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Blue,
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::Red => write!(f, "red"),
            Color::Blue => write!(f, "blue"),
        }
    }
}
