//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘行数
pub const BOARD_ROWS: usize = 20;

/// 棋盘列数
pub const BOARD_COLS: usize = 20;

/// 连成几子获胜
pub const CONNECT: usize = 5;

/// 房间最多玩家数
pub const MAX_PLAYERS: usize = 2;

/// 玩家名最大字符数
pub const MAX_NAME_LEN: usize = 32;

/// 消息帧最大大小
pub const MAX_FRAME_SIZE: usize = 65536;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);

/// 单帧写出超时，对端长时间不读时放弃该连接
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// 每个连接发送队列的容量，塞满即断开
pub const OUTBOX_CAPACITY: usize = 256;

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 5000;
