//! 对局状态机
//!
//! 全服唯一的对局：棋盘、回合、玩家席位与结果。所有规则校验都在这里完成，
//! 校验失败时状态保持不变。

use protocol::{
    Board, ConnectionId, GameError, GameSnapshot, Outcome, PlayerInfo, PlayerNum, BOARD_COLS,
    MAX_NAME_LEN, MAX_PLAYERS,
};

use crate::registry::Registry;

/// 对局阶段（由 started 与 outcome 推导）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// 等待玩家
    Waiting,
    /// 对局进行中
    InProgress,
    /// 已分出胜负或和棋
    Finished,
}

/// 加入结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub player: PlayerInfo,
    /// 本次加入凑齐了两名玩家，游戏随之开始
    pub game_started: bool,
}

/// 落子结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub row: usize,
    pub col: usize,
    pub player: PlayerInfo,
    /// 本步结束了对局时的结果
    pub outcome: Option<Outcome>,
}

/// 玩家离开的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub player: PlayerInfo,
    /// 对局进行中离开，棋盘已被清空
    pub board_reset: bool,
}

/// 对局
#[derive(Debug)]
pub struct GameSession {
    board: Board,
    registry: Registry,
    current_turn: PlayerNum,
    started: bool,
    outcome: Option<Outcome>,
}

impl GameSession {
    /// 创建空对局：空棋盘、无玩家、未开始
    pub fn new() -> Self {
        Self {
            board: Board::empty(),
            registry: Registry::new(),
            current_turn: PlayerNum::One,
            started: false,
            outcome: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        if self.outcome.is_some() {
            SessionPhase::Finished
        } else if self.started {
            SessionPhase::InProgress
        } else {
            SessionPhase::Waiting
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_turn(&self) -> PlayerNum {
        self.current_turn
    }

    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    pub fn player_count(&self) -> usize {
        self.registry.count()
    }

    /// 查询连接对应的玩家
    pub fn player(&self, connection_id: ConnectionId) -> Option<&PlayerInfo> {
        self.registry.get(connection_id)
    }

    /// 清空棋盘与结果，回合交还 1 号
    fn reset_board(&mut self) {
        self.board.reset();
        self.outcome = None;
        self.current_turn = PlayerNum::One;
    }

    /// 加入对局
    pub fn join(
        &mut self,
        connection_id: ConnectionId,
        requested_name: Option<String>,
    ) -> Result<JoinOutcome, GameError> {
        if self.registry.count() >= MAX_PLAYERS {
            return Err(GameError::SessionFull);
        }
        if self.phase() == SessionPhase::InProgress {
            return Err(GameError::AlreadyStarted);
        }
        if self.registry.contains(connection_id) {
            return Err(GameError::AlreadyJoined);
        }
        // 名字会进入每一份快照，过长会让快照超出帧大小
        if requested_name
            .as_ref()
            .is_some_and(|name| name.chars().count() > MAX_NAME_LEN)
        {
            return Err(GameError::NameTooLong);
        }

        let player_num = self
            .registry
            .next_free_player()
            .ok_or(GameError::SessionFull)?;
        let name = requested_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| format!("Player {}", self.registry.count() + 1));

        let player = PlayerInfo {
            connection_id,
            name,
            color: player_num.color(),
            player_num,
        };
        self.registry.insert(player.clone());

        // 凑齐两人自动开始
        let game_started = self.registry.count() == MAX_PLAYERS;
        if game_started {
            self.started = true;
            self.current_turn = PlayerNum::One;
        }

        Ok(JoinOutcome {
            player,
            game_started,
        })
    }

    /// 在某列落子
    pub fn drop_piece(
        &mut self,
        connection_id: ConnectionId,
        col: i64,
    ) -> Result<Placement, GameError> {
        match self.phase() {
            SessionPhase::Finished => return Err(GameError::GameOver),
            SessionPhase::Waiting => return Err(GameError::NotStarted),
            SessionPhase::InProgress => {}
        }

        let player = self
            .registry
            .get(connection_id)
            .ok_or(GameError::NotAPlayer)?
            .clone();

        if player.player_num != self.current_turn {
            return Err(GameError::NotYourTurn);
        }

        let col = usize::try_from(col)
            .ok()
            .filter(|&col| col < BOARD_COLS)
            .ok_or(GameError::InvalidColumn)?;
        let row = self.board.drop_row(col).ok_or(GameError::ColumnFull)?;

        self.board.place(row, col, player.player_num);

        let outcome = if self.board.check_win(row, col, player.player_num) {
            Some(Outcome::Win(player.as_winner()))
        } else if self.board.is_full() {
            Some(Outcome::draw())
        } else {
            None
        };

        match &outcome {
            Some(result) => {
                self.outcome = Some(result.clone());
                self.started = false;
            }
            None => self.current_turn = self.current_turn.opponent(),
        }

        Ok(Placement {
            row,
            col,
            player,
            outcome,
        })
    }

    /// 连接断开或离开对局
    ///
    /// 对局进行中离开会清空棋盘回到等待；已结束的结果保留到下次重开。
    pub fn leave(&mut self, connection_id: ConnectionId) -> Option<Departure> {
        let was_in_progress = self.phase() == SessionPhase::InProgress;
        let player = self.registry.remove(connection_id)?;

        if was_in_progress {
            self.reset_board();
        }
        // 不足两人时不能处于开始状态
        self.started = false;

        Some(Departure {
            player,
            board_reset: was_in_progress,
        })
    }

    /// 重新开局：保留两名玩家，直接进入对局，1 号先手
    pub fn reset_game(&mut self) -> Result<(), GameError> {
        if self.registry.count() < MAX_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }

        self.reset_board();
        self.started = true;
        Ok(())
    }

    /// 完整状态快照
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.to_grid(),
            players: self.registry.iter().cloned().collect(),
            current_turn: self.current_turn,
            game_started: self.started,
            winner: self.outcome.clone(),
            player_count: self.registry.count(),
        }
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
