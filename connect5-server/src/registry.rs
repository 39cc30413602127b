//! 连接与玩家席位的对应关系

use protocol::{ConnectionId, PlayerInfo, PlayerNum, MAX_PLAYERS};

/// 玩家席位表
///
/// 只做存取，不含规则校验；按加入顺序保存。
#[derive(Debug, Default)]
pub struct Registry {
    bindings: Vec<PlayerInfo>,
}

impl Registry {
    pub fn new() -> Self {
        Self {
            bindings: Vec::with_capacity(MAX_PLAYERS),
        }
    }

    /// 绑定连接到席位
    pub fn insert(&mut self, binding: PlayerInfo) {
        self.bindings.push(binding);
    }

    /// 解除绑定
    pub fn remove(&mut self, connection_id: ConnectionId) -> Option<PlayerInfo> {
        let index = self
            .bindings
            .iter()
            .position(|b| b.connection_id == connection_id)?;
        Some(self.bindings.remove(index))
    }

    /// 按连接查找
    pub fn get(&self, connection_id: ConnectionId) -> Option<&PlayerInfo> {
        self.bindings.iter().find(|b| b.connection_id == connection_id)
    }

    pub fn contains(&self, connection_id: ConnectionId) -> bool {
        self.get(connection_id).is_some()
    }

    /// 当前玩家数（0..=2）
    pub fn count(&self) -> usize {
        self.bindings.len()
    }

    /// 最小的空闲编号
    pub fn next_free_player(&self) -> Option<PlayerNum> {
        PlayerNum::ALL
            .into_iter()
            .find(|num| self.bindings.iter().all(|b| b.player_num != *num))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlayerInfo> {
        self.bindings.iter()
    }
}
