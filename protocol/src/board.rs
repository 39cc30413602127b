//! 棋盘状态
//!
//! 行号 0 在最上方，`BOARD_ROWS - 1` 为底行；棋子受重力影响从底部向上堆叠。

use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_COLS, BOARD_ROWS, CONNECT};
use crate::player::PlayerNum;

/// 四个检查轴：横、竖、↘ 斜、↙ 斜
const AXES: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    /// 20x20 棋盘，索引为 row * BOARD_COLS + col
    cells: Vec<Option<PlayerNum>>,
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            cells: vec![None; BOARD_ROWS * BOARD_COLS],
        }
    }

    fn index(row: usize, col: usize) -> usize {
        row * BOARD_COLS + col
    }

    /// 获取指定格子的归属，越界返回 None
    pub fn get(&self, row: usize, col: usize) -> Option<PlayerNum> {
        if row < BOARD_ROWS && col < BOARD_COLS {
            self.cells[Self::index(row, col)]
        } else {
            None
        }
    }

    /// 落子会停在的行（该列最低的空格），整列已满返回 None
    ///
    /// `col` 必须在 `[0, BOARD_COLS)` 内，由调用方保证。
    pub fn drop_row(&self, col: usize) -> Option<usize> {
        (0..BOARD_ROWS)
            .rev()
            .find(|&row| self.cells[Self::index(row, col)].is_none())
    }

    /// 放置棋子（坐标应来自 `drop_row`，不检查覆盖）
    pub fn place(&mut self, row: usize, col: usize, player: PlayerNum) {
        self.cells[Self::index(row, col)] = Some(player);
    }

    /// 从刚落下的棋子出发检查是否连成五子
    pub fn check_win(&self, row: usize, col: usize, player: PlayerNum) -> bool {
        AXES.iter().any(|&(dr, dc)| {
            let count = 1
                + self.count_run(row, col, dr, dc, player)
                + self.count_run(row, col, -dr, -dc, player);
            count >= CONNECT
        })
    }

    /// 沿一个方向数连续同色棋子（不含起点）
    fn count_run(&self, row: usize, col: usize, dr: isize, dc: isize, player: PlayerNum) -> usize {
        let mut count = 0;
        let mut r = row as isize + dr;
        let mut c = col as isize + dc;
        while r >= 0
            && c >= 0
            && (r as usize) < BOARD_ROWS
            && (c as usize) < BOARD_COLS
            && self.cells[Self::index(r as usize, c as usize)] == Some(player)
        {
            count += 1;
            r += dr;
            c += dc;
        }
        count
    }

    /// 棋盘是否已满：棋子只会从底部堆叠，顶行全满即整盘满
    pub fn is_full(&self) -> bool {
        (0..BOARD_COLS).all(|col| self.cells[Self::index(0, col)].is_some())
    }

    /// 清空棋盘
    pub fn reset(&mut self) {
        self.cells.iter_mut().for_each(|cell| *cell = None);
    }

    /// 已占用格子数
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_some()).count()
    }

    /// 按行展开为二维数组（用于状态快照）
    pub fn to_grid(&self) -> Vec<Vec<Option<PlayerNum>>> {
        self.cells
            .chunks(BOARD_COLS)
            .map(|row| row.to_vec())
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTTOM: usize = BOARD_ROWS - 1;

    fn drop_at(board: &mut Board, col: usize, player: PlayerNum) -> usize {
        let row = board.drop_row(col).unwrap();
        board.place(row, col, player);
        row
    }

    #[test]
    fn test_gravity() {
        let mut board = Board::empty();

        assert_eq!(drop_at(&mut board, 3, PlayerNum::One), BOTTOM);
        assert_eq!(drop_at(&mut board, 3, PlayerNum::Two), BOTTOM - 1);

        // 落点上方全空，下方有子
        for row in 0..BOTTOM - 1 {
            assert!(board.get(row, 3).is_none());
        }
        assert_eq!(board.get(BOTTOM, 3), Some(PlayerNum::One));
        assert_eq!(board.get(BOTTOM - 1, 3), Some(PlayerNum::Two));
        assert_eq!(board.occupied_count(), 2);
    }

    #[test]
    fn test_column_full() {
        let mut board = Board::empty();
        for _ in 0..BOARD_ROWS {
            drop_at(&mut board, 0, PlayerNum::One);
        }
        assert_eq!(board.drop_row(0), None);
        assert_eq!(board.drop_row(1), Some(BOTTOM));
    }

    #[test]
    fn test_horizontal_win_at_edges() {
        let mut board = Board::empty();
        for col in 0..4 {
            board.place(BOTTOM, col, PlayerNum::One);
        }
        assert!(!board.check_win(BOTTOM, 3, PlayerNum::One));
        board.place(BOTTOM, 4, PlayerNum::One);
        assert!(board.check_win(BOTTOM, 4, PlayerNum::One));
        // 中间落子补成五连也算
        assert!(board.check_win(BOTTOM, 2, PlayerNum::One));

        let mut board = Board::empty();
        for col in BOARD_COLS - 5..BOARD_COLS {
            board.place(0, col, PlayerNum::Two);
        }
        assert!(board.check_win(0, BOARD_COLS - 1, PlayerNum::Two));
        assert!(!board.check_win(0, BOARD_COLS - 1, PlayerNum::One));
    }

    #[test]
    fn test_vertical_win() {
        let mut board = Board::empty();
        for _ in 0..4 {
            drop_at(&mut board, 19, PlayerNum::Two);
        }
        assert!(!board.check_win(BOTTOM - 3, 19, PlayerNum::Two));
        let row = drop_at(&mut board, 19, PlayerNum::Two);
        assert!(board.check_win(row, 19, PlayerNum::Two));
    }

    #[test]
    fn test_diagonal_wins() {
        // ↘ 方向，贴左上角
        let mut board = Board::empty();
        for i in 0..4 {
            board.place(i, i, PlayerNum::One);
        }
        assert!(!board.check_win(0, 0, PlayerNum::One));
        board.place(4, 4, PlayerNum::One);
        assert!(board.check_win(0, 0, PlayerNum::One));
        assert!(board.check_win(4, 4, PlayerNum::One));

        // ↙ 方向，贴右下角
        let mut board = Board::empty();
        for i in 0..4 {
            board.place(BOTTOM - i, BOARD_COLS - 5 + i, PlayerNum::Two);
        }
        assert!(!board.check_win(BOTTOM, BOARD_COLS - 5, PlayerNum::Two));
        board.place(BOTTOM - 4, BOARD_COLS - 1, PlayerNum::Two);
        assert!(board.check_win(BOTTOM, BOARD_COLS - 5, PlayerNum::Two));
    }

    #[test]
    fn test_broken_run_is_not_a_win() {
        let mut board = Board::empty();
        for col in [0, 1, 2, 4, 5] {
            board.place(BOTTOM, col, PlayerNum::One);
        }
        board.place(BOTTOM, 3, PlayerNum::Two);
        assert!(!board.check_win(BOTTOM, 2, PlayerNum::One));
        assert!(!board.check_win(BOTTOM, 4, PlayerNum::One));
    }

    #[test]
    fn test_full_and_reset() {
        let mut board = Board::empty();
        for col in 0..BOARD_COLS {
            for _ in 0..BOARD_ROWS {
                drop_at(&mut board, col, PlayerNum::One);
            }
            assert_eq!(board.is_full(), col == BOARD_COLS - 1);
        }
        assert_eq!(board.occupied_count(), BOARD_ROWS * BOARD_COLS);

        board.reset();
        assert_eq!(board, Board::empty());
        assert!(!board.is_full());
    }

    #[test]
    fn test_to_grid_is_row_major() {
        let mut board = Board::empty();
        board.place(BOTTOM, 7, PlayerNum::Two);
        let grid = board.to_grid();
        assert_eq!(grid.len(), BOARD_ROWS);
        assert!(grid.iter().all(|row| row.len() == BOARD_COLS));
        assert_eq!(grid[BOTTOM][7], Some(PlayerNum::Two));
        assert_eq!(grid[0][7], None);
    }
}
