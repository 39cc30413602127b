//! 服务器主逻辑
//!
//! 事件分发与广播：解码后的请求交给 [`GameSession`]，按固定顺序组装要发出的消息，
//! 再投递到每个连接的发送队列。

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use protocol::{
    ClientMessage, Connection, ConnectionId, ErrorCode, FrameReader, FrameWriter, GameError,
    GameSnapshot, Listener, Outcome, ProtocolError, ServerMessage, TcpConnection, TcpListener,
    OUTBOX_CAPACITY, WRITE_TIMEOUT,
};

use crate::session::GameSession;

/// 开局提示
const GAME_STARTED_MESSAGE: &str = "Game started! Red goes first.";

/// 连接的发送队列（容量 [`OUTBOX_CAPACITY`]）
pub type Outbox = mpsc::Sender<ServerMessage>;

/// 消息接收方
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Recipient {
    /// 仅发给某个连接
    One(ConnectionId),
    /// 所有在线连接
    All,
}

/// 待发送的消息（保持组装顺序）
struct PendingMessages {
    deliveries: Vec<(Recipient, ServerMessage)>,
}

impl PendingMessages {
    fn new() -> Self {
        Self {
            deliveries: Vec::new(),
        }
    }

    fn send(&mut self, connection_id: ConnectionId, msg: ServerMessage) {
        self.deliveries.push((Recipient::One(connection_id), msg));
    }

    fn broadcast(&mut self, msg: ServerMessage) {
        self.deliveries.push((Recipient::All, msg));
    }

    fn error(&mut self, connection_id: ConnectionId, code: ErrorCode, message: String) {
        self.send(connection_id, ServerMessage::Error { code, message });
    }

    /// 按顺序投递到发送队列，不等待写出
    fn flush(self, hub: &Hub) {
        for (recipient, msg) in self.deliveries {
            match recipient {
                Recipient::One(connection_id) => hub.send_to(connection_id, msg),
                Recipient::All => hub.broadcast(msg),
            }
        }
    }
}

/// 服务器共享状态
///
/// 对局由一把互斥锁保护；发送队列表单独加锁，写 socket 在各连接自己的任务里完成。
pub struct Hub {
    session: Mutex<GameSession>,
    outboxes: RwLock<HashMap<ConnectionId, Outbox>>,
    next_id: AtomicU64,
}

impl Hub {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(GameSession::new()),
            outboxes: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// 生成新的连接 ID
    fn generate_id(&self) -> ConnectionId {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// 放入发送队列，不等待；队列满或已关闭时返回 false
    fn deliver(connection_id: ConnectionId, tx: &Outbox, msg: ServerMessage) -> bool {
        match tx.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(connection_id, "发送队列已满，断开连接");
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }

    /// 发送消息给单个连接
    fn send_to(&self, connection_id: ConnectionId, msg: ServerMessage) {
        let delivered = match self.outboxes.read() {
            Ok(outboxes) => outboxes
                .get(&connection_id)
                .map_or(true, |tx| Self::deliver(connection_id, tx, msg)),
            Err(_) => true,
        };
        if !delivered {
            self.evict(&[connection_id]);
        }
    }

    /// 广播给所有在线连接
    fn broadcast(&self, msg: ServerMessage) {
        let stalled: Vec<ConnectionId> = match self.outboxes.read() {
            Ok(outboxes) => outboxes
                .iter()
                .filter_map(|(&id, tx)| (!Self::deliver(id, tx, msg.clone())).then_some(id))
                .collect(),
            Err(_) => Vec::new(),
        };
        self.evict(&stalled);
    }

    /// 注销发送队列
    ///
    /// 写任务把剩余消息写完后退出，连接随之按断线处理。
    fn evict(&self, connection_ids: &[ConnectionId]) {
        if connection_ids.is_empty() {
            return;
        }
        if let Ok(mut outboxes) = self.outboxes.write() {
            for connection_id in connection_ids {
                outboxes.remove(connection_id);
            }
        }
    }

    /// 登记新连接，并只给它发一份当前快照
    pub async fn connect(&self, outbox: Outbox) -> ConnectionId {
        let connection_id = self.generate_id();
        let session = self.session.lock().await;

        if let Ok(mut outboxes) = self.outboxes.write() {
            outboxes.insert(connection_id, outbox);
        }
        self.send_to(connection_id, ServerMessage::GameState(session.snapshot()));

        connection_id
    }

    /// 处理一条客户端请求
    ///
    /// 校验、修改和投递都在对局锁内完成，所以每个接收方看到的消息顺序与请求处理顺序一致。
    pub async fn handle(&self, connection_id: ConnectionId, msg: ClientMessage) {
        let mut session = self.session.lock().await;
        let mut pending = PendingMessages::new();

        MessageHandler::handle(&mut session, &mut pending, connection_id, msg);

        pending.flush(self);
    }

    /// 无法解析的帧：只回复发送方
    pub fn reject_malformed(&self, connection_id: ConnectionId, err: &ProtocolError) {
        debug!(connection_id, error = %err, "无法解析的消息");
        self.send_to(
            connection_id,
            ServerMessage::Error {
                code: ErrorCode::MalformedMessage,
                message: format!("Malformed message: {}", err),
            },
        );
    }

    /// 处理连接断开
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let mut session = self.session.lock().await;
        let mut pending = PendingMessages::new();

        if let Ok(mut outboxes) = self.outboxes.write() {
            outboxes.remove(&connection_id);
        }
        MessageHandler::handle_disconnect(&mut session, &mut pending, connection_id);

        pending.flush(self);
    }

    /// 当前快照
    pub async fn snapshot(&self) -> GameSnapshot {
        self.session.lock().await.snapshot()
    }

    /// 在线连接数
    pub fn connection_count(&self) -> usize {
        self.outboxes.read().map(|o| o.len()).unwrap_or(0)
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// 消息处理器
struct MessageHandler;

impl MessageHandler {
    /// 分发客户端消息
    fn handle(
        session: &mut GameSession,
        pending: &mut PendingMessages,
        connection_id: ConnectionId,
        msg: ClientMessage,
    ) {
        let result = match msg {
            ClientMessage::Join { player_name } => {
                Self::handle_join(session, pending, connection_id, player_name)
            }
            ClientMessage::DropPiece { col } => {
                Self::handle_drop_piece(session, pending, connection_id, col)
            }
            ClientMessage::ResetGame => Self::handle_reset(session, pending, connection_id),
        };

        if let Err(err) = result {
            debug!(connection_id, error = %err, "请求被拒绝");
            pending.error(connection_id, err.code(), err.to_string());
        }
    }

    /// 处理加入
    fn handle_join(
        session: &mut GameSession,
        pending: &mut PendingMessages,
        connection_id: ConnectionId,
        player_name: Option<String>,
    ) -> Result<(), GameError> {
        let joined = session.join(connection_id, player_name)?;
        let player = joined.player;

        info!(
            connection_id,
            name = %player.name,
            color = %player.color,
            player_num = %player.player_num,
            "玩家加入"
        );

        pending.send(
            connection_id,
            ServerMessage::Joined {
                player_num: player.player_num,
                player_name: player.name,
                color: player.color,
            },
        );

        if joined.game_started {
            info!("双方到齐，游戏开始");
            pending.broadcast(ServerMessage::GameStarted {
                message: GAME_STARTED_MESSAGE.to_string(),
            });
        }

        pending.broadcast(ServerMessage::GameState(session.snapshot()));
        Ok(())
    }

    /// 处理落子
    fn handle_drop_piece(
        session: &mut GameSession,
        pending: &mut PendingMessages,
        connection_id: ConnectionId,
        col: i64,
    ) -> Result<(), GameError> {
        let placement = session.drop_piece(connection_id, col)?;

        debug!(
            connection_id,
            row = placement.row,
            col = placement.col,
            player_num = %placement.player.player_num,
            "落子"
        );

        pending.broadcast(ServerMessage::PieceDropped {
            row: placement.row,
            col: placement.col,
            player_num: placement.player.player_num,
            color: placement.player.color,
        });

        match placement.outcome {
            Some(Outcome::Win(winner)) => {
                info!(name = %winner.name, player_num = %winner.player_num, "对局结束，玩家获胜");
                pending.broadcast(ServerMessage::GameWon(winner));
            }
            Some(Outcome::Draw(_)) => {
                info!("对局结束，和棋");
                pending.broadcast(ServerMessage::GameDraw {});
            }
            None => {}
        }

        pending.broadcast(ServerMessage::GameState(session.snapshot()));
        Ok(())
    }

    /// 处理重新开局
    fn handle_reset(
        session: &mut GameSession,
        pending: &mut PendingMessages,
        connection_id: ConnectionId,
    ) -> Result<(), GameError> {
        session.reset_game()?;

        info!(connection_id, "重新开局");
        pending.broadcast(ServerMessage::GameReset {});
        pending.broadcast(ServerMessage::GameState(session.snapshot()));
        Ok(())
    }

    /// 处理断线：只有玩家离开才会改变状态并广播
    fn handle_disconnect(
        session: &mut GameSession,
        pending: &mut PendingMessages,
        connection_id: ConnectionId,
    ) {
        if let Some(departure) = session.leave(connection_id) {
            info!(
                connection_id,
                name = %departure.player.name,
                board_reset = departure.board_reset,
                "玩家离开"
            );
            pending.broadcast(ServerMessage::GameState(session.snapshot()));
        }
    }
}

/// 接受连接并为每个连接启动读写任务
pub async fn serve(mut listener: TcpListener, hub: Arc<Hub>) -> protocol::Result<()> {
    if let Some(addr) = listener.local_addr() {
        info!("监听地址: {}", addr);
    }

    loop {
        match listener.accept().await {
            Ok(conn) => {
                tokio::spawn(handle_connection(conn, hub.clone()));
            }
            Err(e) => {
                warn!("接受连接失败: {}", e);
            }
        }
    }
}

/// 单个连接的生命周期
pub async fn handle_connection(conn: TcpConnection, hub: Arc<Hub>) {
    let peer = conn.peer_addr().unwrap_or_else(|| "unknown".to_string());
    let (reader, writer) = conn.split();
    run_connection(reader, writer, peer, hub).await;
}

/// 读循环跑在当前任务，写出交给独立任务；任意一端结束都会注销连接
async fn run_connection<R, W>(
    mut reader: FrameReader<R>,
    writer: FrameWriter<W>,
    peer: String,
    hub: Arc<Hub>,
) where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);

    let connection_id = hub.connect(tx).await;
    info!(connection_id, %peer, "客户端已连接");

    let mut writer_task = tokio::spawn(write_outbox(writer, rx, connection_id));

    loop {
        tokio::select! {
            frame = reader.read_frame::<ClientMessage>() => match frame {
                Ok(msg) => hub.handle(connection_id, msg).await,
                Err(e) if e.is_malformed_frame() => hub.reject_malformed(connection_id, &e),
                Err(ProtocolError::ConnectionClosed) => break,
                Err(e) => {
                    warn!(connection_id, error = %e, "连接异常");
                    break;
                }
            },
            _ = &mut writer_task => {
                debug!(connection_id, "写任务已结束");
                break;
            }
        }
    }

    hub.disconnect(connection_id).await;
    info!(connection_id, %peer, "客户端已断开");
}

/// 把发送队列逐帧写出
///
/// 队列关闭、写出失败或超过 [`WRITE_TIMEOUT`] 时退出。
async fn write_outbox<W>(
    mut writer: FrameWriter<W>,
    mut rx: mpsc::Receiver<ServerMessage>,
    connection_id: ConnectionId,
) where
    W: AsyncWrite + Unpin + Send,
{
    while let Some(msg) = rx.recv().await {
        match tokio::time::timeout(WRITE_TIMEOUT, writer.write_frame(&msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                warn!(connection_id, error = %e, "写出失败");
                break;
            }
            Err(_) => {
                warn!(connection_id, "写出超时");
                break;
            }
        }
    }
    let _ = writer.shutdown().await;
}
