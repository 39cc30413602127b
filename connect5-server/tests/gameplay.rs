//! 通过真实 TCP 连接的端到端对局测试

use std::sync::Arc;
use std::time::Duration;

use connect5_server::{serve, Hub};
use protocol::{
    ClientMessage, Color, Connection, Connector, ErrorCode, Listener, Outcome, PlayerNum,
    ServerMessage, TcpConnection, TcpConnector, TcpListener, BOARD_ROWS,
};

async fn start_server() -> (String, Arc<Hub>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hub = Arc::new(Hub::new());
    tokio::spawn(serve(listener, hub.clone()));
    (addr, hub)
}

async fn recv(conn: &mut TcpConnection) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(5), conn.recv::<ServerMessage>())
        .await
        .expect("timed out waiting for server message")
        .unwrap()
}

/// 连接并读掉初始快照
async fn connect(addr: &str) -> TcpConnection {
    let mut conn = TcpConnector.connect(addr).await.unwrap();
    assert!(matches!(recv(&mut conn).await, ServerMessage::GameState(_)));
    conn
}

async fn join(conn: &mut TcpConnection, name: &str) {
    conn.send(&ClientMessage::Join {
        player_name: Some(name.to_string()),
    })
    .await
    .unwrap();
}

async fn drop_piece(conn: &mut TcpConnection, col: i64) {
    conn.send(&ClientMessage::DropPiece { col }).await.unwrap();
}

/// 读到下一份快照为止，返回途中的其它消息和快照
async fn until_snapshot(conn: &mut TcpConnection) -> (Vec<ServerMessage>, protocol::GameSnapshot) {
    let mut others = Vec::new();
    loop {
        match recv(conn).await {
            ServerMessage::GameState(snapshot) => return (others, snapshot),
            other => others.push(other),
        }
    }
}

#[tokio::test]
async fn test_full_game_over_tcp() {
    let (addr, _hub) = start_server().await;

    let mut alice = connect(&addr).await;
    join(&mut alice, "Alice").await;
    assert_eq!(
        recv(&mut alice).await,
        ServerMessage::Joined {
            player_num: PlayerNum::One,
            player_name: "Alice".to_string(),
            color: Color::Red,
        }
    );
    let (_, snapshot) = until_snapshot(&mut alice).await;
    assert_eq!(snapshot.player_count, 1);
    assert!(!snapshot.game_started);

    let mut bob = connect(&addr).await;
    join(&mut bob, "Bob").await;
    let (events, snapshot) = until_snapshot(&mut bob).await;
    assert!(matches!(
        events.as_slice(),
        [
            ServerMessage::Joined { player_num: PlayerNum::Two, color: Color::Blue, .. },
            ServerMessage::GameStarted { .. },
        ]
    ));
    assert!(snapshot.game_started);
    assert_eq!(snapshot.current_turn, PlayerNum::One);
    let (events, _) = until_snapshot(&mut alice).await;
    assert!(matches!(events.as_slice(), [ServerMessage::GameStarted { .. }]));

    // Alice 在底行连下五子，Bob 在另一侧落子
    for col in 0..4 {
        drop_piece(&mut alice, col).await;
        until_snapshot(&mut alice).await;
        until_snapshot(&mut bob).await;

        drop_piece(&mut bob, 10 + col).await;
        until_snapshot(&mut alice).await;
        until_snapshot(&mut bob).await;
    }

    drop_piece(&mut alice, 4).await;
    for conn in [&mut alice, &mut bob] {
        let (events, snapshot) = until_snapshot(conn).await;
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            ServerMessage::PieceDropped { row, col: 4, player_num: PlayerNum::One, .. } if row == BOARD_ROWS - 1
        ));
        match &events[1] {
            ServerMessage::GameWon(winner) => assert_eq!(winner.name, "Alice"),
            other => panic!("expected game_won, got {:?}", other),
        }
        assert!(!snapshot.game_started);
        assert!(matches!(snapshot.winner, Some(Outcome::Win(_))));
    }

    drop_piece(&mut bob, 0).await;
    assert!(matches!(
        recv(&mut bob).await,
        ServerMessage::Error { code: ErrorCode::GameOver, .. }
    ));
}

#[tokio::test]
async fn test_disconnect_resets_running_game() {
    let (addr, hub) = start_server().await;

    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;
    join(&mut alice, "Alice").await;
    until_snapshot(&mut alice).await;
    until_snapshot(&mut bob).await;
    join(&mut bob, "Bob").await;
    until_snapshot(&mut alice).await;
    until_snapshot(&mut bob).await;

    drop_piece(&mut alice, 7).await;
    until_snapshot(&mut alice).await;
    until_snapshot(&mut bob).await;

    bob.close().await.unwrap();
    drop(bob);

    let (_, snapshot) = until_snapshot(&mut alice).await;
    assert_eq!(snapshot.player_count, 1);
    assert!(!snapshot.game_started);
    assert!(snapshot.board.iter().flatten().all(|cell| cell.is_none()));
    assert_eq!(snapshot.players[0].name, "Alice");
    assert_eq!(hub.snapshot().await.player_count, 1);
}

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    let (addr, _hub) = start_server().await;
    let mut conn = connect(&addr).await;

    conn.send(&drop_without_column()).await.unwrap();
    assert!(matches!(
        recv(&mut conn).await,
        ServerMessage::Error { code: ErrorCode::MalformedMessage, .. }
    ));

    join(&mut conn, "Alice").await;
    assert!(matches!(recv(&mut conn).await, ServerMessage::Joined { .. }));
}

/// 缺少列号的落子请求
fn drop_without_column() -> std::collections::HashMap<&'static str, &'static str> {
    std::collections::HashMap::from([("event", "drop_piece")])
}
