//! Integration tests: the session engine end to end, over in-memory
//! duplex transports, a scripted mock stream and real localhost TCP.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use angler_core::{
    Advice, Advisor, AnglerError, Command, ConnectionInfo, Connector, GameConnection, GameState,
    InstantClock, Intent, NoopAdvisor, OperatorInput, ReconnectSupervisor, Session, SessionSettings,
    TcpConnector,
};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::net::TcpListener;
use tokio::sync::{Notify, mpsc};

// ── Helpers ──────────────────────────────────────────────────────

const PROMPT: &str = "Enter your Operative ID (invite code): ";

const INVENTORY: &str = "\
📦 Inventory for deltadax
💰 Gold: 1520
⭐ XP: 880
Fish:
🐟 Thunder Fin (legendary) - x2 - XP: 10, Gold: 50
🐟 Neptune's Carp (common) - x4 - XP: 1, Gold: 3
Items:
🧪 Poison of Delay
";

fn settings() -> SessionSettings {
    SessionSettings {
        invite_code: "ABC123".into(),
        ..SessionSettings::default()
    }
}

fn is_backoff(d: &Duration) -> bool {
    *d >= Duration::from_secs(31) && *d <= Duration::from_secs(45)
}

async fn ephemeral_listener() -> (TcpListener, ConnectionInfo) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let info = ConnectionInfo::new(addr.ip().to_string(), addr.port());
    (listener, info)
}

/// Hands out one prepared stream, then refuses.
struct OneShot(Mutex<Option<DuplexStream>>);

#[async_trait]
impl Connector for OneShot {
    async fn connect(&self) -> Result<GameConnection, AnglerError> {
        match self.0.lock().unwrap().take() {
            Some(stream) => Ok(GameConnection::new(stream)),
            None => Err(AnglerError::Other("server gone".into())),
        }
    }
}

/// Blocks every `Eat` consultation until released, counting calls.
#[derive(Default)]
struct Gate {
    release: Notify,
    eat_calls: AtomicUsize,
}

#[async_trait]
impl Advisor for Gate {
    async fn advise(&self, _snapshot: &GameState, intent: Intent) -> Result<Advice, AnglerError> {
        if intent == Intent::Eat {
            self.eat_calls.fetch_add(1, Ordering::SeqCst);
            self.release.notified().await;
        }
        Ok(Advice::NoAction)
    }
}

async fn yield_until(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached");
}

// ── Action loop ──────────────────────────────────────────────────

#[tokio::test]
async fn test_burst_accounting() {
    let clock = Arc::new(InstantClock::new());
    let session = Session::new(
        SessionSettings {
            inventory_every: 5,
            market_every: 7,
            ..settings()
        },
        Arc::new(NoopAdvisor),
        clock,
    );
    let (tx, mut rx) = mpsc::channel(1024);
    session.on_connecting().unwrap();
    session.on_connected(tx).unwrap();

    let handle = tokio::spawn(session.clone().run_action_loop());
    let mut sent = Vec::new();
    while let Some(command) = rx.recv().await {
        sent.push(command);
        if sent.iter().filter(|c| **c == Command::Fish).count() == 40 {
            session.stop_action_loop();
            break;
        }
    }
    handle.await.unwrap();
    while let Ok(command) = rx.try_recv() {
        sent.push(command);
    }

    let count = |wanted: Command| sent.iter().filter(|c| **c == wanted).count();
    let fish = count(Command::Fish);
    assert_eq!(fish as u64, session.action_count());
    assert_eq!(count(Command::Inventory), fish / 5);
    assert_eq!(count(Command::Market), fish / 7);
}

// ── Report handling ──────────────────────────────────────────────

#[tokio::test]
async fn test_repeated_inventory_report_is_idempotent() {
    let session = Session::new(settings(), Arc::new(NoopAdvisor), Arc::new(InstantClock::new()));
    let (tx, _rx) = mpsc::channel(64);
    session.on_connecting().unwrap();
    session.on_connected(tx).unwrap();

    session.handle_chunk(INVENTORY).await;
    yield_until(|| session.snapshot().gold == 1520 && !session.is_inventory_in_progress()).await;
    let first = session.snapshot();

    session.handle_chunk(INVENTORY).await;
    yield_until(|| !session.is_inventory_in_progress()).await;
    let second = session.snapshot();

    assert_eq!(first.gold, second.gold);
    assert_eq!(first.inventory, second.inventory);
    assert_eq!(first.fish_to_eat, second.fish_to_eat);
    assert_eq!(first.fish_to_sell, second.fish_to_sell);
    assert_eq!(second.future_gold, 2 * 50 + 4 * 3);
    assert_eq!(second.future_xp, 2 * 10 + 4);
}

#[tokio::test]
async fn test_overlapping_inventory_report_is_dropped() {
    let gate = Arc::new(Gate::default());
    let session = Session::new(settings(), gate.clone(), Arc::new(InstantClock::new()));
    let (tx, mut rx) = mpsc::channel(64);
    session.on_connecting().unwrap();
    session.on_connected(tx).unwrap();

    session.handle_chunk(INVENTORY).await;
    yield_until(|| gate.eat_calls.load(Ordering::SeqCst) == 1).await;
    assert!(session.is_inventory_in_progress());

    // Arrives while the first pass is still waiting on the advisor.
    session.handle_chunk(INVENTORY).await;
    gate.release.notify_one();
    yield_until(|| !session.is_inventory_in_progress()).await;
    assert_eq!(gate.eat_calls.load(Ordering::SeqCst), 1);

    let mut markets = 0;
    while let Ok(command) = rx.try_recv() {
        if command == Command::Market {
            markets += 1;
        }
    }
    assert_eq!(markets, 1);

    // Once the pass is over, the next report is handled again.
    session.handle_chunk(INVENTORY).await;
    yield_until(|| gate.eat_calls.load(Ordering::SeqCst) == 2).await;
    gate.release.notify_one();
}

#[tokio::test]
async fn test_silent_advisor_times_out_and_eating_still_happens() {
    struct Silent(AtomicUsize);

    #[async_trait]
    impl Advisor for Silent {
        async fn advise(&self, _snapshot: &GameState, _intent: Intent) -> Result<Advice, AnglerError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }
    }

    let advisor = Arc::new(Silent(AtomicUsize::new(0)));
    let session = Session::new(
        SessionSettings {
            advisor_timeout: Duration::from_millis(20),
            ..settings()
        },
        advisor.clone(),
        Arc::new(InstantClock::new()),
    );
    let (tx, mut rx) = mpsc::channel(64);
    session.on_connecting().unwrap();
    session.on_connected(tx).unwrap();

    session.handle_chunk(INVENTORY).await;
    yield_until(|| advisor.0.load(Ordering::SeqCst) == 2 && !session.is_inventory_in_progress())
        .await;

    session.handle_chunk(INVENTORY).await;
    yield_until(|| advisor.0.load(Ordering::SeqCst) == 4 && !session.is_inventory_in_progress())
        .await;

    let mut eats = 0;
    let mut markets = 0;
    while let Ok(command) = rx.try_recv() {
        match command {
            Command::Eat { .. } => eats += 1,
            Command::Market => markets += 1,
            _ => {}
        }
    }
    assert_eq!(eats, 2);
    assert_eq!(markets, 2);
    assert!(session.is_connected());
}

#[tokio::test]
async fn test_no_sentinel_market_writes_nothing() {
    struct SaysNo;

    #[async_trait]
    impl Advisor for SaysNo {
        async fn advise(&self, _snapshot: &GameState, _intent: Intent) -> Result<Advice, AnglerError> {
            Ok(Advice::from_reply("no"))
        }
    }

    let session = Session::new(settings(), Arc::new(SaysNo), Arc::new(InstantClock::new()));
    let (tx, mut rx) = mpsc::channel(64);
    session.on_connecting().unwrap();
    session.on_connected(tx).unwrap();

    session
        .handle_chunk("🛒 MARKET ITEMS\n[1] Potion - heals - 100 gold\n[2] Potion - heals - 80 gold\n")
        .await;
    yield_until(|| !session.snapshot().market.is_empty()).await;
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }

    let market = session.snapshot().market;
    assert_eq!(market.len(), 1);
    assert_eq!(market[0].price, 80);
    assert!(rx.try_recv().is_err());
}

// ── Transport ────────────────────────────────────────────────────

#[tokio::test]
async fn test_split_codepoints_are_reassembled() {
    let text = "You caught a 🐟 Thunder Fin!\n".as_bytes();
    let cut = text.iter().position(|b| *b == 0xF0).unwrap() + 2;
    let mock = tokio_test::io::Builder::new()
        .read(&text[..cut])
        .read(&text[cut..])
        .build();

    let mut conn = GameConnection::new(mock);
    let mut received = String::new();
    while let Some(chunk) = conn.recv().await {
        received.push_str(&chunk);
    }
    assert_eq!(received.as_bytes(), text);
}

#[tokio::test]
async fn test_close_mid_loop_halts_and_schedules_reconnect() {
    let (client, server) = tokio::io::duplex(4096);
    let clock = Arc::new(InstantClock::new());
    let session = Session::new(settings(), Arc::new(NoopAdvisor), clock.clone());
    let supervisor = ReconnectSupervisor::new(
        session.clone(),
        Arc::new(OneShot(Mutex::new(Some(client)))),
    );
    let shutdown = supervisor.shutdown_handle();
    let (_operator_tx, operator_rx) = mpsc::channel(8);

    let server_task = tokio::spawn(async move {
        let (rd, mut wr) = tokio::io::split(server);
        wr.write_all(format!("Welcome aboard!\n{PROMPT}").as_bytes())
            .await
            .unwrap();
        let mut lines = BufReader::new(rd).lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ABC123"));
        let mut fish = 0;
        while fish < 10 {
            if lines.next_line().await.unwrap().as_deref() == Some("/fish") {
                fish += 1;
            }
        }
        // Both halves dropped here: the server hangs up mid-loop.
    });
    let supervisor_task = tokio::spawn(async move { supervisor.run(operator_rx).await });

    server_task.await.unwrap();
    yield_until(|| clock.waits().iter().any(is_backoff)).await;
    assert!(!session.is_loop_active());

    let halted_at = session.action_count();
    assert!(halted_at >= 10);
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
    assert_eq!(session.action_count(), halted_at);

    shutdown.cancel();
    supervisor_task.await.unwrap();
    assert!(session.status().is_disconnected());
    assert!(clock.waits().iter().filter(|d| is_backoff(d)).count() >= 1);
}

#[tokio::test]
async fn test_tcp_session_scenario() {
    let (listener, info) = ephemeral_listener().await;
    let clock = Arc::new(InstantClock::new());
    let session = Session::new(settings(), Arc::new(NoopAdvisor), clock.clone());
    let supervisor = ReconnectSupervisor::new(
        session.clone(),
        Arc::new(TcpConnector::new(info, Duration::from_secs(5))),
    );
    let shutdown = supervisor.shutdown_handle();
    let (operator_tx, operator_rx) = mpsc::channel(8);
    let supervisor_task = tokio::spawn(async move { supervisor.run(operator_rx).await });

    let (mut stream, _) = tokio::time::timeout(Duration::from_secs(5), listener.accept())
        .await
        .expect("timeout")
        .unwrap();

    // Skip keystroke first, no newline.
    stream
        .write_all(b"Press any key now to skip animations\n")
        .await
        .unwrap();
    let mut key = [0u8; 1];
    stream.read_exact(&mut key).await.unwrap();
    assert_eq!(&key, b"s");

    let (rd, mut wr) = stream.split();
    let mut lines = BufReader::new(rd).lines();
    wr.write_all(PROMPT.as_bytes()).await.unwrap();
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("ABC123"));
    assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("/fish"));

    wr.write_all(b"Please wait 45 seconds before fishing again\n")
        .await
        .unwrap();
    yield_until(|| session.cooldown() == Duration::from_secs(45)).await;

    operator_tx.send(OperatorInput::StopLoop).await.unwrap();
    yield_until(|| !session.is_loop_active()).await;
    assert!(session.is_connected());

    shutdown.cancel();
    supervisor_task.await.unwrap();
    assert!(session.status().is_disconnected());
}
