// ═══════════════════════════════════════════════════════════════════
// Event Tests — timer, typed input and shutdown merging
// ═══════════════════════════════════════════════════════════════════

use std::time::Duration;

use pnl_monitor_cli::events::{Event, EventSource};
use tokio::sync::oneshot;

const PERIOD: Duration = Duration::from_secs(60);

#[tokio::test(start_paused = true)]
async fn typed_lines_arrive_in_order() {
    let input: &[u8] = b"r\nset AAA 1 2\n";
    let mut events = EventSource::new(PERIOD, input, std::future::pending::<()>());

    assert_eq!(events.next().await.unwrap(), Event::Line("r".into()));
    assert_eq!(events.next().await.unwrap(), Event::Line("set AAA 1 2".into()));
}

#[tokio::test(start_paused = true)]
async fn closed_input_leaves_timer_running() {
    let input: &[u8] = b"";
    let mut events = EventSource::new(PERIOD, input, std::future::pending::<()>());

    let start = tokio::time::Instant::now();
    assert_eq!(events.next().await.unwrap(), Event::Tick);
    assert!(start.elapsed() >= PERIOD);
    assert_eq!(events.next().await.unwrap(), Event::Tick);
}

#[tokio::test(start_paused = true)]
async fn shutdown_wins_over_pending_input() {
    let input: &[u8] = b"r\n";
    let mut events = EventSource::new(PERIOD, input, std::future::ready(()));

    assert_eq!(events.next().await.unwrap(), Event::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn signal_during_busy_pass_is_not_lost() {
    let (tx, rx) = oneshot::channel::<()>();
    let input: &[u8] = b"r\nh\n";
    let mut events = EventSource::new(PERIOD, input, rx);

    assert_eq!(events.next().await.unwrap(), Event::Line("r".into()));

    // Fires while the caller is handling the refresh, not waiting on next()
    tx.send(()).unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    assert_eq!(events.next().await.unwrap(), Event::Shutdown);
}

#[tokio::test(start_paused = true)]
async fn polling_after_shutdown_falls_back_to_timer() {
    let input: &[u8] = b"";
    let mut events = EventSource::new(PERIOD, input, std::future::ready(()));

    assert_eq!(events.next().await.unwrap(), Event::Shutdown);
    assert_eq!(events.next().await.unwrap(), Event::Tick);
}
