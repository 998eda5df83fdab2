use std::future::Future;
use std::io;
use std::pin::Pin;
use std::time::Duration;

use log::info;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// What woke the dashboard loop.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The refresh interval elapsed
    Tick,
    /// A line was typed
    Line(String),
    /// The shutdown signal fired
    Shutdown,
}

/// Merges the refresh timer, typed input and the shutdown signal.
///
/// The shutdown future is created once and kept across calls, so a signal
/// that arrives while the caller is busy rendering is reported by the next
/// call to [`EventSource::next`].
pub struct EventSource<R, S> {
    timer: Interval,
    lines: Option<Lines<BufReader<R>>>,
    shutdown: Pin<Box<S>>,
    shut_down: bool,
}

impl<R, S> EventSource<R, S>
where
    R: AsyncRead + Unpin,
    S: Future,
{
    /// The first tick fires one full period from now.
    pub fn new(every: Duration, input: R, shutdown: S) -> Self {
        let mut timer = tokio::time::interval_at(Instant::now() + every, every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self {
            timer,
            lines: Some(BufReader::new(input).lines()),
            shutdown: Box::pin(shutdown),
            shut_down: false,
        }
    }

    /// Wait for the next event. Shutdown wins over anything else pending.
    /// Once input reaches EOF only the timer and the signal remain.
    pub async fn next(&mut self) -> io::Result<Event> {
        loop {
            let line = tokio::select! {
                biased;
                _ = &mut self.shutdown, if !self.shut_down => None,
                _ = self.timer.tick() => return Ok(Event::Tick),
                line = next_line(&mut self.lines) => Some(line?),
            };

            match line {
                None => {
                    self.shut_down = true;
                    return Ok(Event::Shutdown);
                }
                Some(Some(line)) => return Ok(Event::Line(line)),
                Some(None) => {
                    info!("stdin closed; refreshing on the timer only");
                    self.lines = None;
                }
            }
        }
    }
}

async fn next_line<R>(lines: &mut Option<Lines<BufReader<R>>>) -> io::Result<Option<String>>
where
    R: AsyncRead + Unpin,
{
    match lines {
        Some(lines) => lines.next_line().await,
        None => std::future::pending().await,
    }
}
