use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tracing::debug;

use crate::custom_questions::models::clamp_timer_seconds;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Tick { epoch: u64, remaining: u32 },
    Expired { epoch: u64 },
}

impl TimerEvent {
    /// Bumped by every `reset`, so events from an earlier countdown can be told apart.
    pub fn epoch(&self) -> u64 {
        match self {
            TimerEvent::Tick { epoch, .. } | TimerEvent::Expired { epoch } => *epoch,
        }
    }
}

#[derive(Debug)]
struct TimerState {
    remaining: u32,
    running: bool,
}

/// Countdown clock with a single ticking task.
pub struct Timer {
    state: Arc<Mutex<TimerState>>,
    events: UnboundedSender<TimerEvent>,
    ticker: Option<JoinHandle<()>>,
    period: Duration,
    epoch: u64,
}

impl Timer {
    pub fn new(seconds: i64) -> (Self, UnboundedReceiver<TimerEvent>) {
        Self::with_period(seconds, Duration::from_secs(1))
    }

    pub fn with_period(seconds: i64, period: Duration) -> (Self, UnboundedReceiver<TimerEvent>) {
        let (events, receiver) = unbounded_channel();
        let timer = Self {
            state: Arc::new(Mutex::new(TimerState {
                remaining: clamp_timer_seconds(seconds) as u32,
                running: false,
            })),
            events,
            ticker: None,
            period,
            epoch: 0,
        };

        (timer, receiver)
    }

    pub fn remaining(&self) -> u32 {
        lock(&self.state).remaining
    }

    pub fn running(&self) -> bool {
        lock(&self.state).running
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// No-op while already ticking or when the countdown is at zero.
    pub fn start(&mut self) {
        {
            let mut state = lock(&self.state);
            if state.remaining == 0 {
                return;
            }

            let ticking = self.ticker.as_ref().is_some_and(|h| !h.is_finished());
            if state.running && ticking {
                return;
            }

            state.running = true;
        }

        self.stop_ticker();
        self.ticker = Some(self.spawn_ticker());
        debug!("Timer started with {} seconds left", self.remaining());
    }

    pub fn pause(&mut self) {
        lock(&self.state).running = false;
        self.stop_ticker();
    }

    pub fn toggle(&mut self) {
        if self.running() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Stops the clock and sets it to `seconds`, clamped to [10, 3600].
    pub fn reset(&mut self, seconds: i64) {
        self.stop_ticker();
        self.epoch += 1;

        let mut state = lock(&self.state);
        state.running = false;
        state.remaining = clamp_timer_seconds(seconds) as u32;
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    fn spawn_ticker(&self) -> JoinHandle<()> {
        let state = self.state.clone();
        let events = self.events.clone();
        let period = self.period;
        let epoch = self.epoch;

        tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                interval.tick().await;

                let remaining = {
                    let mut state = lock(&state);
                    if !state.running {
                        break;
                    }

                    state.remaining = state.remaining.saturating_sub(1);
                    if state.remaining == 0 {
                        state.running = false;
                    }
                    state.remaining
                };

                if events.send(TimerEvent::Tick { epoch, remaining }).is_err() {
                    break;
                }

                if remaining == 0 {
                    debug!("Timer expired");
                    let _ = events.send(TimerEvent::Expired { epoch });
                    break;
                }
            }
        })
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

fn lock(state: &Mutex<TimerState>) -> MutexGuard<'_, TimerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `MM:SS`, minutes are not wrapped into hours.
pub fn format_time(total: u32) -> String {
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    fn drain(receiver: &mut UnboundedReceiver<TimerEvent>) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn counts_down_once_per_second() {
        let (mut timer, _rx) = Timer::new(10);
        timer.start();

        sleep(Duration::from_millis(3_500)).await;

        assert_eq!(timer.remaining(), 7);
        assert!(timer.running());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_keeps_remaining() {
        let (mut timer, _rx) = Timer::new(10);
        timer.start();
        sleep(Duration::from_millis(2_500)).await;

        timer.pause();
        let frozen = timer.remaining();
        sleep(Duration::from_secs(5)).await;

        assert_eq!(frozen, 8);
        assert_eq!(timer.remaining(), frozen);
        assert!(!timer.running());
    }

    #[tokio::test(start_paused = true)]
    async fn starting_twice_does_not_double_tick() {
        let (mut timer, _rx) = Timer::new(10);
        timer.start();
        timer.start();

        sleep(Duration::from_millis(3_500)).await;
        timer.start();
        sleep(Duration::from_secs(1)).await;

        assert_eq!(timer.remaining(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_at_zero_and_reports_expiry() {
        let (mut timer, mut rx) = Timer::new(10);
        timer.start();

        sleep(Duration::from_secs(15)).await;

        assert_eq!(timer.remaining(), 0);
        assert!(!timer.running());

        let events = drain(&mut rx);
        let ticks: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::Tick { remaining, .. } => Some(*remaining),
                _ => None,
            })
            .collect();

        assert_eq!(ticks, (0..10).rev().collect::<Vec<u32>>());
        assert_eq!(events.last(), Some(&TimerEvent::Expired { epoch: 0 }));

        timer.start();
        sleep(Duration::from_secs(2)).await;
        assert!(!timer.running());
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn remaining_never_increases_while_running() {
        let (mut timer, _rx) = Timer::new(12);
        timer.start();

        let mut last = timer.remaining();
        for _ in 0..30 {
            sleep(Duration::from_millis(700)).await;
            let now = timer.remaining();
            assert!(now <= last);
            last = now;
        }
        assert_eq!(last, 0);
    }

    #[tokio::test]
    async fn reset_clamps_and_stops() {
        let (mut timer, _rx) = Timer::new(60);
        timer.start();

        timer.reset(5);
        assert_eq!(timer.remaining(), 10);
        assert!(!timer.running());
        assert_eq!(timer.epoch(), 1);

        timer.reset(10_000);
        assert_eq!(timer.remaining(), 3600);
        assert_eq!(timer.epoch(), 2);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(3600), "60:00");
    }
}
