//! Tick driver background task

use std::{
    sync::{Arc, Mutex},
    time::Duration,
};
use tokio::{
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};
use tracing::{debug, error, info};

use crate::state::AppState;

/// Default tick period
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct DriverSlot {
    consumers: usize,
    handle: Option<JoinHandle<()>>,
}

/// Single repeating trigger that runs while at least one consumer is mounted.
///
/// Remaining time is derived from each timer's end timestamp, so stopping and
/// restarting the driver loses nothing: the first tick after a restart catches
/// every running timer up.
#[derive(Debug)]
pub struct TickDriver {
    state: Arc<AppState>,
    period: Duration,
    slot: Mutex<DriverSlot>,
}

impl TickDriver {
    pub fn new(state: Arc<AppState>, period: Duration) -> Self {
        Self {
            state,
            period,
            slot: Mutex::new(DriverSlot::default()),
        }
    }

    /// Register a consumer; the first one starts the trigger.
    ///
    /// Must be called from within a tokio runtime.
    pub fn mount(&self) {
        let Ok(mut slot) = self.slot.lock() else {
            error!("Tick driver lock poisoned, not mounting");
            return;
        };
        slot.consumers += 1;
        if slot.handle.is_none() {
            info!("Starting tick driver ({}ms period)", self.period.as_millis());
            let state = Arc::clone(&self.state);
            slot.handle = Some(tokio::spawn(tick_task(state, self.period)));
        }
    }

    /// Drop a consumer; the last one cancels the trigger
    pub fn unmount(&self) {
        let Ok(mut slot) = self.slot.lock() else {
            error!("Tick driver lock poisoned, not unmounting");
            return;
        };
        slot.consumers = slot.consumers.saturating_sub(1);
        if slot.consumers == 0 {
            if let Some(handle) = slot.handle.take() {
                info!("Stopping tick driver");
                handle.abort();
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.handle.is_some())
            .unwrap_or(false)
    }

    pub fn consumers(&self) -> usize {
        self.slot.lock().map(|slot| slot.consumers).unwrap_or(0)
    }
}

impl Drop for TickDriver {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(handle) = slot.handle.take() {
                handle.abort();
            }
        }
    }
}

/// Tick the engine once per period; late periods are skipped, not replayed
async fn tick_task(state: Arc<AppState>, period: Duration) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        match state.tick() {
            Ok(finished) if !finished.is_empty() => {
                debug!("Tick finished {} timers", finished.len());
            }
            Ok(_) => {}
            Err(e) => error!("Failed to tick timers: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alerts::{CompletionCoordinator, Silent},
        persistence::{KeyValueStore, MemoryStore, TimerPersistence, TIMERS_KEY},
        state::{Association, TimerStore},
        utils::ManualClock,
    };
    use chrono::Utc;

    fn app(clock: Arc<ManualClock>) -> Arc<AppState> {
        let slots: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        let store = TimerStore::load(TimerPersistence::new(Arc::clone(&slots)), TIMERS_KEY);
        let coordinator =
            CompletionCoordinator::new(Arc::new(Silent), Arc::new(Silent), Arc::new(Silent));
        Arc::new(AppState::new(store, coordinator, clock, slots, "127.0.0.1".into(), 0))
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_running_timers_while_mounted() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let state = app(clock.clone());
        let id = state.create_timer(30.0, Association::default(), None).unwrap();
        state.start_timer(&id).unwrap();

        let driver = TickDriver::new(Arc::clone(&state), DEFAULT_TICK_PERIOD);
        driver.mount();
        assert!(driver.is_running());

        clock.advance(chrono::Duration::seconds(12));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(state.get_timer(&id).unwrap().unwrap().remaining, 18);
    }

    #[tokio::test(start_paused = true)]
    async fn last_unmount_stops_and_remount_catches_up() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let state = app(clock.clone());
        let id = state.create_timer(60.0, Association::default(), None).unwrap();
        state.start_timer(&id).unwrap();

        let driver = TickDriver::new(Arc::clone(&state), DEFAULT_TICK_PERIOD);
        driver.mount();
        driver.mount();
        driver.unmount();
        assert!(driver.is_running());
        driver.unmount();
        assert!(!driver.is_running());
        assert_eq!(driver.consumers(), 0);

        clock.advance(chrono::Duration::seconds(45));
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(state.get_timer(&id).unwrap().unwrap().remaining, 60);

        driver.mount();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(state.get_timer(&id).unwrap().unwrap().remaining, 15);
    }
}
