//! ActivityEngine - periodic classification loop
//!
//! One mutex guards the classifier state and the loop phase. Sample pushes
//! and ticks both take it, so they never interleave. `stop()` flips the
//! phase under the same mutex before aborting the timer task, so once it
//! returns no tick can run.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use classifier::ClassifierState;
use contracts::{
    ActivityChanged, ActivityLabel, ActivityListener, EngineConfig, SensorReading, Vector3,
};
use hub::{ActivitySubscriptionHub, SubscriptionToken};
use metrics::counter;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument, trace, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::EngineError;

/// Externally visible loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Stopped,
    Running(ActivityLabel),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Stopped,
    Running,
}

struct LoopState {
    phase: Phase,
    classifier: ClassifierState,
    /// Bumped on every start; a timer task only ticks for its own run
    generation: u64,
}

struct Shared {
    state: Mutex<LoopState>,
    hub: Arc<ActivitySubscriptionHub>,
    clock: Arc<dyn Clock>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, LoopState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Timer callback. Returns false once the run it belongs to is over.
    fn scheduled_tick(&self, generation: u64) -> bool {
        let mut state = self.lock();
        if state.phase != Phase::Running || state.generation != generation {
            return false;
        }
        self.tick_locked(&mut state);
        true
    }

    fn tick_locked(&self, state: &mut LoopState) -> Option<ActivityChanged> {
        let now_ms = self.clock.now_ms();
        let event = state.classifier.tick(now_ms)?;

        let report = self.hub.notify(&event);
        if !report.all_delivered() {
            warn!(
                label = %event.label,
                failed = report.failed,
                "some listeners failed to handle activity change"
            );
        }
        counter!("engine_activity_changes_total").increment(1);
        Some(event)
    }
}

/// Builder for [`ActivityEngine`]
pub struct EngineBuilder {
    config: EngineConfig,
    hub: Option<Arc<ActivitySubscriptionHub>>,
    clock: Option<Arc<dyn Clock>>,
}

impl EngineBuilder {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            hub: None,
            clock: None,
        }
    }

    /// Share an existing hub instead of creating one
    pub fn hub(mut self, hub: Arc<ActivitySubscriptionHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Source of event timestamps (defaults to [`SystemClock`])
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate the config and build a stopped engine
    pub fn build(self) -> Result<ActivityEngine, EngineError> {
        config_loader::validate_engine(&self.config)?;

        let hub = self
            .hub
            .unwrap_or_else(|| Arc::new(ActivitySubscriptionHub::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(ActivityEngine {
            config: self.config,
            shared: Arc::new(Shared {
                state: Mutex::new(LoopState {
                    phase: Phase::Stopped,
                    classifier: ClassifierState::new(self.config),
                    generation: 0,
                }),
                hub,
                clock,
            }),
            timer: Mutex::new(None),
        })
    }
}

/// Activity classification engine.
///
/// Samples pushed while running are buffered; every `tick_interval_ms` the
/// most recent window is classified and a label change is published through
/// the subscription hub.
///
/// Listeners run on the tick task while the engine is locked: they must not
/// call back into the same engine. Anything slow or re-entrant belongs
/// behind a [`hub::SinkHandle`].
pub struct ActivityEngine {
    config: EngineConfig,
    shared: Arc<Shared>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl ActivityEngine {
    /// Engine with its own hub and the system clock
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        EngineBuilder::new(config).build()
    }

    pub fn builder(config: EngineConfig) -> EngineBuilder {
        EngineBuilder::new(config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn hub(&self) -> &Arc<ActivitySubscriptionHub> {
        &self.shared.hub
    }

    pub fn subscribe(&self, listener: Arc<dyn ActivityListener>) -> SubscriptionToken {
        self.shared.hub.subscribe(listener)
    }

    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        self.shared.hub.unsubscribe(token)
    }

    /// `Stopped -> Running(Idle)`: clears the buffer and arms the timer.
    ///
    /// Calling it while running is a no-op.
    #[instrument(name = "engine_start", skip(self), fields(tick_interval_ms = self.config.tick_interval_ms))]
    pub fn start(&self) -> Result<(), EngineError> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| EngineError::NoRuntime)?;

        let generation = {
            let mut state = self.shared.lock();
            if state.phase == Phase::Running {
                debug!("engine already running");
                return Ok(());
            }
            state.classifier.reset();
            state.phase = Phase::Running;
            state.generation += 1;
            state.generation
        };

        let period = Duration::from_millis(self.config.tick_interval_ms.max(1));
        let shared = Arc::clone(&self.shared);
        let task = runtime.spawn(run_timer(shared, generation, period));

        if let Some(previous) = self.timer_slot().replace(task) {
            previous.abort();
        }

        info!(generation, "activity engine started");
        Ok(())
    }

    /// `Running(_) -> Stopped`. Idempotent; the buffer is left as is.
    #[instrument(name = "engine_stop", skip(self))]
    pub fn stop(&self) {
        let was_running = {
            let mut state = self.shared.lock();
            let was_running = state.phase == Phase::Running;
            state.phase = Phase::Stopped;
            was_running
        };

        if let Some(task) = self.timer_slot().take() {
            task.abort();
        }

        if was_running {
            info!("activity engine stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.lock().phase == Phase::Running
    }

    pub fn state(&self) -> EngineState {
        let state = self.shared.lock();
        match state.phase {
            Phase::Stopped => EngineState::Stopped,
            Phase::Running => EngineState::Running(state.classifier.current_label()),
        }
    }

    /// Label of the last emitted change (`Idle` after start)
    pub fn current_label(&self) -> ActivityLabel {
        self.shared.lock().classifier.current_label()
    }

    pub fn push_accelerometer_sample(&self, x: f64, y: f64, z: f64, timestamp_ms: u64) {
        self.with_running(|classifier| {
            classifier.push_accelerometer(Vector3::new(x, y, z), timestamp_ms);
        });
    }

    pub fn push_gyroscope_sample(&self, x: f64, y: f64, z: f64, timestamp_ms: u64) {
        self.with_running(|classifier| {
            classifier.push_gyroscope(Vector3::new(x, y, z), timestamp_ms);
        });
    }

    /// Push any reading kind
    pub fn push_reading(&self, reading: &SensorReading) {
        self.with_running(|classifier| {
            classifier.push_reading(reading);
        });
    }

    /// Run one tick immediately, outside the timer schedule.
    ///
    /// Returns the emitted change, if any. Does nothing while stopped.
    pub fn tick_now(&self) -> Option<ActivityChanged> {
        let mut state = self.shared.lock();
        if state.phase != Phase::Running {
            return None;
        }
        self.shared.tick_locked(&mut state)
    }

    pub fn buffer_len(&self) -> usize {
        self.shared.lock().classifier.buffer().len()
    }

    pub fn tick_count(&self) -> u64 {
        self.shared.lock().classifier.tick_count()
    }

    fn with_running(&self, push: impl FnOnce(&mut ClassifierState)) {
        let mut state = self.shared.lock();
        if state.phase == Phase::Running {
            push(&mut state.classifier);
        } else {
            trace!("sample ignored while stopped");
            counter!("engine_samples_ignored_total").increment(1);
        }
    }

    fn timer_slot(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ActivityEngine {
    fn drop(&mut self) {
        if let Some(task) = self.timer_slot().take() {
            task.abort();
        }
    }
}

/// Fixed-interval timer; a stalled runtime delays ticks rather than bursting
async fn run_timer(shared: Arc<Shared>, generation: u64, period: Duration) {
    let mut interval = time::interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if !shared.scheduled_tick(generation) {
            break;
        }
    }
    debug!(generation, "classification timer exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::f64::consts::TAU;

    fn walking(engine: &ActivityEngine, start: u64, count: u64) {
        for i in start..start + count {
            let t = i as f64 * 0.1;
            let ts = i * 100;
            engine.push_accelerometer_sample(0.5, 0.5, 1.0 + 1.2 * (TAU * 1.5 * t).sin(), ts);
            engine.push_gyroscope_sample(0.2, 0.2 * (TAU * 1.5 * t).cos(), 0.1, ts + 10);
        }
    }

    fn recording_engine(config: EngineConfig) -> (ActivityEngine, Arc<Mutex<Vec<ActivityChanged>>>) {
        let clock = Arc::new(ManualClock::new(5_000));
        let engine = ActivityEngine::builder(config).clock(clock).build().unwrap();
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        engine.hub().subscribe_fn("recorder", move |e| {
            sink.lock().unwrap().push(*e);
            Ok(())
        });
        (engine, events)
    }

    #[test]
    fn test_start_requires_runtime() {
        let engine = ActivityEngine::new(EngineConfig::default()).unwrap();
        assert!(matches!(engine.start(), Err(EngineError::NoRuntime)));
        assert!(!engine.is_running());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = EngineConfig {
            window_size: 100,
            ..Default::default()
        };
        assert!(matches!(ActivityEngine::new(config), Err(EngineError::Config(_))));
    }

    #[tokio::test]
    async fn test_samples_ignored_while_stopped() {
        let engine = ActivityEngine::new(EngineConfig::default()).unwrap();
        engine.push_accelerometer_sample(0.0, 0.0, 1.0, 0);
        assert_eq!(engine.buffer_len(), 0);
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.tick_now(), None);
    }

    #[tokio::test]
    async fn test_tick_now_emits_on_change() {
        let (engine, events) = recording_engine(EngineConfig::default());
        engine.start().unwrap();
        assert_eq!(engine.state(), EngineState::Running(ActivityLabel::Idle));

        walking(&engine, 0, 20);
        let event = engine.tick_now().unwrap();
        assert_eq!(event.label, ActivityLabel::Walking);
        assert_eq!(event.timestamp_ms, 5_000);
        assert_eq!(engine.tick_now(), None);

        assert_eq!(events.lock().unwrap().len(), 1);
        assert_eq!(engine.state(), EngineState::Running(ActivityLabel::Walking));
        engine.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_periodic_tick() {
        let (engine, events) = recording_engine(EngineConfig::default());
        engine.start().unwrap();
        walking(&engine, 0, 20);

        time::sleep(Duration::from_millis(1_999)).await;
        assert_eq!(engine.tick_count(), 0);

        time::sleep(Duration::from_millis(2)).await;
        assert_eq!(engine.tick_count(), 1);
        assert_eq!(events.lock().unwrap()[0].label, ActivityLabel::Walking);

        time::sleep(Duration::from_millis(4_000)).await;
        assert_eq!(engine.tick_count(), 3);
        // Still walking: edge-triggered, nothing new
        assert_eq!(events.lock().unwrap().len(), 1);
        engine.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_after_stop() {
        let (engine, events) = recording_engine(EngineConfig::default());
        engine.start().unwrap();
        walking(&engine, 0, 20);

        engine.stop();
        engine.stop();
        time::sleep(Duration::from_secs(10)).await;

        assert_eq!(engine.tick_count(), 0);
        assert!(events.lock().unwrap().is_empty());
        // stop() leaves the buffer alone
        assert_eq!(engine.buffer_len(), 20);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_state() {
        let (engine, events) = recording_engine(EngineConfig::default());
        engine.start().unwrap();
        walking(&engine, 0, 20);
        engine.tick_now();
        engine.stop();

        engine.start().unwrap();
        assert_eq!(engine.buffer_len(), 0);
        assert_eq!(engine.current_label(), ActivityLabel::Idle);

        // Double start keeps a single timer running
        engine.start().unwrap();
        time::sleep(Duration::from_millis(2_001)).await;
        assert_eq!(engine.tick_count(), 2);
        assert_eq!(events.lock().unwrap().len(), 1);
        engine.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_listener_does_not_stop_loop() {
        let (engine, events) = recording_engine(EngineConfig::default());
        engine.hub().subscribe_fn("broken", |_| panic!("listener bug"));
        engine.start().unwrap();

        walking(&engine, 0, 20);
        time::sleep(Duration::from_millis(2_001)).await;
        assert_eq!(events.lock().unwrap().len(), 1);

        // The loop keeps ticking after the panic
        time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(engine.tick_count(), 2);
        assert!(engine.is_running());
        engine.stop();
    }
}
