//! Offline replay of recorded readings
//!
//! Drives the same classifier as the live engine, but ticks on the
//! recording's own timeline: the first tick falls one interval after the
//! first reading and due ticks run before the next reading is pushed. Across
//! a gap only the first due tick is evaluated; the rest are counted.

use classifier::ClassifierState;
use contracts::{ActivityChanged, EngineConfig, SensorReading};
use hub::ActivitySubscriptionHub;
use tracing::{debug, info};

use crate::error::EngineError;

/// What a replay produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplaySummary {
    pub readings: u64,
    pub ticks: u64,
    pub events: Vec<ActivityChanged>,
    pub out_of_order: u64,
    pub unjoined_gyro: u64,
}

/// Replay `readings` in order, publishing every change through `hub`.
///
/// Event timestamps are tick times on the recording's timeline. A final
/// tick classifies samples that arrived after the last scheduled one.
pub fn replay<I>(
    config: EngineConfig,
    readings: I,
    hub: &ActivitySubscriptionHub,
) -> Result<ReplaySummary, EngineError>
where
    I: IntoIterator<Item = SensorReading>,
{
    config_loader::validate_engine(&config)?;

    let interval = config.tick_interval_ms.max(1);
    let mut classifier = ClassifierState::new(config);
    let mut summary = ReplaySummary::default();
    let mut started = false;
    // None once the schedule runs past u64::MAX
    let mut next_tick: Option<u64> = None;

    let run_tick = |classifier: &mut ClassifierState, at: u64, summary: &mut ReplaySummary| {
        summary.ticks += 1;
        if let Some(event) = classifier.tick(at) {
            hub.notify(&event);
            summary.events.push(event);
        }
    };

    for reading in readings {
        let ts = reading.timestamp_ms;
        if !started {
            started = true;
            next_tick = ts.checked_add(interval);
        }

        if let Some(due) = next_tick.filter(|&due| due <= ts) {
            // the buffer is unchanged across a gap, so only the first due tick can emit
            run_tick(&mut classifier, due, &mut summary);
            let skipped = (ts - due) / interval;
            if skipped > 0 {
                debug!(from = due, skipped, "gap in recording, skipping idle ticks");
                summary.ticks += skipped;
            }
            next_tick = skipped
                .checked_add(1)
                .and_then(|slots| slots.checked_mul(interval))
                .and_then(|offset| due.checked_add(offset));
        }

        classifier.push_reading(&reading);
        summary.readings += 1;
    }

    if started {
        let at = next_tick.unwrap_or(u64::MAX);
        debug!(at, "final replay tick");
        run_tick(&mut classifier, at, &mut summary);
    }

    summary.out_of_order = classifier.buffer().out_of_order_count();
    summary.unjoined_gyro = classifier.dropped_gyro_count();

    info!(
        readings = summary.readings,
        ticks = summary.ticks,
        events = summary.events.len(),
        "replay finished"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ActivityLabel;
    use std::f64::consts::TAU;

    fn walking(from: u64, to: u64) -> Vec<SensorReading> {
        (from..to)
            .flat_map(|i| {
                let t = i as f64 * 0.1;
                let ts = i * 100;
                [
                    SensorReading::accelerometer(0.5, 0.5, 1.0 + 1.2 * (TAU * 1.5 * t).sin(), ts),
                    SensorReading::gyroscope(0.2, 0.2 * (TAU * 1.5 * t).cos(), 0.1, ts + 10),
                ]
            })
            .collect()
    }

    fn still(from: u64, to: u64) -> Vec<SensorReading> {
        (from..to)
            .map(|i| SensorReading::accelerometer(0.0, 0.0, 0.15, i * 100))
            .collect()
    }

    #[test]
    fn test_replay_walk_then_rest() {
        let mut readings = walking(0, 60);
        readings.extend(still(60, 120));

        let hub = ActivitySubscriptionHub::new();
        let summary = replay(EngineConfig::default(), readings, &hub).unwrap();

        let labels: Vec<_> = summary.events.iter().map(|e| e.label).collect();
        assert_eq!(labels, vec![ActivityLabel::Walking, ActivityLabel::Idle]);
        assert_eq!(summary.readings, 180);
        // ticks at 2000, 4000, ..., 10000 and a final one at 12000
        assert_eq!(summary.ticks, 6);
        assert_eq!(summary.events[0].timestamp_ms, 2_000);
        assert_eq!(summary.unjoined_gyro, 0);
    }

    #[test]
    fn test_replay_empty() {
        let hub = ActivitySubscriptionHub::new();
        let summary = replay(EngineConfig::default(), Vec::new(), &hub).unwrap();
        assert_eq!(summary, ReplaySummary::default());
    }

    #[test]
    fn test_replay_notifies_hub() {
        let hub = ActivitySubscriptionHub::new();
        let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = std::sync::Arc::clone(&seen);
        hub.subscribe_fn("count", move |_| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(())
        });

        let summary = replay(EngineConfig::default(), walking(0, 30), &hub).unwrap();
        assert_eq!(summary.events.len(), 1);
        assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_replay_gap_skips_idle_ticks() {
        const RESUME: u64 = 1_000_000_000_000;
        let mut readings = walking(0, 30);
        readings.extend(
            (0..30).map(|i| SensorReading::accelerometer(0.0, 0.0, 0.15, RESUME + i * 100)),
        );

        let hub = ActivitySubscriptionHub::new();
        let summary = replay(EngineConfig::default(), readings, &hub).unwrap();

        let changes: Vec<_> = summary
            .events
            .iter()
            .map(|e| (e.label, e.timestamp_ms))
            .collect();
        assert_eq!(
            changes,
            vec![
                (ActivityLabel::Walking, 2_000),
                (ActivityLabel::Idle, RESUME + 2_000)
            ]
        );
        // every slot from 4000 up to RESUME counts, plus RESUME + 2000 and the final tick
        assert_eq!(summary.ticks, 1 + (RESUME - 4_000) / 2_000 + 1 + 1 + 1);
    }

    #[test]
    fn test_replay_near_u64_max() {
        let readings = vec![
            SensorReading::accelerometer(0.0, 0.0, 0.15, u64::MAX - 500),
            SensorReading::accelerometer(0.0, 0.0, 0.15, u64::MAX),
        ];

        let hub = ActivitySubscriptionHub::new();
        let summary = replay(EngineConfig::default(), readings, &hub).unwrap();
        assert_eq!(summary.readings, 2);
        assert_eq!(summary.ticks, 1);
        assert!(summary.events.is_empty());
    }

    #[test]
    fn test_replay_counts_out_of_order() {
        let mut readings = still(0, 15);
        readings.push(SensorReading::accelerometer(0.0, 0.0, 0.15, 50));

        let hub = ActivitySubscriptionHub::new();
        let summary = replay(EngineConfig::default(), readings, &hub).unwrap();
        assert_eq!(summary.out_of_order, 1);
    }
}
