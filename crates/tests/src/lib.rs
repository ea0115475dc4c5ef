//! # Integration Tests
//!
//! Cross-crate end-to-end tests.
//!
//! Covers:
//! - Contract snapshots (labels, config defaults, wire format)
//! - Simulated motion → classifier → hub → sinks, offline and live
//! - Config files driving the engine

#[cfg(test)]
mod contract_tests {
    use contracts::{ActivityChanged, ActivityLabel, EngineConfig, ReadingKind, SensorReading};

    #[test]
    fn test_label_tie_break_order() {
        assert_eq!(
            ActivityLabel::ALL,
            [
                ActivityLabel::Idle,
                ActivityLabel::Walking,
                ActivityLabel::Running,
                ActivityLabel::Cycling,
                ActivityLabel::Driving,
                ActivityLabel::Sleeping,
            ]
        );
    }

    #[test]
    fn test_event_wire_format() {
        let event = ActivityChanged {
            label: ActivityLabel::Cycling,
            confidence: 0.7,
            timestamp_ms: 12_000,
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"label": "cycling", "confidence": 0.7, "timestamp_ms": 12000})
        );
    }

    #[test]
    fn test_reading_wire_format() {
        let reading: SensorReading = serde_json::from_str(
            r#"{"kind":"gyroscope","x":0.1,"y":0.2,"z":0.3,"timestamp_ms":1030}"#,
        )
        .unwrap();
        assert_eq!(reading.kind, ReadingKind::Gyroscope);
        assert_eq!(reading.timestamp_ms, 1030);
    }

    #[test]
    fn test_engine_defaults() {
        let config = EngineConfig::default();
        assert_eq!(
            (
                config.window_size,
                config.tick_interval_ms,
                config.buffer_capacity,
                config.min_samples_for_classification,
                config.join_window_ms,
            ),
            (20, 2000, 50, 10, 50)
        );
        assert_eq!(config.confidence_floor, 0.3);
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../configs/monitor.toml");
        let config = config_loader::ConfigLoader::load_from_path(&path).unwrap();

        assert_eq!(config.engine, EngineConfig::default());
        assert_eq!(config.sinks.len(), 2);
        assert_eq!(config.sinks[1].params["path"], "activity_history.jsonl");
        assert_eq!(config.observability.metrics_port, None);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::io::{BufRead, BufReader};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use classifier::ClassifierState;
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ActivityChanged, ActivityLabel, EngineConfig, SinkConfig, SinkType};
    use engine::{replay, ActivityEngine, ManualClock};
    use hub::{ActivitySubscriptionHub, HistoryRecord};
    use ingestion::{MotionScript, SimulatedMotionSource, SimulatedSourceConfig};
    use observability::ActivityMetricsAggregator;

    fn offline_source(script: &str) -> SimulatedMotionSource {
        let config = SimulatedSourceConfig {
            seed: Some(42),
            realtime: false,
            ..Default::default()
        };
        SimulatedMotionSource::new(MotionScript::parse(script).unwrap(), config).unwrap()
    }

    fn labels(events: &[ActivityChanged]) -> Vec<ActivityLabel> {
        events.iter().map(|e| e.label).collect()
    }

    /// Simulated source → replay → every profile recognised in order
    #[test]
    fn test_e2e_every_profile_recognised() {
        let readings = offline_source(
            "walking:8,running:8,cycling:8,driving:8,sleeping:8,idle:8",
        )
        .readings()
        .unwrap();

        let hub = ActivitySubscriptionHub::new();
        let summary = replay(EngineConfig::default(), readings, &hub).unwrap();

        assert_eq!(
            labels(&summary.events),
            vec![
                ActivityLabel::Walking,
                ActivityLabel::Running,
                ActivityLabel::Cycling,
                ActivityLabel::Driving,
                ActivityLabel::Sleeping,
                ActivityLabel::Idle,
            ]
        );
        let timestamps: Vec<_> = summary.events.iter().map(|e| e.timestamp_ms).collect();
        assert_eq!(timestamps, vec![2_000, 10_000, 18_000, 26_000, 34_000, 42_000]);
        assert!(summary.events.iter().all(|e| e.confidence == 1.0));
        assert_eq!(summary.ticks, 24);
        assert_eq!(summary.out_of_order, 0);
    }

    /// Same readings, same events
    #[test]
    fn test_e2e_replay_is_deterministic() {
        let source = offline_source("walking:20,running:20");
        let hub = ActivitySubscriptionHub::new();

        let first = replay(EngineConfig::default(), source.readings().unwrap(), &hub).unwrap();
        let second = replay(EngineConfig::default(), source.readings().unwrap(), &hub).unwrap();

        assert_eq!(first, second);
        assert_eq!(
            labels(&first.events),
            vec![ActivityLabel::Walking, ActivityLabel::Running]
        );
        assert_eq!(first.events[1].timestamp_ms, 22_000);
    }

    /// Recording written to disk and read back replays identically
    #[test]
    fn test_e2e_recording_round_trip() {
        let readings = offline_source("cycling:6,idle:6").readings().unwrap();

        let file = tempfile::NamedTempFile::new().unwrap();
        let written =
            ingestion::recording::write_readings(std::fs::File::create(file.path()).unwrap(), &readings)
                .unwrap();
        assert_eq!(written, readings.len());

        let loaded = ingestion::recording::read_readings(BufReader::new(
            std::fs::File::open(file.path()).unwrap(),
        ))
        .unwrap();
        assert_eq!(loaded, readings);

        let hub = ActivitySubscriptionHub::new();
        let summary = replay(EngineConfig::default(), loaded, &hub).unwrap();
        assert_eq!(
            labels(&summary.events),
            vec![ActivityLabel::Cycling, ActivityLabel::Idle]
        );
    }

    /// Step-count readings ride along without creating samples
    #[test]
    fn test_e2e_step_counts_do_not_create_samples() {
        let config = SimulatedSourceConfig {
            seed: Some(3),
            realtime: false,
            emit_step_counts: true,
            ..Default::default()
        };
        let source =
            SimulatedMotionSource::new(MotionScript::parse("walking:5").unwrap(), config).unwrap();

        let mut state = ClassifierState::new(EngineConfig::default());
        for reading in source.generator().unwrap() {
            state.push_reading(&reading);
        }

        // pedometer readings at 1 s .. 4 s, attached to the sample they share a timestamp with
        assert_eq!(state.buffer().len(), 50);
        let hinted = state
            .buffer()
            .window(50)
            .iter()
            .filter(|s| s.step_count_hint.is_some())
            .count();
        assert_eq!(hinted, 4);
        assert_eq!(state.tick(5_000).unwrap().label, ActivityLabel::Walking);
    }

    /// Listener failure does not stop delivery to later listeners or sinks
    #[tokio::test]
    async fn test_e2e_failing_listener_isolated_from_file_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.jsonl");
        let sinks = hub::create_sink_handles(&[SinkConfig {
            name: "history".to_string(),
            sink_type: SinkType::File,
            queue_capacity: 16,
            params: HashMap::from([("path".to_string(), path.display().to_string())]),
        }])
        .unwrap();

        let hub = ActivitySubscriptionHub::new();
        hub.subscribe_fn("broken", |_| panic!("listener bug"));
        hub.subscribe_fn("rejecting", |e| {
            Err(contracts::ContractError::listener("rejecting", format!("no {}", e.label)))
        });
        for handle in &sinks {
            hub.subscribe_sink(handle);
        }

        let readings = offline_source("running:6,sleeping:6").readings().unwrap();
        let summary = replay(EngineConfig::default(), readings, &hub).unwrap();
        hub::shutdown_handles(sinks).await;

        let records: Vec<HistoryRecord> = BufReader::new(std::fs::File::open(&path).unwrap())
            .lines()
            .map(|line| serde_json::from_str(&line.unwrap()).unwrap())
            .collect();
        assert_eq!(records.len(), summary.events.len());
        assert_eq!(
            records.iter().map(|r| r.label).collect::<Vec<_>>(),
            vec![ActivityLabel::Running, ActivityLabel::Sleeping]
        );
        assert_eq!(records[1].timestamp_ms, summary.events[1].timestamp_ms);
    }

    /// Session aggregation over a replay
    #[test]
    fn test_e2e_session_summary() {
        let readings = offline_source("idle:4,walking:8,idle:8").readings().unwrap();
        let hub = ActivitySubscriptionHub::new();

        let aggregator = Arc::new(Mutex::new(ActivityMetricsAggregator::new()));
        aggregator.lock().unwrap().start(ActivityLabel::Idle, 0);
        let session = Arc::clone(&aggregator);
        hub.subscribe_fn("session", move |e| {
            session.lock().unwrap().update(e);
            Ok(())
        });

        replay(EngineConfig::default(), readings, &hub).unwrap();
        aggregator.lock().unwrap().finish(20_000);

        let summary = aggregator.lock().unwrap().summary();
        assert_eq!(summary.total_events, 2);
        assert_eq!(summary.labels[&ActivityLabel::Walking].dwell_ms, 8_000);
        assert_eq!(summary.labels[&ActivityLabel::Idle].dwell_ms, 12_000);
        assert!((summary.active_fraction - 0.4).abs() < 1e-12);
    }

    /// Config file → live engine fed by a paced simulated source
    #[tokio::test(start_paused = true)]
    async fn test_e2e_live_engine_from_config_file() {
        let config = ConfigLoader::load_from_str(
            r#"
            [engine]
            tick_interval_ms = 1000
            window_size = 10

            [[sinks]]
            name = "console"
            sink_type = "log"
            "#,
            ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(config.engine.tick_interval_ms, 1000);

        let hub = Arc::new(ActivitySubscriptionHub::new());
        let sinks = hub::create_sink_handles(&config.sinks).unwrap();
        for handle in &sinks {
            hub.subscribe_sink(handle);
        }
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorder = Arc::clone(&events);
        hub.subscribe_fn("recorder", move |e| {
            recorder.lock().unwrap().push(*e);
            Ok(())
        });

        let clock = Arc::new(ManualClock::new(0));
        let engine = ActivityEngine::builder(config.engine)
            .hub(Arc::clone(&hub))
            .clock(clock.clone())
            .build()
            .unwrap();
        engine.start().unwrap();

        let source = SimulatedMotionSource::new(
            MotionScript::parse("driving:5").unwrap(),
            SimulatedSourceConfig {
                seed: Some(9),
                ..Default::default()
            },
        )
        .unwrap();
        let mut rx = source.start(32, None).unwrap();
        while let Some(reading) = rx.recv().await {
            clock.set(reading.timestamp_ms);
            engine.push_reading(&reading);
        }

        // Ticks at 1 s .. 4 s ran while the script played
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.stop();
        assert!(engine.tick_count() >= 4);
        assert_eq!(engine.current_label(), ActivityLabel::Driving);

        let events = events.lock().unwrap().clone();
        assert_eq!(labels(&events), vec![ActivityLabel::Driving]);
        assert!(events[0].timestamp_ms >= 900 && events[0].timestamp_ms <= 1_005);

        let metrics: Vec<_> = sinks.iter().map(|h| Arc::clone(h.metrics())).collect();
        hub::shutdown_handles(sinks).await;
        assert_eq!(metrics[0].write_count(), 1);
    }
}
