//! # Integration Tests
//!
//! End-to-end tests wiring the crates together the way the engine runs for
//! real: mock telemetry sources feeding a match session through the fusion
//! coordinator, effect engine and submission sinks.

#[cfg(test)]
mod contract_tests {
    use contracts::{MotionData, SourcePosition, TelemetrySample};

    #[test]
    fn test_contracts_compile() {
        let sample =
            TelemetrySample::motion(SourcePosition::LeftWrist, 0, MotionData::default());
        assert_eq!(sample.source, SourcePosition::LeftWrist);
        assert!(sample.position.is_none());
    }
}

#[cfg(test)]
mod fusion_tests {
    use contracts::{
        FusionConfig, MotionData, PositionData, SourceMask, SourcePosition, TelemetrySample,
    };
    use fusion::FusionCoordinator;
    use observability::MatchMetricsAggregator;

    const STEP: i64 = 50;

    /// Fusion snapshots feed the metrics aggregator the same way the session
    /// feeds it during a match.
    #[test]
    fn test_snapshots_flow_into_metrics() {
        let mut coordinator = FusionCoordinator::new(FusionConfig {
            active_sources: SourceMask::from_positions(&[
                SourcePosition::Phone,
                SourcePosition::LeftWrist,
            ]),
            ..Default::default()
        });
        let mut aggregator = MatchMetricsAggregator::new();

        for slot in 0..10 {
            let phone = TelemetrySample::phone(
                slot * STEP,
                PositionData::default(),
                MotionData::default(),
            );
            if let Some(snapshot) = coordinator.ingest(phone).snapshot {
                aggregator.update(&snapshot);
            }

            let wearable = TelemetrySample::motion(
                SourcePosition::LeftWrist,
                slot * STEP,
                MotionData::default(),
            );
            if let Some(snapshot) = coordinator.ingest(wearable).snapshot {
                aggregator.update(&snapshot);
            }
        }

        let summary = aggregator.summary();
        assert_eq!(summary.total_windows, 10, "one snapshot per slot");
        assert!(summary.fill_ratios.contains_key("phone"));
        assert!(summary.fill_ratios.contains_key("left_wrist"));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{ContractError, MatchBlueprint, MatchSummary, SourcePosition, SubmissionSink};
    use effects::{EffectEngine, StepCadenceConfig, StepCadenceEstimator};
    use lifecycle::{MatchSession, MatchSessionConfig, SessionCommand};
    use sources::{MockPhone, MockPhoneConfig, MockWearable, MockWearableConfig, SourceHub};
    use tokio::sync::mpsc;

    /// Running match over a ~55 m route; the finish zone (30 m radius) fires
    /// about 25 m in. Fast sampling keeps the test short.
    const BLUEPRINT_TOML: &str = r#"
        sport = "running"
        sources = ["left_wrist"]

        [sampling]
        tick_ms = 5
        elapsed_every_ticks = 20
        cycle_every_ticks = 20

        [geofence.start]
        radius_m = 100.0

        [geofence.start.center]
        latitude = 48.0
        longitude = 11.0

        [geofence.end]
        radius_m = 30.0

        [geofence.end.center]
        latitude = 48.0005
        longitude = 11.0

        [[effects]]
        id = "altitude_hold"

        [effects.params]
        kind = "threshold_bonus"
        metric = "altitude_m"
        min = 100.0
        bonus_seconds_per_cycle = 0.5
        end_bonus_seconds = 5.0
    "#;

    /// Sink capturing the submitted summary for assertions.
    struct CaptureSink(Arc<Mutex<Option<MatchSummary>>>);

    impl SubmissionSink for CaptureSink {
        fn name(&self) -> &str {
            "capture"
        }

        fn submit(&mut self, summary: &MatchSummary) -> Result<(), ContractError> {
            *self.0.lock().unwrap() = Some(summary.clone());
            Ok(())
        }
    }

    fn load_blueprint() -> MatchBlueprint {
        ConfigLoader::load_from_str(BLUEPRINT_TOML, ConfigFormat::Toml).unwrap()
    }

    fn build_engine(blueprint: &MatchBlueprint) -> EffectEngine {
        EffectEngine::builder()
            .with_effect(Box::new(StepCadenceEstimator::new(StepCadenceConfig {
                source: SourcePosition::LeftWrist,
                slot_s: blueprint.fusion.step_ms as f64 / 1_000.0,
                window_slots: blueprint.fusion.max_prediction_window,
                ..Default::default()
            })))
            .with_definitions(&blueprint.effects)
            .unwrap()
            .build()
            .unwrap()
    }

    fn build_session(
        blueprint: &MatchBlueprint,
        speed_mps: f64,
        captured: Arc<Mutex<Option<MatchSummary>>>,
    ) -> (MatchSession, SourceHub) {
        let mut hub = SourceHub::new(256);
        hub.register(Box::new(MockWearable::new(MockWearableConfig {
            position: SourcePosition::LeftWrist,
            frequency_hz: 20.0,
            batch_size: 1,
            cadence_hz: 1.4,
            heart_rate_bpm: 0.0,
        })));
        let wearable_rx = hub.take_receiver().unwrap();

        let phone = MockPhone::new(MockPhoneConfig {
            from: blueprint.geofence.start.center,
            to: blueprint.geofence.end.center,
            speed_mps,
            altitude_m: 500.0,
        });

        let session = MatchSession::new(
            MatchSessionConfig {
                sport: blueprint.sport,
                fusion: blueprint.fusion_config(),
                sampling: blueprint.sampling.clone(),
                geofence: blueprint.geofence,
                scoring: blueprint.scoring.clone(),
            },
            Box::new(phone),
            build_engine(blueprint),
            wearable_rx,
            vec![Box::new(CaptureSink(captured))],
        );

        (session, hub)
    }

    /// Full data flow: blueprint TOML -> session -> finish geofence -> sinks.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_match_to_finish() {
        let blueprint = load_blueprint();
        let captured = Arc::new(Mutex::new(None));
        let (session, hub) = build_session(&blueprint, 50.0, captured.clone());
        let mut elapsed_rx = session.elapsed_receiver();

        let (command_tx, command_rx) = mpsc::channel(4);
        hub.start_all();
        let task = tokio::spawn(session.run(command_rx));
        command_tx.send(SessionCommand::Start).await.unwrap();

        let joined = tokio::time::timeout(Duration::from_secs(10), task).await;
        hub.stop_all();

        let summary = joined
            .expect("match should reach the finish zone well within 10 s")
            .unwrap()
            .unwrap();

        // The finish geofence ended the match, so the summary is scoreable.
        assert!(summary.legitimacy_score >= 0.0);
        assert!(summary.finish_time_ms > 0);
        assert!(summary.elapsed_ms > 0);
        assert!(!summary.path.is_empty());
        assert_eq!(summary.sport_samples.len(), summary.path.len());

        // Altitude held at 500 m, inside the [100, inf) band: cycle bonuses
        // plus the end bonus all land on the configured effect.
        let bonus = summary
            .bonuses
            .iter()
            .find(|b| b.effect_id.as_ref() == "altitude_hold")
            .expect("threshold effect earned a bonus");
        assert!(bonus.bonus_seconds >= 5.0, "at least the end bonus");

        // Elapsed-time broadcasts reached the watch channel.
        assert!(*elapsed_rx.borrow_and_update() > 0);

        // The sink received the same summary the session returned.
        let submitted = captured.lock().unwrap().take().expect("sink was called");
        assert_eq!(submitted.legitimacy_score, summary.legitimacy_score);
        assert_eq!(submitted.path.len(), summary.path.len());
    }

    /// A stop command before the finish zone yields a did-not-finish summary.
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_e2e_stop_before_finish() {
        let blueprint = load_blueprint();
        let captured = Arc::new(Mutex::new(None));
        // Stationary athlete: stays in the start zone, never reaches the end.
        let (session, hub) = build_session(&blueprint, 0.0, captured.clone());

        let (command_tx, command_rx) = mpsc::channel(4);
        hub.start_all();
        let task = tokio::spawn(session.run(command_rx));
        command_tx.send(SessionCommand::Start).await.unwrap();

        tokio::time::sleep(Duration::from_millis(300)).await;
        command_tx.send(SessionCommand::Stop).await.unwrap();

        let joined = tokio::time::timeout(Duration::from_secs(5), task).await;
        hub.stop_all();

        let summary = joined.expect("stop ends the match").unwrap().unwrap();
        assert_eq!(summary.legitimacy_score, scoring::DID_NOT_FINISH);
        assert!(summary.elapsed_ms > 0);
        assert!(captured.lock().unwrap().is_some(), "sinks run on stop too");
    }

    /// A command channel that closes while idle is a caller bug, not a stop.
    #[tokio::test]
    async fn test_closed_channel_while_idle_is_an_error() {
        let blueprint = load_blueprint();
        let captured = Arc::new(Mutex::new(None));
        let (session, _hub) = build_session(&blueprint, 0.0, captured);

        let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(1);
        drop(command_tx);

        let result = session.run(command_rx).await;
        assert!(result.is_err());
    }
}
