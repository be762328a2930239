//! MatchSession - single owner of one match's mutable state.
//!
//! Runs as one task: a `select!` loop over the 50 ms sampling timer, the
//! merged wearable channel and the command channel. All buffer-mutating
//! logic runs on this task; sources hand samples over by channel only.

use async_channel::Receiver;
use chrono::Utc;
use contracts::geo::haversine_m;
use contracts::{
    ContractError, FusionConfig, GeofenceConfig, MatchContext, MatchEvent, MatchSummary,
    PathPoint, PhoneSensorSuite, PositionData, SamplingConfig, ScoringConfig, Sport,
    SportSample, SubmissionSink, TelemetrySample, WindowSnapshot,
};
use effects::EffectEngine;
use fusion::FusionCoordinator;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, instrument, warn};

use crate::geofence::{GeofenceTracker, GeofenceVerdict};

/// Commands accepted by a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    /// Begin recording (no-op while already recording)
    Start,

    /// Stop recording (idempotent; ignored while idle)
    Stop,
}

/// Session configuration for one match.
#[derive(Debug, Clone)]
pub struct MatchSessionConfig {
    pub sport: Sport,
    pub fusion: FusionConfig,
    pub sampling: SamplingConfig,
    pub geofence: GeofenceConfig,
    pub scoring: ScoringConfig,
}

/// One match session.
///
/// Owns the coordinator, effect engine, context and recorded path for the
/// duration of one match. Consumed by `run`.
pub struct MatchSession {
    config: MatchSessionConfig,
    phone: Box<dyn PhoneSensorSuite>,
    coordinator: FusionCoordinator,
    engine: EffectEngine,
    ctx: MatchContext,
    geofence: GeofenceTracker,
    sinks: Vec<Box<dyn SubmissionSink>>,
    wearable_rx: Receiver<TelemetrySample>,
    path: Vec<PathPoint>,
    sport_samples: Vec<SportSample>,
    last_position: Option<PositionData>,
    elapsed_tx: watch::Sender<i64>,
    started_ms: i64,
}

impl MatchSession {
    pub fn new(
        config: MatchSessionConfig,
        phone: Box<dyn PhoneSensorSuite>,
        engine: EffectEngine,
        wearable_rx: Receiver<TelemetrySample>,
        sinks: Vec<Box<dyn SubmissionSink>>,
    ) -> Self {
        let coordinator = FusionCoordinator::new(config.fusion.clone());
        let geofence = GeofenceTracker::new(config.geofence);
        let (elapsed_tx, _) = watch::channel(0);
        Self {
            config,
            phone,
            coordinator,
            engine,
            ctx: MatchContext::default(),
            geofence,
            sinks,
            wearable_rx,
            path: Vec::new(),
            sport_samples: Vec::new(),
            last_position: None,
            elapsed_tx,
            started_ms: 0,
        }
    }

    /// Elapsed-time observer, updated roughly every second while recording.
    pub fn elapsed_receiver(&self) -> watch::Receiver<i64> {
        self.elapsed_tx.subscribe()
    }

    /// Run one match to completion.
    ///
    /// Waits in `Idle` for a `Start` command, records until a `Stop` command
    /// or the finish geofence, then scores, submits and returns the summary.
    ///
    /// # Errors
    /// Returns an invalid-state error when the command channel closes while
    /// idle; a closed channel during recording counts as a stop request.
    #[instrument(name = "match_session", skip(self, commands), fields(sport = ?self.config.sport))]
    pub async fn run(
        mut self,
        mut commands: mpsc::Receiver<SessionCommand>,
    ) -> Result<MatchSummary, ContractError> {
        // Idle: positions only update the start-area flag, nothing is
        // recorded.
        let mut idle_ticker = interval(Duration::from_millis(
            self.config.sampling.tick_ms as u64 * self.config.sampling.elapsed_every_ticks,
        ));
        idle_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                command = commands.recv() => {
                    match command {
                        Some(SessionCommand::Start) => break,
                        Some(SessionCommand::Stop) => {
                            debug!("stop while idle ignored");
                        }
                        None => {
                            return Err(ContractError::InvalidState {
                                message: "command channel closed while idle".into(),
                            })
                        }
                    }
                }
                _ = idle_ticker.tick() => {
                    let sample = self.phone.sample(Utc::now().timestamp_millis());
                    if let Some(position) = sample.position {
                        self.geofence.observe_idle(contracts::geo::GeoPoint {
                            latitude: position.latitude,
                            longitude: position.longitude,
                        });
                    }
                }
            }
        }
        debug!(in_start_area = self.geofence.in_start_area(), "leaving idle");

        self.start_recording();

        let wearable_rx = self.wearable_rx.clone();
        let mut ticker = interval(Duration::from_millis(self.config.sampling.tick_ms as u64));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await; // first tick completes immediately

        let mut ticks = 0u64;
        let mut recording = true;
        let mut wearables_open = true;
        while recording {
            tokio::select! {
                _ = ticker.tick() => {
                    ticks += 1;
                    recording = self.on_tick(ticks);
                }
                command = commands.recv() => {
                    match command {
                        Some(SessionCommand::Stop) | None => {
                            info!("stop requested");
                            recording = false;
                        }
                        Some(SessionCommand::Start) => {
                            debug!("start while recording ignored");
                        }
                    }
                }
                sample = wearable_rx.recv(), if wearables_open => {
                    match sample {
                        Ok(sample) => self.on_wearable_sample(sample),
                        Err(_) => {
                            // Hub dropped; keep recording on the phone alone.
                            warn!("wearable channel closed");
                            wearables_open = false;
                        }
                    }
                }
            }
        }

        self.finish()
    }

    fn start_recording(&mut self) {
        self.started_ms = Utc::now().timestamp_millis();
        self.ctx.reset();
        self.coordinator.reset();
        self.geofence.reset();
        self.path.clear();
        self.sport_samples.clear();
        self.last_position = None;
        info!(started_ms = self.started_ms, "recording started");
        metrics::counter!("match_started_total").increment(1);
        let started = MatchEvent::Started;
        self.engine.dispatch(&started, &mut self.ctx);
    }

    /// One 50 ms timer tick. Returns false once the finish geofence fires.
    fn on_tick(&mut self, ticks: u64) -> bool {
        let now_ms = Utc::now().timestamp_millis();
        let sample = self.phone.sample(now_ms);
        let mut keep_recording = true;

        if let Some(position) = sample.position {
            self.ctx.speed_mps = position.speed_mps;
            self.ctx.altitude_m = position.altitude_m;
            self.last_position = Some(position);

            let point = PathPoint {
                latitude: position.latitude,
                longitude: position.longitude,
                speed_mps: position.speed_mps,
                altitude_m: position.altitude_m,
                heart_rate_bpm: self.ctx.heart_rate_bpm,
                timestamp_ms: sample.timestamp_ms,
            };
            if self.geofence.observe_recording(point) == GeofenceVerdict::Finish {
                info!("finish geofence entered");
                keep_recording = false;
            }
        }

        let outcome = self.coordinator.ingest(sample);
        if let Some(snapshot) = outcome.snapshot {
            self.on_snapshot(snapshot);
        }

        if ticks % self.config.sampling.elapsed_every_ticks == 0 {
            let elapsed_ms = now_ms - self.started_ms;
            metrics::gauge!("match_elapsed_ms").set(elapsed_ms as f64);
            let _ = self.elapsed_tx.send(elapsed_ms);
        }
        if ticks % self.config.sampling.cycle_every_ticks == 0 {
            self.append_path_point(now_ms);
            let cycle = MatchEvent::Cycle;
            self.engine.dispatch(&cycle, &mut self.ctx);
        }

        keep_recording
    }

    fn on_wearable_sample(&mut self, sample: TelemetrySample) {
        if let Some(vitals) = sample.vitals {
            self.ctx.record_heart_rate(vitals.heart_rate_bpm);
            if vitals.power_watts > 0.0 {
                self.ctx.power_watts = vitals.power_watts;
            }
        }
        let outcome = self.coordinator.ingest(sample);
        if let Some(snapshot) = outcome.snapshot {
            self.on_snapshot(snapshot);
        }
    }

    fn on_snapshot(&mut self, snapshot: WindowSnapshot) {
        debug!(
            window_len = snapshot.window_len,
            predict_time = snapshot.predict_time,
            "snapshot ready"
        );
        let event = MatchEvent::WindowReady(snapshot);
        self.engine.dispatch(&event, &mut self.ctx);
    }

    /// Append one path point (~3 s cadence) from the latest phone fix.
    fn append_path_point(&mut self, now_ms: i64) {
        let Some(position) = self.last_position else {
            // No position fix seen yet this match.
            return;
        };
        let point = PathPoint {
            latitude: position.latitude,
            longitude: position.longitude,
            speed_mps: position.speed_mps,
            altitude_m: position.altitude_m,
            heart_rate_bpm: self.ctx.heart_rate_bpm,
            timestamp_ms: now_ms,
        };

        if let Some(previous) = self.path.last() {
            self.ctx.total_distance_m += haversine_m(previous.geo(), point.geo());
        }
        self.path.push(point);
        self.sport_samples.push(SportSample {
            point,
            pedal_rpm: self.ctx.pedal_rpm,
            step_cadence_spm: self.ctx.step_cadence_spm,
            step_count: self.ctx.step_count,
        });
        metrics::counter!("path_points_total").increment(1);
    }

    /// Finishing: final effects, score, summary, best-effort submission.
    fn finish(mut self) -> Result<MatchSummary, ContractError> {
        let now_ms = Utc::now().timestamp_millis();
        let ended = MatchEvent::Ended;
        self.engine.dispatch(&ended, &mut self.ctx);

        let reached_finish = !self.geofence.candidates().is_empty();
        let legitimacy_score = scoring::score_with_config(
            self.config.sport,
            &self.path,
            &self.sport_samples,
            reached_finish,
            &self.config.scoring,
        );
        let finish_time_ms = if reached_finish {
            scoring::reconstruct_finish_time(
                self.geofence.candidates(),
                &self.config.geofence.end,
                now_ms,
            )
        } else {
            now_ms
        };

        let summary = MatchSummary {
            sport: self.config.sport,
            legitimacy_score,
            finish_time_ms,
            elapsed_ms: now_ms - self.started_ms,
            total_distance_m: self.ctx.total_distance_m,
            bonuses: self.ctx.bonuses.clone(),
            team_bonus: self.ctx.team_bonus.clone(),
            path: self.path.clone(),
            sport_samples: self.sport_samples.clone(),
        };

        info!(
            score = summary.legitimacy_score,
            elapsed_ms = summary.elapsed_ms,
            distance_m = summary.total_distance_m,
            "match finished"
        );
        metrics::counter!("match_finished_total").increment(1);

        // Fire-and-forget: a failed submission never un-finishes the match.
        for sink in &mut self.sinks {
            if let Err(e) = sink.submit(&summary) {
                warn!(sink = sink.name(), error = %e, "submission failed");
            }
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::geo::GeoPoint;
    use contracts::{GeoZone, SourceMask};
    use std::sync::{Arc, Mutex};

    /// Phone stub advancing north by a fixed step per sample.
    struct SteppingPhone {
        latitude_step: f64,
        calls: u64,
    }

    impl SteppingPhone {
        fn new(latitude_step: f64) -> Self {
            Self {
                latitude_step,
                calls: 0,
            }
        }
    }

    impl PhoneSensorSuite for SteppingPhone {
        fn sample(&mut self, now_ms: i64) -> TelemetrySample {
            let n = self.calls;
            self.calls += 1;
            let position = PositionData {
                latitude: 48.0 + self.latitude_step * n as f64,
                longitude: 11.0,
                speed_mps: 5.0,
                altitude_m: 500.0,
            };
            TelemetrySample::phone(now_ms, position, Default::default())
        }
    }

    struct RecordingSink(Arc<Mutex<Vec<f64>>>);

    impl SubmissionSink for RecordingSink {
        fn name(&self) -> &str {
            "recording"
        }

        fn submit(&mut self, summary: &MatchSummary) -> Result<(), ContractError> {
            self.0.lock().unwrap().push(summary.legitimacy_score);
            Ok(())
        }
    }

    fn config() -> MatchSessionConfig {
        MatchSessionConfig {
            sport: Sport::Running,
            fusion: FusionConfig {
                active_sources: SourceMask::PHONE_ONLY,
                ..Default::default()
            },
            sampling: SamplingConfig {
                tick_ms: 5,
                elapsed_every_ticks: 2,
                cycle_every_ticks: 4,
            },
            geofence: GeofenceConfig {
                start: GeoZone {
                    center: GeoPoint {
                        latitude: 48.0,
                        longitude: 11.0,
                    },
                    radius_m: 100.0,
                },
                end: GeoZone {
                    center: GeoPoint {
                        latitude: 48.003,
                        longitude: 11.0,
                    },
                    radius_m: 50.0,
                },
            },
            scoring: ScoringConfig::default(),
        }
    }

    fn session(
        phone: Box<dyn PhoneSensorSuite>,
        scores: Arc<Mutex<Vec<f64>>>,
    ) -> (MatchSession, async_channel::Sender<TelemetrySample>) {
        let (tx, rx) = async_channel::bounded(16);
        let session = MatchSession::new(
            config(),
            phone,
            effects::EffectEngine::builder().build().unwrap(),
            rx,
            vec![Box::new(RecordingSink(scores))],
        );
        (session, tx)
    }

    #[tokio::test]
    async fn finish_geofence_ends_the_match() {
        let scores = Arc::new(Mutex::new(Vec::new()));
        // ~11 m per tick: inside the finish radius after ~26 ticks.
        let (session, _wearables) = session(Box::new(SteppingPhone::new(0.0001)), scores.clone());
        let (tx, rx) = mpsc::channel(4);

        tx.send(SessionCommand::Start).await.unwrap();
        let summary = session.run(rx).await.unwrap();

        assert!(!summary.path.is_empty());
        assert!(summary.legitimacy_score >= 0.0, "reached the finish zone");
        assert_eq!(scores.lock().unwrap().as_slice(), &[summary.legitimacy_score]);
    }

    #[tokio::test]
    async fn explicit_stop_without_finish_is_dnf() {
        let scores = Arc::new(Mutex::new(Vec::new()));
        // Stationary, far from the finish zone.
        let (session, _wearables) = session(Box::new(SteppingPhone::new(0.0)), scores.clone());
        let (tx, rx) = mpsc::channel(4);

        let driver = tokio::spawn(async move {
            // Stop while idle is ignored; the following start still works.
            tx.send(SessionCommand::Stop).await.unwrap();
            tx.send(SessionCommand::Start).await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
            tx.send(SessionCommand::Stop).await.unwrap();
        });

        let summary = session.run(rx).await.unwrap();
        driver.await.unwrap();

        assert!(summary.path.len() >= 2);
        assert_eq!(summary.legitimacy_score, scoring::DID_NOT_FINISH);
    }

    #[tokio::test]
    async fn closed_command_channel_while_idle_is_an_error() {
        let scores = Arc::new(Mutex::new(Vec::new()));
        let (session, _wearables) = session(Box::new(SteppingPhone::new(0.0)), scores);
        let (tx, rx) = mpsc::channel::<SessionCommand>(1);
        drop(tx);

        assert!(session.run(rx).await.is_err());
    }

    #[tokio::test]
    async fn wearable_vitals_reach_the_context() {
        let scores = Arc::new(Mutex::new(Vec::new()));
        let (wearable_tx, wearable_rx) = async_channel::bounded(16);
        let session = MatchSession::new(
            config(),
            Box::new(SteppingPhone::new(0.0001)),
            effects::EffectEngine::builder().build().unwrap(),
            wearable_rx,
            vec![Box::new(RecordingSink(scores))],
        );
        let (tx, rx) = mpsc::channel(4);
        tx.send(SessionCommand::Start).await.unwrap();

        let feeder = tokio::spawn(async move {
            for i in 0..10i64 {
                let mut sample = TelemetrySample::motion(
                    contracts::SourcePosition::Chest,
                    Utc::now().timestamp_millis(),
                    Default::default(),
                );
                sample.vitals = Some(contracts::VitalsData {
                    heart_rate_bpm: 140.0 + i as f64,
                    power_watts: 0.0,
                });
                if wearable_tx.send(sample).await.is_err() {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        });

        let summary = session.run(rx).await.unwrap();
        feeder.await.unwrap();

        // Heart rate from the wearable ends up on the recorded path.
        assert!(summary.path.iter().any(|p| p.heart_rate_bpm >= 140.0));
    }
}

