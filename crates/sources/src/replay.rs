//! Replay source - recorded sample playback
//!
//! Plays back a JSONL file of `TelemetrySample`s for one position, pacing
//! delivery by the recorded timestamp deltas with an optional speed
//! multiplier.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{SampleCallback, SampleSource, SourcePosition, TelemetrySample};
use tracing::{debug, warn};

/// JSONL playback source.
pub struct ReplaySource {
    position: SourcePosition,
    path: PathBuf,
    /// Playback speed multiplier (1.0 = recorded pace)
    speed: f64,
    running: Arc<AtomicBool>,
}

impl ReplaySource {
    /// Create a replay source for one position.
    pub fn new(position: SourcePosition, path: impl Into<PathBuf>, speed: f64) -> Self {
        Self {
            position,
            path: path.into(),
            speed: if speed > 0.0 { speed } else { 1.0 },
            running: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SampleSource for ReplaySource {
    fn position(&self) -> SourcePosition {
        self.position
    }

    fn listen(&self, callback: SampleCallback) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let position = self.position;
        let path = self.path.clone();
        let speed = self.speed;
        let running = self.running.clone();
        debug!(position = position.label(), path = %path.display(), "replay starting");

        std::thread::spawn(move || {
            let file = match File::open(&path) {
                Ok(f) => f,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "replay file open failed");
                    running.store(false, Ordering::SeqCst);
                    return;
                }
            };

            let mut previous_ts: Option<i64> = None;
            for line in BufReader::new(file).lines() {
                if !running.load(Ordering::SeqCst) {
                    break;
                }
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!(error = %e, "replay read failed");
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }

                let sample: TelemetrySample = match serde_json::from_str(&line) {
                    Ok(s) => s,
                    Err(e) => {
                        warn!(error = %e, "malformed replay line skipped");
                        continue;
                    }
                };
                if sample.source != position {
                    continue;
                }

                if let Some(prev) = previous_ts {
                    let delta_ms = (sample.timestamp_ms - prev).max(0) as f64 / speed;
                    std::thread::sleep(Duration::from_millis(delta_ms as u64));
                }
                previous_ts = Some(sample.timestamp_ms);
                callback(sample);
            }

            running.store(false, Ordering::SeqCst);
        });
    }

    fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::MotionData;
    use std::io::Write;
    use std::sync::Mutex;

    fn write_replay(samples: &[TelemetrySample]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for sample in samples {
            writeln!(file, "{}", serde_json::to_string(sample).unwrap()).unwrap();
        }
        file
    }

    #[test]
    fn replays_samples_for_position() {
        let samples = vec![
            TelemetrySample::motion(SourcePosition::Chest, 0, MotionData::default()),
            TelemetrySample::motion(SourcePosition::LeftWrist, 10, MotionData::default()),
            TelemetrySample::motion(SourcePosition::Chest, 20, MotionData::default()),
        ];
        let file = write_replay(&samples);

        let source = ReplaySource::new(SourcePosition::Chest, file.path(), 100.0);
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let sink = delivered.clone();
        source.listen(Arc::new(move |s| sink.lock().unwrap().push(s)));

        // Playback at 100x finishes quickly.
        for _ in 0..100 {
            if !source.is_listening() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        let delivered = delivered.lock().unwrap();
        assert_eq!(delivered.len(), 2);
        assert!(delivered.iter().all(|s| s.source == SourcePosition::Chest));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "not json").unwrap();
        writeln!(
            file,
            "{}",
            serde_json::to_string(&TelemetrySample::motion(
                SourcePosition::Chest,
                0,
                MotionData::default()
            ))
            .unwrap()
        )
        .unwrap();

        let source = ReplaySource::new(SourcePosition::Chest, file.path(), 100.0);
        let delivered = Arc::new(Mutex::new(0usize));
        let sink = delivered.clone();
        source.listen(Arc::new(move |_| *sink.lock().unwrap() += 1));

        for _ in 0..100 {
            if !source.is_listening() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }

        assert_eq!(*delivered.lock().unwrap(), 1);
    }
}
