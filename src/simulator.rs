use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::Utc;
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

pub const DEFAULT_SIMULATOR_PORT: u16 = 2003;
pub const DEFAULT_RATE_HZ: f64 = 20.0;

const AMPLITUDE_PITCH: f64 = 20.0; // +/- degrees
const AMPLITUDE_ROLL: f64 = 25.0; // +/- degrees
const AMPLITUDE_YAW: f64 = 180.0; // wraps 0-360
const NOISE_DEG: f64 = 2.0;
const GNSS_DRIFT_DEG: f64 = 0.00002;
const ALTITUDE_DRIFT_M: f64 = 0.1;
const TIME_STEP: f64 = 0.05;

// Approx. New Delhi
const START_LATITUDE: f64 = 28.6139;
const START_LONGITUDE: f64 = 77.2090;
const START_ALTITUDE: f64 = 250.0;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimImu {
    pub pitch: f64,
    pub roll: f64,
    pub yaw: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimGnss {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

/// Wire frame emitted by the simulator
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SimFrame {
    pub timestamp: String,
    pub imu: SimImu,
    pub gnss: SimGnss,
}

/// Sinusoidal attitude with jitter plus a slow GNSS random walk
pub struct FrameGenerator {
    t: f64,
    latitude: f64,
    longitude: f64,
    altitude: f64,
    noise: f64,
}

impl FrameGenerator {
    pub fn new() -> Self {
        FrameGenerator {
            t: 0.0,
            latitude: START_LATITUDE,
            longitude: START_LONGITUDE,
            altitude: START_ALTITUDE,
            noise: NOISE_DEG,
        }
    }

    /// Same motion without jitter
    pub fn noiseless() -> Self {
        FrameGenerator {
            noise: 0.0,
            ..Self::new()
        }
    }

    pub fn next_frame<R: Rng>(&mut self, rng: &mut R) -> SimFrame {
        let t = self.t;
        let mut pitch = AMPLITUDE_PITCH * t.sin();
        let mut roll = AMPLITUDE_ROLL * (t / 1.3).sin();
        let mut yaw = (AMPLITUDE_YAW + 180.0 * (t / 2.0).sin()) % 360.0;

        if self.noise > 0.0 {
            pitch += rng.gen_range(-self.noise..=self.noise);
            roll += rng.gen_range(-self.noise..=self.noise);
            yaw += rng.gen_range(-self.noise..=self.noise);

            self.latitude += rng.gen_range(-GNSS_DRIFT_DEG..=GNSS_DRIFT_DEG);
            self.longitude += rng.gen_range(-GNSS_DRIFT_DEG..=GNSS_DRIFT_DEG);
            self.altitude += rng.gen_range(-ALTITUDE_DRIFT_M..=ALTITUDE_DRIFT_M);
        }

        self.t += TIME_STEP;

        SimFrame {
            timestamp: format!("{}Z", Utc::now().format("%Y-%m-%dT%H:%M:%S%.6f")),
            imu: SimImu {
                pitch: round_to(pitch, 2),
                roll: round_to(roll, 2),
                yaw: round_to(yaw, 2),
            },
            gnss: SimGnss {
                latitude: round_to(self.latitude, 6),
                longitude: round_to(self.longitude, 6),
                altitude: round_to(self.altitude, 1),
            },
        }
    }
}

impl Default for FrameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[derive(Clone, Copy, Debug)]
pub struct SimulatorSettings {
    pub period: Duration,
    pub noisy: bool,
}

impl SimulatorSettings {
    pub fn from_rate_hz(rate_hz: f64) -> Self {
        let rate = if rate_hz.is_finite() && rate_hz > 0.0 {
            rate_hz
        } else {
            DEFAULT_RATE_HZ
        };
        SimulatorSettings {
            period: Duration::from_secs_f64(1.0 / rate),
            noisy: true,
        }
    }
}

impl Default for SimulatorSettings {
    fn default() -> Self {
        Self::from_rate_hz(DEFAULT_RATE_HZ)
    }
}

/// Every client connecting on `/` gets its own frame stream
pub fn router(settings: SimulatorSettings) -> Router {
    Router::new()
        .route("/", get(ws_handler))
        .with_state(settings)
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(settings): State<SimulatorSettings>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_frames(socket, settings))
}

async fn stream_frames(mut socket: WebSocket, settings: SimulatorSettings) {
    info!("Simulator client connected");
    let mut generator = if settings.noisy {
        FrameGenerator::new()
    } else {
        FrameGenerator::noiseless()
    };

    loop {
        // ThreadRng is not Send; keep it scoped to the frame
        let frame = generator.next_frame(&mut rand::thread_rng());
        let json = match serde_json::to_string(&frame) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to encode simulator frame: {}", e);
                break;
            }
        };
        if socket.send(Message::Text(json)).await.is_err() {
            // Client disconnected
            break;
        }
        sleep(settings.period).await;
    }
    info!("Simulator client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::parse_frame;

    #[test]
    fn test_noiseless_first_frame() {
        let mut generator = FrameGenerator::noiseless();
        let frame = generator.next_frame(&mut rand::thread_rng());
        assert_eq!(frame.imu, SimImu { pitch: 0.0, roll: 0.0, yaw: 180.0 });
        assert_eq!(frame.gnss.latitude, 28.6139);
        assert_eq!(frame.gnss.altitude, 250.0);
    }

    #[test]
    fn test_noise_stays_bounded() {
        let mut generator = FrameGenerator::new();
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let frame = generator.next_frame(&mut rng);
            assert!(frame.imu.pitch.abs() <= AMPLITUDE_PITCH + NOISE_DEG + 0.01);
            assert!(frame.imu.roll.abs() <= AMPLITUDE_ROLL + NOISE_DEG + 0.01);
            assert!((frame.gnss.latitude - START_LATITUDE).abs() < 0.01);
        }
    }

    #[test]
    fn test_frames_decode_as_telemetry() {
        let mut generator = FrameGenerator::new();
        let json = serde_json::to_string(&generator.next_frame(&mut rand::thread_rng())).unwrap();
        let frame = parse_frame(&json).unwrap();
        assert!(frame.imu.is_some());
        assert!(frame.gnss.unwrap().altitude.is_some());
    }

    #[test]
    fn test_rate_fallback() {
        assert_eq!(SimulatorSettings::from_rate_hz(0.0).period, Duration::from_millis(50));
        assert_eq!(SimulatorSettings::from_rate_hz(10.0).period, Duration::from_millis(100));
    }
}
