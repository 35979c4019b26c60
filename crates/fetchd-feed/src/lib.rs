//! `fetchd-feed` – the inbound detection stream.
//!
//! An external detector pushes UDP datagrams with an ASCII payload of the
//! form `"<x_center>,<y_center>,<category>,<timestamp>"`.  [`DetectionFeed`]
//! owns the socket; [`DetectionSource`] is the seam the orchestrator sees,
//! so tests can drive the loop with scripted detections instead of a socket.
//!
//! A malformed or stale datagram is logged and yields `None` – the producer
//! is outside our control and must never be able to crash the consumer.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use fetchd_types::{Detection, FetchError};
use tokio::net::{ToSocketAddrs, UdpSocket};
use tracing::{debug, info, warn};

/// Maximum datagram size the detector emits.
pub const MAX_DATAGRAM: usize = 1024;

/// Maximum age of a detection before it is treated as stale (seconds).
pub const FRESHNESS_WINDOW_SECS: f64 = 2.0;

/// Parse a detection payload.
///
/// The format is four comma-separated fields with no escaping, so category
/// names must not contain commas.
///
/// # Errors
///
/// [`FetchError::Parse`] on a wrong field count or a non-numeric coordinate
/// or timestamp.
pub fn parse_payload(payload: &str) -> Result<Detection, FetchError> {
    let fields: Vec<&str> = payload.split(',').collect();
    if fields.len() != 4 {
        return Err(FetchError::Parse(format!(
            "expected 4 fields, got {}: {payload:?}",
            fields.len()
        )));
    }

    let numeric = |field: &str, name: &str| -> Result<f64, FetchError> {
        field
            .trim()
            .parse::<f64>()
            .map_err(|_| FetchError::Parse(format!("non-numeric {name}: {field:?}")))
    };

    Ok(Detection {
        x_center: numeric(fields[0], "x_center")? as f32,
        y_center: numeric(fields[1], "y_center")? as f32,
        category: fields[2].trim().to_string(),
        timestamp: numeric(fields[3], "timestamp")?,
    })
}

/// Whether a detection is still inside the freshness window at `now`
/// (Unix epoch seconds).
pub fn is_fresh(detection: &Detection, now: f64) -> bool {
    now - detection.timestamp <= FRESHNESS_WINDOW_SECS
}

fn unix_now() -> f64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs_f64(),
        // Pre-epoch clock: treat everything as stale rather than panic.
        Err(_) => 0.0,
    }
}

/// The orchestrator's view of the detection stream.
#[async_trait]
pub trait DetectionSource: Send {
    /// Next fresh detection, or `None` when this read produced nothing
    /// usable (receive error, malformed payload, stale timestamp).
    async fn receive(&mut self) -> Option<Detection>;
}

/// UDP-backed detection source.
///
/// `receive` blocks on the socket with no timeout; the await is the tracking
/// loop's sole suspension point per iteration, so a silent detector stalls
/// the loop until the next datagram arrives.
pub struct DetectionFeed {
    socket: UdpSocket,
}

impl DetectionFeed {
    /// Bind the feed socket.
    ///
    /// # Errors
    ///
    /// [`FetchError::HardwareFault`] when the address cannot be bound.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self, FetchError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|e| FetchError::HardwareFault {
                component: "detection_feed".to_string(),
                details: e.to_string(),
            })?;
        if let Ok(local) = socket.local_addr() {
            info!(%local, "detection feed listening");
        }
        Ok(Self { socket })
    }

    /// The bound local address, for tests and startup logs.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, FetchError> {
        self.socket.local_addr().map_err(|e| FetchError::HardwareFault {
            component: "detection_feed".to_string(),
            details: e.to_string(),
        })
    }
}

#[async_trait]
impl DetectionSource for DetectionFeed {
    async fn receive(&mut self) -> Option<Detection> {
        let mut buf = [0u8; MAX_DATAGRAM];
        let len = match self.socket.recv_from(&mut buf).await {
            Ok((len, _)) => len,
            Err(e) => {
                warn!(error = %e, "datagram receive failed");
                return None;
            }
        };

        let payload = match std::str::from_utf8(&buf[..len]) {
            Ok(s) => s.trim(),
            Err(_) => {
                warn!(len, "non-UTF-8 datagram dropped");
                return None;
            }
        };

        let detection = match parse_payload(payload) {
            Ok(detection) => detection,
            Err(e) => {
                warn!(error = %e, "malformed detection payload");
                return None;
            }
        };

        if !is_fresh(&detection, unix_now()) {
            debug!(
                category = %detection.category,
                timestamp = detection.timestamp,
                "stale detection dropped"
            );
            return None;
        }

        info!(
            category = %detection.category,
            x_center = detection.x_center,
            y_center = detection.y_center,
            "detection received"
        );
        Some(detection)
    }
}
