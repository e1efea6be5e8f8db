//! UDP sensor ingress
//!
//! ## Wire Format
//!
//! Sensor apps send one JSON object per datagram:
//!
//! ```json
//! {
//!     "sensor": "linear_acceleration",
//!     "values": {"x": 0.12, "y": 9.81, "z": -0.33},
//!     "timestamp": 1692.480,
//!     "source": "pixel7"
//! }
//! ```
//!
//! `timestamp` (seconds) and `source` are optional. The `sensor` field
//! accepts the names Android sensor frameworks actually emit, plus short
//! forms:
//!
//! | Kind         | Accepted names                                        |
//! |--------------|-------------------------------------------------------|
//! | acceleration | `linear_acceleration`, `accelerometer`, `acceleration`|
//! | gyroscope    | `gyroscope`, `gyro`                                   |
//! | rotation     | `rotation_vector`, `rotation`                         |
//!
//! Rotation samples are quaternions and must carry `w`; for the other
//! kinds a stray `w` is ignored.
//!
//! ## Stamping Rules
//!
//! Datagrams missing `timestamp` are stamped with the receiver's clock
//! at decode time; datagrams missing `source` are attributed to the
//! sender's IP address. Either way every sample downstream carries a
//! usable timestamp and origin.

use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::Duration;

use serde::Deserialize;

use airpad_core::{Clock, SensorKind, SensorSample, SourceId, Timestamp, WallClock};

use crate::{SampleSource, SourceError};

/// Largest datagram the source will read. Real payloads are well under
/// 200 bytes; anything bigger than this is truncated and will fail to
/// parse.
pub const MAX_DATAGRAM: usize = 2048;

#[derive(Debug, Deserialize)]
struct WireSample {
    sensor: String,
    values: WireValues,
    timestamp: Option<f64>,
    source: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireValues {
    x: f32,
    y: f32,
    z: f32,
    w: Option<f32>,
}

fn kind_from_wire(name: &str) -> Option<SensorKind> {
    match name {
        "linear_acceleration" | "accelerometer" | "acceleration" => Some(SensorKind::Acceleration),
        "gyroscope" | "gyro" => Some(SensorKind::Gyroscope),
        "rotation_vector" | "rotation" => Some(SensorKind::Rotation),
        _ => None,
    }
}

/// Decode one datagram payload into a validated sample.
///
/// `fallback_timestamp` and `sender` fill in whatever the payload
/// omits, per the module's stamping rules. Every failure is a
/// [`SourceError::Decode`] naming the offending detail.
pub fn decode_datagram(
    payload: &[u8],
    sender: SocketAddr,
    fallback_timestamp: Timestamp,
) -> Result<SensorSample, SourceError> {
    let wire: WireSample = serde_json::from_slice(payload).map_err(|e| SourceError::Decode {
        reason: format!("bad json: {e}"),
    })?;

    let kind = kind_from_wire(&wire.sensor).ok_or_else(|| SourceError::Decode {
        reason: format!("unknown sensor kind {:?}", wire.sensor),
    })?;

    let v = wire.values;
    let mut components = [v.x, v.y, v.z, 0.0];
    let values = if kind == SensorKind::Rotation {
        let w = v.w.ok_or_else(|| SourceError::Decode {
            reason: "rotation sample missing w".into(),
        })?;
        components[3] = w;
        &components[..4]
    } else {
        &components[..3]
    };

    let timestamp = wire.timestamp.unwrap_or(fallback_timestamp);
    let source = match &wire.source {
        Some(name) => SourceId::new(name),
        None => SourceId::new(&sender.ip().to_string()),
    };

    SensorSample::new(timestamp, kind, values, source).map_err(|e| SourceError::Decode {
        reason: e.to_string(),
    })
}

/// [`SampleSource`] reading JSON datagrams from a bound UDP socket.
///
/// The socket runs with a read timeout (the idle wait), so
/// [`recv_sample`](SampleSource::recv_sample) returns `Ok(None)` at a
/// steady beat while the phone is quiet and the collector stays
/// responsive to shutdown.
pub struct UdpSampleSource<C: Clock = WallClock> {
    socket: UdpSocket,
    clock: C,
    buf: [u8; MAX_DATAGRAM],
}

impl UdpSampleSource<WallClock> {
    /// Bind to `addr` and stamp unstamped datagrams with wall time.
    pub fn bind(addr: impl ToSocketAddrs, idle_wait: Duration) -> Result<Self, SourceError> {
        Self::bind_with_clock(addr, idle_wait, WallClock)
    }
}

impl<C: Clock> UdpSampleSource<C> {
    /// Bind to `addr`, stamping unstamped datagrams from `clock`.
    ///
    /// `idle_wait` has a 1 ms floor; a zero read timeout would mean
    /// blocking forever.
    pub fn bind_with_clock(
        addr: impl ToSocketAddrs,
        idle_wait: Duration,
        clock: C,
    ) -> Result<Self, SourceError> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_read_timeout(Some(idle_wait.max(Duration::from_millis(1))))?;

        Ok(Self {
            socket,
            clock,
            buf: [0u8; MAX_DATAGRAM],
        })
    }

    /// Address the socket actually bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, SourceError> {
        Ok(self.socket.local_addr()?)
    }
}

impl<C: Clock> SampleSource for UdpSampleSource<C> {
    fn recv_sample(&mut self) -> Result<Option<SensorSample>, SourceError> {
        match self.socket.recv_from(&mut self.buf) {
            Ok((len, sender)) => {
                decode_datagram(&self.buf[..len], sender, self.clock.now()).map(Some)
            }
            Err(e)
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                Ok(None)
            }
            Err(e) => Err(SourceError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn sender() -> SocketAddr {
        "10.1.2.3:9999".parse().unwrap()
    }

    fn decode(payload: &str) -> Result<SensorSample, SourceError> {
        decode_datagram(payload.as_bytes(), sender(), 500.0)
    }

    #[test]
    fn full_sample_decodes() {
        let sample = decode(
            r#"{"sensor": "linear_acceleration",
                "values": {"x": 0.1, "y": 9.8, "z": -0.3},
                "timestamp": 1692.48,
                "source": "pixel7"}"#,
        )
        .unwrap();

        assert_eq!(sample.kind, SensorKind::Acceleration);
        assert_eq!(sample.values(), &[0.1, 9.8, -0.3]);
        assert_eq!(sample.timestamp, 1692.48);
        assert_eq!(sample.source.as_str(), "pixel7");
    }

    #[test]
    fn sensor_name_aliases_decode() {
        let cases = [
            ("linear_acceleration", SensorKind::Acceleration),
            ("accelerometer", SensorKind::Acceleration),
            ("acceleration", SensorKind::Acceleration),
            ("gyroscope", SensorKind::Gyroscope),
            ("gyro", SensorKind::Gyroscope),
        ];

        for (name, kind) in cases {
            let payload =
                format!(r#"{{"sensor": "{name}", "values": {{"x": 1, "y": 2, "z": 3}}}}"#);
            let sample = decode(&payload).unwrap();
            assert_eq!(sample.kind, kind, "alias {name:?}");
        }
    }

    #[test]
    fn rotation_carries_w() {
        let sample = decode(
            r#"{"sensor": "rotation_vector",
                "values": {"x": 0.0, "y": 0.0, "z": 0.7, "w": 0.7}}"#,
        )
        .unwrap();

        assert_eq!(sample.kind, SensorKind::Rotation);
        assert_eq!(sample.values(), &[0.0, 0.0, 0.7, 0.7]);
    }

    #[test]
    fn rotation_without_w_is_rejected() {
        let result = decode(r#"{"sensor": "rotation", "values": {"x": 0, "y": 0, "z": 1}}"#);
        assert!(matches!(result, Err(SourceError::Decode { .. })));
    }

    #[test]
    fn stray_w_on_motion_kind_is_ignored() {
        let sample =
            decode(r#"{"sensor": "gyro", "values": {"x": 1, "y": 2, "z": 3, "w": 9}}"#).unwrap();
        assert_eq!(sample.values(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn unknown_sensor_is_rejected() {
        let result = decode(r#"{"sensor": "barometer", "values": {"x": 1, "y": 2, "z": 3}}"#);
        assert!(matches!(result, Err(SourceError::Decode { .. })));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode("definitely not json"),
            Err(SourceError::Decode { .. })
        ));
        assert!(matches!(decode(""), Err(SourceError::Decode { .. })));
    }

    #[test]
    fn overflowing_value_is_rejected() {
        // 1e39 exceeds f32 range and lands as infinity
        let result = decode(r#"{"sensor": "gyro", "values": {"x": 1e39, "y": 0, "z": 0}}"#);
        assert!(matches!(result, Err(SourceError::Decode { .. })));
    }

    #[test]
    fn missing_timestamp_uses_fallback() {
        let sample = decode(r#"{"sensor": "gyro", "values": {"x": 1, "y": 2, "z": 3}}"#).unwrap();
        assert_eq!(sample.timestamp, 500.0);
    }

    #[test]
    fn missing_source_uses_sender_ip() {
        let sample = decode(r#"{"sensor": "gyro", "values": {"x": 1, "y": 2, "z": 3}}"#).unwrap();
        assert_eq!(sample.source.as_str(), "10.1.2.3");
    }

    #[test]
    fn loopback_datagram_is_received() {
        let mut source =
            UdpSampleSource::bind("127.0.0.1:0", Duration::from_millis(500)).unwrap();
        let addr = source.local_addr().unwrap();

        let tx = UdpSocket::bind("127.0.0.1:0").unwrap();
        tx.send_to(
            br#"{"sensor": "accelerometer", "values": {"x": 0.5, "y": 1.5, "z": 2.5}}"#,
            addr,
        )
        .unwrap();

        let sample = source.recv_sample().unwrap().unwrap();
        assert_eq!(sample.kind, SensorKind::Acceleration);
        assert_eq!(sample.values(), &[0.5, 1.5, 2.5]);
        assert_eq!(sample.source.as_str(), "127.0.0.1");
    }

    #[test]
    fn idle_socket_returns_none_after_wait() {
        let idle = Duration::from_millis(30);
        let mut source = UdpSampleSource::bind("127.0.0.1:0", idle).unwrap();

        let start = Instant::now();
        let got = source.recv_sample().unwrap();
        assert!(got.is_none());
        assert!(start.elapsed() >= idle);
    }
}
