// Pupil Capture ingestion
//
// Subscribes to the tracker's pub-sub feed (surface-mapped gaze, blink
// events, 2D pupil positions) and overwrites the mailbox slots. Uses the
// pure Rust zeromq implementation, payloads are MessagePack.

use crate::error::{Result, SelectError};
use crate::mailbox::SampleMailbox;
use crate::types::{BlinkEvent, BlinkKind, Sample};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use zeromq::{ReqSocket, Socket, SocketRecv, SocketSend, SubSocket, ZmqMessage};

pub const SURFACE_TOPIC: &str = "surface";
pub const BLINK_TOPIC: &str = "blinks";
pub const PUPIL_TOPIC: &str = "pupil.0.2d";

const MAX_CONSECUTIVE_ERRORS: u64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_host")]
    pub host: String,

    /// Pupil Remote request port
    #[serde(default = "default_request_port")]
    pub request_port: u16,

    /// Surface whose gaze mapping is used
    #[serde(default = "default_surface_name")]
    pub surface_name: String,

    /// Gaze below or at this confidence is dropped
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,

    /// Ask Pupil Capture to start recording after connecting
    #[serde(default)]
    pub start_recording: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_request_port() -> u16 {
    50020
}
fn default_surface_name() -> String {
    "monitor_overlay".to_string()
}
fn default_min_confidence() -> f64 {
    0.89
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            request_port: default_request_port(),
            surface_name: default_surface_name(),
            min_confidence: default_min_confidence(),
            start_recording: false,
        }
    }
}

impl IngestConfig {
    pub fn request_endpoint(&self) -> String {
        format!("tcp://{}:{}", self.host, self.request_port)
    }
}

#[derive(Debug, Deserialize)]
struct SurfacePayload {
    name: String,
    #[serde(default)]
    gaze_on_surfaces: Vec<SurfaceGaze>,
}

#[derive(Debug, Deserialize)]
struct SurfaceGaze {
    norm_pos: (f64, f64),
    #[serde(default)]
    confidence: f64,
    timestamp: f64,
}

#[derive(Debug, Deserialize)]
struct BlinkPayload {
    #[serde(rename = "type")]
    kind: String,
    timestamp: f64,
}

#[derive(Debug, Deserialize)]
struct PupilPayload {
    norm_pos: (f64, f64),
    timestamp: f64,
    #[serde(default)]
    confidence: f64,
}

/// A decoded tracker message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TrackerEvent {
    Gaze(Sample),
    Blink(BlinkEvent),
    Head(Sample),
}

impl TrackerEvent {
    pub fn post(self, mailbox: &SampleMailbox) {
        match self {
            Self::Gaze(sample) => mailbox.post_gaze(sample),
            Self::Blink(event) => mailbox.post_blink(event),
            Self::Head(sample) => mailbox.post_head(sample),
        }
    }
}

fn decode_error(what: &str, e: rmp_serde::decode::Error) -> SelectError {
    SelectError::Decode(format!("{} payload: {}", what, e))
}

/// Latest confident gaze on the named surface, if any
pub fn decode_surface_gaze(payload: &[u8], surface_name: &str, min_confidence: f64) -> Result<Option<Sample>> {
    let surface: SurfacePayload = rmp_serde::from_slice(payload).map_err(|e| decode_error("surface", e))?;
    if surface.name != surface_name {
        return Ok(None);
    }
    let Some(latest) = surface.gaze_on_surfaces.last() else {
        return Ok(None);
    };
    if latest.confidence <= min_confidence {
        return Ok(None);
    }
    let (x, y) = latest.norm_pos;
    Ok(Some(Sample::new(x, y, latest.timestamp).with_confidence(latest.confidence)))
}

pub fn decode_blink(payload: &[u8]) -> Result<Option<BlinkEvent>> {
    let blink: BlinkPayload = rmp_serde::from_slice(payload).map_err(|e| decode_error("blink", e))?;
    Ok(BlinkKind::from_str(&blink.kind).map(|kind| BlinkEvent {
        kind,
        timestamp: blink.timestamp,
    }))
}

pub fn decode_pupil(payload: &[u8]) -> Result<Sample> {
    let pupil: PupilPayload = rmp_serde::from_slice(payload).map_err(|e| decode_error("pupil", e))?;
    let (x, y) = pupil.norm_pos;
    Ok(Sample::new(x, y, pupil.timestamp).with_confidence(pupil.confidence))
}

/// Decode one `(topic, payload)` pair. Topics we do not consume yield `None`.
pub fn decode_message(topic: &str, payload: &[u8], config: &IngestConfig) -> Result<Option<TrackerEvent>> {
    if topic.starts_with(SURFACE_TOPIC) {
        Ok(decode_surface_gaze(payload, &config.surface_name, config.min_confidence)?.map(TrackerEvent::Gaze))
    } else if topic.starts_with(BLINK_TOPIC) {
        Ok(decode_blink(payload)?.map(TrackerEvent::Blink))
    } else if topic.starts_with(PUPIL_TOPIC) {
        Ok(Some(TrackerEvent::Head(decode_pupil(payload)?)))
    } else {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub messages: u64,
    pub decode_errors: u64,
}

/// Pupil Capture pub-sub adapter
pub struct PupilSource {
    config: IngestConfig,
}

impl PupilSource {
    pub fn new(config: IngestConfig) -> Self {
        Self { config }
    }

    fn transport(context: &str, e: impl std::fmt::Display) -> SelectError {
        SelectError::Transport(format!("{}: {}", context, e))
    }

    async fn request(req: &mut ReqSocket, command: &str) -> Result<String> {
        req.send(ZmqMessage::from(command.to_string()))
            .await
            .map_err(|e| Self::transport(command, e))?;
        let reply = req.recv().await.map_err(|e| Self::transport(command, e))?;
        let frames = reply.into_vec();
        Ok(frames
            .first()
            .map(|f| String::from_utf8_lossy(f).trim().to_string())
            .unwrap_or_default())
    }

    /// Ask Pupil Remote for the SUB port (and optionally start recording),
    /// returning the SUB endpoint
    pub async fn negotiate(&self) -> Result<String> {
        let endpoint = self.config.request_endpoint();
        let mut req = ReqSocket::new();
        req.connect(&endpoint)
            .await
            .map_err(|e| Self::transport("Pupil Remote connect", e))?;

        let port = Self::request(&mut req, "SUB_PORT").await?;
        let port: u16 = port
            .parse()
            .map_err(|_| SelectError::Transport(format!("Invalid SUB_PORT reply: {:?}", port)))?;

        if self.config.start_recording {
            let reply = Self::request(&mut req, "R").await?;
            log::info!("Requested recording start: {}", reply);
        }

        Ok(format!("tcp://{}:{}", self.config.host, port))
    }

    async fn subscribe(&self) -> Result<(SubSocket, String)> {
        let endpoint = self.negotiate().await?;

        let mut socket = SubSocket::new();
        socket
            .connect(&endpoint)
            .await
            .map_err(|e| Self::transport("SUB connect", e))?;
        for topic in [SURFACE_TOPIC, BLINK_TOPIC, PUPIL_TOPIC] {
            socket
                .subscribe(topic)
                .await
                .map_err(|e| Self::transport("subscribe", e))?;
        }
        Ok((socket, endpoint))
    }

    /// Receive until cancelled, overwriting mailbox slots. Fails after too
    /// many consecutive receive errors.
    pub async fn run(self, mailbox: Arc<SampleMailbox>, cancel: CancellationToken) -> Result<IngestStats> {
        // A peer that accepts TCP but never answers would otherwise hold the
        // task here past cancellation
        let (mut socket, endpoint) = tokio::select! {
            _ = cancel.cancelled() => {
                log::info!("Cancelled before Pupil Capture answered on {}", self.config.request_endpoint());
                return Ok(IngestStats::default());
            }
            connected = self.subscribe() => connected?,
        };
        log::info!("Listening for gaze, blink and pupil data on {}", endpoint);

        let mut stats = IngestStats::default();
        let mut error_count = 0u64;

        loop {
            let msg = tokio::select! {
                _ = cancel.cancelled() => break,
                msg = socket.recv() => msg,
            };

            let msg = match msg {
                Ok(m) => m,
                Err(e) => {
                    error_count += 1;
                    log::error!("ZMQ receive error: {}", e);
                    if error_count > MAX_CONSECUTIVE_ERRORS {
                        return Err(SelectError::Transport(format!(
                            "Too many ZMQ errors ({})",
                            error_count
                        )));
                    }
                    continue;
                }
            };
            error_count = 0;

            let frames = msg.into_vec();
            let (Some(topic), Some(payload)) = (frames.first(), frames.get(1)) else {
                log::warn!("Dropping message with {} frame(s)", frames.len());
                continue;
            };
            let topic = String::from_utf8_lossy(topic);

            match decode_message(&topic, payload, &self.config) {
                Ok(Some(event)) => event.post(&mailbox),
                Ok(None) => {}
                Err(e) => {
                    stats.decode_errors += 1;
                    log::warn!("{}", e);
                }
            }

            stats.messages += 1;
            if stats.messages % 1000 == 0 {
                log::debug!("Received {} tracker messages", stats.messages);
            }
        }

        log::info!(
            "Pupil stream stopped ({} messages, {} decode errors)",
            stats.messages,
            stats.decode_errors
        );
        Ok(stats)
    }
}
