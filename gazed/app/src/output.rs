use anyhow::{Context, Result};
use api::CalibrationEvent;
use common::{IoConfig, OutputMode, PointerSink, TrackerOutput};
use log::info;
use rosc::{encoder, OscMessage, OscPacket, OscType};
use std::net::UdpSocket;

/// Sends each frame's `TrackerOutput` as one JSON datagram.
pub struct JsonUdpSink {
    socket: Option<UdpSocket>,
    target_address: String,
}

impl JsonUdpSink {
    pub fn new(target_address: String) -> Self {
        Self {
            socket: None,
            target_address,
        }
    }
}

impl PointerSink for JsonUdpSink {
    fn initialize(&mut self) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind UDP socket")?;
        socket
            .connect(&self.target_address)
            .with_context(|| format!("Failed to connect to {}", self.target_address))?;
        self.socket = Some(socket);
        info!("JSON output initialized. Target: {}", self.target_address);
        Ok(())
    }

    fn send(&self, output: &TrackerOutput) -> Result<()> {
        if let Some(socket) = &self.socket {
            let json = serde_json::to_vec(output)?;
            socket.send(&json)?;
        }
        Ok(())
    }
}

/// Sends the pointer stream as OSC messages under `/gaze`.
pub struct OscSink {
    socket: Option<UdpSocket>,
    target_address: String,
}

impl OscSink {
    pub fn new(target_address: String) -> Self {
        Self {
            socket: None,
            target_address,
        }
    }

    fn send_message(&self, addr: &str, args: Vec<OscType>) -> Result<()> {
        if let Some(socket) = &self.socket {
            let packet = OscPacket::Message(OscMessage {
                addr: addr.to_string(),
                args,
            });
            let bytes = encoder::encode(&packet).context("Failed to encode OSC message")?;
            socket.send(&bytes)?;
        }
        Ok(())
    }
}

impl PointerSink for OscSink {
    fn initialize(&mut self) -> Result<()> {
        let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind UDP socket")?;
        socket
            .connect(&self.target_address)
            .with_context(|| format!("Failed to connect to {}", self.target_address))?;
        self.socket = Some(socket);
        info!("OSC output initialized. Target: {}", self.target_address);
        Ok(())
    }

    fn send(&self, output: &TrackerOutput) -> Result<()> {
        self.send_message(
            "/gaze/position",
            vec![
                OscType::Float(output.x as f32),
                OscType::Float(output.y as f32),
                OscType::Bool(output.calibrated),
            ],
        )?;

        if let Some(click) = &output.click {
            self.send_message(
                "/gaze/click",
                vec![OscType::Float(click.x as f32), OscType::Float(click.y as f32)],
            )?;
        }

        match output.calibration {
            Some(CalibrationEvent::Point { index, total }) => {
                self.send_message(
                    "/gaze/calibration/point",
                    vec![OscType::Int(index as i32), OscType::Int(total as i32)],
                )?;
            }
            Some(CalibrationEvent::Finished { success }) => {
                self.send_message("/gaze/calibration/done", vec![OscType::Bool(success)])?;
            }
            None => {}
        }

        Ok(())
    }
}

pub enum OutputBackend {
    Json(JsonUdpSink),
    Osc(OscSink),
}

impl PointerSink for OutputBackend {
    fn initialize(&mut self) -> Result<()> {
        match self {
            Self::Json(s) => s.initialize(),
            Self::Osc(s) => s.initialize(),
        }
    }

    fn send(&self, output: &TrackerOutput) -> Result<()> {
        match self {
            Self::Json(s) => s.send(output),
            Self::Osc(s) => s.send(output),
        }
    }
}

pub struct Dispatcher {
    backend: OutputBackend,
}

impl Dispatcher {
    pub fn new(config: &IoConfig) -> Self {
        let target = format!("{}:{}", config.send_address, config.send_port);
        let backend = match config.output_mode {
            OutputMode::Generic => OutputBackend::Json(JsonUdpSink::new(target)),
            OutputMode::Osc => OutputBackend::Osc(OscSink::new(target)),
        };
        Self { backend }
    }

    pub fn initialize(&mut self) -> Result<()> {
        self.backend.initialize()
    }

    pub fn send(&self, output: &TrackerOutput) -> Result<()> {
        self.backend.send(output)
    }
}
