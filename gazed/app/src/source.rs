use anyhow::{Context, Result};
use api::{LandmarkSample, LandmarkSource};
use glam::DVec2;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::UdpSocket;

/// Wire format the vision collaborator sends, one datagram per frame:
/// `{ "t": <timestamp ms>, "pts": { "<landmark index>": [x, y], ... } }`.
#[derive(Debug, Deserialize)]
struct WireSample {
    t: f64,
    pts: HashMap<u16, [f64; 2]>,
}

impl WireSample {
    fn into_sample(self) -> LandmarkSample {
        LandmarkSample::with_points(
            self.t,
            self.pts
                .into_iter()
                .map(|(index, [x, y])| (index, DVec2::new(x, y))),
        )
    }
}

/// Receives landmark frames as JSON datagrams. Drains everything pending
/// each poll and keeps only the newest frame; the engine has no use for
/// stale ones.
pub struct UdpLandmarkSource {
    port: u16,
    socket: Option<UdpSocket>,
}

impl UdpLandmarkSource {
    pub fn new(port: u16) -> Self {
        Self { port, socket: None }
    }

    fn parse_datagram(buf: &[u8]) -> Option<LandmarkSample> {
        match serde_json::from_slice::<WireSample>(buf) {
            Ok(wire) => Some(wire.into_sample()),
            Err(e) => {
                debug!("Ignoring malformed landmark datagram: {}", e);
                None
            }
        }
    }
}

impl LandmarkSource for UdpLandmarkSource {
    fn initialize(&mut self) -> Result<()> {
        let socket = UdpSocket::bind(format!("0.0.0.0:{}", self.port))
            .with_context(|| format!("Failed to bind landmark port {}", self.port))?;
        socket
            .set_nonblocking(true)
            .context("Failed to set non-blocking mode")?;
        log::info!("Listening for landmark frames on UDP port {}", self.port);
        self.socket = Some(socket);
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<LandmarkSample>> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Landmark source not initialized"))?;

        let mut buf = [0u8; 16384];
        let mut latest: Option<LandmarkSample> = None;

        loop {
            match socket.recv_from(&mut buf) {
                Ok((amt, _src)) => {
                    if let Some(sample) = Self::parse_datagram(&buf[..amt]) {
                        latest = Some(sample);
                    }
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!("UDP receive error: {}", e);
                    break;
                }
            }
        }

        Ok(latest)
    }

    fn unload(&mut self) {
        self.socket = None;
    }
}
