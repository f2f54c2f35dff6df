//! Blocking request/reply loop
//!
//! Single-threaded by design: the engine is block-synchronous, so one
//! worker accepts a client, serves its requests in FIFO order, and goes
//! back to accepting when the client leaves. Per-request problems (wrong
//! payload size, bad channel) are answered with a silent block so the reply
//! stream stays in lockstep with requests; only transport failures end the
//! connection, and only startup failures end the process.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};

use anyhow::Context;
use bf_core::Sample;
use bf_engine::Engine;

use crate::frame::{Request, encode_reply};

/// Upper bound on accepted payload sizes; anything larger is a framing
/// error, not a plausible block.
const MAX_PAYLOAD: usize = 1 << 24;

pub struct Server {
    engine: Engine,
    listener: TcpListener,
}

impl Server {
    pub fn bind(engine: Engine, addr: SocketAddr) -> anyhow::Result<Self> {
        let listener =
            TcpListener::bind(addr).with_context(|| format!("binding to {addr}"))?;
        log::info!("Server: listening on {addr}");
        Ok(Self { engine, listener })
    }

    /// The address the listener actually bound (useful with port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept clients forever, one at a time.
    pub fn run(mut self) -> anyhow::Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().context("accepting client")?;
            log::info!("Client connected: {peer}");
            match self.serve_client(stream) {
                Ok(()) => log::info!("Client disconnected: {peer}"),
                Err(e) => log::warn!("Client {peer} dropped: {e}"),
            }
        }
    }

    /// Serve one client until it disconnects.
    fn serve_client(&mut self, mut stream: TcpStream) -> std::io::Result<()> {
        stream.set_nodelay(true)?;

        let block_size = self.engine.block_size();
        let mut request = Request::new(block_size);
        let mut payload = Vec::new();
        let mut reply = Vec::new();
        let mut out_left: Vec<Sample> = vec![0.0; block_size];
        let mut out_right: Vec<Sample> = vec![0.0; block_size];

        loop {
            let mut len_bytes = [0u8; 4];
            match stream.read_exact(&mut len_bytes) {
                Ok(()) => {}
                // A clean close between messages is a normal goodbye.
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e),
            }

            let len = u32::from_le_bytes(len_bytes) as usize;
            if len > MAX_PAYLOAD {
                return Err(std::io::Error::new(
                    ErrorKind::InvalidData,
                    format!("payload length {len} exceeds limit"),
                ));
            }
            payload.resize(len, 0);
            stream.read_exact(&mut payload)?;

            out_left.fill(0.0);
            out_right.fill(0.0);

            if !request.decode(&payload) {
                log::warn!(
                    "Request payload has {len} bytes, expected {}; replying silence",
                    request.payload_len()
                );
            } else if request.channel < 0 {
                log::warn!(
                    "Request channel {} is negative; replying silence",
                    request.channel
                );
            } else if let Err(e) = self.engine.handle_block(
                &request.audio,
                request.channel as usize,
                request.azimuth,
                request.elevation,
                &mut out_left,
                &mut out_right,
            ) {
                log::warn!("Request dropped: {e}");
                out_left.fill(0.0);
                out_right.fill(0.0);
            }

            encode_reply(&out_left, &out_right, &mut reply);
            stream.write_all(&reply)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bf_engine::EngineConfig;
    use std::path::Path;

    const N: usize = 4;

    fn write_identity_wav(path: &Path) {
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..N {
            writer
                .write_sample(if i == 0 { 1.0f32 } else { 0.0 })
                .unwrap();
            writer.write_sample(0.0f32).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn spawn_test_server(dir: &Path) -> SocketAddr {
        let wav = dir.join("ident.wav");
        write_identity_wav(&wav);
        let list = dir.join("filter_list.txt");
        std::fs::write(&list, format!("FILTER 0 0 0 0 0 0 0 0 0 {}\n", wav.display())).unwrap();

        let config = EngineConfig {
            block_size: N,
            filter_size: N,
            filter_list: list,
            ..EngineConfig::default()
        };
        let engine = Engine::new(config).unwrap();
        let server = Server::bind(engine, "127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = server.local_addr().unwrap();
        std::thread::spawn(move || {
            let _ = server.run();
        });
        addr
    }

    fn send_frame(stream: &mut TcpStream, rows: &[(f32, f32)]) {
        let mut message = Vec::new();
        message.extend_from_slice(&((rows.len() * 8) as u32).to_le_bytes());
        for (audio, meta) in rows {
            message.extend_from_slice(&audio.to_le_bytes());
            message.extend_from_slice(&meta.to_le_bytes());
        }
        stream.write_all(&message).unwrap();
    }

    fn read_reply(stream: &mut TcpStream) -> (Vec<f32>, Vec<f32>) {
        let mut len_bytes = [0u8; 4];
        stream.read_exact(&mut len_bytes).unwrap();
        let len = u32::from_le_bytes(len_bytes) as usize;
        let mut payload = vec![0u8; len];
        stream.read_exact(&mut payload).unwrap();

        let mut left = Vec::new();
        let mut right = Vec::new();
        for row in payload.chunks_exact(8) {
            left.push(f32::from_le_bytes([row[0], row[1], row[2], row[3]]));
            right.push(f32::from_le_bytes([row[4], row[5], row[6], row[7]]));
        }
        (left, right)
    }

    #[test]
    fn test_request_reply_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_test_server(dir.path());

        let mut stream = TcpStream::connect(addr).unwrap();
        send_frame(
            &mut stream,
            &[(1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)],
        );
        let (left, right) = read_reply(&mut stream);

        assert_eq!(left.len(), N);
        for (i, want) in [1.0f32, 2.0, 3.0, 4.0].iter().enumerate() {
            assert!((left[i] - want).abs() < 1e-5, "sample {i}: got {}", left[i]);
            assert!(right[i].abs() < 1e-5);
        }
    }

    #[test]
    fn test_malformed_request_gets_silent_reply() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_test_server(dir.path());

        let mut stream = TcpStream::connect(addr).unwrap();
        // Two rows instead of four: wrong shape for blockSize 4.
        send_frame(&mut stream, &[(1.0, 0.0), (2.0, 0.0)]);
        let (left, right) = read_reply(&mut stream);

        // The reply still has the full block shape and is silent, and the
        // server keeps serving this connection.
        assert_eq!(left, vec![0.0; N]);
        assert_eq!(right, vec![0.0; N]);

        send_frame(
            &mut stream,
            &[(1.0, 0.0), (0.0, 0.0), (0.0, 0.0), (0.0, 0.0)],
        );
        let (left, _) = read_reply(&mut stream);
        assert!((left[0] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_out_of_range_channel_gets_silent_reply() {
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn_test_server(dir.path());

        let mut stream = TcpStream::connect(addr).unwrap();
        send_frame(
            &mut stream,
            &[(1.0, 99.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)],
        );
        let (left, right) = read_reply(&mut stream);
        assert_eq!(left, vec![0.0; N]);
        assert_eq!(right, vec![0.0; N]);
    }
}

