//! Blocking line-oriented transport to a destination endpoint.
//!
//! # Invariants
//! - One request line is answered by exactly one response line.
//! - Every exchange opens its own connection and closes it afterwards.
//! - A reply line longer than `MAX_REPLY_BYTES` is rejected as invalid data.

use crate::model::endpoint::Endpoint;
use log::{debug, warn};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_IO_TIMEOUT_MS: u64 = 30_000;

/// Upper bound for one reply line, newline included.
pub const MAX_REPLY_BYTES: u64 = 1024 * 1024;

/// Timeouts applied by network transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportOptions {
    pub connect_timeout: Duration,
    /// Read and write timeout for one exchange.
    pub io_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            io_timeout: Duration::from_millis(DEFAULT_IO_TIMEOUT_MS),
        }
    }
}

/// One request/response exchange with a destination.
pub trait Transport {
    /// Sends one request line and returns the reply line without its newline.
    fn exchange(&mut self, request: &str) -> io::Result<String>;
}

/// TCP transport bound to one endpoint.
pub struct TcpTransport {
    endpoint: Endpoint,
    options: TransportOptions,
}

impl TcpTransport {
    pub fn new(endpoint: Endpoint, options: TransportOptions) -> Self {
        Self { endpoint, options }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    fn connect(&self) -> io::Result<TcpStream> {
        let addrs = (self.endpoint.address.as_str(), self.endpoint.port).to_socket_addrs()?;
        let mut last_error = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.options.connect_timeout) {
                Ok(stream) => {
                    stream.set_read_timeout(Some(self.options.io_timeout))?;
                    stream.set_write_timeout(Some(self.options.io_timeout))?;
                    stream.set_nodelay(true)?;
                    return Ok(stream);
                }
                Err(err) => last_error = Some(err),
            }
        }
        Err(last_error.unwrap_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("endpoint {} resolved to no addresses", self.endpoint),
            )
        }))
    }

    fn exchange_on(stream: TcpStream, request: &str) -> io::Result<String> {
        let mut stream = BufReader::new(stream);
        let writer = stream.get_mut();
        writer.write_all(request.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        let mut reply = String::new();
        let read = (&mut stream).take(MAX_REPLY_BYTES).read_line(&mut reply)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "destination closed the connection before replying",
            ));
        }
        if read as u64 == MAX_REPLY_BYTES && !reply.ends_with('\n') {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("reply exceeds {MAX_REPLY_BYTES} bytes"),
            ));
        }
        let trimmed_len = reply.trim_end_matches(['\r', '\n']).len();
        reply.truncate(trimmed_len);
        Ok(reply)
    }
}

impl Transport for TcpTransport {
    fn exchange(&mut self, request: &str) -> io::Result<String> {
        let started_at = Instant::now();
        let stream = self.connect()?;

        match Self::exchange_on(stream, request) {
            Ok(reply) => {
                debug!(
                    "event=transport_exchange module=sender status=ok endpoint={} duration_ms={} request_bytes={} reply_bytes={}",
                    self.endpoint,
                    started_at.elapsed().as_millis(),
                    request.len(),
                    reply.len()
                );
                Ok(reply)
            }
            Err(err) => {
                warn!(
                    "event=transport_exchange module=sender status=error endpoint={} duration_ms={} error_kind={:?}",
                    self.endpoint,
                    started_at.elapsed().as_millis(),
                    err.kind()
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{TcpTransport, Transport, TransportOptions, MAX_REPLY_BYTES};
    use crate::model::endpoint::Endpoint;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn destination_closing_after_each_reply_serves_every_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();
        let server = thread::spawn(move || {
            for _ in 0..2 {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
                let mut writer = stream;
                let mut line = String::new();
                reader.read_line(&mut line).expect("read request");
                writer
                    .write_all(format!("echo:{}\n", line.trim_end()).as_bytes())
                    .expect("write reply");
            }
        });

        let mut transport =
            TcpTransport::new(Endpoint::new("127.0.0.1", port), TransportOptions::default());
        assert_eq!(transport.exchange("one").expect("first exchange"), "echo:one");
        assert_eq!(transport.exchange("two").expect("second exchange"), "echo:two");
        server.join().expect("server thread");
    }

    #[test]
    fn closed_connection_without_reply_is_unexpected_eof() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream);
            let mut line = String::new();
            reader.read_line(&mut line).expect("read request");
        });

        let options = TransportOptions {
            connect_timeout: Duration::from_secs(1),
            io_timeout: Duration::from_secs(2),
        };
        let mut transport = TcpTransport::new(Endpoint::new("127.0.0.1", port), options);
        let err = transport.exchange("ping").expect_err("no reply must fail");
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
        server.join().expect("server thread");
    }

    #[test]
    fn oversized_reply_is_invalid_data() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind loopback");
        let port = listener.local_addr().expect("local addr").port();
        let server = thread::spawn(move || {
            let (stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut writer = stream;
            let mut line = String::new();
            reader.read_line(&mut line).expect("read request");
            let oversized = vec![b'a'; MAX_REPLY_BYTES as usize + 16];
            // The client hangs up once the cap is reached.
            let _ = writer.write_all(&oversized);
            let _ = writer.write_all(b"\n");
        });

        let options = TransportOptions {
            connect_timeout: Duration::from_secs(1),
            io_timeout: Duration::from_secs(5),
        };
        let mut transport = TcpTransport::new(Endpoint::new("127.0.0.1", port), options);
        let err = transport.exchange("ping").expect_err("oversized reply must fail");
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        server.join().expect("server thread");
    }
}
