//! Connection handling for the socket transports.

use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::service::TaskService;

use super::{TRANSPORT_TARGET, TransportKind};

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Handles a single connection. Implementations should avoid panicking.
    fn handle(&self, stream: TcpStream);
}

const MAX_REQUEST_BYTES: usize = 64 * 1024;

const STATUS_OPERATION: &str = "status";

#[derive(Debug, Deserialize)]
struct Request {
    op: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum Reply<'a> {
    Status {
        transport: &'a str,
        users: usize,
        groups: usize,
    },
    Error {
        message: String,
    },
}

/// Reads one bounded JSON line and answers with the service status.
#[derive(Debug)]
pub(crate) struct StatusHandler {
    kind: TransportKind,
    service: Arc<TaskService>,
}

impl StatusHandler {
    pub(crate) fn new(kind: TransportKind, service: Arc<TaskService>) -> Self {
        Self { kind, service }
    }

    fn reply_to(&self, line: &[u8]) -> Reply<'_> {
        match serde_json::from_slice::<Request>(line) {
            Ok(request) if request.op == STATUS_OPERATION => Reply::Status {
                transport: self.kind.as_str(),
                users: self.service.user_count(),
                groups: self.service.group_count(),
            },
            Ok(request) => Reply::Error {
                message: format!("unsupported operation '{}'", request.op),
            },
            Err(error) => Reply::Error {
                message: format!("malformed request: {error}"),
            },
        }
    }

    fn respond(&self, stream: &mut TcpStream) -> io::Result<()> {
        let Some(line) = read_request_line(stream)? else {
            return Ok(());
        };
        let reply = self.reply_to(&line);
        if let Reply::Error { message } = &reply {
            debug!(
                target: TRANSPORT_TARGET,
                transport = %self.kind,
                message = %message,
                "rejected request"
            );
        }
        let mut bytes = serde_json::to_vec(&reply).map_err(io::Error::other)?;
        bytes.push(b'\n');
        stream.write_all(&bytes)?;
        stream.flush()
    }
}

impl ConnectionHandler for StatusHandler {
    fn handle(&self, mut stream: TcpStream) {
        if let Err(error) = self.respond(&mut stream) {
            warn!(
                target: TRANSPORT_TARGET,
                transport = %self.kind,
                error = %error,
                "connection handler error"
            );
        }
    }
}

fn read_request_line(stream: &mut impl Read) -> io::Result<Option<Vec<u8>>> {
    let mut buffer = Vec::new();
    let mut chunk = [0_u8; 1024];
    loop {
        let bytes_read = read_chunk_with_retry(stream, &mut chunk)?;
        if bytes_read == 0 {
            return Ok((!buffer.is_empty()).then_some(buffer));
        }

        let received = &chunk[..bytes_read];
        if let Some(pos) = received.iter().position(|byte| *byte == b'\n') {
            buffer.extend_from_slice(&received[..=pos]);
            enforce_request_limit(buffer.len())?;
            return Ok(Some(buffer));
        }

        buffer.extend_from_slice(received);
        enforce_request_limit(buffer.len())?;
    }
}

fn read_chunk_with_retry(stream: &mut impl Read, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

fn enforce_request_limit(size: usize) -> io::Result<()> {
    if size > MAX_REQUEST_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            "request exceeds maximum size",
        ));
    }
    Ok(())
}
