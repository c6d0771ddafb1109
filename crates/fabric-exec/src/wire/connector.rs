use std::{io, time::Duration};

use async_trait::async_trait;
use fabric_core::{error::CollaboratorError, ports::PeerConnector};
use fabric_model::{PeerAck, PeerHello};
use tokio::{io::BufReader, net::TcpStream, time::timeout};
use tracing::{debug, instrument};

use super::{read_frame, write_frame};
use crate::error::{ExecError, ExecResult};

/// [`PeerConnector`] speaking the JSON handshake over a fresh TCP connection per call.
#[derive(Debug, Clone)]
pub struct TcpPeerConnector {
    io_timeout: Duration,
}

impl TcpPeerConnector {
    /// `io_timeout` bounds connect, send and receive together.
    pub fn new(io_timeout: Duration) -> Self {
        Self { io_timeout }
    }

    async fn exchange(&self, address: &str, hello: &PeerHello) -> ExecResult<PeerAck> {
        let valid = address
            .rsplit_once(':')
            .is_some_and(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok());
        if !valid {
            return Err(ExecError::InvalidAddress(address.to_string()));
        }
        let stream = TcpStream::connect(address).await?;
        let (rd, mut wr) = stream.into_split();
        write_frame(&mut wr, hello).await?;
        let mut rd = BufReader::new(rd);
        read_frame(&mut rd).await
    }
}

impl Default for TcpPeerConnector {
    fn default() -> Self {
        Self::new(Duration::from_secs(5))
    }
}

#[async_trait]
impl PeerConnector for TcpPeerConnector {
    #[instrument(level = "debug", skip(self, hello), fields(node = %hello.node_id))]
    async fn handshake(
        &self,
        address: &str,
        hello: &PeerHello,
    ) -> Result<PeerAck, CollaboratorError> {
        let ms = self.io_timeout.as_millis() as u64;
        match timeout(self.io_timeout, self.exchange(address, hello)).await {
            Ok(Ok(ack)) => {
                debug!(peer = %ack.node_id, status = %ack.status, "handshake answered");
                Ok(ack)
            }
            Ok(Err(e)) => Err(to_collaborator(e)),
            Err(_) => Err(CollaboratorError::Timeout { ms }),
        }
    }
}

fn to_collaborator(e: ExecError) -> CollaboratorError {
    match e {
        ExecError::Io(io) if is_unreachable(&io) => CollaboratorError::Unavailable(io.to_string()),
        other => CollaboratorError::Failed(other.to_string()),
    }
}

fn is_unreachable(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::NotConnected
            | io::ErrorKind::AddrNotAvailable
    )
}
