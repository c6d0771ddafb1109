use std::{net::SocketAddr, sync::Arc, time::Duration};

use fabric_core::{now_unix_ms, peers::PeerRegistry};
use fabric_model::{PeerAck, PeerHello, PeerInfo};
use tokio::{
    io::BufReader,
    net::{TcpListener, TcpStream},
    task::JoinHandle,
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{read_frame, write_frame};
use crate::error::{ExecError, ExecResult};

/// Accepts peer handshakes and answers each with this node's [`PeerAck`].
///
/// With a registry attached, every greeting peer is recorded under the remote socket
/// address it connected from.
pub struct HandshakeServer {
    listener: TcpListener,
    ack: PeerAck,
    registry: Option<Arc<PeerRegistry>>,
    io_timeout: Duration,
}

impl HandshakeServer {
    /// Bind `address` (`host:port`; port 0 picks a free one).
    pub async fn bind(address: &str, node_id: &str, public_key: &str) -> ExecResult<Self> {
        let listener = TcpListener::bind(address).await?;
        Ok(Self {
            listener,
            ack: PeerAck::ok(node_id, public_key),
            registry: None,
            io_timeout: Duration::from_secs(5),
        })
    }

    pub fn with_registry(mut self, registry: Arc<PeerRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_io_timeout(mut self, io_timeout: Duration) -> Self {
        self.io_timeout = io_timeout;
        self
    }

    pub fn local_addr(&self) -> ExecResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until `cancel` fires. Each connection is answered on its own task.
    pub async fn serve(self, cancel: CancellationToken) -> ExecResult<()> {
        info!(address = %self.local_addr()?, node = %self.ack.node_id, "handshake server listening");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!("handshake server stopping");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (stream, remote) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %e, "accept failed");
                            continue;
                        }
                    };
                    let ack = self.ack.clone();
                    let registry = self.registry.clone();
                    let io_timeout = self.io_timeout;
                    tokio::spawn(async move {
                        match timeout(io_timeout, answer(stream, &ack)).await {
                            Ok(Ok(hello)) => admit(hello, remote, &ack, registry.as_deref()),
                            Ok(Err(e)) => warn!(%remote, error = %e, "handshake failed"),
                            Err(_) => warn!(%remote, "handshake timed out"),
                        }
                    });
                }
            }
        }
    }

    /// Run [`Self::serve`] on a background task.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<ExecResult<()>> {
        tokio::spawn(self.serve(cancel))
    }
}

async fn answer(stream: TcpStream, ack: &PeerAck) -> ExecResult<PeerHello> {
    let (rd, mut wr) = stream.into_split();
    let mut rd = BufReader::new(rd);
    let hello: PeerHello = read_frame(&mut rd).await?;
    if hello.node_id.is_empty() {
        return Err(ExecError::Protocol("hello without node id".into()));
    }
    write_frame(&mut wr, ack).await?;
    Ok(hello)
}

fn admit(hello: PeerHello, remote: SocketAddr, ack: &PeerAck, registry: Option<&PeerRegistry>) {
    info!(peer = %hello.node_id, %remote, version = %hello.version, "peer connected");
    let Some(registry) = registry else {
        return;
    };
    if hello.node_id == ack.node_id {
        return;
    }
    let mut info = PeerInfo::new(
        hello.node_id,
        remote.to_string(),
        hello.public_key,
        now_unix_ms(),
    );
    info.version = hello.version;
    registry.add_peer(info);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fabric_core::{ports::PeerConnector, prelude::NodeRuntime};
    use fabric_model::NodeConfig;
    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::{EchoGenerator, InlineExecutor, wire::TcpPeerConnector};

    type Running = (SocketAddr, CancellationToken, JoinHandle<ExecResult<()>>);

    async fn start(registry: Option<Arc<PeerRegistry>>) -> Running {
        let mut server = HandshakeServer::bind("127.0.0.1:0", "server", "server-key")
            .await
            .unwrap()
            .with_io_timeout(Duration::from_millis(500));
        if let Some(r) = registry {
            server = server.with_registry(r);
        }
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let handle = server.spawn(cancel.clone());
        (addr, cancel, handle)
    }

    #[tokio::test]
    async fn answers_hello_and_registers_peer() {
        let registry = Arc::new(PeerRegistry::new());
        let (addr, cancel, handle) = start(Some(Arc::clone(&registry))).await;

        let hello = PeerHello {
            node_id: "client".into(),
            public_key: "client-key".into(),
            version: "1.0".into(),
        };
        let ack = TcpPeerConnector::default()
            .handshake(&addr.to_string(), &hello)
            .await
            .unwrap();
        assert!(ack.is_ok());
        assert_eq!(ack.node_id, "server");
        assert_eq!(ack.public_key, "server-key");

        // registration happens after the ack is written
        for _ in 0..50 {
            if registry.contains("client") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        let peer = registry.get("client").unwrap();
        assert_eq!(peer.public_key, "client-key");
        assert!(peer.address.starts_with("127.0.0.1:"));

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn garbage_does_not_stop_the_server() {
        let (addr, cancel, handle) = start(None).await;

        let mut raw = TcpStream::connect(addr).await.unwrap();
        raw.write_all(b"hello there\n").await.unwrap();
        drop(raw);

        let hello = PeerHello {
            node_id: "after".into(),
            public_key: String::new(),
            version: "1.0".into(),
        };
        let ack = TcpPeerConnector::default()
            .handshake(&addr.to_string(), &hello)
            .await
            .unwrap();
        assert!(ack.is_ok());

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn nodes_connect_over_tcp() {
        let server_node = NodeRuntime::new(
            NodeConfig {
                node_id: "alpha".into(),
                ..NodeConfig::default()
            },
            Arc::new(EchoGenerator::new()),
            Arc::new(InlineExecutor),
        );
        let hello = server_node.hello();
        let server = HandshakeServer::bind("127.0.0.1:0", &hello.node_id, &hello.public_key)
            .await
            .unwrap()
            .with_registry(Arc::clone(server_node.peers()));
        let addr = server.local_addr().unwrap();
        let cancel = CancellationToken::new();
        let handle = server.spawn(cancel.clone());

        let client = NodeRuntime::new(
            NodeConfig {
                node_id: "beta".into(),
                ..NodeConfig::default()
            },
            Arc::new(EchoGenerator::new()),
            Arc::new(InlineExecutor),
        )
        .with_connector(Arc::new(TcpPeerConnector::default()));

        let report = client.connect_peers(&[addr.to_string()]).await;
        assert_eq!(report.connected, 1);
        let alpha = client.peers().get("alpha").unwrap();
        assert_eq!(alpha.address, addr.to_string());
        assert_eq!(alpha.public_key, hello.public_key);

        cancel.cancel();
        handle.await.unwrap().unwrap();
    }
}
