use std::time::Duration;

use fabric_model::{ConnectReport, PeerConnectStatus, PeerInfo};
use tokio::time::timeout;
use tracing::{info, warn};

use super::NodeRuntime;
use crate::{clock::now_unix_ms, error::CollaboratorError, retry::retry};

impl NodeRuntime {
    /// Handshake with every address and register the peers that acknowledge.
    ///
    /// Each address is retried with the configured backoff; one failing address never
    /// aborts the others. Without a connector every address fails.
    pub async fn connect_peers(&self, addresses: &[String]) -> ConnectReport {
        let mut report = ConnectReport::default();
        for address in addresses {
            report.push(self.connect_one(address).await);
        }
        info!(
            node = %self.config.node_id,
            connected = report.connected,
            failed = report.failed,
            peers = self.peers.count(),
            "peer connect finished"
        );
        report
    }

    async fn connect_one(&self, address: &str) -> PeerConnectStatus {
        let Some(connector) = &self.connector else {
            return PeerConnectStatus {
                address: address.to_string(),
                connected: false,
                node_id: None,
                attempts: 0,
                error: Some("no peer connector configured".into()),
            };
        };

        let hello = &self.hello();
        let limit_ms = self.config.peer_connect_timeout_ms;
        let entropy = self.ctx.entropy();
        let outcome = retry(
            self.config.peer_retry_attempts,
            &self.config.peer_backoff,
            entropy.as_ref(),
            |_| async move {
                let ack = match timeout(
                    Duration::from_millis(limit_ms),
                    connector.handshake(address, hello),
                )
                .await
                {
                    Ok(Ok(ack)) => ack,
                    Ok(Err(e)) => return Err(e),
                    Err(_) => return Err(CollaboratorError::Timeout { ms: limit_ms }),
                };
                if ack.is_ok() {
                    Ok(ack)
                } else {
                    Err(CollaboratorError::Failed(format!(
                        "peer answered status {:?}",
                        ack.status
                    )))
                }
            },
        )
        .await;

        match outcome.result {
            Ok(ack) => {
                self.peers.add_peer(PeerInfo::new(
                    &ack.node_id,
                    address,
                    ack.public_key,
                    now_unix_ms(),
                ));
                PeerConnectStatus {
                    address: address.to_string(),
                    connected: true,
                    node_id: Some(ack.node_id),
                    attempts: outcome.attempts,
                    error: None,
                }
            }
            Err(e) => {
                warn!(address, attempts = outcome.attempts, error = %e, "peer connect failed");
                PeerConnectStatus {
                    address: address.to_string(),
                    connected: false,
                    node_id: None,
                    attempts: outcome.attempts,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
