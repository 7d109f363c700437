//! Driver task that pumps a provider into a channel

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace};

use super::provider::Provider;
use crate::packet::Packet;

/// Result of spawning the driver task
pub struct DriverChannels {
    /// Receiver for replayed packets
    pub packets: mpsc::Receiver<Packet>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
}

/// Spawns the task that owns a [`Provider`] and forwards its packets.
pub struct Driver;

impl Driver {
    /// Spawn the driver task. At most `capacity` packets are buffered ahead of the reader.
    pub fn spawn<P>(provider: P, capacity: usize) -> DriverChannels
    where
        P: Provider,
    {
        let (packet_tx, packet_rx) = mpsc::channel(capacity.max(1));
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        tokio::spawn(async move {
            Self::packet_pump_task(provider, packet_tx, cancel_task).await;
        });

        DriverChannels { packets: packet_rx, cancel }
    }

    async fn packet_pump_task<P>(
        mut provider: P,
        packet_tx: mpsc::Sender<Packet>,
        cancel: CancellationToken,
    ) where
        P: Provider,
    {
        info!("Replay of {} packets started", provider.log_type());
        let mut packet_count = 0u64;
        let mut error_count = 0u32;
        const MAX_ERRORS: u32 = 10;

        loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Replay cancelled");
                    break;
                }
                result = provider.next_packet() => result,
            };

            match result {
                Ok(Some(packet)) => {
                    packet_count += 1;
                    error_count = 0;
                    trace!("Packet {}: {}", packet_count, packet.definition().display_name());

                    let sent = tokio::select! {
                        _ = cancel.cancelled() => break,
                        sent = packet_tx.send(packet) => sent,
                    };
                    if sent.is_err() {
                        debug!("Packet receiver dropped, shutting down");
                        break;
                    }
                }
                Ok(None) => {
                    info!("Provider exhausted after {} packets", packet_count);
                    break;
                }
                Err(e) => {
                    error_count += 1;
                    error!("Provider error ({}/{}): {}", error_count, MAX_ERRORS, e);

                    if error_count >= MAX_ERRORS || !e.is_retryable() {
                        error!("Stopping replay after provider error");
                        break;
                    }

                    // Exponential backoff: 50ms, 100ms, 200ms, ...
                    let backoff = std::time::Duration::from_millis(50 * (1 << error_count.min(5)));
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        info!("Replay task ended (forwarded {} packets)", packet_count);
    }
}
