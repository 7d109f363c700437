//! Replay connection for packet logs

use futures::Stream;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info};

use super::driver::Driver;
use super::provider::{LogReplayProvider, Provider};
use crate::definition::DefinitionRegistry;
use crate::log::DecodePolicy;
use crate::packet::Packet;
use crate::types::LogType;
use crate::Result;

/// Replay settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayOptions {
    /// Playback speed multiplier, 0.0 for no pacing
    pub speed: f64,
    /// Packets buffered ahead of the consumer
    pub channel_capacity: usize,
    #[serde(skip)]
    pub policy: DecodePolicy,
}

impl Default for ReplayOptions {
    fn default() -> Self {
        Self { speed: 1.0, channel_capacity: 64, policy: DecodePolicy::Skip }
    }
}

impl ReplayOptions {
    /// Replay without delays between packets.
    pub fn unpaced() -> Self {
        Self { speed: 0.0, ..Self::default() }
    }
}

/// Replays a packet log through a background task.
///
/// Dropping the connection, or the stream taken from it, stops the task.
pub struct ReplayConnection {
    packets: mpsc::Receiver<Packet>,
    log_type: LogType,
    label: String,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl ReplayConnection {
    /// Open a packet log for replay.
    ///
    /// Must be called within a tokio runtime. Header errors are reported here; decode
    /// errors during replay follow `options.policy`.
    pub async fn open<P: AsRef<Path>>(
        path: P,
        registry: Arc<DefinitionRegistry>,
        options: ReplayOptions,
    ) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening packet log for replay: {}", path.display());

        let mut provider = LogReplayProvider::new(path, registry, options.policy)?;
        provider.set_speed(options.speed);
        let log_type = provider.log_type();
        let label = provider.label().to_string();

        let channels = Driver::spawn(provider, options.channel_capacity);
        info!("Replay connection opened ({} log, {}x)", log_type, options.speed);

        Ok(Self::from_channels(channels.packets, channels.cancel, log_type, label))
    }

    /// Replay packets from any provider.
    pub fn from_provider<P: Provider>(provider: P, channel_capacity: usize) -> Self {
        let log_type = provider.log_type();
        let channels = Driver::spawn(provider, channel_capacity);
        Self::from_channels(channels.packets, channels.cancel, log_type, String::new())
    }

    fn from_channels(
        packets: mpsc::Receiver<Packet>,
        cancel: CancellationToken,
        log_type: LogType,
        label: String,
    ) -> Self {
        let guard = cancel.clone().drop_guard();
        Self { packets, log_type, label, cancel, _guard: guard }
    }

    /// Next replayed packet, or `None` once the replay has ended.
    pub async fn next_packet(&mut self) -> Option<Packet> {
        self.packets.recv().await
    }

    /// Convert into a stream of packets.
    pub fn into_stream(self) -> ReplayStream {
        debug!("Replay connection converted into a stream");
        ReplayStream { inner: ReceiverStream::new(self.packets), _guard: self._guard }
    }

    /// Stop the replay. Packets already buffered can still be received.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn log_type(&self) -> LogType {
        self.log_type
    }

    /// Log name stored in the replayed file.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Stream of replayed packets. Dropping it stops the replay task.
pub struct ReplayStream {
    inner: ReceiverStream<Packet>,
    _guard: DropGuard,
}

impl Stream for ReplayStream {
    type Item = Packet;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PacketLogWriterConfig;
    use crate::log::PacketLogWriter;
    use crate::test_utils::{sample_registry, telemetry_packet};
    use futures::StreamExt;
    use std::time::{Duration, SystemTime};

    struct Endless {
        packet: Packet,
    }

    #[async_trait::async_trait]
    impl Provider for Endless {
        async fn next_packet(&mut self) -> Result<Option<Packet>> {
            tokio::time::sleep(Duration::from_millis(1)).await;
            Ok(Some(self.packet.clone()))
        }

        fn log_type(&self) -> LogType {
            LogType::Tlm
        }
    }

    #[tokio::test]
    async fn replays_log_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let registry = Arc::new(sample_registry());
        let mut writer = PacketLogWriter::new(
            LogType::Tlm,
            PacketLogWriterConfig::new(dir.path()).with_log_name("replay"),
            Arc::clone(&registry),
        )
        .unwrap();

        let start = SystemTime::now();
        for (i, name) in ["ADCS", "HEALTH_STATUS", "ADCS"].iter().enumerate() {
            let mut packet = telemetry_packet(&registry, "INST", name);
            packet.set_received_time(Some(start + Duration::from_millis(i as u64)));
            writer.write(&packet).unwrap();
        }
        writer.stop().unwrap();

        let connection =
            ReplayConnection::open(writer.filename().unwrap(), registry, ReplayOptions::unpaced())
                .await
                .unwrap();
        assert_eq!(connection.log_type(), LogType::Tlm);
        assert_eq!(connection.label(), "replay");

        let names: Vec<String> = connection
            .into_stream()
            .map(|packet| packet.packet_name().to_string())
            .collect()
            .await;
        assert_eq!(names, vec!["ADCS", "HEALTH_STATUS", "ADCS"]);
    }

    #[tokio::test]
    async fn cancel_ends_endless_replay() {
        let registry = sample_registry();
        let mut connection = ReplayConnection::from_provider(
            Endless { packet: telemetry_packet(&registry, "INST", "ADCS") },
            1,
        );
        assert!(connection.next_packet().await.is_some());

        connection.cancel();
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while connection.next_packet().await.is_some() {}
        })
        .await;
        assert!(drained.is_ok(), "replay task did not stop after cancel");
    }

    #[test]
    fn options_fill_defaults() {
        let options: ReplayOptions = serde_yaml_ng::from_str("speed: 2.5\n").unwrap();
        assert_eq!(options.speed, 2.5);
        assert_eq!(options.channel_capacity, 64);
    }
}
