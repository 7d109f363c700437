//! Packet sources for replay

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::time::sleep;
use tracing::{debug, info, trace};

use crate::definition::DefinitionRegistry;
use crate::log::{DecodePolicy, PacketIter, PacketLogReader};
use crate::packet::Packet;
use crate::types::LogType;
use crate::{LogError, Result};

/// Source of packets for the replay driver
///
/// Providers handle their own pacing internally.
#[async_trait::async_trait]
pub trait Provider: Send + 'static {
    /// Get the next packet
    ///
    /// Returns:
    /// - `Ok(Some(packet))` - Next packet available
    /// - `Ok(None)` - Source exhausted (normal termination)
    /// - `Err(e)` - Error occurred
    async fn next_packet(&mut self) -> Result<Option<Packet>>;

    /// Log category of the packets this provider yields
    fn log_type(&self) -> LogType;
}

/// Records decoded per blocking read.
const READ_BATCH: usize = 64;

/// Replays a packet log, spacing packets by their recorded receive times.
///
/// File reads and decoding run on the blocking thread pool, a batch of records at a time.
pub struct LogReplayProvider {
    /// Taken while a batch is being read
    packets: Option<PacketIter>,
    buffered: VecDeque<Result<Packet>>,
    exhausted: bool,
    log_type: LogType,
    label: String,

    /// Playback speed multiplier (1.0 = recorded pace, 0.0 = as fast as possible)
    speed: f64,

    /// Receive time of the previous packet
    previous: Option<SystemTime>,

    delivered: u64,
}

impl LogReplayProvider {
    pub fn new<P: AsRef<Path>>(
        path: P,
        registry: Arc<DefinitionRegistry>,
        policy: DecodePolicy,
    ) -> Result<Self> {
        let packets = PacketLogReader::new(registry).with_policy(policy).each(path.as_ref())?;
        info!("Opened {} log {} for replay", packets.log_type(), path.as_ref().display());
        Ok(Self {
            log_type: packets.log_type(),
            label: packets.label().to_string(),
            packets: Some(packets),
            buffered: VecDeque::new(),
            exhausted: false,
            speed: 1.0,
            previous: None,
            delivered: 0,
        })
    }

    /// Set playback speed. Zero replays without delays; other values are clamped to
    /// 0.1..=10.0.
    pub fn set_speed(&mut self, speed: f64) {
        self.speed = if speed == 0.0 { 0.0 } else { speed.clamp(0.1, 10.0) };
        debug!("Playback speed set to {}x", self.speed);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Log name stored in the replayed file.
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    async fn read_batch(&mut self) -> Result<()> {
        let Some(mut packets) = self.packets.take() else {
            self.exhausted = true;
            return Ok(());
        };
        let (packets, batch) = tokio::task::spawn_blocking(move || {
            let batch: VecDeque<Result<Packet>> = packets.by_ref().take(READ_BATCH).collect();
            (packets, batch)
        })
        .await
        .map_err(|e| LogError::parse("Replay read", e.to_string()))?;

        trace!("Read {} records from {}", batch.len(), packets.path().display());
        self.exhausted = batch.len() < READ_BATCH;
        self.packets = Some(packets);
        self.buffered = batch;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Provider for LogReplayProvider {
    async fn next_packet(&mut self) -> Result<Option<Packet>> {
        if self.buffered.is_empty() && !self.exhausted {
            self.read_batch().await?;
        }
        let packet = match self.buffered.pop_front() {
            Some(packet) => packet?,
            None => {
                debug!("Reached end of replay after {} packets", self.delivered);
                return Ok(None);
            }
        };

        if let (Some(previous), Some(current)) = (self.previous, packet.received_time()) {
            let gap = current.duration_since(previous).unwrap_or_default();
            if self.speed > 0.0 && !gap.is_zero() {
                sleep(gap.div_f64(self.speed)).await;
            }
        }
        self.previous = packet.received_time();
        self.delivered += 1;

        trace!("Replaying packet {}: {}", self.delivered, packet.definition().display_name());
        Ok(Some(packet))
    }

    fn log_type(&self) -> LogType {
        self.log_type
    }
}
