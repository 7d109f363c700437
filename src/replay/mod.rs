//! Packet log replay
//!
//! Replays a recorded packet log as an async stream, paced by the recorded receive times.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use futures::StreamExt;
//! use pktlog::definition::DefinitionRegistry;
//! use pktlog::replay::{ReplayConnection, ReplayOptions};
//!
//! async fn replay(registry: Arc<DefinitionRegistry>) -> pktlog::Result<()> {
//!     let options = ReplayOptions { speed: 2.0, ..ReplayOptions::default() };
//!     let connection = ReplayConnection::open("session_tlm.bin", registry, options).await?;
//!     let mut packets = connection.into_stream();
//!     while let Some(packet) = packets.next().await {
//!         println!("{} {}", packet.target_name(), packet.packet_name());
//!     }
//!     Ok(())
//! }
//! ```

mod connection;
pub mod driver;
mod provider;

pub use connection::{ReplayConnection, ReplayOptions, ReplayStream};
pub use driver::{Driver, DriverChannels};
pub use provider::{LogReplayProvider, Provider};
