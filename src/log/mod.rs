//! Binary packet logs
//!
//! This module writes packets to timestamped binary log files, optionally interleaving a
//! metadata packet, and reads them back as decoded packets.

pub mod format;
mod meta_writer;
pub mod reader;
pub mod seed;
mod writer;

pub use meta_writer::MetaPacketLogWriter;
pub use reader::{DecodePolicy, PacketIter, PacketLogReader};
pub use writer::PacketLogWriter;
