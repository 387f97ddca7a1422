//! Line framing for packets on the wire
//!
//! Each packet travels as one JSON object terminated by `\n`. The payload
//! is an opaque string, so a frame never contains a raw newline.

use crate::network::error::CommunicatorResult;
use crate::queue::api::Packet;

/// Serialize a packet into one newline-terminated frame
pub fn encode_frame(packet: &Packet) -> CommunicatorResult<String> {
    let mut line = serde_json::to_string(packet)?;
    line.push('\n');
    Ok(line)
}

/// Parse one frame; surrounding whitespace is ignored
pub fn decode_frame(line: &str) -> CommunicatorResult<Packet> {
    Ok(serde_json::from_str(line.trim())?)
}
