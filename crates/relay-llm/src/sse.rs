//! SSE frame encoding
//!
//! Every client event becomes exactly one `data: <JSON>\n\n` frame.
//! Frames are assembled by hand rather than through a framework layer
//! so the bytes on the wire are fully under this module's control.

use bytes::Bytes;

use crate::types::ChatEvent;

/// Encode one client event as an SSE frame
pub fn encode_frame(event: &ChatEvent) -> Bytes {
    let json = event.to_wire_json();
    Bytes::from(format!("data: {json}\n\n"))
}

/// An empty keep-alive frame for idle side channels
///
/// Never sent on the main generation stream; a chat response consists
/// solely of event frames.
pub fn heartbeat() -> Bytes {
    Bytes::from_static(b"data: {}\n\n")
}
