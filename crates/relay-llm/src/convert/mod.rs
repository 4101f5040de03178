//! Conversion between internal types and provider wire formats
//!
//! Each family's quirks are confined here: outbound history rendering
//! and the one-time tagged decode of raw chunks into `ProviderEvent`.

pub mod google;
pub mod openai;
