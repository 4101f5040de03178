//! Shared test harness
//!
//! Spins up mock upstream providers and a full gateway instance on
//! random ports, plus helpers for picking apart SSE responses.

#![allow(dead_code)]

pub mod config;
pub mod mock_google;
pub mod mock_openai;
pub mod server;

/// Parse the JSON payloads out of an SSE response body
pub fn parse_sse_data(text: &str) -> Vec<serde_json::Value> {
    text.lines()
        .filter_map(|line| line.strip_prefix("data: "))
        .filter_map(|data| serde_json::from_str(data).ok())
        .collect()
}
