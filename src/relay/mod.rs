//! Relay module - map snapshot description relay
//! 中继模块 - 地图快照描述中继
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐    ┌─────────────────┐
//! │   HTTP Gateway  │───▶│  Orchestrator   │───▶│    Transport    │───▶ Ollama
//! │   HTTP网关      │    │   编排器        │    │    传输         │
//! └─────────────────┘    └─────────────────┘    └─────────────────┘
//! ```
//!
//! The gateway validates the request and picks a prompt, the orchestrator
//! walks the generate → chat → discover → retry chain, and the response is
//! always the fixed `text_data`/`audio_data` envelope.

pub mod config;
pub mod error;
pub mod http_gateway;
pub mod ollama;
pub mod orchestrator;
pub mod prompt;
pub mod request;
pub mod response;
pub mod transport;

#[cfg(test)]
pub mod stub;

#[cfg(test)]
mod config_test;
