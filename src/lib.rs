//! toolbridge - a chat model bridged to stdio tool servers
//!
//! This library provides the multi-hop tool-calling loop between a chat
//! endpoint and a tool-serving process, plus both ends of the tool protocol.

pub mod agent;
pub mod config;
pub mod error;
pub mod mcp;
pub mod session;
pub mod tools;
pub mod ui;

pub use error::{Error, Result};
