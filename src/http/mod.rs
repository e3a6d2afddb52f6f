//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the external API routing: the `/mcp` listener, widget files, the
//! local test harness, the chat proxy and metadata endpoints.

pub mod chat;
pub mod cors;
pub mod handlers;
pub mod harness;
