//! # Vibe Node
//!
//! HTTP backend for Vibe chat: users, chats, text and media messages, and
//! live notifications over a push stream and WebSockets.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                      Vibe Node                        │
//! ├──────────────────────────────────────────────────────┤
//! │  HTTP API Layer                                       │
//! │  • Users, Chats, Messages, Media                      │
//! │  • Push stream (/api/stream) and WebSocket (/ws)      │
//! │                         │                             │
//! │          write commits, then notify                   │
//! │                         ▼                             │
//! │  Realtime Dispatcher (vibe-realtime)                  │
//! │                         │                             │
//! │  Storage Layer (vibe-store)                           │
//! │  • Document store (users, chats, messages)            │
//! │  • Blob store (media)                                 │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cargo run --bin vibe-node -- --api-addr 127.0.0.1:8000
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Application state, router, users, chats and messages
//! - [`media_api`] - Media upload and download
//! - [`realtime_api`] - Push stream, WebSocket and realtime stats
//! - [`config`] - Layered node configuration
//! - [`observability`] - Structured logging and request IDs
//! - [`validation`] - Request body validation
//!
//! ## Example: Building the router
//!
//! ```rust,no_run
//! use vibe_node::api::{create_router, AppState};
//! use vibe_node::config::NodeConfig;
//!
//! let state = AppState::in_memory(&NodeConfig::default());
//! let app = create_router(state);
//! ```

pub mod api;
pub mod config;
pub mod media_api;
pub mod observability;
pub mod realtime_api;
pub mod validation;
