//! Mock gateway support for testing.
//!
//! This module provides an in-memory [`Gateway`](crate::gateway::Gateway) for testing
//! interactions without a chat platform. It includes:
//!
//! - [`MockGateway`]: records every outgoing call, keeps message and reaction state, and
//!   routes injected events through an [`EventHub`](crate::gateway::EventHub)
//! - [`GatewayCall`]: the recorded calls
//! - failure switches for sends, individual reactions and the whole connection
//!
//! # Example
//!
//! ```rust
//! use chat_interact::mock::MockGateway;
//! use chat_interact::types::{ChannelId, UserId};
//!
//! # async fn demo() {
//! let gateway = MockGateway::new();
//! // ... start a session with `&gateway` on one branch of `tokio::join!`, and on the other:
//! let message = gateway.wait_for_message(0).await;
//! gateway.react(&message, UserId(7), "\u{25B6}");
//! gateway.say(ChannelId(1), UserId(7), "stop");
//! # }
//! ```

pub mod gateway;

pub use gateway::{GatewayCall, MockGateway};
