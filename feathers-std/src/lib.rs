//! # feathers-std
//!
//! Standard implementations for the Feathers client.
//!
//! This crate provides:
//! - **REST transport**: [`RestProvider`] over `reqwest` (feature `rest`)
//! - **Duplex transport**: [`SocketProvider`] over any [`SocketClient`], with
//!   [`WsSocketClient`] speaking Socket.IO over a websocket (feature `ws`)
//! - **Tower transport**: [`TowerProvider`] (feature `tower`)
//! - **Storage**: [`MemoryStorage`]
//! - **Testing**: [`testing::StubProvider`], [`testing::MockSocketClient`]
//!
//! [`RestProvider`]: providers::rest::RestProvider
//! [`SocketProvider`]: providers::socket::SocketProvider
//! [`SocketClient`]: providers::socket::SocketClient
//! [`WsSocketClient`]: providers::socket::ws::WsSocketClient
//! [`TowerProvider`]: providers::tower::TowerProvider
//! [`MemoryStorage`]: storage::MemoryStorage

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core contracts
pub use feathers_core;

// Modules
pub mod providers;
pub mod storage;
pub mod testing;
