//! Async transport for the MikroTik RouterOS command API.
//!
//! Exposes the [`RouterRpc`] capability — path-addressed `list` / `get`
//! / `add` / `remove` verbs returning row-like key/value records — plus
//! the production [`RestClient`] implementation and typed row models
//! for the resources the dashboard touches.

pub mod client;
pub mod error;
pub mod models;
pub mod rpc;

pub use client::{
    ConnectParams, RestClient, RestConnector, DEFAULT_API_PORT, DEFAULT_CONNECT_TIMEOUT,
};
pub use error::Error;
pub use rpc::{Connector, ResourcePath, RouterRpc, Row};
