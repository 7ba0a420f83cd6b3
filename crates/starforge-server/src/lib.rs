//! Starforge game server.
//!
//! Runs the galaxy simulation as a native process: a periodic tick over
//! every owned planet, a credit ledger over bank buildings, and a broadcast
//! hub that pushes results to connected clients over WebSocket.

pub mod api;
pub mod auth;
pub mod config;
pub mod connection;
pub mod error;
pub mod generation;
pub mod hub;
pub mod ledger;
pub mod protocol;
pub mod simulation;
pub mod store;
pub mod tables;
