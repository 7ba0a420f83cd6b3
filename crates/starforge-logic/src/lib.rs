//! Pure simulation logic for Starforge.
//!
//! This crate contains the game rules that are independent of any database,
//! network or runtime. Functions take plain data and return results, making
//! them unit-testable and shareable between the server and native tools.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`constants`] | Building types, resource slots, economy and network tuning |
//! | [`economy`] | Per-planet production, consumption, growth and morale tick |
//! | [`ledger`] | Bank vault balance, all-or-nothing deduction plans, capped deposits |
//! | [`network`] | Two-phase hyperlane generation between star systems |
//! | [`routes`] | BFS route finding over the hyperlane network |

pub mod constants;
pub mod economy;
pub mod ledger;
pub mod network;
pub mod routes;
