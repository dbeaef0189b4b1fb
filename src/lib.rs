//! Client SDK for the Meridian distributed ledger network.
//!
//! Wraps the gateway's REST endpoints and WebSocket push channel behind typed
//! domain models and two core services:
//!
//! - [`services::listener::Listener`] - a long-lived push-channel client that
//!   multiplexes many logical subscriptions over one connection, resolves
//!   aliased addresses, and transparently extends a subscription across every
//!   multisig account the watched address cosigns for
//! - [`services::aggregate::AggregateVerifier`] - decides whether a signed
//!   aggregate transaction already carries every cosignature its inner
//!   transactions require, walking arbitrarily deep multisig ownership
//!   graphs bottom-up
//!
//! Gateway lookups are consumed through the narrow async traits in
//! [`repositories`]; REST-backed implementations are provided, and tests
//! substitute their own.

pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;
