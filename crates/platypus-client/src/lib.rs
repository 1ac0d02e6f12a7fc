//! Platypus Client - handles and command fan-out for a Platypus registry
//!
//! The [`Platypus`] controller is the root handle. It creates and lists
//! [`Server`] handles, each of which lists its [`Client`] handles. A command
//! sent with `system` travels Platypus → servers → clients and stops at the
//! first client that fails.

pub mod client;
pub mod controller;
pub mod fanout;
mod registry;
pub mod server;

#[cfg(test)]
mod testing;

pub use client::Client;
pub use controller::Platypus;
pub use fanout::FanOut;
pub use platypus_core::{Digest, PlatypusError, Result};
pub use server::Server;
