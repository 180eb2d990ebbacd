//! Block disguise runtime: interaction handling, replication and the
//! persistence boundary, bundled in one owned [`DisguiseService`].

pub mod config;
pub mod controller;
pub mod replication;
pub mod service;
pub mod transport;

#[cfg(test)]
mod testutil;

pub use config::DisguiseConfig;
pub use controller::{InteractionController, Outcome, Side};
pub use service::DisguiseService;
pub use transport::Transport;
