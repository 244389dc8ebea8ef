// src/lib.rs
// Bindilla - launch environments on Binder and proxy requests into them

pub mod bridge;
pub mod config;
pub mod environ;
pub mod error;
pub mod launch;
pub mod manifest;
pub mod proxy;
pub mod server;
pub mod sse;

pub use bridge::Bridge;
pub use config::BridgeConfig;
pub use environ::{EnvironSpec, Provider};
pub use error::{BridgeError, Result};
pub use launch::{LaunchRecord, LaunchRegistry, Launcher, Phase};
pub use manifest::Manifest;
pub use proxy::{Forwarder, ProxyOutcome};
