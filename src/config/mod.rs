// src/config/mod.rs
// Configuration: file defaults, environment overrides

pub mod env;
pub mod file;

pub use file::BridgeConfig;

/// Default launch service deployment
pub const DEFAULT_BINDER_HOST: &str = "https://mybinder.org";

/// Environs listed in the manifest when no extras are requested
pub const DEFAULT_ENVIRONS: [&str; 4] = [
    "gh/nokome/stencila-binder",
    "gh/nuest/stencila-multi",
    "gh/nuest/stencila-py",
    "gh/nuest/stencila-r",
];
