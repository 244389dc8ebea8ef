// src/manifest.rs
// Host manifest listing the environs this bridge can launch

use crate::environ::{self, EnvironSpec};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const PACKAGE: &str = "bindilla";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostInfo {
    pub package: String,
}

/// Manifest as expected by Stencila clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub stencila: HostInfo,
    pub environs: Vec<EnvironSpec>,
    /// Always empty; kept for v0 clients
    pub types: Vec<Value>,
    /// Always empty; kept for v1 clients
    pub services: Vec<Value>,
}

impl Manifest {
    /// Extra identifiers come first, followed by the defaults.
    /// Any unparsable extra fails the whole manifest.
    pub fn build<S: AsRef<str>>(defaults: &[EnvironSpec], extra: &[S]) -> Result<Self> {
        let mut environs = extra
            .iter()
            .map(|id| environ::parse(id.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        environs.extend_from_slice(defaults);

        Ok(Self {
            stencila: HostInfo {
                package: PACKAGE.to_string(),
            },
            environs,
            types: Vec::new(),
            services: Vec::new(),
        })
    }
}
