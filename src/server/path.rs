// src/server/path.rs
// Matching of versioned API paths.
//
// Paths may carry an arbitrary prefix before the version segment, and the
// manifest route uses that prefix as a comma-separated list of extra environs
// (e.g. `/gh/a/b,gh/c/d/v1/manifest`). Identifiers embedded in paths may
// themselves contain slashes, so these are matched by hand rather than with
// router path patterns.

use crate::error::{BridgeError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiVersion {
    V0,
    V1,
}

impl ApiVersion {
    const ALL: [ApiVersion; 2] = [ApiVersion::V0, ApiVersion::V1];

    fn segment(self) -> &'static str {
        match self {
            ApiVersion::V0 => "/v0/",
            ApiVersion::V1 => "/v1/",
        }
    }

    fn environs_word(self) -> &'static str {
        match self {
            ApiVersion::V0 => "environ/",
            ApiVersion::V1 => "environs/",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRoute {
    Manifest { extra: Vec<String> },
    /// Launch (POST) or inspect (GET); the target is an identifier or a launch id
    Environ { target: String },
    Proxy { launch_id: String, path: String },
}

impl ApiRoute {
    /// Match a request path; `None` when no API route applies.
    ///
    /// Every `/v0/` or `/v1/` in the path is tried left to right and the first
    /// one followed by a known route wins, so proxied paths may themselves
    /// contain version segments.
    pub fn parse(path: &str) -> Result<Option<Self>> {
        for (idx, version) in version_markers(path) {
            let prefix = &path[..idx];
            let rest = &path[idx + version.segment().len()..];
            if let Some(route) = Self::match_rest(version, prefix, rest)? {
                return Ok(Some(route));
            }
        }
        Ok(None)
    }

    fn match_rest(version: ApiVersion, prefix: &str, rest: &str) -> Result<Option<Self>> {
        if rest == "manifest" || rest == "manifest/" {
            return Ok(Some(ApiRoute::Manifest {
                extra: split_environs(prefix.trim_start_matches('/'))?,
            }));
        }

        if let Some(target) = rest.strip_prefix(version.environs_word()) {
            if !target.is_empty() {
                return Ok(Some(ApiRoute::Environ {
                    target: decode(target)?,
                }));
            }
        }

        if let Some(rest) = rest.strip_prefix("proxy/") {
            let (launch_id, path) = rest.split_once('/').unwrap_or((rest, ""));
            if !launch_id.is_empty() {
                return Ok(Some(ApiRoute::Proxy {
                    launch_id: decode(launch_id)?,
                    path: path.to_string(),
                }));
            }
        }

        Ok(None)
    }
}

/// Positions of version segments, including overlapping ones (`/v1/v1/`)
fn version_markers(path: &str) -> Vec<(usize, ApiVersion)> {
    (0..path.len())
        .filter(|&i| path.is_char_boundary(i))
        .flat_map(|i| {
            ApiVersion::ALL
                .into_iter()
                .filter(move |v| path[i..].starts_with(v.segment()))
                .map(move |v| (i, v))
        })
        .collect()
}

fn split_environs(prefix: &str) -> Result<Vec<String>> {
    prefix
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(decode)
        .collect()
}

fn decode(value: &str) -> Result<String> {
    urlencoding::decode(value)
        .map(|s| s.into_owned())
        .map_err(|e| BridgeError::InvalidEnviron(format!("'{}' is not valid UTF-8: {}", value, e)))
}
