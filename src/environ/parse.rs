// src/environ/parse.rs
// Parsing of environ identifiers (short paths and repository URLs)

use super::{DEFAULT_REF, EnvironSpec, Provider};
use crate::error::{BridgeError, Result};
use url::Url;

/// The grammar an identifier is written in, decided by its literal prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syntax {
    /// `provider/org/repo[/ref]`
    ShortPath,
    /// `https://host/org/repo[/ref]`
    Url,
}

impl Syntax {
    pub fn detect(identifier: &str) -> Self {
        let lower = identifier.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Syntax::Url
        } else {
            Syntax::ShortPath
        }
    }
}

/// Parse an environ identifier into a spec.
///
/// Both grammars reduce to a provider plus a list of path segments
/// (`org`, `repo`, then an optional ref) and share the rest of the rules.
pub fn parse(identifier: &str) -> Result<EnvironSpec> {
    let id = identifier.trim();
    let (provider, segments) = match Syntax::detect(id) {
        Syntax::ShortPath => split_short_path(id)?,
        Syntax::Url => split_url(id)?,
    };
    build_spec(id, provider, &segments)
}

fn split_short_path(id: &str) -> Result<(Provider, Vec<String>)> {
    let mut parts = id.split('/');
    let code = parts.next().unwrap_or_default();
    let segments: Vec<String> = parts.map(str::to_string).collect();
    if code.is_empty() || segments.len() < 2 {
        return Err(not_enough_parts(id));
    }
    let provider = Provider::from_code(code).ok_or_else(|| {
        BridgeError::InvalidEnviron(format!(
            "unknown provider '{}' in '{}', expected one of: {}",
            code,
            id,
            known(Provider::code)
        ))
    })?;
    Ok((provider, segments))
}

fn split_url(id: &str) -> Result<(Provider, Vec<String>)> {
    let url = Url::parse(id)
        .map_err(|e| BridgeError::InvalidEnviron(format!("'{}' is not a valid URL: {}", id, e)))?;
    let host = url.host_str().unwrap_or_default();
    let provider = Provider::from_host(host).ok_or_else(|| {
        BridgeError::InvalidEnviron(format!(
            "unknown host '{}' in '{}', expected one of: {}",
            host,
            id,
            known(Provider::host)
        ))
    })?;
    let segments: Vec<String> = url
        .path_segments()
        .map(|s| s.map(str::to_string).collect())
        .unwrap_or_default();
    Ok((provider, segments))
}

fn build_spec(id: &str, provider: Provider, segments: &[String]) -> Result<EnvironSpec> {
    let (org, repo) = match segments {
        [org, repo, ..] if !org.is_empty() && !repo.is_empty() => (org.clone(), repo.clone()),
        _ => return Err(not_enough_parts(id)),
    };

    // Anything after the repo is the ref; refs may themselves contain slashes
    let rest = segments[2..].join("/");
    let rest = rest.trim_matches('/');
    let version = if rest.is_empty() {
        DEFAULT_REF.to_string()
    } else {
        rest.to_string()
    };

    Ok(EnvironSpec {
        id: id.to_string(),
        name: format!("{}/{}/{}", provider.code(), org, repo),
        version,
        provider,
        org,
        repo,
    })
}

fn not_enough_parts(id: &str) -> BridgeError {
    BridgeError::InvalidEnviron(format!(
        "'{}' does not have enough parts, expected provider/org/repo[/ref]",
        id
    ))
}

fn known(f: fn(&Provider) -> &'static str) -> String {
    Provider::ALL.iter().map(f).collect::<Vec<_>>().join(", ")
}
