// src/environ/mod.rs
// Environ identifiers and their canonical spec

mod parse;

pub use parse::{Syntax, parse};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default ref used when an identifier does not name one
pub const DEFAULT_REF: &str = "master";

/// Repository hosting providers understood by the launch service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Provider {
    #[serde(rename = "gh")]
    GitHub,
    #[serde(rename = "gl")]
    GitLab,
    #[serde(rename = "gist")]
    Gist,
}

impl Provider {
    pub const ALL: [Provider; 3] = [Provider::GitHub, Provider::GitLab, Provider::Gist];

    /// Short code used in build paths (`gh`, `gl`, `gist`)
    pub fn code(&self) -> &'static str {
        match self {
            Provider::GitHub => "gh",
            Provider::GitLab => "gl",
            Provider::Gist => "gist",
        }
    }

    /// Canonical web host for the provider
    pub fn host(&self) -> &'static str {
        match self {
            Provider::GitHub => "github.com",
            Provider::GitLab => "gitlab.com",
            Provider::Gist => "gist.github.com",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.code() == code)
    }

    pub fn from_host(host: &str) -> Option<Self> {
        let host = host.strip_prefix("www.").unwrap_or(host);
        Self::ALL
            .into_iter()
            .find(|p| p.host().eq_ignore_ascii_case(host))
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A launchable environ: a repository at a particular ref
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironSpec {
    /// The identifier this spec was parsed from
    pub id: String,
    /// `provider/org/repo`
    pub name: String,
    /// Branch, tag or commit
    pub version: String,
    pub provider: Provider,
    pub org: String,
    pub repo: String,
}

impl EnvironSpec {
    /// Path below the launch service's `/build/` endpoint
    pub fn build_path(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.provider.code(),
            self.org,
            self.repo,
            self.version
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_codes_round_trip() {
        for provider in Provider::ALL {
            assert_eq!(Provider::from_code(provider.code()), Some(provider));
            assert_eq!(Provider::from_host(provider.host()), Some(provider));
        }
        assert_eq!(Provider::from_code("bb"), None);
    }

    #[test]
    fn test_provider_from_host_ignores_www_and_case() {
        assert_eq!(Provider::from_host("www.github.com"), Some(Provider::GitHub));
        assert_eq!(Provider::from_host("GitLab.com"), Some(Provider::GitLab));
        assert_eq!(Provider::from_host("bitbucket.org"), None);
    }

    #[test]
    fn test_provider_serializes_as_code() {
        let json = serde_json::to_string(&Provider::GitLab).unwrap();
        assert_eq!(json, "\"gl\"");
    }

    #[test]
    fn test_build_path() {
        let spec = parse("gh/acme/demo/v2").unwrap();
        assert_eq!(spec.build_path(), "gh/acme/demo/v2");
    }
}
