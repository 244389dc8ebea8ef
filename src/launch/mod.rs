// src/launch/mod.rs
// Launch records and the phase state machine

mod orchestrator;
mod registry;

pub use orchestrator::{LaunchHandle, Launcher};
pub use registry::LaunchRegistry;

use crate::environ::EnvironSpec;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Path of the API served inside a launched container
pub const TARGET_API_PATH: &str = "stencila-host";

/// Coarse launch progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Unknown,
    Building,
    Launching,
    Ready,
    Failed,
}

impl Phase {
    /// Map a phase name reported by the launch service
    pub fn from_reported(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "waiting" | "fetching" | "building" | "built" | "pushing" => Phase::Building,
            "launching" => Phase::Launching,
            "ready" => Phase::Ready,
            "failed" => Phase::Failed,
            _ => Phase::Unknown,
        }
    }

    fn rank(self) -> u8 {
        match self {
            Phase::Unknown => 0,
            Phase::Building => 1,
            Phase::Launching => 2,
            Phase::Ready | Phase::Failed => 3,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Ready | Phase::Failed)
    }

    /// Whether moving from `current` to `self` is forward progress
    pub fn advances(self, current: Option<Phase>) -> bool {
        match current {
            None => true,
            Some(current) => self.rank() > current.rank(),
        }
    }
}

/// One decoded event from the launch stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchEvent {
    pub data: Value,
    pub received_at: DateTime<Utc>,
}

/// The build request sent to the launch service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRequest {
    pub url: String,
    pub time: DateTime<Utc>,
}

/// State of one launch, folded from its event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchRecord {
    pub id: String,
    pub environ: EnvironSpec,
    pub phase: Option<Phase>,
    pub events: Vec<LaunchEvent>,
    pub request: LaunchRequest,
    pub target_base_url: Option<String>,
    pub token: Option<String>,
    pub connect_path: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl LaunchRecord {
    pub fn new(id: String, environ: EnvironSpec, url: String, time: DateTime<Utc>) -> Self {
        Self {
            id,
            environ,
            phase: None,
            events: Vec::new(),
            request: LaunchRequest { url, time },
            target_base_url: None,
            token: None,
            connect_path: None,
            completed_at: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Some(Phase::Ready)
    }

    /// Fold one event into the record, returning the new phase if it changed.
    ///
    /// Phases never move backwards, and the target URL and token keep the
    /// first value reported.
    pub fn apply_event(&mut self, data: Value, received_at: DateTime<Utc>) -> Option<Phase> {
        let received_at = match self.events.last() {
            Some(last) if last.received_at > received_at => last.received_at,
            _ => received_at,
        };

        let mut changed = None;
        if let Some(reported) = data.get("phase").and_then(Value::as_str) {
            let phase = Phase::from_reported(reported);
            if phase.advances(self.phase) {
                self.phase = Some(phase);
                changed = Some(phase);
            }
        }
        if self.target_base_url.is_none() {
            self.target_base_url = data.get("url").and_then(Value::as_str).map(str::to_string);
        }
        if self.token.is_none() {
            self.token = data.get("token").and_then(Value::as_str).map(str::to_string);
        }

        self.events.push(LaunchEvent { data, received_at });
        changed
    }

    /// Mark the stream as ended and work out where the caller should connect
    pub fn complete(&mut self, proxy: bool, completed_at: DateTime<Utc>) {
        self.connect_path = if proxy {
            Some(format!("/v1/proxy/{}", self.id))
        } else {
            self.target_base_url
                .as_deref()
                .map(|base| format!("{}/{}", base.trim_end_matches('/'), TARGET_API_PATH))
        };
        self.completed_at = Some(completed_at);
    }

    /// Mark the launch as ended without a usable stream end
    pub fn abandon(&mut self, completed_at: DateTime<Utc>) {
        self.completed_at = Some(completed_at);
    }
}
