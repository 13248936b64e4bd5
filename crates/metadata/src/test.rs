use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Test {
    /// Number of testbenches run at once, 0 means host parallelism
    #[serde(default)]
    pub jobs: usize,
    #[serde(default = "default_compile_timeout")]
    pub compile_timeout: Option<u64>,
    #[serde(default = "default_simulate_timeout")]
    pub simulate_timeout: Option<u64>,
    #[serde(default = "default_query_timeout")]
    pub query_timeout: Option<u64>,
    #[serde(default)]
    pub view_timeout: Option<u64>,
    /// Re-run a failed batch simulation once with waveform capture
    #[serde(default = "default_recovery")]
    pub recovery: bool,
    /// Skip the recovery re-run when the compiled sources are larger than this
    #[serde(default)]
    pub recovery_max_source_bytes: Option<u64>,
}

const DEFAULT_COMPILE_TIMEOUT: u64 = 300;
const DEFAULT_SIMULATE_TIMEOUT: u64 = 1800;
const DEFAULT_QUERY_TIMEOUT: u64 = 120;

impl Default for Test {
    fn default() -> Self {
        Self {
            jobs: 0,
            compile_timeout: default_compile_timeout(),
            simulate_timeout: default_simulate_timeout(),
            query_timeout: default_query_timeout(),
            view_timeout: None,
            recovery: default_recovery(),
            recovery_max_source_bytes: None,
        }
    }
}

fn default_compile_timeout() -> Option<u64> {
    Some(DEFAULT_COMPILE_TIMEOUT)
}

fn default_simulate_timeout() -> Option<u64> {
    Some(DEFAULT_SIMULATE_TIMEOUT)
}

fn default_query_timeout() -> Option<u64> {
    Some(DEFAULT_QUERY_TIMEOUT)
}

fn default_recovery() -> bool {
    true
}

impl Test {
    pub fn compile_timeout(&self) -> Option<Duration> {
        self.compile_timeout.map(Duration::from_secs)
    }

    pub fn simulate_timeout(&self) -> Option<Duration> {
        self.simulate_timeout.map(Duration::from_secs)
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout.map(Duration::from_secs)
    }

    pub fn view_timeout(&self) -> Option<Duration> {
        self.view_timeout.map(Duration::from_secs)
    }

    pub fn timeouts(&self) -> [(&'static str, Option<u64>); 4] {
        [
            ("compile_timeout", self.compile_timeout),
            ("simulate_timeout", self.simulate_timeout),
            ("query_timeout", self.query_timeout),
            ("view_timeout", self.view_timeout),
        ]
    }
}
