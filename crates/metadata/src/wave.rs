use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Wave {
    /// Signals captured when no wave command cache exists and nobody can be asked
    #[serde(default)]
    pub default_signals: Vec<String>,
}
