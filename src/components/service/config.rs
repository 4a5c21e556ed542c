use std::path::PathBuf;

fn default_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("geoio/{}", env!("CARGO_PKG_VERSION"))
}

/// Settings for [super::WebServiceClient], deserializable with defaults for
/// every missing field.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ServiceConfig {
    /// Whole-request timeout, body included.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// Parent of the per-request download directories, the system temporary
    /// directory when unset.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            scratch_dir: None,
        }
    }
}

impl ServiceConfig {
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_scratch_dir(mut self, scratch_dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(scratch_dir.into());
        self
    }
}
