use thiserror::Error;

/// Failures of the advisory pipeline. Every variant ends the current run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisorError {
    #[error("invalid profile URL: {0}")]
    InvalidProfileUrl(String),

    #[error("identity lookup failed: {0}")]
    IdentityLookupFailed(String),

    #[error("stats lookup failed: {0}")]
    StatsLookupFailed(String),

    #[error("malformed stats payload: {0}")]
    MalformedStatsPayload(String),
}

impl AdvisorError {
    /// Pipeline stage the failure came from.
    pub fn stage(&self) -> &'static str {
        match self {
            AdvisorError::InvalidProfileUrl(_) => "resolve",
            AdvisorError::IdentityLookupFailed(_) => "display-name",
            AdvisorError::StatsLookupFailed(_) | AdvisorError::MalformedStatsPayload(_) => "stats",
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BUNGIE_API_KEY is not set (add it to the environment or a .env file)")]
    MissingApiKey,

    #[error("invalid value for `{key}`: {message}")]
    Invalid { key: &'static str, message: String },
}
