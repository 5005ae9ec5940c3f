//! Agent configuration read from the process environment.

use crate::error::{AgentError, Result};
use std::time::Duration;

/// Default Azure OpenAI REST API version.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-08-01-preview";

/// Default base URL of the OpenAI-compatible API.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default validation budget of the loop.
pub const DEFAULT_MAX_ITERATIONS: usize = 3;

/// Default per-call time budget, in seconds.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;

/// Which chat completion endpoint to talk to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provider {
    /// An Azure OpenAI deployment.
    Azure {
        endpoint: String,
        api_key: String,
        deployment: String,
        api_version: String,
    },
    /// The OpenAI API or any server speaking the same protocol.
    OpenAi {
        api_key: String,
        base_url: String,
        model: String,
    },
}

impl Provider {
    /// Full chat completions URL for this provider.
    pub fn completions_url(&self) -> String {
        match self {
            Provider::Azure {
                endpoint,
                deployment,
                api_version,
                ..
            } => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint.trim_end_matches('/'),
                deployment,
                api_version
            ),
            Provider::OpenAi { base_url, .. } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
        }
    }

    /// Model name sent in the request body. Azure routes by deployment, so the
    /// deployment name doubles as the model.
    pub fn model(&self) -> &str {
        match self {
            Provider::Azure { deployment, .. } => deployment,
            Provider::OpenAi { model, .. } => model,
        }
    }
}

/// Settings for the chat model and the generation-validation loop.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub provider: Provider,
    pub max_iterations: usize,
    pub call_timeout: Duration,
}

impl AgentConfig {
    /// Create a configuration with the default loop settings.
    pub fn new(provider: Provider) -> Self {
        Self {
            provider,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            call_timeout: Duration::from_secs(DEFAULT_CALL_TIMEOUT_SECS),
        }
    }

    /// Override the validation budget. Values below 1 are raised to 1.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    /// Override the per-call time budget.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    ///
    /// Azure is selected when `AZURE_OPENAI_ENDPOINT` is set; otherwise the
    /// OpenAI-compatible variables are used. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let require = |key: &str| {
            get(key).ok_or_else(|| AgentError::Config(format!("{} is not set", key)))
        };

        let provider = if let Some(endpoint) = get("AZURE_OPENAI_ENDPOINT") {
            Provider::Azure {
                endpoint,
                api_key: require("AZURE_OPENAI_KEY")?,
                deployment: require("AZURE_OPENAI_DEPLOYMENT")?,
                api_version: get("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_AZURE_API_VERSION.to_string()),
            }
        } else {
            Provider::OpenAi {
                api_key: require("OPENAI_API_KEY")?,
                base_url: get("OPENAI_BASE_URL")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                model: get("OPENAI_MODEL")
                    .or_else(|| get("AZURE_OPENAI_DEPLOYMENT"))
                    .ok_or_else(|| AgentError::Config("OPENAI_MODEL is not set".to_string()))?,
            }
        };

        let max_iterations = match get("DECK_MAX_ITERATIONS") {
            Some(raw) => raw.parse::<usize>().map_err(|_| {
                AgentError::Config(format!("DECK_MAX_ITERATIONS is not a number: {}", raw))
            })?,
            None => DEFAULT_MAX_ITERATIONS,
        };

        let timeout_secs = match get("DECK_CALL_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().map_err(|_| {
                AgentError::Config(format!("DECK_CALL_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            None => DEFAULT_CALL_TIMEOUT_SECS,
        };

        Ok(Self::new(provider)
            .with_max_iterations(max_iterations)
            .with_call_timeout(Duration::from_secs(timeout_secs)))
    }
}
