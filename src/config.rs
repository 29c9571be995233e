use crate::error::{BatchflowError, Result};

/// Runtime configuration for the orchestration core.
#[derive(Debug, Clone)]
pub struct BatchflowConfig {
    /// Tag prepended to every batch description, e.g. `[Batchflow] OrderSync. Params: [..]`.
    pub description_tag: String,
    /// Channel capacity for the orchestration event publisher.
    pub event_buffer_size: usize,
}

impl Default for BatchflowConfig {
    fn default() -> Self {
        Self {
            description_tag: "[Batchflow]".to_string(),
            event_buffer_size: 1000,
        }
    }
}

impl BatchflowConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(tag) = std::env::var("BATCHFLOW_DESCRIPTION_TAG") {
            config.description_tag = tag;
        }

        if let Ok(buffer_size) = std::env::var("BATCHFLOW_EVENT_BUFFER_SIZE") {
            config.event_buffer_size = buffer_size.parse().map_err(|e| {
                BatchflowError::ConfigurationError(format!("Invalid event_buffer_size: {e}"))
            })?;
        }

        Ok(config)
    }
}
