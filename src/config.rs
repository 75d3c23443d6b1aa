//! Configuration management for Tool Agent.
//!
//! Configuration can be set via environment variables:
//! - `GOOGLE_API_KEY` - Optional. API key for the Gemini model. If missing, the
//!   health endpoint reports it and model calls degrade to empty responses.
//! - `DEFAULT_MODEL` - Optional. Model identifier. Defaults to `gemini-2.0-flash`.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `MAX_ITERATIONS` - Optional. Maximum model consultations per turn. Defaults to `8`.
//! - `CHECKPOINT_DIR` - Optional. Directory for conversation checkpoints. Disabled if unset.
//! - `OPENWEATHERMAP_API_KEY` - Optional. Real weather data; simulated otherwise.
//! - `WORDNIK_API_KEY` - Optional. Wordnik definitions; free dictionary otherwise.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Agent configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key. Absent means model calls fail and the loop degrades.
    pub api_key: Option<String>,

    /// Model identifier
    pub default_model: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Maximum model consultations per turn (the iteration ceiling)
    pub max_iterations: u32,

    /// Directory for write-through conversation checkpoints
    pub checkpoint_dir: Option<PathBuf>,

    /// OpenWeatherMap API key for the weather tool
    pub weather_api_key: Option<String>,

    /// Wordnik API key for the dictionary tool
    pub dictionary_api_key: Option<String>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `PORT` or `MAX_ITERATIONS` fail to parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GOOGLE_API_KEY").ok().filter(|k| !k.is_empty());

        let default_model =
            std::env::var("DEFAULT_MODEL").unwrap_or_else(|_| "gemini-2.0-flash".to_string());

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let max_iterations = std::env::var("MAX_ITERATIONS")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("MAX_ITERATIONS".to_string(), format!("{}", e))
            })?;

        let checkpoint_dir = std::env::var("CHECKPOINT_DIR").ok().map(PathBuf::from);

        let weather_api_key = std::env::var("OPENWEATHERMAP_API_KEY")
            .ok()
            .filter(|k| !k.is_empty() && k != "your_openweathermap_api_key");

        let dictionary_api_key = std::env::var("WORDNIK_API_KEY")
            .ok()
            .filter(|k| !k.is_empty() && k != "your_wordnik_api_key");

        Ok(Self {
            api_key,
            default_model,
            host,
            port,
            max_iterations,
            checkpoint_dir,
            weather_api_key,
            dictionary_api_key,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            default_model: "gemini-2.0-flash".to_string(),
            host: "127.0.0.1".to_string(),
            port: 8000,
            max_iterations: 8,
            checkpoint_dir: None,
            weather_api_key: None,
            dictionary_api_key: None,
        }
    }
}
