use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

const DEFAULT_PROJECT: &str = "peregrine-465516";
const DEFAULT_LOCATION: &str = "us-central1";
const DEFAULT_MODEL: &str = "gemini-1.5-pro";

#[derive(Debug, Clone, Deserialize)]
pub struct WorkoutConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub vertex: VertexConfig,
}

/// Where and how the generative model is reached. Fixed for the process lifetime.
#[derive(Debug, Clone, Deserialize)]
pub struct VertexConfig {
    /// Google Cloud project hosting the model deployment.
    pub project: String,
    /// Region of the Vertex AI endpoint (e.g., us-central1).
    pub location: String,
    /// Publisher model id (e.g., gemini-1.5-pro).
    pub model: String,
    /// Endpoint root, without the `/v1` suffix.
    pub api_base: String,
    /// Static OAuth bearer token; takes precedence over every other credential.
    pub access_token: Option<String>,
    /// Service account or authorized user JSON key file.
    pub credentials_file: Option<String>,
}

impl WorkoutConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let vertex = VertexConfig::from_lookup(|key| env::var(key).ok())?;

        Ok(WorkoutConfig {
            common: common_config,
            vertex,
        })
    }
}

impl VertexConfig {
    /// Build from any key/value source; `load` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let is_prod = lookup("ENVIRONMENT").unwrap_or_else(|| "dev".to_string()) == "prod";

        let project = get_env(&lookup, "VERTEX_PROJECT", Some(DEFAULT_PROJECT), is_prod)?;
        let location = get_env(&lookup, "VERTEX_LOCATION", Some(DEFAULT_LOCATION), is_prod)?;
        let model = get_env(&lookup, "VERTEX_MODEL", Some(DEFAULT_MODEL), is_prod)?;
        let default_base = format!("https://{}-aiplatform.googleapis.com", location);
        let api_base = get_env(&lookup, "VERTEX_API_BASE", Some(&default_base), is_prod)?;

        Ok(VertexConfig {
            project,
            location,
            model,
            api_base: api_base.trim_end_matches('/').to_string(),
            access_token: lookup("GOOGLE_ACCESS_TOKEN").filter(|t| !t.trim().is_empty()),
            credentials_file: lookup("GOOGLE_APPLICATION_CREDENTIALS")
                .filter(|p| !p.trim().is_empty()),
        })
    }

    /// Full `generateContent` URL for the configured model.
    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.api_base, self.project, self.location, self.model
        )
    }
}

fn get_env<F>(lookup: &F, key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match (lookup(key), default) {
        (Some(val), _) => Ok(val),
        (None, Some(def)) => Ok(def.to_string()),
        (None, None) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}
