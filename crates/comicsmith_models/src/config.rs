//! Run configuration for image synthesis.
//!
//! Configuration is read once per run into an explicit [`SynthesisConfig`]
//! and handed to each component. Nothing here is global.

use comicsmith_error::ConfigError;
use comicsmith_rate_limit::{DEFAULT_MAX_CONCURRENT, SynthesisLimits};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Google Cloud project that owns the Vertex AI quota.
pub const ENV_PROJECT: &str = "GOOGLE_CLOUD_PROJECT";
/// Vertex AI region, or `global`.
pub const ENV_LOCATION: &str = "GOOGLE_CLOUD_LOCATION";
/// Image model identifier.
pub const ENV_MODEL: &str = "IMAGEN_MODEL";
/// OAuth bearer token used for every call.
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_CLOUD_ACCESS_TOKEN";
/// Optional aspect ratio override.
pub const ENV_ASPECT_RATIO: &str = "COMICSMITH_ASPECT_RATIO";
/// Optional safety filter override.
pub const ENV_SAFETY_FILTER: &str = "COMICSMITH_SAFETY_FILTER";
/// Optional person generation policy.
pub const ENV_PERSON_GENERATION: &str = "COMICSMITH_PERSON_GENERATION";
/// Optional per-call timeout in seconds.
pub const ENV_TIMEOUT_SECS: &str = "COMICSMITH_TIMEOUT_SECS";
/// Optional maximum number of concurrent calls.
pub const ENV_MAX_CONCURRENT: &str = "COMICSMITH_MAX_CONCURRENT";
/// Optional request quota per minute.
pub const ENV_REQUESTS_PER_MINUTE: &str = "COMICSMITH_REQUESTS_PER_MINUTE";
/// Optional retry budget for transient transport errors.
pub const ENV_MAX_RETRIES: &str = "COMICSMITH_MAX_RETRIES";

/// Default per-call timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
/// Default retry budget for transient transport errors.
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// Output aspect ratio.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum AspectRatio {
    /// 1:1
    #[strum(serialize = "1:1")]
    #[serde(rename = "1:1")]
    Square,
    /// 3:4
    #[strum(serialize = "3:4")]
    #[serde(rename = "3:4")]
    Portrait,
    /// 4:3
    #[strum(serialize = "4:3")]
    #[serde(rename = "4:3")]
    Landscape,
    /// 9:16, a phone-screen strip
    #[strum(serialize = "9:16")]
    #[serde(rename = "9:16")]
    Tall,
    /// 16:9, a widescreen panel
    #[default]
    #[strum(serialize = "16:9")]
    #[serde(rename = "16:9")]
    Wide,
}

/// How aggressively the provider filters harmful content.
///
/// Stricter levels block more prompts; blocked calls surface as `Rejected`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SafetyFilterLevel {
    /// Block content with low or higher probability of harm
    #[default]
    BlockLowAndAbove,
    /// Block content with medium or higher probability of harm
    BlockMediumAndAbove,
    /// Block only content with high probability of harm
    BlockOnlyHigh,
    /// Do not block; the provider still enforces its fixed policies
    BlockNone,
}

impl SafetyFilterLevel {
    /// Threshold value understood by the Vertex AI API.
    pub fn threshold(&self) -> &'static str {
        match self {
            SafetyFilterLevel::BlockLowAndAbove => "BLOCK_LOW_AND_ABOVE",
            SafetyFilterLevel::BlockMediumAndAbove => "BLOCK_MEDIUM_AND_ABOVE",
            SafetyFilterLevel::BlockOnlyHigh => "BLOCK_ONLY_HIGH",
            SafetyFilterLevel::BlockNone => "BLOCK_NONE",
        }
    }
}

/// Whether generated images may depict people.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PersonGeneration {
    /// No people at all
    DontAllow,
    /// Adults only
    AllowAdult,
    /// Adults and children
    AllowAll,
}

impl PersonGeneration {
    /// Value understood by the Vertex AI API.
    pub fn api_value(&self) -> &'static str {
        match self {
            PersonGeneration::DontAllow => "DONT_ALLOW",
            PersonGeneration::AllowAdult => "ALLOW_ADULT",
            PersonGeneration::AllowAll => "ALLOW_ALL",
        }
    }
}

/// Everything a synthesis run needs to know, validated up front.
///
/// # Examples
///
/// ```
/// use comicsmith_models::{AspectRatio, SynthesisConfig};
///
/// let config = SynthesisConfig::builder()
///     .project("my-project")
///     .location("us-central1")
///     .model("gemini-2.5-flash-image")
///     .access_token("token")
///     .aspect_ratio(AspectRatio::Tall)
///     .build()
///     .unwrap();
/// assert_eq!(config.aspect_ratio().to_string(), "9:16");
/// ```
#[derive(Clone, Serialize, Deserialize, derive_getters::Getters, derive_builder::Builder)]
#[builder(setter(into))]
pub struct SynthesisConfig {
    /// Google Cloud project ID
    project: String,
    /// Vertex AI location (`global` or a region such as `us-central1`)
    location: String,
    /// Model identifier
    model: String,
    /// OAuth bearer token
    #[serde(skip_serializing)]
    access_token: String,
    /// Output aspect ratio
    #[builder(default)]
    aspect_ratio: AspectRatio,
    /// Safety filter strictness
    #[builder(default)]
    safety_filter: SafetyFilterLevel,
    /// Person generation policy (`None` = provider default)
    #[builder(default)]
    person_generation: Option<PersonGeneration>,
    /// Budget for a single synthesis call
    #[builder(default = "Duration::from_secs(DEFAULT_TIMEOUT_SECS)")]
    timeout: Duration,
    /// Concurrency and quota limits
    #[builder(default)]
    limits: SynthesisLimits,
    /// Retry budget for transient transport errors
    #[builder(default = "DEFAULT_MAX_RETRIES")]
    max_retries: usize,
    /// Base URL override, for tests and private endpoints
    #[builder(default)]
    api_base: Option<String>,
}

impl std::fmt::Debug for SynthesisConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SynthesisConfig")
            .field("project", &self.project)
            .field("location", &self.location)
            .field("model", &self.model)
            .field("access_token", &"<redacted>")
            .field("aspect_ratio", &self.aspect_ratio)
            .field("safety_filter", &self.safety_filter)
            .field("person_generation", &self.person_generation)
            .field("timeout", &self.timeout)
            .field("limits", &self.limits)
            .field("max_retries", &self.max_retries)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl SynthesisConfig {
    /// Returns a builder for constructing a SynthesisConfig.
    pub fn builder() -> SynthesisConfigBuilder {
        SynthesisConfigBuilder::default()
    }

    /// Load configuration from `.env` (if present) and the process environment.
    ///
    /// # Errors
    ///
    /// Returns a single `ConfigError` naming every missing required variable,
    /// or the first option that fails to parse.
    #[tracing::instrument]
    pub fn from_env() -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::debug!(path = %path.display(), "Loaded .env file"),
            Err(e) if e.not_found() => tracing::debug!("No .env file found"),
            Err(e) => return Err(ConfigError::new(format!("Failed to read .env file: {}", e))),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Blank values count as missing.
    ///
    /// # Errors
    ///
    /// Same as [`SynthesisConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let required = [ENV_PROJECT, ENV_LOCATION, ENV_MODEL, ENV_ACCESS_TOKEN];
        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(ConfigError::new(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        let aspect_ratio = parse_option(get(ENV_ASPECT_RATIO), ENV_ASPECT_RATIO)?.unwrap_or_default();
        let safety_filter =
            parse_option(get(ENV_SAFETY_FILTER), ENV_SAFETY_FILTER)?.unwrap_or_default();
        let person_generation = parse_option(get(ENV_PERSON_GENERATION), ENV_PERSON_GENERATION)?;
        let timeout_secs: u64 =
            parse_option(get(ENV_TIMEOUT_SECS), ENV_TIMEOUT_SECS)?.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::new(format!("{} must be positive", ENV_TIMEOUT_SECS)));
        }
        let max_concurrent: u32 = parse_option(get(ENV_MAX_CONCURRENT), ENV_MAX_CONCURRENT)?
            .unwrap_or(DEFAULT_MAX_CONCURRENT);
        if max_concurrent == 0 {
            return Err(ConfigError::new(format!(
                "{} must be at least 1",
                ENV_MAX_CONCURRENT
            )));
        }
        let requests_per_minute: Option<u32> =
            parse_option(get(ENV_REQUESTS_PER_MINUTE), ENV_REQUESTS_PER_MINUTE)?;
        let max_retries: usize =
            parse_option(get(ENV_MAX_RETRIES), ENV_MAX_RETRIES)?.unwrap_or(DEFAULT_MAX_RETRIES);

        let limits = SynthesisLimits::builder()
            .max_concurrent(max_concurrent)
            .requests_per_minute(requests_per_minute)
            .build()
            .map_err(|e| ConfigError::new(format!("Invalid limits: {}", e)))?;

        let config = Self {
            project: get(ENV_PROJECT).unwrap_or_default(),
            location: get(ENV_LOCATION).unwrap_or_default(),
            model: get(ENV_MODEL).unwrap_or_default(),
            access_token: get(ENV_ACCESS_TOKEN).unwrap_or_default(),
            aspect_ratio,
            safety_filter,
            person_generation,
            timeout: Duration::from_secs(timeout_secs),
            limits,
            max_retries,
            api_base: None,
        };

        tracing::info!(
            project = %config.project,
            location = %config.location,
            model = %config.model,
            aspect_ratio = %config.aspect_ratio,
            safety_filter = %config.safety_filter,
            "Loaded synthesis configuration"
        );
        Ok(config)
    }

    /// Base URL of the Vertex AI endpoint for this location.
    pub fn endpoint_base(&self) -> String {
        match &self.api_base {
            Some(base) => base.trim_end_matches('/').to_string(),
            None if self.location == "global" => "https://aiplatform.googleapis.com".to_string(),
            None => format!("https://{}-aiplatform.googleapis.com", self.location),
        }
    }

    /// Full `generateContent` URL for the configured model.
    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            self.endpoint_base(),
            self.project,
            self.location,
            self.model
        )
    }
}

fn parse_option<T>(raw: Option<String>, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::new(format!("Invalid value '{}' for {}: {}", value, key, e)))
    })
    .transpose()
}
