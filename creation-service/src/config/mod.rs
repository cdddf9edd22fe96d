use crate::services::identity::{ClerkConfig, CLERK_API_BASE};
use crate::services::providers::clipdrop::{ClipdropConfig, CLIPDROP_API_BASE};
use crate::services::providers::cloudinary::{
    CloudinaryConfig, CLOUDINARY_API_BASE, CLOUDINARY_DELIVERY_BASE,
};
use crate::services::providers::groq::{GroqConfig, DEFAULT_MODEL, GROQ_API_BASE};
use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use service_core::retry::RetryConfig;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CreationConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub groq: GroqConfig,
    pub clipdrop: ClipdropConfig,
    pub cloudinary: CloudinaryConfig,
    pub clerk: ClerkConfig,
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone)]
pub struct LimitsConfig {
    /// Metered requests a free user may make.
    pub free_usage_limit: u32,
    /// Retries for transient text and image generation failures.
    pub provider_max_retries: u32,
    /// Largest accepted request body, uploads included.
    pub max_upload_bytes: usize,
    /// Deadline for every provider call, in-process PDF parsing included.
    pub provider_timeout: Duration,
}

impl LimitsConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig::with_max_retries(self.provider_max_retries)
    }
}

impl CreationConfig {
    pub fn load() -> Result<Self, AppError> {
        // Load common config (handles .env and APP__ prefix)
        let common = core_config::Config::load()?;

        let is_prod = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string()) == "prod";

        let timeout = Duration::from_secs(parse_env("PROVIDER_TIMEOUT_SECS", "60", is_prod)?);

        Ok(CreationConfig {
            common,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("creation_db"), is_prod)?,
            },
            groq: GroqConfig {
                api_key: Secret::new(get_env("GROQ_API_KEY", None, is_prod)?),
                model: get_env("GROQ_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                base_url: get_env("GROQ_BASE_URL", Some(GROQ_API_BASE), is_prod)?,
                timeout,
            },
            clipdrop: ClipdropConfig {
                api_key: Secret::new(get_env("CLIPDROP_API_KEY", None, is_prod)?),
                base_url: get_env("CLIPDROP_BASE_URL", Some(CLIPDROP_API_BASE), is_prod)?,
                timeout,
            },
            cloudinary: CloudinaryConfig {
                cloud_name: get_env("CLOUDINARY_CLOUD_NAME", None, is_prod)?,
                api_key: get_env("CLOUDINARY_API_KEY", None, is_prod)?,
                api_secret: Secret::new(get_env("CLOUDINARY_API_SECRET", None, is_prod)?),
                api_base_url: get_env("CLOUDINARY_BASE_URL", Some(CLOUDINARY_API_BASE), is_prod)?,
                delivery_base_url: get_env(
                    "CLOUDINARY_DELIVERY_URL",
                    Some(CLOUDINARY_DELIVERY_BASE),
                    is_prod,
                )?,
                timeout,
            },
            clerk: ClerkConfig {
                secret_key: Secret::new(get_env("CLERK_SECRET_KEY", None, is_prod)?),
                base_url: get_env("CLERK_BASE_URL", Some(CLERK_API_BASE), is_prod)?,
                timeout,
            },
            limits: LimitsConfig {
                free_usage_limit: parse_env("FREE_USAGE_LIMIT", "10", is_prod)?,
                provider_max_retries: parse_env("PROVIDER_MAX_RETRIES", "2", is_prod)?,
                max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", "10485760", is_prod)?,
                provider_timeout: timeout,
            },
        })
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required in production but not set",
                    key
                )))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(
                    "{} is required but not set",
                    key
                )))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?
        .parse()
        .map_err(|e: T::Err| AppError::ConfigError(anyhow::anyhow!("Invalid {}: {}", key, e)))
}
