//! Runtime configuration.
//!
//! The Lambda handlers read their settings from the environment; the operator
//! CLI reads a JSON resources file (see [`resources`]).

pub mod resources;

use regex::Regex;

use crate::error::ConfigError;

pub use resources::{load_resources, Resources};

pub const JOBS_TABLE: &str = "JOBS_TABLE";
pub const NOTIFICATION_TOPIC_ARN: &str = "NOTIFICATION_TOPIC_ARN";
pub const NOTIFICATION_QUEUE_URL: &str = "NOTIFICATION_QUEUE_URL";
pub const TEXTRACT_ROLE_ARN: &str = "TEXTRACT_ROLE_ARN";
pub const TEXTRACT_SNS_TOPIC_ARN: &str = "TEXTRACT_SNS_TOPIC_ARN";
pub const TEXTRACT_IDEMPOTENCY_TOKEN: &str = "TEXTRACT_IDEMPOTENCY_TOKEN";
pub const TEXTRACT_ENABLE_SIGNATURES: &str = "TEXTRACT_ENABLE_SIGNATURES";
pub const OUTPUT_BUCKET: &str = "OUTPUT_BUCKET";

/// Settings shared by both handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub jobs_table: String,
    pub notification_topic_arn: String,
    pub notification_queue_url: Option<String>,
}

/// Settings for the upload trigger handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSettings {
    pub common: Settings,
    pub textract_role_arn: String,
    /// Topic Textract reports job completion to.
    pub textract_sns_topic_arn: String,
    pub idempotency_token: Option<String>,
    pub enable_signatures: bool,
}

/// Settings for the completion handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionSettings {
    pub common: Settings,
    pub output_bucket: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvReader::new(&lookup);
        let settings = Self::read(&mut env);
        env.finish()?;
        validate_arn(NOTIFICATION_TOPIC_ARN, &settings.notification_topic_arn, "sns")?;
        Ok(settings)
    }

    fn read<F: Fn(&str) -> Option<String>>(env: &mut EnvReader<'_, F>) -> Self {
        Self {
            jobs_table: env.required(JOBS_TABLE),
            notification_topic_arn: env.required(NOTIFICATION_TOPIC_ARN),
            notification_queue_url: env.optional(NOTIFICATION_QUEUE_URL),
        }
    }
}

impl UploadSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvReader::new(&lookup);
        let common = Settings::read(&mut env);
        let textract_role_arn = env.required(TEXTRACT_ROLE_ARN);
        let textract_sns_topic_arn = env.required(TEXTRACT_SNS_TOPIC_ARN);
        let idempotency_token = env.optional(TEXTRACT_IDEMPOTENCY_TOKEN);
        env.finish()?;

        let enable_signatures = parse_flag(
            TEXTRACT_ENABLE_SIGNATURES,
            lookup(TEXTRACT_ENABLE_SIGNATURES),
        )?;

        validate_arn(NOTIFICATION_TOPIC_ARN, &common.notification_topic_arn, "sns")?;
        validate_arn(TEXTRACT_ROLE_ARN, &textract_role_arn, "iam")?;
        validate_arn(TEXTRACT_SNS_TOPIC_ARN, &textract_sns_topic_arn, "sns")?;

        Ok(Self {
            common,
            textract_role_arn,
            textract_sns_topic_arn,
            idempotency_token,
            enable_signatures,
        })
    }
}

impl CompletionSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut env = EnvReader::new(&lookup);
        let common = Settings::read(&mut env);
        let output_bucket = env.required(OUTPUT_BUCKET);
        env.finish()?;

        validate_arn(NOTIFICATION_TOPIC_ARN, &common.notification_topic_arn, "sns")?;

        Ok(Self {
            common,
            output_bucket,
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Reads variables, collecting every missing required name.
struct EnvReader<'a, F> {
    lookup: &'a F,
    missing: Vec<&'static str>,
}

impl<'a, F: Fn(&str) -> Option<String>> EnvReader<'a, F> {
    fn new(lookup: &'a F) -> Self {
        Self {
            lookup,
            missing: Vec::new(),
        }
    }

    fn optional(&self, name: &str) -> Option<String> {
        (self.lookup)(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn required(&mut self, name: &'static str) -> String {
        self.optional(name).unwrap_or_else(|| {
            self.missing.push(name);
            String::new()
        })
    }

    fn finish(self) -> Result<(), ConfigError> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::MissingVariable {
                names: self.missing.join(", "),
            })
        }
    }
}

fn parse_flag(name: &str, value: Option<String>) -> Result<bool, ConfigError> {
    let Some(value) = value.map(|v| v.trim().to_ascii_lowercase()) else {
        return Ok(false);
    };
    match value.as_str() {
        "" | "0" | "false" | "no" | "off" => Ok(false),
        "1" | "true" | "yes" | "on" => Ok(true),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value,
            reason: "expected true or false".to_string(),
        }),
    }
}

fn validate_arn(name: &str, value: &str, service: &str) -> Result<(), ConfigError> {
    let pattern = format!(r"^arn:aws[a-z\-]*:{}:[a-z0-9\-]*:\d{{12}}:\S+$", service);
    let re = Regex::new(&pattern).map_err(|e| ConfigError::Validation {
        message: format!("Invalid ARN pattern: {}", e),
    })?;

    if re.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
            reason: format!("expected an {} ARN", service),
        })
    }
}
