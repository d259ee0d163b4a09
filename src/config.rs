use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context};
use serde::Deserialize;

use crate::client::s3::ClientConfig;
use crate::error::Error;
use crate::types::parse_flag;
use crate::visibility::Visibility;
use crate::Result;

/// Request signing scheme the bucket expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureScheme {
    V2,
    #[default]
    V4,
    Obs,
}

impl FromStr for SignatureScheme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "v2" => Ok(SignatureScheme::V2),
            "v4" => Ok(SignatureScheme::V4),
            "obs" => Ok(SignatureScheme::Obs),
            other => Err(Error::invalid_config(format!(
                "unsupported signature scheme: {other}"
            ))),
        }
    }
}

impl SignatureScheme {
    /// Schemes other than SigV4 parse but cannot be produced by the request
    /// signer, so they are refused at construction.
    pub fn ensure_supported(self) -> Result<()> {
        match self {
            SignatureScheme::V4 => Ok(()),
            other => Err(Error::invalid_config(format!(
                "signature scheme {other} is not supported, use v4"
            ))),
        }
    }
}

impl fmt::Display for SignatureScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SignatureScheme::V2 => "v2",
            SignatureScheme::V4 => "v4",
            SignatureScheme::Obs => "obs",
        };
        f.write_str(name)
    }
}

/// Option map accepted at adapter construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdapterOptions {
    /// Base for public links.
    pub url: Option<String>,
    /// Base signed links are grafted onto.
    pub temporary_url: Option<String>,
    /// The endpoint already addresses the bucket (custom domain).
    pub bucket_endpoint: bool,
    /// Replaces the endpoint passed to the constructor.
    pub endpoint: Option<String>,
}

impl AdapterOptions {
    pub fn from_map(map: HashMap<String, String>) -> Result<Self> {
        let mut options = AdapterOptions::default();

        for (key, value) in map {
            let value = value.trim().to_string();
            match key.as_str() {
                "url" => options.url = Some(value).filter(|v| !v.is_empty()),
                "temporary_url" => options.temporary_url = Some(value).filter(|v| !v.is_empty()),
                "bucket_endpoint" => options.bucket_endpoint = parse_flag(&key, &value)?,
                "endpoint" => options.endpoint = Some(value).filter(|v| !v.is_empty()),
                other => tracing::debug!(option = other, "ignoring unknown adapter option"),
            }
        }

        Ok(options)
    }
}

/// Immutable adapter settings, fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub bucket: String,
    pub endpoint: String,
    /// Root every key is placed under.
    pub prefix: Option<String>,
    pub signature: SignatureScheme,
    pub url: Option<String>,
    pub temporary_url: Option<String>,
    pub bucket_endpoint: bool,
    pub path_style: bool,
    pub default_visibility: Visibility,
}

impl AdapterConfig {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            endpoint: endpoint.into(),
            prefix: None,
            signature: SignatureScheme::default(),
            url: None,
            temporary_url: None,
            bucket_endpoint: false,
            path_style: false,
            default_visibility: Visibility::Private,
        }
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_signature(mut self, signature: SignatureScheme) -> Self {
        self.signature = signature;
        self
    }

    pub fn with_default_visibility(mut self, visibility: Visibility) -> Self {
        self.default_visibility = visibility;
        self
    }

    pub fn with_path_style(mut self, path_style: bool) -> Self {
        self.path_style = path_style;
        self
    }

    /// Apply the constructor option map on top of the explicit arguments.
    pub fn with_options(mut self, options: AdapterOptions) -> Self {
        if let Some(endpoint) = options.endpoint {
            self.endpoint = endpoint;
        }
        self.url = options.url.or(self.url);
        self.temporary_url = options.temporary_url.or(self.temporary_url);
        self.bucket_endpoint = self.bucket_endpoint || options.bucket_endpoint;
        self
    }
}

/// Top-level application configuration loaded from file + environment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub obs: ObsSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load configuration from disk and environment.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = env::var("OBSFS_CONFIG").unwrap_or_else(|_| "obsfs.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load from `path` when it exists, then overlay `OBSFS_*` variables.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder();

        if path.exists() {
            builder = builder.add_source(config::File::from(PathBuf::from(path)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("OBSFS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let mut config: Self = settings.try_deserialize()?;

        if config.logging.level.trim().is_empty() {
            config.logging.level = "info".to_string();
        }

        Ok(config)
    }

    /// Validate the `obs` section and turn it into adapter settings.
    pub fn adapter_config(&self) -> anyhow::Result<AdapterConfig> {
        let obs = &self.obs;

        if obs.endpoint.trim().is_empty() && obs.url.is_none() {
            bail!("obs.endpoint must be specified");
        }
        if obs.bucket.trim().is_empty() && !obs.bucket_endpoint {
            bail!("obs.bucket must be specified");
        }

        let signature = match obs.signature.as_deref() {
            Some(s) => s.parse().context("invalid obs.signature")?,
            None => SignatureScheme::default(),
        };

        let mut config = AdapterConfig::new(obs.endpoint.trim(), obs.bucket.trim())
            .with_signature(signature)
            .with_default_visibility(obs.default_visibility)
            .with_path_style(obs.path_style)
            .with_options(AdapterOptions {
                url: obs.url.clone(),
                temporary_url: obs.temporary_url.clone(),
                bucket_endpoint: obs.bucket_endpoint,
                endpoint: None,
            });

        if let Some(root) = obs.root.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
            config = config.with_prefix(root);
        }

        Ok(config)
    }

    /// Settings for the S3-compatible OBS client.
    pub fn client_config(&self) -> anyhow::Result<ClientConfig> {
        let obs = &self.obs;
        let non_empty = |v: &str| Some(v.trim().to_string()).filter(|v| !v.is_empty());

        let signature = match obs.signature.as_deref() {
            Some(s) => s.parse().context("invalid obs.signature")?,
            None => SignatureScheme::default(),
        };

        Ok(ClientConfig {
            key: non_empty(&obs.key),
            secret: non_empty(&obs.secret),
            endpoint: obs.endpoint.trim().to_string(),
            region: obs.region.as_deref().and_then(non_empty),
            path_style: obs.path_style,
            signature,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObsSection {
    pub key: String,
    pub secret: String,
    pub bucket: String,
    pub endpoint: String,
    pub region: Option<String>,
    pub path_style: bool,
    pub root: Option<String>,
    pub url: Option<String>,
    pub temporary_url: Option<String>,
    pub bucket_endpoint: bool,
    pub signature: Option<String>,
    pub default_visibility: Visibility,
}

impl Default for ObsSection {
    fn default() -> Self {
        Self {
            key: String::new(),
            secret: String::new(),
            bucket: String::new(),
            endpoint: "obs.cn-east-3.myhuaweicloud.com".to_string(),
            region: None,
            path_style: false,
            root: None,
            url: None,
            temporary_url: None,
            bucket_endpoint: false,
            signature: None,
            default_visibility: Visibility::Private,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}
