//! Application configuration management.

use std::path::PathBuf;

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
    /// Log output configuration.
    #[serde(default)]
    pub log: LogConfig,
    /// How produced audio reaches the caller.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Extraction tool configuration.
    #[serde(default)]
    pub extractor: ExtractorConfig,
    /// Temporary workspace configuration.
    #[serde(default)]
    pub workspace: WorkspaceConfig,
    /// Object storage configuration. Required for link delivery.
    #[serde(default)]
    pub storage: Option<StorageSettings>,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    7000
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origins allowed to call the API. `"*"` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:4000".to_string()]
}

impl CorsConfig {
    /// Returns true when every origin is allowed.
    #[must_use]
    pub fn allows_any_origin(&self) -> bool {
        self.allowed_origins.iter().any(|o| o == "*")
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable output.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Log configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LogConfig {
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Delivery strategy selected at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Upload to object storage and return a signed link.
    #[default]
    Link,
    /// Stream the audio bytes in the response body.
    Stream,
}

/// Delivery configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeliveryConfig {
    /// Delivery mode.
    #[serde(default)]
    pub mode: DeliveryMode,
}

/// Which source rendition the extractor prefers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualitySelector {
    /// Highest quality audio rendition.
    #[default]
    Best,
    /// Lowest quality audio rendition.
    Worst,
}

/// Extraction tool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractorConfig {
    /// Program to execute.
    #[serde(default = "default_program")]
    pub program: String,
    /// Arguments placed before the generated ones (e.g. `["-m", "yt_dlp"]`
    /// when `program` is a Python interpreter).
    #[serde(default)]
    pub program_args: Vec<String>,
    /// Rendition preference.
    #[serde(default)]
    pub quality: QualitySelector,
    /// Target audio codec.
    #[serde(default = "default_codec")]
    pub codec: String,
    /// Target bitrate in kbit/s. `None` keeps the tool's default.
    #[serde(default)]
    pub bitrate_kbps: Option<u32>,
    /// Cookie file passed through to the tool unchanged.
    #[serde(default)]
    pub cookie_file: Option<PathBuf>,
    /// Upper bound for one extraction. `None` waits indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            program_args: Vec::new(),
            quality: QualitySelector::default(),
            codec: default_codec(),
            bitrate_kbps: None,
            cookie_file: None,
            timeout_secs: None,
        }
    }
}

fn default_program() -> String {
    "yt-dlp".to_string()
}

fn default_codec() -> String {
    "mp3".to_string()
}

/// Temporary workspace configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspaceConfig {
    /// Directory under which request workspaces are created.
    /// Defaults to the OS temporary directory.
    #[serde(default)]
    pub root: Option<PathBuf>,
    /// Age after which a leftover workspace is swept at startup.
    #[serde(default = "default_stale_after")]
    pub stale_after_secs: u64,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            root: None,
            stale_after_secs: default_stale_after(),
        }
    }
}

fn default_stale_after() -> u64 {
    3600 // 1 hour
}

impl WorkspaceConfig {
    /// Resolved workspace root.
    #[must_use]
    pub fn root_dir(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(std::env::temp_dir)
    }
}

/// S3-compatible object storage settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Endpoint URL.
    pub endpoint: String,
    /// Bucket name.
    pub bucket: String,
    /// Access key ID.
    pub access_key_id: String,
    /// Secret access key.
    pub secret_access_key: String,
    /// Region (`auto` for Cloudflare R2).
    #[serde(default = "default_region")]
    pub region: String,
    /// Lifetime of issued download links in seconds.
    #[serde(default = "default_link_ttl")]
    pub link_ttl_secs: u64,
}

fn default_region() -> String {
    "auto".to_string()
}

fn default_link_ttl() -> u64 {
    3600 // 1 hour
}

/// Longest lifetime an S3 SigV4 presigned URL accepts (7 days).
pub const MAX_LINK_TTL_SECS: u64 = 604_800;

/// Plain environment variables accepted for older deployments, mapped onto config keys.
const LEGACY_ENV: [(&str, &str); 5] = [
    ("PORT", "server.port"),
    ("R2_ENDPOINT", "storage.endpoint"),
    ("R2_ACCESS_KEY_ID", "storage.access_key_id"),
    ("R2_SECRET_ACCESS_KEY", "storage.secret_access_key"),
    ("R2_BUCKET_NAME", "storage.bucket"),
];

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or is inconsistent.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("AUDIODROP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("cors.allowed_origins")
                    .try_parsing(true),
            );

        for (var, key) in LEGACY_ENV {
            builder = builder.set_override_option(key, std::env::var(var).ok())?;
        }

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-section constraints.
    ///
    /// # Errors
    ///
    /// Returns an error if link delivery is selected without storage settings,
    /// if the link lifetime is outside `1..=MAX_LINK_TTL_SECS`, or if the codec
    /// is empty.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.delivery.mode == DeliveryMode::Link && self.storage.is_none() {
            return Err(config::ConfigError::Message(
                "delivery mode 'link' requires a [storage] section".to_string(),
            ));
        }
        if let Some(storage) = &self.storage
            && !(1..=MAX_LINK_TTL_SECS).contains(&storage.link_ttl_secs)
        {
            return Err(config::ConfigError::Message(format!(
                "storage.link_ttl_secs must be between 1 and {MAX_LINK_TTL_SECS}, got {}",
                storage.link_ttl_secs
            )));
        }
        if self.extractor.codec.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "extractor.codec must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STORAGE_VARS: [(&str, Option<&str>); 5] = [
        ("PORT", None),
        ("AUDIODROP__STORAGE__ENDPOINT", Some("https://account.r2.cloudflarestorage.com")),
        ("AUDIODROP__STORAGE__BUCKET", Some("audio")),
        ("AUDIODROP__STORAGE__ACCESS_KEY_ID", Some("key")),
        ("AUDIODROP__STORAGE__SECRET_ACCESS_KEY", Some("secret")),
    ];

    #[test]
    fn test_defaults_with_storage() {
        temp_env::with_vars(STORAGE_VARS, || {
            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.server.port, 7000);
            assert_eq!(config.delivery.mode, DeliveryMode::Link);
            assert_eq!(config.extractor.program, "yt-dlp");
            assert_eq!(config.extractor.codec, "mp3");
            assert_eq!(config.extractor.quality, QualitySelector::Best);
            let storage = config.storage.expect("storage section");
            assert_eq!(storage.bucket, "audio");
            assert_eq!(storage.region, "auto");
            assert_eq!(storage.link_ttl_secs, 3600);
        });
    }

    #[test]
    fn test_link_mode_requires_storage() {
        temp_env::with_vars_unset(
            [
                "AUDIODROP__STORAGE__BUCKET",
                "R2_ENDPOINT",
                "R2_BUCKET_NAME",
                "R2_ACCESS_KEY_ID",
                "R2_SECRET_ACCESS_KEY",
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_stream_mode_without_storage() {
        temp_env::with_vars(
            [
                ("AUDIODROP__DELIVERY__MODE", Some("stream")),
                ("AUDIODROP__EXTRACTOR__QUALITY", Some("worst")),
                ("AUDIODROP__EXTRACTOR__BITRATE_KBPS", Some("128")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.delivery.mode, DeliveryMode::Stream);
                assert_eq!(config.extractor.quality, QualitySelector::Worst);
                assert_eq!(config.extractor.bitrate_kbps, Some(128));
                assert!(config.storage.is_none());
            },
        );
    }

    #[test]
    fn test_legacy_environment_overrides() {
        temp_env::with_vars(
            [
                ("PORT", Some("7100")),
                ("R2_ENDPOINT", Some("https://r2.example.com")),
                ("R2_ACCESS_KEY_ID", Some("legacy-key")),
                ("R2_SECRET_ACCESS_KEY", Some("legacy-secret")),
                ("R2_BUCKET_NAME", Some("legacy-bucket")),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.server.port, 7100);
                let storage = config.storage.expect("storage section");
                assert_eq!(storage.endpoint, "https://r2.example.com");
                assert_eq!(storage.bucket, "legacy-bucket");
            },
        );
    }

    #[test]
    fn test_cors_origin_list() {
        temp_env::with_vars(
            [
                ("AUDIODROP__DELIVERY__MODE", Some("stream")),
                (
                    "AUDIODROP__CORS__ALLOWED_ORIGINS",
                    Some("https://rangkumin.xyz,http://localhost:4000"),
                ),
            ],
            || {
                let config = AppConfig::load().expect("config should load");
                assert_eq!(config.cors.allowed_origins.len(), 2);
                assert!(!config.cors.allows_any_origin());
            },
        );
    }

    #[test]
    fn test_link_ttl_out_of_range_rejected() {
        for ttl in ["0", "604801", "31536000"] {
            let mut vars = STORAGE_VARS.to_vec();
            vars.push(("AUDIODROP__STORAGE__LINK_TTL_SECS", Some(ttl)));
            temp_env::with_vars(vars, || {
                let err = AppConfig::load().expect_err("ttl should be rejected");
                assert!(err.to_string().contains("link_ttl_secs"), "{err}");
            });
        }
    }

    #[test]
    fn test_link_ttl_upper_bound_accepted() {
        let mut vars = STORAGE_VARS.to_vec();
        vars.push(("AUDIODROP__STORAGE__LINK_TTL_SECS", Some("604800")));
        temp_env::with_vars(vars, || {
            let config = AppConfig::load().expect("config should load");
            assert_eq!(config.storage.unwrap().link_ttl_secs, MAX_LINK_TTL_SECS);
        });
    }

    #[test]
    fn test_workspace_root_defaults_to_temp_dir() {
        let config = WorkspaceConfig::default();
        assert_eq!(config.root_dir(), std::env::temp_dir());
        assert_eq!(config.stale_after_secs, 3600);
    }
}
