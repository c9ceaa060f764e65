use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "faceswapbot.toml";
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com";
pub const DEFAULT_INTERPRETER: &str = "python";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_TRANSFORM_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_DOWNLOAD_BYTES: u64 = 20 * 1024 * 1024; // 20 MiB
pub const DEFAULT_UPLOAD_NAME: &str = "faceswap";
pub const DEFAULT_UPLOAD_TITLE: &str = "Face swapped";

/// Top-level config (faceswapbot.toml + FACESWAP_* env overrides + CLI flags).
///
/// Built once at startup and handed to every component by value or `Arc`;
/// nothing mutates it afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FaceswapConfig {
    /// Verbose logging for the bot crates.
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub slack: SlackConfig,
    #[serde(default)]
    pub transform: TransformConfig,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Directory for temporary input/output images. Defaults to the OS temp dir.
    pub scratch_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Bot user OAuth token (`xoxb-…`), used for Web API calls and private downloads.
    #[serde(default)]
    pub bot_token: String,
    /// App-level token (`xapp-…`) for the Socket Mode connection.
    #[serde(default)]
    pub app_token: String,
    /// Web API base URL, without trailing slash.
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            app_token: String::new(),
            api_base: default_api_base(),
        }
    }
}

/// Where the external face replacer lives and what it is fed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Interpreter the script is run with. Empty = execute `script` directly.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,
    /// Path to the face replacer script/executable.
    #[serde(default)]
    pub script: String,
    /// Directory (or single image) of replacement faces, passed as `-f`.
    #[serde(default)]
    pub faces_path: String,
    /// Directory (or single image) of photobomb bodies, passed as `-b`.
    #[serde(default)]
    pub bodies_path: String,
    /// Single image used in place of the bodies for the "success" effect.
    #[serde(default)]
    pub success_path: String,
    #[serde(default = "default_transform_timeout")]
    pub timeout_secs: u64,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            script: String::new(),
            faces_path: String::new(),
            bodies_path: String::new(),
            success_path: String::new(),
            timeout_secs: default_transform_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Newline-delimited word list; a random line becomes the upload file name.
    pub word_list: Option<String>,
    /// File name stem used when no word list is configured (or it is empty).
    #[serde(default = "default_upload_name")]
    pub default_name: String,
    #[serde(default = "default_upload_title")]
    pub title: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            word_list: None,
            default_name: default_upload_name(),
            title: default_upload_title(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_download_bytes")]
    pub max_download_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_fetch_timeout(),
            max_download_bytes: default_max_download_bytes(),
        }
    }
}

/// Command-line values layered on top of file + env config.
///
/// Every field is optional; only the ones that are `Some` override.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    pub debug: Option<bool>,
    pub bot_token: Option<String>,
    pub app_token: Option<String>,
    pub interpreter: Option<String>,
    pub script: Option<String>,
    pub faces_path: Option<String>,
    pub bodies_path: Option<String>,
    pub success_path: Option<String>,
    pub word_list: Option<String>,
}

impl ConfigOverrides {
    /// Re-shape the flat flag set into the nested config layout so figment can
    /// merge it like any other provider.
    fn to_nested(&self) -> serde_json::Value {
        let mut root = serde_json::Map::new();
        let mut slack = serde_json::Map::new();
        let mut transform = serde_json::Map::new();
        let mut upload = serde_json::Map::new();

        if let Some(debug) = self.debug {
            root.insert("debug".into(), debug.into());
        }
        insert_some(&mut slack, "bot_token", &self.bot_token);
        insert_some(&mut slack, "app_token", &self.app_token);
        insert_some(&mut transform, "interpreter", &self.interpreter);
        insert_some(&mut transform, "script", &self.script);
        insert_some(&mut transform, "faces_path", &self.faces_path);
        insert_some(&mut transform, "bodies_path", &self.bodies_path);
        insert_some(&mut transform, "success_path", &self.success_path);
        insert_some(&mut upload, "word_list", &self.word_list);

        for (key, section) in [("slack", slack), ("transform", transform), ("upload", upload)] {
            if !section.is_empty() {
                root.insert(key.into(), serde_json::Value::Object(section));
            }
        }
        serde_json::Value::Object(root)
    }
}

fn insert_some(map: &mut serde_json::Map<String, serde_json::Value>, key: &str, value: &Option<String>) {
    if let Some(v) = value {
        map.insert(key.into(), serde_json::Value::String(v.clone()));
    }
}

fn default_api_base() -> String {
    DEFAULT_SLACK_API_BASE.to_string()
}
fn default_interpreter() -> String {
    DEFAULT_INTERPRETER.to_string()
}
fn default_transform_timeout() -> u64 {
    DEFAULT_TRANSFORM_TIMEOUT_SECS
}
fn default_upload_name() -> String {
    DEFAULT_UPLOAD_NAME.to_string()
}
fn default_upload_title() -> String {
    DEFAULT_UPLOAD_TITLE.to_string()
}
fn default_fetch_timeout() -> u64 {
    DEFAULT_FETCH_TIMEOUT_SECS
}
fn default_max_download_bytes() -> u64 {
    DEFAULT_MAX_DOWNLOAD_BYTES
}

impl FaceswapConfig {
    /// Load config from a TOML file, FACESWAP_* env vars and CLI overrides,
    /// in that order of precedence (later wins).
    ///
    /// A missing TOML file is fine: everything can come from env or flags.
    /// Nested keys use a double underscore, e.g. `FACESWAP_SLACK__BOT_TOKEN`.
    pub fn load(
        config_path: Option<&str>,
        overrides: &ConfigOverrides,
    ) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_FILE);

        let config: FaceswapConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("FACESWAP_").split("__"))
            .merge(Serialized::defaults(overrides.to_nested()))
            .extract()
            .map_err(|e| crate::error::FaceswapError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject configs the bot cannot start with.
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::FaceswapError;

        if self.slack.bot_token.trim().is_empty() {
            return Err(FaceswapError::Config("Slack bot token cannot be empty".into()));
        }
        if self.slack.app_token.trim().is_empty() {
            return Err(FaceswapError::Config(
                "Slack app token cannot be empty (required for Socket Mode)".into(),
            ));
        }
        if self.transform.script.trim().is_empty() {
            return Err(FaceswapError::Config("no face swapper script configured".into()));
        }
        if self.transform.timeout_secs == 0 {
            return Err(FaceswapError::Config("transform.timeout_secs must be > 0".into()));
        }
        if self.fetch.timeout_secs == 0 {
            return Err(FaceswapError::Config("fetch.timeout_secs must be > 0".into()));
        }
        if self.fetch.max_download_bytes == 0 {
            return Err(FaceswapError::Config("fetch.max_download_bytes must be > 0".into()));
        }
        Ok(())
    }

    /// Reference paths that look wrong but might appear later (e.g. mounted
    /// volumes). Startup logs these once tracing is up.
    pub fn path_warnings(&self) -> Vec<PathWarning> {
        let references = [
            ("transform.faces_path", Some(&self.transform.faces_path)),
            ("transform.bodies_path", Some(&self.transform.bodies_path)),
            ("transform.success_path", Some(&self.transform.success_path)),
            ("upload.word_list", self.upload.word_list.as_ref()),
        ];
        let mut warnings = Vec::new();
        for (key, value) in references {
            match value {
                Some(p) if !p.is_empty() && !Path::new(p).exists() => warnings.push(PathWarning {
                    key,
                    path: Some(p.clone()),
                }),
                Some(p) if p.is_empty() && key != "upload.word_list" => {
                    warnings.push(PathWarning { key, path: None })
                }
                _ => {}
            }
        }
        warnings
    }
}

/// A configured reference path that is missing or unset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathWarning {
    pub key: &'static str,
    /// `None` when the key is not configured at all.
    pub path: Option<String>,
}

impl PathWarning {
    pub fn log(&self) {
        match &self.path {
            Some(path) => warn!(key = self.key, path = %path, "configured path does not exist"),
            None => warn!(key = self.key, "reference path not configured"),
        }
    }
}
