//! Tool configuration.
//!
//! Values come from an optional TOML file, then environment variables
//! override whatever the file set:
//!
//! | Variable | Field |
//! |---|---|
//! | `WORKSPACE` | `workspace` (`prod`, `dev` or `test`) |
//! | `DROPBOX_FOLDER` | `dropbox_folder` |
//! | `NAS_FOLDER` | `nas_folder` |
//! | `DROPBOX_ACCESS_TOKEN` | `dropbox_access_token` |
//! | `ATT_EXPECTED_TEAM` | `expected_team` |
//! | `ATT_METADATA_NAME` | `metadata_name` |
//! | `ATT_CONCURRENCY` | `concurrency` |
//! | `ATT_REQUIRE_SUBMISSION_FOLDER` | `require_submission_folder` |

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use serde::Deserialize;

/// Deployment the tool runs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workspace {
    #[default]
    Prod,
    Dev,
    /// `dropbox_folder` is a local directory standing in for Dropbox.
    Test,
}

impl FromStr for Workspace {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" => Ok(Self::Prod),
            "dev" => Ok(Self::Dev),
            "test" => Ok(Self::Test),
            other => bail!("unknown WORKSPACE {other:?} (expected prod, dev or test)"),
        }
    }
}

/// Tool configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub workspace: Workspace,

    /// Dropbox root folder, `/`-delimited on both ends. A local directory
    /// in the test workspace.
    pub dropbox_folder: String,

    /// NAS root folder, ending in a path separator.
    pub nas_folder: String,

    /// Dropbox bearer token. Not needed in the test workspace.
    pub dropbox_access_token: Option<String>,

    /// Team the Dropbox account must belong to, if set.
    pub expected_team: Option<String>,

    /// Name of each folder's default metadata document.
    pub metadata_name: String,

    /// Number of files transferred at once.
    pub concurrency: usize,

    /// Refuse to copy into a submission folder that does not already exist
    /// on the NAS, instead of creating it.
    pub require_submission_folder: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: Workspace::default(),
            dropbox_folder: String::new(),
            nas_folder: String::new(),
            dropbox_access_token: None,
            expected_team: None,
            metadata_name: att_remote::DEFAULT_METADATA_NAME.to_string(),
            concurrency: 1,
            require_submission_folder: false,
        }
    }
}

impl Config {
    /// Loads the optional config file, applies the process environment and
    /// validates the result.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config = toml::from_str(&content)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config file loaded");
        Ok(config)
    }

    /// Overrides fields with the variables `var` yields. Empty values are
    /// treated as unset.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        let var = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("WORKSPACE") {
            self.workspace = v.parse()?;
        }
        if let Some(v) = var("DROPBOX_FOLDER") {
            self.dropbox_folder = v;
        }
        if let Some(v) = var("NAS_FOLDER") {
            self.nas_folder = v;
        }
        if let Some(v) = var("DROPBOX_ACCESS_TOKEN") {
            self.dropbox_access_token = Some(v);
        }
        if let Some(v) = var("ATT_EXPECTED_TEAM") {
            self.expected_team = Some(v);
        }
        if let Some(v) = var("ATT_METADATA_NAME") {
            self.metadata_name = v;
        }
        if let Some(v) = var("ATT_CONCURRENCY") {
            self.concurrency = v
                .trim()
                .parse()
                .with_context(|| format!("ATT_CONCURRENCY must be a positive integer, got {v:?}"))?;
        }
        if let Some(v) = var("ATT_REQUIRE_SUBMISSION_FOLDER") {
            self.require_submission_folder = parse_flag(&v).with_context(|| {
                format!("ATT_REQUIRE_SUBMISSION_FOLDER must be true or false, got {v:?}")
            })?;
        }
        Ok(())
    }

    /// Checks that every required value is present and well-formed.
    ///
    /// All missing values are reported in one error.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut missing = Vec::new();
        if self.dropbox_folder.is_empty() {
            missing.push("DROPBOX_FOLDER");
        }
        if self.nas_folder.is_empty() {
            missing.push("NAS_FOLDER");
        }
        if self.workspace != Workspace::Test && self.dropbox_access_token.is_none() {
            missing.push("DROPBOX_ACCESS_TOKEN");
        }
        if !missing.is_empty() {
            bail!("missing configuration: {}", missing.join(", "));
        }

        if self.workspace != Workspace::Test
            && !(self.dropbox_folder.starts_with('/') && self.dropbox_folder.ends_with('/'))
        {
            bail!(
                "DROPBOX_FOLDER must start and end with '/', got {:?}",
                self.dropbox_folder
            );
        }
        if !(self.nas_folder.ends_with('/') || self.nas_folder.ends_with('\\')) {
            bail!(
                "NAS_FOLDER must end with '/' or '\\', got {:?}",
                self.nas_folder
            );
        }
        if self.concurrency == 0 {
            bail!("concurrency must be at least 1");
        }
        if self.metadata_name.contains('/') {
            bail!("metadata name must be a bare file name, got {:?}", self.metadata_name);
        }
        Ok(())
    }

    pub fn nas_root(&self) -> PathBuf {
        PathBuf::from(&self.nas_folder)
    }
}

fn parse_flag(value: &str) -> anyhow::Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => bail!("not a boolean: {other:?}"),
    }
}
