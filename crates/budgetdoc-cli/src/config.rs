//! Report profile loading
//!
//! The profile is a TOML file; every key is optional and missing keys keep
//! the built-in layout. A relative `logo` path is taken relative to the
//! profile file, not the working directory.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use budgetdoc_core::ReportProfile;
use thiserror::Error;
use tracing::debug;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("{path} already exists, not overwriting")]
    Exists { path: PathBuf },

    #[error("cannot write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

const HEADER: &str = "\
# budgetdoc report profile
#
# logo = \"logo.png\"   # PNG or JPEG shown at the top right, relative to this file
#
# [columns]
# Director = [\"Gerente\"]   # extra column names, tried before the built-in ones

";

/// Parse a profile from TOML text
pub fn parse(text: &str, path: &Path) -> Result<ReportProfile, ConfigError> {
    toml::from_str(text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a profile file, resolving the logo path against its directory
pub fn load(path: &Path) -> Result<ReportProfile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut profile = parse(&text, path)?;

    if let Some(logo) = &profile.logo {
        if logo.is_relative() {
            let base = path.parent().unwrap_or_else(|| Path::new(""));
            profile.logo = Some(base.join(logo));
        }
    }

    debug!(
        path = %path.display(),
        titles = profile.title_lines.len(),
        signatures = profile.signatures.len(),
        "loaded report profile"
    );
    Ok(profile)
}

/// The built-in profile as commented TOML
pub fn default_toml() -> Result<String, ConfigError> {
    let body = toml::to_string_pretty(&ReportProfile::default())?;
    Ok(format!("{HEADER}{body}"))
}

/// Write the built-in profile to a new file
pub fn write_default(path: &Path) -> Result<(), ConfigError> {
    let text = default_toml()?;
    let write_err = |source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                ConfigError::Exists {
                    path: path.to_path_buf(),
                }
            } else {
                write_err(e)
            }
        })?;
    file.write_all(text.as_bytes()).map_err(write_err)?;
    Ok(())
}
