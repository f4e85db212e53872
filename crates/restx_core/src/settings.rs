//! Process-wide server settings.
//!
//! Loaded once at startup from an optional TOML file, then overridden by
//! `RESTX_*` environment variables.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Errors raised while loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The settings file could not be read
    #[error("Cannot read settings file '{path}': {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid TOML for these settings
    #[error("Invalid settings file '{path}': {source}")]
    Parse {
        /// File that was parsed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },

    /// An environment variable holds an unusable value
    #[error("Invalid value for {key}: {reason}")]
    InvalidValue {
        /// Variable name
        key: String,
        /// Why the value was rejected
        reason: String,
    },
}

/// Server settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the server binds to
    pub listen_address: SocketAddr,
    /// URI path of the server metadata document
    pub document_root: String,
    /// Prefix for metadata URIs
    pub prefix_meta: String,
    /// Prefix for component URIs
    pub prefix_code: String,
    /// Prefix for resource URIs
    pub prefix_resource: String,
    /// Prefix for static files
    pub prefix_static: String,
    /// Directory the static files are served from
    pub static_dir: PathBuf,
    /// Name the server reports
    pub server_name: String,
    /// Version the server reports
    pub version: String,
    /// Server documentation text
    pub doc: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_address: SocketAddr::from(([127, 0, 0, 1], 8001)),
            document_root: "/".to_string(),
            prefix_meta: "/meta".to_string(),
            prefix_code: "/code".to_string(),
            prefix_resource: "/resource".to_string(),
            prefix_static: "/static".to_string(),
            static_dir: PathBuf::from("static_files"),
            server_name: "RESTx server".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            doc: "RESTx publishes components and resources as typed, self-describing \
                  HTTP services. Start at the code and resource listings."
                .to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file; missing fields take their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or if its
    /// prefixes are empty or collide
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut settings: Self = toml::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        settings.normalize()?;
        tracing::debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Default settings overridden from the environment
    ///
    /// # Errors
    ///
    /// Returns error if an environment variable holds an unusable value
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut settings = Self::default();
        settings.apply_env()?;
        Ok(settings)
    }

    /// Override fields from `RESTX_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns error if an environment variable holds an unusable value
    pub fn apply_env(&mut self) -> Result<(), SettingsError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Override fields from variables supplied by `lookup`
    ///
    /// # Errors
    ///
    /// Returns error if a variable holds an unusable value
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(addr) = lookup("RESTX_LISTEN_ADDRESS") {
            self.listen_address = addr.parse().map_err(|e: std::net::AddrParseError| {
                SettingsError::InvalidValue {
                    key: "RESTX_LISTEN_ADDRESS".to_string(),
                    reason: e.to_string(),
                }
            })?;
        }
        let text_fields: [(&str, &mut String); 8] = [
            ("RESTX_SERVER_NAME", &mut self.server_name),
            ("RESTX_VERSION", &mut self.version),
            ("RESTX_DOC", &mut self.doc),
            ("RESTX_DOCUMENT_ROOT", &mut self.document_root),
            ("RESTX_PREFIX_META", &mut self.prefix_meta),
            ("RESTX_PREFIX_CODE", &mut self.prefix_code),
            ("RESTX_PREFIX_RESOURCE", &mut self.prefix_resource),
            ("RESTX_PREFIX_STATIC", &mut self.prefix_static),
        ];
        for (key, field) in text_fields {
            if let Some(value) = lookup(key) {
                *field = value;
            }
        }
        if let Some(dir) = lookup("RESTX_STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        self.normalize()
    }

    /// URI of the server documentation
    #[must_use]
    pub fn meta_doc_uri(&self) -> String {
        format!("{}/doc", self.prefix_meta)
    }

    /// URI of a component
    #[must_use]
    pub fn component_uri(&self, name: &str) -> String {
        format!("{}/{name}", self.prefix_code)
    }

    /// URI of a resource
    #[must_use]
    pub fn resource_uri(&self, name: &str) -> String {
        format!("{}/{name}", self.prefix_resource)
    }

    /// Normalize the prefixes, then check that each one is a distinct,
    /// non-root path
    ///
    /// `load` and `apply_env_from` call this; settings built by hand should
    /// go through it before they reach a router.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` naming the first empty or colliding prefix
    pub fn normalize(&mut self) -> Result<(), SettingsError> {
        let root = normalize_prefix(&self.document_root);
        self.document_root = if root.is_empty() { "/".to_string() } else { root };
        let mut taken = vec![("document_root", self.document_root.clone())];
        for (key, prefix) in [
            ("prefix_meta", &mut self.prefix_meta),
            ("prefix_code", &mut self.prefix_code),
            ("prefix_resource", &mut self.prefix_resource),
            ("prefix_static", &mut self.prefix_static),
        ] {
            *prefix = normalize_prefix(prefix);
            if prefix.is_empty() {
                return Err(SettingsError::InvalidValue {
                    key: key.to_string(),
                    reason: "a prefix cannot be the root path".to_string(),
                });
            }
            if let Some((other, _)) = taken.iter().find(|(_, p)| p.as_str() == prefix.as_str()) {
                return Err(SettingsError::InvalidValue {
                    key: key.to_string(),
                    reason: format!("'{prefix}' is already used by {other}"),
                });
            }
            taken.push((key, prefix.clone()));
        }
        let doc_uri = self.meta_doc_uri();
        if let Some((other, _)) = taken.iter().find(|(_, p)| *p == doc_uri) {
            return Err(SettingsError::InvalidValue {
                key: (*other).to_string(),
                reason: format!("'{doc_uri}' is the documentation URI"),
            });
        }
        Ok(())
    }
}

/// Leading slash, no trailing slash; the bare root becomes empty
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}
