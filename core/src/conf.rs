use std::{path::Path, path::PathBuf, str::FromStr};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::{
    error::{MigrationError, Result},
    model::{Legal, Theme},
};

const RULE_SEPARATOR: char = ',';
const PAIR_SEPARATOR: &str = "::";

/// Connection details of a source or target installation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfig {
    /// Base URL, always ending with `/` once normalized.
    pub hostname: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// OpenID Connect client used to obtain a bearer token. Hosts without one use basic auth.
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(skip)]
    pub token: Option<String>,
}

impl HostConfig {
    pub fn new(hostname: &str, username: &str, password: &str) -> Self {
        Self {
            hostname: hostname.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            client_id: None,
            token: None,
        }
    }

    /// Checks the hostname is an absolute URL and appends the trailing slash resource paths
    /// are joined onto.
    pub fn normalize(&mut self) -> Result<()> {
        if self.hostname.is_empty() {
            return Err(MigrationError::Config("hostname must be set".to_string()));
        }
        if !self.hostname.ends_with('/') {
            self.hostname.push('/');
        }
        Url::parse(&self.hostname)?;
        Ok(())
    }

    pub fn resource_url(&self, resource: &str) -> String {
        format!("{}{}", self.hostname, resource)
    }
}

/// Ordered exact-match replacements for layer source URLs, written as `old::new,old2::new2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UrlRewriteRules {
    rules: Vec<(String, String)>,
}

impl UrlRewriteRules {
    pub fn new(rules: Vec<(String, String)>) -> Self {
        Self { rules }
    }

    /// Returns the replacement of the first rule whose left side equals `url`.
    pub fn rewrite<'a>(&'a self, url: &'a str) -> &'a str {
        self.rules
            .iter()
            .find(|(from, _)| from == url)
            .map(|(_, to)| to.as_str())
            .unwrap_or(url)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl FromStr for UrlRewriteRules {
    type Err = MigrationError;

    /// Entries without a `::` separator are ignored.
    fn from_str(s: &str) -> Result<Self> {
        let rules = s
            .split(RULE_SEPARATOR)
            .filter_map(|rule| rule.split_once(PAIR_SEPARATOR))
            .map(|(from, to)| (from.trim().to_string(), to.trim().to_string()))
            .collect();
        Ok(Self { rules })
    }
}

impl TryFrom<String> for UrlRewriteRules {
    type Error = MigrationError;
    fn try_from(value: String) -> Result<Self, MigrationError> {
        value.parse()
    }
}

impl From<UrlRewriteRules> for String {
    fn from(value: UrlRewriteRules) -> Self {
        value
            .rules
            .iter()
            .map(|(from, to)| format!("{from}{PAIR_SEPARATOR}{to}"))
            .collect::<Vec<_>>()
            .join(&RULE_SEPARATOR.to_string())
    }
}

/// How the map view of a legacy application is carried over.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapViewMode {
    /// Coordinates are copied in the source projection.
    #[default]
    Passthrough,
    /// Center and extent are transformed to geographic coordinates.
    Reproject,
}

/// Everything one migration run needs to know. Read from a YAML settings file, the command line,
/// or both with command line values taking precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MigrationSettings {
    pub source: HostConfig,
    pub target: HostConfig,
    /// Tag of the source schema, e.g. `shogun2` or `boot`.
    pub source_type: String,
    pub replace_layer_urls: UrlRewriteRules,
    pub map_view_mode: MapViewMode,
    pub make_public: bool,
    pub clear_target: bool,
    pub accept_invalid_certs: bool,
    pub legal: Option<Legal>,
    pub theme: Option<Theme>,
    /// Directory scanned for post-processor declarations.
    pub plugin_dir: Option<PathBuf>,
}

pub const DEFAULT_SOURCE_TYPE: &str = "shogun2";

impl MigrationSettings {
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let f = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(f);
        Ok(serde_yaml::from_reader(reader)?)
    }

    /// Normalizes both hosts and fills in defaults. Must be called before the settings are used.
    pub fn validate(&mut self) -> Result<()> {
        self.source
            .normalize()
            .map_err(|e| MigrationError::Config(format!("source host: {e}")))?;
        self.target
            .normalize()
            .map_err(|e| MigrationError::Config(format!("target host: {e}")))?;
        if self.source_type.is_empty() {
            self.source_type = DEFAULT_SOURCE_TYPE.to_string();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Result;

    use super::{HostConfig, MapViewMode, MigrationSettings, UrlRewriteRules};

    #[test]
    fn rewrite_rules_match_exactly() -> Result<()> {
        let rules: UrlRewriteRules =
            "http://old/geoserver::http://new/geoserver,http://a::http://b".parse()?;
        assert_eq!(rules.rewrite("http://old/geoserver"), "http://new/geoserver");
        assert_eq!(rules.rewrite("http://a"), "http://b");
        assert_eq!(rules.rewrite("http://old/geoserver/wms"), "http://old/geoserver/wms");
        Ok(())
    }

    #[test]
    fn rules_without_separator_are_ignored() -> Result<()> {
        let rules: UrlRewriteRules = "http://a,http://b::http://c".parse()?;
        assert_eq!(rules.rewrite("http://a"), "http://a");
        assert_eq!(rules.rewrite("http://b"), "http://c");
        Ok(())
    }

    #[test]
    fn first_matching_rule_wins() -> Result<()> {
        let rules: UrlRewriteRules = "http://a::http://b,http://a::http://c".parse()?;
        assert_eq!(rules.rewrite("http://a"), "http://b");
        Ok(())
    }

    #[test]
    fn hostname_gets_trailing_slash() -> Result<()> {
        let mut host = HostConfig::new("https://gis.example.com/shogun2", "admin", "secret");
        host.normalize()?;
        assert_eq!(host.hostname, "https://gis.example.com/shogun2/");
        assert_eq!(
            host.resource_url("rest/projectapps"),
            "https://gis.example.com/shogun2/rest/projectapps"
        );
        Ok(())
    }

    #[test]
    fn invalid_hostname_is_config_error() {
        let mut host = HostConfig::new("not a url", "", "");
        let err = host.normalize().expect_err("hostname should be rejected");
        assert!(err.is_fatal());
    }

    #[test]
    fn settings_from_yaml() -> Result<()> {
        let yaml = r#"
source:
  hostname: http://legacy.example.com
  username: admin
  password: admin
target:
  hostname: https://boot.example.com/
  clientId: shogun-admin
replaceLayerUrls: "http://old/geoserver::http://new/geoserver"
mapViewMode: Reproject
makePublic: true
legal:
  imprint: https://example.com/imprint
"#;
        let mut settings: MigrationSettings = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        assert_eq!(settings.source.hostname, "http://legacy.example.com/");
        assert_eq!(settings.target.client_id.as_deref(), Some("shogun-admin"));
        assert_eq!(settings.source_type, "shogun2");
        assert_eq!(settings.map_view_mode, MapViewMode::Reproject);
        assert!(settings.make_public);
        assert!(!settings.clear_target);
        assert_eq!(
            settings.replace_layer_urls.rewrite("http://old/geoserver"),
            "http://new/geoserver"
        );
        Ok(())
    }
}
