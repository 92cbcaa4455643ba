//! Configuration document describing the repositories to collect statistics
//! for.
//!
//! The YAML layout groups repositories by organization, each organization
//! carrying its own access token:
//!
//! ```yaml
//! github:
//!   apiServer: https://api.github.com
//!   interval: 1h
//!   logFile: /var/log/github-stats.log
//!   orgs:
//!     - name: octo-org
//!       token: ghp_example
//!       repos:
//!         - hello-world
//! ```
//!
//! [`load_config`] and [`parse_config`] decode and validate the document.
//! [`StatsConfig::targets`] expands it into one [`RepositoryTarget`] per
//! repository.

use std::{collections::HashSet, fmt, fs, path::{Path, PathBuf}, time::Duration};

use serde::Deserialize;
use url::Url;

use crate::{
    error::{self, Error},
    transport::DecodePolicy,
};

/// API server used when the document does not name one.
pub const DEFAULT_API_SERVER: &str = "https://api.github.com";
/// Active interval used when the document does not name one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60 * 60,);

/// Raw YAML document.
#[derive(Debug, Deserialize,)]
struct ConfigDocument
{
    github: GitHubSection,
}

/// Raw `github` section before validation.
#[derive(Debug, Deserialize,)]
#[serde(rename_all = "camelCase")]
struct GitHubSection
{
    /// Base URL of the REST API.
    #[serde(default)]
    pub api_server:    Option<String,>,
    /// Active interval as a humantime duration such as `1h` or `90m`.
    #[serde(default)]
    pub interval:      Option<String,>,
    /// Optional log file path.
    #[serde(default)]
    pub log_file:      Option<PathBuf,>,
    /// Optional per-request timeout as a humantime duration.
    #[serde(default)]
    pub timeout:       Option<String,>,
    /// Surface undecodable response bodies as errors.
    #[serde(default)]
    pub strict_decode: bool,
    /// Organizations and their repositories.
    #[serde(default)]
    pub orgs:          Vec<OrganizationEntry,>,
}

/// Organization entry of the `github.orgs` list.
#[derive(Debug, Deserialize, Clone,)]
pub struct OrganizationEntry
{
    /// Organization or user login.
    pub name:  String,
    /// Access token used for every repository of the organization.
    pub token: Token,
    /// Repository names owned by the organization.
    #[serde(default)]
    pub repos: Vec<String,>,
}

/// Access token whose `Debug` output never reveals the secret.
#[derive(Clone, PartialEq, Eq, Deserialize,)]
#[serde(transparent)]
pub struct Token(String,);

impl Token
{
    /// Wraps a raw token value.
    pub fn new(value: impl Into<String,>,) -> Self
    {
        Self(value.into(),)
    }

    /// Returns the raw token for building the authorization header.
    pub fn expose(&self,) -> &str
    {
        &self.0
    }
}

impl fmt::Debug for Token
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str("Token(***)",)
    }
}

/// Validated configuration.
#[derive(Debug, Clone,)]
pub struct StatsConfig
{
    /// Base URL of the REST API.
    pub api_server:    Url,
    /// Lookback window for active commits and contributors.
    pub interval:      Duration,
    /// Destination for log output, stderr when `None`.
    pub log_file:      Option<PathBuf,>,
    /// Per-request timeout, transport default when `None`.
    pub timeout:       Option<Duration,>,
    /// Handling of undecodable response bodies.
    pub decode_policy: DecodePolicy,
    /// Validated organizations.
    pub organizations: Vec<OrganizationEntry,>,
}

/// A single repository to collect statistics for.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RepositoryTarget
{
    /// Owning organization.
    pub organization: String,
    /// Repository name.
    pub repository:   String,
    /// `{apiServer}/repos/{organization}/{repository}`.
    pub api_base:     Url,
    /// Organization access token.
    pub token:        Token,
}

impl StatsConfig
{
    /// Expands organizations into repository targets, in document order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when a repository URL cannot be formed.
    pub fn targets(&self,) -> Result<Vec<RepositoryTarget,>, Error,>
    {
        let mut targets = Vec::new();
        for organization in &self.organizations {
            for repository in &organization.repos {
                targets.push(RepositoryTarget {
                    organization: organization.name.clone(),
                    repository:   repository.clone(),
                    api_base:     repository_base(&self.api_server, &organization.name, repository,)?,
                    token:        organization.token.clone(),
                },);
            }
        }
        Ok(targets,)
    }
}

/// Loads and validates the configuration file at `path`.
///
/// # Errors
///
/// Returns an [`Error`] when the file cannot be read, the YAML cannot be
/// deserialized, or the document violates invariants.
pub fn load_config(path: &Path,) -> Result<StatsConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses and validates a configuration document.
///
/// # Errors
///
/// Propagates [`Error::Parse`] when the YAML cannot be decoded and
/// [`Error::Validation`] when the document violates invariants.
///
/// # Examples
///
/// ```
/// use github_stats::parse_config;
///
/// let yaml = r#"
/// github:
///   interval: 30m
///   orgs:
///     - name: octo-org
///       token: secret
///       repos: [hello-world]
/// "#;
/// let config = parse_config(yaml,).expect("valid configuration",);
/// assert_eq!(config.interval.as_secs(), 1800);
/// assert_eq!(config.targets().unwrap()[0].api_base.as_str(),
///            "https://api.github.com/repos/octo-org/hello-world");
/// ```
pub fn parse_config(contents: &str,) -> Result<StatsConfig, Error,>
{
    let document: ConfigDocument = serde_yaml::from_str(contents,)?;
    validate(document.github,)
}

fn validate(section: GitHubSection,) -> Result<StatsConfig, Error,>
{
    let api_server = parse_api_server(section.api_server.as_deref().unwrap_or(DEFAULT_API_SERVER,),)?;

    let interval = match section.interval.as_deref() {
        Some(raw,) => parse_duration(raw, "interval",)?,
        None => DEFAULT_INTERVAL,
    };

    let timeout = section.timeout.as_deref().map(|raw| parse_duration(raw, "timeout",),).transpose()?;

    if section.orgs.is_empty() {
        return Err(Error::validation("configuration must include at least one organization",),);
    }

    let mut organizations = Vec::with_capacity(section.orgs.len(),);
    let mut seen_orgs = HashSet::with_capacity(section.orgs.len(),);
    for entry in section.orgs {
        let name = normalize_identifier(&entry.name, "organization name",)?;
        if !seen_orgs.insert(name.clone(),) {
            return Err(Error::validation(format!("duplicate organization '{name}'"),),);
        }

        let token = normalize_identifier(entry.token.expose(), "token",)
            .map_err(|_| Error::validation(format!("token for '{name}' must be non-empty without whitespace"),),)?;

        let mut repos = Vec::with_capacity(entry.repos.len(),);
        let mut seen_repos = HashSet::with_capacity(entry.repos.len(),);
        for repo in &entry.repos {
            let repo = normalize_identifier(repo, "repository",)?;
            if !seen_repos.insert(repo.clone(),) {
                return Err(Error::validation(format!("duplicate repository '{name}/{repo}'"),),);
            }
            repos.push(repo,);
        }

        organizations.push(OrganizationEntry {
            name,
            token: Token::new(token,),
            repos,
        },);
    }

    Ok(StatsConfig {
        api_server,
        interval,
        log_file: section.log_file,
        timeout,
        decode_policy: DecodePolicy::from_strict_flag(section.strict_decode,),
        organizations,
    },)
}

fn parse_api_server(raw: &str,) -> Result<Url, Error,>
{
    let trimmed = raw.trim().trim_end_matches('/',);
    let url = Url::parse(trimmed,)
        .map_err(|e| Error::validation(format!("apiServer '{trimmed}' is not a valid URL: {e}"),),)?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        return Err(Error::validation(format!("apiServer '{trimmed}' must be an http(s) URL"),),);
    }
    Ok(url,)
}

fn parse_duration(raw: &str, field: &str,) -> Result<Duration, Error,>
{
    let duration = humantime::parse_duration(raw.trim(),)
        .map_err(|e| Error::validation(format!("{field} '{raw}' is not a valid duration: {e}"),),)?;
    if duration.is_zero() {
        return Err(Error::validation(format!("{field} must be greater than zero"),),);
    }
    Ok(duration,)
}

/// Builds `{api_server}/repos/{organization}/{repository}`.
fn repository_base(api_server: &Url, organization: &str, repository: &str,) -> Result<Url, Error,>
{
    let mut url = api_server.clone();
    url.path_segments_mut()
        .map_err(|_| Error::validation(format!("apiServer '{api_server}' cannot be a base URL"),),)?
        .pop_if_empty()
        .extend(["repos", organization, repository,],);
    Ok(url,)
}

/// Validates identifier-like fields such as organizations or repositories.
///
/// # Errors
///
/// Returns [`Error::Validation`] when the value is empty or contains
/// whitespace.
fn normalize_identifier(input: &str, field: &str,) -> Result<String, Error,>
{
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty"),),);
    }
    if trimmed.chars().any(char::is_whitespace,) {
        return Err(Error::validation(format!("{field} cannot contain whitespace"),),);
    }
    Ok(trimmed.to_owned(),)
}
