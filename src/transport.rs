// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Hosting API access used by the branch walker and the commit fetcher.
///
/// [`HostingApi`] is the seam between the collection engine and the network.
/// [`GitHubClient`] implements it on top of octocrab's raw request API so the
/// engine can read pagination headers and status codes itself.
use std::time::Duration;

use async_trait::async_trait;
use http::{
    HeaderMap, HeaderValue, Uri,
    header::{ACCEPT, AUTHORIZATION, LINK},
};
use octocrab::{Octocrab, service::middleware::retry::RetryConfig};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::{config::Token, error::Error};

/// Media type requesting the v3 REST API.
pub const GITHUB_V3_MEDIA_TYPE: &str = "application/vnd.github.v3+json";

/// Raw response returned by a [`HostingApi`] request.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ApiResponse
{
    /// HTTP status code.
    pub status: u16,
    /// Raw `Link` header, when present.
    pub link:   Option<String,>,
    /// Response body.
    pub body:   String,
}

impl ApiResponse
{
    /// Builds a successful response carrying the given body.
    pub fn ok(body: impl Into<String,>,) -> Self
    {
        Self {
            status: 200, link: None, body: body.into(),
        }
    }

    /// Attaches a `Link` header to the response.
    pub fn with_link(mut self, link: impl Into<String,>,) -> Self
    {
        self.link = Some(link.into(),);
        self
    }

    /// Turns a non-2xx status into [`Error::HttpStatus`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::HttpStatus`] carrying the status and request URL.
    pub fn ensure_success(self, url: &Url,) -> Result<Self, Error,>
    {
        if (200..300).contains(&self.status,) {
            return Ok(self,);
        }
        Err(Error::HttpStatus {
            url: url.to_string(), status: self.status,
        },)
    }

    /// Decodes the body as a JSON array according to `policy`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decode`] only under [`DecodePolicy::Strict`].
    pub fn decode_list<T,>(&self, policy: DecodePolicy, url: &Url,) -> Result<Vec<T,>, Error,>
    where
        T: DeserializeOwned,
    {
        match serde_json::from_str::<Vec<T,>,>(&self.body,) {
            Ok(items,) => Ok(items,),
            Err(source,) => match policy {
                DecodePolicy::Strict => Err(Error::from(source,),),
                DecodePolicy::Lenient => {
                    warn!("ignoring undecodable response body from {url}: {source}");
                    Ok(Vec::new(),)
                }
            },
        }
    }
}

/// Treatment of response bodies that fail to decode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq,)]
pub enum DecodePolicy
{
    /// Log the failure and continue with an empty list.
    #[default]
    Lenient,
    /// Abort the walk with [`Error::Decode`].
    Strict,
}

impl DecodePolicy
{
    /// Maps the `strictDecode` configuration flag onto a policy.
    pub fn from_strict_flag(strict: bool,) -> Self
    {
        if strict { Self::Strict } else { Self::Lenient }
    }
}

/// Read-only access to a hosting API.
#[async_trait]
pub trait HostingApi: Send + Sync
{
    /// Issues a `GET` request for an absolute URL.
    ///
    /// Implementations return non-2xx responses as values; callers decide how
    /// to treat them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestBuild`] when the request cannot be constructed
    /// and [`Error::Transport`] on network failures.
    async fn get(&self, url: &Url,) -> Result<ApiResponse, Error,>;
}

/// GitHub REST client authenticated with a legacy `token` credential.
#[derive(Clone,)]
pub struct GitHubClient
{
    octocrab: Octocrab,
    headers:  HeaderMap,
    timeout:  Option<Duration,>,
}

impl GitHubClient
{
    /// Creates a client for `api_server` sending `token` with every request.
    ///
    /// Must be called from within a tokio runtime. Octocrab's retry layer is
    /// disabled: every call sends exactly one request, and `timeout` bounds
    /// both the response head and the body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RequestBuild`] when the server URL or the token cannot
    /// be used to build requests.
    pub fn new(api_server: &Url, token: &Token, timeout: Option<Duration,>,) -> Result<Self, Error,>
    {
        let octocrab = Octocrab::builder()
            .add_retry_config(RetryConfig::None,)
            .base_uri(api_server.as_str(),)
            .map_err(|e| Error::request_build(format!("invalid API server {api_server}: {e}"),),)?
            .build()
            .map_err(|e| Error::request_build(format!("failed to initialize GitHub client: {e}"),),)?;

        let mut authorization = HeaderValue::from_str(&format!("token {}", token.expose()),)
            .map_err(|_| Error::request_build("token contains characters invalid in a header",),)?;
        authorization.set_sensitive(true,);

        let mut headers = HeaderMap::with_capacity(2,);
        headers.insert(AUTHORIZATION, authorization,);
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_V3_MEDIA_TYPE,),);

        Ok(Self {
            octocrab,
            headers,
            timeout,
        },)
    }
}

#[async_trait]
impl HostingApi for GitHubClient
{
    async fn get(&self, url: &Url,) -> Result<ApiResponse, Error,>
    {
        let uri: Uri = url
            .as_str()
            .parse()
            .map_err(|e| Error::request_build(format!("invalid request URL {url}: {e}"),),)?;

        debug!("GET {url}");
        let exchange = async {
            let response = self
                .octocrab
                ._get_with_headers(uri, Some(self.headers.clone(),),)
                .await
                .map_err(|e| Error::transport(url.as_str(), e.to_string(),),)?;

            let status = response.status().as_u16();
            let link = response
                .headers()
                .get(LINK,)
                .and_then(|value| value.to_str().ok(),)
                .map(str::to_owned,);

            let body = self
                .octocrab
                .body_to_string(response,)
                .await
                .map_err(|e| Error::transport(url.as_str(), format!("failed to read body: {e}"),),)?;

            Ok::<_, Error,>(ApiResponse {
                status,
                link,
                body,
            },)
        };

        match self.timeout {
            Some(limit,) => tokio::time::timeout(limit, exchange,).await.map_err(|_| {
                Error::transport(
                    url.as_str(),
                    format!("timed out after {}", humantime::format_duration(limit)),
                )
            },)?,
            None => exchange.await,
        }
    }
}
