//! Transport mode selection and the single-shot HTTP exchange.
//!
//! Certificate handling is mode-selected at client construction: validate
//! against a supplied trust bundle (default), skip validation entirely
//! (explicit insecure mode), or use unencrypted HTTP (explicit plaintext
//! mode). Exactly one mode is active per client instance.
//!
//! Flow overview:
//! - Parse the configured trust marker into a `TlsMode`.
//! - Build an `ApiClient` once; it owns the HTTP client, signature version,
//!   and timeout.
//! - `call` signs and performs one request; `json_api_call` additionally
//!   decodes the response envelope.

use crate::api::{Error, Params, SignatureVersion, response, sign};
use bytes::Bytes;
use chrono::Utc;
use reqwest::{
    Certificate, Method, Proxy, StatusCode,
    header::{self, HeaderMap, HeaderName, HeaderValue},
};
use secrecy::SecretString;
use serde_json::Value;
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;
use url::Url;

/// Certificate-handling mode, parsed from the trust-bundle setting.
///
/// The literal markers `HTTP` and `DISABLE` select plaintext and
/// no-validation modes; anything else is a path to a PEM trust bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TlsMode {
    Pinned { bundle: PathBuf },
    Insecure,
    Plaintext,
}

impl TlsMode {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "HTTP" => Self::Plaintext,
            "DISABLE" => Self::Insecure,
            path => Self::Pinned {
                bundle: PathBuf::from(path),
            },
        }
    }

    fn scheme(&self) -> &'static str {
        match self {
            Self::Plaintext => "http",
            Self::Pinned { .. } | Self::Insecure => "https",
        }
    }

    fn default_port(&self) -> u16 {
        match self {
            Self::Plaintext => 80,
            Self::Pinned { .. } | Self::Insecure => 443,
        }
    }
}

/// CONNECT proxy for API calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub host: String,
    pub port: u16,
    pub headers: Vec<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub ikey: String,
    pub skey: SecretString,
    pub host: String,
    pub port: Option<u16>,
    pub tls: TlsMode,
    pub sig_version: SignatureVersion,
    pub proxy: Option<ProxyConfig>,
    pub timeout: Duration,
    pub user_agent: String,
}

/// One HTTP status/reason/body triple, produced once per call.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub reason: String,
    pub body: Bytes,
}

pub struct ApiClient {
    ikey: String,
    skey: SecretString,
    host: String,
    port: u16,
    tls: TlsMode,
    sig_version: SignatureVersion,
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client from the parsed settings.
    ///
    /// # Errors
    /// Returns `Error::Config` if the trust bundle cannot be read or parsed,
    /// the proxy settings are invalid, or the HTTP client cannot be
    /// constructed.
    pub fn from_settings(settings: ClientSettings) -> Result<Self, Error> {
        let mut builder = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            // One connection per call: nothing is kept alive between calls.
            .pool_max_idle_per_host(0);

        match &settings.tls {
            TlsMode::Pinned { bundle } => {
                let pem = fs::read(bundle).map_err(|e| {
                    Error::Config(format!("cannot read trust bundle {}: {e}", bundle.display()))
                })?;
                let certs = Certificate::from_pem_bundle(&pem).map_err(|e| {
                    Error::Config(format!(
                        "cannot parse trust bundle {}: {e}",
                        bundle.display()
                    ))
                })?;
                builder = builder.tls_built_in_root_certs(false);
                for cert in certs {
                    builder = builder.add_root_certificate(cert);
                }
            }
            TlsMode::Insecure => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            TlsMode::Plaintext => {}
        }

        if let Some(proxy) = &settings.proxy {
            builder = builder.proxy(build_proxy(proxy)?);
        }

        let http = builder
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            ikey: settings.ikey,
            skey: settings.skey,
            host: settings.host,
            port: settings.port.unwrap_or_else(|| settings.tls.default_port()),
            tls: settings.tls,
            sig_version: settings.sig_version,
            http,
        })
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Absolute URL for an API path.
    ///
    /// # Errors
    /// Returns `Error::Config` if the path does not start with `/` or the
    /// resulting URL does not parse.
    pub fn endpoint_url(&self, path: &str) -> Result<Url, Error> {
        if !path.starts_with('/') {
            return Err(Error::Config(format!("API path must start with /: {path}")));
        }
        let raw = format!("{}://{}:{}{}", self.tls.scheme(), self.host, self.port, path);
        Url::parse(&raw).map_err(|e| Error::Config(format!("invalid endpoint URL {raw}: {e}")))
    }

    /// Sign and perform one API exchange.
    ///
    /// POST/PUT requests carry the parameters as a form-encoded body; other
    /// methods append them to the URI as a query string.
    ///
    /// # Errors
    /// Returns `Error::Transport` on connection, TLS validation, or timeout
    /// failure.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        params: &Params,
    ) -> Result<ApiResponse, Error> {
        let date = Utc::now().to_rfc2822();
        let authorization = sign::sign(
            &self.ikey,
            &self.skey,
            method.as_str(),
            &self.host,
            path,
            &date,
            self.sig_version,
            params,
        )?;

        let url = self.endpoint_url(path)?;
        debug!("api request: {} {}", method, url);

        let has_body = method == Method::POST || method == Method::PUT;
        let mut request = self
            .http
            .request(method, url.clone())
            .header(header::AUTHORIZATION, authorization)
            .header(header::DATE, date)
            .header(header::HOST, self.host.as_str());

        request = if has_body {
            request.form(params.pairs())
        } else {
            request.query(params.pairs())
        };

        let response = request.send().await.map_err(|e| Error::Transport {
            url: url.to_string(),
            source: e,
        })?;

        let status = response.status();
        let reason = status.canonical_reason().unwrap_or_default().to_string();
        let body = response.bytes().await.map_err(|e| Error::Transport {
            url: url.to_string(),
            source: e,
        })?;

        Ok(ApiResponse {
            status,
            reason,
            body,
        })
    }

    /// Call an API method expected to return the JSON success envelope.
    ///
    /// # Errors
    /// Returns `Error::Transport` on exchange failure and `Error::Protocol`
    /// on a non-200 status or a malformed envelope.
    pub async fn json_api_call(
        &self,
        method: Method,
        path: &str,
        params: &Params,
    ) -> Result<Value, Error> {
        let api_response = self.call(method, path, params).await?;
        response::parse_response(&api_response)
    }
}

fn build_proxy(config: &ProxyConfig) -> Result<Proxy, Error> {
    let proxy_url = format!("http://{}:{}", config.host, config.port);
    let mut proxy = Proxy::all(&proxy_url)
        .map_err(|e| Error::Config(format!("invalid proxy {proxy_url}: {e}")))?;

    if !config.headers.is_empty() {
        let mut map = HeaderMap::with_capacity(config.headers.len());
        for (key, value) in &config.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::Config(format!("invalid proxy header name {key}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("invalid proxy header value for {key}: {e}")))?;
            map.insert(name, value);
        }
        proxy = proxy.headers(map);
    }

    Ok(proxy)
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("ikey", &self.ikey)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("sig_version", &self.sig_version)
            .finish_non_exhaustive()
    }
}
