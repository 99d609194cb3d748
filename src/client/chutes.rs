use futures::TryStreamExt;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Url};
use std::sync::Arc;
use tracing::{info, warn};

use crate::client::BrowserProfile;
use crate::config::UpstreamConfig;
use crate::error::{ProxyError, Result};
use crate::models::chutes::ChutesRequest;
use crate::provider::{Upstream, UpstreamFuture, UpstreamResponse};
use crate::state::redact;

/// Cookie that carries the bot-challenge clearance
pub const CLEARANCE_COOKIE: &str = "cf_clearance";

/// HTTP access to the Chutes chat backend
///
/// Every call builds a new `reqwest::Client` so each attempt starts with a clean
/// cookie jar holding nothing but the clearance it was given.
pub struct ChutesClient {
    base_url: Url,
    chat_url: Url,
    profile: BrowserProfile,
    config: UpstreamConfig,
    auth_token: Option<String>,
}

impl ChutesClient {
    pub fn new(config: UpstreamConfig, auth_token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| {
            ProxyError::ConfigError(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;
        let chat_url = base_url.join(&config.chat_path).map_err(|e| {
            ProxyError::ConfigError(format!("Invalid chat path {}: {}", config.chat_path, e))
        })?;

        Ok(Self {
            base_url,
            chat_url,
            profile: config.profile,
            config,
            auth_token,
        })
    }

    pub fn chat_url(&self) -> &Url {
        &self.chat_url
    }

    fn origin(&self) -> String {
        self.base_url.as_str().trim_end_matches('/').to_string()
    }

    /// `Authorization` value presented upstream for a given clearance
    ///
    /// Returns `None` when there is neither a clearance nor an auth token.
    pub fn authorization(&self, clearance: Option<&str>) -> Option<String> {
        match (self.auth_token.as_deref(), clearance) {
            (Some(token), Some(cf)) => Some(format!("Bearer {}|||{}", token, cf)),
            (None, Some(cf)) => Some(format!("Bearer {}", cf)),
            (Some(token), None) => Some(format!("Bearer {}", token)),
            (None, None) => None,
        }
    }

    fn build(&self, headers: HeaderMap, jar: Arc<Jar>) -> Result<Client> {
        Client::builder()
            .default_headers(headers)
            .cookie_provider(jar)
            .connect_timeout(self.config.connect_timeout())
            .build()
            .map_err(|e| ProxyError::InternalError(format!("Failed to create HTTP client: {}", e)))
    }

    /// Build a client for the chat endpoint
    ///
    /// With a clearance, the jar is seeded with the clearance cookie and the
    /// Authorization header carries it too; without one, neither is sent.
    pub fn create_client(&self, clearance: Option<&str>) -> Result<Client> {
        let mut headers = self.profile.headers(&self.origin())?;
        let jar = Arc::new(Jar::default());

        if let Some(cf) = clearance {
            jar.add_cookie_str(&format!("{}={}", CLEARANCE_COOKIE, cf), &self.base_url);
            if let Some(auth) = self.authorization(Some(cf)) {
                headers.insert(AUTHORIZATION, header_value(&auth)?);
            }
        }

        self.build(headers, jar)
    }

    /// Ask the landing page for a fresh clearance
    ///
    /// The request presents the current (possibly just rejected) clearance in
    /// its Authorization header but starts with an empty cookie jar.
    pub async fn refresh_clearance(&self, clearance: Option<&str>) -> Option<String> {
        let jar = Arc::new(Jar::default());
        let mut headers = match self.profile.headers(&self.origin()) {
            Ok(headers) => headers,
            Err(e) => {
                warn!(error = %e, "Failed to build refresh headers");
                return None;
            }
        };
        if let Some(auth) = self.authorization(clearance) {
            match header_value(&auth) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(e) => {
                    warn!(error = %e, "Failed to build refresh authorization");
                    return None;
                }
            }
        }

        let client = match self.build(headers, jar.clone()) {
            Ok(client) => client,
            Err(e) => {
                warn!(error = %e, "Failed to create refresh client");
                return None;
            }
        };

        info!(url = %self.base_url, "Requesting new clearance");
        if let Err(e) = client.get(self.base_url.clone()).send().await {
            warn!(error = %e, "Clearance refresh request failed");
            return None;
        }

        match clearance_from_jar(&jar, &self.base_url) {
            Some(cf) => {
                info!(clearance = %redact(&cf), "Obtained new clearance");
                Some(cf)
            }
            None => {
                warn!("Landing page did not issue a clearance cookie");
                None
            }
        }
    }

    async fn post_chat_impl(
        &self,
        request: &ChutesRequest,
        clearance: Option<&str>,
    ) -> Result<UpstreamResponse> {
        let client = self.create_client(clearance)?;
        let body = serde_json::to_vec(request)?;

        info!(
            url = %self.chat_url,
            bytes = body.len(),
            chute = %request.chute_name,
            has_clearance = clearance.is_some(),
            "Chutes: Sending chat request"
        );

        let response = client
            .post(self.chat_url.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| ProxyError::UpstreamError(format!("Chutes request failed: {}", e)))?;

        let status = response.status();
        info!(status = %status, "Chutes responded");

        let body = response.bytes_stream().map_err(std::io::Error::other);
        Ok(UpstreamResponse::new(status, Box::pin(body)))
    }
}

impl Upstream for ChutesClient {
    fn post_chat<'a>(
        &'a self,
        request: &'a ChutesRequest,
        clearance: Option<&'a str>,
    ) -> UpstreamFuture<'a, Result<UpstreamResponse>> {
        Box::pin(self.post_chat_impl(request, clearance))
    }

    fn fetch_clearance<'a>(
        &'a self,
        clearance: Option<&'a str>,
    ) -> UpstreamFuture<'a, Option<String>> {
        Box::pin(self.refresh_clearance(clearance))
    }

    fn supports_refresh(&self) -> bool {
        self.profile.supports_refresh()
    }

    fn name(&self) -> &str {
        "Chutes"
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ProxyError::InternalError(format!("Invalid header value: {}", e)))
}

/// Pull the clearance cookie out of a jar for `url`
pub fn clearance_from_jar(jar: &Jar, url: &Url) -> Option<String> {
    let header = jar.cookies(url)?;
    let cookies = header.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == CLEARANCE_COOKIE && !value.is_empty()).then(|| value.to_string())
    })
}
