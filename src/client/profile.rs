use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE, HeaderMap, HeaderName,
    HeaderValue, ORIGIN, PRAGMA, REFERER, USER_AGENT,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{ProxyError, Result};

/// Browser impersonation preset used for every upstream request
///
/// Each preset fixes the header fingerprint presented to the backend and whether
/// a rejected clearance may be refreshed through the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BrowserProfile {
    /// Edge 122 on Windows; streams `text/event-stream` and refreshes clearance
    #[default]
    EdgeWindows,
    /// Chrome 121 on Linux; plain-text body, no dynamic refresh
    ChromeLinux,
}

impl BrowserProfile {
    pub fn name(self) -> &'static str {
        match self {
            BrowserProfile::EdgeWindows => "edge-windows",
            BrowserProfile::ChromeLinux => "chrome-linux",
        }
    }

    pub fn supports_refresh(self) -> bool {
        matches!(self, BrowserProfile::EdgeWindows)
    }

    fn user_agent(self) -> &'static str {
        match self {
            BrowserProfile::EdgeWindows => {
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36 Edg/122.0.0.0"
            }
            BrowserProfile::ChromeLinux => {
                "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36"
            }
        }
    }

    fn client_hints(self) -> (&'static str, &'static str) {
        match self {
            BrowserProfile::EdgeWindows => (
                r#""Chromium";v="122", "Not(A:Brand";v="24", "Microsoft Edge";v="122""#,
                r#""Windows""#,
            ),
            BrowserProfile::ChromeLinux => (
                r#""Not A(Brand";v="99", "Google Chrome";v="121", "Chromium";v="121""#,
                r#""Linux""#,
            ),
        }
    }

    /// Build the default header set for a client targeting `origin`
    ///
    /// `origin` is the backend base URL without a trailing slash.
    pub fn headers(self, origin: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let (sec_ch_ua, platform) = self.client_hints();

        match self {
            BrowserProfile::EdgeWindows => {
                headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
                headers.insert(
                    ACCEPT_ENCODING,
                    HeaderValue::from_static("gzip, deflate, br"),
                );
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                headers.insert(
                    HeaderName::from_static("x-requested-with"),
                    HeaderValue::from_static("XMLHttpRequest"),
                );
            }
            BrowserProfile::ChromeLinux => {
                headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
                headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("text/plain;charset=UTF-8"),
                );
            }
        }

        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
        headers.insert(ORIGIN, header_value(origin)?);
        headers.insert(REFERER, header_value(&format!("{}/", origin))?);
        headers.insert(
            HeaderName::from_static("sec-ch-ua"),
            HeaderValue::from_static(sec_ch_ua),
        );
        headers.insert(
            HeaderName::from_static("sec-ch-ua-mobile"),
            HeaderValue::from_static("?0"),
        );
        headers.insert(
            HeaderName::from_static("sec-ch-ua-platform"),
            HeaderValue::from_static(platform),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-dest"),
            HeaderValue::from_static("empty"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-mode"),
            HeaderValue::from_static("cors"),
        );
        headers.insert(
            HeaderName::from_static("sec-fetch-site"),
            HeaderValue::from_static("same-origin"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(self.user_agent()));

        Ok(headers)
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| ProxyError::ConfigError(format!("Invalid header value {}: {}", value, e)))
}

impl fmt::Display for BrowserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BrowserProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "edge-windows" => Ok(BrowserProfile::EdgeWindows),
            "chrome-linux" => Ok(BrowserProfile::ChromeLinux),
            other => Err(format!(
                "unknown profile '{}', expected edge-windows or chrome-linux",
                other
            )),
        }
    }
}
