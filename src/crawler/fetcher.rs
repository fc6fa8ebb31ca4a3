//! Response interpretation and status-driven fetching
//!
//! This module handles:
//! - Classifying a framed response by status code
//! - Following redirects by swapping the request path
//! - Resending on `503 Service Unavailable`
//! - Suppressing `403`/`404` as "nothing here"
//!
//! # Status Handling
//!
//! | Status | Disposition |
//! |--------|-------------|
//! | 200 | Accept: return the HTML document |
//! | 302 | Redirect: resend with the `Location` path |
//! | 403, 404 | Suppress: no document, no error |
//! | 503 | Retry: resend the identical request |
//! | other | Unexpected: logged, document passed through |
//!
//! Login responses skip this table entirely; the session reads their
//! cookies directly.

use crate::config::CrawlerConfig;
use crate::http::{RawResponse, Request, Transport};
use crate::url::path_and_query;
use crate::{CrawlerError, Result};
use ::url::Url;
use std::sync::Arc;

/// Which flow a response belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Ordinary page fetch, subject to status handling
    Page,

    /// Login handshake; the raw response is returned untouched
    Login,
}

/// What to do with a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Use the response's document
    Accept,

    /// Send this request next (same request, new path)
    Redirect(Request),

    /// Treat the resource as absent
    Suppress,

    /// Send the identical request again
    Retry,

    /// A status outside the handled set; the document is used as-is
    Unexpected(u16),
}

/// Classifies a response to `request`
///
/// # Returns
///
/// * `Ok(Disposition)` - How the caller should proceed
/// * `Err(CrawlerError::MissingLocation)` - A redirect named no target
///
/// # Example
///
/// ```
/// use fakebook_crawler::crawler::{classify, Disposition, Flow};
/// use fakebook_crawler::http::{RawResponse, Request};
///
/// let request = Request::get("/old/").header("Host", "example.com");
/// let response = RawResponse::parse("HTTP/1.1 302 Found\r\nLocation: /new/\r\n\r\n");
///
/// let disposition = classify(&response, &request, Flow::Page).unwrap();
/// assert_eq!(disposition, Disposition::Redirect(request.with_path("/new/")));
/// ```
pub fn classify(response: &RawResponse, request: &Request, flow: Flow) -> Result<Disposition> {
    if flow == Flow::Login {
        return Ok(Disposition::Accept);
    }

    let disposition = match response.status() {
        200 => Disposition::Accept,
        302 => {
            let location = response
                .header("location")
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .ok_or_else(|| CrawlerError::MissingLocation {
                    path: request.path().to_string(),
                })?;
            Disposition::Redirect(request.with_path(redirect_path(location)))
        }
        403 | 404 => Disposition::Suppress,
        503 => Disposition::Retry,
        other => Disposition::Unexpected(other),
    };

    Ok(disposition)
}

/// Reduces an absolute `Location` to the path used in the request line
fn redirect_path(location: &str) -> String {
    if location.starts_with("http://") || location.starts_with("https://") {
        if let Ok(url) = Url::parse(location) {
            return path_and_query(&url);
        }
    }
    location.to_string()
}

/// Sends requests and applies the status table until a final answer
///
/// Cloning is cheap; every worker holds its own copy over one shared
/// transport.
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    max_redirects: u32,
    max_unavailable_retries: u32,
}

impl Fetcher {
    /// Creates a fetcher
    ///
    /// # Arguments
    ///
    /// * `transport` - Where requests are sent
    /// * `max_redirects` - Redirects followed per fetch (0 = unlimited)
    /// * `max_unavailable_retries` - `503` resends per fetch (0 = unlimited)
    pub fn new(transport: Arc<dyn Transport>, max_redirects: u32, max_unavailable_retries: u32) -> Self {
        Self {
            transport,
            max_redirects,
            max_unavailable_retries,
        }
    }

    pub fn from_config(transport: Arc<dyn Transport>, config: &CrawlerConfig) -> Self {
        Self::new(transport, config.max_redirects, config.max_unavailable_retries)
    }

    /// Fetches a page document
    ///
    /// # Returns
    ///
    /// * `Ok(Some(document))` - The page (after any redirects and retries)
    /// * `Ok(None)` - The server answered `403` or `404`
    /// * `Err(CrawlerError)` - Transport failure, missing redirect target, or
    ///   a configured cap was exceeded
    pub async fn fetch(&self, request: &Request) -> Result<Option<String>> {
        let mut current = request.clone();
        let mut redirects: u32 = 0;
        let mut retries: u32 = 0;

        loop {
            let response = self.transport.send(&current).await?;
            tracing::trace!("{} -> {}", current, response.status());

            match classify(&response, &current, Flow::Page)? {
                Disposition::Accept => return Ok(Some(response.document().to_string())),
                Disposition::Unexpected(status) => {
                    tracing::warn!("Unexpected status {} for {}; using response as-is", status, current);
                    return Ok(Some(response.document().to_string()));
                }
                Disposition::Suppress => {
                    tracing::debug!("{} suppressed ({})", current, response.status());
                    return Ok(None);
                }
                Disposition::Redirect(next) => {
                    redirects += 1;
                    if self.max_redirects > 0 && redirects > self.max_redirects {
                        return Err(CrawlerError::RedirectLimit {
                            path: request.path().to_string(),
                        });
                    }
                    tracing::debug!("{} redirected to {}", current.path(), next.path());
                    current = next;
                }
                Disposition::Retry => {
                    retries += 1;
                    if self.max_unavailable_retries > 0 && retries > self.max_unavailable_retries {
                        return Err(CrawlerError::RetryLimit {
                            path: current.path().to_string(),
                            attempts: retries,
                        });
                    }
                    tracing::trace!("{} unavailable, retry {}", current, retries);
                }
            }
        }
    }

    /// Sends a login-flow request and returns the unprocessed response
    pub async fn fetch_raw(&self, request: &Request) -> Result<RawResponse> {
        let response = self.transport.send(request).await?;
        tracing::trace!("{} -> {} (login flow)", request, response.status());
        Ok(response)
    }
}
