//! Session login and authenticated request construction

use crate::crawler::fetcher::Fetcher;
use crate::http::markers::{csrf_form_token, csrf_token, find_between, session_id};
use crate::http::{RawResponse, Request};
use crate::{CrawlerError, Result};
use ::url::form_urlencoded;

/// How many times the whole handshake is attempted before giving up
const LOGIN_ATTEMPTS: u32 = 2;

/// Where the site sends a user after login when the path names no `next`
const DEFAULT_NEXT: &str = "/fakebook/";

/// Authenticated cookie pair attached to every request after login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionCredentials {
    pub session_id: String,
    pub csrf_token: String,
}

impl SessionCredentials {
    /// Value for the `Cookie` header
    pub fn cookie_header(&self) -> String {
        format!("csrftoken={}; sessionid={}", self.csrf_token, self.session_id)
    }
}

/// A logged-in session against one host
///
/// Read-only after login, so workers share it freely.
#[derive(Debug, Clone)]
pub struct Session {
    host: String,
    credentials: SessionCredentials,
}

impl Session {
    pub fn new(host: impl Into<String>, credentials: SessionCredentials) -> Self {
        Self {
            host: host.into(),
            credentials,
        }
    }

    /// Performs the login handshake, retrying it once
    ///
    /// # Handshake
    ///
    /// 1. GET the login page for the anonymous cookies and the form token
    /// 2. POST the credentials as form data with those cookies attached
    /// 3. Read the authenticated `sessionid`/`csrftoken` pair from the reply
    ///
    /// # Returns
    ///
    /// * `Ok(Session)` - Authenticated
    /// * `Err(CrawlerError::Login)` - Both attempts came back without the
    ///   cookies; the crawl cannot proceed
    /// * `Err(CrawlerError)` - The transport failed
    pub async fn login(
        fetcher: &Fetcher,
        host: &str,
        login_path: &str,
        username: &str,
        password: &str,
    ) -> Result<Session> {
        let mut last_reason = String::new();

        for attempt in 1..=LOGIN_ATTEMPTS {
            match attempt_login(fetcher, host, login_path, username, password).await {
                Ok(credentials) => {
                    tracing::info!("Logged in as {}", username);
                    return Ok(Session::new(host, credentials));
                }
                Err(CrawlerError::Login(reason)) => {
                    tracing::warn!("Login attempt {}/{} failed: {}", attempt, LOGIN_ATTEMPTS, reason);
                    last_reason = reason;
                }
                Err(e) => return Err(e),
            }
        }

        Err(CrawlerError::Login(last_reason))
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn credentials(&self) -> &SessionCredentials {
        &self.credentials
    }

    /// Authenticated GET for `path`
    pub fn get(&self, path: &str) -> Request {
        base_get(&self.host, path).header("Cookie", self.credentials.cookie_header())
    }
}

/// Unauthenticated GET carrying the headers every request sends
pub fn base_get(host: &str, path: &str) -> Request {
    Request::get(path)
        .header("Host", host)
        .header("Connection", "close")
        .header("Accept-Encoding", "gzip")
}

async fn attempt_login(
    fetcher: &Fetcher,
    host: &str,
    login_path: &str,
    username: &str,
    password: &str,
) -> Result<SessionCredentials> {
    let page = fetcher.fetch_raw(&base_get(host, login_path)).await?;

    let anonymous_csrf = csrf_token(page.head())
        .ok_or_else(|| CrawlerError::Login("login page set no csrftoken cookie".to_string()))?;
    let form_token = csrf_form_token(page.body()).unwrap_or(anonymous_csrf);

    let mut cookie = format!("csrftoken={}", anonymous_csrf);
    if let Some(anonymous_session) = session_id(page.head()) {
        cookie.push_str(&format!("; sessionid={}", anonymous_session));
    }

    let next = find_between(login_path, "next=", "&").unwrap_or(DEFAULT_NEXT);
    let body = form_urlencoded::Serializer::new(String::new())
        .append_pair("username", username)
        .append_pair("password", password)
        .append_pair("csrfmiddlewaretoken", form_token)
        .append_pair("next", next)
        .finish();

    let request = Request::post(login_path, body)
        .header("Host", host)
        .header("Connection", "close")
        .header("Accept-Encoding", "gzip")
        .header("Content-Type", "application/x-www-form-urlencoded")
        .header("Cookie", cookie);

    let reply = fetcher.fetch_raw(&request).await?;
    tracing::debug!("Login POST answered {}", reply.status());
    credentials_from(&reply)
}

fn credentials_from(reply: &RawResponse) -> Result<SessionCredentials> {
    let session_id = session_id(reply.head());
    let csrf_token = csrf_token(reply.head());

    match (session_id, csrf_token) {
        (Some(session_id), Some(csrf_token)) => Ok(SessionCredentials {
            session_id: session_id.to_string(),
            csrf_token: csrf_token.to_string(),
        }),
        _ => Err(CrawlerError::Login(format!(
            "login reply ({}) did not set both sessionid and csrftoken",
            reply.status()
        ))),
    }
}
