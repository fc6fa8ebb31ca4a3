//! Integration tests for the crawler
//!
//! These tests drive full crawls (login, seeding, worker pool) against an
//! in-memory Fakebook site implemented as a `Transport`, so every request
//! the crawler sends can be counted and failures injected on demand.

use async_trait::async_trait;
use fakebook_crawler::config::Config;
use fakebook_crawler::crawler::{Coordinator, CrawlOutcome};
use fakebook_crawler::http::{Method, RawResponse, Request, Transport, TransportError};
use fakebook_crawler::CrawlerError;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const USERNAME: &str = "alice";
const PASSWORD: &str = "hunter2";

/// In-memory Fakebook server
#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, String>,
    hits: Mutex<HashMap<String, usize>>,
    fail_once: Mutex<HashSet<String>>,
    hang_on: HashSet<String>,
    unavailable: HashSet<String>,
}

impl FakeSite {
    fn new() -> Self {
        Self::default()
    }

    fn page(mut self, path: &str, body: impl Into<String>) -> Self {
        self.pages.insert(
            path.to_string(),
            format!("<html><body>{}</body></html>", body.into()),
        );
        self
    }

    fn fail_once(self, path: &str) -> Self {
        self.fail_once.lock().unwrap().insert(path.to_string());
        self
    }

    fn hang_on(mut self, path: &str) -> Self {
        self.hang_on.insert(path.to_string());
        self
    }

    /// Answers `503` on `path` forever, after a short think
    fn unavailable(mut self, path: &str) -> Self {
        self.unavailable.insert(path.to_string());
        self
    }

    fn hits(&self, path: &str) -> usize {
        self.hits.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    fn login(&self, request: &Request) -> RawResponse {
        match request.method() {
            Method::Get => RawResponse::new(
                "HTTP/1.1 200 OK\r\n\
                 Set-Cookie: csrftoken=anon_csrf; Path=/\r\n\
                 Set-Cookie: sessionid=anon_sid; Path=/",
                "<html><form><input type=\"hidden\" name=\"csrfmiddlewaretoken\" value=\"form_tok\"></form></html>",
            ),
            Method::Post => {
                let expected = format!("username={}&password={}&", USERNAME, PASSWORD);
                let body = request.body().unwrap_or_default();
                if body.starts_with(&expected) && body.contains("csrfmiddlewaretoken=form_tok") {
                    RawResponse::new(
                        "HTTP/1.1 302 Found\r\n\
                         Location: /fakebook/\r\n\
                         Set-Cookie: csrftoken=auth_csrf; Path=/\r\n\
                         Set-Cookie: sessionid=auth_sid; Path=/",
                        "",
                    )
                } else {
                    RawResponse::new(
                        "HTTP/1.1 200 OK",
                        "<html>Please enter a correct username and password.</html>",
                    )
                }
            }
        }
    }
}

#[async_trait]
impl Transport for FakeSite {
    async fn send(&self, request: &Request) -> Result<RawResponse, TransportError> {
        let path = request.path().to_string();
        *self.hits.lock().unwrap().entry(path.clone()).or_insert(0) += 1;

        if self.fail_once.lock().unwrap().remove(&path) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            )));
        }

        if self.hang_on.contains(&path) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }

        if self.unavailable.contains(&path) {
            tokio::time::sleep(Duration::from_millis(10)).await;
            return Ok(RawResponse::new("HTTP/1.1 503 Service Unavailable", ""));
        }

        if path.starts_with("/accounts/login/") {
            return Ok(self.login(request));
        }

        let authenticated = request
            .header_value("Cookie")
            .is_some_and(|c| c.contains("sessionid=auth_sid") && c.contains("csrftoken=auth_csrf"));
        if !authenticated {
            return Ok(RawResponse::new(
                "HTTP/1.1 302 Found\r\nLocation: /accounts/login/?next=/fakebook/",
                "",
            ));
        }

        Ok(match self.pages.get(&path) {
            Some(body) => RawResponse::new("HTTP/1.1 200 OK", body),
            None => RawResponse::new("HTTP/1.1 404 Not Found", ""),
        })
    }
}

fn profile_links(users: &[u32]) -> String {
    users
        .iter()
        .map(|u| format!("<li><a href=\"/fakebook/{}/\">User {}</a></li>", u, u))
        .collect()
}

fn flag(value: &str) -> String {
    format!("<h2 class='secret_flag' style=\"color:red\">FLAG: {}</h2>", value)
}

fn test_config(workers: usize) -> Config {
    let mut config = Config::default();
    config.server.host = "fakebook.test".to_string();
    config.crawler.workers = workers;
    config
}

/// Twenty users in a ring, each friends with the next two; five carry flags
fn ring_site() -> FakeSite {
    let mut site = FakeSite::new().page("/fakebook/", profile_links(&[1]));
    for user in 1..=20u32 {
        let home = if user % 4 == 0 {
            flag(&format!("FLAG{:02}", user))
        } else {
            format!("<p>Welcome to user {}</p>", user)
        };
        let next = [user % 20 + 1, (user + 1) % 20 + 1];
        site = site
            .page(&format!("/fakebook/{}/", user), home)
            .page(
                &format!("/fakebook/{}/friends/1/", user),
                format!("{}<p>Page 1 of 1\n</p>", profile_links(&next)),
            );
    }
    site
}

#[tokio::test]
async fn test_crawl_finds_all_flags() {
    let site = Arc::new(ring_site());

    let report = Coordinator::new(test_config(5), site.clone())
        .run(USERNAME, PASSWORD)
        .await
        .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::TargetReached);
    let mut flags = report.payloads.clone();
    flags.sort();
    assert_eq!(flags, vec!["FLAG04", "FLAG08", "FLAG12", "FLAG16", "FLAG20"]);

    for user in 1..=20 {
        assert!(
            site.hits(&format!("/fakebook/{}/", user)) <= 1,
            "user {} fetched more than once",
            user
        );
    }
}

#[tokio::test]
async fn test_each_user_visited_once_until_exhausted() {
    let site = Arc::new(ring_site());
    let mut config = test_config(4);
    config.crawler.target_flags = 6;

    let report = Coordinator::new(config, site.clone())
        .run(USERNAME, PASSWORD)
        .await
        .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::FrontierExhausted);
    assert_eq!(report.payloads.len(), 5);
    assert_eq!(report.counters.dispatched, 20);
    assert_eq!(report.counters.completed, 20);
    assert_eq!(report.identifiers_seen, 21);

    for user in 1..=20 {
        assert_eq!(site.hits(&format!("/fakebook/{}/", user)), 1, "user {}", user);
        assert_eq!(site.hits(&format!("/fakebook/{}/friends/1/", user)), 1, "user {}", user);
    }
    assert_eq!(site.hits("/fakebook/"), 1);
}

#[tokio::test]
async fn test_no_dispatch_after_target_reached() {
    let mut site = FakeSite::new().page("/fakebook/", profile_links(&[1, 2, 3, 4, 5, 6, 7, 8]));
    for user in 1..=8u32 {
        site = site.page(&format!("/fakebook/{}/", user), flag(&format!("F{}", user)));
    }
    let site = Arc::new(site);

    let report = Coordinator::new(test_config(1), site.clone())
        .run(USERNAME, PASSWORD)
        .await
        .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::TargetReached);
    assert_eq!(report.payloads, vec!["F1", "F2", "F3", "F4", "F5"]);
    assert_eq!(report.counters.dispatched, 5);
    assert_eq!(site.hits("/fakebook/6/"), 0);
    // The searching flag clears before the fifth user's friends list.
    assert_eq!(site.hits("/fakebook/5/friends/1/"), 0);
}

#[tokio::test]
async fn test_friends_links_not_enqueued() {
    let site = Arc::new(
        FakeSite::new()
            .page(
                "/fakebook/",
                format!(
                    "{}<a href=\"/fakebook/99/friends/1/\">Friends of 99</a>",
                    profile_links(&[11, 22])
                ),
            )
            .page("/fakebook/11/", "<p>eleven</p>")
            .page("/fakebook/22/", "<p>twenty-two</p>"),
    );

    let report = Coordinator::new(test_config(2), site.clone())
        .run(USERNAME, PASSWORD)
        .await
        .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::FrontierExhausted);
    assert_eq!(report.identifiers_seen, 3);
    assert_eq!(site.hits("/fakebook/11/"), 1);
    assert_eq!(site.hits("/fakebook/22/"), 1);
    assert_eq!(site.hits("/fakebook/99/"), 0);
    assert_eq!(site.hits("/fakebook/99/friends/1/"), 0);
}

#[tokio::test]
async fn test_friends_pagination_followed() {
    let site = Arc::new(
        FakeSite::new()
            .page("/fakebook/", profile_links(&[1]))
            .page("/fakebook/1/", "<p>one</p>")
            .page(
                "/fakebook/1/friends/1/",
                format!("{}<p>Page 1 of 3\n</p>", profile_links(&[2])),
            )
            .page("/fakebook/1/friends/2/", profile_links(&[3]))
            .page("/fakebook/1/friends/3/", profile_links(&[4]))
            .page("/fakebook/4/", flag("DEEP")),
    );
    let mut config = test_config(2);
    config.crawler.target_flags = 1;

    let report = Coordinator::new(config, site.clone())
        .run(USERNAME, PASSWORD)
        .await
        .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::TargetReached);
    assert_eq!(report.payloads, vec!["DEEP"]);
    assert_eq!(site.hits("/fakebook/1/friends/2/"), 1);
    assert_eq!(site.hits("/fakebook/1/friends/3/"), 1);
    assert_eq!(site.hits("/fakebook/1/friends/4/"), 0);
}

#[tokio::test]
async fn test_worker_recovers_from_transport_failure() {
    let site = Arc::new(
        FakeSite::new()
            .page("/fakebook/", profile_links(&[1, 2]))
            .page("/fakebook/1/", flag("ONE"))
            .page("/fakebook/2/", flag("TWO"))
            .fail_once("/fakebook/1/"),
    );
    let mut config = test_config(2);
    config.crawler.target_flags = 2;

    let report = Coordinator::new(config, site.clone())
        .run(USERNAME, PASSWORD)
        .await
        .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::TargetReached);
    let mut flags = report.payloads.clone();
    flags.sort();
    assert_eq!(flags, vec!["ONE", "TWO"]);
    assert_eq!(report.counters.requeued, 1);
    assert_eq!(site.hits("/fakebook/1/"), 2);
}

#[tokio::test]
async fn test_malformed_flag_logged_as_feed_error() {
    let site = Arc::new(
        FakeSite::new()
            .page("/fakebook/", profile_links(&[1, 2]))
            .page("/fakebook/1/", "<h2 class=\"secret_flag\">oops</h2>")
            .page("/fakebook/2/", flag("GOOD")),
    );
    let mut config = test_config(2);
    config.crawler.max_page_attempts = 1;

    let report = Coordinator::new(config, site.clone())
        .run(USERNAME, PASSWORD)
        .await
        .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::FrontierExhausted);
    assert_eq!(report.payloads, vec!["GOOD"]);
    assert_eq!(
        report.feed_errors.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        vec!["/fakebook/1/"]
    );
}

#[tokio::test]
async fn test_bad_flag_heading_keeps_page_links() {
    let site = Arc::new(
        FakeSite::new()
            .page("/fakebook/", profile_links(&[1]))
            .page(
                "/fakebook/1/",
                format!("{}<h2 class=\"secret_flag\">oops</h2>", profile_links(&[2])),
            )
            .page("/fakebook/1/friends/1/", profile_links(&[3]))
            .page("/fakebook/2/", flag("REACHABLE"))
            .page("/fakebook/3/", flag("FRIEND")),
    );
    let mut config = test_config(1);
    config.crawler.target_flags = 2;
    config.crawler.max_page_attempts = 2;

    let report = Coordinator::new(config, site.clone())
        .run(USERNAME, PASSWORD)
        .await
        .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::TargetReached);
    let mut flags = report.payloads.clone();
    flags.sort();
    assert_eq!(flags, vec!["FRIEND", "REACHABLE"]);
    // The friends list was still read although the home page failed to scan.
    assert_eq!(site.hits("/fakebook/1/friends/1/"), 1);
    assert_eq!(
        report.feed_errors.iter().map(|id| id.as_str()).collect::<Vec<_>>(),
        vec!["/fakebook/1/"]
    );
}

#[tokio::test]
async fn test_wrong_password_is_fatal() {
    let site = Arc::new(ring_site());

    let result = Coordinator::new(test_config(2), site.clone())
        .run(USERNAME, "wrong")
        .await;

    assert!(matches!(result, Err(CrawlerError::Login(_))));
    // Two handshakes (GET + POST each), and no page was ever requested.
    assert_eq!(site.hits("/accounts/login/?next=/fakebook/"), 4);
    assert_eq!(site.hits("/fakebook/"), 0);
}

#[tokio::test]
async fn test_deadline_stops_stuck_crawl() {
    let site = Arc::new(
        FakeSite::new()
            .page("/fakebook/", profile_links(&[1, 2]))
            .hang_on("/fakebook/1/")
            .unavailable("/fakebook/2/"),
    );
    let mut config = test_config(2);
    config.crawler.deadline_secs = Some(1);

    let report = tokio::time::timeout(
        Duration::from_secs(10),
        Coordinator::new(config, site.clone()).run(USERNAME, PASSWORD),
    )
    .await
    .expect("deadline did not stop the crawl")
    .expect("crawl failed");

    assert_eq!(report.outcome, CrawlOutcome::DeadlineExceeded);
    assert!(report.payloads.is_empty());

    // No visit outlives the crawl: the retry loop on the busy user is gone.
    let busy_hits = site.hits("/fakebook/2/");
    assert!(busy_hits > 1);
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(site.hits("/fakebook/2/"), busy_hits);
    assert_eq!(site.hits("/fakebook/1/"), 1);
}
