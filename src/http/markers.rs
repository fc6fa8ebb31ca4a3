//! Substring extraction of cookies, tokens and pagination markers
//!
//! Each helper returns `None` when its marker is absent; callers decide
//! whether that is fatal.

/// Returns the text between the first `start` marker and the next `end`
///
/// If `end` never follows, the value runs to the end of the text.
pub fn find_between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let from = text.find(start)? + start.len();
    let rest = &text[from..];
    Some(rest.find(end).map_or(rest, |to| &rest[..to]))
}

/// Value of the `sessionid` cookie set by the response
pub fn session_id(text: &str) -> Option<&str> {
    cookie(text, "sessionid")
}

/// Value of the `csrftoken` cookie set by the response
pub fn csrf_token(text: &str) -> Option<&str> {
    cookie(text, "csrftoken")
}

/// Hidden CSRF token embedded in the login form
pub fn csrf_form_token(text: &str) -> Option<&str> {
    find_between(text, "name=\"csrfmiddlewaretoken\" value=\"", "\"")
        .or_else(|| find_between(text, "csrfmiddlewaretoken\" value=\"", "\""))
        .filter(|token| !token.is_empty())
}

/// Total number of friends pages announced as `Page 1 of N`
pub fn page_count(text: &str) -> Option<u32> {
    let after = find_between(text, "Page 1 of ", "\n")?;
    let digits: String = after
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn cookie<'a>(text: &'a str, name: &str) -> Option<&'a str> {
    let marker = format!("{}=", name);
    text.lines()
        .filter(|line| {
            line.split_once(':')
                .is_some_and(|(header, _)| header.trim().eq_ignore_ascii_case("set-cookie"))
        })
        .find_map(|line| {
            let (_, value) = line.split_once(':')?;
            let value = value.trim();
            value.strip_prefix(marker.as_str())
        })
        .map(|rest| rest.split(';').next().unwrap_or(rest).trim())
        .filter(|value| !value.is_empty())
}
