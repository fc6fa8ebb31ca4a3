//! Response framing and decoding
//!
//! A response is read off the socket in two phases: chunked reads until the
//! header block is complete, then a single read for whatever the declared
//! `Content-Length` still owes. Gzip bodies are decompressed as one stream
//! over the bytes gathered by both phases.

use crate::http::transport::TransportError;
use flate2::read::GzDecoder;
use std::io::{ErrorKind, Read};
use tokio::io::{AsyncRead, AsyncReadExt};

/// Offset of the three-digit status code in `HTTP/1.x NNN ...`
const STATUS_OFFSET: usize = 9;

/// One decoded HTTP response
///
/// The full text (headers and decoded body) is kept so that callers can run
/// substring extraction over it, as cookie and token lookups do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    status: u16,
    text: String,
    header_end: usize,
    body_start: usize,
}

impl RawResponse {
    /// Assembles a response from its header block and decoded body
    pub fn new(head: &str, body: &str) -> Self {
        let text = format!("{}\r\n\r\n{}", head, body);
        Self {
            status: parse_status(head),
            header_end: head.len(),
            body_start: head.len() + 4,
            text,
        }
    }

    /// Splits complete response text at the blank line ending the headers
    ///
    /// # Example
    ///
    /// ```
    /// use fakebook_crawler::http::RawResponse;
    ///
    /// let response = RawResponse::parse("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
    /// assert_eq!(response.status(), 404);
    /// assert_eq!(response.header("content-length"), Some("0"));
    /// ```
    pub fn parse(text: &str) -> Self {
        match find_header_end(text.as_bytes()) {
            Some((header_end, body_start)) => Self {
                status: parse_status(&text[..header_end]),
                text: text.to_string(),
                header_end,
                body_start,
            },
            None => Self {
                status: parse_status(text),
                text: text.to_string(),
                header_end: text.len(),
                body_start: text.len(),
            },
        }
    }

    /// Status code, or 0 if the status line is malformed
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Status line and headers, without the terminating blank line
    pub fn head(&self) -> &str {
        &self.text[..self.header_end]
    }

    /// Decoded body
    pub fn body(&self) -> &str {
        &self.text[self.body_start..]
    }

    /// Headers and body as one string
    pub fn text(&self) -> &str {
        &self.text
    }

    /// First value of the named header (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        header_value(self.head(), name)
    }

    /// Every value of the named header, in order (e.g. `Set-Cookie`)
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        header_lines(self.head())
            .filter(move |(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// The `<html ...>...</html>` fragment, or the whole response if absent
    pub fn document(&self) -> &str {
        html_fragment(&self.text)
    }
}

/// Extracts the document between the first `<html` and the following `</html>`
///
/// An unterminated document runs to the end of the text; text without any
/// `<html` is returned whole.
pub fn html_fragment(text: &str) -> &str {
    const CLOSE: &str = "</html>";

    let Some(start) = text.find("<html") else {
        return text;
    };
    let rest = &text[start..];
    match rest.find(CLOSE) {
        Some(end) => &rest[..end + CLOSE.len()],
        None => rest,
    }
}

/// Reads and decodes exactly one response from the stream
///
/// # Framing
///
/// 1. Read chunks of `chunk_size` bytes until the header block is complete
///    (in practice the first chunk)
/// 2. With a `Content-Length`, issue one further read for the bytes still
///    owed; EOF before that is [`TransportError::Truncated`]
/// 3. Without a `Content-Length`, read until the server closes
/// 4. Decompress the whole body as one gzip stream if so encoded
pub async fn read_response<S>(stream: &mut S, chunk_size: usize) -> Result<RawResponse, TransportError>
where
    S: AsyncRead + Unpin,
{
    let mut data = Vec::with_capacity(chunk_size);
    let mut chunk = vec![0u8; chunk_size.max(1)];

    let (header_end, body_start) = loop {
        if let Some(bounds) = find_header_end(&data) {
            break bounds;
        }
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            let reason = if data.is_empty() {
                "connection closed before any response bytes"
            } else {
                "connection closed inside the header block"
            };
            return Err(TransportError::Malformed(reason.to_string()));
        }
        data.extend_from_slice(&chunk[..n]);
    };

    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    tracing::trace!("Response head ({} bytes): {:?}", header_end, head);

    if header_value(&head, "transfer-encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("chunked"))
    {
        return Err(TransportError::Unsupported(
            "chunked transfer-encoding".to_string(),
        ));
    }

    let gzip = header_value(&head, "content-encoding")
        .is_some_and(|v| v.to_ascii_lowercase().contains("gzip"));

    match content_length(&head)? {
        Some(length) => {
            let total = body_start + length;
            if data.len() < total {
                let mut rest = vec![0u8; total - data.len()];
                stream.read_exact(&mut rest).await.map_err(|e| {
                    if e.kind() == ErrorKind::UnexpectedEof {
                        TransportError::Truncated {
                            expected: length,
                            received: data.len() - body_start,
                        }
                    } else {
                        TransportError::Io(e)
                    }
                })?;
                data.extend_from_slice(&rest);
            }
            data.truncate(total);
        }
        None => {
            stream.read_to_end(&mut data).await?;
        }
    }

    let body = decode_body(&data[body_start..], gzip)?;
    Ok(RawResponse::new(&head, &body))
}

/// Turns raw body bytes into text, gunzipping first when required
pub fn decode_body(bytes: &[u8], gzip: bool) -> Result<String, TransportError> {
    if !gzip || bytes.is_empty() {
        return Ok(String::from_utf8_lossy(bytes).into_owned());
    }

    let mut decoded = Vec::new();
    GzDecoder::new(bytes)
        .read_to_end(&mut decoded)
        .map_err(TransportError::Decompress)?;
    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

/// Locates the blank line ending the header block
///
/// Returns `(end of headers, start of body)`. CRLF framing is expected but
/// bare LF is tolerated.
fn find_header_end(data: &[u8]) -> Option<(usize, usize)> {
    let crlf = data.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = data.windows(2).position(|w| w == b"\n\n");

    match (crlf, lf) {
        (Some(c), Some(l)) if l < c => Some((l, l + 2)),
        (Some(c), _) => Some((c, c + 4)),
        (None, Some(l)) => Some((l, l + 2)),
        (None, None) => None,
    }
}

fn parse_status(head: &str) -> u16 {
    head.get(STATUS_OFFSET..STATUS_OFFSET + 3)
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}

fn content_length(head: &str) -> Result<Option<usize>, TransportError> {
    header_value(head, "content-length")
        .map(|v| {
            v.parse().map_err(|_| {
                TransportError::Malformed(format!("invalid Content-Length: {:?}", v))
            })
        })
        .transpose()
}

fn header_lines(head: &str) -> impl Iterator<Item = (&str, &str)> {
    head.lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.trim(), value.trim()))
}

fn header_value<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    header_lines(head)
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}
