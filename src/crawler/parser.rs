//! Markup scanner for extracting profile links and flags
//!
//! The document is parsed with `scraper` and flattened into a stream of
//! open/text/close events. Link collection and flag extraction are driven by
//! those events, so neither depends on how the document was parsed.

use crate::config::ScannerConfig;
use crate::url::{PageId, ProfileFilter};
use scraper::{ElementRef, Html};
use thiserror::Error;

/// Errors raised while scanning a page body
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ScanError {
    #[error("flag text {text:?} is shorter than its {prefix_len}-character prefix")]
    MalformedPayload { text: String, prefix_len: usize },

    #[error("flag heading closed without any text")]
    EmptyPayload,
}

/// One step of a depth-first walk over the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkupEvent<'a> {
    Open {
        tag: &'a str,
        attrs: Vec<(&'a str, &'a str)>,
    },
    Text(&'a str),
    Close {
        tag: &'a str,
    },
}

impl<'a> MarkupEvent<'a> {
    /// Value of the named attribute on an `Open` event
    pub fn attr(&self, name: &str) -> Option<&'a str> {
        match self {
            MarkupEvent::Open { attrs, .. } => attrs
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| *v),
            _ => None,
        }
    }

    /// True for an `Open` event whose class list contains `class`
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }
}

/// Flattens a parsed document into open/text/close events in document order
pub fn markup_events(document: &Html) -> Vec<MarkupEvent<'_>> {
    let mut events = Vec::new();
    walk(document.root_element(), &mut events);
    events
}

fn walk<'a>(element: ElementRef<'a>, events: &mut Vec<MarkupEvent<'a>>) {
    let value = element.value();
    events.push(MarkupEvent::Open {
        tag: value.name(),
        attrs: value.attrs().collect(),
    });

    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            walk(child_element, events);
        } else if let Some(text) = child.value().as_text() {
            events.push(MarkupEvent::Text(&**text));
        }
    }

    events.push(MarkupEvent::Close { tag: value.name() });
}

/// Where the payload extractor is in its scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractorState {
    Idle,
    AwaitingPayloadText,
}

/// State machine that pulls flags out of marked headings
///
/// Opening a heading with the marker class arms the machine; the last text
/// seen inside it becomes the candidate; the heading's close emits the
/// candidate minus its fixed-length prefix.
#[derive(Debug, Clone)]
pub struct PayloadExtractor {
    tag: String,
    class: String,
    prefix_len: usize,
    state: ExtractorState,
    latest: Option<String>,
}

impl PayloadExtractor {
    pub fn new(tag: impl Into<String>, class: impl Into<String>, prefix_len: usize) -> Self {
        Self {
            tag: tag.into(),
            class: class.into(),
            prefix_len,
            state: ExtractorState::Idle,
            latest: None,
        }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            &config.marker_tag,
            &config.marker_class,
            config.payload_prefix_len,
        )
    }

    /// True while inside a marked heading
    pub fn is_armed(&self) -> bool {
        self.state == ExtractorState::AwaitingPayloadText
    }

    /// Feeds one event; returns a payload when a marked heading closes
    pub fn on_event(&mut self, event: &MarkupEvent<'_>) -> Result<Option<String>, ScanError> {
        match (self.state, event) {
            (ExtractorState::Idle, MarkupEvent::Open { tag, .. })
                if tag.eq_ignore_ascii_case(&self.tag) && event.has_class(&self.class) =>
            {
                self.state = ExtractorState::AwaitingPayloadText;
                self.latest = None;
                Ok(None)
            }
            (ExtractorState::AwaitingPayloadText, MarkupEvent::Text(text)) => {
                if !text.trim().is_empty() {
                    self.latest = Some(text.trim().to_string());
                }
                Ok(None)
            }
            (ExtractorState::AwaitingPayloadText, MarkupEvent::Close { tag })
                if tag.eq_ignore_ascii_case(&self.tag) =>
            {
                self.state = ExtractorState::Idle;
                let text = self.latest.take().ok_or(ScanError::EmptyPayload)?;
                match text.get(self.prefix_len..) {
                    Some(payload) if !payload.is_empty() => Ok(Some(payload.to_string())),
                    _ => Err(ScanError::MalformedPayload {
                        text,
                        prefix_len: self.prefix_len,
                    }),
                }
            }
            _ => Ok(None),
        }
    }
}

/// What a scan found on one page
///
/// A bad flag heading does not stop the scan; it is recorded in `errors`
/// and everything else on the page is still collected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanOutput {
    /// Profile links in document order, possibly repeated
    pub links: Vec<PageId>,

    /// Flags in document order
    pub payloads: Vec<String>,

    /// Flag headings that could not be read, in document order
    pub errors: Vec<ScanError>,
}

impl ScanOutput {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Extracts candidate links and flags from a page body
pub trait MarkupScanner: Send + Sync {
    fn scan(&self, body: &str) -> ScanOutput;
}

/// Scanner over HTML parsed with `scraper`
#[derive(Debug, Clone)]
pub struct HtmlScanner {
    filter: ProfileFilter,
    marker: PayloadExtractor,
}

impl HtmlScanner {
    pub fn new(filter: ProfileFilter, marker: PayloadExtractor) -> Self {
        Self { filter, marker }
    }

    pub fn from_config(config: &ScannerConfig) -> Self {
        Self::new(
            ProfileFilter::from_config(config),
            PayloadExtractor::from_config(config),
        )
    }
}

impl Default for HtmlScanner {
    fn default() -> Self {
        Self::from_config(&ScannerConfig::default())
    }
}

impl MarkupScanner for HtmlScanner {
    /// Scans a page body
    ///
    /// # Example
    ///
    /// ```
    /// use fakebook_crawler::crawler::{HtmlScanner, MarkupScanner};
    ///
    /// let html = r#"<html><body>
    ///     <a href="/fakebook/1/">Ada</a>
    ///     <a href="/fakebook/1/friends/1/">friends</a>
    ///     <h2 class="secret_flag">FLAG: ABC123</h2>
    /// </body></html>"#;
    ///
    /// let output = HtmlScanner::default().scan(html);
    /// assert!(output.is_clean());
    /// assert_eq!(output.links.len(), 1);
    /// assert_eq!(output.payloads, vec!["ABC123"]);
    /// ```
    fn scan(&self, body: &str) -> ScanOutput {
        let document = Html::parse_document(body);
        let mut extractor = self.marker.clone();
        let mut output = ScanOutput::default();

        for event in markup_events(&document) {
            if let MarkupEvent::Open { tag, .. } = &event {
                if tag.eq_ignore_ascii_case("a") {
                    if let Some(id) = event.attr("href").and_then(|h| self.filter.candidate(h)) {
                        output.links.push(id);
                    }
                }
            }

            match extractor.on_event(&event) {
                Ok(Some(payload)) => output.payloads.push(payload),
                Ok(None) => {}
                Err(e) => output.errors.push(e),
            }
        }

        output
    }
}
