use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

/// SEC-003: Maximum element nesting depth accepted in a feed document.
/// Prevents resource exhaustion from maliciously deep documents.
const MAX_DEPTH: usize = 64;

/// Errors that make a whole feed document unusable.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Body is not UTF-8
    #[error("Feed is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// XML is malformed (unclosed or mismatched tags, bad entities, truncated input)
    #[error("XML parse error: {0}")]
    Xml(String),

    /// The body contains no elements at all
    #[error("Feed document is empty")]
    Empty,

    /// SEC-003: Nesting depth exceeds safety limit
    #[error("Feed nesting depth exceeds maximum of {0} levels")]
    MaxDepthExceeded(usize),
}

/// One `<item>` as it appeared in the document, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedItem {
    pub title: String,
    pub link: String,
    /// Raw `pubDate` text; parsed later so one bad date only skips its item
    pub pub_date: String,
}

/// The channel of an RSS 2.0 document. Items keep document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedDocument {
    pub title: String,
    pub link: String,
    pub items: Vec<FetchedItem>,
}

/// Text-bearing elements captured from the document
#[derive(Debug, Clone, Copy)]
enum Field {
    ChannelTitle,
    ChannelLink,
    ItemTitle,
    ItemLink,
    ItemPubDate,
}

/// Decodes an RSS 2.0 body into a [`FetchedDocument`].
///
/// Only the first `<channel>` directly under the root element is read.
/// Inside it, `title`, `link` and `item` are captured; inside each item,
/// `title`, `link` and `pubDate`. Everything else, including namespaced
/// elements such as `atom:link`, is skipped. The root element's name is not
/// checked, and a well-formed document without a channel yields an empty
/// document.
///
/// # Errors
///
/// Returns a [`ParseError`] when the body is not UTF-8, is not well-formed
/// XML, or has no root element.
pub fn parse_document(bytes: &[u8]) -> Result<FetchedDocument, ParseError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let content = std::str::from_utf8(bytes)?;

    // SEC-002: quick-xml (0.37) never expands <!ENTITY> declarations; unknown
    // entities fail in `unescape()` instead of being resolved.
    // Text is trimmed once per field in `store_field`; trimming each event
    // would eat the spaces around CDATA sections.
    let mut reader = Reader::from_str(content);

    let mut doc = FetchedDocument::default();
    let mut depth: usize = 0;
    let mut root_seen = false;
    let mut channel_seen = false;
    let mut in_channel = false;
    let mut in_item = false;
    let mut capture: Option<(Field, usize)> = None;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                depth += 1;
                if depth > MAX_DEPTH {
                    return Err(ParseError::MaxDepthExceeded(MAX_DEPTH));
                }
                root_seen = true;

                if depth == 2 && !channel_seen && is(&e, "channel") {
                    channel_seen = true;
                    in_channel = true;
                } else if in_channel && depth == 3 && is(&e, "item") {
                    doc.items.push(FetchedItem::default());
                    in_item = true;
                } else if let Some(field) = field_for(&e, depth, in_channel, in_item) {
                    capture = Some((field, depth));
                    text.clear();
                }
            }
            Ok(Event::Empty(e)) => {
                root_seen = true;
                let child_depth = depth + 1;
                if child_depth == 2 && !channel_seen && is(&e, "channel") {
                    channel_seen = true;
                } else if in_channel && child_depth == 3 && is(&e, "item") {
                    doc.items.push(FetchedItem::default());
                }
            }
            Ok(Event::Text(e)) => {
                if matches!(capture, Some((_, d)) if d == depth) {
                    let unescaped = e.unescape().map_err(|e| ParseError::Xml(e.to_string()))?;
                    text.push_str(&unescaped);
                }
            }
            Ok(Event::CData(e)) => {
                if matches!(capture, Some((_, d)) if d == depth) {
                    let decoded = reader
                        .decoder()
                        .decode(&e)
                        .map_err(|e| ParseError::Xml(e.to_string()))?;
                    text.push_str(&decoded);
                }
            }
            Ok(Event::End(_)) => {
                match capture {
                    Some((field, d)) if d == depth => {
                        store_field(&mut doc, field, text.trim());
                        capture = None;
                    }
                    _ => {}
                }
                if in_item && depth == 3 {
                    in_item = false;
                } else if in_channel && depth == 2 {
                    in_channel = false;
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => {
                if depth > 0 {
                    return Err(ParseError::Xml(format!(
                        "unexpected end of document with {depth} unclosed element(s)"
                    )));
                }
                break;
            }
            Err(e) => return Err(ParseError::Xml(e.to_string())),
            _ => {}
        }
    }

    if !root_seen {
        return Err(ParseError::Empty);
    }
    if !channel_seen {
        tracing::warn!("Feed document has no <channel> element");
    }
    Ok(doc)
}

fn is(e: &BytesStart<'_>, name: &str) -> bool {
    e.name().as_ref() == name.as_bytes()
}

fn field_for(e: &BytesStart<'_>, depth: usize, in_channel: bool, in_item: bool) -> Option<Field> {
    let name = e.name();
    match (name.as_ref(), depth) {
        (b"title", 3) if in_channel && !in_item => Some(Field::ChannelTitle),
        (b"link", 3) if in_channel && !in_item => Some(Field::ChannelLink),
        (b"title", 4) if in_item => Some(Field::ItemTitle),
        (b"link", 4) if in_item => Some(Field::ItemLink),
        (b"pubDate", 4) if in_item => Some(Field::ItemPubDate),
        _ => None,
    }
}

/// Later occurrences of an element overwrite earlier ones
fn store_field(doc: &mut FetchedDocument, field: Field, value: &str) {
    let value = value.to_string();
    match field {
        Field::ChannelTitle => doc.title = value,
        Field::ChannelLink => doc.link = value,
        Field::ItemTitle | Field::ItemLink | Field::ItemPubDate => {
            if let Some(item) = doc.items.last_mut() {
                match field {
                    Field::ItemTitle => item.title = value,
                    Field::ItemLink => item.link = value,
                    _ => item.pub_date = value,
                }
            }
        }
    }
}
