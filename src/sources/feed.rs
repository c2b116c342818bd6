//! Tolerant RSS / Atom feed parsing.
//!
//! Handles RSS 2.0 (`channel/item`), RSS 1.0 (`rdf:RDF/item`) and Atom
//! (`feed/entry`). Job boards routinely serve feeds with stray entities and
//! unbalanced tags, so the parser keeps whatever it managed to read instead
//! of rejecting the whole document.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::{debug, warn};

/// One feed entry in dialect-neutral form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    /// Raw date string as published; normalized later by the mapper.
    pub published_at: Option<String>,
    pub guid: String,
    pub author: String,
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    PubDate,
    Updated,
    Published,
    Guid,
    Author,
    Category,
}

/// Entry under construction.
#[derive(Debug, Default)]
struct Entry {
    title: String,
    link: String,
    pub_date: String,
    updated: String,
    published: String,
    guid: String,
    author: String,
    categories: Vec<String>,
}

impl Entry {
    fn commit(&mut self, field: Field, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let slot = match field {
            Field::Category => {
                self.categories.push(text.to_string());
                return;
            }
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::PubDate => &mut self.pub_date,
            Field::Updated => &mut self.updated,
            Field::Published => &mut self.published,
            Field::Guid => &mut self.guid,
            Field::Author => &mut self.author,
        };
        if slot.is_empty() {
            *slot = text.to_string();
        }
    }

    /// Pick up Atom-style attributes (`link@href`, `category@term`).
    fn absorb_attributes(&mut self, element: &BytesStart<'_>) {
        let name = element.local_name();
        let wanted: &[u8] = match name.as_ref() {
            b"link" => b"href",
            b"category" => b"term",
            _ => return,
        };
        for attr in element.attributes().flatten() {
            if attr.key.local_name().as_ref() != wanted {
                continue;
            }
            let value = attr
                .unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).into_owned());
            if wanted == b"href" {
                self.commit(Field::Link, &value);
            } else {
                self.commit(Field::Category, &value);
            }
        }
    }

    fn finish(self) -> Option<FeedItem> {
        let link = self.link.trim().to_string();
        if link.is_empty() {
            debug!("Skipping feed entry without link: {:?}", self.title);
            return None;
        }
        let published_at = [self.pub_date, self.updated, self.published]
            .into_iter()
            .find(|s| !s.is_empty());
        let guid = if self.guid.is_empty() {
            link.clone()
        } else {
            self.guid
        };
        Some(FeedItem {
            title: self.title,
            link,
            published_at,
            guid,
            author: self.author,
            categories: self.categories,
        })
    }
}

/// Map an element path relative to the entry onto the field it feeds.
fn field_for(path: &[String]) -> Option<Field> {
    match path {
        [name] => match name.as_str() {
            "title" => Some(Field::Title),
            "link" => Some(Field::Link),
            "pubDate" | "date" => Some(Field::PubDate),
            "updated" => Some(Field::Updated),
            "published" => Some(Field::Published),
            "guid" | "id" => Some(Field::Guid),
            "author" | "creator" => Some(Field::Author),
            "category" => Some(Field::Category),
            _ => None,
        },
        [parent, name] if parent == "author" && name == "name" => Some(Field::Author),
        _ => None,
    }
}

fn is_entry(name: &[u8]) -> bool {
    name == b"item" || name == b"entry"
}

/// RSS 2.0, RSS 1.0 (`rdf:RDF`) or Atom.
fn check_root(name: &[u8]) -> Result<(), String> {
    match name {
        b"rss" | b"RDF" | b"feed" => Ok(()),
        other => Err(format!(
            "root element <{}> is not a feed",
            String::from_utf8_lossy(other)
        )),
    }
}

/// Parse an RSS or Atom document into feed items, in document order.
///
/// Returns an error when no element could be read or the root element is
/// not `rss`, `RDF` or `feed` (an HTML error page, say). A markup error later
/// in the document ends parsing and keeps the entries read so far.
pub fn parse_feed(xml: &str) -> Result<Vec<FeedItem>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    reader.config_mut().check_end_names = false;

    let mut items = Vec::new();
    let mut path: Vec<String> = Vec::new();
    let mut entry: Option<(usize, Entry)> = None;
    let mut buffer = String::new();
    let mut started = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if !started {
                    check_root(e.local_name().as_ref())?;
                    started = true;
                }
                let name = String::from_utf8_lossy(e.local_name().as_ref()).into_owned();
                if entry.is_none() && is_entry(name.as_bytes()) {
                    entry = Some((path.len(), Entry::default()));
                } else if let Some((depth, current)) = entry.as_mut() {
                    if path.len() == *depth + 1 {
                        current.absorb_attributes(&e);
                    }
                }
                buffer.clear();
                path.push(name);
            }
            Ok(Event::Empty(e)) => {
                if !started {
                    check_root(e.local_name().as_ref())?;
                    started = true;
                }
                if let Some((depth, current)) = entry.as_mut() {
                    if path.len() == *depth + 1 {
                        current.absorb_attributes(&e);
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if entry.is_some() {
                    match t.unescape() {
                        Ok(text) => buffer.push_str(&text),
                        Err(_) => buffer.push_str(&String::from_utf8_lossy(&t)),
                    }
                }
            }
            Ok(Event::CData(c)) => {
                if entry.is_some() {
                    buffer.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(_)) => {
                if let Some((depth, current)) = entry.as_mut() {
                    if path.len() > *depth + 1 {
                        if let Some(field) = field_for(&path[*depth + 1..]) {
                            current.commit(field, &buffer);
                        }
                    }
                }
                buffer.clear();
                path.pop();
                if entry.as_ref().is_some_and(|(depth, _)| path.len() == *depth) {
                    if let Some(item) = entry.take().and_then(|(_, e)| e.finish()) {
                        items.push(item);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                if !started {
                    return Err(e.to_string());
                }
                warn!(
                    "Feed markup error at byte {}: {} (keeping {} entries)",
                    reader.buffer_position(),
                    e,
                    items.len()
                );
                break;
            }
        }
    }

    if !started {
        return Err("no XML elements found".to_string());
    }

    Ok(items)
}
