// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use url::Url;

use crate::error::FeedError;

pub const DEFAULT_TITLE: &str = "Unknown Title";
pub const DEFAULT_DESCRIPTION: &str = "No description available.";
pub const DEFAULT_COPYRIGHT: &str = "Unknown Copyright";
pub const DEFAULT_EPISODE_TITLE: &str = "Untitled Episode";

/// Represents a parsed podcast feed
#[derive(Debug, Clone)]
pub struct Feed {
    pub title: String,
    pub description: String,
    pub copyright: String,
    /// URL or path the feed was loaded from
    pub source: String,
    /// Entries in document order
    pub episodes: Vec<Episode>,
}

/// Represents a single feed entry
#[derive(Debug, Clone)]
pub struct Episode {
    pub title: String,
    /// First enclosure of the entry, if it had a usable one
    pub enclosure: Option<Enclosure>,
}

/// Represents the media file attached to an episode
#[derive(Debug, Clone)]
pub struct Enclosure {
    pub url: Url,
    /// Size in bytes as declared by the feed
    pub length: Option<u64>,
}

impl Feed {
    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }
}

/// Parse feed bytes as RSS, falling back to Atom.
///
/// Relative enclosure URLs are resolved against `base` when one is given.
pub fn parse_feed(bytes: &[u8], base: Option<&Url>, source: &str) -> Result<Feed, FeedError> {
    let rss_err = match rss::Channel::read_from(bytes) {
        Ok(channel) => {
            tracing::debug!(source, items = channel.items().len(), "Parsed as RSS");
            return Ok(from_rss(&channel, base, source));
        }
        Err(e) => e,
    };

    match atom_syndication::Feed::read_from(bytes) {
        Ok(feed) => {
            tracing::debug!(source, entries = feed.entries().len(), "Parsed as Atom");
            Ok(from_atom(&feed, base, source))
        }
        Err(atom_err) => Err(FeedError::ParseFailed {
            rss: rss_err,
            atom: atom_err,
        }),
    }
}

fn from_rss(channel: &rss::Channel, base: Option<&Url>, source: &str) -> Feed {
    let episodes = channel
        .items()
        .iter()
        .map(|item| {
            let title = text_or(item.title(), DEFAULT_EPISODE_TITLE);
            let enclosure = item.enclosure().and_then(|enc| {
resolve_enclosure(&title, enc.url(), Some(enc.length()), base)
            });
            Episode { title, enclosure }
        })
        .collect();

    Feed {
        title: text_or(Some(channel.title()), DEFAULT_TITLE),
        description: decode_description(Some(channel.description())),
        copyright: text_or(channel.copyright(), DEFAULT_COPYRIGHT),
        source: source.to_string(),
        episodes,
    }
}

fn from_atom(feed: &atom_syndication::Feed, base: Option<&Url>, source: &str) -> Feed {
    let episodes = feed
        .entries()
        .iter()
        .map(|entry| {
            let title = text_or(Some(entry.title().as_str()), DEFAULT_EPISODE_TITLE);
            let enclosure = entry
                .links()
                .iter()
                .find(|link| link.rel() == "enclosure")
                .and_then(|link| {
                    resolve_enclosure(&title, link.href(), link.length(), base)
                });
            Episode { title, enclosure }
        })
        .collect();

    Feed {
        title: text_or(Some(feed.title().as_str()), DEFAULT_TITLE),
        description: decode_description(feed.subtitle().map(|s| s.as_str())),
        copyright: text_or(feed.rights().map(|r| r.as_str()), DEFAULT_COPYRIGHT),
        source: source.to_string(),
        episodes,
    }
}

fn resolve_enclosure(
    title: &str,
    href: &str,
    length: Option<&str>,
    base: Option<&Url>,
) -> Option<Enclosure> {
    let parsed = match base {
        Some(base) => base.join(href.trim()),
        None => Url::parse(href.trim()),
    };

    match parsed {
        // Only HTTP(S) enclosures can be downloaded
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(Enclosure {
            url,
            length: length.and_then(|l| l.trim().parse().ok()),
        }),
        Ok(url) => {
            tracing::warn!(episode = title, url = %url, "Ignoring non-HTTP enclosure URL");
            None
        }
        Err(e) => {
            tracing::warn!(episode = title, href, error = %e, "Ignoring unusable enclosure URL");
            None
        }
    }
}

/// Use the value unless it is missing or blank
fn text_or(value: Option<&str>, fallback: &str) -> String {
    value
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
        .unwrap_or_else(|| fallback.to_string())
}

fn decode_description(value: Option<&str>) -> String {
    let raw = text_or(value, DEFAULT_DESCRIPTION);
    html_escape::decode_html_entities(raw.trim()).into_owned()
}
