//! Conference link extraction.
//!
//! This module finds URLs in free text (event locations, descriptions),
//! classifies them by conferencing provider and picks the link a user
//! should join when several are present.
//!
//! # Example
//!
//! ```
//! use meetingbar_core::links::{extract_links, primary_link};
//! use meetingbar_core::ProviderKind;
//!
//! let links = extract_links(&["Dial https://zoom.us/j/123 or https://meet.google.com/abc-defg-hij"]);
//! assert_eq!(links.len(), 2);
//! assert_eq!(primary_link(&links).unwrap().kind, ProviderKind::GoogleMeet);
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::event::{MeetingLink, ProviderKind};

/// Regex for extracting URL candidates from text.
static URL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)https?://[^\s<>"'\)\]]+"#).expect("Invalid URL regex"));

/// Regex for detecting Microsoft Outlook SafeLinks.
///
/// SafeLinks wrap the original URL in a redirect through
/// `safelinks.protection.outlook.com`, encoded in the `url` query parameter.
static SAFELINK_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://[^/]*safelinks\.protection\.outlook\.com/?\?(?:[^?]*&)?url=([^&]+)")
        .expect("Invalid SafeLink regex")
});

/// Google Meet: `meet.google.com/<slug>`.
static MEET_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://meet\.google\.com/[a-z0-9-]+").expect("Invalid Meet regex")
});

/// Teams: `teams.microsoft.com/l/meetup-join/<path>` and `teams.live.com/meet/<path>`.
static TEAMS_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^https?://(?:teams\.microsoft\.com/l/meetup-join/|teams\.live\.com/meet/)[^?\s]+",
    )
    .expect("Invalid Teams regex")
});

/// Zoom: `<subdomain>.zoom.us/j/<digits>` and `<subdomain>.zoom.us/my/<name>`.
static ZOOM_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:[a-z0-9-]+\.)*zoom\.us/(?:j/\d+|my/[^?\s/]+)")
        .expect("Invalid Zoom regex")
});

/// Classifies conference URLs found in text.
#[derive(Debug, Default)]
pub struct LinkExtractor;

impl LinkExtractor {
    /// Creates a new link extractor.
    pub fn new() -> Self {
        Self
    }

    /// Extracts all raw URL candidates from the given text, in order.
    pub fn extract_urls(&self, text: &str) -> Vec<String> {
        URL_REGEX
            .find_iter(text)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    /// Classifies a single URL.
    ///
    /// SafeLinks are unwrapped first. Recognised providers keep only the
    /// part of the URL the provider pattern covers; anything else becomes
    /// an [`ProviderKind::Unknown`] link with trailing punctuation removed.
    pub fn classify(&self, url: &str) -> MeetingLink {
        let unwrapped = unwrap_safelink(url);

        let patterns: [(&Regex, ProviderKind); 3] = [
            (&MEET_REGEX, ProviderKind::GoogleMeet),
            (&TEAMS_REGEX, ProviderKind::Teams),
            (&ZOOM_REGEX, ProviderKind::Zoom),
        ];
        for (regex, kind) in patterns {
            if let Some(m) = regex.find(&unwrapped) {
                return MeetingLink::new(kind, m.as_str());
            }
        }

        let trimmed = unwrapped.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        MeetingLink::new(ProviderKind::Unknown, trimmed)
    }

    /// Extracts every link from the given text blocks in discovery order.
    ///
    /// Blocks are scanned in order, and matches inside a block by position.
    /// Each URL candidate yields exactly one link, so a provider match never
    /// also shows up as a generic one. A URL repeated at another position is
    /// reported again.
    pub fn extract(&self, blocks: &[&str]) -> Vec<MeetingLink> {
        blocks
            .iter()
            .flat_map(|block| self.extract_urls(block))
            .map(|url| self.classify(&url))
            .collect()
    }
}

/// Extracts every link from the given text blocks.
///
/// See [`LinkExtractor::extract`] for details.
pub fn extract_links(blocks: &[&str]) -> Vec<MeetingLink> {
    LinkExtractor::new().extract(blocks)
}

/// Picks the link to join from a set of matches.
///
/// The order is fixed: Google Meet, then Teams, then Zoom, then the first
/// unclassified URL. Within one provider the earliest match wins.
pub fn primary_link(links: &[MeetingLink]) -> Option<&MeetingLink> {
    // min_by_key keeps the first of equal elements
    links.iter().min_by_key(|l| l.kind.priority())
}

/// Convenience: extract from text blocks and return the primary link.
pub fn primary_link_in(blocks: &[&str]) -> Option<MeetingLink> {
    let links = extract_links(blocks);
    primary_link(&links).cloned()
}

/// Unwraps a Microsoft Outlook SafeLink to get the original URL.
///
/// If the URL is not a SafeLink, it is returned unchanged.
fn unwrap_safelink(url: &str) -> String {
    if let Some(encoded) = SAFELINK_REGEX.captures(url).and_then(|caps| caps.get(1))
        && let Ok(decoded) = urlencoding::decode(encoded.as_str())
    {
        return decoded.into_owned();
    }
    url.to_string()
}
