//! Core type definitions for the application

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Which page of the site is currently shown
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Page {
    #[default]
    Home,
    About,
    Music,
    Shows,
    Contact,
}

impl Page {
    pub const ALL: [Page; 5] = [Page::Home, Page::About, Page::Music, Page::Shows, Page::Contact];

    pub fn next(self) -> Self {
        match self {
            Page::Home => Page::About,
            Page::About => Page::Music,
            Page::Music => Page::Shows,
            Page::Shows => Page::Contact,
            Page::Contact => Page::Home,
        }
    }

    pub fn prev(self) -> Self {
        match self {
            Page::Home => Page::Contact,
            Page::About => Page::Home,
            Page::Music => Page::About,
            Page::Shows => Page::Music,
            Page::Contact => Page::Shows,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Page::Home => "Home",
            Page::About => "About",
            Page::Music => "Music",
            Page::Shows => "Shows",
            Page::Contact => "Contact",
        }
    }

    /// The content category a targeted refresh of this page re-fetches
    pub fn category(self) -> Category {
        match self {
            Page::Music => Category::Releases,
            Page::Shows => Category::Shows,
            Page::Home | Page::About | Page::Contact => Category::SiteSettings,
        }
    }
}

/// One of the three independently fetched content categories
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    SiteSettings,
    Shows,
    Releases,
}

impl Category {
    #[cfg(test)]
    pub const ALL: [Category; 3] = [Category::SiteSettings, Category::Shows, Category::Releases];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::SiteSettings => "site_settings",
            Category::Shows => "shows",
            Category::Releases => "releases",
        }
    }

    /// Human wording used in error messages
    pub fn label(self) -> &'static str {
        match self {
            Category::SiteSettings => "site settings",
            Category::Shows => "shows",
            Category::Releases => "releases",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known social/streaming destinations shown in the "Connect" sidebar
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SocialKind {
    Instagram,
    Facebook,
    #[serde(alias = "tiktok")]
    TikTok,
    Spotify,
    AppleMusic,
    #[serde(alias = "youtube")]
    YouTube,
}

impl SocialKind {
    pub const ALL: [SocialKind; 6] = [
        SocialKind::Instagram,
        SocialKind::Facebook,
        SocialKind::TikTok,
        SocialKind::Spotify,
        SocialKind::AppleMusic,
        SocialKind::YouTube,
    ];

    /// (label, glyph) rendering table
    pub fn presentation(self) -> (&'static str, &'static str) {
        match self {
            SocialKind::Instagram => ("Instagram", "◎"),
            SocialKind::Facebook => ("Facebook", "ƒ"),
            SocialKind::TikTok => ("TikTok", "♪"),
            SocialKind::Spotify => ("Spotify", "◉"),
            SocialKind::AppleMusic => ("Apple Music", "♫"),
            SocialKind::YouTube => ("YouTube", "▶"),
        }
    }

    pub fn label(self) -> &'static str {
        self.presentation().0
    }

    pub fn glyph(self) -> &'static str {
        self.presentation().1
    }
}

/// A configured social link; `url` is validated before display
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub kind: SocialKind,
    #[serde(default)]
    pub url: String,
}

/// UI state for the application
#[derive(Clone, Debug, Default)]
pub struct UiState {
    pub active_page: Page,
    /// Pages that already asked the store for fresh content
    pub visited_pages: HashSet<Page>,
    /// Selected card on the active page
    pub selected: usize,
    /// First visible row of the active page body
    pub scroll_row: u16,
    /// Height in rows of the page body, updated on every draw
    pub body_rows: u16,
    /// Terminal size as of the last draw
    pub screen: (u16, u16),
    /// Failure number the user dismissed; the next failure shows again
    pub dismissed_error: Option<u64>,
    pub show_help_popup: bool,
}
