//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the application.
//! It is organized into submodules by responsibility:
//!
//! - `types`: Core type definitions (pages, categories, social links, UI state)
//! - `sanity_client`: Remote content service client and fetch errors
//! - `media`: Asset references and CDN URL building
//! - `accessors`: Safe field access with typed fallbacks
//! - `content`: The cached snapshot and the page views built from it
//! - `cache`: Content store with TTL, coalescing and all-or-nothing commits
//! - `lazy_image`: Viewport-triggered image loading state machine
//! - `surface`: Scroll lock and key listener guards
//! - `gallery`: Modal gallery navigation
//! - `app_model`: Main application model with state management methods
//! - `testing`: Test fixtures (fake content source and media loader)

mod types;
mod sanity_client;
mod media;
mod accessors;
mod content;
mod cache;
mod lazy_image;
mod surface;
mod gallery;
mod app_model;

#[cfg(test)]
pub mod testing;

// Re-export all public types for convenient access
pub use types::{Page, SocialKind, SocialLink, UiState};

pub use sanity_client::{ContentSource, FetchError, SanityClient};

pub use media::{HttpMediaLoader, ImageUrlBuilder, MediaLoader};

pub use accessors::valid_url;

pub use content::{ContentViews, LOAD_ERROR};

pub use cache::{ContentStore, FetchPolicy, RefreshOutcome};

pub use lazy_image::{ImageId, LoadRequest, Visual};

pub use gallery::{ClickTarget, GalleryView};

pub use app_model::{card_top, AppModel, CARD_ROWS};
