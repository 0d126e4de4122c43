//! View module - UI rendering
//!
//! This module handles all UI rendering for the application using ratatui.
//! It is organized into submodules by component type:
//!
//! - `utils`: Shared utility functions (truncation, geometry)
//! - `layout`: Main layout structure (header, page nav, connect links, status bar)
//! - `content`: Page bodies and image cards
//! - `overlays`: Modal overlays (error, help, gallery)

mod utils;
mod layout;
mod content;
mod overlays;

use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use crate::model::{ContentViews, GalleryView, SocialLink, UiState, Visual};

pub use overlays::gallery_hit_test;

const HEADER_ROWS: u16 = 3;
const STATUS_ROWS: u16 = 1;
const SIDEBAR_COLS: u16 = 24;

/// Everything one frame needs, collected from the model before drawing
pub struct RenderState {
    pub ui_state: UiState,
    pub views: ContentViews,
    pub loading: bool,
    /// Nothing committed yet and no failure reported
    pub pending: bool,
    pub stale: bool,
    pub has_content: bool,
    /// The last refresh failed; cleared when a refresh succeeds
    pub failed: bool,
    /// Error overlay text, `None` once dismissed
    pub error: Option<String>,
    pub cards: Vec<Visual>,
    pub gallery: Option<GalleryView>,
    pub social: Vec<SocialLink>,
}

/// Rows available to the page body inside its border for a terminal height
pub fn body_rows(height: u16) -> u16 {
    height.saturating_sub(HEADER_ROWS + STATUS_ROWS + 2)
}

pub struct AppView;

impl AppView {
    pub fn render(frame: &mut Frame, state: &RenderState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_ROWS), // Artist name + active page
                Constraint::Min(0),              // Sidebar + page body
                Constraint::Length(STATUS_ROWS), // Freshness and key hints
            ])
            .split(frame.area());

        layout::render_header(frame, chunks[0], state);

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(SIDEBAR_COLS), // Pages + Connect
                Constraint::Min(0),               // Page body
            ])
            .split(chunks[1]);

        layout::render_sidebar(frame, main_chunks[0], &state.ui_state, &state.social);
        content::render_page(frame, main_chunks[1], state);
        layout::render_status_bar(frame, chunks[2], state);

        if let Some(gallery) = &state.gallery {
            overlays::render_gallery(frame, gallery);
        }

        if let Some(error) = &state.error {
            overlays::render_error_notification(frame, error);
        }

        if state.ui_state.show_help_popup {
            overlays::render_help_popup(frame);
        }
    }
}
