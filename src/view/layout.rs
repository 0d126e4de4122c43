//! Layout rendering (header, sidebar, status bar)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

use crate::model::{valid_url, Page, SocialLink, UiState};
use super::utils::truncate_string;
use super::RenderState;

pub fn render_header(frame: &mut Frame, area: Rect, state: &RenderState) {
    let tagline = if state.views.settings.short_bio.is_empty() {
        String::new()
    } else {
        let width = area.width.saturating_sub(30) as usize;
        truncate_string(&state.views.settings.short_bio, width)
    };

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", state.ui_state.active_page.label()),
            Style::default().fg(Color::Black).bg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(tagline, Style::default().fg(Color::Gray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" marquee ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(header, area);
}

pub fn render_sidebar(frame: &mut Frame, area: Rect, ui_state: &UiState, social: &[SocialLink]) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(Page::ALL.len() as u16 + 2), // Pages + borderlines
            Constraint::Min(0),                              // Connect links
        ])
        .split(area);

    let page_items: Vec<ListItem> = Page::ALL
        .iter()
        .enumerate()
        .map(|(i, page)| {
            let style = if *page == ui_state.active_page {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(format!("{} {}", i + 1, page.label())).style(style)
        })
        .collect();

    let pages = List::new(page_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Pages ")
            .padding(Padding::horizontal(1))
            .border_style(Style::default().fg(Color::Green)),
    );
    frame.render_widget(pages, chunks[0]);

    // A link without a usable URL still shows its label, dimmed
    let link_items: Vec<ListItem> = social
        .iter()
        .map(|link| {
            let url = valid_url(Some(&serde_json::Value::String(link.url.clone())));
            let style = match url {
                Some(_) => Style::default().fg(Color::Cyan),
                None => Style::default().fg(Color::DarkGray),
            };
            ListItem::new(format!("{} {}", link.kind.glyph(), link.kind.label())).style(style)
        })
        .collect();

    let links = List::new(link_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Connect ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(links, chunks[1]);
}

pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &RenderState) {
    let (label, color) = if state.loading {
        ("Loading...", Color::Yellow)
    } else if state.failed {
        ("Last refresh failed", Color::Red)
    } else if state.pending {
        ("Waiting for content", Color::DarkGray)
    } else if state.stale {
        ("Stale", Color::Yellow)
    } else if state.has_content {
        ("Up to date", Color::Green)
    } else {
        ("No content", Color::DarkGray)
    };

    let status = Paragraph::new(Line::from(vec![
        Span::styled(format!(" {} ", label), Style::default().fg(color)),
        Span::styled(
            "│ Tab pages  ↑↓ select  Enter gallery  r reload  u reload page  h help  q quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    frame.render_widget(status, area);
}
