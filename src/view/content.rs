//! Page body rendering (text columns and image cards)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
    Frame,
};

use crate::model::{card_top, Page, Visual, CARD_ROWS, LOAD_ERROR};
use super::utils::truncate_string;
use super::RenderState;

const IMAGE_COLS: u16 = 26;

pub fn render_page(frame: &mut Frame, area: Rect, state: &RenderState) {
    let page = state.ui_state.active_page;
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} ", page.label()))
        .padding(Padding::horizontal(1))
        .border_style(Style::default().fg(Color::Green));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    // An empty but successful commit falls through to each page's own empty state
    if !state.has_content && (state.loading || state.pending || state.failed) {
        let (message, color) = if state.loading || state.pending {
            ("Loading...", Color::Yellow)
        } else {
            (LOAD_ERROR, Color::Red)
        };
        frame.render_widget(Paragraph::new(message).style(Style::default().fg(color)), inner);
        return;
    }

    match page {
        Page::Home => render_home(frame, inner, state),
        Page::About => render_about(frame, inner, state),
        Page::Music => render_music(frame, inner, state),
        Page::Shows => render_shows(frame, inner, state),
        Page::Contact => render_contact(frame, inner, state),
    }
}

fn split_text_and_cards(area: Rect) -> (Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);
    (chunks[0], chunks[1])
}

fn render_home(frame: &mut Frame, area: Rect, state: &RenderState) {
    let settings = &state.views.settings;
    let (text_area, card_area) = split_text_and_cards(area);

    let mut lines = vec![Line::from(Span::styled(
        "Welcome",
        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
    ))];
    lines.push(Line::from(""));
    if !settings.short_bio.is_empty() {
        lines.push(Line::from(settings.short_bio.clone()));
        lines.push(Line::from(""));
    }
    lines.push(Line::from(Span::styled(
        "Tab through Music, Shows and Contact",
        Style::default().fg(Color::DarkGray),
    )));
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), text_area);

    let cards = state
        .cards
        .iter()
        .map(|visual| (visual, vec![Line::from("Backdrop")]))
        .collect();
    render_cards(frame, card_area, cards, state);
}

fn render_about(frame: &mut Frame, area: Rect, state: &RenderState) {
    let settings = &state.views.settings;
    let (text_area, card_area) = split_text_and_cards(area);

    let mut lines: Vec<Line> = Vec::new();
    let bio = if settings.long_bio.is_empty() && !settings.short_bio.is_empty() {
        vec![settings.short_bio.clone()]
    } else {
        settings.long_bio.clone()
    };
    for paragraph in bio {
        lines.push(Line::from(paragraph));
        lines.push(Line::from(""));
    }
    if let Some(epk) = &settings.epk_url {
        lines.push(Line::from(vec![
            Span::styled("Press kit: ", Style::default().fg(Color::Gray)),
            Span::styled(epk.clone(), Style::default().fg(Color::Cyan)),
        ]));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), text_area);

    let has_portrait = settings.main_picture.is_some();
    let cards = state
        .cards
        .iter()
        .enumerate()
        .map(|(i, visual)| {
            let caption = if has_portrait && i == 0 {
                vec![Line::from("Portrait")]
            } else {
                let position = i + 1 - has_portrait as usize;
                vec![
                    Line::from(format!("Photo {} of {}", position, settings.gallery.len())),
                    Line::from(Span::styled("Enter to view", Style::default().fg(Color::DarkGray))),
                ]
            };
            (visual, caption)
        })
        .collect();
    render_cards(frame, card_area, cards, state);
}

fn render_music(frame: &mut Frame, area: Rect, state: &RenderState) {
    if state.views.releases.is_empty() {
        frame.render_widget(
            Paragraph::new("No releases yet").style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let width = area.width.saturating_sub(IMAGE_COLS + 3) as usize;
    let cards = state
        .views
        .releases
        .iter()
        .zip(&state.cards)
        .map(|(release, visual)| {
            let mut lines = vec![
                Line::from(Span::styled(
                    truncate_string(&release.title, width),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    release.release_date.clone(),
                    Style::default().fg(Color::Gray),
                )),
            ];
            let links: Vec<&str> = [
                release.stream_url.as_ref().map(|_| "Stream"),
                release.buy_url.as_ref().map(|_| "Buy"),
                release.lyrics_url.as_ref().map(|_| "Lyrics"),
            ]
            .into_iter()
            .flatten()
            .collect();
            if !links.is_empty() {
                lines.push(Line::from(Span::styled(
                    links.join(" · "),
                    Style::default().fg(Color::Cyan),
                )));
            }
            (visual, lines)
        })
        .collect();
    render_cards(frame, area, cards, state);
}

fn render_shows(frame: &mut Frame, area: Rect, state: &RenderState) {
    if state.views.shows.is_empty() {
        frame.render_widget(
            Paragraph::new("No upcoming shows").style(Style::default().fg(Color::DarkGray)),
            area,
        );
        return;
    }

    let width = area.width.saturating_sub(IMAGE_COLS + 3) as usize;
    let cards = state
        .views
        .shows
        .iter()
        .zip(&state.cards)
        .map(|(show, visual)| {
            let venue = match &show.city {
                Some(city) => format!("{}, {}", show.venue, city),
                None => show.venue.clone(),
            };
            let mut lines = vec![
                Line::from(Span::styled(
                    truncate_string(&venue, width),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{}  {}", show.date, show.time),
                    Style::default().fg(Color::Gray),
                )),
            ];
            if let Some(url) = &show.ticket_url {
                lines.push(Line::from(Span::styled(
                    truncate_string(&format!("Tickets: {}", url), width),
                    Style::default().fg(Color::Cyan),
                )));
            }
            (visual, lines)
        })
        .collect();
    render_cards(frame, area, cards, state);
}

fn render_contact(frame: &mut Frame, area: Rect, state: &RenderState) {
    let settings = &state.views.settings;
    let label = Style::default().fg(Color::Gray);
    let value = Style::default().fg(Color::Cyan);

    let mut lines = Vec::new();
    for (title, email, link) in [
        ("General", &settings.contact_email, &settings.contact_mailto),
        ("Booking", &settings.booking_email, &settings.booking_mailto),
    ] {
        lines.push(Line::from(Span::styled(
            title,
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )));
        match (email, link) {
            (Some(email), Some(link)) => {
                lines.push(Line::from(vec![
                    Span::styled("Email  ", label),
                    Span::styled(email.clone(), value),
                ]));
                lines.push(Line::from(vec![
                    Span::styled("Link   ", label),
                    Span::styled(link.clone(), value),
                ]));
            }
            _ => lines.push(Line::from(Span::styled(
                "Not available",
                Style::default().fg(Color::DarkGray),
            ))),
        }
        lines.push(Line::from(""));
    }
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

/// Cards stacked from the page's scroll row; each card is an image box plus caption
fn render_cards(
    frame: &mut Frame,
    area: Rect,
    cards: Vec<(&Visual, Vec<Line>)>,
    state: &RenderState,
) {
    let scroll_row = state.ui_state.scroll_row;
    let selected = state.ui_state.selected;

    for (i, (visual, caption)) in cards.into_iter().enumerate() {
        let top = card_top(i);
        if top.saturating_add(CARD_ROWS) <= scroll_row {
            continue;
        }
        let y = top - scroll_row.min(top);
        if y.saturating_add(CARD_ROWS) > area.height {
            break;
        }
        let card = Rect::new(area.x, area.y + y, area.width, CARD_ROWS);

        let border = if i == selected {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default().borders(Borders::ALL).border_style(border);
        let inner = block.inner(card);
        frame.render_widget(block, card);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(IMAGE_COLS), Constraint::Min(0)])
            .split(inner);
        render_image_box(frame, chunks[0], visual);
        frame.render_widget(
            Paragraph::new(caption).block(Block::default().padding(Padding::horizontal(1))),
            chunks[1],
        );
    }
}

fn render_image_box(frame: &mut Frame, area: Rect, visual: &Visual) {
    let width = area.width as usize;
    let widget = match visual {
        Visual::Placeholder { width: w, height: h } => {
            let fill = "░".repeat(width);
            let mut lines: Vec<Line> = (0..area.height.saturating_sub(1))
                .map(|_| Line::from(fill.clone()))
                .collect();
            lines.push(Line::from(format!("{}x{}", w, h)));
            Paragraph::new(lines).style(Style::default().fg(Color::DarkGray))
        }
        Visual::Image { src, alt, opacity } => {
            // Fade in: dim until fully opaque
            let style = if *opacity < 1.0 {
                Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)
            } else {
                Style::default().fg(Color::White)
            };
            let file = src.rsplit('/').next().unwrap_or(src.as_str());
            Paragraph::new(vec![
                Line::from(Span::styled(
                    format!("▣ {}", truncate_string(alt, width.saturating_sub(2))),
                    style,
                )),
                Line::from(Span::styled(
                    truncate_string(file, width),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        }
        Visual::Unavailable { .. } => {
            Paragraph::new("Image unavailable").style(Style::default().fg(Color::Red))
        }
    };
    frame.render_widget(widget, area);
}
