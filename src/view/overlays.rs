//! Overlay rendering (error notification, help popup, gallery)

use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::model::{ClickTarget, GalleryView};
use super::utils::{centered_rect, contains, truncate_string};

const CONTROL_COLS: u16 = 5;

pub fn render_error_notification(frame: &mut Frame, error_msg: &str) {
    let area = frame.area();

    let popup_width = 52.min(area.width.saturating_sub(4));
    let inner_width = popup_width.saturating_sub(4).max(1) as usize;
    let error_line_count = error_msg.chars().count().div_ceil(inner_width) as u16 + 2;

    // Borders plus message plus the retry hint
    let popup_height = (2 + error_line_count).min(area.height.saturating_sub(4));

    let popup_area = Rect {
        x: area.width.saturating_sub(popup_width) / 2,
        y: area.height.saturating_sub(popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let text = vec![
        Line::from(Span::styled(error_msg.to_string(), Style::default().fg(Color::Red))),
        Line::from(""),
        Line::from(Span::styled("Press r to retry", Style::default().fg(Color::DarkGray))),
    ];
    let error_widget = Paragraph::new(text).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Error (Esc to dismiss) ")
            .title_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(error_widget, popup_area);
}

pub fn render_help_popup(frame: &mut Frame) {
    let area = frame.area();

    let keybindings = [
        ("", "── Pages ──"),
        ("Tab / Shift+Tab", "Next / previous page"),
        ("1-5", "Jump to page"),
        ("↑ / ↓", "Move selection"),
        ("Wheel", "Scroll page"),
        ("", ""),
        ("", "── Gallery (About) ──"),
        ("Enter", "Open at selected image"),
        ("← / →", "Previous / next image"),
        ("Esc / click outside", "Close"),
        ("", ""),
        ("", "── Content ──"),
        ("R", "Reload all content"),
        ("U", "Reload this page's content"),
        ("", ""),
        ("", "── General ──"),
        ("H", "Toggle this help"),
        ("Q", "Quit"),
    ];

    let popup_width = 62.min(area.width);
    let popup_height = (keybindings.len() as u16 + 2).min(area.height.saturating_sub(4));

    let popup_area = Rect {
        x: area.width.saturating_sub(popup_width) / 2,
        y: area.height.saturating_sub(popup_height) / 2,
        width: popup_width,
        height: popup_height,
    };

    frame.render_widget(Clear, popup_area);

    let lines: Vec<Line> = keybindings
        .iter()
        .map(|(key, desc)| {
            if key.is_empty() {
                Line::from(Span::styled(
                    format!("{:^38}", desc),
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::from(vec![
                    Span::styled(
                        format!("{:>20}", key),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    ),
                    Span::raw("  "),
                    Span::styled(desc.to_string(), Style::default().fg(Color::White)),
                ])
            }
        })
        .collect();

    let help_text = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Help (H or Esc to close) ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black)),
    );

    frame.render_widget(help_text, popup_area);
}

/// Regions of the gallery overlay for a given screen size
struct GalleryAreas {
    panel: Rect,
    close: Rect,
    previous: Rect,
    next: Rect,
    image: Rect,
}

fn gallery_areas(width: u16, height: u16) -> GalleryAreas {
    let panel = centered_rect(Rect::new(0, 0, width, height), 70, 70);
    let inner = Rect {
        x: panel.x + 1,
        y: panel.y + 1,
        width: panel.width.saturating_sub(2),
        height: panel.height.saturating_sub(2),
    };
    let control = CONTROL_COLS.min(inner.width / 3);
    GalleryAreas {
        panel,
        close: Rect::new(panel.x + panel.width.saturating_sub(4), panel.y, 3, 1),
        previous: Rect::new(inner.x, inner.y, control, inner.height),
        next: Rect::new(inner.x + inner.width - control, inner.y, control, inner.height),
        image: Rect::new(inner.x + control, inner.y, inner.width - 2 * control, inner.height),
    }
}

/// Map a click on the gallery overlay to what it hit
pub fn gallery_hit_test(width: u16, height: u16, column: u16, row: u16) -> ClickTarget {
    let areas = gallery_areas(width, height);
    if contains(areas.close, column, row) {
        ClickTarget::CloseControl
    } else if !contains(areas.panel, column, row) {
        ClickTarget::Backdrop
    } else if contains(areas.previous, column, row) {
        ClickTarget::Previous
    } else if contains(areas.next, column, row) {
        ClickTarget::Next
    } else {
        // Frame and image both belong to the image
        ClickTarget::Image
    }
}

pub fn render_gallery(frame: &mut Frame, gallery: &GalleryView) {
    let screen = frame.area();
    if screen.width < 20 || screen.height < 8 {
        return;
    }
    let areas = gallery_areas(screen.width, screen.height);

    // Dimmed backdrop over the whole page
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Black).fg(Color::DarkGray)),
        screen,
    );
    frame.render_widget(Clear, areas.panel);

    let title = match &gallery.counter {
        Some(counter) => format!(" Gallery {} ", counter),
        None => " Gallery ".to_string(),
    };
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title)
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black)),
        areas.panel,
    );
    frame.render_widget(
        Paragraph::new("[x]").style(Style::default().fg(Color::Red)),
        areas.close,
    );

    if gallery.counter.is_some() {
        let arrow_row = |area: Rect| Rect::new(area.x, area.y + area.height / 2, area.width, 1);
        frame.render_widget(
            Paragraph::new(" ◀ ").alignment(Alignment::Center),
            arrow_row(areas.previous),
        );
        frame.render_widget(
            Paragraph::new(" ▶ ").alignment(Alignment::Center),
            arrow_row(areas.next),
        );
    }

    let width = areas.image.width.saturating_sub(2) as usize;
    let body = match &gallery.url {
        Some(url) => vec![
            Line::from(Span::styled(
                gallery.alt.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                truncate_string(url, width),
                Style::default().fg(Color::DarkGray),
            )),
        ],
        None => vec![Line::from(Span::styled(
            "Image unavailable",
            Style::default().fg(Color::Red),
        ))],
    };
    let image_area = Rect {
        y: areas.image.y + areas.image.height / 3,
        height: areas.image.height - areas.image.height / 3,
        ..areas.image
    };
    frame.render_widget(
        Paragraph::new(body).alignment(Alignment::Center).wrap(Wrap { trim: true }),
        image_area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_test_distinguishes_backdrop_from_panel() {
        let (w, h) = (100, 40);
        let areas = gallery_areas(w, h);
        assert_eq!(gallery_hit_test(w, h, 0, 0), ClickTarget::Backdrop);
        assert_eq!(gallery_hit_test(w, h, 99, 39), ClickTarget::Backdrop);
        assert_eq!(
            gallery_hit_test(w, h, areas.image.x + 2, areas.image.y + 2),
            ClickTarget::Image
        );
        assert_eq!(
            gallery_hit_test(w, h, areas.previous.x, areas.previous.y + 1),
            ClickTarget::Previous
        );
        assert_eq!(
            gallery_hit_test(w, h, areas.next.x + areas.next.width - 1, areas.next.y),
            ClickTarget::Next
        );
        assert_eq!(
            gallery_hit_test(w, h, areas.close.x + 1, areas.close.y),
            ClickTarget::CloseControl
        );
    }
}
