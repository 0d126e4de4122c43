//! Key and mouse event handling

use anyhow::Result;
use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::model::Page;
use crate::view::gallery_hit_test;
use super::AppController;

const WHEEL_ROWS: i32 = 3;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let model = &self.model;

        // The gallery owns the keyboard while its listener is attached
        if model.gallery.lock().await.is_open() {
            if key.code == KeyCode::Char('q') && key.modifiers.contains(KeyModifiers::CONTROL) {
                model.set_should_quit(true).await;
                return Ok(());
            }
            let (_, urls) = model.gallery.lock().await.handle_key(key.code);
            self.preload(urls).await;
            return Ok(());
        }

        // Handle error message first (blocks all other interactions)
        if model.visible_error().await.is_some() {
            return match key.code {
                KeyCode::Esc | KeyCode::Enter => {
                    model.dismiss_error().await;
                    Ok(())
                }
                KeyCode::Char('q') | KeyCode::Char('Q') => {
                    model.set_should_quit(true).await;
                    Ok(())
                }
                KeyCode::Char('r') | KeyCode::Char('R') => {
                    model.dismiss_error().await;
                    self.retry_failed_images().await;
                    self.refresh_all();
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        // Handle help popup
        if model.is_help_popup_open().await {
            return match key.code {
                KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H') => {
                    model.hide_help_popup().await;
                    Ok(())
                }
                _ => Ok(()),
            };
        }

        let active_page = model.get_ui_state().await.active_page;

        // Global keybindings
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                model.set_should_quit(true).await;
            }
            KeyCode::Tab => {
                let page = if key.modifiers.contains(KeyModifiers::SHIFT) {
                    active_page.prev()
                } else {
                    active_page.next()
                };
                self.activate_page(page).await;
            }
            KeyCode::BackTab => {
                self.activate_page(active_page.prev()).await;
            }
            KeyCode::Char(c @ '1'..='5') => {
                let index = c as usize - '1' as usize;
                self.activate_page(Page::ALL[index]).await;
            }
            KeyCode::Up => {
                model.move_selection(-1).await;
                self.sync_viewport().await;
            }
            KeyCode::Down => {
                model.move_selection(1).await;
                self.sync_viewport().await;
            }
            KeyCode::Enter => {
                self.open_gallery().await;
            }
            // Reload everything
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.retry_failed_images().await;
                self.refresh_all();
            }
            // Reload only what this page shows
            KeyCode::Char('u') | KeyCode::Char('U') => {
                self.refresh_current_category().await;
            }
            KeyCode::Char('h') | KeyCode::Char('H') => {
                model.toggle_help_popup().await;
            }
            _ => {}
        }
        Ok(())
    }

    pub async fn handle_mouse_event(&self, mouse: MouseEvent) -> Result<()> {
        let model = &self.model;
        let gallery_open = model.gallery.lock().await.is_open();

        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) if gallery_open => {
                let (width, height) = model.get_ui_state().await.screen;
                let target = gallery_hit_test(width, height, mouse.column, mouse.row);
                tracing::trace!(?target, column = mouse.column, row = mouse.row, "Gallery click");
                let urls = model.gallery.lock().await.click(target);
                self.preload(urls).await;
            }
            MouseEventKind::ScrollDown => {
                model.scroll_by(WHEEL_ROWS).await;
                self.sync_viewport().await;
            }
            MouseEventKind::ScrollUp => {
                model.scroll_by(-WHEEL_ROWS).await;
                self.sync_viewport().await;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crossterm::event::KeyEventState;
    use serde_json::json;

    use super::*;
    use crate::model::testing::{builder, loaded_store, NoopLoader, StaticSource};
    use crate::model::{AppModel, CARD_ROWS};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    async fn controller() -> AppController {
        let store = loaded_store(StaticSource {
            settings: json!({
                "gallery": [
                    { "asset": { "_ref": "image-a-10x10-jpg" } },
                    { "asset": { "_ref": "image-b-10x10-jpg" } },
                    { "asset": { "_ref": "image-c-10x10-jpg" } }
                ]
            }),
            ..StaticSource::default()
        })
        .await;
        let model = AppModel::new(store, builder(), Vec::new());
        AppController::new(Arc::new(model), Arc::new(NoopLoader))
    }

    #[tokio::test]
    async fn enter_opens_gallery_and_escape_closes_it_once() {
        let controller = controller().await;
        controller.model.set_screen(100, 40, 4 * CARD_ROWS).await;
        controller.handle_key_event(press(KeyCode::Char('2'))).await.unwrap();
        controller.handle_key_event(press(KeyCode::Down)).await.unwrap();
        controller.handle_key_event(press(KeyCode::Enter)).await.unwrap();
        assert_eq!(controller.model.gallery.lock().await.current_index(), Some(1));

        // Page selection does not move under the overlay
        controller.handle_key_event(press(KeyCode::Up)).await.unwrap();
        assert_eq!(controller.model.get_ui_state().await.selected, 1);
        assert_eq!(controller.model.gallery.lock().await.current_index(), Some(1));

        controller.handle_key_event(press(KeyCode::Esc)).await.unwrap();
        assert!(!controller.model.gallery.lock().await.is_open());
        assert_eq!(controller.model.surface.scroll_restores(), 1);
        assert_eq!(controller.model.surface.key_listener_count(), 0);
    }

    #[tokio::test]
    async fn number_keys_switch_pages() {
        let controller = controller().await;
        controller.handle_key_event(press(KeyCode::Char('4'))).await.unwrap();
        assert_eq!(controller.model.get_ui_state().await.active_page, Page::Shows);
        controller.handle_key_event(press(KeyCode::Tab)).await.unwrap();
        assert_eq!(controller.model.get_ui_state().await.active_page, Page::Contact);
        controller.handle_key_event(press(KeyCode::BackTab)).await.unwrap();
        assert_eq!(controller.model.get_ui_state().await.active_page, Page::Shows);
    }

    #[tokio::test]
    async fn backdrop_click_closes_gallery() {
        let controller = controller().await;
        controller.model.set_screen(100, 40, 30).await;
        controller.activate_page(Page::About).await;
        controller.handle_key_event(press(KeyCode::Enter)).await.unwrap();
        assert!(controller.model.gallery.lock().await.is_open());

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        };
        controller.handle_mouse_event(click).await.unwrap();
        assert!(!controller.model.gallery.lock().await.is_open());
    }
}
