//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and view, and starts content and media loads.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key and mouse event handling
//! - `navigation`: Page switching, refreshes, image mounting and the gallery
//! - `media_events`: Listener that feeds finished image loads back into the model

mod input;
mod navigation;
mod media_events;

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::model::{AppModel, MediaLoader};
use media_events::MediaEvent;

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<AppModel>,
    pub(crate) media_loader: Arc<dyn MediaLoader>,
    media_tx: mpsc::UnboundedSender<MediaEvent>,
}

impl AppController {
    /// Must be called inside the runtime; starts the media event listener
    pub fn new(model: Arc<AppModel>, media_loader: Arc<dyn MediaLoader>) -> Self {
        let (media_tx, media_rx) = mpsc::unbounded_channel();
        let controller = Self {
            model,
            media_loader,
            media_tx,
        };
        controller.start_media_event_listener(media_rx);
        controller
    }
}
