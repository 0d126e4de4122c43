//! Media event listener for finished image loads

use tokio::sync::mpsc::UnboundedReceiver;

use crate::model::{FetchError, ImageId, LoadRequest};
use super::AppController;

#[derive(Debug)]
pub enum MediaEvent {
    Loaded {
        id: ImageId,
        result: Result<(), FetchError>,
    },
}

impl AppController {
    pub(super) fn start_media_event_listener(&self, mut events: UnboundedReceiver<MediaEvent>) {
        let model = self.model.clone();
        tracing::info!("Starting media event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if model.should_quit().await {
                    tracing::debug!("Media event listener shutting down");
                    break;
                }

                match event {
                    MediaEvent::Loaded { id, result } => {
                        let ok = result.is_ok();
                        let changed = model.images.lock().await.complete(id, result);
                        tracing::trace!(id = id.0, ok, changed, "MediaEvent::Loaded");
                    }
                }
            }
        });
    }

    /// Start one spawned load per request; each reports back over the channel
    pub(crate) fn start_loads(&self, requests: Vec<LoadRequest>) {
        for LoadRequest { id, url } in requests {
            let loader = self.media_loader.clone();
            let tx = self.media_tx.clone();
            tokio::spawn(async move {
                crate::log_fetch_request!("load_image", id = id.0, url = %url);
                let result = loader.load(url).await;
                crate::log_fetch_result!("load_image", result);
                // The listener is gone once the app quits
                let _ = tx.send(MediaEvent::Loaded { id, result });
            });
        }
    }
}
