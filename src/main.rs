mod config;
mod controller;
mod logging;
mod model;
mod view;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use controller::AppController;
use model::{
    AppModel, ContentSource, ContentStore, FetchPolicy, HttpMediaLoader, ImageUrlBuilder, Page,
    SanityClient,
};
use view::{AppView, RenderState};

/// Terminal preview of a performing artist's site
#[derive(Parser, Debug)]
#[command(name = "marquee", version, about)]
struct Cli {
    /// Config file (defaults to <config dir>/marquee/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== marquee starting ===");

    let cfg = config::load(config::LoadOptions {
        config_file: cli.config,
        env_prefix: None,
    })?;
    tracing::info!(
        project = %cfg.sanity.project_id,
        dataset = %cfg.sanity.dataset,
        ttl = ?cfg.cache.ttl,
        "Configuration loaded"
    );

    let source: Arc<dyn ContentSource> = Arc::new(SanityClient::new(&cfg.sanity)?);
    let store = ContentStore::new(source, FetchPolicy::from(&cfg.cache));
    let builder = ImageUrlBuilder::new(cfg.sanity.project_id.clone(), cfg.sanity.dataset.clone());
    let media_loader = HttpMediaLoader::new(cfg.cache.fetch_timeout)?.shared();

    let model = Arc::new(AppModel::new(store, builder, cfg.social));

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let controller = AppController::new(model.clone(), media_loader);
    controller.activate_page(Page::Home).await;

    let res = run_app(&mut terminal, model, controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("marquee shutting down");
    Ok(())
}

async fn collect_render_state(model: &AppModel) -> RenderState {
    let snapshot = model.snapshot();
    RenderState {
        ui_state: model.get_ui_state().await,
        views: model.views(),
        loading: snapshot.loading,
        pending: snapshot.is_pending(),
        stale: model.store.is_stale(),
        has_content: snapshot.site_settings.is_some()
            || !snapshot.shows.is_empty()
            || !snapshot.releases.is_empty(),
        failed: snapshot.error.is_some(),
        error: model.visible_error().await,
        cards: model.card_visuals().await,
        gallery: model.gallery_view().await,
        social: model.social.clone(),
    }
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<AppModel>,
    controller: AppController,
) -> io::Result<()> {
    let mut snapshot_rx = model.store.subscribe();

    loop {
        // A commit may change which images the page shows
        if snapshot_rx.has_changed().unwrap_or(false) {
            snapshot_rx.mark_unchanged();
            controller.reconcile_page_images().await;
        }

        let size = terminal.size()?;
        model
            .set_screen(size.width, size.height, view::body_rows(size.height))
            .await;

        let state = collect_render_state(&model).await;

        terminal.draw(|f| {
            AppView::render(f, &state);
        })?;

        // Short poll keeps fade-ins and loading state moving
        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) => {
                    let _ = controller.handle_key_event(key).await;
                }
                Event::Mouse(mouse) => {
                    let _ = controller.handle_mouse_event(mouse).await;
                }
                Event::Resize(..) => {
                    controller.sync_viewport().await;
                }
                _ => {}
            }
        }

        if model.should_quit().await {
            break;
        }
    }

    Ok(())
}
