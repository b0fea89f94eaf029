use crate::cli::Args;
use crate::config::responses::{ CatalogSource, ResponseCatalog };
use crate::config::{ Settings, StagingDelays };
use crate::error::LuminaryError;
use crate::history::HistoryKind;
use crate::view::{ ConversationView, ViewEvent };
use log::{ error, info };
use std::sync::Arc;
use tokio::sync::{ mpsc, Mutex };

/// Shared by every connection: hands out a fresh view per client, built from
/// the startup configuration and the current response catalog.
pub struct ViewHost {
    args: Args,
    history_kind: HistoryKind,
    catalog: Mutex<CatalogSource>,
}

impl ViewHost {
    pub fn new(args: Args) -> Result<Self, LuminaryError> {
        // Fail at startup rather than on the first connection.
        let history_kind = HistoryKind::from_args(&args)?;

        let catalog = match &args.responses_path {
            Some(path) => CatalogSource::from_file(path)?,
            None => {
                info!("Using built-in response catalog");
                CatalogSource::builtin()
            }
        };

        Ok(Self { args, history_kind, catalog: Mutex::new(catalog) })
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn default_settings(&self) -> Settings {
        Settings::from_args(&self.args)
    }

    /// The catalog file is re-read if it changed; a broken edit keeps the
    /// previous catalog in service.
    pub async fn catalog(&self) -> Arc<ResponseCatalog> {
        let mut source = self.catalog.lock().await;
        if let Err(e) = source.reload_if_changed() {
            error!("Failed to reload response catalog, keeping previous one: {}", e);
        }
        source.current()
    }

    pub async fn open_view(&self) -> (ConversationView, mpsc::UnboundedReceiver<ViewEvent>) {
        let catalog = self.catalog().await;
        ConversationView::new(
            self.default_settings(),
            catalog,
            self.history_kind.create_store(),
            StagingDelays::from_args(&self.args),
            self.args.viewport_width
        )
    }
}
