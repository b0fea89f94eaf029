mod memory;

pub use memory::MemoryHistoryStore;

use crate::cli::Args;
use crate::error::LuminaryError;
use crate::models::chat::{ Conversation, Message };
use log::info;

/// Archive of previous conversations belonging to one view.
pub trait HistoryStore: Send + Sync {
    /// Stores a copy of `messages` under a freshly generated title and returns it.
    fn archive(&mut self, id: i64, messages: &[Message]) -> Conversation;

    fn get_conversation(&self, conversation_id: i64) -> Option<&Conversation>;

    fn list(&self) -> &[Conversation];
}

pub fn archive_title(position: usize) -> String {
    format!("Previous Conversation {}", position)
}

/// Backends a view can keep its previous conversations in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryKind {
    Memory,
}

impl std::str::FromStr for HistoryKind {
    type Err = LuminaryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" => Ok(HistoryKind::Memory),
            other => Err(LuminaryError::UnsupportedHistoryStore(other.to_string())),
        }
    }
}

impl HistoryKind {
    pub fn from_args(args: &Args) -> Result<Self, LuminaryError> {
        let kind = args.history_type.parse()?;
        info!("Previous conversations will be kept in: {}", args.history_type);
        Ok(kind)
    }

    pub fn create_store(self) -> Box<dyn HistoryStore> {
        match self {
            HistoryKind::Memory => Box::new(MemoryHistoryStore::default()),
        }
    }
}
