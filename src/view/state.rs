use super::exchange::PendingMessage;
use crate::config::responses::ResponseCatalog;
use crate::config::Settings;
use crate::history::HistoryStore;
use crate::models::chat::{ Conversation, Message, MessageRole };
use chrono::Utc;
use log::debug;
use std::sync::Arc;

/// Below this viewport width the sidebar is hidden.
pub const SIDEBAR_BREAKPOINT: u32 = 768;

/// Wall-clock millisecond identifiers, bumped so that two ids handed out in
/// the same millisecond still differ.
#[derive(Debug, Default)]
pub struct MessageIds {
    last: i64,
}

impl MessageIds {
    pub fn next(&mut self) -> i64 {
        let id = Utc::now().timestamp_millis().max(self.last + 1);
        self.last = id;
        id
    }
}

pub struct ViewState {
    transcript: Vec<Message>,
    draft: String,
    settings: Settings,
    config_open: bool,
    show_sidebar: bool,
    sidebar_collapsed: bool,
    viewport_width: u32,
    current_conversation_id: Option<i64>,
    history: Box<dyn HistoryStore>,
    catalog: Arc<ResponseCatalog>,
    ids: MessageIds,
}

impl ViewState {
    pub fn new(
        settings: Settings,
        catalog: Arc<ResponseCatalog>,
        history: Box<dyn HistoryStore>,
        viewport_width: u32
    ) -> Self {
        let mut state = Self {
            transcript: Vec::new(),
            draft: String::new(),
            settings,
            config_open: false,
            show_sidebar: true,
            sidebar_collapsed: false,
            viewport_width,
            current_conversation_id: None,
            history,
            catalog,
            ids: MessageIds::default(),
        };
        state.resize(viewport_width);
        state.ensure_greeting();
        state
    }

    fn ensure_greeting(&mut self) {
        if self.transcript.is_empty() {
            let greeting = PendingMessage::new(
                MessageRole::Assistant,
                self.catalog.greeting.as_str()
            ).with_options(&self.catalog.options);
            self.append(greeting);
        }
    }

    pub fn append(&mut self, pending: PendingMessage) -> Message {
        let message = pending.into_message(self.ids.next());
        self.transcript.push(message.clone());
        message
    }

    pub fn catalog(&self) -> &Arc<ResponseCatalog> {
        &self.catalog
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn take_draft(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn conversations(&self) -> &[Conversation] {
        self.history.list()
    }

    pub fn current_conversation_id(&self) -> Option<i64> {
        self.current_conversation_id
    }

    pub fn config_open(&self) -> bool {
        self.config_open
    }

    pub fn show_sidebar(&self) -> bool {
        self.show_sidebar
    }

    pub fn sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }

    pub fn viewport_width(&self) -> u32 {
        self.viewport_width
    }

    /// Anything beyond the greeting makes the transcript worth archiving.
    fn is_archivable(&self) -> bool {
        self.transcript.len() > 1
    }

    fn archive_current(&mut self) {
        if self.is_archivable() {
            let id = self.ids.next();
            let conversation = self.history.archive(id, &self.transcript);
            debug!("Archived '{}' with {} messages", conversation.title, conversation.messages.len());
        }
    }

    pub fn start_new_conversation(&mut self) {
        self.archive_current();
        self.transcript.clear();
        self.current_conversation_id = None;
        self.ensure_greeting();
        debug!("Started new conversation ({} archived)", self.history.list().len());
    }

    /// Returns false when no archived conversation has this id.
    pub fn load_conversation(&mut self, conversation_id: i64) -> bool {
        let messages = match self.history.get_conversation(conversation_id) {
            Some(conversation) => conversation.messages.clone(),
            None => {
                debug!("Conversation {} not found, ignoring", conversation_id);
                return false;
            }
        };

        if self.current_conversation_id != Some(conversation_id) {
            self.archive_current();
        }
        self.transcript = messages;
        self.current_conversation_id = Some(conversation_id);
        true
    }

    pub fn toggle_config(&mut self) {
        self.config_open = !self.config_open;
    }

    pub fn set_sidebar_collapsed(&mut self, collapsed: bool) {
        self.sidebar_collapsed = collapsed;
    }

    pub fn reveal_sidebar(&mut self) {
        self.show_sidebar = true;
    }

    pub fn resize(&mut self, width: u32) {
        self.viewport_width = width;
        self.show_sidebar = width >= SIDEBAR_BREAKPOINT;
    }
}
