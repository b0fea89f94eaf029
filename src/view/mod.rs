//! The conversation view: one transcript, its archive, the configuration
//! drawer and the layout flags, plus the timers that stage assistant replies.

pub mod exchange;
pub mod render;
pub mod scheduler;
pub mod state;

use crate::config::responses::ResponseCatalog;
use crate::config::{ Settings, StagingDelays };
use crate::history::HistoryStore;
use crate::models::chat::{ Conversation, Message };
use crate::models::websocket::ClientMessage;
use exchange::Exchange;
use log::debug;
use render::RenderedView;
use scheduler::Batch;
use state::ViewState;
use std::sync::Arc;
use tokio::sync::{ mpsc, Mutex };
use tokio::task::JoinHandle;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewEvent {
    MessageAppended(Message),
    Changed,
}

/// Owns the state of one view. Dropping it aborts every reply still waiting
/// on its timer.
pub struct ConversationView {
    state: Arc<Mutex<ViewState>>,
    delays: StagingDelays,
    events: mpsc::UnboundedSender<ViewEvent>,
    batches: mpsc::UnboundedSender<Batch>,
    scheduler: JoinHandle<()>,
}

impl ConversationView {
    pub fn new(
        settings: Settings,
        catalog: Arc<ResponseCatalog>,
        history: Box<dyn HistoryStore>,
        delays: StagingDelays,
        viewport_width: u32
    ) -> (Self, mpsc::UnboundedReceiver<ViewEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(ViewState::new(settings, catalog, history, viewport_width)));
        let (batches, scheduler) = scheduler::spawn(Arc::clone(&state), events.clone());
        let view = Self {
            state,
            delays,
            events,
            batches,
            scheduler,
        };
        (view, receiver)
    }

    fn notify(&self, event: ViewEvent) {
        // The receiver is gone once the connection closes; nothing left to tell.
        let _ = self.events.send(event);
    }

    /// The immediate message and the hand-off to the scheduler happen under
    /// one lock, so batches reach the scheduler in transcript order.
    async fn run_exchange(&self, exchange: Exchange) {
        let mut state = self.state.lock().await;
        let message = state.append(exchange.immediate);
        if !exchange.staged.is_empty() {
            let batch = Batch { start: Instant::now(), steps: exchange.staged };
            if self.batches.send(batch).is_err() {
                debug!("Scheduler stopped, dropping staged replies");
            }
        }
        drop(state);
        self.notify(ViewEvent::MessageAppended(message));
    }

    /// Appends the user's text and schedules the option menu. Empty text is
    /// ignored; returns whether anything was posted.
    pub async fn send_text(&self, text: &str) -> bool {
        let catalog = Arc::clone(self.state.lock().await.catalog());
        match Exchange::free_text(text, &catalog, &self.delays) {
            Some(exchange) => {
                self.state.lock().await.set_draft(String::new());
                self.run_exchange(exchange).await;
                true
            }
            None => false,
        }
    }

    pub async fn set_draft(&self, text: &str) {
        self.state.lock().await.set_draft(text);
        self.notify(ViewEvent::Changed);
    }

    pub async fn submit_draft(&self) -> bool {
        let draft = self.state.lock().await.take_draft();
        self.send_text(&draft).await
    }

    pub async fn select_option(&self, option: &str) {
        let catalog = Arc::clone(self.state.lock().await.catalog());
        self.run_exchange(Exchange::option(option, &catalog, &self.delays)).await;
    }

    pub async fn start_new_conversation(&self) {
        self.state.lock().await.start_new_conversation();
        self.notify(ViewEvent::Changed);
    }

    pub async fn load_conversation(&self, conversation_id: i64) -> bool {
        let loaded = self.state.lock().await.load_conversation(conversation_id);
        if loaded {
            self.notify(ViewEvent::Changed);
        }
        loaded
    }

    pub async fn toggle_config(&self) {
        self.state.lock().await.toggle_config();
        self.notify(ViewEvent::Changed);
    }

    pub async fn set_sidebar_collapsed(&self, collapsed: bool) {
        self.state.lock().await.set_sidebar_collapsed(collapsed);
        self.notify(ViewEvent::Changed);
    }

    pub async fn show_sidebar(&self) {
        self.state.lock().await.reveal_sidebar();
        self.notify(ViewEvent::Changed);
    }

    pub async fn resize(&self, width: u32) {
        self.state.lock().await.resize(width);
        self.notify(ViewEvent::Changed);
    }

    pub async fn set_creativity(&self, value: f64) {
        self.state.lock().await.settings_mut().set_creativity(value);
        self.notify(ViewEvent::Changed);
    }

    pub async fn set_max_tokens(&self, value: i64) {
        self.state.lock().await.settings_mut().set_max_tokens(value);
        self.notify(ViewEvent::Changed);
    }

    pub async fn set_web_search(&self, enabled: bool) {
        self.state.lock().await.settings_mut().web_search = enabled;
        self.notify(ViewEvent::Changed);
    }

    pub async fn set_memory_retention(&self, enabled: bool) {
        self.state.lock().await.settings_mut().memory_retention = enabled;
        self.notify(ViewEvent::Changed);
    }

    /// Routes one client frame to the matching operation.
    pub async fn apply(&self, message: ClientMessage) {
        debug!("Applying {:?}", message);
        match message {
            ClientMessage::Send { content } => {
                self.send_text(&content).await;
            }
            ClientMessage::Draft { content } => self.set_draft(&content).await,
            ClientMessage::Submit => {
                self.submit_draft().await;
            }
            ClientMessage::SelectOption { option } => self.select_option(&option).await,
            ClientMessage::NewConversation => self.start_new_conversation().await,
            ClientMessage::LoadConversation { id } => {
                self.load_conversation(id).await;
            }
            ClientMessage::ToggleConfig => self.toggle_config().await,
            ClientMessage::CollapseSidebar => self.set_sidebar_collapsed(true).await,
            ClientMessage::ExpandSidebar => self.set_sidebar_collapsed(false).await,
            ClientMessage::ShowSidebar => self.show_sidebar().await,
            ClientMessage::Resize { width } => self.resize(width).await,
            ClientMessage::SetCreativity { value } => self.set_creativity(value).await,
            ClientMessage::SetMaxTokens { value } => self.set_max_tokens(value).await,
            ClientMessage::SetWebSearch { enabled } => self.set_web_search(enabled).await,
            ClientMessage::SetMemoryRetention { enabled } => {
                self.set_memory_retention(enabled).await
            }
            ClientMessage::Render => self.notify(ViewEvent::Changed),
        }
    }

    pub async fn render(&self) -> RenderedView {
        render::render(&*self.state.lock().await)
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.state.lock().await.transcript().to_vec()
    }

    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.lock().await.conversations().to_vec()
    }

    pub async fn settings(&self) -> Settings {
        self.state.lock().await.settings().clone()
    }
}

impl Drop for ConversationView {
    fn drop(&mut self) {
        self.scheduler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::responses::{ GIVE_ME_ADVICE, TELL_ME_A_FACT };
    use crate::history::MemoryHistoryStore;
    use crate::models::chat::MessageRole;
    use std::time::Duration;

    fn view() -> (ConversationView, mpsc::UnboundedReceiver<ViewEvent>) {
        ConversationView::new(
            Settings::default(),
            Arc::new(ResponseCatalog::default()),
            Box::new(MemoryHistoryStore::default()),
            StagingDelays::default(),
            1024
        )
    }

    async fn next_message(rx: &mut mpsc::UnboundedReceiver<ViewEvent>) -> Message {
        loop {
            match rx.recv().await {
                Some(ViewEvent::MessageAppended(m)) => {
                    return m;
                }
                Some(ViewEvent::Changed) => {}
                None => panic!("view event channel closed"),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_text_posts_nothing() {
        let (view, mut rx) = view();
        assert!(!view.send_text("").await);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(view.transcript().await.len(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn text_gets_option_menu_after_delay() {
        let (view, mut rx) = view();
        assert!(view.send_text("hi").await);

        let transcript = view.transcript().await;
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[1].role, MessageRole::User);
        assert_eq!(transcript[1].content, "hi");
        assert_eq!(next_message(&mut rx).await.content, "hi");

        tokio::time::sleep(Duration::from_millis(499)).await;
        assert_eq!(view.transcript().await.len(), 2);

        let reply = next_message(&mut rx).await;
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.content, "Thanks for your message! Please select one of these options:");
        assert_eq!(reply.options.as_ref().map(Vec::len), Some(3));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(view.transcript().await.len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn fact_option_yields_honey_fact_then_follow_up() {
        let (view, mut rx) = view();
        view.select_option(TELL_ME_A_FACT).await;

        let echo = next_message(&mut rx).await;
        assert!(echo.is_option_message);
        assert_eq!(echo.role, MessageRole::User);

        let reply = next_message(&mut rx).await;
        assert!(reply.content.contains("honey never spoils"));
        assert!(reply.options.is_none());

        let follow_up = next_message(&mut rx).await;
        assert_eq!(follow_up.content, "Thanks for selecting an option! Please select another:");
        assert!(follow_up.has_options());

        let transcript = view.transcript().await;
        assert_eq!(transcript.len(), 4);
        assert!(transcript.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test(start_paused = true)]
    async fn overlapping_exchanges_interleave_by_deadline() {
        let (view, _rx) = view();
        view.select_option(GIVE_ME_ADVICE).await;
        view.send_text("hello?").await;

        tokio::time::sleep(Duration::from_secs(2)).await;
        let contents: Vec<String> = view
            .transcript().await
            .into_iter()
            .map(|m| m.content)
            .collect();
        assert_eq!(contents.len(), 6);
        assert_eq!(contents[1], GIVE_ME_ADVICE);
        assert_eq!(contents[2], "hello?");
        // text reply lands at 500ms, advice at 800ms, follow-up at 1300ms
        assert!(contents[3].starts_with("Thanks for your message!"));
        assert!(contents[4].contains("Feynman Technique"));
        assert!(contents[5].starts_with("Thanks for selecting an option!"));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_uses_and_clears_draft() {
        let (view, _rx) = view();
        view.set_draft("typed").await;
        assert_eq!(view.render().await.input.draft, "typed");

        assert!(view.submit_draft().await);
        assert_eq!(view.render().await.input.draft, "");
        assert_eq!(view.transcript().await[1].content, "typed");

        assert!(!view.submit_draft().await);
    }

    /// Applies `frame` and checks that the render differs from before only in
    /// the toggle at `index`, which now reads `enabled`.
    async fn assert_only_toggle_flips(view: &ConversationView, frame: ClientMessage, index: usize, enabled: bool) {
        let before = view.render().await;
        view.apply(frame).await;
        let after = view.render().await;

        let mut expected = before.clone();
        let panel = expected.sidebar.config_panel.as_mut().unwrap();
        assert_eq!(panel.toggles[index].enabled, !enabled);
        panel.toggles[index].enabled = enabled;
        assert_eq!(after, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn web_search_switch_flips_only_itself() {
        let (view, _rx) = view();
        view.toggle_config().await;

        assert_only_toggle_flips(&view, ClientMessage::SetWebSearch { enabled: true }, 0, true).await;
        assert_only_toggle_flips(&view, ClientMessage::SetWebSearch { enabled: false }, 0, false).await;
        assert!(!view.settings().await.web_search);
    }

    #[tokio::test(start_paused = true)]
    async fn memory_retention_switch_flips_only_itself() {
        let (view, _rx) = view();
        view.toggle_config().await;
        assert!(view.settings().await.memory_retention);

        assert_only_toggle_flips(
            &view,
            ClientMessage::SetMemoryRetention { enabled: false },
            1,
            false
        ).await;
        assert!(!view.settings().await.memory_retention);
        assert_only_toggle_flips(
            &view,
            ClientMessage::SetMemoryRetention { enabled: true },
            1,
            true
        ).await;
        assert_eq!(view.transcript().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_view_cancels_staged_replies() {
        let (view, mut rx) = view();
        view.send_text("bye").await;
        assert_eq!(next_message(&mut rx).await.content, "bye");
        drop(view);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn apply_routes_layout_frames() {
        let (view, _rx) = view();
        view.apply(ClientMessage::Resize { width: 600 }).await;
        assert!(view.render().await.header.show_menu_button);
        view.apply(ClientMessage::ShowSidebar).await;
        assert!(view.render().await.sidebar.visible);
        view.apply(ClientMessage::CollapseSidebar).await;
        assert_eq!(view.render().await.sidebar.width, 60);
        view.apply(ClientMessage::ExpandSidebar).await;
        assert_eq!(view.render().await.sidebar.width, 250);
        view.apply(ClientMessage::SetMaxTokens { value: 99999 }).await;
        assert_eq!(view.settings().await.max_tokens, 4096);
    }
}
