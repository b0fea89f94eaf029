use super::state::ViewState;
use crate::config::{ CREATIVITY_MAX, CREATIVITY_MIN, MAX_TOKENS_MAX, MAX_TOKENS_MIN };
use crate::models::chat::{ Message, MessageRole };
use serde::{ Deserialize, Serialize };

pub const BRAND: &str = "Luminary";
pub const SIDEBAR_EXPANDED_WIDTH: u32 = 250;
pub const SIDEBAR_COLLAPSED_WIDTH: u32 = 60;
pub const NO_CONVERSATIONS: &str = "No previous conversations";
pub const STATUS_READY: &str = "Ready";
pub const INPUT_PLACEHOLDER: &str = "Type your message...";
/// Header buttons with no behaviour attached.
pub const HEADER_ACTIONS: [&str; 2] = ["Share", "Invite"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedView {
    pub sidebar: SidebarView,
    pub header: HeaderView,
    pub transcript: Vec<MessageView>,
    pub input: InputView,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SidebarView {
    pub visible: bool,
    pub collapsed: bool,
    pub width: u32,
    /// `None` while collapsed; the collapsed rail only shows icons.
    pub brand: Option<String>,
    pub config_open: bool,
    pub config_panel: Option<ConfigPanelView>,
    pub history: Option<HistoryView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigPanelView {
    pub creativity: f64,
    pub creativity_label: String,
    pub creativity_fill_percent: f64,
    pub max_tokens: i64,
    pub max_tokens_label: String,
    pub max_tokens_fill_percent: f64,
    pub toggles: Vec<ToggleView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleView {
    pub label: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryView {
    pub entries: Vec<HistoryEntryView>,
    pub placeholder: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntryView {
    pub id: i64,
    pub title: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeaderView {
    pub model: String,
    pub status: String,
    pub show_menu_button: bool,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageView {
    pub id: i64,
    pub role: MessageRole,
    pub content: String,
    pub options: Vec<String>,
    pub is_option_message: bool,
    pub alignment: Alignment,
    pub activity_dot: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputView {
    pub draft: String,
    pub placeholder: String,
}

/// Position of `value` along a slider track, 0 to 100.
pub fn fill_percent(value: f64, min: f64, max: f64) -> f64 {
    ((value - min) / (max - min)) * 100.0
}

impl From<&Message> for MessageView {
    fn from(message: &Message) -> Self {
        let alignment = match message.role {
            MessageRole::User => Alignment::Right,
            _ => Alignment::Left,
        };
        Self {
            id: message.id,
            role: message.role,
            content: message.content.clone(),
            options: message.options.clone().unwrap_or_default(),
            is_option_message: message.is_option_message,
            alignment,
            activity_dot: message.role == MessageRole::Assistant,
        }
    }
}

fn config_panel(state: &ViewState) -> ConfigPanelView {
    let settings = state.settings();
    ConfigPanelView {
        creativity: settings.creativity,
        creativity_label: format!("Creativity: {:.1}", settings.creativity),
        creativity_fill_percent: fill_percent(settings.creativity, CREATIVITY_MIN, CREATIVITY_MAX),
        max_tokens: settings.max_tokens,
        max_tokens_label: format!("Max Tokens: {}", settings.max_tokens),
        max_tokens_fill_percent: fill_percent(
            settings.max_tokens as f64,
            MAX_TOKENS_MIN as f64,
            MAX_TOKENS_MAX as f64
        ),
        toggles: vec![
            ToggleView { label: "Web Search".to_string(), enabled: settings.web_search },
            ToggleView { label: "Memory Retention".to_string(), enabled: settings.memory_retention }
        ],
    }
}

fn history(state: &ViewState) -> HistoryView {
    let current = state.current_conversation_id();
    let entries: Vec<HistoryEntryView> = state
        .conversations()
        .iter()
        .map(|c| HistoryEntryView {
            id: c.id,
            title: c.title.clone(),
            active: current == Some(c.id),
        })
        .collect();
    let placeholder = entries.is_empty().then(|| NO_CONVERSATIONS.to_string());
    HistoryView { entries, placeholder }
}

pub fn render(state: &ViewState) -> RenderedView {
    let collapsed = state.sidebar_collapsed();
    let sidebar = if collapsed {
        SidebarView {
            visible: state.show_sidebar(),
            collapsed,
            width: SIDEBAR_COLLAPSED_WIDTH,
            brand: None,
            config_open: state.config_open(),
            config_panel: None,
            history: None,
        }
    } else {
        SidebarView {
            visible: state.show_sidebar(),
            collapsed,
            width: SIDEBAR_EXPANDED_WIDTH,
            brand: Some(BRAND.to_string()),
            config_open: state.config_open(),
            config_panel: state.config_open().then(|| config_panel(state)),
            history: Some(history(state)),
        }
    };

    RenderedView {
        sidebar,
        header: HeaderView {
            model: state.settings().model.clone(),
            status: STATUS_READY.to_string(),
            show_menu_button: !state.show_sidebar(),
            actions: HEADER_ACTIONS.iter().map(|a| a.to_string()).collect(),
        },
        transcript: state.transcript().iter().map(MessageView::from).collect(),
        input: InputView {
            draft: state.draft().to_string(),
            placeholder: INPUT_PLACEHOLDER.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::responses::ResponseCatalog;
    use crate::config::Settings;
    use crate::history::MemoryHistoryStore;
    use crate::view::exchange::PendingMessage;
    use std::sync::Arc;

    fn state() -> ViewState {
        ViewState::new(
            Settings::default(),
            Arc::new(ResponseCatalog::default()),
            Box::new(MemoryHistoryStore::default()),
            1024
        )
    }

    #[test]
    fn initial_render() {
        let view = render(&state());
        assert!(view.sidebar.visible);
        assert_eq!(view.sidebar.width, 250);
        assert_eq!(view.sidebar.brand.as_deref(), Some("Luminary"));
        assert!(view.sidebar.config_panel.is_none());
        let history = view.sidebar.history.unwrap();
        assert!(history.entries.is_empty());
        assert_eq!(history.placeholder.as_deref(), Some("No previous conversations"));
        assert_eq!(view.header.model, "Luminous");
        assert_eq!(view.header.status, "Ready");
        assert!(!view.header.show_menu_button);
        assert_eq!(view.header.actions, vec!["Share", "Invite"]);
        assert_eq!(view.transcript.len(), 1);
        assert_eq!(view.transcript[0].alignment, Alignment::Left);
        assert!(view.transcript[0].activity_dot);
        assert_eq!(view.input.placeholder, "Type your message...");
    }

    #[test]
    fn open_drawer_shows_labels_and_fill() {
        let mut s = state();
        s.toggle_config();
        let panel = render(&s).sidebar.config_panel.unwrap();
        assert_eq!(panel.creativity_label, "Creativity: 0.7");
        assert!((panel.creativity_fill_percent - 70.0).abs() < 1e-9);
        assert_eq!(panel.max_tokens_label, "Max Tokens: 1024");
        assert!((panel.max_tokens_fill_percent - 20.0).abs() < 1e-9);
        assert_eq!(panel.toggles[0], ToggleView { label: "Web Search".into(), enabled: false });
        assert_eq!(panel.toggles[1], ToggleView {
            label: "Memory Retention".into(),
            enabled: true,
        });
    }

    #[test]
    fn collapsed_rail_hides_drawer_and_history() {
        let mut s = state();
        s.toggle_config();
        s.set_sidebar_collapsed(true);
        let view = render(&s);
        assert_eq!(view.sidebar.width, 60);
        assert!(view.sidebar.brand.is_none());
        assert!(view.sidebar.config_open);
        assert!(view.sidebar.config_panel.is_none());
        assert!(view.sidebar.history.is_none());
    }

    #[test]
    fn user_messages_align_right() {
        let mut s = state();
        s.append(PendingMessage::new(MessageRole::User, "hi"));
        let view = render(&s);
        assert_eq!(view.transcript[1].alignment, Alignment::Right);
        assert!(!view.transcript[1].activity_dot);
        assert!(view.transcript[1].options.is_empty());
    }

    #[test]
    fn loaded_conversation_is_highlighted() {
        let mut s = state();
        s.append(PendingMessage::new(MessageRole::User, "hi"));
        s.start_new_conversation();
        let id = s.conversations()[0].id;
        s.load_conversation(id);

        let entries = render(&s).sidebar.history.unwrap().entries;
        assert_eq!(entries.len(), 1);
        assert!(entries[0].active);
        assert_eq!(entries[0].title, "Previous Conversation 1");
    }

    #[test]
    fn narrow_viewport_shows_menu_button() {
        let mut s = state();
        s.resize(500);
        let view = render(&s);
        assert!(!view.sidebar.visible);
        assert!(view.header.show_menu_button);
    }
}
