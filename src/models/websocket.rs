use serde::{ Serialize, Deserialize };
use crate::view::render::RenderedView;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Send {
        content: String,
    },
    Draft {
        content: String,
    },
    Submit,
    SelectOption {
        option: String,
    },
    NewConversation,
    LoadConversation {
        id: i64,
    },
    ToggleConfig,
    CollapseSidebar,
    ExpandSidebar,
    ShowSidebar,
    Resize {
        width: u32,
    },
    SetCreativity {
        value: f64,
    },
    SetMaxTokens {
        value: i64,
    },
    SetWebSearch {
        enabled: bool,
    },
    SetMemoryRetention {
        enabled: bool,
    },
    Render,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Render {
        view: RenderedView,
        timestamp: i64,
    },
    Error {
        message: String,
    },
}
