use super::{ archive_title, HistoryStore };
use crate::models::chat::{ Conversation, Message };

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    conversations: Vec<Conversation>,
}

impl HistoryStore for MemoryHistoryStore {
    fn archive(&mut self, id: i64, messages: &[Message]) -> Conversation {
        let conversation = Conversation {
            id,
            title: archive_title(self.conversations.len() + 1),
            messages: messages.to_vec(),
        };
        self.conversations.push(conversation.clone());
        conversation
    }

    fn get_conversation(&self, conversation_id: i64) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == conversation_id)
    }

    fn list(&self) -> &[Conversation] {
        &self.conversations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::MessageRole;

    #[test]
    fn titles_count_up_from_one() {
        let mut store = MemoryHistoryStore::default();
        let msgs = vec![Message::new(1, MessageRole::User, "hi")];
        assert_eq!(store.archive(10, &msgs).title, "Previous Conversation 1");
        assert_eq!(store.archive(11, &msgs).title, "Previous Conversation 2");
        assert_eq!(store.list().len(), 2);
    }

    #[test]
    fn lookup_by_id() {
        let mut store = MemoryHistoryStore::default();
        let msgs = vec![Message::new(1, MessageRole::User, "hi")];
        store.archive(42, &msgs);
        assert_eq!(store.get_conversation(42).map(|c| c.messages.clone()), Some(msgs));
        assert!(store.get_conversation(7).is_none());
    }
}
