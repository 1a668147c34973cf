use std::sync::RwLock;

use uuid::Uuid;

use crate::matches::MatchView;

/// Which conversation the chat surface is pointing at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatSelection {
    #[default]
    NoMatchSelected,
    MatchSelected(Uuid),
}

impl ChatSelection {
    pub fn match_id(&self) -> Option<Uuid> {
        match self {
            Self::NoMatchSelected => None,
            Self::MatchSelected(id) => Some(*id),
        }
    }
}

/// Chat-selection state machine. Selection transitions happen on explicit
/// user action; `sync_with_matches` handles the forced transition back to
/// `NoMatchSelected` when the selected match disappears from the match
/// list (the counterpart unliked), so the UI never points at a deleted
/// conversation.
#[derive(Default)]
pub struct ChatState {
    selection: RwLock<ChatSelection>,
}

impl ChatState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> ChatSelection {
        *self.selection.read().unwrap()
    }

    pub fn selected_match_id(&self) -> Option<Uuid> {
        self.current().match_id()
    }

    pub fn select(&self, match_id: Uuid) {
        *self.selection.write().unwrap() = ChatSelection::MatchSelected(match_id);
    }

    pub fn clear(&self) {
        *self.selection.write().unwrap() = ChatSelection::NoMatchSelected;
    }

    /// Returns true when the selection was forced back to
    /// `NoMatchSelected` because the selected match is gone.
    pub fn sync_with_matches(&self, matches: &[MatchView]) -> bool {
        let mut selection = self.selection.write().unwrap();
        if let ChatSelection::MatchSelected(selected) = *selection {
            if !matches.iter().any(|m| m.record.id == selected) {
                tracing::info!(match_id = %selected, "selected match disappeared, clearing chat selection");
                *selection = ChatSelection::NoMatchSelected;
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zim_shared::types::models::Match;

    fn view(match_id: Uuid) -> MatchView {
        let viewer = Uuid::new_v4();
        let other = Uuid::new_v4();
        MatchView {
            record: Match {
                id: match_id,
                user1_id: viewer,
                user2_id: other,
                created_at: Utc::now(),
            },
            other_user_id: other,
            other_profile: None,
            last_message: None,
            unread_count: 0,
        }
    }

    #[test]
    fn selection_transitions() {
        let chat = ChatState::new();
        assert_eq!(chat.current(), ChatSelection::NoMatchSelected);

        let id = Uuid::new_v4();
        chat.select(id);
        assert_eq!(chat.selected_match_id(), Some(id));

        chat.clear();
        assert_eq!(chat.current(), ChatSelection::NoMatchSelected);
    }

    #[test]
    fn sync_clears_selection_when_match_is_gone() {
        let chat = ChatState::new();
        let id = Uuid::new_v4();
        chat.select(id);

        let changed = chat.sync_with_matches(&[view(Uuid::new_v4())]);
        assert!(changed);
        assert_eq!(chat.current(), ChatSelection::NoMatchSelected);
    }

    #[test]
    fn sync_keeps_selection_when_match_is_present() {
        let chat = ChatState::new();
        let id = Uuid::new_v4();
        chat.select(id);

        let changed = chat.sync_with_matches(&[view(id)]);
        assert!(!changed);
        assert_eq!(chat.selected_match_id(), Some(id));
    }

    #[test]
    fn sync_without_selection_is_a_no_op() {
        let chat = ChatState::new();
        assert!(!chat.sync_with_matches(&[]));
    }
}
