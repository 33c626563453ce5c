//! Client state.

use std::collections::HashMap;
use std::time::Duration;

use chatline_core::protocol::BROADCAST;

use crate::intent::Intent;

pub const MAX_DRAFT_CHARS: usize = 200;
pub const BLINK_INTERVAL: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Chat,
}

/// Which pane receives keys while in [`View::Chat`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Chat,
    Roster,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub sender: String,
    pub body: String,
    /// Sent locally, server echo not seen yet.
    pub pending: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversation {
    pub lines: Vec<Line>,
    pub unread: usize,
}

impl Conversation {
    /// Mark the oldest matching pending line as confirmed.
    pub(crate) fn confirm(&mut self, sender: &str, body: &str) -> bool {
        match self
            .lines
            .iter_mut()
            .find(|l| l.pending && l.sender == sender && l.body == body)
        {
            Some(line) => {
                line.pending = false;
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub view: View,
    pub focus: Focus,

    // Login
    pub name_input: String,
    pub login_helper: String,

    // Roster: entry 0 is always the broadcast conversation.
    pub roster: Vec<String>,
    pub selected: usize,

    // Chat
    pub conversations: HashMap<String, Conversation>,
    pub draft: String,
    /// Connection status shown under the transcript.
    pub status: Option<String>,
    pub blink_on: bool,

    // Shared
    pub username: String,
    pub connected: bool,
    /// A `Listen` is outstanding.
    pub listening: bool,
    pub quitting: bool,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Self {
        Self {
            view: View::Login,
            focus: Focus::Chat,
            name_input: String::new(),
            login_helper: String::new(),
            roster: vec![BROADCAST.to_string()],
            selected: 0,
            conversations: HashMap::new(),
            draft: String::new(),
            status: None,
            blink_on: false,
            username: String::new(),
            connected: false,
            listening: false,
            quitting: false,
        }
    }

    /// Intents to run once at startup.
    pub fn init(&self) -> Vec<Intent> {
        vec![Intent::Connect, Intent::ScheduleTick(BLINK_INTERVAL)]
    }

    /// Key of the conversation currently shown.
    pub fn selected_key(&self) -> &str {
        self.roster
            .get(self.selected)
            .map(String::as_str)
            .unwrap_or(BROADCAST)
    }

    pub fn conversation(&self, key: &str) -> Option<&Conversation> {
        self.conversations.get(key)
    }

    pub fn unread(&self, key: &str) -> usize {
        self.conversations.get(key).map(|c| c.unread).unwrap_or(0)
    }
}
