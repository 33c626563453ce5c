//! The fold: `(Model, Event) -> (Model, Vec<Intent>)`.
//!
//! No I/O happens here. Every effect is returned as an [`Intent`]; the runtime
//! performs it and feeds the outcome back as a later [`Event`]. `Listen` is
//! only issued when none is outstanding, so inbound envelopes are folded in
//! the order they arrived.

use tracing::debug;

use chatline_core::protocol::{
    validate_username, ChatMessage, Destination, LoginResponse, Payload, RosterSnapshot, BROADCAST,
    MAX_USERNAME_CHARS,
};

use crate::event::{Event, Key};
use crate::intent::Intent;
use crate::model::{Focus, Line, Model, View, BLINK_INTERVAL, MAX_DRAFT_CHARS};

const QUIT_COMMAND: &str = "/quit";

pub fn update(mut model: Model, event: Event) -> (Model, Vec<Intent>) {
    let intents = model.apply(event);
    (model, intents)
}

impl Model {
    fn apply(&mut self, event: Event) -> Vec<Intent> {
        match event {
            Event::Connected => {
                self.connected = true;
                Vec::new()
            }
            Event::ConnectFailed(reason) => {
                self.connected = false;
                self.report(format!("Failed to connect: {reason}"));
                Vec::new()
            }
            Event::Disconnected(reason) => {
                self.connected = false;
                self.listening = false;
                self.report(format!("Connection lost: {reason}"));
                Vec::new()
            }
            Event::Tick => {
                self.blink_on = !self.blink_on;
                vec![Intent::ScheduleTick(BLINK_INTERVAL)]
            }
            // The runtime redraws after every event.
            Event::Resize { .. } => Vec::new(),
            Event::Received(payload) => {
                self.listening = false;
                match self.view {
                    View::Login => self.login_received(payload),
                    View::Chat => self.chat_received(payload),
                }
            }
            Event::Key(Key::Esc | Key::CtrlC) => self.quit(),
            Event::Key(key) => match self.view {
                View::Login => self.login_key(key),
                View::Chat => self.chat_key(key),
            },
        }
    }

    // --------------------
    // Login view
    // --------------------
    fn login_key(&mut self, key: Key) -> Vec<Intent> {
        match key {
            Key::Enter => self.submit_login(),
            Key::Char(c) => {
                if self.name_input.chars().count() < MAX_USERNAME_CHARS {
                    self.name_input.push(c);
                }
                self.login_helper.clear();
                Vec::new()
            }
            Key::Backspace => {
                self.name_input.pop();
                self.login_helper.clear();
                Vec::new()
            }
            _ => {
                self.login_helper.clear();
                Vec::new()
            }
        }
    }

    fn submit_login(&mut self) -> Vec<Intent> {
        if !self.connected {
            self.login_helper = "Not connected to server".into();
            return Vec::new();
        }
        // One login request at a time; the server binds the first name it accepts.
        if self.listening {
            self.login_helper = "Logging in...".into();
            return Vec::new();
        }
        let name = match validate_username(&self.name_input) {
            Ok(name) => name.to_string(),
            Err(e) => {
                self.login_helper = e.to_string();
                return Vec::new();
            }
        };
        self.username = name.clone();

        let mut intents = vec![Intent::Login(name)];
        intents.extend(self.listen());
        intents
    }

    fn login_received(&mut self, payload: Payload) -> Vec<Intent> {
        match payload {
            Payload::LoginResponse(LoginResponse { accepted: true, .. }) => {
                self.view = View::Chat;
                self.focus = Focus::Chat;
                self.login_helper.clear();
                self.listen().into_iter().collect()
            }
            Payload::LoginResponse(LoginResponse { reason, .. }) => {
                self.username.clear();
                self.login_helper = format!("Login failed: {reason}");
                Vec::new()
            }
            other => {
                debug!(kind = other.kind().as_str(), "ignored before login");
                self.listen().into_iter().collect()
            }
        }
    }

    // --------------------
    // Chat view
    // --------------------
    fn chat_key(&mut self, key: Key) -> Vec<Intent> {
        match (self.focus, key) {
            (Focus::Chat, Key::Tab) => {
                self.focus = Focus::Roster;
                Vec::new()
            }
            (Focus::Roster, Key::Tab) => {
                self.focus = Focus::Chat;
                self.clear_unread_selected();
                Vec::new()
            }
            (Focus::Chat, Key::Enter) => self.submit_draft(),
            (Focus::Chat, Key::Char(c)) => {
                if self.draft.chars().count() < MAX_DRAFT_CHARS {
                    self.draft.push(c);
                }
                Vec::new()
            }
            (Focus::Chat, Key::Backspace) => {
                self.draft.pop();
                Vec::new()
            }
            (Focus::Roster, Key::Up) => {
                if self.selected > 0 {
                    self.select(self.selected - 1);
                }
                Vec::new()
            }
            (Focus::Roster, Key::Down) => {
                if self.selected + 1 < self.roster.len() {
                    self.select(self.selected + 1);
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn submit_draft(&mut self) -> Vec<Intent> {
        let value = std::mem::take(&mut self.draft);
        if value.trim().is_empty() {
            return Vec::new();
        }
        if value.trim() == QUIT_COMMAND {
            return self.quit();
        }
        if !self.connected {
            self.status = Some("Not connected: message not sent".into());
            return Vec::new();
        }

        let key = self.selected_key().to_string();
        let destination = if key == BROADCAST {
            Destination::All
        } else {
            Destination::Peer(key.clone())
        };

        self.conversations.entry(key).or_default().lines.push(Line {
            sender: self.username.clone(),
            body: value.clone(),
            pending: true,
        });
        vec![Intent::Send(ChatMessage::outgoing(destination, value))]
    }

    fn chat_received(&mut self, payload: Payload) -> Vec<Intent> {
        match payload {
            Payload::Chat(msg) => self.file_message(msg),
            Payload::Roster(snapshot) => self.replace_roster(snapshot),
            other => debug!(kind = other.kind().as_str(), "ignored in chat view"),
        }
        self.listen().into_iter().collect()
    }

    fn file_message(&mut self, msg: ChatMessage) {
        let own = msg.sender == self.username;
        let key = match msg.destination {
            Destination::All => BROADCAST.to_string(),
            Destination::Peer(dest) if own => dest,
            Destination::Peer(_) => msg.sender.clone(),
        };
        let shown = self.selected_key() == key;

        let conv = self.conversations.entry(key).or_default();
        if !(own && conv.confirm(&msg.sender, &msg.body)) {
            conv.lines.push(Line {
                sender: msg.sender,
                body: msg.body,
                pending: false,
            });
        }
        if !shown && !own {
            conv.unread += 1;
        }
    }

    fn replace_roster(&mut self, snapshot: RosterSnapshot) {
        let mut roster = Vec::with_capacity(snapshot.members.len() + 1);
        roster.push(BROADCAST.to_string());
        roster.extend(
            snapshot
                .members
                .into_iter()
                .filter(|m| *m != self.username),
        );
        self.roster = roster;
        self.selected = self.selected.min(self.roster.len() - 1);
    }

    // --------------------
    // Helpers
    // --------------------
    fn select(&mut self, index: usize) {
        self.selected = index;
        self.clear_unread_selected();
    }

    fn clear_unread_selected(&mut self) {
        let key = self.selected_key().to_string();
        if let Some(conv) = self.conversations.get_mut(&key) {
            conv.unread = 0;
        }
    }

    fn listen(&mut self) -> Option<Intent> {
        if self.listening || !self.connected {
            return None;
        }
        self.listening = true;
        Some(Intent::Listen)
    }

    fn quit(&mut self) -> Vec<Intent> {
        self.quitting = true;
        let mut intents = Vec::new();
        if self.connected {
            intents.push(Intent::Disconnect);
        }
        intents.push(Intent::Quit);
        intents
    }

    /// Surface a connection problem where the current view shows it.
    fn report(&mut self, msg: String) {
        match self.view {
            View::Login => self.login_helper = msg,
            View::Chat => self.status = Some(msg),
        }
    }
}
