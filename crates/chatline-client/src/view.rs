//! Render: `Model -> Screen`.
//!
//! A `Screen` is plain data describing what to draw. The terminal backend in
//! [`crate::tui`] decides how it looks.

use crate::model::{Focus, Model, View};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Login(LoginScreen),
    Chat(ChatScreen),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginScreen {
    pub title: &'static str,
    pub input: String,
    pub placeholder: &'static str,
    pub helper: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatScreen {
    pub sidebar_title: &'static str,
    pub sidebar: Vec<SidebarEntry>,
    pub transcript: Vec<TranscriptLine>,
    pub draft: String,
    pub draft_placeholder: &'static str,
    pub focus: Focus,
    pub status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SidebarEntry {
    pub name: String,
    pub unread: usize,
    pub selected: bool,
    /// Selected entry in its "off" blink phase while the roster has focus.
    pub dimmed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptLine {
    pub sender: String,
    pub body: String,
    pub pending: bool,
}

impl TranscriptLine {
    pub fn text(&self) -> String {
        format!("{}: {}", self.sender, self.body)
    }
}

pub fn render(model: &Model) -> Screen {
    match model.view {
        View::Login => Screen::Login(LoginScreen {
            title: "Enter your username:",
            input: model.name_input.clone(),
            placeholder: "Username",
            helper: model.login_helper.clone(),
        }),
        View::Chat => Screen::Chat(render_chat(model)),
    }
}

fn render_chat(model: &Model) -> ChatScreen {
    let sidebar = model
        .roster
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let selected = i == model.selected;
            SidebarEntry {
                name: name.clone(),
                unread: model.unread(name),
                selected,
                dimmed: selected && model.focus == Focus::Roster && !model.blink_on,
            }
        })
        .collect();

    let transcript = model
        .conversation(model.selected_key())
        .map(|c| {
            c.lines
                .iter()
                .map(|l| TranscriptLine {
                    sender: l.sender.clone(),
                    body: l.body.clone(),
                    pending: l.pending,
                })
                .collect()
        })
        .unwrap_or_default();

    ChatScreen {
        sidebar_title: "Active users  (Tab: focus)",
        sidebar,
        transcript,
        draft: model.draft.clone(),
        draft_placeholder: "Type your message... (/quit to exit)",
        focus: model.focus,
        status: model.status.clone(),
    }
}
