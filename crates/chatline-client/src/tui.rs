//! Terminal backend: draws a [`Screen`] with ratatui and maps crossterm keys.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph, Wrap};
use ratatui::Frame;

use crate::event::Key;
use crate::model::Focus;
use crate::view::{ChatScreen, LoginScreen, Screen};

const SIDEBAR_WIDTH: u16 = 26;
const INPUT_HEIGHT: u16 = 4;

const BG: Color = Color::Indexed(234);
const SIDEBAR_BG: Color = Color::Indexed(235);
const INPUT_BG: Color = Color::Indexed(236);
const ACCENT: Color = Color::Indexed(86);
const SELECTED_BG: Color = Color::Indexed(62);
const NOTICE: Color = Color::Indexed(208);
const SENDER: Color = Color::Indexed(205);
const MUTED: Color = Color::Indexed(240);
const TEXT: Color = Color::Indexed(252);

pub fn draw(frame: &mut Frame, screen: &Screen) {
    match screen {
        Screen::Login(s) => draw_login(frame, s),
        Screen::Chat(s) => draw_chat(frame, s),
    }
}

fn draw_login(frame: &mut Frame, s: &LoginScreen) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(BG)), area);

    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(5),
        Constraint::Fill(1),
    ])
    .areas(area);

    let input = if s.input.is_empty() {
        Span::styled(s.placeholder, Style::default().fg(MUTED))
    } else {
        Span::styled(s.input.as_str(), Style::default().fg(TEXT))
    };
    let lines = vec![
        Line::styled(s.title, Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Line::default(),
        Line::from(vec![Span::raw("> "), input]),
        Line::default(),
        Line::styled(
            s.helper.as_str(),
            Style::default().fg(NOTICE).add_modifier(Modifier::ITALIC),
        ),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .style(Style::default().bg(BG)),
        middle,
    );
}

fn draw_chat(frame: &mut Frame, s: &ChatScreen) {
    let [sidebar, main] =
        Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Min(1)])
            .areas(frame.area());
    draw_sidebar(frame, s, sidebar);

    let status_height = u16::from(s.status.is_some());
    let [transcript, status, input] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(status_height),
        Constraint::Length(INPUT_HEIGHT),
    ])
    .areas(main);

    draw_transcript(frame, s, transcript);

    if let Some(msg) = &s.status {
        frame.render_widget(
            Paragraph::new(Line::styled(
                msg.as_str(),
                Style::default().fg(NOTICE).add_modifier(Modifier::ITALIC),
            ))
            .style(Style::default().bg(BG)),
            status,
        );
    }

    let (text, style) = if s.draft.is_empty() {
        (s.draft_placeholder, Style::default().fg(MUTED))
    } else {
        (s.draft.as_str(), Style::default().fg(TEXT))
    };
    let prompt_color = if s.focus == Focus::Chat { ACCENT } else { MUTED };
    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("┃ ", Style::default().fg(prompt_color)),
            Span::styled(text, style),
        ]))
        .wrap(Wrap { trim: false })
        .block(Block::default().padding(Padding::horizontal(1)))
        .style(Style::default().bg(INPUT_BG)),
        input,
    );
}

fn draw_sidebar(frame: &mut Frame, s: &ChatScreen, area: Rect) {
    let mut lines = vec![
        Line::styled(
            s.sidebar_title,
            Style::default()
                .fg(ACCENT)
                .bg(INPUT_BG)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center),
        Line::default(),
    ];

    for entry in &s.sidebar {
        let marker = if entry.selected { "» " } else { "  " };
        let mut spans = vec![Span::raw(format!("{marker}{}", entry.name))];
        if entry.unread > 0 {
            spans.push(Span::styled(
                format!(" ({})", entry.unread),
                Style::default().fg(NOTICE).add_modifier(Modifier::BOLD),
            ));
        }
        let style = match (entry.selected, entry.dimmed) {
            (true, false) => Style::default()
                .fg(Color::Black)
                .bg(SELECTED_BG)
                .add_modifier(Modifier::BOLD),
            (true, true) => Style::default().fg(SELECTED_BG).bg(SIDEBAR_BG),
            (false, _) => Style::default().fg(Color::Indexed(250)).bg(SIDEBAR_BG),
        };
        lines.push(Line::from(spans).style(style));
    }

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().padding(Padding::uniform(1)))
            .style(Style::default().bg(SIDEBAR_BG)),
        area,
    );
}

fn draw_transcript(frame: &mut Frame, s: &ChatScreen, area: Rect) {
    // Keep the newest lines in view.
    let skip = s.transcript.len().saturating_sub(usize::from(area.height));
    let lines: Vec<Line> = s
        .transcript
        .iter()
        .skip(skip)
        .map(|l| {
            let mut body = Style::default().fg(TEXT);
            if l.pending {
                body = body.add_modifier(Modifier::DIM);
            }
            Line::from(vec![
                Span::styled(
                    format!("{}:", l.sender),
                    Style::default().fg(SENDER).add_modifier(Modifier::BOLD),
                ),
                Span::styled(format!(" {}", l.body), body),
            ])
        })
        .collect();

    frame.render_widget(
        Paragraph::new(lines)
            .block(Block::default().padding(Padding::horizontal(1)))
            .style(Style::default().bg(BG)),
        area,
    );
}

/// Map a terminal key press to a [`Key`]. Releases and unmapped keys yield `None`.
pub fn map_key(key: KeyEvent) -> Option<Key> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::CtrlC),
        KeyCode::Char(c) => Some(Key::Char(c)),
        KeyCode::Backspace => Some(Key::Backspace),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::Tab => Some(Key::Tab),
        KeyCode::Up => Some(Key::Up),
        KeyCode::Down => Some(Key::Down),
        KeyCode::Esc => Some(Key::Esc),
        _ => None,
    }
}
