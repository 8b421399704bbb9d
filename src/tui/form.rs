//! Two-field modal form used for sign-in, new posts and edits.
//!
//! Tab switches fields, Enter advances (and submits from the last field),
//! Ctrl+J inserts a newline in the body, Esc cancels. Title and body
//! lengths are capped here; the client itself never checks them.

use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph, Wrap};

use crate::remote::{MAX_BODY_LEN, MAX_TITLE_LEN, Post};
use crate::tui::component::{Component, EventHandler};
use crate::tui::event::TuiEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    Login,
    NewPost,
    EditPost(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEvent {
    Submit {
        kind: FormKind,
        first: String,
        second: String,
    },
    Cancel,
}

pub struct Form {
    pub kind: FormKind,
    pub fields: [String; 2],
    pub focus: usize,
    pub error: Option<String>,
}

impl Form {
    pub fn login(user: Option<&str>) -> Self {
        let username = user.unwrap_or_default().to_string();
        let focus = if username.is_empty() { 0 } else { 1 };
        Self {
            kind: FormKind::Login,
            fields: [username, String::new()],
            focus,
            error: None,
        }
    }

    pub fn new_post() -> Self {
        Self {
            kind: FormKind::NewPost,
            fields: [String::new(), String::new()],
            focus: 0,
            error: None,
        }
    }

    pub fn edit(post: &Post) -> Self {
        Self {
            kind: FormKind::EditPost(post.id),
            fields: [post.title.clone(), post.body.clone()],
            focus: 0,
            error: None,
        }
    }

    fn title(&self) -> String {
        match self.kind {
            FormKind::Login => "Sign in".to_string(),
            FormKind::NewPost => "New post".to_string(),
            FormKind::EditPost(id) => format!("Edit post {id}"),
        }
    }

    fn labels(&self) -> [&'static str; 2] {
        match self.kind {
            FormKind::Login => ["Username", "Password"],
            _ => ["Title", "Body"],
        }
    }

    fn limit(&self, field: usize) -> Option<usize> {
        match (self.kind, field) {
            (FormKind::Login, _) => None,
            (_, 0) => Some(MAX_TITLE_LEN),
            _ => Some(MAX_BODY_LEN),
        }
    }

    fn accepts_newlines(&self) -> bool {
        self.kind != FormKind::Login && self.focus == 1
    }

    fn insert(&mut self, text: &str) {
        let limit = self.limit(self.focus);
        let multiline = self.accepts_newlines();
        let label = self.labels()[self.focus];
        let field = &mut self.fields[self.focus];
        let mut capped = false;
        for c in text.chars() {
            if c == '\n' && !multiline {
                continue;
            }
            if limit.is_some_and(|max| field.chars().count() >= max) {
                capped = true;
                break;
            }
            field.push(c);
        }
        if capped && let Some(max) = limit {
            self.error = Some(format!("{label} is limited to {max} characters"));
        }
    }

    fn submit(&mut self) -> Option<FormEvent> {
        let [first_label, second_label] = self.labels();
        if self.fields[0].trim().is_empty() {
            self.error = Some(format!("{first_label} is required"));
            self.focus = 0;
            return None;
        }
        if self.kind == FormKind::Login && self.fields[1].is_empty() {
            self.error = Some(format!("{second_label} is required"));
            return None;
        }
        Some(FormEvent::Submit {
            kind: self.kind,
            first: self.fields[0].trim().to_string(),
            second: self.fields[1].clone(),
        })
    }

    /// Text shown for a field; the password is masked.
    fn display_value(&self, field: usize) -> String {
        if self.kind == FormKind::Login && field == 1 {
            "*".repeat(self.fields[1].chars().count())
        } else {
            self.fields[field].clone()
        }
    }
}

impl EventHandler for Form {
    type Event = FormEvent;

    fn handle_event(&mut self, event: &TuiEvent) -> Option<FormEvent> {
        match event {
            TuiEvent::Escape => return Some(FormEvent::Cancel),
            TuiEvent::Tab => self.focus = 1 - self.focus,
            TuiEvent::Enter if self.focus == 0 => self.focus = 1,
            TuiEvent::Enter => return self.submit(),
            TuiEvent::InputChar(c) => {
                self.error = None;
                self.insert(&c.to_string());
            }
            TuiEvent::Paste(text) => {
                self.error = None;
                self.insert(text);
            }
            TuiEvent::Backspace => {
                self.error = None;
                self.fields[self.focus].pop();
            }
            _ => {}
        }
        None
    }
}

impl Component for Form {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        use Constraint::{Length, Min};

        frame.render_widget(Clear, area);
        let block = Block::bordered().title(self.title());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [first_area, second_area, hint_area] =
            Layout::vertical([Length(3), Min(3), Length(1)]).areas(inner);
        let labels = self.labels();

        for (field, field_area) in [(0, first_area), (1, second_area)] {
            let focused = self.focus == field;
            let border = if focused {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            let mut text = self.display_value(field);
            if focused {
                text.push('_');
            }
            let count = match self.limit(field) {
                Some(max) => format!(" {}/{} ", self.fields[field].chars().count(), max),
                None => String::new(),
            };
            let paragraph = Paragraph::new(text)
                .block(
                    Block::bordered()
                        .title(labels[field])
                        .title_bottom(Line::from(count).right_aligned())
                        .border_style(border),
                )
                .wrap(Wrap { trim: false });
            frame.render_widget(paragraph, field_area);
        }

        let hint = match &self.error {
            Some(err) => Line::from(Span::styled(err.clone(), Style::default().fg(Color::Red))),
            None => Line::from(Span::styled(
                "Tab switch field · Enter next/submit · Ctrl+J newline · Esc cancel",
                Style::default().add_modifier(Modifier::DIM),
            )),
        };
        frame.render_widget(Paragraph::new(hint), hint_area);
    }
}
