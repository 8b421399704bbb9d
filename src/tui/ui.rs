use crate::core::state::App;
use crate::remote::Post;
use crate::tui::TuiState;
use crate::tui::component::Component;

use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, List, ListItem, Paragraph, Wrap};

pub fn draw_ui(frame: &mut Frame, app: &App, tui: &mut TuiState, base_url: &str) {
    use Constraint::{Length, Min, Percentage};
    let [title_area, main_area, status_area] =
        Layout::vertical([Length(1), Min(0), Length(1)]).areas(frame.area());
    let [list_area, detail_area] =
        Layout::horizontal([Percentage(40), Percentage(60)]).areas(main_area);

    let user = match &app.current_user {
        Some(user) => format!("signed in as {user}"),
        None => "not signed in".to_string(),
    };
    frame.render_widget(
        Span::styled(
            format!("postfeed | {base_url} | {user}"),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        title_area,
    );

    draw_post_list(frame, list_area, app, tui);
    draw_post_detail(frame, detail_area, app);
    draw_status(frame, status_area, app);

    if let Some(form) = tui.form.as_mut() {
        let area = centered(frame.area(), 70, 20);
        form.render(frame, area);
    }
}

fn draw_post_list(frame: &mut Frame, area: Rect, app: &App, tui: &mut TuiState) {
    let mut items: Vec<ListItem> = app
        .posts
        .iter()
        .map(|post| {
            let mine = post.is_owned_by(app.current_user.as_deref());
            let author_style = if mine {
                Style::default().fg(Color::Green)
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            ListItem::new(Line::from(vec![
                Span::raw(post.title.clone()),
                Span::styled(format!("  {}", post.author), author_style),
            ]))
        })
        .collect();
    if app.is_loading {
        items.push(ListItem::new(Span::styled(
            "Loading...",
            Style::default().fg(Color::Yellow),
        )));
    } else if !app.has_more && !app.posts.is_empty() {
        items.push(ListItem::new(Span::styled(
            "(end of feed)",
            Style::default().add_modifier(Modifier::DIM),
        )));
    }

    let list = List::new(items)
        .block(Block::bordered().title(format!("Posts ({})", app.posts.len())))
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    tui.list_state.select(app.selected);
    frame.render_stateful_widget(list, area, &mut tui.list_state);
}

fn draw_post_detail(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::bordered().title("Post");
    let Some(post) = app.selected_post() else {
        frame.render_widget(
            Paragraph::new("No post selected").block(block),
            area,
        );
        return;
    };
    frame.render_widget(
        Paragraph::new(post_lines(post))
            .block(block)
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn post_lines(post: &Post) -> Vec<Line<'_>> {
    let mut lines = vec![
        Line::from(Span::styled(
            post.title.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!(
                "#{} by {} on {}",
                post.id,
                post.author,
                post.created.format("%Y-%m-%d %H:%M")
            ),
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::default(),
    ];
    lines.extend(post.body.lines().map(Line::from));
    lines
}

fn draw_status(frame: &mut Frame, area: Rect, app: &App) {
    let keys = if app.can_modify_selected() {
        "r refresh · n new · e edit · d delete · l sign in · q quit"
    } else {
        "r refresh · n new · l sign in · q quit"
    };
    let status = match &app.error {
        Some(err) => Span::styled(
            format!("{} ({err})", app.status_message),
            Style::default().fg(Color::Red),
        ),
        None => Span::raw(app.status_message.clone()),
    };
    let line = Line::from(vec![
        status,
        Span::styled(format!("  |  {keys}"), Style::default().add_modifier(Modifier::DIM)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// A rect of `percent_x` width and `height` rows centered in `area`.
fn centered(area: Rect, percent_x: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(row);
    cell
}
