use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, InputMode, Screen};
use crate::chat::Role;
use crate::login::{FormField, LoginForm};
use crate::markdown::render_markdown;

const PLACEHOLDER: &str = "Ask FinSage";
const SIGN_IN_HINT: &str = "Sign In to view your chat history";

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    match app.screen {
        Screen::Chat => render_chat_screen(app, frame, body_area),
        Screen::Login => render_login_screen(&app.login, frame, body_area),
    }

    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let status = if app.chat.is_loading() {
        Span::styled(" waiting for reply ", Style::default().fg(Color::Yellow))
    } else {
        Span::raw("")
    };

    let mut title = Line::from(vec![
        Span::styled(" FinSage ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.endpoint.clone(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        status,
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Gray),
        ),
    ]);
    if app.screen == Screen::Chat {
        title.push_span(Span::raw("  "));
        title.push_span(Span::styled(
            SIGN_IN_HINT,
            Style::default().fg(Color::LightBlue).add_modifier(Modifier::UNDERLINED),
        ));
    }

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let mode_style = match app.input_mode {
        InputMode::Normal => Style::default().bg(Color::Blue).fg(Color::White),
        InputMode::Editing => Style::default().bg(Color::Yellow).fg(Color::Black),
    };

    let mode_text = match app.screen {
        Screen::Chat => " CHAT ",
        Screen::Login => " ACCOUNT ",
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hint = |key: &'static str, label: &'static str| {
        [Span::styled(key, key_style), Span::styled(label, label_style)]
    };

    let hints: Vec<Span> = match (app.screen, app.input_mode) {
        (Screen::Chat, InputMode::Editing) => {
            let mut hints = Vec::from(hint(" Enter ", " send "));
            if app.chat.is_loading() {
                hints.extend(hint(" Esc ", " cancel request "));
            } else {
                hints.extend(hint(" Esc ", " stop typing "));
            }
            hints.extend(hint(" PgUp/PgDn ", " scroll "));
            hints
        }
        (Screen::Chat, InputMode::Normal) => {
            let mut hints = Vec::from(hint(" j/k ", " scroll "));
            hints.extend(hint(" g/G ", " top/bottom "));
            hints.extend(hint(" i ", " type "));
            if app.chat.is_loading() {
                hints.extend(hint(" Esc ", " cancel request "));
            }
            hints.extend(hint(" q ", " quit "));
            hints
        }
        (Screen::Login, _) => {
            let mut hints = Vec::from(hint(" Tab ", " next "));
            hints.extend(hint(" Enter ", " select "));
            hints.extend(hint(" ^T ", " switch form "));
            hints.extend(hint(" Esc ", " quit "));
            hints
        }
    };

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

/// Rows the transcript occupies once word-wrapped the same way it is drawn.
fn wrapped_height(text: &Text<'static>, width: u16) -> u16 {
    Paragraph::new(text.clone())
        .wrap(Wrap { trim: false })
        .line_count(width.max(1))
        .min(u16::MAX as usize) as u16
}

fn transcript_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = Vec::new();

    for msg in app.chat.messages() {
        match msg.role {
            Role::User => {
                lines.push(Line::from(Span::styled(
                    "You:",
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.extend(render_markdown(&msg.text));
            }
            Role::Bot => {
                lines.push(Line::from(Span::styled(
                    "FinSage:",
                    Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
                )));
                lines.extend(render_markdown(&msg.text));
            }
        }
        lines.push(Line::default());
    }

    if app.chat.is_loading() {
        lines.push(Line::from(Span::styled(
            "FinSage:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

fn render_chat_screen(app: &mut App, frame: &mut Frame, area: Rect) {
    let [transcript_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    // Store area for mouse hit-testing
    app.transcript_area = Some(transcript_area);

    let transcript_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" FinSage ");

    if app.chat.messages().is_empty() && !app.chat.is_loading() {
        let inner = transcript_block.inner(transcript_area);
        frame.render_widget(transcript_block, transcript_area);

        let welcome = Text::from(vec![
            Line::from(Span::styled(
                "Personalized Financial",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                "Guidance, Just a Chat Away!",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            )),
        ]);
        let banner_area = centered_rect(inner.width, 2, inner);
        frame.render_widget(
            Paragraph::new(welcome).alignment(Alignment::Center),
            banner_area,
        );
    } else {
        let text = Text::from(transcript_lines(app));
        let inner_width = transcript_area.width.saturating_sub(2);
        let inner_height = transcript_area.height.saturating_sub(2);
        app.chat.set_viewport(wrapped_height(&text, inner_width), inner_height);

        let chat = Paragraph::new(text)
            .block(transcript_block)
            .wrap(Wrap { trim: false })
            .scroll((app.chat.scroll, 0));
        frame.render_widget(chat, transcript_area);
    }

    render_chat_input(app, frame, input_area);
}

fn render_chat_input(app: &App, frame: &mut Frame, area: Rect) {
    let loading = app.chat.is_loading();
    let editing = app.input_mode == InputMode::Editing;

    let border_color = if loading {
        Color::DarkGray
    } else if editing {
        Color::Yellow
    } else {
        Color::Gray
    };
    let title = if loading {
        " Waiting for reply... (Esc to cancel) "
    } else {
        " Ask (Enter to send) "
    };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);

    // Inner width = total width - 2 (for borders)
    let inner_width = area.width.saturating_sub(2) as usize;
    let (visible_text, cursor_col) = app.chat.input.visible_window(inner_width);

    let input = if app.chat.input.is_empty() {
        Paragraph::new(Span::styled(PLACEHOLDER, Style::default().fg(Color::DarkGray)))
    } else {
        Paragraph::new(visible_text).style(Style::default().fg(Color::Cyan))
    };
    frame.render_widget(input.block(input_block), area);

    // Show cursor when editing
    if editing {
        frame.set_cursor_position((area.x + cursor_col as u16 + 1, area.y + 1));
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn render_login_screen(form: &LoginForm, frame: &mut Frame, area: Rect) {
    let fields: Vec<FormField> = form
        .visible_fields()
        .into_iter()
        .filter(|f| f.is_text())
        .collect();

    // heading + blank + 3 rows per field + button + blank + prompt + borders
    let height = 1 + 1 + 3 * fields.len() as u16 + 1 + 1 + 1 + 2;
    let box_area = centered_rect(44, height, area);

    frame.render_widget(Clear, box_area);
    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    let inner = outer.inner(box_area);
    frame.render_widget(outer, box_area);

    let mut constraints = vec![Constraint::Length(1), Constraint::Length(1)];
    constraints.extend(fields.iter().map(|_| Constraint::Length(3)));
    constraints.extend([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ]);
    let rows = Layout::vertical(constraints).split(inner);

    let heading = Paragraph::new(Span::styled(
        form.mode.heading(),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    frame.render_widget(heading, rows[0]);

    for (i, field) in fields.iter().enumerate() {
        let row = rows[2 + i];
        let focused = form.focus == *field;
        let Some(input) = form.field(*field) else {
            continue;
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if focused { Color::Yellow } else { Color::DarkGray }));

        let inner_width = row.width.saturating_sub(2) as usize;
        let (visible, cursor_col) = input.visible_window(inner_width);
        let content = if input.is_empty() {
            Span::styled(field.placeholder(), Style::default().fg(Color::DarkGray))
        } else if *field == FormField::Password {
            Span::raw("•".repeat(visible.chars().count()))
        } else {
            Span::raw(visible)
        };
        frame.render_widget(Paragraph::new(content).block(block), row);

        if focused {
            frame.set_cursor_position((row.x + cursor_col as u16 + 1, row.y + 1));
        }
    }

    let button_row = rows[2 + fields.len()];
    let button_style = if form.focus == FormField::Submit {
        Style::default().bg(Color::Cyan).fg(Color::Black).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    };
    let button = Paragraph::new(Span::styled(
        format!("[ {} ]", form.mode.button_label()),
        button_style,
    ))
    .alignment(Alignment::Center);
    frame.render_widget(button, button_row);

    let link_style = if form.focus == FormField::Toggle {
        Style::default().fg(Color::Black).bg(Color::Magenta)
    } else {
        Style::default().fg(Color::Magenta).add_modifier(Modifier::UNDERLINED)
    };
    let prompt = Paragraph::new(Line::from(vec![
        Span::styled(form.mode.switch_prompt(), Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(form.mode.toggle_label(), link_style),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(prompt, rows[4 + fields.len()]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use ratatui::{backend::TestBackend, Terminal};
    use tokio::sync::mpsc;

    use crate::chat::FALLBACK_REPLY;
    use crate::config::{ScreenChoice, Settings};

    fn app_on(screen: ScreenChoice) -> App {
        let (tx, _rx) = mpsc::unbounded_channel();
        let settings = Settings {
            endpoint: "http://127.0.0.1:9".to_string(),
            reply_delay: Duration::ZERO,
            timeout: Duration::from_secs(1),
            screen,
        };
        App::new(&settings, tx)
    }

    fn rendered(app: &mut App) -> String {
        rendered_in(app, 100, 30)
    }

    fn rendered_in(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(app, f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    fn send(app: &mut App, text: &str) -> u64 {
        for c in text.chars() {
            app.chat.input.insert(c);
        }
        app.chat.submit().unwrap().id
    }

    #[test]
    fn empty_chat_shows_welcome_and_placeholder() {
        let mut app = app_on(ScreenChoice::Chat);
        let screen = rendered(&mut app);
        assert!(screen.contains("Personalized Financial"));
        assert!(screen.contains("Guidance, Just a Chat Away!"));
        assert!(screen.contains(PLACEHOLDER));
    }

    #[test]
    fn transcript_shows_both_sides_and_typing_indicator() {
        let mut app = app_on(ScreenChoice::Chat);
        send(&mut app, "Should I buy bonds?");
        let screen = rendered(&mut app);
        assert!(screen.contains("Should I buy bonds?"));
        assert!(screen.contains("Typing."));
        assert!(screen.contains("Esc to cancel"));
        assert!(!screen.contains("Personalized Financial"));
    }

    #[test]
    fn bot_markdown_is_rendered_without_markers() {
        let mut app = app_on(ScreenChoice::Chat);
        let id = send(&mut app, "tips");
        app.chat.resolve(id, Ok("**Diversify** your assets".to_string()));
        let screen = rendered(&mut app);
        assert!(screen.contains("Diversify your assets"));
        assert!(!screen.contains("**"));
        assert!(!screen.contains("Typing"));
    }

    #[test]
    fn fallback_is_visible_after_failure() {
        let mut app = app_on(ScreenChoice::Chat);
        let id = send(&mut app, "hi");
        app.chat.resolve(
            id,
            Err(crate::client::ChatError::Timeout(Duration::from_secs(1))),
        );
        assert!(rendered(&mut app).contains(FALLBACK_REPLY));
    }

    #[test]
    fn long_transcript_stays_pinned_to_bottom() {
        let mut app = app_on(ScreenChoice::Chat);
        for i in 0..30 {
            let id = send(&mut app, &format!("question {i}"));
            app.chat.resolve(id, Ok(format!("answer {i}")));
        }
        let screen = rendered(&mut app);
        assert!(screen.contains("answer 29"));
        assert!(!screen.contains("question 0 "));
        assert!(app.chat.scroll > 0);
    }

    #[test]
    fn login_form_toggles_full_name() {
        let mut app = app_on(ScreenChoice::Login);
        let screen = rendered(&mut app);
        assert!(screen.contains("[ Login ]"));
        assert!(screen.contains("Don't have an account? Sign Up"));
        assert!(!screen.contains("Full Name"));

        app.login.toggle_mode();
        let screen = rendered(&mut app);
        assert!(screen.contains("[ Sign Up ]"));
        assert!(screen.contains("Already have an account? Login"));
        assert!(screen.contains("Full Name"));
    }

    #[test]
    fn password_is_masked() {
        let mut app = app_on(ScreenChoice::Login);
        app.login.focus = FormField::Password;
        for c in "hunter2".chars() {
            app.login.password.insert(c);
        }
        let screen = rendered(&mut app);
        assert!(!screen.contains("hunter2"));
        assert!(screen.contains("•••••••"));
    }

    #[test]
    fn wrapped_height_breaks_at_words() {
        // Three 4-char words in 6 columns wrap one per row, not at column 6.
        let text = Text::from(vec![Line::from("aaaa bbbb cccc"), Line::default(), Line::from("abc")]);
        assert_eq!(wrapped_height(&text, 6), 3 + 1 + 1);
    }

    #[test]
    fn narrow_transcript_scrolls_to_last_wrapped_word() {
        let mut app = app_on(ScreenChoice::Chat);
        let id = send(&mut app, "hi");
        let words: Vec<String> = (0..20).map(|i| format!("wd{i:04}")).collect();
        app.chat.resolve(id, Ok(words.join(" ")));

        let screen = rendered_in(&mut app, 12, 20);
        assert!(screen.contains("wd0019"));
        assert_eq!(app.chat.scroll, app.chat.max_scroll);
        assert!(app.chat.max_scroll > 0);
    }

    #[test]
    fn user_markdown_is_rendered_without_markers() {
        let mut app = app_on(ScreenChoice::Chat);
        send(&mut app, "is **gold** a hedge?");
        let screen = rendered(&mut app);
        assert!(screen.contains("is gold a hedge?"));
        assert!(!screen.contains("**"));
    }

    #[test]
    fn chat_header_offers_sign_in() {
        let mut app = app_on(ScreenChoice::Chat);
        assert!(rendered(&mut app).contains(SIGN_IN_HINT));

        let mut app = app_on(ScreenChoice::Login);
        assert!(!rendered(&mut app).contains(SIGN_IN_HINT));
    }
}
