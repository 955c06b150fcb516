use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use tracing::debug;
use crate::app::{App, InputMode, Screen};
use crate::input::TextInput;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(w, h) => debug!(w, h, "terminal resized"),
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply { id, result } => app.handle_reply(id, result),
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.screen {
        Screen::Chat => match app.input_mode {
            InputMode::Normal => handle_chat_normal(app, key),
            InputMode::Editing => handle_chat_editing(app, key),
        },
        Screen::Login => handle_login(app, key),
    }
}

fn half_page(app: &App) -> u16 {
    app.transcript_area
        .map(|r| r.height.saturating_sub(2) / 2)
        .unwrap_or(5)
        .max(1)
}

/// Cursor movement and deletion shared by every text field.
fn edit_text(input: &mut TextInput, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_home(),
        KeyCode::End => input.move_end(),
        KeyCode::Char(c)
            if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
        {
            input.insert(c)
        }
        _ => return false,
    }
    true
}

fn handle_chat_normal(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        // Back to typing
        KeyCode::Char('i') | KeyCode::Enter | KeyCode::Tab => {
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Esc => {
            app.cancel_query();
        }

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.chat.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.chat.scroll_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let n = half_page(app);
            app.chat.scroll_down(n);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let n = half_page(app);
            app.chat.scroll_up(n);
        }
        KeyCode::PageDown => {
            let n = half_page(app) * 2;
            app.chat.scroll_down(n);
        }
        KeyCode::PageUp => {
            let n = half_page(app) * 2;
            app.chat.scroll_up(n);
        }
        KeyCode::Char('g') => app.chat.scroll_to_top(),
        KeyCode::Char('G') => app.chat.scroll_to_bottom(),

        _ => {}
    }
}

fn handle_chat_editing(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            // First Esc aborts a pending request, otherwise leave the input
            if !app.cancel_query() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Enter => {
            app.submit_query();
        }
        KeyCode::Up => app.chat.scroll_up(1),
        KeyCode::Down => app.chat.scroll_down(1),
        KeyCode::PageUp => {
            let n = half_page(app) * 2;
            app.chat.scroll_up(n);
        }
        KeyCode::PageDown => {
            let n = half_page(app) * 2;
            app.chat.scroll_down(n);
        }
        _ => {
            edit_text(&mut app.chat.input, key);
        }
    }
}

fn handle_login(app: &mut App, key: KeyEvent) {
    let form = &mut app.login;
    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('t') if key.modifiers.contains(KeyModifiers::CONTROL) => form.toggle_mode(),
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Enter => form.activate(),
        _ => {
            if let Some(input) = form.focused_input_mut() {
                edit_text(input, key);
            }
        }
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.screen != Screen::Chat {
        return;
    }

    let in_transcript = app
        .transcript_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_transcript {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.chat.scroll_down(3),
        MouseEventKind::ScrollUp => app.chat.scroll_up(3),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::sync::mpsc;

    use crate::chat::Message;
    use crate::config::{ScreenChoice, Settings};
    use crate::login::{FormField, FormMode};

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

    fn press(app: &mut App, code: KeyCode) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))).unwrap();
    }

    fn ctrl(app: &mut App, c: char) {
        handle_event(app, AppEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))).unwrap();
    }

    fn type_str(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[tokio::test]
    async fn enter_submits_typed_text() {
        let mut app = app_on(ScreenChoice::Chat);
        type_str(&mut app, "quit smoking?");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.chat.messages(), &[Message::user("quit smoking?")]);
        assert!(app.chat.is_loading());
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn esc_cancels_before_leaving_editing() {
        let mut app = app_on(ScreenChoice::Chat);
        type_str(&mut app, "hi");
        press(&mut app, KeyCode::Enter);

        press(&mut app, KeyCode::Esc);
        assert!(!app.chat.is_loading());
        assert_eq!(app.input_mode, InputMode::Editing);

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn q_quits_only_in_normal_mode() {
        let mut app = app_on(ScreenChoice::Chat);
        press(&mut app, KeyCode::Char('q'));
        assert!(!app.should_quit);
        assert_eq!(app.chat.input.value(), "q");

        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('q'));
        assert!(app.should_quit);
    }

    #[test]
    fn ctrl_c_quits_anywhere() {
        let mut app = app_on(ScreenChoice::Login);
        ctrl(&mut app, 'c');
        assert!(app.should_quit);
    }

    #[test]
    fn login_typing_goes_to_focused_field() {
        let mut app = app_on(ScreenChoice::Login);
        type_str(&mut app, "me@x.io");
        press(&mut app, KeyCode::Tab);
        type_str(&mut app, "pw");

        assert_eq!(app.login.email.value(), "me@x.io");
        assert_eq!(app.login.password.value(), "pw");
        assert_eq!(app.login.focus, FormField::Password);
    }

    #[test]
    fn ctrl_t_toggles_form_mode() {
        let mut app = app_on(ScreenChoice::Login);
        ctrl(&mut app, 't');
        assert_eq!(app.login.mode, FormMode::Signup);
        assert!(app.login.email.is_empty());
        ctrl(&mut app, 't');
        assert_eq!(app.login.mode, FormMode::Login);
    }

    #[test]
    fn enter_on_submit_button_changes_nothing() {
        let mut app = app_on(ScreenChoice::Login);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.login.focus, FormField::Submit);

        let before = app.login.clone();
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.login, before);
        assert!(!app.should_quit);
    }
}
