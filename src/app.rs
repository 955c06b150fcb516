use std::time::Duration;

use ratatui::layout::Rect;
use tokio::sync::mpsc;
use tracing::info;

use crate::chat::{self, ChatState};
use crate::client::{ChatError, FinSageClient};
use crate::config::{ScreenChoice, Settings};
use crate::login::LoginForm;
use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Chat,
    Login,
}

impl From<ScreenChoice> for Screen {
    fn from(choice: ScreenChoice) -> Self {
        match choice {
            ScreenChoice::Chat => Screen::Chat,
            ScreenChoice::Login => Screen::Login,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub screen: Screen,
    pub input_mode: InputMode,

    // Screens
    pub chat: ChatState,
    pub login: LoginForm,

    // Animation state
    pub animation_frame: u8, // 0-2 for the typing indicator

    // Transcript area for mouse hit-testing (updated during render)
    pub transcript_area: Option<Rect>,

    // Data
    pub client: FinSageClient,
    pub endpoint: String,
    pub reply_delay: Duration,
    events: mpsc::UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(settings: &Settings, events: mpsc::UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            screen: settings.screen.into(),
            input_mode: InputMode::Editing,

            chat: ChatState::new(),
            login: LoginForm::new(),

            animation_frame: 0,
            transcript_area: None,

            client: FinSageClient::new(&settings.endpoint, settings.timeout),
            endpoint: settings.endpoint.clone(),
            reply_delay: settings.reply_delay,
            events,
        }
    }

    /// Submit the chat input and run the request in the background.
    /// The outcome comes back through the event channel as `AppEvent::Reply`.
    pub fn submit_query(&mut self) -> bool {
        let Some(submission) = self.chat.submit() else {
            return false;
        };
        self.animation_frame = 0;

        let client = self.client.clone();
        let delay = self.reply_delay;
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = chat::run_query(&client, &submission.text, &submission.cancel, delay).await;
            let _ = tx.send(AppEvent::Reply { id: submission.id, result });
        });
        true
    }

    pub fn handle_reply(&mut self, id: u64, result: Result<String, ChatError>) {
        self.chat.resolve(id, result);
    }

    pub fn cancel_query(&mut self) -> bool {
        self.chat.cancel()
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.chat.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    /// Stop anything still running before the terminal is restored.
    pub fn shutdown(&mut self) {
        if self.cancel_query() {
            info!("cancelled pending request on exit");
        }
    }
}
