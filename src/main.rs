mod agent;
mod boundary;
mod chat;
mod config;
mod markdown;
mod normalize;
mod progress;
mod research;
mod session;
mod ui;

use iced::{
    widget::{button, column, container, row, scrollable, text, text_input, text_input::Id, vertical_rule},
    Element, Length, Task, Theme, Font, Subscription,
    time, clipboard,
    keyboard::{self, Key},
    event::{self, Event as IcedEvent},
    window,
};
use std::collections::HashSet;
use std::time::Duration;

use crate::agent::{AgentClient, CallOptions};
use crate::chat::{ChatState, Outcome, PendingRequest};
use crate::config::{AgentInfo, Config};

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("pro_ai=info")),
        )
        .with_target(false)
        .init();
}

fn main() -> iced::Result {
    init_tracing();
    let config = Config::load();

    let size = iced::Size::new(config.window.width as f32, config.window.height as f32);
    let min_size = iced::Size::new(config.window.min_width as f32, config.window.min_height as f32);

    iced::application("PRO.AI", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size,
            min_size: Some(min_size),
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(move || App::new(config))
}

#[derive(Debug, Clone)]
pub enum Message {
    InputChanged(String),
    Submit,
    UsePrompt(String),
    ResponseReceived(PendingRequest, Outcome),
    Retry,
    NewSession,
    SelectSession(String),
    DeleteSession(String),
    ToggleSample,
    ToggleAbstract(String, usize),
    CopyResult(String),
    OpenUrl(String),
    Tick,
    ClearInput,
    ResetFault,
}

struct App {
    chat: ChatState,
    client: Option<AgentClient>,
    roster: Vec<AgentInfo>,
    preview_max_chars: usize,
    loading_frame: usize,
    expanded_abstracts: HashSet<(String, usize)>,
    fault: Option<String>,
    input_id: Id,
    conversation_id: scrollable::Id,
}

impl App {
    fn new(config: Config) -> (Self, Task<Message>) {
        let client = match AgentClient::from_config(&config.agent) {
            Ok(client) => {
                tracing::info!("[App] Agent endpoint: {}", client.endpoint());
                Some(client)
            }
            Err(e) => {
                tracing::error!("[App] Could not build agent client: {}", e);
                None
            }
        };

        let input_id = Id::unique();

        let app = App {
            chat: ChatState::new(&config),
            client,
            roster: config.agent.roster.clone(),
            preview_max_chars: config.ui.preview_max_chars,
            loading_frame: 0,
            expanded_abstracts: HashSet::new(),
            fault: None,
            input_id: input_id.clone(),
            conversation_id: scrollable::Id::unique(),
        };

        (app, text_input::focus(input_id))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        if let Message::ResetFault = message {
            self.fault = None;
            self.expanded_abstracts.clear();
            return Task::none();
        }

        match boundary::guard(|| self.handle(message)) {
            Ok(task) => task,
            Err(reason) => {
                tracing::error!("[App] update panicked: {}", reason);
                self.fault = Some(reason);
                Task::none()
            }
        }
    }

    fn handle(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::InputChanged(value) => {
                self.chat.set_input(value);
                Task::none()
            }
            Message::Submit => {
                let pending = self.chat.submit_input();
                self.start(pending)
            }
            Message::UsePrompt(prompt) => {
                let pending = self.chat.submit(&prompt);
                self.start(pending)
            }
            Message::Retry => {
                let pending = self.chat.retry();
                self.start(pending)
            }
            Message::ResponseReceived(request, outcome) => {
                self.chat.resolve(request, outcome);
                self.scroll_to_end()
            }
            Message::NewSession => {
                self.chat.new_session();
                text_input::focus(self.input_id.clone())
            }
            Message::SelectSession(id) => {
                self.chat.select_session(&id);
                self.scroll_to_end()
            }
            Message::DeleteSession(id) => {
                self.chat.delete_session(&id);
                self.expanded_abstracts.retain(|(message_id, _)| {
                    self.chat
                        .store()
                        .sessions()
                        .iter()
                        .any(|s| s.messages.iter().any(|m| &m.id == message_id))
                });
                Task::none()
            }
            Message::ToggleSample => {
                self.chat.toggle_sample_data();
                Task::none()
            }
            Message::ToggleAbstract(message_id, index) => {
                let key = (message_id, index);
                if !self.expanded_abstracts.remove(&key) {
                    self.expanded_abstracts.insert(key);
                }
                Task::none()
            }
            Message::CopyResult(message_id) => {
                let markdown = self
                    .chat
                    .active_session()
                    .and_then(|s| s.messages.iter().find(|m| m.id == message_id))
                    .and_then(|m| m.parsed_response.as_ref())
                    .map(|r| r.to_markdown());
                match markdown {
                    Some(markdown) => clipboard::write(markdown),
                    None => Task::none(),
                }
            }
            Message::OpenUrl(url) => {
                tracing::info!("[App] Opening {}", url);
                if let Err(e) = webbrowser::open(&url) {
                    tracing::warn!("[App] Could not open {}: {}", url, e);
                }
                Task::none()
            }
            Message::Tick => {
                if self.chat.is_busy() {
                    self.loading_frame = (self.loading_frame + 1) % 80;
                }
                Task::none()
            }
            Message::ClearInput => {
                self.chat.set_input(String::new());
                Task::none()
            }
            Message::ResetFault => Task::none(),
        }
    }

    /// Kick off the agent call for a freshly committed query.
    fn start(&mut self, pending: Option<PendingRequest>) -> Task<Message> {
        let Some(request) = pending else {
            return Task::none();
        };

        self.loading_frame = 0;
        let client = self.client.clone();

        let call = Task::future(async move {
            let outcome = match &client {
                Some(client) => {
                    let options = CallOptions {
                        session_id: Some(request.session_id.clone()),
                    };
                    client
                        .call(&request.query, &request.agent_id, &options)
                        .await
                        .map_err(|e| e.to_string())
                }
                None => Err("Agent client is not configured.".to_string()),
            };
            Message::ResponseReceived(request, outcome)
        });

        Task::batch([self.scroll_to_end(), call])
    }

    fn scroll_to_end(&self) -> Task<Message> {
        scrollable::snap_to(self.conversation_id.clone(), scrollable::RelativeOffset::END)
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.chat.is_busy() {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::ClearInput)
            } else {
                None
            }
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<'_, Message> {
        if let Some(reason) = &self.fault {
            return ui::fault_view(reason.clone());
        }

        match boundary::guard(|| self.layout()) {
            Ok(element) => element,
            Err(reason) => {
                tracing::error!("[App] view panicked: {}", reason);
                ui::fault_view(reason)
            }
        }
    }

    fn layout(&self) -> Element<'_, Message> {
        let active = self.chat.active_session();
        let loading = match (self.chat.phase(), active) {
            (chat::Phase::Sending { session_id }, Some(session)) => session_id == &session.id,
            _ => false,
        };

        let body: Element<'_, Message> = match active {
            Some(session) if !session.messages.is_empty() || loading => scrollable(ui::conversation_view(
                &self.chat,
                session,
                loading,
                self.loading_frame,
                &self.expanded_abstracts,
            ))
            .id(self.conversation_id.clone())
            .height(Length::Fill)
            .into(),
            _ => ui::welcome_view(),
        };

        let input = text_input("Ask a research question...", self.chat.input())
            .on_input(Message::InputChanged)
            .on_submit(Message::Submit)
            .padding(14)
            .size(15)
            .id(self.input_id.clone());

        let send = button(text(if self.chat.is_busy() { "..." } else { "Send" }).size(14))
            .padding(14)
            .on_press_maybe(self.chat.can_send().then_some(Message::Submit));

        let main_panel = column![
            ui::header_view(&self.chat),
            body,
            row![input, send].spacing(8).padding(12),
        ]
        .width(Length::Fill)
        .height(Length::Fill);

        container(row![
            ui::sidebar_view(&self.chat, &self.roster, self.preview_max_chars),
            vertical_rule(1),
            main_panel,
        ])
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
    }

    fn theme(&self) -> Theme {
        Theme::Dracula
    }
}
