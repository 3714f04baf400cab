use iced::{
    alignment,
    font::Weight,
    widget::{
        button, column, container, horizontal_space, rich_text, row, scrollable, span, text, text::Span,
        Column, Space,
    },
    Color, Element, Font, Length,
};
use std::collections::HashSet;

use crate::chat::ChatState;
use crate::config::AgentInfo;
use crate::markdown::{self, Block};
use crate::progress::Kind;
use crate::research::{AcademicPaper, ResearchResponse, WebFinding};
use crate::session::{self, ChatMessage, Role, Session};
use crate::Message;

const PURPLE: Color = Color { r: 0.74, g: 0.58, b: 0.98, a: 1.0 };
const ORANGE: Color = Color { r: 1.0, g: 0.72, b: 0.42, a: 1.0 };
const CYAN: Color = Color { r: 0.55, g: 0.91, b: 0.99, a: 1.0 };
const GREEN: Color = Color { r: 0.31, g: 0.98, b: 0.48, a: 1.0 };
const RED: Color = Color { r: 1.0, g: 0.33, b: 0.33, a: 1.0 };
const MUTED: Color = Color { r: 0.60, g: 0.63, b: 0.72, a: 1.0 };

pub const EXAMPLE_PROMPTS: [&str; 4] = [
    "Latest advances in RAG architectures",
    "Compare vector databases for production use",
    "Transformer architectures for time series forecasting",
    "State of the art in multimodal AI models",
];

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn bold() -> Font {
    Font {
        weight: Weight::Bold,
        ..Font::MONOSPACE
    }
}

// --- markdown ---

fn spans_view<'a>(spans: &[markdown::Span], size: u16) -> Element<'a, Message> {
    let pieces: Vec<Span<'a, Message, Font>> = spans
        .iter()
        .map(|s| match s {
            markdown::Span::Plain(t) => span(t.clone()),
            markdown::Span::Strong(t) => span(t.clone()).font(bold()),
        })
        .collect();

    rich_text(pieces).size(size).width(Length::Fill).into()
}

pub fn markdown_view<'a>(source: &str) -> Element<'a, Message> {
    let mut col = Column::new().spacing(6);
    let mut number = 0;

    for block in markdown::render(source) {
        if !matches!(block, Block::Numbered(_)) {
            number = 0;
        }

        let item: Element<'a, Message> = match block {
            Block::Heading { level, text: heading } => {
                let size: u16 = match level {
                    2 => 20,
                    3 => 17,
                    _ => 15,
                };
                text(heading).size(size).font(bold()).into()
            }
            Block::Bullet(spans) => row![text("•").size(14), spans_view(&spans, 14)]
                .spacing(8)
                .padding([0, 16])
                .into(),
            Block::Numbered(spans) => {
                number += 1;
                row![text(format!("{}.", number)).size(14), spans_view(&spans, 14)]
                    .spacing(8)
                    .padding([0, 16])
                    .into()
            }
            Block::Spacer => Space::with_height(4).into(),
            Block::Paragraph(spans) => spans_view(&spans, 14),
        };
        col = col.push(item);
    }

    col.into()
}

// --- research result ---

fn section<'a>(title: &'a str, color: Color, count: Option<usize>, body: Element<'a, Message>) -> Element<'a, Message> {
    let mut header = row![text(title).size(14).font(bold()).color(color)]
        .spacing(8)
        .align_y(alignment::Vertical::Center);
    if let Some(count) = count {
        header = header.push(text(count.to_string()).size(11).color(color));
    }

    container(column![header, body].spacing(10))
        .padding(16)
        .width(Length::Fill)
        .style(container::rounded_box)
        .into()
}

fn link_button<'a>(label: &'a str, url: &str) -> Element<'a, Message> {
    button(text(label).size(11).color(CYAN))
        .style(button::text)
        .padding(0)
        .on_press(Message::OpenUrl(url.to_string()))
        .into()
}

fn web_finding_card(finding: &WebFinding) -> Element<'_, Message> {
    let mut card = Column::new()
        .spacing(6)
        .push(text(finding.title.as_deref().unwrap_or("Untitled")).size(14).font(bold()));

    if let Some(summary) = &finding.summary {
        card = card.push(text(summary).size(12).color(MUTED));
    }

    let mut meta = row![].spacing(10);
    if let Some(source_type) = &finding.source_type {
        meta = meta.push(text(source_type).size(11).color(PURPLE));
    }
    if let Some(domain) = finding.domain() {
        meta = meta.push(text(domain).size(11).color(MUTED));
    }
    card = card.push(meta);

    if let Some(url) = finding.link() {
        card = card.push(link_button("Open source ↗", url));
    }

    container(card).padding(12).width(Length::Fill).style(container::rounded_box).into()
}

fn paper_card<'a>(message_id: &'a str, index: usize, paper: &'a AcademicPaper, expanded: bool) -> Element<'a, Message> {
    let mut card = Column::new()
        .spacing(6)
        .push(text(paper.title.as_deref().unwrap_or("Untitled Paper")).size(14).font(bold()));

    if let Some(authors) = &paper.authors {
        card = card.push(text(authors).size(12).color(MUTED));
    }
    if let Some(relevance) = &paper.relevance_summary {
        card = card.push(text(relevance).size(12).color(GREEN));
    }

    let mut meta = row![].spacing(10);
    if let Some(date) = &paper.published_date {
        meta = meta.push(text(date).size(11).color(MUTED));
    }
    if let Some(id) = &paper.arxiv_id {
        meta = meta.push(text(format!("arXiv:{}", id)).size(11).color(CYAN));
    }
    card = card.push(meta);

    if let Some(url) = paper.link() {
        card = card.push(link_button("View on ArXiv ↗", url));
    }

    if let Some(abstract_text) = &paper.abstract_text {
        let label = if expanded { "▲ Hide Abstract" } else { "▼ Show Abstract" };
        card = card.push(
            button(text(label).size(12))
                .style(button::text)
                .padding(0)
                .on_press(Message::ToggleAbstract(message_id.to_string(), index)),
        );
        if expanded {
            card = card.push(
                container(text(abstract_text).size(12).color(MUTED))
                    .padding(10)
                    .width(Length::Fill)
                    .style(container::rounded_box),
            );
        }
    }

    container(card).padding(12).width(Length::Fill).style(container::rounded_box).into()
}

pub fn research_view<'a>(
    message_id: &'a str,
    data: &'a ResearchResponse,
    expanded: &HashSet<(String, usize)>,
) -> Element<'a, Message> {
    let mut col = Column::new().spacing(14).width(Length::Fill);

    if data.is_empty() {
        col = col.push(text("The agent returned no structured results.").size(13).color(MUTED));
    }

    if !data.summary.is_empty() {
        col = col.push(section("Summary", PURPLE, None, markdown_view(&data.summary)));
    }

    if !data.web_findings.is_empty() {
        let cards = data
            .web_findings
            .iter()
            .fold(Column::new().spacing(10), |c, f| c.push(web_finding_card(f)));
        col = col.push(section("Web Findings", ORANGE, Some(data.web_findings.len()), cards.into()));
    }

    if !data.academic_papers.is_empty() {
        let cards = data.academic_papers.iter().enumerate().fold(Column::new().spacing(10), |c, (i, p)| {
            let open = expanded.contains(&(message_id.to_string(), i));
            c.push(paper_card(message_id, i, p, open))
        });
        col = col.push(section("Academic Papers", CYAN, Some(data.academic_papers.len()), cards.into()));
    }

    if !data.key_takeaways.is_empty() {
        let items = data.key_takeaways.iter().enumerate().fold(Column::new().spacing(8), |c, (i, t)| {
            c.push(
                row![
                    text(format!("{}", i + 1)).size(12).font(bold()).color(GREEN),
                    text(t).size(14).width(Length::Fill),
                ]
                .spacing(10),
            )
        });
        col = col.push(section("Key Takeaways", GREEN, None, items.into()));
    }

    col = col.push(
        container(
            button(text("[Copy]").size(12))
                .style(button::secondary)
                .on_press(Message::CopyResult(message_id.to_string())),
        )
        .width(Length::Fill)
        .align_x(alignment::Horizontal::Right),
    );

    col.into()
}

// --- conversation ---

fn message_view<'a>(
    message: &'a ChatMessage,
    show_retry: bool,
    expanded: &HashSet<(String, usize)>,
) -> Element<'a, Message> {
    match message.role {
        Role::User => container(
            container(text(&message.content).size(14))
                .padding(12)
                .max_width(560)
                .style(container::rounded_box),
        )
        .width(Length::Fill)
        .align_x(alignment::Horizontal::Right)
        .into(),
        Role::Agent => match &message.parsed_response {
            Some(data) => research_view(&message.id, data, expanded),
            None => markdown_view(&message.content),
        },
        Role::Error => {
            let mut body = row![
                text("!").size(16).font(bold()).color(RED),
                text(&message.content).size(13).color(RED).width(Length::Fill),
            ]
            .spacing(10)
            .align_y(alignment::Vertical::Center);

            if show_retry {
                body = body.push(
                    button(text("↻ Retry").size(12))
                        .style(button::secondary)
                        .on_press(Message::Retry),
                );
            }

            container(body).padding(12).width(Length::Fill).style(container::rounded_box).into()
        }
    }
}

pub fn loading_view<'a>(frame: usize) -> Element<'a, Message> {
    let spinner = SPINNER_FRAMES[frame % SPINNER_FRAMES.len()];
    row![
        text(spinner).size(22).color(PURPLE),
        text("Researching across web and academic sources...").size(13).color(MUTED),
    ]
    .spacing(12)
    .align_y(alignment::Vertical::Center)
    .into()
}

pub fn conversation_view<'a>(
    chat: &'a ChatState,
    session: &'a Session,
    loading: bool,
    frame: usize,
    expanded: &HashSet<(String, usize)>,
) -> Element<'a, Message> {
    let last_index = session.messages.len().saturating_sub(1);
    let can_retry = chat.last_failed().is_some() && !chat.is_busy();

    let mut col = Column::new().spacing(16).padding(20).width(Length::Fill);
    for (i, message) in session.messages.iter().enumerate() {
        let show_retry = can_retry && i == last_index && message.role == Role::Error;
        col = col.push(message_view(message, show_retry, expanded));
    }

    if loading {
        col = col.push(loading_view(frame));
    }

    col.into()
}

pub fn welcome_view<'a>() -> Element<'a, Message> {
    let prompts = EXAMPLE_PROMPTS.iter().fold(Column::new().spacing(8), |c, prompt| {
        c.push(
            button(text(format!("⌕ {}", prompt)).size(13))
                .style(button::secondary)
                .width(Length::Fill)
                .padding(12)
                .on_press(Message::UsePrompt(prompt.to_string())),
        )
    });

    container(
        column![
            text("Welcome to PRO.AI").size(26).font(bold()),
            text(
                "Your AI-powered research assistant for web and academic sources. \
                 Ask a question and get a synthesis from across the internet and ArXiv."
            )
            .size(13)
            .color(MUTED),
            prompts,
        ]
        .spacing(18)
        .max_width(520),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .align_x(alignment::Horizontal::Center)
    .align_y(alignment::Vertical::Center)
    .into()
}

// --- sidebar ---

fn session_item<'a>(session: &'a Session, active: bool, preview_max_chars: usize, now: i64) -> Element<'a, Message> {
    let preview = session
        .first_user_message()
        .map(|m| session::truncate_text(&m.content, preview_max_chars))
        .unwrap_or_default();

    let mut info = Column::new()
        .spacing(2)
        .push(text(&session.title).size(12).font(bold()).color(if active { PURPLE } else { Color::WHITE }));
    if !preview.is_empty() {
        info = info.push(text(preview).size(10).color(MUTED));
    }
    info = info.push(text(session::format_timestamp(session.created_at, now)).size(10).color(MUTED));

    row![
        button(info)
            .style(if active { button::secondary } else { button::text })
            .width(Length::Fill)
            .on_press(Message::SelectSession(session.id.clone())),
        button(text("✕").size(12))
            .style(button::danger)
            .on_press(Message::DeleteSession(session.id.clone())),
    ]
    .spacing(4)
    .align_y(alignment::Vertical::Center)
    .into()
}

fn agent_panel<'a>(chat: &'a ChatState, roster: &'a [AgentInfo]) -> Element<'a, Message> {
    let mut col = Column::new()
        .spacing(8)
        .push(text("AGENT PIPELINE").size(11).font(bold()).color(MUTED));

    for agent in roster {
        let active = chat.active_agent_id() == Some(agent.id.as_str());
        col = col.push(
            row![
                text("●").size(10).color(if active { GREEN } else { MUTED }),
                column![
                    text(&agent.name).size(11).color(if active { PURPLE } else { Color::WHITE }),
                    text(&agent.role).size(9).color(MUTED),
                ]
                .spacing(1),
            ]
            .spacing(8)
            .align_y(alignment::Vertical::Center),
        );
    }

    for entry in chat.activity().recent(4) {
        let color = match entry.kind {
            Kind::Failure => RED,
            Kind::Response => GREEN,
            Kind::Request => CYAN,
            Kind::Info => MUTED,
        };
        col = col.push(text(session::truncate_text(&entry.text, 36)).size(9).color(color));
    }

    container(col).padding(12).width(Length::Fill).style(container::rounded_box).into()
}

pub fn sidebar_view<'a>(
    chat: &'a ChatState,
    roster: &'a [AgentInfo],
    preview_max_chars: usize,
) -> Element<'a, Message> {
    let now = session::now_millis();
    let store = chat.store();

    let list: Element<'a, Message> = if store.is_empty() {
        container(text("No sessions yet").size(11).color(MUTED))
            .width(Length::Fill)
            .padding(24)
            .align_x(alignment::Horizontal::Center)
            .into()
    } else {
        store
            .sessions()
            .iter()
            .fold(Column::new().spacing(4), |c, s| {
                let active = store.active_id() == Some(s.id.as_str());
                c.push(session_item(s, active, preview_max_chars, now))
            })
            .into()
    };

    column![
        row![text("PRO.AI").size(16).font(bold()).color(PURPLE)],
        button(text("+ New Research").size(13))
            .style(button::primary)
            .width(Length::Fill)
            .padding(10)
            .on_press(Message::NewSession),
        scrollable(list).height(Length::Fill),
        agent_panel(chat, roster),
    ]
    .spacing(12)
    .padding(12)
    .width(Length::Fixed(260.0))
    .height(Length::Fill)
    .into()
}

pub fn header_view<'a>(chat: &'a ChatState) -> Element<'a, Message> {
    let title = chat.active_session().map(|s| s.title.as_str()).unwrap_or("PRO.AI");
    let sample_label = if chat.sample_data() { "Sample Data: On" } else { "Sample Data: Off" };

    row![
        text(title).size(15).font(bold()),
        horizontal_space(),
        button(text(sample_label).size(11))
            .style(if chat.sample_data() { button::primary } else { button::secondary })
            .on_press(Message::ToggleSample),
    ]
    .spacing(10)
    .padding([10, 16])
    .align_y(alignment::Vertical::Center)
    .into()
}

pub fn fault_view<'a>(reason: String) -> Element<'a, Message> {
    container(
        column![
            text("Something went wrong").size(22).font(bold()),
            text(reason).size(13).color(MUTED),
            button(text("Try again").size(13))
                .style(button::primary)
                .padding(10)
                .on_press(Message::ResetFault),
        ]
        .spacing(14)
        .max_width(420)
        .align_x(alignment::Horizontal::Center),
    )
    .width(Length::Fill)
    .height(Length::Fill)
    .align_x(alignment::Horizontal::Center)
    .align_y(alignment::Vertical::Center)
    .into()
}
