use std::io::Write;

use anyhow::{anyhow, Result};
use clap::Parser;
use client_core::{
    begin_exchange, complete_exchange, ChatSession, RelayClient, Sender, SessionEffect,
    SessionEvent,
};
use shared::domain::ProviderKind;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:3000")]
    server_url: String,
    /// Ask the relay for a specific provider instead of its default.
    #[arg(long, value_parser = parse_provider)]
    provider: Option<ProviderKind>,
}

fn parse_provider(raw: &str) -> Result<ProviderKind> {
    ProviderKind::parse(raw).ok_or_else(|| anyhow!("unknown provider '{raw}'"))
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Quit,
    Event(SessionEvent),
}

/// `/quit`, `/reset` and `/<n>` (pick quick reply n) are commands; anything
/// else is a message.
fn parse_line(line: &str) -> Command {
    let trimmed = line.trim();
    match trimmed {
        "/quit" | "/exit" => Command::Quit,
        "/reset" => Command::Event(SessionEvent::Reset),
        _ => match trimmed
            .strip_prefix('/')
            .and_then(|n| n.parse::<usize>().ok())
        {
            Some(n) if n >= 1 => Command::Event(SessionEvent::QuickReplySelected { index: n - 1 }),
            _ => Command::Event(SessionEvent::Submit {
                text: line.to_string(),
            }),
        },
    }
}

fn show(effects: &[SessionEffect]) {
    for effect in effects {
        match effect {
            SessionEffect::MessageAppended(message) if message.sender == Sender::Bot => {
                println!("bot> {}", message.plain_text());
            }
            SessionEffect::TypingShown => println!("bot is typing..."),
            SessionEffect::TranscriptCleared => println!("(conversation cleared)"),
            SessionEffect::QuickRepliesChanged(replies) => print_quick_replies(replies),
            _ => {}
        }
    }
}

fn print_quick_replies(replies: &[String]) {
    if replies.is_empty() {
        return;
    }
    let listed: Vec<String> = replies
        .iter()
        .enumerate()
        .map(|(i, reply)| format!("/{} {reply}", i + 1))
        .collect();
    println!("suggestions: {}", listed.join("  |  "));
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let client = RelayClient::new(&args.server_url)?;
    let mut session = match args.provider {
        Some(provider) => ChatSession::new().with_provider(provider),
        None => ChatSession::new(),
    };
    info!(session = %session.id(), chat_url = %client.chat_url(), "chat session started");

    println!("Connected to {}. Type a message, /<n> for a suggestion, /reset or /quit.", args.server_url);
    print_quick_replies(session.quick_replies());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let event = match parse_line(&line) {
            Command::Quit => break,
            Command::Event(event) => event,
        };
        // Typing shows before the request goes out; the reply arrives later.
        let (effects, request) = begin_exchange(&mut session, event);
        show(&effects);
        std::io::stdout().flush()?;
        if let Some(request) = request {
            let effects = complete_exchange(&mut session, &client, request).await;
            show(&effects);
        }
    }

    Ok(())
}
