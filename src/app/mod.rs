//! Line-mode terminal front end: state, event handling and action dispatch.

pub mod action;
pub mod commands;
pub mod event;
pub mod handler;
pub mod state;

use crate::app::action::Action;
use crate::app::event::AppEvent;
use crate::app::state::AppState;
use anyhow::{Context, Result};
use crabline::config::AppConfig;
use crabline::irc::{ChatClient, ChatMessage, SessionFactory};
use std::io::BufRead;
use tokio::sync::mpsc;

pub async fn run(cfg: AppConfig) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let factory = SessionFactory::websocket(cfg.session_settings());
    let mut client = ChatClient::new(factory, cfg.identity());
    let mut state = AppState::new(client.has_account());

    for channel in &cfg.channels {
        client.follow(channel, forward_to(&event_tx)).await?;
        state.follow(channel);
    }
    client
        .start()
        .await
        .with_context(|| format!("Failed to connect to {}", cfg.server.url))?;
    state.welcome();

    // A plain thread, so a pending stdin read never holds up exit.
    let input_tx = event_tx.clone();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if input_tx.send(AppEvent::Input(line)).is_err() {
                return;
            }
        }
        let _ = input_tx.send(AppEvent::InputClosed);
    });

    flush(&mut state);
    while let Some(event) = event_rx.recv().await {
        let actions = handler::handle_event(&mut state, event);

        let mut quit = false;
        for action in actions {
            match action {
                Action::Follow { channel } => {
                    if let Err(e) = client.follow(&channel, forward_to(&event_tx)).await {
                        state.error(format!("Join failed: {}", e));
                        state.unfollow(&channel);
                    }
                }
                Action::Unfollow { channel } => {
                    if let Err(e) = client.unfollow(&channel).await {
                        state.error(format!("Part failed: {}", e));
                    }
                }
                Action::SendMessage { channel, text } => {
                    if let Err(e) = client.send_message(&channel, &text).await {
                        state.error(format!("Send failed: {}", e));
                    }
                }
                Action::Quit => quit = true,
            }
        }

        flush(&mut state);
        if quit {
            break;
        }
    }

    client.shutdown().await;
    Ok(())
}

/// Dispatcher callback that only hands the message to the event loop.
fn forward_to(tx: &mpsc::UnboundedSender<AppEvent>) -> impl Fn(ChatMessage) + Send + Sync + 'static {
    let tx = tx.clone();
    move |msg| {
        let _ = tx.send(AppEvent::Chat(msg));
    }
}

fn flush(state: &mut AppState) {
    for line in state.output.drain(..) {
        println!("{}", line);
    }
}
