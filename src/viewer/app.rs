//! Main application logic

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::actors::supervisor::Supervisor;
use crate::config::Config;
use crate::display::{ChannelSink, PanelUpdate};
use crate::rpc::{HttpRpcClient, WsConnector};

use super::{state::DashboardState, ui};

/// How long to wait for a key press before redrawing
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Main TUI application
pub struct App {
    state: DashboardState,
    updates: mpsc::UnboundedReceiver<PanelUpdate>,
    supervisor: Supervisor,
}

impl App {
    /// Create a new application instance
    ///
    /// Nothing is started yet; feeds begin when [`App::run`] is called.
    pub fn new(config: Config) -> Result<Self> {
        let endpoint = config.endpoint()?;

        let client = HttpRpcClient::new(endpoint.rpc_url.clone(), config.request_timeout())
            .context("failed to build HTTP client")?;
        let (sink, updates) = ChannelSink::new();

        let state = DashboardState::new(config.max_log_lines);
        let supervisor = Supervisor::new(
            config,
            Arc::new(client),
            Arc::new(WsConnector::new()),
            Arc::new(sink),
        )?;

        Ok(Self {
            state,
            updates,
            supervisor,
        })
    }

    /// Run the application until the user quits or Ctrl-C arrives
    pub async fn run(mut self) -> Result<()> {
        // Setup terminal
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let cancel = self.supervisor.cancel_token();
        spawn_ctrl_c_listener(cancel.clone());

        self.supervisor.start();

        // Run event loop
        let result = self.run_event_loop(&mut terminal, &cancel);

        tracing::debug!("leaving event loop");
        self.supervisor.shutdown().await;

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    /// Main event loop
    fn run_event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        while !cancel.is_cancelled() {
            // Handle feed updates (non-blocking)
            while let Ok(update) = self.updates.try_recv() {
                self.state.apply(update);
            }

            // Render UI
            terminal.draw(|f| ui::render(f, &self.state))?;

            // Handle keyboard events (with timeout)
            if event::poll(INPUT_POLL)?
                && let Event::Key(key) = event::read()?
                && key.kind == KeyEventKind::Press
                && is_quit_key(key)
            {
                break; // Quit
            }
        }

        Ok(())
    }
}

/// Raw mode swallows SIGINT, so Ctrl-C also counts as a quit key
fn is_quit_key(key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn spawn_ctrl_c_listener(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::warn!("failed to listen for ctrl-c: {}", e);
                    return;
                }
                tracing::info!("received ctrl-c, shutting down");
                cancel.cancel();
            }
        }
    });
}
