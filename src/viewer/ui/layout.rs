//! Main dashboard layout

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::display::Panel;
use crate::viewer::state::DashboardState;

use super::widgets::{render_gauge, render_log, render_value};

/// Render the main dashboard UI
pub fn render(frame: &mut Frame, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),      // Node
            Constraint::Length(3),      // Chain constants
            Constraint::Percentage(45), // Validators + gauges
            Constraint::Min(5),         // Transactions
            Constraint::Length(3),      // Footer
        ])
        .split(frame.area());

    render_row(
        frame,
        chunks[0],
        state,
        &[Panel::Network, Panel::Health, Panel::SystemTime, Panel::Peers],
    );
    render_row(
        frame,
        chunks[1],
        state,
        &[
            Panel::LatestBlock,
            Panel::MaxBlockSize,
            Panel::GasLimit,
            Panel::SecondsPerBlock,
        ],
    );
    render_middle(frame, chunks[2], state);
    render_log(frame, chunks[3], state, Panel::Transactions);
    render_footer(frame, chunks[4], state);
}

/// Equal-width value panels side by side
fn render_row(frame: &mut Frame, area: Rect, state: &DashboardState, panels: &[Panel]) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, panels.len() as u32); panels.len()])
        .split(area);

    for (panel, column) in panels.iter().zip(columns.iter()) {
        render_value(frame, *column, state, *panel);
    }
}

/// Validator table on the left, gauges and gas figures on the right
fn render_middle(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_log(frame, halves[0], state, Panel::Validators);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Min(3),
        ])
        .split(halves[1]);

    render_gauge(frame, right[0], state, Panel::RoundProgress);
    render_gauge(frame, right[1], state, Panel::SyncProgress);
    render_row(frame, right[2], state, &[Panel::GasMax, Panel::GasAvgBlock]);
    render_row(frame, right[3], state, &[Panel::GasAvgTx, Panel::LatestTxGas]);
}

/// Render footer with keybindings and the last update time
fn render_footer(frame: &mut Frame, area: Rect, state: &DashboardState) {
    let mut footer_text = vec![
        Span::styled(
            "PRESS Q or ESC TO QUIT",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
    ];

    match state.last_update {
        Some(at) => footer_text.push(Span::raw(format!(
            "last update {}",
            at.format("%H:%M:%S")
        ))),
        None => footer_text.push(Span::styled(
            "waiting for node",
            Style::default().fg(Color::Red),
        )),
    }

    let footer =
        Paragraph::new(Line::from(footer_text)).block(Block::default().borders(Borders::ALL));

    frame.render_widget(footer, area);
}
