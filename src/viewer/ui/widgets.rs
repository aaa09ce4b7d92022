//! Reusable UI widgets

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Gauge, Paragraph},
};

use crate::display::Panel;
use crate::viewer::state::DashboardState;

fn panel_block(panel: Panel) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(panel.title())
        .title_style(Style::default().fg(Color::Cyan))
}

/// Render a panel holding a single value
pub fn render_value(frame: &mut Frame, area: Rect, state: &DashboardState, panel: Panel) {
    let paragraph = Paragraph::new(state.text(panel))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(panel_block(panel));

    frame.render_widget(paragraph, area);
}

/// Render a scrolling log, newest lines at the bottom
pub fn render_log(frame: &mut Frame, area: Rect, state: &DashboardState, panel: Panel) {
    // Inner height without the borders
    let visible = area.height.saturating_sub(2) as usize;

    let lines: Vec<&str> = state.lines(panel).collect();
    let start = lines.len().saturating_sub(visible);

    let paragraph = Paragraph::new(lines[start..].join("\n")).block(panel_block(panel));

    frame.render_widget(paragraph, area);
}

/// Render a percentage gauge
pub fn render_gauge(frame: &mut Frame, area: Rect, state: &DashboardState, panel: Panel) {
    let percent = state.gauge(panel);

    let color = match percent {
        100 => Color::Green,
        0..=39 => Color::Yellow,
        _ => Color::Cyan,
    };

    let gauge = Gauge::default()
        .block(panel_block(panel))
        .gauge_style(Style::default().fg(color))
        .percent(u16::from(percent));

    frame.render_widget(gauge, area);
}
