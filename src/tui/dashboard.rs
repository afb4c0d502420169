//! Watchlist table rendering for the live dashboard.

use super::app::{App, TickerStatus};
use super::Theme;
use crate::types::Trend;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table},
    Frame,
};

/// Render the dashboard view.
pub fn render(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(0),    // Watchlist table
            Constraint::Length(3), // Refresh gauge
            Constraint::Length(3), // Status bar
        ])
        .split(area);

    render_title(frame, chunks[0], app, theme);
    render_watchlist(frame, chunks[1], app, theme);
    render_refresh_gauge(frame, chunks[2], app, theme);
    render_status_bar(frame, chunks[3], theme);
}

fn render_title(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mode = if app.mock { "MOCK" } else { "LIVE" };
    let title = Line::from(vec![
        Span::styled("Augur Watchlist", theme.title()),
        Span::raw("  "),
        Span::styled(format!("[{mode}]"), theme.muted()),
    ]);

    let block = Paragraph::new(title).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}

fn render_watchlist(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let header = Row::new(vec![
        Cell::from("Ticker"),
        Cell::from("Price"),
        Cell::from("Trend"),
        Cell::from("RSI"),
        Cell::from("Signal"),
        Cell::from("Conf"),
        Cell::from("Reasoning"),
    ])
    .style(theme.header());

    let rows: Vec<Row> = app
        .rows
        .iter()
        .map(|row| match &row.status {
            TickerStatus::Pending => Row::new(vec![
                Cell::from(row.ticker.clone()),
                Cell::from(Span::styled("fetching…", theme.muted())),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
                Cell::from(""),
            ]),
            TickerStatus::Failed(message) => Row::new(vec![
                Cell::from(row.ticker.clone()),
                Cell::from(Span::styled("N/A", theme.error())),
                Cell::from(""),
                Cell::from(""),
                Cell::from(Span::styled("ERR", theme.error())),
                Cell::from(""),
                Cell::from(Span::styled(message.clone(), theme.error())),
            ]),
            TickerStatus::Ready(report) => {
                let market = &report.market;
                let signal = &report.signal;
                let trend_up = matches!(market.trend, Trend::Up);
                let refresh_marker = if row.refreshing { " ⟳" } else { "" };

                Row::new(vec![
                    Cell::from(format!("{}{}", row.ticker, refresh_marker)),
                    Cell::from(format!("${:.2}", market.current_price)),
                    Cell::from(Span::styled(market.trend.to_string(), theme.trend(trend_up))),
                    Cell::from(format!("{:.1}", market.rsi_14)),
                    Cell::from(Span::styled(signal.action.to_string(), theme.action(signal.action))),
                    Cell::from(Span::styled(
                        format!("{:.0}%", signal.confidence * 100.0),
                        theme.confidence(signal.confidence),
                    )),
                    Cell::from(signal.reasoning.clone()),
                ])
            }
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(9),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(6),
            Constraint::Length(7),
            Constraint::Length(6),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title("Signals")
            .border_style(theme.border()),
    );

    frame.render_widget(table, area);
}

fn render_refresh_gauge(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Next refresh")
                .border_style(theme.border()),
        )
        .gauge_style(theme.muted())
        .ratio(app.refresh_progress())
        .label(format!("{}s", app.countdown_secs()));

    frame.render_widget(gauge, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, theme: &Theme) {
    let text = Line::from(vec![
        Span::styled("q", theme.title()),
        Span::raw(" quit | "),
        Span::styled("r", theme.title()),
        Span::raw(" refresh now"),
    ]);

    let block = Paragraph::new(text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(theme.border()),
    );
    frame.render_widget(block, area);
}
