//! Main TUI application logic for the live dashboard.

use super::{dashboard, events, Theme};
use crate::config::Config;
use crate::error::AgentError;
use crate::services::AnalysisEngine;
use crate::types::AnalysisReport;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Frame, Terminal};
use std::{
    io,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Per-ticker analysis state shown in the table.
#[derive(Debug)]
pub enum TickerStatus {
    /// No result yet (first refresh still running).
    Pending,
    /// Latest successful analysis.
    Ready(AnalysisReport),
    /// Latest attempt failed; message shown inline, loop keeps going.
    Failed(String),
}

/// One watchlist row.
pub struct TickerRow {
    pub ticker: String,
    pub status: TickerStatus,
    /// Set while a refresh for this ticker is in flight and we already have
    /// data to keep showing.
    pub refreshing: bool,
}

type AnalysisOutcome = (String, Result<AnalysisReport, AgentError>);

/// Dashboard application state.
pub struct App {
    engine: Arc<AnalysisEngine>,
    pub rows: Vec<TickerRow>,
    pub mock: bool,
    pub refresh_interval: Duration,
    next_refresh_at: Instant,
    theme: Theme,
    should_quit: bool,
    results_tx: mpsc::UnboundedSender<AnalysisOutcome>,
    tasks: Vec<JoinHandle<()>>,
}

impl App {
    fn new(
        engine: Arc<AnalysisEngine>,
        config: &Config,
        mock: bool,
        results_tx: mpsc::UnboundedSender<AnalysisOutcome>,
    ) -> Self {
        let rows = config
            .watchlist
            .iter()
            .map(|ticker| TickerRow {
                ticker: ticker.clone(),
                status: TickerStatus::Pending,
                refreshing: false,
            })
            .collect();

        Self {
            engine,
            rows,
            mock,
            refresh_interval: Duration::from_secs(config.refresh_secs.max(1)),
            next_refresh_at: Instant::now(),
            theme: Theme::default(),
            should_quit: false,
            results_tx,
            tasks: Vec::new(),
        }
    }

    /// Seconds until the next automatic refresh.
    pub fn countdown_secs(&self) -> u64 {
        self.next_refresh_at
            .saturating_duration_since(Instant::now())
            .as_secs()
    }

    /// Fraction of the refresh interval already elapsed, for the gauge.
    pub fn refresh_progress(&self) -> f64 {
        let remaining = self
            .next_refresh_at
            .saturating_duration_since(Instant::now())
            .as_secs_f64();
        (1.0 - remaining / self.refresh_interval.as_secs_f64()).clamp(0.0, 1.0)
    }

    /// Kick off one independent analysis task per watchlist ticker.
    ///
    /// One ticker's failure must never block or corrupt another's, so each
    /// ticker gets its own task and reports back over the channel.
    fn start_refresh(&mut self) {
        self.tasks.retain(|t| !t.is_finished());

        for row in &mut self.rows {
            if row.refreshing {
                continue;
            }
            row.refreshing = true;

            let engine = self.engine.clone();
            let ticker = row.ticker.clone();
            let tx = self.results_tx.clone();
            self.tasks.push(tokio::spawn(async move {
                let outcome = engine.analyze(&ticker).await;
                // Receiver dropping just means the dashboard is closing.
                let _ = tx.send((ticker, outcome));
            }));
        }

        self.next_refresh_at = Instant::now() + self.refresh_interval;
        debug!("dashboard refresh started");
    }

    /// Apply one analysis outcome to its row.
    pub fn apply_result(&mut self, (ticker, outcome): AnalysisOutcome) {
        if let Some(row) = self.rows.iter_mut().find(|r| r.ticker == ticker) {
            row.refreshing = false;
            row.status = match outcome {
                Ok(report) => TickerStatus::Ready(report),
                Err(e) => TickerStatus::Failed(e.root_cause().to_string()),
            };
        }
    }

    /// Handle a terminal event.
    pub fn handle_event(&mut self, event: events::Event) {
        match event {
            events::Event::Key(key) => {
                if events::is_quit(&key) {
                    self.should_quit = true;
                } else if events::is_refresh(&key) {
                    self.start_refresh();
                }
            }
            events::Event::Tick => {
                if Instant::now() >= self.next_refresh_at {
                    self.start_refresh();
                }
            }
            events::Event::Resize(_, _) => {}
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Render the dashboard.
    pub fn render(&self, frame: &mut Frame) {
        dashboard::render(frame, frame.size(), self, &self.theme);
    }

    /// Abort any in-flight analysis tasks.
    fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

/// Run the live dashboard until the user quits.
pub async fn run_dashboard(engine: AnalysisEngine, config: &Config, mock: bool) -> io::Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let (results_tx, mut results_rx) = mpsc::unbounded_channel();
    let mut app = App::new(Arc::new(engine), config, mock, results_tx);
    let mut event_handler = events::EventHandler::new(Duration::from_millis(250));

    // First refresh starts immediately via the initial deadline.
    loop {
        terminal.draw(|f| app.render(f))?;

        tokio::select! {
            Some(event) = event_handler.next() => app.handle_event(event),
            Some(outcome) = results_rx.recv() => app.apply_result(outcome),
            else => break,
        }

        if app.should_quit() {
            break;
        }
    }

    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}
