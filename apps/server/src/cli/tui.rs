//! `tui`: a read-only `ratatui` dashboard polling the same `/status` and
//! `/stats` endpoints the HTTP surface exposes. Shares no state with the
//! server process — it is just another HTTP client, refreshed on a timer.

use crate::cli::client;
use crate::config::CapfoxConfig;
use anyhow::{Context, Result};
use capfox_domain_models::SystemState;
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};
use ratatui::Terminal;
use std::io::stdout;
use std::time::Duration;

const REFRESH: Duration = Duration::from_millis(1000);

pub async fn run(config: &CapfoxConfig) -> Result<()> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen).context("entering alternate screen")?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend).context("constructing terminal")?;

    let result = event_loop(config, &mut terminal).await;

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    result
}

async fn event_loop<B: ratatui::backend::Backend>(config: &CapfoxConfig, terminal: &mut Terminal<B>) -> Result<()> {
    let http = client::build();
    let status_url = format!("{}/status", config.base_url());
    let mut last_state: Option<SystemState> = None;
    let mut last_error: Option<String> = None;

    loop {
        match http.get(&status_url).send().await {
            Ok(response) => match response.json::<SystemState>().await {
                Ok(state) => {
                    last_state = Some(state);
                    last_error = None;
                }
                Err(err) => last_error = Some(format!("decode error: {err}")),
            },
            Err(err) => last_error = Some(format!("connection error: {err}")),
        }

        terminal.draw(|frame| draw(frame, last_state.as_ref(), last_error.as_deref()))?;

        if event::poll(REFRESH)? {
            if let Event::Key(key) = event::read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    return Ok(());
                }
            }
        }
    }
}

fn draw(frame: &mut ratatui::Frame, state: Option<&SystemState>, error: Option<&str>) {
    let area = frame.area();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
        ])
        .split(area);

    let Some(state) = state else {
        let message = error.unwrap_or("waiting for first sample...");
        frame.render_widget(
            Paragraph::new(message).block(Block::default().title("capfox").borders(Borders::ALL)),
            area,
        );
        return;
    };

    frame.render_widget(gauge("cpu", state.cpu.overall_percent), rows[0]);
    frame.render_widget(gauge("memory", state.memory.percent), rows[1]);

    if let Some(gpu) = state.gpus.first() {
        frame.render_widget(gauge(&format!("gpu[{}] {}", gpu.index, gpu.name), gpu.utilization_percent), rows[2]);
    } else {
        frame.render_widget(
            Paragraph::new("no gpu detected").block(Block::default().title("gpu").borders(Borders::ALL)),
            rows[2],
        );
    }

    let mut lines = vec![
        format!("processes: {}  threads: {}", state.processes, state.threads),
        format!("context switches/s: {:.1}", state.context_switches_per_second),
        format!("collected at: {}", state.timestamp),
    ];
    for (mount, usage) in &state.storage {
        lines.push(format!("disk {mount}: {:.1}% used, {:.1} GiB free", usage.percent, usage.free_gb()));
    }
    if let Some(error) = error {
        lines.push(format!("last poll error: {error}"));
    }
    lines.push("press q to quit".to_string());

    frame.render_widget(
        Paragraph::new(lines.join("\n")).block(Block::default().title("details").borders(Borders::ALL)),
        rows[3],
    );
}

fn gauge(label: &str, percent: f64) -> Gauge<'static> {
    let ratio = (percent / 100.0).clamp(0.0, 1.0);
    let color = if percent >= 90.0 {
        Color::Red
    } else if percent >= 75.0 {
        Color::Yellow
    } else {
        Color::Green
    };
    Gauge::default()
        .block(Block::default().title(label.to_string()).borders(Borders::ALL))
        .gauge_style(Style::default().fg(color))
        .ratio(ratio)
        .label(format!("{percent:.1}%"))
}
