use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tracing::{info, warn};

use super::bars;
use crate::ConfigSource;
use kickviz::audio;
use kickviz::config::{Config, VisualizerConfig};
use kickviz::visualizer::Visualizer;

const SENSITIVITY_STEP: f32 = 0.05;

type ConfigTx = watch::Sender<Arc<VisualizerConfig>>;

pub async fn run(config: Config, source: ConfigSource) -> Result<()> {
    // Start audio before touching the terminal so input errors print normally
    let (_audio_input, ring) = audio::create_audio_pipeline(&config.audio)?;
    let visualizer = Visualizer::new(ring, config.audio.window_len);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, visualizer, config, source).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    mut visualizer: Visualizer,
    config: Config,
    source: ConfigSource,
) -> Result<()> {
    let source = Arc::new(source);
    let (config_tx, config_rx) = watch::channel(Arc::new(config.visualizer));
    spawn_hangup_reload(config_tx.clone(), source.clone());

    let frame_interval = config.display.frame_interval();

    loop {
        // One snapshot per tick; updates land before the next one
        let snapshot = config_rx.borrow().clone();
        let tuning = snapshot.sanitized();

        terminal.draw(|frame| {
            let area = frame.area();

            // Clear with transparent/reset background for terminal transparency support
            let block = ratatui::widgets::Block::default().style(Style::default().bg(Color::Reset));
            frame.render_widget(block, area);

            // Status on the top row, bars below
            let bars_area = Rect::new(area.x, area.y + 1, area.width, area.height.saturating_sub(1));
            let bar_count = tuning.bar_count(u32::from(bars_area.width));
            let bar_frame = visualizer.tick(&tuning, bar_count);
            bars::render(frame, bars_area, bar_frame, &tuning);

            render_status(frame, area, &tuning, bar_count);
        })?;

        // Handle input
        if event::poll(frame_interval)? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key {
                    KeyEvent {
                        code: KeyCode::Char('q'),
                        ..
                    }
                    | KeyEvent {
                        code: KeyCode::Char('c'),
                        modifiers: KeyModifiers::CONTROL,
                        ..
                    } => {
                        break;
                    }
                    KeyEvent {
                        code: KeyCode::Char('m'),
                        ..
                    } => {
                        update(&config_tx, |c| c.mode = c.mode.next());
                    }
                    KeyEvent {
                        code: KeyCode::Char('s'),
                        ..
                    } => {
                        update(&config_tx, |c| c.shape = c.shape.next());
                    }
                    KeyEvent {
                        code: KeyCode::Char('f'),
                        ..
                    } => {
                        update(&config_tx, |c| c.freq_range = c.freq_range.next());
                    }
                    KeyEvent {
                        code: KeyCode::Char('+') | KeyCode::Char('='),
                        ..
                    } => {
                        update(&config_tx, |c| c.sensitivity += SENSITIVITY_STEP);
                    }
                    KeyEvent {
                        code: KeyCode::Char('-'),
                        ..
                    } => {
                        update(&config_tx, |c| c.sensitivity -= SENSITIVITY_STEP);
                    }
                    KeyEvent {
                        code: KeyCode::Char('r'),
                        ..
                    } => {
                        reload(&config_tx, &source);
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

/// Publish an edited copy of the current snapshot, clamped to valid ranges.
fn update(tx: &ConfigTx, edit: impl FnOnce(&mut VisualizerConfig)) {
    tx.send_modify(|current| {
        let mut next = **current;
        edit(&mut next);
        *current = Arc::new(next.sanitized());
    });
}

fn reload(tx: &ConfigTx, source: &ConfigSource) {
    match source.reload() {
        Ok(config) => {
            info!("Config reloaded");
            tx.send_replace(Arc::new(config));
        }
        Err(e) => warn!("Config reload failed: {:#}", e),
    }
}

/// Reload the config file whenever the process gets SIGHUP.
fn spawn_hangup_reload(tx: ConfigTx, source: Arc<ConfigSource>) {
    tokio::spawn(async move {
        let mut hangup = match signal(SignalKind::hangup()) {
            Ok(hangup) => hangup,
            Err(e) => {
                warn!("Could not install SIGHUP handler: {}", e);
                return;
            }
        };

        while hangup.recv().await.is_some() {
            reload(&tx, &source);
        }
    });
}

fn render_status(frame: &mut Frame, area: Rect, config: &VisualizerConfig, bar_count: usize) {
    let status = format!(
        " [m]ode: {} | [s]hape: {} | [f]req: {} | [+/-] sens: {:.2} | [r]eload | [q]uit | {} bars ",
        config.mode.name(),
        config.shape.name(),
        config.freq_range.name(),
        config.sensitivity,
        bar_count,
    );

    for (i, ch) in status.chars().enumerate() {
        if i < area.width as usize {
            let cell = frame.buffer_mut().cell_mut((area.x + i as u16, area.y));
            if let Some(cell) = cell {
                cell.set_char(ch);
                cell.set_fg(Color::DarkGray);
            }
        }
    }
}
