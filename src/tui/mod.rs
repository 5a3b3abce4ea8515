//! Ratatui-based terminal UI.
//!
//! A settings panel holds the run parameters (N and λ act as sliders); a fit
//! runs on the UI thread, redrawing and polling keys at every solver pause so
//! the segmentation can be watched as it evolves.

use std::cell::RefCell;
use std::io;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, info};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame, Terminal,
};

use crate::app::pipeline;
use crate::data::generate_sample;
use crate::domain::RunConfig;
use crate::error::{AppError, SolverError};
use crate::model::Observer;
use crate::solver::{Pacer, Progress};

mod plotters_chart;
mod scene;

use plotters_chart::SegmentChart;
pub use scene::Scene;

const N_MIN: usize = 2;
const N_MAX: usize = 60;
const LAMBDA_MAX: f64 = 20.0;
const LAMBDA_STEP: f64 = 0.5;
const NOISE_MAX: f64 = 3.0;
const NOISE_STEP: f64 = 0.1;
const DELAY_STEPS_MS: [u64; 8] = [0, 10, 25, 50, 100, 250, 500, 1000];
const FIELD_COUNT: usize = 5;

/// Start the TUI.
pub fn run(config: RunConfig) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(config)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Headline numbers of the last completed fit.
#[derive(Debug, Clone, Copy)]
struct LastFit {
    lambda: f64,
    segments: usize,
    cost: f64,
    fits: usize,
}

/// Solver position shown while a fit is running.
#[derive(Debug, Clone, Copy)]
struct Live {
    progress: Progress,
    delay_ms: u64,
}

struct App {
    config: RunConfig,
    selected_field: usize,
    status: String,
    scene: Rc<RefCell<Scene>>,
    last: Option<LastFit>,
}

impl App {
    fn new(config: RunConfig) -> Result<Self, AppError> {
        let mut app = Self {
            config,
            selected_field: 0,
            status: "Press Enter to fit.".to_string(),
            scene: Rc::new(RefCell::new(Scene::new())),
            last: None,
        };
        app.preview()?;
        Ok(app)
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| draw(f, self, None))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    let quit = match key.code {
                        KeyCode::Enter | KeyCode::Char('f') => self.fit(terminal)?,
                        code => self.handle_key(code)?,
                    };
                    if quit {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the UI should exit.
    fn handle_key(&mut self, code: KeyCode) -> Result<bool, AppError> {
        match code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Up => {
                self.selected_field = self.selected_field.saturating_sub(1);
            }
            KeyCode::Down => {
                if self.selected_field + 1 < FIELD_COUNT {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1)?,
            KeyCode::Right => self.adjust_field(1)?,
            KeyCode::Char('+') => {
                self.config.delay_ms = step_delay(self.config.delay_ms, 1);
                self.status = format!("delay: {}ms", self.config.delay_ms);
            }
            KeyCode::Char('-') => {
                self.config.delay_ms = step_delay(self.config.delay_ms, -1);
                self.status = format!("delay: {}ms", self.config.delay_ms);
            }
            KeyCode::Char('r') => {
                self.config.seed = self.config.seed.wrapping_add(1);
                self.preview()?;
                self.status = format!("seed: {}", self.config.seed);
            }
            _ => {}
        }
        Ok(false)
    }

    fn adjust_field(&mut self, delta: i32) -> Result<(), AppError> {
        match self.selected_field {
            0 => {
                let n = self.config.n as i64 + i64::from(delta);
                self.config.n = n.clamp(N_MIN as i64, N_MAX as i64) as usize;
                self.status = format!("N: {}", self.config.n);
            }
            1 => {
                let lambda = self.config.lambda + f64::from(delta) * LAMBDA_STEP;
                self.config.lambda = lambda.clamp(0.0, LAMBDA_MAX);
                self.status = format!("λ: {:.1}", self.config.lambda);
            }
            2 => {
                self.config.delay_ms = step_delay(self.config.delay_ms, delta);
                self.status = format!("delay: {}ms", self.config.delay_ms);
                return Ok(());
            }
            3 => {
                self.config.shape = self.config.shape.next();
                self.status = format!("shape: {}", self.config.shape.display_name());
            }
            4 => {
                let noise = self.config.noise + f64::from(delta) * NOISE_STEP;
                self.config.noise = (noise.clamp(0.0, NOISE_MAX) * 10.0).round() / 10.0;
                self.status = format!("noise: {:.1}", self.config.noise);
            }
            _ => {}
        }
        self.preview()
    }

    /// Show the dataset for the current settings, without any fitted lines.
    fn preview(&mut self) -> Result<(), AppError> {
        let points = generate_sample(&self.config)?;
        self.scene.borrow_mut().show_points(&points);
        self.last = None;
        Ok(())
    }

    /// Run a paced fit. Returns `true` when the user asked to quit mid-run.
    fn fit<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<bool, AppError> {
        if let Err(err) = self.config.validate() {
            self.status = err.to_string();
            return Ok(false);
        }

        let points = generate_sample(&self.config)?;
        self.scene.borrow_mut().clear();
        let observers: Vec<Box<dyn Observer>> = vec![Box::new(self.scene.clone())];
        let model = pipeline::load_model(&points, observers);
        let lambda = self.config.lambda;
        info!("tui fit: n={} lambda={lambda}", points.len());

        let mut pacer = TuiPacer {
            terminal,
            app: &*self,
            delay_ms: self.config.delay_ms,
            quit: false,
            error: None,
        };
        let result = pipeline::solve(model, &points, lambda, &mut pacer);
        let TuiPacer { delay_ms, quit, error, .. } = pacer;
        self.config.delay_ms = delay_ms;

        if let Some(err) = error {
            return Err(err);
        }

        match result {
            Ok(output) => {
                let last = LastFit {
                    lambda,
                    segments: output.solution.segment_count(),
                    cost: output.solution.cost,
                    fits: output.model.fit_evaluations(),
                };
                self.status = format!("Fitted {} segments, cost {:.4}.", last.segments, last.cost);
                self.last = Some(last);
            }
            Err(SolverError::Cancelled { prefix }) => {
                debug!("tui fit cancelled at prefix {prefix}");
                self.status = format!("Fit cancelled at prefix {prefix}.");
                self.last = None;
            }
            Err(err) => return Err(err.into()),
        }
        Ok(quit)
    }
}

/// Redraws the screen at every pause and waits out the delay while polling keys.
///
/// `Esc` cancels the fit, `q` cancels and quits, `+`/`-` change the delay.
struct TuiPacer<'a, B: Backend> {
    terminal: &'a mut Terminal<B>,
    app: &'a App,
    delay_ms: u64,
    quit: bool,
    error: Option<AppError>,
}

impl<B: Backend> TuiPacer<'_, B> {
    fn wait(&mut self, progress: &Progress) -> Result<ControlFlow<()>, AppError> {
        let live = Live {
            progress: *progress,
            delay_ms: self.delay_ms,
        };
        let app = self.app;
        self.terminal
            .draw(|f| draw(f, app, Some(&live)))
            .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;

        let deadline = Instant::now() + Duration::from_millis(self.delay_ms);
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let ready = event::poll(remaining)
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))?;
            if !ready {
                return Ok(ControlFlow::Continue(()));
            }
            let Event::Key(key) =
                event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))?
            else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') => {
                    self.quit = true;
                    return Ok(ControlFlow::Break(()));
                }
                KeyCode::Esc => return Ok(ControlFlow::Break(())),
                KeyCode::Char('+') => self.delay_ms = step_delay(self.delay_ms, 1),
                KeyCode::Char('-') => self.delay_ms = step_delay(self.delay_ms, -1),
                _ => {}
            }
        }
    }
}

impl<B: Backend> Pacer for TuiPacer<'_, B> {
    fn pause(&mut self, progress: &Progress) -> ControlFlow<()> {
        match self.wait(progress) {
            Ok(flow) => flow,
            Err(err) => {
                self.error = Some(err);
                ControlFlow::Break(())
            }
        }
    }
}

/// Move to the next (`delta > 0`) or previous delay preset.
fn step_delay(current_ms: u64, delta: i32) -> u64 {
    let idx = DELAY_STEPS_MS
        .iter()
        .position(|&ms| ms >= current_ms)
        .unwrap_or(DELAY_STEPS_MS.len() - 1);
    // Off-preset values (from flags or env) snap to the neighbouring preset.
    let between = DELAY_STEPS_MS[idx] > current_ms;
    let next = if delta <= 0 {
        idx.saturating_sub(1)
    } else if between {
        idx
    } else {
        (idx + 1).min(DELAY_STEPS_MS.len() - 1)
    };
    DELAY_STEPS_MS[next]
}

fn draw(frame: &mut Frame<'_>, app: &App, live: Option<&Live>) {
    let size = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
        .split(size);

    draw_header(frame, chunks[0], app, live);
    draw_body(frame, chunks[1], app, live);
    draw_footer(frame, chunks[2], app, live);
}

fn draw_header(frame: &mut Frame<'_>, area: Rect, app: &App, live: Option<&Live>) {
    let config = &app.config;
    let delay_ms = live.map(|l| l.delay_ms).unwrap_or(config.delay_ms);
    let gray = Style::default().fg(Color::Gray);

    let mut lines: Vec<Line> = Vec::new();
    lines.push(Line::from(vec![
        Span::styled("sls", Style::default().fg(Color::Cyan)),
        Span::raw(" | segmented least squares"),
    ]));
    lines.push(Line::from(Span::styled(
        format!(
            "N: {} | λ: {:.1} | delay: {delay_ms}ms | shape: {} | noise: {:.1} | seed: {}",
            config.n,
            config.lambda,
            config.shape.display_name(),
            config.noise,
            config.seed,
        ),
        gray,
    )));

    let detail = match (live, app.last) {
        (Some(live), _) => {
            let p = &live.progress;
            format!(
                "fitting: prefix {}/{} | split {} | candidate {:.4} | best {:.4}",
                p.prefix, p.total, p.split, p.candidate_cost, p.best_cost
            )
        }
        (None, Some(last)) => format!(
            "last fit: λ={:.1} | segments={} | cost={:.4} | fits={}",
            last.lambda, last.segments, last.cost, last.fits
        ),
        (None, None) => "no fit yet".to_string(),
    };
    lines.push(Line::from(Span::styled(detail, gray)));

    let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(p, area);
}

fn draw_body(frame: &mut Frame<'_>, area: Rect, app: &App, live: Option<&Live>) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(FIELD_COUNT as u16 + 2)])
        .split(area);

    draw_chart(frame, chunks[0], app, live);
    draw_settings(frame, chunks[1], app);
}

fn draw_chart(frame: &mut Frame<'_>, area: Rect, app: &App, live: Option<&Live>) {
    let block = Block::default().title("Segments").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(Clear, inner);

    let scene = app.scene.borrow();
    let points = scene.points();
    if points.is_empty() {
        let msg = Paragraph::new("No points.").style(Style::default().fg(Color::Yellow));
        frame.render_widget(msg, inner);
        return;
    }
    let lines = scene.lines();
    let candidate = live
        .map(|l| scene.points_in(l.progress.split, l.progress.prefix))
        .unwrap_or_default();
    let (x_bounds, y_bounds) = chart_bounds(&points, &lines, [app.config.x_min, app.config.x_max]);

    let widget = SegmentChart {
        points: &points,
        lines: &lines,
        candidate: &candidate,
        x_bounds,
        y_bounds,
    };
    frame.render_widget(widget, inner);
}

fn draw_settings(frame: &mut Frame<'_>, area: Rect, app: &App) {
    let config = &app.config;
    let items = vec![
        ListItem::new(format!("N: {} ({N_MIN}..{N_MAX})", config.n)),
        ListItem::new(format!("λ: {:.1} (0..{LAMBDA_MAX:.0})", config.lambda)),
        ListItem::new(format!("Delay: {}ms", config.delay_ms)),
        ListItem::new(format!("Shape: {}", config.shape.display_name())),
        ListItem::new(format!("Noise: {:.1}", config.noise)),
    ];

    let list = List::new(items)
        .block(Block::default().title("Settings").borders(Borders::ALL))
        .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
        .highlight_symbol("» ");

    let mut state = ListState::default();
    state.select(Some(app.selected_field));
    frame.render_stateful_widget(list, area, &mut state);
}

fn draw_footer(frame: &mut Frame<'_>, area: Rect, app: &App, live: Option<&Live>) {
    let help = if live.is_some() {
        "Esc cancel  +/- pace  q quit"
    } else {
        "↑/↓ select  ←/→ adjust  Enter/f fit  +/- pace  r reseed  q quit"
    };
    let line = Line::from(vec![
        Span::styled(help, Style::default().fg(Color::Gray)),
        Span::raw(" | "),
        Span::styled(app.status.as_str(), Style::default().fg(Color::Yellow)),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    frame.render_widget(p, area);
}

/// X bounds from the points (falling back to `x_range`), y bounds over points
/// and line ends with 5% padding.
fn chart_bounds(
    points: &[(f64, f64)],
    lines: &[[(f64, f64); 2]],
    x_range: [f64; 2],
) -> ([f64; 2], [f64; 2]) {
    let (mut x_min, mut x_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(x, _) in points {
        x_min = x_min.min(x);
        x_max = x_max.max(x);
    }
    if !x_min.is_finite() || !x_max.is_finite() || x_max <= x_min {
        [x_min, x_max] = x_range;
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    let line_ends = lines.iter().flat_map(|l| l.iter());
    for &(_, y) in points.iter().chain(line_ends) {
        if y.is_finite() {
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
    }
    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        let mid = if y_min.is_finite() { y_min } else { 0.0 };
        y_min = mid - 1.0;
        y_max = mid + 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    ([x_min, x_max], [y_min - pad, y_max + pad])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::new(RunConfig::default()).unwrap()
    }

    #[test]
    fn preview_loads_points_into_scene() {
        let app = app();
        let scene = app.scene.borrow();
        assert_eq!(scene.points().len(), RunConfig::default().n);
        assert_eq!(scene.line_count(), 0);
        assert_eq!(scene.events_seen(), 0);
    }

    #[test]
    fn sliders_clamp_to_their_ranges() {
        let mut app = app();
        app.config.n = N_MAX;
        app.adjust_field(1).unwrap();
        assert_eq!(app.config.n, N_MAX);
        app.config.n = N_MIN;
        app.adjust_field(-1).unwrap();
        assert_eq!(app.config.n, N_MIN);
        assert_eq!(app.scene.borrow().points().len(), N_MIN);

        app.selected_field = 1;
        app.config.lambda = 0.0;
        app.adjust_field(-1).unwrap();
        assert_eq!(app.config.lambda, 0.0);
        app.adjust_field(1).unwrap();
        assert_eq!(app.config.lambda, LAMBDA_STEP);
        app.config.lambda = LAMBDA_MAX;
        app.adjust_field(1).unwrap();
        assert_eq!(app.config.lambda, LAMBDA_MAX);
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut app = app();
        assert!(!app.handle_key(KeyCode::Up).unwrap());
        assert_eq!(app.selected_field, 0);
        for _ in 0..10 {
            app.handle_key(KeyCode::Down).unwrap();
        }
        assert_eq!(app.selected_field, FIELD_COUNT - 1);
        assert!(app.handle_key(KeyCode::Char('q')).unwrap());
    }

    #[test]
    fn reseed_bumps_seed() {
        let mut app = app();
        let seed = app.config.seed;
        app.handle_key(KeyCode::Char('r')).unwrap();
        assert_eq!(app.config.seed, seed + 1);
    }

    #[test]
    fn delay_presets_step_both_ways() {
        assert_eq!(step_delay(100, 1), 250);
        assert_eq!(step_delay(100, -1), 50);
        assert_eq!(step_delay(0, -1), 0);
        assert_eq!(step_delay(1000, 1), 1000);
        assert_eq!(step_delay(70, -1), 50);
        assert_eq!(step_delay(70, 1), 100);
        assert_eq!(step_delay(5000, -1), 500);
    }

    #[test]
    fn bounds_cover_points_and_lines() {
        let points = [(0.0, 0.0), (4.0, 2.0)];
        let lines = [[(0.0, -1.0), (4.0, 3.0)]];
        let (x, y) = chart_bounds(&points, &lines, [-10.0, 10.0]);
        assert_eq!(x, [0.0, 4.0]);
        assert!(y[0] < -1.0 && y[1] > 3.0);

        let (x, y) = chart_bounds(&[(1.0, 5.0)], &[], [-10.0, 10.0]);
        assert_eq!(x, [-10.0, 10.0]);
        assert!(y[0] < 5.0 && y[1] > 5.0);
    }
}
