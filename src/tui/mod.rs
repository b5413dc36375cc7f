//! Ratatui-based terminal UI.
//!
//! The TUI binds parameter sliders to the composite rotation curve: pick a
//! galaxy, adjust prefactors and halo parameters with the arrow keys, and
//! watch the curves and chi-squared update against the fixed observations.
//! `b` restores the best-fit values; `p` swaps the halo sliders for the
//! equivalent mini-black-hole population.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use plotters::style::RGBColor;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::app::pipeline::{self, RunOutput};
use crate::cli::picker::{data_dir, discover_rotmod_files};
use crate::cli::FitArgs;
use crate::domain::{
    FitConfig, FreeParamSet, GalaxyParams, GalaxySource, HaloKind, HaloParams, MiniBhParams,
    ModelKind,
};
use crate::error::AppError;
use crate::fit::errors::{gn_covariance, GnCovariance};
use crate::models::{DEFAULT_RC, MINIBH_SCALE};

mod plotters_chart;

use plotters_chart::RotPlottersChart;

/// Number of selectable fields in the settings panel.
const FIELD_COUNT: usize = 7;

/// Start the TUI.
pub fn run(args: FitArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::runtime(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::runtime(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::runtime(format!(
                "Failed to enter alternate screen: {e}"
            )));
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

#[derive(Debug, Clone)]
enum GalaxyChoice {
    Synthetic,
    File(PathBuf),
}

impl GalaxyChoice {
    fn label(&self) -> String {
        match self {
            GalaxyChoice::Synthetic => "synthetic demo".to_string(),
            GalaxyChoice::File(path) => crate::io::ingest::galaxy_name(path),
        }
    }

    fn to_source(&self) -> GalaxySource {
        match self {
            GalaxyChoice::Synthetic => GalaxySource::Synthetic,
            GalaxyChoice::File(path) => GalaxySource::File(path.clone()),
        }
    }
}

struct App {
    config: FitConfig,
    /// Whether `--fit-black-hole` was passed (synthetic sources force it on).
    fit_black_hole_flag: bool,
    choices: Vec<GalaxyChoice>,
    choice_idx: usize,
    run: Option<RunOutput>,
    covariance: Option<GnCovariance>,
    /// Current slider values (isothermal parameterization).
    params: GalaxyParams,
    /// Current slider values (mini-BH parameterization).
    minibh: MiniBhParams,
    halo_kind: HaloKind,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(args: FitArgs) -> Result<Self, AppError> {
        let mut choices = vec![GalaxyChoice::Synthetic];
        for file in discover_rotmod_files(&data_dir()) {
            choices.push(GalaxyChoice::File(file));
        }

        let choice_idx = match &args.file {
            Some(path) => {
                let idx = choices.iter().position(
                    |c| matches!(c, GalaxyChoice::File(p) if p == path),
                );
                match idx {
                    Some(i) => i,
                    None => {
                        choices.push(GalaxyChoice::File(path.clone()));
                        choices.len() - 1
                    }
                }
            }
            // Default to the first real galaxy when any are on disk.
            None if args.synthetic || choices.len() == 1 => 0,
            None => 1,
        };

        let config = FitConfig {
            source: GalaxySource::Synthetic, // set by reload()
            fit_black_hole: args.fit_black_hole,
            model_spec: args.model,
            rc_min: args.rc_min,
            rc_max: args.rc_max,
            rc_steps: args.rc_steps,
            sample_count: args.sample_count,
            sample_seed: args.seed,
            top_n: args.top,
            plot: false,
            plot_width: args.width,
            plot_height: args.height,
            export_results: None,
            export_curve: None,
        };

        let mut app = Self {
            config,
            fit_black_hole_flag: args.fit_black_hole,
            choices,
            choice_idx,
            run: None,
            covariance: None,
            params: GalaxyParams::baryonic(),
            minibh: MiniBhParams {
                scale: MINIBH_SCALE,
                count: 0.0,
                mass: 1.5,
                rcut: DEFAULT_RC,
            },
            halo_kind: HaloKind::Isothermal,
            selected_field: 0,
            status: "Fitting...".to_string(),
        };
        app.reload();
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::runtime(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::runtime(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::runtime(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
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

    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELD_COUNT - 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('b') => self.restore_best_fit(),
            KeyCode::Char('p') => self.toggle_halo_kind(),
            KeyCode::Char('r') => {
                self.reload();
                if self.run.is_some() {
                    self.status = "Refit complete.".to_string();
                }
            }
            KeyCode::Char('d') => self.write_debug_bundle(),
            _ => {}
        }
        false
    }

    fn adjust_field(&mut self, delta: i32) {
        let d = delta as f64;
        match self.selected_field {
            0 => {
                let len = self.choices.len();
                self.choice_idx = (self.choice_idx + if delta >= 0 { 1 } else { len - 1 }) % len;
                self.reload();
            }
            1 => {
                self.params.mbh = slide(self.params.mbh, d * 1e8, 0.0, 1e10);
                self.status = format!("Mbh = {:.3e} Msun", self.params.mbh);
            }
            2 => {
                if self.component_absent(|r| !r.data.bulge.is_present()) {
                    self.status = "There is no bulge component.".to_string();
                    return;
                }
                self.params.bpref = slide(self.params.bpref, d * 0.1, 0.0, 5.0);
                self.status = format!("bulge prefactor = {:.2}", self.params.bpref);
            }
            3 => {
                if self.component_absent(|r| !r.data.disk.is_present()) {
                    self.status = "There is no disk component.".to_string();
                    return;
                }
                self.params.dpref = slide(self.params.dpref, d * 0.1, 0.0, 5.0);
                self.status = format!("disk prefactor = {:.2}", self.params.dpref);
            }
            4 => {
                if self.component_absent(|r| !r.data.gas.is_present()) {
                    self.status = "There is no gas component.".to_string();
                    return;
                }
                self.params.gpref = slide(self.params.gpref, d * 0.1, 0.0, 5.0);
                self.status = format!("gas prefactor = {:.2}", self.params.gpref);
            }
            5 => match self.halo_kind {
                HaloKind::Isothermal => {
                    let halo = self.halo_mut();
                    halo.rc = slide(halo.rc, d * 0.1, 0.1, 20.0);
                    self.status = format!("rc = {:.2} kpc", self.halo().rc);
                }
                HaloKind::MiniBh => {
                    self.minibh.count = slide(self.minibh.count, d * 5.0, 0.0, 500.0);
                    self.status = format!(
                        "{:.0} x {:.0e} black holes",
                        self.minibh.count, self.minibh.scale
                    );
                }
            },
            6 => match self.halo_kind {
                HaloKind::Isothermal => {
                    let halo = self.halo_mut();
                    halo.rho0 = slide(halo.rho0, d * 2.5e7, 0.0, 2.5e9);
                    self.status = format!("rho0 = {:.3e} Msun/kpc^3", self.halo().rho0);
                }
                HaloKind::MiniBh => {
                    self.minibh.mass = slide(self.minibh.mass, d * 0.1, 0.1, 3.8);
                    self.status = format!("BH mass = {:.1} Msun", self.minibh.mass);
                }
            },
            _ => {}
        }
    }

    fn component_absent(&self, check: impl Fn(&RunOutput) -> bool) -> bool {
        self.run.as_ref().map(check).unwrap_or(false)
    }

    fn halo(&self) -> HaloParams {
        self.params.halo.unwrap_or(HaloParams {
            rc: DEFAULT_RC,
            rho0: 0.0,
        })
    }

    fn halo_mut(&mut self) -> &mut HaloParams {
        self.params.halo.get_or_insert(HaloParams {
            rc: DEFAULT_RC,
            rho0: 0.0,
        })
    }

    /// The parameter set the chart and chi-squared are computed from.
    fn current_params(&self) -> GalaxyParams {
        let mut p = self.params;
        if self.halo_kind == HaloKind::MiniBh {
            p.halo = Some(self.minibh.to_halo());
        }
        p
    }

    fn restore_best_fit(&mut self) {
        let Some(run) = &self.run else {
            self.status = "No fit available.".to_string();
            return;
        };
        self.params = normalize_params(run.selection.best.model.params);
        self.minibh = minibh_from_halo(self.params.halo, self.minibh.mass);
        self.status = "Restored best-fit values.".to_string();
    }

    fn toggle_halo_kind(&mut self) {
        match self.halo_kind {
            HaloKind::Isothermal => {
                self.minibh = minibh_from_halo(self.params.halo, self.minibh.mass);
                self.halo_kind = HaloKind::MiniBh;
            }
            HaloKind::MiniBh => {
                self.params.halo = Some(self.minibh.to_halo());
                self.halo_kind = HaloKind::Isothermal;
            }
        }
        self.status = format!("halo mode: {}", self.halo_kind.display_name());
    }

    fn reload(&mut self) {
        self.config.source = self.choices[self.choice_idx].to_source();
        self.config.fit_black_hole =
            self.fit_black_hole_flag || self.config.source == GalaxySource::Synthetic;

        match pipeline::run_fit(&self.config) {
            Ok(run) => {
                self.params = normalize_params(run.selection.best.model.params);
                self.minibh = minibh_from_halo(self.params.halo, self.minibh.mass);
                self.covariance = best_fit_covariance(&run, &self.config);
                self.status = format!(
                    "Loaded {} (n={}, model: {}).",
                    run.data.name,
                    run.data.stats.n_points,
                    run.selection.best.model.display_name
                );
                self.run = Some(run);
            }
            Err(err) => {
                // A bad data file shouldn't kill the session; surface the
                // error and keep whatever was loaded before.
                self.status = format!("{err}");
            }
        }
    }

    fn write_debug_bundle(&mut self) {
        let Some(run) = &self.run else {
            self.status = "No fit available.".to_string();
            return;
        };
        match crate::debug::write_debug_bundle(run, &self.config, &self.current_params()) {
            Ok(path) => {
                self.status = format!("Wrote debug bundle: {}", path.display());
            }
            Err(err) => {
                self.status = format!("Debug write failed: {err}");
            }
        }
    }

    /// Chi-squared of the current slider values against the observations.
    fn live_chi2(&self) -> Option<(f64, Option<f64>)> {
        let run = self.run.as_ref()?;
        let params = self.current_params();
        let chi2 = crate::fit::chi_squared(&run.model, &run.data.points, &params).ok()?;
        let n = run.data.points.len();
        let k = run.selection.best.quality.k;
        let reduced = (n > k).then(|| chi2 / (n - k) as f64);
        Some((chi2, reduced))
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("rot", Style::default().fg(Color::Cyan)),
            Span::raw(" — galaxy rotation curves"),
        ]));

        let (galaxy, distance, n) = self
            .run
            .as_ref()
            .map(|r| (r.data.name.clone(), r.data.distance_mpc, r.data.stats.n_points))
            .unwrap_or_else(|| ("-".to_string(), 0.0, 0));
        let model_name = self
            .run
            .as_ref()
            .map(|r| r.selection.best.model.display_name.clone())
            .unwrap_or_else(|| "-".to_string());

        lines.push(Line::from(Span::styled(
            format!(
                "galaxy: {galaxy} | distance: {distance:.1} Mpc | best model: {model_name} | n={n} | halo mode: {}",
                self.halo_kind.display_name()
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some((chi2, reduced)) = self.live_chi2() {
            let reduced_str = reduced
                .map(|v| format!("{v:.4}"))
                .unwrap_or_else(|| "n/a (too few points)".to_string());
            let best = self
                .run
                .as_ref()
                .map(|r| r.selection.best.quality.chi2)
                .unwrap_or(f64::NAN);
            lines.push(Line::from(Span::styled(
                format!("chi2={chi2:.3} | reduced chi2={reduced_str} | best-fit chi2={best:.3}"),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(9)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Rotation Curve").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let params = self.current_params();
        let series = chart_series(run, &params, self.covariance.as_ref());

        let components: Vec<(RGBColor, &[(f64, f64)])> = series
            .components
            .iter()
            .map(|(color, s)| (*color, s.as_slice()))
            .collect();

        let (chart_rect, insets) = chart_layout(inner);
        let widget = RotPlottersChart {
            total: &series.total,
            band_hi: &series.band_hi,
            band_lo: &series.band_lo,
            components: &components,
            points: &series.points,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let halo = self.halo();
        let bulge_ok = !self.component_absent(|r| !r.data.bulge.is_present());
        let disk_ok = !self.component_absent(|r| !r.data.disk.is_present());
        let gas_ok = !self.component_absent(|r| !r.data.gas.is_present());

        let fmt_pref = |v: f64, ok: bool| {
            if ok {
                format!("{v:.2}")
            } else {
                "absent".to_string()
            }
        };

        let (slot5, slot6) = match self.halo_kind {
            HaloKind::Isothermal => (
                format!("Halo rc [kpc]: {:.2}", halo.rc),
                format!("Halo rho0 [Msun/kpc^3]: {:.3e}", halo.rho0),
            ),
            HaloKind::MiniBh => (
                format!(
                    "BH count [x{:.0e}]: {:.0}",
                    self.minibh.scale, self.minibh.count
                ),
                format!("BH mass [Msun]: {:.1}", self.minibh.mass),
            ),
        };

        let items = vec![
            ListItem::new(format!("Galaxy: {}", self.choices[self.choice_idx].label())),
            ListItem::new(format!("Mbh [Msun]: {:.3e}", self.params.mbh)),
            ListItem::new(format!(
                "Bulge prefactor: {}",
                fmt_pref(self.params.bpref, bulge_ok)
            )),
            ListItem::new(format!(
                "Disk prefactor: {}",
                fmt_pref(self.params.dpref, disk_ok)
            )),
            ListItem::new(format!(
                "Gas prefactor: {}",
                fmt_pref(self.params.gpref, gas_ok)
            )),
            ListItem::new(slot5),
            ListItem::new(slot6),
        ];

        let list = List::new(items)
            .block(Block::default().title("Sliders").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  b best fit  p halo mode  r refit  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Slider semantics: step then clamp. The UI owns range enforcement.
fn slide(value: f64, step: f64, min: f64, max: f64) -> f64 {
    (value + step).clamp(min, max)
}

/// Make a fitted parameter set usable as slider state: the halo slot must
/// exist even for baryons-only fits (sliders can re-introduce a halo).
fn normalize_params(mut params: GalaxyParams) -> GalaxyParams {
    if params.halo.is_none() {
        params.halo = Some(HaloParams {
            rc: DEFAULT_RC,
            rho0: 0.0,
        });
    }
    params
}

/// Derive mini-BH sliders from a halo: keep the per-hole mass, set the count
/// so `scale * count * mass = rho0`.
fn minibh_from_halo(halo: Option<HaloParams>, mass: f64) -> MiniBhParams {
    let halo = halo.unwrap_or(HaloParams {
        rc: DEFAULT_RC,
        rho0: 0.0,
    });
    let mass = mass.clamp(0.1, 3.8);
    let count = (halo.rho0 / (MINIBH_SCALE * mass)).clamp(0.0, 500.0);
    MiniBhParams {
        scale: MINIBH_SCALE,
        count,
        mass,
        rcut: halo.rc.clamp(0.1, 20.0),
    }
}

fn best_fit_covariance(run: &RunOutput, config: &FitConfig) -> Option<GnCovariance> {
    let best = &run.selection.best;
    let free = FreeParamSet {
        mbh: config.fit_black_hole,
        bulge: run.data.bulge.is_present(),
        disk: run.data.disk.is_present(),
        halo: best.model.kind == ModelKind::BaryonsHalo,
    };
    gn_covariance(&run.model, &run.data.points, &best.model.params, &free)
}

struct ChartSeries {
    total: Vec<(f64, f64)>,
    band_hi: Vec<(f64, f64)>,
    band_lo: Vec<(f64, f64)>,
    components: Vec<(RGBColor, Vec<(f64, f64)>)>,
    points: Vec<(f64, f64)>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for Plotters.
fn chart_series(
    run: &RunOutput,
    params: &GalaxyParams,
    covariance: Option<&GnCovariance>,
) -> ChartSeries {
    let mut t0 = 0.0_f64;
    let mut t1 = run.data.stats.r_max * 1.02;
    if !t1.is_finite() || t1 <= t0 {
        t0 = 0.0;
        t1 = 25.0;
    }
    let x_bounds = [t0, t1];

    let points: Vec<(f64, f64)> = run
        .data
        .points
        .iter()
        .map(|p| (p.radius, p.v_obs))
        .collect();

    let n = 200usize;
    let mut total = Vec::with_capacity(n);
    let mut band_hi = Vec::new();
    let mut band_lo = Vec::new();
    let mut blackhole = Vec::new();
    let mut bulge = Vec::new();
    let mut disk = Vec::new();
    let mut gas = Vec::new();
    let mut halo = Vec::new();

    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let r = t0 + u * (t1 - t0);
        let Ok(c) = run.model.component_velocities(r, params) else {
            continue;
        };
        total.push((r, c.total));
        if let Some(v) = c.blackhole {
            blackhole.push((r, v));
        }
        if let Some(v) = c.bulge {
            bulge.push((r, v));
        }
        if let Some(v) = c.disk {
            disk.push((r, v));
        }
        if let Some(v) = c.gas {
            gas.push((r, v));
        }
        if let Some(v) = c.halo {
            halo.push((r, v));
        }

        if let Some(cov) = covariance {
            if let Some(sigma) = cov.band_sigma(&run.model, r) {
                band_hi.push((r, c.total + sigma));
                band_lo.push((r, (c.total - sigma).max(0.0)));
            }
        }
    }

    let mut components: Vec<(RGBColor, Vec<(f64, f64)>)> = Vec::new();
    for (color, series) in [
        (RGBColor(169, 169, 169), blackhole), // black hole: gray
        (RGBColor(255, 165, 0), bulge),       // bulge: orange
        (RGBColor(186, 85, 211), disk),       // disk: purple
        (RGBColor(65, 105, 225), gas),        // gas: blue
        (RGBColor(0, 200, 0), halo),          // halo: green
    ] {
        if !series.is_empty() {
            components.push((color, series));
        }
    }

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in points.iter().chain(total.iter()).chain(band_hi.iter()) {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [(y_min - pad).min(0.0), y_max + pad];

    ChartSeries {
        total,
        band_hi,
        band_lo,
        components,
        points,
        x_bounds,
        y_bounds,
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.1}");
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.0}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("radius (kpc)")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("v (km/s)")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_RHO0;

    #[test]
    fn slide_clamps_to_range() {
        assert_eq!(slide(4.95, 0.1, 0.0, 5.0), 5.0);
        assert_eq!(slide(0.05, -0.1, 0.0, 5.0), 0.0);
        assert!((slide(1.0, 0.1, 0.0, 5.0) - 1.1).abs() < 1e-12);
    }

    #[test]
    fn minibh_round_trips_through_halo() {
        let halo = HaloParams {
            rc: 1.4,
            rho0: DEFAULT_RHO0,
        };
        let minibh = minibh_from_halo(Some(halo), 1.5);
        let back = minibh.to_halo();
        assert!((back.rc - halo.rc).abs() < 1e-12);
        assert!((back.rho0 - halo.rho0).abs() / halo.rho0 < 1e-12);
    }

    #[test]
    fn normalize_params_always_has_halo_slot() {
        let p = normalize_params(GalaxyParams::baryonic());
        let halo = p.halo.unwrap();
        assert_eq!(halo.rho0, 0.0);
        assert!((halo.rc - DEFAULT_RC).abs() < 1e-12);
    }
}
