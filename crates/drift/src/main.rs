mod logging;

use std::io::{self, Write};
use std::path::Path;
use std::time::{Duration, Instant};

use color_eyre::eyre::WrapErr;
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    execute,
};
use drift_config::Config;
use drift_field::{
    Canvas, IntervalClock, LaunchOptions, Simulator, Viewport, canvas_size, render_canvas,
};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::Line,
    widgets::Paragraph,
};
use tracing::{info, warn};

/// Longest time the loop waits for input when nothing is scheduled.
const IDLE_POLL: Duration = Duration::from_millis(250);

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    logging::init();

    let config = Config::load().wrap_err("failed to load config")?;
    info!(?config, "starting");

    let reduce_motion = config.reduce_motion_requested();
    let terminal = ratatui::init();
    let result = App::new(config, reduce_motion).run(terminal);
    ratatui::restore();
    info!("exiting");
    result
}

/// The main application which holds the state and logic of the application.
#[derive(Debug)]
pub struct App {
    /// Is the application running?
    running: bool,
    /// Configuration as loaded; theme and speed are written back on quit.
    config: Config,
    /// `None` when reduced motion is requested or there is nothing to draw on.
    simulator: Option<Simulator<Canvas>>,
    clock: IntervalClock,
    show_help: bool,
    /// Reduced motion was requested at startup.
    reduce_motion: bool,
    /// Something changed since the last draw.
    dirty: bool,
}

impl App {
    /// Construct a new instance of [`App`].
    pub fn new(config: Config, reduce_motion: bool) -> Self {
        Self {
            running: false,
            clock: IntervalClock::new(config.fps),
            show_help: config.show_help,
            reduce_motion,
            simulator: None,
            dirty: true,
            config,
        }
    }

    /// Run the application's main loop.
    pub fn run(mut self, mut terminal: DefaultTerminal) -> color_eyre::Result<()> {
        let result = self.start_and_loop(&mut terminal);
        let preferences = match Config::path() {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "preferences will not be saved");
                None
            }
        };
        self.finish(&mut io::stdout(), result, preferences.as_deref())
    }

    fn start_and_loop(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        execute!(io::stdout(), EnableFocusChange)?;
        let size = terminal.size()?;
        self.launch(Rect::new(0, 0, size.width, size.height));

        self.running = true;
        self.event_loop(terminal)
    }

    /// Undo terminal setup and persist preferences whatever the loop returned.
    fn finish<W: Write>(
        &self,
        out: &mut W,
        result: color_eyre::Result<()>,
        preferences: Option<&Path>,
    ) -> color_eyre::Result<()> {
        if let Err(e) = execute!(out, DisableFocusChange) {
            warn!(error = %e, "failed to disable focus reporting");
        }
        if let Some(path) = preferences {
            self.save_preferences_to(path);
        }
        result
    }

    fn event_loop(&mut self, terminal: &mut DefaultTerminal) -> color_eyre::Result<()> {
        while self.running {
            self.advance(Instant::now());
            if self.dirty {
                terminal.draw(|frame| self.render(frame))?;
                self.dirty = false;
            }
            self.handle_crossterm_events()?;
        }
        Ok(())
    }

    /// Create the simulator for a terminal of the given area and start it.
    fn launch(&mut self, area: Rect) {
        let (width, height) = canvas_size(area);
        let options = LaunchOptions {
            settings: self.config.flow.clone(),
            theme: self.config.color_theme,
            speed: self.config.speed,
            reduce_motion: self.reduce_motion,
            seed: None,
        };
        self.simulator = Simulator::launch(Canvas::new(width, height), options);
        if let Some(simulator) = &mut self.simulator {
            simulator.start(&mut self.clock);
        }
    }

    /// Apply settled resizes and run the frame if it is due.
    fn advance(&mut self, now: Instant) {
        let Some(simulator) = &mut self.simulator else {
            return;
        };
        if simulator.poll_resize(now) {
            self.dirty = true;
        }
        if let Some(request) = self.clock.poll(now)
            && simulator.on_frame(request, &mut self.clock)
        {
            self.dirty = true;
        }
    }

    /// How long to wait for input before the next scheduled work.
    fn poll_timeout(&self, now: Instant) -> Duration {
        let mut timeout = IDLE_POLL;
        if let Some(due) = self.clock.time_until_due(now) {
            timeout = timeout.min(due);
        }
        if let Some(simulator) = &self.simulator
            && let Some(due) = simulator.resize_due_in(now)
        {
            timeout = timeout.min(due);
        }
        timeout
    }

    /// Renders the user interface.
    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let color = self.config.color_theme.color();

        match &self.simulator {
            Some(simulator) => render_canvas(frame, simulator.surface(), area),
            None => {
                let message = if self.reduce_motion {
                    "reduced motion is on, animation disabled"
                } else {
                    "terminal too small to draw on"
                };
                let chunks = Layout::vertical([
                    Constraint::Fill(1),
                    Constraint::Length(1),
                    Constraint::Fill(1),
                ])
                .split(area);
                let text = Paragraph::new(message)
                    .style(Style::new().fg(color))
                    .alignment(Alignment::Center);
                frame.render_widget(text, chunks[1]);
            }
        }

        if self.show_help {
            let chunks = Layout::vertical([Constraint::Fill(1), Constraint::Length(1)]).split(area);
            frame.render_widget(self.help_line(), chunks[1]);
        }
    }

    fn help_line(&self) -> Line<'static> {
        let color = self.config.color_theme.color();
        let mut spans = vec![
            "q".bold().fg(color),
            " quit  ".dark_gray(),
            "c".bold().fg(color),
            format!(" color: {}  ", self.config.color_theme.name()).dark_gray(),
            "s".bold().fg(color),
            format!(" speed: {}  ", self.config.speed.name()).dark_gray(),
            "h".bold().fg(color),
            " hide help".dark_gray(),
        ];
        if self
            .simulator
            .as_ref()
            .is_some_and(|simulator| !simulator.is_running())
        {
            spans.push("  paused".italic().fg(color));
        }
        Line::from(spans).centered()
    }

    /// Reads the crossterm events and updates the state of [`App`].
    /// Waits no longer than the next due frame or resize.
    fn handle_crossterm_events(&mut self) -> color_eyre::Result<()> {
        if event::poll(self.poll_timeout(Instant::now()))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key),
                Event::Resize(width, height) => self.on_resize(width, height),
                Event::FocusLost => self.set_visible(false),
                Event::FocusGained => self.set_visible(true),
                _ => {}
            }
        }
        Ok(())
    }

    /// Handles the key events and updates the state of [`App`].
    fn on_key_event(&mut self, key: KeyEvent) {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => self.quit(),
            (_, KeyCode::Char('c')) => self.cycle_color_theme(),
            (_, KeyCode::Char('s')) => self.cycle_speed(),
            (_, KeyCode::Char('h')) => self.toggle_help(),
            _ => {}
        }
        self.dirty = true;
    }

    fn on_resize(&mut self, columns: u16, rows: u16) {
        let (width, height) = canvas_size(Rect::new(0, 0, columns, rows));
        match &mut self.simulator {
            Some(simulator) => simulator.on_resize(Viewport { width, height }, Instant::now()),
            // A terminal that was too small may have grown enough to draw on
            None if !self.reduce_motion => self.launch(Rect::new(0, 0, columns, rows)),
            None => {}
        }
        self.dirty = true;
    }

    /// Pause the frame loop while the terminal is unfocused.
    fn set_visible(&mut self, visible: bool) {
        if let Some(simulator) = &mut self.simulator {
            simulator.set_visible(visible, &mut self.clock);
            self.dirty = true;
        }
    }

    /// Cycle through available color themes.
    fn cycle_color_theme(&mut self) {
        self.config.color_theme = self.config.color_theme.next();
        if let Some(simulator) = &mut self.simulator {
            simulator.set_theme(self.config.color_theme);
        }
    }

    /// Cycle through playback speeds.
    fn cycle_speed(&mut self) {
        self.config.speed = self.config.speed.next();
        if let Some(simulator) = &mut self.simulator {
            simulator.set_speed(self.config.speed);
        }
    }

    fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Write theme and speed to the config at `path` if they differ from
    /// what is stored there. Other keys in the file are kept.
    fn save_preferences_to(&self, path: &Path) {
        let mut saved = match Config::load_from(path) {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, "not overwriting unreadable config");
                return;
            }
        };
        if saved.color_theme == self.config.color_theme && saved.speed == self.config.speed {
            return;
        }
        saved.color_theme = self.config.color_theme;
        saved.speed = self.config.speed;
        if let Err(e) = saved.save_to(path) {
            warn!(error = %e, "failed to save preferences");
        }
    }

    /// Set running to false to quit the application.
    fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with(config: Config) -> App {
        let reduce_motion = config.reduce_motion;
        let mut app = App::new(config, reduce_motion);
        app.launch(Rect::new(0, 0, 100, 30));
        app
    }

    fn preferences_path(name: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("drift-app-test-{}-{name}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        dir.join("config.toml")
    }

    #[test]
    fn test_launch_starts_frame_loop() {
        let app = app_with(Config::default());
        let simulator = app.simulator.as_ref().unwrap();
        assert!(simulator.is_running());
        assert_eq!(simulator.surface().height(), 60);
        assert!(app.clock.is_pending());
    }

    #[test]
    fn test_reduced_motion_never_launches() {
        let app = app_with(Config {
            reduce_motion: true,
            ..Default::default()
        });
        assert!(app.simulator.is_none());
        assert!(!app.clock.is_pending());
    }

    #[test]
    fn test_focus_toggles_frame_loop() {
        let mut app = app_with(Config::default());
        app.set_visible(false);
        assert!(!app.clock.is_pending());
        app.set_visible(true);
        app.set_visible(true);
        assert!(app.clock.is_pending());
    }

    #[test]
    fn test_advance_steps_when_due() {
        let mut app = app_with(Config::default());
        app.advance(Instant::now());
        assert_eq!(app.simulator.as_ref().unwrap().tick(), 1);
        // Next frame is scheduled but not yet due
        assert!(app.clock.is_pending());
    }

    #[test]
    fn test_keys_cycle_theme_and_speed() {
        let mut app = app_with(Config::default());
        let theme = app.config.color_theme;
        app.on_key_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE));
        assert_eq!(app.config.color_theme, theme.next());
        assert_eq!(app.simulator.as_ref().unwrap().theme(), theme.next());

        app.on_key_event(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::NONE));
        assert_eq!(app.simulator.as_ref().unwrap().speed(), app.config.speed);

        app.running = true;
        app.on_key_event(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(!app.running);
    }

    #[test]
    fn test_poll_timeout_idle_when_nothing_scheduled() {
        let app = app_with(Config {
            reduce_motion: true,
            ..Default::default()
        });
        assert_eq!(app.poll_timeout(Instant::now()), IDLE_POLL);

        let mut app = app_with(Config::default());
        app.set_visible(false);
        assert_eq!(app.poll_timeout(Instant::now()), IDLE_POLL);
    }

    #[test]
    fn test_poll_timeout_waits_for_next_frame() {
        let mut app = app_with(Config {
            fps: 10,
            ..Default::default()
        });
        let t0 = Instant::now();
        assert_eq!(app.poll_timeout(t0), Duration::ZERO);

        app.advance(t0);
        assert_eq!(app.poll_timeout(t0), Duration::from_millis(100));
        assert_eq!(
            app.poll_timeout(t0 + Duration::from_millis(30)),
            Duration::from_millis(70)
        );
    }

    #[test]
    fn test_poll_timeout_prefers_earlier_resize() {
        let mut config = Config {
            fps: 5,
            ..Default::default()
        };
        config.flow.resize_debounce_ms = 40;
        let mut app = app_with(config);
        let t0 = Instant::now();
        app.advance(t0);

        let simulator = app.simulator.as_mut().unwrap();
        simulator.on_resize(
            Viewport {
                width: 60,
                height: 40,
            },
            t0,
        );
        assert_eq!(
            app.poll_timeout(t0 + Duration::from_millis(10)),
            Duration::from_millis(30)
        );
    }

    #[test]
    fn test_save_preferences_writes_changes() {
        let path = preferences_path("changed");
        let mut app = app_with(Config::default());
        app.cycle_color_theme();
        app.cycle_speed();
        app.save_preferences_to(&path);

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.color_theme, app.config.color_theme);
        assert_eq!(saved.speed, app.config.speed);
        assert_eq!(saved.fps, Config::default().fps);
    }

    #[test]
    fn test_save_preferences_skips_unchanged() {
        let path = preferences_path("unchanged");
        let app = app_with(Config::default());
        app.save_preferences_to(&path);
        assert!(!path.exists());
    }

    #[test]
    fn test_save_preferences_keeps_other_keys() {
        let path = preferences_path("merge");
        let stored = Config {
            fps: 24,
            ..Default::default()
        };
        stored.save_to(&path).unwrap();

        let mut app = app_with(Config::default());
        app.cycle_speed();
        app.save_preferences_to(&path);

        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.fps, 24);
        assert_eq!(saved.speed, app.config.speed);
    }

    #[test]
    fn test_finish_cleans_up_after_failed_loop() {
        let path = preferences_path("finish");
        let mut app = app_with(Config::default());
        app.cycle_color_theme();

        let mut out = Vec::new();
        let result = app.finish(
            &mut out,
            Err(color_eyre::eyre::eyre!("loop failed")),
            Some(&path),
        );

        assert_eq!(result.unwrap_err().to_string(), "loop failed");
        assert_eq!(String::from_utf8(out).unwrap(), "\x1b[?1004l");
        assert_eq!(
            Config::load_from(&path).unwrap().color_theme,
            app.config.color_theme
        );
    }
}
