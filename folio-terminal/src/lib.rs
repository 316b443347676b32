/// Terminal preview of the folio page scenes
///
/// Scrolls a synthetic page through the core [`PageShell`] and draws the
/// backdrop model and the music turntable side by side in ASCII.
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use folio_core::{Camera, LoadOutcome, LoadRequest, PageShell, Section, SectionLayout, SiteConfig};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};

pub mod assets;
pub mod renderer;

pub use assets::AssetLoader;
pub use renderer::{AsciiRenderer, Viewport};

/// Section heights of the simulated page, px
pub const PAGE_SECTIONS: [f64; 5] = [900.0, 1400.0, 1000.0, 800.0, 700.0];
const SCROLL_STEP: f64 = 40.0;

/// Page state and asset loading, independent of the terminal
pub struct Preview {
    shell: PageShell,
    layout: SectionLayout,
    loader: AssetLoader,
    offset: f64,
    last_outcome: Option<(String, LoadOutcome)>,
}

impl Preview {
    pub fn new(config: &SiteConfig, loader: AssetLoader) -> Self {
        let mut preview = Self {
            shell: PageShell::new(config),
            layout: SectionLayout::stacked(PAGE_SECTIONS),
            loader,
            offset: 0.0,
            last_outcome: None,
        };
        for request in preview.shell.take_initial_loads() {
            preview.load(request);
        }
        preview.scroll_to(0.0);
        preview
    }

    pub fn shell(&self) -> &PageShell {
        &self.shell
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    fn load(&mut self, request: LoadRequest) {
        let uri = request.ticket.uri().to_string();
        let result = self.loader.load(&uri);
        let outcome = self.shell.complete(request, result);
        self.last_outcome = Some((uri, outcome));
    }

    pub fn scroll_to(&mut self, offset: f64) {
        self.offset = offset.clamp(0.0, self.layout.page_height());
        if let Some(request) = self.shell.on_scroll(self.offset, &self.layout) {
            self.load(request);
        }
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.scroll_to(self.offset + delta);
    }

    pub fn navigate(&mut self, section: Section) {
        if let Some(target) = self.layout.scroll_target(section) {
            self.scroll_to(target);
        }
    }

    pub fn toggle_playing(&mut self) {
        let playing = !self.shell.is_playing();
        self.shell.set_playing(playing);
    }

    fn status(&self) -> String {
        let load = match &self.last_outcome {
            Some((uri, outcome)) => format!("{uri}: {outcome:?}"),
            None => "no loads".into(),
        };
        format!(
            "folio | {} @ {:.0}px | {} | {} | j/k scroll 1-5 jump p play q quit",
            self.shell.active_section(),
            self.offset,
            if self.shell.is_playing() { "playing" } else { "paused" },
            load
        )
    }

    /// Advance one frame and rasterize both models.
    pub fn render_into(&mut self, dt: f32, renderer: &mut AsciiRenderer, camera: &mut Camera) {
        renderer.clear();
        let half = renderer.width() / 2;
        let left = Viewport {
            x: 0,
            y: 1,
            width: half,
            height: renderer.height().saturating_sub(1),
        };
        let right = Viewport {
            x: half,
            width: renderer.width() - half,
            ..left
        };

        let frame = self.shell.frame(dt);
        if let Some(backdrop) = &frame.backdrop {
            renderer.render_frame(backdrop, camera, left, Color::Grey);
        }
        if let Some(turntable) = &frame.turntable {
            renderer.render_frame(turntable, camera, right, Color::Magenta);
        }
    }
}

/// Main application struct for the interactive terminal preview
pub struct TerminalApp {
    preview: Preview,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    last_frame: Instant,
}

impl TerminalApp {
    pub fn new(preview: Preview) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self {
            preview,
            camera: Camera::default(),
            renderer: AsciiRenderer::new(width as usize, height as usize),
            running: true,
            last_frame: Instant::now(),
        })
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / 30); // 30 FPS target

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            self.render()?;

            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> io::Result<()> {
        match event::read()? {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => match code {
                KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                KeyCode::Char('j') | KeyCode::Down => self.preview.scroll_by(SCROLL_STEP),
                KeyCode::Char('k') | KeyCode::Up => self.preview.scroll_by(-SCROLL_STEP),
                KeyCode::PageDown => self.preview.scroll_by(SCROLL_STEP * 10.0),
                KeyCode::PageUp => self.preview.scroll_by(-SCROLL_STEP * 10.0),
                KeyCode::Char('p') => self.preview.toggle_playing(),
                KeyCode::Char(c @ '1'..='5') => {
                    let index = c as usize - '1' as usize;
                    self.preview.navigate(Section::ALL[index]);
                }
                _ => {}
            },
            Event::Resize(width, height) => {
                self.renderer.resize(width as usize, height as usize);
                execute!(stdout(), terminal::Clear(ClearType::All))?;
            }
            _ => {}
        }
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32();
        self.last_frame = now;

        self.preview.render_into(dt, &mut self.renderer, &mut self.camera);

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.renderer.draw(&mut stdout)?;

        let status: String = self.preview.status().chars().take(self.renderer.width()).collect();
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(status),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Render a single frame as plain text, without touching the terminal mode.
pub fn snapshot(preview: &mut Preview, width: usize, height: usize) -> String {
    let mut renderer = AsciiRenderer::new(width, height);
    let mut camera = Camera::default();
    preview.render_into(0.0, &mut renderer, &mut camera);

    let mut text = preview.status();
    for y in 1..height {
        text.push('\n');
        text.extend((0..width).filter_map(|x| renderer.char_at(x, y)));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview() -> Preview {
        // Nothing exists under this root, so every load fails
        Preview::new(&SiteConfig::default(), AssetLoader::new("/nonexistent/folio"))
    }

    #[test]
    fn test_navigation_follows_the_page_layout() {
        let mut preview = preview();
        assert_eq!(preview.shell().active_section(), Section::Home);

        preview.navigate(Section::Music);
        assert_eq!(preview.offset(), 2300.0);
        assert_eq!(preview.shell().active_section(), Section::Music);

        preview.scroll_by(-1_000_000.0);
        assert_eq!(preview.offset(), 0.0);
        assert_eq!(preview.shell().active_section(), Section::Home);
    }

    #[test]
    fn test_failed_loads_are_reported_not_fatal() {
        let preview = preview();
        let (uri, outcome) = preview.last_outcome.clone().unwrap();
        assert_eq!(uri, "/models/untitled.glb");
        assert_eq!(outcome, LoadOutcome::Failed);
    }

    #[test]
    fn test_snapshot_shows_turntable_placeholder() {
        let mut preview = preview();
        let text = snapshot(&mut preview, 80, 24);
        assert!(text.starts_with("folio | home"));
        let art: String = text.lines().skip(1).collect();
        assert!(art.chars().any(|c| c != ' '));
    }

    #[test]
    fn test_play_toggle() {
        let mut preview = preview();
        preview.toggle_playing();
        assert!(preview.shell().is_playing());
        preview.toggle_playing();
        assert!(!preview.shell().is_playing());
    }
}
