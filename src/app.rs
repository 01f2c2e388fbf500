//! App: terminal init, main loop, key handling.

use crate::GameConfig;
use crate::input::{Action, key_to_action};
use crate::theme::Theme;
use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use mergetui::game::{Game, GameError, Status};
use mergetui::rng::{self, RejectionSampler};
use rand::rngs::StdRng;
use ratatui::Terminal;
use ratatui::backend::Backend;
use signal_hook::consts::SIGTERM;
use std::fmt;
use std::panic::PanicHookInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tachyonfx::Effect;
use tracing::{debug, info};

type LiveGame = Game<RejectionSampler<StdRng>>;
type PanicHook = dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static;

/// How the session ended; printed after the terminal is restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub status: Status,
    pub score: u32,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Status::Won => write!(f, "You win. Final score: {}", self.score),
            Status::Lost => write!(f, "You lose. Final score: {}", self.score),
            Status::InProgress => write!(f, "Quit. Final score: {}", self.score),
        }
    }
}

pub struct App {
    config: GameConfig,
    theme: Theme,
    game: LiveGame,
    /// Games dealt so far; distinguishes spawns across restarts.
    deals: u32,
    /// (deal, move) the current spawn effect belongs to.
    spawn_effect_key: Option<(u32, u32)>,
    spawn_effect: Option<Effect>,
    spawn_effect_process_time: Option<Instant>,
    /// Set from the SIGTERM handler; the loop exits through the normal restore path.
    terminate: Arc<AtomicBool>,
}

fn new_rng(seed: Option<u64>) -> RejectionSampler<StdRng> {
    match seed {
        Some(seed) => rng::seeded(seed),
        None => rng::from_os(),
    }
}

impl App {
    pub fn new(config: GameConfig, theme: Theme) -> Result<Self> {
        let game = Game::new(new_rng(config.seed))?;
        Ok(Self {
            config,
            theme,
            game,
            deals: 1,
            spawn_effect_key: None,
            spawn_effect: None,
            spawn_effect_process_time: None,
            terminate: Arc::new(AtomicBool::new(false)),
        })
    }

    fn summary(&self) -> Summary {
        Summary {
            status: self.game.status(),
            score: self.game.score(),
        }
    }

    fn restart(&mut self) -> Result<()> {
        self.game.restart(new_rng(self.config.seed))?;
        self.deals += 1;
        info!(deal = self.deals, "restarted");
        Ok(())
    }

    /// Drop the running fade when a different tile has spawned since it started.
    fn sync_spawn_effect(&mut self) {
        let key = (self.deals, self.game.moves());
        if self.spawn_effect_key != Some(key) {
            self.spawn_effect_key = Some(key);
            self.spawn_effect = None;
            self.spawn_effect_process_time = None;
        }
    }

    /// Apply one key action. Returns false when the session should end.
    fn handle_action(&mut self, action: Action) -> Result<bool> {
        match action {
            Action::Quit => return Ok(false),
            Action::Restart => {
                if self.game.status().is_terminal() {
                    self.restart()?;
                }
            }
            Action::Move(direction) => match self.game.apply_move(direction) {
                Ok(_) => {}
                Err(GameError::GameOver(status)) => {
                    debug!(?status, ?direction, "move ignored after game over");
                }
                Err(e) => return Err(e.into()),
            },
            Action::None => {}
        }
        Ok(true)
    }

    pub fn run(&mut self) -> Result<Summary> {
        use crossterm::{
            execute,
            terminal::{EnterAlternateScreen, disable_raw_mode, enable_raw_mode},
        };

        signal_hook::flag::register(SIGTERM, Arc::clone(&self.terminate))?;

        enable_raw_mode()?;
        let mut stdout = std::io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e.into());
        }

        let previous_hook = install_restore_hook();
        let result = ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))
            .map_err(anyhow::Error::from)
            .and_then(|mut terminal| self.run_loop(&mut terminal));
        restore_panic_hook(previous_hook);

        leave_terminal()?;
        result.map(|()| self.summary())
    }

    fn run_loop<B>(&mut self, terminal: &mut Terminal<B>) -> Result<()>
    where
        B: Backend,
        B::Error: Send + Sync + 'static,
    {
        let frame_duration = Duration::from_secs_f64(1.0 / self.config.frame_rate.max(1.0));
        loop {
            if self.terminate.load(Ordering::Relaxed) {
                info!("terminated by signal");
                return Ok(());
            }
            let now = Instant::now();
            self.sync_spawn_effect();
            terminal.draw(|f| {
                crate::ui::draw(
                    f,
                    &self.game,
                    &self.theme,
                    f.area(),
                    &mut self.spawn_effect,
                    &mut self.spawn_effect_process_time,
                    now,
                    self.config.animate,
                )
            })?;

            let timeout = frame_duration.saturating_sub(now.elapsed());
            if !event::poll(timeout)? {
                continue;
            }
            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    // Ignore Release/Repeat so one press is one move.
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if !self.handle_action(key_to_action(key))? {
                        return Ok(());
                    }
                }
            }
        }
    }
}

fn leave_terminal() -> Result<()> {
    use crossterm::{
        execute,
        terminal::{LeaveAlternateScreen, disable_raw_mode},
    };
    execute!(std::io::stdout(), LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Chain a hook that puts the terminal back before the previous hook reports the panic.
/// Returns the previous hook so it can be reinstated.
fn install_restore_hook() -> Arc<PanicHook> {
    let previous: Arc<PanicHook> = Arc::from(std::panic::take_hook());
    let chained = Arc::clone(&previous);
    std::panic::set_hook(Box::new(move |info| {
        let _ = leave_terminal();
        chained(info);
    }));
    previous
}

fn restore_panic_hook(previous: Arc<PanicHook>) {
    std::panic::set_hook(Box::new(move |info| previous(info)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergetui::shift::Direction;
    use ratatui::backend::TestBackend;

    fn config(seed: u64) -> GameConfig {
        GameConfig {
            seed: Some(seed),
            animate: false,
            frame_rate: 30.0,
        }
    }

    #[test]
    fn test_summary_messages() {
        let won = Summary { status: Status::Won, score: 2048 };
        let lost = Summary { status: Status::Lost, score: 12 };
        let quit = Summary { status: Status::InProgress, score: 0 };
        assert_eq!(won.to_string(), "You win. Final score: 2048");
        assert_eq!(lost.to_string(), "You lose. Final score: 12");
        assert_eq!(quit.to_string(), "Quit. Final score: 0");
    }

    #[test]
    fn test_seeded_app_deals_reproducibly() {
        let a = App::new(config(9), Theme::default()).unwrap();
        let b = App::new(config(9), Theme::default()).unwrap();
        assert_eq!(a.game.grid(), b.game.grid());
    }

    #[test]
    fn test_quit_ends_session() {
        let mut app = App::new(config(1), Theme::default()).unwrap();
        assert!(!app.handle_action(Action::Quit).unwrap());
        assert!(app.handle_action(Action::None).unwrap());
    }

    #[test]
    fn test_restart_ignored_while_playing() {
        let mut app = App::new(config(3), Theme::default()).unwrap();
        let before = *app.game.grid();
        assert!(app.handle_action(Action::Restart).unwrap());
        assert_eq!(app.game.grid(), &before);
        assert_eq!(app.deals, 1);
    }

    #[test]
    fn test_moves_until_game_ends_then_keys_are_ignored() {
        let mut app = App::new(config(5), Theme::default()).unwrap();
        let mut turns = 0;
        while !app.game.status().is_terminal() && turns < 100_000 {
            let d = Direction::ALL[turns % 4];
            assert!(app.handle_action(Action::Move(d)).unwrap());
            turns += 1;
        }
        assert!(app.game.status().is_terminal());
        let score = app.game.score();
        assert!(app.handle_action(Action::Move(Direction::Left)).unwrap());
        assert_eq!(app.game.score(), score);

        assert!(app.handle_action(Action::Restart).unwrap());
        assert_eq!(app.deals, 2);
        assert_eq!(app.game.status(), Status::InProgress);
        assert_eq!(app.game.score(), 0);
    }

    #[test]
    fn test_spawn_effect_resets_on_new_move() {
        let mut app = App::new(config(11), Theme::default()).unwrap();
        app.sync_spawn_effect();
        let first = app.spawn_effect_key;
        for d in Direction::ALL {
            app.handle_action(Action::Move(d)).unwrap();
        }
        app.sync_spawn_effect();
        assert_ne!(app.spawn_effect_key, first);
    }

    #[test]
    fn test_terminate_flag_ends_loop() {
        let mut app = App::new(config(13), Theme::default()).unwrap();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        app.terminate.store(true, Ordering::Relaxed);
        app.run_loop(&mut terminal).unwrap();
        assert_eq!(app.summary().status, Status::InProgress);
    }

    #[test]
    fn test_restore_panic_hook_reinstates_previous_hook() {
        let hit = Arc::new(AtomicBool::new(false));
        let seen = Arc::clone(&hit);
        std::panic::set_hook(Box::new(move |_| seen.store(true, Ordering::SeqCst)));
        restore_panic_hook(install_restore_hook());
        let _ = std::panic::catch_unwind(|| panic!("restored hook"));
        let _ = std::panic::take_hook();
        assert!(hit.load(Ordering::SeqCst));
    }
}
