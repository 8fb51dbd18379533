use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use rand::Rng;

use crate::classifier::{self, BotState};
use crate::config::{ConfigStore, RunConfig};
use crate::delay;
use crate::failure::FailureTracker;
use crate::logger;
use crate::platform::Game;
use crate::reactor::EventReactor;
use crate::types::*;

/// Ticks added on top of the sampled backoff after a cast was triggered
pub const SETTLE_TICKS: u32 = 10;

/// Pixel offset window for the confirmation click
pub const CLICK_OFFSET: (i32, i32) = (-100, 100);

const RUN_MIN_ENERGY: u32 = 40;
const RUN_ENERGY_JITTER: u32 = 20;

/// Run state shared by the tick path and the event handlers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerState {
    pub running: bool,
    pub timeout_ticks: u32,
    pub failures: FailureTracker,
    pub pending_action: Option<ActionDescriptor>,
    pub last_position: Point,
    pub last_state: Option<BotState>,
    /// Bumped by every start; a wait that began in an older run never resumes.
    pub run_id: u64,
    pub started_at: Option<Instant>,
}

/// `ControllerState` behind one lock. The condvar is signalled on every stop
/// so a sleeping tick wakes up immediately.
#[derive(Debug, Default)]
pub struct SharedState {
    state: Mutex<ControllerState>,
    stopped: Condvar,
}

impl SharedState {
    pub fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> ControllerState {
        self.lock().clone()
    }

    /// Permanently stop the current run. Caller holds the lock.
    pub fn halt(&self, state: &mut ControllerState) {
        state.running = false;
        self.stopped.notify_all();
    }

    /// Sleep up to `dur` while run `run_id` is still going.
    /// Returns false if the run was stopped before the time ran out.
    pub fn wait_running(&self, run_id: u64, dur: Duration) -> bool {
        let guard = self.lock();
        let (guard, _) = self
            .stopped
            .wait_timeout_while(guard, dur, |s| s.running && s.run_id == run_id)
            .unwrap_or_else(|e| e.into_inner());
        guard.running && guard.run_id == run_id
    }
}

/// Work left over once the state lock is released.
enum Followup {
    Nothing,
    Notice(&'static str),
    Confirm { action: ActionDescriptor, run_id: u64 },
}

/// Decides once per game tick what, if anything, to do next.
#[derive(Clone)]
pub struct Controller {
    shared: Arc<SharedState>,
    config: Arc<ConfigStore>,
}

impl Controller {
    pub fn new(config: Arc<ConfigStore>) -> Self {
        Self { shared: Arc::new(SharedState::default()), config }
    }

    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn state(&self) -> ControllerState {
        self.shared.snapshot()
    }

    /// Event handlers bound to the same state.
    pub fn reactor(&self) -> EventReactor {
        EventReactor::new(Arc::clone(&self.shared), Arc::clone(&self.config))
    }

    pub fn start(&self) {
        let mut s = self.shared.lock();
        s.running = true;
        s.timeout_ticks = 0;
        s.failures.on_success_signal();
        s.pending_action = None;
        s.last_state = None;
        s.run_id += 1;
        s.started_at = Some(Instant::now());
        let cfg = self.config.current();
        logger::info_p("tick", &format!("started: npc {} with {}", cfg.npc_id, cfg.spell.name()));
    }

    /// Halt the run and clear its transient state. Returns whether a run was
    /// active; stopping twice is harmless and only logged once.
    pub fn stop(&self) -> bool {
        let mut s = self.shared.lock();
        let was_running = s.running;
        self.shared.halt(&mut s);
        s.timeout_ticks = 0;
        s.failures.on_success_signal();
        s.pending_action = None;
        s.started_at = None;
        if was_running {
            logger::info_p("tick", "stopped");
        }
        was_running
    }

    /// One line summary: running flag, last state, run time, failures.
    pub fn status(&self) -> String {
        let s = self.shared.snapshot();
        let elapsed = s.started_at.map(|t| t.elapsed()).unwrap_or_default().as_secs();
        format!(
            "{} | {} | {:02}:{:02}:{:02} | failures {}/{}",
            if s.running { "running" } else { "stopped" },
            s.last_state.map(|b| b.to_string()).unwrap_or_else(|| "-".into()),
            elapsed / 3600,
            elapsed / 60 % 60,
            elapsed % 60,
            s.failures.count(),
            s.failures.threshold(),
        )
    }

    /// Handle one game tick. Returns the state that was acted on, or None
    /// when the tick was skipped.
    pub fn on_tick(&self, game: &dyn Game) -> Option<BotState> {
        let player = match (game.session(), game.local_player()) {
            (SessionState::LoggedIn, Some(p)) => p,
            _ => {
                logger::debug_p("tick", "client/player is unavailable");
                return None;
            }
        };
        let (last_position, idling, run_id) = {
            let s = self.shared.lock();
            if !s.running {
                logger::debug_p("tick", "bot isn't started");
                return None;
            }
            (s.last_position, s.timeout_ticks > 0, s.run_id)
        };

        let config = self.config.current();
        // an outstanding timeout decides the tick before the target rule
        let obs = observe(game, &config, player, last_position, !idling);
        handle_run(game, &obs);

        let mut state = self.shared.lock();
        if !state.running || state.run_id != run_id {
            return None;
        }
        state.last_position = obs.position;
        let bot_state = classifier::classify(&obs, &state);
        state.last_state = Some(bot_state);
        logger::debug_p(
            "tick",
            &format!("state {} (rule {})", bot_state, classifier::deciding_rule(&obs, &state)),
        );

        let followup = match bot_state {
            BotState::Idling => {
                state.timeout_ticks -= 1;
                Followup::Nothing
            }
            BotState::Moving => {
                state.timeout_ticks = self.tick_delay(&config);
                Followup::Nothing
            }
            BotState::Animating => Followup::Nothing,
            BotState::SpellUnavailable => {
                self.shared.halt(&mut state);
                Followup::Notice("Auto-cast is not setup or out of runes")
            }
            BotState::NpcNotFound => {
                state.timeout_ticks = self.tick_delay(&config);
                Followup::Notice("NPC not found")
            }
            BotState::TargetFound(target) => Followup::Confirm {
                action: ActionDescriptor { target, option: MenuOption::NpcSecondOption },
                run_id: state.run_id,
            },
        };
        drop(state);

        match followup {
            Followup::Nothing => {}
            Followup::Notice(msg) => {
                logger::info_p("tick", msg);
                game.send_game_message(msg);
            }
            Followup::Confirm { action, run_id } => self.confirm(game, &config, action, run_id),
        }
        Some(bot_state)
    }

    /// Reaction pause, then arm the action and click. The pause only holds
    /// this tick; handlers keep running against the unlocked state.
    fn confirm(&self, game: &dyn Game, config: &RunConfig, action: ActionDescriptor, run_id: u64) {
        let pause = delay::reaction_delay(&config.sleep);
        logger::debug_p("tick", &format!("Sleeping for {}ms", pause.as_millis()));
        if !self.shared.wait_running(run_id, pause) {
            logger::info_p("tick", "stopped during reaction delay, dropping action");
            return;
        }

        {
            let mut state = self.shared.lock();
            if !state.running || state.run_id != run_id {
                return;
            }
            if let Some(old) = state.pending_action.replace(action) {
                logger::warn_p("tick", &format!("replacing unconsumed action {:?}", old));
            }
        }
        game.click_random_point(CLICK_OFFSET.0, CLICK_OFFSET.1);
    }

    fn tick_delay(&self, config: &RunConfig) -> u32 {
        let ticks = delay::wait_ticks(&config.tick_delay);
        logger::debug_p("tick", &format!("tick delay for {} ticks", ticks));
        ticks
    }
}

/// Snapshot everything the classifier may look at, in one pass. The NPC scan
/// only runs when `search_target` is set.
pub fn observe(
    game: &dyn Game,
    config: &RunConfig,
    player: PlayerView,
    last_position: Point,
    search_target: bool,
) -> Observation {
    Observation {
        moving: player.position != last_position,
        animation: player.animation,
        spell_castable: classifier::is_casting_style(game.attack_style()),
        target: if search_target { game.find_target(config.npc_id, player.position) } else { None },
        position: player.position,
        run_energy: game.run_energy(),
        run_enabled: game.run_enabled(),
    }
}

/// Turn run on once energy climbs past a jittered floor.
fn handle_run(game: &dyn Game, obs: &Observation) {
    if obs.run_enabled {
        return;
    }
    let floor = RUN_MIN_ENERGY + rand::thread_rng().gen_range(0..RUN_ENERGY_JITTER);
    if obs.run_energy > floor {
        logger::debug_p("tick", &format!("enabling run at {}% energy", obs.run_energy));
        game.enable_run();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::stub::StubGame;
    use crate::platform::GameQuery;
    use crate::delay::DelayShape;

    fn fixed(n: u64) -> DelayShape {
        DelayShape { weighted: false, min: n, max: n, deviation: 0, target: n }
    }

    fn controller(npc_id: i32) -> Controller {
        let cfg = RunConfig { npc_id, sleep: fixed(1), tick_delay: fixed(4), ..RunConfig::default() };
        Controller::new(Arc::new(ConfigStore::new(cfg)))
    }

    /// First tick after start sees the player "move" from the origin.
    fn settled(c: &Controller, game: &StubGame) {
        c.shared.lock().last_position = game.local_player().unwrap().position;
    }

    #[test]
    fn test_tick_noop_when_not_running() {
        let c = controller(7);
        let game = StubGame::new(7);
        assert_eq!(c.on_tick(&game), None);
        assert_eq!(c.state(), ControllerState::default());
    }

    #[test]
    fn test_tick_noop_when_logged_out() {
        let c = controller(7);
        let game = StubGame::new(7);
        c.start();
        game.update(|w| w.session = SessionState::LoginScreen);
        assert_eq!(c.on_tick(&game), None);
        game.update(|w| {
            w.session = SessionState::LoggedIn;
            w.player = None;
        });
        assert_eq!(c.on_tick(&game), None);
    }

    #[test]
    fn test_moving_sets_backoff() {
        let c = controller(7);
        let game = StubGame::new(7);
        c.start();
        assert_eq!(c.on_tick(&game), Some(BotState::Moving));
        assert_eq!(c.state().timeout_ticks, 4);
    }

    #[test]
    fn test_idling_counts_down() {
        let c = controller(7);
        let game = StubGame::new(7);
        c.start();
        settled(&c, &game);
        c.shared.lock().timeout_ticks = 2;
        assert_eq!(c.on_tick(&game), Some(BotState::Idling));
        assert_eq!(c.on_tick(&game), Some(BotState::Idling));
        assert_eq!(c.state().timeout_ticks, 0);
    }

    #[test]
    fn test_spell_unavailable_halts() {
        let c = controller(7);
        let game = StubGame::new(7);
        c.start();
        settled(&c, &game);
        game.update(|w| w.attack_style = 1);
        assert_eq!(c.on_tick(&game), Some(BotState::SpellUnavailable));
        assert!(!c.state().running);
        assert_eq!(c.on_tick(&game), None);
    }

    #[test]
    fn test_npc_not_found_backs_off_and_keeps_running() {
        let c = controller(8);
        let game = StubGame::new(7);
        c.start();
        settled(&c, &game);
        assert_eq!(c.on_tick(&game), Some(BotState::NpcNotFound));
        let s = c.state();
        assert!(s.running);
        assert_eq!(s.timeout_ticks, 4);
    }

    #[test]
    fn test_target_found_arms_action() {
        let c = controller(7);
        let game = StubGame::new(7);
        c.start();
        settled(&c, &game);
        assert_eq!(c.on_tick(&game), Some(BotState::TargetFound(NpcHandle(100))));
        assert_eq!(
            c.state().pending_action,
            Some(ActionDescriptor { target: NpcHandle(100), option: MenuOption::NpcSecondOption })
        );
    }

    #[test]
    fn test_run_enabled_when_energy_high() {
        let c = controller(7);
        let game = StubGame::new(7);
        c.start();
        c.on_tick(&game);
        assert!(game.run_enabled());

        let game = StubGame::new(7);
        game.update(|w| w.run_energy = RUN_MIN_ENERGY);
        c.on_tick(&game);
        assert!(!game.run_enabled());
    }

    #[test]
    fn test_stop_wakes_waiter() {
        let shared = Arc::new(SharedState::default());
        let run_id = {
            let mut s = shared.lock();
            s.running = true;
            s.run_id = 1;
            s.run_id
        };
        let waiter = Arc::clone(&shared);
        let handle = std::thread::spawn(move || {
            let t = Instant::now();
            (waiter.wait_running(run_id, Duration::from_secs(30)), t.elapsed())
        });
        std::thread::sleep(Duration::from_millis(50));
        shared.halt(&mut shared.lock());
        let (still_running, waited) = handle.join().unwrap();
        assert!(!still_running);
        assert!(waited < Duration::from_secs(5));
    }

    #[test]
    fn test_restart_invalidates_old_wait() {
        let shared = SharedState::default();
        {
            let mut s = shared.lock();
            s.running = true;
            s.run_id = 2;
        }
        assert!(!shared.wait_running(1, Duration::from_millis(1)));
        assert!(shared.wait_running(2, Duration::from_millis(1)));
    }

    #[test]
    fn test_stop_is_idempotent() {
        let c = controller(7);
        assert!(!c.stop());
        c.start();
        c.shared.lock().timeout_ticks = 3;
        assert!(c.stop());
        assert!(!c.stop());
        let s = c.state();
        assert!(!s.running);
        assert_eq!(s.timeout_ticks, 0);
    }

    #[test]
    fn test_status_line() {
        let c = controller(7);
        assert!(c.status().starts_with("stopped | - |"));
        c.start();
        assert!(c.status().contains("failures 0/10"));
    }
}
