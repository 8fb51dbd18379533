//! Recording game double for scenario runs.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use splasher_core::platform::{GameActions, GameQuery, Notifier};
use splasher_core::types::*;

/// Something the controller asked the game to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Click { min: i32, max: i32 },
    Substitute(ActionDescriptor),
    EnableRun,
    Message(String),
}

#[derive(Debug, Clone)]
pub struct World {
    pub session: SessionState,
    pub player: Option<PlayerView>,
    pub attack_style: i32,
    pub run_energy: u32,
    pub run_enabled: bool,
    pub npcs: Vec<Npc>,
}

impl Default for World {
    /// Logged in at the origin, idle, autocasting, one free target 3 tiles east.
    fn default() -> Self {
        Self {
            session: SessionState::LoggedIn,
            player: Some(PlayerView { position: Point::default(), animation: IDLE_ANIMATION }),
            attack_style: CASTING_STYLES[0],
            run_energy: 0,
            run_enabled: true,
            npcs: vec![Npc {
                handle: NpcHandle(42),
                id: 3097,
                position: Point::new(3, 0),
                interacting: Interacting::None,
            }],
        }
    }
}

/// Answers queries from a `World` and records every request.
#[derive(Default)]
pub struct RecordingGame {
    world: Mutex<World>,
    calls: Mutex<Vec<Call>>,
    npc_scans: AtomicUsize,
}

impl RecordingGame {
    pub fn new(world: World) -> Self {
        Self { world: Mutex::new(world), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times the NPC list was queried.
    pub fn npc_scans(&self) -> usize {
        self.npc_scans.load(Ordering::SeqCst)
    }

    pub fn messages(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn update<F: FnOnce(&mut World)>(&self, f: F) {
        f(&mut self.world.lock().unwrap());
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn world(&self) -> World {
        self.world.lock().unwrap().clone()
    }
}

impl GameQuery for RecordingGame {
    fn session(&self) -> SessionState { self.world().session }
    fn local_player(&self) -> Option<PlayerView> { self.world().player }
    fn attack_style(&self) -> i32 { self.world().attack_style }
    fn run_energy(&self) -> u32 { self.world().run_energy }
    fn run_enabled(&self) -> bool { self.world().run_enabled }
    fn npcs(&self) -> Vec<Npc> {
        self.npc_scans.fetch_add(1, Ordering::SeqCst);
        self.world().npcs
    }
}

impl GameActions for RecordingGame {
    fn click_random_point(&self, min: i32, max: i32) {
        self.record(Call::Click { min, max });
    }

    fn substitute_action(&self, action: &ActionDescriptor) {
        self.record(Call::Substitute(*action));
    }

    fn enable_run(&self) {
        self.record(Call::EnableRun);
    }
}

impl Notifier for RecordingGame {
    fn send_game_message(&self, msg: &str) {
        self.record(Call::Message(msg.to_string()));
    }
}
