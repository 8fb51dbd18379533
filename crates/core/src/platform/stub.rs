use std::sync::{mpsc, Mutex};

use crate::logger;
use crate::types::*;
use super::{GameActions, GameQuery, Notifier};

/// Mutable world behind the stub.
#[derive(Debug, Clone)]
pub struct StubWorld {
    pub session: SessionState,
    pub player: Option<PlayerView>,
    pub attack_style: i32,
    pub run_energy: u32,
    pub run_enabled: bool,
    pub npcs: Vec<Npc>,
}

/// In-process game session. Logs every request and answers a confirmation
/// click the way a client would: the click resolves to a menu action, the
/// substituted action makes the player cast.
pub struct StubGame {
    world: Mutex<StubWorld>,
    events: Mutex<Option<mpsc::Sender<GameEvent>>>,
}

impl StubGame {
    pub fn new(npc_id: i32) -> Self {
        let npcs = (0..3)
            .map(|i| Npc {
                handle: NpcHandle(100 + i),
                id: npc_id,
                position: Point::new(3200 + 2 * i as i32, 3200),
                interacting: Interacting::None,
            })
            .collect();
        Self {
            world: Mutex::new(StubWorld {
                session: SessionState::LoggedIn,
                player: Some(PlayerView { position: Point::new(3197, 3200), animation: IDLE_ANIMATION }),
                attack_style: CASTING_STYLES[0],
                run_energy: 100,
                run_enabled: false,
                npcs,
            }),
            events: Mutex::new(None),
        }
    }

    pub fn with_events(self, tx: mpsc::Sender<GameEvent>) -> Self {
        *self.events.lock().unwrap_or_else(|e| e.into_inner()) = Some(tx);
        self
    }

    /// Mutate the simulated world (tests and scripted runs).
    pub fn update<F: FnOnce(&mut StubWorld)>(&self, f: F) {
        f(&mut self.world.lock().unwrap_or_else(|e| e.into_inner()));
    }

    fn world(&self) -> StubWorld {
        self.world.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Marks the target as fighting us; false if it is gone.
    fn update_npc(&self, handle: NpcHandle) -> bool {
        let mut world = self.world.lock().unwrap_or_else(|e| e.into_inner());
        match world.npcs.iter_mut().find(|n| n.handle == handle) {
            Some(npc) => {
                npc.interacting = Interacting::LocalPlayer;
                true
            }
            None => false,
        }
    }

    fn emit(&self, event: GameEvent) {
        if let Some(tx) = self.events.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            tx.send(event).ok();
        }
    }
}

impl GameQuery for StubGame {
    fn session(&self) -> SessionState { self.world().session }
    fn local_player(&self) -> Option<PlayerView> { self.world().player }
    fn attack_style(&self) -> i32 { self.world().attack_style }
    fn run_energy(&self) -> u32 { self.world().run_energy }
    fn run_enabled(&self) -> bool { self.world().run_enabled }
    fn npcs(&self) -> Vec<Npc> { self.world().npcs }
}

impl GameActions for StubGame {
    fn click_random_point(&self, min: i32, max: i32) {
        logger::info_p("stub", &format!("click_random_point({}, {})", min, max));
        self.emit(GameEvent::MenuOptionClicked(MenuOptionClicked {
            option: "Walk here".into(),
            target: String::new(),
        }));
    }

    fn substitute_action(&self, action: &ActionDescriptor) {
        logger::info_p("stub", &format!("substitute_action({:?} on npc {})", action.option, action.target.0));
        let found = self.update_npc(action.target);
        if found {
            self.emit(GameEvent::AnimationChanged(AnimationChanged {
                actor: Actor::LocalPlayer,
                animation: LOW_LEVEL_MAGIC_ATTACK,
            }));
        } else {
            self.emit(GameEvent::ChatMessage(ChatMessage {
                kind: ChatKind::GameMessage,
                text: "I can't reach that!".into(),
            }));
        }
    }

    fn enable_run(&self) {
        logger::info_p("stub", "enable_run()");
        self.update(|w| w.run_enabled = true);
    }
}

impl Notifier for StubGame {
    fn send_game_message(&self, msg: &str) {
        logger::info_p("stub", &format!("game message: {}", msg));
    }
}
