pub mod stub;

use std::sync::{mpsc, Arc};

use crate::types::*;

/// Read side of the game session.
pub trait GameQuery: Send + Sync {
    fn session(&self) -> SessionState;
    fn local_player(&self) -> Option<PlayerView>;
    /// Raw attack style varp
    fn attack_style(&self) -> i32;
    /// Run energy in whole percent
    fn run_energy(&self) -> u32;
    fn run_enabled(&self) -> bool;
    fn npcs(&self) -> Vec<Npc>;

    /// Nearest NPC with `npc_id` that is idle or already fighting us.
    fn find_target(&self, npc_id: i32, from: Point) -> Option<NpcHandle> {
        nearest_target(&self.npcs(), npc_id, from)
    }
}

/// Write side: how requested actions reach the client.
pub trait GameActions: Send + Sync {
    /// Click somewhere within `[min, max]` pixels of the canvas centre.
    fn click_random_point(&self, min: i32, max: i32);
    /// Replace the context action the client is about to resolve.
    fn substitute_action(&self, action: &ActionDescriptor);
    fn enable_run(&self);
}

pub trait Notifier: Send + Sync {
    /// Print a line in the in-game chat box.
    fn send_game_message(&self, msg: &str);
}

/// Everything the controller needs from the host.
pub trait Game: GameQuery + GameActions + Notifier {}

impl<T: GameQuery + GameActions + Notifier> Game for T {}

pub fn nearest_target(npcs: &[Npc], npc_id: i32, from: Point) -> Option<NpcHandle> {
    npcs.iter()
        .filter(|n| n.id == npc_id)
        .filter(|n| matches!(n.interacting, Interacting::None | Interacting::LocalPlayer))
        .min_by_key(|n| n.position.distance_sq(&from))
        .map(|n| n.handle)
}

/// Create the game backend. Only the simulated session exists in-tree;
/// real clients implement `Game` themselves and feed their own events.
pub fn create_platform(npc_id: i32, events: mpsc::Sender<GameEvent>) -> Arc<dyn Game> {
    Arc::new(stub::StubGame::new(npc_id).with_events(events))
}
