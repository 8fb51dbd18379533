use std::sync::Arc;

use crate::config::ConfigStore;
use crate::controller::{SharedState, SETTLE_TICKS};
use crate::delay;
use crate::logger;
use crate::platform::{GameActions, Notifier};
use crate::types::*;

/// Substring of the chat line sent when a cast is short on runes
pub const OUT_OF_RUNES_MSG: &str = "You do not have enough";
/// Substring of the chat line sent when the target can't be pathed to
pub const UNREACHABLE_MSG: &str = "I can't reach that";

/// Handlers for events that arrive between ticks. Every handler is a no-op
/// unless the run is active, and none of them wait on the tick path.
#[derive(Clone)]
pub struct EventReactor {
    shared: Arc<SharedState>,
    config: Arc<ConfigStore>,
}

impl EventReactor {
    pub fn new(shared: Arc<SharedState>, config: Arc<ConfigStore>) -> Self {
        Self { shared, config }
    }

    fn settle_ticks(&self) -> u32 {
        SETTLE_TICKS + delay::wait_ticks(&self.config.current().tick_delay)
    }

    pub fn dispatch<G: GameActions + Notifier + ?Sized>(&self, game: &G, event: &GameEvent) {
        match event {
            GameEvent::MenuOptionClicked(e) => self.on_menu_option_clicked(game, e),
            GameEvent::AnimationChanged(e) => self.on_animation_changed(e),
            GameEvent::ChatMessage(e) => self.on_chat_message(game, e),
        }
    }

    /// Swap the action the client is about to resolve for the armed one.
    /// With nothing armed the player's own click goes through untouched.
    pub fn on_menu_option_clicked<G: GameActions + ?Sized>(&self, game: &G, event: &MenuOptionClicked) {
        let action = {
            let mut s = self.shared.lock();
            if !s.running {
                return;
            }
            let Some(action) = s.pending_action.take() else { return };
            s.timeout_ticks = self.settle_ticks();
            action
        };
        logger::debug_p(
            "react",
            &format!("replacing {:?} on {:?} with {:?}", event.option, event.target, action),
        );
        game.substitute_action(&action);
    }

    /// The local player starting the splash animation means the cast landed.
    pub fn on_animation_changed(&self, event: &AnimationChanged) {
        if event.actor != Actor::LocalPlayer || event.animation != LOW_LEVEL_MAGIC_ATTACK {
            return;
        }
        let mut s = self.shared.lock();
        if !s.running {
            return;
        }
        logger::debug_p("react", &format!("Animation ID changed to {}, resetting timeout", event.animation));
        s.timeout_ticks = self.settle_ticks();
        s.failures.on_success_signal();
    }

    pub fn on_chat_message<G: Notifier + ?Sized>(&self, game: &G, event: &ChatMessage) {
        if !matches!(event.kind, ChatKind::GameMessage | ChatKind::Engine) {
            return;
        }

        let notice = {
            let mut s = self.shared.lock();
            if !s.running {
                return;
            }
            if event.text.contains(OUT_OF_RUNES_MSG) {
                self.shared.halt(&mut s);
                Some("Out of runes!")
            } else if event.text.contains(UNREACHABLE_MSG) {
                let tripped = s.failures.on_adverse_signal();
                logger::debug_p("react", &format!("unreachable message, fail count: {}", s.failures.count()));
                if tripped {
                    self.shared.halt(&mut s);
                    Some("failed to reach NPC too many times, stopping")
                } else {
                    s.timeout_ticks = delay::wait_ticks(&self.config.current().tick_delay);
                    None
                }
            } else {
                None
            }
        };

        if let Some(msg) = notice {
            logger::warn_p("react", msg);
            game.send_game_message(msg);
        }
    }
}
