use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Result};

use crate::config::CONFIG_GROUP;
use crate::controller::Controller;
use crate::delay;
use crate::logger;
use crate::platform::Game;
use crate::reactor::EventReactor;
use crate::types::*;

/// Game tick cadence
pub const TICK: Duration = Duration::from_millis(600);

const POLL_MS: u64 = 20;

/// Parse one front-end line: `start`, `stop`, `status`, `quit`,
/// `set <key> <value>`.
pub fn parse_command(line: &str) -> Result<Command> {
    let mut parts = line.split_whitespace();
    let Some(word) = parts.next() else { bail!("empty command") };
    match word.to_ascii_lowercase().as_str() {
        "start" => Ok(Command::Start),
        "stop" => Ok(Command::Stop),
        "status" => Ok(Command::Status),
        "quit" | "exit" => Ok(Command::Quit),
        "set" => {
            let key = parts.next().ok_or_else(|| anyhow!("usage: set <key> <value>"))?;
            let value = parts.collect::<Vec<_>>().join(" ");
            if value.is_empty() {
                bail!("usage: set <key> <value>");
            }
            Ok(Command::Config(ConfigChanged {
                group: CONFIG_GROUP.to_string(),
                key: key.to_string(),
                value,
            }))
        }
        other => Err(anyhow!("unknown command {:?}", other)),
    }
}

/// Apply a front-end command. Runs on the caller's thread so a stop lands
/// even while the tick thread sits in its reaction pause. Returns false on Quit.
pub fn handle_command(controller: &Controller, cmd: Command) -> bool {
    match cmd {
        Command::Quit => {
            logger::info("shutting down");
            controller.stop();
            return false;
        }
        Command::Start => controller.start(),
        Command::Stop => {
            controller.stop();
        }
        Command::Status => logger::info(&controller.status()),
        Command::Config(change) => match controller.config().apply(&change) {
            Ok(true) => logger::info_p("config", &format!("{} = {}", change.key, change.value)),
            Ok(false) => logger::warn_p("config", &format!("ignored key {:?}", change.key)),
            Err(e) => logger::error_p("config", &format!("{:#}", e)),
        },
    }
    true
}

/// Main tick loop. Runs on a background thread until `shutdown` is set.
pub fn orchestrate(controller: Controller, game: Arc<dyn Game>, shutdown: Arc<AtomicBool>) {
    let mut next_tick = Instant::now() + TICK;

    while !shutdown.load(Ordering::Acquire) {
        let now = Instant::now();
        if now < next_tick {
            delay::sleep_ms(POLL_MS);
            continue;
        }

        controller.on_tick(game.as_ref());

        // a long reaction pause can eat whole ticks; skip them, don't burst
        next_tick += TICK;
        let now = Instant::now();
        if next_tick <= now {
            next_tick = now + TICK;
        }
    }
    logger::info("tick loop exited");
}

/// Deliver game events to the reactor on their own thread, so they never
/// queue behind a tick.
pub fn dispatch_events(reactor: EventReactor, game: Arc<dyn Game>, events: mpsc::Receiver<GameEvent>) {
    for event in events {
        reactor.dispatch(game.as_ref(), &event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigStore, RunConfig, Spell, KEY_NPC_ID};

    #[test]
    fn test_parse_commands() {
        assert_eq!(parse_command("start").unwrap(), Command::Start);
        assert_eq!(parse_command("  STOP ").unwrap(), Command::Stop);
        assert_eq!(parse_command("exit").unwrap(), Command::Quit);
        assert_eq!(
            parse_command("set spell Fire Strike").unwrap(),
            Command::Config(ConfigChanged {
                group: CONFIG_GROUP.into(),
                key: "spell".into(),
                value: "Fire Strike".into(),
            })
        );
        assert!(parse_command("").is_err());
        assert!(parse_command("set npcID").is_err());
        assert!(parse_command("dance").is_err());
    }

    #[test]
    fn test_handle_command_lifecycle() {
        let c = Controller::new(Arc::new(ConfigStore::new(RunConfig::default())));
        assert!(handle_command(&c, Command::Start));
        assert!(c.state().running);
        assert!(handle_command(&c, Command::Config(ConfigChanged {
            group: CONFIG_GROUP.into(),
            key: KEY_NPC_ID.into(),
            value: "12".into(),
        })));
        assert!(handle_command(&c, parse_command("set spell curse").unwrap()));
        assert_eq!(c.config().current().npc_id, 12);
        assert_eq!(c.config().current().spell, Spell::Curse);
        assert!(!handle_command(&c, Command::Quit));
        assert!(!c.state().running);
        // the binary stops again on exit; nothing left to stop
        assert!(!c.stop());
    }
}
