use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use anyhow::{Context, Result};

use splasher_core::config::{ConfigStore, RunConfig};
use splasher_core::controller::Controller;
use splasher_core::platform::create_platform;
use splasher_core::types::GameEvent;
use splasher_core::{logger, orchestrator};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug = args.iter().any(|a| a == "--debug");
    let write_config = args.iter().any(|a| a == "--write-config");

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(PathBuf::from)
        .unwrap_or_else(|| cwd.join("splasher.json"));

    logger::init(&cwd.join("logs"))?;
    logger::set_debug(debug);

    let config = RunConfig::load(&config_path)?;
    if write_config {
        config.save(&config_path)?;
        println!("wrote {}", config_path.display());
        return Ok(());
    }

    // Mirror log lines to stderr
    let (log_tx, log_rx) = mpsc::channel::<String>();
    logger::set_sender(log_tx);
    thread::spawn(move || {
        for line in log_rx {
            eprintln!("{}", line);
        }
    });

    logger::info(&format!(
        "splasher started: npc {} with {} ({})",
        config.npc_id,
        config.spell.name(),
        config_path.display()
    ));

    let (event_tx, event_rx) = mpsc::channel::<GameEvent>();
    let game = create_platform(config.npc_id, event_tx);
    let controller = Controller::new(Arc::new(ConfigStore::new(config)));

    let reactor = controller.reactor();
    let dispatch_game = Arc::clone(&game);
    thread::spawn(move || {
        orchestrator::dispatch_events(reactor, dispatch_game, event_rx);
    });

    let shutdown = Arc::new(AtomicBool::new(false));
    let tick_controller = controller.clone();
    let tick_shutdown = Arc::clone(&shutdown);
    let ticker = thread::spawn(move || {
        orchestrator::orchestrate(tick_controller, game, tick_shutdown);
    });

    // Front end: one command per stdin line
    for line in io::stdin().lock().lines() {
        let line = line.context("reading stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match orchestrator::parse_command(&line) {
            Ok(cmd) => {
                if !orchestrator::handle_command(&controller, cmd) {
                    break;
                }
            }
            Err(e) => logger::warn(&format!("{:#}", e)),
        }
    }

    controller.stop();
    shutdown.store(true, Ordering::Release);
    ticker.join().ok();
    Ok(())
}
