//! DELVE headless runner.
//!
//! Usage:
//!   delve-app autoplay [--seed N] [--class ID] [--frames N] [--retries N]
//!   delve-app watch    [--seed N] [--class ID] [--seconds N]
//!
//! `DELVE_DEV` may hold a JSON object of dev overrides, `RUST_LOG` the log filter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use delve_app::autoplay::{self, AutoplayPolicy};
use delve_app::driver;
use delve_app::state::{AppState, DriverCommand};
use delve_core::catalog::Catalog;
use delve_core::config::DevParams;
use delve_core::constants::TICK_MS;
use delve_core::enums::GamePhase;
use delve_sim::engine::SimConfig;

struct Args {
    mode: String,
    seed: u64,
    class_id: String,
    frames: u64,
    retries: u32,
    seconds: u64,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn parse_args() -> Result<Args, String> {
    let mut args = Args {
        mode: "autoplay".into(),
        seed: 42,
        class_id: "warrior".into(),
        frames: 200_000,
        retries: 3,
        seconds: 30,
    };
    let mut iter = std::env::args().skip(1);
    if let Some(mode) = iter.next() {
        args.mode = mode;
    }
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("missing value for {flag}"))?;
        let bad = |_| format!("invalid value for {flag}: {value}");
        match flag.as_str() {
            "--seed" => args.seed = value.parse().map_err(bad)?,
            "--class" => args.class_id = value.clone(),
            "--frames" => args.frames = value.parse().map_err(bad)?,
            "--retries" => args.retries = value.parse().map_err(bad)?,
            "--seconds" => args.seconds = value.parse().map_err(bad)?,
            other => return Err(format!("unknown flag {other}")),
        }
    }
    Ok(args)
}

fn dev_params() -> DevParams {
    match std::env::var("DELVE_DEV") {
        Ok(json) => DevParams::from_json(&json).unwrap_or_else(|e| {
            warn!(error = %e, "ignoring malformed DELVE_DEV");
            DevParams::default()
        }),
        Err(_) => DevParams::default(),
    }
}

fn main() {
    init_tracing();

    let args = match parse_args() {
        Ok(args) => args,
        Err(e) => {
            error!("{e}");
            std::process::exit(2);
        }
    };
    let config = SimConfig {
        seed: args.seed,
        speed: 1.0,
        dev: dev_params(),
    };
    info!(seed = args.seed, class = %args.class_id, mode = %args.mode, "DELVE");

    let result = match args.mode.as_str() {
        "autoplay" => run_autoplay(config, &args),
        "watch" => run_watch(config, &args),
        other => Err(format!("unknown mode {other}")),
    };
    if let Err(e) = result {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run_autoplay(config: SimConfig, args: &Args) -> Result<(), String> {
    let report = autoplay::run(config, &args.class_id, args.retries, args.frames, TICK_MS)
        .map_err(|e| e.to_string())?;
    info!(
        phase = ?report.phase,
        floor = report.floor,
        level = report.level,
        gold = report.gold,
        retries = report.retries,
        ticks = report.ticks,
        "autoplay finished"
    );
    Ok(())
}

/// Real-time run on the driver thread, steered from this thread.
fn run_watch(config: SimConfig, args: &Args) -> Result<(), String> {
    let catalog = Catalog::builtin().map_err(|e| e.to_string())?;
    let state = Arc::new(AppState::new());
    let (tx, handle) =
        driver::spawn_driver(config, state.latest_snapshot.clone()).map_err(|e| e.to_string())?;
    if let Ok(mut lock) = state.command_tx.lock() {
        *lock = Some(tx);
    }
    if let Ok(mut running) = state.running.lock() {
        *running = true;
    }

    let mut policy = AutoplayPolicy::new(args.class_id.clone(), args.retries);
    let deadline = Instant::now() + Duration::from_secs(args.seconds);
    let mut last_tick = u64::MAX;
    let mut last_report = Instant::now();

    while Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
        let Some(snapshot) = state.snapshot() else {
            continue;
        };
        if snapshot.tick == last_tick && snapshot.phase == GamePhase::Combat {
            continue;
        }
        last_tick = snapshot.tick;

        for command in policy.decide(&snapshot, &catalog) {
            state.send(command)?;
        }
        if last_report.elapsed() >= Duration::from_secs(1) {
            last_report = Instant::now();
            let (hp, level) = snapshot
                .player
                .as_ref()
                .map(|p| (p.health.current, p.progress.level))
                .unwrap_or((0, 1));
            info!(
                phase = ?snapshot.phase,
                floor = snapshot.floor,
                room = snapshot.room,
                hp,
                level,
                "watch"
            );
        }
        if snapshot.phase == GamePhase::Victory {
            break;
        }
    }

    if let Ok(lock) = state.command_tx.lock() {
        if let Some(tx) = lock.as_ref() {
            let _ = tx.send(DriverCommand::Shutdown);
        }
    }
    handle.join().map_err(|_| "driver thread panicked".to_string())?;
    if let Ok(mut running) = state.running.lock() {
        *running = false;
    }
    Ok(())
}
