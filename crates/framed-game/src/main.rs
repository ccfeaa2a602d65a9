//! Headless runner for Framed Dreams.
//!
//! Loads the config, then plays the story from start menu to the journal on
//! the headless engine with the threaded asset loader.
//!
//! Run with: `cargo run -p framed-game -- --settle-delay-ms 0`

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use framed_config::{CliArgs, Config, default_config_dir};
use framed_engine::HeadlessEngine;
use framed_flow::{FIXED_DT, GameLoop, LoadPipeline, Phase, SceneFlow};
use framed_game::{Autopilot, GameScenes, content};
use tracing::{error, info};

fn main() {
    let args = CliArgs::parse();

    let config_dir = args
        .config
        .clone()
        .or_else(default_config_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_dir.display());
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);

    let log_dir = config_dir.join("logs");
    framed_log::init_logging(Some(log_dir.as_path()), cfg!(debug_assertions), Some(&config));
    info!("Framed Dreams (headless)");
    info!(
        "Settle delay {}ms, load timeout {}ms, {} loader thread(s)",
        config.flow.settle_delay_ms, config.flow.load_timeout_ms, config.flow.loader_threads
    );

    let loader = Arc::new(content::catalog());
    let pipeline = LoadPipeline::new(config.flow.loader_threads, loader);
    let factory = GameScenes::new(config.clone());
    let mut flow = SceneFlow::new(HeadlessEngine::new(), pipeline, factory, &config.flow);
    let mut autopilot = Autopilot::full_story(&config.puzzle.required_order);

    if let Err(e) = flow.start() {
        error!("Could not start: {e}");
        std::process::exit(1);
    }

    let mut game_loop = GameLoop::new();
    while !autopilot.is_done() && game_loop.total_sim_time() < args.max_seconds {
        game_loop.advance(FIXED_DT, |dt, _| {
            autopilot.drive(&mut flow, dt);
            flow.update(dt);
        });
        if flow.phase() == Phase::LoadFailed {
            error!("Stopping after a failed load");
            break;
        }
        if flow.is_transitioning() {
            // Give the loader threads a chance to answer.
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    let finished = autopilot.is_done();
    let sim_time = game_loop.total_sim_time();
    flow.shutdown();

    println!("Framed Dreams");
    println!("  scene:        {}", flow.current_state());
    println!("  mars visited: {}", flow.is_mars_visited());
    println!("  sim time:     {sim_time:.1}s");
    println!(
        "  last message: {}",
        flow.engine().message().unwrap_or("(none)")
    );

    if !finished {
        eprintln!(
            "Story did not finish, {} step(s) left after {sim_time:.1}s",
            autopilot.remaining()
        );
        std::process::exit(2);
    }
}
