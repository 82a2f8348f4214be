// src/main.rs

use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode},
};
use log::info;

use waveform_recorder::config::EngineConfig;
use waveform_recorder::scope::ScopeController;

/// `wavescope [config.json] [output-dir]`
fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let config = match args.get(1) {
        Some(path) => EngineConfig::load(&PathBuf::from(path))?,
        None => EngineConfig::default(),
    };
    let out_dir = args.get(2).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    info!("saving recordings to {}", out_dir.display());

    let mut scope = ScopeController::new(config, out_dir)?;

    enable_raw_mode()?;
    execute!(stdout(), EnableMouseCapture, Clear(ClearType::All))?;
    let result = run(&mut scope);
    execute!(stdout(), DisableMouseCapture)?;
    disable_raw_mode()?;

    // Leaving without an explicit stop still keeps the take.
    scope.stop_and_save();
    println!("\n{}", scope.message());
    result
}

fn run(scope: &mut ScopeController) -> Result<()> {
    // Target 20 FPS (50ms per frame)
    let target_frame_duration = Duration::from_millis(50);

    loop {
        if event::poll(target_frame_duration)? {
            match event::read()? {
                Event::Key(ev) if ev.kind == KeyEventKind::Press => {
                    if ev.code == KeyCode::Char('c') && ev.modifiers.contains(KeyModifiers::CONTROL) {
                        break;
                    }
                    if scope.should_quit(ev.code) {
                        break;
                    }
                    scope.handle_key(ev.code);
                }
                Event::Mouse(ev) => scope.handle_mouse(ev),
                _ => {}
            }
        }
        scope.run_tick()?;
    }
    Ok(())
}
