//! Umbra demo viewer: a procedurally generated scene rendered through the
//! lighting compositor, with click-to-move tokens and door sequencing.
//!
//! ```bash
//! umbra
//! umbra --config umbra.toml --watch-config
//! umbra --player --log-file umbra.log
//! ```

mod app;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::Parser;
use umbra_scene::{EngineConfig, load_config_from_path};

use crate::app::App;

#[derive(Parser, Debug)]
#[command(name = "umbra")]
#[command(author, version, about = "Lighting and darkness compositor demo")]
struct Args {
    /// Engine config (TOML); defaults apply to anything it leaves out
    #[arg(long)]
    config: Option<PathBuf>,

    /// Reload the config file whenever it changes
    #[arg(long)]
    watch_config: bool,

    /// Also write logs to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Start with player permissions instead of GM
    #[arg(long)]
    player: bool,

    /// Seed for the generated textures
    #[arg(long, default_value_t = 1337)]
    seed: i32,

    #[arg(long, default_value_t = 1280)]
    width: i32,

    #[arg(long, default_value_t = 800)]
    height: i32,
}

fn init_logging(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    match log_file {
        None => {
            env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
                .init();
        }
        Some(path) => {
            let file = std::fs::File::create(path)?;
            let config = simplelog::ConfigBuilder::new()
                .set_time_format_rfc3339()
                .build();
            simplelog::CombinedLogger::init(vec![
                simplelog::TermLogger::new(
                    simplelog::LevelFilter::Info,
                    config.clone(),
                    simplelog::TerminalMode::Mixed,
                    simplelog::ColorChoice::Auto,
                ),
                simplelog::WriteLogger::new(simplelog::LevelFilter::Debug, config, file),
            ])?;
        }
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let config = match &args.config {
        Some(path) => {
            let cfg = load_config_from_path(path)?;
            log::info!("loaded config from {}", path.display());
            cfg
        }
        None => EngineConfig::default(),
    };
    if args.watch_config && args.config.is_none() {
        log::warn!("--watch-config needs --config; nothing to watch");
    }

    let (mut rl, thread) = raylib::init()
        .size(args.width, args.height)
        .title("Umbra")
        .resizable()
        .msaa_4x()
        .build();
    rl.set_target_fps(60);

    let mut app = App::new(
        &mut rl,
        &thread,
        config,
        args.config.clone(),
        args.watch_config,
        !args.player,
        args.seed,
    );

    while !rl.window_should_close() {
        let dt = rl.get_frame_time();
        app.handle_input(&rl);
        app.step(dt);
        app.render(&mut rl, &thread);
    }
    app.shutdown();
    Ok(())
}
