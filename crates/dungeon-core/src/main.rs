//! cramud: explore a procedurally generated, spatially consistent dungeon.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use dungeon_core::command::HELP;
use dungeon_core::{
    default_config_toml, Autosave, Command, ContentPipeline, DungeonConfig, DungeonSession,
    RoomView, SaveStore, SessionError, Viewport, AUTOSAVE,
};
use dungeon_model::Theme;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "cramud")]
#[command(about = "A text dungeon whose map always adds up")]
struct Args {
    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Dungeon theme (fantasy, sci-fi, horror, cyberpunk)
    #[arg(long)]
    theme: Option<Theme>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Build this many rooms before play starts
    #[arg(long)]
    pregenerate: Option<usize>,

    /// Resume a saved game by name
    #[arg(long)]
    load: Option<String>,

    /// Print the default configuration and exit
    #[arg(long)]
    dump_config: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.dump_config {
        print!("{}", default_config_toml());
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "cramud stopped");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => DungeonConfig::from_file(path)?,
        None => DungeonConfig::default(),
    };
    if let Some(theme) = args.theme {
        config.session.theme = theme;
    }
    if let Some(seed) = args.seed {
        config.session.seed = Some(seed);
    }

    let store = SaveStore::new(&config.session.save_dir);

    let mut session = match &args.load {
        Some(name) => load_game(&store, name, &config)?,
        None => {
            let seed = config.session.seed.unwrap_or_else(clock_seed);
            let content =
                ContentPipeline::from_config(&config.ollama, config.session.content_timeout());
            DungeonSession::new(config.clone(), seed, content)?
        }
    };
    if let Some(target) = args.pregenerate {
        session.pregenerate(target)?;
    }

    println!("Welcome to cramud ({} dungeon, seed {})", session.theme(), session.seed());
    println!("Type 'help' for commands.");
    println!();
    print_room(&session.look()?);

    let mut autosave = Autosave::new(config.session.autosave_every);
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            Command::Quit => break,
            Command::Help => println!("{}", HELP),
            Command::Look => print_room(&session.look()?),
            Command::Map => {
                for row in session.map(Viewport::default()) {
                    println!("{}", row.trim_end());
                }
            }
            Command::Stats => {
                let stats = session.stats();
                println!(
                    "Visited {} of {} rooms ({:.1}%), budget {}, {} moves",
                    stats.visited,
                    stats.total_committed,
                    stats.exploration_percent,
                    stats.budget,
                    stats.moves
                );
            }
            Command::Save(ref name) => {
                let name = name.as_deref().unwrap_or(AUTOSAVE);
                match store.save(name, &session.snapshot()) {
                    Ok(path) => println!("Saved to {}", path.display()),
                    Err(e) => println!("Save failed: {}", e),
                }
            }
            Command::Load(ref name) => {
                let name = name.as_deref().unwrap_or(AUTOSAVE);
                if let Err(e) = session.flush_journal() {
                    warn!(error = %e, "journal flush failed");
                }
                match load_game(&store, name, &config) {
                    Ok(loaded) => {
                        session = loaded;
                        println!("Loaded '{}'.", name);
                        print_room(&session.look()?);
                    }
                    Err(e) => println!("Load failed: {}", e),
                }
            }
            Command::Delete(ref name) => match store.delete(name) {
                Ok(()) => println!("Deleted '{}'.", name),
                Err(e) => println!("Delete failed: {}", e),
            },
            Command::Saves => match store.list() {
                Ok(names) if names.is_empty() => println!("No saves yet."),
                Ok(names) => println!("Saves: {}", names.join(", ")),
                Err(e) => println!("Cannot list saves: {}", e),
            },
            Command::Move(direction) => match session.move_to(direction) {
                Ok(_) => print_room(&session.look()?),
                Err(e) if !e.is_fatal() => println!("{}", capitalize_first(&e.to_string())),
                Err(e) => return Err(fatal(e)),
            },
        }

        // Commands run to completion, so the world is between turns here.
        if command.is_turn() && autosave.tick() {
            if let Err(e) = store.save(AUTOSAVE, &session.snapshot()) {
                warn!(error = %e, "autosave failed");
            }
        }
    }

    session.flush_journal()?;
    info!(moves = session.stats().moves, "goodbye");
    println!("Farewell, adventurer.");
    Ok(())
}

fn load_game(
    store: &SaveStore,
    name: &str,
    config: &DungeonConfig,
) -> Result<DungeonSession, Box<dyn std::error::Error>> {
    let snapshot = store.load(name)?;
    let content = ContentPipeline::from_config(&config.ollama, config.session.content_timeout());
    Ok(DungeonSession::restore(config.clone(), &snapshot, content)?)
}

/// Invariant failures end the session without saving.
fn fatal(e: SessionError) -> Box<dyn std::error::Error> {
    error!(error = %e, "aborting without saving");
    Box::new(e)
}

fn print_room(view: &RoomView) {
    println!("== {} ==", view.title);
    if let Some(art) = &view.ascii_art {
        println!("{}", art);
    }
    println!("{}", view.description);
    if !view.items.is_empty() {
        println!("You see: {}", view.items.join(", "));
    }
    for npc in &view.npcs {
        println!("{} the {} is here.", npc.name, npc.role);
    }
    println!("Exits: {}", view.exit_list());
}

fn capitalize_first(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
