//! Player commands read from the terminal.

use std::str::FromStr;

use dungeon_model::Direction;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move(Direction),
    Look,
    Map,
    Stats,
    /// Save under the given name, or the default slot.
    Save(Option<String>),
    /// Resume a save, or the default slot.
    Load(Option<String>),
    Delete(String),
    /// List saves.
    Saves,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("type a command (try 'help')")]
    Empty,
    #[error("unknown command '{0}' (try 'help')")]
    Unknown(String),
    #[error("go where? {0}")]
    BadDirection(String),
    #[error("{0} which save?")]
    MissingName(&'static str),
}

impl Command {
    /// Whether the command advances the game. Save management does not.
    pub fn is_turn(&self) -> bool {
        !matches!(
            self,
            Command::Save(_) | Command::Load(_) | Command::Delete(_) | Command::Saves
        )
    }
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
        let rest: Vec<&str> = words.collect();

        match verb.as_str() {
            "go" | "move" | "walk" => {
                let target = rest.first().copied().unwrap_or("");
                target
                    .parse()
                    .map(Command::Move)
                    .map_err(|e: dungeon_model::ParseDirectionError| {
                        CommandError::BadDirection(e.to_string())
                    })
            }
            "look" | "l" => Ok(Command::Look),
            "map" | "m" => Ok(Command::Map),
            "stats" => Ok(Command::Stats),
            "save" => Ok(Command::Save(rest.first().map(|s| s.to_string()))),
            "load" => Ok(Command::Load(rest.first().map(|s| s.to_string()))),
            "delete" => rest
                .first()
                .map(|s| Command::Delete(s.to_string()))
                .ok_or(CommandError::MissingName("delete")),
            "saves" => Ok(Command::Saves),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => other
                .parse()
                .map(Command::Move)
                .map_err(|_| CommandError::Unknown(other.to_string())),
        }
    }
}

pub const HELP: &str = "\
Commands:
  n, s, e, w, u, d   move (or: go <direction>)
  look               describe the room
  map                show explored rooms
  stats              exploration progress
  save [name]        save the game
  load [name]        resume a save
  delete <name>      remove a save
  saves              list saves
  quit               leave the dungeon";
