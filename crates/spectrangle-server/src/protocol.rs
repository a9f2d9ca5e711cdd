//! Text protocol messages for Spectrangle multiplayer.
//!
//! Every message is one line of space-separated words. Tiles travel in their
//! four-character form (see [`spectrangle_core::Tile::decode`]).

use spectrangle_core::{Move, Tile, TileError};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Player counts a client may ask for
pub const PLAYER_COUNTS: std::ops::RangeInclusive<u8> = 2..=4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Empty line")]
    Empty,

    #[error("Unknown command {0:?}")]
    UnknownCommand(String),

    #[error("Missing argument for {0}")]
    MissingArgument(&'static str),

    #[error("Unexpected argument {0:?}")]
    UnexpectedArgument(String),

    #[error("Invalid tile: {0}")]
    InvalidTile(#[from] TileError),

    #[error("Invalid number {0:?}")]
    InvalidNumber(String),
}

/// Messages sent from client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientCommand {
    /// Introduce yourself
    Connect { name: String },

    /// Ask for a match with this many players
    Request { players: u8 },

    /// Place a tile, in the given orientation, on a board index
    Place(Move),

    /// Pass without placing
    Skip,

    /// Swap a tile from the hand for a fresh one
    Exchange { tile: Tile },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Name accepted
    Welcome,

    /// Message not expected in the current state, or malformed
    InvalidCommand,

    /// Name already taken
    InvalidName,

    /// Placement or exchange rejected
    InvalidMove,

    /// Players queued for the same player count
    Waiting { names: Vec<String> },

    /// A match started with these players
    Start { names: Vec<String> },

    /// Turn order of the match
    Order { names: Vec<String> },

    /// A tile was placed
    Move {
        name: String,
        tile: Tile,
        index: usize,
        points: u32,
    },

    /// A player passed
    Skip { name: String },

    /// A player exchanged a tile; `None` when the bag ran dry
    Replace {
        name: String,
        old: Tile,
        new: Option<Tile>,
    },

    /// A player disconnected and the match was abandoned
    PlayerLeft { name: String },

    /// Final scores in turn order, after hand deductions
    End { scores: Vec<(String, i32)> },

    /// Highest final score; more than one name means a tie
    Winner { names: Vec<String> },
}

fn expect_end<'a>(mut words: impl Iterator<Item = &'a str>) -> Result<(), ProtocolError> {
    match words.next() {
        Some(extra) => Err(ProtocolError::UnexpectedArgument(extra.to_string())),
        None => Ok(()),
    }
}

impl FromStr for ClientCommand {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let keyword = words.next().ok_or(ProtocolError::Empty)?;

        let command = match keyword {
            "connect" => {
                let name = words.next().ok_or(ProtocolError::MissingArgument("connect"))?;
                ClientCommand::Connect {
                    name: name.to_string(),
                }
            }
            "request" => {
                let count = words.next().ok_or(ProtocolError::MissingArgument("request"))?;
                let players = count
                    .parse::<u8>()
                    .ok()
                    .filter(|n| PLAYER_COUNTS.contains(n))
                    .ok_or_else(|| ProtocolError::InvalidNumber(count.to_string()))?;
                ClientCommand::Request { players }
            }
            "place" => {
                let tile = words.next().ok_or(ProtocolError::MissingArgument("place"))?;
                let tile = Tile::decode(tile)?;
                match words.next() {
                    Some("on") => {}
                    Some(other) => return Err(ProtocolError::UnexpectedArgument(other.to_string())),
                    None => return Err(ProtocolError::MissingArgument("place")),
                }
                let index = words.next().ok_or(ProtocolError::MissingArgument("place"))?;
                let index = index
                    .parse::<usize>()
                    .map_err(|_| ProtocolError::InvalidNumber(index.to_string()))?;
                ClientCommand::Place(Move::new(tile, index))
            }
            "skip" => ClientCommand::Skip,
            "exchange" => {
                let tile = words.next().ok_or(ProtocolError::MissingArgument("exchange"))?;
                ClientCommand::Exchange {
                    tile: Tile::decode(tile)?,
                }
            }
            other => return Err(ProtocolError::UnknownCommand(other.to_string())),
        };

        expect_end(words)?;
        Ok(command)
    }
}

impl fmt::Display for ClientCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientCommand::Connect { name } => write!(f, "connect {}", name),
            ClientCommand::Request { players } => write!(f, "request {}", players),
            ClientCommand::Place(mv) => write!(f, "place {} on {}", mv.tile, mv.index),
            ClientCommand::Skip => write!(f, "skip"),
            ClientCommand::Exchange { tile } => write!(f, "exchange {}", tile),
        }
    }
}

/// Keyword followed by each name with a leading space
fn write_names(f: &mut fmt::Formatter<'_>, keyword: &str, names: &[String]) -> fmt::Result {
    f.write_str(keyword)?;
    for name in names {
        write!(f, " {}", name)?;
    }
    Ok(())
}

impl fmt::Display for ServerMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerMessage::Welcome => f.write_str("welcome"),
            ServerMessage::InvalidCommand => f.write_str("invalidCommand"),
            ServerMessage::InvalidName => f.write_str("invalidName"),
            ServerMessage::InvalidMove => f.write_str("invalidMove"),
            ServerMessage::Waiting { names } => write_names(f, "waiting", names),
            ServerMessage::Start { names } => write_names(f, "start with", names),
            ServerMessage::Order { names } => write_names(f, "order", names),
            ServerMessage::Move {
                name,
                tile,
                index,
                points,
            } => write!(f, "move {} {} {} {}", name, tile, index, points),
            ServerMessage::Skip { name } => write!(f, "skip {}", name),
            ServerMessage::Replace { name, old, new } => match new {
                Some(new) => write!(f, "replace {} {} with {}", name, old, new),
                None => write!(f, "replace {} {} with null", name, old),
            },
            ServerMessage::PlayerLeft { name } => write!(f, "player {} left", name),
            ServerMessage::End { scores } => {
                f.write_str("end")?;
                for (name, score) in scores {
                    write!(f, " {} {}", name, score)?;
                }
                Ok(())
            }
            ServerMessage::Winner { names } => write_names(f, "winner", names),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            "connect alice".parse::<ClientCommand>(),
            Ok(ClientCommand::Connect {
                name: "alice".into()
            })
        );
        assert_eq!(
            "request 3".parse::<ClientCommand>(),
            Ok(ClientCommand::Request { players: 3 })
        );
        assert_eq!(
            "place RGB3 on 12".parse::<ClientCommand>(),
            Ok(ClientCommand::Place(Move::new(
                Tile::decode("RGB3").unwrap(),
                12
            )))
        );
        assert_eq!("skip".parse::<ClientCommand>(), Ok(ClientCommand::Skip));
        assert_eq!(
            "exchange WWW1".parse::<ClientCommand>(),
            Ok(ClientCommand::Exchange {
                tile: Tile::decode("WWW1").unwrap()
            })
        );
    }

    #[test]
    fn test_parse_rejects_malformed() {
        let bad = [
            "",
            "hello",
            "connect",
            "connect alice bob",
            "request",
            "request 1",
            "request 5",
            "request two",
            "place RGB3",
            "place RGB3 at 2",
            "place RGB3 on",
            "place RGB3 on -1",
            "place RGX3 on 2",
            "place RGB on 2",
            "skip now",
            "exchange",
            "exchange RGB0",
            "Connect alice",
        ];
        for line in bad {
            assert!(line.parse::<ClientCommand>().is_err(), "{:?} parsed", line);
        }
        assert!(matches!(
            "exchange RGB0".parse::<ClientCommand>(),
            Err(ProtocolError::InvalidTile(_))
        ));
    }

    #[test]
    fn test_command_display_parses_back() {
        let line = "place YBP3 on 7";
        assert_eq!(line.parse::<ClientCommand>().unwrap().to_string(), line);
    }

    #[test]
    fn test_format_messages() {
        let tile = Tile::decode("RGB3").unwrap();
        let cases = [
            (ServerMessage::Welcome, "welcome"),
            (ServerMessage::InvalidCommand, "invalidCommand"),
            (ServerMessage::InvalidName, "invalidName"),
            (ServerMessage::InvalidMove, "invalidMove"),
            (ServerMessage::Waiting { names: vec![] }, "waiting"),
            (
                ServerMessage::Waiting {
                    names: names(&["alice", "bob"]),
                },
                "waiting alice bob",
            ),
            (
                ServerMessage::Start {
                    names: names(&["alice", "bob"]),
                },
                "start with alice bob",
            ),
            (ServerMessage::Start { names: vec![] }, "start with"),
            (
                ServerMessage::Order {
                    names: names(&["bob", "alice"]),
                },
                "order bob alice",
            ),
            (
                ServerMessage::Move {
                    name: "bob".into(),
                    tile,
                    index: 10,
                    points: 12,
                },
                "move bob RGB3 10 12",
            ),
            (ServerMessage::Skip { name: "bob".into() }, "skip bob"),
            (
                ServerMessage::Replace {
                    name: "bob".into(),
                    old: tile,
                    new: None,
                },
                "replace bob RGB3 with null",
            ),
            (
                ServerMessage::Replace {
                    name: "bob".into(),
                    old: tile,
                    new: Some(Tile::decode("WWW1").unwrap()),
                },
                "replace bob RGB3 with WWW1",
            ),
            (
                ServerMessage::PlayerLeft { name: "bob".into() },
                "player bob left",
            ),
            (
                ServerMessage::End {
                    scores: vec![("bob".into(), 14), ("alice".into(), -3)],
                },
                "end bob 14 alice -3",
            ),
            (
                ServerMessage::Winner {
                    names: names(&["bob"]),
                },
                "winner bob",
            ),
        ];

        for (message, expected) in cases {
            assert_eq!(message.to_string(), expected);
        }
    }
}
