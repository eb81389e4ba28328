//! # Commands
//!
//! The script snippets the loop sends to the evaluator. Every snippet is built
//! fresh from a `Command` value at dispatch time and never reused.
//!
//! All of them assume the bootstrap library bound a value named [`BOARD`]
//! with `update(dir)`, `render()` and `reset()` methods.

use std::fmt;

use crate::input::Key;

/// Name of the script binding every command operates on.
pub const BOARD: &str = "board";

/// A compass direction handed to the script's `update` method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
    ];

    /// Arrow keys map to exactly one direction; nothing else maps at all.
    pub fn from_key(key: &Key) -> Option<Self> {
        match key {
            Key::Up => Some(Direction::North),
            Key::Down => Some(Direction::South),
            Key::Right => Some(Direction::East),
            Key::Left => Some(Direction::West),
            _ => None,
        }
    }

    /// The one-letter code the script understands.
    pub fn code(self) -> &'static str {
        match self {
            Direction::North => "n",
            Direction::South => "s",
            Direction::East => "e",
            Direction::West => "w",
        }
    }
}

/// Something the loop wants the script to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// First frame after bootstrap.
    InitialRender,
    /// Slide the board, then redraw it.
    Move(Direction),
    /// Start over, then redraw.
    Reset,
}

impl Command {
    /// Builds the script source for this command.
    pub fn source(&self) -> String {
        match self {
            Command::InitialRender => format!("{BOARD}.render();"),
            Command::Move(dir) => {
                format!("{BOARD}.update(\"{}\"); {BOARD}.render();", dir.code())
            }
            Command::Reset => format!("{BOARD}.reset(); {BOARD}.render();"),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::InitialRender => write!(f, "initial render"),
            Command::Move(dir) => write!(f, "move {}", dir.code()),
            Command::Reset => write!(f, "reset"),
        }
    }
}
