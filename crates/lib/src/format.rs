//! Gowon colour markup used in response text.
//!
//! The gowon IRC gateway replaces `{colour}` tokens with mIRC colour codes
//! before relaying a message, so modules only ever emit the tokens.

use std::fmt;

/// Colour tokens understood by the gowon gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colour {
    White,
    Black,
    Blue,
    Green,
    Red,
    Brown,
    Magenta,
    Orange,
    Yellow,
    LightGreen,
    Cyan,
    LightCyan,
    LightBlue,
    Pink,
    Grey,
    LightGrey,
    /// Resets colour back to the client default.
    Clear,
}

impl Colour {
    /// Token name as it appears between braces (e.g. "lgreen").
    pub fn name(self) -> &'static str {
        match self {
            Colour::White => "white",
            Colour::Black => "black",
            Colour::Blue => "blue",
            Colour::Green => "green",
            Colour::Red => "red",
            Colour::Brown => "brown",
            Colour::Magenta => "magenta",
            Colour::Orange => "orange",
            Colour::Yellow => "yellow",
            Colour::LightGreen => "lgreen",
            Colour::Cyan => "cyan",
            Colour::LightCyan => "lcyan",
            Colour::LightBlue => "lblue",
            Colour::Pink => "pink",
            Colour::Grey => "grey",
            Colour::LightGrey => "lgrey",
            Colour::Clear => "clear",
        }
    }
}

impl fmt::Display for Colour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.name())
    }
}

/// Wrap `text` in `colour` and terminate it with `{clear}`.
pub fn colourize(colour: Colour, text: &str) -> String {
    format!("{}{}{}", colour, text, Colour::Clear)
}

/// One line per colour, each carrying the same text; lines joined with `\n`.
pub fn colour_lines(colours: &[Colour], text: &str) -> String {
    colours
        .iter()
        .map(|c| colourize(*c, text))
        .collect::<Vec<_>>()
        .join("\n")
}
