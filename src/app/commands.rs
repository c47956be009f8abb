//! Inbound command grammar.
//!
//! Message bodies are free text, case-insensitive.  After normalisation
//! (ASCII uppercase, surrounding whitespace trimmed) the whole body must
//! equal one of the verbs, except for `REG`, which carries an argument:
//!
//! ```text
//! REG <digit> <phone-number>
//! ```
//!
//! A `REG` whose argument does not parse is still a `REG`; the service
//! answers it with the unchanged contact list.

use core::fmt;

use crate::text::{Identity, MessageBody, bounded, is_phone_number};

/// Recognised command verbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Status,
    /// `ARMAR`
    Arm,
    /// `DESARMAR`
    Disarm,
    Imei,
    /// `LISTAR`
    List,
    /// `REG`
    Register,
    /// `AJUDA`
    Help,
    Restart,
}

impl Verb {
    /// Keyword as it appears on the wire.
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Status => "STATUS",
            Self::Arm => "ARMAR",
            Self::Disarm => "DESARMAR",
            Self::Imei => "IMEI",
            Self::List => "LISTAR",
            Self::Register => "REG",
            Self::Help => "AJUDA",
            Self::Restart => "RESTART",
        }
    }

    pub const ALL: [Verb; 8] = [
        Self::Status,
        Self::Arm,
        Self::Disarm,
        Self::Imei,
        Self::List,
        Self::Register,
        Self::Help,
        Self::Restart,
    ];
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parsed inbound command.  Lives only for one dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub verb: Verb,
    /// Normalised text following the verb, if any (only `REG` has one).
    pub argument: Option<MessageBody>,
    pub sender: Identity,
}

/// Validated `REG` argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub index: usize,
    pub number: Identity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// Body was empty after trimming.
    Empty,
    /// Body does not match any verb.
    Unknown,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty message"),
            Self::Unknown => write!(f, "unknown command"),
        }
    }
}

/// Uppercase and trim a message body.
pub fn normalize(text: &str) -> MessageBody {
    let mut out = MessageBody::new();
    for c in text.trim().chars() {
        if out.push(c.to_ascii_uppercase()).is_err() {
            break;
        }
    }
    out
}

/// Parse a raw message body from `sender`.
pub fn parse(text: &str, sender: &str) -> Result<Command, ParseError> {
    let normalized = normalize(text);
    if normalized.is_empty() {
        return Err(ParseError::Empty);
    }

    let (verb, argument) = split_verb(&normalized)?;
    Ok(Command {
        verb,
        argument: argument.map(bounded),
        sender: bounded(sender),
    })
}

fn split_verb(normalized: &str) -> Result<(Verb, Option<&str>), ParseError> {
    if let Some(rest) = normalized.strip_prefix(Verb::Register.keyword()) {
        if rest.is_empty() {
            return Ok((Verb::Register, None));
        }
        if rest.starts_with(char::is_whitespace) {
            return Ok((Verb::Register, Some(rest.trim())));
        }
    }

    Verb::ALL
        .iter()
        .copied()
        .filter(|v| *v != Verb::Register)
        .find(|v| v.keyword() == normalized)
        .map(|v| (v, None))
        .ok_or(ParseError::Unknown)
}

/// Interpret a `REG` argument: the trailing token is the number, the token
/// before it a single decimal digit.
pub fn parse_registration(argument: &str) -> Option<Registration> {
    let mut tokens = argument.split_whitespace().rev();
    let number = tokens.next()?;
    let index = tokens.next()?;

    let mut digits = index.chars();
    let index = digits.next()?.to_digit(10)?;
    if digits.next().is_some() || !is_phone_number(number) {
        return None;
    }

    Some(Registration {
        index: index as usize,
        number: bounded(number),
    })
}

impl Command {
    /// The `REG` argument, if this is a well-formed `REG`.
    pub fn registration(&self) -> Option<Registration> {
        match self.verb {
            Verb::Register => self.argument.as_deref().and_then(parse_registration),
            _ => None,
        }
    }
}
