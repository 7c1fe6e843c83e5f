//! Line parser for the live-coding command language.
//!
//! ```text
//! key('C')   scale("minor")   bpm(128)   stop()
//! t0.voice('kick').pulse(4)
//! t3.arp(1, 4, 5).oct(3, 5).gain(0.6)
//! ```

use super::ast::{Arg, Command, GlobalCommand, MethodCall, TrackCommand};
use super::error::ParseError;

const TRACK_HINT: &str = "expected t<n>.method(...) or key()/scale()/bpm()/stop()";

/// Parse one line of input.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    let trimmed = line.trim();
    let cleaned = trimmed.strip_suffix(';').unwrap_or(trimmed).trim();

    if cleaned.starts_with("key(") {
        return quoted_call(cleaned, "key")
            .map(|v| Command::Global(GlobalCommand::Key(v.to_string())))
            .ok_or_else(ParseError::key);
    }
    if cleaned.starts_with("scale(") {
        return quoted_call(cleaned, "scale")
            .map(|v| Command::Global(GlobalCommand::Scale(v.to_string())))
            .ok_or_else(ParseError::scale);
    }
    if cleaned.starts_with("bpm(") {
        return call_body(cleaned, "bpm")
            .filter(|body| !body.is_empty() && body.chars().all(|c| c.is_ascii_digit()))
            .and_then(|body| body.parse::<u32>().ok())
            .map(|bpm| Command::Global(GlobalCommand::Bpm(bpm)))
            .ok_or_else(ParseError::bpm);
    }
    if cleaned == "stop()" {
        return Ok(Command::Global(GlobalCommand::Stop));
    }

    parse_track(cleaned).map(Command::Track)
}

/// `name(<body>)` spanning the whole input → `body`.
fn call_body<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    input
        .strip_prefix(name)?
        .strip_prefix('(')?
        .strip_suffix(')')
}

/// `name('<value>')` or `name("<value>")` with a non-empty value.
fn quoted_call<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    let body = call_body(input, name)?;
    let quote = body.chars().next().filter(|c| *c == '\'' || *c == '"')?;
    let value = body[1..].strip_suffix(quote)?;
    (!value.is_empty()).then_some(value)
}

fn parse_track(input: &str) -> Result<TrackCommand, ParseError> {
    let rest = input
        .strip_prefix('t')
        .ok_or_else(|| ParseError::syntax(TRACK_HINT))?;
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Err(ParseError::syntax(TRACK_HINT));
    }
    let chain = rest[digits..]
        .strip_prefix('.')
        .filter(|chain| !chain.is_empty())
        .ok_or_else(|| ParseError::syntax(TRACK_HINT))?;
    let track = rest[..digits]
        .parse::<u32>()
        .map_err(|_| ParseError::syntax(format!("track id '{}' is out of range", &rest[..digits])))?;

    Ok(TrackCommand {
        track,
        methods: MethodScanner::new(chain).collect(),
    })
}

/// Finds every `word(args)` occurrence in a method chain, left to right.
/// Text between occurrences is skipped.
struct MethodScanner<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> MethodScanner<'a> {
    fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn is_word(b: u8) -> bool {
        b.is_ascii_alphanumeric() || b == b'_'
    }
}

impl Iterator for MethodScanner<'_> {
    type Item = MethodCall;

    fn next(&mut self) -> Option<MethodCall> {
        let bytes = self.src.as_bytes();
        while self.pos < bytes.len() {
            if !Self::is_word(bytes[self.pos]) {
                self.pos += 1;
                continue;
            }
            let name_start = self.pos;
            while self.pos < bytes.len() && Self::is_word(bytes[self.pos]) {
                self.pos += 1;
            }
            let name_end = self.pos;
            if bytes.get(name_end) != Some(&b'(') {
                continue;
            }
            let args_start = name_end + 1;
            match self.src[args_start..].find(')') {
                Some(len) => {
                    let args_end = args_start + len;
                    self.pos = args_end + 1;
                    return Some(MethodCall::new(
                        &self.src[name_start..name_end],
                        split_args(&self.src[args_start..args_end]),
                    ));
                }
                // Unclosed call: skip the '(' and keep scanning.
                None => self.pos = args_start,
            }
        }
        None
    }
}

/// Split an argument list on commas that are not inside quotes.
fn split_args(body: &str) -> Vec<Arg> {
    let mut args = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(q), _) if c == q => quote = None,
            (None, ',') => {
                push_arg(&mut args, &body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    push_arg(&mut args, &body[start..]);
    args
}

fn push_arg(args: &mut Vec<Arg>, raw: &str) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    let quoted = raw.len() >= 2
        && ((raw.starts_with('\'') && raw.ends_with('\''))
            || (raw.starts_with('"') && raw.ends_with('"')));
    let arg = if quoted {
        Arg::Str(raw[1..raw.len() - 1].to_string())
    } else {
        match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => Arg::Number(n),
            _ => Arg::Word(raw.to_string()),
        }
    };
    args.push(arg);
}
