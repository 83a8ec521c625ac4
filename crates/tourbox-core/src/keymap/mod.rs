//! Key vocabulary used by profile actions, plus per-platform key code tables.
//!
//! A profile names keys with short lowercase tokens (`cmd`, `shift`, `up`,
//! `page_down`, `f5`, `c`, `]`).  This module turns those tokens into a
//! [`KeyToken`], the platform-independent representation handed to the
//! keystroke-synthesis backends.  Each backend then translates the token
//! into its native code with one of the sub-module tables:
//!
//! - [`x11`]: X11 KeySyms for the XTest backend on Linux.
//! - [`macos`]: `CGKeyCode`s (ANSI layout) for the CoreGraphics backend.
//! - [`windows`]: Virtual-Key codes for the `SendInput` backend.
//!
//! # Vocabulary
//!
//! | Group      | Tokens |
//! |------------|--------|
//! | Modifiers  | `cmd`, `ctrl`, `alt`, `shift` (and `_l` / `_r` sided forms) |
//! | Navigation | `up`, `down`, `left`, `right`, `page_up`, `page_down`, `home`, `end` |
//! | Special    | `enter`, `tab`, `esc`, `space`, `backspace`, `delete` |
//! | Function   | `f1` … `f12` |
//! | Character  | any single printable character |
//!
//! Matching is case-insensitive.  A handful of aliases (`command`, `super`,
//! `win`, `control`, `option`, `opt`, `return`, `escape`, `pageup`,
//! `pagedown`, `del`) are accepted for convenience.

pub mod macos;
pub mod windows;
pub mod x11;

use std::fmt;

/// The four modifier families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ModifierKind {
    /// Command on macOS, the Windows/Super key elsewhere.
    Cmd,
    Ctrl,
    /// Option on macOS.
    Alt,
    Shift,
}

/// Which physical key of a modifier pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Side {
    Left,
    Right,
}

/// A specific modifier key.  Unsided names (`cmd`) press the left key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Modifier {
    pub kind: ModifierKind,
    pub side: Side,
}

impl Modifier {
    pub const CMD: Modifier = Modifier::left(ModifierKind::Cmd);
    pub const CTRL: Modifier = Modifier::left(ModifierKind::Ctrl);
    pub const ALT: Modifier = Modifier::left(ModifierKind::Alt);
    pub const SHIFT: Modifier = Modifier::left(ModifierKind::Shift);

    pub const fn left(kind: ModifierKind) -> Self {
        Self { kind, side: Side::Left }
    }

    pub const fn right(kind: ModifierKind) -> Self {
        Self { kind, side: Side::Right }
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = match self.kind {
            ModifierKind::Cmd => "cmd",
            ModifierKind::Ctrl => "ctrl",
            ModifierKind::Alt => "alt",
            ModifierKind::Shift => "shift",
        };
        match self.side {
            Side::Left => f.write_str(base),
            Side::Right => write!(f, "{base}_r"),
        }
    }
}

/// Non-character keys with a name in the vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Home,
    End,
    Enter,
    Tab,
    Esc,
    Space,
    Backspace,
    Delete,
    /// `F1` through `F12`; the payload is always in `1..=12`.
    Function(u8),
}

impl fmt::Display for NamedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NamedKey::Up => "up",
            NamedKey::Down => "down",
            NamedKey::Left => "left",
            NamedKey::Right => "right",
            NamedKey::PageUp => "page_up",
            NamedKey::PageDown => "page_down",
            NamedKey::Home => "home",
            NamedKey::End => "end",
            NamedKey::Enter => "enter",
            NamedKey::Tab => "tab",
            NamedKey::Esc => "esc",
            NamedKey::Space => "space",
            NamedKey::Backspace => "backspace",
            NamedKey::Delete => "delete",
            NamedKey::Function(n) => return write!(f, "f{n}"),
        };
        f.write_str(name)
    }
}

/// One key the synthesis backends can press and release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyToken {
    Modifier(Modifier),
    Named(NamedKey),
    /// A single printable character, as typed on a US layout.
    Char(char),
}

impl fmt::Display for KeyToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyToken::Modifier(m) => m.fmt(f),
            KeyToken::Named(k) => k.fmt(f),
            KeyToken::Char(c) => write!(f, "{c}"),
        }
    }
}

impl From<Modifier> for KeyToken {
    fn from(m: Modifier) -> Self {
        KeyToken::Modifier(m)
    }
}

impl From<NamedKey> for KeyToken {
    fn from(k: NamedKey) -> Self {
        KeyToken::Named(k)
    }
}

// ── Token parsing ─────────────────────────────────────────────────────────────

/// Parses a modifier token such as `cmd`, `ctrl_r`, or `option`.
pub fn parse_modifier(token: &str) -> Option<Modifier> {
    let token = token.trim().to_ascii_lowercase();
    let (base, side) = match token.strip_suffix("_l") {
        Some(base) => (base, Side::Left),
        None => match token.strip_suffix("_r") {
            Some(base) => (base, Side::Right),
            None => (token.as_str(), Side::Left),
        },
    };
    let kind = match base {
        "cmd" | "command" | "super" | "win" | "meta" => ModifierKind::Cmd,
        "ctrl" | "control" => ModifierKind::Ctrl,
        "alt" | "option" | "opt" => ModifierKind::Alt,
        "shift" => ModifierKind::Shift,
        _ => return None,
    };
    Some(Modifier { kind, side })
}

/// Parses a named (non-character) key token.
pub fn parse_named_key(token: &str) -> Option<NamedKey> {
    let token = token.trim().to_ascii_lowercase();
    let key = match token.as_str() {
        "up" => NamedKey::Up,
        "down" => NamedKey::Down,
        "left" => NamedKey::Left,
        "right" => NamedKey::Right,
        "page_up" | "pageup" => NamedKey::PageUp,
        "page_down" | "pagedown" => NamedKey::PageDown,
        "home" => NamedKey::Home,
        "end" => NamedKey::End,
        "enter" | "return" => NamedKey::Enter,
        "tab" => NamedKey::Tab,
        "esc" | "escape" => NamedKey::Esc,
        "space" => NamedKey::Space,
        "backspace" => NamedKey::Backspace,
        "delete" | "del" => NamedKey::Delete,
        other => {
            let n: u8 = other.strip_prefix('f')?.parse().ok()?;
            if !(1..=12).contains(&n) {
                return None;
            }
            NamedKey::Function(n)
        }
    };
    Some(key)
}

/// Parses the key position of a combo: a modifier, a named key, or a single
/// printable character.  ASCII letters are folded to lowercase.
pub fn parse_key(token: &str) -> Option<KeyToken> {
    if let Some(named) = parse_named_key(token) {
        return Some(KeyToken::Named(named));
    }
    if let Some(modifier) = parse_modifier(token) {
        return Some(KeyToken::Modifier(modifier));
    }
    let trimmed = token.trim();
    let mut chars = trimmed.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if !c.is_control() => Some(KeyToken::Char(c.to_ascii_lowercase())),
        _ => None,
    }
}

/// For a character produced with Shift on a US layout, returns the unshifted
/// character on the same key (`'A'` → `'a'`, `'+'` → `'='`).
pub fn us_shifted_base(c: char) -> Option<char> {
    if c.is_ascii_uppercase() {
        return Some(c.to_ascii_lowercase());
    }
    let base = match c {
        '!' => '1',
        '@' => '2',
        '#' => '3',
        '$' => '4',
        '%' => '5',
        '^' => '6',
        '&' => '7',
        '*' => '8',
        '(' => '9',
        ')' => '0',
        '_' => '-',
        '+' => '=',
        '{' => '[',
        '}' => ']',
        '|' => '\\',
        ':' => ';',
        '"' => '\'',
        '<' => ',',
        '>' => '.',
        '?' => '/',
        '~' => '`',
        _ => return None,
    };
    Some(base)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
