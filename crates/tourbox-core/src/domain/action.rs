//! Action grammar: the strings a profile binds to a control.
//!
//! # Grammar (for beginners)
//!
//! Every atomic action is a string in one of four forms:
//!
//! | Form              | Example              | Effect |
//! |-------------------|----------------------|--------|
//! | `type:<text>`     | `type:/commit`       | Types the literal text after the prefix. |
//! | `shell:<command>` | `shell:open -a Term` | Starts the command through the system shell. |
//! | `none`            | `none`               | Does nothing (case-insensitive). |
//! | key combination   | `cmd+shift+z`        | Presses modifiers, taps the key, releases modifiers. |
//!
//! A key combination is a list of `+`-separated tokens.  Every token but the
//! last must be a modifier; the last is the key (see [`crate::keymap`]).  A
//! trailing `++` names the `+` key itself (`shift++`).
//!
//! Strings are parsed exactly once, when the profile is loaded.  A string that
//! does not parse is kept in its [`ActionSequence`] as an [`UnresolvedAction`]
//! step so the failure surfaces when the control is actually used, without
//! preventing the rest of the profile from loading.

use std::fmt;

use thiserror::Error;

use crate::keymap::{parse_key, parse_modifier, KeyToken, Modifier};

/// Prefix of a literal-text action.
pub const TYPE_PREFIX: &str = "type:";

/// Prefix of a shell-command action.
pub const SHELL_PREFIX: &str = "shell:";

/// One parsed, executable action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionSpec {
    /// Press `modifiers` in order, tap `key`, release `modifiers` in reverse.
    KeyCombo { modifiers: Vec<Modifier>, key: KeyToken },
    /// Type the text character by character.
    TypeText(String),
    /// Launch the command detached through the system shell.
    ShellCommand(String),
    NoOp,
}

impl ActionSpec {
    /// Convenience constructor for combos in code and tests.
    pub fn combo(modifiers: &[Modifier], key: impl Into<KeyToken>) -> Self {
        ActionSpec::KeyCombo { modifiers: modifiers.to_vec(), key: key.into() }
    }
}

impl fmt::Display for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSpec::KeyCombo { modifiers, key } => {
                for m in modifiers {
                    write!(f, "{m}+")?;
                }
                if *key == KeyToken::Char('+') && !modifiers.is_empty() {
                    // `cmd+` followed by `+` is written `cmd++`.
                    f.write_str("+")
                } else {
                    write!(f, "{key}")
                }
            }
            ActionSpec::TypeText(text) => write!(f, "{TYPE_PREFIX}{text}"),
            ActionSpec::ShellCommand(cmd) => write!(f, "{SHELL_PREFIX}{cmd}"),
            ActionSpec::NoOp => f.write_str("none"),
        }
    }
}

/// Why an action string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionParseError {
    #[error("action is empty")]
    Empty,

    #[error("shell action has no command")]
    EmptyShellCommand,

    #[error("\"{0}\" is not a modifier (expected cmd, ctrl, alt or shift)")]
    UnknownModifier(String),

    #[error("unrecognized key \"{0}\"")]
    UnknownKey(String),

    #[error("combination has an empty token")]
    EmptyToken,
}

/// An action string kept verbatim together with the reason it did not parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve action \"{raw}\": {reason}")]
pub struct UnresolvedAction {
    pub raw: String,
    pub reason: ActionParseError,
}

/// One element of a sequence: a parsed action or a deferred parse failure.
pub type ActionStep = Result<ActionSpec, UnresolvedAction>;

/// Parses a single action string.
///
/// # Examples
///
/// ```rust
/// use tourbox_core::domain::action::{parse_action, ActionSpec};
/// use tourbox_core::keymap::{KeyToken, Modifier};
///
/// assert_eq!(
///     parse_action("cmd+c").unwrap(),
///     ActionSpec::combo(&[Modifier::CMD], KeyToken::Char('c')),
/// );
/// assert_eq!(parse_action("NONE").unwrap(), ActionSpec::NoOp);
/// assert!(parse_action("bogus_token").is_err());
/// ```
pub fn parse_action(raw: &str) -> Result<ActionSpec, ActionParseError> {
    if let Some(text) = raw.strip_prefix(TYPE_PREFIX) {
        return Ok(ActionSpec::TypeText(text.to_string()));
    }
    if let Some(command) = raw.strip_prefix(SHELL_PREFIX) {
        let command = command.trim();
        if command.is_empty() {
            return Err(ActionParseError::EmptyShellCommand);
        }
        return Ok(ActionSpec::ShellCommand(command.to_string()));
    }

    let combo = raw.trim();
    if combo.is_empty() {
        return Err(ActionParseError::Empty);
    }
    if combo.eq_ignore_ascii_case("none") {
        return Ok(ActionSpec::NoOp);
    }
    parse_combo(combo)
}

fn parse_combo(combo: &str) -> Result<ActionSpec, ActionParseError> {
    // `head` is `None` only when the combo has no `+` separator at all, so
    // an empty leading token (`"+c"`) is still checked below.
    let (head, key_raw) = if combo == "+" || combo == "++" {
        (None, "+")
    } else if let Some(head) = combo.strip_suffix("++") {
        (Some(head), "+")
    } else {
        match combo.rsplit_once('+') {
            Some((head, key)) => (Some(head), key),
            None => (None, combo),
        }
    };

    let mut modifiers = Vec::new();
    if let Some(head) = head {
        for token in head.split('+') {
            let token = token.trim();
            if token.is_empty() {
                return Err(ActionParseError::EmptyToken);
            }
            let modifier =
                parse_modifier(token).ok_or_else(|| ActionParseError::UnknownModifier(token.to_string()))?;
            modifiers.push(modifier);
        }
    }

    if key_raw.trim().is_empty() {
        return Err(ActionParseError::EmptyToken);
    }
    let key = parse_key(key_raw).ok_or_else(|| ActionParseError::UnknownKey(key_raw.trim().to_string()))?;
    Ok(ActionSpec::KeyCombo { modifiers, key })
}

/// Parses one string into a step, keeping the raw text on failure.
pub fn parse_step(raw: &str) -> ActionStep {
    parse_action(raw).map_err(|reason| UnresolvedAction { raw: raw.to_string(), reason })
}

// ── ActionSequence ────────────────────────────────────────────────────────────

static EMPTY_SEQUENCE: ActionSequence = ActionSequence::EMPTY;

/// An ordered list of actions, executed strictly in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSequence {
    steps: Vec<ActionStep>,
}

impl ActionSequence {
    /// The sequence that does nothing.  Unmapped, disabled, and released
    /// controls all resolve to this.
    pub const EMPTY: ActionSequence = ActionSequence { steps: Vec::new() };

    /// A `'static` reference to [`ActionSequence::EMPTY`].
    pub fn empty() -> &'static ActionSequence {
        &EMPTY_SEQUENCE
    }

    /// Parses every string in order.  Parse failures become unresolved steps.
    pub fn parse<S: AsRef<str>>(raw: &[S]) -> Self {
        Self { steps: raw.iter().map(|s| parse_step(s.as_ref())).collect() }
    }

    pub fn from_specs(specs: Vec<ActionSpec>) -> Self {
        Self { steps: specs.into_iter().map(Ok).collect() }
    }

    pub fn steps(&self) -> &[ActionStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps that failed to parse.
    pub fn unresolved(&self) -> impl Iterator<Item = &UnresolvedAction> {
        self.steps.iter().filter_map(|step| step.as_ref().err())
    }
}

impl fmt::Display for ActionSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match step {
                Ok(spec) => write!(f, "{spec}")?,
                Err(unresolved) => write!(f, "{}?", unresolved.raw)?,
            }
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keymap::{ModifierKind, NamedKey};

    #[test]
    fn test_parse_simple_combo() {
        // Act
        let spec = parse_action("cmd+c").unwrap();

        // Assert
        assert_eq!(spec, ActionSpec::combo(&[Modifier::CMD], KeyToken::Char('c')));
    }

    #[test]
    fn test_parse_multi_modifier_combo_keeps_order() {
        let spec = parse_action("cmd+shift+z").unwrap();
        assert_eq!(spec, ActionSpec::combo(&[Modifier::CMD, Modifier::SHIFT], KeyToken::Char('z')));
    }

    #[test]
    fn test_parse_combo_is_case_insensitive_and_trims() {
        let spec = parse_action(" Ctrl + Shift + Page_Down ").unwrap();
        assert_eq!(spec, ActionSpec::combo(&[Modifier::CTRL, Modifier::SHIFT], NamedKey::PageDown));
    }

    #[test]
    fn test_parse_bare_named_key() {
        assert_eq!(parse_action("up").unwrap(), ActionSpec::combo(&[], NamedKey::Up));
        assert_eq!(parse_action("f5").unwrap(), ActionSpec::combo(&[], NamedKey::Function(5)));
    }

    #[test]
    fn test_parse_punctuation_keys() {
        assert_eq!(
            parse_action("cmd+shift+]").unwrap(),
            ActionSpec::combo(&[Modifier::CMD, Modifier::SHIFT], KeyToken::Char(']'))
        );
        assert_eq!(parse_action("cmd+-").unwrap(), ActionSpec::combo(&[Modifier::CMD], KeyToken::Char('-')));
    }

    #[test]
    fn test_parse_trailing_double_plus_is_plus_key() {
        assert_eq!(parse_action("cmd++").unwrap(), ActionSpec::combo(&[Modifier::CMD], KeyToken::Char('+')));
        assert_eq!(parse_action("+").unwrap(), ActionSpec::combo(&[], KeyToken::Char('+')));
    }

    #[test]
    fn test_parse_sided_modifier() {
        let spec = parse_action("alt_r+tab").unwrap();
        assert_eq!(spec, ActionSpec::combo(&[Modifier::right(ModifierKind::Alt)], NamedKey::Tab));
    }

    #[test]
    fn test_parse_type_keeps_text_verbatim() {
        assert_eq!(parse_action("type:/commit").unwrap(), ActionSpec::TypeText("/commit".into()));
        assert_eq!(parse_action("type: Hi + Bye").unwrap(), ActionSpec::TypeText(" Hi + Bye".into()));
        assert_eq!(parse_action("type:").unwrap(), ActionSpec::TypeText(String::new()));
    }

    #[test]
    fn test_parse_shell_command() {
        assert_eq!(
            parse_action("shell:open -a Terminal").unwrap(),
            ActionSpec::ShellCommand("open -a Terminal".into())
        );
        assert_eq!(parse_action("shell:   "), Err(ActionParseError::EmptyShellCommand));
    }

    #[test]
    fn test_parse_none_is_case_insensitive() {
        assert_eq!(parse_action("none").unwrap(), ActionSpec::NoOp);
        assert_eq!(parse_action("None").unwrap(), ActionSpec::NoOp);
    }

    #[test]
    fn test_parse_rejects_unknown_tokens() {
        assert_eq!(parse_action("bogus_token"), Err(ActionParseError::UnknownKey("bogus_token".into())));
        assert_eq!(parse_action("hyper+c"), Err(ActionParseError::UnknownModifier("hyper".into())));
        assert_eq!(parse_action("c+v"), Err(ActionParseError::UnknownModifier("c".into())));
        assert_eq!(parse_action("cmd+"), Err(ActionParseError::EmptyToken));
        assert_eq!(parse_action("+c"), Err(ActionParseError::EmptyToken));
        assert_eq!(parse_action(" + c"), Err(ActionParseError::EmptyToken));
        assert_eq!(parse_action("cmd++c"), Err(ActionParseError::EmptyToken));
        assert_eq!(parse_action(""), Err(ActionParseError::Empty));
    }

    #[test]
    fn test_sequence_keeps_unresolved_steps_in_place() {
        // Arrange
        let raw = ["bogus_token", "cmd+c"];

        // Act
        let seq = ActionSequence::parse(&raw);

        // Assert
        assert_eq!(seq.len(), 2);
        assert!(seq.steps()[0].is_err());
        assert_eq!(seq.steps()[1], Ok(ActionSpec::combo(&[Modifier::CMD], KeyToken::Char('c'))));
        assert_eq!(seq.unresolved().count(), 1);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for raw in ["cmd+shift+z", "type:/commit", "shell:echo hi", "none", "cmd++", "page_down"] {
            let spec = parse_action(raw).unwrap();
            assert_eq!(parse_action(&spec.to_string()).unwrap(), spec, "{raw}");
        }
    }

    #[test]
    fn test_empty_sequence_constant() {
        assert!(ActionSequence::EMPTY.is_empty());
        assert_eq!(ActionSequence::EMPTY, ActionSequence::default());
        assert!(ActionSequence::empty().is_empty());
    }
}
