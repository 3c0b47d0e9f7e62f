//! ``src/controller/keymap.rs``
//!
//! # Key binding table
//!
//! An immutable list of `(modifiers, key) -> command` bindings built once at
//! startup, either from the built-in defaults or from the `keys` section of
//! the config file. Dispatch returns every matching binding in table order;
//! several bindings on one chord all fire.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::trace;

use crate::config::CommandTemplates;
use crate::controller::actions::{Command, DEFAULT_DIR_MODE, Motion};
use crate::error::AppError;

/// Modifiers that take part in matching. Lock state lives outside
/// `KeyModifiers` in crossterm; `HYPER` and `META` are treated as reserved.
pub const BINDABLE_MODIFIERS: KeyModifiers = KeyModifiers::SHIFT
    .union(KeyModifiers::CONTROL)
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SUPER);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyBinding {
    pub modifiers: KeyModifiers,
    pub key: KeyCode,
    pub command: Command,
}

impl KeyBinding {
    #[must_use]
    pub fn new(modifiers: KeyModifiers, key: KeyCode, command: Command) -> Self {
        Self {
            modifiers: modifiers & BINDABLE_MODIFIERS,
            key: canonical_key(key),
            command,
        }
    }

    #[must_use]
    pub fn matches(&self, modifiers: KeyModifiers, key: KeyCode) -> bool {
        self.key == canonical_key(key) && self.modifiers == (modifiers & BINDABLE_MODIFIERS)
    }
}

/// One `[[keys]]` entry of the config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingSpec {
    /// Chord such as `"ctrl+shift+j"`, `"f5"` or `"backspace"`.
    pub key: String,

    #[serde(flatten)]
    pub command: Command,
}

#[derive(Debug, Clone, Default)]
pub struct Keymap {
    bindings: Vec<KeyBinding>,
}

impl Keymap {
    #[must_use]
    pub const fn new(bindings: Vec<KeyBinding>) -> Self {
        Self { bindings }
    }

    /// Built-in table. `F4` launches `templates.terminal` in the current
    /// directory.
    ///
    /// `Ctrl+.` and `Ctrl+digit` only arrive from terminals that speak the
    /// keyboard enhancement protocol, so `Alt+.` and `Alt+digit` are bound to
    /// the same commands.
    #[must_use]
    pub fn defaults(templates: &CommandTemplates) -> Self {
        let ctrl: KeyModifiers = KeyModifiers::CONTROL;
        let ctrl_shift: KeyModifiers = KeyModifiers::CONTROL | KeyModifiers::SHIFT;
        let alt: KeyModifiers = KeyModifiers::ALT;
        let none: KeyModifiers = KeyModifiers::NONE;
        let mv = |motion: Motion| Command::MoveCursor { motion };
        let up_one = || Command::SetPath {
            path: "..".to_string(),
        };

        let bindings: Vec<KeyBinding> = vec![
            // Movement
            KeyBinding::new(ctrl, KeyCode::Char('j'), mv(Motion::Down)),
            KeyBinding::new(ctrl, KeyCode::Char('k'), mv(Motion::Up)),
            KeyBinding::new(ctrl_shift, KeyCode::Char('j'), mv(Motion::PageDown)),
            KeyBinding::new(ctrl_shift, KeyCode::Char('k'), mv(Motion::PageUp)),
            KeyBinding::new(ctrl, KeyCode::Char('g'), mv(Motion::Home)),
            KeyBinding::new(ctrl_shift, KeyCode::Char('g'), mv(Motion::End)),
            KeyBinding::new(none, KeyCode::Down, mv(Motion::Down)),
            KeyBinding::new(none, KeyCode::Up, mv(Motion::Up)),
            KeyBinding::new(none, KeyCode::PageDown, mv(Motion::PageDown)),
            KeyBinding::new(none, KeyCode::PageUp, mv(Motion::PageUp)),
            KeyBinding::new(none, KeyCode::Home, mv(Motion::Home)),
            KeyBinding::new(none, KeyCode::End, mv(Motion::End)),
            // Sessions
            KeyBinding::new(ctrl, KeyCode::Char('n'), Command::NewSession),
            KeyBinding::new(ctrl, KeyCode::Char('w'), Command::CloseSession),
            KeyBinding::new(none, KeyCode::Tab, Command::CycleSession),
            KeyBinding::new(ctrl, KeyCode::Char('q'), Command::Quit),
            // Dotfiles
            KeyBinding::new(ctrl, KeyCode::Char('.'), Command::ToggleDotfiles),
            KeyBinding::new(alt, KeyCode::Char('.'), Command::ToggleDotfiles),
            // Up one level
            KeyBinding::new(ctrl, KeyCode::Char('h'), up_one()),
            KeyBinding::new(none, KeyCode::Backspace, up_one()),
            // Terminal
            KeyBinding::new(
                none,
                KeyCode::F(4),
                Command::DirExec {
                    argv: templates.terminal.clone(),
                },
            ),
            // Make directory
            KeyBinding::new(
                none,
                KeyCode::F(7),
                Command::MakeDirectory {
                    mode: DEFAULT_DIR_MODE,
                },
            ),
            // Path prompt
            KeyBinding::new(ctrl, KeyCode::Char('l'), Command::PromptPath),
            // Reload
            KeyBinding::new(ctrl, KeyCode::Char('r'), Command::Reload),
            KeyBinding::new(none, KeyCode::F(5), Command::Reload),
            // Bookmarks
            KeyBinding::new(ctrl, KeyCode::Char('1'), Command::Bookmark { index: 0 }),
            KeyBinding::new(ctrl, KeyCode::Char('2'), Command::Bookmark { index: 1 }),
            KeyBinding::new(ctrl, KeyCode::Char('3'), Command::Bookmark { index: 2 }),
            KeyBinding::new(alt, KeyCode::Char('1'), Command::Bookmark { index: 0 }),
            KeyBinding::new(alt, KeyCode::Char('2'), Command::Bookmark { index: 1 }),
            KeyBinding::new(alt, KeyCode::Char('3'), Command::Bookmark { index: 2 }),
            // Selection
            KeyBinding::new(none, KeyCode::Enter, Command::Activate),
            KeyBinding::new(none, KeyCode::Char(' '), Command::ToggleMark),
            KeyBinding::new(none, KeyCode::Delete, Command::Remove),
        ];

        Self::new(bindings)
    }

    /// Build a table from config entries, keeping their order.
    ///
    /// # Errors
    /// [`AppError::InvalidInput`] naming the first chord that does not parse.
    pub fn from_specs(specs: &[BindingSpec]) -> Result<Self, AppError> {
        let bindings: Vec<KeyBinding> = specs
            .iter()
            .map(|spec| {
                let (modifiers, key) = parse_key_spec(&spec.key)?;
                Ok(KeyBinding::new(modifiers, key, spec.command.clone()))
            })
            .collect::<Result<_, AppError>>()?;

        Ok(Self::new(bindings))
    }

    #[must_use]
    pub fn bindings(&self) -> &[KeyBinding] {
        &self.bindings
    }

    /// Every command bound to the chord, in table order.
    #[must_use]
    pub fn dispatch(&self, modifiers: KeyModifiers, key: KeyCode) -> SmallVec<[&Command; 2]> {
        let matched: SmallVec<[&Command; 2]> = self
            .bindings
            .iter()
            .filter(|binding| binding.matches(modifiers, key))
            .map(|binding| &binding.command)
            .collect();

        trace!(
            marker = "KEY_DISPATCH",
            ?key,
            ?modifiers,
            matched = matched.len(),
            "Key dispatched"
        );

        matched
    }

    #[must_use]
    pub fn dispatch_event(&self, event: &KeyEvent) -> SmallVec<[&Command; 2]> {
        self.dispatch(event.modifiers, event.code)
    }
}

/// Letters compare lower-cased; everything else as-is.
#[must_use]
pub fn canonical_key(key: KeyCode) -> KeyCode {
    match key {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    }
}

/// Parse a chord like `"ctrl+shift+j"`.
///
/// # Errors
/// [`AppError::InvalidInput`] for empty parts, unknown modifiers or key names.
pub fn parse_key_spec(spec: &str) -> Result<(KeyModifiers, KeyCode), AppError> {
    let invalid = |message: String| AppError::invalid_input("key", message);

    let mut parts: Vec<&str> = spec.split('+').map(str::trim).collect();
    let key_name: &str = parts.pop().unwrap_or_default();
    if key_name.is_empty() {
        return Err(invalid(format!("`{spec}` has no key")));
    }

    let mut modifiers: KeyModifiers = KeyModifiers::NONE;
    for part in parts {
        modifiers |= match part.to_ascii_lowercase().as_str() {
            "ctrl" | "control" => KeyModifiers::CONTROL,
            "shift" => KeyModifiers::SHIFT,
            "alt" => KeyModifiers::ALT,
            "super" | "cmd" | "win" => KeyModifiers::SUPER,
            other => return Err(invalid(format!("unknown modifier `{other}` in `{spec}`"))),
        };
    }

    let lower: String = key_name.to_ascii_lowercase();
    let key: KeyCode = match lower.as_str() {
        "backspace" => KeyCode::Backspace,
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        "delete" | "del" => KeyCode::Delete,
        "insert" | "ins" => KeyCode::Insert,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" => KeyCode::PageUp,
        "pagedown" => KeyCode::PageDown,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "period" | "dot" => KeyCode::Char('.'),
        "comma" => KeyCode::Char(','),
        "minus" => KeyCode::Char('-'),
        "plus" => KeyCode::Char('+'),
        name => {
            let mut chars = name.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => KeyCode::Char(c),
                (Some('f'), Some(_)) => name[1..]
                    .parse::<u8>()
                    .ok()
                    .filter(|n| (1..=24).contains(n))
                    .map(KeyCode::F)
                    .ok_or_else(|| invalid(format!("unknown key `{key_name}`")))?,
                _ => return Err(invalid(format!("unknown key `{key_name}`"))),
            }
        }
    };

    Ok((modifiers, key))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keymap() -> Keymap {
        Keymap::defaults(&CommandTemplates::default())
    }

    #[test]
    fn exact_modifier_match_is_required() {
        let map = keymap();

        let down = map.dispatch(KeyModifiers::CONTROL, KeyCode::Char('j'));
        assert_eq!(
            down.as_slice(),
            [&Command::MoveCursor {
                motion: Motion::Down
            }]
        );

        let page = map.dispatch(
            KeyModifiers::CONTROL | KeyModifiers::SHIFT,
            KeyCode::Char('J'),
        );
        assert_eq!(
            page.as_slice(),
            [&Command::MoveCursor {
                motion: Motion::PageDown
            }]
        );

        assert!(map.dispatch(KeyModifiers::ALT, KeyCode::Char('j')).is_empty());
        assert!(map.dispatch(KeyModifiers::NONE, KeyCode::Char('x')).is_empty());
    }

    #[test]
    fn reserved_bits_are_stripped() {
        let map = keymap();
        let reload = map.dispatch(
            KeyModifiers::CONTROL | KeyModifiers::META | KeyModifiers::HYPER,
            KeyCode::Char('r'),
        );
        assert_eq!(reload.as_slice(), [&Command::Reload]);
    }

    #[test]
    fn bookmarks_carry_their_index() {
        let map = keymap();
        for (key, index) in [('1', 0), ('2', 1), ('3', 2)] {
            for mods in [KeyModifiers::CONTROL, KeyModifiers::ALT] {
                let cmds = map.dispatch(mods, KeyCode::Char(key));
                assert_eq!(cmds.as_slice(), [&Command::Bookmark { index }]);
            }
        }
    }

    #[test]
    fn alt_fallbacks_reach_legacy_only_commands() {
        let map = keymap();

        for mods in [KeyModifiers::CONTROL, KeyModifiers::ALT] {
            let cmds = map.dispatch(mods, KeyCode::Char('.'));
            assert_eq!(cmds.as_slice(), [&Command::ToggleDotfiles]);
        }

        // What a legacy terminal sends for Ctrl+. and Ctrl+1.
        assert!(map.dispatch(KeyModifiers::NONE, KeyCode::Char('.')).is_empty());
        assert!(map.dispatch(KeyModifiers::NONE, KeyCode::Char('1')).is_empty());
    }

    #[test]
    fn all_matching_bindings_fire_in_order() {
        let map = Keymap::new(vec![
            KeyBinding::new(KeyModifiers::CONTROL, KeyCode::Char('r'), Command::Reload),
            KeyBinding::new(KeyModifiers::NONE, KeyCode::Char('r'), Command::Quit),
            KeyBinding::new(
                KeyModifiers::CONTROL,
                KeyCode::Char('R'),
                Command::ToggleDotfiles,
            ),
        ]);

        let cmds = map.dispatch(KeyModifiers::CONTROL, KeyCode::Char('r'));
        assert_eq!(cmds.as_slice(), [&Command::Reload, &Command::ToggleDotfiles]);
    }

    #[test]
    fn terminal_binding_uses_template() {
        let templates = CommandTemplates {
            terminal: vec!["alacritty".into(), "-e".into(), "fish".into()],
            ..CommandTemplates::default()
        };
        let map = Keymap::defaults(&templates);

        let cmds = map.dispatch(KeyModifiers::NONE, KeyCode::F(4));
        assert_eq!(
            cmds.as_slice(),
            [&Command::DirExec {
                argv: templates.terminal.clone()
            }]
        );
    }

    #[test]
    fn parses_key_specs() -> Result<(), AppError> {
        assert_eq!(
            parse_key_spec("ctrl+shift+j")?,
            (KeyModifiers::CONTROL | KeyModifiers::SHIFT, KeyCode::Char('j'))
        );
        assert_eq!(parse_key_spec("F5")?, (KeyModifiers::NONE, KeyCode::F(5)));
        assert_eq!(
            parse_key_spec("Backspace")?,
            (KeyModifiers::NONE, KeyCode::Backspace)
        );
        assert_eq!(
            parse_key_spec("ctrl+.")?,
            (KeyModifiers::CONTROL, KeyCode::Char('.'))
        );
        assert_eq!(
            parse_key_spec("ctrl + period")?,
            (KeyModifiers::CONTROL, KeyCode::Char('.'))
        );

        assert!(parse_key_spec("").is_err());
        assert!(parse_key_spec("ctrl+").is_err());
        assert!(parse_key_spec("hyper+j").is_err());
        assert!(parse_key_spec("f99").is_err());
        assert!(parse_key_spec("frobnicate").is_err());
        Ok(())
    }

    #[test]
    fn specs_build_a_table() -> Result<(), AppError> {
        let specs = vec![
            BindingSpec {
                key: "ctrl+4".into(),
                command: Command::Bookmark { index: 3 },
            },
            BindingSpec {
                key: "f2".into(),
                command: Command::SetPath {
                    path: "/tmp".into(),
                },
            },
        ];

        let map = Keymap::from_specs(&specs)?;
        assert_eq!(map.bindings().len(), 2);
        assert_eq!(
            map.dispatch(KeyModifiers::CONTROL, KeyCode::Char('4')).as_slice(),
            [&Command::Bookmark { index: 3 }]
        );
        Ok(())
    }
}
