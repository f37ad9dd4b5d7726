//! Chord parsing and the context-scoped keybinding registry.

use std::collections::{BTreeMap, HashMap};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::warn;

use crate::action::Action;

/// A key with its modifiers, normalized for lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chord {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl Chord {
    /// Plain key without modifiers.
    pub fn plain(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::NONE,
        }
    }

    /// Key with Ctrl held.
    pub fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::CONTROL,
        }
    }

    /// Key with Alt held.
    pub fn alt(code: KeyCode) -> Self {
        Self {
            code,
            mods: KeyModifiers::ALT,
        }
    }

    /// Normalize a terminal key event.
    ///
    /// Shift is dropped for plain characters (the shifted character itself
    /// is the identity) but kept for named keys like F-keys and Tab.
    pub fn from_event(event: &KeyEvent) -> Self {
        let mut mods = event.modifiers;
        if let KeyCode::Char(_) = event.code {
            mods.remove(KeyModifiers::SHIFT);
        }
        Self {
            code: event.code,
            mods,
        }
    }

    /// Parse a config-file chord such as `"f5"`, `"ctrl+r"` or
    /// `"shift+f8"`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();

        // A bare single character is a key, not a separator; this is what
        // makes `"+"` itself bindable.
        let mut single = text.chars();
        if let (Some(c), None) = (single.next(), single.next()) {
            return Some(Self::plain(KeyCode::Char(c)));
        }

        let mut mods = KeyModifiers::NONE;
        let mut key: Option<KeyCode> = None;

        for part in text.split('+') {
            let part = part.trim();
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" => mods |= KeyModifiers::CONTROL,
                "alt" => mods |= KeyModifiers::ALT,
                "shift" => mods |= KeyModifiers::SHIFT,
                lowered => {
                    if key.is_some() {
                        return None;
                    }
                    key = Some(parse_key(lowered, part)?);
                }
            }
        }

        let code = key?;
        // The same normalization as from_event, so lookups agree.
        if let KeyCode::Char(_) = code {
            mods.remove(KeyModifiers::SHIFT);
        }
        Some(Self { code, mods })
    }
}

fn parse_key(lowered: &str, original: &str) -> Option<KeyCode> {
    let named = match lowered {
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" => KeyCode::PageDown,
        "enter" | "return" => KeyCode::Enter,
        "tab" => KeyCode::Tab,
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "insert" | "ins" => KeyCode::Insert,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        _ => {
            if let Some(n) = lowered.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                return (1..=12).contains(&n).then_some(KeyCode::F(n));
            }
            let mut chars = original.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            return Some(KeyCode::Char(c));
        }
    };
    Some(named)
}

/// Scopes a chord can resolve in, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyContext {
    Dialog,
    Menu,
    QuickSearch,
    Panel,
    Global,
}

impl KeyContext {
    /// The resolution chain for a given innermost context.
    ///
    /// Modal contexts do not fall through to the panel: a dialog owns the
    /// keyboard except for the global chords it does not bind.
    pub fn chain(self) -> &'static [KeyContext] {
        match self {
            Self::Dialog => &[Self::Dialog],
            Self::Menu => &[Self::Menu, Self::Global],
            Self::QuickSearch => &[Self::QuickSearch, Self::Panel, Self::Global],
            Self::Panel => &[Self::Panel, Self::Global],
            Self::Global => &[Self::Global],
        }
    }
}

/// The (context, chord) → action registry.
pub struct Keymap {
    bindings: HashMap<(KeyContext, Chord), Action>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Keymap {
    /// The built-in bindings.
    pub fn with_defaults() -> Self {
        use Action as A;
        use KeyCode::{Char, Down, Enter, Insert, Left, Right, Tab, Up};

        let mut keymap = Self {
            bindings: HashMap::new(),
        };

        // Global
        keymap.bind(KeyContext::Global, Chord::plain(KeyCode::F(10)), A::Quit);
        keymap.bind(KeyContext::Global, Chord::plain(Tab), A::SwitchPanel);
        keymap.bind(KeyContext::Global, Chord::plain(KeyCode::F(1)), A::Help);
        keymap.bind(KeyContext::Global, Chord::plain(KeyCode::F(2)), A::OpenMenu);
        keymap.bind(KeyContext::Global, Chord::plain(KeyCode::F(9)), A::OpenConfig);

        // Panel navigation
        keymap.bind(KeyContext::Panel, Chord::plain(Up), A::CursorUp);
        keymap.bind(KeyContext::Panel, Chord::plain(Down), A::CursorDown);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::PageUp), A::PageUp);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::PageDown), A::PageDown);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::Home), A::Home);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::End), A::End);
        keymap.bind(KeyContext::Panel, Chord::plain(Enter), A::Activate);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::Backspace), A::Parent);
        keymap.bind(KeyContext::Panel, Chord::alt(Left), A::HistoryBack);
        keymap.bind(KeyContext::Panel, Chord::alt(Right), A::HistoryForward);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('r')), A::Refresh);

        // Marks
        keymap.bind(KeyContext::Panel, Chord::plain(Insert), A::ToggleMark);
        keymap.bind(KeyContext::Panel, Chord::plain(Char(' ')), A::ToggleMarkDown);
        keymap.bind(KeyContext::Panel, Chord::plain(Char('+')), A::GroupSelect);
        keymap.bind(KeyContext::Panel, Chord::plain(Char('-')), A::GroupDeselect);
        keymap.bind(KeyContext::Panel, Chord::plain(Char('*')), A::InvertSelection);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('a')), A::SelectAllFiles);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('u')), A::UnselectAll);

        // File operations
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::F(3)), A::View);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::F(4)), A::Edit);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::F(5)), A::Copy);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::F(6)), A::Move);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::F(7)), A::Mkdir);
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::F(8)), A::Delete);
        keymap.bind(
            KeyContext::Panel,
            Chord {
                code: KeyCode::F(8),
                mods: KeyModifiers::SHIFT,
            },
            A::DeletePermanent,
        );
        keymap.bind(KeyContext::Panel, Chord::plain(KeyCode::Delete), A::Delete);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('n')), A::Rename);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('z')), A::Undo);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('y')), A::Redo);

        // Panel toggles
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('f')), A::Find);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('q')), A::QuickView);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('h')), A::ToggleHidden);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('t')), A::CycleTheme);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('s')), A::CycleSort);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('v')), A::CycleView);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('w')), A::SwapPanels);
        keymap.bind(KeyContext::Panel, Chord::ctrl(Char('g')), A::SameDir);

        // Dialogs: movement, confirm, cancel, toggle. Text entry and
        // dialog-local keys stay with the surface itself.
        keymap.bind(KeyContext::Dialog, Chord::plain(Enter), A::DialogConfirm);
        keymap.bind(KeyContext::Dialog, Chord::plain(KeyCode::Esc), A::DialogCancel);
        keymap.bind(KeyContext::Dialog, Chord::plain(Tab), A::DialogToggle);
        keymap.bind(KeyContext::Dialog, Chord::plain(Up), A::DialogUp);
        keymap.bind(KeyContext::Dialog, Chord::plain(Down), A::DialogDown);
        keymap.bind(KeyContext::Dialog, Chord::plain(Left), A::DialogLeft);
        keymap.bind(KeyContext::Dialog, Chord::plain(Right), A::DialogRight);

        // Menu
        keymap.bind(KeyContext::Menu, Chord::plain(Enter), A::MenuActivate);
        keymap.bind(KeyContext::Menu, Chord::plain(KeyCode::Esc), A::MenuClose);
        keymap.bind(KeyContext::Menu, Chord::plain(KeyCode::F(2)), A::MenuClose);
        keymap.bind(KeyContext::Menu, Chord::plain(Up), A::MenuUp);
        keymap.bind(KeyContext::Menu, Chord::plain(Down), A::MenuDown);
        keymap.bind(KeyContext::Menu, Chord::plain(Left), A::MenuLeft);
        keymap.bind(KeyContext::Menu, Chord::plain(Right), A::MenuRight);
        keymap.bind(KeyContext::Menu, Chord::plain(Tab), A::MenuRight);

        keymap
    }

    /// Defaults overlaid with `[keybindings]` overrides from the config.
    ///
    /// Unknown action names and unparsable chords are logged and skipped;
    /// a bad override never breaks the defaults.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut keymap = Self::with_defaults();

        for (action_id, chord_text) in overrides {
            let Some(action) = Action::from_id(action_id) else {
                warn!(action_id, "ignoring override for unknown action");
                continue;
            };
            let Some(chord) = Chord::parse(chord_text) else {
                warn!(action_id, chord_text, "ignoring unparsable chord");
                continue;
            };

            // The action-id namespace names the context the binding lives
            // in, so dialog and menu chords are rebindable too.
            let context = match action_id.split('.').next() {
                Some("global") => KeyContext::Global,
                Some("dialog") => KeyContext::Dialog,
                Some("menu") => KeyContext::Menu,
                _ => KeyContext::Panel,
            };
            // The old binding for this action is dropped so the override
            // replaces rather than aliases.
            keymap
                .bindings
                .retain(|(ctx, _), bound| !(*ctx == context && *bound == action));
            keymap.bind(context, chord, action);
        }

        keymap
    }

    fn bind(&mut self, context: KeyContext, chord: Chord, action: Action) {
        self.bindings.insert((context, chord), action);
    }

    /// Walk the context chain and return the first bound action.
    pub fn resolve(&self, innermost: KeyContext, chord: Chord) -> Option<Action> {
        innermost
            .chain()
            .iter()
            .find_map(|ctx| self.bindings.get(&(*ctx, chord)).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chord_parse() {
        assert_eq!(Chord::parse("f5"), Some(Chord::plain(KeyCode::F(5))));
        assert_eq!(
            Chord::parse("ctrl+r"),
            Some(Chord::ctrl(KeyCode::Char('r')))
        );
        assert_eq!(
            Chord::parse("alt+left"),
            Some(Chord::alt(KeyCode::Left))
        );
        assert_eq!(
            Chord::parse("shift+f8"),
            Some(Chord {
                code: KeyCode::F(8),
                mods: KeyModifiers::SHIFT,
            })
        );
        assert_eq!(Chord::parse("space"), Some(Chord::plain(KeyCode::Char(' '))));
        assert_eq!(Chord::parse("+"), Some(Chord::plain(KeyCode::Char('+'))));
        assert_eq!(Chord::parse("f13"), None);
        assert_eq!(Chord::parse("ctrl+"), None);
        assert_eq!(Chord::parse("nope+x"), None);
    }

    #[test]
    fn test_resolution_walks_chain() {
        let keymap = Keymap::with_defaults();

        // A panel chord resolves from the panel context...
        assert_eq!(
            keymap.resolve(KeyContext::Panel, Chord::plain(KeyCode::F(5))),
            Some(Action::Copy)
        );
        // ...and global chords are reachable from the panel.
        assert_eq!(
            keymap.resolve(KeyContext::Panel, Chord::plain(KeyCode::F(10))),
            Some(Action::Quit)
        );
        // Dialogs do not fall through to panel bindings.
        assert_eq!(
            keymap.resolve(KeyContext::Dialog, Chord::plain(KeyCode::F(5))),
            None
        );
    }

    #[test]
    fn test_dialog_context_bindings() {
        let keymap = Keymap::with_defaults();

        assert_eq!(
            keymap.resolve(KeyContext::Dialog, Chord::plain(KeyCode::Enter)),
            Some(Action::DialogConfirm)
        );
        assert_eq!(
            keymap.resolve(KeyContext::Dialog, Chord::plain(KeyCode::Esc)),
            Some(Action::DialogCancel)
        );
        // A dialog owns the keyboard: global quit does not reach it.
        assert_eq!(
            keymap.resolve(KeyContext::Dialog, Chord::plain(KeyCode::F(10))),
            None
        );
    }

    #[test]
    fn test_menu_context_falls_through_to_global() {
        let keymap = Keymap::with_defaults();

        assert_eq!(
            keymap.resolve(KeyContext::Menu, Chord::plain(KeyCode::Enter)),
            Some(Action::MenuActivate)
        );
        // F2 closes the menu rather than re-opening it.
        assert_eq!(
            keymap.resolve(KeyContext::Menu, Chord::plain(KeyCode::F(2))),
            Some(Action::MenuClose)
        );
        // Unbound menu chords fall through to global bindings.
        assert_eq!(
            keymap.resolve(KeyContext::Menu, Chord::plain(KeyCode::F(10))),
            Some(Action::Quit)
        );
    }

    #[test]
    fn test_dialog_and_menu_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("dialog.cancel".to_string(), "ctrl+g".to_string());
        overrides.insert("menu.activate".to_string(), "space".to_string());
        let keymap = Keymap::with_overrides(&overrides);

        assert_eq!(
            keymap.resolve(KeyContext::Dialog, Chord::ctrl(KeyCode::Char('g'))),
            Some(Action::DialogCancel)
        );
        assert_eq!(
            keymap.resolve(KeyContext::Dialog, Chord::plain(KeyCode::Esc)),
            None
        );
        assert_eq!(
            keymap.resolve(KeyContext::Menu, Chord::plain(KeyCode::Char(' '))),
            Some(Action::MenuActivate)
        );
        // Panel bindings are untouched by dialog-scope overrides.
        assert_eq!(
            keymap.resolve(KeyContext::Panel, Chord::plain(KeyCode::F(5))),
            Some(Action::Copy)
        );
    }

    #[test]
    fn test_override_replaces_default() {
        let mut overrides = BTreeMap::new();
        overrides.insert("panel.copy".to_string(), "ctrl+c".to_string());
        let keymap = Keymap::with_overrides(&overrides);

        assert_eq!(
            keymap.resolve(KeyContext::Panel, Chord::ctrl(KeyCode::Char('c'))),
            Some(Action::Copy)
        );
        assert_eq!(
            keymap.resolve(KeyContext::Panel, Chord::plain(KeyCode::F(5))),
            None
        );
    }

    #[test]
    fn test_bad_overrides_are_ignored() {
        let mut overrides = BTreeMap::new();
        overrides.insert("panel.copy".to_string(), "notakey+q".to_string());
        overrides.insert("no.such.action".to_string(), "f5".to_string());
        let keymap = Keymap::with_overrides(&overrides);

        // Defaults intact.
        assert_eq!(
            keymap.resolve(KeyContext::Panel, Chord::plain(KeyCode::F(5))),
            Some(Action::Copy)
        );
    }

    #[test]
    fn test_event_normalization_drops_shift_on_chars() {
        let event = KeyEvent::new(KeyCode::Char('*'), KeyModifiers::SHIFT);
        assert_eq!(Chord::from_event(&event), Chord::plain(KeyCode::Char('*')));

        let event = KeyEvent::new(KeyCode::F(8), KeyModifiers::SHIFT);
        assert_eq!(
            Chord::from_event(&event),
            Chord {
                code: KeyCode::F(8),
                mods: KeyModifiers::SHIFT,
            }
        );
    }
}
