use super::Effect;

/// The keys the quick search reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    ArrowUp,
    ArrowDown,
    Enter,
    Other,
}

/// Where keyboard focus was when the key was pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    #[default]
    Page,
    Input,
    TextArea,
    Select,
    ContentEditable,
}

impl FocusTarget {
    /// Typing here produces text, so the shortcut must stay inert.
    pub fn is_editable(self) -> bool {
        !matches!(self, Self::Page)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub focus: FocusTarget,
    /// Ctrl, Alt or Meta held.
    pub modified: bool,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            focus: FocusTarget::Page,
            modified: false,
        }
    }

    pub fn with_focus(mut self, focus: FocusTarget) -> Self {
        self.focus = focus;
        self
    }

    pub fn with_modifier(mut self) -> Self {
        self.modified = true;
        self
    }

    pub fn is_shortcut(&self, shortcut: char) -> bool {
        self.key == Key::Char(shortcut) && !self.modified && !self.focus.is_editable()
    }
}

/// Whether the host should suppress the key's default action, plus any effects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOutcome {
    pub consumed: bool,
    pub effects: Vec<Effect>,
}

impl KeyOutcome {
    pub(crate) fn consumed(effects: Vec<Effect>) -> Self {
        Self {
            consumed: true,
            effects,
        }
    }

    pub(crate) fn ignored() -> Self {
        Self {
            consumed: false,
            effects: Vec::new(),
        }
    }
}
