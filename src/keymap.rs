use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Lifecycle commands a user (or host) can issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Command {
    Start,
    Reset,
    Quit,
}

/// A set of keys bound to one command, with help text and an enabled flag.
#[derive(Debug, Clone)]
pub struct Binding {
    keys: Vec<(KeyCode, KeyModifiers)>,
    help_key: &'static str,
    help_desc: &'static str,
    enabled: bool,
}

impl Binding {
    pub fn new(
        keys: &[(KeyCode, KeyModifiers)],
        help_key: &'static str,
        help_desc: &'static str,
    ) -> Self {
        Self {
            keys: keys.to_vec(),
            help_key,
            help_desc,
            enabled: true,
        }
    }

    /// A disabled binding never matches.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        self.enabled
            && self
                .keys
                .iter()
                .any(|(code, mods)| key.code == *code && key.modifiers == *mods)
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn help(&self) -> (&'static str, &'static str) {
        (self.help_key, self.help_desc)
    }
}

#[derive(Debug, Clone)]
pub struct KeyMap {
    pub start: Binding,
    pub reset: Binding,
    pub quit: Binding,
}

impl Default for KeyMap {
    fn default() -> Self {
        let mut reset = Binding::new(&[(KeyCode::Tab, KeyModifiers::NONE)], "tab", "reset");
        reset.set_enabled(false);

        Self {
            start: Binding::new(&[(KeyCode::Char('.'), KeyModifiers::NONE)], ".", "start"),
            reset,
            quit: Binding::new(
                &[
                    (KeyCode::Esc, KeyModifiers::NONE),
                    (KeyCode::Char('c'), KeyModifiers::CONTROL),
                ],
                "esc",
                "quit",
            ),
        }
    }
}

impl KeyMap {
    /// Resolves a key to a command. Quit wins over the others.
    pub fn command_for(&self, key: &KeyEvent) -> Option<Command> {
        if self.quit.matches(key) {
            Some(Command::Quit)
        } else if self.start.matches(key) {
            Some(Command::Start)
        } else if self.reset.matches(key) {
            Some(Command::Reset)
        } else {
            None
        }
    }

    /// Help entries for the enabled bindings, in display order.
    pub fn short_help(&self) -> Vec<(&'static str, &'static str)> {
        [&self.start, &self.reset, &self.quit]
            .into_iter()
            .filter(|b| b.enabled())
            .map(Binding::help)
            .collect()
    }
}
