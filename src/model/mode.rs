/// Top-level TUI screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    /// Stats and health overview.
    #[default]
    Dashboard,
    /// Registry browser.
    Assets,
    /// Plugin browser and editor.
    Plugins,
}

impl Screen {
    pub fn label(&self) -> &'static str {
        match self {
            Screen::Dashboard => "DASHBOARD",
            Screen::Assets => "ASSETS",
            Screen::Plugins => "PLUGINS",
        }
    }
}

/// Application interaction modes layered over the active screen.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Mode {
    /// Navigation and single-key actions.
    #[default]
    Normal,
    /// Search overlay (`/`).
    Search,
    /// Keyboard shortcut overlay (`?`).
    Help,
    /// Single-line prompt for a plugin mutation.
    Prompt(PromptKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// `name` or `name: description`.
    NewPlugin,
    /// `type/name`, e.g. `skills/reviewer`.
    AddAsset,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Normal => "NORMAL",
            Mode::Search => "SEARCH",
            Mode::Help => "HELP",
            Mode::Prompt(PromptKind::NewPlugin) => "NEW PLUGIN",
            Mode::Prompt(PromptKind::AddAsset) => "ADD ASSET",
        }
    }
}
