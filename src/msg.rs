use crossterm::event::KeyEvent;
use std::path::PathBuf;

/// All possible messages that drive state transitions.
#[derive(Debug)]
pub enum Msg {
    // -- Input events (raw)
    Key(KeyEvent),
    Resize(u16, u16),

    // -- Marketplace
    /// Something under the marketplace root changed on disk.
    FileChanged(PathBuf),
    /// Rescan the registry and plugins now.
    Refresh,

    // -- System
    Tick,
    Quit,
}
