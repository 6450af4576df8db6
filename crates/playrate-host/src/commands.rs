//! Keyboard command registration.

use parking_lot::Mutex;
use playrate_control::CommandFeed;
use playrate_core::Command;
use tokio::sync::mpsc;
use tracing::debug;

/// The browser's registry of the extension's keyboard shortcuts.
#[derive(Default)]
pub struct CommandRegistry {
    listeners: Mutex<Vec<mpsc::UnboundedSender<String>>>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for command names.
    pub fn subscribe(&self) -> CommandFeed {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners.lock().push(tx);
        rx
    }

    /// Fire the shortcut bound to `name`. Returns how many listeners got it.
    pub fn press(&self, name: &str) -> usize {
        let mut listeners = self.listeners.lock();
        listeners.retain(|listener| listener.send(name.to_owned()).is_ok());
        debug!(command = name, listeners = listeners.len(), "command fired");
        listeners.len()
    }

    /// Fire a known command.
    pub fn press_command(&self, command: Command) -> usize {
        self.press(command.name())
    }
}
