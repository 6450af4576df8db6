//! The installed extension: store, command dispatcher and popup wired to a
//! [`Browser`].

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use playrate_control::{CommandDispatcher, ControlSurface, Delivery, Outcome};
use playrate_core::logging::init_subscriber;
use playrate_settings::{JsonFileStore, RuntimeConfig, SettingsError, SettingsStore, config_path, load_config};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::browser::Browser;
use crate::commands::CommandRegistry;

/// Resolve the storage file path (`~/.playrate/storage.json`).
pub fn storage_path() -> PathBuf {
    config_path().with_file_name("storage.json")
}

/// A running extension.
pub struct Extension {
    browser: Arc<Browser>,
    store: Arc<dyn SettingsStore>,
    delivery: Arc<Delivery>,
    dispatcher: Arc<CommandDispatcher>,
    commands: CommandRegistry,
    cancel: CancellationToken,
    dispatcher_task: Mutex<Option<JoinHandle<()>>>,
}

impl Extension {
    /// Load `~/.playrate/config.json`, install logging and start with the
    /// file-backed store at [`storage_path`].
    pub fn launch() -> Result<Self, SettingsError> {
        let config = load_config()?;
        init_subscriber(&config.log_level);
        let store: Arc<dyn SettingsStore> = Arc::new(JsonFileStore::new(storage_path()));
        Ok(Self::install(store, &config))
    }

    /// Wire the extension over `store` and start the command dispatcher.
    /// Must be called from within a tokio runtime.
    pub fn install(store: Arc<dyn SettingsStore>, config: &RuntimeConfig) -> Self {
        let timing = config.timing.clone();
        let browser = Arc::new(Browser::new(Arc::clone(&store), timing.clone()));
        let delivery = Arc::new(Delivery::new(
            Arc::clone(&browser) as _,
            Arc::clone(&browser) as _,
            timing,
        ));
        let dispatcher = Arc::new(CommandDispatcher::new(
            Arc::clone(&browser) as _,
            Arc::clone(&delivery),
            Arc::clone(&store),
        ));

        let commands = CommandRegistry::new();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(Arc::clone(&dispatcher).run(commands.subscribe(), cancel.clone()));
        info!("extension installed");

        Self {
            browser,
            store,
            delivery,
            dispatcher,
            commands,
            cancel,
            dispatcher_task: Mutex::new(Some(task)),
        }
    }

    /// The browser the extension runs in.
    pub fn browser(&self) -> &Arc<Browser> {
        &self.browser
    }

    /// The shared settings store.
    pub fn store(&self) -> &Arc<dyn SettingsStore> {
        &self.store
    }

    /// The keyboard shortcut registry.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// Run one command to completion, bypassing the shortcut feed.
    pub async fn run_command(&self, name: &str) -> Option<Outcome> {
        self.dispatcher.on_command(name).await
    }

    /// Open the popup for the active tab.
    pub async fn open_popup(&self) -> ControlSurface {
        ControlSurface::open(
            Arc::clone(&self.browser) as _,
            Arc::clone(&self.delivery),
            Arc::clone(&self.store),
        )
        .await
    }

    /// Stop the dispatcher and close every tab.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let task = self.dispatcher_task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
        self.browser.close_all();
        debug!("extension shut down");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use assert_matches::assert_matches;
    use playrate_settings::{MemoryStore, VIDEO_SPEED};
    use serde_json::json;

    #[test]
    fn storage_sits_next_to_config() {
        assert_eq!(storage_path().parent(), config_path().parent());
        assert!(storage_path().ends_with(".playrate/storage.json"));
    }

    #[tokio::test(start_paused = true)]
    async fn shortcut_feed_reaches_dispatcher() {
        let store = Arc::new(MemoryStore::new());
        let extension = Extension::install(store.clone(), &RuntimeConfig::default());
        let _ = extension.browser().open_tab("about:blank").await;

        assert_eq!(extension.commands().press("increase-speed"), 1);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(store.value(VIDEO_SPEED), Some(json!(1.25)));

        extension.shutdown().await;
        assert_eq!(extension.commands().press("increase-speed"), 0);
        assert_eq!(extension.browser().tab_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn run_command_without_tab() {
        let extension = Extension::install(Arc::new(MemoryStore::new()), &RuntimeConfig::default());
        assert_matches!(extension.run_command("reset-speed").await, Some(Outcome::NoActiveTab));
        assert_eq!(extension.run_command("fast-forward").await, None);
    }
}
