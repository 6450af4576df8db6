//! In-process browser: tabs, page agents, messaging and script injection.
//!
//! Each tab owns a [`Document`] and an [`OverlayNode`]. A page agent runs as
//! a spawned task that starts the [`PageAgent`], fires its readiness signal
//! and then serves an inbox of JSON messages until the tab navigates away or
//! closes. Messages to a tab whose agent is not listening fail with
//! [`TransportError::NoReceiver`], just like a real extension runtime.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use playrate_agent::{MediaHost, OverlaySurface, PageAgent};
use playrate_control::{Readiness, ScriptInjector, TabId, TabInfo, TabMessenger, TabResolver, TransportError};
use playrate_core::protocol::decode_response;
use playrate_core::{AgentRequest, AgentResponse, ProtocolError};
use playrate_settings::{SettingsStore, TimingConfig};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, instrument, warn};
use url::Url;

use crate::document::{Document, MediaKind, OverlayNode};

/// One message in flight to a page agent.
struct Envelope {
    message: Value,
    reply: oneshot::Sender<Result<Value, ProtocolError>>,
}

struct RunningAgent {
    agent: Arc<PageAgent>,
    inbox: mpsc::UnboundedSender<Envelope>,
}

enum AgentSlot {
    Empty,
    Loading(Vec<oneshot::Sender<()>>),
    Running(RunningAgent),
}

/// An open tab.
pub struct Tab {
    id: TabId,
    document: Arc<Document>,
    overlay: Arc<OverlayNode>,
    agent: Mutex<AgentSlot>,
}

impl Tab {
    fn new(id: TabId, url: &str) -> Self {
        Self {
            id,
            document: Arc::new(Document::new(url)),
            overlay: Arc::new(OverlayNode::default()),
            agent: Mutex::new(AgentSlot::Empty),
        }
    }

    /// Tab id.
    pub fn id(&self) -> TabId {
        self.id
    }

    /// Current URL.
    pub fn url(&self) -> &str {
        self.document.url()
    }

    /// The loaded page.
    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    /// The page's overlay element.
    pub fn overlay(&self) -> &Arc<OverlayNode> {
        &self.overlay
    }

    /// The running page agent, if one has finished starting.
    pub fn agent(&self) -> Option<Arc<PageAgent>> {
        match &*self.agent.lock() {
            AgentSlot::Running(running) => Some(Arc::clone(&running.agent)),
            AgentSlot::Empty | AgentSlot::Loading(_) => None,
        }
    }

    /// Whether a page agent is listening for messages.
    pub fn has_agent(&self) -> bool {
        self.agent().is_some()
    }

    fn inbox(&self) -> Option<mpsc::UnboundedSender<Envelope>> {
        match &*self.agent.lock() {
            AgentSlot::Running(running) => Some(running.inbox.clone()),
            AgentSlot::Empty | AgentSlot::Loading(_) => None,
        }
    }

    fn info(&self) -> TabInfo {
        TabInfo {
            id: self.id,
            url: Some(self.url().to_owned()),
        }
    }

    /// Unload the page: stop its agent and detach its media.
    fn teardown(&self) {
        let slot = std::mem::replace(&mut *self.agent.lock(), AgentSlot::Empty);
        if let AgentSlot::Running(running) = slot {
            running.agent.shutdown();
        }
        self.document.unload();
    }
}

/// Whether the page agent may run on `url`.
pub fn is_scriptable(url: &str) -> bool {
    Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

/// The browser, with its tabs and the extension's page agent script.
pub struct Browser {
    tabs: DashMap<TabId, Arc<Tab>>,
    active: Mutex<Option<TabId>>,
    next_id: AtomicU32,
    store: Arc<dyn SettingsStore>,
    timing: TimingConfig,
    ready_signal: AtomicBool,
    injections: AtomicUsize,
    messages: AtomicUsize,
}

impl Browser {
    /// A browser with no tabs. Agents read `store` and use `timing`.
    pub fn new(store: Arc<dyn SettingsStore>, timing: TimingConfig) -> Self {
        Self {
            tabs: DashMap::new(),
            active: Mutex::new(None),
            next_id: AtomicU32::new(1),
            store,
            timing,
            ready_signal: AtomicBool::new(true),
            injections: AtomicUsize::new(0),
            messages: AtomicUsize::new(0),
        }
    }

    /// Whether [`ScriptInjector::inject`] hands back a readiness signal.
    /// When off, callers fall back to the settle delay.
    pub fn set_ready_signal(&self, enabled: bool) {
        self.ready_signal.store(enabled, Ordering::Relaxed);
    }

    /// Open and focus a tab. On scriptable pages the agent is loaded as a
    /// content script and this returns once it is listening.
    pub async fn open_tab(&self, url: &str) -> Arc<Tab> {
        self.open_page(url, &[]).await
    }

    /// Like [`Browser::open_tab`] for a page that already contains `media`
    /// when the agent starts.
    pub async fn open_page(&self, url: &str, media: &[MediaKind]) -> Arc<Tab> {
        let tab = self.insert_tab(url);
        for kind in media {
            let _ = tab.document.add_media(*kind);
        }
        if is_scriptable(url) {
            let _ = self.load_agent(&tab).await;
        }
        tab
    }

    /// Open and focus a tab that has no agent, as for pages loaded before
    /// the extension was installed.
    pub fn open_tab_without_agent(&self, url: &str) -> Arc<Tab> {
        self.insert_tab(url)
    }

    /// Load `url` into an existing tab. The old page and its agent go away.
    pub async fn navigate(&self, id: TabId, url: &str) -> Option<Arc<Tab>> {
        let old = self.tab(id)?;
        old.teardown();
        let tab = Arc::new(Tab::new(id, url));
        let _ = self.tabs.insert(id, Arc::clone(&tab));
        debug!(tab = id, url, "navigated");
        if is_scriptable(url) {
            let _ = self.load_agent(&tab).await;
        }
        Some(tab)
    }

    /// Close a tab. Returns whether it existed.
    pub fn close_tab(&self, id: TabId) -> bool {
        let Some((_, tab)) = self.tabs.remove(&id) else {
            return false;
        };
        tab.teardown();
        let mut active = self.active.lock();
        if *active == Some(id) {
            *active = None;
        }
        debug!(tab = id, "tab closed");
        true
    }

    /// Close every tab.
    pub fn close_all(&self) {
        let ids: Vec<TabId> = self.tabs.iter().map(|entry| *entry.key()).collect();
        for id in ids {
            let _ = self.close_tab(id);
        }
    }

    /// Focus a tab. Returns whether it exists.
    pub fn activate(&self, id: TabId) -> bool {
        if !self.tabs.contains_key(&id) {
            return false;
        }
        *self.active.lock() = Some(id);
        true
    }

    /// Look up a tab.
    pub fn tab(&self, id: TabId) -> Option<Arc<Tab>> {
        self.tabs.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Number of open tabs.
    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    /// How many times the agent script was injected on demand.
    pub fn injection_count(&self) -> usize {
        self.injections.load(Ordering::Relaxed)
    }

    /// How many messages were sent to tabs, delivered or not.
    pub fn message_count(&self) -> usize {
        self.messages.load(Ordering::Relaxed)
    }

    /// Deliver a raw JSON message to the agent in `tab` and wait for its
    /// raw reply. Malformed messages come back as [`TransportError::Rejected`].
    pub async fn post_message(&self, tab: TabId, message: Value) -> Result<Value, TransportError> {
        let _ = self.messages.fetch_add(1, Ordering::Relaxed);
        let inbox = self
            .tab(tab)
            .ok_or(TransportError::NoSuchTab(tab))?
            .inbox()
            .ok_or(TransportError::NoReceiver(tab))?;

        let (reply, answer) = oneshot::channel();
        inbox
            .send(Envelope { message, reply })
            .map_err(|_| TransportError::NoReceiver(tab))?;
        answer
            .await
            .map_err(|_| TransportError::NoReceiver(tab))?
            .map_err(|error| TransportError::Rejected {
                tab,
                reason: error.to_string(),
            })
    }

    fn insert_tab(&self, url: &str) -> Arc<Tab> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let tab = Arc::new(Tab::new(id, url));
        let _ = self.tabs.insert(id, Arc::clone(&tab));
        *self.active.lock() = Some(id);
        debug!(tab = id, url, "tab opened");
        tab
    }

    /// Start an agent in `tab` unless one is running or starting. The
    /// receiver fires once the agent is listening.
    fn load_agent(&self, tab: &Arc<Tab>) -> oneshot::Receiver<()> {
        let (ready_tx, ready_rx) = oneshot::channel();
        {
            let mut slot = tab.agent.lock();
            match &mut *slot {
                AgentSlot::Running(_) => {
                    let _ = ready_tx.send(());
                    return ready_rx;
                }
                AgentSlot::Loading(waiters) => {
                    waiters.push(ready_tx);
                    return ready_rx;
                }
                AgentSlot::Empty => *slot = AgentSlot::Loading(vec![ready_tx]),
            }
        }
        let agent = PageAgent::new(
            Arc::clone(&tab.document) as Arc<dyn MediaHost>,
            Arc::clone(&tab.overlay) as Arc<dyn OverlaySurface>,
            Arc::clone(&self.store),
            self.timing.clone(),
        );
        let _ = tokio::spawn(serve_agent(Arc::clone(tab), agent));
        ready_rx
    }
}

/// Start `agent`, publish its inbox on `tab` and answer messages until the
/// inbox is dropped.
async fn serve_agent(tab: Arc<Tab>, agent: Arc<PageAgent>) {
    agent.start().await;

    let (inbox, mut requests) = mpsc::unbounded_channel::<Envelope>();
    let running = RunningAgent {
        agent: Arc::clone(&agent),
        inbox,
    };
    let waiters = {
        let mut slot = tab.agent.lock();
        match std::mem::replace(&mut *slot, AgentSlot::Running(running)) {
            AgentSlot::Loading(waiters) => waiters,
            other => {
                // page unloaded while the agent was starting
                *slot = other;
                drop(slot);
                agent.shutdown();
                return;
            }
        }
    };
    let id = tab.id;
    drop(tab);
    for waiter in waiters {
        let _ = waiter.send(());
    }
    info!(tab = id, "page agent listening");

    while let Some(envelope) = requests.recv().await {
        let reply = agent.handle_message(&envelope.message);
        let _ = envelope.reply.send(reply);
    }
    debug!(tab = id, "page agent inbox closed");
}

#[async_trait]
impl TabResolver for Browser {
    async fn active_tab(&self) -> Option<TabInfo> {
        let id = (*self.active.lock())?;
        self.tab(id).map(|tab| tab.info())
    }
}

#[async_trait]
impl TabMessenger for Browser {
    #[instrument(skip(self, request), fields(action = request.action()))]
    async fn send(&self, tab: TabId, request: &AgentRequest) -> Result<AgentResponse, TransportError> {
        let message = serde_json::to_value(request).map_err(ProtocolError::from)?;
        let value = self.post_message(tab, message).await?;
        Ok(decode_response(&value)?)
    }
}

#[async_trait]
impl ScriptInjector for Browser {
    async fn inject(&self, tab: TabId) -> Result<Readiness, TransportError> {
        let _ = self.injections.fetch_add(1, Ordering::Relaxed);
        let target = self.tab(tab).ok_or(TransportError::NoSuchTab(tab))?;
        if !is_scriptable(target.url()) {
            warn!(tab, url = target.url(), "refusing to inject into restricted page");
            return Err(TransportError::InjectionRefused {
                tab,
                reason: format!("cannot access contents of url \"{}\"", target.url()),
            });
        }
        let ready = self.load_agent(&target);
        if self.ready_signal.load(Ordering::Relaxed) {
            Ok(Readiness::Signal(ready))
        } else {
            Ok(Readiness::Unsupported)
        }
    }
}
