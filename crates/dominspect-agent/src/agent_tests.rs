use super::*;

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dominspect_dom::{Document, NodeId};
use dominspect_protocols::{CommandTarget, LinkKeeper, NOT_ACTIVE_MESSAGE};
use parking_lot::Mutex;

const ACK_TIMEOUT: Duration = Duration::from_secs(5);

/// Connector whose links the test can sever at will.
#[derive(Default)]
struct ScriptedConnector {
    keepers: Mutex<Vec<LinkKeeper>>,
    attempts: AtomicU32,
    refuse: AtomicBool,
}

impl ScriptedConnector {
    fn drop_links(&self) {
        self.keepers.lock().clear();
    }

    fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HostConnector for ScriptedConnector {
    async fn connect(&self) -> Result<HostLink, InspectError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.refuse.load(Ordering::SeqCst) {
            return Err(InspectError::Transport("connection refused".to_string()));
        }
        let (keeper, link) = HostLink::pair();
        self.keepers.lock().push(keeper);
        Ok(link)
    }
}

struct Harness {
    page: Page,
    handle: AgentHandle,
    events: mpsc::UnboundedReceiver<InspectorEvent>,
    connector: Arc<ScriptedConnector>,
    _task: JoinHandle<()>,
}

const PAGE: &str = r#"{ "tag": "html", "children": [
    { "tag": "head", "children": [ { "tag": "title", "children": [ { "text": "Demo" } ] } ] },
    { "tag": "body", "children": [
        { "tag": "header", "id": "top" },
        { "tag": "main", "class": "card", "children": [
            { "tag": "p", "children": [ { "text": "Hello" } ] },
            { "tag": "ul", "children": [ { "tag": "li" }, { "tag": "li" }, { "tag": "li" } ] }
        ] },
        { "tag": "footer" }
    ] }
] }"#;

fn harness_with(config: AgentConfig) -> Harness {
    let page = Page::new(Document::from_json_str(PAGE).unwrap());
    let connector = Arc::new(ScriptedConnector::default());
    let (events_tx, events) = mpsc::unbounded_channel();
    let (handle, task) = PageAgent::spawn(
        page.clone(),
        config,
        &HighlightConfig::default(),
        connector.clone(),
        Arc::new(events_tx),
    );
    Harness {
        page,
        handle,
        events,
        connector,
        _task: task,
    }
}

fn harness() -> Harness {
    harness_with(AgentConfig::default())
}

fn path(indices: &[u32]) -> ElementPath {
    ElementPath::from_indices(indices.to_vec())
}

impl Harness {
    async fn send(&self, command: Command) -> Ack {
        self.handle.dispatch(command, ACK_TIMEOUT).await.unwrap()
    }

    async fn state(&self) -> SessionState {
        self.handle.state().await.unwrap()
    }

    /// Poll the session until `predicate` holds.
    async fn wait_for(&self, predicate: impl Fn(&SessionState) -> bool) -> SessionState {
        for _ in 0..50 {
            let state = self.state().await;
            if predicate(&state) {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("condition not reached, last state: {:?}", self.state().await);
    }

    fn drain(&mut self) -> Vec<SerializedElement> {
        let mut out = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            out.push(event.element().clone());
        }
        out
    }

    async fn next_event(&mut self) -> SerializedElement {
        tokio::time::timeout(Duration::from_secs(1), self.events.recv())
            .await
            .expect("no event")
            .expect("event channel closed")
            .element()
            .clone()
    }

    fn node(&self, indices: &[u32]) -> NodeId {
        resolve(&self.page.document().lock(), &path(indices)).unwrap()
    }

    fn outline(&self, indices: &[u32]) -> Option<String> {
        let node = self.node(indices);
        let doc = self.page.document().lock();
        doc.style(node)
            .and_then(|s| s.get("outline"))
            .map(str::to_string)
    }
}

#[tokio::test]
async fn test_commands_rejected_while_inactive() {
    let mut h = harness();
    for command in [
        Command::GetRoot,
        Command::Select { path: path(&[1]) },
        Command::Preview { path: path(&[1]) },
        Command::ClearPreview,
    ] {
        let ack = h.send(command).await;
        assert!(!ack.success);
        assert_eq!(ack.error.as_deref(), Some(NOT_ACTIVE_MESSAGE));
    }
    assert!(h.drain().is_empty());
    assert_eq!(h.connector.attempts(), 0);
}

#[tokio::test]
async fn test_activate_emits_root_and_links() {
    let mut h = harness();
    assert!(h.send(Command::Activate).await.success);

    let events = h.drain();
    assert_eq!(events.len(), 1);
    let root = &events[0];
    assert_eq!(root.tag_name, "html");
    assert!(root.path.is_root());
    assert_eq!(root.child_count(), 2);
    assert_eq!(root.subtree_size(), 12);

    let state = h.state().await;
    assert!(state.active);
    assert!(state.listening);
    assert!(state.linked);
    assert_eq!(h.page.listener_count(), 1);
    assert_eq!(h.connector.attempts(), 1);
}

#[tokio::test]
async fn test_activate_is_idempotent() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Activate).await;

    assert_eq!(h.drain().len(), 2);
    assert_eq!(h.page.listener_count(), 1);
    assert_eq!(h.connector.attempts(), 1);
}

#[tokio::test]
async fn test_get_root() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.drain();

    assert!(h.send(Command::GetRoot).await.success);
    let events = h.drain();
    assert_eq!(events.len(), 1);
    assert!(events[0].path.is_root());
}

#[tokio::test]
async fn test_select_highlights_and_emits() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.drain();

    let ack = h.send(Command::Select { path: path(&[1, 1]) }).await;
    assert!(ack.success);

    let events = h.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tag_name, "main");
    assert_eq!(events[0].path, path(&[1, 1]));
    assert_eq!(events[0].children[1].path, path(&[1, 1, 1]));

    let state = h.state().await;
    assert_eq!(state.highlighted, Some(path(&[1, 1])));
    assert!(state.style_watch_running);
    assert_eq!(h.outline(&[1, 1]).as_deref(), Some("2px solid #1a73e8"));
    assert_eq!(h.page.document().lock().scroll_history().len(), 1);
}

#[tokio::test]
async fn test_select_same_path_twice() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 0]) }).await;
    h.send(Command::Select { path: path(&[1, 0]) }).await;

    assert_eq!(h.drain().len(), 3);
    assert_eq!(h.page.document().lock().scroll_history().len(), 1);
}

#[tokio::test]
async fn test_unresolvable_select_changes_nothing() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 0]) }).await;
    h.drain();

    let ack = h.send(Command::Select { path: path(&[1, 9, 0]) }).await;
    assert!(!ack.success);
    assert_eq!(
        ack.error.as_deref(),
        Some("Path /1/9/0 does not resolve to an element")
    );
    assert!(h.drain().is_empty());
    assert_eq!(h.state().await.highlighted, Some(path(&[1, 0])));
}

#[tokio::test]
async fn test_preview_and_clear_preview() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 1]) }).await;

    assert!(h.send(Command::Preview { path: path(&[1, 2]) }).await.success);
    assert_eq!(h.state().await.previewed, Some(path(&[1, 2])));
    assert_eq!(h.outline(&[1, 2]).as_deref(), Some("2px dashed #1a73e8"));

    assert!(h.send(Command::ClearPreview).await.success);
    let state = h.state().await;
    assert_eq!(state.previewed, None);
    assert_eq!(state.highlighted, Some(path(&[1, 1])));
    assert_eq!(h.outline(&[1, 2]), None);
    assert_eq!(h.outline(&[1, 1]).as_deref(), Some("2px solid #1a73e8"));

    let ack = h.send(Command::Preview { path: path(&[7]) }).await;
    assert!(!ack.success);
}

#[tokio::test]
async fn test_preview_of_highlighted_node_is_ignored() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 1]) }).await;
    h.send(Command::Preview { path: path(&[1, 1]) }).await;

    let state = h.state().await;
    assert_eq!(state.previewed, None);
    assert_eq!(state.highlighted, Some(path(&[1, 1])));
}

#[tokio::test]
async fn test_cleanup_from_any_state() {
    let h = harness();
    assert!(h.send(Command::Cleanup).await.success);

    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 1]) }).await;
    h.send(Command::Preview { path: path(&[1, 0]) }).await;
    assert!(h.send(Command::Cleanup).await.success);

    let state = h.state().await;
    assert_eq!(state, SessionState::default());
    assert_eq!(h.page.listener_count(), 0);
    assert!(h.page.document().lock().styled_elements().is_empty());
}

#[tokio::test]
async fn test_deactivate_then_reactivate() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 0]) }).await;
    assert!(h.send(Command::Deactivate).await.success);
    assert!(h.send(Command::Deactivate).await.success);

    let ack = h.send(Command::Select { path: path(&[1, 0]) }).await;
    assert_eq!(ack.error.as_deref(), Some(NOT_ACTIVE_MESSAGE));
    assert!(h.page.document().lock().styled_elements().is_empty());

    h.drain();
    assert!(h.send(Command::Activate).await.success);
    assert_eq!(h.drain().len(), 1);
    assert_eq!(h.page.listener_count(), 1);
    assert_eq!(h.connector.attempts(), 2);
}

#[tokio::test]
async fn test_click_selects_closest_element() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.drain();

    let paragraph = h.node(&[1, 1, 0]);
    let text = h.page.document().lock().children(paragraph)[0];
    let click = h.page.click(text);

    let element = h.next_event().await;
    assert_eq!(element.tag_name, "p");
    assert_eq!(element.path, path(&[1, 1, 0]));
    assert_eq!(element.text_content.as_deref(), Some("Hello"));
    assert!(click.is_default_prevented());
    assert_eq!(h.state().await.highlighted, Some(path(&[1, 1, 0])));
}

#[tokio::test]
async fn test_click_ignored_while_inactive() {
    let mut h = harness();
    let click = h.page.click(h.node(&[1, 0]));
    assert!(!click.is_default_prevented());

    h.send(Command::Activate).await;
    h.send(Command::Deactivate).await;
    h.drain();

    let click = h.page.click(h.node(&[1, 0]));
    assert!(!click.is_default_prevented());
    assert!(h.drain().is_empty());
}

#[tokio::test]
async fn test_pagehide_clears_session() {
    let h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 2]) }).await;

    h.page.dispatch(PageEvent::PageHide);
    let state = h.wait_for(|s| !s.active).await;
    assert_eq!(state.highlighted, None);
    assert!(!state.listening);
    assert!(h.page.document().lock().styled_elements().is_empty());
}

#[tokio::test]
async fn test_unload_stops_agent() {
    let mut h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 2]) }).await;

    h.page.dispatch(PageEvent::Unload);
    (&mut h._task).await.unwrap();

    assert!(h.handle.is_stopped());
    assert!(h.page.document().lock().styled_elements().is_empty());
    let outcome = h.handle.send(Command::Cleanup);
    let ack = outcome.resolve(ACK_TIMEOUT).await.unwrap();
    assert!(!ack.success);
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_within_bound() {
    let h = harness();
    h.send(Command::Activate).await;

    for round in 1..=3 {
        h.connector.drop_links();
        let state = h.wait_for(|s| s.reconnect_pending).await;
        assert_eq!(state.reconnect_failures, round);
        assert!(state.active);

        tokio::time::sleep(Duration::from_millis(2100)).await;
        h.wait_for(|s| s.linked).await;
        assert_eq!(h.connector.attempts(), round + 1);
    }
}

#[tokio::test(start_paused = true)]
async fn test_fourth_drop_deactivates() {
    let h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 1]) }).await;

    for _ in 0..3 {
        h.connector.drop_links();
        h.wait_for(|s| s.reconnect_pending).await;
        tokio::time::sleep(Duration::from_millis(2100)).await;
        h.wait_for(|s| s.linked).await;
    }

    h.connector.drop_links();
    let state = h.wait_for(|s| !s.active).await;
    assert!(!state.listening);
    assert!(!state.reconnect_pending);
    assert_eq!(state.highlighted, None);
    assert!(h.page.document().lock().styled_elements().is_empty());

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(h.connector.attempts(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_activate_resets_reconnect_counter() {
    let h = harness();
    h.send(Command::Activate).await;

    h.connector.drop_links();
    h.wait_for(|s| s.reconnect_pending).await;
    tokio::time::sleep(Duration::from_millis(2100)).await;
    h.wait_for(|s| s.linked).await;
    assert_eq!(h.state().await.reconnect_failures, 1);

    h.send(Command::Activate).await;
    assert_eq!(h.state().await.reconnect_failures, 0);
}

#[tokio::test(start_paused = true)]
async fn test_refused_connects_count_as_failures() {
    let h = harness();
    h.connector.refuse.store(true, Ordering::SeqCst);
    assert!(h.send(Command::Activate).await.success);
    assert_eq!(h.state().await.reconnect_failures, 1);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = h.wait_for(|s| !s.active).await;
    assert!(!state.listening);
    assert_eq!(h.connector.attempts(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_zero_attempts_disables_reconnection() {
    let h = harness_with(AgentConfig {
        reconnect_attempts: 0,
        ..AgentConfig::default()
    });
    h.send(Command::Activate).await;
    h.connector.drop_links();

    let state = h.wait_for(|s| !s.active).await;
    assert!(!state.reconnect_pending);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(h.connector.attempts(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_repairs_stripped_highlight() {
    let h = harness();
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 0]) }).await;

    let node = h.node(&[1, 0]);
    h.page.document().lock().set_attribute(node, "style", "").unwrap();
    assert_eq!(h.outline(&[1, 0]), None);

    tokio::time::sleep(Duration::from_millis(2100)).await;
    h.state().await;
    assert_eq!(h.outline(&[1, 0]).as_deref(), Some("2px solid #1a73e8"));

    h.send(Command::Cleanup).await;
    assert!(!h.state().await.style_watch_running);
}

#[tokio::test(start_paused = true)]
async fn test_watchdog_disabled() {
    let h = harness_with(AgentConfig {
        style_check_enabled: false,
        ..AgentConfig::default()
    });
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 0]) }).await;
    assert!(!h.state().await.style_watch_running);

    let node = h.node(&[1, 0]);
    h.page.document().lock().set_attribute(node, "style", "").unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;
    h.state().await;
    assert_eq!(h.outline(&[1, 0]), None);
}

#[tokio::test(start_paused = true)]
async fn test_zero_style_check_interval_disables_watchdog() {
    let h = harness_with(AgentConfig {
        style_check_interval_ms: 0,
        ..AgentConfig::default()
    });
    h.send(Command::Activate).await;
    h.send(Command::Select { path: path(&[1, 0]) }).await;

    let node = h.node(&[1, 0]);
    h.page.document().lock().set_attribute(node, "style", "").unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let state = h.state().await;
    assert!(state.active);
    assert!(!state.style_watch_running);
    assert_eq!(state.highlighted, Some(path(&[1, 0])));
    assert_eq!(h.outline(&[1, 0]), None);

    let ack = h.send(Command::Select { path: path(&[1, 1]) }).await;
    assert!(ack.success);
    assert_eq!(h.outline(&[1, 1]).as_deref(), Some("2px solid #1a73e8"));
}

#[tokio::test]
async fn test_emit_failure_does_not_fail_command() {
    let page = Page::new(Document::from_json_str(PAGE).unwrap());
    let (events_tx, events_rx) = mpsc::unbounded_channel::<InspectorEvent>();
    drop(events_rx);
    let (handle, _task) = PageAgent::spawn(
        page,
        AgentConfig::default(),
        &HighlightConfig::default(),
        Arc::new(ScriptedConnector::default()),
        Arc::new(events_tx),
    );

    let ack = handle.dispatch(Command::Activate, ACK_TIMEOUT).await.unwrap();
    assert!(ack.success);
}
