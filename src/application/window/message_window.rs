//! The per-channel message window.
//!
//! Owns the live, bounded, ordered set of messages displayed for one
//! channel: initial load, paging in both directions, jumps, and live
//! event application. The window is the single merge point between the
//! paginated history path and the live event feed; every merge keeps the
//! list strictly descending by identifier and free of duplicates.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::fetch_guard::{FetchDirection, FetchGuard, PreemptToken};
use crate::application::services::{ChannelState, ChannelStateCache};
use crate::domain::entities::{Channel, ChannelId, Message, MessageId};
use crate::domain::ports::{MessageHistoryPort, MessageQuery, MessageSort};

/// Page size for the first load of a channel.
pub const INITIAL_FETCH_LIMIT: u8 = 30;

/// Page size for pagination and jumps.
pub const FETCH_LIMIT: u8 = 50;

/// Maximum number of messages kept loaded; paging past this truncates the
/// opposite end of the window.
pub const DISPLAY_LIMIT: usize = 150;

/// Where the view should scroll after an initial load completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InitialScroll {
    /// Restore a previously saved scroll offset (resumed history window).
    Restore(f64),
    /// Anchor to the live edge.
    LiveEdge,
}

/// Outcome of a jump operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpResult {
    /// The target is already loaded; the caller only needs to scroll.
    ScrollOnly,
    /// The window was replaced with freshly fetched messages.
    Loaded,
    /// The fetch failed or was superseded; the window is unchanged.
    Aborted,
}

/// Mutable window state shared between clones and in-flight continuations.
#[derive(Debug)]
struct WindowState {
    channel: Channel,
    messages: Vec<Message>,
    at_start: bool,
    at_end: bool,
    guard: FetchGuard,
    /// Side buffer for live inserts arriving while an initial or
    /// jump-to-live fetch is replacing the window wholesale.
    collected: Option<Vec<Message>>,
}

impl WindowState {
    fn new(channel: Channel) -> Self {
        Self {
            channel,
            messages: Vec::new(),
            at_start: false,
            at_end: true,
            guard: FetchGuard::new(),
            collected: None,
        }
    }

    /// Merges buffered live inserts into the window after a failed
    /// wholesale fetch, so they are not lost while the user retries.
    fn flush_collected(&mut self) {
        if let Some(buffered) = self.collected.take()
            && self.at_end
            && !buffered.is_empty()
        {
            self.messages = merge_sorted(vec![std::mem::take(&mut self.messages), buffered]);
        }
    }
}

/// Combines message runs into one strictly descending, deduplicated list.
fn merge_sorted(parts: Vec<Vec<Message>>) -> Vec<Message> {
    let mut all: Vec<Message> = parts.into_iter().flatten().collect();
    all.sort_unstable_by(|a, b| b.id().cmp(a.id()));
    all.dedup_by(|a, b| a.id() == b.id());
    all
}

/// Deferred merge for a pagination fetch.
///
/// The scroll anchor lets the caller pin the viewport to a message that
/// exists both before and after the merge; `commit` applies the merge once
/// the caller is ready for the layout to change. A pre-empted commit is a
/// no-op.
#[must_use = "the fetched page is only applied when commit() is called"]
pub struct PageCommit {
    state: Arc<Mutex<WindowState>>,
    token: PreemptToken,
    direction: FetchDirection,
    incoming: Vec<Message>,
    scroll_anchor: MessageId,
}

impl PageCommit {
    /// Identifier of the message the caller should keep visually fixed
    /// across the merge.
    #[must_use]
    pub const fn scroll_anchor(&self) -> &MessageId {
        &self.scroll_anchor
    }

    /// Applies the fetched page to the window.
    pub fn commit(self) {
        let mut st = self.state.lock();
        if self.token.is_preempted() {
            return;
        }

        let mut merged = merge_sorted(vec![std::mem::take(&mut st.messages), self.incoming]);
        let overflow = merged.len().saturating_sub(DISPLAY_LIMIT);

        if overflow > 0 {
            match self.direction {
                // Paging up: drop from the newest end, the live edge is no
                // longer represented.
                FetchDirection::Upwards => {
                    st.at_end = false;
                    merged.drain(..overflow);
                }
                // Paging down: drop from the oldest end.
                _ => {
                    st.at_start = false;
                    merged.truncate(DISPLAY_LIMIT);
                }
            }
        }

        st.messages = merged;
        st.guard.finish();
    }
}

/// The authoritative message window for one channel.
///
/// Cheap to clone; clones share state. All mutation happens under a short
/// critical section, never across an await point, and every post-await
/// mutation first checks the fetch's pre-emption token.
#[derive(Clone)]
pub struct MessageWindow {
    state: Arc<Mutex<WindowState>>,
    history: Arc<dyn MessageHistoryPort>,
}

impl MessageWindow {
    /// Creates a window for a channel. The window starts empty and assumed
    /// at the live edge; call [`initial_load`](Self::initial_load) to fill it.
    #[must_use]
    pub fn new(channel: Channel, history: Arc<dyn MessageHistoryPort>) -> Self {
        Self {
            state: Arc::new(Mutex::new(WindowState::new(channel))),
            history,
        }
    }

    /// Loads the window fresh, pre-empting any in-flight fetch.
    ///
    /// Without `nearby`, a snapshot cached for this channel is restored
    /// without network access; otherwise a page of [`INITIAL_FETCH_LIMIT`]
    /// messages is fetched from the live edge or centered on `nearby`.
    /// Returns where the view should scroll, or `None` if the load failed
    /// or was superseded.
    pub async fn initial_load(
        &self,
        nearby: Option<MessageId>,
        cache: &ChannelStateCache,
    ) -> Option<InitialScroll> {
        let (token, channel_id, existing, use_existing) = {
            let mut st = self.state.lock();
            st.guard.preempt();
            let token = st.guard.begin(FetchDirection::Initial);

            // The window does not re-create on channel switch; reset here.
            st.messages.clear();
            st.at_start = false;
            st.at_end = true;
            st.collected = Some(Vec::new());

            // The cached snapshot is consumed either way; a nearby-centered
            // load replaces it outright.
            let existing = cache.unmanage(st.channel.id());
            let use_existing = existing.is_some() && nearby.is_none();

            (token, st.channel.id().clone(), existing, use_existing)
        };

        let fetched = if use_existing {
            debug!(channel = %channel_id, "restoring cached window state");
            existing
                .as_ref()
                .map(|state| state.messages.clone())
                .unwrap_or_default()
        } else {
            let query = match &nearby {
                Some(id) => MessageQuery::latest(INITIAL_FETCH_LIMIT).nearby_message(id.clone()),
                None => MessageQuery::latest(INITIAL_FETCH_LIMIT),
            };

            match self.history.fetch_messages(&channel_id, query).await {
                Ok(page) => page.messages,
                Err(error) => {
                    let mut st = self.state.lock();
                    if token.is_preempted() {
                        return None;
                    }
                    warn!(channel = %channel_id, %error, "initial load failed");
                    st.flush_collected();
                    st.guard.fail();
                    return None;
                }
            }
        };

        let mut st = self.state.lock();
        if token.is_preempted() {
            return None;
        }

        if nearby.is_some() {
            // We only know we are at the end if the fetched page contains
            // the channel's known newest message.
            let latest = st.channel.last_message_id().cloned();
            st.at_end = latest.is_some_and(|id| fetched.iter().any(|msg| *msg.id() == id));
        } else if !use_existing && fetched.len() < usize::from(INITIAL_FETCH_LIMIT) {
            st.at_start = true;
        } else if let Some(state) = &existing {
            st.at_start = state.at_start;
            st.at_end = state.at_end;
        }

        let buffered = st.collected.take().unwrap_or_default();
        st.messages = if st.at_end {
            merge_sorted(vec![buffered, fetched])
        } else {
            merge_sorted(vec![fetched])
        };

        st.guard.finish();

        if use_existing && !st.at_end {
            let offset = existing.and_then(|state| state.scroll_offset).unwrap_or(0.0);
            Some(InitialScroll::Restore(offset))
        } else if st.at_end {
            Some(InitialScroll::LiveEdge)
        } else {
            None
        }
    }

    /// Fetches a page of messages older than the current oldest.
    ///
    /// No-op while at the start of history or while another fetch is in
    /// flight (unless it failed). Returns the deferred merge, or `None`
    /// when nothing was fetched.
    pub async fn fetch_older(&self) -> Option<PageCommit> {
        let (token, channel_id, before) = {
            let mut st = self.state.lock();
            if st.at_start || !st.guard.can_fetch() {
                return None;
            }
            // Oldest loaded message is the tail of the descending list.
            let before = st.messages.last()?.id().clone();
            let token = st.guard.begin(FetchDirection::Upwards);
            (token, st.channel.id().clone(), before)
        };

        let query = MessageQuery::latest(FETCH_LIMIT).before_message(before);
        let page = match self.history.fetch_messages(&channel_id, query).await {
            Ok(page) => page,
            Err(error) => {
                let mut st = self.state.lock();
                if !token.is_preempted() {
                    warn!(channel = %channel_id, %error, "upwards fetch failed");
                    st.guard.fail();
                }
                return None;
            }
        };

        let mut st = self.state.lock();
        if token.is_preempted() {
            return None;
        }

        if page.len() < usize::from(FETCH_LIMIT) {
            st.at_start = true;
        }

        if page.is_empty() {
            st.guard.finish();
            return None;
        }

        let scroll_anchor = st.messages.last().map_or_else(
            || page.messages[0].id().clone(),
            |oldest| oldest.id().clone(),
        );

        Some(PageCommit {
            state: Arc::clone(&self.state),
            token,
            direction: FetchDirection::Upwards,
            incoming: page.messages,
            scroll_anchor,
        })
    }

    /// Fetches a page of messages newer than the current newest.
    ///
    /// Symmetric to [`fetch_older`](Self::fetch_older); no-op while at the
    /// live edge.
    pub async fn fetch_newer(&self) -> Option<PageCommit> {
        let (token, channel_id, after) = {
            let mut st = self.state.lock();
            if st.at_end || !st.guard.can_fetch() {
                return None;
            }
            let after = st.messages.first()?.id().clone();
            let token = st.guard.begin(FetchDirection::Downwards);
            (token, st.channel.id().clone(), after)
        };

        let query = MessageQuery::latest(FETCH_LIMIT)
            .after_message(after)
            .sorted(MessageSort::Oldest);
        let page = match self.history.fetch_messages(&channel_id, query).await {
            Ok(page) => page,
            Err(error) => {
                let mut st = self.state.lock();
                if !token.is_preempted() {
                    warn!(channel = %channel_id, %error, "downwards fetch failed");
                    st.guard.fail();
                }
                return None;
            }
        };

        let mut st = self.state.lock();
        if token.is_preempted() {
            return None;
        }

        if page.len() < usize::from(FETCH_LIMIT) {
            st.at_end = true;
        }

        if page.is_empty() {
            st.guard.finish();
            return None;
        }

        let scroll_anchor = st.messages.first().map_or_else(
            || page.messages[0].id().clone(),
            |newest| newest.id().clone(),
        );

        Some(PageCommit {
            state: Arc::clone(&self.state),
            token,
            direction: FetchDirection::Downwards,
            incoming: page.messages,
            scroll_anchor,
        })
    }

    /// Jumps to the present messages.
    ///
    /// If already at the live edge only a scroll is needed; otherwise the
    /// window is refetched from the live edge.
    pub async fn jump_to_live(&self) -> JumpResult {
        let (token, channel_id) = {
            let mut st = self.state.lock();
            if st.at_end {
                return JumpResult::ScrollOnly;
            }
            st.guard.preempt();
            let token = st.guard.begin(FetchDirection::JumpToLive);
            st.collected = Some(Vec::new());
            (token, st.channel.id().clone())
        };

        let query = MessageQuery::latest(FETCH_LIMIT);
        let page = match self.history.fetch_messages(&channel_id, query).await {
            Ok(page) => page,
            Err(error) => {
                let mut st = self.state.lock();
                if token.is_preempted() {
                    return JumpResult::Aborted;
                }
                warn!(channel = %channel_id, %error, "jump to live failed");
                st.collected = None;
                st.guard.fail();
                return JumpResult::Aborted;
            }
        };

        let mut st = self.state.lock();
        if token.is_preempted() {
            return JumpResult::Aborted;
        }

        // A short page this high up is rare (large moderation sweeps), but
        // it does mean the whole history fits in one page.
        st.at_start = page.len() < usize::from(FETCH_LIMIT);
        st.at_end = true;

        let buffered = st.collected.take().unwrap_or_default();
        st.messages = merge_sorted(vec![buffered, page.messages]);
        st.guard.finish();

        JumpResult::Loaded
    }

    /// Jumps to a specific message.
    ///
    /// If the message is already loaded no fetch happens and the caller
    /// scrolls directly. Otherwise the window is replaced with a page
    /// centered on the target; both boundary flags are cleared rather than
    /// probed with extra requests.
    pub async fn jump_to_message(&self, message_id: MessageId) -> JumpResult {
        let (token, channel_id) = {
            let mut st = self.state.lock();
            if st.messages.iter().any(|msg| *msg.id() == message_id) {
                return JumpResult::ScrollOnly;
            }
            st.guard.preempt();
            let token = st.guard.begin(FetchDirection::JumpToMessage);
            (token, st.channel.id().clone())
        };

        let query = MessageQuery::latest(FETCH_LIMIT).nearby_message(message_id);
        let page = match self.history.fetch_messages(&channel_id, query).await {
            Ok(page) => page,
            Err(error) => {
                let mut st = self.state.lock();
                if !token.is_preempted() {
                    warn!(channel = %channel_id, %error, "jump to message failed");
                    st.guard.fail();
                }
                return JumpResult::Aborted;
            }
        };

        let mut st = self.state.lock();
        if token.is_preempted() {
            return JumpResult::Aborted;
        }

        // Assume we are somewhere in history; probing the real boundaries
        // would cost extra requests.
        st.at_start = false;
        st.at_end = false;
        st.messages = merge_sorted(vec![page.messages]);
        st.guard.finish();

        JumpResult::Loaded
    }

    /// Applies a live message insert.
    ///
    /// Buffered aside while a wholesale fetch is in flight; otherwise
    /// prepended when the window is at the live edge. Arrival is assumed
    /// monotonic so no re-sort happens, and the display limit is not
    /// enforced on this path (the next consolidating fetch trims).
    pub fn apply_live_insert(&self, message: Message) {
        let mut st = self.state.lock();
        if message.channel_id() != st.channel.id() {
            return;
        }

        let id = message.id().clone();
        st.channel.note_latest(&id);

        if let Some(collected) = st.collected.as_mut() {
            if !collected.iter().any(|msg| msg.id() == &id) {
                collected.push(message);
            }
        } else if st.at_end && !st.messages.iter().any(|msg| msg.id() == &id) {
            st.messages.insert(0, message);
        }
    }

    /// Applies a live message delete; no-op if the message is not loaded.
    pub fn apply_live_delete(&self, channel_id: &ChannelId, message_id: &MessageId) {
        let mut st = self.state.lock();
        if channel_id != st.channel.id() {
            return;
        }
        st.messages.retain(|msg| msg.id() != message_id);
        if let Some(collected) = st.collected.as_mut() {
            collected.retain(|msg| msg.id() != message_id);
        }
    }

    /// Archives the window into the cache when the view unmounts.
    ///
    /// Skipped while an initial load is still in flight: there is no
    /// meaningful state to resume yet.
    pub fn archive(&self, cache: &ChannelStateCache, scroll_offset: Option<f64>) {
        let st = self.state.lock();
        if st.guard.direction() == Some(FetchDirection::Initial) {
            return;
        }
        cache.manage(
            st.channel.id().clone(),
            ChannelState {
                messages: st.messages.clone(),
                at_start: st.at_start,
                at_end: st.at_end,
                scroll_offset,
            },
        );
    }

    /// Snapshot of the loaded messages, newest first.
    #[must_use]
    pub fn messages(&self) -> Vec<Message> {
        self.state.lock().messages.clone()
    }

    /// Number of loaded messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    /// Returns true if no messages are loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().messages.is_empty()
    }

    /// True iff no older messages exist beyond what is loaded.
    #[must_use]
    pub fn at_start(&self) -> bool {
        self.state.lock().at_start
    }

    /// True iff the window is at the live edge.
    #[must_use]
    pub fn at_end(&self) -> bool {
        self.state.lock().at_end
    }

    /// Direction of the in-flight fetch, if any.
    #[must_use]
    pub fn fetch_direction(&self) -> Option<FetchDirection> {
        self.state.lock().guard.direction()
    }

    /// True iff the most recent fetch attempt errored.
    #[must_use]
    pub fn failed(&self) -> bool {
        self.state.lock().guard.failed()
    }

    /// Returns true if the message is currently loaded.
    #[must_use]
    pub fn contains(&self, message_id: &MessageId) -> bool {
        self.state
            .lock()
            .messages
            .iter()
            .any(|msg| msg.id() == message_id)
    }

    /// The channel this window belongs to.
    #[must_use]
    pub fn channel(&self) -> Channel {
        self.state.lock().channel.clone()
    }

    /// Idempotency nonces of the loaded messages, for deduplicating
    /// locally-sent messages against their echoed copies.
    #[must_use]
    pub fn known_nonces(&self) -> Vec<String> {
        self.state
            .lock()
            .messages
            .iter()
            .filter_map(|msg| msg.nonce().map(str::to_owned))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::mocks::ScriptedHistory;
    use chrono::Utc;

    const CHANNEL: &str = "chan";

    fn msg(id: &str) -> Message {
        Message::new(id, CHANNEL, "author", "content", Utc::now())
    }

    /// Ids formatted so lexical order equals numeric order.
    fn id_at(index: usize) -> String {
        format!("01{index:05}")
    }

    /// `count` messages newest-first, covering indices
    /// `[start, start + count)`.
    fn page(start: usize, count: usize) -> Vec<Message> {
        (start..start + count).rev().map(|i| msg(&id_at(i))).collect()
    }

    fn window_with(history: &Arc<ScriptedHistory>) -> MessageWindow {
        let history: Arc<dyn MessageHistoryPort> = history.clone();
        MessageWindow::new(Channel::new(CHANNEL), history)
    }

    fn window_for(channel: Channel, history: &Arc<ScriptedHistory>) -> MessageWindow {
        let history: Arc<dyn MessageHistoryPort> = history.clone();
        MessageWindow::new(channel, history)
    }

    fn seeded_cache(messages: Vec<Message>, at_start: bool, at_end: bool) -> ChannelStateCache {
        let cache = ChannelStateCache::new();
        cache.manage(
            ChannelId::from(CHANNEL),
            ChannelState {
                messages,
                at_start,
                at_end,
                scroll_offset: Some(350.0),
            },
        );
        cache
    }

    async fn wait_for_calls(history: &ScriptedHistory, n: usize) {
        for _ in 0..1000 {
            if history.call_count() >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("history never reached {n} calls");
    }

    fn assert_descending_unique(messages: &[Message]) {
        for pair in messages.windows(2) {
            assert!(
                pair[0].id() > pair[1].id(),
                "window must be strictly descending by id"
            );
        }
    }

    #[tokio::test]
    async fn test_initial_load_from_live_edge() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(0, 5));
        let window = window_with(&history);
        let cache = ChannelStateCache::new();

        let scroll = window.initial_load(None, &cache).await;

        assert_eq!(scroll, Some(InitialScroll::LiveEdge));
        assert_eq!(window.len(), 5);
        // Short page means the whole history is loaded.
        assert!(window.at_start());
        assert!(window.at_end());
        assert!(!window.failed());
        assert_descending_unique(&window.messages());
    }

    #[tokio::test]
    async fn test_initial_load_sorts_and_dedups() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(vec![msg("01A"), msg("01C"), msg("01B"), msg("01C")]);
        let window = window_with(&history);

        window.initial_load(None, &ChannelStateCache::new()).await;

        let ids: Vec<_> = window
            .messages()
            .iter()
            .map(|m| m.id().as_str().to_owned())
            .collect();
        assert_eq!(ids, vec!["01C", "01B", "01A"]);
    }

    #[tokio::test]
    async fn test_initial_load_restores_cache_without_fetch() {
        let history = Arc::new(ScriptedHistory::new());
        let window = window_with(&history);
        let cache = seeded_cache(page(10, 20), false, false);

        let scroll = window.initial_load(None, &cache).await;

        assert_eq!(history.call_count(), 0);
        assert_eq!(scroll, Some(InitialScroll::Restore(350.0)));
        assert_eq!(window.len(), 20);
        assert!(!window.at_start());
        assert!(!window.at_end());
        // One-shot consumption: the entry is gone now.
        assert!(cache.unmanage(&ChannelId::from(CHANNEL)).is_none());
    }

    #[tokio::test]
    async fn test_initial_load_nearby_bypasses_cache() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(40, 30));
        let window = window_with(&history);
        let cache = seeded_cache(page(0, 5), false, true);

        window
            .initial_load(Some(MessageId::from(id_at(55).as_str())), &cache)
            .await;

        assert_eq!(history.call_count(), 1);
        assert_eq!(window.len(), 30);
        // Consumed even though it was not used.
        assert!(cache.unmanage(&ChannelId::from(CHANNEL)).is_none());
    }

    #[tokio::test]
    async fn test_initial_load_nearby_detects_live_edge() {
        let latest = id_at(69);

        // Page containing the known newest message: at the end.
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(40, 30));
        let channel = Channel::new(CHANNEL).with_last_message_id(latest.as_str());
        let window = window_for(channel, &history);
        window
            .initial_load(
                Some(MessageId::from(id_at(50).as_str())),
                &ChannelStateCache::new(),
            )
            .await;
        assert!(window.at_end());

        // Page that stops short of it: somewhere in history.
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(10, 30));
        let channel = Channel::new(CHANNEL).with_last_message_id(latest.as_str());
        let window = window_for(channel, &history);
        window
            .initial_load(
                Some(MessageId::from(id_at(20).as_str())),
                &ChannelStateCache::new(),
            )
            .await;
        assert!(!window.at_end());
    }

    #[tokio::test]
    async fn test_initial_load_failure_allows_retry() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_error(crate::domain::FetchError::network("timeout"));
        history.push_page(page(0, 5));
        let window = window_with(&history);
        let cache = ChannelStateCache::new();

        let scroll = window.initial_load(None, &cache).await;
        assert_eq!(scroll, None);
        assert!(window.failed());
        assert!(window.is_empty());
        assert_eq!(window.fetch_direction(), None);

        let scroll = window.initial_load(None, &cache).await;
        assert_eq!(scroll, Some(InitialScroll::LiveEdge));
        assert!(!window.failed());
        assert_eq!(window.len(), 5);
    }

    #[tokio::test]
    async fn test_live_inserts_buffered_during_initial_load() {
        let history = Arc::new(ScriptedHistory::new());
        let gate = history.push_gated_page(page(0, 30));
        let window = window_with(&history);
        let cache = ChannelStateCache::new();

        let task = tokio::spawn({
            let window = window.clone();
            async move { window.initial_load(None, &cache).await }
        });
        wait_for_calls(&history, 1).await;

        // A live message lands while the fetch is outstanding.
        let live = msg(&id_at(30));
        window.apply_live_insert(live.clone());
        assert!(window.is_empty(), "buffered, not applied directly");

        gate.notify_one();
        let scroll = task.await.unwrap();

        assert_eq!(scroll, Some(InitialScroll::LiveEdge));
        assert_eq!(window.len(), 31);
        assert_eq!(window.messages()[0].id(), live.id());
        assert_descending_unique(&window.messages());
    }

    #[tokio::test]
    async fn test_preempted_fetch_result_is_discarded() {
        let history = Arc::new(ScriptedHistory::new());
        let gate = history.push_gated_page(page(0, 30));
        history.push_page(page(100, 30));
        let window = window_with(&history);

        let task = tokio::spawn({
            let window = window.clone();
            async move { window.initial_load(None, &ChannelStateCache::new()).await }
        });
        wait_for_calls(&history, 1).await;

        // Supersede the in-flight initial load with a jump.
        let result = window.jump_to_message(MessageId::from(id_at(110).as_str())).await;
        assert_eq!(result, JumpResult::Loaded);
        let after_jump = window.messages();

        gate.notify_one();
        assert_eq!(task.await.unwrap(), None);

        // The stale result never surfaced.
        assert_eq!(window.messages(), after_jump);
        assert!(window.messages().iter().all(|m| m.id().as_str() >= id_at(100).as_str()));
    }

    #[tokio::test]
    async fn test_fetch_older_prepends_and_flags_start() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(50, 30));
        let window = window_with(&history);
        window.initial_load(None, &ChannelStateCache::new()).await;

        history.push_page(page(40, 10));
        let commit = window.fetch_older().await.expect("page expected");
        assert_eq!(commit.scroll_anchor().as_str(), id_at(50));
        assert_eq!(window.fetch_direction(), Some(FetchDirection::Upwards));

        commit.commit();

        assert_eq!(window.len(), 40);
        assert!(window.at_start(), "short page marks the start");
        assert_eq!(window.fetch_direction(), None);
        assert_descending_unique(&window.messages());

        let queries = history.recorded_queries();
        assert_eq!(
            queries[1].1.before.as_ref().unwrap().as_str(),
            id_at(50),
            "pages strictly older than the current oldest"
        );
    }

    #[tokio::test]
    async fn test_fetch_older_noop_at_start_or_in_flight() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(0, 5));
        let window = window_with(&history);
        window.initial_load(None, &ChannelStateCache::new()).await;
        assert!(window.at_start());

        assert!(window.fetch_older().await.is_none());
        assert_eq!(history.call_count(), 1);
    }

    #[tokio::test]
    async fn test_display_limit_boundaries_upwards() {
        // (window, fetched, expected_len, expect_trim)
        for (seed, fetched, expected_len, trimmed) in [
            (100, 50, 150, false),
            (101, 50, 150, true),
            (150, 50, 150, true),
        ] {
            let history = Arc::new(ScriptedHistory::new());
            let window = window_with(&history);
            let cache = seeded_cache(page(200, seed), false, true);
            window.initial_load(None, &cache).await;

            history.push_page(page(200 - fetched, fetched));
            let commit = window.fetch_older().await.expect("page expected");
            commit.commit();

            assert_eq!(window.len(), expected_len);
            assert_eq!(
                !window.at_end(),
                trimmed,
                "truncating the newest end leaves the live edge unrepresented"
            );
            if trimmed {
                // The overall newest message fell off the newest end.
                assert!(!window.contains(&MessageId::from(id_at(200 + seed - 1).as_str())));
            }
            assert_descending_unique(&window.messages());
        }
    }

    #[tokio::test]
    async fn test_fetch_newer_appends_and_truncates_oldest() {
        let history = Arc::new(ScriptedHistory::new());
        let window = window_with(&history);
        let cache = seeded_cache(page(100, 150), true, false);
        window.initial_load(None, &cache).await;

        // Server returns oldest-first when paging downwards.
        let mut newer = page(250, 50);
        newer.reverse();
        history.push_page(newer);

        let commit = window.fetch_newer().await.expect("page expected");
        assert_eq!(commit.scroll_anchor().as_str(), id_at(249));
        commit.commit();

        assert_eq!(window.len(), DISPLAY_LIMIT);
        assert!(!window.at_start(), "oldest end was truncated");
        assert!(!window.at_end(), "a full page does not prove the live edge");
        assert!(!window.contains(&MessageId::from(id_at(100).as_str())));
        assert!(window.contains(&MessageId::from(id_at(299).as_str())));
        assert_descending_unique(&window.messages());

        let queries = history.recorded_queries();
        assert_eq!(queries[0].1.after.as_ref().unwrap().as_str(), id_at(249));
        assert_eq!(queries[0].1.sort, Some(MessageSort::Oldest));
    }

    #[tokio::test]
    async fn test_fetch_newer_short_page_reaches_live_edge() {
        let history = Arc::new(ScriptedHistory::new());
        let window = window_with(&history);
        let cache = seeded_cache(page(100, 30), false, false);
        window.initial_load(None, &cache).await;

        history.push_page(page(130, 10));
        let commit = window.fetch_newer().await.expect("page expected");
        commit.commit();

        assert!(window.at_end());
        assert_eq!(window.len(), 40);
    }

    #[tokio::test]
    async fn test_jump_to_loaded_message_is_idempotent() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(0, 30));
        let window = window_with(&history);
        window.initial_load(None, &ChannelStateCache::new()).await;
        let before = window.messages();

        let result = window.jump_to_message(MessageId::from(id_at(15).as_str())).await;

        assert_eq!(result, JumpResult::ScrollOnly);
        assert_eq!(history.call_count(), 1, "no network call");
        assert_eq!(window.messages(), before);
    }

    #[tokio::test]
    async fn test_jump_to_message_replaces_window() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(200, 30));
        let window = window_with(&history);
        window.initial_load(None, &ChannelStateCache::new()).await;

        history.push_page(page(50, 50));
        let result = window.jump_to_message(MessageId::from(id_at(75).as_str())).await;

        assert_eq!(result, JumpResult::Loaded);
        assert_eq!(window.len(), 50);
        assert!(!window.at_start());
        assert!(!window.at_end());
        assert!(window.contains(&MessageId::from(id_at(75).as_str())));
    }

    #[tokio::test]
    async fn test_jump_to_live_scrolls_when_already_at_end() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(0, 30));
        let window = window_with(&history);
        window.initial_load(None, &ChannelStateCache::new()).await;

        assert_eq!(window.jump_to_live().await, JumpResult::ScrollOnly);
        assert_eq!(history.call_count(), 1);
    }

    #[tokio::test]
    async fn test_jump_to_live_refetches_from_history() {
        let history = Arc::new(ScriptedHistory::new());
        let window = window_with(&history);
        let cache = seeded_cache(page(100, 30), false, false);
        window.initial_load(None, &cache).await;

        history.push_page(page(500, 50));
        let result = window.jump_to_live().await;

        assert_eq!(result, JumpResult::Loaded);
        assert!(window.at_end());
        assert!(!window.at_start());
        assert_eq!(window.len(), 50);
        assert_eq!(window.messages()[0].id().as_str(), id_at(549));
    }

    #[tokio::test]
    async fn test_live_insert_applies_only_at_live_edge() {
        let history = Arc::new(ScriptedHistory::new());
        let window = window_with(&history);
        let cache = seeded_cache(page(100, 10), false, false);
        window.initial_load(None, &cache).await;

        window.apply_live_insert(msg(&id_at(500)));
        assert_eq!(window.len(), 10, "ignored while in history");

        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(0, 10));
        let window = window_with(&history);
        window.initial_load(None, &ChannelStateCache::new()).await;

        window.apply_live_insert(msg(&id_at(10)));
        assert_eq!(window.len(), 11);
        assert_eq!(window.messages()[0].id().as_str(), id_at(10));
    }

    #[tokio::test]
    async fn test_live_insert_ignores_other_channels_and_duplicates() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(0, 10));
        let window = window_with(&history);
        window.initial_load(None, &ChannelStateCache::new()).await;

        window.apply_live_insert(Message::new("01X", "elsewhere", "a", "c", Utc::now()));
        assert_eq!(window.len(), 10);

        window.apply_live_insert(msg(&id_at(9)));
        assert_eq!(window.len(), 10, "duplicate id is corrected transparently");
    }

    #[tokio::test]
    async fn test_live_delete_removes_message() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(0, 10));
        let window = window_with(&history);
        window.initial_load(None, &ChannelStateCache::new()).await;

        window.apply_live_delete(&ChannelId::from(CHANNEL), &MessageId::from(id_at(5).as_str()));
        assert_eq!(window.len(), 9);
        assert!(!window.contains(&MessageId::from(id_at(5).as_str())));

        // Absent id is a no-op.
        window.apply_live_delete(&ChannelId::from(CHANNEL), &MessageId::from("01ZZZ"));
        assert_eq!(window.len(), 9);
    }

    #[tokio::test]
    async fn test_archive_round_trip() {
        let history = Arc::new(ScriptedHistory::new());
        history.push_page(page(0, 10));
        let window = window_with(&history);
        let cache = ChannelStateCache::new();
        window.initial_load(None, &cache).await;

        window.archive(&cache, Some(350.0));

        let restored = cache.unmanage(&ChannelId::from(CHANNEL)).unwrap();
        assert_eq!(restored.messages.len(), 10);
        assert!(restored.at_end);
        assert_eq!(restored.scroll_offset, Some(350.0));
    }

    #[tokio::test]
    async fn test_archive_skipped_during_initial_load() {
        let history = Arc::new(ScriptedHistory::new());
        let gate = history.push_gated_page(page(0, 10));
        let window = window_with(&history);
        let cache = ChannelStateCache::new();

        let task = tokio::spawn({
            let window = window.clone();
            let cache = cache.clone();
            async move { window.initial_load(None, &cache).await }
        });
        wait_for_calls(&history, 1).await;

        window.archive(&cache, None);
        assert!(cache.is_empty(), "never-completed load is not archived");

        gate.notify_one();
        task.await.unwrap();
    }
}
