//! Projection of the raw message window into renderable entries.
//!
//! The projector walks the newest-first message list once, deciding for
//! each message whether it continues its older neighbor's visual group
//! (the "tail") and where date, unread, and blocked-run entries belong,
//! then reverses the result into oldest-first display order. Entries are
//! memoized by key so an unchanged entry is the same `Arc` across passes,
//! which lets any reactive front end skip re-rendering it.

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::entities::{Message, MessageId, RelationshipState};

/// Two messages further apart than this never chain, same author or not.
pub const TAIL_BREAK_MS: i64 = 420_000;

/// One renderable entry of the message list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEntry {
    /// A message, with its grouping flag.
    Message {
        /// The message itself.
        message: Message,
        /// True when this message continues the group of its older
        /// neighbor (no header is rendered for it).
        tail: bool,
    },
    /// Calendar-date change marker.
    DateDivider {
        /// The day the following messages belong to.
        date: NaiveDate,
    },
    /// First-unread marker.
    UnreadDivider,
    /// A collapsed run of consecutive messages from blocked authors.
    BlockedRun {
        /// How many messages were collapsed.
        count: usize,
    },
}

impl ListEntry {
    /// Returns true for divider entries (date or unread).
    #[must_use]
    pub const fn is_divider(&self) -> bool {
        matches!(self, Self::DateDivider { .. } | Self::UnreadDivider)
    }
}

/// Memoization key for an entry.
///
/// Blocked runs are rebuilt every pass; their identity is their count and
/// position, which shift too easily to be worth caching.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum EntryKey {
    Message(MessageId, bool),
    Date(NaiveDate),
    Unread,
}

/// Stateful projector holding the memo cache between passes.
#[derive(Default)]
pub struct EntryProjector {
    cache: HashMap<EntryKey, Arc<ListEntry>>,
}

impl EntryProjector {
    /// Creates a projector with an empty memo cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cached(&self, key: &EntryKey, build: impl FnOnce() -> ListEntry) -> Arc<ListEntry> {
        self.cache
            .get(key)
            .cloned()
            .unwrap_or_else(|| Arc::new(build()))
    }

    /// Projects the newest-first message list into oldest-first display
    /// entries.
    pub fn project(
        &mut self,
        messages: &[Message],
        last_read_id: Option<&MessageId>,
        relationships: &RelationshipState,
    ) -> Vec<Arc<ListEntry>> {
        let mut entries: Vec<Arc<ListEntry>> = Vec::with_capacity(messages.len() + 4);
        let fallback = MessageId::from("0");
        let last_read_id = last_read_id.unwrap_or(&fallback);

        let mut blocked_run = 0usize;
        let mut inserted_unread_divider = false;

        for (index, message) in messages.iter().enumerate() {
            let older = messages.get(index + 1);

            // Compare against the older neighbor to decide grouping and
            // whether this message opens a new calendar day.
            let mut date = None;
            let tail = if let Some(older) = older {
                if message.created_at().date_naive() != older.created_at().date_naive() {
                    date = Some(message.created_at().date_naive());
                }

                let gap_ms = (message.created_at() - older.created_at())
                    .num_milliseconds()
                    .abs();

                !(message.author_id() != older.author_id()
                    || gap_ms >= TAIL_BREAK_MS
                    || message.masquerade() != older.masquerade()
                    || message.is_system()
                    || older.is_system()
                    || message.is_reply()
                    || (older.id() < last_read_id && !inserted_unread_divider))
            } else {
                // Oldest loaded message always starts a group.
                false
            };

            if !inserted_unread_divider && message.id() < last_read_id {
                inserted_unread_divider = true;
                entries.push(self.cached(&EntryKey::Unread, || ListEntry::UnreadDivider));
            }

            if relationships.is_blocked(message.author_id()) {
                blocked_run += 1;
            } else {
                flush_blocked_run(&mut entries, &mut blocked_run);
                let key = EntryKey::Message(message.id().clone(), tail);
                entries.push(self.cached(&key, || ListEntry::Message {
                    message: message.clone(),
                    tail,
                }));
            }

            if let Some(date) = date {
                entries.push(self.cached(&EntryKey::Date(date), || ListEntry::DateDivider { date }));
            }
        }

        flush_blocked_run(&mut entries, &mut blocked_run);

        // A divider at the head of the newest-first sequence would render
        // alone at the live edge, detached from the history it marks.
        if entries.first().is_some_and(|entry| entry.is_divider()) {
            entries.remove(0);
        }

        // Flush and repopulate so entries dropped from the window stop
        // pinning their memoized values.
        self.cache.clear();
        for entry in &entries {
            let key = match entry.as_ref() {
                ListEntry::Message { message, tail } => {
                    EntryKey::Message(message.id().clone(), *tail)
                }
                ListEntry::DateDivider { date } => EntryKey::Date(*date),
                ListEntry::UnreadDivider => EntryKey::Unread,
                ListEntry::BlockedRun { .. } => continue,
            };
            self.cache.insert(key, Arc::clone(entry));
        }

        entries.reverse();
        entries
    }
}

fn flush_blocked_run(entries: &mut Vec<Arc<ListEntry>>, blocked_run: &mut usize) {
    if *blocked_run > 0 {
        entries.push(Arc::new(ListEntry::BlockedRun { count: *blocked_run }));
        *blocked_run = 0;
    }
}
