// SPDX-FileCopyrightText: 2026 Palaver Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message store for a single chat session.
//!
//! Records are only ever appended. The one exception is the in-progress
//! assistant record: while a streamed reply is arriving, chunks are concatenated
//! onto it in place. It is always the last record, and appending anything else
//! closes it.

use crate::types::{ChatMessage, MessageId, Role};

/// Ordered, append-only sequence of [`ChatMessage`] records.
#[derive(Debug, Default, Clone)]
pub struct MessageStore {
    records: Vec<ChatMessage>,
    in_progress: Option<MessageId>,
}

impl MessageStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a user record.
    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        self.append(Role::User, content.into())
    }

    /// Appends a finished assistant record.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> MessageId {
        self.append(Role::Assistant, content.into())
    }

    /// Appends an assistant record seeded with `chunk` and marks it in progress.
    pub fn begin_assistant(&mut self, chunk: impl Into<String>) -> MessageId {
        let id = self.append(Role::Assistant, chunk.into());
        self.in_progress = Some(id.clone());
        id
    }

    /// Concatenates `chunk` onto the in-progress record.
    ///
    /// Returns `None` without touching anything when no record is in progress.
    pub fn extend_in_progress(&mut self, chunk: &str) -> Option<MessageId> {
        let id = self.in_progress.as_ref()?;
        let last = self.records.last_mut()?;
        if &last.id != id {
            return None;
        }
        last.content.push_str(chunk);
        Some(last.id.clone())
    }

    /// Closes the in-progress record, freezing its content.
    pub fn finish_in_progress(&mut self) -> Option<MessageId> {
        self.in_progress.take()
    }

    /// The id of the record currently being extended, if any.
    pub fn in_progress(&self) -> Option<&MessageId> {
        self.in_progress.as_ref()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[ChatMessage] {
        &self.records
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.records.last()
    }

    /// Looks up a record by id.
    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.records.iter().rev().find(|m| &m.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn append(&mut self, role: Role, content: String) -> MessageId {
        self.in_progress = None;
        let id = MessageId::new_v4();
        self.records.push(ChatMessage {
            id: id.clone(),
            role,
            content,
        });
        id
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn push_user_then_assistant_keeps_order() {
        let mut store = MessageStore::new();
        store.push_user("hello");
        store.push_assistant("hi");

        let roles: Vec<Role> = store.records().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(store.records()[1].content, "hi");
        assert!(store.in_progress().is_none());
    }

    #[test]
    fn extend_in_progress_concatenates() {
        let mut store = MessageStore::new();
        store.push_user("hi");
        let id = store.begin_assistant("He");
        assert_eq!(store.extend_in_progress("llo"), Some(id.clone()));

        assert_eq!(store.len(), 2);
        assert_eq!(store.get(&id).unwrap().content, "Hello");
    }

    #[test]
    fn extend_without_in_progress_is_noop() {
        let mut store = MessageStore::new();
        store.push_assistant("done");
        assert_eq!(store.extend_in_progress("more"), None);
        assert_eq!(store.last().unwrap().content, "done");
    }

    #[test]
    fn finished_record_cannot_be_extended() {
        let mut store = MessageStore::new();
        let id = store.begin_assistant("a");
        assert_eq!(store.finish_in_progress(), Some(id));
        assert_eq!(store.extend_in_progress("b"), None);
        assert_eq!(store.last().unwrap().content, "a");
    }

    #[test]
    fn appending_closes_in_progress_record() {
        let mut store = MessageStore::new();
        store.begin_assistant("partial");
        store.push_assistant("Error");

        assert!(store.in_progress().is_none());
        assert_eq!(store.extend_in_progress("x"), None);
        assert_eq!(store.records()[0].content, "partial");
    }

    #[derive(Debug, Clone)]
    enum Op {
        User(String),
        Assistant(String),
        Begin(String),
        Extend(String),
        Finish,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            "[a-z]{0,6}".prop_map(Op::User),
            "[a-z]{0,6}".prop_map(Op::Assistant),
            "[a-z]{0,6}".prop_map(Op::Begin),
            "[a-z]{0,6}".prop_map(Op::Extend),
            Just(Op::Finish),
        ]
    }

    proptest! {
        #[test]
        fn only_the_last_record_ever_changes(ops in proptest::collection::vec(op(), 0..40)) {
            let mut store = MessageStore::new();
            for op in ops {
                let before = store.records().to_vec();
                match op {
                    Op::User(s) => { store.push_user(s); }
                    Op::Assistant(s) => { store.push_assistant(s); }
                    Op::Begin(s) => { store.begin_assistant(s); }
                    Op::Extend(s) => { store.extend_in_progress(&s); }
                    Op::Finish => { store.finish_in_progress(); }
                }
                let after = store.records();
                prop_assert!(after.len() >= before.len());
                let frozen = if after.len() == before.len() {
                    before.len().saturating_sub(1)
                } else {
                    before.len()
                };
                prop_assert_eq!(&after[..frozen], &before[..frozen]);

                if let Some(id) = store.in_progress() {
                    let last = store.last().unwrap();
                    prop_assert_eq!(&last.id, id);
                    prop_assert_eq!(last.role, Role::Assistant);
                }
            }

            let ids: HashSet<_> = store.records().iter().map(|m| m.id.clone()).collect();
            prop_assert_eq!(ids.len(), store.len());
        }
    }
}
