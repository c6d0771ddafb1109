//! Bounded record of task lifecycles.
use std::{
    collections::{HashMap, VecDeque},
    sync::{Mutex, PoisonError},
};

use fabric_model::{ModelResult, TaskId, TaskState};
use tracing::trace;

/// Current state plus the path that led to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TaskRecord {
    pub state: TaskState,
    pub path: Vec<TaskState>,
}

#[derive(Debug, Default)]
struct Book {
    records: HashMap<TaskId, TaskRecord>,
    order: VecDeque<TaskId>,
}

/// Keeps the newest `limit` task lifecycles; older entries are evicted first.
#[derive(Debug)]
pub struct TaskBook {
    limit: usize,
    inner: Mutex<Book>,
}

impl TaskBook {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            inner: Mutex::new(Book::default()),
        }
    }

    /// Start tracking `id` in [`TaskState::Created`], replacing any previous record.
    pub fn open(&self, id: &TaskId) {
        let mut book = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if book.records.contains_key(id) {
            book.order.retain(|k| k != id);
        }
        while book.order.len() >= self.limit {
            if let Some(old) = book.order.pop_front() {
                book.records.remove(&old);
            }
        }
        book.records.insert(
            id.clone(),
            TaskRecord {
                state: TaskState::Created,
                path: vec![TaskState::Created],
            },
        );
        book.order.push_back(id.clone());
    }

    /// Move `id` to `next`, rejecting illegal transitions. Untracked ids are ignored.
    pub fn advance(&self, id: &TaskId, next: TaskState) -> ModelResult<()> {
        let mut book = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(rec) = book.records.get_mut(id) {
            rec.state = rec.state.transition(next)?;
            rec.path.push(next);
            trace!(task = %id, state = %next, "task state");
        }
        Ok(())
    }

    pub fn get(&self, id: &TaskId) -> Option<TaskRecord> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .get(id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of tracked tasks currently in `state`.
    pub fn count_in(&self, state: TaskState) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .values()
            .filter(|r| r.state == state)
            .count()
    }

    pub fn clear(&self) {
        let mut book = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        book.records.clear();
        book.order.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fabric_model::ModelError;

    #[test]
    fn records_path_and_rejects_illegal_moves() {
        let book = TaskBook::new(8);
        let id = TaskId::from("t1");
        book.open(&id);
        book.advance(&id, TaskState::Scored).unwrap();
        book.advance(&id, TaskState::Rejected).unwrap();

        match book.advance(&id, TaskState::Admitted) {
            Err(ModelError::IllegalTransition { from, to }) => {
                assert_eq!((from.as_str(), to.as_str()), ("rejected", "admitted"));
            }
            other => panic!("expected IllegalTransition, got {other:?}"),
        }
        let rec = book.get(&id).unwrap();
        assert_eq!(rec.state, TaskState::Rejected);
        assert_eq!(
            rec.path,
            vec![TaskState::Created, TaskState::Scored, TaskState::Rejected]
        );
    }

    #[test]
    fn evicts_oldest_beyond_limit() {
        let book = TaskBook::new(2);
        for id in ["a", "b", "c"] {
            book.open(&TaskId::from(id));
        }
        assert_eq!(book.len(), 2);
        assert!(book.get(&TaskId::from("a")).is_none());
        assert_eq!(book.count_in(TaskState::Created), 2);
    }

    #[test]
    fn reopening_resets_record() {
        let book = TaskBook::new(4);
        let id = TaskId::from("x");
        book.open(&id);
        book.advance(&id, TaskState::Scored).unwrap();
        book.open(&id);
        assert_eq!(book.get(&id).unwrap().state, TaskState::Created);
        assert_eq!(book.len(), 1);
    }
}
