use std::collections::BTreeMap;
use std::time::{Duration, Instant};

/// Quiet period after the last keystroke before an edit is written.
pub const EDIT_DEBOUNCE: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EditField {
    Title,
    Description,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub task_id: String,
    pub field: EditField,
    pub value: String,
}

/// Coalesces rapid text edits per (task, field); only the latest value
/// survives and it becomes due once the field has been idle for `delay`.
///
/// Time is passed in by the caller so the session stays synchronous.
#[derive(Debug)]
pub struct EditDebouncer {
    delay: Duration,
    pending: BTreeMap<(String, EditField), (String, Instant)>,
}

impl Default for EditDebouncer {
    fn default() -> Self {
        Self::new(EDIT_DEBOUNCE)
    }
}

impl EditDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
        }
    }

    pub fn push(&mut self, task_id: &str, field: EditField, value: String, now: Instant) {
        self.pending.insert((task_id.to_string(), field), (value, now));
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest instant at which some pending edit becomes due.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|(_, at)| *at + self.delay).min()
    }

    /// Take every edit that has been idle for at least the debounce delay.
    pub fn take_due(&mut self, now: Instant) -> Vec<PendingEdit> {
        let due: Vec<(String, EditField)> = self
            .pending
            .iter()
            .filter(|(_, (_, at))| now.saturating_duration_since(*at) >= self.delay)
            .map(|(key, _)| key.clone())
            .collect();
        due.into_iter()
            .filter_map(|key| {
                self.pending.remove(&key).map(|(value, _)| PendingEdit {
                    task_id: key.0,
                    field: key.1,
                    value,
                })
            })
            .collect()
    }

    /// Take everything regardless of age, e.g. when the task dialog closes.
    pub fn take_all(&mut self) -> Vec<PendingEdit> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|((task_id, field), (value, _))| PendingEdit {
                task_id,
                field,
                value,
            })
            .collect()
    }
}
