use serde::Serialize;

/// Name under which progress is published to observers.
pub const PROGRESS_EVENT: &str = "generate";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub bytes_read: u64,
    pub max_bytes: u64,
}

/// Receives progress after every batch and once more at end of input.
pub trait ProgressObserver {
    fn on_progress(&mut self, event: &ProgressEvent);
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressEvent),
{
    fn on_progress(&mut self, event: &ProgressEvent) {
        self(event)
    }
}

/// Drops every event.
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _event: &ProgressEvent) {}
}

/// Running byte counter, never decreasing and never past `max_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub bytes_read: u64,
    pub max_bytes: u64,
}

impl ProgressState {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            bytes_read: 0,
            max_bytes,
        }
    }

    /// Adds the byte length of a chunk's last line, not of the whole chunk.
    pub fn advance(&mut self, last_line_bytes: usize) {
        self.bytes_read = self
            .bytes_read
            .saturating_add(last_line_bytes as u64)
            .min(self.max_bytes);
    }

    pub fn event(&self) -> ProgressEvent {
        ProgressEvent {
            bytes_read: self.bytes_read,
            max_bytes: self.max_bytes,
        }
    }
}

pub fn run_stage5_progress<O: ProgressObserver + ?Sized>(state: &ProgressState, observer: &mut O) {
    observer.on_progress(&state.event());
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_progress.rs"]
mod tests;
