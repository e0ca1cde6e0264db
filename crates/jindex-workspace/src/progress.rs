use tokio::sync::broadcast;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Begin {
        title: String,
        total: usize,
    },
    Report {
        message: String,
        done: usize,
        total: usize,
    },
    End {
        message: Option<String>,
    },
}

/// Receives progress of a long-running workspace operation.
pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Discards every event.
impl ProgressSink for () {
    fn event(&self, _event: ProgressEvent) {}
}

pub type ProgressReceiver = broadcast::Receiver<ProgressEvent>;

/// Fans progress out to every subscribed receiver.
///
/// Events sent while nobody is subscribed are dropped; a receiver that falls
/// more than the channel capacity behind observes a lag.
#[derive(Clone)]
pub struct ProgressSender {
    tx: broadcast::Sender<ProgressEvent>,
}

impl ProgressSender {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> ProgressReceiver {
        self.tx.subscribe()
    }
}

impl Default for ProgressSender {
    fn default() -> Self {
        Self::new(256)
    }
}

impl ProgressSink for ProgressSender {
    fn event(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }
}

/// A `Begin`..`End` bracket that always emits its `End`, even on early return.
pub(crate) struct Progress<'a> {
    sink: &'a dyn ProgressSink,
    total: usize,
    done: usize,
    finished: bool,
}

impl<'a> Progress<'a> {
    pub(crate) fn start(sink: &'a dyn ProgressSink, title: impl Into<String>, total: usize) -> Self {
        sink.event(ProgressEvent::Begin {
            title: title.into(),
            total,
        });
        Self {
            sink,
            total,
            done: 0,
            finished: false,
        }
    }

    pub(crate) fn step(&mut self, message: impl Into<String>) {
        self.done += 1;
        self.sink.event(ProgressEvent::Report {
            message: message.into(),
            done: self.done,
            total: self.total,
        });
    }

    pub(crate) fn finish(mut self, message: impl Into<Option<String>>) {
        self.finished = true;
        self.sink.event(ProgressEvent::End {
            message: message.into(),
        });
    }
}

impl Drop for Progress<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.sink.event(ProgressEvent::End { message: None });
        }
    }
}
