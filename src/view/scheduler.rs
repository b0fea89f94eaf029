use super::exchange::{ PendingMessage, Step };
use super::state::ViewState;
use super::ViewEvent;
use log::debug;
use std::cmp::{ Ordering, Reverse };
use std::collections::{ BinaryHeap, VecDeque };
use std::future::pending;
use std::sync::Arc;
use tokio::sync::{ mpsc, Mutex };
use tokio::task::JoinHandle;
use tokio::time::{ sleep_until, Instant };

/// The staged half of one exchange, timed from `start`.
#[derive(Debug)]
pub struct Batch {
    pub start: Instant,
    pub steps: Vec<Step>,
}

#[derive(Debug)]
struct Entry {
    deadline: Instant,
    seq: u64,
    message: PendingMessage,
    rest: VecDeque<Step>,
}

impl Entry {
    fn key(&self) -> (Instant, u64) {
        (self.deadline, self.seq)
    }
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Pending steps ordered by `(deadline, seq)`. Equal deadlines fire in the
/// order they were scheduled.
#[derive(Debug, Default)]
pub struct StepQueue {
    queue: BinaryHeap<Reverse<Entry>>,
    next_seq: u64,
}

impl StepQueue {
    fn push(&mut self, deadline: Instant, message: PendingMessage, rest: VecDeque<Step>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse(Entry { deadline, seq, message, rest }));
    }

    pub fn push_batch(&mut self, batch: Batch) {
        let mut steps: VecDeque<Step> = batch.steps.into();
        if let Some(first) = steps.pop_front() {
            self.push(batch.start + first.delay, first.message, steps);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.peek().map(|Reverse(e)| e.deadline)
    }

    /// Takes the earliest step due at `now`. Its successor in the same
    /// exchange is queued relative to the step's own deadline.
    pub fn pop_due(&mut self, now: Instant) -> Option<PendingMessage> {
        if self.next_deadline().map_or(true, |d| d > now) {
            return None;
        }
        let Reverse(mut entry) = self.queue.pop()?;
        if let Some(next) = entry.rest.pop_front() {
            self.push(entry.deadline + next.delay, next.message, entry.rest);
        }
        Some(entry.message)
    }
}

/// Runs the single task that appends every staged message of one view.
pub fn spawn(
    state: Arc<Mutex<ViewState>>,
    events: mpsc::UnboundedSender<ViewEvent>
) -> (mpsc::UnboundedSender<Batch>, JoinHandle<()>) {
    let (batches, mut incoming) = mpsc::unbounded_channel::<Batch>();

    let handle = tokio::spawn(async move {
        let mut queue = StepQueue::default();
        loop {
            let next_deadline = queue.next_deadline();
            tokio::select! {
                biased;
                batch = incoming.recv() => {
                    match batch {
                        Some(batch) => queue.push_batch(batch),
                        None => break,
                    }
                }
                _ = async {
                    match next_deadline {
                        Some(deadline) => sleep_until(deadline).await,
                        None => pending::<()>().await,
                    }
                } => {
                    let now = Instant::now();
                    let mut state = state.lock().await;
                    while let Some(due) = queue.pop_due(now) {
                        let message = state.append(due);
                        debug!("Staged {} message {}", message.role, message.id);
                        let _ = events.send(ViewEvent::MessageAppended(message));
                    }
                }
            }
        }
    });

    (batches, handle)
}
