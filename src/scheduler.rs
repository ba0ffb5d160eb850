//! The dispatcher: owns the entry list, a timer for the earliest pending
//! activation, and a control-plane for add/remove/snapshot/stop (§4.F).

use std::future::{Future, IntoFuture};
use std::pin::Pin;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

use crate::context::{EntryId, JobContext};
use crate::entry::Entry;
use crate::error::ParseError;
use crate::job::{FnJob, Job, JobRef};
use crate::logger::Logger;
use crate::middleware::{chain, Middleware};
use crate::schedule::{Schedule, ScheduleParser};
use crate::timezone::TimeZone;

/// A bounded "effectively never" park duration. Chosen over a single
/// unbounded sleep so the timer stays representable; if it does elapse
/// with nothing to do, the dispatcher simply re-arms (§4.F step 3).
const PARK_FOREVER: std::time::Duration = std::time::Duration::from_secs(60 * 60 * 24 * 365);

enum ControlMessage<C> {
    Add(Entry<C>),
    Remove(EntryId),
    Snapshot(oneshot::Sender<Vec<Entry<C>>>),
    Stop,
}

struct Registration<C> {
    next_id: u64,
    running: bool,
    entries: Vec<Entry<C>>,
    control_tx: Option<mpsc::UnboundedSender<ControlMessage<C>>>,
    base_middlewares: Vec<Middleware<C>>,
}

/// The scheduler. Cheap to clone — internally reference-counted — so
/// multiple handles can register jobs and query state concurrently.
pub struct Scheduler<C = ()> {
    reg: Arc<Mutex<Registration<C>>>,
    timezone: TimeZone,
    parser: Arc<dyn ScheduleParser>,
    logger: Arc<dyn Logger>,
    app_context: C,
    tracker: TaskTracker,
    dispatcher_handle: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl<C> Clone for Scheduler<C>
where
    C: Clone,
{
    fn clone(&self) -> Self {
        Self {
            reg: Arc::clone(&self.reg),
            timezone: self.timezone.clone(),
            parser: Arc::clone(&self.parser),
            logger: Arc::clone(&self.logger),
            app_context: self.app_context.clone(),
            tracker: self.tracker.clone(),
            dispatcher_handle: Arc::clone(&self.dispatcher_handle),
        }
    }
}

/// A handle returned by [`Scheduler::stop`] that resolves once every
/// in-flight job has completed. Multiple handles (from repeated `stop()`
/// calls) all resolve together.
pub struct StopHandle {
    tracker: TaskTracker,
}

impl IntoFuture for StopHandle {
    type Output = ();
    type IntoFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move { self.tracker.wait().await })
    }
}

impl<C> Scheduler<C>
where
    C: Clone + Send + Sync + 'static,
{
    pub(crate) fn new(
        timezone: TimeZone,
        parser: Arc<dyn ScheduleParser>,
        base_middlewares: Vec<Middleware<C>>,
        logger: Arc<dyn Logger>,
        app_context: C,
    ) -> Self {
        Self {
            reg: Arc::new(Mutex::new(Registration {
                next_id: 0,
                running: false,
                entries: Vec::new(),
                control_tx: None,
                base_middlewares,
            })),
            timezone,
            parser,
            logger,
            app_context,
            tracker: TaskTracker::new(),
            dispatcher_handle: Arc::new(Mutex::new(None)),
        }
    }

    pub fn parser(&self) -> &Arc<dyn ScheduleParser> {
        &self.parser
    }

    pub fn location(&self) -> &TimeZone {
        &self.timezone
    }

    pub fn is_running(&self) -> bool {
        self.reg.lock().running
    }

    /// Appends to the base middleware list; only affects entries registered
    /// afterward.
    pub fn use_middleware(&self, middlewares: impl IntoIterator<Item = Middleware<C>>) {
        self.reg.lock().base_middlewares.extend(middlewares);
    }

    /// Parses `spec`, wraps `callable` as a job, and registers it.
    pub fn add_func<F, Fut>(
        &self,
        spec: &str,
        callable: F,
        middlewares: Vec<Middleware<C>>,
    ) -> Result<EntryId, ParseError>
    where
        F: Fn(JobContext<C>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = crate::error::JobResult> + Send + 'static,
    {
        self.add_job(spec, Arc::new(FnJob::new(callable)), middlewares)
    }

    /// Parses `spec` and registers `job`.
    pub fn add_job(
        &self,
        spec: &str,
        job: JobRef<C>,
        middlewares: Vec<Middleware<C>>,
    ) -> Result<EntryId, ParseError> {
        let schedule = self.parser.parse(spec)?;
        Ok(self.schedule(schedule, job, middlewares))
    }

    /// Registers a pre-parsed schedule; cannot fail.
    pub fn schedule(
        &self,
        schedule: Arc<dyn Schedule>,
        job: JobRef<C>,
        middlewares: Vec<Middleware<C>>,
    ) -> EntryId {
        let mut reg = self.reg.lock();
        reg.next_id += 1;
        let id = EntryId(reg.next_id);

        let mut all_middlewares = reg.base_middlewares.clone();
        all_middlewares.extend(middlewares);
        let entry = Entry::new(id, schedule, job, all_middlewares);

        if reg.running {
            let now = self.timezone.now();
            entry.set_next(entry.schedule().next_after(now));
            if let Some(tx) = &reg.control_tx {
                let _ = tx.send(ControlMessage::Add(entry));
            }
        } else {
            reg.entries.push(entry);
        }

        id
    }

    /// A consistent snapshot of all currently-registered entries.
    pub async fn entries(&self) -> Vec<Entry<C>> {
        let control_tx = {
            let reg = self.reg.lock();
            if !reg.running {
                return reg.entries.clone();
            }
            reg.control_tx.clone()
        };
        let Some(tx) = control_tx else {
            return Vec::new();
        };
        let (reply_tx, reply_rx) = oneshot::channel();
        if tx.send(ControlMessage::Snapshot(reply_tx)).is_err() {
            return Vec::new();
        }
        reply_rx.await.unwrap_or_default()
    }

    /// A single entry by id, if it is still registered.
    pub async fn entry(&self, id: EntryId) -> Option<Entry<C>> {
        self.entries().await.into_iter().find(|e| e.id() == id)
    }

    pub fn remove(&self, id: EntryId) {
        let mut reg = self.reg.lock();
        if reg.running {
            if let Some(tx) = &reg.control_tx {
                let _ = tx.send(ControlMessage::Remove(id));
            }
        } else {
            reg.entries.retain(|e| e.id() != id);
        }
    }

    /// Starts the dispatcher on a new background task. Idempotent.
    pub fn start(&self) {
        let Some((initial_entries, control_rx)) = self.begin_running() else {
            return;
        };
        let dispatcher = dispatcher_loop(
            Arc::clone(&self.reg),
            initial_entries,
            control_rx,
            self.timezone.clone(),
            self.logger.clone(),
            self.tracker.clone(),
            self.app_context.clone(),
        );
        let handle = tokio::spawn(dispatcher);
        *self.dispatcher_handle.lock() = Some(handle);
    }

    /// Enters the dispatcher loop on the calling task and blocks until
    /// [`Scheduler::stop`] is called. Idempotent in the sense that calling
    /// it on an already-running scheduler returns immediately.
    pub async fn run(&self) {
        let Some((initial_entries, control_rx)) = self.begin_running() else {
            return;
        };
        dispatcher_loop(
            Arc::clone(&self.reg),
            initial_entries,
            control_rx,
            self.timezone.clone(),
            self.logger.clone(),
            self.tracker.clone(),
            self.app_context.clone(),
        )
        .await;
    }

    fn begin_running(
        &self,
    ) -> Option<(Vec<Entry<C>>, mpsc::UnboundedReceiver<ControlMessage<C>>)> {
        let mut reg = self.reg.lock();
        if reg.running {
            return None;
        }
        let (tx, rx) = mpsc::unbounded_channel();
        reg.control_tx = Some(tx);
        reg.running = true;
        let initial_entries = std::mem::take(&mut reg.entries);
        self.tracker.reopen();
        Some((initial_entries, rx))
    }

    /// Signals the dispatcher to stop and returns a handle that resolves
    /// once every in-flight job has completed. Calling this on a
    /// non-running scheduler (or one whose jobs have already drained)
    /// returns an already-resolved handle.
    pub fn stop(&self) -> StopHandle {
        let mut reg = self.reg.lock();
        if reg.running {
            if let Some(tx) = reg.control_tx.take() {
                let _ = tx.send(ControlMessage::Stop);
            }
            reg.running = false;
        }
        drop(reg);
        self.tracker.close();
        StopHandle {
            tracker: self.tracker.clone(),
        }
    }
}

async fn dispatcher_loop<C>(
    reg: Arc<Mutex<Registration<C>>>,
    mut entries: Vec<Entry<C>>,
    mut control_rx: mpsc::UnboundedReceiver<ControlMessage<C>>,
    timezone: TimeZone,
    logger: Arc<dyn Logger>,
    tracker: TaskTracker,
    app_context: C,
) where
    C: Clone + Send + Sync + 'static,
{
    let now = timezone.now();
    for entry in &entries {
        entry.set_next(entry.schedule().next_after(now));
    }

    loop {
        sort_entries(&mut entries);

        let sleep_duration = match entries.first().and_then(|e| e.next()) {
            Some(next) => {
                let now = timezone.now();
                (next - now).to_std().unwrap_or(std::time::Duration::ZERO)
            }
            None => PARK_FOREVER,
        };

        let sleep = tokio::time::sleep(sleep_duration);
        tokio::pin!(sleep);

        loop {
            tokio::select! {
                _ = &mut sleep => {
                    let now = timezone.now();
                    for entry in &entries {
                        match entry.next() {
                            Some(next) if next <= now => {
                                fire(entry, &app_context, &tracker);
                                entry.fire(entry.schedule().next_after(now));
                            }
                            _ => break,
                        }
                    }
                    break;
                }
                msg = control_rx.recv() => {
                    match msg {
                        Some(ControlMessage::Add(entry)) => {
                            entries.push(entry);
                            break;
                        }
                        Some(ControlMessage::Remove(id)) => {
                            entries.retain(|e| e.id() != id);
                            break;
                        }
                        Some(ControlMessage::Snapshot(reply)) => {
                            let _ = reply.send(entries.clone());
                            continue;
                        }
                        Some(ControlMessage::Stop) | None => {
                            // Hand the entry list back so a subsequent
                            // `start()` resumes with last known next/prev
                            // rather than an empty scheduler (§3).
                            reg.lock().entries = entries;
                            logger.info("scheduler stopped", &[]);
                            return;
                        }
                    }
                }
            }
        }
    }
}

fn fire<C>(entry: &Entry<C>, app_context: &C, tracker: &TaskTracker)
where
    C: Clone + Send + Sync + 'static,
{
    let job = Arc::clone(entry.wrapped_job());
    let ctx = JobContext::new(app_context.clone());
    tracker.spawn(async move {
        let _ = job.run(ctx).await;
    });
}

/// Sorts entries by `next` ascending, `None` sorted last (§3, §9 (b)).
fn sort_entries<C>(entries: &mut [Entry<C>])
where
    C: Clone + Send + Sync + 'static,
{
    entries.sort_by(|a, b| match (a.next(), b.next()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
