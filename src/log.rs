//! Request log facade: one write lock over allocation, persistence, and
//! new-record dispatch.

use std::sync::{Mutex, MutexGuard};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::{
    capture::{CaptureError, capture_request, capture_response},
    core::{
        allocator::IdAllocator,
        store::{RequestStore, StoreError},
    },
    message::{HttpHost, LogRecord},
    persist::{LogSink, PersistError},
    subscribe::{ChangeHandle, ChangeListeners, FilterHandle, UpdateHandle, UpdateListeners},
    transport::{TransportRequest, TransportResponse},
    types::RequestId,
};

/// Failure of a logging operation.
#[derive(Debug)]
pub enum LogError {
    /// Malformed transport object; recoverable, nothing was logged.
    Capture(CaptureError),
    /// Record-level invariant violation.
    Store(StoreError),
    /// Backing store failure; [`PersistError::Corruption`] is not
    /// recoverable.
    Persist(PersistError),
}

impl From<CaptureError> for LogError {
    fn from(value: CaptureError) -> Self {
        Self::Capture(value)
    }
}

impl From<StoreError> for LogError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<PersistError> for LogError {
    fn from(value: PersistError) -> Self {
        Self::Persist(value)
    }
}

struct LogState {
    allocator: IdAllocator,
    store: RequestStore,
    sink: Box<dyn LogSink>,
    update_listeners: UpdateListeners,
}

impl LogState {
    // Persist-then-commit: the counter on disk always covers every id ever
    // handed out, so a crash here leaves an unused id, never a reused one.
    fn allocate(&mut self) -> Result<RequestId, PersistError> {
        let mut next = self.allocator;
        let id = next.advance();
        self.sink.store_allocator(&next.state())?;
        self.allocator = next;
        Ok(id)
    }

    fn commit_record(&mut self, record: LogRecord) -> Result<(), LogError> {
        self.sink.append_record(&record)?;
        let stored = self.store.insert(record)?;
        self.update_listeners.dispatch(stored);
        Ok(())
    }
}

/// The request/response transaction log.
///
/// All operations are synchronous and callable from any thread. Record
/// creation, persistence, and new-record dispatch form one critical section,
/// so subscribers observe records in strictly increasing id order with no
/// interleaving between writers. A slow subscriber therefore delays later
/// writers; that is the intended backpressure.
///
/// Subscriber callbacks run while the write lock is held and must not call
/// back into the log.
pub struct RequestLog {
    state: Mutex<LogState>,
    change_listeners: Mutex<ChangeListeners>,
}

impl std::fmt::Debug for RequestLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestLog").finish_non_exhaustive()
    }
}

impl RequestLog {
    /// Opens the log over `sink`, recovering the allocator singleton and all
    /// records.
    ///
    /// A fresh sink gets an allocator singleton persisted immediately.
    /// Duplicate record ids or multiple allocator instances on load surface
    /// as non-recoverable errors rather than a silently chosen survivor.
    pub fn open(mut sink: Box<dyn LogSink>) -> Result<Self, LogError> {
        let mut allocator = match sink.load_allocator()? {
            Some(state) => IdAllocator::resume(state),
            None => {
                let fresh = IdAllocator::new();
                sink.store_allocator(&fresh.state())?;
                fresh
            }
        };

        let store = RequestStore::from_records(sink.load_records()?)?;
        if let Some(max) = store.max_id() {
            allocator.observe(max);
        }

        Ok(Self {
            state: Mutex::new(LogState {
                allocator,
                store,
                sink,
                update_listeners: UpdateListeners::new(),
            }),
            change_listeners: Mutex::new(ChangeListeners::new()),
        })
    }

    /// Allocates an id without logging a record, for callers that pipeline
    /// the id ahead of [`RequestLog::add_request_with_id`].
    pub fn allocate_id(&self) -> Result<RequestId, LogError> {
        let mut guard = self.lock_state();
        guard.allocate().map_err(LogError::from)
    }

    /// Logs a request with no response yet and returns its new id.
    pub fn add_request<R>(&self, request: &R, host: HttpHost) -> Result<RequestId, LogError>
    where
        R: TransportRequest + ?Sized,
    {
        let snapshot = capture_request(request)?;
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let id = state.allocate()?;
        state.commit_record(LogRecord {
            id,
            host,
            request: snapshot,
            response: None,
            ts_ms: now_ms(),
        })?;
        Ok(id)
    }

    /// Logs a request under a caller-supplied, pre-allocated id. Supplying
    /// an id already in use is a caller error and is rejected.
    pub fn add_request_with_id<R>(
        &self,
        id: RequestId,
        request: &R,
        host: HttpHost,
    ) -> Result<(), LogError>
    where
        R: TransportRequest + ?Sized,
    {
        let snapshot = capture_request(request)?;
        let mut guard = self.lock_state();
        let state = &mut *guard;
        state.allocator.observe(id);
        state.commit_record(LogRecord {
            id,
            host,
            request: snapshot,
            response: None,
            ts_ms: now_ms(),
        })
    }

    /// Logs a request/response pair as one record and returns its new id.
    /// Subscribers see the record exactly once, already populated.
    pub fn add_request_response<Req, Resp>(
        &self,
        request: &Req,
        response: &Resp,
        host: HttpHost,
    ) -> Result<RequestId, LogError>
    where
        Req: TransportRequest + ?Sized,
        Resp: TransportResponse + ?Sized,
    {
        let request = capture_request(request)?;
        let response = capture_response(response)?;
        let mut guard = self.lock_state();
        let state = &mut *guard;
        let id = state.allocate()?;
        state.commit_record(LogRecord {
            id,
            host,
            request,
            response: Some(response),
            ts_ms: now_ms(),
        })?;
        Ok(id)
    }

    /// Attaches a response to an existing record and fires one change event.
    ///
    /// An unknown id is not an error: responses may arrive for transactions
    /// that were never logged, and that must not abort the producing
    /// pipeline. A warning is logged and the call returns `Ok(())`. A second
    /// attach for the same id overwrites the first and fires again.
    pub fn add_response<R>(&self, id: RequestId, response: &R) -> Result<(), LogError>
    where
        R: TransportResponse + ?Sized,
    {
        let snapshot = capture_response(response)?;
        let updated = {
            let mut guard = self.lock_state();
            let state = &mut *guard;
            if !state.store.contains(id) {
                warn!(id, "no log record for response, dropping");
                return Ok(());
            }
            let updated = state.store.attach_response(id, snapshot)?;
            state.sink.update_record(&updated)?;
            updated
        };
        // Outside the write lock: change dispatch never blocks record
        // creation. The change mutex serializes concurrent dispatches.
        self.lock_change().dispatch(&updated);
        Ok(())
    }

    /// Point query by id, returning an owned clone.
    pub fn lookup(&self, id: RequestId) -> Option<LogRecord> {
        self.lock_state().store.get_cloned(id)
    }

    /// Every record, in id order.
    pub fn all_records(&self) -> Vec<LogRecord> {
        self.lock_state().store.all_records_cloned()
    }

    /// Records matching `filter`, in id order. Same predicate semantics as
    /// filtered subscriptions.
    pub fn records_matching<F>(&self, filter: F) -> Vec<LogRecord>
    where
        F: Fn(&LogRecord) -> bool,
    {
        self.lock_state().store.matching_cloned(filter)
    }

    /// Records logged against `host`, in creation order.
    pub fn records_for_host(&self, host: &HttpHost) -> Vec<LogRecord> {
        self.lock_state().store.for_host_cloned(&host.key())
    }

    /// Newest `n` records, in id order.
    pub fn recent(&self, n: usize) -> Vec<LogRecord> {
        self.lock_state().store.recent_cloned(n)
    }

    /// Number of logged records.
    pub fn record_count(&self) -> usize {
        self.lock_state().store.len()
    }

    /// Pushes buffered sink writes to durable media.
    pub fn flush(&self) -> Result<(), LogError> {
        self.lock_state().sink.flush().map_err(LogError::from)
    }

    /// Registers an unfiltered new-record subscription. Only records created
    /// after registration are delivered; the current record count is kept as
    /// the subscription baseline.
    pub fn add_update_listener(&self, callback: UpdateHandle) {
        let mut guard = self.lock_state();
        let baseline = guard.store.len();
        guard.update_listeners.add(callback, None, baseline);
    }

    /// Registers a filtered new-record subscription; the baseline is the
    /// count of currently matching records.
    pub fn add_update_listener_filtered(&self, callback: UpdateHandle, filter: FilterHandle) {
        let mut guard = self.lock_state();
        let baseline = guard.store.matching(|record| filter.matches(record)).len();
        guard.update_listeners.add(callback, Some(filter), baseline);
    }

    /// Removes every update subscription registered under this handle
    /// identity, not just the most recent. Returns how many were removed.
    pub fn remove_update_listener(&self, callback: &UpdateHandle) -> usize {
        self.lock_state().update_listeners.remove(callback)
    }

    /// Registers a broadcast change listener, independent of the filtered
    /// update mechanism.
    pub fn add_change_listener(&self, callback: ChangeHandle) {
        self.lock_change().add(callback);
    }

    /// Removes every change registration of this handle identity. Returns
    /// how many were removed.
    pub fn remove_change_listener(&self, callback: &ChangeHandle) -> usize {
        self.lock_change().remove(callback)
    }

    /// Number of registered update subscriptions.
    pub fn update_listener_count(&self) -> usize {
        self.lock_state().update_listeners.len()
    }

    /// Number of registered change listeners.
    pub fn change_listener_count(&self) -> usize {
        self.lock_change().len()
    }

    fn lock_state(&self) -> MutexGuard<'_, LogState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            warn!("request log state lock poisoned, continuing");
            poisoned.into_inner()
        })
    }

    fn lock_change(&self) -> MutexGuard<'_, ChangeListeners> {
        self.change_listeners.lock().unwrap_or_else(|poisoned| {
            warn!("change listener lock poisoned, continuing");
            poisoned.into_inner()
        })
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
