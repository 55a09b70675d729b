//! Paginated list state shared by every feed screen.
//!
//! A controller never performs I/O itself. Callers ask it for a [`Ticket`]
//! (`begin_initialize` / `begin_load_more`), run the fetch wherever they like,
//! and hand the outcome back through [`ListController::apply`]. The ticket
//! pins the controller instance and its generation, so an outcome that arrives
//! after a teardown or for a superseded fetch is dropped without touching state.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::source::ListSource;
use crate::types::{Page, PageRequest};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Initial,
    More,
}

/// Permission to run exactly one fetch for one controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    instance: u64,
    generation: u64,
    kind: FetchKind,
    request: PageRequest,
}

impl Ticket {
    pub fn request(&self) -> PageRequest {
        self.request
    }

    pub fn kind(&self) -> FetchKind {
        self.kind
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    InitialLoading,
    LoadingMore,
}

impl Phase {
    fn awaits(self, kind: FetchKind) -> bool {
        matches!(
            (self, kind),
            (Phase::InitialLoading, FetchKind::Initial) | (Phase::LoadingMore, FetchKind::More)
        )
    }
}

/// Read-only view for renderers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListStatus<'a> {
    pub len: usize,
    pub current_page: u32,
    pub is_initial_loading: bool,
    pub is_loading_more: bool,
    pub has_more: bool,
    pub last_error: Option<&'a str>,
}

#[derive(Debug)]
pub struct ListController<T> {
    instance: u64,
    per_page: u32,
    items: Vec<T>,
    current_page: u32,
    phase: Phase,
    has_more: bool,
    last_error: Option<String>,
    generation: u64,
    alive: bool,
    revision: u64,
}

impl<T> ListController<T> {
    pub fn new(per_page: u32) -> Self {
        Self {
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            per_page: per_page.max(1),
            items: Vec::new(),
            current_page: 1,
            phase: Phase::Idle,
            has_more: false,
            last_error: None,
            generation: 0,
            alive: true,
            revision: 0,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[allow(dead_code)]
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn is_initial_loading(&self) -> bool {
        self.phase == Phase::InitialLoading
    }

    pub fn is_loading_more(&self) -> bool {
        self.phase == Phase::LoadingMore
    }

    #[allow(dead_code)]
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Bumped on every state change; lets observers detect mutation cheaply.
    #[allow(dead_code)]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn status(&self) -> ListStatus<'_> {
        ListStatus {
            len: self.items.len(),
            current_page: self.current_page,
            is_initial_loading: self.is_initial_loading(),
            is_loading_more: self.is_loading_more(),
            has_more: self.has_more,
            last_error: self.last_error(),
        }
    }

    /// Start a page-1 fetch that will replace the list.
    /// Returns `None` while another fetch is outstanding or after teardown.
    pub fn begin_initialize(&mut self) -> Option<Ticket> {
        if !self.alive || self.phase != Phase::Idle {
            debug!(phase = ?self.phase, alive = self.alive, "initialize rejected");
            return None;
        }
        Some(self.start(FetchKind::Initial, PageRequest::first(self.per_page)))
    }

    /// Start a fetch of the page after `current_page`.
    /// Returns `None` (and changes nothing) unless idle, alive and `has_more`.
    pub fn begin_load_more(&mut self) -> Option<Ticket> {
        if !self.alive || self.phase != Phase::Idle || !self.has_more {
            debug!(
                phase = ?self.phase,
                has_more = self.has_more,
                "load more ignored"
            );
            return None;
        }
        let request = PageRequest {
            page: self.current_page,
            per_page: self.per_page,
        }
        .next();
        Some(self.start(FetchKind::More, request))
    }

    fn start(&mut self, kind: FetchKind, request: PageRequest) -> Ticket {
        self.generation += 1;
        self.phase = match kind {
            FetchKind::Initial => Phase::InitialLoading,
            FetchKind::More => Phase::LoadingMore,
        };
        self.revision += 1;
        Ticket {
            instance: self.instance,
            generation: self.generation,
            kind,
            request,
        }
    }

    fn accepts(&self, ticket: &Ticket) -> bool {
        self.alive
            && ticket.instance == self.instance
            && ticket.generation == self.generation
            && self.phase.awaits(ticket.kind)
    }

    /// Merge the outcome of a fetch started with `ticket`.
    ///
    /// Returns `false` when the ticket is stale, in which case nothing changes.
    /// Failures only record the message: items, cursor and `has_more` keep
    /// their previous values.
    pub fn apply<E: fmt::Display>(&mut self, ticket: Ticket, outcome: Result<Page<T>, E>) -> bool {
        if !self.accepts(&ticket) {
            debug!(
                kind = ?ticket.kind,
                page = ticket.request.page,
                "discarding stale page result"
            );
            return false;
        }

        self.phase = Phase::Idle;
        match outcome {
            Ok(page) => {
                self.has_more = page.has_more(ticket.request);
                match ticket.kind {
                    FetchKind::Initial => self.items = page.items,
                    FetchKind::More => self.items.extend(page.items),
                }
                self.current_page = ticket.request.page;
                self.last_error = None;
                debug!(
                    page = self.current_page,
                    total = self.items.len(),
                    has_more = self.has_more,
                    "page applied"
                );
            }
            Err(err) => {
                debug!(kind = ?ticket.kind, page = ticket.request.page, "fetch failed: {}", err);
                self.last_error = Some(err.to_string());
            }
        }
        self.revision += 1;
        true
    }

    /// Local edit of the accumulated items (e.g. cart quantity changes).
    /// Ignored after teardown.
    pub fn edit_items(&mut self, edit: impl FnOnce(&mut Vec<T>)) {
        if !self.alive {
            return;
        }
        edit(&mut self.items);
        self.revision += 1;
    }

    /// Detach the controller from its screen. Any outstanding fetch result
    /// will be discarded when it arrives.
    pub fn teardown(&mut self) {
        self.alive = false;
        self.generation += 1;
        self.phase = Phase::Idle;
    }
}

/// Direct drive against a source, for callers that can await in place.
/// The app spawns its fetches instead and goes through the ticket API.
#[allow(dead_code)]
impl<T: Send + 'static> ListController<T> {
    /// Fetch page 1 from `source` and replace the list.
    /// Returns whether a fetch was made and applied.
    pub async fn initialize<S>(&mut self, source: &S) -> bool
    where
        S: ListSource<T> + ?Sized,
    {
        let Some(ticket) = self.begin_initialize() else {
            return false;
        };
        let outcome = source.fetch_page(ticket.request()).await;
        self.apply(ticket, outcome)
    }

    /// Fetch the next page from `source` and append it.
    /// A no-op without any network call if the guard rejects it.
    pub async fn load_more<S>(&mut self, source: &S) -> bool
    where
        S: ListSource<T> + ?Sized,
    {
        let Some(ticket) = self.begin_load_more() else {
            return false;
        };
        let outcome = source.fetch_page(ticket.request()).await;
        self.apply(ticket, outcome)
    }
}

/// Type-erased controller operations, so the app can drive whichever feed is
/// open without matching on its record type.
pub trait Paginated {
    fn begin_initialize(&mut self) -> Option<Ticket>;
    fn begin_load_more(&mut self) -> Option<Ticket>;
    fn fail(&mut self, ticket: Ticket, message: &str) -> bool;
    fn teardown(&mut self);
    fn status(&self) -> ListStatus<'_>;
}

impl<T> Paginated for ListController<T> {
    fn begin_initialize(&mut self) -> Option<Ticket> {
        ListController::begin_initialize(self)
    }

    fn begin_load_more(&mut self) -> Option<Ticket> {
        ListController::begin_load_more(self)
    }

    fn fail(&mut self, ticket: Ticket, message: &str) -> bool {
        self.apply(ticket, Err::<Page<T>, _>(message))
    }

    fn teardown(&mut self) {
        ListController::teardown(self)
    }

    fn status(&self) -> ListStatus<'_> {
        ListController::status(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, StoreError};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    /// Replays canned responses in order and records every request
    #[derive(Default)]
    struct Scripted {
        responses: Mutex<VecDeque<Result<Page<u32>>>>,
        requests: Mutex<Vec<PageRequest>>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(responses: Vec<Result<Page<u32>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn requested_pages(&self) -> Vec<u32> {
            self.requests.lock().unwrap().iter().map(|r| r.page).collect()
        }
    }

    #[async_trait]
    impl ListSource<u32> for Scripted {
        async fn fetch_page(&self, request: PageRequest) -> Result<Page<u32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Page::bare(vec![])))
        }
    }

    fn records(range: std::ops::Range<u32>) -> Page<u32> {
        Page::bare(range.collect())
    }

    fn transport_error() -> Result<Page<u32>> {
        Err(StoreError::Transport("connection reset".into()))
    }

    #[tokio::test]
    async fn initialize_replaces_items_and_starts_at_page_one() {
        let source = Scripted::new(vec![Ok(records(0..5))]);
        let mut list = ListController::new(5);

        assert!(list.initialize(&source).await);

        assert_eq!(list.items(), &[0, 1, 2, 3, 4]);
        assert_eq!(list.current_page(), 1);
        assert!(list.has_more());
        assert!(!list.is_initial_loading());
        assert_eq!(list.last_error(), None);
        assert_eq!(source.calls(), 1);
        assert_eq!(source.requested_pages(), vec![1]);
    }

    #[tokio::test]
    async fn load_more_appends_pages_in_order() {
        let source = Scripted::new(vec![
            Ok(records(0..3)),
            Ok(records(3..6)),
            Ok(records(6..8)),
        ]);
        let mut list = ListController::new(3);

        list.initialize(&source).await;
        list.load_more(&source).await;
        list.load_more(&source).await;

        assert_eq!(list.items(), (0..8).collect::<Vec<_>>().as_slice());
        assert_eq!(list.current_page(), 3);
        assert!(!list.has_more(), "short page ends the list");
        assert_eq!(source.requested_pages(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn five_five_five_then_empty() {
        let source = Scripted::new(vec![
            Ok(records(0..5)),
            Ok(records(5..10)),
            Ok(records(10..15)),
            Ok(records(0..0)),
        ]);
        let mut list = ListController::new(5);

        list.initialize(&source).await;
        for _ in 0..3 {
            assert!(list.load_more(&source).await);
        }

        assert_eq!(list.items().len(), 15);
        assert!(!list.has_more());
        assert_eq!(source.calls(), 4);

        assert!(!list.load_more(&source).await);
        assert_eq!(source.calls(), 4);
    }

    #[tokio::test]
    async fn empty_page_overrides_metadata() {
        let source = Scripted::new(vec![
            Ok(records(0..2)),
            Ok(Page {
                items: vec![],
                current_page: Some(2),
                total_pages: Some(9),
            }),
        ]);
        let mut list = ListController::new(2);

        list.initialize(&source).await;
        assert!(list.has_more());
        list.load_more(&source).await;

        assert!(!list.has_more());
        assert_eq!(list.items().len(), 2);
    }

    #[tokio::test]
    async fn metadata_beats_page_length() {
        let source = Scripted::new(vec![Ok(Page {
            items: vec![1, 2],
            current_page: Some(1),
            total_pages: Some(3),
        })]);
        let mut list = ListController::new(10);

        list.initialize(&source).await;

        assert!(list.has_more(), "short page but totalPages says more");
    }

    #[test]
    fn load_more_while_loading_is_rejected() {
        let mut list: ListController<u32> = ListController::new(5);
        let first = list.begin_initialize().unwrap();
        list.apply(first, Ok::<_, String>(records(0..5)));

        let pending = list.begin_load_more().unwrap();
        let revision = list.revision();

        assert_eq!(list.begin_load_more(), None);
        assert_eq!(list.begin_initialize(), None);
        assert_eq!(list.revision(), revision);
        assert!(list.is_loading_more());
        assert!(!list.is_initial_loading());

        list.apply(pending, Ok::<_, String>(records(5..10)));
        assert_eq!(list.items().len(), 10);
    }

    #[tokio::test]
    async fn load_more_without_more_makes_no_call() {
        let source = Scripted::new(vec![Ok(records(0..2))]);
        let mut list = ListController::new(5);
        list.initialize(&source).await;
        let revision = list.revision();

        assert!(!list.load_more(&source).await);

        assert_eq!(source.calls(), 1);
        assert_eq!(list.revision(), revision);
        assert_eq!(list.items(), &[0, 1]);
    }

    #[tokio::test]
    async fn load_more_before_first_page_is_rejected() {
        let source = Scripted::new(vec![]);
        let mut list: ListController<u32> = ListController::new(5);

        assert!(!list.load_more(&source).await);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn failed_initialize_then_retry() {
        let source = Scripted::new(vec![transport_error(), Ok(records(0..4))]);
        let mut list = ListController::new(5);

        assert!(list.initialize(&source).await);
        assert!(list.items().is_empty());
        assert!(!list.is_initial_loading());
        assert!(list
            .last_error()
            .is_some_and(|e| e.contains("connection reset")));

        assert!(list.initialize(&source).await);
        assert_eq!(list.items().len(), 4);
        assert_eq!(list.last_error(), None);
        assert!(!list.has_more());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_items() {
        let source = Scripted::new(vec![Ok(records(0..5)), transport_error()]);
        let mut list = ListController::new(5);

        list.initialize(&source).await;
        list.initialize(&source).await;

        assert_eq!(list.items().len(), 5);
        assert!(list.last_error().is_some());
        assert!(list.has_more());
    }

    #[tokio::test]
    async fn failed_load_more_keeps_cursor() {
        let source = Scripted::new(vec![
            Ok(records(0..5)),
            Err(StoreError::Status {
                status: 500,
                body: "boom".into(),
            }),
            Ok(records(5..7)),
        ]);
        let mut list = ListController::new(5);

        list.initialize(&source).await;
        list.load_more(&source).await;

        assert_eq!(list.items().len(), 5);
        assert_eq!(list.current_page(), 1);
        assert!(!list.is_loading_more());
        assert!(list.last_error().is_some_and(|e| e.contains("500")));

        list.load_more(&source).await;
        assert_eq!(source.requested_pages(), vec![1, 2, 2]);
        assert_eq!(list.items().len(), 7);
        assert_eq!(list.last_error(), None);
    }

    #[test]
    fn teardown_mid_flight_discards_result() {
        let mut list: ListController<u32> = ListController::new(5);
        let first = list.begin_initialize().unwrap();
        list.apply(first, Ok::<_, String>(records(0..5)));
        let pending = list.begin_load_more().unwrap();

        list.teardown();
        let revision = list.revision();

        assert!(!list.apply(pending, Ok::<_, String>(records(5..10))));
        assert_eq!(list.revision(), revision);
        assert_eq!(list.items().len(), 5);
        assert!(!list.is_loading_more());
        assert_eq!(list.begin_initialize(), None);
    }

    #[test]
    fn ticket_from_another_controller_is_ignored() {
        let mut old: ListController<u32> = ListController::new(5);
        let mut new: ListController<u32> = ListController::new(5);
        let stale = old.begin_initialize().unwrap();
        let _current = new.begin_initialize().unwrap();

        assert!(!new.apply(stale, Ok::<_, String>(records(0..5))));
        assert!(new.is_initial_loading());
        assert!(new.items().is_empty());
    }

    #[test]
    fn type_erased_failure_clears_loading() {
        let mut list: ListController<u32> = ListController::new(5);
        let erased: &mut dyn Paginated = &mut list;
        let ticket = erased.begin_initialize().unwrap();

        assert!(erased.fail(ticket, "timed out"));

        let status = erased.status();
        assert!(!status.is_initial_loading);
        assert!(!status.is_loading_more);
        assert_eq!(status.last_error, Some("timed out"));
    }

    #[test]
    fn edits_after_teardown_are_ignored() {
        let mut list: ListController<u32> = ListController::new(5);
        let ticket = list.begin_initialize().unwrap();
        list.apply(ticket, Ok::<_, String>(records(0..3)));

        list.edit_items(|items| items.retain(|n| *n != 1));
        assert_eq!(list.items(), &[0, 2]);

        list.teardown();
        list.edit_items(|items| items.clear());
        assert_eq!(list.items(), &[0, 2]);
    }

    /// Buffer standing in for stderr
    #[derive(Clone, Default)]
    struct Captured(std::sync::Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn routine_failures_stay_below_default_log_filter() {
        use tracing_subscriber::layer::SubscriberExt;

        let out = Captured::default();
        let writer = out.clone();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_subscriber::EnvFilter::new(crate::DEFAULT_LOG_FILTER))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(move || writer.clone()),
            );

        tracing::subscriber::with_default(subscriber, || {
            let mut list = ListController::<u32>::new(5);
            let ticket = list.begin_initialize().unwrap();
            assert!(list.apply(ticket, transport_error()));
            assert!(!list.apply(ticket, Ok::<_, StoreError>(records(0..5))));

            let stale = list.begin_initialize().unwrap();
            list.teardown();
            assert!(!list.apply(stale, Ok::<_, StoreError>(records(0..5))));
        });

        let logged = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        assert!(logged.is_empty(), "drawn over the UI: {}", logged);
    }
}
