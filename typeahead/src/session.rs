//! SearchSession - incremental type-ahead controller
//!
//! Turns a stream of keystrokes into debounced, cancellable search runs and
//! publishes the index of the latest successful match.
//!
//! Async Cancellation Architecture:
//! Every run gets a child of the session's CancellationToken. A new keystroke
//! cancels the in-flight run and launches a fresh one without waiting for it;
//! the task tree checks the token at entry, before merging and on every leaf
//! iteration. A run only publishes if it is still the latest one when it
//! finishes, so a superseded run's result is always discarded. Dropping the
//! session cancels the parent token through a DropGuard.

use std::fmt::Display;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::SessionConfig;
use crate::corpus::{Corpus, ObservableList};
use crate::interface::TypeAheadError;
use crate::runtime::{init_rayon, runtime_handle, DropGuard};
use crate::task::{compile_pattern, focus_before, ParallelSearchTask};

/// Thread-safe incremental search session
///
/// Concurrency Model:
/// - Session state (buffer, clock, range, current run) sits behind one mutex,
///   held only for short updates; `search` never waits on a run
/// - The corpus is an immutable snapshot swapped under a read/write lock
/// - Runs execute on tokio's blocking pool and fork onto the global rayon pool
/// - The published index is a watch channel: one writer, any number of readers
pub struct SearchSession {
    inner: Arc<SessionInner>,
    _guard: DropGuard,
}

struct SessionInner {
    state: Mutex<SessionState>,
    corpus: RwLock<Corpus>,
    parallelism: usize,
    /// Bumped whenever the corpus source changes; live bindings with an older value detach
    source: AtomicU64,
    published: watch::Sender<Option<usize>>,
    completed: watch::Sender<u64>,
    token: CancellationToken,
}

struct SessionState {
    buffer: String,
    last_keystroke: Option<Instant>,
    range: (usize, usize),
    timeout: Duration,
    allow_leading_spaces: bool,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

/// Everything a run needs, captured at launch time.
struct RunRequest {
    generation: u64,
    query: String,
    corpus: Corpus,
    range: (usize, usize),
    token: CancellationToken,
}

impl Default for SearchSession {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl SearchSession {
    pub fn new(config: SessionConfig) -> Self {
        init_rayon();
        let parallelism = config.effective_parallelism();
        let token = CancellationToken::new();

        let inner = SessionInner {
            state: Mutex::new(SessionState {
                buffer: String::new(),
                last_keystroke: None,
                range: (0, 0),
                timeout: config.timeout(),
                allow_leading_spaces: config.allow_leading_spaces,
                generation: 0,
                in_flight: None,
            }),
            corpus: RwLock::new(Corpus::empty(parallelism)),
            parallelism,
            source: AtomicU64::new(0),
            published: watch::Sender::new(None),
            completed: watch::Sender::new(0),
            token: token.clone(),
        };

        Self {
            inner: Arc::new(inner),
            _guard: DropGuard::new(token),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Corpus
// ─────────────────────────────────────────────────────────────────────────────

impl SearchSession {
    /// Replace the corpus with the given strings.
    pub fn set_strings<I, S>(&self, strings: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let corpus = Corpus::new(strings.into_iter().map(Into::into).collect(), self.inner.parallelism);
        self.inner.detach_live();
        self.inner.replace_corpus(corpus);
    }

    /// Replace the corpus using each element's `ToString` conversion.
    pub fn set_corpus<T: ToString>(&self, items: &[T]) {
        self.set_strings(items.iter().map(ToString::to_string));
    }

    /// Replace the corpus through a fallible converter.
    ///
    /// On the first conversion failure the previous corpus stays in place and
    /// the error is returned.
    pub fn set_corpus_with<T, F, E>(&self, items: &[T], converter: F) -> Result<(), TypeAheadError>
    where
        F: Fn(&T) -> Result<String, E>,
        E: Display,
    {
        let corpus = Corpus::convert(items, self.inner.parallelism, converter)?;
        self.inner.detach_live();
        self.inner.replace_corpus(corpus);
        Ok(())
    }

    /// Mirror a live list: the corpus is rebuilt now and after every change
    /// to `list`, until another corpus is set or the session is dropped.
    ///
    /// Returns the listener id on `list`. A failed conversion is logged and
    /// leaves the previous corpus in place.
    pub fn bind_live<T, F, E>(&self, list: &ObservableList<T>, converter: F) -> u64
    where
        T: 'static,
        F: Fn(&T) -> Result<String, E> + Send + Sync + 'static,
        E: Display + 'static,
    {
        let source = self.inner.detach_live();
        let weak: Weak<SessionInner> = Arc::downgrade(&self.inner);

        list.subscribe(move |items| {
            let Some(inner) = weak.upgrade() else {
                return false;
            };
            if inner.source.load(Ordering::Acquire) != source {
                return false;
            }
            match Corpus::convert(items, inner.parallelism, &converter) {
                Ok(corpus) => inner.replace_live_corpus(source, corpus),
                Err(e) => {
                    tracing::warn!(error = %e, "live corpus rebuild failed, keeping previous corpus");
                    true
                }
            }
        })
    }

    pub fn corpus(&self) -> Corpus {
        self.inner.corpus.read().clone()
    }

    pub fn corpus_len(&self) -> usize {
        self.inner.corpus.read().len()
    }

    pub fn workload_threshold(&self) -> usize {
        self.inner.corpus.read().threshold()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

impl SearchSession {
    /// When `false` (the default), whitespace typed into an empty buffer is absorbed.
    pub fn allow_leading_spaces(&self, allow: bool) {
        self.inner.state.lock().allow_leading_spaces = allow;
    }

    pub fn set_timeout(&self, timeout: Duration) {
        self.inner.state.lock().timeout = timeout;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Search
// ─────────────────────────────────────────────────────────────────────────────

impl SearchSession {
    /// Feed a keystroke, searching one full pass from index 0.
    pub fn search(&self, text: &str) {
        self.search_from(text, 0);
    }

    /// Feed a keystroke, searching one full pass starting at `start`.
    pub fn search_from(&self, text: &str, start: usize) {
        let len = self.corpus_len();
        self.search_range(text, start, start.saturating_add(len));
    }

    /// Feed a keystroke over `[start, end)`; `end` past the corpus length wraps.
    ///
    /// The range is only adopted when this keystroke starts a new query.
    /// Never blocks: the run executes in the background and reports through
    /// [`current_index`](Self::current_index) and [`subscribe`](Self::subscribe).
    pub fn search_range(&self, text: &str, start: usize, end: usize) {
        if text.is_empty() {
            return;
        }

        let request = {
            let mut state = self.inner.state.lock();
            let now = Instant::now();

            let expired = state
                .last_keystroke
                .map_or(true, |last| now.duration_since(last) > state.timeout);
            if expired {
                state.buffer.clear();
                state.range = (start.min(end), start.max(end));
            }

            let text = if state.buffer.is_empty() && !state.allow_leading_spaces {
                text.trim_start()
            } else {
                text
            };
            if text.is_empty() {
                tracing::trace!("absorbed leading whitespace");
                return;
            }

            state.buffer.push_str(text);
            state.last_keystroke = Some(now);

            if let Some(previous) = state.in_flight.take() {
                previous.cancel();
            }
            state.generation += 1;
            let token = self.inner.token.child_token();
            state.in_flight = Some(token.clone());

            RunRequest {
                generation: state.generation,
                query: state.buffer.clone(),
                corpus: self.inner.corpus.read().clone(),
                range: state.range,
                token,
            }
        };

        tracing::debug!(
            generation = request.generation,
            query = %request.query,
            start = request.range.0,
            end = request.range.1,
            "launching search run"
        );
        SessionInner::launch(&self.inner, request);
    }

    /// Cancel the in-flight run, if any. Buffer and published index are kept.
    pub fn cancel(&self) {
        if let Some(token) = self.inner.state.lock().in_flight.take() {
            token.cancel();
        }
    }

    /// Cancel the in-flight run and forget the typed query; the next
    /// keystroke starts fresh. The published index is kept.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        if let Some(token) = state.in_flight.take() {
            token.cancel();
        }
        state.buffer.clear();
        state.last_keystroke = None;
    }

    /// Wait until the most recently launched run has finished.
    pub async fn wait_idle(&self) {
        let target = self.inner.state.lock().generation;
        let mut completed = self.inner.completed.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = completed.wait_for(|done| *done >= target).await;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Observation
// ─────────────────────────────────────────────────────────────────────────────

impl SearchSession {
    /// Index of the latest successful match; unchanged by runs that find nothing.
    pub fn current_index(&self) -> Option<usize> {
        *self.inner.published.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<usize>> {
        self.inner.published.subscribe()
    }

    /// Time since the last accepted keystroke
    pub fn last_run_elapsed(&self) -> Option<Duration> {
        self.inner.state.lock().last_keystroke.map(|t| t.elapsed())
    }

    /// Current query text
    pub fn buffer(&self) -> String {
        self.inner.state.lock().buffer.clone()
    }
}

impl SessionInner {
    fn detach_live(&self) -> u64 {
        self.source.fetch_add(1, Ordering::AcqRel) + 1
    }

    fn replace_corpus(&self, corpus: Corpus) {
        tracing::debug!(len = corpus.len(), threshold = corpus.threshold(), "corpus rebuilt");
        *self.corpus.write() = corpus;
    }

    /// Install a corpus rebuilt from live source `source`, unless another
    /// corpus was set while it was converting. Returns whether the source is
    /// still bound.
    fn replace_live_corpus(&self, source: u64, corpus: Corpus) -> bool {
        let mut slot = self.corpus.write();
        if self.source.load(Ordering::Acquire) != source {
            tracing::debug!(source, "dropping rebuild from detached live list");
            return false;
        }
        tracing::debug!(len = corpus.len(), threshold = corpus.threshold(), "corpus rebuilt");
        *slot = corpus;
        true
    }

    fn launch(inner: &Arc<SessionInner>, request: RunRequest) {
        let runtime = runtime_handle();
        let blocking = runtime.clone();
        let inner = Arc::clone(inner);

        runtime.spawn(async move {
            let generation = request.generation;
            let token = request.token.clone();
            let handle = blocking.spawn_blocking(move || Self::execute(request));

            let outcome = match handle.await {
                Ok(outcome) => outcome,
                Err(_join_error) => Err(TypeAheadError::Cancelled),
            };
            inner.finish(generation, &token, outcome);
        });
    }

    fn execute(request: RunRequest) -> Result<Option<usize>, TypeAheadError> {
        let RunRequest { query, corpus, range, token, .. } = request;
        if corpus.is_empty() || query.is_empty() {
            return Ok(None);
        }
        if token.is_cancelled() {
            return Err(TypeAheadError::Cancelled);
        }

        let pattern = compile_pattern(&query)?;
        let (start, end) = range;
        let task = ParallelSearchTask::new(
            corpus.strings(),
            Arc::new(pattern),
            focus_before(start, corpus.len()),
            start,
            end,
            corpus.threshold(),
            token.clone(),
        );

        #[cfg(feature = "perf-log")]
        let t0 = Instant::now();
        let best = task.compute();
        #[cfg(feature = "perf-log")]
        tracing::debug!(
            elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0,
            len = corpus.len(),
            threshold = corpus.threshold(),
            "[perf] task tree"
        );

        if token.is_cancelled() {
            return Err(TypeAheadError::Cancelled);
        }
        Ok(best.and_then(|m| m.index()))
    }

    fn finish(&self, generation: u64, token: &CancellationToken, outcome: Result<Option<usize>, TypeAheadError>) {
        // Publishing under the state lock keeps a newer keystroke from slipping in between.
        let state = self.state.lock();
        let current = state.generation == generation && !token.is_cancelled();
        match outcome {
            Ok(Some(index)) if current => {
                tracing::debug!(generation, index, "publishing match");
                self.published.send_replace(Some(index));
            }
            Ok(Some(index)) => tracing::trace!(generation, index, "discarding superseded result"),
            Ok(None) => tracing::debug!(generation, "no match"),
            Err(e) => tracing::debug!(generation, error = %e, "run ended without a result"),
        }
        drop(state);

        self.completed.send_modify(|done| *done = (*done).max(generation));
    }
}
