use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use crate::notifier::Notifier;
use crate::practicum::{check_response, ContractError, HomeworkSource};
use crate::verdict::{decode_record, parse_status, RenderError};

const DEFAULT_NOTIFY_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of the current time in seconds since the epoch.
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

fn system_clock() -> Clock {
    Arc::new(|| chrono::Utc::now().timestamp())
}

/// How a non-fatal cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The API could not be reached or answered garbage; try again later.
    FetchFailed,
    /// The API answered with an empty `homeworks` list.
    NothingNew,
    /// A status message was rendered and handed to the notifier.
    Notified,
}

/// Conditions that stop the bot.
#[derive(Debug, Error)]
pub enum FatalError {
    #[error(transparent)]
    Contract(#[from] ContractError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("unexpected failure: {0}")]
    Unexpected(String),
}

/// Owns the `from_date` cursor and drives fetch → validate → render → notify.
pub struct Poller<S, N> {
    source: S,
    notifier: N,
    cursor: i64,
    retry_period: Duration,
    notify_timeout: Duration,
    clock: Clock,
}

impl<S, N> Poller<S, N>
where
    S: HomeworkSource,
    N: Notifier,
{
    /// The cursor starts at the current time.
    pub fn new(source: S, notifier: N, retry_period: Duration) -> Self {
        let clock = system_clock();
        let cursor = clock();
        Self {
            source,
            notifier,
            cursor,
            retry_period,
            notify_timeout: DEFAULT_NOTIFY_TIMEOUT,
            clock,
        }
    }

    /// Replace the clock and reset the cursor to its current reading.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> i64 + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self.cursor = (self.clock)();
        self
    }

    pub fn with_notify_timeout(mut self, notify_timeout: Duration) -> Self {
        self.notify_timeout = notify_timeout;
        self
    }

    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Poll until a fatal error occurs, sleeping `retry_period` between
    /// cycles. Only returns on a fatal error.
    pub async fn run(&mut self) -> FatalError {
        info!(cursor = self.cursor, retry_period = ?self.retry_period, "polling started");
        loop {
            match self.poll_once().await {
                Ok(outcome) => {
                    debug!(?outcome, cursor = self.cursor, "cycle finished");
                    tokio::time::sleep(self.retry_period).await;
                }
                Err(err) => return err,
            }
        }
    }

    /// Run a single cycle. On a fatal error the failure has already been
    /// logged and reported through the notifier when this returns.
    #[instrument(skip_all, fields(cursor = self.cursor))]
    pub async fn poll_once(&mut self) -> Result<CycleOutcome, FatalError> {
        let res = match AssertUnwindSafe(self.cycle()).catch_unwind().await {
            Ok(res) => res,
            Err(panic) => Err(FatalError::Unexpected(panic_message(panic.as_ref()))),
        };
        if let Err(err) = &res {
            self.report_fatal(err).await;
        }
        res
    }

    async fn cycle(&mut self) -> Result<CycleOutcome, FatalError> {
        let body = match self.source.fetch_homeworks(self.cursor).await {
            Ok(body) => body,
            Err(err) => {
                debug!(%err, "no data this cycle");
                return Ok(CycleOutcome::FetchFailed);
            }
        };

        let response = check_response(body)?;
        if let Some(current_date) = response.current_date {
            debug!(current_date, homeworks = response.homeworks.len(), "response accepted");
        }

        let Some(latest) = response.latest() else {
            debug!("nothing new");
            return Ok(CycleOutcome::NothingNew);
        };

        let record = decode_record(latest)?;
        let message = parse_status(&record)?;
        self.send_message(&message).await;
        // A lost notification does not hold the cursor back.
        self.cursor = (self.clock)();
        Ok(CycleOutcome::Notified)
    }

    /// Best effort: failures, timeouts and panics are logged and swallowed.
    async fn send_message(&self, text: &str) {
        let send = AssertUnwindSafe(self.notifier.send(text)).catch_unwind();
        match tokio::time::timeout(self.notify_timeout, send).await {
            Ok(Ok(Ok(()))) => debug!(message = text, "message sent"),
            Ok(Ok(Err(err))) => error!(?err, "failed to send message"),
            Ok(Err(panic)) => error!(
                panic = %panic_message(panic.as_ref()),
                "notifier panicked while sending message"
            ),
            Err(_) => error!(timeout = ?self.notify_timeout, "timed out sending message"),
        }
    }

    async fn report_fatal(&self, err: &FatalError) {
        error!(critical = true, %err, "fatal failure, stopping");
        self.send_message(&format!("Сбой в работе программы: {err}")).await;
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}
