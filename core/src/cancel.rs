//! Cancelable handles for in-flight requests.
//!
//! # Design
//! Each request runs on its own tokio task. The task races the request
//! pipeline against a `CancellationToken` with a biased `select!`:
//! - token fires first: the pipeline future is dropped, which aborts the
//!   transport call, and the task settles with `CancelError`;
//! - pipeline finishes first: the task settles with its outcome and a later
//!   `cancel` only flips the token, which nobody is listening to anymore.
//!
//! Since the task produces exactly one value, a handle settles exactly once.
//! Dropping a handle detaches the task; the request still runs to completion.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{CancelError, RequestError};

/// Clonable remote control for a `CancelableRequest`.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// An in-flight request. Await it for the outcome.
#[derive(Debug)]
pub struct CancelableRequest<T> {
    url: String,
    token: CancellationToken,
    task: JoinHandle<Result<T, RequestError>>,
}

impl<T: Send + 'static> CancelableRequest<T> {
    /// Spawn `pipeline` on the current runtime. The caller must already be
    /// inside one.
    pub(crate) fn spawn<F>(url: String, pipeline: F) -> Self
    where
        F: Future<Output = Result<T, RequestError>> + Send + 'static,
    {
        let token = CancellationToken::new();
        let guard = token.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = guard.cancelled() => Err(RequestError::Cancelled(CancelError)),
                outcome = pipeline => outcome,
            }
        });
        Self { url, token, task }
    }
}

impl<T> CancelableRequest<T> {
    /// Abort the request if it has not settled yet; otherwise a no-op.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.token.clone(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the outcome is fixed, whether or not it has been awaited.
    pub fn is_settled(&self) -> bool {
        self.task.is_finished()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl<T> Future for CancelableRequest<T> {
    type Output = Result<T, RequestError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(join_err)) if join_err.is_panic() => {
                std::panic::resume_unwind(join_err.into_panic())
            }
            // The runtime shut down under us; nobody will deliver a value.
            Poll::Ready(Err(_)) => Poll::Ready(Err(RequestError::Cancelled(CancelError))),
        }
    }
}
