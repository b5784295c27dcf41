//! Upload progress stream
//!
//! An [`UploadStream`] yields any number of [`UploadEvent::Progress`] events
//! followed by exactly one terminal item: `Ok(UploadEvent::Result(_))` or an
//! error. The upload job is not started until the stream is first polled,
//! and dropping the stream aborts the job.

use crate::error::Result;
use crate::models::DialFile;
use futures::future::{BoxFuture, FutureExt};
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// Percentage of the body handed to the transport, 0-100
    Progress { percent: f32 },
    Result(DialFile),
}

impl UploadEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, UploadEvent::Result(_))
    }
}

/// In-memory stand-in for a multipart form with a single file part
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Handle an upload job uses to publish progress
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    tx: mpsc::UnboundedSender<Result<UploadEvent>>,
}

impl ProgressReporter {
    pub fn report(&self, percent: f32) {
        // receiver gone means the caller stopped listening
        let _ = self.tx.send(Ok(UploadEvent::Progress {
            percent: percent.clamp(0.0, 100.0),
        }));
    }
}

type UploadJob = Box<dyn FnOnce(ProgressReporter) -> BoxFuture<'static, Result<DialFile>> + Send>;

pub struct UploadStream {
    job: Option<UploadJob>,
    rx: Option<mpsc::UnboundedReceiver<Result<UploadEvent>>>,
    handle: Option<JoinHandle<()>>,
    done: bool,
}

impl UploadStream {
    pub fn new<F, Fut>(job: F) -> Self
    where
        F: FnOnce(ProgressReporter) -> Fut + Send + 'static,
        Fut: Future<Output = Result<DialFile>> + Send + 'static,
    {
        Self {
            job: Some(Box::new(move |reporter| job(reporter).boxed())),
            rx: None,
            handle: None,
            done: false,
        }
    }

    fn start(&mut self, job: UploadJob) {
        let (tx, rx) = mpsc::unbounded_channel();
        let upload = job(ProgressReporter { tx: tx.clone() });

        self.handle = Some(tokio::spawn(async move {
            let terminal = upload.await.map(UploadEvent::Result);
            let _ = tx.send(terminal);
        }));
        self.rx = Some(rx);
    }

    /// Drains the stream, discarding progress, and returns the uploaded file
    pub async fn into_result(mut self) -> Result<DialFile> {
        use futures::StreamExt;

        while let Some(event) = self.next().await {
            if let UploadEvent::Result(file) = event? {
                return Ok(file);
            }
        }
        Err(crate::error::StorageError::UploadIncomplete)
    }
}

impl Stream for UploadStream {
    type Item = Result<UploadEvent>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }
        if let Some(job) = this.job.take() {
            this.start(job);
        }

        let Some(rx) = this.rx.as_mut() else {
            return Poll::Ready(None);
        };

        match ready!(rx.poll_recv(cx)) {
            Some(Ok(UploadEvent::Progress { percent })) => {
                Poll::Ready(Some(Ok(UploadEvent::Progress { percent })))
            }
            Some(terminal) => {
                this.done = true;
                Poll::Ready(Some(terminal))
            }
            None => {
                this.done = true;
                Poll::Ready(None)
            }
        }
    }
}

impl Drop for UploadStream {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
