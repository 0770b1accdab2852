use crate::error::{Error, Result};
use crate::transport::TransportError;

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

/// Outcome of a publish.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishStatus {
    /// The transport accepted the message.
    Published,
    /// The channel's throttler excluded the event; nothing was sent.
    Throttled,
    /// The transport failed to send the message.
    Failed(TransportError),
    /// The transport did not complete the publish in time.
    TimedOut,
}

impl PublishStatus {
    pub(crate) fn from_transport(error: TransportError) -> Self {
        if error.is_timeout() {
            Self::TimedOut
        } else {
            Self::Failed(error)
        }
    }

    /// Whether the message reached the transport.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

enum Inner {
    Ready(PublishStatus),
    Pending(oneshot::Receiver<PublishStatus>),
}

/// Resolves to the outcome of a publish.
///
/// Dropping the handle does not cancel the publish.
#[must_use = "the publish outcome is only reported through the handle"]
pub struct PublishHandle {
    inner: Inner,
}

impl PublishHandle {
    pub(crate) const fn ready(status: PublishStatus) -> Self {
        Self {
            inner: Inner::Ready(status),
        }
    }

    pub(crate) const fn pending(receiver: oneshot::Receiver<PublishStatus>) -> Self {
        Self {
            inner: Inner::Pending(receiver),
        }
    }
}

impl Future for PublishHandle {
    type Output = Result<PublishStatus>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().inner {
            Inner::Ready(status) => Poll::Ready(Ok(status.clone())),
            Inner::Pending(receiver) => Pin::new(receiver)
                .poll(cx)
                .map(|received| received.map_err(|_| Error::Abandoned)),
        }
    }
}
