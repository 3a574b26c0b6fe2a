//! Body wrappers for both relay directions.
//!
//! Once the status line and headers are on their way to the client the gateway
//! can no longer turn a failure into a 502. An upstream stream error at that
//! point is logged here and passed on, which makes the server abort the client
//! stream instead of leaving it hanging.
//!
//! Outbound, [`upload_body`] reports when the client's body has been fully
//! handed to the transport, so the response timeout only covers the upstream's
//! think time and never the upload itself.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::Method;
use http_body::{Body as _, Frame, SizeHint};
use http_body_util::BodyExt;
use tokio::sync::oneshot;

use crate::observability::metrics;

/// Outbound request body that signals once it has been read to the end.
///
/// The receiver also resolves (with an error) if the body is dropped early,
/// e.g. because the upstream answered or the connection failed mid-upload.
pub fn upload_body(body: Body) -> (Body, oneshot::Receiver<()>) {
    let (tx, rx) = oneshot::channel();
    let mut upload = UploadBody {
        inner: body,
        done: Some(tx),
    };
    if upload.inner.is_end_stream() {
        upload.finish();
    }
    (Body::new(upload), rx)
}

struct UploadBody {
    inner: Body,
    done: Option<oneshot::Sender<()>>,
}

impl UploadBody {
    fn finish(&mut self) {
        if let Some(done) = self.done.take() {
            let _ = done.send(());
        }
    }
}

impl http_body::Body for UploadBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let polled = Pin::new(&mut self.inner).poll_frame(cx);
        if let Poll::Ready(None) = polled {
            self.finish();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Wrap an upstream body so mid-stream failures are reported.
pub fn relay_body(body: Body, method: &Method, target: &str) -> Body {
    let context = Arc::new((method.clone(), target.to_string()));
    Body::new(body.map_err(move |err| {
        let (method, target) = &*context;
        tracing::warn!(
            method = %method,
            target = %target,
            error = %err,
            "Upstream stream failed after response started; truncating relay"
        );
        metrics::record_error("partial_relay");
        err
    }))
}
