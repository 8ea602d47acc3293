use axum::{Extension, Router, routing::get};
use std::{io, net::SocketAddr, sync::Arc, time::Duration};
use tokio::{
    net::TcpListener,
    sync::oneshot,
    task::JoinHandle,
};

use crate::{
    api::{self, CallbackState},
    error::AuthError,
    types::CallbackResult,
};

// Upper bound for in-flight responses to drain once a result is in.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Short-lived loopback listener that captures exactly one OAuth redirect.
pub struct CallbackReceiver;

impl CallbackReceiver {
    /// Binds `bind_addr` and serves `callback_path` on a background task.
    ///
    /// Only redirects whose `state` equals `expected_state` are accepted.
    pub async fn start(
        bind_addr: &str,
        callback_path: &str,
        expected_state: &str,
    ) -> Result<CallbackHandle, AuthError> {
        let (result_tx, result_rx) = oneshot::channel::<CallbackResult>();
        let state = Arc::new(CallbackState::new(expected_state, result_tx));

        let app = Router::new().route(callback_path, get(api::callback).layer(Extension(state)));

        let listener = TcpListener::bind(bind_addr).await.map_err(|e| {
            AuthError::Configuration(format!(
                "cannot bind callback receiver on {}: {}. Make sure no other process is using this port.",
                bind_addr, e
            ))
        })?;
        let local_addr = listener.local_addr()?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        Ok(CallbackHandle {
            local_addr,
            result_rx,
            shutdown_tx: Some(shutdown_tx),
            task,
        })
    }
}

/// Running receiver. Dropping it without awaiting tears the server down.
pub struct CallbackHandle {
    local_addr: SocketAddr,
    result_rx: oneshot::Receiver<CallbackResult>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<io::Result<()>>,
}

impl CallbackHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Suspends until the redirect arrives or `timeout` elapses.
    ///
    /// The listening socket is released before this returns, whatever the outcome.
    pub async fn await_result(mut self, timeout: Duration) -> Result<CallbackResult, AuthError> {
        let outcome = tokio::time::timeout(timeout, &mut self.result_rx).await;
        self.shutdown().await;

        match outcome {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(AuthError::Io(io::Error::other(
                "callback receiver stopped before a redirect arrived",
            ))),
            Err(_) => Err(AuthError::CallbackTimeout(timeout)),
        }
    }

    async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.task)
            .await
            .is_err()
        {
            self.task.abort();
            let _ = (&mut self.task).await;
        }
    }
}

impl Drop for CallbackHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
