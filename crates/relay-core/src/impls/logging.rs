//! 汎用 behavior: ログ出力とキャンセルチェック

use std::any::type_name;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::BEHAVIOR_TARGET;
use crate::domain::cancel::CancellationSignal;
use crate::domain::errors::DispatchError;
use crate::domain::request::Request;
use crate::typed::handler::{Next, PipelineBehavior};

/// request の開始と結果を `tracing` に流す。結果には手を加えない。
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingBehavior;

#[async_trait]
impl<Req: Request> PipelineBehavior<Req> for TracingBehavior {
    async fn handle(
        &self,
        _request: &Req,
        _cancel: &CancellationSignal,
        next: Next<'_, Req::Response>,
    ) -> Result<Req::Response, DispatchError> {
        let request = type_name::<Req>();
        debug!(target: BEHAVIOR_TARGET, request, "handling request");

        let started = Instant::now();
        let result = next().await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(_) => debug!(target: BEHAVIOR_TARGET, request, elapsed_ms, "request handled"),
            Err(error) => warn!(
                target: BEHAVIOR_TARGET,
                request,
                elapsed_ms,
                kind = ?error.kind(),
                %error,
                "request failed"
            ),
        }
        result
    }
}

/// シグナルがキャンセル済みなら内側を呼ばずに `DispatchError::Cancelled` を返す
#[derive(Debug, Clone, Copy, Default)]
pub struct CancellationGuard;

#[async_trait]
impl<Req: Request> PipelineBehavior<Req> for CancellationGuard {
    async fn handle(
        &self,
        _request: &Req,
        cancel: &CancellationSignal,
        next: Next<'_, Req::Response>,
    ) -> Result<Req::Response, DispatchError> {
        cancel.check()?;
        next().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cancel::CancellationSource;
    use crate::domain::errors::ErrorKind;
    use crate::typed::fixtures::{FailingHandler, Ping, PongHandler, entries, new_trace};
    use crate::typed::pipeline::{compose, execute};
    use std::sync::Arc;

    fn tracing_only() -> Vec<Arc<dyn PipelineBehavior<Ping>>> {
        vec![Arc::new(TracingBehavior)]
    }

    fn guard_only() -> Vec<Arc<dyn PipelineBehavior<Ping>>> {
        vec![Arc::new(CancellationGuard)]
    }

    #[tokio::test]
    async fn tracing_behavior_is_transparent() {
        let trace = new_trace();
        let cancel = CancellationSignal::none();

        let ok = execute(compose(
            &Ping,
            &cancel,
            Arc::new(PongHandler::new(&trace)),
            tracing_only(),
        ))
        .await
        .unwrap();
        assert_eq!(ok, "Pong");

        let err = execute(compose(
            &Ping,
            &cancel,
            Arc::new(FailingHandler),
            tracing_only(),
        ))
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Downstream);
        assert_eq!(err.to_string(), "boom");
    }

    #[tokio::test]
    async fn guard_stops_cancelled_dispatch() {
        let trace = new_trace();
        let source = CancellationSource::new();
        source.cancel();
        let cancel = source.signal();

        let err = execute(compose(
            &Ping,
            &cancel,
            Arc::new(PongHandler::new(&trace)),
            guard_only(),
        ))
        .await
        .unwrap_err();

        assert!(matches!(err, DispatchError::Cancelled));
        assert!(entries(&trace).is_empty());
    }

    #[tokio::test]
    async fn guard_passes_live_dispatch() {
        let trace = new_trace();
        let source = CancellationSource::new();
        let cancel = source.signal();

        let response = execute(compose(
            &Ping,
            &cancel,
            Arc::new(PongHandler::new(&trace)),
            guard_only(),
        ))
        .await
        .unwrap();

        assert_eq!(response, "Pong");
        assert_eq!(entries(&trace), vec!["handler"]);
    }
}
