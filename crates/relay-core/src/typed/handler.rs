//! Handler / Behavior trait - request を処理する側の定義
//!
//! # 学習ポイント
//! - ジェネリック trait (`RequestHandler<Req>`, `PipelineBehavior<Req>`)
//! - `async_trait` による object-safe な async メソッド
//! - `FnOnce` の continuation で「next は高々 1 回」を型で表現

use async_trait::async_trait;
use futures::future::BoxFuture;

use crate::domain::cancel::CancellationSignal;
use crate::domain::errors::DispatchError;
use crate::domain::request::Request;

/// 残りのパイプライン（後続の behavior と handler）を実行する continuation
pub type Next<'a, Res> =
    Box<dyn FnOnce() -> BoxFuture<'a, Result<Res, DispatchError>> + Send + 'a>;

/// RequestHandler は request から response を作る
///
/// 1 つの request 型につき、ちょうど 1 つ登録されている必要がある。
///
/// # 使用例
/// ```ignore
/// struct PingHandler;
///
/// #[async_trait]
/// impl RequestHandler<Ping> for PingHandler {
///     async fn handle(&self, _request: &Ping, _cancel: &CancellationSignal) -> Result<String, DispatchError> {
///         Ok("Pong".to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait RequestHandler<Req: Request>: Send + Sync {
    async fn handle(
        &self,
        request: &Req,
        cancel: &CancellationSignal,
    ) -> Result<Req::Response, DispatchError>;
}

/// PipelineBehavior は handler（または内側の behavior）を包む横断的処理
///
/// `next` を呼ばずに返せば short-circuit になり、
/// その戻り値がそのままディスパッチ結果になる。
///
/// # 使用例
/// ```ignore
/// struct Timing;
///
/// #[async_trait]
/// impl<Req: Request> PipelineBehavior<Req> for Timing {
///     async fn handle(
///         &self,
///         _request: &Req,
///         _cancel: &CancellationSignal,
///         next: Next<'_, Req::Response>,
///     ) -> Result<Req::Response, DispatchError> {
///         let started = Instant::now();
///         let response = next().await;
///         tracing::debug!(elapsed_ms = started.elapsed().as_millis(), "handled");
///         response
///     }
/// }
/// ```
#[async_trait]
pub trait PipelineBehavior<Req: Request>: Send + Sync {
    async fn handle(
        &self,
        request: &Req,
        cancel: &CancellationSignal,
        next: Next<'_, Req::Response>,
    ) -> Result<Req::Response, DispatchError>;
}
