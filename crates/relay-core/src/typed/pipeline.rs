//! Pipeline - behavior と handler を 1 本の continuation に合成する
//!
//! 登録順 `[B1, B2, ..., Bn]` と handler `H` から、
//! `B1(B2(...Bn(H)))` という入れ子（onion）を作る。
//! 最初に登録した behavior が一番外側になる。
//!
//! 実行順:
//! `B1-pre, B2-pre, ..., Bn-pre, H, Bn-post, ..., B2-post, B1-post`
//!
//! パイプラインは呼び出しごとに作り直し、呼び出しをまたいで共有しない。

use std::sync::Arc;

use futures::FutureExt;

use crate::domain::cancel::CancellationSignal;
use crate::domain::errors::DispatchError;
use crate::domain::request::Request;
use crate::typed::handler::{Next, PipelineBehavior, RequestHandler};

/// behavior 列と handler を合成する
///
/// handler を種にした右畳み込み（`rfold`）。最後に登録された behavior が
/// 最初に handler を包み、最初に登録された behavior が最後に包む。
pub fn compose<'a, Req: Request>(
    request: &'a Req,
    cancel: &'a CancellationSignal,
    handler: Arc<dyn RequestHandler<Req>>,
    behaviors: Vec<Arc<dyn PipelineBehavior<Req>>>,
) -> Next<'a, Req::Response> {
    let terminal: Next<'a, Req::Response> =
        Box::new(move || async move { handler.handle(request, cancel).await }.boxed());

    behaviors
        .into_iter()
        .rfold(terminal, |next, behavior| -> Next<'a, Req::Response> {
            Box::new(move || async move { behavior.handle(request, cancel, next).await }.boxed())
        })
}

/// 合成済みパイプラインを実行する
///
/// エラーは handler / behavior が返したものをそのまま返す。
pub async fn execute<Res>(pipeline: Next<'_, Res>) -> Result<Res, DispatchError> {
    pipeline().await
}
