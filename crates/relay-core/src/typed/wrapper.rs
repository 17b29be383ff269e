//! RequestHandlerWrapper - 型消去された request を型付きパスへ戻す
//!
//! # 学習ポイント
//! - Object-safe trait (`ErasedRequestHandler`)
//! - Type erasure パターン (`RequestHandlerWrapper<Req>` → `dyn ErasedRequestHandler`)
//! - PhantomData だけを持つ zero-sized な wrapper
//!
//! wrapper は (request 型, response 型) ごとに 1 つ。
//! 具体型を知らない呼び出し元は `AnyRequest` を渡し、wrapper が downcast して
//! handler 解決 → パイプライン合成 → 実行 の型付きパスに進む。

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::DISPATCH_TARGET;
use crate::domain::cancel::CancellationSignal;
use crate::domain::errors::DispatchError;
use crate::domain::request::{AnyRequest, AnyResponse, Request};
use crate::ports::factory::{Capability, ServiceFactory, ServiceFactoryExt};
use crate::typed::handler::{PipelineBehavior, RequestHandler};
use crate::typed::pipeline::{compose, execute};

/// Resolves the single handler registered for `Req`.
///
/// - factory が失敗した → `DispatchError::Construction`（元のエラーを source に保持）
/// - factory が `None` を返した → `DispatchError::NotRegistered`
pub fn resolve_handler<Req: Request>(
    factory: &dyn ServiceFactory,
) -> Result<Arc<dyn RequestHandler<Req>>, DispatchError> {
    let capability = Capability::of::<Arc<dyn RequestHandler<Req>>>();
    let handler = factory
        .instance::<Arc<dyn RequestHandler<Req>>>()
        .map_err(|source| {
            warn!(target: DISPATCH_TARGET, capability = capability.name(), error = ?source, "handler construction failed");
            DispatchError::Construction {
                capability: capability.name(),
                source,
            }
        })?;

    handler.ok_or_else(|| {
        warn!(target: DISPATCH_TARGET, capability = capability.name(), "handler not registered");
        DispatchError::NotRegistered {
            capability: capability.name(),
        }
    })
}

/// Resolves every behavior registered for `Req`, in registration order.
pub fn resolve_behaviors<Req: Request>(
    factory: &dyn ServiceFactory,
) -> Result<Vec<Arc<dyn PipelineBehavior<Req>>>, DispatchError> {
    let capability = Capability::of::<Arc<dyn PipelineBehavior<Req>>>();
    factory
        .instances::<Arc<dyn PipelineBehavior<Req>>>()
        .map_err(|source| {
            warn!(target: DISPATCH_TARGET, capability = capability.name(), error = ?source, "behavior construction failed");
            DispatchError::Construction {
                capability: capability.name(),
                source,
            }
        })
}

/// ErasedRequestHandler は object-safe な wrapper の抽象化
///
/// `HashMap<TypeId, Arc<dyn ErasedRequestHandler>>` に格納できる。
#[async_trait]
pub trait ErasedRequestHandler: Send + Sync {
    async fn handle_erased(
        &self,
        request: &AnyRequest,
        cancel: &CancellationSignal,
        factory: &dyn ServiceFactory,
    ) -> Result<AnyResponse, DispatchError>;

    /// この wrapper が受け付ける request 型の名前
    fn request_type(&self) -> &'static str;
}

pub struct RequestHandlerWrapper<Req> {
    _marker: PhantomData<fn() -> Req>,
}

impl<Req: Request> RequestHandlerWrapper<Req> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// `AnyRequest` が持ち運ぶ wrapper コンストラクタ
    pub(crate) fn erased() -> Arc<dyn ErasedRequestHandler> {
        Arc::new(Self::new())
    }

    /// 型付きの入口: 解決 → 合成 → 実行
    ///
    /// 解決はどの behavior よりも先に行うので、構成エラーは
    /// ビジネスロジックが 1 行も動く前に返る。
    pub async fn handle(
        &self,
        request: &Req,
        cancel: &CancellationSignal,
        factory: &dyn ServiceFactory,
    ) -> Result<Req::Response, DispatchError> {
        let handler = resolve_handler::<Req>(factory)?;
        let behaviors = resolve_behaviors::<Req>(factory)?;
        debug!(
            target: DISPATCH_TARGET,
            request = type_name::<Req>(),
            behaviors = behaviors.len(),
            "pipeline composed"
        );

        execute(compose(request, cancel, handler, behaviors)).await
    }
}

impl<Req: Request> Default for RequestHandlerWrapper<Req> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Req> fmt::Debug for RequestHandlerWrapper<Req> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestHandlerWrapper")
            .field("request", &type_name::<Req>())
            .finish()
    }
}

#[async_trait]
impl<Req: Request> ErasedRequestHandler for RequestHandlerWrapper<Req> {
    async fn handle_erased(
        &self,
        request: &AnyRequest,
        cancel: &CancellationSignal,
        factory: &dyn ServiceFactory,
    ) -> Result<AnyResponse, DispatchError> {
        let typed = request
            .downcast_ref::<Req>()
            .ok_or_else(|| DispatchError::TypeMismatch {
                expected: type_name::<Req>(),
                actual: request.type_name(),
            })?;

        let response = self.handle(typed, cancel, factory).await?;
        Ok(AnyResponse::new(response))
    }

    fn request_type(&self) -> &'static str {
        type_name::<Req>()
    }
}
