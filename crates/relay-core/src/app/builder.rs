//! MediatorBuilder - 登録と起動時検証
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::any::type_name;
use std::sync::Arc;

use tracing::info;

use crate::DISPATCH_TARGET;
use crate::app::mediator::Mediator;
use crate::domain::errors::BoxError;
use crate::domain::request::Request;
use crate::impls::registry::ServiceRegistry;
use crate::ports::factory::Capability;
use crate::typed::handler::{PipelineBehavior, RequestHandler};

/// MediatorBuilder は ServiceRegistry を組み立てて Mediator を作る
///
/// # 使用例
/// ```ignore
/// let mediator = MediatorBuilder::new()
///     .handler::<Ping, _>(PingHandler)?
///     .behavior::<Ping, _>(TracingBehavior)
///     .expect::<Ping>()
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - `handler()` は同じ request 型への 2 つ目の登録を拒否
/// - `expect()` で期待される request 型を宣言
/// - `build()` 時に「期待集合 ⊆ 登録済み集合」をチェック
#[derive(Debug, Default)]
pub struct MediatorBuilder {
    registry: ServiceRegistry,
    expected: Vec<(Capability, &'static str)>,
}

/// BuildError は Mediator 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("handler for request type '{0}' is already registered")]
    DuplicateHandler(&'static str),

    #[error("missing handlers: {0:?}. These request types were expected but have no handler.")]
    MissingHandlers(Vec<&'static str>),
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self {
            registry: ServiceRegistry::new(),
            expected: Vec::new(),
        }
    }

    /// Handler を登録（singleton）
    pub fn handler<Req, H>(mut self, handler: H) -> Result<Self, BuildError>
    where
        Req: Request,
        H: RequestHandler<Req> + 'static,
    {
        self.ensure_no_handler::<Req>()?;
        self.registry.add_handler::<Req, H>(handler);
        Ok(self)
    }

    /// Handler を lookup ごとに構築するコンストラクタを登録（transient）
    pub fn handler_factory<Req, H, F>(mut self, constructor: F) -> Result<Self, BuildError>
    where
        Req: Request,
        H: RequestHandler<Req> + 'static,
        F: Fn() -> Result<H, BoxError> + Send + Sync + 'static,
    {
        self.ensure_no_handler::<Req>()?;
        self.registry.add_handler_factory::<Req, H, F>(constructor);
        Ok(self)
    }

    /// Behavior を追加（呼び出し順 = 外側から内側）
    pub fn behavior<Req, B>(mut self, behavior: B) -> Self
    where
        Req: Request,
        B: PipelineBehavior<Req> + 'static,
    {
        self.registry.add_behavior::<Req, B>(behavior);
        self
    }

    pub fn behavior_factory<Req, B, F>(mut self, constructor: F) -> Self
    where
        Req: Request,
        B: PipelineBehavior<Req> + 'static,
        F: Fn() -> Result<B, BoxError> + Send + Sync + 'static,
    {
        self.registry.add_behavior_factory::<Req, B, F>(constructor);
        self
    }

    /// `build()` 時に handler が必須な request 型を宣言（同じ型は 1 回だけ数える）
    pub fn expect<Req: Request>(mut self) -> Self {
        let capability = Capability::of::<Arc<dyn RequestHandler<Req>>>();
        if !self.expected.iter().any(|(expected, _)| *expected == capability) {
            self.expected.push((capability, type_name::<Req>()));
        }
        self
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// 検証して Mediator を作る
    ///
    /// # 検証
    /// - `expect()` で宣言された request 型に handler が登録されているか
    /// - 不足があれば `BuildError::MissingHandlers`
    pub fn build(self) -> Result<Mediator, BuildError> {
        let missing: Vec<&'static str> = self
            .expected
            .iter()
            .filter(|(capability, _)| !self.registry.contains(*capability))
            .map(|(_, request)| *request)
            .collect();
        if !missing.is_empty() {
            return Err(BuildError::MissingHandlers(missing));
        }

        info!(
            target: DISPATCH_TARGET,
            capabilities = self.registry.describe().len(),
            "mediator built"
        );
        Ok(Mediator::new(Arc::new(self.registry)))
    }

    fn ensure_no_handler<Req: Request>(&self) -> Result<(), BuildError> {
        if self.registry.has_handler::<Req>() {
            return Err(BuildError::DuplicateHandler(type_name::<Req>()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cancel::CancellationSignal;
    use crate::typed::fixtures::{
        Echo, EchoHandler, Ping, PongHandler, Recording, entries, new_trace,
    };

    #[test]
    fn test_build_success() {
        let trace = new_trace();
        let mediator = MediatorBuilder::new()
            .handler::<Ping, _>(PongHandler::new(&trace))
            .unwrap()
            .expect::<Ping>()
            .build();
        assert!(mediator.is_ok());
    }

    #[test]
    fn test_build_missing_handlers() {
        let trace = new_trace();
        let result = MediatorBuilder::new()
            .handler::<Ping, _>(PongHandler::new(&trace))
            .unwrap()
            .expect::<Ping>()
            .expect::<Echo>()
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingHandlers(missing)) if missing == vec![type_name::<Echo>()]
        ));
    }

    #[test]
    fn test_repeated_expectations_reported_once() {
        let trace = new_trace();
        let result = MediatorBuilder::new()
            .handler::<Ping, _>(PongHandler::new(&trace))
            .unwrap()
            .expect::<Echo>()
            .expect::<Ping>()
            .expect::<Echo>()
            .build();
        assert!(matches!(
            result,
            Err(BuildError::MissingHandlers(missing)) if missing == vec![type_name::<Echo>()]
        ));
    }

    #[test]
    fn test_build_without_expectations() {
        assert!(MediatorBuilder::new().build().is_ok());
    }

    #[test]
    fn test_duplicate_handler_is_rejected() {
        let trace = new_trace();
        let result = MediatorBuilder::new()
            .handler::<Ping, _>(PongHandler::new(&trace))
            .unwrap()
            .handler_factory::<Ping, PongHandler, _>({
                let trace = trace.clone();
                move || Ok(PongHandler::new(&trace))
            });
        assert!(matches!(result, Err(BuildError::DuplicateHandler(name)) if name == type_name::<Ping>()));
    }

    #[tokio::test]
    async fn test_built_mediator_dispatches() {
        let trace = new_trace();
        let mediator = MediatorBuilder::new()
            .handler::<Ping, _>(PongHandler::new(&trace))
            .unwrap()
            .handler::<Echo, _>(EchoHandler)
            .unwrap()
            .behavior::<Ping, _>(Recording::new("L1", &trace))
            .behavior_factory::<Ping, Recording, _>({
                let trace = trace.clone();
                move || Ok(Recording::new("L2", &trace))
            })
            .expect::<Ping>()
            .expect::<Echo>()
            .build()
            .unwrap();

        let cancel = CancellationSignal::none();
        assert_eq!(mediator.send(&Ping, &cancel).await.unwrap(), "Pong");
        assert_eq!(mediator.send(&Echo(9), &cancel).await.unwrap(), 9);
        assert_eq!(
            entries(&trace),
            vec!["L1-in", "L2-in", "handler", "L2-out", "L1-out"]
        );
    }
}
