//! relay-core
//!
//! In-process request dispatcher: one handler per request type, wrapped by
//! ordered pipeline behaviors.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（request, cancel, errors, ids）
//! - **ports**: 抽象化レイヤー（ServiceFactory）
//! - **typed**: 型付きディスパッチの中核（Handler / Behavior trait, パイプライン合成, wrapper）
//! - **impls**: 実装（ServiceRegistry, 汎用 behavior）
//! - **app**: 呼び出し側の入口（Mediator, MediatorBuilder）

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;

/// `tracing` target for dispatch and resolution events.
pub const DISPATCH_TARGET: &str = "relay::dispatch";
/// `tracing` target for registry bookkeeping.
pub const REGISTRY_TARGET: &str = "relay::registry";
/// `tracing` target for the built-in behaviors.
pub const BEHAVIOR_TARGET: &str = "relay::behavior";

pub use self::app::{BuildError, Mediator, MediatorBuilder};
pub use self::domain::{
    AnyRequest, AnyResponse, BoxError, CancellationSignal, CancellationSource, DispatchError,
    DispatchId, ErrorKind, FactoryError, Request,
};
pub use self::ports::{Capability, ServiceFactory, ServiceFactoryExt};
pub use self::impls::ServiceRegistry;
pub use self::typed::{Next, PipelineBehavior, RequestHandler};
