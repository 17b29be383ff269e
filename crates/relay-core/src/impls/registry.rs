//! ServiceRegistry - 静的な登録マップによる ServiceFactory 実装
//!
//! # 学習ポイント
//! - HashMap での型消去されたコンストラクタの管理
//! - Generic methods での登録と型安全性
//! - Arc による共有所有権（singleton）と毎回生成（transient）
//!
//! # 設計
//! - 初期化中に構築（mutable）
//! - 実行中は参照のみ（immutable）
//! ロック不要でシンプルに保つ。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::trace;

use crate::REGISTRY_TARGET;
use crate::domain::errors::{BoxError, FactoryError};
use crate::domain::request::Request;
use crate::ports::factory::{Capability, Instance, ServiceFactory};
use crate::typed::handler::{PipelineBehavior, RequestHandler};

type Constructor = Box<dyn Fn() -> Result<Instance, FactoryError> + Send + Sync>;

/// インスタンスの寿命
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lifetime {
    /// 登録された 1 つの値を clone して返す
    Singleton,
    /// lookup のたびにコンストラクタを呼ぶ
    Transient,
}

struct Registration {
    lifetime: Lifetime,
    constructor: Constructor,
}

/// `describe()` が返す 1 行
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistrationInfo {
    pub capability: &'static str,
    pub lifetimes: Vec<Lifetime>,
}

/// ServiceRegistry は capability 型ごとに登録順を保ったコンストラクタ列を持つ
///
/// # 使用例
/// ```ignore
/// let mut registry = ServiceRegistry::new();
/// registry
///     .add_handler::<Ping, _>(PingHandler)
///     .add_behavior::<Ping, _>(Validation)
///     .add_behavior::<Ping, _>(Logging);
/// ```
///
/// 同じ request 型に handler を 2 つ登録しても登録時にはエラーにしない。
/// ディスパッチ時の `get_instance` が `FactoryError::Ambiguous` を返す。
#[derive(Default)]
pub struct ServiceRegistry {
    registrations: HashMap<Capability, Vec<Registration>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
        }
    }

    /// `T` の値を singleton として登録
    pub fn add_instance<T>(&mut self, value: T) -> &mut Self
    where
        T: Clone + Send + Sync + 'static,
    {
        self.push(
            Capability::of::<T>(),
            Lifetime::Singleton,
            Box::new(move || Ok(Box::new(value.clone()) as Instance)),
        )
    }

    /// `T` を lookup のたびに構築するコンストラクタを登録
    ///
    /// コンストラクタの `Err` は `FactoryError::Construction` になる。
    pub fn add_factory<T, F>(&mut self, constructor: F) -> &mut Self
    where
        T: Send + 'static,
        F: Fn() -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let capability = Capability::of::<T>();
        self.push(
            capability,
            Lifetime::Transient,
            Box::new(move || {
                constructor()
                    .map(|value| Box::new(value) as Instance)
                    .map_err(|source| FactoryError::Construction {
                        capability: capability.name(),
                        source,
                    })
            }),
        )
    }

    pub fn add_handler<Req, H>(&mut self, handler: H) -> &mut Self
    where
        Req: Request,
        H: RequestHandler<Req> + 'static,
    {
        let handler: Arc<dyn RequestHandler<Req>> = Arc::new(handler);
        self.add_instance(handler)
    }

    pub fn add_handler_factory<Req, H, F>(&mut self, constructor: F) -> &mut Self
    where
        Req: Request,
        H: RequestHandler<Req> + 'static,
        F: Fn() -> Result<H, BoxError> + Send + Sync + 'static,
    {
        self.add_factory::<Arc<dyn RequestHandler<Req>>, _>(move || {
            constructor().map(|handler| Arc::new(handler) as Arc<dyn RequestHandler<Req>>)
        })
    }

    /// behavior を末尾に追加（登録順 = 実行時の外側から内側への順）
    pub fn add_behavior<Req, B>(&mut self, behavior: B) -> &mut Self
    where
        Req: Request,
        B: PipelineBehavior<Req> + 'static,
    {
        let behavior: Arc<dyn PipelineBehavior<Req>> = Arc::new(behavior);
        self.add_instance(behavior)
    }

    pub fn add_behavior_factory<Req, B, F>(&mut self, constructor: F) -> &mut Self
    where
        Req: Request,
        B: PipelineBehavior<Req> + 'static,
        F: Fn() -> Result<B, BoxError> + Send + Sync + 'static,
    {
        self.add_factory::<Arc<dyn PipelineBehavior<Req>>, _>(move || {
            constructor().map(|behavior| Arc::new(behavior) as Arc<dyn PipelineBehavior<Req>>)
        })
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.registrations
            .get(&capability)
            .is_some_and(|registrations| !registrations.is_empty())
    }

    pub fn has_handler<Req: Request>(&self) -> bool {
        self.contains(Capability::of::<Arc<dyn RequestHandler<Req>>>())
    }

    /// 登録内容の一覧（capability 名でソート）
    pub fn describe(&self) -> Vec<RegistrationInfo> {
        let mut rows: Vec<RegistrationInfo> = self
            .registrations
            .iter()
            .map(|(capability, registrations)| RegistrationInfo {
                capability: capability.name(),
                lifetimes: registrations.iter().map(|r| r.lifetime).collect(),
            })
            .collect();
        rows.sort_by(|a, b| a.capability.cmp(b.capability));
        rows
    }

    fn push(
        &mut self,
        capability: Capability,
        lifetime: Lifetime,
        constructor: Constructor,
    ) -> &mut Self {
        trace!(target: REGISTRY_TARGET, capability = capability.name(), ?lifetime, "registered");
        self.registrations
            .entry(capability)
            .or_default()
            .push(Registration {
                lifetime,
                constructor,
            });
        self
    }
}

impl ServiceFactory for ServiceRegistry {
    fn get_instance(&self, capability: Capability) -> Result<Option<Instance>, FactoryError> {
        match self.registrations.get(&capability).map(Vec::as_slice) {
            None | Some([]) => Ok(None),
            Some([registration]) => (registration.constructor)().map(Some),
            Some(many) => Err(FactoryError::Ambiguous {
                capability: capability.name(),
                count: many.len(),
            }),
        }
    }

    fn get_instances(&self, capability: Capability) -> Result<Vec<Instance>, FactoryError> {
        self.registrations
            .get(&capability)
            .into_iter()
            .flatten()
            .map(|registration| (registration.constructor)())
            .collect()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("registrations", &self.describe())
            .finish()
    }
}
