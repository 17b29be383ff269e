//! ServiceFactory port - capability 型からインスタンスを解決する
//!
//! core が外部コラボレーターに要求するのはこの 2 つの lookup だけ:
//! - `get_instance`: ちょうど 1 つ（0 件なら `Ok(None)`）
//! - `get_instances`: 0 件以上、登録順
//!
//! インスタンスの所有権とライフタイムは factory 側の責任。

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::domain::errors::FactoryError;

/// 解決されたインスタンス（具体型は capability 型そのもの）
pub type Instance = Box<dyn Any + Send>;

/// Capability は要求する能力の型を識別する
///
/// 例: `Capability::of::<Arc<dyn RequestHandler<Ping>>>()`
#[derive(Debug, Clone, Copy)]
pub struct Capability {
    id: TypeId,
    name: &'static str,
}

impl Capability {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for Capability {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Capability {}

impl Hash for Capability {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// ServiceFactory は capability 型をインスタンスに解決
///
/// # Object Safety
/// - ジェネリックメソッドを持たないので `&dyn ServiceFactory` として渡せる
/// - 型付きの取り出しは `ServiceFactoryExt` が担当
pub trait ServiceFactory: Send + Sync {
    /// Exactly one instance. `Ok(None)` when nothing is registered; `Err` when
    /// the lookup is ambiguous or construction fails.
    fn get_instance(&self, capability: Capability) -> Result<Option<Instance>, FactoryError>;

    /// All instances in registration order (possibly empty).
    fn get_instances(&self, capability: Capability) -> Result<Vec<Instance>, FactoryError>;
}

/// 型付き lookup（`Instance` を `T` に downcast する）
pub trait ServiceFactoryExt: ServiceFactory {
    fn instance<T: Send + 'static>(&self) -> Result<Option<T>, FactoryError> {
        let capability = Capability::of::<T>();
        self.get_instance(capability)?
            .map(|instance| downcast_instance::<T>(capability, instance))
            .transpose()
    }

    fn instances<T: Send + 'static>(&self) -> Result<Vec<T>, FactoryError> {
        let capability = Capability::of::<T>();
        self.get_instances(capability)?
            .into_iter()
            .map(|instance| downcast_instance::<T>(capability, instance))
            .collect()
    }
}

impl<F: ServiceFactory + ?Sized> ServiceFactoryExt for F {}

fn downcast_instance<T: 'static>(
    capability: Capability,
    instance: Instance,
) -> Result<T, FactoryError> {
    instance
        .downcast::<T>()
        .map(|value| *value)
        .map_err(|_| FactoryError::WrongType {
            capability: capability.name(),
        })
}
