//! Ports - 外部コラボレーターとの境界
//!
//! core が外から受け取るのは capability の解決だけ。
//! 具体的な登録方法（静的マップ、DI コンテナなど）は実装側に任せる。

pub mod factory;

pub use self::factory::{Capability, Instance, ServiceFactory, ServiceFactoryExt};
