//! Impls - ports と behavior の実装
//!
//! # 含まれる実装
//! - **ServiceRegistry**: 静的な登録マップによる ServiceFactory
//! - **Pre/PostProcessorBehavior**: handler の前後に処理を差し込む
//! - **TracingBehavior / CancellationGuard**: 汎用の横断的処理

pub mod logging;
pub mod processors;
pub mod registry;

pub use self::logging::{CancellationGuard, TracingBehavior};
pub use self::processors::{
    PostProcessorBehavior, PreProcessorBehavior, RequestPostProcessor, RequestPreProcessor,
};
pub use self::registry::{Lifetime, RegistrationInfo, ServiceRegistry};
