//! Typed - 型付きディスパッチの中核
//!
//! # 構成
//! - **handler**: `RequestHandler<Req>` / `PipelineBehavior<Req>` と continuation `Next`
//! - **pipeline**: behavior 列と handler の合成と実行
//! - **wrapper**: handler 解決と型消去された入口（`ErasedRequestHandler`）

pub mod handler;
pub mod pipeline;
pub mod wrapper;

#[cfg(test)]
pub(crate) mod fixtures;

pub use self::handler::{Next, PipelineBehavior, RequestHandler};
pub use self::pipeline::{compose, execute};
pub use self::wrapper::{
    ErasedRequestHandler, RequestHandlerWrapper, resolve_behaviors, resolve_handler,
};
