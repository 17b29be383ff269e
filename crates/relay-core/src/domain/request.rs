//! Request - request 型と response 型の対応付け
//!
//! # 二層構造
//! - **表層（Typed）**: `Request` trait の関連型で `Req -> Req::Response` を静的に保証
//! - **内部（Any）**: `AnyRequest` / `AnyResponse` で型消去し、具体型を知らない呼び出し元からも送れる

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::domain::errors::DispatchError;
use crate::typed::wrapper::{ErasedRequestHandler, RequestHandlerWrapper};

/// Request は自分が期待する response 型を持つ
///
/// # 使用例
/// ```ignore
/// struct Ping;
///
/// impl Request for Ping {
///     type Response = String;
/// }
/// ```
///
/// # Trait Bounds
/// - `Send + Sync`: behavior チェーン全体で `&Req` を共有するため
/// - `'static`: `TypeId` をキーにするため
pub trait Request: Send + Sync + 'static {
    type Response: Send + 'static;
}

/// 型消去された request
///
/// 具体型の `TypeId` と名前、そしてその型専用の dispatch wrapper を
/// 作る関数を一緒に持ち運ぶ。
pub struct AnyRequest {
    value: Box<dyn Any + Send + Sync>,
    type_id: TypeId,
    type_name: &'static str,
    wrapper: fn() -> Arc<dyn ErasedRequestHandler>,
}

impl AnyRequest {
    pub fn new<Req: Request>(request: Req) -> Self {
        Self {
            value: Box::new(request),
            type_id: TypeId::of::<Req>(),
            type_name: type_name::<Req>(),
            wrapper: RequestHandlerWrapper::<Req>::erased,
        }
    }

    pub fn request_type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// この request の具体型に対応する wrapper を作る
    pub(crate) fn make_wrapper(&self) -> Arc<dyn ErasedRequestHandler> {
        (self.wrapper)()
    }
}

impl fmt::Debug for AnyRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyRequest")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}

/// 型消去された response
pub struct AnyResponse {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl AnyResponse {
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            value: Box::new(value),
            type_name: type_name::<T>(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Recovers the concrete response, failing with `TypeMismatch` for any other `T`.
    pub fn downcast<T: 'static>(self) -> Result<T, DispatchError> {
        let actual = self.type_name;
        self.value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| DispatchError::TypeMismatch {
                expected: type_name::<T>(),
                actual,
            })
    }
}

impl fmt::Debug for AnyResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyResponse")
            .field("type_name", &self.type_name)
            .finish_non_exhaustive()
    }
}
