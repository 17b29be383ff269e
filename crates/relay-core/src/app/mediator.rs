//! Mediator - ディスパッチの入口と wrapper キャッシュ
//!
//! - `send`: request の具体型が呼び出し側で分かっている場合
//! - `send_any`: `AnyRequest` しか持っていない場合。wrapper は request 型ごとに
//!   初回だけ作り、以降はキャッシュを使う
//!
//! 1 回のディスパッチは `dispatch` span の中で動き、span には `DispatchId` が付く。

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{Instrument, info_span};

use crate::DISPATCH_TARGET;
use crate::domain::cancel::CancellationSignal;
use crate::domain::errors::DispatchError;
use crate::domain::ids::DispatchId;
use crate::domain::request::{AnyRequest, AnyResponse, Request};
use crate::ports::factory::ServiceFactory;
use crate::typed::wrapper::{ErasedRequestHandler, RequestHandlerWrapper};

pub struct Mediator {
    factory: Arc<dyn ServiceFactory>,
    wrappers: RwLock<HashMap<TypeId, Arc<dyn ErasedRequestHandler>>>,
}

impl Mediator {
    pub fn new(factory: Arc<dyn ServiceFactory>) -> Self {
        Self {
            factory,
            wrappers: RwLock::new(HashMap::new()),
        }
    }

    pub fn factory(&self) -> &dyn ServiceFactory {
        self.factory.as_ref()
    }

    /// 型付きディスパッチ
    pub async fn send<Req: Request>(
        &self,
        request: &Req,
        cancel: &CancellationSignal,
    ) -> Result<Req::Response, DispatchError> {
        let span = info_span!(
            target: DISPATCH_TARGET,
            "dispatch",
            id = %DispatchId::new(),
            request = type_name::<Req>()
        );

        RequestHandlerWrapper::<Req>::new()
            .handle(request, cancel, self.factory.as_ref())
            .instrument(span)
            .await
    }

    /// 型消去されたディスパッチ
    pub async fn send_any(
        &self,
        request: &AnyRequest,
        cancel: &CancellationSignal,
    ) -> Result<AnyResponse, DispatchError> {
        let wrapper = self.wrapper_for(request);
        let span = info_span!(
            target: DISPATCH_TARGET,
            "dispatch",
            id = %DispatchId::new(),
            request = request.type_name()
        );

        wrapper
            .handle_erased(request, cancel, self.factory.as_ref())
            .instrument(span)
            .await
    }

    /// キャッシュ済み wrapper の数
    pub fn cached_wrappers(&self) -> usize {
        self.wrappers.read().len()
    }

    fn wrapper_for(&self, request: &AnyRequest) -> Arc<dyn ErasedRequestHandler> {
        let type_id = request.request_type_id();
        let cached = self.wrappers.read().get(&type_id).cloned();
        if let Some(wrapper) = cached {
            return wrapper;
        }

        let mut wrappers = self.wrappers.write();
        Arc::clone(
            wrappers
                .entry(type_id)
                .or_insert_with(|| request.make_wrapper()),
        )
    }
}

impl fmt::Debug for Mediator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mediator")
            .field("cached_wrappers", &self.cached_wrappers())
            .finish_non_exhaustive()
    }
}
