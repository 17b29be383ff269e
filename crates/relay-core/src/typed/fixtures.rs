//! テスト用の request / handler / behavior

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::cancel::CancellationSignal;
use crate::domain::errors::DispatchError;
use crate::domain::request::Request;
use crate::typed::handler::{Next, PipelineBehavior, RequestHandler};

pub(crate) type Trace = Arc<Mutex<Vec<String>>>;

pub(crate) fn new_trace() -> Trace {
    Arc::new(Mutex::new(Vec::new()))
}

pub(crate) fn entries(trace: &Trace) -> Vec<String> {
    trace.lock().clone()
}

#[derive(Debug)]
pub(crate) struct Ping;

impl Request for Ping {
    type Response = String;
}

#[derive(Debug)]
pub(crate) struct Echo(pub u32);

impl Request for Echo {
    type Response = u32;
}

#[derive(Debug, thiserror::Error)]
#[error("boom")]
pub(crate) struct Boom;

/// "Pong" を返し、呼ばれたら "handler" を記録する
pub(crate) struct PongHandler {
    trace: Trace,
}

impl PongHandler {
    pub(crate) fn new(trace: &Trace) -> Self {
        Self {
            trace: Arc::clone(trace),
        }
    }
}

#[async_trait]
impl RequestHandler<Ping> for PongHandler {
    async fn handle(&self, _request: &Ping, _cancel: &CancellationSignal) -> Result<String, DispatchError> {
        self.trace.lock().push("handler".to_string());
        Ok("Pong".to_string())
    }
}

pub(crate) struct EchoHandler;

#[async_trait]
impl RequestHandler<Echo> for EchoHandler {
    async fn handle(&self, request: &Echo, _cancel: &CancellationSignal) -> Result<u32, DispatchError> {
        Ok(request.0)
    }
}

pub(crate) struct FailingHandler;

#[async_trait]
impl RequestHandler<Ping> for FailingHandler {
    async fn handle(&self, _request: &Ping, _cancel: &CancellationSignal) -> Result<String, DispatchError> {
        Err(DispatchError::handler(Boom))
    }
}

/// キャンセル済みなら Cancelled を返す
pub(crate) struct CancelAwareHandler;

#[async_trait]
impl RequestHandler<Ping> for CancelAwareHandler {
    async fn handle(&self, _request: &Ping, cancel: &CancellationSignal) -> Result<String, DispatchError> {
        cancel.check()?;
        Ok("Pong".to_string())
    }
}

/// "{name}-in" / "{name}-out" を記録して next を呼ぶ
pub(crate) struct Recording {
    name: &'static str,
    trace: Trace,
}

impl Recording {
    pub(crate) fn new(name: &'static str, trace: &Trace) -> Self {
        Self {
            name,
            trace: Arc::clone(trace),
        }
    }
}

#[async_trait]
impl<Req: Request> PipelineBehavior<Req> for Recording {
    async fn handle(
        &self,
        _request: &Req,
        _cancel: &CancellationSignal,
        next: Next<'_, Req::Response>,
    ) -> Result<Req::Response, DispatchError> {
        self.trace.lock().push(format!("{}-in", self.name));
        let response = next().await;
        self.trace.lock().push(format!("{}-out", self.name));
        response
    }
}

/// next を呼ばずに固定値を返す
pub(crate) struct ShortCircuit {
    name: &'static str,
    trace: Trace,
    reply: &'static str,
}

impl ShortCircuit {
    pub(crate) fn new(name: &'static str, trace: &Trace, reply: &'static str) -> Self {
        Self {
            name,
            trace: Arc::clone(trace),
            reply,
        }
    }
}

#[async_trait]
impl PipelineBehavior<Ping> for ShortCircuit {
    async fn handle(
        &self,
        _request: &Ping,
        _cancel: &CancellationSignal,
        _next: Next<'_, String>,
    ) -> Result<String, DispatchError> {
        self.trace.lock().push(format!("{}-short", self.name));
        Ok(self.reply.to_string())
    }
}

/// next の結果にかかわらず Boom を返す
pub(crate) struct FailingBehavior;

#[async_trait]
impl PipelineBehavior<Ping> for FailingBehavior {
    async fn handle(
        &self,
        _request: &Ping,
        _cancel: &CancellationSignal,
        next: Next<'_, String>,
    ) -> Result<String, DispatchError> {
        next().await?;
        Err(DispatchError::handler(Boom))
    }
}
