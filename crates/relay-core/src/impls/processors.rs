//! Pre / Post processor - handler の前後に処理を差し込む behavior
//!
//! - `PreProcessorBehavior`: 登録順に pre-processor を走らせてから next
//! - `PostProcessorBehavior`: next が成功したら登録順に post-processor を走らせる
//!
//! processor のエラーはそのまま返す（後続の processor / handler は動かない）。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::cancel::CancellationSignal;
use crate::domain::errors::DispatchError;
use crate::domain::request::Request;
use crate::typed::handler::{Next, PipelineBehavior};

#[async_trait]
pub trait RequestPreProcessor<Req: Request>: Send + Sync {
    async fn process(&self, request: &Req, cancel: &CancellationSignal) -> Result<(), DispatchError>;
}

#[async_trait]
pub trait RequestPostProcessor<Req>: Send + Sync
where
    Req: Request,
    Req::Response: Sync,
{
    async fn process(
        &self,
        request: &Req,
        response: &Req::Response,
        cancel: &CancellationSignal,
    ) -> Result<(), DispatchError>;
}

pub struct PreProcessorBehavior<Req: Request> {
    processors: Vec<Arc<dyn RequestPreProcessor<Req>>>,
}

impl<Req: Request> PreProcessorBehavior<Req> {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn with<P: RequestPreProcessor<Req> + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl<Req: Request> Default for PreProcessorBehavior<Req> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Req: Request> PipelineBehavior<Req> for PreProcessorBehavior<Req> {
    async fn handle(
        &self,
        request: &Req,
        cancel: &CancellationSignal,
        next: Next<'_, Req::Response>,
    ) -> Result<Req::Response, DispatchError> {
        for processor in &self.processors {
            processor.process(request, cancel).await?;
        }
        next().await
    }
}

pub struct PostProcessorBehavior<Req>
where
    Req: Request,
    Req::Response: Sync,
{
    processors: Vec<Arc<dyn RequestPostProcessor<Req>>>,
}

impl<Req> PostProcessorBehavior<Req>
where
    Req: Request,
    Req::Response: Sync,
{
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    pub fn with<P: RequestPostProcessor<Req> + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Arc::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}

impl<Req> Default for PostProcessorBehavior<Req>
where
    Req: Request,
    Req::Response: Sync,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Req> PipelineBehavior<Req> for PostProcessorBehavior<Req>
where
    Req: Request,
    Req::Response: Sync,
{
    async fn handle(
        &self,
        request: &Req,
        cancel: &CancellationSignal,
        next: Next<'_, Req::Response>,
    ) -> Result<Req::Response, DispatchError> {
        let response = next().await?;
        for processor in &self.processors {
            processor.process(request, &response, cancel).await?;
        }
        Ok(response)
    }
}
