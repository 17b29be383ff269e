use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use relay_core::impls::TracingBehavior;
use relay_core::{
    AnyRequest, CancellationSignal, DispatchError, MediatorBuilder, Next, PipelineBehavior,
    Request, RequestHandler,
};

type Trace = Arc<Mutex<Vec<String>>>;

struct Ping;

impl Request for Ping {
    type Response = String;
}

struct PingHandler;

#[async_trait]
impl RequestHandler<Ping> for PingHandler {
    async fn handle(&self, _request: &Ping, cancel: &CancellationSignal) -> Result<String, DispatchError> {
        cancel.check()?;
        Ok("Pong".to_string())
    }
}

/// "{name}-in" / "{name}-out" を trace に記録する behavior
struct Marker {
    name: &'static str,
    trace: Trace,
}

impl Marker {
    fn record(&self, suffix: &str) -> Result<(), DispatchError> {
        self.trace
            .lock()
            .map_err(|e| DispatchError::handler(format!("trace lock poisoned: {e}")))?
            .push(format!("{}-{suffix}", self.name));
        Ok(())
    }
}

#[async_trait]
impl PipelineBehavior<Ping> for Marker {
    async fn handle(
        &self,
        _request: &Ping,
        _cancel: &CancellationSignal,
        next: Next<'_, String>,
    ) -> Result<String, DispatchError> {
        self.record("in")?;
        let response = next().await?;
        self.record("out")?;
        Ok(response)
    }
}

#[derive(Debug, Serialize)]
struct Report {
    typed_response: String,
    erased_response: String,
    trace: Vec<String>,
    cached_wrappers: usize,
    registrations: Vec<relay_core::impls::RegistrationInfo>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // (A) ログ: RUST_LOG があればそれを、なければ info
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // (B) handler と behavior を登録（L1 が外側、L2 が内側）
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let builder = MediatorBuilder::new()
        .handler::<Ping, _>(PingHandler)?
        .behavior::<Ping, _>(TracingBehavior)
        .behavior::<Ping, _>(Marker {
            name: "L1",
            trace: Arc::clone(&trace),
        })
        .behavior::<Ping, _>(Marker {
            name: "L2",
            trace: Arc::clone(&trace),
        })
        .expect::<Ping>();
    let registrations = builder.registry().describe();
    let mediator = builder.build()?;

    // (C) 型付き / 型消去の両方で送る
    let cancel = CancellationSignal::none();
    let typed_response = mediator.send(&Ping, &cancel).await?;
    let erased_response = mediator
        .send_any(&AnyRequest::new(Ping), &cancel)
        .await?
        .downcast::<String>()?;
    info!(%typed_response, %erased_response, "dispatch finished");

    // (D) 結果を JSON で出力
    let trace = trace
        .lock()
        .map_err(|e| format!("trace lock poisoned: {e}"))?
        .clone();
    let report = Report {
        typed_response,
        erased_response,
        trace,
        cached_wrappers: mediator.cached_wrappers(),
        registrations,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
