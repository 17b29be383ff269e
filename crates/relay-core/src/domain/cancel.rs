//! Cancellation - 協調的キャンセルのシグナル
//!
//! `CancellationSource` を持つ側が `cancel()` を呼び、
//! 各レイヤーは受け取った `CancellationSignal` を観測するだけ。
//! core はシグナルを素通しするだけで、自分からチェーンを止めることはない。

use tokio::sync::watch;

use crate::domain::errors::DispatchError;

/// キャンセルを発行する側
///
/// drop してもキャンセル扱いにはならない（明示的な `cancel()` のみ）。
#[derive(Debug)]
pub struct CancellationSource {
    tx: watch::Sender<bool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// このソースに紐づくシグナルを発行
    pub fn signal(&self) -> CancellationSignal {
        CancellationSignal {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// 各レイヤーに変更なしで渡される観測専用のシグナル
#[derive(Debug, Clone, Default)]
pub struct CancellationSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl CancellationSignal {
    /// 決してキャンセルされないシグナル
    pub fn none() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Returns `Err(DispatchError::Cancelled)` once cancellation was requested.
    pub fn check(&self) -> Result<(), DispatchError> {
        if self.is_cancelled() {
            return Err(DispatchError::Cancelled);
        }
        Ok(())
    }

    /// キャンセルされるまで待つ
    ///
    /// ソースが cancel せずに drop された場合は永久に pending。
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        let observed = rx.wait_for(|cancelled| *cancelled).await.map(|_| ());
        if observed.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
