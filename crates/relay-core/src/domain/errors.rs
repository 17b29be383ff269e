//! Errors - ディスパッチのエラー型と分類
//!
//! # 分類
//! - **Configuration**: handler が未登録、または factory が構築に失敗した
//! - **TypeMismatch**: 型消去された request が wrapper の想定型と一致しない
//! - **Cancelled**: 協調的キャンセルを観測したレイヤーが自分で返すもの
//! - **Downstream**: handler / behavior 自身が返したエラー
//!
//! core は Downstream / Cancelled を生成しない。handler や behavior が返した
//! `DispatchError` はそのまま呼び出し元に届く。

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// handler / behavior が任意のエラーを返すための boxed error
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// ErrorKind は DispatchError の運用分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    TypeMismatch,
    Cancelled,
    Downstream,
}

/// DispatchError は 1 回のディスパッチで呼び出し元に返るエラー
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("error constructing {capability}; register it with the service factory before dispatching")]
    Construction {
        capability: &'static str,
        #[source]
        source: FactoryError,
    },

    #[error("{capability} was not found; register it with the service factory before dispatching")]
    NotRegistered { capability: &'static str },

    #[error("request of type {actual} cannot be dispatched through the wrapper for {expected}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("dispatch cancelled")]
    Cancelled,

    #[error(transparent)]
    Handler(BoxError),
}

impl DispatchError {
    /// 任意のエラーを Downstream として包む（handler / behavior 側で使う）
    pub fn handler<E>(error: E) -> Self
    where
        E: Into<BoxError>,
    {
        Self::Handler(error.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Construction { .. } | Self::NotRegistered { .. } => ErrorKind::Configuration,
            Self::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::Handler(_) => ErrorKind::Downstream,
        }
    }

    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }
}

/// FactoryError は ServiceFactory の lookup 失敗
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("constructor for {capability} failed")]
    Construction {
        capability: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{count} registrations found for {capability}, expected exactly one")]
    Ambiguous {
        capability: &'static str,
        count: usize,
    },

    #[error("instance registered for {capability} has a different type")]
    WrongType { capability: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("disk on fire")]
    struct DiskOnFire;

    #[test]
    fn test_kind_classification() {
        let not_registered = DispatchError::NotRegistered { capability: "Ping" };
        assert_eq!(not_registered.kind(), ErrorKind::Configuration);
        assert!(not_registered.is_configuration());

        let mismatch = DispatchError::TypeMismatch {
            expected: "Ping",
            actual: "Echo",
        };
        assert_eq!(mismatch.kind(), ErrorKind::TypeMismatch);
        assert_eq!(DispatchError::Cancelled.kind(), ErrorKind::Cancelled);
        assert_eq!(DispatchError::handler(DiskOnFire).kind(), ErrorKind::Downstream);
    }

    #[test]
    fn test_construction_keeps_cause_chain() {
        let err = DispatchError::Construction {
            capability: "dyn RequestHandler<Ping>",
            source: FactoryError::Construction {
                capability: "dyn RequestHandler<Ping>",
                source: Box::new(DiskOnFire),
            },
        };

        let msg = err.to_string();
        assert!(msg.contains("dyn RequestHandler<Ping>"));

        let factory = err.source().unwrap();
        let root = factory.source().unwrap();
        assert!(root.downcast_ref::<DiskOnFire>().is_some());
    }

    #[test]
    fn test_construction_cause_is_reported_once() {
        let err = DispatchError::Construction {
            capability: "dyn RequestHandler<Ping>",
            source: FactoryError::Construction {
                capability: "dyn RequestHandler<Ping>",
                source: Box::new(DiskOnFire),
            },
        };

        // 原因は Display ではなく source() の連鎖で辿る
        let mut chain = vec![err.to_string()];
        let mut current = err.source();
        while let Some(cause) = current {
            chain.push(cause.to_string());
            current = cause.source();
        }

        assert_eq!(chain.len(), 3);
        assert_eq!(chain.iter().filter(|m| m.contains("disk on fire")).count(), 1);
        assert_eq!(chain[2], "disk on fire");
        assert!(!chain[1].contains("disk on fire"));
    }

    #[test]
    fn test_handler_error_is_transparent() {
        let err = DispatchError::handler("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_error_kind_serializes_snake_case() {
        let json = serde_json::to_string(&ErrorKind::TypeMismatch).unwrap();
        assert_eq!(json, "\"type_mismatch\"");
    }
}
