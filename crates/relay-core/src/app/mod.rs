//! App - アプリケーション層
//!
//! ports と typed を組み合わせて呼び出し側の入口を提供します。
//!
//! # 主要コンポーネント
//! - **MediatorBuilder**: 登録と起動時検証
//! - **Mediator**: 型付き / 型消去ディスパッチの入口と wrapper キャッシュ

pub mod builder;
pub mod mediator;

pub use self::builder::{BuildError, MediatorBuilder};
pub use self::mediator::Mediator;
