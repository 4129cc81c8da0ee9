//! ファイル規約で並べたルートファイルから、react-router 用のルート定義モジュールを生成する。
//!
//! 流れ: フラットなマニフェスト → export 解析 / meta ファイル探索 → 機能フラグ付きマニフェスト
//! → ルートツリー → 中間表現 → モジュールテキスト。
//!
//! [`client`] は生成を使わずにルートを手書きする場合のガード付きルーター。

pub mod augment;
pub mod client;
pub mod codegen;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod prober;
pub mod resolver;
pub mod scan;
pub mod session;
pub mod tree;

pub use config::{Options, ResolvedOptions};
pub use error::{Error, Result};
pub use model::{FlatRouteEntry, ModuleExports, RouteManifest, RouteMode};
pub use prober::{ModuleEvaluator, StaticEvaluator, SwcEvaluator};
pub use scan::{JsonManifest, RouteScanner};
pub use session::{BuildSession, ChangeEvent, ModuleHost, RESOLVED_VIRTUAL_MODULE_ID, VIRTUAL_MODULE_ID};
