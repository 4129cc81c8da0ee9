// src/error.rs
use std::path::PathBuf;

use thiserror::Error;

/// クレート共通の Result 型
pub type Result<T> = std::result::Result<T, Error>;

/// ルート生成パスで発生するエラー。いずれも生成全体を中断する。
#[derive(Debug, Error)]
pub enum Error {
    #[error("[remix-flat-routes] routes directory not found: {}", .0.display())]
    RouteDirNotFound(PathBuf),

    #[error("invalid configuration in {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    #[error("failed to evaluate module {}: {reason}", path.display())]
    ModuleEvaluation { path: PathBuf, reason: String },

    #[error("invalid route manifest {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("duplicate route id `{0}`")]
    DuplicateRouteId(String),

    #[error("route `{id}` references missing parent `{parent_id}`")]
    MissingParent { id: String, parent_id: String },

    #[error("routes unreachable from any root: {}", .0.join(", "))]
    UnreachableRoutes(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
