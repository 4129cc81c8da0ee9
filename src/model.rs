// src/model.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// ファイル規約のスキャン結果として渡される、階層化前のルート定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlatRouteEntry {
    /// app ディレクトリからの相対パス (例: "routes/_index.tsx")
    pub file: PathBuf,

    /// マニフェスト内で一意なルート ID (例: "routes/_index")
    pub id: String,

    /// 親ルートの ID。None ならルート直下
    #[serde(default)]
    pub parent_id: Option<String>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub index: bool,

    #[serde(default)]
    pub case_sensitive: bool,
}

/// 生成モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RouteMode {
    /// loader / action を持つ Data API 形式
    DataApi,
    /// element / lazyComponent だけの旧形式
    Legacy,
}

/// モジュールが実行時に公開している export 名の集合
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ModuleExports(BTreeSet<String>);

impl ModuleExports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, name: &str) -> bool {
        self.0.contains(name)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        self.0.insert(name.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ModuleExports {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Extend<String> for ModuleExports {
    fn extend<I: IntoIterator<Item = String>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

/// ルートファイル自身の export から判定した機能フラグ
///
/// react-router の route module 規約に従う。
/// @see https://reactrouter.com/en/main/route/route
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DataApiCapabilities {
    #[serde(rename = "hasAction")]
    pub action: bool,
    #[serde(rename = "hasLoader")]
    pub loader: bool,
    #[serde(rename = "hasHandle")]
    pub handle: bool,
    #[serde(rename = "hasShouldRevalidate")]
    pub should_revalidate: bool,
    #[serde(rename = "hasErrorBoundary")]
    pub error_boundary: bool,
    #[serde(rename = "hasLazy")]
    pub lazy: bool,
    #[serde(rename = "hasComponent")]
    pub component: bool,
    #[serde(rename = "hasDefaultExport")]
    pub default_export: bool,
}

impl DataApiCapabilities {
    pub fn from_exports(exports: &ModuleExports) -> Self {
        Self {
            action: exports.has("action"),
            loader: exports.has("loader"),
            handle: exports.has("handle"),
            should_revalidate: exports.has("shouldRevalidate"),
            error_boundary: exports.has("ErrorBoundary"),
            lazy: exports.has("lazy"),
            component: exports.has("Component"),
            default_export: exports.has("default"),
        }
    }
}

/// meta ファイルの export から判定した機能フラグ
///
/// meta ファイルは描画を担当しないため Component / lazy は持たない。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetaCapabilities {
    #[serde(rename = "hasMetaAction")]
    pub action: bool,
    #[serde(rename = "hasMetaLoader")]
    pub loader: bool,
    #[serde(rename = "hasMetaHandle")]
    pub handle: bool,
    #[serde(rename = "hasMetaShouldRevalidate")]
    pub should_revalidate: bool,
    #[serde(rename = "hasMetaErrorBoundary")]
    pub error_boundary: bool,
}

impl MetaCapabilities {
    pub fn from_exports(exports: &ModuleExports) -> Self {
        Self {
            action: exports.has("action"),
            loader: exports.has("loader"),
            handle: exports.has("handle"),
            should_revalidate: exports.has("shouldRevalidate"),
            error_boundary: exports.has("ErrorBoundary"),
        }
    }
}

/// 旧形式で使う機能フラグ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LegacyCapabilities {
    /// default export があれば lazyComponent として扱う
    #[serde(rename = "hasDefaultExport")]
    pub default_export: bool,
    #[serde(rename = "hasComponent")]
    pub component: bool,
}

impl LegacyCapabilities {
    pub fn from_exports(exports: &ModuleExports) -> Self {
        Self {
            default_export: exports.has("default"),
            component: exports.has("Component"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataApiRoute {
    /// app ディレクトリからの相対パス
    pub meta_file: Option<PathBuf>,
    #[serde(flatten)]
    pub own: DataApiCapabilities,
    /// meta_file が None のときは常に全て false
    #[serde(flatten)]
    pub meta: MetaCapabilities,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LegacyRoute {
    pub meta: Option<PathBuf>,
    #[serde(flatten)]
    pub own: LegacyCapabilities,
}

/// モード別の解決済みフィールド
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RouteCapabilities {
    DataApi(DataApiRoute),
    Legacy(LegacyRoute),
}

/// 機能フラグで拡張されたマニフェストの 1 エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteEntry {
    #[serde(flatten)]
    pub route: FlatRouteEntry,
    #[serde(flatten)]
    pub capabilities: RouteCapabilities,
}

impl RouteEntry {
    pub fn id(&self) -> &str {
        &self.route.id
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.route.parent_id.as_deref()
    }
}

/// ID をキーとしたマニフェスト。BTreeMap なので走査順は ID 順で決定的
pub type RouteManifest = BTreeMap<String, RouteEntry>;

/// 階層化されたルート
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteNode {
    #[serde(flatten)]
    pub entry: RouteEntry,
    pub children: Vec<RouteNode>,
}
