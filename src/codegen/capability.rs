//! meta ファイルとルートファイルのどちらの export を採用するかの判定。

use crate::model::{DataApiCapabilities, LegacyCapabilities, MetaCapabilities};

/// フィールドの値をどの import から取るか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    MetaFile,
    RouteFile,
}

/// `lazy` フィールドの配線方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LazySource {
    /// default export を Component として動的 import する
    DefaultExport,
    /// ルートファイル自身の `lazy` export をそのまま使う
    RouteFile,
}

/// Data API ルートの各フィールドの採用元。None はフィールドを出力しない
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedFields {
    pub lazy: Option<LazySource>,
    pub element: Option<Source>,
    pub error_element: Option<Source>,
    pub loader: Option<Source>,
    pub action: Option<Source>,
    pub handle: Option<Source>,
    pub should_revalidate: Option<Source>,
}

impl ResolvedFields {
    /// 指定した import を参照するフィールドがあるか
    pub fn uses(&self, source: Source) -> bool {
        [
            self.element,
            self.error_element,
            self.loader,
            self.action,
            self.handle,
            self.should_revalidate,
        ]
        .contains(&Some(source))
            || (source == Source::RouteFile && self.lazy == Some(LazySource::RouteFile))
    }
}

/// Data API モードのフィールド採用ルール。
///
/// 1) default export があれば常に `lazy` で遅延ロードし、他のコンポーネント配線より優先する
/// 2) meta ファイルがあればデータ系フィールド (loader / action / handle / shouldRevalidate /
///    ErrorBoundary) は meta ファイルからのみ取る。ルートファイル側では補完しない
/// 3) meta ファイルがなければルートファイルの named export をそのまま使う
///    (default export がある場合は lazy の戻り値に含まれるので静的には配線しない)
pub fn resolve_data_fields(meta: Option<&MetaCapabilities>, own: &DataApiCapabilities) -> ResolvedFields {
    let eager = !own.default_export;
    let own_field = |present: bool| (eager && present).then_some(Source::RouteFile);

    let lazy = if own.default_export {
        Some(LazySource::DefaultExport)
    } else if own.lazy && (meta.is_none() || own.component) {
        Some(LazySource::RouteFile)
    } else {
        None
    };

    match meta {
        Some(meta) => {
            let meta_field = |present: bool| present.then_some(Source::MetaFile);
            ResolvedFields {
                lazy,
                element: own_field(own.component),
                error_element: meta_field(meta.error_boundary),
                loader: meta_field(meta.loader),
                action: meta_field(meta.action),
                handle: meta_field(meta.handle),
                should_revalidate: meta_field(meta.should_revalidate),
            }
        }
        None => ResolvedFields {
            lazy,
            element: own_field(own.component),
            error_element: own_field(own.error_boundary),
            loader: own_field(own.loader),
            action: own_field(own.action),
            handle: own_field(own.handle),
            should_revalidate: own_field(own.should_revalidate),
        },
    }
}

/// 旧形式でのコンポーネント配線
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LegacyComponent {
    /// `lazyComponent: () => import(...)`
    Lazy,
    /// `element: React.createElement(X.Component)`
    Element,
}

pub fn resolve_legacy_component(own: &LegacyCapabilities) -> Option<LegacyComponent> {
    if own.default_export {
        Some(LegacyComponent::Lazy)
    } else if own.component {
        Some(LegacyComponent::Element)
    } else {
        None
    }
}
