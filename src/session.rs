//! 1 回の生成パスで共有する状態と、ビルドツール側のライフサイクルとの接点。

use tracing::{debug, info, warn};

use crate::augment::augment_manifest;
use crate::codegen::stringify_routes;
use crate::config::ResolvedOptions;
use crate::error::Result;
use crate::model::{FlatRouteEntry, RouteManifest, RouteNode};
use crate::prober::{ExportProber, ModuleEvaluator};
use crate::scan::RouteScanner;
use crate::tree::build_route_tree;

/// アプリ側が import する仮想モジュール ID
pub const VIRTUAL_MODULE_ID: &str = "virtual:remix-flat-routes";
/// 解決後の仮想モジュール ID (他のプラグインに処理させないため \0 を付ける)
pub const RESOLVED_VIRTUAL_MODULE_ID: &str = "\0virtual:remix-flat-routes";

/// 生成済みモジュールの再生成を依頼する先 (ビルドツールのモジュールグラフ)
pub trait ModuleHost {
    fn invalidate(&self, module_id: &str);
}

/// ファイル監視イベント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeEvent {
    Create,
    Update,
    Delete,
}

/// 生成パスのコンテキスト。設定と評価器を保持し、パスごとに一から生成する
pub struct BuildSession<E: ModuleEvaluator> {
    options: ResolvedOptions,
    evaluator: E,
}

impl<E: ModuleEvaluator> BuildSession<E> {
    pub fn new(options: ResolvedOptions, evaluator: E) -> Self {
        Self { options, evaluator }
    }

    pub fn options(&self) -> &ResolvedOptions {
        &self.options
    }

    /// 仮想モジュール ID なら解決後の ID を返す
    pub fn resolve_id(&self, id: &str) -> Option<&'static str> {
        (id == VIRTUAL_MODULE_ID).then_some(RESOLVED_VIRTUAL_MODULE_ID)
    }

    /// 解決済み仮想モジュールの読み込み要求に対して生成コードを返す
    pub fn load(&mut self, id: &str, scanner: &dyn RouteScanner) -> Result<Option<String>> {
        if id != RESOLVED_VIRTUAL_MODULE_ID {
            return Ok(None);
        }
        let flat = scanner.scan(&self.options.app_dir, &self.options.route_dirs)?;
        self.generate(&flat).map(Some)
    }

    /// フラットなマニフェストから生成モジュールのテキストを作る
    pub fn generate(&mut self, flat: &[FlatRouteEntry]) -> Result<String> {
        self.with_evaluator(|session| {
            let tree = session.route_tree(flat)?;
            let generated = stringify_routes(&tree, &session.options.app_dir)?;
            Ok(generated.render())
        })
    }

    /// 機能フラグで拡張したマニフェストだけを返す
    pub fn manifest(&mut self, flat: &[FlatRouteEntry]) -> Result<RouteManifest> {
        self.with_evaluator(|session| session.augment(flat))
    }

    /// 評価器の開始と停止でパスを挟む。エラーで中断しても停止は必ず呼ぶ
    fn with_evaluator<T>(&mut self, run: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.evaluator.start()?;
        let result = run(self);
        self.evaluator.shutdown();
        if let Err(e) = &result {
            warn!(error = %e, "生成パスを中断");
        }
        result
    }

    fn augment(&mut self, flat: &[FlatRouteEntry]) -> Result<RouteManifest> {
        let mut prober = ExportProber::new(&mut self.evaluator, &self.options.app_dir);
        augment_manifest(flat, self.options.mode, &self.options.meta, &mut prober)
    }

    fn route_tree(&mut self, flat: &[FlatRouteEntry]) -> Result<Vec<RouteNode>> {
        let manifest = self.augment(flat)?;
        let tree = build_route_tree(&manifest)?;
        info!(roots = tree.len(), "ルートツリー構築");
        Ok(tree)
    }

    /// HMR 更新時は常に生成モジュールを無効化する
    pub fn handle_hot_update(&self, host: &dyn ModuleHost) {
        debug!("hot update");
        host.invalidate(RESOLVED_VIRTUAL_MODULE_ID);
    }

    /// ファイルの追加・削除でルート構成が変わりうるので無効化する。更新は HMR 側で扱う
    pub fn watch_change(&self, host: &dyn ModuleHost, event: ChangeEvent) {
        if event == ChangeEvent::Update {
            return;
        }
        debug!(?event, "ルート構成の変更");
        host.invalidate(RESOLVED_VIRTUAL_MODULE_ID);
    }
}
