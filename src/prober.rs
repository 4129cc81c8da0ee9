use std::collections::HashMap;
use std::path::{Path, PathBuf};

use path_absolutize::Absolutize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::ModuleExports;
use crate::parser::parse_module_exports;

/// モジュール評価サービス。ファイルを評価して export 名の集合を返す。
///
/// `start` は最初の評価の前に、`shutdown` は生成パスの終了時 (エラー時を含む) に
/// 一度だけ呼ばれる。
pub trait ModuleEvaluator {
    fn start(&mut self) -> Result<()> {
        Ok(())
    }

    fn exports(&mut self, path: &Path) -> Result<ModuleExports>;

    fn shutdown(&mut self) {}
}

/// swc でソースを解析して export を列挙する評価器
#[derive(Debug, Default)]
pub struct SwcEvaluator {
    evaluated: usize,
}

impl SwcEvaluator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ModuleEvaluator for SwcEvaluator {
    fn start(&mut self) -> Result<()> {
        self.evaluated = 0;
        Ok(())
    }

    fn exports(&mut self, path: &Path) -> Result<ModuleExports> {
        self.evaluated += 1;
        parse_module_exports(path)
    }

    fn shutdown(&mut self) {
        debug!(evaluated = self.evaluated, "swc 評価器を停止");
    }
}

/// あらかじめ登録した export を返すだけの評価器。テストや他ツール連携向け
#[derive(Debug, Default, Clone)]
pub struct StaticEvaluator {
    modules: HashMap<PathBuf, ModuleExports>,
}

impl StaticEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` は絶対パスで登録する
    pub fn with_module<I, S>(mut self, path: impl Into<PathBuf>, exports: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules.insert(path.into(), exports.into_iter().collect());
        self
    }
}

impl ModuleEvaluator for StaticEvaluator {
    fn exports(&mut self, path: &Path) -> Result<ModuleExports> {
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| Error::ModuleEvaluation {
                path: path.to_path_buf(),
                reason: "module not found".to_string(),
            })
    }
}

/// 生成パス内で export 解析結果をメモ化するプローバ
///
/// 同じパスへの 2 回目以降の問い合わせは評価器を呼ばずに同じ結果を返す。
pub struct ExportProber<'a, E: ModuleEvaluator + ?Sized> {
    evaluator: &'a mut E,
    app_dir: PathBuf,
    cache: HashMap<PathBuf, ModuleExports>,
}

impl<'a, E: ModuleEvaluator + ?Sized> ExportProber<'a, E> {
    pub fn new(evaluator: &'a mut E, app_dir: impl Into<PathBuf>) -> Self {
        Self {
            evaluator,
            app_dir: app_dir.into(),
            cache: HashMap::new(),
        }
    }

    /// app ディレクトリ基準の相対パス (または絶対パス) の export を返す
    pub fn probe(&mut self, file: &Path) -> Result<ModuleExports> {
        let abs = self.app_dir.join(file).absolutize()?.to_path_buf();
        if let Some(hit) = self.cache.get(&abs) {
            return Ok(hit.clone());
        }

        let exports = self.evaluator.exports(&abs)?;
        info!(file = %file.display(), exports = exports.len(), "export 解析");
        self.cache.insert(abs, exports.clone());
        Ok(exports)
    }

    pub fn app_dir(&self) -> &Path {
        &self.app_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 呼び出し回数を数える評価器
    struct Counting {
        calls: usize,
    }

    impl ModuleEvaluator for Counting {
        fn exports(&mut self, _path: &Path) -> Result<ModuleExports> {
            self.calls += 1;
            Ok(["loader"].into_iter().collect())
        }
    }

    #[test]
    fn repeated_probes_hit_the_cache() {
        let mut evaluator = Counting { calls: 0 };
        let mut prober = ExportProber::new(&mut evaluator, "/app");
        let first = prober.probe(Path::new("routes/a.tsx")).unwrap();
        let second = prober.probe(Path::new("routes/./a.tsx")).unwrap();
        assert_eq!(first, second);
        drop(prober);
        assert_eq!(evaluator.calls, 1);
    }

    #[test]
    fn static_evaluator_reports_unknown_modules() {
        let mut evaluator = StaticEvaluator::new().with_module("/app/a.tsx", ["Component"]);
        let mut prober = ExportProber::new(&mut evaluator, "/app");
        assert!(prober.probe(Path::new("a.tsx")).unwrap().has("Component"));
        let err = prober.probe(Path::new("b.tsx")).unwrap_err();
        assert!(matches!(err, Error::ModuleEvaluation { path, .. } if path == Path::new("/app/b.tsx")));
    }
}
