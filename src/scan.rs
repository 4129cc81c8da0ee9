use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::model::FlatRouteEntry;

/// ファイル規約からフラットなルート一覧を作るスキャナ
pub trait RouteScanner {
    /// `route_dirs` は app ディレクトリからの相対パス
    fn scan(&self, app_dir: &Path, route_dirs: &[PathBuf]) -> Result<Vec<FlatRouteEntry>>;
}

/// 配列形式と、ID をキーにしたオブジェクト形式 (Remix のマニフェスト) の両方を受け付ける
#[derive(Deserialize)]
#[serde(untagged)]
enum ManifestFile {
    List(Vec<FlatRouteEntry>),
    ById(BTreeMap<String, FlatRouteEntry>),
}

/// 外部スキャナが書き出した JSON マニフェストを読むだけの実装
#[derive(Debug, Clone)]
pub struct JsonManifest {
    path: PathBuf,
}

impl JsonManifest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn parse(path: &Path, text: &str) -> Result<Vec<FlatRouteEntry>> {
        let file: ManifestFile = serde_json::from_str(text).map_err(|source| Error::Manifest {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(match file {
            ManifestFile::List(entries) => entries,
            ManifestFile::ById(entries) => entries.into_values().collect(),
        })
    }
}

impl RouteScanner for JsonManifest {
    fn scan(&self, _app_dir: &Path, _route_dirs: &[PathBuf]) -> Result<Vec<FlatRouteEntry>> {
        let text = fs::read_to_string(&self.path)?;
        Self::parse(&self.path, &text)
    }
}

/// 既に手元にあるルート一覧をそのまま返すスキャナ
impl RouteScanner for Vec<FlatRouteEntry> {
    fn scan(&self, _app_dir: &Path, _route_dirs: &[PathBuf]) -> Result<Vec<FlatRouteEntry>> {
        Ok(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_remix_style_object_manifest() {
        let text = r#"{
            "root": { "id": "root", "file": "root.tsx", "path": "" },
            "routes/_index": { "id": "routes/_index", "parentId": "root", "file": "routes/_index.tsx", "index": true }
        }"#;
        let entries = JsonManifest::parse(Path::new("m.json"), text).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].parent_id.as_deref(), Some("root"));
        assert!(entries[1].index);
        assert!(!entries[1].case_sensitive);
        assert_eq!(entries[1].path, None);
    }

    #[test]
    fn parses_array_manifest() {
        let text = r#"[{ "id": "a", "file": "a.tsx", "path": "a", "caseSensitive": true }]"#;
        let entries = JsonManifest::parse(Path::new("m.json"), text).unwrap();
        assert!(entries[0].case_sensitive);
        assert_eq!(entries[0].parent_id, None);
    }

    #[test]
    fn invalid_manifest_reports_its_path() {
        let err = JsonManifest::parse(Path::new("broken.json"), "{ nope").unwrap_err();
        assert!(matches!(err, Error::Manifest { path, .. } if path == Path::new("broken.json")));
    }
}
