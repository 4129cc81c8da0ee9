use path_absolutize::Absolutize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::RouteMode;

/// ルートディレクトリの指定。単一でも複数でもよい
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RouteDirs {
    One(PathBuf),
    Many(Vec<PathBuf>),
}

impl Default for RouteDirs {
    fn default() -> Self {
        RouteDirs::One(PathBuf::from("routes"))
    }
}

impl RouteDirs {
    pub fn to_vec(&self) -> Vec<PathBuf> {
        match self {
            RouteDirs::One(dir) => vec![dir.clone()],
            RouteDirs::Many(dirs) => dirs.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlatRoutesOptions {
    pub route_dir: RouteDirs,
}

/// 設定ファイル (JSON) の内容。全て省略可能
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// プロジェクトルートからの app ディレクトリ
    pub app_directory: PathBuf,
    pub flat_routes_options: FlatRoutesOptions,
    /// None なら react-router-dom のバージョンから判定する
    pub legacy: Option<bool>,
    /// meta ファイル名 (拡張子なし)
    pub meta: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            app_directory: PathBuf::from("app"),
            flat_routes_options: FlatRoutesOptions::default(),
            legacy: None,
            meta: "meta".to_string(),
        }
    }
}

impl Options {
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        serde_json::from_str(&text).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// パスを絶対化し、ルートディレクトリを検証して生成モードを確定する
    pub fn resolve(&self, root: &Path) -> Result<ResolvedOptions> {
        let root = root.absolutize()?.to_path_buf();
        let app_dir = root.join(&self.app_directory).absolutize()?.to_path_buf();

        let mut route_dirs = Vec::new();
        for dir in self.flat_routes_options.route_dir.to_vec() {
            let full = app_dir.join(&dir);
            validate_route_dir(&full)?;
            route_dirs.push(dir);
        }

        let mode = match self.legacy {
            Some(true) => RouteMode::Legacy,
            Some(false) => RouteMode::DataApi,
            None => {
                if detect_legacy_mode(&root)? {
                    RouteMode::Legacy
                } else {
                    RouteMode::DataApi
                }
            }
        };
        info!(app_dir = %app_dir.display(), ?mode, "設定解決");

        Ok(ResolvedOptions {
            root,
            app_dir,
            route_dirs,
            mode,
            meta: self.meta.clone(),
        })
    }
}

/// 生成パス全体で使う確定済みの設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOptions {
    pub root: PathBuf,
    /// 絶対パス
    pub app_dir: PathBuf,
    /// app ディレクトリからの相対パス
    pub route_dirs: Vec<PathBuf>,
    pub mode: RouteMode,
    pub meta: String,
}

pub fn validate_route_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(Error::RouteDirNotFound(dir.to_path_buf()));
    }
    Ok(())
}

/// react-router-dom 6.4 未満なら旧形式 (Data API なし) とみなす。
///
/// 1) node_modules にインストール済みの package.json の version
/// 2) プロジェクトの package.json の dependencies / devDependencies の指定
/// どちらからも判定できなければ Data API モード。
pub fn detect_legacy_mode(root: &Path) -> Result<bool> {
    let installed = root.join("node_modules/react-router-dom/package.json");
    let version = match read_package_json(&installed)? {
        Some(pkg) => pkg.get("version").and_then(|v| v.as_str()).map(str::to_string),
        None => None,
    };

    let version = match version {
        Some(v) => Some(v),
        None => read_package_json(&root.join("package.json"))?.and_then(|pkg| {
            ["dependencies", "devDependencies"].iter().find_map(|section| {
                pkg.get(section)?
                    .get("react-router-dom")?
                    .as_str()
                    .map(str::to_string)
            })
        }),
    };

    let legacy = match version.as_deref().and_then(parse_major_minor) {
        Some((major, minor)) => major < 6 || (major == 6 && minor < 4),
        None => false,
    };
    debug!(?version, legacy, "react-router-dom バージョン判定");
    Ok(legacy)
}

fn read_package_json(path: &Path) -> Result<Option<serde_json::Value>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = fs::read_to_string(path)?;
    let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| Error::Config {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    Ok(Some(value))
}

/// "^6.3.0" / "~5.1" / ">=6" などから (major, minor) を取り出す
fn parse_major_minor(range: &str) -> Option<(u64, u64)> {
    let start = range.find(|c: char| c.is_ascii_digit())?;
    let mut parts = range[start..].split(|c: char| !c.is_ascii_digit());
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next().and_then(|m| m.parse().ok()).unwrap_or(0);
    Some((major, minor))
}
