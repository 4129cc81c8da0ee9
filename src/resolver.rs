use path_absolutize::Absolutize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::Result;

/// meta ファイルとして認識する拡張子
pub const META_EXTENSIONS: [&str; 4] = ["js", "jsx", "ts", "tsx"];

/// `export * from "./x"` の解決時に試す拡張子 (優先順)
const MODULE_EXTENSIONS: [&str; 6] = ["tsx", "ts", "jsx", "js", "mjs", "cjs"];

/// ルートファイルと同じディレクトリにある meta ファイルを探す関数。
///
/// - `app_dir`: app ディレクトリの絶対パス
/// - `route_file`: app ディレクトリからの相対パス (例: `routes/_index/_index.tsx`)
/// - `meta_name`: 拡張子を除いたファイル名 (既定は `meta`)
///
/// 戻り値:
/// - Ok(Some(path)) → app ディレクトリからの相対パス (例: `routes/_index/meta.ts`)
/// - Ok(None)       → meta ファイルなし
///
/// 親ディレクトリや子ディレクトリは探さない。
pub fn resolve_meta_file(app_dir: &Path, route_file: &Path, meta_name: &str) -> Result<Option<PathBuf>> {
    let route_dir = route_file.parent().unwrap_or_else(|| Path::new(""));
    let search_dir = app_dir.join(route_dir);
    if !search_dir.is_dir() {
        return Ok(None);
    }

    // ファイル名順に走査するので .js < .jsx < .ts < .tsx の順で最初の候補が選ばれる
    for entry in WalkDir::new(&search_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if is_meta_candidate(path, meta_name) {
            let file_name = entry.file_name();
            debug!(route = %route_file.display(), meta = ?file_name, "meta ファイル発見");
            return Ok(Some(route_dir.join(file_name)));
        }
    }

    Ok(None)
}

fn is_meta_candidate(path: &Path, meta_name: &str) -> bool {
    let stem_matches = path.file_stem() == Some(OsStr::new(meta_name));
    let ext_matches = path
        .extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| META_EXTENSIONS.contains(&ext));
    stem_matches && ext_matches
}

/// app ディレクトリ基準の相対パスを、生成コードの import に使う絶対パスへ変換する。
///
/// パス区切りは常に `/` に揃える。
pub fn module_import_path(app_dir: &Path, relative: &Path) -> Result<String> {
    let joined = app_dir.join(relative);
    let abs = joined.absolutize()?;
    Ok(abs.to_string_lossy().replace('\\', "/"))
}

/// `./` / `../` で始まる相対指定か
pub fn is_relative_specifier(specifier: &str) -> bool {
    specifier.starts_with("./") || specifier.starts_with("../")
}

/// `export * from "<specifier>"` の specifier を、実在するファイルパスへ解決する。
///
/// - 相対指定 (`./` / `../`) 以外のパッケージ指定は解決しない (None)
/// - 拡張子省略時は MODULE_EXTENSIONS を順に試し、ディレクトリなら index.* を探す
pub fn resolve_relative_module(specifier: &str, importer: &Path) -> Result<Option<PathBuf>> {
    if !is_relative_specifier(specifier) {
        return Ok(None);
    }

    let parent_dir = importer.parent().unwrap_or_else(|| Path::new(""));
    let base = parent_dir.join(specifier);

    // 1) 指定そのままのファイル
    // 2) 拡張子を補ったファイル
    // 3) ディレクトリ内の index.*
    let mut candidates: Vec<PathBuf> = vec![base.clone()];
    for ext in MODULE_EXTENSIONS {
        let mut with_ext = base.clone().into_os_string();
        with_ext.push(".");
        with_ext.push(ext);
        candidates.push(PathBuf::from(with_ext));
    }
    for ext in MODULE_EXTENSIONS {
        candidates.push(base.join(format!("index.{ext}")));
    }

    for cand in candidates {
        if cand.is_file() {
            return Ok(Some(cand.absolutize()?.to_path_buf()));
        }
    }

    Ok(None)
}
