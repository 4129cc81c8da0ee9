use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{
    DataApiCapabilities, DataApiRoute, FlatRouteEntry, LegacyCapabilities, LegacyRoute, MetaCapabilities,
    RouteCapabilities, RouteEntry, RouteManifest, RouteMode,
};
use crate::prober::{ExportProber, ModuleEvaluator};
use crate::resolver::resolve_meta_file;

/// フラットなマニフェストの各ルートに export 由来の機能フラグを付与する。
///
/// Data API モードでは meta ファイルとルートファイルのフラグを別々に保持し、
/// どちらを採用するかはコード生成側で決める。
pub fn augment_manifest<E: ModuleEvaluator + ?Sized>(
    flat: &[FlatRouteEntry],
    mode: RouteMode,
    meta_name: &str,
    prober: &mut ExportProber<'_, E>,
) -> Result<RouteManifest> {
    let mut manifest = RouteManifest::new();

    for route in flat {
        if manifest.contains_key(&route.id) {
            return Err(Error::DuplicateRouteId(route.id.clone()));
        }

        let capabilities = match mode {
            RouteMode::Legacy => RouteCapabilities::Legacy(legacy_route(route, meta_name, prober)?),
            RouteMode::DataApi => RouteCapabilities::DataApi(data_api_route(route, meta_name, prober)?),
        };

        manifest.insert(
            route.id.clone(),
            RouteEntry {
                route: route.clone(),
                capabilities,
            },
        );
    }

    info!(routes = manifest.len(), ?mode, "マニフェスト拡張完了");
    Ok(manifest)
}

fn legacy_route<E: ModuleEvaluator + ?Sized>(
    route: &FlatRouteEntry,
    meta_name: &str,
    prober: &mut ExportProber<'_, E>,
) -> Result<LegacyRoute> {
    let exports = prober.probe(&route.file)?;
    let meta = resolve_meta_file(prober.app_dir(), &route.file, meta_name)?;

    Ok(LegacyRoute {
        meta,
        own: LegacyCapabilities::from_exports(&exports),
    })
}

fn data_api_route<E: ModuleEvaluator + ?Sized>(
    route: &FlatRouteEntry,
    meta_name: &str,
    prober: &mut ExportProber<'_, E>,
) -> Result<DataApiRoute> {
    let meta_file = resolve_meta_file(prober.app_dir(), &route.file, meta_name)?;

    let meta = match &meta_file {
        Some(file) => MetaCapabilities::from_exports(&prober.probe(file)?),
        None => MetaCapabilities::default(),
    };
    let own = DataApiCapabilities::from_exports(&prober.probe(&route.file)?);

    debug!(id = %route.id, ?own, ?meta, "機能フラグ");
    Ok(DataApiRoute { meta_file, own, meta })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prober::StaticEvaluator;
    use std::fs;
    use std::path::PathBuf;

    fn entry(id: &str, file: &str) -> FlatRouteEntry {
        FlatRouteEntry {
            file: PathBuf::from(file),
            id: id.to_string(),
            parent_id: None,
            path: Some(id.to_string()),
            index: false,
            case_sensitive: false,
        }
    }

    #[test]
    fn data_api_keeps_meta_and_own_flags_separately() {
        let dir = tempfile::tempdir().unwrap();
        let app = dir.path();
        fs::create_dir_all(app.join("routes/about")).unwrap();
        fs::write(app.join("routes/about/meta.ts"), "").unwrap();

        let mut evaluator = StaticEvaluator::new()
            .with_module(app.join("routes/about/route.tsx"), ["Component", "loader"])
            .with_module(app.join("routes/about/meta.ts"), ["loader", "action", "Component"]);
        let mut prober = ExportProber::new(&mut evaluator, app);

        let flat = [entry("about", "routes/about/route.tsx")];
        let manifest = augment_manifest(&flat, RouteMode::DataApi, "meta", &mut prober).unwrap();

        let RouteCapabilities::DataApi(route) = &manifest["about"].capabilities else {
            panic!("expected data api route");
        };
        assert_eq!(route.meta_file, Some(PathBuf::from("routes/about/meta.ts")));
        assert!(route.own.component && route.own.loader && !route.own.action);
        assert!(route.meta.loader && route.meta.action && !route.meta.handle);
    }

    #[test]
    fn layout_only_module_has_no_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut evaluator = StaticEvaluator::new().with_module(dir.path().join("layout.tsx"), Vec::<String>::new());
        let mut prober = ExportProber::new(&mut evaluator, dir.path());

        let manifest = augment_manifest(&[entry("layout", "layout.tsx")], RouteMode::DataApi, "meta", &mut prober).unwrap();
        let RouteCapabilities::DataApi(route) = &manifest["layout"].capabilities else {
            panic!("expected data api route");
        };
        assert_eq!(route.own, DataApiCapabilities::default());
        assert_eq!(route.meta, MetaCapabilities::default());
        assert_eq!(route.meta_file, None);
    }

    #[test]
    fn legacy_mode_records_default_and_component() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("meta.js"), "").unwrap();
        let mut evaluator = StaticEvaluator::new().with_module(dir.path().join("home.tsx"), ["default", "loader"]);
        let mut prober = ExportProber::new(&mut evaluator, dir.path());

        let manifest = augment_manifest(&[entry("home", "home.tsx")], RouteMode::Legacy, "meta", &mut prober).unwrap();
        let RouteCapabilities::Legacy(route) = &manifest["home"].capabilities else {
            panic!("expected legacy route");
        };
        assert!(route.own.default_export);
        assert!(!route.own.component);
        assert_eq!(route.meta, Some(PathBuf::from("meta.js")));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut evaluator = StaticEvaluator::new().with_module(dir.path().join("a.tsx"), ["Component"]);
        let mut prober = ExportProber::new(&mut evaluator, dir.path());

        let flat = [entry("a", "a.tsx"), entry("a", "a.tsx")];
        let err = augment_manifest(&flat, RouteMode::DataApi, "meta", &mut prober).unwrap_err();
        assert!(matches!(err, Error::DuplicateRouteId(id) if id == "a"));
    }

    #[test]
    fn probe_failures_abort_the_pass() {
        let dir = tempfile::tempdir().unwrap();
        let mut evaluator = StaticEvaluator::new();
        let mut prober = ExportProber::new(&mut evaluator, dir.path());

        let err = augment_manifest(&[entry("a", "a.tsx")], RouteMode::DataApi, "meta", &mut prober).unwrap_err();
        assert!(matches!(err, Error::ModuleEvaluation { .. }));
    }
}
