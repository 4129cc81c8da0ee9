//! 階層化されたマニフェストから、クライアントルーター向けのルート定義を組み立てる。
//!
//! 文字列を直接連結せず、まず import テーブルとルートオブジェクトのツリー (IR) を作り、
//! テキスト化は [`emit`] に任せる。

pub mod capability;
pub mod emit;
pub mod ident;

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::model::{DataApiRoute, LegacyRoute, RouteCapabilities, RouteNode};
use crate::resolver::module_import_path;

use capability::{resolve_data_fields, resolve_legacy_component, LazySource, LegacyComponent, Source};
use ident::{pascal_snake_case, IdentAllocator};

/// `import * as <ident> from "<source>"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub ident: String,
    pub source: String,
}

/// `<binding>.<export>` 形式の参照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub binding: String,
    pub export: &'static str,
}

impl Reference {
    fn new(binding: &str, export: &'static str) -> Self {
        Self {
            binding: binding.to_string(),
            export,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LazyWiring {
    /// default export を Component に読み替える動的 import
    DefaultExport { source: String },
    /// モジュールが export した `lazy` 関数
    Export(Reference),
}

/// Data API 形式のフィールド。None のフィールドは出力しない
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFields {
    pub lazy: Option<LazyWiring>,
    /// `React.createElement(<ref>)`
    pub element: Option<Reference>,
    /// `React.createElement(<ref>)`
    pub error_element: Option<Reference>,
    pub loader: Option<Reference>,
    pub action: Option<Reference>,
    pub handle: Option<Reference>,
    pub should_revalidate: Option<Reference>,
}

/// 旧形式のフィールド
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyFields {
    /// meta モジュール全体の束縛名
    pub meta: Option<String>,
    /// `() => import("<source>")`
    pub lazy_component: Option<String>,
    pub element: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteFields {
    DataApi(DataFields),
    Legacy(LegacyFields),
}

/// 生成されるルートオブジェクト 1 件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteObject {
    pub id: String,
    /// None なら path フィールドを出力しない (パスを持たないレイアウト)
    pub path: Option<String>,
    pub index: bool,
    pub case_sensitive: bool,
    pub fields: RouteFields,
    pub children: Vec<RouteObject>,
}

/// コード生成の中間表現
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneratedRoutes {
    pub imports: Vec<ImportBinding>,
    pub routes: Vec<RouteObject>,
}

impl GeneratedRoutes {
    pub fn render(&self) -> String {
        emit::render_module(self)
    }
}

/// ルートツリーを IR に変換する。
///
/// import 識別子はツリーを前順 (親 → 子、兄弟は並び順) に辿りながら割り当てるので、
/// 同じ入力からは常に同じ識別子が得られる。
pub fn stringify_routes(tree: &[RouteNode], app_dir: &Path) -> Result<GeneratedRoutes> {
    let mut stringifier = RouteStringifier {
        app_dir: app_dir.to_path_buf(),
        idents: IdentAllocator::new(),
        imports: Vec::new(),
    };
    let routes = stringifier.routes(tree)?;
    debug!(imports = stringifier.imports.len(), "import テーブル生成");
    Ok(GeneratedRoutes {
        imports: stringifier.imports,
        routes,
    })
}

struct RouteStringifier {
    app_dir: PathBuf,
    idents: IdentAllocator,
    imports: Vec<ImportBinding>,
}

impl RouteStringifier {
    fn routes(&mut self, nodes: &[RouteNode]) -> Result<Vec<RouteObject>> {
        nodes.iter().map(|node| self.route(node)).collect()
    }

    fn route(&mut self, node: &RouteNode) -> Result<RouteObject> {
        let route = &node.entry.route;
        let base = pascal_snake_case(&route.id);

        let fields = match &node.entry.capabilities {
            RouteCapabilities::DataApi(data) => RouteFields::DataApi(self.data_api_fields(&base, &route.file, data)?),
            RouteCapabilities::Legacy(legacy) => RouteFields::Legacy(self.legacy_fields(&base, &route.file, legacy)?),
        };

        // index ルートでパス未指定 (空文字を含む) なら "/" を出力する
        let path = match (route.path.as_deref(), route.index) {
            (Some(path), _) if !path.is_empty() => Some(path.to_string()),
            (_, true) => Some("/".to_string()),
            (_, false) => None,
        };

        Ok(RouteObject {
            id: route.id.clone(),
            path,
            index: route.index,
            case_sensitive: route.case_sensitive,
            fields,
            children: self.routes(&node.children)?,
        })
    }

    fn bind(&mut self, base: &str, file: &Path) -> Result<String> {
        let ident = self.idents.allocate(base);
        let source = module_import_path(&self.app_dir, file)?;
        self.imports.push(ImportBinding {
            ident: ident.clone(),
            source,
        });
        Ok(ident)
    }

    fn data_api_fields(&mut self, base: &str, file: &Path, route: &DataApiRoute) -> Result<DataFields> {
        let meta_caps = route.meta_file.as_ref().map(|_| &route.meta);
        let resolved = resolve_data_fields(meta_caps, &route.own);

        let meta_ident = match &route.meta_file {
            Some(meta_file) if resolved.uses(Source::MetaFile) => Some(self.bind(&format!("{base}_Meta"), meta_file)?),
            _ => None,
        };
        let route_ident = if resolved.uses(Source::RouteFile) {
            Some(self.bind(base, file)?)
        } else {
            None
        };

        let reference = |source: Option<Source>, export: &'static str| {
            let binding = match source? {
                Source::MetaFile => meta_ident.as_deref()?,
                Source::RouteFile => route_ident.as_deref()?,
            };
            Some(Reference::new(binding, export))
        };

        let lazy = match resolved.lazy {
            Some(LazySource::DefaultExport) => Some(LazyWiring::DefaultExport {
                source: module_import_path(&self.app_dir, file)?,
            }),
            Some(LazySource::RouteFile) => reference(Some(Source::RouteFile), "lazy").map(LazyWiring::Export),
            None => None,
        };

        Ok(DataFields {
            lazy,
            element: reference(resolved.element, "Component"),
            error_element: reference(resolved.error_element, "ErrorBoundary"),
            loader: reference(resolved.loader, "loader"),
            action: reference(resolved.action, "action"),
            handle: reference(resolved.handle, "handle"),
            should_revalidate: reference(resolved.should_revalidate, "shouldRevalidate"),
        })
    }

    fn legacy_fields(&mut self, base: &str, file: &Path, route: &LegacyRoute) -> Result<LegacyFields> {
        // meta ファイルはフィールド単位ではなくモジュールごと `meta` に渡す
        let meta = match &route.meta {
            Some(meta_file) => Some(self.bind(&format!("{base}_Meta"), meta_file)?),
            None => None,
        };

        let mut fields = LegacyFields {
            meta,
            ..Default::default()
        };
        match resolve_legacy_component(&route.own) {
            Some(LegacyComponent::Lazy) => {
                fields.lazy_component = Some(module_import_path(&self.app_dir, file)?);
            }
            Some(LegacyComponent::Element) => {
                let ident = self.bind(base, file)?;
                fields.element = Some(Reference::new(&ident, "Component"));
            }
            None => {}
        }
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        DataApiCapabilities, FlatRouteEntry, LegacyCapabilities, MetaCapabilities, RouteEntry,
    };

    fn node(id: &str, caps: RouteCapabilities, children: Vec<RouteNode>) -> RouteNode {
        RouteNode {
            entry: RouteEntry {
                route: FlatRouteEntry {
                    file: PathBuf::from(format!("routes/{id}.tsx")),
                    id: id.to_string(),
                    parent_id: None,
                    path: Some(id.to_string()),
                    index: false,
                    case_sensitive: false,
                },
                capabilities: caps,
            },
            children,
        }
    }

    fn data(own: DataApiCapabilities, meta: Option<MetaCapabilities>) -> RouteCapabilities {
        RouteCapabilities::DataApi(DataApiRoute {
            meta_file: meta.map(|_| PathBuf::from("routes/meta.ts")),
            own,
            meta: meta.unwrap_or_default(),
        })
    }

    fn component() -> DataApiCapabilities {
        DataApiCapabilities {
            component: true,
            ..Default::default()
        }
    }

    fn data_fields(route: &RouteObject) -> &DataFields {
        match &route.fields {
            RouteFields::DataApi(fields) => fields,
            RouteFields::Legacy(_) => panic!("expected data api fields"),
        }
    }

    fn with_path(mut node: RouteNode, path: Option<&str>, index: bool) -> RouteNode {
        node.entry.route.path = path.map(str::to_string);
        node.entry.route.index = index;
        node
    }

    #[test]
    fn empty_path_is_treated_as_missing() {
        let legacy = RouteCapabilities::Legacy(LegacyRoute {
            meta: None,
            own: LegacyCapabilities {
                component: true,
                ..Default::default()
            },
        });
        let tree = vec![
            with_path(node("routes/_index", data(component(), None), vec![]), Some(""), true),
            with_path(node("routes/_layout", data(component(), None), vec![]), Some(""), false),
            with_path(node("routes/home", legacy, vec![]), Some(""), true),
        ];
        let generated = stringify_routes(&tree, Path::new("/app")).unwrap();
        let paths: Vec<_> = generated.routes.iter().map(|r| r.path.as_deref()).collect();
        assert_eq!(paths, [Some("/"), None, Some("/")]);
        assert!(generated.render().contains("{path:\"/\",id:\"routes/_index\",index:true"));
    }

    #[test]
    fn prefix_ids_get_distinct_identifiers() {
        let tree = vec![
            node("a", data(component(), None), vec![node("a/b", data(component(), None), vec![])]),
            node("a_b", data(component(), None), vec![]),
            node("react", data(component(), None), vec![]),
        ];
        let generated = stringify_routes(&tree, Path::new("/app")).unwrap();
        let idents: Vec<_> = generated.imports.iter().map(|i| i.ident.as_str()).collect();
        assert_eq!(idents, ["A", "A_B", "A_B_2", "React_2"]);
    }

    #[test]
    fn meta_and_route_imports_are_both_bound() {
        let meta = MetaCapabilities {
            loader: true,
            ..Default::default()
        };
        let own = DataApiCapabilities {
            loader: true,
            ..component()
        };
        let generated = stringify_routes(&[node("about", data(own, Some(meta)), vec![])], Path::new("/app")).unwrap();

        assert_eq!(
            generated.imports,
            [
                ImportBinding {
                    ident: "About_Meta".into(),
                    source: "/app/routes/meta.ts".into()
                },
                ImportBinding {
                    ident: "About".into(),
                    source: "/app/routes/about.tsx".into()
                },
            ]
        );
        let fields = data_fields(&generated.routes[0]);
        assert_eq!(fields.loader, Some(Reference::new("About_Meta", "loader")));
        assert_eq!(fields.element, Some(Reference::new("About", "Component")));
    }

    #[test]
    fn unused_meta_file_is_not_imported() {
        let generated =
            stringify_routes(&[node("x", data(component(), Some(MetaCapabilities::default())), vec![])], Path::new("/app"))
                .unwrap();
        let idents: Vec<_> = generated.imports.iter().map(|i| i.ident.as_str()).collect();
        assert_eq!(idents, ["X"]);
    }

    #[test]
    fn pathless_non_index_route_has_no_path() {
        let mut layout = node("layout", data(DataApiCapabilities::default(), None), vec![]);
        layout.entry.route.path = None;
        let mut index = node("layout/index", data(component(), None), vec![]);
        index.entry.route.path = None;
        index.entry.route.index = true;
        layout.children.push(index);

        let generated = stringify_routes(&[layout], Path::new("/app")).unwrap();
        assert_eq!(generated.routes[0].path, None);
        assert_eq!(generated.routes[0].children[0].path.as_deref(), Some("/"));
        assert!(generated.imports.iter().all(|i| i.ident != "Layout"));
    }

    #[test]
    fn legacy_route_attaches_meta_module_whole() {
        let legacy = RouteCapabilities::Legacy(LegacyRoute {
            meta: Some(PathBuf::from("routes/meta.js")),
            own: LegacyCapabilities {
                default_export: true,
                component: true,
            },
        });
        let generated = stringify_routes(&[node("home", legacy, vec![])], Path::new("/app")).unwrap();
        let RouteFields::Legacy(fields) = &generated.routes[0].fields else {
            panic!("expected legacy fields");
        };
        assert_eq!(fields.meta.as_deref(), Some("Home_Meta"));
        assert_eq!(fields.lazy_component.as_deref(), Some("/app/routes/home.tsx"));
        assert_eq!(fields.element, None);
        assert_eq!(generated.imports.len(), 1);
    }
}
