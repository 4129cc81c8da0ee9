//! 手書きのルート定義に、ライフサイクルガードとメタ情報を付与するクライアント側ルーター。
//!
//! コード生成とは独立しており、生成を使わずにルートを直接書く場合の経路。

pub mod element;
pub mod guard;
pub mod meta;

use serde_json::Value;

pub use element::{Component, Element, LazyComponent, LoadError, SuspenseBoundary};
pub use guard::{Guard, GuardInstance, Hook, RouteHooks};
pub use meta::{collect_meta, Meta};

use std::sync::Arc;

/// 入力となるルート定義
#[derive(Debug, Clone, Default)]
pub struct RouteConfig {
    pub id: Option<String>,
    /// None のルートはガード対象外 (扱いは [`PathlessRoutes`] で決まる)
    pub path: Option<String>,
    pub index: bool,
    pub redirect: Option<String>,
    pub lazy_component: Option<LazyComponent>,
    pub element: Option<Element>,
    pub meta: Meta,
    pub children: Vec<RouteConfig>,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// path を持たないグループ用ルート
    pub fn pathless() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn index(mut self) -> Self {
        self.index = true;
        self
    }

    pub fn redirect(mut self, to: impl Into<String>) -> Self {
        self.redirect = Some(to.into());
        self
    }

    pub fn lazy_component(mut self, lazy: LazyComponent) -> Self {
        self.lazy_component = Some(lazy);
        self
    }

    pub fn element(mut self, element: Element) -> Self {
        self.element = Some(element);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: Value) -> Self {
        self.meta.insert(key.into(), value);
        self
    }

    pub fn children(mut self, children: Vec<RouteConfig>) -> Self {
        self.children = children;
        self
    }
}

/// ルーターに渡す、ガード済みのルート
#[derive(Debug, Clone)]
pub struct DecoratedRoute {
    pub id: Option<String>,
    pub path: Option<String>,
    pub index: bool,
    /// redirect / lazy / element のどれもなければ None
    pub element: Option<Element>,
    /// 祖先から合成したメタ情報
    pub meta: Meta,
    pub children: Vec<DecoratedRoute>,
}

/// path を持たないルートの扱い
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PathlessRoutes {
    /// ルートも子孫も出力しない
    #[default]
    Drop,
    /// ルート自体は出力せず、ガード済みの子を親の階層に並べる
    Hoist,
}

/// ルート定義にガードを付与するルーター
pub struct Router {
    routes: Vec<RouteConfig>,
    hooks: RouteHooks,
    suspense: Element,
    pathless: PathlessRoutes,
}

impl Router {
    pub fn new(routes: Vec<RouteConfig>) -> Self {
        Self {
            routes,
            hooks: RouteHooks::default(),
            suspense: Element::Empty,
            pathless: PathlessRoutes::default(),
        }
    }

    pub fn on_route_will_mount(mut self, hook: impl Fn(&Meta) + Send + Sync + 'static) -> Self {
        self.hooks.on_route_will_mount = Some(Arc::new(hook));
        self
    }

    pub fn on_route_mount(mut self, hook: impl Fn(&Meta) + Send + Sync + 'static) -> Self {
        self.hooks.on_route_mount = Some(Arc::new(hook));
        self
    }

    pub fn on_route_unmount(mut self, hook: impl Fn(&Meta) + Send + Sync + 'static) -> Self {
        self.hooks.on_route_unmount = Some(Arc::new(hook));
        self
    }

    /// 遅延コンポーネントの読み込み中に表示する要素
    pub fn suspense(mut self, fallback: Element) -> Self {
        self.suspense = fallback;
        self
    }

    pub fn pathless(mut self, pathless: PathlessRoutes) -> Self {
        self.pathless = pathless;
        self
    }

    pub fn create_client_routes(&self) -> Vec<DecoratedRoute> {
        self.decorate(&self.routes, &Meta::new())
    }

    fn decorate(&self, routes: &[RouteConfig], inherited: &Meta) -> Vec<DecoratedRoute> {
        let mut decorated = Vec::with_capacity(routes.len());
        for route in routes {
            let meta = collect_meta(inherited, &route.meta);

            if route.path.is_none() {
                if self.pathless == PathlessRoutes::Hoist {
                    decorated.extend(self.decorate(&route.children, &meta));
                }
                continue;
            }

            decorated.push(DecoratedRoute {
                id: route.id.clone(),
                path: route.path.clone(),
                index: route.index,
                element: self.render_element(route, &meta),
                children: self.decorate(&route.children, &meta),
                meta,
            });
        }
        decorated
    }

    /// redirect > lazy > element の順で 1 つだけ採用する
    fn render_element(&self, route: &RouteConfig, meta: &Meta) -> Option<Element> {
        if let Some(to) = &route.redirect {
            return Some(Element::Navigate {
                to: to.clone(),
                replace: true,
            });
        }

        if let Some(lazy) = &route.lazy_component {
            let boundary = SuspenseBoundary {
                fallback: Box::new(self.suspense.clone()),
                lazy: lazy.clone(),
                meta: meta.clone(),
            };
            return Some(self.guard(Element::Suspense(boundary), meta));
        }

        route.element.as_ref().map(|element| {
            let element = element.clone().with_prop("meta", Value::Object(meta.clone()));
            self.guard(element, meta)
        })
    }

    fn guard(&self, element: Element, meta: &Meta) -> Element {
        Element::Guard(Guard::new(element, meta.clone(), self.hooks.clone()))
    }
}
