use std::fmt;
use std::sync::Arc;

use super::element::{Element, LoadError};
use super::meta::Meta;

/// ルートのライフサイクルフック。メタ情報を受け取る
pub type Hook = Arc<dyn Fn(&Meta) + Send + Sync>;

#[derive(Clone, Default)]
pub struct RouteHooks {
    pub on_route_will_mount: Option<Hook>,
    pub on_route_mount: Option<Hook>,
    pub on_route_unmount: Option<Hook>,
}

fn fire(hook: &Option<Hook>, meta: &Meta) {
    if let Some(hook) = hook {
        hook(meta);
    }
}

/// 描画要素をフックとメタ情報で包むガード。
///
/// ガード自体は要素の記述で、マウントされるたびに [`GuardInstance`] を作る。
#[derive(Clone)]
pub struct Guard {
    element: Box<Element>,
    meta: Meta,
    hooks: RouteHooks,
}

impl Guard {
    pub fn new(element: Element, meta: Meta, hooks: RouteHooks) -> Self {
        Self {
            element: Box::new(element),
            meta,
            hooks,
        }
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn instantiate(&self) -> GuardInstance {
        GuardInstance {
            guard: self.clone(),
            will_mount_fired: false,
            mounted: false,
        }
    }
}

impl fmt::Debug for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("element", &self.element)
            .field("meta", &self.meta)
            .finish_non_exhaustive()
    }
}

/// マウント中のガード 1 件分の状態。
///
/// - 初回 `render` の直前に will-mount
/// - 初回 `commit` の後に mount
/// - `unmount` (インスタンスを消費する) で unmount。mount 済みの場合のみ
///
/// 再描画を何度繰り返しても各フックは 1 回しか呼ばれない。フック内の panic は捕捉しない。
pub struct GuardInstance {
    guard: Guard,
    will_mount_fired: bool,
    mounted: bool,
}

impl GuardInstance {
    /// 遅延コンポーネントは未解決ならここで読み込まれる
    pub fn render(&mut self) -> Result<Element, LoadError> {
        if !self.will_mount_fired {
            self.will_mount_fired = true;
            fire(&self.guard.hooks.on_route_will_mount, &self.guard.meta);
        }
        match self.guard.element.as_ref() {
            Element::Suspense(boundary) => boundary.render(),
            element => Ok(element.clone()),
        }
    }

    pub fn commit(&mut self) {
        if !self.mounted {
            self.mounted = true;
            fire(&self.guard.hooks.on_route_mount, &self.guard.meta);
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn unmount(self) {
        if self.mounted {
            fire(&self.guard.hooks.on_route_unmount, &self.guard.meta);
        }
    }
}
