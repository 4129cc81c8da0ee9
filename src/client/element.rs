use serde_json::{Map, Value};
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, TryLockError};
use thiserror::Error;

use super::guard::Guard;
use super::meta::Meta;

/// 遅延ロードしたコンポーネントの読み込み失敗
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load component: {0}")]
pub struct LoadError(pub String);

/// 描画可能なコンポーネント
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// ルートに割り当てる要素
#[derive(Debug, Clone)]
pub enum Element {
    /// 何も描画しない (Fragment)
    Empty,
    Component { component: Component, props: Map<String, Value> },
    /// 別パスへの遷移だけを行う要素
    Navigate { to: String, replace: bool },
    Suspense(SuspenseBoundary),
    Guard(Guard),
}

impl Element {
    pub fn component(name: impl Into<String>) -> Self {
        Element::Component {
            component: Component::new(name),
            props: Map::new(),
        }
    }

    /// props を追加した要素を返す。Component 以外はそのまま
    pub fn with_prop(self, key: &str, value: Value) -> Self {
        match self {
            Element::Component { component, mut props } => {
                props.insert(key.to_string(), value);
                Element::Component { component, props }
            }
            other => other,
        }
    }

    pub fn as_guard(&self) -> Option<&Guard> {
        match self {
            Element::Guard(guard) => Some(guard),
            _ => None,
        }
    }
}

type Loader = dyn Fn() -> Result<Component, LoadError> + Send + Sync;

/// 初回の読み込みまで解決されないコンポーネント。
///
/// 解決結果は clone 間で共有され、ローダーは成功するまでしか呼ばれない。
/// 同時に呼ばれてもローダーを実行するのは 1 呼び出し元だけ。
#[derive(Clone)]
pub struct LazyComponent {
    loader: Arc<Loader>,
    resolved: Arc<OnceLock<Component>>,
    loading: Arc<Mutex<()>>,
}

impl LazyComponent {
    pub fn new(loader: impl Fn() -> Result<Component, LoadError> + Send + Sync + 'static) -> Self {
        Self {
            loader: Arc::new(loader),
            resolved: Arc::new(OnceLock::new()),
            loading: Arc::new(Mutex::new(())),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.resolved.get().is_none()
    }

    pub fn get(&self) -> Option<&Component> {
        self.resolved.get()
    }

    /// 読み込み中の呼び出し元がいれば、その完了を待つ
    pub fn load(&self) -> Result<&Component, LoadError> {
        if let Some(component) = self.resolved.get() {
            return Ok(component);
        }
        let _loading = self.loading.lock().unwrap_or_else(PoisonError::into_inner);
        self.run_loader()
    }

    /// 待たずに読み込む。他の呼び出し元が読み込み中なら None
    pub fn try_load(&self) -> Option<Result<&Component, LoadError>> {
        if let Some(component) = self.resolved.get() {
            return Some(Ok(component));
        }
        let _loading = match self.loading.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
            Err(TryLockError::WouldBlock) => return None,
        };
        Some(self.run_loader())
    }

    // loading のロックを持った状態で呼ぶ
    fn run_loader(&self) -> Result<&Component, LoadError> {
        if let Some(component) = self.resolved.get() {
            return Ok(component);
        }
        let component = (self.loader)()?;
        Ok(self.resolved.get_or_init(|| component))
    }
}

impl fmt::Debug for LazyComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyComponent")
            .field("resolved", &self.resolved.get())
            .finish_non_exhaustive()
    }
}

/// 遅延コンポーネントを包む境界。読み込み中は fallback を描画する
#[derive(Debug, Clone)]
pub struct SuspenseBoundary {
    pub fallback: Box<Element>,
    pub lazy: LazyComponent,
    pub meta: Meta,
}

impl SuspenseBoundary {
    /// 未解決なら描画時に読み込みを始める。読み込み失敗はそのまま返す
    pub fn render(&self) -> Result<Element, LoadError> {
        match self.lazy.try_load() {
            Some(Ok(component)) => Ok(Element::Component {
                component: component.clone(),
                props: Map::new(),
            }
            .with_prop("meta", Value::Object(self.meta.clone()))),
            Some(Err(e)) => Err(e),
            None => Ok((*self.fallback).clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Barrier};
    use std::thread;

    fn name_of(element: &Element) -> &str {
        match element {
            Element::Component { component, .. } => &component.name,
            other => panic!("unexpected element: {other:?}"),
        }
    }

    #[test]
    fn lazy_component_loads_once_and_shares_result() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = LazyComponent::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Component::new("Page"))
        });
        let shared = lazy.clone();

        assert!(lazy.is_pending());
        assert_eq!(lazy.load().unwrap().name, "Page");
        assert_eq!(shared.load().unwrap().name, "Page");
        assert!(!shared.is_pending());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_load_stays_pending() {
        let lazy = LazyComponent::new(|| Err(LoadError("chunk missing".into())));
        assert_eq!(lazy.load().unwrap_err(), LoadError("chunk missing".into()));
        assert!(lazy.is_pending());
    }

    #[test]
    fn concurrent_first_loads_run_the_loader_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let lazy = LazyComponent::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            thread::sleep(std::time::Duration::from_millis(20));
            Ok(Component::new("Page"))
        });

        let barrier = Arc::new(Barrier::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let lazy = lazy.clone();
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    lazy.load().unwrap().name.clone()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "Page");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn render_starts_the_load() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let boundary = SuspenseBoundary {
            fallback: Box::new(Element::component("Spinner")),
            lazy: LazyComponent::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Component::new("Page"))
            }),
            meta: Meta::new(),
        };

        for _ in 0..3 {
            match boundary.render().unwrap() {
                Element::Component { component, props } => {
                    assert_eq!(component.name, "Page");
                    assert!(props.contains_key("meta"));
                }
                other => panic!("unexpected element: {other:?}"),
            }
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn fallback_is_rendered_while_another_render_is_loading() {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let release_rx = Mutex::new(release_rx);
        let boundary = SuspenseBoundary {
            fallback: Box::new(Element::component("Spinner")),
            lazy: LazyComponent::new(move || {
                entered_tx.send(()).unwrap();
                release_rx.lock().unwrap().recv().unwrap();
                Ok(Component::new("Page"))
            }),
            meta: Meta::new(),
        };

        let background = boundary.clone();
        let loading = thread::spawn(move || background.render().unwrap());
        entered_rx.recv().unwrap();
        assert_eq!(name_of(&boundary.render().unwrap()), "Spinner");

        release_tx.send(()).unwrap();
        assert_eq!(name_of(&loading.join().unwrap()), "Page");
        assert_eq!(name_of(&boundary.render().unwrap()), "Page");
    }

    #[test]
    fn render_surfaces_load_errors() {
        let boundary = SuspenseBoundary {
            fallback: Box::new(Element::component("Spinner")),
            lazy: LazyComponent::new(|| Err(LoadError("chunk missing".into()))),
            meta: Meta::new(),
        };
        assert_eq!(boundary.render().unwrap_err(), LoadError("chunk missing".into()));
        assert!(boundary.lazy.is_pending());
    }
}
