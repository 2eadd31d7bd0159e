//! Thin browser/desktop seams: DOM helpers that are no-ops natively and the
//! local executor futures are spawned on.

use std::future::Future;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

#[cfg(target_arch = "wasm32")]
fn root_element() -> Option<web_sys::HtmlElement>
{
        web_sys::window()?
                .document()?
                .document_element()?
                .dyn_into::<web_sys::HtmlElement>()
                .ok()
}

/// Sets a custom property on `<html>`.
pub fn set_css_property(
        name: &str,
        value: &str,
)
{
        #[cfg(target_arch = "wasm32")]
        {
                if let Some(root) = root_element()
                {
                        if let Err(e) = root.style().set_property(name, value)
                        {
                                log::warn!("Failed to set {name}: {e:?}");
                        }
                }
        }

        #[cfg(not(target_arch = "wasm32"))]
        log::trace!("{name}: {value}");
}

/// Adds a class to `<html>`.
pub fn add_root_class(class: &str)
{
        #[cfg(target_arch = "wasm32")]
        {
                if let Some(root) = root_element()
                {
                        let _ = root.class_list().add_1(class);
                }
        }

        #[cfg(not(target_arch = "wasm32"))]
        log::debug!("root class added: {class}");
}

/// Whether the document advertises touch events before any touch happened.
pub fn detect_touch_device() -> bool
{
        #[cfg(target_arch = "wasm32")]
        {
                root_element()
                        .map(|root| js_sys::Reflect::has(&root, &"ontouchstart".into()).unwrap_or(false))
                        .unwrap_or(false)
        }

        #[cfg(not(target_arch = "wasm32"))]
        false
}

/// `?hidestats` in the page URL, or `ORBIS_HIDE_STATS` natively.
pub fn stats_hidden() -> bool
{
        #[cfg(target_arch = "wasm32")]
        {
                web_sys::window()
                        .and_then(|window| window.location().search().ok())
                        .and_then(|search| web_sys::UrlSearchParams::new_with_str(&search).ok())
                        .map(|params| params.has("hidestats"))
                        .unwrap_or(false)
        }

        #[cfg(not(target_arch = "wasm32"))]
        std::env::var_os("ORBIS_HIDE_STATS").is_some()
}

/// Single-threaded executor for asset futures.
///
/// Natively the pool is drained once per frame; in the browser futures go
/// straight to the JS microtask queue.
pub struct Executor
{
        #[cfg(not(target_arch = "wasm32"))]
        pool: futures::executor::LocalPool,
}

impl std::fmt::Debug for Executor
{
        fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
        ) -> std::fmt::Result
        {
                f.debug_struct("Executor").finish_non_exhaustive()
        }
}

impl Default for Executor
{
        fn default() -> Self
        {
                Self::new()
        }
}

impl Executor
{
        pub fn new() -> Self
        {
                Self {
                        #[cfg(not(target_arch = "wasm32"))]
                        pool: futures::executor::LocalPool::new(),
                }
        }

        pub fn spawn<F>(
                &self,
                future: F,
        ) where
                F: Future<Output = ()> + 'static,
        {
                #[cfg(not(target_arch = "wasm32"))]
                {
                        use futures::task::LocalSpawnExt;

                        if let Err(e) = self.pool.spawner().spawn_local(future)
                        {
                                log::error!("Executor: failed to spawn: {e}");
                        }
                }

                #[cfg(target_arch = "wasm32")]
                wasm_bindgen_futures::spawn_local(future);
        }

        /// Polls spawned futures until none can make progress.
        pub fn run_until_stalled(&mut self)
        {
                #[cfg(not(target_arch = "wasm32"))]
                self.pool.run_until_stalled();
        }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests
{
        use std::cell::Cell;
        use std::rc::Rc;

        use super::*;

        #[test]
        fn spawned_futures_run_when_drained()
        {
                let mut executor = Executor::new();
                let done = Rc::new(Cell::new(false));

                let flag = done.clone();
                executor.spawn(async move { flag.set(true) });
                assert!(!done.get());

                executor.run_until_stalled();
                assert!(done.get());
        }

        #[test]
        fn native_has_no_touch_probe()
        {
                assert!(!detect_touch_device());
        }
}
