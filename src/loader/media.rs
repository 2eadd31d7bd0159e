use futures::future::LocalBoxFuture;

use super::LoadError;

/// Page content that has to be ready before the page is.
pub trait MediaSource
{
        /// One future per font set, image or video still loading.
        fn pending(&self) -> Vec<LocalBoxFuture<'static, Result<(), LoadError>>>;
}

/// Fonts, `<img>` and eager `<video>` elements of the current document.
///
/// Images resolve on `load` or `error` (or at once when already decoded).
/// Videos resolve on the first `timeupdate` after `canplaythrough`, pausing
/// playback there, or on `error`.
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Default)]
pub struct DomMediaSource
{
        /// Subtree to scan; the body when `None`.
        pub selector: Option<String>,
}

#[cfg(target_arch = "wasm32")]
mod dom
{
        use std::cell::RefCell;
        use std::rc::Rc;

        use futures::FutureExt;
        use futures::channel::oneshot;
        use futures::future::LocalBoxFuture;
        use wasm_bindgen::JsCast;
        use wasm_bindgen::prelude::Closure;
        use wasm_bindgen_futures::JsFuture;

        use super::{DomMediaSource, LoadError, MediaSource};

        type Signal = Rc<RefCell<Option<oneshot::Sender<()>>>>;

        fn fire(signal: &Signal)
        {
                if let Some(tx) = signal.borrow_mut().take()
                {
                        let _ = tx.send(());
                }
        }

        /// Registered listeners, removed once the element settled.
        struct Listeners
        {
                target: web_sys::EventTarget,
                closures: Vec<(&'static str, Closure<dyn FnMut()>)>,
        }

        impl Listeners
        {
                fn new(target: web_sys::EventTarget) -> Self
                {
                        Self {
                                target,
                                closures: Vec::new(),
                        }
                }

                fn add(
                        &mut self,
                        event: &'static str,
                        closure: Closure<dyn FnMut()>,
                )
                {
                        let _ = self
                                .target
                                .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
                        self.closures.push((event, closure));
                }
        }

        impl Drop for Listeners
        {
                fn drop(&mut self)
                {
                        for (event, closure) in &self.closures
                        {
                                let _ = self
                                        .target
                                        .remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
                        }
                }
        }

        fn settle(
                rx: oneshot::Receiver<()>,
                listeners: Listeners,
        ) -> LocalBoxFuture<'static, Result<(), LoadError>>
        {
                async move {
                        let _ = rx.await;
                        drop(listeners);
                        Ok(())
                }
                .boxed_local()
        }

        fn image(element: web_sys::HtmlImageElement) -> LocalBoxFuture<'static, Result<(), LoadError>>
        {
                if element.complete() && element.natural_width() != 0
                {
                        return futures::future::ready(Ok(())).boxed_local();
                }

                let (tx, rx) = oneshot::channel();
                let signal: Signal = Rc::new(RefCell::new(Some(tx)));
                let mut listeners = Listeners::new(element.into());

                for event in ["load", "error"]
                {
                        let signal = signal.clone();
                        listeners.add(event, Closure::new(move || fire(&signal)));
                }

                settle(rx, listeners)
        }

        fn video(element: web_sys::HtmlVideoElement) -> LocalBoxFuture<'static, Result<(), LoadError>>
        {
                let (tx, rx) = oneshot::channel();
                let signal: Signal = Rc::new(RefCell::new(Some(tx)));
                let playable = Rc::new(RefCell::new(false));
                let mut listeners = Listeners::new(element.clone().into());

                element.set_cross_origin(Some(""));

                {
                        let playable = playable.clone();
                        listeners.add("canplaythrough", Closure::new(move || *playable.borrow_mut() = true));
                }

                {
                        let (signal, element) = (signal.clone(), element.clone());
                        listeners.add(
                                "timeupdate",
                                Closure::new(move || {
                                        if *playable.borrow()
                                        {
                                                let _ = element.pause();
                                                fire(&signal);
                                        }
                                }),
                        );
                }

                {
                        let signal = signal.clone();
                        listeners.add("error", Closure::new(move || fire(&signal)));
                }

                if element.src().is_empty()
                {
                        if let Some(src) = element.get_attribute("data-src")
                        {
                                element.set_src(&src);
                        }
                }

                element.load();
                let _ = element.play();

                settle(rx, listeners)
        }

        impl MediaSource for DomMediaSource
        {
                fn pending(&self) -> Vec<LocalBoxFuture<'static, Result<(), LoadError>>>
                {
                        let mut pending = Vec::new();

                        let Some(document) = web_sys::window().and_then(|window| window.document())
                        else
                        {
                                return pending;
                        };

                        let fonts = document.fonts().ready().map(JsFuture::from);
                        if let Ok(fonts) = fonts
                        {
                                pending.push(
                                        async move {
                                                fonts.await.map(|_| ()).map_err(|e| LoadError::Media {
                                                        message: format!("fonts: {e:?}"),
                                                })
                                        }
                                        .boxed_local(),
                                );
                        }

                        let root: Option<web_sys::Element> = match &self.selector
                        {
                                Some(selector) => document.query_selector(selector).ok().flatten(),
                                None => document.body().map(Into::into),
                        };

                        let Some(root) = root
                        else
                        {
                                return pending;
                        };

                        if let Ok(images) = root.query_selector_all("img")
                        {
                                for i in 0..images.length()
                                {
                                        if let Some(element) = images.item(i).and_then(|node| node.dyn_into().ok())
                                        {
                                                pending.push(image(element));
                                        }
                                }
                        }

                        if let Ok(videos) = root.query_selector_all("video:not([lazy])")
                        {
                                for i in 0..videos.length()
                                {
                                        if let Some(element) = videos.item(i).and_then(|node| node.dyn_into().ok())
                                        {
                                                pending.push(video(element));
                                        }
                                }
                        }

                        log::debug!("DomMediaSource: waiting on {} items", pending.len());
                        pending
                }
        }
}
