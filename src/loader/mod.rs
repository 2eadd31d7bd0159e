//! Asynchronous asset loading gated on one batch future.
//!
//! Loads are registered with [`AssetLoader::add`] (or through one of the
//! keyed loaders) and awaited together with [`AssetLoader::load`].

pub mod cache;
pub mod error;
pub mod fetch;
pub mod media;
pub mod model;
pub mod tasks;

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, try_join_all};

pub use cache::{MemoCache, SharedLoad};
pub use error::LoadError;
pub use fetch::{FetchResponse, Fetcher, FileFetcher};
pub use media::MediaSource;
pub use model::ModelData;
pub use tasks::TaskScheduler;

use crate::events::{EventBus, Payload};
use crate::texture::TextureData;

pub type PendingLoad = LocalBoxFuture<'static, Result<(), LoadError>>;

pub struct LoadOptions
{
        /// Also wait for the fonts and media this source reports.
        pub media: Option<Rc<dyn MediaSource>>,

        /// Emit a progress event each time one load of the batch succeeds.
        pub progress: bool,
}

impl Default for LoadOptions
{
        fn default() -> Self
        {
                Self {
                        media: None,
                        progress: true,
                }
        }
}

/// Percent of a batch done, rounded up.
pub fn progress_percent(
        done: usize,
        total: usize,
) -> u32
{
        if total == 0
        {
                return 100;
        }

        ((done * 100).div_ceil(total)) as u32
}

pub struct AssetLoader
{
        bus: EventBus,
        progress_event: String,
        fetcher: Rc<dyn Fetcher>,
        tasks: Rc<TaskScheduler>,

        pending: RefCell<Vec<PendingLoad>>,
        generation: Rc<Cell<u64>>,

        jsons: MemoCache<String, Rc<serde_json::Value>>,
        textures: MemoCache<String, Rc<TextureData>>,
        gltfs: MemoCache<String, Rc<ModelData>>,
}

impl std::fmt::Debug for AssetLoader
{
        fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
        ) -> std::fmt::Result
        {
                f.debug_struct("AssetLoader")
                        .field("progress_event", &self.progress_event)
                        .field("pending", &self.pending())
                        .field("generation", &self.generation())
                        .finish_non_exhaustive()
        }
}

impl AssetLoader
{
        pub fn new(
                bus: EventBus,
                progress_event: impl Into<String>,
                fetcher: Rc<dyn Fetcher>,
                tasks: Rc<TaskScheduler>,
        ) -> Self
        {
                Self {
                        bus,
                        progress_event: progress_event.into(),
                        fetcher,
                        tasks,
                        pending: RefCell::new(Vec::new()),
                        generation: Rc::new(Cell::new(0)),
                        jsons: MemoCache::new(),
                        textures: MemoCache::new(),
                        gltfs: MemoCache::new(),
                }
        }

        /// Registers a cloneable load with the current batch and hands it back.
        pub fn add<F, T>(
                &self,
                load: F,
        ) -> F
        where
                F: Future<Output = Result<T, LoadError>> + Clone + 'static,
                T: 'static,
        {
                self.add_task(load.clone().map(|result| result.map(|_| ())));
                load
        }

        pub fn add_task<F>(
                &self,
                load: F,
        ) where
                F: Future<Output = Result<(), LoadError>> + 'static,
        {
                self.pending.borrow_mut().push(load.boxed_local());
        }

        /// Loads registered for the next batch.
        pub fn pending(&self) -> usize
        {
                self.pending.borrow().len()
        }

        /// Number of batches that completed successfully.
        pub fn generation(&self) -> u64
        {
                self.generation.get()
        }

        /// Takes every registered load into one batch and returns a future
        /// that completes when all of them succeeded, or with the first error.
        ///
        /// Loads registered after this call belong to the next batch.
        pub fn load(
                &self,
                options: LoadOptions,
        ) -> PendingLoad
        {
                if let Some(media) = &options.media
                {
                        self.pending.borrow_mut().extend(media.pending());
                }

                let batch = std::mem::take(&mut *self.pending.borrow_mut());
                let total = batch.len();
                let done = Rc::new(Cell::new(0usize));

                log::info!("AssetLoader: waiting on {total} assets");

                let loads = batch.into_iter().map(|load| {
                        let bus = self.bus.clone();
                        let event = self.progress_event.clone();
                        let done = done.clone();
                        let progress = options.progress;

                        async move {
                                load.await?;

                                if progress
                                {
                                        done.set(done.get() + 1);
                                        let percent = progress_percent(done.get(), total);

                                        if let Err(e) = bus.emit(&event, &Payload::Progress { percent })
                                        {
                                                log::warn!("AssetLoader: progress listener failed: {e:#}");
                                        }
                                }

                                Ok::<(), LoadError>(())
                        }
                });

                let joined = try_join_all(loads);
                let generation = self.generation.clone();

                async move {
                        joined.await?;
                        generation.set(generation.get() + 1);
                        log::info!("AssetLoader: batch {} loaded", generation.get());
                        Ok(())
                }
                .boxed_local()
        }

        /// Fetches and parses a JSON document, once per URL.
        pub fn load_json(
                &self,
                url: &str,
        ) -> SharedLoad<Rc<serde_json::Value>>
        {
                let (load, created) = self.jsons.get_or_start(url.to_string(), || {
                        let fetch = self.fetcher.fetch(url);
                        let url = url.to_string();

                        async move {
                                let body = fetch.await?.into_body()?;
                                serde_json::from_slice(&body).map(Rc::new).map_err(|e| LoadError::decode(&url, e))
                        }
                });

                if created
                {
                        self.add(load.clone());
                }

                load
        }

        /// Fetches an image and decodes it on the task scheduler, once per URL.
        pub fn load_texture(
                &self,
                url: &str,
        ) -> SharedLoad<Rc<TextureData>>
        {
                let (load, created) = self.textures.get_or_start(url.to_string(), || {
                        let fetch = self.fetcher.fetch(url);
                        let tasks = self.tasks.clone();
                        let url = url.to_string();

                        async move {
                                let body = fetch.await?.into_body()?;

                                let task_url = url.clone();
                                let decoded = tasks.schedule(move || TextureData::decode(&task_url, &body));

                                decoded.await.map_err(|_| LoadError::Cancelled { url })?.map(Rc::new)
                        }
                });

                if created
                {
                        self.add(load.clone());
                }

                load
        }

        /// Fetches a glTF/GLB file and parses it on the task scheduler, once
        /// per URL.
        pub fn load_gltf(
                &self,
                url: &str,
        ) -> SharedLoad<Rc<ModelData>>
        {
                let (load, created) = self.gltfs.get_or_start(url.to_string(), || {
                        let fetch = self.fetcher.fetch(url);
                        let tasks = self.tasks.clone();
                        let url = url.to_string();

                        async move {
                                let body = fetch.await?.into_body()?;

                                let task_url = url.clone();
                                let parsed = tasks.schedule(move || {
                                        ModelData::from_slice(&body).map_err(|e| LoadError::decode(&task_url, format!("{e:#}")))
                                });

                                parsed.await.map_err(|_| LoadError::Cancelled { url })?.map(Rc::new)
                        }
                });

                if created
                {
                        self.add(load.clone());
                }

                load
        }

        /// The decoded texture for `url` if it already finished loading.
        pub fn texture(
                &self,
                url: &str,
        ) -> Option<Rc<TextureData>>
        {
                self.textures.peek(&url.to_string()).and_then(Result::ok)
        }

        pub fn model(
                &self,
                url: &str,
        ) -> Option<Rc<ModelData>>
        {
                self.gltfs.peek(&url.to_string()).and_then(Result::ok)
        }
}

#[cfg(test)]
mod tests
{
        use futures::channel::oneshot;
        use futures::executor::{LocalPool, block_on};
        use futures::task::LocalSpawnExt;

        use super::fetch::tests::StubFetcher;
        use super::model::tests::TRIANGLE;
        use super::*;

        fn loader_with(fetcher: Rc<StubFetcher>) -> (AssetLoader, Rc<TaskScheduler>, EventBus)
        {
                let bus = EventBus::new();
                let tasks = Rc::new(TaskScheduler::new());
                let loader = AssetLoader::new(bus.clone(), "AssetsProgress", fetcher, tasks.clone());
                (loader, tasks, bus)
        }

        fn gate(url: &'static str) -> (oneshot::Sender<()>, SharedLoad<()>)
        {
                let (tx, rx) = oneshot::channel::<()>();
                let load = async move { rx.await.map_err(|_| LoadError::Cancelled { url: url.into() }) }
                        .boxed_local()
                        .shared();
                (tx, load)
        }

        fn png_bytes() -> Vec<u8>
        {
                let mut bytes = std::io::Cursor::new(Vec::new());
                image::RgbaImage::from_pixel(2, 1, image::Rgba([255, 0, 0, 255]))
                        .write_to(&mut bytes, image::ImageFormat::Png)
                        .unwrap();
                bytes.into_inner()
        }

        #[test]
        fn progress_rounds_up()
        {
                assert_eq!(progress_percent(1, 3), 34);
                assert_eq!(progress_percent(2, 3), 67);
                assert_eq!(progress_percent(3, 3), 100);
                assert_eq!(progress_percent(1, 4), 25);
                assert_eq!(progress_percent(0, 0), 100);
        }

        #[test]
        fn add_returns_the_same_future()
        {
                let (loader, _, _) = loader_with(Rc::new(StubFetcher::default()));
                let (_tx, load) = gate("a");

                let returned = loader.add(load.clone());

                assert!(returned.ptr_eq(&load));
                assert_eq!(loader.pending(), 1);
        }

        #[test]
        fn batch_waits_for_every_load_and_reports_progress()
        {
                let (loader, _, bus) = loader_with(Rc::new(StubFetcher::default()));
                let percents = Rc::new(RefCell::new(Vec::new()));

                let sink = percents.clone();
                let _progress = bus.on("AssetsProgress", move |payload| {
                        sink.borrow_mut().extend(payload.percent());
                        Ok(())
                });

                let (tx_a, a) = gate("a");
                let (tx_b, b) = gate("b");
                let (tx_c, c) = gate("c");
                loader.add(a);
                loader.add(b);
                loader.add(c);

                let done = Rc::new(Cell::new(false));
                let mut pool = LocalPool::new();
                let flag = done.clone();
                let batch = loader.load(LoadOptions::default());
                pool.spawner()
                        .spawn_local(async move {
                                batch.await.unwrap();
                                flag.set(true);
                        })
                        .unwrap();

                tx_b.send(()).unwrap();
                pool.run_until_stalled();
                tx_a.send(()).unwrap();
                pool.run_until_stalled();
                assert!(!done.get());

                tx_c.send(()).unwrap();
                pool.run_until_stalled();

                assert!(done.get());
                assert_eq!(*percents.borrow(), vec![34, 67, 100]);
                assert_eq!(loader.generation(), 1);
        }

        #[test]
        fn failure_after_progress_rejects_and_next_batch_starts_fresh()
        {
                let (loader, _, bus) = loader_with(Rc::new(StubFetcher::default()));
                let percents = Rc::new(RefCell::new(Vec::new()));

                let sink = percents.clone();
                let _progress = bus.on("AssetsProgress", move |payload| {
                        sink.borrow_mut().extend(payload.percent());
                        Ok(())
                });

                let (tx_a, a) = gate("a");
                let (tx_b, b) = gate("b");
                let (_tx_c, c) = gate("c");
                loader.add(a);
                loader.add(b);
                loader.add(c);

                let result = Rc::new(RefCell::new(None));
                let mut pool = LocalPool::new();
                let slot = result.clone();
                let batch = loader.load(LoadOptions::default());
                pool.spawner()
                        .spawn_local(async move {
                                *slot.borrow_mut() = Some(batch.await);
                        })
                        .unwrap();

                tx_a.send(()).unwrap();
                pool.run_until_stalled();
                assert_eq!(*percents.borrow(), vec![34]);
                assert!(result.borrow().is_none());

                drop(tx_b);
                pool.run_until_stalled();

                assert_eq!(*result.borrow(), Some(Err(LoadError::Cancelled { url: "b".into() })));
                assert_eq!(*percents.borrow(), vec![34]);
                assert_eq!(loader.generation(), 0);
                assert_eq!(loader.pending(), 0);

                block_on(loader.load(LoadOptions::default())).unwrap();
                assert_eq!(loader.generation(), 1);
        }

        #[test]
        fn one_failure_fails_the_batch()
        {
                let (loader, _, _) = loader_with(Rc::new(StubFetcher::default()));

                loader.add_task(async { Ok(()) });
                loader.add_task(async {
                        Err(LoadError::Media {
                                message: "broken video".into(),
                        })
                });

                let result = block_on(loader.load(LoadOptions::default()));

                assert!(matches!(result, Err(LoadError::Media { .. })));
                assert_eq!(loader.generation(), 0);
        }

        #[test]
        fn loads_added_while_a_batch_runs_join_the_next_one()
        {
                let (loader, _, _) = loader_with(Rc::new(StubFetcher::default()));
                let (tx, first) = gate("first");
                loader.add(first);

                let batch = loader.load(LoadOptions { media: None, progress: false });
                let (_late_tx, late) = gate("late");
                loader.add(late);

                tx.send(()).unwrap();
                block_on(batch).unwrap();

                assert_eq!(loader.pending(), 1);
                assert_eq!(loader.generation(), 1);
        }

        #[test]
        fn media_sources_are_part_of_the_batch()
        {
                struct TwoImages;

                impl MediaSource for TwoImages
                {
                        fn pending(&self) -> Vec<PendingLoad>
                        {
                                vec![async { Ok(()) }.boxed_local(), async { Ok(()) }.boxed_local()]
                        }
                }

                let (loader, _, bus) = loader_with(Rc::new(StubFetcher::default()));
                let count = Rc::new(Cell::new(0));
                let sink = count.clone();
                let _progress = bus.on("AssetsProgress", move |_| {
                        sink.set(sink.get() + 1);
                        Ok(())
                });

                block_on(loader.load(LoadOptions {
                        media: Some(Rc::new(TwoImages)),
                        progress: true,
                }))
                .unwrap();

                assert_eq!(count.get(), 2);
        }

        #[test]
        fn texture_requests_are_single_flight()
        {
                let fetcher = Rc::new(StubFetcher::default().with("/images/earth-day.jpg", &png_bytes()));
                let (loader, tasks, _) = loader_with(fetcher.clone());

                let first = loader.load_texture("/images/earth-day.jpg");
                let second = loader.load_texture("/images/earth-day.jpg");

                assert!(first.ptr_eq(&second));
                assert_eq!(loader.pending(), 1);

                let mut pool = LocalPool::new();
                let batch = loader.load(LoadOptions::default());
                pool.spawner().spawn_local(async move { batch.await.unwrap() }).unwrap();

                pool.run_until_stalled();
                assert_eq!(tasks.pending(), 1);
                assert!(loader.texture("/images/earth-day.jpg").is_none());

                tasks.run(1);
                pool.run_until_stalled();

                let texture = loader.texture("/images/earth-day.jpg").unwrap();
                assert_eq!((texture.width, texture.height), (2, 1));
                assert_eq!(fetcher.requests.get(), 1);

                let third = loader.load_texture("/images/earth-day.jpg");
                assert!(third.ptr_eq(&first));
                assert_eq!(loader.pending(), 0);
        }

        #[test]
        fn gltf_requests_are_single_flight()
        {
                let fetcher = Rc::new(StubFetcher::default().with("/m.gltf", TRIANGLE.as_bytes()));
                let (loader, tasks, _) = loader_with(fetcher.clone());

                let first = loader.load_gltf("/m.gltf");
                let second = loader.load_gltf("/m.gltf");

                assert!(first.ptr_eq(&second));
                assert_eq!(loader.pending(), 1);

                let mut pool = LocalPool::new();
                let batch = loader.load(LoadOptions::default());
                pool.spawner().spawn_local(async move { batch.await.unwrap() }).unwrap();

                // Fetched, parse waiting on the task scheduler.
                pool.run_until_stalled();
                assert_eq!(tasks.pending(), 1);
                assert!(loader.model("/m.gltf").is_none());

                tasks.run(1);
                pool.run_until_stalled();

                let a = block_on(first).unwrap();
                let b = block_on(second).unwrap();
                assert!(Rc::ptr_eq(&a, &b));
                assert_eq!(fetcher.requests.get(), 1);
                assert_eq!(loader.generation(), 1);

                let model = loader.model("/m.gltf").unwrap();
                assert!(Rc::ptr_eq(&model, &a));
                assert_eq!(model.meshes[0].name, "tri");
        }

        #[test]
        fn held_back_fetch_finishes_after_a_later_one()
        {
                let fetcher = Rc::new(
                        StubFetcher::default()
                                .with("/images/slow.png", &png_bytes())
                                .with("/images/fast.png", &png_bytes()),
                );
                let release = fetcher.gate("/images/slow.png");
                let (loader, tasks, bus) = loader_with(fetcher);

                let percents = Rc::new(RefCell::new(Vec::new()));
                let sink = percents.clone();
                let _progress = bus.on("AssetsProgress", move |payload| {
                        sink.borrow_mut().extend(payload.percent());
                        Ok(())
                });

                let _ = loader.load_texture("/images/slow.png");
                let _ = loader.load_texture("/images/fast.png");

                let mut pool = LocalPool::new();
                let batch = loader.load(LoadOptions::default());
                pool.spawner().spawn_local(async move { batch.await.unwrap() }).unwrap();

                pool.run_until_stalled();
                tasks.run(1);
                pool.run_until_stalled();

                assert!(loader.texture("/images/fast.png").is_some());
                assert!(loader.texture("/images/slow.png").is_none());
                assert_eq!(*percents.borrow(), vec![50]);

                release.send(()).unwrap();
                pool.run_until_stalled();
                tasks.run(1);
                pool.run_until_stalled();

                assert!(loader.texture("/images/slow.png").is_some());
                assert_eq!(*percents.borrow(), vec![50, 100]);
                assert_eq!(loader.generation(), 1);
        }

        #[test]
        fn json_http_errors_reject()
        {
                let (loader, _, _) = loader_with(Rc::new(StubFetcher::default()));

                let result = block_on(loader.load_json("/missing.json"));

                assert_eq!(
                        result,
                        Err(LoadError::Http {
                                url: "/missing.json".into(),
                                status: 404,
                        })
                );
        }

        #[test]
        fn json_is_parsed()
        {
                let fetcher = Rc::new(StubFetcher::default().with("/data.json", br#"{ "globe": true }"#));
                let (loader, _, _) = loader_with(fetcher);

                let value = block_on(loader.load_json("/data.json")).unwrap();

                assert_eq!(value["globe"], serde_json::Value::Bool(true));
        }
}
