//! Explicitly constructed application context.
//!
//! Everything the page-level components share lives here, built in one
//! fixed order: config, bus, input store, task scheduler, tweens, frame
//! scheduler, input normalizer, asset loader, executor.

use std::cell::RefCell;
use std::rc::Rc;

use derivative::Derivative;
use instant::Instant;

use crate::config::Config;
use crate::events::{EventBus, Subscription};
use crate::input::{GlobalEvents, InputStore, RafHandle};
use crate::loader::fetch::{Fetcher, default_fetcher};
use crate::loader::{AssetLoader, TaskScheduler};
use crate::platform::Executor;
use crate::scheduler::{FrameCallback, FrameScheduler, frame_callback};
use crate::tween::TweenEngine;

/// Deferred decode work runs before anything else in a frame.
pub const TASKS_PRIORITY: i32 = 0;

#[derive(Derivative)]
#[derivative(Debug)]
pub struct AppContext
{
        pub config: Config,
        pub bus: EventBus,
        pub store: Rc<RefCell<InputStore>>,
        pub tasks: Rc<TaskScheduler>,
        pub tweens: Rc<TweenEngine>,
        pub frames: Rc<FrameScheduler>,
        pub global_events: Rc<GlobalEvents>,
        pub loader: Rc<AssetLoader>,
        pub executor: Executor,

        raf: Option<RafHandle>,
        frames_subscription: Subscription,

        #[derivative(Debug = "ignore")]
        tasks_callback: FrameCallback,
}

impl AppContext
{
        pub fn new(config: Config) -> Self
        {
                let fetcher = default_fetcher(&config);

                Self::with_fetcher(config, fetcher)
        }

        pub fn with_fetcher(
                config: Config,
                fetcher: Rc<dyn Fetcher>,
        ) -> Self
        {
                let bus = EventBus::new();
                let store = Rc::new(RefCell::new(InputStore::default()));
                let tasks = Rc::new(TaskScheduler::new());
                let tweens = Rc::new(TweenEngine::new());

                let frames = Rc::new(FrameScheduler::new());
                let frames_subscription = frames.attach(&bus);

                let global_events = Rc::new(GlobalEvents::new(bus.clone(), store.clone()));

                let loader = Rc::new(AssetLoader::new(
                        bus.clone(),
                        config.progress_event.clone(),
                        fetcher,
                        tasks.clone(),
                ));

                let budget = config.tasks_per_frame;
                let runner = tasks.clone();
                let tasks_callback = frame_callback(move |_| {
                        runner.run(budget);
                        Ok(())
                });
                frames.add(tasks_callback.clone(), TASKS_PRIORITY);

                Self {
                        config,
                        bus,
                        store,
                        tasks,
                        tweens,
                        frames,
                        global_events,
                        loader,
                        executor: Executor::new(),
                        raf: None,
                        frames_subscription,
                        tasks_callback,
                }
        }

        /// Wires every input capability once and starts the frame driver
        /// chosen by [`Config::frame_mode`].
        pub fn enable_global_events(&mut self) -> Option<RafHandle>
        {
                let global = &self.global_events;

                global.detect_touch_device();
                global.enable_mousemove();
                global.enable_drag();
                global.enable_resize(self.config.resize_debounce());

                self.raf = global.enable_raf(self.config.frame_mode, self.tweens.ticker());

                log::info!("GlobalEvents: enabled ({:?} frames)", self.config.frame_mode);

                self.raf.clone()
        }

        pub fn raf_handle(&self) -> Option<RafHandle>
        {
                self.raf.clone()
        }

        pub fn is_attached(&self) -> bool
        {
                self.frames_subscription.is_active()
        }

        /// Runs one frame: tweens and their ticker, the native frame loop
        /// and debounced resizes, then whatever futures became ready.
        ///
        /// Returns whether another frame should be requested.
        pub fn advance(
                &mut self,
                time: f64,
                now: Instant,
        ) -> anyhow::Result<bool>
        {
                self.tweens.tick(time)?;

                let more = self.global_events.tick(time, now)?;

                self.executor.run_until_stalled();

                Ok(more)
        }
}

impl Drop for AppContext
{
        fn drop(&mut self)
        {
                self.frames.remove(&self.tasks_callback);
        }
}
