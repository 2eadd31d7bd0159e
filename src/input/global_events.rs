use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use cgmath::Vector2;
use instant::{Duration, Instant};

use super::{DragSession, FrameLoop, InputStore, PointerKind, RafHandle, RawInput, Viewport};
use crate::config::FrameMode;
use crate::events::{self, EventBus, Payload};
use crate::platform;
use crate::tween::Ticker;
use crate::utils::debounce::Debouncer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability
{
        Mousemove,
        Resize,
        Drag,
        Raf,
}

#[derive(Debug)]
enum FrameDriver
{
        Native(Rc<FrameLoop>),
        Ticker(u64),
}

/// Normalizes raw window input and republishes it on the bus.
///
/// Each capability is wired at most once and stays enabled for the life of
/// the value.
#[derive(Debug)]
pub struct GlobalEvents
{
        bus: EventBus,
        store: Rc<RefCell<InputStore>>,
        enabled: RefCell<HashSet<Capability>>,
        drag: Cell<DragSession>,
        resize_debounce: RefCell<Option<Debouncer<Viewport>>>,
        frame_driver: RefCell<Option<FrameDriver>>,
}

impl GlobalEvents
{
        pub fn new(
                bus: EventBus,
                store: Rc<RefCell<InputStore>>,
        ) -> Self
        {
                Self {
                        bus,
                        store,
                        enabled: RefCell::new(HashSet::new()),
                        drag: Cell::new(DragSession::default()),
                        resize_debounce: RefCell::new(None),
                        frame_driver: RefCell::new(None),
                }
        }

        pub fn is_enabled(
                &self,
                capability: Capability,
        ) -> bool
        {
                self.enabled.borrow().contains(&capability)
        }

        /// Records `capability`; `false` when it was already enabled.
        fn claim(
                &self,
                capability: Capability,
        ) -> bool
        {
                let claimed = self.enabled.borrow_mut().insert(capability);

                if claimed
                {
                        log::debug!("GlobalEvents: enabled {capability:?}");
                }

                claimed
        }

        /// Flags touch support up front where the platform can tell.
        pub fn detect_touch_device(&self)
        {
                if platform::detect_touch_device()
                {
                        self.mark_touch();
                }
        }

        pub fn enable_mousemove(&self) -> bool
        {
                self.claim(Capability::Mousemove)
        }

        pub fn enable_drag(&self) -> bool
        {
                self.claim(Capability::Drag)
        }

        /// `debounce` delays `global:resize` until input has been quiet for
        /// that long.
        pub fn enable_resize(
                &self,
                debounce: Option<Duration>,
        ) -> bool
        {
                if !self.claim(Capability::Resize)
                {
                        return false;
                }

                *self.resize_debounce.borrow_mut() = debounce.map(Debouncer::new);
                true
        }

        /// Starts emitting `global:raf`.
        ///
        /// [`FrameMode::Native`] returns the handle that stops the loop.
        pub fn enable_raf(
                self: &Rc<Self>,
                mode: FrameMode,
                ticker: &Ticker,
        ) -> Option<RafHandle>
        {
                if !self.claim(Capability::Raf)
                {
                        return self.raf_handle();
                }

                let driver = match mode
                {
                        FrameMode::Native => FrameDriver::Native(Rc::new(FrameLoop::new())),
                        FrameMode::Ticker =>
                        {
                                let global = Rc::downgrade(self);
                                FrameDriver::Ticker(ticker.add(move |time| match global.upgrade()
                                {
                                        Some(global) => global.emit_frame(time),
                                        None => Ok(()),
                                }))
                        }
                };

                *self.frame_driver.borrow_mut() = Some(driver);
                self.raf_handle()
        }

        pub fn raf_handle(&self) -> Option<RafHandle>
        {
                match self.frame_driver.borrow().as_ref()
                {
                        Some(FrameDriver::Native(frame_loop)) => Some(frame_loop.handle()),
                        _ => None,
                }
        }

        /// Drives the native frame loop and flushes a debounced resize.
        ///
        /// Returns whether another frame should be requested.
        pub fn tick(
                &self,
                time: f64,
                now: Instant,
        ) -> anyhow::Result<bool>
        {
                self.poll(now)?;

                let frame_loop = match self.frame_driver.borrow().as_ref()
                {
                        Some(FrameDriver::Native(frame_loop)) => frame_loop.clone(),
                        Some(FrameDriver::Ticker(_)) => return Ok(true),
                        None => return Ok(false),
                };

                frame_loop.tick(time, |time| self.emit_frame(time))
        }

        pub fn emit_frame(
                &self,
                time: f64,
        ) -> anyhow::Result<()>
        {
                self.bus.emit(events::RAF, &Payload::Frame(time))
        }

        /// Feeds one raw input through the enabled capabilities.
        pub fn handle(
                &self,
                input: RawInput,
                now: Instant,
        ) -> anyhow::Result<()>
        {
                match input
                {
                        RawInput::Move { kind, position } if self.is_enabled(Capability::Mousemove) =>
                        {
                                self.pointer_moved(kind, position)
                        }
                        RawInput::Down { kind, position } if self.is_enabled(Capability::Drag) =>
                        {
                                self.pointer_down(kind, position)
                        }
                        RawInput::Up { kind, position } if self.is_enabled(Capability::Drag) =>
                        {
                                self.pointer_up(kind, position)
                        }
                        RawInput::Resize(viewport) if self.is_enabled(Capability::Resize) =>
                        {
                                let debounced = match self.resize_debounce.borrow_mut().as_mut()
                                {
                                        Some(debouncer) =>
                                        {
                                                debouncer.schedule(now, viewport);
                                                true
                                        }
                                        None => false,
                                };

                                if debounced { Ok(()) } else { self.resized(viewport) }
                        }
                        _ => Ok(()),
                }
        }

        /// Emits a pending debounced resize once its delay has elapsed.
        pub fn poll(
                &self,
                now: Instant,
        ) -> anyhow::Result<()>
        {
                let ready = self.resize_debounce.borrow_mut().as_mut().and_then(|debouncer| debouncer.poll(now));

                match ready
                {
                        Some(viewport) => self.resized(viewport),
                        None => Ok(()),
                }
        }

        pub fn drag_session(&self) -> DragSession
        {
                self.drag.get()
        }

        fn mark_touch(&self)
        {
                let mut store = self.store.borrow_mut();

                if !store.is_touch
                {
                        store.is_touch = true;
                        platform::add_root_class("is-touch");
                }
        }

        fn pointer_moved(
                &self,
                kind: PointerKind,
                position: Vector2<f32>,
        ) -> anyhow::Result<()>
        {
                if kind == PointerKind::Touch
                {
                        self.mark_touch();
                }

                let pointer = {
                        let mut store = self.store.borrow_mut();
                        let viewport = store.viewport;
                        store.pointer.update(kind, position, &viewport);
                        store.pointer
                };

                let (move_event, drag_event) = match kind
                {
                        PointerKind::Mouse => (events::MOUSEMOVE, events::MOUSEDRAG),
                        PointerKind::Touch => (events::TOUCHMOVE, events::TOUCHDRAG),
                };

                self.bus.emit(move_event, &Payload::Pointer(pointer))?;

                if pointer.is_dragging
                {
                        let mut drag = self.drag.get();
                        let delta = drag.delta(position);

                        self.bus.emit(drag_event, &Payload::Drag(pointer, delta))?;

                        drag.advance(position);
                        self.drag.set(drag);
                }

                Ok(())
        }

        fn pointer_down(
                &self,
                kind: PointerKind,
                position: Vector2<f32>,
        ) -> anyhow::Result<()>
        {
                self.pointer_moved(kind, position)?;

                let pointer = {
                        let mut store = self.store.borrow_mut();
                        store.pointer.is_dragging = true;
                        store.pointer
                };

                self.drag.set(DragSession::start(pointer.position));
                self.bus.emit(events::POINTERDOWN, &Payload::Pointer(pointer))
        }

        fn pointer_up(
                &self,
                kind: PointerKind,
                position: Vector2<f32>,
        ) -> anyhow::Result<()>
        {
                self.store.borrow_mut().pointer.is_dragging = false;
                self.pointer_moved(kind, position)?;
                self.drag.set(DragSession::default());

                let pointer = self.store.borrow().pointer;
                self.bus.emit(events::POINTERUP, &Payload::Pointer(pointer))
        }

        fn resized(
                &self,
                viewport: Viewport,
        ) -> anyhow::Result<()>
        {
                let vh = format!("{}px", viewport.height);
                platform::set_css_property("--vh", &vh);

                {
                        let mut store = self.store.borrow_mut();
                        store.viewport = viewport;
                        store.vh = vh;
                }

                self.bus.emit(events::RESIZE, &Payload::Resize(viewport))
        }
}

#[cfg(test)]
mod tests
{
        use super::*;
        use crate::tween::TweenEngine;

        struct Fixture
        {
                bus: EventBus,
                store: Rc<RefCell<InputStore>>,
                events: Rc<GlobalEvents>,
                log: Rc<RefCell<Vec<(String, Payload)>>>,
                _subs: Vec<events::Subscription>,
        }

        fn fixture() -> Fixture
        {
                let bus = EventBus::new();
                let store = Rc::new(RefCell::new(InputStore::new(Viewport::new(800.0, 600.0, 1.0))));
                let global = Rc::new(GlobalEvents::new(bus.clone(), store.clone()));
                let log = Rc::new(RefCell::new(Vec::new()));

                let names = [
                        events::MOUSEMOVE,
                        events::TOUCHMOVE,
                        events::MOUSEDRAG,
                        events::TOUCHDRAG,
                        events::POINTERDOWN,
                        events::POINTERUP,
                        events::RESIZE,
                        events::RAF,
                ];
                let subs = names
                        .into_iter()
                        .map(|name| {
                                let log = log.clone();
                                bus.on(name, move |payload| {
                                        log.borrow_mut().push((name.to_string(), payload.clone()));
                                        Ok(())
                                })
                        })
                        .collect();

                Fixture {
                        bus,
                        store,
                        events: global,
                        log,
                        _subs: subs,
                }
        }

        impl Fixture
        {
                fn names(&self) -> Vec<String>
                {
                        self.log.borrow().iter().map(|(name, _)| name.clone()).collect()
                }

                fn send(
                        &self,
                        input: RawInput,
                )
                {
                        self.events.handle(input, Instant::now()).unwrap();
                }
        }

        fn mouse(
                x: f32,
                y: f32,
        ) -> (PointerKind, Vector2<f32>)
        {
                (PointerKind::Mouse, Vector2::new(x, y))
        }

        #[test]
        fn enabling_twice_is_a_no_op()
        {
                let f = fixture();

                assert!(f.events.enable_mousemove());
                assert!(!f.events.enable_mousemove());
                assert!(f.events.enable_resize(None));
                assert!(!f.events.enable_resize(Some(Duration::from_millis(10))));
                assert!(f.events.is_enabled(Capability::Mousemove));
                assert!(!f.events.is_enabled(Capability::Drag));
        }

        #[test]
        fn inputs_for_disabled_capabilities_are_ignored()
        {
                let f = fixture();
                let (kind, position) = mouse(1.0, 1.0);

                f.send(RawInput::Move { kind, position });
                f.send(RawInput::Down { kind, position });

                assert!(f.log.borrow().is_empty());
        }

        #[test]
        fn mouse_and_touch_moves_emit_distinct_events()
        {
                let f = fixture();
                f.events.enable_mousemove();

                f.send(RawInput::Move {
                        kind: PointerKind::Mouse,
                        position: Vector2::new(400.0, 300.0),
                });
                f.send(RawInput::Move {
                        kind: PointerKind::Touch,
                        position: Vector2::new(0.0, 0.0),
                });

                assert_eq!(f.names(), vec![events::MOUSEMOVE, events::TOUCHMOVE]);

                let store = f.store.borrow();
                assert!(store.is_touch);
                assert_eq!(store.pointer.gl_normalized, Vector2::new(-1.0, 1.0));
        }

        #[test]
        fn drag_emits_deltas_against_previous_position()
        {
                let f = fixture();
                f.events.enable_mousemove();
                f.events.enable_drag();

                let kind = PointerKind::Mouse;
                f.send(RawInput::Down {
                        kind,
                        position: Vector2::new(100.0, 100.0),
                });
                f.send(RawInput::Move {
                        kind,
                        position: Vector2::new(110.0, 95.0),
                });
                f.send(RawInput::Move {
                        kind,
                        position: Vector2::new(112.0, 95.0),
                });

                assert_eq!(
                        f.names(),
                        vec![
                                events::MOUSEMOVE,
                                events::POINTERDOWN,
                                events::MOUSEMOVE,
                                events::MOUSEDRAG,
                                events::MOUSEMOVE,
                                events::MOUSEDRAG,
                        ]
                );

                let deltas: Vec<_> = f.log.borrow().iter().filter_map(|(_, payload)| payload.drag().copied()).collect();
                assert_eq!((deltas[0].delta_x, deltas[0].delta_y), (10.0, -5.0));
                assert_eq!((deltas[1].delta_x, deltas[1].delta_y), (2.0, 0.0));
                assert_eq!((deltas[1].start_x, deltas[1].start_y), (100.0, 100.0));
        }

        #[test]
        fn pointer_drag_registration_hears_mouse_and_touch()
        {
                let f = fixture();
                f.events.enable_mousemove();
                f.events.enable_drag();

                let dragged = Rc::new(RefCell::new(Vec::new()));
                let sink = dragged.clone();
                let _drag = f.bus.on(events::POINTERDRAG, move |payload| {
                        if let Some(pointer) = payload.pointer()
                        {
                                sink.borrow_mut().push((pointer.kind, pointer.position));
                        }
                        Ok(())
                });

                for (kind, from, to) in [
                        (PointerKind::Mouse, Vector2::new(0.0, 0.0), Vector2::new(5.0, 0.0)),
                        (PointerKind::Touch, Vector2::new(10.0, 10.0), Vector2::new(12.0, 14.0)),
                ]
                {
                        f.send(RawInput::Down { kind, position: from });
                        f.send(RawInput::Move { kind, position: to });
                        f.send(RawInput::Up { kind, position: to });
                }

                assert_eq!(
                        *dragged.borrow(),
                        vec![
                                (PointerKind::Mouse, Vector2::new(5.0, 0.0)),
                                (PointerKind::Touch, Vector2::new(12.0, 14.0)),
                        ]
                );
        }

        #[test]
        fn pointer_down_then_up_resets_the_drag_session()
        {
                let f = fixture();
                f.events.enable_mousemove();
                f.events.enable_drag();

                let (kind, position) = mouse(250.0, 80.0);
                f.send(RawInput::Down { kind, position });
                assert_eq!(f.events.drag_session(), DragSession::start(position));
                assert!(f.store.borrow().pointer.is_dragging);

                f.send(RawInput::Up { kind, position });

                assert_eq!(f.events.drag_session(), DragSession::default());
                assert!(!f.store.borrow().pointer.is_dragging);
                assert_eq!(
                        f.names(),
                        vec![events::MOUSEMOVE, events::POINTERDOWN, events::MOUSEMOVE, events::POINTERUP]
                );
        }

        #[test]
        fn resize_updates_store_and_vh()
        {
                let f = fixture();
                f.events.enable_resize(None);

                f.send(RawInput::Resize(Viewport::new(1024.0, 768.0, 2.0)));

                let store = f.store.borrow();
                assert_eq!(store.viewport, Viewport::new(1024.0, 768.0, 2.0));
                assert_eq!(store.vh, "768px");
                assert_eq!(f.names(), vec![events::RESIZE]);
        }

        #[test]
        fn debounced_resize_emits_only_the_last_size()
        {
                let f = fixture();
                f.events.enable_resize(Some(Duration::from_millis(100)));

                let start = Instant::now();
                f.events.handle(RawInput::Resize(Viewport::new(500.0, 500.0, 1.0)), start).unwrap();
                f.events
                        .handle(
                                RawInput::Resize(Viewport::new(600.0, 400.0, 1.0)),
                                start + Duration::from_millis(50),
                        )
                        .unwrap();

                f.events.poll(start + Duration::from_millis(100)).unwrap();
                assert!(f.log.borrow().is_empty());

                f.events.poll(start + Duration::from_millis(160)).unwrap();
                assert_eq!(f.names(), vec![events::RESIZE]);
                assert_eq!(f.store.borrow().viewport.width, 600.0);
        }

        #[test]
        fn native_frame_loop_stops_through_its_handle()
        {
                let f = fixture();
                let tweens = TweenEngine::new();

                let handle = f.events.enable_raf(FrameMode::Native, tweens.ticker()).unwrap();

                assert!(f.events.tick(0.1, Instant::now()).unwrap());
                handle.stop();
                assert!(!f.events.tick(0.2, Instant::now()).unwrap());

                assert_eq!(f.names(), vec![events::RAF]);
                assert_eq!(f.log.borrow()[0].1, Payload::Frame(0.1));
        }

        #[test]
        fn ticker_mode_emits_on_every_tick()
        {
                let f = fixture();
                let tweens = TweenEngine::new();

                assert!(f.events.enable_raf(FrameMode::Ticker, tweens.ticker()).is_none());
                assert!(f.events.enable_raf(FrameMode::Native, tweens.ticker()).is_none());

                tweens.tick(1.0).unwrap();
                tweens.tick(2.0).unwrap();

                assert_eq!(f.names(), vec![events::RAF, events::RAF]);
                assert_eq!(tweens.ticker().len(), 1);
        }
}
