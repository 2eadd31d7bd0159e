use std::cell::RefCell;
use std::rc::Rc;

use crate::events::{self, EventBus, Payload, Subscription};

pub type FrameCallback = Rc<RefCell<dyn FnMut(f64) -> anyhow::Result<()>>>;

/// Wraps a closure so it can be registered and later removed by identity.
pub fn frame_callback<F>(callback: F) -> FrameCallback
where
        F: FnMut(f64) -> anyhow::Result<()> + 'static,
{
        Rc::new(RefCell::new(callback))
}

struct Entry
{
        priority: i32,
        callback: FrameCallback,
}

/// Per-frame callback registry, fired in ascending priority.
///
/// Equal priorities keep their insertion order.
#[derive(Default)]
pub struct FrameScheduler
{
        entries: RefCell<Vec<Entry>>,
}

impl std::fmt::Debug for FrameScheduler
{
        fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
        ) -> std::fmt::Result
        {
                let priorities: Vec<i32> = self.entries.borrow().iter().map(|entry| entry.priority).collect();
                f.debug_struct("FrameScheduler").field("priorities", &priorities).finish()
        }
}

impl FrameScheduler
{
        pub fn new() -> Self
        {
                Self::default()
        }

        pub fn add(
                &self,
                callback: FrameCallback,
                priority: i32,
        )
        {
                let mut entries = self.entries.borrow_mut();
                entries.push(Entry { priority, callback });
                entries.sort_by_key(|entry| entry.priority);
        }

        /// Removes every registration of `callback`.
        pub fn remove(
                &self,
                callback: &FrameCallback,
        )
        {
                self.entries
                        .borrow_mut()
                        .retain(|entry| !std::ptr::addr_eq(Rc::as_ptr(&entry.callback), Rc::as_ptr(callback)));
        }

        /// Runs the callbacks registered when the frame started.
        ///
        /// The first error stops the frame and is returned.
        pub fn fire(
                &self,
                time: f64,
        ) -> anyhow::Result<()>
        {
                let callbacks: Vec<FrameCallback> =
                        self.entries.borrow().iter().map(|entry| entry.callback.clone()).collect();

                for callback in callbacks
                {
                        let mut callback = callback
                                .try_borrow_mut()
                                .map_err(|_| anyhow::anyhow!("frame callback re-entered at t={time}"))?;

                        (&mut *callback)(time)?;
                }

                Ok(())
        }

        pub fn len(&self) -> usize
        {
                self.entries.borrow().len()
        }

        pub fn is_empty(&self) -> bool
        {
                self.entries.borrow().is_empty()
        }

        /// Fires on every `global:raf` emitted on `bus`.
        pub fn attach(
                self: &Rc<Self>,
                bus: &EventBus,
        ) -> Subscription
        {
                let scheduler = Rc::downgrade(self);

                bus.on(events::RAF, move |payload: &Payload| {
                        match (scheduler.upgrade(), payload.frame_time())
                        {
                                (Some(scheduler), Some(time)) => scheduler.fire(time),
                                _ => Ok(()),
                        }
                })
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        fn tagged(
                log: &Rc<RefCell<Vec<&'static str>>>,
                tag: &'static str,
        ) -> FrameCallback
        {
                let log = log.clone();
                frame_callback(move |_| {
                        log.borrow_mut().push(tag);
                        Ok(())
                })
        }

        #[test]
        fn fires_in_ascending_priority()
        {
                let frames = FrameScheduler::new();
                let log = Rc::new(RefCell::new(Vec::new()));

                frames.add(tagged(&log, "render"), 99);
                frames.add(tagged(&log, "tasks"), 0);
                frames.add(tagged(&log, "globe"), 10);
                frames.add(tagged(&log, "late"), -5);

                frames.fire(0.0).unwrap();

                assert_eq!(*log.borrow(), vec!["late", "tasks", "globe", "render"]);
        }

        #[test]
        fn equal_priorities_keep_insertion_order()
        {
                let frames = FrameScheduler::new();
                let log = Rc::new(RefCell::new(Vec::new()));

                frames.add(tagged(&log, "first"), 1);
                frames.add(tagged(&log, "zero"), 0);
                frames.add(tagged(&log, "second"), 1);
                frames.add(tagged(&log, "third"), 1);

                frames.fire(0.0).unwrap();

                assert_eq!(*log.borrow(), vec!["zero", "first", "second", "third"]);
        }

        #[test]
        fn remove_drops_every_registration_of_a_callback()
        {
                let frames = FrameScheduler::new();
                let log = Rc::new(RefCell::new(Vec::new()));
                let twice = tagged(&log, "twice");

                frames.add(twice.clone(), 1);
                frames.add(tagged(&log, "other"), 2);
                frames.add(twice.clone(), 3);
                frames.remove(&twice);

                frames.fire(0.0).unwrap();

                assert_eq!(frames.len(), 1);
                assert_eq!(*log.borrow(), vec!["other"]);
        }

        #[test]
        fn failing_callback_aborts_the_frame()
        {
                let frames = FrameScheduler::new();
                let log = Rc::new(RefCell::new(Vec::new()));

                frames.add(tagged(&log, "before"), 0);
                frames.add(frame_callback(|_| anyhow::bail!("lost context")), 1);
                frames.add(tagged(&log, "after"), 2);

                assert!(frames.fire(0.0).is_err());
                assert_eq!(*log.borrow(), vec!["before"]);
        }

        #[test]
        fn callback_added_during_a_frame_waits_for_the_next()
        {
                let frames = Rc::new(FrameScheduler::new());
                let log = Rc::new(RefCell::new(Vec::new()));

                let late = tagged(&log, "late");
                let handle = Rc::downgrade(&frames);
                frames.add(
                        frame_callback(move |_| {
                                if let Some(frames) = handle.upgrade()
                                {
                                        if frames.len() == 1
                                        {
                                                frames.add(late.clone(), 5);
                                        }
                                }
                                Ok(())
                        }),
                        0,
                );

                frames.fire(0.0).unwrap();
                assert!(log.borrow().is_empty());

                frames.fire(1.0).unwrap();
                assert_eq!(*log.borrow(), vec!["late"]);
        }

        #[test]
        fn attached_scheduler_follows_raf_events()
        {
                let bus = EventBus::new();
                let frames = Rc::new(FrameScheduler::new());
                let times = Rc::new(RefCell::new(Vec::new()));

                let sink = times.clone();
                frames.add(
                        frame_callback(move |time| {
                                sink.borrow_mut().push(time);
                                Ok(())
                        }),
                        0,
                );

                let _raf = frames.attach(&bus);
                bus.emit(events::RAF, &Payload::Frame(0.5)).unwrap();
                bus.emit(events::RAF, &Payload::Frame(0.75)).unwrap();

                assert_eq!(*times.borrow(), vec![0.5, 0.75]);
        }
}
