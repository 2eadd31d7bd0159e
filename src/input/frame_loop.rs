use std::cell::Cell;
use std::rc::Rc;

/// Stops a [`FrameLoop`] from outside.
#[derive(Debug, Clone)]
pub struct RafHandle
{
        running: Rc<Cell<bool>>,
}

impl RafHandle
{
        pub fn stop(&self)
        {
                self.running.set(false);
        }

        pub fn is_running(&self) -> bool
        {
                self.running.get()
        }
}

/// Repeating frame task with a stop flag checked on every iteration.
///
/// Each [`FrameLoop::tick`] reports whether another frame should be
/// requested; once stopped it never runs its body again.
#[derive(Debug)]
pub struct FrameLoop
{
        running: Rc<Cell<bool>>,
        frames: Cell<u64>,
}

impl Default for FrameLoop
{
        fn default() -> Self
        {
                Self::new()
        }
}

impl FrameLoop
{
        pub fn new() -> Self
        {
                Self {
                        running: Rc::new(Cell::new(true)),
                        frames: Cell::new(0),
                }
        }

        pub fn handle(&self) -> RafHandle
        {
                RafHandle {
                        running: self.running.clone(),
                }
        }

        pub fn frames(&self) -> u64
        {
                self.frames.get()
        }

        pub fn tick<F>(
                &self,
                time: f64,
                body: F,
        ) -> anyhow::Result<bool>
        where
                F: FnOnce(f64) -> anyhow::Result<()>,
        {
                if !self.running.get()
                {
                        return Ok(false);
                }

                self.frames.set(self.frames.get() + 1);
                body(time)?;

                Ok(self.running.get())
        }
}
