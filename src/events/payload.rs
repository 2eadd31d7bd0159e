use crate::input::{DragDelta, PointerState, Viewport};

/// Values carried by an emitted event.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload
{
        None,
        Pointer(PointerState),
        Drag(PointerState, DragDelta),
        Resize(Viewport),
        /// Frame time in seconds.
        Frame(f64),
        Progress
        {
                percent: u32,
        },
}

impl Payload
{
        pub fn frame_time(&self) -> Option<f64>
        {
                match self
                {
                        Payload::Frame(time) => Some(*time),
                        _ => None,
                }
        }

        pub fn pointer(&self) -> Option<&PointerState>
        {
                match self
                {
                        Payload::Pointer(pointer) | Payload::Drag(pointer, _) => Some(pointer),
                        _ => None,
                }
        }

        pub fn drag(&self) -> Option<&DragDelta>
        {
                match self
                {
                        Payload::Drag(_, delta) => Some(delta),
                        _ => None,
                }
        }

        pub fn viewport(&self) -> Option<Viewport>
        {
                match self
                {
                        Payload::Resize(viewport) => Some(*viewport),
                        _ => None,
                }
        }

        pub fn percent(&self) -> Option<u32>
        {
                match self
                {
                        Payload::Progress { percent } => Some(*percent),
                        _ => None,
                }
        }
}
