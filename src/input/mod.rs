pub mod frame_loop;
pub mod global_events;
pub mod mapper;
pub mod pointer;

pub use frame_loop::{FrameLoop, RafHandle};
pub use global_events::{Capability, GlobalEvents};
pub use mapper::{InputMapper, RawInput};
pub use pointer::{DragDelta, DragSession, InputStore, PointerKind, PointerState, Viewport};
