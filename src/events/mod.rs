//! Named-event publish/subscribe.
//!
//! Every normalized input and timing signal in the crate travels through an
//! [`EventBus`] under one of the names below.

pub mod bus;
pub mod payload;

pub use bus::{EventBus, ListenerOptions, Scope, ScopedEmitter, Subscription};
pub use payload::Payload;

pub const MOUSEMOVE: &str = "global:mousemove";
pub const TOUCHMOVE: &str = "global:touchmove";
pub const MOUSEDRAG: &str = "global:mousedrag";
pub const TOUCHDRAG: &str = "global:touchdrag";

/// Registration string covering mouse and touch movement.
pub const POINTERMOVE: &str = "global:mousemove global:touchmove";

/// Registration string covering mouse and touch drags.
pub const POINTERDRAG: &str = "global:touchdrag global:mousedrag";

pub const POINTERDOWN: &str = "global:pointerdown";
pub const POINTERUP: &str = "global:pointerup";
pub const RAF: &str = "global:raf";
pub const RESIZE: &str = "global:resize";
