//! Minimal tween engine: eased interpolation of 2D targets plus the ticker
//! that paces it.

use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;
use std::str::FromStr;

use cgmath::Vector2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EaseDirection
{
        In,
        Out,
        InOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease
{
        Linear,
        /// `power0` is linear, `power1` quadratic and so on.
        Power(u8, EaseDirection),
        Expo(EaseDirection),
        Sine(EaseDirection),
}

impl Ease
{
        pub fn apply(
                &self,
                t: f64,
        ) -> f64
        {
                let t = t.clamp(0.0, 1.0);

                match *self
                {
                        Ease::Linear => t,
                        Ease::Power(power, direction) =>
                        {
                                let exponent = i32::from(power) + 1;
                                directed(direction, t, |t| t.powi(exponent))
                        }
                        Ease::Expo(direction) =>
                        {
                                directed(direction, t, |t| if t == 0.0 { 0.0 } else { 2f64.powf(10.0 * (t - 1.0)) })
                        }
                        Ease::Sine(direction) => directed(direction, t, |t| 1.0 - (t * PI / 2.0).cos()),
                }
        }
}

/// Builds out/in-out variants from an ease-in curve.
fn directed<F>(
        direction: EaseDirection,
        t: f64,
        ease_in: F,
) -> f64
where
        F: Fn(f64) -> f64,
{
        match direction
        {
                EaseDirection::In => ease_in(t),
                EaseDirection::Out => 1.0 - ease_in(1.0 - t),
                EaseDirection::InOut =>
                {
                        if t < 0.5
                        {
                                ease_in(t * 2.0) / 2.0
                        }
                        else
                        {
                                1.0 - ease_in((1.0 - t) * 2.0) / 2.0
                        }
                }
        }
}

impl FromStr for Ease
{
        type Err = anyhow::Error;

        /// Parses names such as `expo.out`, `power2.inOut` or `linear`.
        /// A missing direction means `out`.
        fn from_str(name: &str) -> Result<Self, Self::Err>
        {
                let (family, direction) = name.split_once('.').unwrap_or((name, "out"));

                let direction = match direction
                {
                        "in" => EaseDirection::In,
                        "out" => EaseDirection::Out,
                        "inOut" => EaseDirection::InOut,
                        other => anyhow::bail!("unknown ease direction `{other}` in `{name}`"),
                };

                match family
                {
                        "linear" | "none" | "power0" => Ok(Ease::Linear),
                        "expo" => Ok(Ease::Expo(direction)),
                        "sine" => Ok(Ease::Sine(direction)),
                        "quad" => Ok(Ease::Power(1, direction)),
                        "cubic" => Ok(Ease::Power(2, direction)),
                        _ => match family.strip_prefix("power").map(str::parse::<u8>)
                        {
                                Some(Ok(power)) => Ok(Ease::Power(power, direction)),
                                _ => anyhow::bail!("unknown ease `{name}`"),
                        },
                }
        }
}

/// Destination values; `None` leaves that axis alone.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TweenVars
{
        pub x: Option<f32>,
        pub y: Option<f32>,
}

#[derive(Debug)]
struct Tween
{
        target: Rc<RefCell<Vector2<f32>>>,
        from: Vector2<f32>,
        vars: TweenVars,
        start: f64,
        duration: f64,
        ease: Ease,
}

impl Tween
{
        /// Writes the interpolated values and reports whether the tween ended.
        fn advance(
                &self,
                time: f64,
        ) -> bool
        {
                let progress = if self.duration > 0.0 { (time - self.start) / self.duration } else { 1.0 };
                let eased = self.ease.apply(progress) as f32;

                let mut target = self.target.borrow_mut();

                if let Some(x) = self.vars.x
                {
                        target.x = self.from.x + (x - self.from.x) * eased;
                }

                if let Some(y) = self.vars.y
                {
                        target.y = self.from.y + (y - self.from.y) * eased;
                }

                progress >= 1.0
        }
}

pub type TickerFn = Rc<RefCell<dyn FnMut(f64) -> anyhow::Result<()>>>;

/// Listeners notified after every tween update.
#[derive(Default)]
pub struct Ticker
{
        next_id: Cell<u64>,
        listeners: RefCell<Vec<(u64, TickerFn)>>,
}

impl Ticker
{
        pub fn add<F>(
                &self,
                listener: F,
        ) -> u64
        where
                F: FnMut(f64) -> anyhow::Result<()> + 'static,
        {
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                self.listeners.borrow_mut().push((id, Rc::new(RefCell::new(listener))));
                id
        }

        pub fn remove(
                &self,
                id: u64,
        )
        {
                self.listeners.borrow_mut().retain(|(listener, _)| *listener != id);
        }

        pub fn len(&self) -> usize
        {
                self.listeners.borrow().len()
        }

        pub fn is_empty(&self) -> bool
        {
                self.listeners.borrow().is_empty()
        }

        fn fire(
                &self,
                time: f64,
        ) -> anyhow::Result<()>
        {
                let listeners: Vec<TickerFn> =
                        self.listeners.borrow().iter().map(|(_, listener)| listener.clone()).collect();

                for listener in listeners
                {
                        let mut listener = listener
                                .try_borrow_mut()
                                .map_err(|_| anyhow::anyhow!("ticker listener re-entered at t={time}"))?;

                        (&mut *listener)(time)?;
                }

                Ok(())
        }
}

#[derive(Default)]
pub struct TweenEngine
{
        time: Cell<f64>,
        tweens: RefCell<Vec<Tween>>,
        ticker: Ticker,
}

impl std::fmt::Debug for TweenEngine
{
        fn fmt(
                &self,
                f: &mut std::fmt::Formatter<'_>,
        ) -> std::fmt::Result
        {
                f.debug_struct("TweenEngine")
                        .field("time", &self.time.get())
                        .field("active", &self.tweens.borrow().len())
                        .field("ticker_listeners", &self.ticker.len())
                        .finish()
        }
}

impl TweenEngine
{
        pub fn new() -> Self
        {
                Self::default()
        }

        pub fn ticker(&self) -> &Ticker
        {
                &self.ticker
        }

        pub fn time(&self) -> f64
        {
                self.time.get()
        }

        /// Animates `target` towards `vars`, starting from its current value.
        ///
        /// A tween already running on the same target is replaced.
        pub fn to(
                &self,
                target: &Rc<RefCell<Vector2<f32>>>,
                vars: TweenVars,
                duration: f64,
                ease: Ease,
        )
        {
                let mut tweens = self.tweens.borrow_mut();
                tweens.retain(|tween| !Rc::ptr_eq(&tween.target, target));

                let from = *target.borrow();
                tweens.push(Tween {
                        target: target.clone(),
                        from,
                        vars,
                        start: self.time.get(),
                        duration,
                        ease,
                });
        }

        pub fn is_tweening(
                &self,
                target: &Rc<RefCell<Vector2<f32>>>,
        ) -> bool
        {
                self.tweens.borrow().iter().any(|tween| Rc::ptr_eq(&tween.target, target))
        }

        pub fn active(&self) -> usize
        {
                self.tweens.borrow().len()
        }

        /// Advances every tween to `time` (seconds) then notifies the ticker.
        pub fn tick(
                &self,
                time: f64,
        ) -> anyhow::Result<()>
        {
                self.time.set(time);
                self.tweens.borrow_mut().retain(|tween| !tween.advance(time));
                self.ticker.fire(time)
        }
}
