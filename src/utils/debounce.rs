use instant::{Duration, Instant};

/// Trailing-edge debounce over a polled clock.
///
/// Every [`schedule`](Debouncer::schedule) pushes the deadline out by
/// `delay` and replaces the pending value; [`poll`](Debouncer::poll)
/// yields the latest value once the deadline has passed.
#[derive(Debug)]
pub struct Debouncer<T>
{
        delay: Duration,
        pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T>
{
        pub fn new(delay: Duration) -> Self
        {
                Self {
                        delay,
                        pending: None,
                }
        }

        pub fn delay(&self) -> Duration
        {
                self.delay
        }

        pub fn schedule(
                &mut self,
                now: Instant,
                value: T,
        )
        {
                self.pending = Some((now + self.delay, value));
        }

        pub fn is_pending(&self) -> bool
        {
                self.pending.is_some()
        }

        pub fn poll(
                &mut self,
                now: Instant,
        ) -> Option<T>
        {
                match &self.pending
                {
                        Some((deadline, _)) if *deadline <= now => self.pending.take().map(|(_, v)| v),
                        _ => None,
                }
        }
}

#[cfg(test)]
mod tests
{
        use super::*;

        #[test]
        fn nothing_fires_before_the_deadline()
        {
                let start = Instant::now();
                let mut debouncer = Debouncer::new(Duration::from_millis(100));

                debouncer.schedule(start, 1);

                assert_eq!(debouncer.poll(start + Duration::from_millis(50)), None);
                assert!(debouncer.is_pending());
        }

        #[test]
        fn latest_value_wins_on_trailing_edge()
        {
                let start = Instant::now();
                let mut debouncer = Debouncer::new(Duration::from_millis(100));

                debouncer.schedule(start, 1);
                debouncer.schedule(start + Duration::from_millis(80), 2);

                // The second schedule pushed the deadline to 180ms.
                assert_eq!(debouncer.poll(start + Duration::from_millis(120)), None);
                assert_eq!(debouncer.poll(start + Duration::from_millis(180)), Some(2));
                assert_eq!(debouncer.poll(start + Duration::from_millis(500)), None);
        }
}
