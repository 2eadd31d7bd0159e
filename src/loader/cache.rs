use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use super::LoadError;

/// A load that any number of callers can await; all of them see the same
/// result.
pub type SharedLoad<T> = Shared<LocalBoxFuture<'static, Result<T, LoadError>>>;

/// Single-flight memo of loads keyed by resource identity.
///
/// The first request for a key creates the future, later requests get a
/// clone of it, resolved or not. Entries live as long as the cache.
pub struct MemoCache<K, V>
where
        V: Clone + 'static,
{
        entries: RefCell<HashMap<K, SharedLoad<V>>>,
}

impl<K, V> Default for MemoCache<K, V>
where
        V: Clone + 'static,
{
        fn default() -> Self
        {
                Self {
                        entries: RefCell::new(HashMap::new()),
                }
        }
}

impl<K, V> MemoCache<K, V>
where
        K: Eq + Hash,
        V: Clone + 'static,
{
        pub fn new() -> Self
        {
                Self::default()
        }

        /// Returns the load for `key`, calling `start` only if there is none.
        ///
        /// The flag is `true` when this call created the entry.
        pub fn get_or_start<F, Fut>(
                &self,
                key: K,
                start: F,
        ) -> (SharedLoad<V>, bool)
        where
                F: FnOnce() -> Fut,
                Fut: Future<Output = Result<V, LoadError>> + 'static,
        {
                if let Some(existing) = self.entries.borrow().get(&key)
                {
                        return (existing.clone(), false);
                }

                let load = start().boxed_local().shared();
                self.entries.borrow_mut().insert(key, load.clone());

                (load, true)
        }

        pub fn get(
                &self,
                key: &K,
        ) -> Option<SharedLoad<V>>
        {
                self.entries.borrow().get(key).cloned()
        }

        /// The outcome for `key` if its load has already finished.
        pub fn peek(
                &self,
                key: &K,
        ) -> Option<Result<V, LoadError>>
        {
                self.entries.borrow().get(key).and_then(|load| load.peek().cloned())
        }

        pub fn len(&self) -> usize
        {
                self.entries.borrow().len()
        }

        pub fn is_empty(&self) -> bool
        {
                self.entries.borrow().is_empty()
        }
}

#[cfg(test)]
mod tests
{
        use std::cell::Cell;
        use std::rc::Rc;

        use futures::channel::oneshot;
        use futures::executor::block_on;

        use super::*;

        #[test]
        fn second_request_shares_the_first_future()
        {
                let cache: MemoCache<String, u32> = MemoCache::new();
                let starts = Rc::new(Cell::new(0));

                let (tx, rx) = oneshot::channel::<u32>();
                let counter = starts.clone();
                let (first, created) = cache.get_or_start("a".to_string(), move || {
                        counter.set(counter.get() + 1);
                        async move { rx.await.map_err(|_| LoadError::Cancelled { url: "a".into() }) }
                });
                assert!(created);

                let counter = starts.clone();
                let (second, created) = cache.get_or_start("a".to_string(), move || {
                        counter.set(counter.get() + 1);
                        async { Ok(0) }
                });

                assert!(!created);
                assert!(first.ptr_eq(&second));
                assert_eq!(starts.get(), 1);

                tx.send(7).unwrap();
                assert_eq!(block_on(second), Ok(7));
                assert_eq!(block_on(first), Ok(7));
                assert_eq!(cache.peek(&"a".to_string()), Some(Ok(7)));
        }

        #[test]
        fn failures_are_remembered()
        {
                let cache: MemoCache<&'static str, u32> = MemoCache::new();

                let (load, _) = cache.get_or_start("missing", || async {
                        Err(LoadError::Http {
                                url: "missing".into(),
                                status: 404,
                        })
                });
                assert!(block_on(load).is_err());

                let (again, created) = cache.get_or_start("missing", || async { Ok(1) });
                assert!(!created);
                assert!(block_on(again).is_err());
        }

        #[test]
        fn peek_is_empty_while_pending()
        {
                let cache: MemoCache<u8, u8> = MemoCache::new();
                let (_tx, rx) = oneshot::channel::<u8>();

                let _ = cache.get_or_start(1, move || async move {
                        rx.await.map_err(|_| LoadError::Cancelled { url: "1".into() })
                });

                assert_eq!(cache.peek(&1), None);
                assert_eq!(cache.len(), 1);
        }
}
