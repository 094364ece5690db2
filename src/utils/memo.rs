use super::Result;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

#[derive(Debug)]
enum Cached<T> {
    Unbuilt,
    Built(Arc<T>),
}

/// A value computed on first request and published whole.
///
/// Readers see either nothing or the finished value. Builds are serialized so
/// the value is computed at most once unless [`Memo::rebuild`] is called.
#[derive(Debug)]
pub struct Memo<T> {
    state: RwLock<Cached<T>>,
    build_lock: Mutex<()>,
}

impl<T> Default for Memo<T> {
    fn default() -> Self {
        Self {
            state: RwLock::new(Cached::Unbuilt),
            build_lock: Mutex::new(()),
        }
    }
}

impl<T> Memo<T> {
    pub fn get(&self) -> Option<Arc<T>> {
        match &*self.state.read().unwrap_or_else(PoisonError::into_inner) {
            Cached::Unbuilt => None,
            Cached::Built(value) => Some(Arc::clone(value)),
        }
    }

    pub fn is_built(&self) -> bool {
        self.get().is_some()
    }

    pub fn get_or_try_build<F>(&self, build: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(value) = self.get() {
            return Ok(value);
        }
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have published while we waited
        if let Some(value) = self.get() {
            return Ok(value);
        }
        self.build_and_publish(build)
    }

    pub fn rebuild<F>(&self, build: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.build_and_publish(build)
    }

    fn build_and_publish<F>(&self, build: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        let value = Arc::new(build()?);
        *self.state.write().unwrap_or_else(PoisonError::into_inner) =
            Cached::Built(Arc::clone(&value));
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    #[test]
    fn builds_once_under_concurrent_access() {
        let memo: Arc<Memo<usize>> = Arc::new(Memo::default());
        let builds = Arc::new(AtomicUsize::new(0));
        let handles = (0..8)
            .map(|_| {
                let memo = Arc::clone(&memo);
                let builds = Arc::clone(&builds);
                thread::spawn(move || {
                    *memo
                        .get_or_try_build(|| {
                            builds.fetch_add(1, Ordering::SeqCst);
                            Ok(42)
                        })
                        .unwrap()
                })
            })
            .collect::<Vec<_>>();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_build_leaves_memo_unbuilt() {
        let memo: Memo<usize> = Memo::default();
        let result = memo.get_or_try_build(|| Err(Error::InsufficientData(1)));
        assert!(matches!(result, Err(Error::InsufficientData(1))));
        assert!(!memo.is_built());
        assert_eq!(*memo.get_or_try_build(|| Ok(7)).unwrap(), 7);
    }

    #[test]
    fn rebuild_replaces_published_value() {
        let memo: Memo<usize> = Memo::default();
        memo.get_or_try_build(|| Ok(1)).unwrap();
        assert_eq!(*memo.get_or_try_build(|| Ok(2)).unwrap(), 1);
        assert_eq!(*memo.rebuild(|| Ok(3)).unwrap(), 3);
        assert_eq!(*memo.get().unwrap(), 3);
    }
}
