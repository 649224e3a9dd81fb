use std::sync::{Mutex, MutexGuard, PoisonError};

/// Single mutual-exclusion domain around a value.
///
/// Every access goes through [`ExclusionGuard::enter`], which holds the lock
/// until the returned guard drops. There is no unlocked accessor.
#[derive(Debug, Default)]
pub(crate) struct ExclusionGuard<T> {
    lock: Mutex<T>,
}

impl<T> ExclusionGuard<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            lock: Mutex::new(value),
        }
    }

    /// Block until the lock is free and take it.
    ///
    /// A holder that panicked leaves the protected value in a consistent state
    /// (mutations never span a panicking call), so poisoning is cleared.
    pub(crate) fn enter(&self) -> MutexGuard<'_, T> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn serializes_increments_across_threads() {
        let guard = Arc::new(ExclusionGuard::new(0u64));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = Arc::clone(&guard);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        *guard.enter() += 1;
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(*guard.enter(), 8000);
    }

    #[test]
    fn recovers_after_holder_panics() {
        let guard = Arc::new(ExclusionGuard::new(vec![1u8]));

        let poisoner = {
            let guard = Arc::clone(&guard);
            thread::spawn(move || {
                let _held = guard.enter();
                panic!("holder panics with the lock taken");
            })
        };
        assert!(poisoner.join().is_err());

        guard.enter().push(2);
        assert_eq!(*guard.enter(), vec![1, 2]);
    }
}
