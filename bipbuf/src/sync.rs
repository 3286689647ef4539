#[cfg(not(feature = "loom"))]
pub(crate) use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

#[cfg(feature = "loom")]
pub(crate) use loom::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

#[cfg(not(feature = "loom"))]
pub(crate) use parking_lot::Mutex;

#[cfg(feature = "loom")]
pub(crate) struct Mutex<T> {
    inner: loom::sync::Mutex<T>,
}

#[cfg(feature = "loom")]
impl<T> Mutex<T> {
    pub(crate) fn new(value: T) -> Self {
        Self {
            inner: loom::sync::Mutex::new(value),
        }
    }

    pub(crate) fn lock(&self) -> loom::sync::MutexGuard<'_, T> {
        self.inner.lock().unwrap()
    }
}

#[cfg(not(feature = "loom"))]
pub(crate) mod notification {
    use parking_lot::{Condvar, Mutex};

    /// Level-triggered wakeup: a notify that lands before `wait` is kept.
    pub(crate) struct Notification {
        pending: Mutex<bool>,
        condvar: Condvar,
    }

    impl Notification {
        pub(crate) fn new() -> Self {
            Notification {
                pending: Mutex::new(false),
                condvar: Condvar::new(),
            }
        }

        pub(crate) fn notify(&self) {
            let mut pending = self.pending.lock();
            *pending = true;
            self.condvar.notify_one();
        }

        pub(crate) fn wait(&self) {
            let mut pending = self.pending.lock();
            while !*pending {
                self.condvar.wait(&mut pending);
            }
            *pending = false;
        }
    }
}

#[cfg(feature = "loom")]
pub(crate) mod notification {
    use loom::sync::{Condvar, Mutex};

    pub(crate) struct Notification {
        pending: Mutex<bool>,
        condvar: Condvar,
    }

    impl Notification {
        pub(crate) fn new() -> Self {
            Notification {
                pending: Mutex::new(false),
                condvar: Condvar::new(),
            }
        }

        pub(crate) fn notify(&self) {
            let mut pending = self.pending.lock().unwrap();
            *pending = true;
            self.condvar.notify_one();
        }

        pub(crate) fn wait(&self) {
            let mut pending = self.pending.lock().unwrap();
            while !*pending {
                pending = self.condvar.wait(pending).unwrap();
            }
            *pending = false;
        }
    }
}
