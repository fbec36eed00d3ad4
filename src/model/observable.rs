//! A value cell that tells its subscribers when the value changes.

use std::sync::{Arc, RwLock};

type Subscriber<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub struct Observable<T> {
    value: RwLock<T>,
    subscribers: RwLock<Vec<Subscriber<T>>>,
}

impl<T: Clone + PartialEq> Observable<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
            subscribers: RwLock::new(Vec::new()),
        }
    }

    pub fn get(&self) -> T {
        self.value.read().unwrap().clone()
    }

    /// Store `value`; subscribers run only when it differs from the current one.
    /// Returns whether the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.value.write().unwrap();
            if *current == value {
                return false;
            }
            *current = value.clone();
        }
        // Clone the list so a subscriber may subscribe or read without deadlocking.
        let subscribers: Vec<_> = self.subscribers.read().unwrap().clone();
        for subscriber in &subscribers {
            subscriber(&value);
        }
        true
    }

    pub fn subscribe(&self, subscriber: impl Fn(&T) + Send + Sync + 'static) {
        self.subscribers.write().unwrap().push(Arc::new(subscriber));
    }
}

impl<T: Clone + PartialEq + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
