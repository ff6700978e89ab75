use std::cell::{Cell, RefCell};
use std::fmt::Debug;
use std::rc::{Rc, Weak};

use smallvec::SmallVec;

/// Per-subscription settings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenOptions {
	/// Call the listener with the current snapshot before `listen` returns.
	pub immediate: bool,
}

impl ListenOptions {
	pub fn immediate() -> Self {
		ListenOptions { immediate: true }
	}
}

/// Observable cell holding one snapshot.
///
/// Every `set` replaces the snapshot and synchronously calls each listener,
/// in subscription order, with the new value.
pub struct Value<T> {
	body: Rc<ValueBody<T>>,
}

impl<T> Clone for Value<T> {
	fn clone(&self) -> Self {
		Self {
			body: self.body.clone(),
		}
	}
}

impl<T> Default for Value<T>
where
	T: Default + 'static,
{
	fn default() -> Self {
		Value::new(Default::default())
	}
}

pub struct ValueBody<T> {
	value: RefCell<T>,
	inner: RefCell<ValueInner<T>>,
}

struct ValueInner<T> {
	next_id: u64,
	listeners: SmallVec<[Rc<Listener<T>>; 4]>,
}

struct Listener<T> {
	id: u64,
	active: Cell<bool>,
	func: Box<dyn Fn(&T)>,
}

impl<T> Value<T>
where
	T: 'static,
{
	pub fn new(value: T) -> Self {
		Value {
			body: Rc::new(ValueBody {
				value: RefCell::new(value),
				inner: RefCell::new(ValueInner {
					next_id: 0,
					listeners: SmallVec::new(),
				}),
			}),
		}
	}

	#[inline]
	pub fn get(&self) -> T
	where
		T: Clone,
	{
		self.body.value.borrow().clone()
	}

	/// Reads the snapshot without cloning it.
	#[inline]
	pub fn with<R>(&self, func: impl FnOnce(&T) -> R) -> R {
		func(&self.body.value.borrow())
	}

	pub fn set(&self, value: T)
	where
		T: Clone,
	{
		*self.body.value.borrow_mut() = value.clone();
		self.body.notify(&value);
	}

	pub fn listen(&self, func: impl Fn(&T) + 'static, options: ListenOptions) -> Subscription<T>
	where
		T: Clone,
	{
		let listener = {
			let mut inner = self.body.inner.borrow_mut();
			inner.next_id += 1;
			let listener = Rc::new(Listener {
				id: inner.next_id,
				active: Cell::new(true),
				func: Box::new(func),
			});
			inner.listeners.push(listener.clone());
			listener
		};

		if options.immediate {
			let current = self.get();
			(listener.func)(&current);
		}

		Subscription {
			body: Rc::downgrade(&self.body),
			id: listener.id,
		}
	}

	pub fn listener_count(&self) -> usize {
		self.body.inner.borrow().listeners.len()
	}
}

impl<T> ValueBody<T> {
	fn notify(&self, value: &T) {
		// listeners may subscribe or unsubscribe while we iterate
		let listeners = self.inner.borrow().listeners.clone();
		for listener in listeners {
			if listener.active.get() {
				(listener.func)(value);
			}
		}
	}

	fn remove(&self, id: u64) {
		let mut inner = self.inner.borrow_mut();
		inner.listeners.retain(|listener| {
			if listener.id == id {
				listener.active.set(false);
				false
			} else {
				true
			}
		});
	}
}

/// Handle returned by `listen`. Dropping it keeps the listener attached.
pub struct Subscription<T> {
	body: Weak<ValueBody<T>>,
	id: u64,
}

impl<T> Subscription<T> {
	/// Detaches the listener. Calling it again is a no-op.
	pub fn unsubscribe(&self) {
		if let Some(body) = self.body.upgrade() {
			body.remove(self.id);
		}
	}
}

impl<T> Debug for Value<T>
where
	T: Debug,
{
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		self.body.value.borrow().fmt(f)
	}
}
