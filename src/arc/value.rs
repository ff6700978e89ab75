use std::fmt::Debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use smallvec::SmallVec;

use crate::value::ListenOptions;

/// Thread-safe observable cell.
///
/// Listeners are called with no lock held, so they may read or write the same
/// value. Only one thread delivers at a time: a `set` that lands while another
/// thread is delivering is handed to that thread, which keeps delivering until
/// it has caught up with the latest version. Listeners therefore always see
/// versions in write order, but may skip intermediate ones under contention.
pub struct Value<T> {
	body: Arc<ValueBody<T>>,
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
	T: Default + Send + Sync + 'static,
{
	fn default() -> Self {
		Value::new(Default::default())
	}
}

pub struct ValueBody<T> {
	value: RwLock<Slot<T>>,
	delivery: Mutex<Delivery>,
	inner: Mutex<ValueInner<T>>,
}

struct Slot<T> {
	value: T,
	version: u64,
}

#[derive(Default)]
struct Delivery {
	running: bool,
	delivered: u64,
}

struct ValueInner<T> {
	next_id: u64,
	listeners: SmallVec<[Arc<Listener<T>>; 4]>,
}

struct Listener<T> {
	id: u64,
	active: AtomicBool,
	func: Box<dyn Fn(&T) + Send + Sync>,
}

impl<T> Value<T>
where
	T: Send + Sync + 'static,
{
	pub fn new(value: T) -> Self {
		Value {
			body: Arc::new(ValueBody {
				value: RwLock::new(Slot { value, version: 0 }),
				delivery: Mutex::new(Delivery::default()),
				inner: Mutex::new(ValueInner {
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
		self.body.value.read().value.clone()
	}

	#[inline]
	pub fn with<R>(&self, func: impl FnOnce(&T) -> R) -> R {
		func(&self.body.value.read().value)
	}

	pub fn set(&self, value: T)
	where
		T: Clone,
	{
		self.store(value);
		self.flush();
	}

	/// Writes the value without notifying. Pair with [`Value::flush`] once any
	/// caller-held locks are released.
	pub(crate) fn store(&self, value: T) {
		let mut slot = self.body.value.write();
		slot.value = value;
		slot.version += 1;
	}

	/// Delivers the latest stored value unless another caller is already
	/// delivering, in which case that caller picks it up.
	pub(crate) fn flush(&self)
	where
		T: Clone,
	{
		{
			let mut delivery = self.body.delivery.lock();
			if delivery.running {
				return;
			}
			delivery.running = true;
		}

		let _guard = DeliveryGuard(&self.body.delivery);
		loop {
			let snapshot = {
				let mut delivery = self.body.delivery.lock();
				let slot = self.body.value.read();
				if slot.version == delivery.delivered {
					delivery.running = false;
					return;
				}
				delivery.delivered = slot.version;
				slot.value.clone()
			};
			self.body.notify(&snapshot);
		}
	}

	pub fn listen(
		&self,
		func: impl Fn(&T) + Send + Sync + 'static,
		options: ListenOptions,
	) -> Subscription<T>
	where
		T: Clone,
	{
		let listener = {
			let mut inner = self.body.inner.lock();
			inner.next_id += 1;
			let listener = Arc::new(Listener {
				id: inner.next_id,
				active: AtomicBool::new(true),
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
			body: Arc::downgrade(&self.body),
			id: listener.id,
		}
	}

	pub fn listener_count(&self) -> usize {
		self.body.inner.lock().listeners.len()
	}
}

/// Releases the delivery flag when a listener panics.
struct DeliveryGuard<'a>(&'a Mutex<Delivery>);

impl Drop for DeliveryGuard<'_> {
	fn drop(&mut self) {
		if std::thread::panicking() {
			self.0.lock().running = false;
		}
	}
}

impl<T> ValueBody<T> {
	fn notify(&self, value: &T) {
		let listeners = self.inner.lock().listeners.clone();
		for listener in listeners {
			if listener.active.load(Ordering::Acquire) {
				(listener.func)(value);
			}
		}
	}

	fn remove(&self, id: u64) {
		self.inner.lock().listeners.retain(|listener| {
			if listener.id == id {
				listener.active.store(false, Ordering::Release);
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
		self.body.value.read().value.fmt(f)
	}
}
