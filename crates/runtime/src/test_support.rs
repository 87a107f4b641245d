//! Minimal call-surface fakes for unit tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::remote::{BoxFuture, Launcher, PlatformRequirement, RemoteCall, RuntimeFlavor};

/// Remote that records method names and answers every call with a fixed value.
#[derive(Default)]
pub struct CountingRemote {
	pub closed: AtomicBool,
	pub calls: Mutex<Vec<String>>,
	pub failing: Mutex<Option<String>>,
}

impl RemoteCall for CountingRemote {
	fn call(&self, method: &str, _args: Value) -> BoxFuture<'_, Result<Value>> {
		self.calls.lock().push(method.to_string());
		let failing = self.failing.lock().clone();
		let method = method.to_string();
		Box::pin(async move {
			match failing {
				Some(m) if m == method => Err(Error::remote("RemoteError", format!("{method} refused"))),
				_ => Ok(Value::Array(Vec::new())),
			}
		})
	}

	fn close(&self) -> BoxFuture<'_, ()> {
		Box::pin(async { self.closed.store(true, Ordering::SeqCst) })
	}

	fn is_open(&self) -> bool {
		!self.closed.load(Ordering::SeqCst)
	}
}

/// Launcher that counts launches and hands out the last launched remote.
#[derive(Default)]
pub struct CountingLauncher {
	pub launches: AtomicUsize,
	pub fail: AtomicBool,
	pub fail_method: Mutex<Option<String>>,
	pub last: Mutex<Option<Arc<CountingRemote>>>,
}

impl Launcher for CountingLauncher {
	fn launch<'a>(
		&'a self,
		_flavor: RuntimeFlavor,
		host_port: &'a str,
		_requirement: &'a PlatformRequirement,
	) -> BoxFuture<'a, Result<Arc<dyn RemoteCall>>> {
		Box::pin(async move {
			if self.fail.load(Ordering::SeqCst) {
				return Err(Error::ConnectionFailed {
					host_port: host_port.to_string(),
					reason: "version mismatch".into(),
				});
			}
			self.launches.fetch_add(1, Ordering::SeqCst);
			let remote = Arc::new(CountingRemote {
				failing: Mutex::new(self.fail_method.lock().clone()),
				..Default::default()
			});
			*self.last.lock() = Some(remote.clone());
			Ok(remote as Arc<dyn RemoteCall>)
		})
	}
}
