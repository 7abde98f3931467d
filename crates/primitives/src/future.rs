use std::future::Future;
use std::pin::Pin;

/// A pinned, boxed future that is `Send + 'static`, as returned by the
/// services the editing core spawns onto the runtime.
pub type BoxFutureStatic<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
