//! Blocking twins of the async API.
//!
//! Each `_sync` method drives its async counterpart to completion on a
//! fresh current-thread runtime. The list of twins is spelled out with
//! [`blocking_api!`] next to the async methods it wraps.

use std::future::Future;

use super::CoquiError;

/// Run `future` to completion on a new runtime.
///
/// Fails with [`CoquiError::BlockingInAsyncContext`] when a tokio runtime is
/// already running on this thread, where blocking would panic or deadlock.
pub fn block_on<F, T>(future: F) -> Result<T, CoquiError>
where
    F: Future<Output = Result<T, CoquiError>>,
{
    if tokio::runtime::Handle::try_current().is_ok() {
        return Err(CoquiError::BlockingInAsyncContext);
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(future)
}

/// Generate `&self` blocking methods from `name_sync => name(args) -> T;` lines.
///
/// Every wrapped method must be `async fn name(&self, args) -> Result<T, CoquiError>`.
macro_rules! blocking_api {
    ($(
        $(#[$meta:meta])*
        $sync:ident => $name:ident($($arg:ident: $ty:ty),* $(,)?) -> $ret:ty;
    )+) => {
        $(
            $(#[$meta])*
            pub fn $sync(&self, $($arg: $ty),*) -> Result<$ret, $crate::engine::CoquiError> {
                $crate::engine::block_on(self.$name($($arg),*))
            }
        )+
    };
}

pub(crate) use blocking_api;
