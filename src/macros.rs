#[cfg(feature = "tracing")]
macro_rules! fxtrace {
    ($($tt:tt)*) => {
        tracing::trace!(target: "scrollfx", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! fxtrace {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! fxdebug {
    ($($tt:tt)*) => {
        tracing::debug!(target: "scrollfx", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! fxdebug {
    ($($tt:tt)*) => {};
}

#[cfg(feature = "tracing")]
macro_rules! fxwarn {
    ($($tt:tt)*) => {
        tracing::warn!(target: "scrollfx", $($tt)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! fxwarn {
    ($($tt:tt)*) => {};
}
