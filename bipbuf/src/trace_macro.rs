#[cfg(feature = "trace")]
macro_rules! bipbuf_trace {
    ($($arg:tt)*) => {
        ::tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "trace"))]
macro_rules! bipbuf_trace {
    ($($arg:tt)*) => {};
}

pub(crate) use bipbuf_trace;
