#![allow(unused_macros)]

// Logging front-end. Forwards to `defmt` or `log` depending on the enabled
// feature and compiles to nothing otherwise. Format strings must stick to
// `{}` and `{:?}` so that both backends accept them.

macro_rules! trace {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            cfg_if::cfg_if! {
                if #[cfg(feature = "defmt")] {
                    ::defmt::trace!($s $(, $x)*);
                } else if #[cfg(feature = "log")] {
                    ::log::trace!($s $(, $x)*);
                } else {
                    let _ = ($( & $x ),*);
                }
            }
        }
    };
}

macro_rules! debug {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            cfg_if::cfg_if! {
                if #[cfg(feature = "defmt")] {
                    ::defmt::debug!($s $(, $x)*);
                } else if #[cfg(feature = "log")] {
                    ::log::debug!($s $(, $x)*);
                } else {
                    let _ = ($( & $x ),*);
                }
            }
        }
    };
}

macro_rules! warn {
    ($s:literal $(, $x:expr)* $(,)?) => {
        {
            cfg_if::cfg_if! {
                if #[cfg(feature = "defmt")] {
                    ::defmt::warn!($s $(, $x)*);
                } else if #[cfg(feature = "log")] {
                    ::log::warn!($s $(, $x)*);
                } else {
                    let _ = ($( & $x ),*);
                }
            }
        }
    };
}

/// Busy-wait until all bits of `$mask` read back as set in the status
/// register at `$base + $offset`.
///
/// No timeout: the loop body only reads.
macro_rules! wait_ready {
    ($bus:expr, $base:expr, $offset:expr, $mask:expr) => {
        while $bus.read($base, $offset) & $mask != $mask {}
    };
}
