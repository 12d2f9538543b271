//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGABRT, SIGINT and SIGTERM
//! - Route a received signal to the single process-wide [`SignalHandler`]
//!
//! # Design Decisions
//! - The raw handler only does async-signal-safe work: it resets every
//!   registered signal to its default disposition and writes the signal number
//!   to a socket pair
//! - A dispatcher thread reads the socket and calls `on_signal` in a normal
//!   thread context, where locks and logging are allowed
//! - After one delivery the handlers are back to default, so a second Ctrl+C
//!   terminates the process; callers re-arm explicitly with [`arm`]

use std::io::Read;
use std::os::fd::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};

use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use parking_lot::{const_mutex, Mutex};

use crate::error::{HostError, Result};

/// Signals routed to the process-wide handler.
pub const HANDLED_SIGNALS: [Signal; 3] = [Signal::SIGABRT, Signal::SIGINT, Signal::SIGTERM];

/// Receiver of forwarded signals.
pub trait SignalHandler: Send + Sync {
    fn on_signal(&self, signal: i32);
}

static HANDLER: Mutex<Option<Weak<dyn SignalHandler>>> = const_mutex(None);
static DISPATCH_WRITER: Mutex<Option<UnixStream>> = const_mutex(None);
static DISPATCH_FD: AtomicI32 = AtomicI32::new(-1);

extern "C" fn forward_signal(signal: libc::c_int) {
    // SAFETY: signal(2) and write(2) are async-signal-safe.
    unsafe {
        for handled in HANDLED_SIGNALS {
            libc::signal(handled as libc::c_int, libc::SIG_DFL);
        }
        let fd = DISPATCH_FD.load(Ordering::SeqCst);
        if fd >= 0 {
            let byte = signal as u8;
            libc::write(fd, (&byte as *const u8).cast(), 1);
        }
    }
}

/// Set the process-wide handler and arm the signal handlers.
///
/// Fails with `AlreadyExists` if a different handler is still alive.
pub fn install(handler: &Arc<dyn SignalHandler>) -> Result<()> {
    {
        let mut slot = HANDLER.lock();
        if let Some(existing) = slot.as_ref().and_then(Weak::upgrade) {
            if !std::ptr::addr_eq(Arc::as_ptr(&existing), Arc::as_ptr(handler)) {
                return Err(HostError::AlreadyExists("process signal handler".into()));
            }
        }
        *slot = Some(Arc::downgrade(handler));
    }

    ensure_dispatcher()?;
    arm()
}

/// (Re-)register the raw handlers for [`HANDLED_SIGNALS`].
pub fn arm() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(forward_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    for sig in HANDLED_SIGNALS {
        // SAFETY: forward_signal only performs async-signal-safe calls.
        unsafe { signal::sigaction(sig, &action) }
            .map_err(|e| HostError::Signal(format!("{sig}: {e}")))?;
    }
    tracing::debug!(signals = ?HANDLED_SIGNALS, "Signal handlers armed");
    Ok(())
}

/// Drop the process-wide handler and restore default dispositions.
pub fn clear() {
    HANDLER.lock().take();
    for sig in HANDLED_SIGNALS {
        // SAFETY: restoring the default disposition installs no Rust code.
        if let Err(e) = unsafe { signal::signal(sig, SigHandler::SigDfl) } {
            tracing::warn!(signal = %sig, error = %e, "Failed to restore default signal handler");
        }
    }
}

fn ensure_dispatcher() -> Result<()> {
    let mut writer = DISPATCH_WRITER.lock();
    if writer.is_some() {
        return Ok(());
    }

    let (tx, mut rx) = UnixStream::pair()?;
    std::thread::Builder::new()
        .name("modhost-signals".into())
        .spawn(move || {
            let mut buf = [0u8; 1];
            loop {
                match rx.read(&mut buf) {
                    Ok(0) => break,
                    Ok(_) => dispatch(i32::from(buf[0])),
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        tracing::error!(error = %e, "Signal dispatcher stopped");
                        break;
                    }
                }
            }
        })?;

    DISPATCH_FD.store(tx.as_raw_fd(), Ordering::SeqCst);
    *writer = Some(tx);
    Ok(())
}

fn dispatch(signal: i32) {
    let handler = HANDLER.lock().as_ref().and_then(Weak::upgrade);
    match handler {
        Some(handler) => handler.on_signal(signal),
        None => tracing::debug!(signal, "Signal received with no handler installed"),
    }
}
