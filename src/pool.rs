//! Buffer recycling pool.
//!
//! Every line under construction and every logger context borrows its heap
//! storage from this pool, so steady-state logging allocates nothing: a
//! buffer is leased by exactly one owner, filled, and handed back once the
//! bytes have been written to the sink or baked into a child logger.
//!
//! The lease is enforced by ownership: `acquire` moves a `Vec<u8>` out of the
//! pool and `release` moves it back, so two owners can never hold the same
//! buffer and a double release cannot compile.

use lazy_static::lazy_static;
use parking_lot::Mutex;

/// Initial capacity of a freshly allocated buffer, sized to hold a typical
/// log line without growing.
pub(crate) const BUFF_SIZE: usize = 500;

/// Upper bound on retained buffers. Anything released beyond this is dropped
/// so a burst of concurrent loggers does not pin memory forever.
const MAX_POOLED: usize = 64;

lazy_static! {
    static ref BUFF_POOL: Mutex<Vec<Vec<u8>>> = Mutex::new(Vec::new());
}

/// Leases a buffer from the pool, or allocates one if the pool is empty.
///
/// The returned buffer is always logically empty; recycled buffers keep
/// their capacity so reuse avoids reallocation.
pub(crate) fn acquire() -> Vec<u8> {
    let recycled = BUFF_POOL.lock().pop();
    match recycled {
        Some(mut buff) => {
            buff.clear();
            buff
        }
        None => Vec::with_capacity(BUFF_SIZE),
    }
}

/// Returns a leased buffer to the pool.
///
/// Zero-capacity vectors are ignored; they are the leftovers of a
/// `mem::take` and carry no storage worth keeping.
pub(crate) fn release(buff: Vec<u8>) {
    if buff.capacity() == 0 {
        return;
    }
    let mut pool = BUFF_POOL.lock();
    if pool.len() < MAX_POOLED {
        pool.push(buff);
    }
}
