//! Length-prefixed string transfers
//!
//! Both serial drivers move strings the same way on the wire: one length byte
//! followed by exactly that many payload bytes. The receiver stores the
//! payload and appends a 0 terminator.

/// Errors from string transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StringError {
    /// The receive buffer cannot hold the payload plus terminator.
    /// The payload was drained from the line so the stream stays in step.
    Overflow { needed: usize, capacity: usize },
    /// A counted send was asked to carry more than 255 bytes
    TooLong(usize),
}

/// String terminator
pub const TERMINATOR: u8 = 0;

/// Bytes of `s` before the first terminator
pub fn until_terminator(s: &[u8]) -> &[u8] {
    match s.iter().position(|&b| b == TERMINATOR) {
        Some(end) => &s[..end],
        None => s,
    }
}

/// Length prefix for a counted send of `payload`
pub fn length_prefix(payload: &[u8]) -> Result<u8, StringError> {
    u8::try_from(payload.len()).map_err(|_| StringError::TooLong(payload.len()))
}

/// Receive a counted string into `buf`, pulling bytes from `next`
///
/// Returns the payload length (terminator excluded).
pub fn receive_into<F>(buf: &mut [u8], mut next: F) -> Result<usize, StringError>
where
    F: FnMut() -> u8,
{
    let count = next() as usize;

    if count + 1 > buf.len() {
        for _ in 0..count {
            next();
        }
        return Err(StringError::Overflow {
            needed: count + 1,
            capacity: buf.len(),
        });
    }

    for slot in buf[..count].iter_mut() {
        *slot = next();
    }
    buf[count] = TERMINATOR;

    Ok(count)
}
