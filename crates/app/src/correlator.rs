//! Response correlator: single-slot tag for the next `notify` payload.
//!
//! Only one tagged query may be in flight. Setting a new tag before the
//! previous one was consumed overwrites it; the displaced tag is returned so
//! the caller can report the lost correlation.

use spherolink_domain::response::ResponseTag;

#[derive(Debug, Default)]
pub struct ResponseCorrelator {
    pending: Option<ResponseTag>,
}

impl ResponseCorrelator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `tag`, returning any unconsumed previous tag.
    pub fn set_expected_response(&mut self, tag: ResponseTag) -> Option<ResponseTag> {
        self.pending.replace(tag)
    }

    /// Take the current tag, leaving the slot empty.
    pub fn consume(&mut self) -> Option<ResponseTag> {
        self.pending.take()
    }

    /// Put back the slot content from before the last
    /// [`set_expected_response`](Self::set_expected_response).
    pub fn restore(&mut self, previous: Option<ResponseTag>) {
        self.pending = previous;
    }

    #[must_use]
    pub fn pending(&self) -> Option<ResponseTag> {
        self.pending
    }
}
