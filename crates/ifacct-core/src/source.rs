//! Abstract counter source trait.
//!
//! Every way of reading interface byte counters implements
//! [`CounterSource`]. The accumulator only ever sees [`Sample`]s.

use crate::delta::Sample;
use crate::error::Result;

/// Supplier of cumulative rx/tx byte counters for one interface.
pub trait CounterSource: Send {
    /// Interface this source reads.
    fn interface(&self) -> &str;

    /// Current cumulative counters.
    ///
    /// Fails with [`crate::AcctError::InterfaceNotFound`] when the interface
    /// has no counters, and with
    /// [`crate::AcctError::CounterSourceUnavailable`] when they cannot be
    /// read right now.
    fn sample(&mut self) -> Result<Sample>;
}

impl<S: CounterSource + ?Sized> CounterSource for Box<S> {
    fn interface(&self) -> &str {
        (**self).interface()
    }

    fn sample(&mut self) -> Result<Sample> {
        (**self).sample()
    }
}
