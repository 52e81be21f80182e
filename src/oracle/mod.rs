//! The propagation oracle the search delegates BCP to.

mod command;
mod propagator;

pub use command::{CommandOracle, Exchange, REQUEST_FILE, RESPONSE_FILE};
pub use propagator::UnitPropagator;

use std::io;

/// A synchronous, blocking propagation engine.
///
/// `run` receives an encoded trigger record and returns the raw response text. An empty reply
/// means the oracle produced nothing, which the protocol layer rejects.
pub trait Oracle {
    fn run(&mut self, request: &str) -> io::Result<String>;
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn run(&mut self, request: &str) -> io::Result<String> {
        (**self).run(request)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn run(&mut self, request: &str) -> io::Result<String> {
        (**self).run(request)
    }
}

/// Oracle backed by a closure.
pub struct FnOracle<F>(F);

pub fn from_fn<F>(f: F) -> FnOracle<F>
where
    F: FnMut(&str) -> io::Result<String>,
{
    FnOracle(f)
}

impl<F> Oracle for FnOracle<F>
where
    F: FnMut(&str) -> io::Result<String>,
{
    fn run(&mut self, request: &str) -> io::Result<String> {
        (self.0)(request)
    }
}
