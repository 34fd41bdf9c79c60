//! Native setup routines.

use crate::context::Environment;
use crate::error::SandboxResult;

/// A setup routine written in Rust. Takes the whole Environment as its only
/// argument.
pub trait SetupRoutine {
    fn run(&self, env: &Environment) -> SandboxResult<()>;
}

impl<F> SetupRoutine for F
where
    F: Fn(&Environment) -> SandboxResult<()>,
{
    fn run(&self, env: &Environment) -> SandboxResult<()> {
        self(env)
    }
}
