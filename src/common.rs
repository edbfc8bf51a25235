//! Definitions shared between the parts of the simulator.

use derive_more::Display;

/// The architectural register width.  MIPS-I registers hold 32-bit
/// two's-complement values; addresses reinterpret the same bits unsigned.
pub type Word = i32;

/// What executing one instruction did to the control flow.
///
/// These are the non-fatal outcomes: the run loop keeps going after any of
/// them except [`Step::Exit`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Step {
    /// The instruction completed; the loop advances `pc` by 4.
    Next,
    /// The instruction set `pc` itself; the loop must not advance it.
    Jumped,
    /// The instruction completed but signed arithmetic overflowed.  The loop
    /// advances `pc` like [`Step::Next`] unless strict overflow is enabled.
    Overflow,
    /// The guest asked to stop, optionally with an exit status.
    Exit(Option<Word>),
}

/// A terminal error condition.  Any of these halts the simulation.
#[derive(Clone, Copy, PartialEq, Eq, Display)]
pub enum Fault {
    #[display("divide by zero")]
    DivByZero,
    #[display("illegal memory address")]
    NonexistentMemory,
    #[display("misaligned instruction fetch")]
    UnalignedInst,
    #[display("syscall code {_0} not implemented")]
    BadSyscall(Word),
    #[display("instruction not implemented")]
    FuncNotImplemented,
    #[display("break instruction reached")]
    Break,
    /// Only produced when strict overflow promotes [`Step::Overflow`].
    #[display("arithmetic overflow")]
    Overflow,
}

impl std::fmt::Debug for Fault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for Fault {}

/// The uniform result type every semantic operation returns.
pub type Outcome = Result<Step, Fault>;
