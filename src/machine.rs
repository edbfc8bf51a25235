//! The simulator value and its fetch → decode → execute loop.

use std::io::{BufRead, Write};

use crate::common::{Fault, Outcome, Step, Word};
use crate::decode::decode;
use crate::loader::{self, LoadError};
use crate::mem::Memory;
use crate::regs::Registers;
use crate::syscall::TrapIo;

/// One simulated machine: register file, segments and trap streams.  All
/// state lives here, so independent instances can run side by side.
pub struct Machine {
    pub regs: Registers,
    pub mem: Memory,
    /// Promote the non-fatal [`Step::Overflow`] to [`Fault::Overflow`],
    /// which is what the architecture itself would do.
    pub strict_overflow: bool,
    /// Write each fetched instruction to stderr before executing it.
    pub trace: bool,
    pub(crate) io: TrapIo,
}

impl Machine {
    pub fn new(mem: Memory, regs: Registers) -> Self {
        Machine {
            regs,
            mem,
            strict_overflow: false,
            trace: false,
            io: TrapIo::new(),
        }
    }

    /// Build a machine from an executable image, with the argument
    /// convention of [`loader::load`].
    pub fn load(image: &[u8], args: &[String]) -> Result<Self, LoadError> {
        let (mem, regs) = loader::load(image, args)?;
        Ok(Self::new(mem, regs))
    }

    /// Replace the host streams the trap handler talks to.
    pub fn with_io(mut self, input: impl BufRead + 'static, output: impl Write + 'static) -> Self {
        self.io = TrapIo::with_streams(Box::new(input), Box::new(output));
        self
    }

    /// Fetch, decode and execute the instruction at `pc`.  Advancing `pc`
    /// afterwards is [`Machine::run`]'s job.
    pub fn step(&mut self) -> Outcome {
        if self.regs.pc % 4 != 0 {
            return Err(Fault::UnalignedInst);
        }
        let word = self.mem.load_word(self.regs.pc)?;
        let op = decode(word)?;
        if self.trace {
            eprintln!("pc=0x{:08X}  {word:08X}  {op}", self.regs.pc);
        }
        self.exec(op)
    }

    /// Run until the guest exits or faults.  A clean exit yields the status
    /// the guest supplied, if any; on a fault `pc` is left at the faulting
    /// instruction.
    pub fn run(&mut self) -> Result<Option<Word>, Fault> {
        loop {
            match self.step()? {
                Step::Next => {}
                Step::Overflow if self.strict_overflow => return Err(Fault::Overflow),
                Step::Overflow => {}
                Step::Jumped => continue,
                Step::Exit(status) => return Ok(status),
            }
            self.regs.pc = self.regs.pc.wrapping_add(4);
        }
    }
}
