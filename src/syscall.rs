//! Host services reachable from the guest through the `syscall` instruction.
//!
//! Arguments arrive in `$a0`/`$a1`, the service code in `$v0`, and results go
//! back through `$v0`/`$v1`.

use std::io::{self, BufRead, BufReader, Write};

use regex::Regex;

use crate::common::{Fault, Outcome, Step, Word};
use crate::machine::Machine;
use crate::regs::Reg;

/// The host streams the trap handler talks to, defaulting to the process
/// stdin/stdout but replaceable for tests.
pub(crate) struct TrapIo {
    input: Box<dyn BufRead>,
    output: Box<dyn Write>,
    /// Matches what `strtol` would consume from the start of a line.
    leading_int: Regex,
}

impl TrapIo {
    pub(crate) fn new() -> Self {
        Self::with_streams(Box::new(BufReader::new(io::stdin())), Box::new(io::stdout()))
    }

    pub(crate) fn with_streams(input: Box<dyn BufRead>, output: Box<dyn Write>) -> Self {
        TrapIo {
            input,
            output,
            leading_int: Regex::new(r"^[ \t\f\r\n\v]*[+-]?[0-9]+").unwrap(),
        }
    }
}

impl Machine {
    /// Dispatch on the service code in `$v0`.  Codes 12 through 16 of the
    /// historical table are deliberately absent; they fault like any other
    /// unknown code.
    pub(crate) fn syscall(&mut self) -> Outcome {
        match self.regs.read(Reg::V0) {
            // print_int
            1 => {
                let _ = write!(self.io.output, "{}", self.regs.read(Reg::A0));
                Ok(Step::Next)
            }
            // print_string
            4 => {
                let bytes = self.mem.c_string(self.regs.read(Reg::A0) as u32)?;
                let _ = self.io.output.write_all(bytes);
                Ok(Step::Next)
            }
            // read_int
            5 => self.read_int(),
            // read_string
            8 => self.read_string(),
            // exit
            10 => Ok(Step::Exit(None)),
            // print_char
            11 => {
                let _ = self.io.output.write_all(&[self.regs.read(Reg::A0) as u8]);
                Ok(Step::Next)
            }
            // exit2
            17 => Ok(Step::Exit(Some(self.regs.read(Reg::A0)))),
            code => Err(Fault::BadSyscall(code)),
        }
    }

    /// Read one line and parse its leading signed decimal.  `$v0` receives
    /// the value and `$v1` the success flag; a line without a number leaves
    /// `$v0` untouched and sets `$v1` nonzero.
    fn read_int(&mut self) -> Outcome {
        let _ = self.io.output.flush();
        let mut line = String::new();
        let _ = self.io.input.read_line(&mut line);
        match self.io.leading_int.find(&line) {
            Some(found) => {
                let digits = found.as_str().trim_start();
                let value = match digits.parse::<i64>() {
                    Ok(value) => value,
                    // Saturate like strtol before truncating to 32 bits.
                    Err(_) if digits.starts_with('-') => i64::MIN,
                    Err(_) => i64::MAX,
                };
                self.regs.write(Reg::V0, value as Word);
                self.regs.write(Reg::V1, 0);
            }
            None => self.regs.write(Reg::V1, -1),
        }
        Ok(Step::Next)
    }

    /// Read up to `$a1 - 1` bytes of one line into the buffer at `$a0` and
    /// NUL-terminate, keeping the newline.  `$v0` echoes the buffer address.
    /// End of input leaves the buffer untouched.
    fn read_string(&mut self) -> Outcome {
        let buf_addr = self.regs.read(Reg::A0) as u32;
        let len = self.regs.read(Reg::A1);
        self.regs.write(Reg::V0, buf_addr as Word);
        // Resolve the buffer before blocking on input.
        self.mem.slice_mut(buf_addr, 0)?;
        if len < 1 {
            return Ok(Step::Next);
        }
        let _ = self.io.output.flush();
        let mut line = String::new();
        if self.io.input.read_line(&mut line).unwrap_or(0) == 0 {
            return Ok(Step::Next);
        }
        let wanted = line.len().min(len as usize - 1);
        let buf = self.mem.slice_mut(buf_addr, wanted + 1)?;
        if buf.is_empty() {
            return Ok(Step::Next);
        }
        let take = wanted.min(buf.len() - 1);
        buf[..take].copy_from_slice(&line.as_bytes()[..take]);
        buf[take] = 0;
        Ok(Step::Next)
    }
}
