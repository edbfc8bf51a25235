//! Builds the initial machine state: parses the executable header, populates
//! the text and data segments, and marshals the guest arguments onto the
//! stack.

use derive_more::Display;

use crate::common::Word;
use crate::mem::{Memory, STACK_SIZE, STACK_TOP};
use crate::regs::{Reg, Registers};

// Fixed header offsets of the executable format.  The header words between
// these are not consumed.
const ENTRY_LOC: usize = 0x08;
const TEXT_SIZE_LOC: usize = 0x0C;
const DATA_SIZE_LOC: usize = 0x14;
const TEXT_START_LOC: usize = 0x34;

/// Why an executable image could not be loaded.
#[derive(Clone, Copy, PartialEq, Eq, Display)]
pub enum LoadError {
    #[display("executable image is truncated")]
    Truncated,
    #[display("guest arguments do not fit in the stack segment")]
    ArgsTooLarge,
}

impl std::fmt::Debug for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self}")
    }
}

impl std::error::Error for LoadError {}

fn header_word(image: &[u8], at: usize) -> Result<u32, LoadError> {
    let b = image.get(at..at + 4).ok_or(LoadError::Truncated)?;
    Ok(u32::from(b[0]) << 24 | u32::from(b[1]) << 16 | u32::from(b[2]) << 8 | u32::from(b[3]))
}

fn put_word(buf: &mut [u8], value: u32) {
    buf[0] = (value >> 24) as u8;
    buf[1] = (value >> 16) as u8;
    buf[2] = (value >> 8) as u8;
    buf[3] = value as u8;
}

/// Parse `image` and produce the segments and register file of a machine
/// about to execute its first instruction.
///
/// `args` is the guest argument vector: `args[0]` is the program path and is
/// only counted, `args[1..]` are copied onto the stack.  The strings are
/// packed in order from the top of the stack, padded to a 16-byte-aligned
/// length, and followed by three words: the address below the strings, the
/// address below the padding, and the argument count.  `$sp` is left at the
/// first of those words and every other register at zero.
pub fn load(image: &[u8], args: &[String]) -> Result<(Memory, Registers), LoadError> {
    let entry = header_word(image, ENTRY_LOC)?;
    let text_size = header_word(image, TEXT_SIZE_LOC)? as usize;
    let data_size = header_word(image, DATA_SIZE_LOC)? as usize;

    let text_end = TEXT_START_LOC.checked_add(text_size).ok_or(LoadError::Truncated)?;
    let data_end = text_end.checked_add(data_size).ok_or(LoadError::Truncated)?;
    if image.len() < data_end {
        return Err(LoadError::Truncated);
    }
    let text = image[TEXT_START_LOC..text_end].to_vec();
    let data = image[text_end..data_end].to_vec();

    let args_len: usize = args.iter().skip(1).map(|arg| arg.len() + 1).sum();
    // Round up to a 16-byte boundary; the wrapping arithmetic turns zero
    // arguments into zero padding.
    let padded = (args_len.wrapping_sub(1) | 15).wrapping_add(1);
    if padded + 12 > STACK_SIZE {
        return Err(LoadError::ArgsTooLarge);
    }

    let mut stack = vec![0u8; STACK_SIZE];
    let mut at = 0;
    for arg in args.iter().skip(1) {
        stack[at..at + arg.len()].copy_from_slice(arg.as_bytes());
        at += arg.len() + 1; // the buffer is zeroed, so the NUL is in place
    }
    put_word(&mut stack[padded..], STACK_TOP - args_len as u32);
    put_word(&mut stack[padded + 4..], STACK_TOP - padded as u32);
    put_word(&mut stack[padded + 8..], args.len().saturating_sub(1) as u32);

    let mut regs = Registers::new();
    regs.pc = entry;
    regs.write(Reg::SP, (STACK_TOP - padded as u32) as Word);

    Ok((Memory::with_stack(text, data, stack), regs))
}
