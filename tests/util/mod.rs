//! Helpers shared by the integration tests: a tiny instruction encoder, an
//! executable image builder, and a capture buffer for guest output.

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use mipsim::machine::Machine;
use mipsim::mem::TEXT_BASE;

pub const ZERO: u32 = 0;
pub const V0: u32 = 2;
pub const A0: u32 = 4;
pub const A1: u32 = 5;
pub const T0: u32 = 8;
pub const T1: u32 = 9;
pub const T2: u32 = 10;
pub const GP: u32 = 28;
pub const SP: u32 = 29;
pub const RA: u32 = 31;

fn rtype(rs: u32, rt: u32, rd: u32, shamt: u32, funct: u32) -> u32 {
    rs << 21 | rt << 16 | rd << 11 | shamt << 6 | funct
}

fn itype(opcode: u32, rs: u32, rt: u32, imm: u32) -> u32 {
    opcode << 26 | rs << 21 | rt << 16 | (imm & 0xFFFF)
}

pub fn add(rd: u32, rs: u32, rt: u32) -> u32 {
    rtype(rs, rt, rd, 0, 32)
}

pub fn addu(rd: u32, rs: u32, rt: u32) -> u32 {
    rtype(rs, rt, rd, 0, 33)
}

pub fn addi(rt: u32, rs: u32, imm: i32) -> u32 {
    itype(8, rs, rt, imm as u32)
}

pub fn lui(rt: u32, imm: u32) -> u32 {
    itype(15, 0, rt, imm)
}

pub fn ori(rt: u32, rs: u32, imm: u32) -> u32 {
    itype(13, rs, rt, imm)
}

pub fn beq(rs: u32, rt: u32, offset: i32) -> u32 {
    itype(4, rs, rt, offset as u32)
}

pub fn bne(rs: u32, rt: u32, offset: i32) -> u32 {
    itype(5, rs, rt, offset as u32)
}

pub fn lw(rt: u32, offset: i32, rs: u32) -> u32 {
    itype(35, rs, rt, offset as u32)
}

pub fn lh(rt: u32, offset: i32, rs: u32) -> u32 {
    itype(33, rs, rt, offset as u32)
}

pub fn lbu(rt: u32, offset: i32, rs: u32) -> u32 {
    itype(36, rs, rt, offset as u32)
}

pub fn jr(rs: u32) -> u32 {
    rtype(rs, 0, 0, 0, 8)
}

pub fn jal(addr: u32) -> u32 {
    3 << 26 | (addr >> 2 & 0x03FF_FFFF)
}

pub fn syscall() -> u32 {
    12
}

pub fn brk() -> u32 {
    13
}

/// Build an executable image that enters at the start of `text`.
pub fn image(text: &[u32], data: &[u8]) -> Vec<u8> {
    let mut image = vec![0u8; 0x34];
    image[0x08..0x0C].copy_from_slice(&TEXT_BASE.to_be_bytes());
    image[0x0C..0x10].copy_from_slice(&((text.len() * 4) as u32).to_be_bytes());
    image[0x14..0x18].copy_from_slice(&(data.len() as u32).to_be_bytes());
    for &word in text {
        image.extend_from_slice(&word.to_be_bytes());
    }
    image.extend_from_slice(data);
    image
}

/// A writer whose contents stay readable after the machine takes it.
#[derive(Clone, Default)]
pub struct Sink(Rc<RefCell<Vec<u8>>>);

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink {
    pub fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

/// Assemble, load and wire up a machine with captured output.
pub fn boot(text: &[u32], data: &[u8], args: &[&str], input: &str) -> (Machine, Sink) {
    let mut guest_args = vec!["guest".to_string()];
    guest_args.extend(args.iter().map(|a| a.to_string()));
    let sink = Sink::default();
    let machine = Machine::load(&image(text, data), &guest_args)
        .unwrap()
        .with_io(Cursor::new(input.as_bytes().to_vec()), sink.clone());
    (machine, sink)
}
