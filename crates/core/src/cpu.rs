//! # 6502 CPU Core
//!
//! Register model, status flags, and instruction execution for an NMOS
//! 6502. The CPU owns its bus and drives it one instruction at a time:
//! `step()` fetches an opcode, pulls the operand bytes the opcode table
//! calls for, and dispatches to the matching instruction body. Opcode
//! values without an implemented body execute as silent no-ops of the
//! table-defined length.
//!
//! Instructions are counted, not clock cycles.

use std::fmt;

use crate::bus::Bus;
use crate::instruction::{self, INSTRUCTIONS};

/* Status register bit masks. Bit 5 is reserved and always reads as 1. */
pub const P_CARRY: u8 = 0x01;
pub const P_ZERO: u8 = 0x02;
pub const P_IRQ_DISABLE: u8 = 0x04;
pub const P_DECIMAL: u8 = 0x08;
pub const P_BREAK: u8 = 0x10;
pub const P_RESERVED: u8 = 0x20;
pub const P_OVERFLOW: u8 = 0x40;
pub const P_NEGATIVE: u8 = 0x80;

/// Vector consulted by BRK, low byte first.
pub const IRQ_VECTOR: u16 = 0xfffa;
/// Vector consulted by reset, low byte first.
pub const RESET_VECTOR: u16 = 0xfffc;
/// Remaining vector slot in the top page, unused by this core.
pub const NMI_VECTOR: u16 = 0xfffe;

/// Conventional load address for raw program images.
pub const DEFAULT_BASE_ADDRESS: u16 = 0x0200;

/// One simulated 6502, owning the bus it executes against.
pub struct Cpu<B: Bus> {
    pub bus: B,

    /* User registers */
    a: u8,
    x: u8,
    y: u8,

    /* Internal registers */
    pc: u16,
    sp: u8,
    ir: u8,

    /* Decode scratch, overwritten every step */
    operands: [u8; 2],
    addr: u16,

    /* Status flags */
    carry: bool,
    zero: bool,
    irq_disable: bool,
    decimal: bool,
    brk: bool,
    overflow: bool,
    negative: bool,
}

impl<B: Bus> Cpu<B> {
    pub fn new(bus: B) -> Self {
        Cpu {
            bus,
            a: 0,
            x: 0,
            y: 0,
            pc: 0,
            sp: 0,
            ir: 0,
            operands: [0; 2],
            addr: 0,
            carry: false,
            zero: false,
            irq_disable: false,
            decimal: false,
            brk: false,
            overflow: false,
            negative: false,
        }
    }

    /// Reset the CPU to known initial values: SP at the top of the stack
    /// page, PC loaded from the reset vector, instruction register and the
    /// Carry/IRQ-Disable/Decimal/Break/Overflow flags cleared.
    pub fn reset(&mut self) {
        self.sp = 0xff;

        let lo = self.bus.read(RESET_VECTOR);
        let hi = self.bus.read(RESET_VECTOR + 1);
        self.pc = address(lo, hi);

        self.ir = 0;

        self.carry = false;
        self.irq_disable = false;
        self.decimal = false;
        self.brk = false;
        self.overflow = false;

        log::debug!("reset: PC=${:04X}", self.pc);
    }

    /// Execute exactly one instruction.
    pub fn step(&mut self) {
        // Remember where this instruction was fetched from, for the trace.
        self.addr = self.pc;

        self.ir = self.bus.read(self.pc);
        self.increment_pc();

        let size = INSTRUCTIONS[self.ir as usize].size();
        for i in 0..size as usize - 1 {
            self.operands[i] = self.bus.read(self.pc);
            self.increment_pc();
        }

        self.execute();

        log::trace!("{}", self);
    }

    /// Execute `count` instructions back to back.
    pub fn step_n(&mut self, count: usize) {
        for _ in 0..count {
            self.step();
        }
    }

    fn execute(&mut self) {
        match self.ir {
            0x00 => self.brk(),
            0x05 => {
                let value = self.bus.read(self.operands[0] as u16);
                self.ora(value);
            }
            0x06 => self.asl_zero_page(),
            0x08 => self.php(),
            0x09 => {
                let value = self.operands[0];
                self.ora(value);
            }
            0x18 => self.clear_carry(),
            0x24 => self.bit_zero_page(),
            0x28 => self.plp(),
            0x29 => {
                let value = self.operands[0];
                self.and(value);
            }
            0x38 => self.set_carry(),
            0x40 => self.rti(),
            0x48 => self.pha(),
            0x49 => {
                let value = self.operands[0];
                self.eor(value);
            }
            0x4c => self.pc = address(self.operands[0], self.operands[1]),
            0x58 => self.clear_irq_disable(),
            0x60 => self.rts(),
            0x68 => self.pla(),
            0x69 => {
                let operand = self.operands[0];
                self.a = if self.decimal {
                    self.adc_decimal(self.a, operand)
                } else {
                    self.adc(self.a, operand)
                };
            }
            0x78 => self.set_irq_disable(),
            0x88 => self.dey(),
            0x8a => self.txa(),
            0x98 => self.tya(),
            0x9a => self.txs(),
            0xa0 => {
                let value = self.operands[0];
                self.ldy(value);
            }
            0xa2 => {
                let value = self.operands[0];
                self.ldx(value);
            }
            0xa8 => self.tay(),
            0xa9 => {
                let value = self.operands[0];
                self.lda(value);
            }
            0xaa => self.tax(),
            0xb8 => self.clear_overflow(),
            0xba => self.tsx(),
            0xc0 => {
                let value = self.operands[0];
                self.compare(self.y, value);
            }
            0xc8 => self.iny(),
            0xc9 => {
                let value = self.operands[0];
                self.compare(self.a, value);
            }
            0xca => self.dex(),
            0xd8 => self.clear_decimal_mode(),
            0xe0 => {
                let value = self.operands[0];
                self.compare(self.x, value);
            }
            0xe8 => self.inx(),
            0xe9 => {
                let operand = self.operands[0];
                self.a = if self.decimal {
                    self.sbc_decimal(self.a, operand)
                } else {
                    self.sbc(self.a, operand)
                };
            }
            0xea => {
                // NOP
            }
            0xf8 => self.set_decimal_mode(),

            // Every other opcode value is a defined slot with no behavior:
            // the operand bytes were consumed above and nothing else happens.
            _ => {}
        }
    }

    // Instruction bodies

    /// BRK: software interrupt. Does nothing at all while IRQ-Disable is
    /// set; otherwise pushes PC+2 (high byte first) and the packed status,
    /// sets IRQ-Disable, and jumps through the IRQ vector.
    fn brk(&mut self) {
        if !self.irq_disable {
            self.set_break();
            let pushed = self.pc.wrapping_add(2);
            self.stack_push((pushed >> 8) as u8);
            self.stack_push(pushed as u8);
            let status = self.processor_status();
            self.stack_push(status);
            self.set_irq_disable();
            let lo = self.bus.read(IRQ_VECTOR);
            let hi = self.bus.read(IRQ_VECTOR + 1);
            self.pc = address(lo, hi);
        }
    }

    /// RTI: pop status, then pop the return address, low byte first.
    fn rti(&mut self) {
        let status = self.stack_pop();
        self.set_processor_status(status);
        let lo = self.stack_pop();
        let hi = self.stack_pop();
        self.pc = address(lo, hi);
    }

    /// RTS: pop the return address, low byte first, and resume one past it.
    fn rts(&mut self) {
        let lo = self.stack_pop();
        let hi = self.stack_pop();
        self.pc = address(lo, hi).wrapping_add(1);
    }

    fn ora(&mut self, value: u8) {
        self.a |= value;
        let a = self.a;
        self.set_arithmetic_flags(a);
    }

    fn and(&mut self, value: u8) {
        self.a &= value;
        let a = self.a;
        self.set_arithmetic_flags(a);
    }

    fn eor(&mut self, value: u8) {
        self.a ^= value;
        let a = self.a;
        self.set_arithmetic_flags(a);
    }

    fn asl_zero_page(&mut self) {
        let target = self.operands[0] as u16;
        let value = self.bus.read(target);
        let shifted = self.asl(value);
        self.bus.write(target, shifted);
        // Zero/Negative come from what the bus reads back, not from the
        // value we wrote; a device behind the address may disagree.
        let written = self.bus.read(target);
        self.set_arithmetic_flags(written);
    }

    /// BIT: Zero, Negative, and Overflow all derive from `A & M` here.
    fn bit_zero_page(&mut self) {
        let value = self.bus.read(self.operands[0] as u16);
        let masked = self.a & value;
        self.set_zero_flag(masked == 0);
        self.set_negative_flag(masked & 0x80 != 0);
        self.set_overflow_flag(masked & 0x40 != 0);
    }

    fn lda(&mut self, value: u8) {
        self.a = value;
        self.set_arithmetic_flags(value);
    }

    fn ldx(&mut self, value: u8) {
        self.x = value;
        self.set_arithmetic_flags(value);
    }

    fn ldy(&mut self, value: u8) {
        self.y = value;
        self.set_arithmetic_flags(value);
    }

    fn tax(&mut self) {
        self.x = self.a;
        let x = self.x;
        self.set_arithmetic_flags(x);
    }

    fn tay(&mut self) {
        self.y = self.a;
        let y = self.y;
        self.set_arithmetic_flags(y);
    }

    fn txa(&mut self) {
        self.a = self.x;
        let a = self.a;
        self.set_arithmetic_flags(a);
    }

    fn tya(&mut self) {
        self.a = self.y;
        let a = self.a;
        self.set_arithmetic_flags(a);
    }

    fn txs(&mut self) {
        // No flags.
        self.sp = self.x;
    }

    fn tsx(&mut self) {
        self.x = self.sp;
        let x = self.x;
        self.set_arithmetic_flags(x);
    }

    fn inx(&mut self) {
        self.x = self.x.wrapping_add(1);
        let x = self.x;
        self.set_arithmetic_flags(x);
    }

    fn dex(&mut self) {
        self.x = self.x.wrapping_sub(1);
        let x = self.x;
        self.set_arithmetic_flags(x);
    }

    fn iny(&mut self) {
        self.y = self.y.wrapping_add(1);
        let y = self.y;
        self.set_arithmetic_flags(y);
    }

    fn dey(&mut self) {
        self.y = self.y.wrapping_sub(1);
        let y = self.y;
        self.set_arithmetic_flags(y);
    }

    fn pha(&mut self) {
        let a = self.a;
        self.stack_push(a);
    }

    fn pla(&mut self) {
        let value = self.stack_pop();
        self.a = value;
        self.set_arithmetic_flags(value);
    }

    fn php(&mut self) {
        let status = self.processor_status();
        self.stack_push(status);
    }

    fn plp(&mut self) {
        let status = self.stack_pop();
        self.set_processor_status(status);
    }

    // Arithmetic-logic routines

    /// Binary add with carry. Carry-out is bit 8 of the untruncated sum;
    /// Overflow is the XOR of carry-out with the carry out of bit 6, the
    /// usual twos-complement sign-mismatch test.
    pub fn adc(&mut self, acc: u8, operand: u8) -> u8 {
        let sum = operand as u16 + acc as u16 + self.carry_bit() as u16;
        let partial = (operand & 0x7f) as u16 + (acc & 0x7f) as u16 + self.carry_bit() as u16;
        self.set_carry_flag(sum & 0x100 != 0);
        let overflow = self.carry ^ (partial & 0x80 != 0);
        self.set_overflow_flag(overflow);
        let result = (sum & 0xff) as u8;
        self.set_arithmetic_flags(result);
        result
    }

    /// Decimal (BCD) add with carry. Each nibble is summed as a decimal
    /// digit with a +6 adjustment on overflow past 9. Negative and
    /// Overflow are always cleared in decimal mode.
    pub fn adc_decimal(&mut self, acc: u8, operand: u8) -> u8 {
        let mut l = (acc & 0x0f) as i32 + (operand & 0x0f) as i32 + self.carry_bit() as i32;
        if (l & 0xff) > 9 {
            l += 6;
        }
        let mut h = (acc >> 4) as i32 + (operand >> 4) as i32 + if l > 15 { 1 } else { 0 };
        if (h & 0xff) > 9 {
            h += 6;
        }
        let result = ((l & 0x0f) | (h << 4)) & 0xff;
        self.set_carry_flag(h > 15);
        self.set_zero_flag(result == 0);
        self.set_negative_flag(false);
        self.set_overflow_flag(false);
        result as u8
    }

    /// Binary subtract with carry (borrow): add of the one's complement.
    pub fn sbc(&mut self, acc: u8, operand: u8) -> u8 {
        let result = self.adc(acc, !operand);
        self.set_arithmetic_flags(result);
        result
    }

    /// Decimal (BCD) subtract with carry. The nibble-borrow mirror of
    /// [`Cpu::adc_decimal`]; carry-out means no borrow occurred.
    pub fn sbc_decimal(&mut self, acc: u8, operand: u8) -> u8 {
        let mut l =
            (acc & 0x0f) as i32 - (operand & 0x0f) as i32 - if self.carry { 0 } else { 1 };
        if l & 0x10 != 0 {
            l -= 6;
        }
        let mut h = (acc >> 4) as i32 - (operand >> 4) as i32 - if l & 0x10 != 0 { 1 } else { 0 };
        if h & 0x10 != 0 {
            h -= 6;
        }
        let result = (l & 0x0f) | (h << 4);
        self.set_carry_flag((h & 0xff) < 15);
        self.set_zero_flag(result == 0);
        self.set_negative_flag(false);
        self.set_overflow_flag(false);
        (result & 0xff) as u8
    }

    /// Compare a register against an operand. Negative follows the sign of
    /// the mathematical difference, which is not what NMOS silicon does
    /// (silicon takes bit 7 of the masked subtraction); callers depend on
    /// this rule as-is.
    pub fn compare(&mut self, reg: u8, operand: u8) {
        self.set_carry_flag(reg >= operand);
        self.set_zero_flag(reg == operand);
        self.set_negative_flag(reg as i16 - operand as i16 > 0);
    }

    /// Shift left one bit; Carry takes the old bit 7.
    pub fn asl(&mut self, value: u8) -> u8 {
        self.set_carry_flag(value & 0x80 != 0);
        value << 1
    }

    /// Shift right one bit with zero fill; Carry takes the old bit 0.
    pub fn lsr(&mut self, value: u8) -> u8 {
        self.set_carry_flag(value & 0x01 != 0);
        value >> 1
    }

    /// Set Zero and Negative from a register value.
    pub fn set_arithmetic_flags(&mut self, value: u8) {
        self.zero = value == 0;
        self.negative = value & 0x80 != 0;
    }

    // Stack discipline: fixed to page 1, SP treated modulo 256.

    pub fn stack_push(&mut self, value: u8) {
        self.bus.write(0x0100 + self.sp as u16, value);
        self.sp = self.sp.wrapping_sub(1);
    }

    pub fn stack_pop(&mut self) -> u8 {
        self.sp = self.sp.wrapping_add(1);
        self.bus.read(0x0100 + self.sp as u16)
    }

    /// Read the byte on top of the stack without moving SP.
    pub fn stack_peek(&mut self) -> u8 {
        self.bus.read(0x0100 + self.sp as u16 + 1)
    }

    fn increment_pc(&mut self) {
        self.pc = self.pc.wrapping_add(1);
    }

    // Register accessors

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn set_a(&mut self, value: u8) {
        self.a = value;
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn set_x(&mut self, value: u8) {
        self.x = value;
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn set_y(&mut self, value: u8) {
        self.y = value;
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn set_pc(&mut self, address: u16) {
        self.pc = address;
    }

    pub fn sp(&self) -> u8 {
        self.sp
    }

    pub fn set_sp(&mut self, offset: u8) {
        self.sp = offset;
    }

    /// Opcode byte of the most recently executed instruction.
    pub fn ir(&self) -> u8 {
        self.ir
    }

    // Flag accessors

    pub fn carry_flag(&self) -> bool {
        self.carry
    }

    pub fn carry_bit(&self) -> u8 {
        self.carry as u8
    }

    pub fn set_carry_flag(&mut self, value: bool) {
        self.carry = value;
    }

    pub fn set_carry(&mut self) {
        self.carry = true;
    }

    pub fn clear_carry(&mut self) {
        self.carry = false;
    }

    pub fn zero_flag(&self) -> bool {
        self.zero
    }

    pub fn zero_bit(&self) -> u8 {
        self.zero as u8
    }

    pub fn set_zero_flag(&mut self, value: bool) {
        self.zero = value;
    }

    pub fn set_zero(&mut self) {
        self.zero = true;
    }

    pub fn clear_zero(&mut self) {
        self.zero = false;
    }

    pub fn irq_disable_flag(&self) -> bool {
        self.irq_disable
    }

    pub fn irq_disable_bit(&self) -> u8 {
        self.irq_disable as u8
    }

    pub fn set_irq_disable_flag(&mut self, value: bool) {
        self.irq_disable = value;
    }

    pub fn set_irq_disable(&mut self) {
        self.irq_disable = true;
    }

    pub fn clear_irq_disable(&mut self) {
        self.irq_disable = false;
    }

    pub fn decimal_mode_flag(&self) -> bool {
        self.decimal
    }

    pub fn decimal_mode_bit(&self) -> u8 {
        self.decimal as u8
    }

    pub fn set_decimal_mode_flag(&mut self, value: bool) {
        self.decimal = value;
    }

    pub fn set_decimal_mode(&mut self) {
        self.decimal = true;
    }

    pub fn clear_decimal_mode(&mut self) {
        self.decimal = false;
    }

    pub fn break_flag(&self) -> bool {
        self.brk
    }

    pub fn break_bit(&self) -> u8 {
        self.carry as u8
    }

    pub fn set_break_flag(&mut self, value: bool) {
        self.brk = value;
    }

    pub fn set_break(&mut self) {
        self.brk = true;
    }

    pub fn clear_break(&mut self) {
        self.brk = false;
    }

    pub fn overflow_flag(&self) -> bool {
        self.overflow
    }

    pub fn overflow_bit(&self) -> u8 {
        self.overflow as u8
    }

    pub fn set_overflow_flag(&mut self, value: bool) {
        self.overflow = value;
    }

    pub fn set_overflow(&mut self) {
        self.overflow = true;
    }

    pub fn clear_overflow(&mut self) {
        self.overflow = false;
    }

    pub fn negative_flag(&self) -> bool {
        self.negative
    }

    pub fn negative_bit(&self) -> u8 {
        self.negative as u8
    }

    pub fn set_negative_flag(&mut self, value: bool) {
        self.negative = value;
    }

    pub fn set_negative(&mut self) {
        self.negative = true;
    }

    pub fn clear_negative(&mut self) {
        self.negative = false;
    }

    // Status register packing

    /// Pack the seven flags into a status byte. The reserved bit 5 always
    /// reads as set.
    pub fn processor_status(&self) -> u8 {
        let mut status = P_RESERVED;
        if self.carry {
            status |= P_CARRY;
        }
        if self.zero {
            status |= P_ZERO;
        }
        if self.irq_disable {
            status |= P_IRQ_DISABLE;
        }
        if self.decimal {
            status |= P_DECIMAL;
        }
        if self.brk {
            status |= P_BREAK;
        }
        if self.overflow {
            status |= P_OVERFLOW;
        }
        if self.negative {
            status |= P_NEGATIVE;
        }
        status
    }

    /// Unpack a status byte into the seven flags, ignoring the reserved
    /// bit. Exact inverse of [`Cpu::processor_status`] on those flags.
    pub fn set_processor_status(&mut self, value: u8) {
        self.carry = value & P_CARRY != 0;
        self.zero = value & P_ZERO != 0;
        self.irq_disable = value & P_IRQ_DISABLE != 0;
        self.decimal = value & P_DECIMAL != 0;
        self.brk = value & P_BREAK != 0;
        self.overflow = value & P_OVERFLOW != 0;
        self.negative = value & P_NEGATIVE != 0;
    }

    /// Render the flags as `[NV-BDIZC]`, with `.` for each clear flag and
    /// a literal `-` in the reserved position.
    pub fn status_register_string(&self) -> String {
        format!(
            "[{}{}-{}{}{}{}{}]",
            if self.negative { 'N' } else { '.' },
            if self.overflow { 'V' } else { '.' },
            if self.brk { 'B' } else { '.' },
            if self.decimal { 'D' } else { '.' },
            if self.irq_disable { 'I' } else { '.' },
            if self.zero { 'Z' } else { '.' },
            if self.carry { 'C' } else { '.' },
        )
    }
}

impl<B: Bus> fmt::Display for Cpu<B> {
    /// Fixed-width trace line: fetch address, decoded mnemonic, registers,
    /// and the flag string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mnemonic = instruction::disassemble(self.ir, self.operands[0], self.operands[1]);
        write!(
            f,
            "${:04X}   {:<14}A=${:02X}  X=${:02X}  Y=${:02X}  PC=${:04X}  P={}",
            self.addr,
            mnemonic,
            self.a,
            self.x,
            self.y,
            self.pc,
            self.status_register_string()
        )
    }
}

/// Combine low and high bytes into a 16-bit address.
fn address(lo: u8, hi: u8) -> u16 {
    (hi as u16) << 8 | lo as u16
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::FlatMemory;

    fn cpu_with_program(program: &[u8]) -> Cpu<FlatMemory> {
        let mut memory = FlatMemory::new();
        memory.load(DEFAULT_BASE_ADDRESS, program).unwrap();
        memory.set_reset_vector(DEFAULT_BASE_ADDRESS);
        let mut cpu = Cpu::new(memory);
        cpu.reset();
        cpu
    }

    #[test]
    fn test_reset_state() {
        let mut cpu = cpu_with_program(&[]);
        cpu.set_carry();
        cpu.set_irq_disable();
        cpu.set_decimal_mode();
        cpu.set_break();
        cpu.set_overflow();
        cpu.set_zero();
        cpu.set_negative();
        cpu.set_sp(0x10);
        cpu.reset();

        assert_eq!(cpu.sp(), 0xff);
        assert_eq!(cpu.pc(), DEFAULT_BASE_ADDRESS);
        assert_eq!(cpu.ir(), 0);
        assert!(!cpu.carry_flag());
        assert!(!cpu.irq_disable_flag());
        assert!(!cpu.decimal_mode_flag());
        assert!(!cpu.break_flag());
        assert!(!cpu.overflow_flag());
        // Zero and Negative survive reset.
        assert!(cpu.zero_flag());
        assert!(cpu.negative_flag());
    }

    #[test]
    fn test_lda_immediate() {
        let mut cpu = cpu_with_program(&[0xa9, 0x42]);
        cpu.step();
        assert_eq!(cpu.a(), 0x42);
        assert_eq!(cpu.pc(), DEFAULT_BASE_ADDRESS + 2);
        assert!(!cpu.zero_flag());
        assert!(!cpu.negative_flag());
    }

    #[test]
    fn test_lda_sets_zero_and_negative() {
        let mut cpu = cpu_with_program(&[0xa9, 0x00, 0xa9, 0x80]);
        cpu.step();
        assert!(cpu.zero_flag());
        assert!(!cpu.negative_flag());
        cpu.step();
        assert!(!cpu.zero_flag());
        assert!(cpu.negative_flag());
    }

    #[test]
    fn test_ldx_ldy_immediate() {
        let mut cpu = cpu_with_program(&[0xa2, 0x13, 0xa0, 0x21]);
        cpu.step_n(2);
        assert_eq!(cpu.x(), 0x13);
        assert_eq!(cpu.y(), 0x21);
    }

    #[test]
    fn test_register_transfers() {
        // LDA #$7F, TAX, TAY, LDA #$00, TXA, TYA
        let mut cpu = cpu_with_program(&[0xa9, 0x7f, 0xaa, 0xa8, 0xa9, 0x00, 0x8a, 0x98]);
        cpu.step_n(4);
        assert_eq!(cpu.x(), 0x7f);
        assert_eq!(cpu.y(), 0x7f);
        assert_eq!(cpu.a(), 0x00);
        cpu.step();
        assert_eq!(cpu.a(), 0x7f);
        cpu.step();
        assert_eq!(cpu.a(), 0x7f);
    }

    #[test]
    fn test_txs_and_tsx() {
        // LDX #$20, TXS, LDX #$00, TSX
        let mut cpu = cpu_with_program(&[0xa2, 0x20, 0x9a, 0xa2, 0x00, 0xba]);
        cpu.step_n(2);
        assert_eq!(cpu.sp(), 0x20);
        // TXS sets no flags.
        assert!(!cpu.zero_flag());
        cpu.step_n(2);
        assert_eq!(cpu.x(), 0x20);
    }

    #[test]
    fn test_increment_decrement_wrap() {
        // LDX #$FF, INX, LDY #$00, DEY
        let mut cpu = cpu_with_program(&[0xa2, 0xff, 0xe8, 0xa0, 0x00, 0x88]);
        cpu.step_n(2);
        assert_eq!(cpu.x(), 0x00);
        assert!(cpu.zero_flag());
        cpu.step_n(2);
        assert_eq!(cpu.y(), 0xff);
        assert!(cpu.negative_flag());
    }

    #[test]
    fn test_logical_immediate_ops() {
        // LDA #$0F, ORA #$F0, AND #$3C, EOR #$FF
        let mut cpu = cpu_with_program(&[0xa9, 0x0f, 0x09, 0xf0, 0x29, 0x3c, 0x49, 0xff]);
        cpu.step_n(2);
        assert_eq!(cpu.a(), 0xff);
        assert!(cpu.negative_flag());
        cpu.step();
        assert_eq!(cpu.a(), 0x3c);
        cpu.step();
        assert_eq!(cpu.a(), 0xc3);
    }

    #[test]
    fn test_ora_zero_page() {
        let mut cpu = cpu_with_program(&[0xa9, 0x01, 0x05, 0x10]);
        cpu.bus.write(0x0010, 0x80);
        cpu.step_n(2);
        assert_eq!(cpu.a(), 0x81);
        assert!(cpu.negative_flag());
    }

    #[test]
    fn test_asl_zero_page() {
        let mut cpu = cpu_with_program(&[0x06, 0x10]);
        cpu.bus.write(0x0010, 0x81);
        cpu.step();
        assert_eq!(cpu.bus.read(0x0010), 0x02);
        assert!(cpu.carry_flag());
        assert!(!cpu.zero_flag());
        assert!(!cpu.negative_flag());
    }

    #[test]
    fn test_shift_routines() {
        let mut cpu = cpu_with_program(&[]);
        assert_eq!(cpu.asl(0x40), 0x80);
        assert!(!cpu.carry_flag());
        assert_eq!(cpu.asl(0x81), 0x02);
        assert!(cpu.carry_flag());

        assert_eq!(cpu.lsr(0x02), 0x01);
        assert!(!cpu.carry_flag());
        assert_eq!(cpu.lsr(0x81), 0x40);
        assert!(cpu.carry_flag());
    }

    #[test]
    fn test_bit_zero_page() {
        let mut cpu = cpu_with_program(&[0xa9, 0xc0, 0x24, 0x10, 0xa9, 0x0f, 0x24, 0x10]);
        cpu.bus.write(0x0010, 0xc0);
        cpu.step_n(2);
        assert!(!cpu.zero_flag());
        assert!(cpu.negative_flag());
        assert!(cpu.overflow_flag());
        // A=$0F against $C0 masks to zero.
        cpu.step_n(2);
        assert!(cpu.zero_flag());
        assert!(!cpu.negative_flag());
        assert!(!cpu.overflow_flag());
    }

    #[test]
    fn test_flag_instructions() {
        // SEC, CLC, SEI, CLI, SED, CLD
        let mut cpu = cpu_with_program(&[0x38, 0x18, 0x78, 0x58, 0xf8, 0xd8]);
        cpu.step();
        assert!(cpu.carry_flag());
        cpu.step();
        assert!(!cpu.carry_flag());
        cpu.step();
        assert!(cpu.irq_disable_flag());
        cpu.step();
        assert!(!cpu.irq_disable_flag());
        cpu.step();
        assert!(cpu.decimal_mode_flag());
        cpu.step();
        assert!(!cpu.decimal_mode_flag());
    }

    #[test]
    fn test_clv() {
        let mut cpu = cpu_with_program(&[0xb8]);
        cpu.set_overflow();
        cpu.step();
        assert!(!cpu.overflow_flag());
    }

    #[test]
    fn test_adc_immediate_binary() {
        // CLC implied by reset; LDA #$50, ADC #$50
        let mut cpu = cpu_with_program(&[0xa9, 0x50, 0x69, 0x50]);
        cpu.step_n(2);
        assert_eq!(cpu.a(), 0xa0);
        assert!(!cpu.carry_flag());
        assert!(cpu.overflow_flag());
        assert!(cpu.negative_flag());
    }

    #[test]
    fn test_adc_carry_out() {
        let mut cpu = cpu_with_program(&[0xa9, 0xff, 0x69, 0x01]);
        cpu.step_n(2);
        assert_eq!(cpu.a(), 0x00);
        assert!(cpu.carry_flag());
        assert!(cpu.zero_flag());
        assert!(!cpu.overflow_flag());
    }

    #[test]
    fn test_sbc_immediate_binary() {
        // SEC, LDA #$10, SBC #$05
        let mut cpu = cpu_with_program(&[0x38, 0xa9, 0x10, 0xe9, 0x05]);
        cpu.step_n(3);
        assert_eq!(cpu.a(), 0x0b);
        assert!(cpu.carry_flag());
    }

    #[test]
    fn test_adc_decimal_mode_dispatch() {
        // SED, LDA #$05, ADC #$05
        let mut cpu = cpu_with_program(&[0xf8, 0xa9, 0x05, 0x69, 0x05]);
        cpu.step_n(3);
        assert_eq!(cpu.a(), 0x10);
        assert!(!cpu.carry_flag());
    }

    #[test]
    fn test_adc_decimal_five_plus_five() {
        let mut cpu = cpu_with_program(&[]);
        cpu.clear_carry();
        let result = cpu.adc_decimal(0x05, 0x05);
        assert_eq!(result, 0x10);
        assert!(!cpu.carry_flag());
        assert!(!cpu.zero_flag());
        assert!(!cpu.negative_flag());
        assert!(!cpu.overflow_flag());
    }

    #[test]
    fn test_adc_decimal_ninety_nine_plus_one() {
        let mut cpu = cpu_with_program(&[]);
        cpu.clear_carry();
        let result = cpu.adc_decimal(0x99, 0x01);
        assert_eq!(result, 0x00);
        assert!(cpu.carry_flag());
        assert!(cpu.zero_flag());
    }

    #[test]
    fn test_sbc_decimal() {
        let mut cpu = cpu_with_program(&[]);
        cpu.set_carry();
        let result = cpu.sbc_decimal(0x10, 0x05);
        assert_eq!(result, 0x05);
        assert!(cpu.carry_flag());

        cpu.set_carry();
        let result = cpu.sbc_decimal(0x10, 0x20);
        assert_eq!(result, 0x90);
        assert!(!cpu.carry_flag());
        assert!(!cpu.negative_flag());
        assert!(!cpu.overflow_flag());
    }

    #[test]
    fn test_adc_sbc_inverse_property() {
        let mut cpu = cpu_with_program(&[]);
        for acc in 0..=255u8 {
            for operand in 0..=255u8 {
                cpu.clear_carry();
                let sum = cpu.adc(acc, operand);
                cpu.set_carry();
                let restored = cpu.sbc(sum, operand);
                assert_eq!(restored, acc, "acc={:#04x} operand={:#04x}", acc, operand);
            }
        }
    }

    #[test]
    fn test_compare_flags() {
        let mut cpu = cpu_with_program(&[]);
        cpu.compare(0x10, 0x10);
        assert!(cpu.carry_flag());
        assert!(cpu.zero_flag());
        assert!(!cpu.negative_flag());

        cpu.compare(0x20, 0x10);
        assert!(cpu.carry_flag());
        assert!(!cpu.zero_flag());
        assert!(cpu.negative_flag());
    }

    #[test]
    fn test_compare_negative_uses_signed_difference() {
        let mut cpu = cpu_with_program(&[]);
        // 0x00 - 0x01 is mathematically negative, so Negative stays clear
        // under the (reg - operand) > 0 rule even though bit 7 of the
        // masked result would be set.
        cpu.compare(0x00, 0x01);
        assert!(!cpu.carry_flag());
        assert!(!cpu.zero_flag());
        assert!(!cpu.negative_flag());
    }

    #[test]
    fn test_cmp_cpx_cpy_opcodes() {
        // LDA #$30, CMP #$20, LDX #$10, CPX #$10, LDY #$00, CPY #$01
        let mut cpu = cpu_with_program(&[
            0xa9, 0x30, 0xc9, 0x20, 0xa2, 0x10, 0xe0, 0x10, 0xa0, 0x00, 0xc0, 0x01,
        ]);
        cpu.step_n(2);
        assert!(cpu.carry_flag());
        assert!(cpu.negative_flag());
        cpu.step_n(2);
        assert!(cpu.carry_flag());
        assert!(cpu.zero_flag());
        cpu.step_n(2);
        assert!(!cpu.carry_flag());
        assert!(!cpu.zero_flag());
    }

    #[test]
    fn test_jmp_absolute() {
        let mut cpu = cpu_with_program(&[0x4c, 0x34, 0x12]);
        cpu.step();
        assert_eq!(cpu.pc(), 0x1234);
    }

    #[test]
    fn test_rts() {
        let mut cpu = cpu_with_program(&[0x60]);
        cpu.stack_push(0x03);
        cpu.stack_push(0xff);
        cpu.step();
        assert_eq!(cpu.pc(), 0x0400);
    }

    #[test]
    fn test_pha_pla() {
        // LDA #$42, PHA, LDA #$00, PLA
        let mut cpu = cpu_with_program(&[0xa9, 0x42, 0x48, 0xa9, 0x00, 0x68]);
        cpu.step_n(2);
        assert_eq!(cpu.sp(), 0xfe);
        cpu.step_n(2);
        assert_eq!(cpu.a(), 0x42);
        assert_eq!(cpu.sp(), 0xff);
        assert!(!cpu.zero_flag());
    }

    #[test]
    fn test_php_plp_round_trip() {
        // SEC, SED, PHP, CLC, CLD, PLP
        let mut cpu = cpu_with_program(&[0x38, 0xf8, 0x08, 0x18, 0xd8, 0x28]);
        cpu.step_n(5);
        assert!(!cpu.carry_flag());
        assert!(!cpu.decimal_mode_flag());
        cpu.step();
        assert!(cpu.carry_flag());
        assert!(cpu.decimal_mode_flag());
    }

    #[test]
    fn test_brk_rti_round_trip() {
        // SEC at $0200, BRK at $0201; handler at $0300 is a lone RTI.
        let mut cpu = cpu_with_program(&[0x38, 0x00]);
        cpu.bus.set_irq_vector(0x0300);
        cpu.bus.write(0x0300, 0x40);

        cpu.step_n(2);
        assert_eq!(cpu.pc(), 0x0300);
        assert!(cpu.irq_disable_flag());
        assert!(cpu.break_flag());

        cpu.step();
        // BRK pushed PC+2 relative to its post-fetch PC of $0202.
        assert_eq!(cpu.pc(), 0x0204);
        assert!(cpu.carry_flag());
        assert!(cpu.break_flag());
        assert!(!cpu.irq_disable_flag());
        assert_eq!(cpu.sp(), 0xff);
    }

    #[test]
    fn test_brk_is_ignored_while_irq_disabled() {
        // SEI, BRK
        let mut cpu = cpu_with_program(&[0x78, 0x00]);
        cpu.bus.set_irq_vector(0x0300);
        cpu.step_n(2);
        assert_eq!(cpu.pc(), DEFAULT_BASE_ADDRESS + 2);
        assert_eq!(cpu.sp(), 0xff);
        assert!(!cpu.break_flag());
    }

    #[test]
    fn test_pc_wraparound() {
        let mut memory = FlatMemory::new();
        memory.write(0xffff, 0xa9);
        memory.write(0x0000, 0x42);
        memory.set_reset_vector(0xffff);
        let mut cpu = Cpu::new(memory);
        cpu.reset();
        cpu.step();
        assert_eq!(cpu.a(), 0x42);
        assert_eq!(cpu.pc(), 0x0001);
    }

    #[test]
    fn test_stack_lifo_and_wraparound() {
        let mut cpu = cpu_with_program(&[]);
        for i in 0..=255u8 {
            cpu.stack_push(i);
        }
        assert_eq!(cpu.sp(), 0xff);
        for i in (0..=255u8).rev() {
            assert_eq!(cpu.stack_pop(), i);
        }
        assert_eq!(cpu.sp(), 0xff);
    }

    #[test]
    fn test_stack_peek_does_not_move_sp() {
        let mut cpu = cpu_with_program(&[]);
        cpu.stack_push(0x42);
        let sp = cpu.sp();
        assert_eq!(cpu.stack_peek(), 0x42);
        assert_eq!(cpu.sp(), sp);
    }

    #[test]
    fn test_status_round_trip() {
        let mut cpu = cpu_with_program(&[]);
        for value in 0..=255u16 {
            let value = value as u8;
            cpu.set_processor_status(value);
            assert_eq!(cpu.processor_status(), value | P_RESERVED);
        }
    }

    #[test]
    fn test_status_reserved_bit_always_set() {
        let mut cpu = cpu_with_program(&[]);
        cpu.set_processor_status(0x00);
        assert_eq!(cpu.processor_status() & P_RESERVED, P_RESERVED);
    }

    #[test]
    fn test_status_register_string() {
        let mut cpu = cpu_with_program(&[]);
        assert_eq!(cpu.status_register_string(), "[..-.....]");
        cpu.set_processor_status(0xff);
        assert_eq!(cpu.status_register_string(), "[NV-BDIZC]");
        cpu.set_processor_status(P_CARRY | P_ZERO);
        assert_eq!(cpu.status_register_string(), "[..-...ZC]");
    }

    #[test]
    fn test_trace_line_format() {
        let mut cpu = cpu_with_program(&[0xa9, 0x42]);
        cpu.step();
        assert_eq!(
            cpu.to_string(),
            "$0200   LDA #$42      A=$42  X=$00  Y=$00  PC=$0202  P=[..-.....]"
        );
    }

    #[test]
    fn test_break_bit_mirrors_carry() {
        let mut cpu = cpu_with_program(&[]);
        cpu.set_carry();
        cpu.clear_break();
        assert_eq!(cpu.break_bit(), 1);
        cpu.clear_carry();
        cpu.set_break();
        assert_eq!(cpu.break_bit(), 0);
    }

    #[test]
    fn test_unimplemented_opcode_is_silent_noop() {
        let mut cpu = cpu_with_program(&[0x02]);
        cpu.step();
        assert_eq!(cpu.pc(), DEFAULT_BASE_ADDRESS + 1);
        assert_eq!(cpu.a(), 0);
        assert_eq!(cpu.x(), 0);
        assert_eq!(cpu.y(), 0);
        assert_eq!(cpu.sp(), 0xff);
        assert_eq!(cpu.processor_status(), P_RESERVED);
    }

    #[test]
    fn test_unimplemented_opcode_still_consumes_operands() {
        // JSR has a defined length of 3 even though its body is not
        // implemented, so the two operand bytes are fetched and skipped.
        let mut cpu = cpu_with_program(&[0x20, 0x34, 0x12, 0xa9, 0x01]);
        cpu.step();
        assert_eq!(cpu.pc(), DEFAULT_BASE_ADDRESS + 3);
        cpu.step();
        assert_eq!(cpu.a(), 0x01);
    }

    #[test]
    fn test_nop() {
        let mut cpu = cpu_with_program(&[0xea]);
        cpu.step();
        assert_eq!(cpu.pc(), DEFAULT_BASE_ADDRESS + 1);
        assert_eq!(cpu.processor_status(), P_RESERVED);
    }

    #[test]
    fn test_step_n() {
        let mut cpu = cpu_with_program(&[0xa9, 0x01, 0xa9, 0x02, 0xa9, 0x03]);
        cpu.step_n(3);
        assert_eq!(cpu.a(), 0x03);
        assert_eq!(cpu.pc(), DEFAULT_BASE_ADDRESS + 6);
    }
}
