//! # Instruction Metadata
//!
//! Static per-opcode data for all 256 opcode byte values: mnemonic,
//! addressing mode, and instruction byte length. The table drives operand
//! fetching in the execution engine and mnemonic formatting for trace
//! output, independently of whether a given opcode body is implemented.

/// Addressing mode of an instruction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Mode {
    Implied,
    Accumulator,
    Immediate,
    ZeroPage,
    ZeroPageX,
    ZeroPageY,
    Absolute,
    AbsoluteX,
    AbsoluteY,
    Indirect,
    IndirectX,
    IndirectY,
    Relative,
    /// Opcode value with no documented instruction.
    None,
}

impl Mode {
    /// Total instruction length in bytes, opcode included.
    pub const fn size(self) -> u8 {
        match self {
            Mode::Implied | Mode::Accumulator | Mode::None => 1,
            Mode::Immediate
            | Mode::ZeroPage
            | Mode::ZeroPageX
            | Mode::ZeroPageY
            | Mode::IndirectX
            | Mode::IndirectY
            | Mode::Relative => 2,
            Mode::Absolute | Mode::AbsoluteX | Mode::AbsoluteY | Mode::Indirect => 3,
        }
    }
}

/// One entry of the opcode table.
#[derive(Debug, Copy, Clone)]
pub struct Instruction {
    pub mnemonic: Option<&'static str>,
    pub mode: Mode,
}

impl Instruction {
    pub const fn size(&self) -> u8 {
        self.mode.size()
    }
}

const fn op(mnemonic: &'static str, mode: Mode) -> Instruction {
    Instruction {
        mnemonic: Some(mnemonic),
        mode,
    }
}

const UNDEFINED: Instruction = Instruction {
    mnemonic: None,
    mode: Mode::None,
};

/// Opcode table, total over all 256 byte values. Undocumented opcodes map
/// to [`UNDEFINED`] (no mnemonic, length 1).
pub static INSTRUCTIONS: [Instruction; 256] = {
    use Mode::*;
    let mut t = [UNDEFINED; 256];

    // 0x00
    t[0x00] = op("BRK", Implied);
    t[0x01] = op("ORA", IndirectX);
    t[0x05] = op("ORA", ZeroPage);
    t[0x06] = op("ASL", ZeroPage);
    t[0x08] = op("PHP", Implied);
    t[0x09] = op("ORA", Immediate);
    t[0x0a] = op("ASL", Accumulator);
    t[0x0d] = op("ORA", Absolute);
    t[0x0e] = op("ASL", Absolute);
    // 0x10
    t[0x10] = op("BPL", Relative);
    t[0x11] = op("ORA", IndirectY);
    t[0x15] = op("ORA", ZeroPageX);
    t[0x16] = op("ASL", ZeroPageX);
    t[0x18] = op("CLC", Implied);
    t[0x19] = op("ORA", AbsoluteY);
    t[0x1d] = op("ORA", AbsoluteX);
    t[0x1e] = op("ASL", AbsoluteX);
    // 0x20
    t[0x20] = op("JSR", Absolute);
    t[0x21] = op("AND", IndirectX);
    t[0x24] = op("BIT", ZeroPage);
    t[0x25] = op("AND", ZeroPage);
    t[0x26] = op("ROL", ZeroPage);
    t[0x28] = op("PLP", Implied);
    t[0x29] = op("AND", Immediate);
    t[0x2a] = op("ROL", Accumulator);
    t[0x2c] = op("BIT", Absolute);
    t[0x2d] = op("AND", Absolute);
    t[0x2e] = op("ROL", Absolute);
    // 0x30
    t[0x30] = op("BMI", Relative);
    t[0x31] = op("AND", IndirectY);
    t[0x35] = op("AND", ZeroPageX);
    t[0x36] = op("ROL", ZeroPageX);
    t[0x38] = op("SEC", Implied);
    t[0x39] = op("AND", AbsoluteY);
    t[0x3d] = op("AND", AbsoluteX);
    t[0x3e] = op("ROL", AbsoluteX);
    // 0x40
    t[0x40] = op("RTI", Implied);
    t[0x41] = op("EOR", IndirectX);
    t[0x45] = op("EOR", ZeroPage);
    t[0x46] = op("LSR", ZeroPage);
    t[0x48] = op("PHA", Implied);
    t[0x49] = op("EOR", Immediate);
    t[0x4a] = op("LSR", Accumulator);
    t[0x4c] = op("JMP", Absolute);
    t[0x4d] = op("EOR", Absolute);
    t[0x4e] = op("LSR", Absolute);
    // 0x50
    t[0x50] = op("BVC", Relative);
    t[0x51] = op("EOR", IndirectY);
    t[0x55] = op("EOR", ZeroPageX);
    t[0x56] = op("LSR", ZeroPageX);
    t[0x58] = op("CLI", Implied);
    t[0x59] = op("EOR", AbsoluteY);
    t[0x5d] = op("EOR", AbsoluteX);
    t[0x5e] = op("LSR", AbsoluteX);
    // 0x60
    t[0x60] = op("RTS", Implied);
    t[0x61] = op("ADC", IndirectX);
    t[0x65] = op("ADC", ZeroPage);
    t[0x66] = op("ROR", ZeroPage);
    t[0x68] = op("PLA", Implied);
    t[0x69] = op("ADC", Immediate);
    t[0x6a] = op("ROR", Accumulator);
    t[0x6c] = op("JMP", Indirect);
    t[0x6d] = op("ADC", Absolute);
    t[0x6e] = op("ROR", Absolute);
    // 0x70
    t[0x70] = op("BVS", Relative);
    t[0x71] = op("ADC", IndirectY);
    t[0x75] = op("ADC", ZeroPageX);
    t[0x76] = op("ROR", ZeroPageX);
    t[0x78] = op("SEI", Implied);
    t[0x79] = op("ADC", AbsoluteY);
    t[0x7d] = op("ADC", AbsoluteX);
    t[0x7e] = op("ROR", AbsoluteX);
    // 0x80
    t[0x81] = op("STA", IndirectX);
    t[0x84] = op("STY", ZeroPage);
    t[0x85] = op("STA", ZeroPage);
    t[0x86] = op("STX", ZeroPage);
    t[0x88] = op("DEY", Implied);
    t[0x8a] = op("TXA", Implied);
    t[0x8c] = op("STY", Absolute);
    t[0x8d] = op("STA", Absolute);
    t[0x8e] = op("STX", Absolute);
    // 0x90
    t[0x90] = op("BCC", Relative);
    t[0x91] = op("STA", IndirectY);
    t[0x94] = op("STY", ZeroPageX);
    t[0x95] = op("STA", ZeroPageX);
    t[0x96] = op("STX", ZeroPageY);
    t[0x98] = op("TYA", Implied);
    t[0x99] = op("STA", AbsoluteY);
    t[0x9a] = op("TXS", Implied);
    t[0x9d] = op("STA", AbsoluteX);
    // 0xa0
    t[0xa0] = op("LDY", Immediate);
    t[0xa1] = op("LDA", IndirectX);
    t[0xa2] = op("LDX", Immediate);
    t[0xa4] = op("LDY", ZeroPage);
    t[0xa5] = op("LDA", ZeroPage);
    t[0xa6] = op("LDX", ZeroPage);
    t[0xa8] = op("TAY", Implied);
    t[0xa9] = op("LDA", Immediate);
    t[0xaa] = op("TAX", Implied);
    t[0xac] = op("LDY", Absolute);
    t[0xad] = op("LDA", Absolute);
    t[0xae] = op("LDX", Absolute);
    // 0xb0
    t[0xb0] = op("BCS", Relative);
    t[0xb1] = op("LDA", IndirectY);
    t[0xb4] = op("LDY", ZeroPageX);
    t[0xb5] = op("LDA", ZeroPageX);
    t[0xb6] = op("LDX", ZeroPageY);
    t[0xb8] = op("CLV", Implied);
    t[0xb9] = op("LDA", AbsoluteY);
    t[0xba] = op("TSX", Implied);
    t[0xbc] = op("LDY", AbsoluteX);
    t[0xbd] = op("LDA", AbsoluteX);
    t[0xbe] = op("LDX", AbsoluteY);
    // 0xc0
    t[0xc0] = op("CPY", Immediate);
    t[0xc1] = op("CMP", IndirectX);
    t[0xc4] = op("CPY", ZeroPage);
    t[0xc5] = op("CMP", ZeroPage);
    t[0xc6] = op("DEC", ZeroPage);
    t[0xc8] = op("INY", Implied);
    t[0xc9] = op("CMP", Immediate);
    t[0xca] = op("DEX", Implied);
    t[0xcc] = op("CPY", Absolute);
    t[0xcd] = op("CMP", Absolute);
    t[0xce] = op("DEC", Absolute);
    // 0xd0
    t[0xd0] = op("BNE", Relative);
    t[0xd1] = op("CMP", IndirectY);
    t[0xd5] = op("CMP", ZeroPageX);
    t[0xd6] = op("DEC", ZeroPageX);
    t[0xd8] = op("CLD", Implied);
    t[0xd9] = op("CMP", AbsoluteY);
    t[0xdd] = op("CMP", AbsoluteX);
    t[0xde] = op("DEC", AbsoluteX);
    // 0xe0
    t[0xe0] = op("CPX", Immediate);
    t[0xe1] = op("SBC", IndirectX);
    t[0xe4] = op("CPX", ZeroPage);
    t[0xe5] = op("SBC", ZeroPage);
    t[0xe6] = op("INC", ZeroPage);
    t[0xe8] = op("INX", Implied);
    t[0xe9] = op("SBC", Immediate);
    t[0xea] = op("NOP", Implied);
    t[0xec] = op("CPX", Absolute);
    t[0xed] = op("SBC", Absolute);
    t[0xee] = op("INC", Absolute);
    // 0xf0
    t[0xf0] = op("BEQ", Relative);
    t[0xf1] = op("SBC", IndirectY);
    t[0xf5] = op("SBC", ZeroPageX);
    t[0xf6] = op("INC", ZeroPageX);
    t[0xf8] = op("SED", Implied);
    t[0xf9] = op("SBC", AbsoluteY);
    t[0xfd] = op("SBC", AbsoluteX);
    t[0xfe] = op("INC", AbsoluteX);

    t
};

/// Format an opcode and its operand bytes for trace output. Absolute
/// operands render as `$HHHH`, immediate as `#$HH`; every other mode is
/// just the mnemonic. Undocumented opcodes render as `???`.
pub fn disassemble(opcode: u8, op1: u8, op2: u8) -> String {
    let instruction = &INSTRUCTIONS[opcode as usize];
    let Some(name) = instruction.mnemonic else {
        return "???".to_string();
    };

    match instruction.mode {
        Mode::Absolute => format!("{} ${:04X}", name, (op2 as u16) << 8 | op1 as u16),
        Mode::Immediate => format!("{} #${:02X}", name, op1),
        _ => name.to_string(),
    }
}
