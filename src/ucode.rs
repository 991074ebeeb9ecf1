//! Components relating to the microinstruction control word.
//!
//! This module consists of:
//! - [`Register`]: the named datapath registers,
//! - [`MicroInstruction`]: one decoded control word,
//! - [`signal`]: the fixed-width signal sets a control word is made of,
//! - [`decode`]: mnemonic reconstruction (control word → MAL-style text).
//!
//! # Usage
//!
//! A [`MicroInstruction`] is normally produced by the control store loader
//! (see [`crate::store`]), but it can also be built by hand:
//!
//! ```
//! use mic1_core::ucode::signal::{AluSignals, CBusSignals, JmpSignals, MemSignals};
//! use mic1_core::ucode::{MicroInstruction, Register};
//!
//! let mut alu = AluSignals::new();
//! alu.set_f0(true);
//! alu.set_f1(true);
//! alu.set_ena(true);
//! alu.set_enb(true);
//! let mut cbus = CBusSignals::new();
//! cbus.set_h(true);
//!
//! let instr = MicroInstruction::new(
//!     0x57,
//!     JmpSignals::new(),
//!     alu,
//!     cbus,
//!     MemSignals::new(),
//!     Some(Register::Tos),
//! );
//! assert_eq!(instr.to_string(), "H=A+B;goto 0x57");
//! assert_eq!(instr.b_bus_name(), "TOS");
//! ```

pub mod decode;
pub mod signal;

use signal::{AluSignals, CBusSignals, JmpSignals, MemSignals};

/// A register on the Mic-1 datapath.
///
/// Nine of these can be gated onto the B bus as the ALU's B input (see
/// [`Register::from_b_bus_index`]); all but `MBR` and `MBRU` can be driven
/// from the C bus.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Register {
    /// Memory address register.
    Mar,
    /// Memory data register.
    Mdr,
    /// Program counter (into the macro code area).
    Pc,
    /// Memory byte register, read sign-extended.
    Mbr,
    /// Memory byte register, read zero-extended.
    Mbru,
    /// Stack pointer.
    Sp,
    /// Local variable frame pointer.
    Lv,
    /// Constant pool pointer.
    Cpp,
    /// Top-of-stack cache.
    Tos,
    /// Old program counter (scratch register).
    Opc,
    /// Holding register; the fixed A input of the ALU.
    H,
}

impl Register {
    /// Every register on the datapath.
    pub const ALL: [Register; 11] = [
        Register::Mar,
        Register::Mdr,
        Register::Pc,
        Register::Mbr,
        Register::Mbru,
        Register::Sp,
        Register::Lv,
        Register::Cpp,
        Register::Tos,
        Register::Opc,
        Register::H,
    ];

    /// The register's canonical (upper-case) name.
    pub fn name(self) -> &'static str {
        match self {
            Register::Mar  => "MAR",
            Register::Mdr  => "MDR",
            Register::Pc   => "PC",
            Register::Mbr  => "MBR",
            Register::Mbru => "MBRU",
            Register::Sp   => "SP",
            Register::Lv   => "LV",
            Register::Cpp  => "CPP",
            Register::Tos  => "TOS",
            Register::Opc  => "OPC",
            Register::H    => "H",
        }
    }

    /// Decodes a B-bus selector index into the register it gates onto the bus.
    ///
    /// Indices 0 through 8 select a register; every other value means nothing
    /// drives the B bus.
    pub fn from_b_bus_index(index: u8) -> Option<Register> {
        match index {
            0 => Some(Register::Mdr),
            1 => Some(Register::Pc),
            2 => Some(Register::Mbr),
            3 => Some(Register::Mbru),
            4 => Some(Register::Sp),
            5 => Some(Register::Lv),
            6 => Some(Register::Cpp),
            7 => Some(Register::Tos),
            8 => Some(Register::Opc),
            _ => None,
        }
    }

    /// The register's B-bus selector index, if it can be gated onto the B bus.
    ///
    /// This is the inverse of [`Register::from_b_bus_index`]. `MAR` and `H`
    /// are not B-bus sources and return `None`.
    pub fn b_bus_index(self) -> Option<u8> {
        match self {
            Register::Mdr  => Some(0),
            Register::Pc   => Some(1),
            Register::Mbr  => Some(2),
            Register::Mbru => Some(3),
            Register::Sp   => Some(4),
            Register::Lv   => Some(5),
            Register::Cpp  => Some(6),
            Register::Tos  => Some(7),
            Register::Opc  => Some(8),
            Register::Mar | Register::H => None,
        }
    }
}
impl std::fmt::Display for Register {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
impl std::str::FromStr for Register {
    type Err = RegisterNameErr;

    /// Parses a register name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Register::ALL.into_iter()
            .find(|reg| reg.name().eq_ignore_ascii_case(s))
            .ok_or(RegisterNameErr)
    }
}

/// The error resulting from parsing a name that is not a datapath register.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct RegisterNameErr;

impl std::fmt::Display for RegisterNameErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("no such register on the datapath")
    }
}
impl std::error::Error for RegisterNameErr {}

/// One decoded control word.
///
/// A microinstruction combines the 9-bit next micro address, the four signal
/// groups (jump, ALU/shifter, C bus, memory), and the B-bus register
/// selector. It is created once per decode and immutable thereafter: the
/// signal-group accessors return copies, so a stored instruction can never be
/// modified through them.
///
/// Equality and hashing are structural across all six fields.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct MicroInstruction {
    next_address: u16,
    jmp: JmpSignals,
    alu: AluSignals,
    cbus: CBusSignals,
    mem: MemSignals,
    b_bus: Option<Register>,
}

impl MicroInstruction {
    /// Mask applied to every next-address value (the micro PC is 9 bits wide).
    pub const ADDRESS_MASK: u16 = 0x1FF;

    /// Creates a new microinstruction.
    ///
    /// `next_address` is masked to 9 bits.
    pub fn new(
        next_address: u16,
        jmp: JmpSignals,
        alu: AluSignals,
        cbus: CBusSignals,
        mem: MemSignals,
        b_bus: Option<Register>,
    ) -> Self {
        Self {
            next_address: next_address & Self::ADDRESS_MASK,
            jmp,
            alu,
            cbus,
            mem,
            b_bus,
        }
    }

    /// The address of the microinstruction to execute next (9 bits).
    pub fn next_address(&self) -> u16 {
        self.next_address
    }
    /// A copy of the jump control lines.
    pub fn jmp(&self) -> JmpSignals {
        self.jmp
    }
    /// A copy of the shifter and ALU control lines.
    pub fn alu(&self) -> AluSignals {
        self.alu
    }
    /// A copy of the C-bus write-enable lines.
    pub fn cbus(&self) -> CBusSignals {
        self.cbus
    }
    /// A copy of the memory port lines.
    pub fn mem(&self) -> MemSignals {
        self.mem
    }
    /// The register gated onto the B bus this cycle, if any.
    pub fn b_bus(&self) -> Option<Register> {
        self.b_bus
    }
    /// The name of the B-bus register, or `"???"` if nothing is selected.
    pub fn b_bus_name(&self) -> &'static str {
        match self.b_bus {
            Some(reg) => reg.name(),
            None => "???",
        }
    }
}
impl std::fmt::Debug for MicroInstruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        struct Addr(u16);
        impl std::fmt::Debug for Addr {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "0x{:X}", self.0)
            }
        }

        f.debug_struct("MicroInstruction")
            .field("next_address", &Addr(self.next_address))
            .field("jmp", &self.jmp)
            .field("alu", &self.alu)
            .field("cbus", &self.cbus)
            .field("mem", &self.mem)
            .field("b_bus", &self.b_bus)
            .finish()
    }
}
