//! Signal sets: the named bit vectors that make up a microinstruction.
//!
//! A [`SignalSet`] is a fixed-width vector of control lines. The width is part
//! of the type, so signal sets of different functional groups cannot be mixed
//! up or copied across each other; that mistake is rejected at compile time.
//!
//! On top of the raw vector, one newtype per functional bus gives each line a
//! name:
//! - [`JmpSignals`]: the jump control lines (`JMPC`, `JMPN`, `JMPZ`),
//! - [`AluSignals`]: the shifter and ALU function lines,
//! - [`CBusSignals`]: which registers the C bus drives,
//! - [`MemSignals`]: the memory port lines (`WRITE`, `READ`, `FETCH`).
//!
//! ```
//! use mic1_core::ucode::signal::AluSignals;
//!
//! let mut alu = AluSignals::new();
//! alu.set_ena(true);
//! alu.set_inc(true);
//! assert!(alu.ena());
//! assert!(!alu.enb());
//! assert_eq!(alu.to_string(), "00001001");
//! ```

use std::fmt::Write as _;

use super::Register;

/// An ordered, fixed-width vector of control lines.
///
/// Equality and hashing are structural: two sets of the same width are equal
/// iff every bit matches. The [`Display`] form is one `'0'`/`'1'` character
/// per bit in index order and is only meant for diagnostics.
///
/// [`Display`]: std::fmt::Display
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub struct SignalSet<const N: usize>([bool; N]);

impl<const N: usize> SignalSet<N> {
    /// The number of lines in this set.
    pub const SIZE: usize = N;

    /// Creates a set with every line deasserted.
    pub fn new() -> Self {
        SignalSet([false; N])
    }

    /// Reads the line at the given index.
    ///
    /// # Panics
    ///
    /// This will panic if `index >= N`. Indices are compile-time constants on
    /// the named groups, so this does not occur in practice.
    pub fn get(&self, index: usize) -> bool {
        self.0[index]
    }

    /// Sets the line at the given index.
    ///
    /// # Panics
    ///
    /// This will panic if `index >= N`.
    pub fn set(&mut self, index: usize, value: bool) {
        self.0[index] = value;
    }

    /// Overwrites this set with the contents of another set of the same width.
    pub fn copy_from(&mut self, other: &SignalSet<N>) {
        self.0 = other.0;
    }

    /// True if any line in the set is asserted.
    pub fn any_set(&self) -> bool {
        self.0.iter().any(|&signal| signal)
    }
}
impl<const N: usize> Default for SignalSet<N> {
    fn default() -> Self {
        Self::new()
    }
}
impl<const N: usize> std::fmt::Display for SignalSet<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &signal in self.0.iter() {
            f.write_char(match signal {
                true  => '1',
                false => '0',
            })?;
        }
        Ok(())
    }
}
impl<const N: usize> std::fmt::Debug for SignalSet<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SignalSet({self})")
    }
}

macro_rules! signal_group {
    (
        $(#[$meta:meta])*
        $Group:ident<$N:literal> {
            $($index:expr => $SIG:ident, $get:ident, $set:ident;)+
        }
    ) => {
        $(#[$meta])*
        #[derive(PartialEq, Eq, Hash, Clone, Copy, Default)]
        pub struct $Group(SignalSet<$N>);

        impl $Group {
            $(
                #[doc = concat!("Bit position of the `", stringify!($SIG), "` line.")]
                pub const $SIG: usize = $index;
            )+

            /// Creates a group with every line deasserted.
            pub fn new() -> Self {
                Self::default()
            }

            $(
                #[doc = concat!("Whether the `", stringify!($SIG), "` line is asserted.")]
                pub fn $get(&self) -> bool {
                    self.0.get(Self::$SIG)
                }
                #[doc = concat!("Asserts or deasserts the `", stringify!($SIG), "` line.")]
                pub fn $set(&mut self, value: bool) {
                    self.0.set(Self::$SIG, value);
                }
            )+

            /// True if any line in the group is asserted.
            pub fn any_set(&self) -> bool {
                self.0.any_set()
            }

            /// Returns a copy of the underlying signal set.
            pub fn signals(&self) -> SignalSet<$N> {
                self.0
            }
        }
        impl std::fmt::Display for $Group {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
        impl std::fmt::Debug for $Group {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!(stringify!($Group), "({})"), self.0)
            }
        }
    };
}

signal_group! {
    /// The jump control lines of a microinstruction.
    ///
    /// `JMPN` and `JMPZ` make the next micro address conditional on the ALU's
    /// N or Z flag; `JMPC` ORs the MBR into the next address for opcode
    /// dispatch.
    JmpSignals<3> {
        0 => JMPC, jmpc, set_jmpc;
        1 => JMPN, jmpn, set_jmpn;
        2 => JMPZ, jmpz, set_jmpz;
    }
}

signal_group! {
    /// The shifter and ALU control lines of a microinstruction.
    ///
    /// `F0`/`F1` select the ALU function, `ENA`/`ENB` enable the two inputs,
    /// `INVA` inverts the A input, and `INC` carries into the low bit.
    /// `SLL8` and `SRA1` drive the shifter that sits after the ALU.
    AluSignals<8> {
        0 => SLL8, sll8, set_sll8;
        1 => SRA1, sra1, set_sra1;
        2 => F0, f0, set_f0;
        3 => F1, f1, set_f1;
        4 => ENA, ena, set_ena;
        5 => ENB, enb, set_enb;
        6 => INVA, inva, set_inva;
        7 => INC, inc, set_inc;
    }
}

signal_group! {
    /// The C-bus write-enable lines of a microinstruction.
    ///
    /// Each asserted line latches the shifter output into that register at
    /// the end of the cycle. Any subset may be asserted at once.
    CBusSignals<9> {
        0 => H, h, set_h;
        1 => OPC, opc, set_opc;
        2 => TOS, tos, set_tos;
        3 => CPP, cpp, set_cpp;
        4 => LV, lv, set_lv;
        5 => SP, sp, set_sp;
        6 => PC, pc, set_pc;
        7 => MDR, mdr, set_mdr;
        8 => MAR, mar, set_mar;
    }
}

signal_group! {
    /// The memory port lines of a microinstruction.
    ///
    /// `READ`/`WRITE` move words through MAR/MDR; `FETCH` moves one byte of
    /// macro code through PC/MBR. The lines are independent.
    MemSignals<3> {
        0 => WRITE, write, set_write;
        1 => READ, read, set_read;
        2 => FETCH, fetch, set_fetch;
    }
}

impl CBusSignals {
    /// Whether the C bus drives the given register this cycle.
    ///
    /// `MBR` and `MBRU` are not C-bus targets and always answer `false`;
    /// they are loaded by the memory port instead.
    pub fn writes(&self, reg: Register) -> bool {
        match reg {
            Register::H    => self.h(),
            Register::Opc  => self.opc(),
            Register::Tos  => self.tos(),
            Register::Cpp  => self.cpp(),
            Register::Lv   => self.lv(),
            Register::Sp   => self.sp(),
            Register::Pc   => self.pc(),
            Register::Mdr  => self.mdr(),
            Register::Mar  => self.mar(),
            Register::Mbr | Register::Mbru => false,
        }
    }
}
