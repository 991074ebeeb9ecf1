//! Mnemonic reconstruction: turning a control word back into MAL-style text.
//!
//! [`decode`] is a pure, total function; every signal combination produces a
//! line of text. [`MicroInstruction`] implements [`Display`] through it, so
//! rendering a control store listing is just formatting.
//!
//! The ALU's two operands are always written `A` (the H register) and `B`
//! (whatever the B bus carries); the B-bus register itself is rendered
//! separately by [`MicroInstruction::b_bus_name`].
//!
//! ```
//! use mic1_core::ucode::signal::{AluSignals, CBusSignals, JmpSignals, MemSignals};
//! use mic1_core::ucode::MicroInstruction;
//!
//! let mut alu = AluSignals::new();
//! alu.set_f0(true);
//! alu.set_f1(true);
//! alu.set_enb(true);
//! alu.set_inc(true);
//! let mut cbus = CBusSignals::new();
//! cbus.set_pc(true);
//! let mut mem = MemSignals::new();
//! mem.set_fetch(true);
//! let mut jmp = JmpSignals::new();
//! jmp.set_jmpc(true);
//!
//! let main1 = MicroInstruction::new(0, jmp, alu, cbus, mem, None);
//! assert_eq!(main1.to_string(), "PC=B+1;fetch;goto (MBR)");
//! ```
//!
//! [`Display`]: std::fmt::Display

use super::signal::AluSignals;
use super::MicroInstruction;

/// Reconstructs the mnemonic for a microinstruction.
///
/// The line is assembled as: C-bus assignment prefixes, ALU expression,
/// shifter suffixes, memory suffixes, then the jump clause. A conditional
/// jump additionally prefixes the line with the condition flag being latched
/// (`"N="` or `"Z="`).
pub fn decode(instr: &MicroInstruction) -> String {
    let mut line = String::new();

    // Every asserted C-bus line receives the shifter output.
    let cbus = instr.cbus();
    let targets = [
        (cbus.h(),   "H"),
        (cbus.opc(), "OPC"),
        (cbus.tos(), "TOS"),
        (cbus.cpp(), "CPP"),
        (cbus.lv(),  "LV"),
        (cbus.sp(),  "SP"),
        (cbus.pc(),  "PC"),
        (cbus.mdr(), "MDR"),
        (cbus.mar(), "MAR"),
    ];
    for (asserted, name) in targets {
        if asserted {
            line.push_str(name);
            line.push('=');
        }
    }

    let alu = instr.alu();
    line.push_str(alu_expression(&alu));
    if alu.sra1() {
        line.push_str(">>1");
    }
    if alu.sll8() {
        line.push_str("<<8");
    }

    let mem = instr.mem();
    if mem.write() {
        line.push_str(";wr");
    }
    if mem.read() {
        line.push_str(";rd");
    }
    if mem.fetch() {
        line.push_str(";fetch");
    }

    let jmp = instr.jmp();
    let addr = instr.next_address();
    if jmp.jmpn() || jmp.jmpz() {
        // JMPN wins if both conditions are asserted.
        let (flag, prefix) = match jmp.jmpn() {
            true  => ('N', "N="),
            false => ('Z', "Z="),
        };
        line.insert_str(0, prefix);
        line.push_str(&format!(
            ";if ({flag}) goto 0x{:X}; else goto 0x{:X}",
            addr | 0x100,
            addr
        ));
    } else if jmp.jmpc() {
        match addr {
            0 => line.push_str(";goto (MBR)"),
            a => line.push_str(&format!(";goto (MBR OR 0x{a:X})")),
        }
    } else {
        line.push_str(&format!(";goto 0x{addr:X}"));
    }

    // A bare "0" ALU result with nothing assigned to it says nothing.
    match line.strip_prefix("0;") {
        Some(rest) => rest.to_string(),
        None => line,
    }
}

/// The ALU expression, keyed on the function code (F0, F1) and the four
/// operand lines. Every arm is a fixed string; the table is total.
fn alu_expression(alu: &AluSignals) -> &'static str {
    match (alu.f0(), alu.f1()) {
        // A AND B
        (false, false) => match (alu.ena(), alu.enb(), alu.inva()) {
            (_, false, _)        => "0",
            (true, true, false)  => "A AND B",
            (true, true, true)   => "(NOT A) AND B",
            (false, true, false) => "0",
            (false, true, true)  => "B",
        },
        // A OR B
        (false, true) => match (alu.ena(), alu.enb(), alu.inva()) {
            (true, true, false)   => "A OR B",
            (true, true, true)    => "(NOT A) OR B",
            (true, false, false)  => "A",
            (true, false, true)   => "NOT A",
            (false, _, true)      => "-1",
            (false, true, false)  => "B",
            (false, false, false) => "0",
        },
        // NOT B
        (true, false) => match alu.enb() {
            true  => "NOT B",
            false => "0",
        },
        // A + B
        (true, true) => match (alu.ena(), alu.enb(), alu.inva(), alu.inc()) {
            (true, true, true, true)     => "B-A",
            (true, true, true, false)    => "B-A-1",
            (true, true, false, true)    => "A+B+1",
            (true, true, false, false)   => "A+B",
            (true, false, true, true)    => "-A",
            (true, false, true, false)   => "-A-1",
            (true, false, false, true)   => "A+1",
            (true, false, false, false)  => "A",
            (false, true, true, true)    => "B",
            (false, true, true, false)   => "B-1",
            (false, true, false, true)   => "B+1",
            (false, true, false, false)  => "B",
            (false, false, true, true)   => "0",
            (false, false, true, false)  => "-1",
            (false, false, false, true)  => "1",
            (false, false, false, false) => "0",
        },
    }
}

impl std::fmt::Display for MicroInstruction {
    /// Formats the microinstruction as its reconstructed mnemonic.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&decode(self))
    }
}

#[cfg(test)]
mod tests {
    use crate::ucode::signal::{AluSignals, CBusSignals, JmpSignals, MemSignals};
    use crate::ucode::MicroInstruction;

    use super::decode;

    fn build(
        next: u16,
        f: impl FnOnce(&mut JmpSignals, &mut AluSignals, &mut CBusSignals, &mut MemSignals),
    ) -> MicroInstruction {
        let mut jmp = JmpSignals::new();
        let mut alu = AluSignals::new();
        let mut cbus = CBusSignals::new();
        let mut mem = MemSignals::new();
        f(&mut jmp, &mut alu, &mut cbus, &mut mem);
        MicroInstruction::new(next, jmp, alu, cbus, mem, None)
    }

    #[test]
    fn test_add_table() {
        // (ENA, ENB, INVA, INC) -> expression, for F0=1, F1=1
        let table = [
            ((true, true, true, true),     "B-A"),
            ((true, true, true, false),    "B-A-1"),
            ((true, true, false, true),    "A+B+1"),
            ((true, true, false, false),   "A+B"),
            ((true, false, true, true),    "-A"),
            ((true, false, true, false),   "-A-1"),
            ((true, false, false, true),   "A+1"),
            ((true, false, false, false),  "A"),
            ((false, true, true, true),    "B"),
            ((false, true, true, false),   "B-1"),
            ((false, true, false, true),   "B+1"),
            ((false, true, false, false),  "B"),
            ((false, false, true, true),   "0"),
            ((false, false, true, false),  "-1"),
            ((false, false, false, true),  "1"),
            ((false, false, false, false), "0"),
        ];

        for ((ena, enb, inva, inc), expected) in table {
            let instr = build(0x30, |_, alu, cbus, _| {
                alu.set_f0(true);
                alu.set_f1(true);
                alu.set_ena(ena);
                alu.set_enb(enb);
                alu.set_inva(inva);
                alu.set_inc(inc);
                cbus.set_h(true);
            });
            assert_eq!(
                decode(&instr),
                format!("H={expected};goto 0x30"),
                "ENA={ena} ENB={enb} INVA={inva} INC={inc}"
            );
        }
    }

    #[test]
    fn test_and_or_not_tables() {
        // F0=0, F1=0 (AND)
        let cases = [
            ((false, false), (false, false, false), "0"),
            ((false, false), (true, false, true),   "0"),
            ((false, false), (true, true, false),   "A AND B"),
            ((false, false), (true, true, true),    "(NOT A) AND B"),
            ((false, false), (false, true, false),  "0"),
            ((false, false), (false, true, true),   "B"),
            // F0=0, F1=1 (OR)
            ((false, true), (true, true, false),    "A OR B"),
            ((false, true), (true, true, true),     "(NOT A) OR B"),
            ((false, true), (true, false, false),   "A"),
            ((false, true), (true, false, true),    "NOT A"),
            ((false, true), (false, false, true),   "-1"),
            ((false, true), (false, true, true),    "-1"),
            ((false, true), (false, true, false),   "B"),
            ((false, true), (false, false, false),  "0"),
            // F0=1, F1=0 (NOT B)
            ((true, false), (false, true, false),   "NOT B"),
            ((true, false), (true, false, true),    "0"),
        ];

        for ((f0, f1), (ena, enb, inva), expected) in cases {
            let instr = build(0, |_, alu, cbus, _| {
                alu.set_f0(f0);
                alu.set_f1(f1);
                alu.set_ena(ena);
                alu.set_enb(enb);
                alu.set_inva(inva);
                cbus.set_opc(true);
            });
            assert_eq!(
                decode(&instr),
                format!("OPC={expected};goto 0x0"),
                "F0={f0} F1={f1} ENA={ena} ENB={enb} INVA={inva}"
            );
        }
    }

    #[test]
    fn test_cbus_prefix_order() {
        let instr = build(0, |_, _, cbus, _| {
            cbus.set_mar(true);
            cbus.set_h(true);
            cbus.set_sp(true);
        });
        assert_eq!(decode(&instr), "H=SP=MAR=0;goto 0x0");
    }

    #[test]
    fn test_shifter_suffixes() {
        let instr = build(0x10, |_, alu, cbus, _| {
            alu.set_f0(true);
            alu.set_f1(true);
            alu.set_ena(true);
            alu.set_enb(true);
            alu.set_sra1(true);
            alu.set_sll8(true);
            cbus.set_tos(true);
        });
        assert_eq!(decode(&instr), "TOS=A+B>>1<<8;goto 0x10");
    }

    #[test]
    fn test_memory_suffixes() {
        let instr = build(0x21, |_, alu, cbus, mem| {
            alu.set_f0(true);
            alu.set_f1(true);
            alu.set_ena(true);
            cbus.set_mdr(true);
            mem.set_write(true);
            mem.set_read(true);
            mem.set_fetch(true);
        });
        assert_eq!(decode(&instr), "MDR=A;wr;rd;fetch;goto 0x21");
    }

    #[test]
    fn test_jmpn_takes_priority() {
        // all three jump lines up: the N form must win
        let instr = build(47, |jmp, _, _, _| {
            jmp.set_jmpn(true);
            jmp.set_jmpz(true);
            jmp.set_jmpc(true);
        });
        assert_eq!(decode(&instr), "N=0;if (N) goto 0x12F; else goto 0x2F");
    }

    #[test]
    fn test_jmpz_form() {
        let instr = build(0x18, |jmp, alu, cbus, _| {
            jmp.set_jmpz(true);
            alu.set_f0(true);
            alu.set_f1(true);
            alu.set_enb(true);
            cbus.set_opc(true);
        });
        assert_eq!(decode(&instr), "Z=OPC=B;if (Z) goto 0x118; else goto 0x18");
    }

    #[test]
    fn test_jmpc_forms() {
        let dispatch = build(0, |jmp, _, _, _| jmp.set_jmpc(true));
        assert_eq!(decode(&dispatch), "goto (MBR)");

        let offset = build(0x2F, |jmp, _, _, _| jmp.set_jmpc(true));
        assert_eq!(decode(&offset), "goto (MBR OR 0x2F)");
    }

    #[test]
    fn test_cleanup_strips_bare_zero() {
        let nop = build(0, |_, _, _, _| {});
        assert_eq!(decode(&nop), "goto 0x0");

        let jump = build(0x1FF, |_, _, _, _| {});
        assert_eq!(decode(&jump), "goto 0x1FF");
    }

    #[test]
    fn test_zero_with_shift_is_kept() {
        // "0>>1" is not a bare zero; the cleanup must leave it alone
        let instr = build(1, |_, alu, _, _| alu.set_sra1(true));
        assert_eq!(decode(&instr), "0>>1;goto 0x1");
    }
}
