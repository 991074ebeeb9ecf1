//! Breakpoints and debug-mode filtering.
//!
//! The key type here is [`BreakpointManager`], which owns the breakpoint set
//! and answers the one question the simulation loop asks every step: should
//! execution stop now?
//!
//! Evaluation works over a [`StepCtx`], the snapshot of one step: the micro
//! and macro line the processor is on, the microinstruction that just
//! executed, and the one about to execute. Both instructions are needed
//! because some register writes only become visible one step after the
//! signal that caused them: `MBR`/`MBRU` latch from the fetch the *previous*
//! word issued, and `MDR` from its read, while C-bus targets are written by
//! the *upcoming* word. [`Condition::RegisterWrite`] looks at both sides.
//!
//! Live register values come from a [`RegisterSource`], the contract the
//! surrounding datapath implements.
//!
//! # Usage
//!
//! ```
//! use mic1_core::debug::{BreakpointManager, DebugMode, RegisterSource, StepCtx};
//! use mic1_core::ucode::Register;
//!
//! struct Regs;
//! impl RegisterSource for Regs {
//!     fn get_value(&self, _reg: Register) -> i32 { 7 }
//!     fn set_value(&mut self, _reg: Register, _value: i32) {}
//! }
//!
//! let mut bps = BreakpointManager::new();
//! bps.add_register_value(Register::Tos, 7);
//!
//! let step = StepCtx { micro_line: 0x20, macro_line: 0, current: None, next: None };
//! assert!(bps.is_breakpoint(&Regs, &step));
//!
//! // register breakpoints are ignored while debugging at the macro level
//! bps.set_mode(DebugMode::Macro);
//! assert!(!bps.is_breakpoint(&Regs, &step));
//! ```

use std::fmt::Write as _;

use crate::ucode::{MicroInstruction, Register};

/// Which breakpoint categories the debugger currently honors.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub enum DebugMode {
    /// Debugging at the microinstruction level; macro-line breakpoints are ignored.
    Micro,
    /// Debugging at the macro (IJVM) level; register breakpoints are ignored.
    Macro,
    /// Debugging at both levels; every breakpoint is honored.
    #[default]
    Both,
}
impl std::fmt::Display for DebugMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DebugMode::Micro => f.write_str("micro"),
            DebugMode::Macro => f.write_str("macro"),
            DebugMode::Both  => f.write_str("both"),
        }
    }
}

/// Source of live register values.
///
/// Implemented by the surrounding datapath; the breakpoint engine re-reads
/// values through this on every evaluation rather than caching them.
pub trait RegisterSource {
    /// Reads the register's current value.
    fn get_value(&self, reg: Register) -> i32;
    /// Replaces the register's current value.
    fn set_value(&mut self, reg: Register, value: i32);
}

/// Everything a breakpoint can see about one simulation step.
///
/// `current` is the microinstruction that just executed and `next` the one
/// about to execute; either may be absent at the start of simulation, which
/// simply makes the checks that depend on it answer `false`.
#[derive(Clone, Copy, Debug)]
pub struct StepCtx<'a> {
    /// Control store address of the microinstruction about to execute.
    pub micro_line: u16,
    /// Macro (IJVM) source line the processor is on.
    pub macro_line: i32,
    /// The microinstruction that just executed, if any.
    pub current: Option<&'a MicroInstruction>,
    /// The microinstruction about to execute, if any.
    pub next: Option<&'a MicroInstruction>,
}

/// A breakpoint condition.
#[derive(PartialEq, Eq, Hash, Clone, Copy)]
pub enum Condition {
    /// Break when the micro PC reaches the given control store line.
    MicroLine(u16),
    /// Break when the macro fetch line is reached with the macro program on
    /// the given line.
    MacroLine(i32),
    /// Break when the register currently holds the given value.
    RegisterValue {
        /// Register to check.
        reg: Register,
        /// Value to compare against.
        value: i32,
    },
    /// Break when the register is written; see [`Condition::check`] for the
    /// pipeline timing involved.
    RegisterWrite(Register),
}

impl Condition {
    /// Checks if a break should occur.
    ///
    /// `fetch_addr` is the control store address of the macro fetch line
    /// (see [`BreakpointManager::fetch_addr`]); only macro-line conditions
    /// consult it.
    ///
    /// A register-write condition fires when the register's value is about
    /// to change or just did:
    /// - `MBR`/`MBRU` are latched by the fetch the current instruction issued,
    /// - `MDR` by the current instruction's read or the next one's C-bus write,
    /// - every other register by the next instruction's C-bus line.
    pub fn check(&self, regs: &dyn RegisterSource, step: &StepCtx, fetch_addr: u16) -> bool {
        match *self {
            Condition::MicroLine(line) => step.micro_line == line,
            Condition::MacroLine(line) => {
                step.micro_line == fetch_addr && step.macro_line == line
            }
            Condition::RegisterValue { reg, value } => regs.get_value(reg) == value,
            Condition::RegisterWrite(reg) => Self::writes(reg, step),
        }
    }

    fn writes(reg: Register, step: &StepCtx) -> bool {
        match reg {
            Register::Mbr | Register::Mbru => {
                step.current.is_some_and(|curr| curr.mem().fetch())
            }
            Register::Mdr => {
                step.current.is_some_and(|curr| curr.mem().read())
                    || step.next.is_some_and(|next| next.cbus().mdr())
            }
            reg => step.next.is_some_and(|next| next.cbus().writes(reg)),
        }
    }

    /// Whether breakpoints with this condition are honored under the given
    /// mode.
    ///
    /// Micro-line breakpoints are honored in every mode, including
    /// [`DebugMode::Macro`].
    pub fn active_in(&self, mode: DebugMode) -> bool {
        match self {
            Condition::MicroLine(_) => true,
            Condition::MacroLine(_) => mode != DebugMode::Micro,
            Condition::RegisterValue { .. } | Condition::RegisterWrite(_) => {
                mode != DebugMode::Macro
            }
        }
    }

    fn fmt_cond(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Condition::MicroLine(line) => write!(f, "micro line 0x{line:X}"),
            Condition::MacroLine(line) => write!(f, "macro line {line}"),
            Condition::RegisterValue { reg, value } => write!(f, "{reg} == {value}"),
            Condition::RegisterWrite(reg) => write!(f, "write to {reg}"),
        }
    }
}
impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.fmt_cond(f)
    }
}
impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Condition(")?;
        self.fmt_cond(f)?;
        f.write_char(')')
    }
}

/// An installed breakpoint: a condition plus the session-unique id it was
/// created with.
///
/// Two breakpoints are considered equal iff their conditions match; the id
/// plays no part in comparison, so a duplicate is a duplicate no matter when
/// each copy was created.
#[derive(Clone, Copy)]
pub struct Breakpoint {
    id: u64,
    cond: Condition,
}
impl Breakpoint where Breakpoint: Send + Sync { /* assert Breakpoint is send/sync */ }

impl Breakpoint {
    /// The breakpoint's id, unique and strictly increasing within a session.
    pub fn id(&self) -> u64 {
        self.id
    }
    /// The breakpoint's condition.
    pub fn condition(&self) -> Condition {
        self.cond
    }
}
impl PartialEq for Breakpoint {
    fn eq(&self, other: &Self) -> bool {
        self.cond == other.cond
    }
}
impl Eq for Breakpoint {}
impl std::hash::Hash for Breakpoint {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.cond.hash(state);
    }
}
impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.id)?;
        self.cond.fmt_cond(f)
    }
}
impl std::fmt::Debug for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Breakpoint({self})")
    }
}

/// Owns the breakpoint set, the active [`DebugMode`], and id allocation.
///
/// The manager is mutated only by the explicit calls below and is not
/// designed for concurrent mutation; the owning session serializes add,
/// remove, and evaluate calls.
#[derive(Debug)]
pub struct BreakpointManager {
    breakpoints: Vec<Breakpoint>,
    mode: DebugMode,
    next_id: u64,
    fetch_addr: u16,
}

impl BreakpointManager {
    /// Control store address of the macro fetch line in the standard
    /// microprogram.
    ///
    /// Macro-line breakpoints only fire while the micro PC sits on this
    /// line. A host running a microprogram that places its main loop
    /// elsewhere can re-point it with [`BreakpointManager::set_fetch_addr`].
    pub const DEFAULT_FETCH_ADDR: u16 = 0x02;

    /// Creates a manager with no breakpoints, mode [`DebugMode::Both`], and
    /// the standard fetch address.
    pub fn new() -> Self {
        Self {
            breakpoints: Vec::new(),
            mode: DebugMode::default(),
            next_id: 1,
            fetch_addr: Self::DEFAULT_FETCH_ADDR,
        }
    }

    /// Adds a breakpoint on a control store line.
    pub fn add_micro_line(&mut self, line: u16) {
        self.add(Condition::MicroLine(line));
    }
    /// Adds a breakpoint on a macro (IJVM) source line.
    pub fn add_macro_line(&mut self, line: i32) {
        self.add(Condition::MacroLine(line));
    }
    /// Adds a breakpoint on a register holding a value.
    pub fn add_register_value(&mut self, reg: Register, value: i32) {
        self.add(Condition::RegisterValue { reg, value });
    }
    /// Adds a breakpoint on a register being written.
    pub fn add_register_write(&mut self, reg: Register) {
        self.add(Condition::RegisterWrite(reg));
    }

    /// Installs a breakpoint unless an equal condition is already present.
    fn add(&mut self, cond: Condition) {
        if self.breakpoints.iter().any(|bp| bp.cond == cond) {
            log::debug!("ignoring duplicate breakpoint on {cond}");
            return;
        }

        let id = self.next_id;
        self.next_id += 1;
        self.breakpoints.push(Breakpoint { id, cond });
    }

    /// Removes the breakpoint with the given id.
    ///
    /// Removing an id that is not present does nothing. Ids are never
    /// reassigned, so at most one entry can match.
    pub fn remove(&mut self, id: u64) {
        match self.breakpoints.iter().position(|bp| bp.id == id) {
            Some(index) => {
                self.breakpoints.remove(index);
            }
            None => log::debug!("no breakpoint with id {id} to remove"),
        }
    }

    /// Removes every breakpoint.
    pub fn remove_all(&mut self) {
        self.breakpoints.clear();
    }

    /// The installed breakpoints, in insertion order.
    pub fn list(&self) -> &[Breakpoint] {
        &self.breakpoints
    }

    /// The active debug mode.
    pub fn mode(&self) -> DebugMode {
        self.mode
    }
    /// Sets the active debug mode.
    pub fn set_mode(&mut self, mode: DebugMode) {
        self.mode = mode;
    }

    /// The control store address treated as the macro fetch line.
    pub fn fetch_addr(&self) -> u16 {
        self.fetch_addr
    }
    /// Re-points the macro fetch line for a nonstandard microprogram.
    ///
    /// The address is masked to 9 bits like every micro address.
    pub fn set_fetch_addr(&mut self, addr: u16) {
        self.fetch_addr = addr & MicroInstruction::ADDRESS_MASK;
    }

    /// Whether the simulator should stop at this step: true iff any
    /// installed breakpoint is honored under the active mode and its
    /// condition holds.
    pub fn is_breakpoint(&self, regs: &dyn RegisterSource, step: &StepCtx) -> bool {
        self.breakpoints.iter()
            .filter(|bp| bp.cond.active_in(self.mode))
            .any(|bp| bp.cond.check(regs, step, self.fetch_addr))
    }
}
impl Default for BreakpointManager {
    fn default() -> Self {
        Self::new()
    }
}
