//! A Mic-1 microinstruction decoder, control store, and breakpoint engine.
//!
//! This is the microarchitecture-level core of a Mic-1/IJVM teaching
//! simulator: it turns control store images into [`MicroInstruction`]s,
//! reconstructs MAL-style mnemonics from them, and decides when a debugging
//! session should stop. The fetch-execute loop, the IJVM memory model, and
//! the console around them are left to the embedding simulator.
//!
//! # Usage
//!
//! A control store is built once from a byte stream (here an in-memory
//! image holding the single line `PC=B+1;fetch;goto (MBR)`):
//!
//! ```
//! use mic1_core::store::{ControlStore, MAGIC};
//! use mic1_core::ucode::Register;
//!
//! let mut image = MAGIC.to_be_bytes().to_vec();
//! image.extend([0x00, 0x43, 0x50, 0x21, 0x10]);
//!
//! let store = ControlStore::read_from(&image[..]).unwrap();
//! let instr = store.get_instruction(0).unwrap();
//!
//! assert_eq!(instr.to_string(), "PC=B+1;fetch;goto (MBR)");
//! assert_eq!(instr.b_bus(), Some(Register::Pc));
//! ```
//!
//! Breakpoints live in a [`BreakpointManager`]. Each simulation step, the
//! embedding simulator hands it the current step context (micro and macro
//! line, the microinstruction just executed and the one about to execute)
//! and asks whether to halt:
//!
//! ```
//! use mic1_core::debug::{BreakpointManager, RegisterSource, StepCtx};
//! use mic1_core::ucode::Register;
//!
//! # struct Datapath;
//! # impl RegisterSource for Datapath {
//! #     fn get_value(&self, _reg: Register) -> i32 { 0 }
//! #     fn set_value(&mut self, _reg: Register, _value: i32) {}
//! # }
//! # let datapath = Datapath;
//! let mut bps = BreakpointManager::new();
//! bps.add_micro_line(0x47);
//! bps.add_register_write(Register::Sp);
//!
//! let step = StepCtx { micro_line: 0x47, macro_line: 0, current: None, next: None };
//! assert!(bps.is_breakpoint(&datapath, &step));
//! ```
//!
//! Register-write breakpoints are aware of the datapath's pipeline timing:
//! `MBR`, `MBRU`, and `MDR` are only loaded one step after the memory signal
//! that causes it, so the manager inspects both the instruction just
//! executed and the instruction about to execute. See the [`debug`] module
//! for details.
//!
//! [`MicroInstruction`]: ucode::MicroInstruction
//! [`BreakpointManager`]: debug::BreakpointManager
#![warn(missing_docs)]

pub mod debug;
pub mod store;
pub mod ucode;
