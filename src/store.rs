//! Loading microinstructions from a control store image.
//!
//! This module consists of:
//! - [`MicroInstructionReader`]: decodes one 5-byte wire record at a time,
//! - [`ControlStore`]: the fixed 512-slot array built from a whole image,
//! - [`LoadErr`]: everything that can be wrong with an image.
//!
//! # Usage
//!
//! A store is built once from any [`Read`] source (a file, an embedded byte
//! slice, a resource loader's stream) and is read-only afterward:
//!
//! ```no_run
//! use mic1_core::store::ControlStore;
//!
//! let file = std::fs::File::open("mic1ijvm.mic1")?;
//! let store = ControlStore::read_from(file)?;
//! for (addr, instr) in store.iter() {
//!     println!("0x{addr:03X}: {instr}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::io::{self, Read};

use crate::ucode::signal::{AluSignals, CBusSignals, JmpSignals, MemSignals};
use crate::ucode::{MicroInstruction, Register};

/// The magic number prefixing every control store image (stored big-endian).
pub const MAGIC: u32 = 0x12345678;

/// The number of slots in the control store (the micro PC is 9 bits wide).
pub const STORE_SIZE: usize = 512;

/// The number of bytes in one microinstruction wire record.
pub const RECORD_SIZE: usize = 5;

/// Errors that can occur while building a [`ControlStore`] from a byte stream.
#[derive(Debug)]
pub enum LoadErr {
    /// The stream ended before a full magic number could be read.
    MagicMissing,
    /// A magic number was present but held the wrong value.
    MagicMismatch(u32),
    /// The stream held the magic number and nothing else.
    NoInstructions,
    /// The stream held more instruction records than the store has slots.
    TooManyInstructions,
    /// The underlying stream failed mid-read.
    Io(io::Error),
}
impl std::fmt::Display for LoadErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadErr::MagicMissing        => f.write_str("control store image is too short to hold a magic number"),
            LoadErr::MagicMismatch(m)    => write!(f, "control store image has the wrong magic number (found 0x{m:08X}, expected 0x{MAGIC:08X})"),
            LoadErr::NoInstructions      => f.write_str("control store image holds no microinstructions"),
            LoadErr::TooManyInstructions => write!(f, "control store image holds more than {STORE_SIZE} microinstructions"),
            LoadErr::Io(e)               => write!(f, "failed to read control store image: {e}"),
        }
    }
}
impl std::error::Error for LoadErr {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadErr::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl From<io::Error> for LoadErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

/// Decodes 5-byte wire records from a byte stream, one instruction per call.
///
/// The reader owns its stream, so two readers can never interleave reads on
/// the same source.
pub struct MicroInstructionReader<R> {
    stream: R,
}

impl<R: Read> MicroInstructionReader<R> {
    /// Creates a reader over the given stream.
    pub fn new(stream: R) -> Self {
        Self { stream }
    }

    /// Reads the next instruction record.
    ///
    /// Returns `Ok(None)` on a clean end of stream. A record cut short by the
    /// end of the stream (1 to 4 bytes left) also counts as a clean end, not
    /// an error; only a failure of the underlying stream is surfaced, as
    /// [`LoadErr::Io`].
    pub fn read_instruction(&mut self) -> Result<Option<MicroInstruction>, LoadErr> {
        let mut record = [0u8; RECORD_SIZE];
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match self.stream.read(&mut record[filled..]) {
                Ok(0) => return Ok(None),
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(LoadErr::Io(e)),
            }
        }
        Ok(Some(decode_record(record)))
    }
}

/// Unpacks one wire record into a microinstruction.
fn decode_record(record: [u8; RECORD_SIZE]) -> MicroInstruction {
    // Record layout (MSB first within each byte):
    //
    // byte 0: next address bits 8..1
    // byte 1: next address bit 0 | JMPC JMPN JMPZ SLL8 SRA1 F0 F1
    // byte 2: ENA ENB INVA INC | H OPC TOS CPP
    // byte 3: LV SP PC MDR MAR | WRITE READ FETCH
    // byte 4: B-bus selector index in the top nibble; low nibble unused
    let [b0, b1, b2, b3, b4] = record;

    let next_address = (u16::from(b0) << 1) | u16::from(b1 >> 7);

    let mut jmp = JmpSignals::new();
    jmp.set_jmpc(b1 & 0x40 != 0);
    jmp.set_jmpn(b1 & 0x20 != 0);
    jmp.set_jmpz(b1 & 0x10 != 0);

    let mut alu = AluSignals::new();
    alu.set_sll8(b1 & 0x08 != 0);
    alu.set_sra1(b1 & 0x04 != 0);
    alu.set_f0(b1 & 0x02 != 0);
    alu.set_f1(b1 & 0x01 != 0);
    alu.set_ena(b2 & 0x80 != 0);
    alu.set_enb(b2 & 0x40 != 0);
    alu.set_inva(b2 & 0x20 != 0);
    alu.set_inc(b2 & 0x10 != 0);

    let mut cbus = CBusSignals::new();
    cbus.set_h(b2 & 0x08 != 0);
    cbus.set_opc(b2 & 0x04 != 0);
    cbus.set_tos(b2 & 0x02 != 0);
    cbus.set_cpp(b2 & 0x01 != 0);
    cbus.set_lv(b3 & 0x80 != 0);
    cbus.set_sp(b3 & 0x40 != 0);
    cbus.set_pc(b3 & 0x20 != 0);
    cbus.set_mdr(b3 & 0x10 != 0);
    cbus.set_mar(b3 & 0x08 != 0);

    let mut mem = MemSignals::new();
    mem.set_write(b3 & 0x04 != 0);
    mem.set_read(b3 & 0x02 != 0);
    mem.set_fetch(b3 & 0x01 != 0);

    let b_bus = Register::from_b_bus_index(b4 >> 4);

    MicroInstruction::new(next_address, jmp, alu, cbus, mem, b_bus)
}

/// The control store: 512 addressable slots of optional microinstructions.
///
/// Built once from a magic-prefixed image via [`ControlStore::read_from`] and
/// read-only afterward, so it can be shared freely between readers.
pub struct ControlStore {
    // Held in the heap; 512 slots is a little large for the stack.
    slots: Box<[Option<MicroInstruction>; STORE_SIZE]>,
    loaded: usize,
}
impl ControlStore where ControlStore: Send + Sync { /* assert ControlStore is send/sync */ }

impl ControlStore {
    /// Builds a control store from an image stream.
    ///
    /// The image must open with the big-endian [`MAGIC`] number, followed by
    /// between 1 and [`STORE_SIZE`] wire records. Instructions land at
    /// sequential addresses starting from 0; trailing slots stay empty.
    ///
    /// Construction failures are fatal; there is no partial store.
    pub fn read_from(mut stream: impl Read) -> Result<Self, LoadErr> {
        let mut magic = [0u8; 4];
        stream.read_exact(&mut magic).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => LoadErr::MagicMissing,
            _ => LoadErr::Io(e),
        })?;
        let magic = u32::from_be_bytes(magic);
        if magic != MAGIC {
            return Err(LoadErr::MagicMismatch(magic));
        }

        let mut slots = Box::new([None; STORE_SIZE]);
        let mut loaded = 0;

        let mut reader = MicroInstructionReader::new(stream);
        while let Some(instr) = reader.read_instruction()? {
            if loaded == STORE_SIZE {
                return Err(LoadErr::TooManyInstructions);
            }
            slots[loaded] = Some(instr);
            loaded += 1;
        }
        if loaded == 0 {
            return Err(LoadErr::NoInstructions);
        }

        log::debug!("control store loaded with {loaded} microinstructions");
        Ok(Self { slots, loaded })
    }

    /// Looks up the instruction at the given micro address.
    ///
    /// The address is masked to 9 bits, so out-of-range addresses wrap
    /// instead of erroring. An empty slot is a valid "nothing here" answer.
    pub fn get_instruction(&self, address: i32) -> Option<&MicroInstruction> {
        let slot = usize::from(address as u16 & MicroInstruction::ADDRESS_MASK);
        self.slots[slot].as_ref()
    }

    /// The number of instructions the image contained.
    pub fn loaded_count(&self) -> usize {
        self.loaded
    }

    /// Iterates over the occupied slots in address order.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &MicroInstruction)> {
        self.slots.iter()
            .enumerate()
            .filter_map(|(addr, slot)| Some((addr as u16, slot.as_ref()?)))
    }
}
impl std::fmt::Debug for ControlStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlStore")
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::ucode::signal::{AluSignals, CBusSignals, JmpSignals, MemSignals};
    use crate::ucode::{MicroInstruction, Register};

    use super::{ControlStore, LoadErr, MicroInstructionReader, MAGIC, RECORD_SIZE, STORE_SIZE};

    /// Inverse of `decode_record`, for building test images.
    fn encode_record(instr: &MicroInstruction) -> [u8; RECORD_SIZE] {
        fn bit(set: bool, pos: u8) -> u8 {
            u8::from(set) << pos
        }

        let addr = instr.next_address();
        let jmp = instr.jmp();
        let alu = instr.alu();
        let cbus = instr.cbus();
        let mem = instr.mem();

        let b0 = (addr >> 1) as u8;
        let b1 = bit(addr & 1 != 0, 7)
            | bit(jmp.jmpc(), 6)
            | bit(jmp.jmpn(), 5)
            | bit(jmp.jmpz(), 4)
            | bit(alu.sll8(), 3)
            | bit(alu.sra1(), 2)
            | bit(alu.f0(), 1)
            | bit(alu.f1(), 0);
        let b2 = bit(alu.ena(), 7)
            | bit(alu.enb(), 6)
            | bit(alu.inva(), 5)
            | bit(alu.inc(), 4)
            | bit(cbus.h(), 3)
            | bit(cbus.opc(), 2)
            | bit(cbus.tos(), 1)
            | bit(cbus.cpp(), 0);
        let b3 = bit(cbus.lv(), 7)
            | bit(cbus.sp(), 6)
            | bit(cbus.pc(), 5)
            | bit(cbus.mdr(), 4)
            | bit(cbus.mar(), 3)
            | bit(mem.write(), 2)
            | bit(mem.read(), 1)
            | bit(mem.fetch(), 0);
        let b4 = match instr.b_bus() {
            Some(reg) => reg.b_bus_index().unwrap() << 4,
            None => 0xF0,
        };

        [b0, b1, b2, b3, b4]
    }

    fn image(records: impl IntoIterator<Item = [u8; RECORD_SIZE]>) -> Vec<u8> {
        let mut bytes = MAGIC.to_be_bytes().to_vec();
        for record in records {
            bytes.extend(record);
        }
        bytes
    }

    fn random_instruction(rng: &mut StdRng) -> MicroInstruction {
        let mut jmp = JmpSignals::new();
        jmp.set_jmpc(rng.gen());
        jmp.set_jmpn(rng.gen());
        jmp.set_jmpz(rng.gen());

        let mut alu = AluSignals::new();
        alu.set_sll8(rng.gen());
        alu.set_sra1(rng.gen());
        alu.set_f0(rng.gen());
        alu.set_f1(rng.gen());
        alu.set_ena(rng.gen());
        alu.set_enb(rng.gen());
        alu.set_inva(rng.gen());
        alu.set_inc(rng.gen());

        let mut cbus = CBusSignals::new();
        cbus.set_h(rng.gen());
        cbus.set_opc(rng.gen());
        cbus.set_tos(rng.gen());
        cbus.set_cpp(rng.gen());
        cbus.set_lv(rng.gen());
        cbus.set_sp(rng.gen());
        cbus.set_pc(rng.gen());
        cbus.set_mdr(rng.gen());
        cbus.set_mar(rng.gen());

        let mut mem = MemSignals::new();
        mem.set_write(rng.gen());
        mem.set_read(rng.gen());
        mem.set_fetch(rng.gen());

        let b_bus = Register::from_b_bus_index(rng.gen_range(0..=15));

        MicroInstruction::new(rng.gen_range(0..0x200), jmp, alu, cbus, mem, b_bus)
    }

    #[test]
    fn test_round_trip() {
        let mut alu = AluSignals::new();
        alu.set_f0(true);
        alu.set_f1(true);
        alu.set_enb(true);
        alu.set_inc(true);
        let mut cbus = CBusSignals::new();
        cbus.set_pc(true);
        let mut mem = MemSignals::new();
        mem.set_fetch(true);
        let mut jmp = JmpSignals::new();
        jmp.set_jmpc(true);

        let main1 = MicroInstruction::new(0, jmp, alu, cbus, mem, Some(Register::Pc));
        assert_eq!(encode_record(&main1), [0x00, 0x43, 0x50, 0x21, 0x10]);

        let store = ControlStore::read_from(&image([encode_record(&main1)])[..]).unwrap();
        assert_eq!(store.get_instruction(0), Some(&main1));
    }

    #[test]
    fn test_round_trip_random() {
        let mut rng = StdRng::seed_from_u64(0x1234);

        let instrs: Vec<_> = (0..100).map(|_| random_instruction(&mut rng)).collect();
        let store = ControlStore::read_from(&image(instrs.iter().map(encode_record))[..]).unwrap();

        assert_eq!(store.loaded_count(), instrs.len());
        for (addr, instr) in instrs.iter().enumerate() {
            assert_eq!(store.get_instruction(addr as i32), Some(instr));
        }
    }

    #[test]
    fn test_magic_missing() {
        assert!(matches!(
            ControlStore::read_from(&[][..]),
            Err(LoadErr::MagicMissing)
        ));
        assert!(matches!(
            ControlStore::read_from(&[0x12, 0x34][..]),
            Err(LoadErr::MagicMissing)
        ));
    }

    #[test]
    fn test_magic_mismatch() {
        let bytes = 0x12345679u32.to_be_bytes();
        assert!(matches!(
            ControlStore::read_from(&bytes[..]),
            Err(LoadErr::MagicMismatch(0x12345679))
        ));
    }

    #[test]
    fn test_empty_image() {
        assert!(matches!(
            ControlStore::read_from(&image([])[..]),
            Err(LoadErr::NoInstructions)
        ));
    }

    #[test]
    fn test_store_capacity() {
        let full = image(std::iter::repeat([0u8; RECORD_SIZE]).take(STORE_SIZE));
        let store = ControlStore::read_from(&full[..]).unwrap();
        assert_eq!(store.loaded_count(), STORE_SIZE);

        let overfull = image(std::iter::repeat([0u8; RECORD_SIZE]).take(STORE_SIZE + 1));
        assert!(matches!(
            ControlStore::read_from(&overfull[..]),
            Err(LoadErr::TooManyInstructions)
        ));
    }

    #[test]
    fn test_partial_trailing_record_is_eof() {
        let mut bytes = image([[0u8; RECORD_SIZE]]);
        bytes.extend([0xAB, 0xCD, 0xEF]);

        let store = ControlStore::read_from(&bytes[..]).unwrap();
        assert_eq!(store.loaded_count(), 1);
    }

    #[test]
    fn test_reader_partial_record_is_eof() {
        let mut reader = MicroInstructionReader::new(&[0x00, 0x40, 0x35, 0x21][..]);
        assert!(matches!(reader.read_instruction(), Ok(None)));
    }

    #[test]
    fn test_lookup_masks_address() {
        let store = ControlStore::read_from(&image([[0u8; RECORD_SIZE]])[..]).unwrap();

        assert!(store.get_instruction(0).is_some());
        assert!(store.get_instruction(1).is_none());
        // 512 wraps to 0, -512 likewise
        assert!(store.get_instruction(512).is_some());
        assert!(store.get_instruction(-512).is_some());
        assert!(store.get_instruction(-1).is_none());
        assert!(store.get_instruction(i32::MAX).is_none());
    }

    #[test]
    fn test_iter_in_address_order() {
        let mut rng = StdRng::seed_from_u64(99);
        let instrs: Vec<_> = (0..3).map(|_| random_instruction(&mut rng)).collect();
        let store = ControlStore::read_from(&image(instrs.iter().map(encode_record))[..]).unwrap();

        let listed: Vec<_> = store.iter().collect();
        assert_eq!(listed.len(), 3);
        for (i, (addr, instr)) in listed.into_iter().enumerate() {
            assert_eq!(usize::from(addr), i);
            assert_eq!(instr, &instrs[i]);
        }
    }
}
