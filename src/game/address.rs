//! The locations of important information in the
//! header section of the story file.

pub const VERSION: usize = 0x0;
pub const FLAGS_1: usize = 0x1;
pub const RELEASE_NUMBER: usize = 0x2;
pub const PROGRAM_COUNTER_STARTS: usize = 0x6;
pub const DICTIONARY_LOCATION: usize = 0x8;
pub const OBJECT_TABLE_LOCATION: usize = 0xA;
pub const GLOBAL_VARIABLE_TABLE_LOCATION: usize = 0xC;
pub const STATIC_MEMORY_BASE: usize = 0xE;
pub const FLAGS_2: usize = 0x10;
pub const SERIAL_NUMBER: usize = 0x12;
pub const ABBREVIATION_TABLE_LOCATION: usize = 0x18;
pub const FILE_LENGTH: usize = 0x1A;
pub const CHECKSUM: usize = 0x1C;

/// Length of the serial number field (ASCII, not zero-terminated).
pub const SERIAL_NUMBER_LENGTH: usize = 6;

// Flags 1 bits. The low two come from the story file; the rest are
// rewritten at initialisation to advertise interpreter capabilities.
pub const FLAG_BYTE_SWAPPED: u8 = 1 << 0;
pub const FLAG_STATUS_TIME: u8 = 1 << 1;
pub const FLAG_TANDY: u8 = 1 << 3;
pub const FLAG_NO_STATUS_LINE: u8 = 1 << 4;
pub const FLAG_SPLIT_AVAILABLE: u8 = 1 << 5;

// Flags 2 bits, shadowed at FLAGS_2 and preserved across restart/restore.
pub const FLAG_TRANSCRIPTING: u16 = 1 << 0;
pub const FLAG_FIXED_PITCH: u16 = 1 << 1;
