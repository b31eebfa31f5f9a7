use log::{info, warn};

use crate::game::address;
use crate::game::alphabet;
use crate::game::error::GameError;
use crate::game::instruction::Operand;
use crate::game::property::Property;

/// Number of bytes in one object table entry.
const OBJECT_ENTRY_LENGTH: usize = 9;

/// Number of entries in the property defaults table.
const PROPERTY_DEFAULTS: u16 = 31;

/// Stores the game's internal memory.
pub struct Memory {
    data: Vec<u8>,
    byte_swapped: bool,
}

impl Memory {
    pub fn new(data: Vec<u8>) -> Memory {
        let byte_swapped = data[address::FLAGS_1] & address::FLAG_BYTE_SWAPPED != 0;
        Memory { data, byte_swapped }
    }

    /// Replace the working memory with a fresh copy of the given image.
    pub fn reset(&mut self, image: &[u8]) {
        self.data.clear();
        self.data.extend_from_slice(image);
    }

    /// Returns a 2 byte word from the game memory, honouring the
    /// byte-swap flag chosen at load time.
    pub fn get_word(&self, address: usize) -> u16 {
        let (a, b) = (self.data[address] as u16, self.data[address + 1] as u16);
        if self.byte_swapped {
            (b << 8) | a
        } else {
            (a << 8) | b
        }
    }

    /// Returns a single byte from the memory.
    pub fn get_byte(&self, address: usize) -> u8 {
        self.data[address]
    }

    /// Return a series of bytes from the memory.
    pub fn get_bytes(&self, start: usize, length: usize) -> Vec<u8> {
        self.data[start..start + length].to_vec()
    }

    pub fn read_byte(&self, cursor: &mut usize) -> u8 {
        let result = self.get_byte(*cursor);
        *cursor += 1;
        result
    }

    pub fn read_word(&self, cursor: &mut usize) -> u16 {
        let result = self.get_word(*cursor);
        *cursor += 2;
        result
    }

    pub fn set_byte(&mut self, address: usize, content: u8) {
        self.data[address] = content;
    }

    pub fn set_word(&mut self, address: usize, content: u16) {
        let (hi, lo) = ((content >> 8) as u8, content as u8);
        if self.byte_swapped {
            self.data[address] = lo;
            self.data[address + 1] = hi;
        } else {
            self.data[address] = hi;
            self.data[address + 1] = lo;
        }
    }

    pub fn set_bytes(&mut self, start: usize, content: &[u8]) {
        self.data[start..start + content.len()].copy_from_slice(content);
    }

    pub fn write_byte(&mut self, cursor: &mut usize, content: u8) {
        self.set_byte(*cursor, content);
        *cursor += 1;
    }

    pub fn write_word(&mut self, cursor: &mut usize, content: u16) {
        self.set_word(*cursor, content);
        *cursor += 2;
    }

    pub fn read_operand_long(&self, cursor: &mut usize, op_type: u8) -> Operand {
        match op_type {
            0 => Operand::SmallConstant(self.read_byte(cursor)),
            1 => Operand::Variable(self.read_byte(cursor)),
            _ => unreachable!(),
        }
    }

    pub fn read_operand_other(&self, cursor: &mut usize, op_type: u8) -> Operand {
        match op_type {
            0 => Operand::LargeConstant(self.read_word(cursor)),
            1 => Operand::SmallConstant(self.read_byte(cursor)),
            2 => Operand::Variable(self.read_byte(cursor)),
            3 => Operand::Omitted,
            _ => unreachable!(),
        }
    }

    /// Return the story file version.
    pub fn version(&self) -> u8 {
        self.get_byte(address::VERSION)
    }

    /// Return the release identifier used to pair save data with its story.
    pub fn release_number(&self) -> u16 {
        self.get_word(address::RELEASE_NUMBER)
    }

    /// Return the 6-character ASCII serial number.
    pub fn serial_number(&self) -> String {
        self.get_bytes(address::SERIAL_NUMBER, address::SERIAL_NUMBER_LENGTH)
            .iter()
            .map(|&b| b as char)
            .collect()
    }

    /// Return the initial position of the program counter.
    pub fn program_counter_starts(&self) -> u16 {
        self.get_word(address::PROGRAM_COUNTER_STARTS)
    }

    /// Return the end of dynamic memory; only this prefix is serialized
    /// by a save.
    pub fn static_memory_base(&self) -> u16 {
        self.get_word(address::STATIC_MEMORY_BASE)
    }

    /// Return the location of the dictionary table.
    pub fn dictionary_location(&self) -> u16 {
        self.get_word(address::DICTIONARY_LOCATION)
    }

    /// Return the location of the object table.
    fn object_table_location(&self) -> u16 {
        self.get_word(address::OBJECT_TABLE_LOCATION)
    }

    /// Return the location of the abbreviation table.
    fn abbreviation_table_location(&self) -> u16 {
        self.get_word(address::ABBREVIATION_TABLE_LOCATION)
    }

    /// Return the location of the global variable table.
    fn global_variable_table_location(&self) -> u16 {
        self.get_word(address::GLOBAL_VARIABLE_TABLE_LOCATION)
    }

    /// Return the story file's declared length in words.
    pub fn packed_length(&self) -> u16 {
        self.get_word(address::FILE_LENGTH)
    }

    /// Return the expected result of the checksum operation.
    pub fn checksum(&self) -> u16 {
        self.get_word(address::CHECKSUM)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Routines and strings live at packed addresses, stored halved.
    pub fn unpack_address(&self, address: usize) -> usize {
        2 * address
    }

    /// Read the global with the given variable number (16..=255).
    pub fn get_global(&self, number: u8) -> u16 {
        let base = self.global_variable_table_location() as usize - 32;
        self.get_word(base + 2 * number as usize)
    }

    pub fn set_global(&mut self, number: u8, value: u16) {
        let base = self.global_variable_table_location() as usize - 32;
        self.set_word(base + 2 * number as usize, value);
    }

    /// The address of an object's 9-byte entry. Entries are 1-indexed;
    /// object 0 is the null object and has no entry.
    fn object_entry(&self, object: u16) -> usize {
        let base = self.object_table_location() as usize - 2 + 55;
        base + OBJECT_ENTRY_LENGTH * object as usize
    }

    /// Locate the attribute flag: the word within the entry holding it,
    /// and a mask selecting its bit.
    fn attribute_mask(&self, object: u16, attribute: u16) -> (usize, u16) {
        let offset = if attribute & 16 != 0 { 2 } else { 0 };
        let mask = 1 << (15 - (attribute & 15));
        (self.object_entry(object) + offset, mask)
    }

    pub fn object_attribute(&self, object: u16, attribute: u16) -> bool {
        let (address, mask) = self.attribute_mask(object, attribute);
        self.get_word(address) & mask != 0
    }

    pub fn update_object_attribute(&mut self, object: u16, attribute: u16, set: bool) {
        let (address, mask) = self.attribute_mask(object, attribute);
        let flags = self.get_word(address);
        let flags = if set { flags | mask } else { flags & !mask };
        self.set_word(address, flags);
    }

    pub fn object_parent(&self, object: u16) -> u16 {
        self.get_byte(self.object_entry(object) + 4) as u16
    }

    pub fn object_sibling(&self, object: u16) -> u16 {
        self.get_byte(self.object_entry(object) + 5) as u16
    }

    pub fn object_child(&self, object: u16) -> u16 {
        self.get_byte(self.object_entry(object) + 6) as u16
    }

    pub fn set_object_parent(&mut self, object: u16, parent: u16) {
        let address = self.object_entry(object) + 4;
        self.set_byte(address, parent as u8);
    }

    pub fn set_object_sibling(&mut self, object: u16, sibling: u16) {
        let address = self.object_entry(object) + 5;
        self.set_byte(address, sibling as u8);
    }

    pub fn set_object_child(&mut self, object: u16, child: u16) {
        let address = self.object_entry(object) + 6;
        self.set_byte(address, child as u8);
    }

    /// The byte address of the object's property table.
    pub fn property_table_address(&self, object: u16) -> usize {
        self.get_word(self.object_entry(object) + 7) as usize
    }

    /// Unlink an object from its parent's child chain. The object keeps
    /// its own child list.
    fn detach_object(&mut self, object: u16) {
        let parent = self.object_parent(object);
        if parent == 0 {
            return;
        }
        let next = self.object_sibling(object);
        if self.object_child(parent) == object {
            self.set_object_child(parent, next);
        } else {
            let mut prior = self.object_child(parent);
            while self.object_sibling(prior) != object {
                prior = self.object_sibling(prior);
            }
            self.set_object_sibling(prior, next);
        }
    }

    /// Move an object to be the first child of the destination;
    /// destination 0 detaches it entirely.
    pub fn move_object(&mut self, object: u16, destination: u16) {
        self.detach_object(object);
        if destination != 0 {
            let old_child = self.object_child(destination);
            self.set_object_sibling(object, old_child);
            self.set_object_child(destination, object);
        } else {
            self.set_object_sibling(object, 0);
        }
        self.set_object_parent(object, destination);
    }

    /// The object's short name, stored as text at the head of its
    /// property table.
    pub fn object_short_name(&self, object: u16) -> Result<String, GameError> {
        let address = self.property_table_address(object);
        Ok(self.extract_string(address + 1)?.0)
    }

    /// Address of the first property entry, past the short-name prefix.
    /// A zero-length name still contributes its length byte.
    fn property_list_start(&self, object: u16) -> usize {
        let table = self.property_table_address(object);
        let name_words = self.get_byte(table) as usize;
        table + 2 * name_words + 1
    }

    pub fn property_iter(&self, object: u16) -> impl Iterator<Item = Property> + '_ {
        PropertyIter {
            memory: self,
            cursor: self.property_list_start(object),
        }
    }

    /// Find the property with the given number. Entries are sorted by
    /// decreasing number and the first match wins.
    pub fn property(&self, object: u16, number: u16) -> Option<Property> {
        self.property_iter(object).find(|p| p.number == number)
    }

    /// The property entry following the given one, or the first when
    /// number is 0.
    pub fn following_property(&self, object: u16, number: u16) -> Option<Property> {
        let mut iter = self.property_iter(object);
        iter.find(|p| p.number == number)?;
        iter.next()
    }

    /// The fallback value used when an object lacks a property.
    pub fn default_property(&self, number: u16) -> u16 {
        let base = self.object_table_location() as usize - 2;
        self.get_word(base + 2 * (number & PROPERTY_DEFAULTS) as usize)
    }

    /// Decode the data length from the size byte preceding a property's
    /// data.
    pub fn property_data_length(&self, data_address: usize) -> u16 {
        (self.get_byte(data_address - 1) as u16 >> 5) + 1
    }

    /// Decode packed text starting at the given byte address. Returns
    /// the text and the address just past the word with its end bit set.
    pub fn extract_string(&self, start: usize) -> Result<(String, usize), GameError> {
        self.extract_string_bounded(start, 0)
    }

    fn extract_string_bounded(&self, start: usize, depth: u8) -> Result<(String, usize), GameError> {
        let mut cursor = start;
        let mut result = String::new();

        // Alphabet shifts: `permanent` is the default row, `temporary`
        // applies to the next character only. Values 3..=5 of
        // `temporary` mark an escape in flight: raw-ASCII high half,
        // raw-ASCII low half, abbreviation index.
        let mut permanent = 0usize;
        let mut temporary = 0usize;
        let mut aux = 0u16;

        loop {
            let word = self.read_word(&mut cursor);
            let done = word & 0x8000 != 0;
            for shift in [10u16, 5, 0] {
                let c = ((word >> shift) & 0x1F) as u8;
                match temporary {
                    3 => {
                        aux = (c as u16) << 5;
                        temporary = 4;
                    }
                    4 => {
                        match aux | c as u16 {
                            0 => {}
                            13 => result.push('\n'),
                            b => result.push(char::from_u32(b.into()).unwrap_or('?')),
                        }
                        temporary = permanent;
                    }
                    5 => {
                        if depth > 0 {
                            return Err(GameError::InvalidOperation(
                                "Found abbreviation within an abbreviation".into(),
                            ));
                        }
                        let index = aux as usize + c as usize;
                        let entry = self.abbreviation_table_location() as usize + 2 * index;
                        let address = 2 * self.get_word(entry) as usize;
                        result.push_str(&self.extract_string_bounded(address, depth + 1)?.0);
                        temporary = permanent;
                    }
                    _ => match c {
                        0 => result.push(' '),
                        1..=3 => {
                            aux = (c as u16 - 1) * 32;
                            temporary = 5;
                        }
                        4 | 5 => {
                            let shift = c as usize - 3;
                            if temporary == permanent {
                                temporary = shift;
                            } else if temporary == shift {
                                permanent = shift;
                            } else {
                                temporary = 0;
                                permanent = 0;
                            }
                        }
                        6 if temporary == 2 => temporary = 3,
                        _ => {
                            result.push(alphabet::value(temporary, c));
                            temporary = permanent;
                        }
                    },
                }
            }
            if done {
                return Ok((result, cursor));
            }
        }
    }

    /// Calculates and checks the checksum of the file: the sum of the
    /// bytes past the header, compared against the header's stated
    /// value. The interpreter continues as normal even if the checksum
    /// is incorrect. Should only be run once before execution, as the
    /// data will change during play.
    pub fn verify(&self) -> bool {
        let mut file_length = 2 * self.packed_length() as usize;
        if file_length > self.data.len() || file_length < 0x40 {
            warn!("File length header invalid");
            file_length = self.data.len();
        }

        let expected = self.checksum();
        let result = self.data[0x40..file_length]
            .iter()
            .fold(0u16, |acc, &x| acc.wrapping_add(x.into()));
        if expected == result {
            info!("Checksum OKAY: Expected {:x}, found {:x}", expected, result);
        } else {
            warn!("Checksum ERROR: Expected {:x}, found {:x}", expected, result);
        }
        expected == result
    }

    /// Does some sanity checking on the header section of the data to
    /// ensure the input is valid.
    pub fn validate_header(&self) -> Result<(), GameError> {
        if self.data.len() < 64 {
            // Header alone must be at least 64 bytes long
            return Err(GameError::InvalidFile);
        }

        if self.version() != 3 {
            return Err(GameError::UnsupportedVersion(self.version()));
        }

        info!(
            "Header validation OKAY. Release {}, serial {}. PC starts: {:x}",
            self.release_number(),
            self.serial_number(),
            self.program_counter_starts(),
        );
        Ok(())
    }
}

struct PropertyIter<'a> {
    memory: &'a Memory,
    cursor: usize,
}

impl<'a> Iterator for PropertyIter<'a> {
    type Item = Property;

    fn next(&mut self) -> Option<Self::Item> {
        let size = self.memory.get_byte(self.cursor);
        if size == 0 {
            return None;
        }
        let number = (size & 31) as u16;
        let length = (size >> 5) as usize + 1;
        let data_address = self.cursor + 1;
        let data = self.memory.get_bytes(data_address, length);
        self.cursor = data_address + length;
        Some(Property {
            number,
            data_address: data_address as u16,
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_image() -> Vec<u8> {
        let mut data = vec![0u8; 0x800];
        data[address::VERSION] = 3;
        data
    }

    #[test]
    fn words_are_big_endian_by_default() {
        let mut data = blank_image();
        data[0x100] = 0x12;
        data[0x101] = 0x34;
        let mut memory = Memory::new(data);
        assert_eq!(memory.get_word(0x100), 0x1234);
        memory.set_word(0x102, 0xBEEF);
        assert_eq!(memory.get_byte(0x102), 0xBE);
        assert_eq!(memory.get_byte(0x103), 0xEF);
    }

    #[test]
    fn flag_bit_selects_swapped_words() {
        let mut data = blank_image();
        data[address::FLAGS_1] = address::FLAG_BYTE_SWAPPED;
        data[0x100] = 0x12;
        data[0x101] = 0x34;
        let mut memory = Memory::new(data);
        assert_eq!(memory.get_word(0x100), 0x3412);
        memory.set_word(0x102, 0xBEEF);
        assert_eq!(memory.get_byte(0x102), 0xEF);
        assert_eq!(memory.get_byte(0x103), 0xBE);
    }

    #[test]
    fn extract_string_reports_end_address() {
        let mut data = blank_image();
        // "hi": h = z-char 13, i = 14, padded with a lone shift.
        let word = (13 << 10) | (14 << 5) | 5;
        data[0x200] = (0x80 | (word >> 8)) as u8;
        data[0x201] = word as u8;
        let memory = Memory::new(data);
        let (text, end) = memory.extract_string(0x200).unwrap();
        assert_eq!(text, "hi");
        assert_eq!(end, 0x202);
    }

    #[test]
    fn extract_string_expands_abbreviations() {
        let mut data = blank_image();
        data[address::ABBREVIATION_TABLE_LOCATION] = 0x03;
        data[address::ABBREVIATION_TABLE_LOCATION + 1] = 0x00;
        // Escape 2 selects the second bank, so z-chars [2, 0] name
        // abbreviation 32. Its table slot points at "the" (word address
        // 0x200), and a trailing 'n' follows the escape.
        data[0x340] = 0x02;
        data[0x341] = 0x00;
        data[0x400] = 0xE5;
        data[0x401] = 0xAA;
        data[0x200] = 0x88;
        data[0x201] = 0x13;
        let memory = Memory::new(data);
        let (text, end) = memory.extract_string(0x200).unwrap();
        assert_eq!(text, "then");
        assert_eq!(end, 0x202);
    }

    #[test]
    fn raw_ascii_escape_decodes_arbitrary_bytes() {
        let mut data = blank_image();
        // shift to A2, escape marker, then 33 ('!') split into halves.
        let first = (5 << 10) | (6 << 5) | (33 >> 5);
        let second = 0x8000 | ((33 & 0x1F) << 10) | (5 << 5) | 5;
        data[0x200] = (first >> 8) as u8;
        data[0x201] = first as u8;
        data[0x202] = (second >> 8) as u8;
        data[0x203] = second as u8;
        let memory = Memory::new(data);
        let (text, end) = memory.extract_string(0x200).unwrap();
        assert_eq!(text, "!");
        assert_eq!(end, 0x204);
    }

    #[test]
    fn objects_relink_on_move() {
        let mut data = blank_image();
        data[address::OBJECT_TABLE_LOCATION] = 0x01;
        data[address::OBJECT_TABLE_LOCATION + 1] = 0x00;
        // Tree: 1 { 2, 3 { 4 } }
        let base = 0x100 - 2 + 55;
        let entry = |o: usize| base + 9 * o;
        data[entry(1) + 6] = 2;
        data[entry(2) + 4] = 1;
        data[entry(2) + 5] = 3;
        data[entry(3) + 4] = 1;
        data[entry(3) + 6] = 4;
        data[entry(4) + 4] = 3;
        let mut memory = Memory::new(data);

        memory.move_object(4, 1);
        assert_eq!(memory.object_child(1), 4);
        assert_eq!(memory.object_sibling(4), 2);
        assert_eq!(memory.object_parent(4), 1);
        assert_eq!(memory.object_child(3), 0);

        memory.move_object(2, 0);
        assert_eq!(memory.object_child(1), 4);
        assert_eq!(memory.object_sibling(4), 3);
        assert_eq!(memory.object_parent(2), 0);
        assert_eq!(memory.object_sibling(2), 0);
    }
}
