use std::collections::HashMap;

use log::info;
use regex::Regex;

use crate::game::alphabet;
use crate::game::error::GameError;
use crate::game::memory::Memory;

/// Z-character capacity of a dictionary key: four packed bytes hold six
/// characters.
const KEY_BUDGET: usize = 6;

/// A token produced by splitting player input: the word itself and its
/// 1-based byte offset within the line.
pub struct Token<'a> {
    pub text: &'a str,
    pub position: usize,
}

/// The game's vocabulary, loaded once per run: the self-inserting break
/// characters and a map from each entry's decoded key to its address
/// (the address is the handle handed back to the game).
pub struct Dictionary {
    breaks: String,
    entries: HashMap<String, u16>,
    tokenizer: Regex,
}

impl Dictionary {
    pub fn parse(memory: &Memory) -> Result<Dictionary, GameError> {
        let mut breaks = String::new();
        let mut entries = HashMap::new();

        let location = memory.dictionary_location();
        if location != 0 {
            let mut cursor = location as usize;
            let break_count = memory.read_byte(&mut cursor);
            for _ in 0..break_count {
                breaks.push(memory.read_byte(&mut cursor) as char);
            }
            let entry_length = memory.read_byte(&mut cursor) as usize;
            let entry_count = memory.read_word(&mut cursor) as i16;
            for index in 0..entry_count.max(0) as usize {
                let address = cursor + index * entry_length;
                let (key, _) = memory.extract_string(address)?;
                entries.insert(key, address as u16);
            }
            info!(
                "Dictionary: {} entries, separators {:?}",
                entries.len(),
                breaks
            );
        }

        // One pass yields each break character as its own token and
        // each maximal run of non-whitespace, non-break characters as a
        // word token.
        let escaped = regex::escape(&breaks);
        let pattern = if breaks.is_empty() {
            "[^ \n\t]+".to_string()
        } else {
            format!("[{escaped}]|[^ \n\t{escaped}]+")
        };
        let tokenizer = Regex::new(&pattern)
            .map_err(|e| GameError::InvalidOperation(format!("Bad separator set: {e}")))?;

        Ok(Dictionary {
            breaks,
            entries,
            tokenizer,
        })
    }

    pub fn breaks(&self) -> &str {
        &self.breaks
    }

    pub fn tokenize<'a>(&self, input: &'a str) -> Vec<Token<'a>> {
        self.tokenizer
            .find_iter(input)
            .map(|m| Token {
                text: m.as_str(),
                position: m.start() + 1,
            })
            .collect()
    }

    /// The address of the entry matching a typed word, or 0.
    pub fn lookup(&self, word: &str) -> u16 {
        self.entries
            .get(&encode_key(word))
            .copied()
            .unwrap_or(0)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &u16)> {
        self.entries.iter()
    }
}

/// Fold a typed word into the text its dictionary entry would decode
/// to: characters are consumed until the key's Z-character budget is
/// spent, and a character that no longer fits is dropped along with the
/// rest of the word.
pub fn encode_key(word: &str) -> String {
    let mut budget = KEY_BUDGET;
    let mut key = String::new();
    for c in word.chars() {
        let cost = alphabet::zscii_cost(c);
        if cost > budget {
            break;
        }
        budget -= cost;
        key.push(c);
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::address;

    /// A dictionary with separators ",." and the words "take" and
    /// "lamp", in the standard 7-byte-entry layout.
    fn dictionary_image() -> Vec<u8> {
        let mut data = vec![0u8; 0x800];
        data[address::VERSION] = 3;
        data[address::DICTIONARY_LOCATION] = 0x04;
        data[address::DICTIONARY_LOCATION + 1] = 0x00;
        let dict = [
            2, b',', b'.', // break characters
            7,    // entry length
            0, 2, // entry count
            // "take": t=25 a=6 k=16 e=10, padded with shifts
            0x64, 0xD0, 0xA8, 0xA5, 0, 0, 0,
            // "lamp": l=17 a=6 m=18 p=21
            0x44, 0xD2, 0xD4, 0xA5, 0, 0, 0,
        ];
        data[0x400..0x400 + dict.len()].copy_from_slice(&dict);
        data
    }

    #[test]
    fn vocabulary_maps_decoded_keys_to_entry_addresses() {
        let memory = Memory::new(dictionary_image());
        let dictionary = Dictionary::parse(&memory).unwrap();
        assert_eq!(dictionary.breaks(), ",.");
        assert_eq!(dictionary.lookup("take"), 0x406);
        assert_eq!(dictionary.lookup("lamp"), 0x40D);
        assert_eq!(dictionary.lookup("xyzzy"), 0);
    }

    #[test]
    fn vocabulary_keys_survive_reencoding() {
        let memory = Memory::new(dictionary_image());
        let dictionary = Dictionary::parse(&memory).unwrap();
        for (key, &address) in dictionary.entries() {
            assert_eq!(&encode_key(key), key);
            assert_eq!(dictionary.lookup(key), address);
        }
    }

    #[test]
    fn tokens_carry_one_based_offsets() {
        let memory = Memory::new(dictionary_image());
        let dictionary = Dictionary::parse(&memory).unwrap();
        let tokens = dictionary.tokenize("take lamp, now.");
        let summary: Vec<(&str, usize)> =
            tokens.iter().map(|t| (t.text, t.position)).collect();
        assert_eq!(
            summary,
            vec![
                ("take", 1),
                ("lamp", 6),
                (",", 10),
                ("now", 12),
                (".", 15)
            ]
        );
    }

    #[test]
    fn missing_dictionary_splits_on_whitespace_only() {
        let mut data = vec![0u8; 0x800];
        data[address::VERSION] = 3;
        let memory = Memory::new(data);
        let dictionary = Dictionary::parse(&memory).unwrap();
        let tokens = dictionary.tokenize("open the, door");
        let summary: Vec<&str> = tokens.iter().map(|t| t.text).collect();
        assert_eq!(summary, vec!["open", "the,", "door"]);
        assert_eq!(dictionary.lookup("open"), 0);
    }

    #[test]
    fn encoding_truncates_at_the_budget() {
        assert_eq!(encode_key("northeast"), "northe");
        assert_eq!(encode_key("x1y2"), "x1y2");
        // The digit no longer fits after five letters.
        assert_eq!(encode_key("abcde1"), "abcde");
        assert_eq!(encode_key("don't"), "don't");
    }
}
