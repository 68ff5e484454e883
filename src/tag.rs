//! OpenType tags for scripts, languages and features.

use crate::error::TableError;
use std::fmt;

/// Generate a 4-byte OpenType tag from byte string, e.g. `tag!(b"liga") == 0x6C696761`.
macro_rules! tag {
    ($w:expr) => {
        tag(*$w)
    };
}

#[derive(PartialEq, Eq, Clone, Copy)]
pub struct DisplayTag(pub u32);

const fn tag(chars: [u8; 4]) -> u32 {
    ((chars[3] as u32) << 0)
        | ((chars[2] as u32) << 8)
        | ((chars[1] as u32) << 16)
        | ((chars[0] as u32) << 24)
}

/// Convert a string of up to four printable ASCII characters to a tag, padding with spaces.
///
/// Empty and all-blank strings are rejected since they cannot name a script, language or feature.
pub fn from_string(s: &str) -> Result<u32, TableError> {
    if s.len() > 4 || s.trim().is_empty() {
        return Err(TableError::BadTag(s.to_owned()));
    }

    let mut tag: u32 = 0;
    let mut count = 0;

    for c in s.chars() {
        if !c.is_ascii() || c.is_ascii_control() {
            return Err(TableError::BadTag(s.to_owned()));
        }

        tag = (tag << 8) | (c as u32);
        count += 1;
    }

    while count < 4 {
        tag = (tag << 8) | (' ' as u32);
        count += 1;
    }

    Ok(tag)
}

impl fmt::Display for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = self.0;
        let mut s = String::with_capacity(4);
        s.push(char::from((tag >> 24) as u8));
        s.push(char::from(((tag >> 16) & 255) as u8));
        s.push(char::from(((tag >> 8) & 255) as u8));
        s.push(char::from((tag & 255) as u8));
        if s.chars().any(|c| !c.is_ascii() || c.is_ascii_control()) {
            write!(f, "0x{:08x}", tag)
        } else {
            s.trim_end().fmt(f)
        }
    }
}

impl fmt::Debug for DisplayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.to_string().fmt(f)
    }
}

/// Matches any script, language or feature in a lookup query.
pub const WILDCARD: u32 = tag!(b"*   ");

// scripts
pub const ARAB: u32 = tag!(b"arab");
pub const CYRL: u32 = tag!(b"cyrl");
pub const DFLT: u32 = tag!(b"DFLT");
pub const GREK: u32 = tag!(b"grek");
pub const HEBR: u32 = tag!(b"hebr");
pub const LATN: u32 = tag!(b"latn");
pub const SYRC: u32 = tag!(b"syrc");

// languages
pub const DFLT_LANG: u32 = tag!(b"dflt");

// features
pub const CALT: u32 = tag!(b"calt");
pub const CCMP: u32 = tag!(b"ccmp");
pub const CLIG: u32 = tag!(b"clig");
pub const CURS: u32 = tag!(b"curs");
pub const FINA: u32 = tag!(b"fina");
pub const INIT: u32 = tag!(b"init");
pub const ISOL: u32 = tag!(b"isol");
pub const KERN: u32 = tag!(b"kern");
pub const LIGA: u32 = tag!(b"liga");
pub const LOCL: u32 = tag!(b"locl");
pub const MARK: u32 = tag!(b"mark");
pub const MEDI: u32 = tag!(b"medi");
pub const MKMK: u32 = tag!(b"mkmk");
pub const RLIG: u32 = tag!(b"rlig");

#[cfg(test)]
mod tests {
    use super::*;

    mod from_string {
        use super::*;

        #[test]
        fn test_four_chars() {
            let tag = from_string("arab").expect("invalid tag");

            assert_eq!(tag, ARAB);
        }

        #[test]
        fn test_three_chars() {
            let tag = from_string("BEN").expect("invalid tag");

            assert_eq!(tag, 1111838240);
        }

        #[test]
        fn test_wildcard() {
            assert_eq!(from_string("*"), Ok(WILDCARD));
        }

        #[test]
        fn test_blank() {
            assert!(from_string("").is_err());
            assert!(from_string("   ").is_err());
            assert!(from_string("toolong").is_err());
        }
    }

    mod display_tag {
        use crate::tag::{DisplayTag, LIGA, WILDCARD};

        #[test]
        fn test_ascii() {
            assert_eq!(DisplayTag(LIGA).to_string(), "liga".to_string());
        }

        #[test]
        fn test_padded() {
            assert_eq!(DisplayTag(WILDCARD).to_string(), "*".to_string());
        }

        #[test]
        fn test_non_ascii() {
            assert_eq!(DisplayTag(0x12345678).to_string(), "0x12345678".to_string());
        }
    }
}
