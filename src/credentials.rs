use core::fmt;

// Built-in identity. EUIs are kept least-significant byte first, which is
// the order the MAC library consumes them in. TTN issued AppEUIs end in
// 0xD5, 0xB3, 0x70 in this order.
pub const DEFAULT_APP_EUI: [u8; 8] = [0xC0, 0x0C, 0x01, 0xD0, 0x7E, 0xD5, 0xB3, 0x70];
pub const DEFAULT_DEV_EUI: [u8; 8] = [0x53, 0x34, 0x43, 0x45, 0x3F, 0xF3, 0xF3, 0x23];

// The Semtech default key. Keys are a block of memory, not a number, so they
// are copied from the console as-is.
pub const DEFAULT_APP_KEY: [u8; 16] = [
    0x73, 0x99, 0x8E, 0xFD, 0x71, 0x9C, 0xBB, 0xFE, 0x74, 0xBB, 0xB3, 0x21, 0x0A, 0x22, 0x97, 0x57,
];

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    BadLength { expected: usize, found: usize },
    BadDigit(char),
}

/// A 64-bit extended unique identifier, stored LSB first.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Eui([u8; 8]);

impl Eui {
    pub const fn from_lsb(bytes: [u8; 8]) -> Self {
        Eui(bytes)
    }

    /// Parses an EUI the way network consoles print it: most significant
    /// byte first.
    pub fn from_msb_hex(s: &str) -> Result<Self, Error> {
        let mut bytes: [u8; 8] = decode_hex(s)?;
        bytes.reverse();
        Ok(Eui(bytes))
    }

    pub fn as_lsb(&self) -> [u8; 8] {
        self.0
    }
}

impl fmt::Display for Eui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.0.iter().rev() {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Eui {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Eui({self})")
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AppKey([u8; 16]);

impl AppKey {
    pub const fn new(bytes: [u8; 16]) -> Self {
        AppKey(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, Error> {
        decode_hex(s).map(AppKey)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Debug for AppKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AppKey(<redacted>)")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credentials {
    pub dev_eui: Eui,
    pub app_eui: Eui,
    pub app_key: AppKey,
}

impl Default for Credentials {
    fn default() -> Self {
        Credentials {
            dev_eui: Eui::from_lsb(DEFAULT_DEV_EUI),
            app_eui: Eui::from_lsb(DEFAULT_APP_EUI),
            app_key: AppKey::new(DEFAULT_APP_KEY),
        }
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, ':' | '-' | ' ')
}

fn decode_hex<const N: usize>(s: &str) -> Result<[u8; N], Error> {
    let found = s.chars().filter(|c| !is_separator(*c)).count();
    if found != N * 2 {
        return Err(Error::BadLength {
            expected: N * 2,
            found,
        });
    }

    let mut out = [0u8; N];
    let digits = s.chars().filter(|c| !is_separator(*c));
    for (idx, c) in digits.enumerate() {
        let nibble = c.to_digit(16).ok_or(Error::BadDigit(c))? as u8;
        out[idx / 2] = (out[idx / 2] << 4) | nibble;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_eui_is_stored_reversed() {
        let eui = Eui::from_msb_hex("70B3D57ED0010CC0").unwrap();
        assert_eq!(eui.as_lsb(), DEFAULT_APP_EUI);
        assert_eq!(format!("{eui}"), "70B3D57ED0010CC0");
    }

    #[test]
    fn separators_are_ignored() {
        let eui = Eui::from_msb_hex("23:f3:f3:3f:45-43 34 53").unwrap();
        assert_eq!(eui.as_lsb(), DEFAULT_DEV_EUI);
    }

    #[test]
    fn key_is_kept_in_console_order() {
        let key = AppKey::from_hex("73998EFD719CBBFE74BBB3210A229757").unwrap();
        assert_eq!(key.as_bytes(), &DEFAULT_APP_KEY);
    }

    #[test]
    fn short_or_long_input_is_rejected() {
        assert_eq!(
            Eui::from_msb_hex("70B3D57E"),
            Err(Error::BadLength {
                expected: 16,
                found: 8
            })
        );
        assert_eq!(
            AppKey::from_hex("73998EFD719CBBFE74BBB3210A22975700"),
            Err(Error::BadLength {
                expected: 32,
                found: 34
            })
        );
    }

    #[test]
    fn non_hex_digit_is_rejected() {
        assert_eq!(
            Eui::from_msb_hex("70B3D57ED0010CCG"),
            Err(Error::BadDigit('G'))
        );
    }

    #[test]
    fn key_debug_does_not_leak() {
        let creds = Credentials::default();
        let text = format!("{creds:?}");
        assert!(!text.contains("73998EFD"));
        assert!(text.contains("<redacted>"));
    }
}
