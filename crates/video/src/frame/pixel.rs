//! Declares the [Pixel] type, the unit a [super::Frame] is made of.

/// A macro for creating [Pixel]s at compile-time from hex-strings in the format
/// `#RRGGBBAA` or `#RRGGBB`.
///
/// # Example
///
/// ```
/// use video::frame::Pixel;
/// use video::pixel;
///
/// let pixel = pixel!("#2FA3FEFF");
/// assert_eq!(pixel, Pixel::from_rgb(0x2F, 0xA3, 0xFE));
/// ```
#[macro_export]
macro_rules! pixel {
    ($s: literal) => {{
        match $crate::frame::Pixel::from_hex_str($s) {
            Some(pixel) => pixel,
            None => panic!(
                "Invalid hex string format. Expected something like \
                `pixel!(\"#RRGGBB\")` or `pixel!(\"#RRGGBBAA\")`."
            ),
        }
    }};
}

/// A 32-bit RGBA pixel with four 8-bit channels: red, green, blue, and alpha
/// (opacity).
///
/// | Channel         | Byte Offset |
/// | --------------- | ----------- |
/// | Red             | 0           |
/// | Green           | 1           |
/// | Blue            | 2           |
/// | Alpha (opacity) | 3           |
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Pixel {
    channels: [u8; 4],
}

impl Pixel {
    /// Completely black and opaque (`#000000FF`).
    pub const BLACK: Self = pixel!("#000000FF");

    /// Completely white and opaque (`#FFFFFFFF`).
    pub const WHITE: Self = pixel!("#FFFFFFFF");

    /// Completely transparent (`#00000000`).
    pub const TRANSPARENT: Self = pixel!("#00000000");

    /// Create a new pixel from each of the RGBA channels.
    pub const fn from_rgba(red: u8, green: u8, blue: u8, alpha: u8) -> Self {
        Self {
            channels: [red, green, blue, alpha],
        }
    }

    /// Create a new, completely opaque pixel from only the RGB channels.
    pub const fn from_rgb(red: u8, green: u8, blue: u8) -> Self {
        Self::from_rgba(red, green, blue, 0xFF)
    }

    /// Create a [Pixel] from a string in the format `#RRGGBBAA` or `#RRGGBB`.
    /// If `s` is not in either format, [None] is returned.
    ///
    /// This is `const` so that the [pixel] macro can use it.
    pub const fn from_hex_str(s: &str) -> Option<Self> {
        const fn hex_digit(chr: u8) -> Option<u8> {
            match chr {
                b'0'..=b'9' => Some(chr - b'0'),
                b'a'..=b'f' => Some(chr - b'a' + 10),
                b'A'..=b'F' => Some(chr - b'A' + 10),
                _ => None,
            }
        }

        const fn channel_at(s: &[u8], i: usize) -> Option<u8> {
            let (Some(high), Some(low)) = (hex_digit(s[i]), hex_digit(s[i + 1])) else {
                return None;
            };
            Some(high << 4 | low)
        }

        let s = s.as_bytes();
        if (s.len() != 7 && s.len() != 9) || s[0] != b'#' {
            return None;
        }

        let (Some(red), Some(green), Some(blue)) =
            (channel_at(s, 1), channel_at(s, 3), channel_at(s, 5))
        else {
            return None;
        };

        let alpha = if s.len() == 9 {
            match channel_at(s, 7) {
                Some(alpha) => alpha,
                None => return None,
            }
        } else {
            0xFF
        };

        Some(Self::from_rgba(red, green, blue, alpha))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_strings_parse() {
        assert_eq!(
            Pixel::from_hex_str("#0a0B0c"),
            Some(Pixel::from_rgb(0x0A, 0x0B, 0x0C))
        );
        assert_eq!(
            Pixel::from_hex_str("#01020304"),
            Some(Pixel::from_rgba(1, 2, 3, 4))
        );
    }

    #[test]
    fn malformed_hex_strings_are_rejected() {
        assert_eq!(Pixel::from_hex_str("010203"), None);
        assert_eq!(Pixel::from_hex_str("#01020"), None);
        assert_eq!(Pixel::from_hex_str("#0102030"), None);
        assert_eq!(Pixel::from_hex_str("#GG0000"), None);
        assert_eq!(Pixel::from_hex_str(""), None);
    }
}
