//! Conversions between hex text, raw octets and display-safe text.

/// Size of a MIFARE Classic block in octets.
pub const BLOCK_SIZE: usize = 16;

/// A MIFARE Classic block.
pub type Block = [u8; BLOCK_SIZE];

/// Decodes pairs of hex digits into octets, skipping spaces, for `max_len` octets max.
/// Decoding stops at the first pair that is not hex; a trailing fragment is dropped silently.
pub fn decode_hex(text: &str, max_len: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut chars = text.chars().filter(|&c| c != ' ');

    while bytes.len() < max_len {
        let pair = chars.next().and_then(|hi| Some((hi, chars.next()?)));
        let byte = pair.and_then(|(hi, lo)| Some((hi.to_digit(16)? << 4 | lo.to_digit(16)?) as u8));

        match byte {
            Some(b) => bytes.push(b),
            None => break,
        }
    }

    bytes
}

/// Renders octets as upper-case hex pairs separated by a space, e.g. `"FF A0 6B"`.
pub fn encode_hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| hex::encode_upper([*b]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders octets as printable ASCII, replacing anything else with `.`.
/// The first NUL octet terminates the text.
pub fn encode_display(bytes: &[u8]) -> String {
    bytes
        .iter()
        .take_while(|&&b| b != 0x00)
        .map(|&b| match b {
            32..=126 => b as char,
            _ => '.',
        })
        .collect()
}

/// Copies the raw octets of the text into a block, truncating or zero-padding to 16 octets.
pub fn pad_to_block(text: impl AsRef<[u8]>) -> Block {
    let mut block = [0u8; BLOCK_SIZE];
    let bytes = text.as_ref();
    let len = bytes.len().min(BLOCK_SIZE);

    block[..len].copy_from_slice(&bytes[..len]);
    block
}
