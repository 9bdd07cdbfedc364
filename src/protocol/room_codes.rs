use rand::RngExt;

/// Length of every room code.
pub const ROOM_CODE_LENGTH: usize = 6;

const ALPHANUMERIC_CHARS: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generate a six-character uppercase alphanumeric room code.
/// Uniqueness is the registry's job; this is just the random draw.
pub fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..ROOM_CODE_LENGTH)
        .map(|_| {
            let idx = rng.random_range(0..ALPHANUMERIC_CHARS.len());
            // SAFETY: `idx` is produced by `random_range(0..len)`, so it is
            // always within [0, len).
            #[allow(clippy::indexing_slicing)]
            let ch = ALPHANUMERIC_CHARS[idx] as char;
            ch
        })
        .collect()
}

/// Check that a client-supplied code has the shape of a room code.
pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LENGTH
        && code
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}
