//! Password generation for the control-plane account
//!
//! Generated passwords are fixed length, contain at least one uppercase
//! letter, one digit and one symbol from [`PASSWORD_SYMBOLS`], and never repeat
//! a character.

use crate::security::SecureString;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

pub const PASSWORD_LENGTH: usize = 8;

/// Symbols the control plane accepts in account passwords
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&";

const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";

/// Generate a password using the thread-local RNG
pub fn generate_password() -> SecureString {
    generate_password_with(&mut rand::rng())
}

/// Generate a password from the given RNG
pub fn generate_password_with<R: Rng + ?Sized>(rng: &mut R) -> SecureString {
    let mut chars: Vec<u8> = Vec::with_capacity(PASSWORD_LENGTH);

    push_unused(&mut chars, UPPERCASE, rng);
    push_unused(&mut chars, DIGITS, rng);
    push_unused(&mut chars, PASSWORD_SYMBOLS.as_bytes(), rng);
    while chars.len() < PASSWORD_LENGTH {
        push_unused(&mut chars, LETTERS, rng);
    }

    chars.shuffle(rng);
    SecureString::new(chars.into_iter().map(char::from).collect())
}

fn push_unused<R: Rng + ?Sized>(chars: &mut Vec<u8>, pool: &[u8], rng: &mut R) {
    let candidates: Vec<u8> = pool
        .iter()
        .copied()
        .filter(|c| !chars.contains(c))
        .collect();
    if let Some(c) = candidates.choose(rng) {
        chars.push(*c);
    }
}
