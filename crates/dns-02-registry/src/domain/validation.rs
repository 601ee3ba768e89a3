//! # Domain Validator
//!
//! A registrable name is 4 to 126 bytes of `[a-z0-9-]` with no hyphen at
//! either end. The name arrives as the rest of the registration body plus,
//! optionally, a second chunk in the body's first reference.
//!
//! Checks run in a fixed order: alignment, then length, then characters.

use crate::errors::ContractError;
use dns_01_cell_codec::CellSlice;

/// Shortest registrable name.
pub const MIN_DOMAIN_LEN: usize = 4;

/// Longest registrable name.
pub const MAX_DOMAIN_LEN: usize = 126;

/// Collects the name bytes from the unread part of `body` and its first
/// reference.
///
/// # Errors
///
/// Returns `ContractError::MalformedBody` if either chunk is not a whole
/// number of bytes.
pub fn read_domain(body: &CellSlice) -> Result<Vec<u8>, ContractError> {
    let mut slice = body.clone();
    if slice.remaining_bits() % 8 != 0 {
        return Err(ContractError::MalformedBody);
    }
    let mut name = slice.load_bytes(slice.remaining_bits() / 8)?;
    if slice.remaining_refs() > 0 {
        let chunk = slice.load_ref()?;
        if chunk.bit_len() % 8 != 0 {
            return Err(ContractError::MalformedBody);
        }
        name.extend(chunk.parse().load_bytes(chunk.bit_len() / 8)?);
    }
    Ok(name)
}

fn is_allowed(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-'
}

/// Checks length and charset of a name.
///
/// # Errors
///
/// `DomainTooShort`, `DomainTooLong` or `InvalidCharacter`.
pub fn validate_domain(name: &[u8]) -> Result<(), ContractError> {
    let len = name.len();
    if len < MIN_DOMAIN_LEN {
        return Err(ContractError::DomainTooShort { len });
    }
    if len > MAX_DOMAIN_LEN {
        return Err(ContractError::DomainTooLong { len });
    }
    for (position, &byte) in name.iter().enumerate() {
        let edge = position == 0 || position == len - 1;
        if !is_allowed(byte) || (edge && byte == b'-') {
            return Err(ContractError::InvalidCharacter { byte, position });
        }
    }
    Ok(())
}

/// Reads and validates the name in a registration body.
///
/// # Errors
///
/// See [`read_domain`] and [`validate_domain`].
pub fn parse_domain(body: &CellSlice) -> Result<Vec<u8>, ContractError> {
    let name = read_domain(body)?;
    validate_domain(&name)?;
    Ok(name)
}
