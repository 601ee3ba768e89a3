//! # Name Resolution
//!
//! A DNS path lists the labels of a name in reverse order, each followed by
//! a zero byte: `sub.alice` travels as `alice\0sub\0`. Every resolver
//! consumes a prefix of the path and either answers the query or hands the
//! rest to a next resolver.

use crate::domain::content::DomainContent;
use crate::domain::value_objects::{Category, DnsRecord};
use crate::errors::ContractError;
use dns_01_cell_codec::domain::MAX_BITS;
use dns_01_cell_codec::{Cell, CellError, CellSlice};
use shared_types::{Address, U256};

/// Longest path that fits one cell.
pub const MAX_PATH_BYTES: usize = MAX_BITS / 8;

/// Answer of one resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Bits of the path this resolver consumed; 0 means it cannot answer.
    pub consumed_bits: usize,
    /// Record value found, if any.
    pub value: Option<Cell>,
}

impl Resolution {
    /// Resolver declines the query.
    #[must_use]
    pub fn unresolved() -> Self {
        Self {
            consumed_bits: 0,
            value: None,
        }
    }

    /// Next resolver to continue with, if the value is a delegation.
    #[must_use]
    pub fn next_resolver(&self) -> Option<Address> {
        match DnsRecord::from_cell(self.value.as_ref()?)? {
            DnsRecord::NextResolver(address) => Some(address),
            DnsRecord::Wallet(_) => None,
        }
    }
}

/// Record index of a domain: the hash of the cell holding its bytes.
///
/// # Errors
///
/// Returns an overflow error for names longer than one cell.
pub fn domain_index(name: &[u8]) -> Result<U256, ContractError> {
    Ok(Cell::from_bytes(name)?.hash_u256())
}

fn path_bytes(path: &CellSlice) -> Result<Vec<u8>, ContractError> {
    let bits = path.remaining_bits();
    if bits % 8 != 0 {
        return Err(ContractError::ResolvePathMisaligned { bits });
    }
    Ok(path.clone().load_bytes(bits / 8)?)
}

/// Root resolution: consumes the top-level label and delegates to the
/// record that owns it. `locate` maps a record index to its address.
///
/// A lone zero byte is the root itself and resolves to nothing. One leading
/// zero byte is skipped; the terminator after the label is left for the
/// record.
///
/// # Errors
///
/// Returns `ResolvePathMisaligned` or `EmptyLabel`, or whatever `locate`
/// fails with.
pub fn resolve_root<F>(path: &CellSlice, locate: F) -> Result<Resolution, ContractError>
where
    F: FnOnce(U256) -> Result<Address, ContractError>,
{
    let bytes = path_bytes(path)?;
    match bytes.as_slice() {
        [] => return Err(ContractError::EmptyLabel),
        [0] => {
            return Ok(Resolution {
                consumed_bits: 8,
                value: None,
            })
        }
        _ => {}
    }

    let skip = usize::from(bytes[0] == 0);
    let rest = &bytes[skip..];
    let label_len = rest.iter().position(|b| *b == 0).unwrap_or(rest.len());
    if label_len == 0 {
        return Err(ContractError::EmptyLabel);
    }

    let record = locate(domain_index(&rest[..label_len])?)?;
    Ok(Resolution {
        consumed_bits: (skip + label_len) * 8,
        value: Some(DnsRecord::NextResolver(record).to_cell()?),
    })
}

/// Resolution inside a domain record. The path must start at the separator
/// that follows the record's own label.
///
/// With more labels after it the record delegates to its next resolver;
/// otherwise it answers `category`, where category 0 means the whole record
/// dictionary.
///
/// # Errors
///
/// Returns `ResolvePathMisaligned` or `MissingSeparator`.
pub fn resolve_in_record(
    path: &CellSlice,
    category: &U256,
    content: &DomainContent,
) -> Result<Resolution, ContractError> {
    let bytes = path_bytes(path)?;
    if bytes.first() != Some(&0) {
        return Err(ContractError::MissingSeparator);
    }

    let value = if bytes.len() > 1 {
        content.get(&Category::NextResolver.key())
    } else if category.is_zero() {
        content.records_root()?
    } else {
        content.get(category)
    };
    Ok(Resolution {
        consumed_bits: 8,
        value,
    })
}

/// Encodes a dotted name as a DNS path. A trailing dot is ignored and the
/// empty name is the root, `\0`.
///
/// # Errors
///
/// Returns `EmptyLabel` for names like `a..b`, or an overflow error if the
/// path does not fit one cell.
pub fn encode_dns_path(domain: &str) -> Result<Vec<u8>, ContractError> {
    let name = domain.strip_suffix('.').unwrap_or(domain);
    if name.is_empty() {
        return Ok(vec![0]);
    }

    let mut path = Vec::with_capacity(name.len() + 1);
    for label in name.split('.').rev() {
        if label.is_empty() || label.as_bytes().contains(&0) {
            return Err(ContractError::EmptyLabel);
        }
        path.extend_from_slice(label.as_bytes());
        path.push(0);
    }

    if path.len() > MAX_PATH_BYTES {
        return Err(CellError::BitOverflow {
            requested: path.len() * 8,
            available: MAX_BITS,
        }
        .into());
    }
    Ok(path)
}
