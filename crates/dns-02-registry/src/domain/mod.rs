//! Domain layer: contract state, message handling and the pure rules
//! (validation, pricing, resolution) they share.

pub mod code;
pub mod content;
pub mod entities;
pub mod execution;
pub mod pricing;
pub mod record;
pub mod registrar;
pub mod resolution;
pub mod validation;
pub mod value_objects;

pub use code::ContractKind;
pub use content::DomainContent;
pub use entities::{
    Auction, RecordBody, RecordPhase, RecordState, RegistrarState, RoyaltyParams, Tenure,
};
pub use execution::{ContractContext, InboundMessage, Outcome, OutboundMessage, SendMode};
pub use pricing::{base_price, floor_price, min_price};
pub use record::{NftData, RecordContract};
pub use registrar::{record_state_init, CollectionData, RegistrarContract};
pub use resolution::{domain_index, encode_dns_path, Resolution};
pub use validation::{parse_domain, validate_domain, MAX_DOMAIN_LEN, MIN_DOMAIN_LEN};
pub use value_objects::{category_hash, opcodes, Category, DnsRecord};
