//! # Ton-DNS Test Suite
//!
//! End-to-end tests that drive the registrar and domain records through the
//! sandbox network, the same way a wallet would.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── registration_flow.rs   # validation, pricing, auction to ownership
//!     ├── auction.rs             # outbidding, prolongation
//!     ├── ownership.rs           # transfers, edits, authorization
//!     ├── release.rs             # renewal window and re-auction
//!     ├── overrides.rs           # network-forced transfers and releases
//!     ├── batch.rs               # owner-only direct deployment
//!     ├── resolution.rs          # recursive resolution across registrars
//!     ├── conservation.rs        # value accounting across flows
//!     └── codec.rs               # contract data on the wire
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p dns-tests
//! cargo test -p dns-tests integration::auction::
//! ```

pub mod integration;
