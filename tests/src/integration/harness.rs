//! Fixtures shared by the integration tests.

use dns_01_cell_codec::Cell;
use dns_02_registry::prelude::*;
use shared_types::{Address, Coins};

/// Service over an in-memory override table.
pub type TestService = NameRegistryService<InMemoryOverrideTable>;

/// Fresh network with an owned registrar.
pub fn create_service() -> TestService {
    NameRegistryService::new(ServiceConfig::default(), InMemoryOverrideTable::new()).unwrap()
}

/// Fresh network with a registrar nobody owns.
pub fn create_unowned_service() -> TestService {
    let config = ServiceConfig {
        owned_registrar: false,
        ..ServiceConfig::default()
    };
    NameRegistryService::new(config, InMemoryOverrideTable::new()).unwrap()
}

/// Registers `domain` at the quoted price, waits out the auction and
/// settles it with a one-coin renewal. Returns the price paid.
pub async fn own_domain(service: &TestService, owner: Address, domain: &str) -> Coins {
    let price = service.quote(domain).await.unwrap();
    service.register(owner, domain, price).await.unwrap();
    service
        .advance_time(service.config().registry.auction_duration)
        .await;
    service
        .renew(owner, domain, Coins::from_coins(1))
        .await
        .unwrap();
    price
}

/// Sends a raw message and returns the transactions it caused.
pub async fn send_raw(
    service: &TestService,
    sender: Address,
    destination: Address,
    value: Coins,
    body: Cell,
) -> Vec<Transaction> {
    let sandbox = service.sandbox();
    let mut sandbox = sandbox.write().await;
    sandbox
        .send(Envelope::new(sender, destination, value, body))
        .unwrap()
}

/// Value held by accounts and in flight equals value ever minted.
pub async fn assert_value_conserved(service: &TestService) {
    let sandbox = service.sandbox();
    let sandbox = sandbox.read().await;
    assert_eq!(sandbox.total_value(), sandbox.minted());
}

/// Funding every treasury starts with.
pub fn funding(service: &TestService) -> Coins {
    service.config().registry.treasury_funding
}
