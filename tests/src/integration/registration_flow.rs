//! # Registration Flow
//!
//! A wallet pays the registrar, the registrar deploys the domain record with
//! the payment as the opening bid, the auction runs out and the first
//! message after that settles ownership.
//!
//! ```text
//! [Wallet] ──name, price──► [Registrar] ──deploy + state init──► [Record]
//!                                                              (auction)
//!                        ... auction_duration ...
//! [Wallet] ──renew───────────────────────────────────────────► [Record]
//!                                                   ──winning bid──► [Registrar]
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use dns_01_cell_codec::Cell;
    use dns_02_registry::prelude::*;
    use shared_types::{Address, Coins};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    async fn record_data(service: &TestService, record: Address) -> Cell {
        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        sandbox.account(&record).unwrap().data.clone()
    }

    // =========================================================================
    // VALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_invalid_names_are_bounced_with_their_code() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let payment = Coins::from_coins(2000);

        let cases = [
            ("abc", exit_codes::DOMAIN_TOO_SHORT),
            ("Alice", exit_codes::INVALID_CHARACTER),
            ("-alice", exit_codes::INVALID_CHARACTER),
            ("alice-", exit_codes::INVALID_CHARACTER),
            ("al_ce", exit_codes::INVALID_CHARACTER),
        ];
        for (name, code) in cases {
            let err = service.register(alice, name, payment).await.unwrap_err();
            assert_eq!(err.exit_code(), Some(code), "{name}");
        }

        let long = "a".repeat(127);
        let err = service.register(alice, &long, payment).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::DOMAIN_TOO_LONG));

        // every rejection bounced the payment back
        assert_eq!(service.balance(&alice).await, funding(&service));
        assert_eq!(service.stats().await.messages_rejected, 6);
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_edge_lengths_are_accepted() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let longest = "z".repeat(126);
        for name in ["abcd", longest.as_str()] {
            let price = service.quote(name).await.unwrap();
            let receipt = service.register(alice, name, price).await.unwrap();
            assert_eq!(receipt.exit_code, exit_codes::OK);
            assert!(service.domain_info(name).await.unwrap().deployed);
        }
    }

    #[tokio::test]
    async fn test_underpayment_is_rejected() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let price = service.quote("alice").await.unwrap();
        let short = Coins::from_nanos(price.nanos() - 1);

        let err = service.register(alice, "alice", short).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::INSUFFICIENT_PAYMENT));
        assert!(!service.domain_info("alice").await.unwrap().deployed);
    }

    #[tokio::test]
    async fn test_registration_closed_until_epoch() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        {
            let sandbox = service.sandbox();
            let mut sandbox = sandbox.write().await;
            let epoch = sandbox.config().auction_epoch;
            sandbox.set_time(epoch);
        }
        let err = service
            .register(alice, "alice", Coins::from_coins(1000))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::AUCTION_NOT_STARTED));

        service.advance_time(1).await;
        service
            .register(alice, "alice", Coins::from_coins(1000))
            .await
            .unwrap();
    }

    // =========================================================================
    // PRICING
    // =========================================================================

    #[tokio::test]
    async fn test_quote_decays_with_time() {
        let service = create_service();
        assert_eq!(service.quote("abcdefg").await.unwrap(), Coins::from_coins(300));

        // twelve pricing months later
        service.advance_time(12 * 2_592_000).await;
        let decayed = service.quote("abcdefg").await.unwrap();
        assert!(decayed < Coins::from_coins(300));
        assert!(decayed > Coins::from_coins(30));

        // far past the decay horizon, the floor holds
        service.advance_time(100 * 2_592_000).await;
        assert_eq!(service.quote("abcdefg").await.unwrap(), Coins::from_coins(30));
        assert_eq!(
            service.quote("abcdefghijklmnop").await.unwrap(),
            Coins::from_nanos(1_100_000_000)
        );
    }

    // =========================================================================
    // AUCTION TO OWNERSHIP
    // =========================================================================

    #[tokio::test]
    async fn test_full_registration_lifecycle() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let registrar = service.registrar();
        let registrar_before = service.balance(&registrar).await;

        let price = service.quote("alice").await.unwrap();
        let receipt = service.register(alice, "alice", price).await.unwrap();
        assert_eq!(receipt.transactions, 2);
        assert_eq!(receipt.record, service.record_address("alice").await.unwrap());

        let info = service.domain_info("alice").await.unwrap();
        assert_eq!(info.phase, RecordPhase::AuctionActive);
        assert_eq!(info.owner, None);
        let auction = info.auction.unwrap();
        assert_eq!(auction.bidder, alice);
        assert_eq!(auction.bid, price);
        assert_eq!(
            auction.end_time,
            service.now().await + service.config().registry.auction_duration
        );
        assert_eq!(info.balance, price);

        // the auction hides all records
        assert_eq!(
            service.resolve("alice", Category::Wallet.key()).await.unwrap(),
            None
        );

        service
            .advance_time(service.config().registry.auction_duration)
            .await;
        assert_eq!(
            service.domain_info("alice").await.unwrap().phase,
            RecordPhase::OwnedCurrent
        );

        service
            .renew(alice, "alice", Coins::from_coins(1))
            .await
            .unwrap();
        let info = service.domain_info("alice").await.unwrap();
        assert_eq!(info.owner, Some(alice));
        assert_eq!(info.auction, None);
        assert_eq!(info.last_fill_up, service.now().await);
        // the record keeps its reserve, the bid goes to the registrar
        assert_eq!(info.balance, service.config().registry.storage_reserve);
        assert_eq!(service.balance(&registrar).await, registrar_before + price);

        let wallet = DnsRecord::Wallet(alice).to_cell().unwrap();
        service
            .edit_record(alice, "alice", Category::Wallet.key(), Some(wallet.clone()))
            .await
            .unwrap();
        assert_eq!(
            service.resolve("alice", Category::Wallet.key()).await.unwrap(),
            Some(wallet)
        );
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_registering_a_taken_name_refunds() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let bob = service.open_account("bob").await;
        own_domain(&service, alice, "alice").await;

        let record = service.record_address("alice").await.unwrap();
        let data_before = record_data(&service, record).await;
        let registrations_before = service.stats().await.registrations;

        let price = service.quote("alice").await.unwrap();
        let err = service.register(bob, "alice", price).await.unwrap_err();
        assert_eq!(
            err,
            ApiError::AlreadyRegistered {
                domain: "alice".into()
            }
        );

        // the record handed the payment back and kept its data
        assert_eq!(record_data(&service, record).await, data_before);
        assert_eq!(service.stats().await.registrations, registrations_before);
        assert_eq!(service.balance(&bob).await, funding(&service));
        assert_eq!(
            service.domain_info("alice").await.unwrap().owner,
            Some(alice)
        );
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_stats_track_operations() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        own_domain(&service, alice, "alice").await;
        let _ = service.register(alice, "abc", Coins::from_coins(1)).await;

        let stats = service.stats().await;
        assert_eq!(stats.registrations, 1);
        assert_eq!(stats.messages_submitted, 3);
        assert_eq!(stats.messages_accepted, 2);
        assert_eq!(stats.messages_rejected, 1);
    }
}
