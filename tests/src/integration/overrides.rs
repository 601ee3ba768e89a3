//! # Network Override Tests
//!
//! The network-wide override table claims record indices. A claimed name
//! cannot be registered, and any sender can ask its record to apply the
//! decision: a forced transfer or a release that destroys the record.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use dns_01_cell_codec::Cell;
    use dns_02_registry::prelude::*;
    use shared_types::{Address, Coins, U256};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn index_of(domain: &str) -> U256 {
        domain_index(domain.as_bytes()).unwrap()
    }

    fn claim(service: &TestService, domain: &str, decision: &OverrideDecision) {
        service
            .overrides()
            .insert(index_of(domain), decision)
            .unwrap();
    }

    async fn accounts(service: &TestService) -> (Address, Address, Address) {
        (
            service.open_account("alice").await,
            service.open_account("bob").await,
            service.open_account("carol").await,
        )
    }

    // =========================================================================
    // REGISTRATION
    // =========================================================================

    #[tokio::test]
    async fn test_claimed_name_cannot_be_registered() {
        let service = create_service();
        let (alice, ..) = accounts(&service).await;
        claim(&service, "reserved", &OverrideDecision::Release);

        let price = service.quote("reserved").await.unwrap();
        let err = service.register(alice, "reserved", price).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::OVERRIDE_BLOCKED));
        assert_eq!(service.balance(&alice).await, funding(&service));

        // other names are unaffected
        service.register(alice, "available", price).await.unwrap();
    }

    // =========================================================================
    // FORCED TRANSFER
    // =========================================================================

    #[tokio::test]
    async fn test_forced_transfer_cancels_auction() {
        let service = create_service();
        let (alice, bob, carol) = accounts(&service).await;
        let price = service.quote("alice").await.unwrap();
        service.register(alice, "alice", price).await.unwrap();

        claim(
            &service,
            "alice",
            &OverrideDecision::Transfer(TransferTerms::to(carol)),
        );
        service
            .process_override(bob, "alice", Coins::from_coins(1))
            .await
            .unwrap();

        let info = service.domain_info("alice").await.unwrap();
        assert_eq!(info.owner, Some(carol));
        assert_eq!(info.auction, None);
        assert_eq!(info.phase, RecordPhase::OwnedCurrent);
        // the bidder got the bid back
        assert_eq!(service.balance(&alice).await, funding(&service));
        assert_eq!(service.balance(&bob).await, funding(&service));
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_forced_transfer_returns_excess_to_requester() {
        let service = create_service();
        let (alice, bob, carol) = accounts(&service).await;
        own_domain(&service, alice, "alice").await;
        claim(
            &service,
            "alice",
            &OverrideDecision::Transfer(TransferTerms::to(carol)),
        );
        let record_before = service.domain_info("alice").await.unwrap().balance;

        let receipt = service
            .process_override(bob, "alice", Coins::from_coins(1))
            .await
            .unwrap();
        // the record's own transaction and the excess back to bob
        assert_eq!(receipt.transactions, 2);

        let info = service.domain_info("alice").await.unwrap();
        assert_eq!(info.owner, Some(carol));
        assert_eq!(info.balance, record_before);
        assert_eq!(service.balance(&bob).await, funding(&service));
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_forced_transfer_of_owned_domain() {
        let service = create_service();
        let (alice, bob, carol) = accounts(&service).await;
        own_domain(&service, alice, "alice").await;

        let terms = TransferTerms {
            response_destination: Some(bob),
            ..TransferTerms::to(carol)
        };
        claim(&service, "alice", &OverrideDecision::Transfer(terms));
        let bob_before = service.balance(&bob).await;

        service
            .process_override(bob, "alice", Coins::from_coins(1))
            .await
            .unwrap();
        assert_eq!(
            service.domain_info("alice").await.unwrap().owner,
            Some(carol)
        );
        // the caller's value came back as excess
        assert_eq!(service.balance(&bob).await, bob_before);

        let err = service
            .transfer(alice, "alice", alice, Coins::ZERO, Coins::from_coins(1))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::UNAUTHORIZED_TRANSFER));
    }

    // =========================================================================
    // FORCED RELEASE
    // =========================================================================

    #[tokio::test]
    async fn test_forced_release_destroys_record() {
        let service = create_service();
        let (alice, bob, _) = accounts(&service).await;
        own_domain(&service, alice, "alice").await;
        let registrar = service.registrar();
        let registrar_before = service.balance(&registrar).await;
        let record_balance = service.domain_info("alice").await.unwrap().balance;

        claim(&service, "alice", &OverrideDecision::Release);
        service
            .process_override(bob, "alice", Coins::from_coins(1))
            .await
            .unwrap();

        let info = service.domain_info("alice").await.unwrap();
        assert!(!info.deployed);
        assert_eq!(info.balance, Coins::ZERO);
        assert_eq!(
            service.balance(&registrar).await,
            registrar_before + record_balance + Coins::from_coins(1)
        );
        assert_eq!(
            service.resolve("alice", Category::Wallet.key()).await.unwrap(),
            None
        );
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_lifted_claim_allows_registration_again() {
        let service = create_service();
        let (alice, bob, _) = accounts(&service).await;
        own_domain(&service, alice, "alice").await;
        claim(&service, "alice", &OverrideDecision::Release);
        service
            .process_override(bob, "alice", Coins::from_coins(1))
            .await
            .unwrap();

        let price = service.quote("alice").await.unwrap();
        let err = service.register(bob, "alice", price).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::OVERRIDE_BLOCKED));

        service.overrides().remove(&index_of("alice"));
        service.register(bob, "alice", price).await.unwrap();
        let info = service.domain_info("alice").await.unwrap();
        assert_eq!(info.auction.unwrap().bidder, bob);
    }

    // =========================================================================
    // NO DECISION
    // =========================================================================

    #[tokio::test]
    async fn test_without_decision_nothing_happens() {
        let service = create_service();
        let (alice, bob, _) = accounts(&service).await;
        own_domain(&service, alice, "alice").await;

        let receipt = service
            .process_override(bob, "alice", Coins::from_coins(1))
            .await
            .unwrap();
        assert_eq!(receipt.exit_code, exit_codes::UNKNOWN_OP);

        service
            .overrides()
            .insert_raw(index_of("alice"), Cell::from_bytes(&[0x77]).unwrap());
        let receipt = service
            .process_override(bob, "alice", Coins::from_coins(1))
            .await
            .unwrap();
        assert_eq!(receipt.exit_code, exit_codes::UNKNOWN_OP);
        assert_eq!(
            service.domain_info("alice").await.unwrap().owner,
            Some(alice)
        );
    }
}
