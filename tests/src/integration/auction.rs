//! # Auction Tests
//!
//! Bidding on a freshly registered domain: strictly increasing bids, refunds
//! to the outbid party, late-bid prolongation and settlement to the last
//! bidder.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use dns_02_registry::prelude::*;
    use shared_types::{Address, Coins};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Bidders {
        alice: Address,
        bob: Address,
        price: Coins,
    }

    async fn open_auction(service: &TestService, domain: &str) -> Bidders {
        let alice = service.open_account("alice").await;
        let bob = service.open_account("bob").await;
        let price = service.quote(domain).await.unwrap();
        service.register(alice, domain, price).await.unwrap();
        Bidders { alice, bob, price }
    }

    fn plus(coins: Coins, whole: u64) -> Coins {
        coins + Coins::from_coins(whole)
    }

    // =========================================================================
    // BIDDING
    // =========================================================================

    #[tokio::test]
    async fn test_outbid_refunds_previous_bidder() {
        let service = create_service();
        let Bidders { alice, bob, price } = open_auction(&service, "auction").await;
        assert_eq!(
            service.balance(&alice).await,
            funding(&service).saturating_sub(price)
        );

        let receipt = service.bid(bob, "auction", plus(price, 1)).await.unwrap();
        // bid, then the refund to alice
        assert_eq!(receipt.transactions, 2);
        assert_eq!(service.balance(&alice).await, funding(&service));

        let auction = service
            .domain_info("auction")
            .await
            .unwrap()
            .auction
            .unwrap();
        assert_eq!(auction.bidder, bob);
        assert_eq!(auction.bid, plus(price, 1));
        assert_eq!(service.stats().await.bids, 1);
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_refund_carries_outbid_notice() {
        let service = create_service();
        let Bidders { alice, bob, price } = open_auction(&service, "auction").await;
        service.bid(bob, "auction", plus(price, 1)).await.unwrap();

        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        let refund = sandbox.transactions().last().unwrap();
        assert_eq!(refund.destination, alice);
        assert_eq!(refund.value, price);
        assert_eq!(refund.op, Some(opcodes::OUTBID));
    }

    #[tokio::test]
    async fn test_equal_bid_is_rejected() {
        let service = create_service();
        let Bidders { alice, bob, price } = open_auction(&service, "auction").await;

        let err = service.bid(bob, "auction", price).await.unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::BID_TOO_LOW));
        assert_eq!(service.balance(&bob).await, funding(&service));

        let auction = service
            .domain_info("auction")
            .await
            .unwrap()
            .auction
            .unwrap();
        assert_eq!(auction.bidder, alice);
        assert_eq!(service.stats().await.bids, 0);
    }

    #[tokio::test]
    async fn test_bidding_war_settles_to_last_bidder() {
        let service = create_service();
        let Bidders { alice, bob, price } = open_auction(&service, "auction").await;
        let registrar_before = service.balance(&service.registrar()).await;

        service.bid(bob, "auction", plus(price, 1)).await.unwrap();
        service.bid(alice, "auction", plus(price, 2)).await.unwrap();
        service.bid(bob, "auction", plus(price, 5)).await.unwrap();

        service
            .advance_time(service.config().registry.auction_duration)
            .await;
        // only the winner may touch the record now
        let err = service
            .renew(alice, "auction", Coins::from_coins(1))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::UNAUTHORIZED_RENEW));

        service
            .renew(bob, "auction", Coins::from_coins(1))
            .await
            .unwrap();
        assert_eq!(
            service.domain_info("auction").await.unwrap().owner,
            Some(bob)
        );
        assert_eq!(service.balance(&alice).await, funding(&service));
        assert_eq!(
            service.balance(&bob).await,
            funding(&service).saturating_sub(plus(price, 6))
        );
        assert_eq!(
            service.balance(&service.registrar()).await,
            registrar_before + plus(price, 5)
        );
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_bid_after_end_is_refused() {
        let service = create_service();
        let Bidders { bob, price, .. } = open_auction(&service, "auction").await;
        service
            .advance_time(service.config().registry.auction_duration)
            .await;

        let err = service
            .bid(bob, "auction", plus(price, 100))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::UNAUTHORIZED_RENEW));
        // the failed message did not settle the auction either
        assert!(service
            .domain_info("auction")
            .await
            .unwrap()
            .auction
            .is_some());
    }

    // =========================================================================
    // PROLONGATION
    // =========================================================================

    #[tokio::test]
    async fn test_late_bid_extends_auction() {
        let service = create_service();
        let Bidders { bob, price, .. } = open_auction(&service, "auction").await;
        let duration = service.config().registry.auction_duration;
        let prolongation = service.config().registry.auction_prolongation;

        service.advance_time(duration - 100).await;
        service.bid(bob, "auction", plus(price, 1)).await.unwrap();

        let auction = service
            .domain_info("auction")
            .await
            .unwrap()
            .auction
            .unwrap();
        assert_eq!(auction.end_time, service.now().await + prolongation);

        // the original end no longer closes the auction
        service.advance_time(100).await;
        assert_eq!(
            service.domain_info("auction").await.unwrap().phase,
            RecordPhase::AuctionActive
        );
    }

    #[tokio::test]
    async fn test_early_bid_keeps_end_time() {
        let service = create_service();
        let Bidders { bob, price, .. } = open_auction(&service, "auction").await;
        let end = service
            .domain_info("auction")
            .await
            .unwrap()
            .auction
            .unwrap()
            .end_time;

        service.advance_time(3600 * 24).await;
        service.bid(bob, "auction", plus(price, 1)).await.unwrap();
        let auction = service
            .domain_info("auction")
            .await
            .unwrap()
            .auction
            .unwrap();
        assert_eq!(auction.end_time, end);
    }
}
