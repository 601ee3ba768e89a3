//! # Ownership Tests
//!
//! What an owner can do with a settled domain, and what everyone else
//! cannot: transfers with notification and excess, record and content
//! edits, static-data queries.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use dns_01_cell_codec::Cell;
    use dns_02_registry::prelude::*;
    use shared_types::{Address, Coins};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    async fn owned(service: &TestService) -> (Address, Address) {
        let alice = service.open_account("alice").await;
        let bob = service.open_account("bob").await;
        own_domain(service, alice, "alice").await;
        (alice, bob)
    }

    fn half_coin() -> Coins {
        Coins::from_nanos(500_000_000)
    }

    // =========================================================================
    // TRANSFER
    // =========================================================================

    #[tokio::test]
    async fn test_transfer_notifies_and_returns_excess() {
        let service = create_service();
        let (alice, bob) = owned(&service).await;
        let alice_before = service.balance(&alice).await;

        let receipt = service
            .transfer(alice, "alice", bob, half_coin(), Coins::from_coins(2))
            .await
            .unwrap();
        assert_eq!(receipt.transactions, 3);

        let info = service.domain_info("alice").await.unwrap();
        assert_eq!(info.owner, Some(bob));
        assert_eq!(info.balance, service.config().registry.storage_reserve);
        assert_eq!(service.balance(&bob).await, funding(&service) + half_coin());
        assert_eq!(
            service.balance(&alice).await,
            alice_before.saturating_sub(half_coin())
        );

        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        let notice = sandbox
            .transactions()
            .iter()
            .rev()
            .find(|tx| tx.destination == bob)
            .unwrap();
        assert_eq!(notice.op, Some(opcodes::OWNERSHIP_ASSIGNED));
        let excess = sandbox.transactions().last().unwrap();
        assert_eq!(excess.destination, alice);
        assert_eq!(excess.op, Some(opcodes::EXCESSES));
        assert_eq!(sandbox.total_value(), sandbox.minted());
    }

    #[tokio::test]
    async fn test_transfer_without_forward_sends_no_notice() {
        let service = create_service();
        let (alice, bob) = owned(&service).await;

        let receipt = service
            .transfer(alice, "alice", bob, Coins::ZERO, Coins::from_coins(1))
            .await
            .unwrap();
        // the excess only
        assert_eq!(receipt.transactions, 2);
        assert_eq!(service.balance(&bob).await, funding(&service));
    }

    #[tokio::test]
    async fn test_only_owner_transfers() {
        let service = create_service();
        let (alice, bob) = owned(&service).await;

        let err = service
            .transfer(bob, "alice", bob, Coins::ZERO, Coins::from_coins(1))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::UNAUTHORIZED_TRANSFER));
        assert_eq!(
            service.domain_info("alice").await.unwrap().owner,
            Some(alice)
        );
    }

    #[tokio::test]
    async fn test_forward_cannot_exceed_spendable_balance() {
        let service = create_service();
        let (alice, bob) = owned(&service).await;
        let alice_before = service.balance(&alice).await;

        let err = service
            .transfer(alice, "alice", bob, Coins::from_coins(5), Coins::from_coins(2))
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::FORWARD_EXCEEDS_BALANCE));
        assert_eq!(service.balance(&alice).await, alice_before);
    }

    #[tokio::test]
    async fn test_previous_owner_loses_rights() {
        let service = create_service();
        let (alice, bob) = owned(&service).await;
        service
            .transfer(alice, "alice", bob, Coins::ZERO, Coins::from_coins(1))
            .await
            .unwrap();

        let err = service
            .edit_record(alice, "alice", Category::Name.key(), None)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::UNAUTHORIZED_RECORD_EDIT));
        service
            .renew(bob, "alice", Coins::from_coins(1))
            .await
            .unwrap();
    }

    // =========================================================================
    // EDITS
    // =========================================================================

    #[tokio::test]
    async fn test_record_edits_set_and_delete() {
        let service = create_service();
        let (alice, bob) = owned(&service).await;
        let key = Category::Wallet.key();
        let wallet = DnsRecord::Wallet(bob).to_cell().unwrap();

        service
            .edit_record(alice, "alice", key, Some(wallet.clone()))
            .await
            .unwrap();
        assert_eq!(service.resolve("alice", key).await.unwrap(), Some(wallet));

        service.edit_record(alice, "alice", key, None).await.unwrap();
        assert_eq!(service.resolve("alice", key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_edits_refresh_renewal_timer() {
        let service = create_service();
        let (alice, _) = owned(&service).await;
        service.advance_time(86_400).await;

        let text = Cell::from_bytes(b"hello").unwrap();
        service
            .edit_record(alice, "alice", Category::Description.key(), Some(text))
            .await
            .unwrap();
        assert_eq!(
            service.domain_info("alice").await.unwrap().last_fill_up,
            service.now().await
        );
    }

    #[tokio::test]
    async fn test_strangers_cannot_edit() {
        let service = create_service();
        let (_, bob) = owned(&service).await;

        let err = service
            .edit_record(bob, "alice", Category::Wallet.key(), None)
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::UNAUTHORIZED_RECORD_EDIT));

        let err = service
            .edit_content(bob, "alice", Cell::empty())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::UNAUTHORIZED_CONTENT_EDIT));
    }

    #[tokio::test]
    async fn test_content_replacement() {
        let service = create_service();
        let (alice, bob) = owned(&service).await;

        let mut content = DomainContent::new();
        content.set_record(&DnsRecord::Wallet(bob)).unwrap();
        content.set_text(Category::Name, "Bob's wallet").unwrap();
        service
            .edit_content(alice, "alice", content.to_cell().unwrap())
            .await
            .unwrap();

        let wallet = service
            .resolve("alice", Category::Wallet.key())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(DnsRecord::from_cell(&wallet), Some(DnsRecord::Wallet(bob)));
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[tokio::test]
    async fn test_static_data_report() {
        let service = create_service();
        let (_, bob) = owned(&service).await;
        let record = service.record_address("alice").await.unwrap();

        let body = simple_body(opcodes::GET_STATIC_DATA, 9).unwrap();
        let txs = send_raw(&service, bob, record, Coins::from_coins(1), body).await;
        assert!(txs[0].succeeded());

        let report = StaticDataReport::from_body(&txs[0].out_messages[0].body).unwrap();
        assert_eq!(report.query_id, 9);
        assert_eq!(report.index, service.domain_info("alice").await.unwrap().index);
        assert_eq!(report.collection, service.registrar());
        // the reply carried the inbound value back
        assert_eq!(txs[0].out_messages[0].value, Coins::from_coins(1));
    }

    #[tokio::test]
    async fn test_unknown_op_is_ignored() {
        let service = create_service();
        let (_, bob) = owned(&service).await;
        let record = service.record_address("alice").await.unwrap();
        let before = service.domain_info("alice").await.unwrap();

        let body = simple_body(0x1234_5678, 0).unwrap();
        let txs = send_raw(&service, bob, record, Coins::from_coins(1), body).await;
        assert_eq!(txs.len(), 1);
        assert!(!txs[0].aborted);
        assert_eq!(txs[0].exit_code, exit_codes::UNKNOWN_OP);

        let after = service.domain_info("alice").await.unwrap();
        assert_eq!(after.owner, before.owner);
        assert_eq!(after.balance, before.balance + Coins::from_coins(1));
    }
}
