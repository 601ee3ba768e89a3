//! # Registrar Administration Tests
//!
//! Batch deployment of owned records, gated by the registrar owner, and the
//! royalty query every collection answers.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use dns_02_registry::prelude::*;
    use shared_types::{Address, Coins, U256};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn item(index: u64, owner: Address) -> BatchItem {
        let mut content = DomainContent::new();
        content.set_record(&DnsRecord::Wallet(owner)).unwrap();
        BatchItem {
            index,
            value: Coins::from_coins(2),
            owner,
            content: content.to_cell().unwrap(),
        }
    }

    async fn item_address(service: &TestService, index: u64) -> Address {
        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        let registrar = service.registrar();
        sandbox
            .registrar_state(&registrar)
            .unwrap()
            .nft_address_by_index(registrar, U256::from(index), sandbox.config().workchain)
            .unwrap()
    }

    async fn record_state(service: &TestService, address: &Address) -> RecordState {
        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        sandbox.record_state(address).unwrap()
    }

    // =========================================================================
    // BATCH DEPLOYMENT
    // =========================================================================

    #[tokio::test]
    async fn test_owner_deploys_owned_records() {
        let service = create_service();
        let deployer = service.deployer().await;
        let alice = service.open_account("alice").await;
        let bob = service.open_account("bob").await;

        let receipt = service
            .batch_deploy(deployer, vec![item(1, alice), item(2, bob)])
            .await
            .unwrap();
        assert_eq!(receipt.transactions, 3);

        for (index, owner) in [(1, alice), (2, bob)] {
            let address = item_address(&service, index).await;
            let state = record_state(&service, &address).await;
            assert_eq!(state.owner(), Some(owner));
            assert_eq!(state.index, U256::from(index));
            assert_eq!(state.auction(), None);
            assert!(state.domain().is_empty());
            assert_eq!(service.balance(&address).await, Coins::from_coins(2));
        }
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_batch_records_answer_get_methods() {
        let service = create_service();
        let deployer = service.deployer().await;
        let alice = service.open_account("alice").await;
        service
            .batch_deploy(deployer, vec![item(7, alice)])
            .await
            .unwrap();

        let address = item_address(&service, 7).await;
        let state = record_state(&service, &address).await;
        let data = state.nft_data();
        assert!(data.initialized);
        assert_eq!(data.collection, service.registrar());
        assert_eq!(data.owner, Some(alice));

        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        let res = sandbox
            .resolve_at(&address, b"\0", &Category::Wallet.key())
            .unwrap();
        assert_eq!(res.consumed_bits, 8);
        assert_eq!(
            DnsRecord::from_cell(&res.value.unwrap()),
            Some(DnsRecord::Wallet(alice))
        );
    }

    #[tokio::test]
    async fn test_batch_is_owner_only() {
        let service = create_service();
        let alice = service.open_account("alice").await;

        let err = service
            .batch_deploy(alice, vec![item(1, alice)])
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::UNAUTHORIZED_TRANSFER));
        assert_eq!(service.balance(&alice).await, funding(&service));
        let address = item_address(&service, 1).await;
        assert!(service.sandbox().read().await.account(&address).is_none());
    }

    #[tokio::test]
    async fn test_unowned_registrar_accepts_anyone() {
        let service = create_unowned_service();
        let alice = service.open_account("alice").await;

        service
            .batch_deploy(alice, vec![item(1, alice)])
            .await
            .unwrap();
        let address = item_address(&service, 1).await;
        assert_eq!(record_state(&service, &address).await.owner(), Some(alice));
    }

    #[tokio::test]
    async fn test_redeploying_an_item_refunds_its_owner() {
        let service = create_service();
        let deployer = service.deployer().await;
        let alice = service.open_account("alice").await;
        service
            .batch_deploy(deployer, vec![item(1, alice)])
            .await
            .unwrap();
        let deployer_before = service.balance(&deployer).await;

        service
            .batch_deploy(deployer, vec![item(1, deployer)])
            .await
            .unwrap();
        let address = item_address(&service, 1).await;
        // first deployment wins; the item value went back to the named owner
        assert_eq!(record_state(&service, &address).await.owner(), Some(alice));
        assert_eq!(service.balance(&address).await, Coins::from_coins(2));
        assert_eq!(
            service.balance(&deployer).await,
            deployer_before.saturating_sub(service.config().message_value)
        );
        assert_value_conserved(&service).await;
    }

    // =========================================================================
    // ROYALTY
    // =========================================================================

    #[tokio::test]
    async fn test_royalty_report_defaults_to_none() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let registrar = service.registrar();

        let body = simple_body(opcodes::GET_ROYALTY_PARAMS, 3).unwrap();
        let txs = send_raw(&service, alice, registrar, Coins::from_coins(1), body).await;
        assert_eq!(txs.len(), 2);

        let reply = &txs[0].out_messages[0];
        assert_eq!(reply.destination, alice);
        assert_eq!(reply.value, Coins::from_coins(1));
        let report = RoyaltyReport::from_body(&reply.body).unwrap();
        assert_eq!(report.query_id, 3);
        assert_eq!(report.params, RoyaltyParams::none(registrar));
    }

    #[tokio::test]
    async fn test_configured_royalty_is_reported() {
        let params = RoyaltyParams {
            numerator: 5,
            denominator: 100,
            destination: Address::new(0, [0x42; 32]),
        };
        let config = ServiceConfig {
            royalty: Some(params),
            ..ServiceConfig::default()
        };
        let service = NameRegistryService::new(config, InMemoryOverrideTable::new()).unwrap();
        let alice = service.open_account("alice").await;

        let body = simple_body(opcodes::GET_ROYALTY_PARAMS, 0).unwrap();
        let txs = send_raw(&service, alice, service.registrar(), Coins::from_coins(1), body).await;
        let report = RoyaltyReport::from_body(&txs[0].out_messages[0].body).unwrap();
        assert_eq!(report.params, params);
    }
}
