//! # Value Conservation Tests
//!
//! The network never creates or loses value: after any sequence of
//! messages, accepted or bounced, the sum of all balances equals what the
//! treasuries were minted with. Failed transactions leave contract data
//! untouched.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use dns_02_registry::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use shared_types::{Address, Coins};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn random_name(rng: &mut StdRng) -> String {
        let len = rng.gen_range(6..=12);
        (0..len)
            .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
            .collect()
    }

    async fn record_data(service: &TestService, domain: &str) -> dns_01_cell_codec::Cell {
        let record = service.record_address(domain).await.unwrap();
        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        sandbox.account(&record).unwrap().data.clone()
    }

    // =========================================================================
    // RANDOMIZED FLOWS
    // =========================================================================

    #[tokio::test]
    async fn test_random_auctions_conserve_value() {
        let service = create_service();
        let mut rng = StdRng::seed_from_u64(7);
        let mut users = Vec::new();
        for i in 0..4 {
            users.push(service.open_account(&format!("user{i}")).await);
        }

        let mut names = Vec::new();
        for i in 0..6 {
            let name = random_name(&mut rng);
            let who = users[rng.gen_range(0..users.len())];
            let price = service.quote(&name).await.unwrap();
            // some registrations underpay on purpose
            let paid = if i > 0 && rng.gen_bool(0.2) {
                Coins::from_nanos(price.nanos() / 2)
            } else {
                price
            };
            if service.register(who, &name, paid).await.is_ok() {
                names.push(name);
            }
            assert_value_conserved(&service).await;
        }

        for _ in 0..20 {
            let name = &names[rng.gen_range(0..names.len())];
            let who = users[rng.gen_range(0..users.len())];
            let amount = Coins::from_coins(rng.gen_range(1..2000));
            let _ = service.bid(who, name, amount).await;
            assert_value_conserved(&service).await;
        }

        service
            .advance_time(service.config().registry.auction_duration + 3_600)
            .await;
        for name in &names {
            let info = service.domain_info(name).await.unwrap();
            let winner = info.auction.unwrap().bidder;
            service
                .renew(winner, name, Coins::from_coins(1))
                .await
                .unwrap();
            assert_eq!(
                service.domain_info(name).await.unwrap().owner,
                Some(winner)
            );
            assert_value_conserved(&service).await;
        }
    }

    #[tokio::test]
    async fn test_transfer_chain_conserves_value() {
        let service = create_service();
        let mut owner = service.open_account("owner0").await;
        own_domain(&service, owner, "chained").await;

        for i in 1..=5 {
            let next = service.open_account(&format!("owner{i}")).await;
            service
                .transfer(
                    owner,
                    "chained",
                    next,
                    Coins::from_nanos(100_000_000),
                    Coins::from_coins(1),
                )
                .await
                .unwrap();
            owner = next;
            assert_value_conserved(&service).await;
        }
        assert_eq!(
            service.domain_info("chained").await.unwrap().owner,
            Some(owner)
        );
    }

    // =========================================================================
    // ROLLBACK
    // =========================================================================

    #[tokio::test]
    async fn test_failed_transactions_leave_data_untouched() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let mallory = service.open_account("mallory").await;
        let price = service.quote("alice").await.unwrap();
        service.register(alice, "alice", price).await.unwrap();
        let during_auction = record_data(&service, "alice").await;

        let _ = service.bid(mallory, "alice", price).await;
        assert_eq!(record_data(&service, "alice").await, during_auction);

        service
            .advance_time(service.config().registry.auction_duration)
            .await;
        // would settle the auction, but the edit itself is refused
        let _ = service
            .edit_record(mallory, "alice", Category::Wallet.key(), None)
            .await;
        assert_eq!(record_data(&service, "alice").await, during_auction);
        assert_eq!(service.balance(&mallory).await, funding(&service));
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_bounces_between_wallets() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let ghost = Address::new(0, [0x55; 32]);

        let txs = send_raw(
            &service,
            alice,
            ghost,
            Coins::from_coins(3),
            dns_01_cell_codec::Cell::empty(),
        )
        .await;
        assert!(txs[0].aborted);
        assert!(txs[1].bounced_in);
        assert_eq!(service.balance(&alice).await, funding(&service));
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_record_cannot_be_initialized_by_strangers() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        let record = service.record_address("alice").await.unwrap();
        let init = {
            let sandbox = service.sandbox();
            let sandbox = sandbox.read().await;
            let registrar = service.registrar();
            let state = sandbox.registrar_state(&registrar).unwrap();
            record_state_init(
                registrar,
                &state.item_code,
                domain_index(b"alice").unwrap(),
            )
            .unwrap()
        };

        let txs = {
            let sandbox = service.sandbox();
            let mut sandbox = sandbox.write().await;
            let deploy = DeployItem {
                query_id: 0,
                kind: DeployKind::Direct {
                    owner: alice,
                    content: dns_01_cell_codec::Cell::empty(),
                },
            };
            sandbox
                .send(
                    Envelope::new(alice, record, Coins::from_coins(1), deploy.to_cell().unwrap())
                        .with_state_init(init),
                )
                .unwrap()
        };
        assert!(txs[0].deployed);
        assert!(txs[0].aborted);
        assert_eq!(txs[0].exit_code, exit_codes::NOT_INITIALIZED_BY_REGISTRAR);
        assert_eq!(service.balance(&alice).await, funding(&service));
        assert_value_conserved(&service).await;
    }
}
