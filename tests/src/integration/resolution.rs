//! # Recursive Resolution Tests
//!
//! Resolution walks a chain of resolvers: the root registrar consumes the
//! top-level label, the domain record either answers or delegates the rest
//! of the path to its next resolver, which may be another registrar.
//!
//! ```text
//! "blog.alice" → path "alice\0blog\0"
//!
//! [Root registrar] ─alice─► [alice record] ─\0─► [Sub registrar]
//!                                                      │ blog
//!                                                      ▼
//!                                               [blog record] ─\0─► wallet
//! ```

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use dns_01_cell_codec::Cell;
    use dns_02_registry::prelude::*;
    use dns_telemetry::RESOLUTIONS;
    use shared_types::{Address, Coins};

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    struct Tree {
        sub: Address,
        wallet: Cell,
    }

    /// Root owns "alice", whose record delegates to a second registrar
    /// that owns "blog" with a wallet record.
    async fn build_tree(service: &TestService) -> Tree {
        let alice = service.open_account("alice").await;
        own_domain(service, alice, "alice").await;

        let sub = {
            let sandbox = service.sandbox();
            let mut sandbox = sandbox.write().await;
            let state = RegistrarState {
                content: DomainContent::new().to_cell().unwrap(),
                item_code: ContractKind::Record.code(),
                royalty: None,
                owner: Some(alice),
            };
            sandbox
                .deploy_registrar(alice, &state, Coins::from_coins(1))
                .unwrap()
        };
        let delegation = DnsRecord::NextResolver(sub).to_cell().unwrap();
        service
            .edit_record(alice, "alice", Category::NextResolver.key(), Some(delegation))
            .await
            .unwrap();

        let price = service.quote("blog").await.unwrap();
        let txs = send_raw(service, alice, sub, price, registration_body(b"blog").unwrap()).await;
        assert!(txs.iter().all(Transaction::succeeded));
        service
            .advance_time(service.config().registry.auction_duration)
            .await;

        let blog = {
            let sandbox = service.sandbox();
            let sandbox = sandbox.read().await;
            sandbox.record_address(&sub, b"blog").unwrap()
        };
        let renew = simple_body(opcodes::DEPLOY, 0).unwrap();
        send_raw(service, alice, blog, Coins::from_coins(1), renew).await;

        let wallet = DnsRecord::Wallet(alice).to_cell().unwrap();
        let edit = EditRecord {
            query_id: 0,
            category: Category::Wallet.key(),
            value: Some(wallet.clone()),
        }
        .to_cell()
        .unwrap();
        let txs = send_raw(service, alice, blog, Coins::from_coins(1), edit).await;
        assert!(txs[0].succeeded());

        Tree { sub, wallet }
    }

    // =========================================================================
    // DELEGATION
    // =========================================================================

    #[tokio::test]
    async fn test_subdomain_resolves_through_second_registrar() {
        let service = create_service();
        let tree = build_tree(&service).await;

        let found = service
            .resolve("blog.alice", Category::Wallet.key())
            .await
            .unwrap();
        assert_eq!(found, Some(tree.wallet.clone()));
        // a trailing dot names the same domain
        assert_eq!(
            service
                .resolve("blog.alice.", Category::Wallet.key())
                .await
                .unwrap(),
            Some(tree.wallet)
        );
        assert_value_conserved(&service).await;
    }

    #[tokio::test]
    async fn test_each_hop_consumes_its_label() {
        let service = create_service();
        let tree = build_tree(&service).await;
        let root = service.registrar();
        let key = Category::Wallet.key();

        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        let first = sandbox.resolve_at(&root, b"alice\0blog\0", &key).unwrap();
        assert_eq!(first.consumed_bits, 40);
        let alice_record = first.next_resolver().unwrap();

        let second = sandbox.resolve_at(&alice_record, b"\0blog\0", &key).unwrap();
        assert_eq!(second.consumed_bits, 8);
        assert_eq!(second.next_resolver(), Some(tree.sub));

        let third = sandbox.resolve_at(&tree.sub, b"blog\0", &key).unwrap();
        assert_eq!(third.consumed_bits, 32);
        assert!(third.next_resolver().is_some());
    }

    #[tokio::test]
    async fn test_missing_links_resolve_to_nothing() {
        let service = create_service();
        build_tree(&service).await;
        let key = Category::Wallet.key();

        // undeployed records on either level
        assert_eq!(service.resolve("news.alice", key).await.unwrap(), None);
        assert_eq!(service.resolve("blog.nobody", key).await.unwrap(), None);
        // the parent itself has no wallet
        assert_eq!(service.resolve("alice", key).await.unwrap(), None);
        // the root
        assert_eq!(service.resolve("", key).await.unwrap(), None);

        // category 0 asks for the whole record dictionary
        let all = service.resolve("alice", 0u64.into()).await.unwrap();
        assert!(all.is_some());
    }

    #[tokio::test]
    async fn test_delegation_to_undeployed_resolver() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        own_domain(&service, alice, "alice").await;
        let nowhere = Address::new(0, [0x99; 32]);
        service
            .edit_record(
                alice,
                "alice",
                Category::NextResolver.key(),
                Some(DnsRecord::NextResolver(nowhere).to_cell().unwrap()),
            )
            .await
            .unwrap();

        assert_eq!(
            service.resolve("blog.alice", Category::Wallet.key()).await.unwrap(),
            None
        );
    }

    // =========================================================================
    // FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_delegation_loop_is_cut_off() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        own_domain(&service, alice, "alice").await;
        // alice hands every sub-path back to the root
        let root = DnsRecord::NextResolver(service.registrar()).to_cell().unwrap();
        service
            .edit_record(alice, "alice", Category::NextResolver.key(), Some(root))
            .await
            .unwrap();

        let name = ["alice"; 12].join(".");
        let err = service
            .resolve(&name, Category::Wallet.key())
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Sandbox(SandboxError::ResolutionDepthExceeded(16))
        );
    }

    #[tokio::test]
    async fn test_non_delegating_record_mid_path() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        own_domain(&service, alice, "alice").await;
        let wallet = DnsRecord::Wallet(alice).to_cell().unwrap();
        service
            .edit_record(alice, "alice", Category::NextResolver.key(), Some(wallet))
            .await
            .unwrap();

        let err = service
            .resolve("blog.alice", Category::Wallet.key())
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Sandbox(SandboxError::UnexpectedRecord));
    }

    #[tokio::test]
    async fn test_malformed_names_fail_before_lookup() {
        let service = create_service();
        let err = service
            .resolve("a..b", Category::Wallet.key())
            .await
            .unwrap_err();
        assert_eq!(err.exit_code(), Some(exit_codes::RESOLVE_EMPTY_LABEL));
    }

    #[tokio::test]
    async fn test_resolutions_are_counted() {
        let service = create_service();
        let missing_before = RESOLUTIONS.with_label_values(&["missing"]).get();
        service
            .resolve("alice", Category::Wallet.key())
            .await
            .unwrap();
        assert!(RESOLUTIONS.with_label_values(&["missing"]).get() >= missing_before + 1.0);
        assert_eq!(service.stats().await.resolutions, 1);
    }
}
