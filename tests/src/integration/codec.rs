//! # Wire Format Tests
//!
//! Contract data and addresses as other tools see them: bag-of-cells
//! snapshots of live accounts, state-init derived addresses and the
//! content layout of a record.

#[cfg(test)]
mod tests {
    use crate::integration::harness::*;
    use dns_01_cell_codec::{Cell, StateInit};
    use dns_02_registry::prelude::*;
    use shared_types::Address;

    #[tokio::test]
    async fn test_record_snapshot_survives_boc() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        own_domain(&service, alice, "alice").await;
        service
            .edit_record(
                alice,
                "alice",
                Category::Wallet.key(),
                Some(DnsRecord::Wallet(alice).to_cell().unwrap()),
            )
            .await
            .unwrap();

        let record = service.record_address("alice").await.unwrap();
        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        let data = sandbox.account(&record).unwrap().data.clone();

        let boc = data.to_boc().unwrap();
        assert_eq!(&boc[..4], &[0xb5, 0xee, 0x9c, 0x72]);
        let back = Cell::from_boc(&boc).unwrap();
        assert_eq!(back.hash(), data.hash());

        let state = RecordState::from_cell(&back).unwrap();
        assert_eq!(state.owner(), Some(alice));
        assert_eq!(state.domain(), b"alice");
        assert_eq!(state.collection, service.registrar());
    }

    #[tokio::test]
    async fn test_record_address_is_state_init_hash() {
        let service = create_service();
        let registrar = service.registrar();
        let record = service.record_address("alice").await.unwrap();

        let sandbox = service.sandbox();
        let sandbox = sandbox.read().await;
        let state = sandbox.registrar_state(&registrar).unwrap();
        let init =
            record_state_init(registrar, &state.item_code, domain_index(b"alice").unwrap())
                .unwrap();
        assert_eq!(init.address(0).unwrap(), record);

        let reparsed = StateInit::from_cell(&init.to_cell().unwrap()).unwrap();
        assert_eq!(reparsed, init);
    }

    #[tokio::test]
    async fn test_addresses_print_in_raw_form() {
        let service = create_service();
        let registrar = service.registrar();
        let raw = registrar.to_string();
        assert!(raw.starts_with("0:"));
        assert_eq!(raw.len(), 2 + 64);
        assert_eq!(raw.parse::<Address>().unwrap(), registrar);
    }

    #[tokio::test]
    async fn test_content_text_fields() {
        let service = create_service();
        let alice = service.open_account("alice").await;
        own_domain(&service, alice, "alice").await;

        let mut content = DomainContent::new();
        content.set_text(Category::Description, "personal site").unwrap();
        content.set_record(&DnsRecord::Wallet(alice)).unwrap();
        service
            .edit_content(alice, "alice", content.to_cell().unwrap())
            .await
            .unwrap();

        let all = service.resolve("alice", 0u64.into()).await.unwrap();
        assert_eq!(all, content.records_root().unwrap());

        let description = service
            .resolve("alice", Category::Description.key())
            .await
            .unwrap()
            .unwrap();
        let mut slice = description.parse();
        assert_eq!(slice.load_uint(8).unwrap(), 0);
        assert_eq!(slice.load_string_tail().unwrap(), b"personal site");
    }

    #[test]
    fn test_category_keys_are_name_hashes() {
        assert_eq!(Category::Wallet.key(), category_hash("wallet"));
        assert_eq!(
            Category::from_key(&category_hash("dns_next_resolver")),
            Some(Category::NextResolver)
        );
        let encoded = hex::encode(encode_dns_path("blog.alice").unwrap());
        assert_eq!(encoded, hex::encode(b"alice\0blog\0"));
    }
}
