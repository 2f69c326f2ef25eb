//! Listing cache behaviour observed through the services: keys, staleness
//! until invalidation, and tag isolation between resources.

use std::sync::Arc;

use time::OffsetDateTime;

use bilemo::application::auth::Principal;
use bilemo::application::clients::ClientService;
use bilemo::application::customers::{CustomerService, NewCustomer};
use bilemo::application::phones::{PhoneInput, PhoneService};
use bilemo::application::repos::{ClientsWriteRepo, PhonesWriteRepo};
use bilemo::cache::{
    CacheConfig, MemoryTagStore, ReadThroughCache, Tag, TagAwareStore, TagInvalidator, build_key,
};
use bilemo::domain::entities::{ClientDraft, PhoneDraft};
use bilemo::domain::roles::Role;
use bilemo::infra::memory::InMemoryRepositories;

struct Harness {
    repos: Arc<InMemoryRepositories>,
    store: Arc<dyn TagAwareStore>,
    clients: ClientService,
    customers: CustomerService,
    phones: PhoneService,
}

fn admin() -> Principal {
    Principal {
        name: "admin".into(),
        role: Role::Admin,
        client_id: None,
    }
}

async fn harness(clients: usize) -> Harness {
    let repos = Arc::new(InMemoryRepositories::new());
    for n in 1..=clients {
        repos
            .create_client(ClientDraft::new(&format!("Client {n}")).unwrap())
            .await
            .unwrap();
    }

    let config = CacheConfig::default();
    let store: Arc<dyn TagAwareStore> = Arc::new(MemoryTagStore::new(&config));
    let cache = ReadThroughCache::new(store.clone(), &config);
    let invalidator = TagInvalidator::new(store.clone());

    Harness {
        clients: ClientService::new(
            repos.clone(),
            repos.clone(),
            cache.clone(),
            invalidator.clone(),
        ),
        customers: CustomerService::new(
            repos.clone(),
            repos.clone(),
            repos.clone(),
            cache.clone(),
            invalidator.clone(),
        ),
        phones: PhoneService::new(repos.clone(), repos.clone(), cache, invalidator),
        repos,
        store,
    }
}

fn cached(store: &Arc<dyn TagAwareStore>, key: &str) -> bool {
    store.get(key, OffsetDateTime::now_utc()).is_some()
}

#[tokio::test]
async fn seven_clients_by_three() {
    let h = harness(7).await;

    let last = h.clients.list(3, 3).await.unwrap();
    assert_eq!(last.items.len(), 1);
    assert_eq!(last.items[0].name, "Client 7");
    assert_eq!(last.pagination.total_pages, 3);
    assert!(cached(&h.store, "getClientList-3-3"));
    assert_eq!(build_key("getClientList", 3, 3), "getClientList-3-3");

    assert!(h.clients.list(4, 3).await.is_err());
    assert!(!cached(&h.store, "getClientList-4-3"));
}

#[tokio::test]
async fn deleting_a_client_shifts_later_pages() {
    let h = harness(7).await;

    let before = h.clients.list(2, 3).await.unwrap();
    let ids: Vec<i64> = before.items.iter().map(|client| client.id).collect();
    assert_eq!(ids, vec![4, 5, 6]);
    assert_eq!(before.pagination.total_pages, 3);

    h.clients.delete(&admin(), 1).await.unwrap();

    let after = h.clients.list(2, 3).await.unwrap();
    let ids: Vec<i64> = after.items.iter().map(|client| client.id).collect();
    assert_eq!(ids, vec![5, 6, 7]);
    assert_eq!(after.pagination.total_items, 6);
    assert_eq!(after.pagination.total_pages, 2);
}

#[tokio::test]
async fn deleting_a_client_drops_its_customer_listings() {
    let h = harness(2).await;
    h.customers
        .create(
            &admin(),
            2,
            NewCustomer {
                email: "max@example.com".into(),
                first_name: "Max".into(),
                last_name: "Mustermann".into(),
            },
        )
        .await
        .unwrap();

    let scoped = h.customers.list_for_client(2, 1, 3).await.unwrap();
    assert_eq!(scoped.pagination.total_items, 1);
    let all = h.customers.list(1, 3).await.unwrap();
    assert_eq!(all.pagination.total_items, 1);
    assert!(cached(&h.store, "getClientCustomersList_2-1-3"));
    assert!(cached(&h.store, "getCustomerList-1-3"));

    h.clients.delete(&admin(), 2).await.unwrap();

    assert!(!cached(&h.store, "getClientCustomersList_2-1-3"));
    assert!(!cached(&h.store, "getCustomerList-1-3"));
    let all = h.customers.list(1, 3).await.unwrap();
    assert_eq!(all.pagination.total_items, 0);
    assert!(h.customers.list_for_client(2, 1, 3).await.is_err());
}

#[tokio::test]
async fn writes_outside_the_services_stay_invisible_until_invalidated() {
    let h = harness(3).await;
    let invalidator = TagInvalidator::new(h.store.clone());

    let first = h.clients.list(1, 3).await.unwrap();
    assert_eq!(first.pagination.total_items, 3);

    h.repos
        .create_client(ClientDraft::new("Direct insert").unwrap())
        .await
        .unwrap();
    let stale = h.clients.list(1, 3).await.unwrap();
    assert_eq!(stale, first);

    assert_eq!(invalidator.invalidate(&[Tag::CLIENTS]), 1);
    let fresh = h.clients.list(1, 3).await.unwrap();
    assert_eq!(fresh.pagination.total_items, 4);
}

#[tokio::test]
async fn client_writes_drop_customer_listings_but_not_phones() {
    let h = harness(2).await;
    h.repos
        .create_phone(PhoneDraft::new("Pixel", None, None, None).unwrap())
        .await
        .unwrap();

    h.clients.list(1, 3).await.unwrap();
    h.customers.list(1, 3).await.unwrap();
    h.customers.list_for_client(1, 1, 3).await.unwrap();
    h.phones.list(1, 3).await.unwrap();
    assert!(cached(&h.store, "getClientCustomersList_1-1-3"));

    h.clients.create(&admin(), "Orange").await.unwrap();

    assert!(!cached(&h.store, "getClientList-1-3"));
    assert!(!cached(&h.store, "getCustomerList-1-3"));
    assert!(!cached(&h.store, "getClientCustomersList_1-1-3"));
    assert!(cached(&h.store, "getPhoneList-1-3"));
}

#[tokio::test]
async fn customer_writes_leave_client_listing_cached() {
    let h = harness(1).await;

    h.clients.list(1, 3).await.unwrap();
    h.customers.list_for_client(1, 1, 3).await.unwrap();

    let customer = h
        .customers
        .create(
            &admin(),
            1,
            NewCustomer {
                email: "jane@example.com".into(),
                first_name: "Jane".into(),
                last_name: "Doe".into(),
            },
        )
        .await
        .unwrap();

    assert!(cached(&h.store, "getClientList-1-3"));
    assert!(!cached(&h.store, "getClientCustomersList_1-1-3"));

    let listed = h.customers.list_for_client(1, 1, 3).await.unwrap();
    assert_eq!(listed.items, vec![customer]);
}

#[tokio::test]
async fn phone_writes_only_touch_phone_listings() {
    let h = harness(1).await;

    h.clients.list(1, 3).await.unwrap();
    h.phones.list(1, 3).await.unwrap();

    h.phones
        .create(
            &admin(),
            PhoneInput {
                name: "Galaxy S24".into(),
                brand: Some("Samsung".into()),
                os: Some("Android".into()),
                screen_size: Some("6.2".into()),
            },
        )
        .await
        .unwrap();

    assert!(cached(&h.store, "getClientList-1-3"));
    assert!(!cached(&h.store, "getPhoneList-1-3"));
    let listed = h.phones.list(1, 3).await.unwrap();
    assert_eq!(listed.pagination.total_items, 1);
}

#[tokio::test]
async fn missing_client_listing_is_not_cached() {
    let h = harness(0).await;

    assert!(h.customers.list_for_client(5, 1, 3).await.is_err());
    assert!(!cached(&h.store, "getClientCustomersList_5-1-3"));
    assert!(h.store.is_empty());
}
