//! In-process repositories, used when no database is configured and by tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::application::pagination::PageWindow;
use crate::application::repos::{
    ClientsRepo, ClientsWriteRepo, CustomersRepo, CustomersWriteRepo, PhonesRepo,
    PhonesWriteRepo, RepoError,
};
use crate::domain::entities::{
    ClientDraft, ClientRecord, CustomerDraft, CustomerRecord, PhoneDraft, PhoneRecord,
};

const CUSTOMER_EMAIL_CONSTRAINT: &str = "customers_email_key";

#[derive(Default)]
struct State {
    clients: BTreeMap<i64, ClientRecord>,
    customers: BTreeMap<i64, CustomerRecord>,
    phones: BTreeMap<i64, PhoneRecord>,
    next_client_id: i64,
    next_customer_id: i64,
    next_phone_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

fn slice<'a, T: Clone + 'a>(rows: impl Iterator<Item = &'a T>, window: PageWindow) -> Vec<T> {
    let skip = usize::try_from(window.offset()).unwrap_or(usize::MAX);
    let take = usize::try_from(window.limit).unwrap_or(usize::MAX);
    rows.skip(skip).take(take).cloned().collect()
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Every repository trait over one shared in-memory state. Rows are
/// ordered by id, like the Postgres queries.
#[derive(Clone, Default)]
pub struct InMemoryRepositories {
    state: Arc<RwLock<State>>,
}

impl InMemoryRepositories {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ClientsRepo for InMemoryRepositories {
    async fn count_clients(&self) -> Result<u64, RepoError> {
        Ok(count(self.state.read().await.clients.len()))
    }

    async fn list_clients(&self, window: PageWindow) -> Result<Vec<ClientRecord>, RepoError> {
        Ok(slice(self.state.read().await.clients.values(), window))
    }

    async fn find_client(&self, id: i64) -> Result<Option<ClientRecord>, RepoError> {
        Ok(self.state.read().await.clients.get(&id).cloned())
    }
}

#[async_trait]
impl ClientsWriteRepo for InMemoryRepositories {
    async fn create_client(&self, draft: ClientDraft) -> Result<ClientRecord, RepoError> {
        let mut state = self.state.write().await;
        let id = next_id(&mut state.next_client_id);
        let client = ClientRecord {
            id,
            name: draft.name,
        };
        state.clients.insert(id, client.clone());
        Ok(client)
    }

    async fn delete_client(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        state.clients.remove(&id).ok_or(RepoError::NotFound)?;
        state.customers.retain(|_, customer| customer.client_id != id);
        Ok(())
    }
}

#[async_trait]
impl CustomersRepo for InMemoryRepositories {
    async fn count_customers(&self) -> Result<u64, RepoError> {
        Ok(count(self.state.read().await.customers.len()))
    }

    async fn list_customers(&self, window: PageWindow) -> Result<Vec<CustomerRecord>, RepoError> {
        Ok(slice(self.state.read().await.customers.values(), window))
    }

    async fn count_client_customers(&self, client_id: i64) -> Result<u64, RepoError> {
        let state = self.state.read().await;
        let owned = state
            .customers
            .values()
            .filter(|customer| customer.client_id == client_id)
            .count();
        Ok(count(owned))
    }

    async fn list_client_customers(
        &self,
        client_id: i64,
        window: PageWindow,
    ) -> Result<Vec<CustomerRecord>, RepoError> {
        let state = self.state.read().await;
        let owned = state
            .customers
            .values()
            .filter(|customer| customer.client_id == client_id);
        Ok(slice(owned, window))
    }

    async fn find_customer(&self, id: i64) -> Result<Option<CustomerRecord>, RepoError> {
        Ok(self.state.read().await.customers.get(&id).cloned())
    }
}

#[async_trait]
impl CustomersWriteRepo for InMemoryRepositories {
    async fn create_customer(
        &self,
        client_id: i64,
        draft: CustomerDraft,
        roles: Vec<String>,
    ) -> Result<CustomerRecord, RepoError> {
        let mut state = self.state.write().await;
        if !state.clients.contains_key(&client_id) {
            return Err(RepoError::Integrity {
                message: format!("client {client_id} does not exist"),
            });
        }
        if state
            .customers
            .values()
            .any(|customer| customer.email == draft.email)
        {
            return Err(RepoError::Duplicate {
                constraint: CUSTOMER_EMAIL_CONSTRAINT.to_string(),
            });
        }

        let id = next_id(&mut state.next_customer_id);
        let customer = CustomerRecord {
            id,
            client_id,
            email: draft.email,
            first_name: draft.first_name,
            last_name: draft.last_name,
            roles,
        };
        state.customers.insert(id, customer.clone());
        Ok(customer)
    }

    async fn delete_customer(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        state
            .customers
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl PhonesRepo for InMemoryRepositories {
    async fn count_phones(&self) -> Result<u64, RepoError> {
        Ok(count(self.state.read().await.phones.len()))
    }

    async fn list_phones(&self, window: PageWindow) -> Result<Vec<PhoneRecord>, RepoError> {
        Ok(slice(self.state.read().await.phones.values(), window))
    }

    async fn find_phone(&self, id: i64) -> Result<Option<PhoneRecord>, RepoError> {
        Ok(self.state.read().await.phones.get(&id).cloned())
    }
}

#[async_trait]
impl PhonesWriteRepo for InMemoryRepositories {
    async fn create_phone(&self, draft: PhoneDraft) -> Result<PhoneRecord, RepoError> {
        let mut state = self.state.write().await;
        let id = next_id(&mut state.next_phone_id);
        let phone = phone_record(id, draft);
        state.phones.insert(id, phone.clone());
        Ok(phone)
    }

    async fn update_phone(&self, id: i64, draft: PhoneDraft) -> Result<PhoneRecord, RepoError> {
        let mut state = self.state.write().await;
        let slot = state.phones.get_mut(&id).ok_or(RepoError::NotFound)?;
        *slot = phone_record(id, draft);
        Ok(slot.clone())
    }

    async fn delete_phone(&self, id: i64) -> Result<(), RepoError> {
        let mut state = self.state.write().await;
        state
            .phones
            .remove(&id)
            .map(|_| ())
            .ok_or(RepoError::NotFound)
    }
}

fn phone_record(id: i64, draft: PhoneDraft) -> PhoneRecord {
    PhoneRecord {
        id,
        name: draft.name,
        brand: draft.brand,
        os: draft.os,
        screen_size: draft.screen_size,
    }
}
