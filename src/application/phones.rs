//! Phone catalogue.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::application::auth::{AuthorizationDenied, Principal};
use crate::application::listing::{ListError, Listing};
use crate::application::pagination::PageResult;
use crate::application::repos::{PhonesRepo, PhonesWriteRepo, RepoError};
use crate::cache::{ReadThroughCache, Tag, TagInvalidator};
use crate::domain::entities::{PhoneDraft, PhoneRecord};
use crate::domain::error::DomainError;
use crate::domain::roles::Role;

pub const PHONE_LIST_OPERATION: &str = "getPhoneList";

const PHONE_LISTING: Listing<'static> = Listing {
    operation: PHONE_LIST_OPERATION,
    tags: &[Tag::PHONES],
};

const PHONE_WRITE_TAGS: &[Tag] = &[Tag::PHONES];

#[derive(Debug, Error)]
pub enum PhoneError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Denied(#[from] AuthorizationDenied),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Phone fields as submitted, before validation.
#[derive(Debug, Clone, Default)]
pub struct PhoneInput {
    pub name: String,
    pub brand: Option<String>,
    pub os: Option<String>,
    pub screen_size: Option<String>,
}

impl PhoneInput {
    fn validate(&self) -> Result<PhoneDraft, DomainError> {
        PhoneDraft::new(
            &self.name,
            self.brand.as_deref(),
            self.os.as_deref(),
            self.screen_size.as_deref(),
        )
    }
}

#[derive(Clone)]
pub struct PhoneService {
    reader: Arc<dyn PhonesRepo>,
    writer: Arc<dyn PhonesWriteRepo>,
    cache: ReadThroughCache,
    invalidator: TagInvalidator,
}

impl PhoneService {
    pub fn new(
        reader: Arc<dyn PhonesRepo>,
        writer: Arc<dyn PhonesWriteRepo>,
        cache: ReadThroughCache,
        invalidator: TagInvalidator,
    ) -> Self {
        Self {
            reader,
            writer,
            cache,
            invalidator,
        }
    }

    #[instrument(skip(self))]
    pub async fn list(&self, page: i64, limit: i64) -> Result<PageResult<PhoneRecord>, ListError> {
        let reader = &self.reader;
        PHONE_LISTING
            .page(
                &self.cache,
                page,
                limit,
                || async move { Ok::<_, ListError>(reader.count_phones().await?) },
                |window| async move { reader.list_phones(window).await },
            )
            .await
    }

    pub async fn get(&self, id: i64) -> Result<PhoneRecord, PhoneError> {
        self.reader
            .find_phone(id)
            .await?
            .ok_or_else(|| DomainError::not_found("phone").into())
    }

    #[instrument(skip(self, principal, input), fields(principal = %principal.name))]
    pub async fn create(
        &self,
        principal: &Principal,
        input: PhoneInput,
    ) -> Result<PhoneRecord, PhoneError> {
        principal.requires(Role::Admin)?;
        let draft = input.validate()?;

        let phone = self.writer.create_phone(draft).await?;
        self.invalidator.invalidate(PHONE_WRITE_TAGS);
        info!(phone_id = phone.id, "Phone created");
        Ok(phone)
    }

    #[instrument(skip(self, principal, input), fields(principal = %principal.name))]
    pub async fn update(
        &self,
        principal: &Principal,
        id: i64,
        input: PhoneInput,
    ) -> Result<PhoneRecord, PhoneError> {
        principal.requires(Role::Admin)?;
        let draft = input.validate()?;

        let phone = self
            .writer
            .update_phone(id, draft)
            .await
            .map_err(not_found_as_domain)?;
        self.invalidator.invalidate(PHONE_WRITE_TAGS);
        info!(phone_id = id, "Phone updated");
        Ok(phone)
    }

    #[instrument(skip(self, principal), fields(principal = %principal.name))]
    pub async fn delete(&self, principal: &Principal, id: i64) -> Result<(), PhoneError> {
        principal.requires(Role::Admin)?;

        self.writer.delete_phone(id).await.map_err(not_found_as_domain)?;
        self.invalidator.invalidate(PHONE_WRITE_TAGS);
        info!(phone_id = id, "Phone deleted");
        Ok(())
    }
}

fn not_found_as_domain(error: RepoError) -> PhoneError {
    match error {
        RepoError::NotFound => DomainError::not_found("phone").into(),
        other => other.into(),
    }
}
