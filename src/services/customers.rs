//! Customer directory used to annotate errors with contact details.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::models::{BookingResult, CustomerContact};
use crate::services::matching::normalize;
use crate::services::store::{load_typed, save_typed, TableStore, CUSTOMERS_TABLE};
use crate::types::errors::StoreError;

/// An error together with whatever the directory knows about the person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedError {
    pub booking: BookingResult,
    pub contact: Option<CustomerContact>,
}

#[derive(Debug, Clone, Default)]
pub struct CustomerDirectory {
    by_name: HashMap<String, CustomerContact>,
}

impl CustomerDirectory {
    /// Index contacts by normalized name; the first contact of a name wins.
    pub fn from_contacts<I>(contacts: I) -> Self
    where
        I: IntoIterator<Item = CustomerContact>,
    {
        let mut by_name = HashMap::new();
        for contact in contacts {
            let key = normalize(&contact.name);
            if key.is_empty() {
                continue;
            }
            by_name.entry(key).or_insert(contact);
        }
        Self { by_name }
    }

    pub async fn load<S: TableStore>(store: &S) -> Result<Self, StoreError> {
        let contacts: Vec<CustomerContact> = load_typed(store, CUSTOMERS_TABLE).await?;
        Ok(Self::from_contacts(contacts))
    }

    /// Replace the stored directory with `contacts`.
    pub async fn import<S: TableStore>(
        store: &S,
        contacts: &[CustomerContact],
    ) -> Result<usize, StoreError> {
        save_typed(store, CUSTOMERS_TABLE, contacts).await?;
        log::info!("Customer directory replaced: {} contact(s)", contacts.len());
        Ok(contacts.len())
    }

    pub fn lookup(&self, name: &str) -> Option<&CustomerContact> {
        self.by_name.get(&normalize(name))
    }

    pub fn annotate(&self, booking: &BookingResult) -> AnnotatedError {
        AnnotatedError {
            booking: booking.clone(),
            contact: self.lookup(&booking.name).cloned(),
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
#[path = "tests/customers_tests.rs"]
mod tests;
