//! Typed reference data access
//!
//! [`ReferenceProvider`] narrows the repository's kind-generic lookup calls
//! to one entity type. [`ReferenceData`] is the bundle of all five active
//! lists that a DMT form is populated from.

use std::marker::PhantomData;

use serde::Serialize;

use crate::entities::{
    Customer, Employee, InspectionItem, LookupEntity, LookupKind, LookupPatch, LookupRecord,
    NewLookup, PartNumber, Workcenter,
};
use crate::store::{RecordRepository, Result};

/// Typed CRUD over one lookup kind
pub struct ReferenceProvider<'r, E: LookupEntity> {
    repo: &'r mut dyn RecordRepository,
    _entity: PhantomData<E>,
}

impl<'r, E: LookupEntity> ReferenceProvider<'r, E> {
    pub fn new(repo: &'r mut dyn RecordRepository) -> Self {
        Self {
            repo,
            _entity: PhantomData,
        }
    }

    pub fn list_active(&self) -> Result<Vec<E>> {
        Ok(self
            .repo
            .list_active(E::KIND)?
            .into_iter()
            .map(E::from_record)
            .collect())
    }

    pub fn fetch(&self, id: &str) -> Result<Option<E>> {
        Ok(self.repo.fetch_lookup(E::KIND, id)?.map(E::from_record))
    }

    pub fn create(&mut self, new: &NewLookup) -> Result<E> {
        self.repo.create_lookup(E::KIND, new).map(E::from_record)
    }

    pub fn update(&mut self, id: &str, patch: &LookupPatch) -> Result<E> {
        self.repo.update_lookup(E::KIND, id, patch).map(E::from_record)
    }

    pub fn soft_delete(&mut self, id: &str) -> Result<()> {
        self.repo.soft_delete_lookup(E::KIND, id)
    }
}

/// All active reference lists, loaded together
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceData {
    pub employees: Vec<Employee>,
    pub workcenters: Vec<Workcenter>,
    pub part_numbers: Vec<PartNumber>,
    pub customers: Vec<Customer>,
    pub inspection_items: Vec<InspectionItem>,
}

impl ReferenceData {
    pub fn load(repo: &dyn RecordRepository) -> Result<Self> {
        fn typed<E: LookupEntity>(repo: &dyn RecordRepository) -> Result<Vec<E>> {
            Ok(repo
                .list_active(E::KIND)?
                .into_iter()
                .map(E::from_record)
                .collect())
        }

        Ok(Self {
            employees: typed(repo)?,
            workcenters: typed(repo)?,
            part_numbers: typed(repo)?,
            customers: typed(repo)?,
            inspection_items: typed(repo)?,
        })
    }

    /// `(id, label, secondary)` for each active row of a kind
    pub fn entries(&self, kind: LookupKind) -> Vec<(&str, &str, Option<&str>)> {
        match kind {
            LookupKind::Employee => self
                .employees
                .iter()
                .map(|e| (e.id.as_str(), e.name.as_str(), e.email.as_deref()))
                .collect(),
            LookupKind::Workcenter => self
                .workcenters
                .iter()
                .map(|w| (w.id.as_str(), w.name.as_str(), Some(w.code.as_str())))
                .collect(),
            LookupKind::PartNumber => self
                .part_numbers
                .iter()
                .map(|p| (p.id.as_str(), p.part_number.as_str(), None))
                .collect(),
            LookupKind::Customer => self
                .customers
                .iter()
                .map(|c| (c.id.as_str(), c.name.as_str(), Some(c.code.as_str())))
                .collect(),
            LookupKind::InspectionItem => self
                .inspection_items
                .iter()
                .map(|i| (i.id.as_str(), i.name.as_str(), None))
                .collect(),
        }
    }

    /// Resolve user input to an active row id.
    ///
    /// Matches, in order: exact id, secondary value (code or email), label.
    /// Secondary and label comparisons ignore case. `None` when nothing
    /// matches or a label is ambiguous.
    pub fn resolve(&self, kind: LookupKind, input: &str) -> Option<String> {
        let input = input.trim();
        if input.is_empty() {
            return None;
        }
        let entries = self.entries(kind);

        if let Some((id, _, _)) = entries.iter().find(|(id, _, _)| *id == input) {
            return Some(id.to_string());
        }
        if let Some((id, _, _)) = entries
            .iter()
            .find(|(_, _, sec)| sec.is_some_and(|s| s.eq_ignore_ascii_case(input)))
        {
            return Some(id.to_string());
        }

        let by_label: Vec<&str> = entries
            .iter()
            .filter(|(_, label, _)| label.eq_ignore_ascii_case(input))
            .map(|(id, _, _)| *id)
            .collect();
        match by_label.as_slice() {
            [only] => Some(only.to_string()),
            _ => None,
        }
    }

    /// Display label for an id, if it is among the active rows
    pub fn label_for(&self, kind: LookupKind, id: &str) -> Option<String> {
        self.entries(kind)
            .into_iter()
            .find(|(row_id, _, _)| *row_id == id)
            .map(|(_, label, _)| label.to_string())
    }
}

/// Kind-independent resolution against a single list, for callers that
/// already hold raw rows
pub fn resolve_in(records: &[LookupRecord], input: &str) -> Option<String> {
    let input = input.trim();
    records
        .iter()
        .find(|r| r.id == input)
        .or_else(|| {
            records.iter().find(|r| {
                r.secondary
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case(input))
            })
        })
        .or_else(|| {
            let mut matches = records.iter().filter(|r| r.label.eq_ignore_ascii_case(input));
            match (matches.next(), matches.next()) {
                (Some(only), None) => Some(only),
                _ => None,
            }
        })
        .map(|r| r.id.clone())
}
