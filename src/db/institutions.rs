use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::AccessToken;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Institution {
    /// Friendly name chosen by the user, unique within the database
    pub name: String,
    pub access_token: AccessToken,
    pub item_id: String,
    /// Unset until Plaid reported it for the first time
    pub consent_expires: Option<DateTime<Utc>>,
}

impl Institution {
    pub fn new(name: String, access_token: AccessToken, item_id: String) -> Self {
        Self {
            name,
            access_token,
            item_id,
            consent_expires: None,
        }
    }
}

/// All configured institutions, keyed and ordered by name.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[cfg_attr(test, derive(PartialEq, Eq))]
pub struct Institutions {
    institutions: BTreeMap<String, Institution>,
}

impl Institutions {
    pub fn get(&self, name: &str) -> Result<&Institution> {
        self.institutions
            .get(name)
            .ok_or_else(|| anyhow!("Institution '{name}' not yet configured"))
    }

    /// The named institutions in the given order, or all of them if `names` is empty.
    pub fn select(&self, names: &[String]) -> Result<Vec<Institution>> {
        if names.is_empty() {
            return Ok(self.list().cloned().collect());
        }
        names
            .iter()
            .map(|name| self.get(name).cloned())
            .collect()
    }

    pub fn add(&mut self, institution: Institution) -> Result<()> {
        if self.institutions.contains_key(&institution.name) {
            bail!("Institution '{}' already exists", institution.name);
        }
        self.institutions
            .insert(institution.name.clone(), institution);
        Ok(())
    }

    pub fn list(&self) -> impl Iterator<Item = &Institution> {
        self.institutions.values()
    }

    pub fn is_empty(&self) -> bool {
        self.institutions.is_empty()
    }

    /// Stores the consent expiry Plaid reported. Returns false if it was already stored.
    pub fn update_consent_expiry(&mut self, name: &str, expiry: DateTime<Utc>) -> Result<bool> {
        let institution = self
            .institutions
            .get_mut(name)
            .ok_or_else(|| anyhow!("Institution '{name}' not yet configured"))?;
        if institution.consent_expires == Some(expiry) {
            return Ok(false);
        }
        institution.consent_expires = Some(expiry);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn institution(name: &str) -> Institution {
        Institution::new(
            name.to_string(),
            AccessToken::new(format!("token-{name}")),
            format!("item-{name}"),
        )
    }

    fn institutions() -> Institutions {
        let mut institutions = Institutions::default();
        institutions.add(institution("monzo")).unwrap();
        institutions.add(institution("amex")).unwrap();
        institutions.add(institution("barclays")).unwrap();
        institutions
    }

    fn names(institutions: &[Institution]) -> Vec<&str> {
        institutions.iter().map(|i| i.name.as_str()).collect()
    }

    #[test]
    fn list_is_sorted_by_name() {
        let institutions = institutions();
        let listed: Vec<&str> = institutions.list().map(|i| i.name.as_str()).collect();
        assert_eq!(vec!["amex", "barclays", "monzo"], listed);
    }

    #[test]
    fn given_no_names_then_selects_all() {
        let selected = institutions().select(&[]).unwrap();
        assert_eq!(vec!["amex", "barclays", "monzo"], names(&selected));
    }

    #[test]
    fn given_names_then_selects_only_those_in_order() {
        let selected = institutions()
            .select(&["monzo".to_string(), "amex".to_string()])
            .unwrap();
        assert_eq!(vec!["monzo", "amex"], names(&selected));
    }

    #[test]
    fn given_unknown_name_then_select_fails() {
        let error = institutions()
            .select(&["monzo".to_string(), "hsbc".to_string()])
            .unwrap_err();
        assert_eq!("Institution 'hsbc' not yet configured", error.to_string());
    }

    #[test]
    fn given_duplicate_name_then_add_fails() {
        let mut institutions = institutions();
        assert!(institutions.add(institution("amex")).is_err());
        assert_eq!(3, institutions.list().count());
    }

    #[test]
    fn update_consent_expiry_only_when_changed() {
        let mut institutions = institutions();
        let expiry = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();

        assert!(institutions.update_consent_expiry("amex", expiry).unwrap());
        assert_eq!(Some(expiry), institutions.get("amex").unwrap().consent_expires);
        assert!(!institutions.update_consent_expiry("amex", expiry).unwrap());

        let later = expiry + chrono::Duration::days(90);
        assert!(institutions.update_consent_expiry("amex", later).unwrap());
        assert_eq!(Some(later), institutions.get("amex").unwrap().consent_expires);
    }

    #[test]
    fn given_unknown_name_then_update_consent_expiry_fails() {
        let mut institutions = institutions();
        let expiry = Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap();
        assert!(institutions.update_consent_expiry("hsbc", expiry).is_err());
    }
}
