use crate::AttributeFilter;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Struct for CAS user
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CasUser {
    username: String,
    attributes: BTreeMap<String, String>,
}

impl CasUser {
    // ################################################################################
    // Constructor
    // ################################################################################
    //
    /// Returns new CAS user
    ///
    /// # Examples
    ///
    /// - Without attributes:
    /// ```
    /// use cas_client_core::CasUser;
    ///
    /// let cas_user = CasUser::new("user", None);
    /// assert_eq!(cas_user.username(), "user");
    /// assert!(cas_user.attributes().is_empty());
    /// ```
    ///
    /// - With attributes:
    /// ```
    /// use cas_client_core::CasUser;
    /// use std::collections::BTreeMap;
    ///
    /// let mut attributes = BTreeMap::new();
    /// attributes.insert("cn".to_string(), "Alice".to_string());
    /// let cas_user = CasUser::new("alice", Some(attributes.clone()));
    /// assert_eq!(cas_user.attributes(), &attributes);
    /// ```
    pub fn new(username: &str, attributes: Option<BTreeMap<String, String>>) -> CasUser {
        debug!(
            "New CAS user: {{ username: {}, attributes: {:?} }}",
            username,
            attributes.as_ref().map(|a| a.keys().collect::<Vec<_>>())
        );
        CasUser {
            username: username.to_string(),
            attributes: attributes.unwrap_or_default(),
        }
    }

    // ################################################################################
    // Instance functions
    // ################################################################################
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Returns a copy of the user keeping only the attributes named by `filter`.
    ///
    /// ```
    /// use cas_client_core::{AttributeFilter, CasUser};
    /// use std::collections::BTreeMap;
    ///
    /// let mut attributes = BTreeMap::new();
    /// attributes.insert("cn".to_string(), "Alice".to_string());
    /// attributes.insert("uidNumber".to_string(), "1042".to_string());
    /// let filter = AttributeFilter::new(["cn"]);
    ///
    /// let user = CasUser::new("alice", Some(attributes)).filtered(&filter);
    /// assert_eq!(user.attributes().get("cn").map(String::as_str), Some("Alice"));
    /// assert!(!user.attributes().contains_key("uidNumber"));
    /// ```
    pub fn filtered(&self, filter: &AttributeFilter) -> CasUser {
        CasUser {
            username: self.username.clone(),
            attributes: filter.apply(&self.attributes),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtered_keeps_username() {
        let mut attributes = BTreeMap::new();
        attributes.insert("mail".to_string(), "alice@example.org".to_string());
        let cas_user = CasUser::new("alice", Some(attributes));

        let filtered = cas_user.filtered(&AttributeFilter::default());
        assert_eq!(filtered.username(), "alice");
        assert!(filtered.attributes().is_empty());
    }

    #[test]
    fn serde_round_trip_keeps_attributes() {
        let mut attributes = BTreeMap::new();
        attributes.insert("mail".to_string(), "alice@example.org".to_string());
        let cas_user = CasUser::new("alice", Some(attributes));

        let raw = serde_json::to_string(&cas_user).unwrap();
        assert_eq!(
            raw,
            "{\"username\":\"alice\",\"attributes\":{\"mail\":\"alice@example.org\"}}"
        );
        assert_eq!(serde_json::from_str::<CasUser>(&raw).unwrap(), cas_user);
    }
}
