use crate::CasError;

use std::collections::{BTreeMap, BTreeSet};

/// Allow-list of CAS attribute names that may be retained after ticket validation.
///
/// Anything not named here is dropped before the user reaches the session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttributeFilter {
    allowed: BTreeSet<String>,
}

impl AttributeFilter {
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AttributeFilter {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a JSON array of attribute names, e.g. `["cn", "mail"]`.
    pub fn from_json(raw: &str) -> Result<Self, CasError> {
        let allowed: Vec<String> = serde_json::from_str(raw)?;
        Ok(AttributeFilter::new(allowed))
    }

    pub fn allows(&self, key: &str) -> bool {
        self.allowed.contains(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    pub fn apply(&self, attributes: &BTreeMap<String, String>) -> BTreeMap<String, String> {
        let retained: BTreeMap<String, String> = attributes
            .iter()
            .filter(|(key, _)| self.allows(key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        if retained.len() != attributes.len() {
            debug!(
                "Dropped {} CAS attribute(s) outside the allow-list",
                attributes.len() - retained.len()
            );
        }
        retained
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attributes(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn apply_keeps_only_allowed_keys() {
        let filter = AttributeFilter::new(["cn", "mail"]);
        let input = attributes(&[("cn", "Alice"), ("secret", "x"), ("mail", "a@b.c")]);

        let retained = filter.apply(&input);
        assert_eq!(retained, attributes(&[("cn", "Alice"), ("mail", "a@b.c")]));
    }

    #[test]
    fn apply_never_invents_keys() {
        let filter = AttributeFilter::new(["cn", "mail", "sn"]);
        let input = attributes(&[("cn", "Alice")]);
        assert_eq!(filter.apply(&input), input);
    }

    #[test]
    fn apply_is_the_intersection_for_every_subset() {
        let all = ["cn", "mail", "sn", "uid"];
        let input = attributes(&[("cn", "1"), ("mail", "2"), ("uid", "3"), ("other", "4")]);
        for mask in 0..(1 << all.len()) {
            let allowed: Vec<&str> = all
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, k)| *k)
                .collect();
            let filter = AttributeFilter::new(allowed.clone());
            let retained = filter.apply(&input);
            let expected: BTreeMap<String, String> = input
                .iter()
                .filter(|(k, _)| allowed.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            assert_eq!(retained, expected);
        }
    }

    #[test]
    fn empty_filter_drops_everything() {
        let filter = AttributeFilter::default();
        assert_eq!(filter.keys().count(), 0);
        assert!(filter.apply(&attributes(&[("cn", "Alice")])).is_empty());
    }

    #[test]
    fn from_json_reads_array() {
        let filter = AttributeFilter::from_json(r#"["cn", "supannRefId"]"#).unwrap();
        assert!(filter.allows("cn"));
        assert!(filter.allows("supannRefId"));
        assert!(!filter.allows("mail"));
        assert_eq!(filter.keys().collect::<Vec<_>>(), vec!["cn", "supannRefId"]);
    }

    #[test]
    fn from_json_rejects_objects() {
        assert!(AttributeFilter::from_json(r#"{"cn": true}"#).is_err());
    }
}
