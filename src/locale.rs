use std::collections::HashMap;

pub const SUPPORTED_LANGUAGES: [&str; 2] = ["en", "fr"];
pub const DEFAULT_LANGUAGE: &str = "en";

const TABLES: [(&str, &str); 2] = [
    ("en", include_str!("../locales/en.json")),
    ("fr", include_str!("../locales/fr.json")),
];

/// Returns the static code when `code` names a supported language.
pub fn supported(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES.iter().copied().find(|lang| *lang == code)
}

/// Primary subtag of the first entry of an `Accept-Language` value, when supported.
///
/// `fr-FR,en;q=0.8` gives `fr`; `de-DE` gives `None`.
pub fn preferred_language(accept_language: Option<&str>) -> Option<&'static str> {
    let first = accept_language?.split(',').next()?;
    let tag = first.split(';').next()?.trim();
    let primary = tag.split('-').next()?.to_lowercase();
    supported(&primary)
}

/// UI strings of every supported language.
#[derive(Debug)]
pub struct Locale {
    tables: HashMap<&'static str, HashMap<String, String>>,
}

impl Locale {
    pub fn load() -> Result<Self, serde_json::Error> {
        let mut tables = HashMap::new();
        for (lang, raw) in TABLES {
            let table: HashMap<String, String> = serde_json::from_str(raw)?;
            debug!("Loaded {} strings for language {}", table.len(), lang);
            tables.insert(lang, table);
        }
        Ok(Locale { tables })
    }

    /// Looks `key` up in `lang`, then in the default language, then gives the key back.
    pub fn get<'a>(&'a self, lang: &str, key: &'a str) -> &'a str {
        self.lookup(lang, key)
            .or_else(|| {
                warn!("Missing {} string for key {}", lang, key);
                self.lookup(DEFAULT_LANGUAGE, key)
            })
            .unwrap_or(key)
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.tables
            .get(lang)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_language_takes_first_primary_subtag() {
        assert_eq!(preferred_language(Some("fr-FR,en;q=0.8")), Some("fr"));
        assert_eq!(preferred_language(Some("EN-gb")), Some("en"));
        assert_eq!(preferred_language(Some(" fr ;q=0.9, en")), Some("fr"));
    }

    #[test]
    fn preferred_language_rejects_unsupported_and_missing() {
        assert_eq!(preferred_language(Some("de-DE")), None);
        assert_eq!(preferred_language(Some("de-DE,fr;q=0.5")), None);
        assert_eq!(preferred_language(Some("")), None);
        assert_eq!(preferred_language(None), None);
    }

    #[test]
    fn bundled_tables_share_their_keys() {
        let locale = Locale::load().unwrap();
        let en = &locale.tables["en"];
        let fr = &locale.tables["fr"];
        let mut missing: Vec<&String> = en.keys().filter(|key| !fr.contains_key(*key)).collect();
        missing.sort();
        assert!(missing.is_empty(), "keys missing from fr.json: {:?}", missing);
    }

    #[test]
    fn get_falls_back_to_default_language_then_key() {
        let mut tables = HashMap::new();
        tables.insert(
            "en",
            HashMap::from([("only_en".to_string(), "English".to_string())]),
        );
        tables.insert("fr", HashMap::new());
        let locale = Locale { tables };

        assert_eq!(locale.get("fr", "only_en"), "English");
        assert_eq!(locale.get("fr", "nowhere"), "nowhere");
        assert_eq!(locale.get("en", "only_en"), "English");
    }
}
