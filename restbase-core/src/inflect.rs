// restbase-core/src/inflect.rs
// Singular/plural mapping between relation names and collection names.
//
// Relations are purely convention-based: a record references collection
// `categories` through a field named `category`, and reverse lookups go
// the other way. The mapping is an explicit irregular-form table plus
// default suffix rules, scoped to dataset resource names - not a general
// natural-language inflector.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref IRREGULAR_PLURALS: HashMap<&'static str, &'static str> = {
        let mut table = HashMap::new();
        table.insert("child", "children");
        table.insert("person", "people");
        table.insert("man", "men");
        table.insert("woman", "women");
        table.insert("foot", "feet");
        table.insert("tooth", "teeth");
        table.insert("goose", "geese");
        table.insert("mouse", "mice");
        table
    };
    static ref IRREGULAR_SINGULARS: HashMap<&'static str, &'static str> = IRREGULAR_PLURALS
        .iter()
        .map(|(singular, plural)| (*plural, *singular))
        .collect();
}

/// Map a singular relation name to its collection name.
pub fn pluralize(noun: &str) -> String {
    if let Some(plural) = IRREGULAR_PLURALS.get(noun) {
        return (*plural).to_string();
    }
    if let Some(stem) = noun.strip_suffix('y') {
        // consonant + y -> ies ("category" -> "categories", but "day" -> "days")
        if !stem.ends_with(|c| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')) && !stem.is_empty() {
            return format!("{}ies", stem);
        }
    }
    if noun.ends_with('s')
        || noun.ends_with('x')
        || noun.ends_with('z')
        || noun.ends_with("ch")
        || noun.ends_with("sh")
    {
        return format!("{}es", noun);
    }
    format!("{}s", noun)
}

/// Map a collection name back to its singular relation name.
pub fn singularize(noun: &str) -> String {
    if let Some(singular) = IRREGULAR_SINGULARS.get(noun) {
        return (*singular).to_string();
    }
    if let Some(stem) = noun.strip_suffix("ies") {
        if !stem.is_empty() {
            return format!("{}y", stem);
        }
    }
    if ["ses", "xes", "zes", "ches", "shes"]
        .iter()
        .any(|suffix| noun.ends_with(suffix))
    {
        if let Some(stem) = noun.strip_suffix("es") {
            return stem.to_string();
        }
    }
    if noun.ends_with('s') && !noun.ends_with("ss") {
        return noun[..noun.len() - 1].to_string();
    }
    noun.to_string()
}
