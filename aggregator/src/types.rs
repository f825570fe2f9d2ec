use serde_json::{Map, Value};

/// Flattened person document. Keeps the key order of the upstream response.
pub type Fields = Map<String, Value>;

/// Key under which the requested person id is kept in the document.
pub const PERSON_ID_KEY: &str = "ID";

/// Audit fields of the person resource that never make it into a document.
pub const EXCLUDED_FIELDS: &[&str] = &["created", "edited", "url"];

/// Separator between resolved names of a list reference.
pub const NAME_SEPARATOR: &str = ", ";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    Single,
    List,
}

/// A field of the person resource holding URL(s) to other catalog resources.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reference {
    /// Key in the person resource, also the key of the resolved value.
    pub key: &'static str,
    /// Key holding the display name in the referenced resource.
    pub name_key: &'static str,
    pub cardinality: Cardinality,
}

impl Reference {
    const fn single(key: &'static str, name_key: &'static str) -> Self {
        Reference {
            key,
            name_key,
            cardinality: Cardinality::Single,
        }
    }

    const fn list(key: &'static str, name_key: &'static str) -> Self {
        Reference {
            key,
            name_key,
            cardinality: Cardinality::List,
        }
    }
}

pub const REFERENCES: &[Reference] = &[
    Reference::single("homeworld", "name"),
    Reference::list("films", "title"),
    Reference::list("species", "name"),
    Reference::list("starships", "name"),
    Reference::list("vehicles", "name"),
];

/// Builds the base document: every field of the person except the audit ones,
/// plus the requested id.
pub fn base_fields(person: &Fields, person_id: u64) -> Fields {
    let mut fields: Fields = person
        .iter()
        .filter(|(key, _)| !EXCLUDED_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    fields.insert(PERSON_ID_KEY.into(), Value::from(person_id));
    fields
}

/// Joins resolved names in the order they are given.
pub fn join_names<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(NAME_SEPARATOR)
}
