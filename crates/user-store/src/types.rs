use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A decoded field-mapping: field name → field value, both text.
pub type FieldMap = BTreeMap<String, String>;

/// Field holding the display name.
pub const NAME_FIELD: &str = "name";
/// Field holding the email, which is also the record's identity.
pub const EMAIL_FIELD: &str = "email";

/// A user record as written by create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// The full field-mapping persisted for this user.
    pub fn fields(&self) -> [(&str, &str); 2] {
        [
            (NAME_FIELD, self.name.as_str()),
            (EMAIL_FIELD, self.email.as_str()),
        ]
    }

    /// Rebuild a user from a stored mapping. Returns `None` if either field
    /// is missing.
    pub fn from_fields(fields: &FieldMap) -> Option<Self> {
        Some(Self {
            name: fields.get(NAME_FIELD)?.clone(),
            email: fields.get(EMAIL_FIELD)?.clone(),
        })
    }

    /// The mapping a read returns after this user was written.
    pub fn to_fields(&self) -> FieldMap {
        self.fields()
            .iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect()
    }
}
