//! SOQL statement building for the convenience query operations

use crate::error::{Result, SessionError};

/// `SELECT f1, f2 FROM object_type`
pub fn select_all<S: AsRef<str>>(object_type: &str, fields: &[S]) -> Result<String> {
    Ok(format!("SELECT {} FROM {}", field_list(fields)?, object_type))
}

/// `SELECT f1, f2 FROM object_type WHERE Id IN ('a', 'b')`
pub fn select_by_ids<S: AsRef<str>, I: AsRef<str>>(
    object_type: &str,
    fields: &[S],
    ids: &[I],
) -> Result<String> {
    let fields = field_list(fields)?;
    if ids.is_empty() {
        return Err(SessionError::EmptyIdList);
    }

    let ids = ids
        .iter()
        .map(|id| quote(id.as_ref()))
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "SELECT {} FROM {} WHERE Id IN ({})",
        fields, object_type, ids
    ))
}

/// Single-quoted SOQL string literal.
pub fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for c in value.chars() {
        if c == '\\' || c == '\'' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

fn field_list<S: AsRef<str>>(fields: &[S]) -> Result<String> {
    if fields.is_empty() {
        return Err(SessionError::EmptyFieldList);
    }
    Ok(fields
        .iter()
        .map(|field| field.as_ref())
        .collect::<Vec<&str>>()
        .join(", "))
}
