//! Header collection shared by requests and responses.
//!
//! Names are stored in canonical `Title-Case-With-Dashes` form, so
//! `content-type`, `CONTENT type` and `Content-Type` all address the same
//! entry. Every entry holds at least one
//! value; insertion order is preserved.

/// Canonicalises a header name: `"x-FORWARDED for"` → `"X-Forwarded-For"`.
pub fn normalize(name: &str) -> String {
    name.trim()
        .split(['-', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let lower = part.to_ascii_lowercase();
            let mut chars = lower.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// An ordered, case-insensitive multimap of header values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    /// Every value of `name`, in insertion order; empty when absent.
    pub fn get_all(&self, name: &str) -> &[String] {
        let name = normalize(name);
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn has(&self, name: &str) -> bool {
        let name = normalize(name);
        self.entries.iter().any(|(k, _)| *k == name)
    }

    /// Replaces any existing values of `name` with `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let name = normalize(name);
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, values)) => *values = vec![value],
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Adds `value` after any existing values of `name`.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let name = normalize(name);
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Removes `name`, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let name = normalize(name);
        let index = self.entries.iter().position(|(k, _)| *k == name)?;
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name.as_ref(), value);
        }
        headers
    }
}
