//! Raw values returned by one device read.

/// Raw values keyed by communication tag, in the order the device produced them.
///
/// A `None` device value means the device answered the read but had no value
/// for that point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawReading {
    entries: Vec<(String, Option<f64>)>,
}

impl RawReading {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value for `tag`, replacing any earlier value in place.
    pub fn insert(&mut self, tag: impl Into<String>, value: Option<f64>) {
        let tag = tag.into();
        match self.entries.iter_mut().find(|entry| entry.0 == tag) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((tag, value)),
        }
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, tag: impl Into<String>, value: Option<f64>) -> Self {
        self.insert(tag, value);
        self
    }

    /// Device value for `tag`. The outer `None` means the tag was not read.
    pub fn get(&self, tag: &str) -> Option<Option<f64>> {
        self.entries
            .iter()
            .find(|entry| entry.0 == tag)
            .map(|entry| entry.1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.entries.iter().map(|(tag, value)| (tag.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, Option<f64>)> for RawReading {
    fn from_iter<I: IntoIterator<Item = (S, Option<f64>)>>(iter: I) -> Self {
        let mut reading = RawReading::new();
        for (tag, value) in iter {
            reading.insert(tag, value);
        }
        reading
    }
}
