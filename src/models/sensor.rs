use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Hardware address of a one-wire temperature sensor, e.g. `28C49A5C0000009D`.
///
/// Addresses are hex strings, so they are compared case-insensitively and
/// stored upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SensorId(String);

impl SensorId {
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SensorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SensorTableError {
    #[error("sensor table is empty")]
    Empty,

    #[error("sensor id is blank (display name {0:?})")]
    BlankId(String),

    #[error("duplicate sensor id: {0}")]
    Duplicate(SensorId),
}

/// Fixed, ordered mapping of sensor address to display name.
///
/// The order defines the log columns and the chart legend.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorTable {
    sensors: IndexMap<SensorId, String>,
}

impl SensorTable {
    pub fn new<I, K, V>(entries: I) -> Result<Self, SensorTableError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut sensors = IndexMap::new();
        for (id, name) in entries {
            let name = name.into();
            let id = SensorId::new(id);
            if id.as_str().is_empty() {
                return Err(SensorTableError::BlankId(name));
            }
            if sensors.contains_key(&id) {
                return Err(SensorTableError::Duplicate(id));
            }
            sensors.insert(id, name);
        }

        if sensors.is_empty() {
            return Err(SensorTableError::Empty);
        }

        Ok(Self { sensors })
    }

    /// Resolve a raw address from the wire to the registered id.
    pub fn lookup(&self, raw: &str) -> Option<&SensorId> {
        let id = SensorId::new(raw);
        self.sensors.get_key_value(&id).map(|(k, _)| k)
    }

    pub fn contains(&self, id: &SensorId) -> bool {
        self.sensors.contains_key(id)
    }

    pub fn name(&self, id: &SensorId) -> Option<&str> {
        self.sensors.get(id).map(String::as_str)
    }

    pub fn ids(&self) -> impl Iterator<Item = &SensorId> {
        self.sensors.keys()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sensors.values().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SensorId, &str)> {
        self.sensors.iter().map(|(id, name)| (id, name.as_str()))
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> SensorTable {
        SensorTable::new([
            ("28C49A5C0000009D", "Sensor 1"),
            ("28FD486000000061", "Sensor 2"),
            ("281B176000000000", "Sensor 3"),
        ])
        .unwrap()
    }

    #[test]
    fn test_keeps_insertion_order() {
        let table = table();
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["Sensor 1", "Sensor 2", "Sensor 3"]);
        let ids: Vec<&str> = table.ids().map(SensorId::as_str).collect();
        assert_eq!(ids, vec!["28C49A5C0000009D", "28FD486000000061", "281B176000000000"]);
        let (last_id, last_name) = table.iter().last().unwrap();
        assert_eq!((last_id.as_str(), last_name), ("281B176000000000", "Sensor 3"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let table = table();
        let id = table.lookup("28c49a5c0000009d").unwrap();
        assert_eq!(id.as_str(), "28C49A5C0000009D");
        assert_eq!(table.name(id), Some("Sensor 1"));
        assert!(table.lookup("28AAAAAAAAAAAAAA").is_none());
    }

    #[test]
    fn test_rejects_empty_and_duplicates() {
        let empty: [(&str, &str); 0] = [];
        assert_eq!(SensorTable::new(empty), Err(SensorTableError::Empty));

        let dup = SensorTable::new([("28ab", "A"), ("28AB", "B")]);
        assert_eq!(dup, Err(SensorTableError::Duplicate(SensorId::new("28AB"))));

        let blank = SensorTable::new([(" ", "A")]);
        assert_eq!(blank, Err(SensorTableError::BlankId("A".to_string())));
    }
}
