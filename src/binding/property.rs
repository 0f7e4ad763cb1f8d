//! Shader variable identifiers

use std::sync::OnceLock;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Process-wide name to id table. Ids are handed out sequentially.
#[derive(Default)]
struct PropertyTable {
    ids: FxHashMap<String, u32>,
    names: Vec<String>,
}

fn table() -> &'static Mutex<PropertyTable> {
    static TABLE: OnceLock<Mutex<PropertyTable>> = OnceLock::new();
    TABLE.get_or_init(|| Mutex::new(PropertyTable::default()))
}

/// Integer id of a shader-visible variable.
///
/// Every distinct name is interned once, so binding by name and binding by a
/// previously obtained id address the same slot, and two different names
/// never share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(u32);

impl PropertyId {
    pub fn from_name(name: &str) -> Self {
        let mut table = table().lock();
        if let Some(&id) = table.ids.get(name) {
            return Self(id);
        }
        let id = table.names.len() as u32;
        table.names.push(name.to_string());
        table.ids.insert(name.to_string(), id);
        log::trace!("Interned shader variable '{}' as {}", name, id);
        Self(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }

    /// Name this id was interned from.
    pub fn name(&self) -> String {
        table()
            .lock()
            .names
            .get(self.0 as usize)
            .cloned()
            .unwrap_or_default()
    }
}

impl From<&str> for PropertyId {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl From<&String> for PropertyId {
    fn from(name: &String) -> Self {
        Self::from_name(name)
    }
}

impl std::fmt::Display for PropertyId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
