use serde::Serialize;

/// One completion: a stored key and its value.
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    pub key: Vec<u8>,
    pub value: u32,
}

impl Completion {
    pub fn new(key: Vec<u8>, value: u32) -> Self {
        Completion { key, value }
    }

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// The key as text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.key).ok()
    }
}

impl PartialEq for Completion {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl Eq for Completion {}

impl std::cmp::PartialOrd for Completion {
    fn partial_cmp(&self, other: &Completion) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::cmp::Ord for Completion {
    fn cmp(&self, other: &Completion) -> std::cmp::Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.value.cmp(&other.value))
    }
}
