use serde::Serialize;

/// One file on the virtual SD card.
#[derive(Debug, Clone, Eq, PartialEq)]
struct SdFile {
    name: String,
    content: Vec<u8>,
}

/// Name and size of a stored file, as reported by a card listing.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct SdFileEntry {
    name: String,
    size: usize,
}

impl SdFileEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, size: usize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }
}

/// In-memory SD card. Listing order is insertion order.
#[derive(Debug, Clone, Default)]
pub(crate) struct FileStore {
    files: Vec<SdFile>,
}

impl FileStore {
    /// Creates `name` empty, truncating it in place if it already exists.
    pub(crate) fn create(&mut self, name: &str) {
        match self.position(name) {
            Some(index) => self.files[index].content.clear(),
            None => self.files.push(SdFile {
                name: name.to_string(),
                content: Vec::new(),
            }),
        }
    }

    /// Appends to `name`, creating it first if needed.
    pub(crate) fn append(&mut self, name: &str, data: &[u8]) {
        if let Some(index) = self.position(name) {
            self.files[index].content.extend_from_slice(data);
        } else {
            self.files.push(SdFile {
                name: name.to_string(),
                content: data.to_vec(),
            });
        }
    }

    /// Removes `name`, returning whether it existed.
    pub(crate) fn delete(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.files.remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn get(&self, name: &str) -> Option<&[u8]> {
        self.position(name)
            .map(|index| self.files[index].content.as_slice())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub(crate) fn list(&self) -> Vec<SdFileEntry> {
        self.files
            .iter()
            .map(|file| SdFileEntry::new(file.name.clone(), file.content.len()))
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.files.iter().position(|file| file.name == name)
    }
}
