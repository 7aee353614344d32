use thiserror::Error;

const MIB: u64 = 1024 * 1024;

/// Upload budget for one picked batch, summed across all files.
pub const MAX_TOTAL_UPLOAD_BYTES: u64 = 20 * MIB;

fn mib(bytes: &u64) -> String {
    format!("{:.2}", *bytes as f64 / MIB as f64)
}

/// A batch exceeded the upload budget. The whole batch is rejected; there is
/// no partial acceptance.
#[derive(Debug, Error)]
#[error("total size {} MB exceeds the {} MB upload limit", mib(.total_bytes), MAX_TOTAL_UPLOAD_BYTES / MIB)]
pub struct SelectionError {
    pub total_bytes: u64,
}

/// One file as it came out of the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// The files currently eligible for submission, in picker order.
#[derive(Debug, Clone, Default)]
pub struct FileSelection {
    files: Vec<PickedFile>,
}

impl FileSelection {
    /// Applies the size policy to a freshly picked batch.
    pub fn from_picked(picked: Vec<PickedFile>) -> Result<Self, SelectionError> {
        let total_bytes: u64 = picked.iter().map(|f| f.bytes.len() as u64).sum();
        if total_bytes > MAX_TOTAL_UPLOAD_BYTES {
            return Err(SelectionError { total_bytes });
        }
        Ok(Self { files: picked })
    }

    pub fn files(&self) -> &[PickedFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes.len() as u64).sum()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }
}
