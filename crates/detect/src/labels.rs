use std::fs;
use std::path::Path;

use crate::DetectError;

/// Class names indexed by the network's class id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMap {
    names: Vec<String>,
}

impl LabelMap {
    /// One class per line. Lines are trimmed but kept in place, so ids stay aligned.
    pub fn from_lines(text: &str) -> Self {
        Self {
            names: text.trim_end().lines().map(|l| l.trim().to_string()).collect(),
        }
    }

    pub fn load(path: &Path) -> Result<Self, DetectError> {
        let text = fs::read_to_string(path)
            .map_err(|e| DetectError::Labels(format!("{}: {e}", path.display())))?;
        let map = Self::from_lines(&text);
        if map.is_empty() {
            return Err(DetectError::Labels(format!("{}: no labels", path.display())));
        }
        Ok(map)
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.names
            .get(class_id)
            .map(String::as_str)
            .filter(|name| !name.is_empty())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for LabelMap {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}
