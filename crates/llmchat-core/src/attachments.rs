//! Files waiting to be sent with the next message.

use std::path::{Path, PathBuf};

/// Extensions the backend knows how to read.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "pdf", "docx"];

/// One selected file: where it lives and what to call it in the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub path: PathBuf,
    pub name: String,
}

impl PendingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { path, name }
    }

    fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
    }

    pub fn is_supported(&self) -> bool {
        self.extension()
            .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false)
    }

    /// MIME type sent with the multipart `file` part.
    pub fn mime_type(&self) -> &'static str {
        match self.extension().as_deref() {
            Some("jpg") | Some("jpeg") => "image/jpeg",
            Some("png") => "image/png",
            Some("pdf") => "application/pdf",
            Some("docx") => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            _ => "application/octet-stream",
        }
    }
}

/// Ordered selection of pending files, removable by index.
#[derive(Debug, Clone, Default)]
pub struct Attachments {
    files: Vec<PendingFile>,
}

impl Attachments {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, file: PendingFile) {
        self.files.push(file);
    }

    /// Remove the file at `index`, keeping the order of the others.
    pub fn remove(&mut self, index: usize) -> Option<PendingFile> {
        if index < self.files.len() {
            Some(self.files.remove(index))
        } else {
            None
        }
    }

    pub fn files(&self) -> &[PendingFile] {
        &self.files
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn clear(&mut self) {
        self.files.clear();
    }

    /// Comma-separated display names, as shown after the prompt.
    pub fn names(&self) -> String {
        self.files
            .iter()
            .map(|f| f.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Drop one matching entry per file in `sent`; anything added since stays.
    pub fn discard(&mut self, sent: &[PendingFile]) {
        for file in sent {
            if let Some(pos) = self.files.iter().position(|f| f == file) {
                self.files.remove(pos);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection(names: &[&str]) -> Attachments {
        let mut attachments = Attachments::new();
        for name in names {
            attachments.add(PendingFile::new(format!("/tmp/uploads/{}", name)));
        }
        attachments
    }

    fn names_of(attachments: &Attachments) -> Vec<&str> {
        attachments.files().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_name_is_file_name() {
        let file = PendingFile::new("/home/me/docs/report.PDF");
        assert_eq!(file.name, "report.PDF");
        assert!(file.is_supported());
        assert_eq!(file.mime_type(), "application/pdf");
    }

    #[test]
    fn test_remove_middle_preserves_order() {
        let mut attachments = selection(&["a.png", "b.pdf", "c.docx", "d.jpg"]);
        let removed = attachments.remove(1).unwrap();
        assert_eq!(removed.name, "b.pdf");
        assert_eq!(names_of(&attachments), vec!["a.png", "c.docx", "d.jpg"]);
    }

    #[test]
    fn test_remove_each_index() {
        let original = ["one.png", "two.png", "three.png"];
        for i in 0..original.len() {
            let mut attachments = selection(&original);
            attachments.remove(i);
            let expected: Vec<&str> = original
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .map(|(_, n)| *n)
                .collect();
            assert_eq!(names_of(&attachments), expected);
        }
    }

    #[test]
    fn test_remove_out_of_range_is_none() {
        let mut attachments = selection(&["a.png"]);
        assert!(attachments.remove(3).is_none());
        assert_eq!(attachments.len(), 1);
    }

    #[test]
    fn test_names_joined() {
        let attachments = selection(&["a.png", "b.pdf"]);
        assert_eq!(attachments.names(), "a.png, b.pdf");
    }

    #[test]
    fn test_unsupported_extension() {
        let file = PendingFile::new("notes.txt");
        assert!(!file.is_supported());
        assert_eq!(file.mime_type(), "application/octet-stream");
        assert!(!PendingFile::new("Makefile").is_supported());
    }

    #[test]
    fn test_discard_removes_only_sent_files() {
        let mut attachments = selection(&["a.png", "b.pdf"]);
        let sent = attachments.files().to_vec();
        attachments.add(PendingFile::new("/tmp/uploads/c.docx"));
        attachments.add(PendingFile::new("/tmp/uploads/a.png"));

        attachments.discard(&sent);
        assert_eq!(names_of(&attachments), vec!["c.docx", "a.png"]);
    }
}
