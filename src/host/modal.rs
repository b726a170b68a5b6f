use std::fmt;

/// Dialogs the host knows how to present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modal {
    Settings,
    Send,
    AddFile,
}

impl Modal {
    /// Name used by the host's modal registry
    pub fn name(&self) -> &'static str {
        match self {
            Modal::Settings => "settings",
            Modal::Send => "send",
            Modal::AddFile => "addFile",
        }
    }
}

impl fmt::Display for Modal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Opens named modals; the workspace owns no state for them
pub trait ModalHost: Send + Sync {
    fn open(&self, modal: Modal);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modal_names() {
        assert_eq!(Modal::Settings.name(), "settings");
        assert_eq!(Modal::Send.name(), "send");
        assert_eq!(Modal::AddFile.to_string(), "addFile");
    }
}
