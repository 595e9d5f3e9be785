use crate::ArchiveKind;
use std::fmt::{Display, Formatter, Result as FmtResult};

impl Display for ArchiveKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for ArchiveKind {
    fn as_ref(&self) -> &'static str {
        self.as_str()
    }
}

impl ArchiveKind {
    /// Returns the short name stored in the catalog and shown to users.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Zip => "zip",
            ArchiveKind::Rar => "rar",
            ArchiveKind::SevenZip => "7z",
        }
    }

    /// Whether reader clients can open this format as-is. Anything else is
    /// repackaged into zip before delivery.
    #[inline]
    #[must_use]
    pub fn is_client_readable(&self) -> bool {
        matches!(self, ArchiveKind::Zip)
    }
}
