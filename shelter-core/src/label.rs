//! Names of storage backends as they appear in logs and metrics.

use std::fmt;

use smol_str::SmolStr;

/// Short name of a storage backend: `"moka"`, `"feoxdb"`, `"memory"`.
///
/// Shows up as the `backend` field of warnings about failed lookups and
/// persists, and as a metrics label.
///
/// ```
/// use shelter_core::BackendLabel;
///
/// const DISK: BackendLabel = BackendLabel::new_static("feoxdb");
/// assert_eq!(DISK.to_string(), "feoxdb");
/// assert_eq!(BackendLabel::from("responses").as_str(), "responses");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct BackendLabel(SmolStr);

impl BackendLabel {
    /// Label from any string.
    pub fn new(name: impl Into<SmolStr>) -> Self {
        BackendLabel(name.into())
    }

    /// Label usable in `const` context.
    pub const fn new_static(name: &'static str) -> Self {
        BackendLabel(SmolStr::new_static(name))
    }

    /// The label text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BackendLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for BackendLabel {
    fn from(name: &str) -> Self {
        BackendLabel::new(name)
    }
}

impl From<String> for BackendLabel {
    fn from(name: String) -> Self {
        BackendLabel::new(name)
    }
}
