/// Limits enforced by an [`Encoder`](super::Encoder).
///
/// `None` leaves the corresponding dimension unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Maximum number of sections in one data object
    pub max_sections: Option<usize>,

    /// Maximum number of columns in one section
    pub max_section_columns: Option<usize>,

    /// Maximum number of stored page bytes in one section
    pub max_section_bytes: Option<usize>,
}

impl EncoderConfig {
    /// Set the maximum number of sections
    pub fn max_sections(mut self, limit: usize) -> Self {
        self.max_sections = Some(limit);
        self
    }

    /// Set the maximum number of columns per section
    pub fn max_section_columns(mut self, limit: usize) -> Self {
        self.max_section_columns = Some(limit);
        self
    }

    /// Set the maximum number of page bytes per section
    pub fn max_section_bytes(mut self, limit: usize) -> Self {
        self.max_section_bytes = Some(limit);
        self
    }
}
