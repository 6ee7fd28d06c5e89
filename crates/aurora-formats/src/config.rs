//! Decoder configuration shared by the KEY, BIF and ITP readers

/// Options controlling how strictly inputs are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Sort wide-kind element stubs by data offset before the scalar pass, and
    /// multi-element entities by multimap offset before the entity pass.
    ///
    /// With sorting disabled, stubs are read in stored order and any input
    /// that would need a backward seek fails with an addressing error.
    pub sort_data_reads: bool,
    /// Check the 4-byte file signature of every header
    pub verify_signatures: bool,
}

impl DecodeOptions {
    /// Options that follow stored order exactly and reject anything else
    pub fn strict() -> Self {
        Self {
            sort_data_reads: false,
            verify_signatures: true,
        }
    }

    /// Accept any signature
    #[must_use]
    pub fn without_signature_checks(mut self) -> Self {
        self.verify_signatures = false;
        self
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            sort_data_reads: true,
            verify_signatures: true,
        }
    }
}

/// Compare a file signature against the expected value when checks are enabled
pub(crate) fn check_signature(
    options: &DecodeOptions,
    expected: [u8; 4],
    actual: [u8; 4],
) -> crate::Result<()> {
    if options.verify_signatures && actual != expected {
        return Err(crate::AuroraError::InvalidSignature { expected, actual });
    }
    Ok(())
}
