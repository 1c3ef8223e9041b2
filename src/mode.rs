//! The encoding rules a decoder enforces.
//!
//! This is a private module. Its public items are re-exported by the parent.


//------------ Mode ----------------------------------------------------------

/// The BER encoding mode.
///
/// The BER encoding has two more strict derivatives, CER and DER, which
/// restrict the choices the encoder has. Documents produced by the signing
/// software in the wild are mostly DER, but indefinite-length BER does
/// appear, so decoding defaults to the relaxed rules.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum Mode {
    /// Basic Encoding Rules.
    ///
    /// These are the most flexible rules, allowing alternative encodings for
    /// some types as well as indefinite length values.
    #[default]
    Ber,

    /// Canonical Encoding Rules.
    ///
    /// These rules always employ indefinite length encoding for constructed
    /// values and the shortest possible form for primitive values.
    Cer,

    /// Distinguished Encoding Rules.
    ///
    /// These rules always employ definite length values and require the
    /// shortest possible encoding.
    Der,
}

impl Mode {
    /// Is this mode CER or DER?
    pub fn is_restricted(self) -> bool {
        !matches!(self, Mode::Ber)
    }

    /// Does this mode allow definite-length constructed values?
    pub fn allow_definite_constructed(self) -> bool {
        !matches!(self, Mode::Cer)
    }

    /// Does this mode allow indefinite length constructed values?
    pub fn allow_indefinite_constructed(self) -> bool {
        !matches!(self, Mode::Der)
    }
}


//============ Tests =========================================================
