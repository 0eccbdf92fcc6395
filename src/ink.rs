//! Ink taxonomy: classifying a pixel color into a logical role plus an
//! on/off bit.
//!
//! On real VCB images, on/off variants of one ink share a color; they are
//! disambiguated during preprocessing by detecting power sources, not by
//! the color itself. This module only carries the *kind* table and the
//! on/off bit helpers (`spec.md` §4.A).

use rgb::RGBA8;

/// A logical ink kind. Conductors carry a signal, gates compute one, and
/// the remaining kinds are stateful or inert.
///
/// `Ink::None` is the zero discriminant so that a freshly zeroed pixel
/// buffer classifies as "nothing here" rather than some arbitrary wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Ink {
    None = 0,

    Trace = 1,
    Read,
    Write,
    Cross,
    Tunnel,

    Buffer,
    Or,
    Nand,
    Not,
    Nor,
    And,
    Xor,
    Xnor,

    Clock,
    Latch,
    Led,
    Bundle,

    Filler,
    Annotation,

    InvalidCross,
    InvalidFiller,
    InvalidAnnotation,
}

/// Bit 7 of the wire byte representation marks a kind as driven/on.
/// `spec.md` §3 invariant: on/off variants of one kind differ only in
/// this bit, so `kind & 0x7f` normalizes to the off form.
const ON_BIT: u8 = 0x80;

impl Ink {
    /// Normalizes a raw ink byte (as stored in [`crate::state::GroupCell`])
    /// back to an [`Ink`], discarding the on/off bit.
    pub fn from_byte(byte: u8) -> Ink {
        Ink::from_discriminant(byte & !ON_BIT).unwrap_or(Ink::None)
    }

    fn from_discriminant(d: u8) -> Option<Ink> {
        use Ink::*;
        Some(match d {
            0 => None,
            1 => Trace,
            2 => Read,
            3 => Write,
            4 => Cross,
            5 => Tunnel,
            6 => Buffer,
            7 => Or,
            8 => Nand,
            9 => Not,
            10 => Nor,
            11 => And,
            12 => Xor,
            13 => Xnor,
            14 => Clock,
            15 => Latch,
            16 => Led,
            17 => Bundle,
            18 => Filler,
            19 => Annotation,
            20 => InvalidCross,
            21 => InvalidFiller,
            22 => InvalidAnnotation,
            _ => return Option::None,
        })
    }

    /// Packs this ink with an on/off bit into the byte stored per-group.
    pub fn to_byte(self, on: bool) -> u8 {
        (self as u8) | if on { ON_BIT } else { 0 }
    }

    /// Whether this ink forms its own group during flood fill. `Filler`
    /// and `Annotation` keep their ink but are excluded from connectivity
    /// (`spec.md` §4.B step 1); `Cross`/`Tunnel` are non-group pixels that
    /// only rewrite adjacency (`spec.md` §9) and never own a group.
    pub fn is_connective(self) -> bool {
        !matches!(
            self,
            Ink::None
                | Ink::Filler
                | Ink::Annotation
                | Ink::Cross
                | Ink::Tunnel
                | Ink::InvalidCross
                | Ink::InvalidFiller
                | Ink::InvalidAnnotation
        )
    }

    /// Whether this ink ever drives a successor group (`spec.md` §4.B
    /// edge rule table). `Read` and `Led` are receive-only taps.
    pub fn can_drive(self) -> bool {
        !matches!(self, Ink::Read | Ink::Led)
    }

    /// Whether this ink is ever driven by a predecessor group. `Write`
    /// and `Clock` are sources: their state comes from outside the
    /// propagation graph (external toggling, or the clock's own timer).
    pub fn can_sense(self) -> bool {
        !matches!(self, Ink::Write | Ink::Clock)
    }

    /// Conductors: plain wires that never compute, only propagate.
    pub fn is_conductor(self) -> bool {
        matches!(self, Ink::Trace | Ink::Read | Ink::Write | Ink::Bundle)
    }

    /// Gates: combinational logic evaluated every tick from `activeInputs`.
    pub fn is_gate(self) -> bool {
        matches!(
            self,
            Ink::Buffer
                | Ink::Or
                | Ink::Nand
                | Ink::Not
                | Ink::Nor
                | Ink::And
                | Ink::Xor
                | Ink::Xnor
        )
    }

    /// Whether this gate kind is intrinsically active with zero driving
    /// predecessors (`spec.md` §4.B step 5): `Nand`, `Nor`, `Xnor`, and
    /// `Not` all invert a default-zero input, so they start high.
    pub fn active_with_no_inputs(self) -> bool {
        matches!(self, Ink::Nand | Ink::Nor | Ink::Xnor | Ink::Not)
    }

    /// Crossings are not nodes in the group graph; they rewrite adjacency
    /// so traces pass through instead of merging (`spec.md` §4.B, §9).
    pub fn is_crossing(self) -> bool {
        matches!(self, Ink::Cross | Ink::Tunnel)
    }

    /// Whether this kind computes its on/off state from `activeInputs`
    /// rather than merely relaying it (`spec.md` §4.B edge rule table:
    /// `Trace/Read → Gate-input side`, `Gate → Trace/Write`). A computing
    /// group must never be handed an edge back into whatever conductor is
    /// already feeding it — see `build_edges` in `crate::preprocess`.
    pub fn is_computing(self) -> bool {
        self.is_gate() || matches!(self, Ink::Latch)
    }

    /// Whether groups of this kind are numbered in the wire-group range
    /// (`spec.md` §3: "ink groups are numbered before gate/stateful
    /// groups so that indices partition by role").
    pub fn is_wire_group(self) -> bool {
        self.is_conductor()
    }

    /// A terse debug label. Not a UI palette — full ink naming/coloring
    /// stays out of scope (`spec.md` §1).
    pub fn name(self) -> &'static str {
        use Ink::*;
        match self {
            None => "none",
            Trace => "trace",
            Read => "read",
            Write => "write",
            Cross => "cross",
            Tunnel => "tunnel",
            Buffer => "buffer",
            Or => "or",
            Nand => "nand",
            Not => "not",
            Nor => "nor",
            And => "and",
            Xor => "xor",
            Xnor => "xnor",
            Clock => "clock",
            Latch => "latch",
            Led => "led",
            Bundle => "bundle",
            Filler => "filler",
            Annotation => "annotation",
            InvalidCross => "invalid-cross",
            InvalidFiller => "invalid-filler",
            InvalidAnnotation => "invalid-annotation",
        }
    }
}

/// Classifies a raw RGBA pixel color into its off-form [`Ink`].
///
/// This crate's own palette, documented in `DESIGN.md` — the upstream
/// `colorPallet` table is declared `extern` in `original_source/openVCB.h`
/// but defined in a translation unit the retrieval pack does not carry, so
/// we cannot reproduce its exact hex values. Unrecognized colors classify
/// to [`Ink::None`].
pub fn classify(color: RGBA8) -> Ink {
    match (color.r, color.g, color.b) {
        (0, 0, 0) => Ink::None,
        (0x7f, 0x7f, 0x7f) => Ink::Trace,
        (0x7f, 0x3f, 0x3f) => Ink::Read,
        (0x3f, 0x3f, 0x7f) => Ink::Write,
        (0xff, 0xff, 0xff) => Ink::Cross,
        (0xd0, 0xd0, 0xd0) => Ink::Tunnel,
        (0x00, 0x7f, 0x00) => Ink::Buffer,
        (0x00, 0x7f, 0x7f) => Ink::Or,
        (0x7f, 0x00, 0x7f) => Ink::Nand,
        (0x7f, 0x00, 0x00) => Ink::Not,
        (0x7f, 0x7f, 0x00) => Ink::Nor,
        (0x00, 0x00, 0x7f) => Ink::And,
        (0x7f, 0x3f, 0x00) => Ink::Xor,
        (0x3f, 0x00, 0x7f) => Ink::Xnor,
        (0xff, 0xa5, 0x00) => Ink::Clock,
        (0xa5, 0x00, 0xff) => Ink::Latch,
        (0xff, 0x00, 0x00) => Ink::Led,
        (0x00, 0x80, 0xff) => Ink::Bundle,
        (0x2b, 0x2b, 0x2b) => Ink::Filler,
        (0x40, 0x40, 0x40) => Ink::Annotation,
        _ => Ink::None,
    }
}
