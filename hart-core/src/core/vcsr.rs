//! Holds the architectural state backing the vector-extension CSRs: `vstart`, `vtype`, `vl`,
//! `vxsat`, and `vxrm`. `vl` and `vtype` are written as a pair by `vsetvli`/`vsetivli`/`vsetvl`
//! (see [`Executor::vset`](super::execute::Executor)); direct CSR writes to `vl`/`vtype` are
//! accepted but, per the vector extension, leave the vector unit in whatever state the written
//! value represents (no re-derivation of `vl` from `vtype` is performed here).

use bitvec::{field::BitField, order::Lsb0, view::BitView};

/// Bit layout of `vtype`: `vill` in the sign bit, `vma`/`vta` above the `vsew`/`vlmul` fields.
mod idx {
    use core::ops::Range;

    pub const VLMUL: Range<usize> = 0..3;
    pub const VSEW: Range<usize> = 3..6;
    pub const VTA: usize = 6;
    pub const VMA: usize = 7;
    pub const VILL: usize = 31;
}

/// Selected element width, decoded from `vtype.vsew`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sew {
    E8,
    E16,
    E32,
    E64,
}

impl Sew {
    pub fn bits(self) -> u32 {
        match self {
            Sew::E8 => 8,
            Sew::E16 => 16,
            Sew::E32 => 32,
            Sew::E64 => 64,
        }
    }

    fn decode(vsew: u8) -> Option<Self> {
        match vsew {
            0b000 => Some(Sew::E8),
            0b001 => Some(Sew::E16),
            0b010 => Some(Sew::E32),
            0b011 => Some(Sew::E64),
            _ => None,
        }
    }
}

/// Selected register grouping multiplier, decoded from `vtype.vlmul`. Fractional groupings
/// (`MF2`/`MF4`/`MF8`) reduce the effective vector length instead of grouping registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lmul {
    M1,
    M2,
    M4,
    M8,
    Mf2,
    Mf4,
    Mf8,
}

impl Lmul {
    /// Returns the multiplier as a ratio `(numerator, denominator)` so callers can compute
    /// `VLMAX = VLEN / SEW * LMUL` without floating point.
    pub fn ratio(self) -> (u32, u32) {
        match self {
            Lmul::M1 => (1, 1),
            Lmul::M2 => (2, 1),
            Lmul::M4 => (4, 1),
            Lmul::M8 => (8, 1),
            Lmul::Mf2 => (1, 2),
            Lmul::Mf4 => (1, 4),
            Lmul::Mf8 => (1, 8),
        }
    }

    fn decode(vlmul: u8) -> Option<Self> {
        match vlmul {
            0b000 => Some(Lmul::M1),
            0b001 => Some(Lmul::M2),
            0b010 => Some(Lmul::M4),
            0b011 => Some(Lmul::M8),
            0b101 => Some(Lmul::Mf8),
            0b110 => Some(Lmul::Mf4),
            0b111 => Some(Lmul::Mf2),
            _ => None,
        }
    }
}

/// Decoded contents of `vtype`, or `Illegal` if the encoding has no corresponding `Sew`/`Lmul`
/// (in which case `vtype.vill` is set and `vl` is forced to `0`).
#[derive(Debug, Clone, Copy)]
pub enum VectorTypeState {
    Illegal,
    Valid {
        sew: Sew,
        lmul: Lmul,
        /// Tail-agnostic (`true`) vs tail-undisturbed (`false`).
        vta: bool,
        /// Mask-agnostic (`true`) vs mask-undisturbed (`false`).
        vma: bool,
    },
}

#[derive(Debug, Clone)]
pub struct VectorCsr {
    vstart: u32,
    vtype: u32,
    vl: u32,
    vxsat: bool,
    vxrm: u8,
}

impl Default for VectorCsr {
    fn default() -> Self {
        Self::new()
    }
}

impl VectorCsr {
    pub fn new() -> Self {
        Self {
            vstart: 0,
            // vill set, every other field zero: matches a hart that has not yet executed a
            // vset{i}vl{i} instruction.
            vtype: 1 << idx::VILL,
            vl: 0,
            vxsat: false,
            vxrm: 0,
        }
    }

    pub fn read_vstart(&self) -> u32 {
        self.vstart
    }

    pub fn write_vstart(&mut self, value: u32) {
        self.vstart = value;
    }

    pub fn read_vl(&self) -> u32 {
        self.vl
    }

    pub fn read_vtype(&self) -> u32 {
        self.vtype
    }

    pub fn read_vxsat(&self) -> bool {
        self.vxsat
    }

    pub fn write_vxsat(&mut self, value: bool) {
        self.vxsat = value;
    }

    pub fn read_vxrm(&self) -> u8 {
        self.vxrm
    }

    pub fn write_vxrm(&mut self, value: u8) {
        self.vxrm = value & 0b11;
    }

    /// Reads the combined `vcsr` CSR: `vxrm` in bits `[2:1]`, `vxsat` in bit `0`.
    pub fn read_vcsr(&self) -> u8 {
        (self.vxrm << 1) | self.vxsat as u8
    }

    pub fn write_vcsr(&mut self, value: u8) {
        self.vxrm = (value >> 1) & 0b11;
        self.vxsat = value & 1 != 0;
    }

    /// Decodes the current `vtype` into its constituent fields.
    pub fn vector_type(&self) -> VectorTypeState {
        Self::decode_vtype(self.vtype)
    }

    fn decode_vtype(vtype: u32) -> VectorTypeState {
        if vtype.view_bits::<Lsb0>()[idx::VILL] {
            return VectorTypeState::Illegal;
        }
        let vlmul: u8 = vtype.view_bits::<Lsb0>()[idx::VLMUL].load();
        let vsew: u8 = vtype.view_bits::<Lsb0>()[idx::VSEW].load();
        match (Sew::decode(vsew), Lmul::decode(vlmul)) {
            (Some(sew), Some(lmul)) => VectorTypeState::Valid {
                sew,
                lmul,
                vta: vtype.view_bits::<Lsb0>()[idx::VTA],
                vma: vtype.view_bits::<Lsb0>()[idx::VMA],
            },
            _ => VectorTypeState::Illegal,
        }
    }

    /// Applies the effect of `vsetvli`/`vsetivli`/`vsetvl`: sets `vtype` from the raw encoded
    /// value, derives `VLMAX` from it and `vlen`, then sets `vl` to `min(avl, VLMAX)` (or `0` if
    /// the requested `vtype` is illegal). Always resets `vstart` to `0`. Returns the resulting
    /// `vl`.
    pub fn set_vtype_and_vl(&mut self, vlen: u32, raw_vtype: u32, avl: u32) -> u32 {
        self.vstart = 0;
        match Self::decode_vtype(raw_vtype) {
            VectorTypeState::Illegal => {
                self.vtype = 1 << idx::VILL;
                self.vl = 0;
            }
            VectorTypeState::Valid { sew, lmul, .. } => {
                self.vtype = raw_vtype & !(1 << idx::VILL);
                let vlmax = Self::vlmax(vlen, sew, lmul);
                self.vl = avl.min(vlmax);
            }
        }
        self.vl
    }

    /// `VLMAX = (VLEN / SEW) * LMUL`, the maximum element count a single vector register group
    /// can hold under the given element width and grouping.
    pub fn vlmax(vlen: u32, sew: Sew, lmul: Lmul) -> u32 {
        let (num, den) = lmul.ratio();
        (vlen / sew.bits()) * num / den
    }
}
