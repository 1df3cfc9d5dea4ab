//! Hypervisor extension (H) register storage: `hstatus` and friends, the VS-mode shadow CSRs,
//! Smrnmi's `mnstatus`/`mnepc`/`mncause`/`mnscratch`, and the Smaia/Ssaia indirect-CSR-access
//! registers (`miselect`/`mireg`/`siselect`/`sireg`/`vsiselect`/`vsireg`/`mvien`/`mvip`).
//!
//! Two-stage address translation (G-stage, via `hgatp`) is not implemented: there is no second
//! TLB walk, and `hlv`/`hsv` (see [`super::execute::Executor`]) execute as ordinary
//! stage-1-only accesses at the current privilege level rather than the guest-physical access
//! they describe on real hardware. This module only provides the WARL-masked storage HS-mode
//! software expects to be able to read back what it wrote; it does not synthesize `hip`/`vsip`
//! bits from a real nested-virtualization interrupt model.

#[derive(Debug, Clone, Default)]
pub struct Hypervisor {
    hstatus: u32,
    hedeleg: u32,
    hideleg: u32,
    hvip: u32,
    hip: u32,
    hie: u32,
    hgeie: u32,
    hcounteren: u32,
    htimedelta: u32,
    htimedeltah: u32,
    htval: u32,
    htinst: u32,
    hcontext: u32,
    henvcfg: u32,
    henvcfgh: u32,
    hgatp: u32,
    vsstatus: u32,
    vsie: u32,
    vstvec: u32,
    vsscratch: u32,
    vsepc: u32,
    vscause: u32,
    vstval: u32,
    vsip: u32,
    vsatp: u32,
    mnstatus: u32,
    mnepc: u32,
    mncause: u32,
    mnscratch: u32,
    miselect: u32,
    mireg: u32,
    mvien: u32,
    mvip: u32,
    siselect: u32,
    sireg: u32,
    vsiselect: u32,
    vsireg: u32,
}

/// Declares a `read_*`/`write_*` pair for a plain WARL-masked `u32` field.
macro_rules! plain_csr {
    ($read:ident, $write:ident, $field:ident) => {
        pub fn $read(&self) -> u32 {
            self.$field
        }

        pub fn $write(&mut self, value: u32, mask: u32) {
            self.$field = self.$field & !mask | value & mask;
        }
    };
}

impl Hypervisor {
    pub fn new() -> Self {
        Self::default()
    }

    plain_csr!(read_hstatus, write_hstatus, hstatus);
    plain_csr!(read_hedeleg, write_hedeleg, hedeleg);
    plain_csr!(read_hideleg, write_hideleg, hideleg);
    plain_csr!(read_hvip, write_hvip, hvip);
    plain_csr!(read_hip, write_hip, hip);
    plain_csr!(read_hie, write_hie, hie);
    plain_csr!(read_hgeie, write_hgeie, hgeie);
    plain_csr!(read_hcounteren, write_hcounteren, hcounteren);
    plain_csr!(read_htimedelta, write_htimedelta, htimedelta);
    plain_csr!(read_htimedeltah, write_htimedeltah, htimedeltah);
    plain_csr!(read_htval, write_htval, htval);
    plain_csr!(read_htinst, write_htinst, htinst);
    plain_csr!(read_hcontext, write_hcontext, hcontext);
    plain_csr!(read_henvcfg, write_henvcfg, henvcfg);
    plain_csr!(read_henvcfgh, write_henvcfgh, henvcfgh);
    plain_csr!(read_hgatp, write_hgatp, hgatp);
    plain_csr!(read_vsstatus, write_vsstatus, vsstatus);
    plain_csr!(read_vsie, write_vsie, vsie);
    plain_csr!(read_vstvec, write_vstvec, vstvec);
    plain_csr!(read_vsscratch, write_vsscratch, vsscratch);
    plain_csr!(read_vsepc, write_vsepc, vsepc);
    plain_csr!(read_vscause, write_vscause, vscause);
    plain_csr!(read_vstval, write_vstval, vstval);
    plain_csr!(read_vsip, write_vsip, vsip);
    plain_csr!(read_vsatp, write_vsatp, vsatp);
    plain_csr!(read_mnstatus, write_mnstatus, mnstatus);
    plain_csr!(read_mnepc, write_mnepc, mnepc);
    plain_csr!(read_mncause, write_mncause, mncause);
    plain_csr!(read_mnscratch, write_mnscratch, mnscratch);
    plain_csr!(read_miselect, write_miselect, miselect);
    plain_csr!(read_mireg, write_mireg, mireg);
    plain_csr!(read_mvien, write_mvien, mvien);
    plain_csr!(read_mvip, write_mvip, mvip);
    plain_csr!(read_siselect, write_siselect, siselect);
    plain_csr!(read_sireg, write_sireg, sireg);
    plain_csr!(read_vsiselect, write_vsiselect, vsiselect);
    plain_csr!(read_vsireg, write_vsireg, vsireg);

    /// `hgeip` has no guest external-interrupt sources to report in this implementation and is
    /// hardwired to zero.
    pub fn read_hgeip(&self) -> u32 {
        0
    }
}
