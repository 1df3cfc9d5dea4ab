//! Provides a simulatable hart core: instruction fetch/decode/execute, the privileged-architecture
//! CSR and trap-handling state machine, Sv32 address translation, physical memory protection, and
//! the debug trigger module. Currently specialized to RV32I plus the M, A, F, D, Zicsr, Zba, Zbb,
//! Zbs, and Zicond extensions.

mod control;
mod counters;
pub mod csr;
mod execute;
pub mod fpcsr;
mod hypervisor;
mod interrupts;
mod mconfig;
mod mmu;
pub mod pmp;
mod status;
mod trap;
pub mod trace;
pub mod trigger;
pub mod vcsr;

use crate::core::mmu::MemoryError;
use crate::fp_registers::FpRegisters;
use crate::instruction::{
    AmoOp, BranchCondition, CsrOp, Instruction, LoadWidth, RegImmOp, RegRegOp, RegShiftImmOp,
    StoreWidth, UnaryOp,
};
use crate::registers::Registers;
use crate::simulator::Simulatable;
use crate::system_bus::SystemBus;
use crate::vector_registers::VectorRegisters;
use crate::{Allocated, Allocator, Endianness, PrivilegeLevel, RawPrivilegeLevel, Xlen};
use control::{Control, VectorMode};
use counters::Counters;
use execute::Executor;
use fpcsr::FpCsr;
use hypervisor::Hypervisor;
use interrupts::Interrupts;
use mconfig::Mconfig;
use mmu::{Mmu, Tlb};
use pmp::Pmp;
use status::Status;
use std::fmt::Debug;
use thiserror::Error;
use trace::{CsrWrite, MemoryWrite, RegisterWrite, StepOutcome, TraceRecord, TraceSink};
use trap::{Trap, TrapCause};
use trigger::TriggerUnit;
use vcsr::VectorCsr;

pub use csr::CsrSpecifier;

/// Debug Mode state entered when a trigger's `action` is `EnterDebug` (RISC-V Debug Spec ch. 5).
///
/// This simulator has no debug-ROM/debug-program execution model, so entering Debug Mode only
/// records `dpc`/`dcsr` and halts instruction execution; there is no `dret` support, resuming is
/// instead an external-environment call to [`Core::resume_from_debug_mode`], analogous to
/// [`Core::nmi`] and [`Core::reset`].
#[derive(Debug, Clone, Copy)]
struct DebugState {
    active: bool,
    /// `dpc`: the PC execution resumes at.
    dpc: u32,
    /// `dcsr.cause`: always `2` (trigger module) in this simulator, the only way to enter Debug
    /// Mode that's implemented.
    cause: u8,
    /// `dcsr.prv`: the privilege mode execution was in when Debug Mode was entered.
    prv: PrivilegeLevel,
}

impl Default for DebugState {
    fn default() -> Self {
        Self { active: false, dpc: 0, cause: 0, prv: PrivilegeLevel::Machine }
    }
}

/// `dcsr.cause` value recorded when a trigger fires with `action == EnterDebug`.
const DCSR_CAUSE_TRIGGER: u8 = 2;

#[derive(Debug, Clone)]
pub struct Config {
    /// > The mhartid CSR is an MXLEN-bit read-only register containing the integer ID of the
    /// > hardware thread running the code. This register must be readable in any implementation.
    /// > Hart IDs might not necessarily be numbered contiguously in a multiprocessor system, but at
    /// > least one hart must have a hart ID of zero. Hart IDs must be unique within the execution
    /// > environment.
    pub hart_id: u32,
    /// The native integer width this hart executes at, mirrored into the `MXL` field of `misa`.
    pub xlen: Xlen,
    /// Physical memory address of memory-mapped mtime control register.
    /// The register should be 64 bits wide, and the address must support reads of 8 bytes.
    ///
    /// Note that this address is accessed directly on the system bus, ignoring other configuration
    /// options such as [`Config::support_misaligned_memory_access`].
    pub mtime_address: u32,
    /// Physical memory address of memory-mapped mtimecmp control register.
    /// The register should be 64 bits wide, and the address must support reads of 8 bytes.
    ///
    /// Note that this address is accessed directly on the system bus, ignoring other configuration
    /// options such as [`Config::support_misaligned_memory_access`].
    pub mtimecmp_address: u32,
    /// If `true`, non-naturally-aligned memory accesses are supported.
    /// If `false`, they will generate an address-misaligned exception.
    pub support_misaligned_memory_access: bool,
    /// If `true`, a compressed (16-bit) opcode at an odd halfword is rejected as
    /// instruction-address-misaligned rather than decoded; i.e. the C extension is considered
    /// absent for alignment purposes even if the decoder otherwise recognizes 16-bit opcodes.
    pub strict_instruction_alignment: bool,
    /// Address to which the core's PC register is reset.
    pub reset_vector: u32,
    /// Address of the handler for Non-Maskable Interrupts.
    pub nmi_vector: u32,
    /// Number of implemented `pmpcfg`/`pmpaddr` entry pairs, `0..=64`. Entries beyond this count
    /// read as zero and can never be locked. See [`pmp::Pmp`].
    pub pmp_entries: usize,
    /// Number of implemented debug triggers, selectable through `tselect`. See
    /// [`trigger::TriggerUnit`].
    pub trigger_count: usize,
    /// Whether a misaligned-access fault takes priority over a page fault raised on the same
    /// access (`true`), or whether the page fault is reported instead.
    pub misaligned_fault_has_priority: bool,
    /// For a misaligned access that straddles two pages where one half faults, whether the fault
    /// address reported in `xtval` is that of the first (lower-addressed) half (`true`) or the
    /// second.
    pub misaligned_fault_on_first_half: bool,
    /// Whether `LR`/`SC`'s reservation survives an exception taken between the `LR` and the
    /// matching `SC` (`true`), or whether any trap clears it (`false`).
    pub reservation_survives_exception: bool,
    /// Whether the F extension (single-precision floating point) is implemented. If `false`,
    /// every FP-class instruction raises an illegal-instruction exception and `mstatus.FS` is
    /// pinned to `Off`.
    pub f_enabled: bool,
    /// Whether the D extension (double-precision floating point) is implemented. Has no effect
    /// unless [`Self::f_enabled`] is also `true`: F is a prerequisite for D.
    pub d_enabled: bool,
    /// Whether the V extension (vector) is implemented. If `false`, every vector-class
    /// instruction raises an illegal-instruction exception and `mstatus.VS` is pinned to `Off`.
    pub v_enabled: bool,
    /// `VLEN`: the number of bits in a single vector register. Must be a power of two and a
    /// multiple of 8. Ignored if [`Self::v_enabled`] is `false`.
    pub vlen: u32,
    /// Whether the C extension (16-bit compressed instructions) is implemented. If `false`,
    /// every fetch reads a full 32-bit word and a parcel whose low two bits aren't `0b11` decodes
    /// as [`Exception::IllegalInstruction`] rather than being expanded.
    pub c_enabled: bool,
    /// Whether the H extension (hypervisor) CSRs are implemented. If `false`, every hypervisor and
    /// VS-mode CSR, `hlv`/`hsv`, and `hfence.vvma`/`hfence.gvma` raise an illegal-instruction
    /// exception. Two-stage (G-stage) address translation is never modeled even when `true`: see
    /// [`hypervisor::Hypervisor`].
    pub h_enabled: bool,
}

/// RISC-V core implementing the RV32I ISA.
///
/// As we don't support hardware multithreading, every core always only has a single hart.
/// We therefore don't model RISC-V harts explicitly, but rather consider [`Core`] to be the whole
/// of a core with a single hart.
///
/// > A component is termed a core if it contains an independent instruction fetch unit.
/// > A RISC-V-compatible core might support multiple RISC-V-compatible hardware threads, or harts,
/// > through multithreading.
///
/// # RISC-V hart
///
/// > From the perspective of software running in a given execution environment, a hart is a
/// > resource that autonomously fetches and executes RISC-V instructions within that execution
/// > environment. In this respect, a hart behaves like a hardware thread resource even if
/// > time-multiplexed onto real hardware by the execution environment. Some EEIs support the
/// > creation and destruction of additional harts, for example, via environment calls to fork new
/// > harts.
///
/// > The execution environment is responsible for ensuring the eventual forward progress of each of
/// > its harts. For a given hart, that responsibility is suspended while the hart is exercising a
/// > mechanism that explicitly waits for an event, such as the wait-for-interrupt instruction
/// > defined in Volume II of this specification; and that responsibility ends if the hart is
/// > terminated. The following events constitute forward progress:
/// >
/// > - The retirement of an instruction.
/// > - A trap, as defined in Section 1.6.
/// > - Any other event defined by an extension to constitute forward progress.
///
/// # Control and Status Registers
///
/// This structure also contains the CSRs as per the Zicsr extension.
///
/// > RISC-V defines a separate address space of 4096 Control and Status registers associated with
/// > each hart.
///
/// > The standard RISC-V ISA sets aside a 12-bit encoding space (csr\[11:0]) for up to 4,096 CSRs.
/// > By convention, the upper 4 bits of the CSR address (csr\[11:8]) are used to encode the read
/// > and write accessibility of the CSRs according to privilege level as shown in Table 2.1. The
/// > top two bits (csr\[11:10]) indicate whether the register is read/write (00, 01, or 10) or
/// > read-only (11). The next two bits (csr\[9:8]) encode the lowest privilege level that can
/// > access the CSR.
#[derive(Debug)]
pub struct Core<A: Allocator, B: SystemBus<A>> {
    /// Configuration options for this core. See [`Config`].
    config: Config,
    /// The system bus used via which physical memory is accessed by this core.
    system_bus: B,
    /// General purpose registers: x and pc registers.
    registers: Allocated<A, Registers>,
    /// The core's current privilege mode.
    ///
    /// Allocated separately, because this is updated independently of other registers.
    privilege_mode: Allocated<A, PrivilegeLevel>,
    /// Status (mstatus, mstatush, sstatus) registers.
    ///
    /// Allocated separately, because these are often mutated independently of other registers.
    status: Allocated<A, Status>,
    /// All CSR counter registers.
    ///
    /// Allocated together, since most of them will be updated simultaneously.
    counters: Allocated<A, Counters>,
    trap: Allocated<A, Trap>,
    control: Allocated<A, Control>,
    mconfig: Allocated<A, Mconfig>,
    /// mip, mie, mideleg and the software-writable half of SEIP.
    interrupts: Allocated<A, Interrupts>,
    /// Physical memory protection entries. See [`pmp::Pmp`].
    pmp: Allocated<A, Pmp>,
    /// Debug trigger bank, selected through `tselect`. See [`trigger::TriggerUnit`].
    triggers: Allocated<A, TriggerUnit>,
    /// A pending fault armed through [`Core::inject_exception`], if any.
    injected_exception: Allocated<A, Option<InjectedException>>,
    /// The `f` register file backing the F/D extensions. Present regardless of
    /// [`Config::f_enabled`] so that disabling F at runtime cannot be observed through register
    /// contents, but inaccessible to the instruction stream unless enabled.
    fp_registers: Allocated<A, FpRegisters>,
    /// `fflags`/`frm`/`fcsr` state. See [`fpcsr::FpCsr`].
    fp_csr: Allocated<A, FpCsr>,
    /// The `v` register file backing the V extension. Present regardless of
    /// [`Config::v_enabled`], mirroring [`Self::fp_registers`].
    vector_registers: Allocated<A, VectorRegisters>,
    /// `vstart`/`vtype`/`vl`/`vxsat`/`vxrm` state. See [`vcsr::VectorCsr`].
    vector_csr: Allocated<A, VectorCsr>,
    /// Cached Sv32 translations. See [`mmu::Tlb`].
    tlb: Allocated<A, Tlb>,
    /// Debug Mode state. See [`DebugState`].
    debug: Allocated<A, DebugState>,
    /// Hypervisor (H) and VS-mode CSR storage. Present regardless of [`Config::h_enabled`],
    /// mirroring [`Self::fp_registers`]. See [`hypervisor::Hypervisor`].
    hypervisor: Allocated<A, Hypervisor>,
    /// CSR writes performed by the instruction stream (`csrrw` and friends) during the current
    /// step, oldest first. Cleared at the start of every step; drained into a [`TraceRecord`] by
    /// the `*_traced` family of methods.
    csr_write_log: Allocated<A, Vec<(CsrSpecifier, u32)>>,
    /// CSR writes performed by trap entry during the current step (`mcause`/`mepc`/`mtval`/... and
    /// their supervisor counterparts), kept separate from [`Self::csr_write_log`] so a trace
    /// consumer can tell an instruction's own CSR write apart from the trap it caused.
    trap_csr_write_log: Allocated<A, Vec<(CsrSpecifier, u32)>>,
    /// Physical memory writes performed during the current step, oldest first.
    memory_write_log: Allocated<A, Vec<(u32, Vec<u8>)>>,
}

impl<A: Allocator, B: SystemBus<A>> Core<A, B> {
    /// The misa CSR is set to `0x4014_0100`, indicating that MXL=32 and that extensions I, S, and U
    /// are supported.
    ///
    /// > The misa CSR is a WARL read-write register reporting the ISA supported by the hart. This
    /// > register must be readable in any implementation, but a value of zero can be returned to
    /// > indicate the misa register has not been implemented, requiring that CPU capabilities be
    /// > determined through a separate non-standard mechanism.
    ///
    /// > The MXL (Machine XLEN) field encodes the native base integer ISA width as shown in Table
    /// > 3.1. The MXL field may be writable in implementations that support multiple base ISAs.
    /// > The effective XLEN in M-mode, MXLEN, is given by the setting of MXL, or has a fixed value
    /// > if misa is zero. The MXL field is always set to the widest supported ISA variant at reset.
    ///
    /// > Table 3.1: Encoding of MXL field in misa.
    /// > | MXL | XLEN |
    /// > | ---:| ----:|
    /// > |   1 |   32 |
    /// > |   2 |   64 |
    /// > |   3 |  128 |
    pub const MISA: u32 = 0x4014_0100;
    /// The mvendorid CSR is set to 0 to indicate this is a non-commercial implementation.
    ///
    /// > The mvendorid CSR is a 32-bit read-only register providing the JEDEC manufacturer ID of
    /// > the provider of the core. This register must be readable in any implementation, but a
    /// > value of 0 can be returned to indicate the field is not implemented or that this is a
    /// > non-commercial implementation.
    pub const MVENDORID: u32 = 0;
    /// The marchid CSR is set to 0 to indicate it is not implemented.
    ///
    /// > The marchid CSR is an MXLEN-bit read-only register encoding the base microarchitecture of
    /// > the hart. This register must be readable in any implementation, but a value of 0 can be
    /// > returned to indicate the field is not implemented. The combination of mvendorid and
    /// > marchid should uniquely identify the type of hart microarchitecture that is implemented.
    pub const MARCHID: u32 = 0;
    /// The mimpid CSR is set to 0 to indicate it is not implemented.
    ///
    /// > The mimpid CSR provides a unique encoding of the version of the processor implementation.
    /// > This register must be readable in any implementation, but a value of 0 can be returned to
    /// > indicate that the field is not implemented. The Implementation value should reflect the
    /// > design of the RISC-V processor itself and not any surrounding system.
    pub const MIMPID: u32 = 0;
    /// The mconfigptr CSR is set to 0 to indicate the configuration data structure does not exists.
    ///
    /// > mconfigptr is an MXLEN-bit read-only CSR [...] that holds the physical address of a
    /// > configuration data structure. Software can traverse this data structure to discover
    /// > information about the harts, the platform, and their configuration.
    pub const MCONFIGPTR: u32 = 0;

    pub fn new(allocator: &mut A, system_bus: B, config: Config) -> Self {
        let registers = Allocated::new(
            allocator,
            Registers::new(config.xlen, config.reset_vector as u64),
        );
        let pmp_entries = config.pmp_entries;
        let trigger_count = config.trigger_count;
        let vlen = config.vlen;
        Self {
            config,
            system_bus,
            registers,
            trap: Allocated::new(allocator, Trap::new()),
            counters: Allocated::new(allocator, Counters::new()),
            status: Allocated::new(allocator, Status::new()),
            privilege_mode: Allocated::new(allocator, PrivilegeLevel::Machine),
            control: Allocated::new(allocator, Control::new()),
            mconfig: Allocated::new(allocator, Mconfig::new()),
            interrupts: Allocated::new(allocator, Interrupts::new()),
            pmp: Allocated::new(allocator, Pmp::new(pmp_entries)),
            triggers: Allocated::new(allocator, TriggerUnit::new(trigger_count)),
            injected_exception: Allocated::new(allocator, None),
            fp_registers: Allocated::new(allocator, FpRegisters::new()),
            fp_csr: Allocated::new(allocator, FpCsr::new()),
            vector_registers: Allocated::new(allocator, VectorRegisters::new(vlen)),
            vector_csr: Allocated::new(allocator, VectorCsr::new()),
            tlb: Allocated::new(allocator, Tlb::new()),
            debug: Allocated::new(allocator, DebugState::default()),
            hypervisor: Allocated::new(allocator, Hypervisor::new()),
            csr_write_log: Allocated::new(allocator, Vec::new()),
            trap_csr_write_log: Allocated::new(allocator, Vec::new()),
            memory_write_log: Allocated::new(allocator, Vec::new()),
        }
    }

    pub fn drop(self, allocator: &mut A) {
        self.memory_write_log.drop(allocator);
        self.trap_csr_write_log.drop(allocator);
        self.csr_write_log.drop(allocator);
        self.hypervisor.drop(allocator);
        self.debug.drop(allocator);
        self.injected_exception.drop(allocator);
        self.pmp.drop(allocator);
        self.triggers.drop(allocator);
        self.control.drop(allocator);
        self.mconfig.drop(allocator);
        self.interrupts.drop(allocator);
        self.status.drop(allocator);
        self.counters.drop(allocator);
        self.trap.drop(allocator);
        self.privilege_mode.drop(allocator);
        self.registers.drop(allocator);
        self.fp_registers.drop(allocator);
        self.fp_csr.drop(allocator);
        self.vector_registers.drop(allocator);
        self.vector_csr.drop(allocator);
        self.tlb.drop(allocator);
    }

    /// Provide a read-only view of this core's configuration.
    ///
    /// It is not possible to modify the configuration after creation.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the Hart ID that was assigned to this core's single Hart.
    pub fn hart_id(&self) -> u32 {
        self.config.hart_id
    }

    /// Returns the current privilege mode.
    ///
    /// Note that loads and stores execute at the
    /// [`effective_privilege_mode`](Self::effective_privilege_mode).
    ///
    /// See also [`PrivilegeLevel`].
    pub fn privilege_mode(&self, allocator: &A) -> PrivilegeLevel {
        *self.privilege_mode.get(allocator)
    }

    /// Returns the current *effective privilege mode*. This is the privilege level at which load
    /// and stores execute (but not instruction fetches).
    ///
    /// See [`privilege_mode`](Self::privilege_mode) for the privilege mode used for all other
    /// operations.
    ///
    /// See also [`PrivilegeLevel`].
    pub fn effective_privilege_mode(&self, allocator: &A) -> PrivilegeLevel {
        let status = self.status.get(allocator);
        match status.mprv() {
            true => status.mpp(),
            false => *self.privilege_mode.get(allocator),
        }
    }

    /// Returns the endianness of the core for the given privilege mode.
    pub fn endianness(&self, allocator: &A, privilege_mode: PrivilegeLevel) -> Endianness {
        let status = self.status.get(allocator);
        let be = match privilege_mode {
            PrivilegeLevel::User => status.ube(),
            PrivilegeLevel::Supervisor => status.sbe(),
            PrivilegeLevel::Machine => status.mbe(),
        };
        match be {
            true => Endianness::BE,
            false => Endianness::LE,
        }
    }

    /// Provides immutable access to the general purpose (x) registers, and the pc register.
    pub fn registers<'a>(&self, allocator: &'a A) -> &'a Registers {
        self.registers.get(allocator)
    }

    /// Provides mutable access to the general purpose (x) registers, and the pc register.
    pub fn registers_mut<'a>(&self, allocator: &'a mut A) -> &'a mut Registers {
        self.registers.get_mut(allocator)
    }

    /// Provides immutable access to the `f` floating-point registers.
    pub fn fp_registers<'a>(&self, allocator: &'a A) -> &'a FpRegisters {
        self.fp_registers.get(allocator)
    }

    /// Provides mutable access to the `f` floating-point registers.
    pub fn fp_registers_mut<'a>(&self, allocator: &'a mut A) -> &'a mut FpRegisters {
        self.fp_registers.get_mut(allocator)
    }

    /// Provides immutable access to the `v` vector registers.
    pub fn vector_registers<'a>(&self, allocator: &'a A) -> &'a VectorRegisters {
        self.vector_registers.get(allocator)
    }

    /// Provides mutable access to the `v` vector registers.
    pub fn vector_registers_mut<'a>(&self, allocator: &'a mut A) -> &'a mut VectorRegisters {
        self.vector_registers.get_mut(allocator)
    }

    /// Generate a Reset.
    pub fn reset(&self, allocator: &mut A) {
        *self.registers.get_mut(allocator) =
            Registers::new(self.config.xlen, self.config.reset_vector as u64);
        self.trap.get_mut(allocator).mcause.set_exception(None);
        *self.counters.get_mut(allocator) = Counters::new();
        let status = self.status.get_mut(allocator);
        status.set_mie(false);
        status.set_mprv(false);
        status.set_mbe(false);
        *self.privilege_mode.get_mut(allocator) = PrivilegeLevel::Machine;
        *self.control.get_mut(allocator) = Control::new();
        *self.mconfig.get_mut(allocator) = Mconfig::new();
        *self.interrupts.get_mut(allocator) = Interrupts::new();
        *self.pmp.get_mut(allocator) = Pmp::new(self.config.pmp_entries);
        *self.triggers.get_mut(allocator) = TriggerUnit::new(self.config.trigger_count);
        *self.fp_registers.get_mut(allocator) = FpRegisters::new();
        *self.fp_csr.get_mut(allocator) = FpCsr::new();
        *self.vector_registers.get_mut(allocator) = VectorRegisters::new(self.config.vlen);
        *self.vector_csr.get_mut(allocator) = VectorCsr::new();
        *self.tlb.get_mut(allocator) = Tlb::new();
        *self.debug.get_mut(allocator) = DebugState::default();
        *self.hypervisor.get_mut(allocator) = Hypervisor::new();
        self.csr_write_log.get_mut(allocator).clear();
        self.trap_csr_write_log.get_mut(allocator).clear();
        self.memory_write_log.get_mut(allocator).clear();
    }

    /// Provides immutable access to the physical-memory-protection entries.
    pub fn pmp(&self, allocator: &A) -> &Pmp {
        self.pmp.get(allocator)
    }

    /// Provides immutable access to the debug trigger bank.
    pub fn triggers(&self, allocator: &A) -> &TriggerUnit {
        self.triggers.get(allocator)
    }

    /// Returns whether the hart is currently halted in Debug Mode.
    pub fn in_debug_mode(&self, allocator: &A) -> bool {
        self.debug.get(allocator).active
    }

    /// Resumes execution from Debug Mode at `dpc`, as an external debugger issuing a resume
    /// request would. There is no in-simulator `dret` instruction; this is the only way out.
    pub fn resume_from_debug_mode(&self, allocator: &mut A) {
        let dpc = self.debug.get(allocator).dpc;
        self.debug.get_mut(allocator).active = false;
        self.registers.get_mut(allocator).set_pc(dpc as u64);
    }

    /// Halts the hart in Debug Mode, recording `dpc`/`dcsr` per the current PC and privilege mode.
    fn enter_debug_mode(&self, allocator: &mut A, cause: u8) {
        let pc = self.registers(allocator).pc() as u32;
        let prv = self.privilege_mode(allocator);
        let debug = self.debug.get_mut(allocator);
        debug.active = true;
        debug.dpc = pc;
        debug.cause = cause;
        debug.prv = prv;
    }

    /// Generate a Non-Maskable Interrupt.
    pub fn nmi(&self, allocator: &mut A) {
        let registers = self.registers.get_mut(allocator);
        let old_pc = registers.pc();
        registers.set_pc(self.config.nmi_vector as u64);
        let trap = self.trap.get_mut(allocator);
        trap.write_mepc(old_pc as u32, 0xFFFF_FFFF);
        trap.mcause.set_interrupt(None);
        *self.privilege_mode.get_mut(allocator) = PrivilegeLevel::Machine;
    }

    /// Read the value of a CSR by its specifier.
    ///
    /// `privilege_level` indicates at what privilege level the read is performed. If the CSR that
    /// is being read requires a higher privilege level (see
    /// [`csr::required_privilege_level`]), then an [`CsrAccessError::Privileged`] will be
    /// given.
    pub fn read_csr(
        &self,
        allocator: &mut A,
        specifier: CsrSpecifier,
        privilege_level: PrivilegeLevel,
    ) -> Result<u32, CsrAccessError> {
        self.check_csr_access(allocator, specifier, privilege_level)?;
        match specifier {
            //
            // Machine info registers
            //
            csr::MISA => Ok(Self::MISA),
            csr::MVENDORID => Ok(Self::MVENDORID),
            csr::MARCHID => Ok(Self::MARCHID),
            csr::MIMPID => Ok(Self::MIMPID),
            csr::MCONFIGPTR => Ok(Self::MCONFIGPTR),
            csr::MHARTID => Ok(self.config.hart_id),
            //
            // Status registers
            //
            csr::MSTATUS => Ok(self.read_mstatus(allocator)),
            csr::MSTATUSH => Ok(self.read_mstatush(allocator)),
            csr::SSTATUS => Ok(self.read_sstatus(allocator)),
            //
            // Machine trap handling
            //
            csr::MSCRATCH => Ok(self.trap.get(allocator).read_mscratch()),
            csr::MEPC => Ok(self.trap.get(allocator).read_mepc()),
            csr::MCAUSE => Ok(self.trap.get(allocator).mcause.read()),
            csr::MTVAL => Ok(self.trap.get(allocator).read_mtval()),
            csr::MIP => Ok(self.read_mip(allocator)),
            csr::MTINST => Ok(self.trap.get(allocator).read_mtinst()),
            csr::MTVAL2 => Ok(self.trap.get(allocator).read_mtval2()),
            //
            // supervisor trap handling
            //
            csr::SSCRATCH => Ok(self.trap.get(allocator).read_sscratch()),
            csr::SEPC => Ok(self.trap.get(allocator).read_sepc()),
            csr::SCAUSE => Ok(self.trap.get(allocator).scause.read()),
            csr::STVAL => Ok(self.trap.get(allocator).read_stval()),
            csr::SIP => Ok(self.read_sip(allocator)),
            //
            // Counter registers
            //
            // cycle
            csr::CYCLE => Ok(self.read_cycle(allocator)),
            csr::CYCLEH => Ok(self.read_cycleh(allocator)),
            csr::MCYCLE => Ok(self.read_mcycle(allocator)),
            csr::MCYCLEH => Ok(self.read_mcycleh(allocator)),
            // instret
            csr::INSTRET => Ok(self.read_instret(allocator)),
            csr::INSTRETH => Ok(self.read_instreth(allocator)),
            csr::MINSTRET => Ok(self.read_minstret(allocator)),
            csr::MINSTRETH => Ok(self.read_minstreth(allocator)),
            // time
            csr::TIME => Ok(self.read_mtime(allocator) as u32),
            csr::TIMEH => Ok((self.read_mtime(allocator) >> 32) as u32),
            // hpmcounter
            csr::HPMCOUNTER3..=csr::HPMCOUNTER31 => {
                let offset = 3 + (specifier - csr::HPMCOUNTER3);
                Ok(self.read_hpmcounter(allocator, offset as u8))
            }
            csr::HPMCOUNTER3H..=csr::HPMCOUNTER31H => {
                let offset = 3 + (specifier - csr::HPMCOUNTER3H);
                Ok(self.read_hpmcounterh(allocator, offset as u8))
            }
            csr::MHPMCOUNTER3..=csr::MHPMCOUNTER31 => {
                let offset = 3 + (specifier - csr::MHPMCOUNTER3);
                Ok(self.read_mhpmcounter(allocator, offset as u8))
            }
            csr::MHPMCOUNTER3H..=csr::MHPMCOUNTER31H => {
                let offset = 3 + (specifier - csr::MHPMCOUNTER3H);
                Ok(self.read_mhpmcounterh(allocator, offset as u8))
            }
            //
            // Machine counter setup
            //
            csr::MHPMEVENT3..=csr::MHPMEVENT31 => {
                let offset = 3 + (specifier - csr::MHPMEVENT3);
                Ok(self.read_mhpmevent(allocator, offset as u8))
            }
            csr::MCOUNTINHIBIT => Ok(self.control.get(allocator).mcountinhibit.read()),
            //
            // Trap setup registers
            //
            csr::MTVEC => Ok(self.control.get(allocator).mtvec.read()),
            csr::MEDELEG => Ok(self.control.get(allocator).medeleg.read()),
            csr::MIDELEG => Ok(self.control.get(allocator).mideleg.read()),
            csr::MCOUNTEREN => Ok(self.control.get(allocator).mcounteren.read()),
            csr::STVEC => Ok(self.control.get(allocator).stvec.read()),
            csr::SCOUNTEREN => Ok(self.control.get(allocator).scounteren.read()),
            csr::MIE => Ok(self.read_mie(allocator)),
            csr::SIE => Ok(self.read_sie(allocator)),
            //
            // Supervisor protection and translation
            //
            csr::SATP => Ok(self.trap.get(allocator).read_satp()),
            //
            // Machine configuration registers
            //
            csr::MENVCFG => Ok(self.mconfig.get(allocator).read_menvcfg()),
            csr::MENVCFGH => Ok(self.mconfig.get(allocator).read_menvcfgh()),
            csr::MSECCFG | csr::MSECCFGH => Err(CsrAccessError::CsrUnsupported(specifier)),
            //
            // Floating-point control and status
            //
            csr::FFLAGS => Ok(self.fp_csr.get(allocator).read_fflags() as u32),
            csr::FRM => Ok(self.fp_csr.get(allocator).read_frm() as u32),
            csr::FCSR => Ok(self.fp_csr.get(allocator).read_fcsr() as u32),
            //
            // Vector extension control and status
            //
            csr::VSTART => Ok(self.vector_csr.get(allocator).read_vstart()),
            csr::VXSAT => Ok(self.vector_csr.get(allocator).read_vxsat() as u32),
            csr::VXRM => Ok(self.vector_csr.get(allocator).read_vxrm() as u32),
            csr::VCSR => Ok(self.vector_csr.get(allocator).read_vcsr() as u32),
            csr::VL => Ok(self.vector_csr.get(allocator).read_vl()),
            csr::VTYPE => Ok(self.vector_csr.get(allocator).read_vtype()),
            csr::VLENB => Ok(self.config.vlen / 8),
            //
            // Physical memory protection
            //
            csr::PMPCFG0..=csr::PMPCFG15 => Ok(self.read_pmpcfg(allocator, specifier - csr::PMPCFG0)),
            csr::PMPADDR0..=csr::PMPADDR63 => {
                Ok(self.pmp.get(allocator).read_addr_raw((specifier - csr::PMPADDR0) as usize) as u32)
            }
            //
            // Debug trigger module
            //
            csr::TSELECT => Ok(self.triggers.get(allocator).selected() as u32),
            csr::TDATA1 => Ok(self.triggers.get(allocator).current().read_tdata1(32) as u32),
            csr::TDATA2 => Ok(self.triggers.get(allocator).current().read_tdata2() as u32),
            csr::TDATA3 => Ok(self.triggers.get(allocator).current().read_tdata3() as u32),
            csr::TINFO => Ok(1 << 2 | 1 << 3 | 1 << 5 | 1 << 6), // mcontrol6, icount, etrigger types
            csr::TCONTROL => Ok(0),
            //
            // Debug Mode
            //
            csr::DCSR => {
                let debug = self.debug.get(allocator);
                let mut value = RawPrivilegeLevel::from(debug.prv) as u32;
                value |= (debug.cause as u32) << 6;
                value |= 4 << 28; // debugver = 4
                Ok(value)
            }
            csr::DPC => Ok(self.debug.get(allocator).dpc),
            //
            // Hypervisor and VS-mode
            //
            csr::HSTATUS => Ok(self.hypervisor.get(allocator).read_hstatus()),
            csr::HEDELEG => Ok(self.hypervisor.get(allocator).read_hedeleg()),
            csr::HIDELEG => Ok(self.hypervisor.get(allocator).read_hideleg()),
            csr::HVIP => Ok(self.hypervisor.get(allocator).read_hvip()),
            csr::HIP => Ok(self.hypervisor.get(allocator).read_hip()),
            csr::HIE => Ok(self.hypervisor.get(allocator).read_hie()),
            csr::HGEIP => Ok(self.hypervisor.get(allocator).read_hgeip()),
            csr::HGEIE => Ok(self.hypervisor.get(allocator).read_hgeie()),
            csr::HCOUNTEREN => Ok(self.hypervisor.get(allocator).read_hcounteren()),
            csr::HTIMEDELTA => Ok(self.hypervisor.get(allocator).read_htimedelta()),
            csr::HTIMEDELTAH => Ok(self.hypervisor.get(allocator).read_htimedeltah()),
            csr::HTVAL => Ok(self.hypervisor.get(allocator).read_htval()),
            csr::HTINST => Ok(self.hypervisor.get(allocator).read_htinst()),
            csr::HCONTEXT => Ok(self.hypervisor.get(allocator).read_hcontext()),
            csr::HENVCFG => Ok(self.hypervisor.get(allocator).read_henvcfg()),
            csr::HENVCFGH => Ok(self.hypervisor.get(allocator).read_henvcfgh()),
            csr::HGATP => Ok(self.hypervisor.get(allocator).read_hgatp()),
            csr::VSSTATUS => Ok(self.hypervisor.get(allocator).read_vsstatus()),
            csr::VSIE => Ok(self.hypervisor.get(allocator).read_vsie()),
            csr::VSTVEC => Ok(self.hypervisor.get(allocator).read_vstvec()),
            csr::VSSCRATCH => Ok(self.hypervisor.get(allocator).read_vsscratch()),
            csr::VSEPC => Ok(self.hypervisor.get(allocator).read_vsepc()),
            csr::VSCAUSE => Ok(self.hypervisor.get(allocator).read_vscause()),
            csr::VSTVAL => Ok(self.hypervisor.get(allocator).read_vstval()),
            csr::VSIP => Ok(self.hypervisor.get(allocator).read_vsip()),
            csr::VSATP => Ok(self.hypervisor.get(allocator).read_vsatp()),
            //
            // Smrnmi
            //
            csr::MNSTATUS => Ok(self.hypervisor.get(allocator).read_mnstatus()),
            csr::MNEPC => Ok(self.hypervisor.get(allocator).read_mnepc()),
            csr::MNCAUSE => Ok(self.hypervisor.get(allocator).read_mncause()),
            csr::MNSCRATCH => Ok(self.hypervisor.get(allocator).read_mnscratch()),
            //
            // Smaia/Ssaia indirect CSR access
            //
            csr::MISELECT => Ok(self.hypervisor.get(allocator).read_miselect()),
            csr::MIREG => Ok(self.hypervisor.get(allocator).read_mireg()),
            csr::MVIEN => Ok(self.hypervisor.get(allocator).read_mvien()),
            csr::MVIP => Ok(self.hypervisor.get(allocator).read_mvip()),
            csr::SISELECT => Ok(self.hypervisor.get(allocator).read_siselect()),
            csr::SIREG => Ok(self.hypervisor.get(allocator).read_sireg()),
            csr::VSISELECT => Ok(self.hypervisor.get(allocator).read_vsiselect()),
            csr::VSIREG => Ok(self.hypervisor.get(allocator).read_vsireg()),
            _ => Err(CsrAccessError::CsrUnsupported(specifier)),
        }
    }

    /// Reads one byte of a `pmpcfgN` register out of the packed `pmpcfg` array. `n` is `PMPCFGn -
    /// PMPCFG0`; on RV32 every `n` is a valid 4-byte register holding config bytes
    /// `4*n..4*n+4`, on RV64 only even `n` are valid 8-byte registers (odd `n` reads as zero,
    /// matching the architecture's "`pmpcfg1`/`pmpcfg3`/... do not exist" rule for RV64).
    fn read_pmpcfg(&self, allocator: &mut A, n: u32) -> u32 {
        if self.config.xlen == Xlen::Rv64 && n % 2 == 1 {
            return 0;
        }
        let pmp = self.pmp.get(allocator);
        let mut value = 0u32;
        for i in 0..4 {
            value |= (pmp.read_cfg_byte((n * 4 + i) as usize) as u32) << (i * 8);
        }
        value
    }

    /// Write a (masked) value to a CSR by its specifier.
    ///
    /// `privilege_level` indicates at what privilege level the write is performed. If the CSR that
    /// is being written requires a higher privilege level (see
    /// [`csr::required_privilege_level`]), then an [`CsrAccessError::Privileged`] will be
    /// given.
    ///
    /// Only the bits of `value` for which the corresponding bit in `mask` is `1` will be written.
    /// However, even if `mask == 0`, write side-effects will still be performed.
    ///
    /// Records the value this write overwrote into the per-step CSR write log used for tracing.
    /// The previous value is read through [`Self::read_csr`] before dispatch, so it reflects the
    /// same view of the CSR a traced consumer would see, rather than raw storage.
    pub fn write_csr(
        &self,
        allocator: &mut A,
        specifier: CsrSpecifier,
        privilege_level: PrivilegeLevel,
        value: u32,
        mask: u32,
    ) -> Result<(), CsrWriteError> {
        let previous = self.read_csr(allocator, specifier, privilege_level).ok();
        self.write_csr_inner(allocator, specifier, privilege_level, value, mask)?;
        if let Some(previous) = previous {
            self.csr_write_log
                .get_mut(allocator)
                .push((specifier, previous));
        }
        Ok(())
    }

    fn write_csr_inner(
        &self,
        allocator: &mut A,
        specifier: CsrSpecifier,
        privilege_level: PrivilegeLevel,
        value: u32,
        mask: u32,
    ) -> Result<(), CsrWriteError> {
        self.check_csr_access(allocator, specifier, privilege_level)?;
        if csr::is_read_only(specifier) {
            return Err(CsrWriteError::WriteToReadOnly);
        }
        match specifier {
            //
            // Machine info registers
            //
            // The machine info registers are read-only or read-only WARL in this implementation.
            csr::MISA => {}
            csr::MVENDORID => {}
            csr::MARCHID => {}
            csr::MIMPID => {}
            csr::MCONFIGPTR => {}
            csr::MHARTID => {}
            //
            // Status registers
            //
            csr::MSTATUS => self.write_mstatus(allocator, value, mask),
            csr::MSTATUSH => self.write_mstatush(allocator, value, mask),
            csr::SSTATUS => self.write_sstatus(allocator, value, mask),
            //
            // Machine trap handling
            //
            csr::MSCRATCH => self.trap.get_mut(allocator).write_mscratch(value, mask),
            csr::MEPC => self.trap.get_mut(allocator).write_mepc(value, mask),
            csr::MCAUSE => self.trap.get_mut(allocator).mcause.write(value, mask),
            csr::MTVAL => self.trap.get_mut(allocator).write_mtval(value, mask),
            csr::MIP => self.write_mip(allocator, value, mask),
            csr::MTINST => self.trap.get_mut(allocator).write_mtinst(value, mask),
            csr::MTVAL2 => self.trap.get_mut(allocator).write_mtval2(value, mask),
            //
            // supervisor trap handling
            //
            csr::SSCRATCH => self.trap.get_mut(allocator).write_sscratch(value, mask),
            csr::SEPC => self.trap.get_mut(allocator).write_sepc(value, mask),
            csr::SCAUSE => self.trap.get_mut(allocator).scause.write(value, mask),
            csr::STVAL => self.trap.get_mut(allocator).write_stval(value, mask),
            csr::SIP => self.write_sip(allocator, value, mask),
            //
            // Counter registers
            //
            // Non-m-counters are read-only shadows of their m-counter counterparts.
            csr::CYCLE
            | csr::CYCLEH
            | csr::INSTRET
            | csr::INSTRETH
            | csr::TIME
            | csr::TIMEH
            | csr::HPMCOUNTER3..=csr::HPMCOUNTER31
            | csr::HPMCOUNTER3H..=csr::HPMCOUNTER31H => {}
            csr::MCYCLE => self.write_mcycle(allocator, value, mask),
            csr::MCYCLEH => self.write_mcycleh(allocator, value, mask),
            csr::MINSTRET => self.write_minstret(allocator, value, mask),
            csr::MINSTRETH => self.write_minstreth(allocator, value, mask),
            csr::MHPMCOUNTER3..=csr::MHPMCOUNTER31 => {
                let offset = 3 + (specifier - csr::MHPMCOUNTER3);
                self.write_mhpmcounter(allocator, offset as u8, value, mask);
            }
            csr::MHPMCOUNTER3H..=csr::MHPMCOUNTER31H => {
                let offset = 3 + (specifier - csr::MHPMCOUNTER3H);
                self.write_mhpmcounterh(allocator, offset as u8, value, mask);
            }
            //
            // Machine counter setup
            //
            csr::MHPMEVENT3..=csr::MHPMEVENT31 => {
                let offset = 3 + (specifier - csr::MHPMEVENT3);
                self.write_mhpmevent(allocator, offset as u8, value, mask);
            }
            csr::MCOUNTINHIBIT => self
                .control
                .get_mut(allocator)
                .mcountinhibit
                .write(value, mask),
            //
            // Trap setup registers
            //
            csr::MTVEC => self.control.get_mut(allocator).mtvec.write(value, mask),
            csr::MEDELEG => self.control.get_mut(allocator).medeleg.write(value, mask),
            csr::MIDELEG => self.control.get_mut(allocator).mideleg.write(value, mask),
            csr::MCOUNTEREN => self
                .control
                .get_mut(allocator)
                .mcounteren
                .write(value, mask),
            csr::STVEC => self.control.get_mut(allocator).stvec.write(value, mask),
            csr::SCOUNTEREN => self
                .control
                .get_mut(allocator)
                .scounteren
                .write(value, mask),
            csr::MIE => self.write_mie(allocator, value, mask),
            csr::SIE => self.write_sie(allocator, value, mask),
            //
            // Supervisor protection and translation
            //
            csr::SATP => self.trap.get_mut(allocator).write_satp(value, mask),
            //
            // Machine configuration registers
            //
            csr::MENVCFG => self.mconfig.get_mut(allocator).write_menvcfg(value, mask),
            csr::MENVCFGH => self.mconfig.get_mut(allocator).write_menvcfgh(value, mask),
            csr::MSECCFG | csr::MSECCFGH => Err(CsrAccessError::CsrUnsupported(specifier))?,
            //
            // Floating-point control and status
            //
            csr::FFLAGS => {
                let fp_csr = self.fp_csr.get_mut(allocator);
                let old = fp_csr.read_fflags() as u32;
                fp_csr.write_fflags((old & !mask | value & mask) as u8);
                self.status.get_mut(allocator).set_fs(status::ExtensionContextStatus::Dirty);
            }
            csr::FRM => {
                let fp_csr = self.fp_csr.get_mut(allocator);
                let old = fp_csr.read_frm() as u32;
                fp_csr.write_frm((old & !mask | value & mask) as u8);
                self.status.get_mut(allocator).set_fs(status::ExtensionContextStatus::Dirty);
            }
            csr::FCSR => {
                let fp_csr = self.fp_csr.get_mut(allocator);
                let old = fp_csr.read_fcsr() as u32;
                fp_csr.write_fcsr((old & !mask | value & mask) as u8);
                self.status.get_mut(allocator).set_fs(status::ExtensionContextStatus::Dirty);
            }
            //
            // Vector extension control and status
            //
            csr::VSTART => {
                let vector_csr = self.vector_csr.get_mut(allocator);
                let old = vector_csr.read_vstart();
                vector_csr.write_vstart(old & !mask | value & mask);
                self.status.get_mut(allocator).set_vs(status::ExtensionContextStatus::Dirty);
            }
            csr::VXSAT => {
                let vector_csr = self.vector_csr.get_mut(allocator);
                let old = vector_csr.read_vxsat() as u32;
                vector_csr.write_vxsat((old & !mask | value & mask) != 0);
                self.status.get_mut(allocator).set_vs(status::ExtensionContextStatus::Dirty);
            }
            csr::VXRM => {
                let vector_csr = self.vector_csr.get_mut(allocator);
                let old = vector_csr.read_vxrm() as u32;
                vector_csr.write_vxrm((old & !mask | value & mask) as u8);
                self.status.get_mut(allocator).set_vs(status::ExtensionContextStatus::Dirty);
            }
            csr::VCSR => {
                let vector_csr = self.vector_csr.get_mut(allocator);
                let old = vector_csr.read_vcsr() as u32;
                vector_csr.write_vcsr((old & !mask | value & mask) as u8);
                self.status.get_mut(allocator).set_vs(status::ExtensionContextStatus::Dirty);
            }
            //
            // Physical memory protection
            //
            csr::PMPCFG0..=csr::PMPCFG15 => {
                self.write_pmpcfg(allocator, specifier - csr::PMPCFG0, value, mask)
            }
            csr::PMPADDR0..=csr::PMPADDR63 => {
                let index = (specifier - csr::PMPADDR0) as usize;
                let pmp = self.pmp.get_mut(allocator);
                let locked = pmp.entry(index).locked || pmp.addr_locked_by_successor(index);
                let old = pmp.read_addr_raw(index);
                let new = (old as u32 & !mask | value & mask) as u64;
                pmp.write_addr_raw(index, new, locked);
            }
            //
            // Debug trigger module
            //
            csr::TSELECT => self
                .triggers
                .get_mut(allocator)
                .select(((self.triggers.get(allocator).selected() as u32 & !mask) | (value & mask)) as u64),
            csr::TDATA1 => {
                let triggers = self.triggers.get_mut(allocator);
                let old = triggers.current().read_tdata1(32);
                let new = (old as u32 & !mask | value & mask) as u64;
                triggers.current_mut().write_tdata1(new, 32);
            }
            csr::TDATA2 => {
                let triggers = self.triggers.get_mut(allocator);
                let old = triggers.current().read_tdata2();
                triggers
                    .current_mut()
                    .write_tdata2((old as u32 & !mask | value & mask) as u64);
            }
            csr::TDATA3 => {
                let triggers = self.triggers.get_mut(allocator);
                let old = triggers.current().read_tdata3();
                triggers
                    .current_mut()
                    .write_tdata3((old as u32 & !mask | value & mask) as u64);
            }
            csr::TINFO | csr::TCONTROL => {}
            //
            // Debug Mode
            //
            csr::DCSR => {
                // Only `prv` is writable in this simulator; `cause`/`debugver` are read-only
                // outcomes of how Debug Mode was entered.
                if mask & 0b11 != 0 {
                    let raw = RawPrivilegeLevel::from_u2((value & 0b11) as u8);
                    if let Ok(prv) = PrivilegeLevel::try_from(raw) {
                        self.debug.get_mut(allocator).prv = prv;
                    }
                }
            }
            csr::DPC => {
                let debug = self.debug.get_mut(allocator);
                debug.dpc = debug.dpc & !mask | value & mask;
            }
            //
            // Hypervisor and VS-mode
            //
            csr::HSTATUS => self.hypervisor.get_mut(allocator).write_hstatus(value, mask),
            csr::HEDELEG => self.hypervisor.get_mut(allocator).write_hedeleg(value, mask),
            csr::HIDELEG => self.hypervisor.get_mut(allocator).write_hideleg(value, mask),
            csr::HVIP => self.hypervisor.get_mut(allocator).write_hvip(value, mask),
            csr::HIP => self.hypervisor.get_mut(allocator).write_hip(value, mask),
            csr::HIE => self.hypervisor.get_mut(allocator).write_hie(value, mask),
            csr::HGEIP => {}
            csr::HGEIE => self.hypervisor.get_mut(allocator).write_hgeie(value, mask),
            csr::HCOUNTEREN => self
                .hypervisor
                .get_mut(allocator)
                .write_hcounteren(value, mask),
            csr::HTIMEDELTA => self
                .hypervisor
                .get_mut(allocator)
                .write_htimedelta(value, mask),
            csr::HTIMEDELTAH => self
                .hypervisor
                .get_mut(allocator)
                .write_htimedeltah(value, mask),
            csr::HTVAL => self.hypervisor.get_mut(allocator).write_htval(value, mask),
            csr::HTINST => self.hypervisor.get_mut(allocator).write_htinst(value, mask),
            csr::HCONTEXT => self
                .hypervisor
                .get_mut(allocator)
                .write_hcontext(value, mask),
            csr::HENVCFG => self.hypervisor.get_mut(allocator).write_henvcfg(value, mask),
            csr::HENVCFGH => self
                .hypervisor
                .get_mut(allocator)
                .write_henvcfgh(value, mask),
            csr::HGATP => self.hypervisor.get_mut(allocator).write_hgatp(value, mask),
            csr::VSSTATUS => self
                .hypervisor
                .get_mut(allocator)
                .write_vsstatus(value, mask),
            csr::VSIE => self.hypervisor.get_mut(allocator).write_vsie(value, mask),
            csr::VSTVEC => self.hypervisor.get_mut(allocator).write_vstvec(value, mask),
            csr::VSSCRATCH => self
                .hypervisor
                .get_mut(allocator)
                .write_vsscratch(value, mask),
            csr::VSEPC => self.hypervisor.get_mut(allocator).write_vsepc(value, mask),
            csr::VSCAUSE => self
                .hypervisor
                .get_mut(allocator)
                .write_vscause(value, mask),
            csr::VSTVAL => self.hypervisor.get_mut(allocator).write_vstval(value, mask),
            csr::VSIP => self.hypervisor.get_mut(allocator).write_vsip(value, mask),
            csr::VSATP => self.hypervisor.get_mut(allocator).write_vsatp(value, mask),
            //
            // Smrnmi
            //
            csr::MNSTATUS => self
                .hypervisor
                .get_mut(allocator)
                .write_mnstatus(value, mask),
            csr::MNEPC => self.hypervisor.get_mut(allocator).write_mnepc(value, mask),
            csr::MNCAUSE => self
                .hypervisor
                .get_mut(allocator)
                .write_mncause(value, mask),
            csr::MNSCRATCH => self
                .hypervisor
                .get_mut(allocator)
                .write_mnscratch(value, mask),
            //
            // Smaia/Ssaia indirect CSR access
            //
            csr::MISELECT => self
                .hypervisor
                .get_mut(allocator)
                .write_miselect(value, mask),
            csr::MIREG => self.hypervisor.get_mut(allocator).write_mireg(value, mask),
            csr::MVIEN => self.hypervisor.get_mut(allocator).write_mvien(value, mask),
            csr::MVIP => self.hypervisor.get_mut(allocator).write_mvip(value, mask),
            csr::SISELECT => self
                .hypervisor
                .get_mut(allocator)
                .write_siselect(value, mask),
            csr::SIREG => self.hypervisor.get_mut(allocator).write_sireg(value, mask),
            csr::VSISELECT => self
                .hypervisor
                .get_mut(allocator)
                .write_vsiselect(value, mask),
            csr::VSIREG => self.hypervisor.get_mut(allocator).write_vsireg(value, mask),
            _ => Err(CsrAccessError::CsrUnsupported(specifier))?,
        }
        Ok(())
    }

    /// Writes one byte of a `pmpcfgN` register into the packed `pmpcfg` array; see
    /// [`Self::read_pmpcfg`] for the RV64 odd-register-doesn't-exist rule.
    fn write_pmpcfg(&self, allocator: &mut A, n: u32, value: u32, mask: u32) {
        if self.config.xlen == Xlen::Rv64 && n % 2 == 1 {
            return;
        }
        let pmp = self.pmp.get_mut(allocator);
        for i in 0..4 {
            let byte_mask = (mask >> (i * 8)) as u8;
            if byte_mask == 0 {
                continue;
            }
            let index = (n * 4 + i) as usize;
            let old = pmp.read_cfg_byte(index);
            let new_byte = (value >> (i * 8)) as u8;
            pmp.write_cfg_byte(index, old & !byte_mask | new_byte & byte_mask);
        }
    }

    fn check_csr_access(
        &self,
        allocator: &A,
        specifier: CsrSpecifier,
        privilege_level: PrivilegeLevel,
    ) -> Result<(), CsrAccessError> {
        if !csr::is_valid(specifier) {
            return Err(CsrAccessError::CsrUnsupported(specifier));
        }
        if matches!(specifier, csr::FFLAGS | csr::FRM | csr::FCSR) && !self.fp_accessible(allocator)
        {
            return Err(CsrAccessError::CsrUnsupported(specifier));
        }
        if matches!(
            specifier,
            csr::VSTART | csr::VXSAT | csr::VXRM | csr::VCSR | csr::VL | csr::VTYPE | csr::VLENB
        ) && !self.v_accessible(allocator)
        {
            return Err(CsrAccessError::CsrUnsupported(specifier));
        }
        if matches!(
            specifier,
            csr::HSTATUS
                | csr::HEDELEG
                | csr::HIDELEG
                | csr::HVIP
                | csr::HIP
                | csr::HIE
                | csr::HGEIP
                | csr::HGEIE
                | csr::HCOUNTEREN
                | csr::HTIMEDELTA
                | csr::HTIMEDELTAH
                | csr::HTVAL
                | csr::HTINST
                | csr::HCONTEXT
                | csr::HENVCFG
                | csr::HENVCFGH
                | csr::HGATP
                | csr::VSSTATUS
                | csr::VSIE
                | csr::VSTVEC
                | csr::VSSCRATCH
                | csr::VSEPC
                | csr::VSCAUSE
                | csr::VSTVAL
                | csr::VSIP
                | csr::VSATP
                | csr::MNSTATUS
                | csr::MNEPC
                | csr::MNCAUSE
                | csr::MNSCRATCH
                | csr::MISELECT
                | csr::MIREG
                | csr::MVIEN
                | csr::MVIP
                | csr::SISELECT
                | csr::SIREG
                | csr::VSISELECT
                | csr::VSIREG
        ) && !self.h_accessible(allocator)
        {
            return Err(CsrAccessError::CsrUnsupported(specifier));
        }
        let required_level = csr::required_privilege_level(specifier);
        if privilege_level < required_level {
            return Err(CsrAccessError::Privileged {
                specifier,
                required_level,
                actual_level: privilege_level,
            });
        }
        Ok(())
    }

    /// Whether FP-class instructions and CSRs are currently usable: the F extension must be
    /// configured in, and `mstatus.FS` must not be `Off`.
    fn fp_accessible(&self, allocator: &A) -> bool {
        self.config.f_enabled && self.status.get(allocator).fs() != status::ExtensionContextStatus::Off
    }

    /// Whether vector-class instructions and CSRs are currently usable: the V extension must be
    /// configured in, and `mstatus.VS` must not be `Off`.
    fn v_accessible(&self, allocator: &A) -> bool {
        self.config.v_enabled && self.status.get(allocator).vs() != status::ExtensionContextStatus::Off
    }

    /// Whether hypervisor-class instructions and CSRs are currently usable: the H extension must
    /// be configured in. Unlike F/V there is no `mstatus` context-status bit gating H.
    fn h_accessible(&self, _allocator: &A) -> bool {
        self.config.h_enabled
    }

    /// Performs a read of the memory-mapped mtime CSR.
    pub fn read_mtime(&self, allocator: &mut A) -> u64 {
        let mut buf = [0u8; 8];
        self.system_bus
            .read(&mut buf, allocator, self.config.mtime_address);
        u64::from_le_bytes(buf)
    }

    /// Performs a read of the memory-mapped mtimecmp CSR.
    pub fn read_mtimecmp(&self, allocator: &mut A) -> u64 {
        let mut buf = [0u8; 8];
        self.system_bus
            .read(&mut buf, allocator, self.config.mtimecmp_address);
        u64::from_le_bytes(buf)
    }

    /// Provides an access wrapper around the system bus to address it as memory from this core's
    /// point of view.
    ///
    /// This takes into account the core's current privilege level, its memory mapping (i.e. which
    /// regions can be accessed), its configuration (e.g. whether misaligned memory accesses are
    /// supported), etc.
    pub fn mmu(&self) -> Mmu<A, B> {
        Mmu { core: self }
    }

    /// Arms a one-shot fault injection for testing: the next `kind` access whose element index
    /// and (virtual) address match `elem_ix`/`addr` raises `cause` instead of performing the real
    /// access, regardless of whether that access would otherwise have succeeded. The injection is
    /// consumed after that one matching attempt.
    ///
    /// `elem_ix` identifies which element of a (potentially multi-element, e.g. vector) access the
    /// injection targets; ordinary scalar loads and fetches are always element `0`.
    ///
    /// Returns `false` without arming anything if `cause` is not a valid exception code for
    /// `kind` (e.g. requesting [`InjectionKind::Load`] with the store/AMO access-fault code).
    pub fn inject_exception(
        &self,
        allocator: &mut A,
        kind: InjectionKind,
        cause: u32,
        elem_ix: u32,
        addr: u32,
    ) -> bool {
        let Some(cause) = Exception::for_injection(kind, cause, addr) else {
            return false;
        };
        *self.injected_exception.get_mut(allocator) = Some(InjectedException {
            kind,
            cause,
            elem_ix,
            addr,
        });
        true
    }

    /// Consumes a pending injected exception if it matches `kind`, `elem_ix` and `addr`.
    fn take_injected_exception(
        &self,
        allocator: &mut A,
        kind: InjectionKind,
        elem_ix: u32,
        addr: u32,
    ) -> Option<Exception> {
        let slot = self.injected_exception.get_mut(allocator);
        let matches = matches!(
            slot,
            Some(injected)
                if injected.kind == kind && injected.elem_ix == elem_ix && injected.addr == addr
        );
        matches.then(|| slot.take().unwrap().cause)
    }

    /// Clears every write log that accumulates over a step, so a fresh traced step starts from an
    /// empty slate. Called at the top of both [`Self::step`] and [`Self::step_with`], since
    /// `step`'s early-return trigger-check path never reaches `step_with`.
    fn begin_step(&self, allocator: &mut A) {
        self.registers_mut(allocator).clear_write_log();
        self.fp_registers_mut(allocator).clear_write_log();
        self.vector_registers_mut(allocator).clear_write_log();
        self.csr_write_log.get_mut(allocator).clear();
        self.trap_csr_write_log.get_mut(allocator).clear();
        self.memory_write_log.get_mut(allocator).clear();
    }

    /// Gathers the write logs accumulated since the last [`Self::begin_step`] into a
    /// [`TraceRecord`], inferring the step's outcome from them. `was_in_debug_mode` is the hart's
    /// Debug Mode state *before* the step ran, so a step that was already halted (a no-op) isn't
    /// mistaken for one that just entered Debug Mode.
    fn collect_trace_record(&self, allocator: &A, pc: u32, was_in_debug_mode: bool) -> TraceRecord {
        let outcome = if !was_in_debug_mode && self.in_debug_mode(allocator) {
            StepOutcome::EnteredDebug
        } else if !self.trap_csr_write_log.get(allocator).is_empty() {
            StepOutcome::Trapped
        } else {
            StepOutcome::Retired
        };
        let mut register_writes = Vec::new();
        register_writes.extend(
            self.registers(allocator)
                .write_log()
                .iter()
                .map(|&(specifier, previous)| RegisterWrite::Int(specifier, previous)),
        );
        register_writes.extend(
            self.fp_registers(allocator)
                .write_log()
                .iter()
                .map(|&(specifier, previous)| RegisterWrite::Fp(specifier, previous)),
        );
        register_writes.extend(
            self.vector_registers(allocator)
                .write_log()
                .iter()
                .map(|&(specifier, elem_index, width, previous)| {
                    RegisterWrite::Vector(specifier, elem_index, width, previous)
                }),
        );
        let mut csr_writes: Vec<CsrWrite> = self
            .csr_write_log
            .get(allocator)
            .iter()
            .map(|&(specifier, previous_value)| CsrWrite {
                specifier,
                previous_value,
                caused_by_trap: false,
            })
            .collect();
        csr_writes.extend(self.trap_csr_write_log.get(allocator).iter().map(
            |&(specifier, previous_value)| CsrWrite {
                specifier,
                previous_value,
                caused_by_trap: true,
            },
        ));
        let memory_writes = self
            .memory_write_log
            .get(allocator)
            .iter()
            .map(|(address, previous)| MemoryWrite {
                address: *address,
                previous: previous.clone(),
            })
            .collect();
        TraceRecord {
            pc,
            outcome,
            register_writes,
            csr_writes,
            memory_writes,
        }
    }

    /// Fetch the next instruction at pc and execute. A no-op while the hart is halted in Debug
    /// Mode; see [`Self::in_debug_mode`]/[`Self::resume_from_debug_mode`].
    pub fn step(&self, allocator: &mut A) {
        self.begin_step(allocator);
        if self.in_debug_mode(allocator) {
            return;
        }
        let pc = self.registers(allocator).pc() as u32;
        let privilege_mode = self.privilege_mode(allocator);
        if let Some(action) = self.triggers.get(allocator).check_address(
            pc as u64,
            trigger::AccessMask {
                execute: true,
                load: false,
                store: false,
            },
            privilege_mode,
        ) {
            match action {
                trigger::TriggerAction::Breakpoint => {
                    self.trap(allocator, Exception::Breakpoint.into())
                }
                trigger::TriggerAction::EnterDebug => {
                    self.enter_debug_mode(allocator, DCSR_CAUSE_TRIGGER)
                }
            }
            return;
        }
        let raw_instruction = self.fetch_instruction(allocator, pc);
        self.step_with_raw(allocator, raw_instruction);
    }

    /// Execute a single (raw) instruction.
    pub fn step_with_raw(&self, allocator: &mut A, raw_instruction: ExecutionResult<u32>) {
        let instruction = raw_instruction.and_then(|raw| {
            Instruction::decode(raw).map_err(|_| Exception::IllegalInstruction(Some(raw)))
        });
        self.step_with(allocator, instruction);
    }

    /// Execute a single (decoded) instruction.
    pub fn step_with(&self, allocator: &mut A, instruction: ExecutionResult<Instruction>) {
        self.begin_step(allocator);
        let exception = instruction
            .and_then(|instruction| self.execute_instruction(allocator, instruction))
            .err();

        let counters = self.counters.get_mut(allocator);
        counters.increment_cycle();
        // ECALL and EBREAK are not considered to retire.
        // Similarly, if the instruction fetch failed, then instret should not be incremented.
        let retired = !matches!(instruction, Ok(Instruction::Ecall | Instruction::Ebreak) | Err(_));
        if retired {
            counters.increment_instret();
        }

        // Instruction-count triggers only watch retired instructions that didn't themselves
        // except; a trapping instruction is reported through its own exception instead.
        let privilege_mode = self.privilege_mode(allocator);
        let icount_action = (retired && exception.is_none())
            .then(|| self.triggers.get_mut(allocator).tick_icount(privilege_mode))
            .flatten();

        match (exception, icount_action) {
            (Some(exception), _) => self.trap(allocator, exception.into()),
            (None, Some(trigger::TriggerAction::Breakpoint)) => {
                self.trap(allocator, Exception::Breakpoint.into())
            }
            (None, Some(trigger::TriggerAction::EnterDebug)) => {
                self.enter_debug_mode(allocator, DCSR_CAUSE_TRIGGER)
            }
            (None, None) => {}
        }
    }

    /// Like [`Self::step`], but hands a [`TraceRecord`] of everything the step wrote to `sink`.
    pub fn step_traced(&self, allocator: &mut A, sink: &mut impl TraceSink) {
        let pc = self.registers(allocator).pc() as u32;
        let was_in_debug_mode = self.in_debug_mode(allocator);
        self.step(allocator);
        sink.record(self.collect_trace_record(allocator, pc, was_in_debug_mode));
    }

    /// Like [`Self::step_with_raw`], but hands a [`TraceRecord`] of everything the step wrote to
    /// `sink`.
    pub fn step_with_raw_traced(
        &self,
        allocator: &mut A,
        raw_instruction: ExecutionResult<u32>,
        sink: &mut impl TraceSink,
    ) {
        let pc = self.registers(allocator).pc() as u32;
        let was_in_debug_mode = self.in_debug_mode(allocator);
        self.step_with_raw(allocator, raw_instruction);
        sink.record(self.collect_trace_record(allocator, pc, was_in_debug_mode));
    }

    /// Like [`Self::step_with`], but hands a [`TraceRecord`] of everything the step wrote to
    /// `sink`.
    pub fn step_with_traced(
        &self,
        allocator: &mut A,
        instruction: ExecutionResult<Instruction>,
        sink: &mut impl TraceSink,
    ) {
        let pc = self.registers(allocator).pc() as u32;
        let was_in_debug_mode = self.in_debug_mode(allocator);
        self.step_with(allocator, instruction);
        sink.record(self.collect_trace_record(allocator, pc, was_in_debug_mode));
    }

    /// Steps forever, handing a [`TraceRecord`] to `sink` after every step.
    ///
    /// There is no built-in stopping condition: callers that want to stop on a trap or on
    /// entering Debug Mode should inspect [`TraceRecord::outcome`] from within their sink and break
    /// out some other way (e.g. a sink that also sets a flag the caller polls), or use
    /// [`Self::run_until_traced`] for the common "run until this address" case.
    pub fn run_traced(&self, allocator: &mut A, sink: &mut impl TraceSink) -> ! {
        loop {
            self.step_traced(allocator, sink);
        }
    }

    /// Steps until the PC reaches `address` (checked before each step, so a hart already sitting
    /// on `address` performs zero steps), handing a [`TraceRecord`] to `sink` after every step that
    /// does run.
    pub fn run_until_traced(&self, allocator: &mut A, address: u32, sink: &mut impl TraceSink) {
        while self.registers(allocator).pc() as u32 != address {
            self.step_traced(allocator, sink);
        }
    }

    /// Execute a single (raw) instruction.
    ///
    /// This is not the same as [`Self::step_with_raw`]! This only takes care of executing the
    /// instruction-specific operations, such as updating `x` registers, updating memory, updating
    /// the `pc` register, and depending on the instruction also updating CSRs. However, additional
    /// state updates that normally happen at a tick, such as incrementing the appropriate counters,
    /// are not performed.
    ///
    /// This can be useful for executing the operation defined by an instruction, without actually
    /// progressing general execution. If used for this scenario, consider first decrementing the
    /// `pc` register by `4` so that the current instruction is in fact treated as the next, which
    /// will ensure the `pc` register will be as expected after executing the instruction. Take into
    /// account that this influences jump/branch targets.
    ///
    /// # Unspecified behavior
    ///
    /// > The behavior upon decoding a reserved instruction is UNSPECIFIED.
    ///
    /// This implementation chooses to raise an [`Exception::IllegalInstruction`] when
    /// `raw_instruction` has a reserved opcode.
    pub fn execute_raw_instruction(
        &self,
        allocator: &mut A,
        raw_instruction: u32,
    ) -> ExecutionResult {
        let instruction = Instruction::decode(raw_instruction)
            .map_err(|_| Exception::IllegalInstruction(Some(raw_instruction)))?;
        self.execute_instruction(allocator, instruction)
            .map_err(|err| match err {
                Exception::IllegalInstruction(None) => {
                    Exception::IllegalInstruction(Some(raw_instruction))
                }
                err => err,
            })
    }

    /// Execute a single (decoded) instruction.
    ///
    /// Performs the same operation as [`Self::execute_raw_instruction`], but takes an already
    /// decoded instruction.
    ///
    /// Note that this is not the same as [`Self::step_with`]!
    /// See [`Self::execute_raw_instruction`] for why.
    pub fn execute_instruction(
        &self,
        allocator: &mut A,
        instruction: Instruction,
    ) -> ExecutionResult {
        let mut executor = Executor {
            allocator,
            core: self,
        };
        match instruction {
            Instruction::OpImm {
                op,
                dest,
                src,
                immediate,
            } => {
                let op = match op {
                    RegImmOp::Addi => Executor::addi,
                    RegImmOp::Slti => Executor::slti,
                    RegImmOp::Sltiu => Executor::sltiu,
                    RegImmOp::Xori => Executor::xori,
                    RegImmOp::Ori => Executor::ori,
                    RegImmOp::Andi => Executor::andi,
                };
                op(&mut executor, dest, src, immediate)
            }
            Instruction::OpShiftImm {
                op,
                dest,
                src,
                shift_amount_u5,
            } => {
                let op = match op {
                    RegShiftImmOp::Slli => Executor::slli,
                    RegShiftImmOp::Srli => Executor::srli,
                    RegShiftImmOp::Srai => Executor::srai,
                    RegShiftImmOp::Rori => Executor::rori,
                    RegShiftImmOp::Bclri => Executor::bclri,
                    RegShiftImmOp::Bexti => Executor::bexti,
                    RegShiftImmOp::Binvi => Executor::binvi,
                    RegShiftImmOp::Bseti => Executor::bseti,
                };
                op(&mut executor, dest, src, shift_amount_u5)
            }
            Instruction::OpUnary { op, dest, src } => {
                let op = match op {
                    UnaryOp::Clz => Executor::clz,
                    UnaryOp::Ctz => Executor::ctz,
                    UnaryOp::Cpop => Executor::cpop,
                    UnaryOp::SextB => Executor::sext_b,
                    UnaryOp::SextH => Executor::sext_h,
                    UnaryOp::OrcB => Executor::orc_b,
                    UnaryOp::Rev8 => Executor::rev8,
                };
                op(&mut executor, dest, src)
            }
            Instruction::Auipc { dest, immediate } => executor.auipc(dest, immediate),
            Instruction::Lui { dest, immediate } => executor.lui(dest, immediate),
            Instruction::Amo {
                op,
                aq: _,
                rl: _,
                src,
                addr,
                dest,
            } => {
                let op = match op {
                    AmoOp::Lr => Executor::lr,
                    AmoOp::Sc => Executor::sc,
                    AmoOp::Swap => Executor::amoswap,
                    AmoOp::Add => Executor::amoadd,
                    AmoOp::Xor => Executor::amoxor,
                    AmoOp::And => Executor::amoand,
                    AmoOp::Or => Executor::amoor,
                    AmoOp::Min => Executor::amomin,
                    AmoOp::Max => Executor::amomax,
                    AmoOp::Minu => Executor::amominu,
                    AmoOp::Maxu => Executor::amomaxu,
                };
                op(&mut executor, dest, src, addr)
            }
            Instruction::Op {
                op,
                dest,
                src1,
                src2,
            } => {
                let op = match op {
                    RegRegOp::Add => Executor::add,
                    RegRegOp::Slt => Executor::slt,
                    RegRegOp::Sltu => Executor::sltu,
                    RegRegOp::And => Executor::and,
                    RegRegOp::Or => Executor::or,
                    RegRegOp::Xor => Executor::xor,
                    RegRegOp::Sll => Executor::sll,
                    RegRegOp::Srl => Executor::srl,
                    RegRegOp::Sub => Executor::sub,
                    RegRegOp::Sra => Executor::sra,
                    RegRegOp::Mul => Executor::mul,
                    RegRegOp::Mulh => Executor::mulh,
                    RegRegOp::Mulhsu => Executor::mulhsu,
                    RegRegOp::Mulhu => Executor::mulhu,
                    RegRegOp::Div => Executor::div,
                    RegRegOp::Divu => Executor::divu,
                    RegRegOp::Rem => Executor::rem,
                    RegRegOp::Remu => Executor::remu,
                    RegRegOp::Sh1add => Executor::sh1add,
                    RegRegOp::Sh2add => Executor::sh2add,
                    RegRegOp::Sh3add => Executor::sh3add,
                    RegRegOp::Andn => Executor::andn,
                    RegRegOp::Orn => Executor::orn,
                    RegRegOp::Xnor => Executor::xnor,
                    RegRegOp::Max => Executor::max,
                    RegRegOp::Maxu => Executor::maxu,
                    RegRegOp::Min => Executor::min,
                    RegRegOp::Minu => Executor::minu,
                    RegRegOp::Rol => Executor::rol,
                    RegRegOp::Ror => Executor::ror,
                    RegRegOp::ZextH => Executor::zext_h,
                    RegRegOp::Bclr => Executor::bclr,
                    RegRegOp::Bext => Executor::bext,
                    RegRegOp::Binv => Executor::binv,
                    RegRegOp::Bset => Executor::bset,
                    RegRegOp::CzeroEqz => Executor::czero_eqz,
                    RegRegOp::CzeroNez => Executor::czero_nez,
                };
                op(&mut executor, dest, src1, src2)
            }
            Instruction::Jal { dest, offset } => executor.jal(dest, offset),
            Instruction::Jalr { dest, base, offset } => executor.jalr(dest, base, offset),
            Instruction::Branch {
                condition,
                src1,
                src2,
                offset,
            } => {
                let op = match condition {
                    BranchCondition::Beq => Executor::beq,
                    BranchCondition::Bne => Executor::bne,
                    BranchCondition::Blt => Executor::blt,
                    BranchCondition::Bltu => Executor::bltu,
                    BranchCondition::Bge => Executor::bge,
                    BranchCondition::Bgeu => Executor::bgeu,
                };
                op(&mut executor, src1, src2, offset)
            }
            Instruction::Load {
                width,
                dest,
                base,
                offset,
            } => {
                let op = match width {
                    LoadWidth::Lb => Executor::lb,
                    LoadWidth::Lh => Executor::lh,
                    LoadWidth::Lw => Executor::lw,
                    LoadWidth::Lbu => Executor::lbu,
                    LoadWidth::Lhu => Executor::lhu,
                };
                op(&mut executor, dest, base, offset)
            }
            Instruction::Store {
                width,
                src,
                base,
                offset,
            } => {
                let op = match width {
                    StoreWidth::Sb => Executor::sb,
                    StoreWidth::Sh => Executor::sh,
                    StoreWidth::Sw => Executor::sw,
                };
                op(&mut executor, src, base, offset)
            }
            Instruction::Fence {
                predecessor,
                successor,
            } => executor.fence(predecessor, successor),
            Instruction::FenceI => executor.fence_i(),
            Instruction::CacheBlockManagement { op, base } => {
                executor.cache_block_management(op, base)
            }
            Instruction::CacheBlockZero { base } => executor.cache_block_zero(base),
            Instruction::Ecall => executor.ecall(),
            Instruction::Ebreak => executor.ebreak(),
            Instruction::Sret => executor.sret(),
            Instruction::Mret => executor.mret(),
            Instruction::Wfi => executor.wfi(),
            Instruction::WrsNto => executor.wrs(),
            Instruction::WrsSto => executor.wrs(),
            Instruction::SfenceVma { vaddr, asid } => executor.sfence_vma(vaddr, asid),
            Instruction::HfenceVvma { vaddr, asid } => executor.hfence_vvma(vaddr, asid),
            Instruction::HfenceGvma { gaddr, vmid } => executor.hfence_gvma(gaddr, vmid),
            Instruction::HlvB {
                dest,
                base,
                unsigned,
            } => executor.hlv_b(dest, base, unsigned),
            Instruction::HlvH {
                dest,
                base,
                unsigned,
            } => executor.hlv_h(dest, base, unsigned),
            Instruction::HlvW { dest, base } => executor.hlv_w(dest, base),
            Instruction::HsvB { src, base } => executor.hsv_b(src, base),
            Instruction::HsvH { src, base } => executor.hsv_h(src, base),
            Instruction::HsvW { src, base } => executor.hsv_w(src, base),
            Instruction::Csr { op, dest, csr, src } => {
                let op = match op {
                    CsrOp::ReadWrite => Executor::csrrw,
                    CsrOp::ReadSet => Executor::csrrs,
                    CsrOp::ReadClear => Executor::csrrc,
                };
                op(&mut executor, dest, csr, src)
            }
            Instruction::Csri {
                op,
                dest,
                csr,
                immediate,
            } => {
                let op = match op {
                    CsrOp::ReadWrite => Executor::csrrwi,
                    CsrOp::ReadSet => Executor::csrrsi,
                    CsrOp::ReadClear => Executor::csrrci,
                };
                op(&mut executor, dest, csr, immediate)
            }
            Instruction::FpLoad {
                format,
                dest,
                base,
                offset,
            } => executor.fp_load(format, dest, base, offset),
            Instruction::FpStore {
                format,
                src,
                base,
                offset,
            } => executor.fp_store(format, src, base, offset),
            Instruction::FpOp {
                op,
                format,
                dest,
                src1,
                src2,
                rounding_mode,
            } => executor.fp_op(op, format, dest, src1, src2, rounding_mode),
            Instruction::FpSqrt {
                format,
                dest,
                src,
                rounding_mode,
            } => executor.fp_sqrt(format, dest, src, rounding_mode),
            Instruction::FpFma {
                op,
                format,
                dest,
                src1,
                src2,
                src3,
                rounding_mode,
            } => executor.fp_fma(op, format, dest, src1, src2, src3, rounding_mode),
            Instruction::FpCompare {
                op,
                format,
                dest,
                src1,
                src2,
            } => executor.fp_compare(op, format, dest, src1, src2),
            Instruction::FpClassify { format, dest, src } => {
                executor.fp_classify(format, dest, src)
            }
            Instruction::FpToInt {
                format,
                signed,
                dest,
                src,
                rounding_mode,
            } => executor.fp_to_int(format, signed, dest, src, rounding_mode),
            Instruction::FpFromInt {
                format,
                signed,
                dest,
                src,
                rounding_mode,
            } => executor.fp_from_int(format, signed, dest, src, rounding_mode),
            Instruction::FpConvertFormat {
                to,
                from,
                dest,
                src,
                rounding_mode,
            } => executor.fp_convert_format(to, from, dest, src, rounding_mode),
            Instruction::FpMoveToInt { format, dest, src } => {
                executor.fp_move_to_int(format, dest, src)
            }
            Instruction::FpMoveFromInt { format, dest, src } => {
                executor.fp_move_from_int(format, dest, src)
            }
            Instruction::VectorSetVli {
                dest,
                avl_src,
                raw_vtype,
            } => executor.vector_set_vli(dest, avl_src, raw_vtype),
            Instruction::VectorSetIvli {
                dest,
                avl,
                raw_vtype,
            } => executor.vector_set_ivli(dest, avl, raw_vtype),
            Instruction::VectorSetVl {
                dest,
                avl_src,
                vtype_src,
            } => executor.vector_set_vl(dest, avl_src, vtype_src),
            Instruction::VectorLoad {
                eew,
                dest,
                base,
                masked,
            } => executor.vector_load(eew, dest, base, masked),
            Instruction::VectorStore {
                eew,
                src,
                base,
                masked,
            } => executor.vector_store(eew, src, base, masked),
            Instruction::VectorOpIvv {
                op,
                dest,
                vs2,
                vs1,
                masked,
            } => executor.vector_op_ivv(op, dest, vs2, vs1, masked),
        }
    }

    /// "Independent instruction fetch unit"
    ///
    /// > The base RISC-V ISA has fixed-length 32-bit instructions that must be naturally aligned on
    /// > 32-bit boundaries.
    ///
    /// > Instructions are stored in memory as a sequence of 16-bit little-endian parcels,
    /// > regardless of memory system endianness. Parcels forming one instruction are stored at
    /// > increasing halfword addresses, with the lowest-addressed parcel holding the
    /// > lowest-numbered bits in the instruction specification.
    fn fetch_instruction(&self, allocator: &mut A, address: u32) -> Result<u32, Exception> {
        if let Some(exception) =
            self.take_injected_exception(allocator, InjectionKind::Fetch, 0, address)
        {
            return Err(exception);
        }
        let to_exception = |err| match err {
            MemoryError::MisalignedAccess => Exception::InstructionAddressMisaligned(address),
            MemoryError::AccessFault => Exception::InstructionAccessFault(address),
        };

        // Whether a fetch may start at a 2-byte-aligned (rather than 4-byte-aligned) address at
        // all: requires the C extension, and `strict_instruction_alignment` can additionally
        // revoke that leniency (e.g. to make a compressed opcode landing on an odd halfword a
        // misaligned-fetch fault rather than a decode, for configurations that want base-ISA
        // alignment behavior even though the decoder itself understands 16-bit opcodes).
        let halfword_aligned_ok = self.config.c_enabled && !self.config.strict_instruction_alignment;
        let alignment = if halfword_aligned_ok { Alignment::HALFWORD } else { Alignment::WORD };
        if !alignment.is_aligned(address) {
            return Err(Exception::InstructionAddressMisaligned(address));
        }

        if !self.config.c_enabled {
            // No C support at all: every fetch is a single naturally-aligned 32-bit access, and a
            // 16-bit-opcode-shaped word is simply illegal rather than expanded.
            let word = self
                .mmu()
                .fetch_instruction(allocator, address)
                .map_err(to_exception)?;
            if word & 0b11 != 0b11 {
                return Err(Exception::IllegalInstruction(Some(word)));
            }
            self.registers_mut(allocator).set_instruction_length(4);
            return Ok(word);
        }

        // C enabled: fetch one 16-bit parcel at a time. A parcel whose low two bits aren't `0b11`
        // is a complete compressed instruction; otherwise it's the low half of a 32-bit
        // instruction and the high half is fetched (and, on a page-crossing access, translated)
        // separately, so a fault on either half is reported against that half's own address.
        let low = self.mmu().fetch_parcel(allocator, address).map_err(to_exception)?;
        if low & 0b11 != 0b11 {
            let expanded = crate::compressed::expand(low)
                .map_err(|_| Exception::IllegalInstruction(Some(low as u32)))?;
            self.registers_mut(allocator).set_instruction_length(2);
            return Ok(expanded);
        }
        let high_address = address.wrapping_add(2);
        let high = self
            .mmu()
            .fetch_parcel(allocator, high_address)
            .map_err(|err| match err {
                MemoryError::MisalignedAccess => {
                    Exception::InstructionAddressMisaligned(high_address)
                }
                MemoryError::AccessFault => Exception::InstructionAccessFault(high_address),
            })?;
        self.registers_mut(allocator).set_instruction_length(4);
        Ok((low as u32) | ((high as u32) << 16))
    }

    /// Map a virtual byte address to the corresponding physical byte address.
    ///
    /// Helper for [`Mmu`].
    fn translate_address(&self, address: u32) -> u32 {
        // 1-to-1 mapping for now
        address
    }

    fn trap(&self, allocator: &mut A, cause: TrapCause) {
        let pc = self.registers(allocator).pc() as u32;
        let privilege_mode = *self.privilege_mode.get(allocator);
        // Determine if we should be delegating. Note that `delegate == true` does not necessarily
        // mean the trap will be handled in S-mode, since traps that occur while running in M-mode
        // are always handled in M-mode. That check is performed later; see `trap_to_s_mode`.
        let delegate = match cause {
            TrapCause::Exception(exception) => {
                self.control.get(allocator).medeleg.should_delegate(exception)
            }
            TrapCause::Interrupt(interrupt) => {
                self.control.get(allocator).mideleg.should_delegate(interrupt)
            }
        };
        // Determine whether we are trapping into S-mode or M-mode.
        let trap_to_s_mode = match (privilege_mode, delegate) {
            (PrivilegeLevel::Machine, _) | (_, false) => false,
            (_, true) => true,
        };
        // Snapshot the CSRs this trap is about to overwrite, before any of them change, so a
        // traced consumer can tell a trap's own CSR writes apart from the instruction's.
        let trap_state = self.trap.get(allocator);
        let trap_csr_snapshot = match trap_to_s_mode {
            true => [
                (csr::SCAUSE, trap_state.scause.read()),
                (csr::SEPC, trap_state.read_sepc()),
                (csr::STVAL, trap_state.read_stval()),
            ],
            false => [
                (csr::MCAUSE, trap_state.mcause.read()),
                (csr::MEPC, trap_state.read_mepc()),
                (csr::MTVAL, trap_state.read_mtval()),
            ],
        };
        let trap_csr_snapshot_extra =
            (!trap_to_s_mode).then(|| (csr::MTVAL2, trap_state.read_mtval2()));

        let trap = self.trap.get_mut(allocator);
        // Set xcause register.
        match trap_to_s_mode {
            true => trap.scause.set(&cause),
            false => trap.mcause.set(&cause),
        };
        // Set xepc register.
        match trap_to_s_mode {
            true => trap.write_sepc(pc, 0xFFFF_FFFF),
            false => trap.write_mepc(pc, 0xFFFF_FFFF),
        };
        // Write xtval and mtval2 register.
        let tval = match cause {
            TrapCause::Exception(exception) => match exception {
                Exception::IllegalInstruction(raw_instruction) => raw_instruction.unwrap_or(0),
                Exception::Breakpoint => pc,
                Exception::InstructionAddressMisaligned(vaddr)
                | Exception::InstructionAccessFault(vaddr)
                | Exception::LoadAddressMisaligned(vaddr)
                | Exception::StoreOrAmoAddressMisaligned(vaddr)
                | Exception::LoadAccessFault(vaddr)
                | Exception::StoreOrAmoAccessFault(vaddr)
                | Exception::InstructionPageFault(vaddr)
                | Exception::LoadPageFault(vaddr)
                | Exception::StoreOrAmoPageFault(vaddr) => vaddr,
                Exception::EnvironmentCallFromUMode
                | Exception::EnvironmentCallFromSMode
                | Exception::EnvironmentCallFromMMode => 0,
            },
            TrapCause::Interrupt(_) => 0,
        };
        match trap_to_s_mode {
            true => trap.write_stval(tval, 0xFFFF_FFFF),
            false => {
                trap.write_mtval(tval, 0xFFFF_FFFF);
                trap.write_mtval2(0, 0xFFFF_FFFF);
            }
        };
        {
            let log = self.trap_csr_write_log.get_mut(allocator);
            log.extend(trap_csr_snapshot);
            log.extend(trap_csr_snapshot_extra);
        }
        // Determine trap handler address base on xtvec register and cause type.
        let control = self.control.get(allocator);
        let tvec = match trap_to_s_mode {
            true => &control.stvec,
            false => &control.mtvec,
        };
        let trap_handler_address = match (tvec.mode(), &cause) {
            (VectorMode::Vectored, TrapCause::Interrupt(interrupt)) => {
                tvec.base() + 4 * interrupt.code()
            }
            (VectorMode::Vectored, TrapCause::Exception(_)) | (VectorMode::Direct, _) => {
                tvec.base()
            }
        };
        // Set pc to the correct trap handler.
        self.registers_mut(allocator)
            .set_pc(trap_handler_address as u64);
        // Update fields of status register.
        let status = self.status.get_mut(allocator);
        match trap_to_s_mode {
            true => {
                status.set_spie(status.sie());
                status.set_sie(false);
                status.set_spp(privilege_mode.into());
            }
            false => {
                status.set_mpie(status.mie());
                status.set_mie(false);
                status.set_mpp(privilege_mode.into());
            }
        }
        // Update the core's privilege mode.
        *self.privilege_mode.get_mut(allocator) = match trap_to_s_mode {
            true => PrivilegeLevel::Supervisor,
            false => PrivilegeLevel::Machine,
        };
    }
}

impl<A: Allocator, B: SystemBus<A>> Simulatable<A> for Core<A, B> {
    fn tick(&self, allocator: &mut A) {
        self.step(allocator)
    }

    fn drop(self, allocator: &mut A) {
        self.drop(allocator);
    }
}

/// Errors that can occur when attempting to access a CSR.
#[derive(Error, Debug)]
pub enum CsrAccessError {
    #[error("unsupported CSR: {0:#05X}")]
    CsrUnsupported(CsrSpecifier),
    /// Attempt to access a CSR that requires a higher privilege level.
    #[error(
        "cannot access specifier {specifier:#05X} from privilege level {actual_level}, \
             since it requires privilege level {required_level}"
    )]
    Privileged {
        /// The CSR for which access was requested.
        specifier: CsrSpecifier,
        /// The minimum required privilege level to access that CSR.
        required_level: RawPrivilegeLevel,
        /// The actual privilegel level from which the access was performed.
        actual_level: PrivilegeLevel,
    },
}

/// Errors that can occur when attempting to write to a CSR.
#[derive(Error, Debug)]
pub enum CsrWriteError {
    /// A non-write specific access error. See [`CsrAccessError`].
    #[error("{0}")]
    AccessError(CsrAccessError),
    /// Attempt to write to a read-only register.
    #[error("writing to read-only CSR is invalid")]
    WriteToReadOnly,
}

impl From<CsrAccessError> for CsrWriteError {
    fn from(value: CsrAccessError) -> Self {
        Self::AccessError(value)
    }
}

/// Result of executing a single instruction. [`Ok`] if execution went normal, [`Err`] if an
/// exception occurred.
pub type ExecutionResult<T = ()> = Result<T, Exception>;

/// Plain value returned by a CSR group's per-register read helper (e.g.
/// [`status::Status::read_mstatus`][crate::core::status]); the dispatching [`Core::read_csr`]
/// wraps it in `Ok`.
pub type CsrReadResult = u32;

/// Per-register write helpers apply their side effect directly and return nothing; the
/// dispatching [`Core::write_csr`] has already performed the privilege/read-only checks by the
/// time one of these runs, so there is nothing left for an individual helper to fail on.
pub type CsrWriteResult = ();

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Exception {
    /// Instruction address is not on a four-byte aligned boundary in memory.
    ///
    /// The inner value is the faulting virtual address.
    InstructionAddressMisaligned(u32),
    /// The inner value is the faulting virtual address.
    InstructionAccessFault(u32),
    /// Generic exception used to communicate one of many possible scenarios:
    ///
    /// - (*UNSPECIFIED*) Attempt to decode a reserved instruction.
    /// - Attempt to access a non-existent CSR.
    /// - Attempt to access a CSR without the appropriate privilege level.
    /// - Attempt to write to a read-only CSR.
    ///
    /// The inner value is the raw instruction if that data was available.
    IllegalInstruction(Option<u32>),
    Breakpoint,
    /// The inner value is the virtual address of the portion of the access that caused the fault.
    LoadAddressMisaligned(u32),
    /// The inner value is the faulting virtual address.
    LoadAccessFault(u32),
    /// The inner value is the virtual address of the portion of the access that caused the fault.
    StoreOrAmoAddressMisaligned(u32),
    /// The inner value is the faulting virtual address.
    StoreOrAmoAccessFault(u32),
    EnvironmentCallFromUMode,
    EnvironmentCallFromSMode,
    EnvironmentCallFromMMode,
    /// The inner value is the faulting virtual address.
    InstructionPageFault(u32),
    /// The inner value is the faulting virtual address.
    LoadPageFault(u32),
    /// The inner value is the faulting virtual address.
    StoreOrAmoPageFault(u32),
    /// Raised instead of a non-virtualized trap when `V=1` and a privileged instruction that
    /// would trap to HS-mode is executed in VS/VU-mode (e.g. `wfi`/`sret` gated by `hstatus.VTW`/
    /// `VTSR`, or an `hlv`/`hsv` instruction executed outside HS-mode).
    VirtualInstruction(Option<u32>),
    /// Guest-page-fault variants, raised during G-stage translation. The inner value is the
    /// faulting guest-physical address (shifted right by 2, as `mtval2`/`htval` store it).
    InstructionGuestPageFault(u32),
    LoadGuestPageFault(u32),
    VirtualInstructionGuestPageFault,
    StoreOrAmoGuestPageFault(u32),
}

impl Exception {
    pub const INSTRUCTION_ADDRESS_MISALIGNED: u32 = 0;
    pub const INSTRUCTION_ACCESS_FAULT: u32 = 1;
    pub const ILLEGAL_INSTRUCTION: u32 = 2;
    pub const BREAKPOINT: u32 = 3;
    pub const LOAD_ADDRESS_MISALIGNED: u32 = 4;
    pub const LOAD_ACCESS_FAULT: u32 = 5;
    pub const STORE_OR_AMO_ADDRESS_MISALIGNED: u32 = 6;
    pub const STORE_OR_AMO_ACCESS_FAULT: u32 = 7;
    pub const ENVIRONMENT_CALL_FROM_U_MODE: u32 = 8;
    pub const ENVIRONMENT_CALL_FROM_S_MODE: u32 = 9;
    pub const ENVIRONMENT_CALL_FROM_VS_MODE: u32 = 10;
    pub const ENVIRONMENT_CALL_FROM_M_MODE: u32 = 11;
    pub const INSTRUCTION_PAGE_FAULT: u32 = 12;
    pub const LOAD_PAGE_FAULT: u32 = 13;
    pub const STORE_OR_AMO_PAGE_FAULT: u32 = 15;
    pub const INSTRUCTION_GUEST_PAGE_FAULT: u32 = 20;
    pub const LOAD_GUEST_PAGE_FAULT: u32 = 21;
    pub const VIRTUAL_INSTRUCTION: u32 = 22;
    pub const STORE_OR_AMO_GUEST_PAGE_FAULT: u32 = 23;

    /// Returns the exception code (cause) for this exception.
    pub const fn code(&self) -> u32 {
        match self {
            Self::InstructionAddressMisaligned(_) => Self::INSTRUCTION_ADDRESS_MISALIGNED,
            Self::InstructionAccessFault(_) => Self::INSTRUCTION_ACCESS_FAULT,
            Self::IllegalInstruction(_) => Self::ILLEGAL_INSTRUCTION,
            Self::Breakpoint => Self::BREAKPOINT,
            Self::LoadAddressMisaligned(_) => Self::LOAD_ADDRESS_MISALIGNED,
            Self::LoadAccessFault(_) => Self::LOAD_ACCESS_FAULT,
            Self::StoreOrAmoAddressMisaligned(_) => Self::STORE_OR_AMO_ADDRESS_MISALIGNED,
            Self::StoreOrAmoAccessFault(_) => Self::STORE_OR_AMO_ACCESS_FAULT,
            Self::EnvironmentCallFromUMode => Self::ENVIRONMENT_CALL_FROM_U_MODE,
            Self::EnvironmentCallFromSMode => Self::ENVIRONMENT_CALL_FROM_S_MODE,
            Self::EnvironmentCallFromMMode => Self::ENVIRONMENT_CALL_FROM_M_MODE,
            Self::InstructionPageFault(_) => Self::INSTRUCTION_PAGE_FAULT,
            Self::LoadPageFault(_) => Self::LOAD_PAGE_FAULT,
            Self::StoreOrAmoPageFault(_) => Self::STORE_OR_AMO_PAGE_FAULT,
            Self::VirtualInstruction(_) => Self::VIRTUAL_INSTRUCTION,
            Self::InstructionGuestPageFault(_) => Self::INSTRUCTION_GUEST_PAGE_FAULT,
            Self::LoadGuestPageFault(_) => Self::LOAD_GUEST_PAGE_FAULT,
            Self::VirtualInstructionGuestPageFault => Self::VIRTUAL_INSTRUCTION,
            Self::StoreOrAmoGuestPageFault(_) => Self::STORE_OR_AMO_GUEST_PAGE_FAULT,
        }
    }

    /// Builds the exception an [`Core::inject_exception`] call should raise for `kind` and a raw
    /// exception `cause` code, or `None` if `cause` isn't one `kind` can legitimately raise.
    fn for_injection(kind: InjectionKind, cause: u32, addr: u32) -> Option<Self> {
        Some(match (kind, cause) {
            (InjectionKind::Fetch, Self::INSTRUCTION_ADDRESS_MISALIGNED) => {
                Self::InstructionAddressMisaligned(addr)
            }
            (InjectionKind::Fetch, Self::INSTRUCTION_ACCESS_FAULT) => {
                Self::InstructionAccessFault(addr)
            }
            (InjectionKind::Fetch, Self::INSTRUCTION_PAGE_FAULT) => Self::InstructionPageFault(addr),
            (InjectionKind::Fetch, Self::INSTRUCTION_GUEST_PAGE_FAULT) => {
                Self::InstructionGuestPageFault(addr)
            }
            (InjectionKind::Load, Self::LOAD_ADDRESS_MISALIGNED) => {
                Self::LoadAddressMisaligned(addr)
            }
            (InjectionKind::Load, Self::LOAD_ACCESS_FAULT) => Self::LoadAccessFault(addr),
            (InjectionKind::Load, Self::LOAD_PAGE_FAULT) => Self::LoadPageFault(addr),
            (InjectionKind::Load, Self::LOAD_GUEST_PAGE_FAULT) => Self::LoadGuestPageFault(addr),
            (InjectionKind::Store, Self::STORE_OR_AMO_ADDRESS_MISALIGNED) => {
                Self::StoreOrAmoAddressMisaligned(addr)
            }
            (InjectionKind::Store, Self::STORE_OR_AMO_ACCESS_FAULT) => {
                Self::StoreOrAmoAccessFault(addr)
            }
            (InjectionKind::Store, Self::STORE_OR_AMO_PAGE_FAULT) => {
                Self::StoreOrAmoPageFault(addr)
            }
            (InjectionKind::Store, Self::STORE_OR_AMO_GUEST_PAGE_FAULT) => {
                Self::StoreOrAmoGuestPageFault(addr)
            }
            _ => return None,
        })
    }
}

/// Selects which kind of access an [`Core::inject_exception`] call intercepts.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum InjectionKind {
    Fetch,
    Load,
    Store,
}

#[derive(Debug, Clone, Copy)]
struct InjectedException {
    kind: InjectionKind,
    cause: Exception,
    elem_ix: u32,
    addr: u32,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Interrupt {
    SupervisorSoftwareInterrupt,
    MachineSoftwareInterrupt,
    SupervisorTimerInterrupt,
    MachineTimerInterrupt,
    SupervisorExternalInterrupt,
    MachineExternalInterrupt,
    /// Raised to HS-mode (delegatable to VS-mode via `hideleg`) to notify a virtual-supervisor
    /// software interrupt is pending for the currently running guest.
    VirtualSupervisorSoftwareInterrupt,
    VirtualSupervisorTimerInterrupt,
    VirtualSupervisorExternalInterrupt,
    /// Smaia/Ssaia "supervisor guest external interrupt" used to notify HS-mode that one of the
    /// guest external interrupt lines (`hgeip`) has become pending.
    SupervisorGuestExternalInterrupt,
}

impl Interrupt {
    /// Returns the exception code (cause) for this interrupt.
    pub fn code(&self) -> u32 {
        match self {
            Self::SupervisorSoftwareInterrupt => 1,
            Self::VirtualSupervisorSoftwareInterrupt => 2,
            Self::MachineSoftwareInterrupt => 3,
            Self::SupervisorTimerInterrupt => 5,
            Self::VirtualSupervisorTimerInterrupt => 6,
            Self::MachineTimerInterrupt => 7,
            Self::SupervisorExternalInterrupt => 9,
            Self::VirtualSupervisorExternalInterrupt => 10,
            Self::MachineExternalInterrupt => 11,
            Self::SupervisorGuestExternalInterrupt => 12,
        }
    }
}
