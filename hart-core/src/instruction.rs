use crate::core::CsrSpecifier;
use crate::fp_registers::{FpFormat, Specifier as FpSpecifier};
use crate::registers::Specifier;
use crate::vector_registers::Specifier as VSpecifier;
use log::trace;
use thiserror::Error;

/// Data structure that can hold any supported instruction in its decoded form.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Instruction {
    OpImm {
        op: RegImmOp,
        dest: Specifier,
        src: Specifier,
        immediate: i32,
    },
    OpShiftImm {
        op: RegShiftImmOp,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    },
    Auipc {
        dest: Specifier,
        immediate: i32,
    },
    Lui {
        dest: Specifier,
        immediate: i32,
    },
    Amo {
        op: AmoOp,
        aq: bool,
        rl: bool,
        src: Specifier,
        addr: Specifier,
        dest: Specifier,
    },
    Op {
        op: RegRegOp,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
    },
    /// A `Zbb` unary bit-manipulation instruction (`clz`/`ctz`/`cpop`/`sext.b`/`sext.h`/`orc.b`/
    /// `rev8`): encoded at the `OP-IMM` opcode, but carries no register or immediate operand
    /// besides `rs1`/`rd` (the `imm[11:0]` field is a fixed selector, not a value).
    OpUnary {
        op: UnaryOp,
        dest: Specifier,
        src: Specifier,
    },
    Jal {
        dest: Specifier,
        offset: i32,
    },
    Jalr {
        dest: Specifier,
        base: Specifier,
        offset: i32,
    },
    Branch {
        condition: BranchCondition,
        src1: Specifier,
        src2: Specifier,
        offset: i32,
    },
    Load {
        width: LoadWidth,
        dest: Specifier,
        base: Specifier,
        offset: i32,
    },
    Store {
        width: StoreWidth,
        src: Specifier,
        base: Specifier,
        offset: i32,
    },
    Fence {
        predecessor: FenceOrderCombination,
        successor: FenceOrderCombination,
    },
    /// `fence.i` (Zifencei): synchronizes the instruction and data streams. This core never
    /// caches translated instructions across stores, so it is a no-op beyond retiring.
    FenceI,
    /// `cbo.clean`/`cbo.flush`/`cbo.inval` (Zicbom): writes back and/or invalidates the cache
    /// block containing `addr(base)`. This core models memory as flat and always coherent, so
    /// these are no-ops beyond retiring.
    CacheBlockManagement {
        op: CacheBlockOp,
        base: Specifier,
    },
    /// `cbo.zero` (Zicboz): zeroes the cache block containing `addr(base)`.
    CacheBlockZero {
        base: Specifier,
    },
    Ecall,
    Ebreak,
    Sret,
    Mret,
    Wfi,
    /// `wrs.nto` (Zawrs): waits, bounded by an implementation-defined number of retired
    /// instructions, for a store to the reservation set established by the most recent `LR`.
    /// Traps if `mstatus.TW` forbids non-M-mode `wfi`-class waits, mirroring [`Self::Wfi`].
    WrsNto,
    /// `wrs.sto` (Zawrs): as [`Self::WrsNto`], but the implementation-defined bound is intended
    /// to be short enough to be used as a spin-loop backoff rather than a long-lived wait.
    WrsSto,
    SfenceVma {
        vaddr: Specifier,
        asid: Specifier,
    },
    /// `hfence.vvma`: flushes cached VS-stage translations. No-op in this implementation, which
    /// does not cache VS-stage translations at all.
    HfenceVvma {
        vaddr: Specifier,
        asid: Specifier,
    },
    /// `hfence.gvma`: flushes cached G-stage translations. No-op in this implementation, which
    /// does not implement two-stage address translation.
    HfenceGvma {
        gaddr: Specifier,
        vmid: Specifier,
    },
    /// `hlv.b`/`hlv.bu`: loads a byte as if from V=1, HS-mode access. Executes as an ordinary
    /// stage-1-only load in this implementation; see [`Instruction::HfenceGvma`].
    HlvB {
        dest: Specifier,
        base: Specifier,
        unsigned: bool,
    },
    /// `hlv.h`/`hlv.hu`: as [`Instruction::HlvB`], for a halfword.
    HlvH {
        dest: Specifier,
        base: Specifier,
        unsigned: bool,
    },
    /// `hlv.w`: as [`Instruction::HlvB`], for a word.
    HlvW {
        dest: Specifier,
        base: Specifier,
    },
    /// `hsv.b`: stores a byte as if to a V=1, HS-mode access. Executes as an ordinary
    /// stage-1-only store in this implementation.
    HsvB {
        src: Specifier,
        base: Specifier,
    },
    /// `hsv.h`: as [`Instruction::HsvB`], for a halfword.
    HsvH {
        src: Specifier,
        base: Specifier,
    },
    /// `hsv.w`: as [`Instruction::HsvB`], for a word.
    HsvW {
        src: Specifier,
        base: Specifier,
    },
    Csr {
        op: CsrOp,
        dest: Specifier,
        csr: CsrSpecifier,
        src: Specifier,
    },
    Csri {
        op: CsrOp,
        dest: Specifier,
        csr: CsrSpecifier,
        immediate: u32,
    },
    /// `flw`/`fld`: load a floating-point value from memory into `f` register `dest`.
    FpLoad {
        format: FpFormat,
        dest: FpSpecifier,
        base: Specifier,
        offset: i32,
    },
    /// `fsw`/`fsd`: store a floating-point value from `f` register `src` to memory.
    FpStore {
        format: FpFormat,
        src: FpSpecifier,
        base: Specifier,
        offset: i32,
    },
    /// `fadd`/`fsub`/`fmul`/`fdiv`/`fsgnj(n/x)`/`fmin`/`fmax`: a two-operand, same-format
    /// `f`-to-`f` operation.
    FpOp {
        op: FpOp,
        format: FpFormat,
        dest: FpSpecifier,
        src1: FpSpecifier,
        src2: FpSpecifier,
        rounding_mode: RoundingMode,
    },
    /// `fsqrt`.
    FpSqrt {
        format: FpFormat,
        dest: FpSpecifier,
        src: FpSpecifier,
        rounding_mode: RoundingMode,
    },
    /// `fmadd`/`fmsub`/`fnmsub`/`fnmadd`: the fused multiply-add family.
    FpFma {
        op: FpFmaOp,
        format: FpFormat,
        dest: FpSpecifier,
        src1: FpSpecifier,
        src2: FpSpecifier,
        src3: FpSpecifier,
        rounding_mode: RoundingMode,
    },
    /// `feq`/`flt`/`fle`: compares two `f` registers, writing a `0`/`1` result to an `x` register.
    FpCompare {
        op: FpCompareOp,
        format: FpFormat,
        dest: Specifier,
        src1: FpSpecifier,
        src2: FpSpecifier,
    },
    /// `fclass`: classifies the value of an `f` register into an `x` register bitmask.
    FpClassify {
        format: FpFormat,
        dest: Specifier,
        src: FpSpecifier,
    },
    /// `fcvt.w.fmt`/`fcvt.wu.fmt`: converts a floating-point value to a (signed/unsigned) integer.
    FpToInt {
        format: FpFormat,
        signed: bool,
        dest: Specifier,
        src: FpSpecifier,
        rounding_mode: RoundingMode,
    },
    /// `fcvt.fmt.w`/`fcvt.fmt.wu`: converts a (signed/unsigned) integer to a floating-point value.
    FpFromInt {
        format: FpFormat,
        signed: bool,
        dest: FpSpecifier,
        src: Specifier,
        rounding_mode: RoundingMode,
    },
    /// `fcvt.s.d`/`fcvt.d.s`: converts between floating-point formats.
    FpConvertFormat {
        to: FpFormat,
        from: FpFormat,
        dest: FpSpecifier,
        src: FpSpecifier,
        rounding_mode: RoundingMode,
    },
    /// `fmv.x.w`: moves the raw bit pattern of an `f` register into an `x` register.
    FpMoveToInt {
        format: FpFormat,
        dest: Specifier,
        src: FpSpecifier,
    },
    /// `fmv.w.x`: moves the raw bit pattern of an `x` register into an `f` register.
    FpMoveFromInt {
        format: FpFormat,
        dest: FpSpecifier,
        src: Specifier,
    },
    /// `vsetvli`: sets `vtype`/`vl` from an immediate-encoded `vtype` and an AVL read from `x`
    /// register `avl_src`. If `avl_src` is `x0`, the AVL is instead `VLMAX` (when `dest != x0`) or
    /// the current `vl` is preserved (when `dest == x0` too).
    VectorSetVli {
        dest: Specifier,
        avl_src: Specifier,
        raw_vtype: u32,
    },
    /// `vsetivli`: as [`Self::VectorSetVli`], but the AVL is the immediate `avl` itself.
    VectorSetIvli {
        dest: Specifier,
        avl: u32,
        raw_vtype: u32,
    },
    /// `vsetvl`: as [`Self::VectorSetVli`], but the new `vtype` is read from `x` register
    /// `vtype_src` rather than encoded in the instruction.
    VectorSetVl {
        dest: Specifier,
        avl_src: Specifier,
        vtype_src: Specifier,
    },
    /// `vle8.v`/`vle16.v`/`vle32.v`/`vle64.v`: unit-stride vector load into register group `dest`.
    VectorLoad {
        eew: VectorWidth,
        dest: VSpecifier,
        base: Specifier,
        masked: bool,
    },
    /// `vse8.v`/`vse16.v`/`vse32.v`/`vse64.v`: unit-stride vector store from register group `src`.
    VectorStore {
        eew: VectorWidth,
        src: VSpecifier,
        base: Specifier,
        masked: bool,
    },
    /// `vadd.vv`/`vsub.vv`/`vand.vv`/`vor.vv`/`vxor.vv`: the vector-vector (`OPIVV`) integer
    /// arithmetic family. Element width and count come from the current `vtype`/`vl`, not from the
    /// encoding.
    VectorOpIvv {
        op: VectorIntOp,
        dest: VSpecifier,
        vs2: VSpecifier,
        vs1: VSpecifier,
        masked: bool,
    },
}

/// An `OPIVV` integer operation: `vd[i] = vs2[i] op vs1[i]`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VectorIntOp {
    Add,
    Sub,
    And,
    Or,
    Xor,
}

/// The effective element width (`EEW`) of a unit-stride vector load/store, decoded from the
/// instruction's `width` field (which shares its bit position with scalar loads/stores' `funct3`,
/// but uses a different encoding).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum VectorWidth {
    E8,
    E16,
    E32,
    E64,
}

impl VectorWidth {
    pub fn bytes(self) -> usize {
        match self {
            VectorWidth::E8 => 1,
            VectorWidth::E16 => 2,
            VectorWidth::E32 => 4,
            VectorWidth::E64 => 8,
        }
    }
}

/// The two-operand (same format, `f`-to-`f`) floating-point operations sharing the `OP-FP` opcode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FpOp {
    Add,
    Sub,
    Mul,
    Div,
    /// Sign-injection: copies the sign of `src2` onto the magnitude of `src1`.
    SignInject,
    /// Sign-injection negated: copies the inverted sign of `src2`.
    SignInjectNeg,
    /// Sign-injection XOR: copies the XOR of the signs of `src1` and `src2`.
    SignInjectXor,
    Min,
    Max,
}

/// The fused multiply-add family: `op1 * op2 (+/-) op3`, each with a possible negation of the
/// product or the addend.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FpFmaOp {
    /// `(src1 * src2) + src3`.
    Madd,
    /// `(src1 * src2) - src3`.
    Msub,
    /// `-(src1 * src2) + src3`.
    Nmsub,
    /// `-(src1 * src2) - src3`.
    Nmadd,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum FpCompareOp {
    Eq,
    Lt,
    Le,
}

/// The dynamic rounding mode encoded in an instruction's `rm` field (or `frm` when dynamic).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RoundingMode {
    /// Round to Nearest, ties to Even.
    RoundNearestEven,
    /// Round towards Zero.
    RoundTowardZero,
    /// Round Down (towards -∞).
    RoundDown,
    /// Round Up (towards +∞).
    RoundUp,
    /// Round to Nearest, ties to Max Magnitude.
    RoundNearestMaxMagnitude,
    /// Use the rounding mode configured in `frm`.
    Dynamic,
}

impl RoundingMode {
    fn decode(rm: u8) -> Option<Self> {
        match rm {
            0b000 => Some(Self::RoundNearestEven),
            0b001 => Some(Self::RoundTowardZero),
            0b010 => Some(Self::RoundDown),
            0b011 => Some(Self::RoundUp),
            0b100 => Some(Self::RoundNearestMaxMagnitude),
            0b111 => Some(Self::Dynamic),
            _ => None,
        }
    }

    /// Decodes the 3-bit value held in `frm`/`fcsr[7:5]` into a static rounding mode. Unlike
    /// [`Self::decode`], the reserved encoding `0b111` (which instruction `rm` fields use to mean
    /// "consult `frm`") is not meaningful here and is treated as invalid, matching `0b101`/`0b110`.
    pub fn from_frm(frm: u8) -> Option<Self> {
        match Self::decode(frm)? {
            Self::Dynamic => None,
            mode => Some(mode),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegImmOp {
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegShiftImmOp {
    Slli,
    Srli,
    Srai,
    /// `Zbb` `rori`: rotate right by immediate.
    Rori,
    /// `Zbs` `bclri`: clear a single bit selected by immediate.
    Bclri,
    /// `Zbs` `bexti`: extract a single bit selected by immediate.
    Bexti,
    /// `Zbs` `binvi`: invert a single bit selected by immediate.
    Binvi,
    /// `Zbs` `bseti`: set a single bit selected by immediate.
    Bseti,
}

/// `Zbb` unary (no second operand) bit-manipulation operations.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UnaryOp {
    /// Count leading zero bits.
    Clz,
    /// Count trailing zero bits.
    Ctz,
    /// Count set (population) bits.
    Cpop,
    /// Sign-extend the low byte.
    SextB,
    /// Sign-extend the low halfword.
    SextH,
    /// Bitwise OR-combine, byte granule: each output byte is `0xFF` if any bit in the
    /// corresponding input byte is set, else `0x00`.
    OrcB,
    /// Byte-reverse the whole register.
    Rev8,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AmoOp {
    Lr,
    Sc,
    Swap,
    Add,
    Xor,
    And,
    Or,
    Min,
    Max,
    Minu,
    Maxu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum RegRegOp {
    Add,
    Slt,
    Sltu,
    And,
    Or,
    Xor,
    Sll,
    Srl,
    Sub,
    Sra,
    Mul,
    Mulh,
    Mulhsu,
    Mulhu,
    Div,
    Divu,
    Rem,
    Remu,
    /// `Zba` `sh1add`: `(src1 << 1) + src2`.
    Sh1add,
    /// `Zba` `sh2add`: `(src1 << 2) + src2`.
    Sh2add,
    /// `Zba` `sh3add`: `(src1 << 3) + src2`.
    Sh3add,
    /// `Zbb` `andn`: `src1 & ~src2`.
    Andn,
    /// `Zbb` `orn`: `src1 | ~src2`.
    Orn,
    /// `Zbb` `xnor`: `~(src1 ^ src2)`.
    Xnor,
    /// `Zbb` `max`: signed maximum.
    Max,
    /// `Zbb` `maxu`: unsigned maximum.
    Maxu,
    /// `Zbb` `min`: signed minimum.
    Min,
    /// `Zbb` `minu`: unsigned minimum.
    Minu,
    /// `Zbb` `rol`: rotate left by `src2[4:0]`.
    Rol,
    /// `Zbb` `ror`: rotate right by `src2[4:0]`.
    Ror,
    /// `Zbb` `zext.h`: zero-extend the low halfword of `src1` (`src2` is unused, fixed to `x0` by
    /// the encoding).
    ZextH,
    /// `Zbs` `bclr`: clear the bit of `src1` selected by `src2[4:0]`.
    Bclr,
    /// `Zbs` `bext`: extract the bit of `src1` selected by `src2[4:0]`.
    Bext,
    /// `Zbs` `binv`: invert the bit of `src1` selected by `src2[4:0]`.
    Binv,
    /// `Zbs` `bset`: set the bit of `src1` selected by `src2[4:0]`.
    Bset,
    /// `Zicond` `czero.eqz`: `if src2 == 0 { 0 } else { src1 }`.
    CzeroEqz,
    /// `Zicond` `czero.nez`: `if src2 != 0 { 0 } else { src1 }`.
    CzeroNez,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum BranchCondition {
    Beq,
    Bne,
    Blt,
    Bltu,
    Bge,
    Bgeu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoadWidth {
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum StoreWidth {
    Sb,
    Sh,
    Sw,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct FenceOrderCombination {
    pub device_input: bool,
    pub device_output: bool,
    pub memory_reads: bool,
    pub memory_writes: bool,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum CsrOp {
    /// Atomic Read/Write CSR.
    ReadWrite,
    /// Atomic Read and Set Bits in CSR.
    ReadSet,
    /// Atomic Read and Clear Bits in CSR.
    ReadClear,
}

impl Instruction {
    pub fn decode(raw_instruction: u32) -> Result<Self, DecodeError> {
        trace!("Decoding instruction {raw_instruction:#010x}");
        match opcode(raw_instruction).ok_or(DecodeError::UnsupportedOpcode)? {
            Opcode::OpImm => match i_funct(raw_instruction) {
                Some(op) => Ok(Self::OpImm {
                    op,
                    dest: rd(raw_instruction),
                    src: rs1(raw_instruction),
                    immediate: i_imm(raw_instruction),
                }),
                None => match i_shfunct(raw_instruction) {
                    Some(op) => Ok(Self::OpShiftImm {
                        op,
                        dest: rd(raw_instruction),
                        src: rs1(raw_instruction),
                        shift_amount_u5: shamt(raw_instruction),
                    }),
                    None => match unary_funct(raw_instruction) {
                        Some(op) => Ok(Self::OpUnary {
                            op,
                            dest: rd(raw_instruction),
                            src: rs1(raw_instruction),
                        }),
                        None => Err(DecodeError::IllegalInstruction),
                    },
                },
            },
            Opcode::Auipc => Ok(Self::Auipc {
                dest: rd(raw_instruction),
                immediate: u_imm(raw_instruction),
            }),
            Opcode::Lui => Ok(Self::Lui {
                dest: rd(raw_instruction),
                immediate: u_imm(raw_instruction),
            }),
            Opcode::Amo => match amo_op(raw_instruction) {
                Some(op) => Ok(Self::Amo {
                    op,
                    aq: amo_aq(raw_instruction),
                    rl: amo_rl(raw_instruction),
                    src: rs2(raw_instruction),
                    addr: rs1(raw_instruction),
                    dest: rd(raw_instruction),
                }),
                None => Err(DecodeError::IllegalInstruction),
            },
            Opcode::Op => match r_funct(raw_instruction) {
                Some(op) => Ok(Self::Op {
                    op,
                    dest: rd(raw_instruction),
                    src1: rs1(raw_instruction),
                    src2: rs2(raw_instruction),
                }),
                None => Err(DecodeError::IllegalInstruction),
            },
            Opcode::Jal => Ok(Self::Jal {
                dest: rd(raw_instruction),
                offset: j_imm(raw_instruction),
            }),
            Opcode::Jalr => Ok(Self::Jalr {
                dest: rd(raw_instruction),
                base: rs1(raw_instruction),
                offset: i_imm(raw_instruction),
            }),
            Opcode::Branch => match b_funct(raw_instruction) {
                Some(condition) => Ok(Self::Branch {
                    condition,
                    src1: rs1(raw_instruction),
                    src2: rs2(raw_instruction),
                    offset: b_imm(raw_instruction),
                }),
                None => Err(DecodeError::IllegalInstruction),
            },
            Opcode::Load => match i_width(raw_instruction) {
                Some(width) => Ok(Self::Load {
                    width,
                    dest: rd(raw_instruction),
                    base: rs1(raw_instruction),
                    offset: i_imm(raw_instruction),
                }),
                None => Err(DecodeError::IllegalInstruction),
            },
            Opcode::Store => match s_width(raw_instruction) {
                Some(width) => Ok(Self::Store {
                    width,
                    src: rs2(raw_instruction),
                    base: rs1(raw_instruction),
                    offset: s_imm(raw_instruction),
                }),
                None => Err(DecodeError::IllegalInstruction),
            },
            Opcode::MiscMem => {
                match i_mem(raw_instruction) {
                    Some(mem_funct) => match mem_funct {
                        MemFunct::Fence => {
                            let fm = raw_instruction >> 28;
                            let rd = u8::from(rd(raw_instruction));
                            let rs1 = u8::from(rs1(raw_instruction));
                            if fm != 0b0000 || rd != 0 || rs1 != 0 {
                                // All unused fields in the FENCE instruction encoding are reserved
                                // for future use. According to the spec, they should be treated as
                                // normal fence instructions (with fm == 0b0000) for forward
                                // compatibility.
                                //
                                // Note that the current spec defines one more optional encoding
                                // that we don't support: FENCE.TSO, which is encoded by
                                // fm == 0b1000 && predecessor==0b0011 && successor==0b0011
                                // && rs1 == 0 && rd == 0. The spec states this must be treated as
                                // "reserved for future use" if not supported, which again means
                                // treating it as a normal fence instruction (with fm == 0b0000) for
                                // forward compatibility.
                                //
                                // Therefore, there's nothing to be done here. No [`DecodeError`]
                                // that must be returned. We just continue with decoding the
                                // instruction as if fm == 0b0000 && rs1 == 0 && rd == 0.
                            }
                            let predecessor = FenceOrderCombination {
                                device_input: (raw_instruction >> 27) & 0b1 == 1,
                                device_output: (raw_instruction >> 26) & 0b1 == 1,
                                memory_reads: (raw_instruction >> 25) & 0b1 == 1,
                                memory_writes: (raw_instruction >> 24) & 0b1 == 1,
                            };
                            let successor = FenceOrderCombination {
                                device_input: (raw_instruction >> 23) & 0b1 == 1,
                                device_output: (raw_instruction >> 22) & 0b1 == 1,
                                memory_reads: (raw_instruction >> 21) & 0b1 == 1,
                                memory_writes: (raw_instruction >> 20) & 0b1 == 1,
                            };
                            Ok(Self::Fence {
                                predecessor,
                                successor,
                            })
                        }
                        MemFunct::FenceI => Ok(Self::FenceI),
                        MemFunct::CacheBlock => {
                            if is_cbo_zero(raw_instruction) {
                                Ok(Self::CacheBlockZero {
                                    base: rs1(raw_instruction),
                                })
                            } else if let Some(op) = i_cbo(raw_instruction) {
                                Ok(Self::CacheBlockManagement {
                                    op,
                                    base: rs1(raw_instruction),
                                })
                            } else {
                                Err(DecodeError::IllegalInstruction)
                            }
                        }
                    },
                    None => Err(DecodeError::IllegalInstruction),
                }
            }
            Opcode::System => match i_sys(raw_instruction) {
                Some(sys) => match sys {
                    SysFunct::Priv => match sys_priv(raw_instruction) {
                        Some(sys_priv) => Ok(match sys_priv {
                            SysPriv::Ecall => Self::Ecall,
                            SysPriv::Ebreak => Self::Ebreak,
                            SysPriv::Sret => Self::Sret,
                            SysPriv::Mret => Self::Mret,
                            SysPriv::Wfi => Self::Wfi,
                            SysPriv::WrsNto => Self::WrsNto,
                            SysPriv::WrsSto => Self::WrsSto,
                            SysPriv::SfenceVma => Self::SfenceVma {
                                vaddr: rs1(raw_instruction),
                                asid: rs2(raw_instruction),
                            },
                            SysPriv::HfenceVvma => Self::HfenceVvma {
                                vaddr: rs1(raw_instruction),
                                asid: rs2(raw_instruction),
                            },
                            SysPriv::HfenceGvma => Self::HfenceGvma {
                                gaddr: rs1(raw_instruction),
                                vmid: rs2(raw_instruction),
                            },
                        }),
                        None => Err(DecodeError::IllegalInstruction),
                    },
                    SysFunct::HypervisorLoadStore => {
                        h_load_store(raw_instruction).ok_or(DecodeError::IllegalInstruction)
                    }
                    SysFunct::Csrrw | SysFunct::Csrrs | SysFunct::Csrrc => {
                        Ok(Instruction::Csr {
                            op: match sys {
                                SysFunct::Csrrw => CsrOp::ReadWrite,
                                SysFunct::Csrrs => CsrOp::ReadSet,
                                SysFunct::Csrrc => CsrOp::ReadClear,
                                _ => unreachable!(), // Already checked in outer match
                            },
                            dest: rd(raw_instruction),
                            csr: csr(raw_instruction),
                            src: rs1(raw_instruction),
                        })
                    }
                    SysFunct::Csrrwi | SysFunct::Csrrsi | SysFunct::Csrrci => {
                        Ok(Instruction::Csri {
                            op: match sys {
                                SysFunct::Csrrwi => CsrOp::ReadWrite,
                                SysFunct::Csrrsi => CsrOp::ReadSet,
                                SysFunct::Csrrci => CsrOp::ReadClear,
                                _ => unreachable!(), // Already checked in outer match
                            },
                            dest: rd(raw_instruction),
                            csr: csr(raw_instruction),
                            immediate: u32::from(rs1(raw_instruction)),
                        })
                    }
                },
                None => Err(DecodeError::IllegalInstruction),
            },
            Opcode::LoadFp => match fp_load_store_format(raw_instruction) {
                Some(format) => Ok(Self::FpLoad {
                    format,
                    dest: fp_rd(raw_instruction),
                    base: rs1(raw_instruction),
                    offset: i_imm(raw_instruction),
                }),
                None => match (
                    vector_unit_stride_eew(raw_instruction),
                    vector_unit_stride_masked(raw_instruction),
                ) {
                    (Some(eew), Some(masked)) => Ok(Self::VectorLoad {
                        eew,
                        dest: v_rd(raw_instruction),
                        base: rs1(raw_instruction),
                        masked,
                    }),
                    _ => Err(DecodeError::IllegalInstruction),
                },
            },
            Opcode::StoreFp => match fp_load_store_format(raw_instruction) {
                Some(format) => Ok(Self::FpStore {
                    format,
                    src: fp_rs2(raw_instruction),
                    base: rs1(raw_instruction),
                    offset: s_imm(raw_instruction),
                }),
                None => match (
                    vector_unit_stride_eew(raw_instruction),
                    vector_unit_stride_masked(raw_instruction),
                ) {
                    (Some(eew), Some(masked)) => Ok(Self::VectorStore {
                        eew,
                        src: v_rs2(raw_instruction),
                        base: rs1(raw_instruction),
                        masked,
                    }),
                    _ => Err(DecodeError::IllegalInstruction),
                },
            },
            Opcode::Madd | Opcode::Msub | Opcode::Nmsub | Opcode::Nmadd => {
                let op = match opcode(raw_instruction) {
                    Some(Opcode::Madd) => FpFmaOp::Madd,
                    Some(Opcode::Msub) => FpFmaOp::Msub,
                    Some(Opcode::Nmsub) => FpFmaOp::Nmsub,
                    Some(Opcode::Nmadd) => FpFmaOp::Nmadd,
                    _ => unreachable!(),
                };
                match (fp_fmt_r4(raw_instruction), fp_rm(raw_instruction)) {
                    (Some(format), Some(rounding_mode)) => Ok(Self::FpFma {
                        op,
                        format,
                        dest: fp_rd(raw_instruction),
                        src1: fp_rs1(raw_instruction),
                        src2: fp_rs2(raw_instruction),
                        src3: fp_rs3(raw_instruction),
                        rounding_mode,
                    }),
                    _ => Err(DecodeError::IllegalInstruction),
                }
            }
            Opcode::OpFp => decode_op_fp(raw_instruction),
            Opcode::OpV => decode_op_v(raw_instruction),
        }
    }
}

/// Decodes the `funct3` of `flw`/`fld`/`fsw`/`fsd` into the floating-point format being
/// loaded/stored. Only the `W` (single) and `D` (double) widths are supported; `H` (Zfh) and `Q`
/// are not.
fn fp_load_store_format(raw_instruction: u32) -> Option<FpFormat> {
    match funct3(raw_instruction) {
        0b010 => Some(FpFormat::S),
        0b011 => Some(FpFormat::D),
        _ => None,
    }
}

/// Decodes the `width` field (same bit position as `funct3`) of a vector unit-stride load/store
/// into its effective element width. Distinct from [`fp_load_store_format`]'s encoding of the
/// same bits: `0b010`/`0b011` (scalar `W`/`D`) are never valid vector widths.
fn vector_unit_stride_eew(raw_instruction: u32) -> Option<VectorWidth> {
    match funct3(raw_instruction) {
        0b000 => Some(VectorWidth::E8),
        0b101 => Some(VectorWidth::E16),
        0b110 => Some(VectorWidth::E32),
        0b111 => Some(VectorWidth::E64),
        _ => None,
    }
}

/// Validates and decodes the remaining fields of a unit-stride vector load/store (`nf`, `mew`,
/// `mop`, and the `lumop`/`sumop` field reusing `rs2`'s bit position): only plain, non-segmented,
/// non-fault-only-first unit-stride accesses are supported. Returns the inverted `vm` bit (`true`
/// means the instruction is masked by `v0`) if the encoding is recognized.
fn vector_unit_stride_masked(raw_instruction: u32) -> Option<bool> {
    let nf = (raw_instruction >> 29) & 0b111;
    let mew = (raw_instruction >> 28) & 0b1;
    let mop = (raw_instruction >> 26) & 0b11;
    let lumop_sumop = (raw_instruction >> 20) & 0b1_1111;
    if nf != 0 || mew != 0 || mop != 0 || lumop_sumop != 0 {
        return None;
    }
    let vm = (raw_instruction >> 25) & 0b1 == 1;
    Some(!vm)
}

/// Returns the 5-bit *vd* value (same bit position as *rd*) as a vector register specifier.
fn v_rd(raw_instruction: u32) -> VSpecifier {
    VSpecifier::from_u5(((raw_instruction >> 7) & 0x1F) as u8)
}

/// Returns the 5-bit *vs2* value (same bit position as *rs2*) as a vector register specifier.
fn v_rs2(raw_instruction: u32) -> VSpecifier {
    VSpecifier::from_u5(((raw_instruction >> 20) & 0x1F) as u8)
}

/// Returns the 5-bit *vs1* value (same bit position as *rs1*) as a vector register specifier.
fn v_rs1(raw_instruction: u32) -> VSpecifier {
    VSpecifier::from_u5(((raw_instruction >> 15) & 0x1F) as u8)
}

/// Decodes the `vm` bit (bit 25) of a vector instruction into whether it's masked: `vm == 0`
/// means masked by `v0`, `vm == 1` means unmasked, matching
/// [`vector_unit_stride_masked`]'s convention.
fn vector_vm_masked(raw_instruction: u32) -> bool {
    (raw_instruction >> 25) & 0b1 == 0
}

/// Decodes an `OPIVV` `funct6` (bits 31:26) into the integer operation it selects, if recognized.
fn vector_int_op(funct6: u8) -> Option<VectorIntOp> {
    match funct6 {
        0b000000 => Some(VectorIntOp::Add),
        0b000010 => Some(VectorIntOp::Sub),
        0b001001 => Some(VectorIntOp::And),
        0b001010 => Some(VectorIntOp::Or),
        0b001011 => Some(VectorIntOp::Xor),
        _ => None,
    }
}

/// Decodes every instruction at the `OP-V` opcode. `funct3 == 111` selects `vsetvli`/`vsetivli`/
/// `vsetvl`, distinguished by the top two bits of the instruction. `funct3 == 000` (`OPIVV`)
/// selects the vector-vector integer arithmetic family recognized by [`vector_int_op`]; the
/// remaining vector arithmetic funct3s (`OPFVV`/`OPMVV`/`OPIVI`/`OPIVX`/`OPMVX`) are not decoded.
fn decode_op_v(raw_instruction: u32) -> Result<Instruction, DecodeError> {
    if funct3(raw_instruction) == 0b000 {
        let funct6 = ((raw_instruction >> 26) & 0x3F) as u8;
        return match vector_int_op(funct6) {
            Some(op) => Ok(Instruction::VectorOpIvv {
                op,
                dest: v_rd(raw_instruction),
                vs2: v_rs2(raw_instruction),
                vs1: v_rs1(raw_instruction),
                masked: vector_vm_masked(raw_instruction),
            }),
            None => Err(DecodeError::IllegalInstruction),
        };
    }
    if funct3(raw_instruction) != 0b111 {
        return Err(DecodeError::IllegalInstruction);
    }
    let dest = rd(raw_instruction);
    if raw_instruction >> 31 == 0 {
        // vsetvli: imm[30:20] holds the new vtype, zero-extended.
        return Ok(Instruction::VectorSetVli {
            dest,
            avl_src: rs1(raw_instruction),
            raw_vtype: (raw_instruction >> 20) & 0x7FF,
        });
    }
    match (raw_instruction >> 30) & 0b1 {
        1 => Ok(Instruction::VectorSetIvli {
            dest,
            avl: (raw_instruction >> 15) & 0x1F,
            raw_vtype: (raw_instruction >> 20) & 0x3FF,
        }),
        0 => {
            if funct7(raw_instruction) != 0b100_0000 {
                return Err(DecodeError::IllegalInstruction);
            }
            Ok(Instruction::VectorSetVl {
                dest,
                avl_src: rs1(raw_instruction),
                vtype_src: rs2(raw_instruction),
            })
        }
        _ => unreachable!(),
    }
}

/// Decodes every instruction at the `OP-FP` opcode: the arithmetic, compare, classify, move, and
/// convert families. `funct7` identifies the operation (and, for most, doubles as the format
/// selector in its low two bits); a handful of operations (conversions, moves) instead use `rs2`
/// to disambiguate since they have only one real register operand.
fn decode_op_fp(raw_instruction: u32) -> Result<Instruction, DecodeError> {
    let illegal = || Err(DecodeError::IllegalInstruction);
    let rs2_bits = u8::from(rs2(raw_instruction));
    match funct7(raw_instruction) {
        funct7 @ (0x00 | 0x01) => with_fmt_rm(funct7 & 0b11, raw_instruction, |format, rm| {
            Instruction::FpOp {
                op: FpOp::Add,
                format,
                dest: fp_rd(raw_instruction),
                src1: fp_rs1(raw_instruction),
                src2: fp_rs2(raw_instruction),
                rounding_mode: rm,
            }
        }),
        funct7 @ (0x04 | 0x05) => with_fmt_rm(funct7 & 0b11, raw_instruction, |format, rm| {
            Instruction::FpOp {
                op: FpOp::Sub,
                format,
                dest: fp_rd(raw_instruction),
                src1: fp_rs1(raw_instruction),
                src2: fp_rs2(raw_instruction),
                rounding_mode: rm,
            }
        }),
        funct7 @ (0x08 | 0x09) => with_fmt_rm(funct7 & 0b11, raw_instruction, |format, rm| {
            Instruction::FpOp {
                op: FpOp::Mul,
                format,
                dest: fp_rd(raw_instruction),
                src1: fp_rs1(raw_instruction),
                src2: fp_rs2(raw_instruction),
                rounding_mode: rm,
            }
        }),
        funct7 @ (0x0C | 0x0D) => with_fmt_rm(funct7 & 0b11, raw_instruction, |format, rm| {
            Instruction::FpOp {
                op: FpOp::Div,
                format,
                dest: fp_rd(raw_instruction),
                src1: fp_rs1(raw_instruction),
                src2: fp_rs2(raw_instruction),
                rounding_mode: rm,
            }
        }),
        0x2C | 0x2D if rs2_bits == 0 => {
            match (fp_fmt(raw_instruction), fp_rm(raw_instruction)) {
                (Some(format), Some(rounding_mode)) => Ok(Instruction::FpSqrt {
                    format,
                    dest: fp_rd(raw_instruction),
                    src: fp_rs1(raw_instruction),
                    rounding_mode,
                }),
                _ => illegal(),
            }
        }
        0x10 | 0x11 => {
            let Some(format) = fp_fmt(raw_instruction) else {
                return illegal();
            };
            let op = match funct3(raw_instruction) {
                0b000 => FpOp::SignInject,
                0b001 => FpOp::SignInjectNeg,
                0b010 => FpOp::SignInjectXor,
                _ => return illegal(),
            };
            Ok(Instruction::FpOp {
                op,
                format,
                dest: fp_rd(raw_instruction),
                src1: fp_rs1(raw_instruction),
                src2: fp_rs2(raw_instruction),
                rounding_mode: RoundingMode::RoundNearestEven,
            })
        }
        0x14 | 0x15 => {
            let Some(format) = fp_fmt(raw_instruction) else {
                return illegal();
            };
            let op = match funct3(raw_instruction) {
                0b000 => FpOp::Min,
                0b001 => FpOp::Max,
                _ => return illegal(),
            };
            Ok(Instruction::FpOp {
                op,
                format,
                dest: fp_rd(raw_instruction),
                src1: fp_rs1(raw_instruction),
                src2: fp_rs2(raw_instruction),
                rounding_mode: RoundingMode::RoundNearestEven,
            })
        }
        0x50 | 0x51 => {
            let Some(format) = fp_fmt(raw_instruction) else {
                return illegal();
            };
            let op = match funct3(raw_instruction) {
                0b010 => FpCompareOp::Eq,
                0b001 => FpCompareOp::Lt,
                0b000 => FpCompareOp::Le,
                _ => return illegal(),
            };
            Ok(Instruction::FpCompare {
                op,
                format,
                dest: rd(raw_instruction),
                src1: fp_rs1(raw_instruction),
                src2: fp_rs2(raw_instruction),
            })
        }
        0x60 | 0x61 => {
            let (Some(format), Some(rounding_mode)) =
                (fp_fmt(raw_instruction), fp_rm(raw_instruction))
            else {
                return illegal();
            };
            let signed = match rs2_bits {
                0 => true,
                1 => false,
                _ => return illegal(),
            };
            Ok(Instruction::FpToInt {
                format,
                signed,
                dest: rd(raw_instruction),
                src: fp_rs1(raw_instruction),
                rounding_mode,
            })
        }
        0x68 | 0x69 => {
            let (Some(format), Some(rounding_mode)) =
                (fp_fmt(raw_instruction), fp_rm(raw_instruction))
            else {
                return illegal();
            };
            let signed = match rs2_bits {
                0 => true,
                1 => false,
                _ => return illegal(),
            };
            Ok(Instruction::FpFromInt {
                format,
                signed,
                dest: fp_rd(raw_instruction),
                src: rs1(raw_instruction),
                rounding_mode,
            })
        }
        0x70 | 0x71 if rs2_bits == 0 => {
            let Some(format) = fp_fmt(raw_instruction) else {
                return illegal();
            };
            match (format, funct3(raw_instruction)) {
                (FpFormat::S, 0b000) => Ok(Instruction::FpMoveToInt {
                    format,
                    dest: rd(raw_instruction),
                    src: fp_rs1(raw_instruction),
                }),
                (_, 0b001) => Ok(Instruction::FpClassify {
                    format,
                    dest: rd(raw_instruction),
                    src: fp_rs1(raw_instruction),
                }),
                _ => illegal(),
            }
        }
        0x78 if rs2_bits == 0 && funct3(raw_instruction) == 0b000 => {
            Ok(Instruction::FpMoveFromInt {
                format: FpFormat::S,
                dest: fp_rd(raw_instruction),
                src: rs1(raw_instruction),
            })
        }
        0x20 if rs2_bits == 0b00001 => {
            let Some(rounding_mode) = fp_rm(raw_instruction) else {
                return illegal();
            };
            Ok(Instruction::FpConvertFormat {
                to: FpFormat::S,
                from: FpFormat::D,
                dest: fp_rd(raw_instruction),
                src: fp_rs1(raw_instruction),
                rounding_mode,
            })
        }
        0x21 if rs2_bits == 0b00000 => {
            let Some(rounding_mode) = fp_rm(raw_instruction) else {
                return illegal();
            };
            Ok(Instruction::FpConvertFormat {
                to: FpFormat::D,
                from: FpFormat::S,
                dest: fp_rd(raw_instruction),
                src: fp_rs1(raw_instruction),
                rounding_mode,
            })
        }
        _ => illegal(),
    }
}

fn with_fmt_rm(
    fmt_bits: u8,
    raw_instruction: u32,
    build: impl FnOnce(FpFormat, RoundingMode) -> Instruction,
) -> Result<Instruction, DecodeError> {
    let format = match fmt_bits {
        0b00 => FpFormat::S,
        0b01 => FpFormat::D,
        _ => return Err(DecodeError::IllegalInstruction),
    };
    match fp_rm(raw_instruction) {
        Some(rm) => Ok(build(format, rm)),
        None => Err(DecodeError::IllegalInstruction),
    }
}

// TODO: Create either more decode errors or join this in to one, because the current variants are
//       misleading! (i.e. they both indicate this is an unsupported encoding, which means it may
//       be reserved, not implemented, part of another extension, intended for a coprocessor, etc.)
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum DecodeError {
    #[error("instruction has unsupported opcode")]
    UnsupportedOpcode,
    #[error("illegal instruction")]
    IllegalInstruction,
}

/// Returns the 7-bit *opcode* value of the instruction, or `None` if it isn't supported.
fn opcode(raw_instruction: u32) -> Option<Opcode> {
    #[allow(clippy::unusual_byte_groupings)]
    match raw_instruction & 0x7F {
        0b00_000_11 => Some(Opcode::Load),
        0b00_001_11 => Some(Opcode::LoadFp),
        // custom-0
        0b00_011_11 => Some(Opcode::MiscMem),
        0b00_100_11 => Some(Opcode::OpImm),
        0b00_101_11 => Some(Opcode::Auipc),
        // OP-IMM-32
        // 48b
        0b01_000_11 => Some(Opcode::Store),
        0b01_001_11 => Some(Opcode::StoreFp),
        // custom-1
        0b01_011_11 => Some(Opcode::Amo),
        0b01_100_11 => Some(Opcode::Op),
        0b01_101_11 => Some(Opcode::Lui),
        // OP-32
        // 64b
        0b10_000_11 => Some(Opcode::Madd),
        0b10_001_11 => Some(Opcode::Msub),
        0b10_010_11 => Some(Opcode::Nmsub),
        0b10_011_11 => Some(Opcode::Nmadd),
        0b10_100_11 => Some(Opcode::OpFp),
        0b10_101_11 => Some(Opcode::OpV),
        // reserved
        // custom-2/rv128
        // 48b
        0b11_000_11 => Some(Opcode::Branch),
        0b11_001_11 => Some(Opcode::Jalr),
        // reserved
        0b11_011_11 => Some(Opcode::Jal),
        0b11_100_11 => Some(Opcode::System),
        // reserved
        // custom-3/rv128
        // >= 80b
        _ => None,
    }
}

/// Returns the 5-bit *rd* value for R-type, I-type, U-type, J-type instructions.
fn rd(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(((raw_instruction >> 7) & 0x1F) as u8)
}

/// Returns the 5-bit *rs1* value for R-type, I-type, S-type, B-type instructions.
fn rs1(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(((raw_instruction >> 15) & 0x1F) as u8)
}

/// Returns the 5-bit *rs2* value for R-type, S-type, B-type instructions.
fn rs2(raw_instruction: u32) -> Specifier {
    Specifier::from_u5(((raw_instruction >> 20) & 0x1F) as u8)
}

/// Returns the 5-bit *rd* field as an `f` register specifier.
fn fp_rd(raw_instruction: u32) -> FpSpecifier {
    FpSpecifier::from_u5(((raw_instruction >> 7) & 0x1F) as u8)
}

/// Returns the 5-bit *rs1* field as an `f` register specifier.
fn fp_rs1(raw_instruction: u32) -> FpSpecifier {
    FpSpecifier::from_u5(((raw_instruction >> 15) & 0x1F) as u8)
}

/// Returns the 5-bit *rs2* field as an `f` register specifier.
fn fp_rs2(raw_instruction: u32) -> FpSpecifier {
    FpSpecifier::from_u5(((raw_instruction >> 20) & 0x1F) as u8)
}

/// Returns the 5-bit *rs3* field (R4-type only, used by the fused multiply-add family) as an
/// `f` register specifier.
fn fp_rs3(raw_instruction: u32) -> FpSpecifier {
    FpSpecifier::from_u5(((raw_instruction >> 27) & 0x1F) as u8)
}

/// Returns the 2-bit format selector of an R4-type instruction (`Madd`/`Msub`/`Nmsub`/`Nmadd`),
/// which occupies the bits directly below *rs3* (where R-type instead has a full *funct7*).
fn fp_fmt_r4(raw_instruction: u32) -> Option<FpFormat> {
    match (raw_instruction >> 25) & 0b11 {
        0b00 => Some(FpFormat::S),
        0b01 => Some(FpFormat::D),
        _ => None,
    }
}

/// Returns the format encoded in the low two bits of an `OP-FP` instruction's *funct7*.
fn fp_fmt(raw_instruction: u32) -> Option<FpFormat> {
    match funct7(raw_instruction) & 0b11 {
        0b00 => Some(FpFormat::S),
        0b01 => Some(FpFormat::D),
        _ => None,
    }
}

/// Returns the rounding mode encoded in the *funct3*/*rm* field, shared by every `f`-producing
/// arithmetic instruction.
fn fp_rm(raw_instruction: u32) -> Option<RoundingMode> {
    RoundingMode::decode(funct3(raw_instruction))
}

fn csr(raw_instruction: u32) -> CsrSpecifier {
    (raw_instruction >> 20) as u16
}

fn i_funct(raw_instruction: u32) -> Option<RegImmOp> {
    match funct3(raw_instruction) {
        0b000 => Some(RegImmOp::Addi),
        0b010 => Some(RegImmOp::Slti),
        0b011 => Some(RegImmOp::Sltiu),
        0b100 => Some(RegImmOp::Xori),
        0b110 => Some(RegImmOp::Ori),
        0b111 => Some(RegImmOp::Andi),
        _ => None,
    }
}

fn i_shfunct(raw_instruction: u32) -> Option<RegShiftImmOp> {
    match (funct7(raw_instruction), funct3(raw_instruction)) {
        (0b0000000, 0b001) => Some(RegShiftImmOp::Slli),
        (0b0000000, 0b101) => Some(RegShiftImmOp::Srli),
        (0b0100000, 0b101) => Some(RegShiftImmOp::Srai),
        // Zbb
        (0b0110000, 0b101) => Some(RegShiftImmOp::Rori),
        // Zbs
        (0b0100100, 0b001) => Some(RegShiftImmOp::Bclri),
        (0b0100100, 0b101) => Some(RegShiftImmOp::Bexti),
        (0b0110100, 0b001) => Some(RegShiftImmOp::Binvi),
        (0b0010100, 0b001) => Some(RegShiftImmOp::Bseti),
        _ => None,
    }
}

/// Matches the `Zbb` unary instructions (`clz`/`ctz`/`cpop`/`sext.b`/`sext.h`/`orc.b`/`rev8`),
/// which are encoded at the `OP-IMM` opcode with a fixed `imm[11:0]` selector rather than a real
/// immediate value or a `SLLI`/`SRLI`/`SRAI`/Zbb-shift shamt.
fn unary_funct(raw_instruction: u32) -> Option<UnaryOp> {
    match (funct3(raw_instruction), funct12(raw_instruction)) {
        (0b001, 0x600) => Some(UnaryOp::Clz),
        (0b001, 0x601) => Some(UnaryOp::Ctz),
        (0b001, 0x602) => Some(UnaryOp::Cpop),
        (0b001, 0x604) => Some(UnaryOp::SextB),
        (0b001, 0x605) => Some(UnaryOp::SextH),
        (0b101, 0x287) => Some(UnaryOp::OrcB),
        (0b101, 0x698) => Some(UnaryOp::Rev8),
        _ => None,
    }
}

fn i_sys(raw_instruction: u32) -> Option<SysFunct> {
    match funct3(raw_instruction) {
        0b000 => Some(SysFunct::Priv),
        0b001 => Some(SysFunct::Csrrw),
        0b010 => Some(SysFunct::Csrrs),
        0b011 => Some(SysFunct::Csrrc),
        0b101 => Some(SysFunct::Csrrwi),
        0b110 => Some(SysFunct::Csrrsi),
        0b111 => Some(SysFunct::Csrrci),
        0b100 => Some(SysFunct::HypervisorLoadStore),
        _ => None,
    }
}

fn sys_priv(raw_instruction: u32) -> Option<SysPriv> {
    if u8::from(rd(raw_instruction)) != 0 {
        return None;
    }
    if funct7(raw_instruction) == 0b0001001 {
        return Some(SysPriv::SfenceVma);
    }
    if funct7(raw_instruction) == 0b0010001 {
        return Some(SysPriv::HfenceVvma);
    }
    if funct7(raw_instruction) == 0b0110001 {
        return Some(SysPriv::HfenceGvma);
    }
    if u8::from(rs1(raw_instruction)) != 0 {
        return None;
    }
    let funct = funct12(raw_instruction);
    if funct >> 11 != 0 {
        // Custom SYSTEM instruction, but none are supported.
        return None;
    }
    match funct {
        0 => Some(SysPriv::Ecall),
        1 => Some(SysPriv::Ebreak),
        // Zawrs: WRS.NTO and WRS.STO share the SYSTEM opcode, rd == 0, rs1 == 0 encoding space
        // with the other privileged no-operand instructions above, distinguished by funct12.
        0x00D => Some(SysPriv::WrsNto),
        0x01D => Some(SysPriv::WrsSto),
        _ => match (funct7(raw_instruction), u8::from(rs2(raw_instruction))) {
            (0b0001000, 2) => Some(SysPriv::Sret),
            (0b0011000, 2) => Some(SysPriv::Mret),
            (0b0001000, 5) => Some(SysPriv::Wfi),
            _ => None,
        },
    }
}

/// Decodes the `hlv.*`/`hsv.*` family (`SYSTEM` opcode, `funct3 == 0b100`), distinguished by
/// `funct7` and, for loads, the `rs2` field (which selects signed/unsigned rather than naming a
/// register).
fn h_load_store(raw_instruction: u32) -> Option<Instruction> {
    let dest_or_src = rd(raw_instruction);
    let base = rs1(raw_instruction);
    let rs2_bits = u8::from(rs2(raw_instruction));
    match funct7(raw_instruction) {
        0b0110000 => match rs2_bits {
            0b00000 => Some(Instruction::HlvB {
                dest: dest_or_src,
                base,
                unsigned: false,
            }),
            0b00001 => Some(Instruction::HlvB {
                dest: dest_or_src,
                base,
                unsigned: true,
            }),
            _ => None,
        },
        0b0110010 => match rs2_bits {
            0b00000 => Some(Instruction::HlvH {
                dest: dest_or_src,
                base,
                unsigned: false,
            }),
            0b00001 => Some(Instruction::HlvH {
                dest: dest_or_src,
                base,
                unsigned: true,
            }),
            _ => None,
        },
        0b0110100 => match rs2_bits {
            0b00000 => Some(Instruction::HlvW {
                dest: dest_or_src,
                base,
            }),
            _ => None,
        },
        0b0110001 => Some(Instruction::HsvB {
            src: rs2(raw_instruction),
            base,
        }),
        0b0110011 => Some(Instruction::HsvH {
            src: rs2(raw_instruction),
            base,
        }),
        0b0110101 => Some(Instruction::HsvW {
            src: rs2(raw_instruction),
            base,
        }),
        _ => None,
    }
}

fn i_mem(raw_instruction: u32) -> Option<MemFunct> {
    match funct3(raw_instruction) {
        0b000 => Some(MemFunct::Fence),
        0b001 => Some(MemFunct::FenceI),
        0b010 => Some(MemFunct::CacheBlock),
        _ => None,
    }
}

/// Decodes the `imm[11:0]` field of a Zicbom/Zicboz `cbo.*` instruction (`MISC-MEM`,
/// `funct3 == 0b010`) into the operation it selects.
fn i_cbo(raw_instruction: u32) -> Option<CacheBlockOp> {
    if u8::from(rd(raw_instruction)) != 0 {
        return None;
    }
    match raw_instruction >> 20 {
        0b0000_0000_0000 => Some(CacheBlockOp::Inval),
        0b0000_0000_0001 => Some(CacheBlockOp::Clean),
        0b0000_0000_0010 => Some(CacheBlockOp::Flush),
        _ => None,
    }
}

/// Decodes the `imm[11:0]` field of a `cbo.zero` instruction (`MISC-MEM`, `funct3 == 0b010`,
/// `imm[11:0] == 0b0000_0000_0100`).
fn is_cbo_zero(raw_instruction: u32) -> bool {
    u8::from(rd(raw_instruction)) == 0 && raw_instruction >> 20 == 0b0000_0000_0100
}

fn i_width(raw_instruction: u32) -> Option<LoadWidth> {
    match funct3(raw_instruction) {
        0b000 => Some(LoadWidth::Lb),
        0b001 => Some(LoadWidth::Lh),
        0b010 => Some(LoadWidth::Lw),
        0b100 => Some(LoadWidth::Lbu),
        0b101 => Some(LoadWidth::Lhu),
        _ => None,
    }
}

fn s_width(raw_instruction: u32) -> Option<StoreWidth> {
    match funct3(raw_instruction) {
        0b000 => Some(StoreWidth::Sb),
        0b001 => Some(StoreWidth::Sh),
        0b010 => Some(StoreWidth::Sw),
        _ => None,
    }
}

fn r_funct(raw_instruction: u32) -> Option<RegRegOp> {
    match (funct7(raw_instruction), funct3(raw_instruction)) {
        (0b0000000, 0b000) => Some(RegRegOp::Add),
        (0b0000000, 0b001) => Some(RegRegOp::Sll),
        (0b0000000, 0b010) => Some(RegRegOp::Slt),
        (0b0000000, 0b011) => Some(RegRegOp::Sltu),
        (0b0000000, 0b100) => Some(RegRegOp::Xor),
        (0b0000000, 0b101) => Some(RegRegOp::Srl),
        (0b0000000, 0b110) => Some(RegRegOp::Or),
        (0b0000000, 0b111) => Some(RegRegOp::And),
        (0b0100000, 0b000) => Some(RegRegOp::Sub),
        (0b0100000, 0b101) => Some(RegRegOp::Sra),
        // funct7 == MULDIV
        (0b0000001, 0b000) => Some(RegRegOp::Mul),
        (0b0000001, 0b001) => Some(RegRegOp::Mulh),
        (0b0000001, 0b010) => Some(RegRegOp::Mulhsu),
        (0b0000001, 0b011) => Some(RegRegOp::Mulhu),
        (0b0000001, 0b100) => Some(RegRegOp::Div),
        (0b0000001, 0b101) => Some(RegRegOp::Divu),
        (0b0000001, 0b110) => Some(RegRegOp::Rem),
        (0b0000001, 0b111) => Some(RegRegOp::Remu),
        // Zba
        (0b0010000, 0b010) => Some(RegRegOp::Sh1add),
        (0b0010000, 0b100) => Some(RegRegOp::Sh2add),
        (0b0010000, 0b110) => Some(RegRegOp::Sh3add),
        // Zbb
        (0b0100000, 0b111) => Some(RegRegOp::Andn),
        (0b0100000, 0b110) => Some(RegRegOp::Orn),
        (0b0100000, 0b100) => Some(RegRegOp::Xnor),
        (0b0000101, 0b110) => Some(RegRegOp::Max),
        (0b0000101, 0b111) => Some(RegRegOp::Maxu),
        (0b0000101, 0b100) => Some(RegRegOp::Min),
        (0b0000101, 0b101) => Some(RegRegOp::Minu),
        (0b0110000, 0b001) => Some(RegRegOp::Rol),
        (0b0110000, 0b101) => Some(RegRegOp::Ror),
        (0b0000100, 0b100) if u8::from(rs2(raw_instruction)) == 0 => Some(RegRegOp::ZextH),
        // Zbs
        (0b0100100, 0b001) => Some(RegRegOp::Bclr),
        (0b0100100, 0b101) => Some(RegRegOp::Bext),
        (0b0110100, 0b001) => Some(RegRegOp::Binv),
        (0b0010100, 0b001) => Some(RegRegOp::Bset),
        // Zicond
        (0b0000111, 0b101) => Some(RegRegOp::CzeroEqz),
        (0b0000111, 0b111) => Some(RegRegOp::CzeroNez),
        _ => None,
    }
}

fn b_funct(raw_instruction: u32) -> Option<BranchCondition> {
    match funct3(raw_instruction) {
        0b000 => Some(BranchCondition::Beq),
        0b001 => Some(BranchCondition::Bne),
        0b100 => Some(BranchCondition::Blt),
        0b101 => Some(BranchCondition::Bge),
        0b110 => Some(BranchCondition::Bltu),
        0b111 => Some(BranchCondition::Bgeu),
        _ => None,
    }
}

fn amo_op(raw_instruction: u32) -> Option<AmoOp> {
    if funct3(raw_instruction) != 0b010 {
        return None;
    }
    match funct7(raw_instruction) >> 2 {
        0b00010 => Some(AmoOp::Lr),
        0b00011 => Some(AmoOp::Sc),
        0b00001 => Some(AmoOp::Swap),
        0b00000 => Some(AmoOp::Add),
        0b00100 => Some(AmoOp::Xor),
        0b01100 => Some(AmoOp::And),
        0b01000 => Some(AmoOp::Or),
        0b10000 => Some(AmoOp::Min),
        0b10100 => Some(AmoOp::Max),
        0b11000 => Some(AmoOp::Minu),
        0b11100 => Some(AmoOp::Maxu),
        _ => None,
    }
}

fn amo_rl(raw_instruction: u32) -> bool {
    (raw_instruction >> 25) & 0b1 == 1
}

fn amo_aq(raw_instruction: u32) -> bool {
    (raw_instruction >> 26) & 0b1 == 1
}

/// Returns the 3-bit *funct3* value for R-type, I-type, S-type, B-type instructions.
fn funct3(raw_instruction: u32) -> u8 {
    ((raw_instruction >> 12) & 0b111) as u8
}

/// Returns the 7-bit *funct7* value for R-type instructions.
fn funct7(raw_instruction: u32) -> u8 {
    (raw_instruction >> 25) as u8
}

/// Returns the 5-bit *shamt* value for S-type shift instructions.
fn shamt(raw_instruction: u32) -> u32 {
    (raw_instruction >> 20) & 0x1F
}

/// Returns the 12-bit I-immediate sign-extended to 32 bits.
fn i_imm(raw_instruction: u32) -> i32 {
    raw_instruction as i32 >> 20
}

/// Returns the 12-bit I-immediate zero-extended to 32 bits.
fn funct12(raw_instruction: u32) -> u32 {
    raw_instruction >> 20
}

/// Returns the 12-bit S-immediate sign-extended to 32 bits.
fn s_imm(raw_instruction: u32) -> i32 {
    let imm_11_5 = raw_instruction & 0xFE00_0000;
    let imm_4_0 = raw_instruction & 0x0000_0F80;
    (imm_11_5 | (imm_4_0 << 13)) as i32 >> 20
}

/// Returns the 13-bit B-immediate sign-extended to 32 bits.
fn b_imm(raw_instruction: u32) -> i32 {
    let imm_12 = raw_instruction & 0x8000_0000;
    let imm_10_5 = raw_instruction & 0x7E00_0000;
    let imm_4_1 = raw_instruction & 0x0000_0F00;
    let imm_11 = raw_instruction & 0x0000_0080;
    (imm_12 | (imm_11 << 23) | (imm_10_5 >> 1) | (imm_4_1 << 12)) as i32 >> 19
}

/// Returns the signed 32-bit U-immediate.
fn u_imm(raw_instruction: u32) -> i32 {
    (raw_instruction & 0xFFFF_F000) as i32
}

/// Returns the 21-bit J-immediate sign-extended to 32 bits.
fn j_imm(raw_instruction: u32) -> i32 {
    let imm_20 = raw_instruction & 0x8000_0000;
    let imm_10_1 = raw_instruction & 0x7FE0_0000;
    let imm_11 = raw_instruction & 0x0010_0000;
    let imm_19_12 = raw_instruction & 0x000F_F000;
    (imm_20 | (imm_19_12 << 11) | (imm_11 << 2) | (imm_10_1 >> 9)) as i32 >> 11
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum Opcode {
    OpImm,
    Auipc,
    Lui,
    Amo,
    Op,
    Jal,
    Jalr,
    Branch,
    Load,
    Store,
    MiscMem,
    System,
    LoadFp,
    StoreFp,
    Madd,
    Msub,
    Nmsub,
    Nmadd,
    OpFp,
    OpV,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SysFunct {
    Priv,
    Csrrw,
    Csrrs,
    Csrrc,
    Csrrwi,
    Csrrsi,
    Csrrci,
    /// `hlv.*`/`hsv.*`: the hypervisor virtual-machine load/store family, `funct3 == 0b100`.
    HypervisorLoadStore,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum SysPriv {
    Ecall,
    Ebreak,
    Sret,
    Mret,
    Wfi,
    WrsNto,
    WrsSto,
    SfenceVma,
    HfenceVvma,
    HfenceGvma,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum MemFunct {
    Fence,
    FenceI,
    CacheBlock,
}

/// The Zicbom cache-block-management operation selected by a `cbo.*` instruction's `imm[11:0]`
/// field, distinct from the `cbo.zero` (Zicboz) encoding which is decoded separately.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum CacheBlockOp {
    /// `cbo.inval`: the block may be invalidated without writeback; a subsequent access may
    /// observe stale data if the block was dirty. Harmless here since there is no cache.
    Inval,
    /// `cbo.clean`: writes back a dirty block without invalidating it.
    Clean,
    /// `cbo.flush`: writes back a dirty block and invalidates it.
    Flush,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i_imm() {
        assert_eq!(0, i_imm(0x0000_0000));
        assert_eq!(-1, i_imm(0xFFF0_0000));
        assert_eq!(2047, i_imm(2047 << 20));
        assert_eq!(-2048, i_imm(0x8000_0000));
        assert_eq!(-42, i_imm((-42_i32 << 20) as u32));
        // Check other bits are ignored
        assert_eq!(0, i_imm(0x000F_FFFF));
        assert_eq!(-1, i_imm(0xFFF1_2345));
        assert_eq!(1209, i_imm((1209 << 20) | 0x000C_D10A));
    }

    fn r_type(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
        (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
    }

    #[test]
    fn test_decode_zba() {
        // sh1add x1, x2, x3
        let raw = r_type(0b0010000, 3, 2, 0b010, 1, 0b0110011);
        assert_eq!(
            Instruction::decode(raw),
            Ok(Instruction::Op {
                op: RegRegOp::Sh1add,
                dest: Specifier::from_u5(1),
                src1: Specifier::from_u5(2),
                src2: Specifier::from_u5(3),
            })
        );
    }

    #[test]
    fn test_decode_zbb_reg_reg() {
        // andn x1, x2, x3
        let raw = r_type(0b0100000, 3, 2, 0b111, 1, 0b0110011);
        assert_eq!(
            Instruction::decode(raw),
            Ok(Instruction::Op {
                op: RegRegOp::Andn,
                dest: Specifier::from_u5(1),
                src1: Specifier::from_u5(2),
                src2: Specifier::from_u5(3),
            })
        );
    }

    #[test]
    fn test_decode_zbb_unary() {
        // clz x1, x2 (funct3=001, imm[11:0]=0x600, opcode OP-IMM)
        let raw = (0x600 << 20) | (2 << 15) | (0b001 << 12) | (1 << 7) | 0b0010011;
        assert_eq!(
            Instruction::decode(raw),
            Ok(Instruction::OpUnary {
                op: UnaryOp::Clz,
                dest: Specifier::from_u5(1),
                src: Specifier::from_u5(2),
            })
        );
    }

    #[test]
    fn test_decode_zbs_bclr() {
        // bclr x1, x2, x3
        let raw = r_type(0b0100100, 3, 2, 0b001, 1, 0b0110011);
        assert_eq!(
            Instruction::decode(raw),
            Ok(Instruction::Op {
                op: RegRegOp::Bclr,
                dest: Specifier::from_u5(1),
                src1: Specifier::from_u5(2),
                src2: Specifier::from_u5(3),
            })
        );
    }

    #[test]
    fn test_decode_zbs_bseti_shift_imm() {
        // bseti x1, x2, 5
        let raw = r_type(0b0010100, 5, 2, 0b001, 1, 0b0010011);
        assert_eq!(
            Instruction::decode(raw),
            Ok(Instruction::OpShiftImm {
                op: RegShiftImmOp::Bseti,
                dest: Specifier::from_u5(1),
                src: Specifier::from_u5(2),
                shift_amount_u5: 5,
            })
        );
    }

    #[test]
    fn test_decode_zicond() {
        // czero.eqz x1, x2, x3
        let raw = r_type(0b0000111, 3, 2, 0b101, 1, 0b0110011);
        assert_eq!(
            Instruction::decode(raw),
            Ok(Instruction::Op {
                op: RegRegOp::CzeroEqz,
                dest: Specifier::from_u5(1),
                src1: Specifier::from_u5(2),
                src2: Specifier::from_u5(3),
            })
        );
    }

    #[test]
    fn test_decode_does_not_confuse_srai_and_rori() {
        // srai x1, x2, 5 (funct7 = 0b0100000) must still decode as Srai, not get swallowed by the
        // Zbb shift-immediate group that also sets bit 30.
        let raw = r_type(0b0100000, 5, 2, 0b101, 1, 0b0010011);
        assert_eq!(
            Instruction::decode(raw),
            Ok(Instruction::OpShiftImm {
                op: RegShiftImmOp::Srai,
                dest: Specifier::from_u5(1),
                src: Specifier::from_u5(2),
                shift_amount_u5: 5,
            })
        );
    }

    fn i_type(imm: u32, rs1: u32, funct3: u32, rd: u32, opcode: u32) -> u32 {
        (imm << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
    }

    #[test]
    fn test_decode_fence_i() {
        let raw = i_type(0, 0, 0b001, 0, 0b0001111);
        assert_eq!(Instruction::decode(raw), Ok(Instruction::FenceI));
    }

    #[test]
    fn test_decode_cbo() {
        let inval = i_type(0x000, 2, 0b010, 0, 0b0001111);
        assert_eq!(
            Instruction::decode(inval),
            Ok(Instruction::CacheBlockManagement {
                op: CacheBlockOp::Inval,
                base: Specifier::from_u5(2),
            })
        );

        let clean = i_type(0x001, 2, 0b010, 0, 0b0001111);
        assert_eq!(
            Instruction::decode(clean),
            Ok(Instruction::CacheBlockManagement {
                op: CacheBlockOp::Clean,
                base: Specifier::from_u5(2),
            })
        );

        let flush = i_type(0x002, 2, 0b010, 0, 0b0001111);
        assert_eq!(
            Instruction::decode(flush),
            Ok(Instruction::CacheBlockManagement {
                op: CacheBlockOp::Flush,
                base: Specifier::from_u5(2),
            })
        );

        let zero = i_type(0x004, 2, 0b010, 0, 0b0001111);
        assert_eq!(
            Instruction::decode(zero),
            Ok(Instruction::CacheBlockZero {
                base: Specifier::from_u5(2),
            })
        );

        // rd != 0 is illegal for all cbo.* encodings.
        let bad_rd = i_type(0x000, 2, 0b010, 1, 0b0001111);
        assert_eq!(
            Instruction::decode(bad_rd),
            Err(DecodeError::IllegalInstruction)
        );

        // Undefined imm[11:0] values in the cbo.* space are illegal.
        let bad_imm = i_type(0x7FF, 2, 0b010, 0, 0b0001111);
        assert_eq!(
            Instruction::decode(bad_imm),
            Err(DecodeError::IllegalInstruction)
        );
    }

    #[test]
    fn test_decode_wrs() {
        let nto = i_type(0x00D, 0, 0b000, 0, 0b1110011);
        assert_eq!(Instruction::decode(nto), Ok(Instruction::WrsNto));

        let sto = i_type(0x01D, 0, 0b000, 0, 0b1110011);
        assert_eq!(Instruction::decode(sto), Ok(Instruction::WrsSto));

        // rs1 != 0 is illegal for both wrs.* encodings.
        let bad_rs1 = i_type(0x00D, 1, 0b000, 0, 0b1110011);
        assert_eq!(
            Instruction::decode(bad_rs1),
            Err(DecodeError::IllegalInstruction)
        );
    }
}
