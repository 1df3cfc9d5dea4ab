//! Expansion of 16-bit compressed (`C` extension) opcodes into their 32-bit equivalents.
//!
//! [`expand`] is a pure function from a 16-bit parcel to the 32-bit instruction word a
//! non-compressed core would have fetched for the same operation, so that [`Instruction::decode`]
//! (and everything downstream of it: execution, tracing, illegal-instruction handling) need not
//! know that compressed opcodes exist at all. The caller is responsible for recognizing that a
//! parcel is compressed in the first place (quadrant `raw & 0b11 != 0b11`) and for advancing `pc`
//! by 2 rather than 4 for whatever `expand` returns.
//!
//! Grounded in the RISC-V Unprivileged ISA manual's "C" extension chapter: the quadrant/funct3
//! dispatch and immediate bit layouts below follow its instruction-format tables directly.
//!
//! [`Instruction::decode`]: crate::instruction::Instruction::decode

use crate::instruction::DecodeError;

const OP_IMM: u32 = 0b0010011;
const LOAD: u32 = 0b0000011;
const STORE: u32 = 0b0100011;
const LOAD_FP: u32 = 0b0000111;
const STORE_FP: u32 = 0b0100111;
const BRANCH: u32 = 0b1100011;
const JAL: u32 = 0b1101111;
const JALR: u32 = 0b1100111;
const LUI: u32 = 0b0110111;
const OP: u32 = 0b0110011;
const SYSTEM: u32 = 0b1110011;

/// Expands a 16-bit compressed opcode (`raw & 0b11 != 0b11`) to its 32-bit equivalent encoding.
///
/// Returns [`DecodeError::IllegalInstruction`] for any reserved or HINT-adjacent encoding this
/// core does not distinguish from illegal (the all-zero parcel, zero-immediate `c.addi4spn`,
/// `c.jr x0`, and the RV64/128-only `c.*w`/`c.*d` encodings that have no meaning for an
/// RV32-native core).
pub fn expand(raw: u16) -> Result<u32, DecodeError> {
    if raw == 0 {
        return Err(DecodeError::IllegalInstruction);
    }
    let quadrant = raw & 0b11;
    let funct3 = (raw >> 13) & 0b111;
    match quadrant {
        0b00 => expand_quadrant0(raw, funct3),
        0b01 => expand_quadrant1(raw, funct3),
        0b10 => expand_quadrant2(raw, funct3),
        _ => unreachable!("quadrant 0b11 is not a compressed opcode"),
    }
}

fn expand_quadrant0(raw: u16, funct3: u16) -> Result<u32, DecodeError> {
    match funct3 {
        // C.ADDI4SPN -> addi rd', x2, nzuimm
        0b000 => {
            let imm = ciw_addi4spn_imm(raw);
            if imm == 0 {
                return Err(DecodeError::IllegalInstruction);
            }
            Ok(i_type(OP_IMM, 0b000, rdp(raw), 2, imm as i32))
        }
        // C.FLD -> fld rd', offset(rs1')
        0b001 => Ok(i_type(LOAD_FP, 0b011, rdp(raw), rs1p(raw), cl_double_offset(raw) as i32)),
        // C.LW -> lw rd', offset(rs1')
        0b010 => Ok(i_type(LOAD, 0b010, rdp(raw), rs1p(raw), cl_word_offset(raw) as i32)),
        // C.FLW -> flw rd', offset(rs1')
        0b011 => Ok(i_type(LOAD_FP, 0b010, rdp(raw), rs1p(raw), cl_word_offset(raw) as i32)),
        // C.FSD -> fsd rs2', offset(rs1')
        0b101 => Ok(s_type(STORE_FP, 0b011, rs1p(raw), rs2p(raw), cl_double_offset(raw) as i32)),
        // C.SW -> sw rs2', offset(rs1')
        0b110 => Ok(s_type(STORE, 0b010, rs1p(raw), rs2p(raw), cl_word_offset(raw) as i32)),
        // C.FSW -> fsw rs2', offset(rs1')
        0b111 => Ok(s_type(STORE_FP, 0b010, rs1p(raw), rs2p(raw), cl_word_offset(raw) as i32)),
        _ => Err(DecodeError::IllegalInstruction),
    }
}

fn expand_quadrant1(raw: u16, funct3: u16) -> Result<u32, DecodeError> {
    let rd_rs1 = rd_rs1_full(raw);
    match funct3 {
        // C.NOP / C.ADDI -> addi rd, rd, nzimm (rd == 0 is the canonical c.nop)
        0b000 => Ok(i_type(OP_IMM, 0b000, rd_rs1, rd_rs1, ci_imm6(raw))),
        // C.JAL -> jal x1, offset (RV32-only encoding point; no C.ADDIW exists at XLEN=32)
        0b001 => Ok(j_type(JAL, 1, cj_offset(raw))),
        // C.LI -> addi rd, x0, imm
        0b010 => Ok(i_type(OP_IMM, 0b000, rd_rs1, 0, ci_imm6(raw))),
        0b011 => {
            if rd_rs1 == 2 {
                // C.ADDI16SP -> addi x2, x2, nzimm
                let imm = ci_addi16sp_imm(raw);
                if imm == 0 {
                    return Err(DecodeError::IllegalInstruction);
                }
                Ok(i_type(OP_IMM, 0b000, 2, 2, imm))
            } else {
                // C.LUI -> lui rd, nzimm
                let imm = ci_lui_imm(raw);
                if imm == 0 {
                    return Err(DecodeError::IllegalInstruction);
                }
                Ok(u_type(LUI, rd_rs1, imm))
            }
        }
        0b100 => expand_misc_alu(raw),
        // C.J -> jal x0, offset
        0b101 => Ok(j_type(JAL, 0, cj_offset(raw))),
        // C.BEQZ -> beq rs1', x0, offset
        0b110 => Ok(b_type(BRANCH, 0b000, rs1p(raw), 0, cb_branch_offset(raw))),
        // C.BNEZ -> bne rs1', x0, offset
        0b111 => Ok(b_type(BRANCH, 0b001, rs1p(raw), 0, cb_branch_offset(raw))),
        _ => Err(DecodeError::IllegalInstruction),
    }
}

fn expand_misc_alu(raw: u16) -> Result<u32, DecodeError> {
    let funct2 = (raw >> 10) & 0b11;
    let rdp = rs1p(raw); // CB/CA format: bits[9:7], same position for destination and source
    match funct2 {
        0b00 => {
            // C.SRLI -> srli rd', rd', shamt
            let shamt = ci_shamt(raw)?;
            Ok(i_shift_type(OP_IMM, 0b101, 0b0000000, rdp, rdp, shamt))
        }
        0b01 => {
            // C.SRAI -> srai rd', rd', shamt
            let shamt = ci_shamt(raw)?;
            Ok(i_shift_type(OP_IMM, 0b101, 0b0100000, rdp, rdp, shamt))
        }
        // C.ANDI -> andi rd', rd', imm
        0b10 => Ok(i_type(OP_IMM, 0b111, rdp, rdp, ci_imm6(raw))),
        0b11 => {
            if raw & (1 << 12) != 0 {
                // C.SUBW/C.ADDW and friends: RV64/128-only, meaningless for this RV32-native core.
                return Err(DecodeError::IllegalInstruction);
            }
            let rs2p = rs2p(raw);
            let (funct3, funct7) = match (raw >> 5) & 0b11 {
                0b00 => (0b000, 0b0100000), // C.SUB
                0b01 => (0b100, 0b0000000), // C.XOR
                0b10 => (0b110, 0b0000000), // C.OR
                0b11 => (0b111, 0b0000000), // C.AND
                _ => unreachable!(),
            };
            Ok(r_type(OP, funct3, funct7, rdp, rdp, rs2p))
        }
        _ => unreachable!(),
    }
}

fn expand_quadrant2(raw: u16, funct3: u16) -> Result<u32, DecodeError> {
    let rd_rs1 = rd_rs1_full(raw);
    let rs2 = rs2_full(raw);
    match funct3 {
        // C.SLLI -> slli rd, rd, shamt
        0b000 => {
            let shamt = ci_shamt(raw)?;
            if rd_rs1 == 0 {
                return Err(DecodeError::IllegalInstruction);
            }
            Ok(i_shift_type(OP_IMM, 0b001, 0b0000000, rd_rs1, rd_rs1, shamt))
        }
        // C.FLDSP -> fld rd, offset(x2)
        0b001 => Ok(i_type(LOAD_FP, 0b011, rd_rs1, 2, ci_double_offset(raw) as i32)),
        // C.LWSP -> lw rd, offset(x2)
        0b010 => {
            if rd_rs1 == 0 {
                return Err(DecodeError::IllegalInstruction);
            }
            Ok(i_type(LOAD, 0b010, rd_rs1, 2, ci_word_offset(raw) as i32))
        }
        // C.FLWSP -> flw rd, offset(x2)
        0b011 => Ok(i_type(LOAD_FP, 0b010, rd_rs1, 2, ci_word_offset(raw) as i32)),
        0b100 => {
            let bit12 = raw & (1 << 12) != 0;
            match (bit12, rs2) {
                (false, 0) => {
                    // C.JR -> jalr x0, 0(rs1)
                    if rd_rs1 == 0 {
                        return Err(DecodeError::IllegalInstruction);
                    }
                    Ok(i_type(JALR, 0b000, 0, rd_rs1, 0))
                }
                (false, _) => {
                    // C.MV -> add rd, x0, rs2
                    Ok(r_type(OP, 0b000, 0b0000000, rd_rs1, 0, rs2))
                }
                (true, 0) if rd_rs1 == 0 => {
                    // C.EBREAK
                    Ok(i_type(SYSTEM, 0b000, 0, 0, 1))
                }
                (true, 0) => {
                    // C.JALR -> jalr x1, 0(rs1)
                    Ok(i_type(JALR, 0b000, 1, rd_rs1, 0))
                }
                (true, _) => {
                    // C.ADD -> add rd, rd, rs2
                    Ok(r_type(OP, 0b000, 0b0000000, rd_rs1, rd_rs1, rs2))
                }
            }
        }
        // C.FSDSP -> fsd rs2, offset(x2)
        0b101 => Ok(s_type(STORE_FP, 0b011, 2, rs2, css_double_offset(raw) as i32)),
        // C.SWSP -> sw rs2, offset(x2)
        0b110 => Ok(s_type(STORE, 0b010, 2, rs2, css_word_offset(raw) as i32)),
        // C.FSWSP -> fsw rs2, offset(x2)
        0b111 => Ok(s_type(STORE_FP, 0b010, 2, rs2, css_word_offset(raw) as i32)),
        _ => Err(DecodeError::IllegalInstruction),
    }
}

// -- Register field extraction -----------------------------------------------------------------

/// CL/CS/CB/CA-format compressed register (bits `[9:7]`), mapped into `x8..=x15`.
fn rs1p(raw: u16) -> u32 {
    (u32::from(raw >> 7) & 0b111) + 8
}

/// CL/CS/CA-format compressed register (bits `[4:2]`), mapped into `x8..=x15`.
fn rs2p(raw: u16) -> u32 {
    (u32::from(raw >> 2) & 0b111) + 8
}

/// Alias of [`rs2p`]: in the CL format the destination register shares the same bit position.
fn rdp(raw: u16) -> u32 {
    rs2p(raw)
}

/// CI/CR-format full 5-bit register (bits `[11:7]`).
fn rd_rs1_full(raw: u16) -> u32 {
    u32::from(raw >> 7) & 0x1F
}

/// CR/CSS-format full 5-bit register (bits `[6:2]`).
fn rs2_full(raw: u16) -> u32 {
    u32::from(raw >> 2) & 0x1F
}

// -- Immediate decoding -------------------------------------------------------------------------

fn sign_extend(value: u32, bits: u32) -> i32 {
    let shift = 32 - bits;
    ((value << shift) as i32) >> shift
}

/// `nzuimm[5:4|9:6|2|3]` (CIW format, `C.ADDI4SPN`).
fn ciw_addi4spn_imm(raw: u16) -> u32 {
    let b5_4 = u32::from(raw >> 11) & 0b11;
    let b9_6 = u32::from(raw >> 7) & 0b1111;
    let b2 = u32::from(raw >> 6) & 1;
    let b3 = u32::from(raw >> 5) & 1;
    (b9_6 << 6) | (b5_4 << 4) | (b3 << 3) | (b2 << 2)
}

/// `uimm[5:3|2|6]` (CL/CS format, word-granularity: `C.LW`/`C.FLW`/`C.SW`/`C.FSW`).
fn cl_word_offset(raw: u16) -> u32 {
    let b5_3 = u32::from(raw >> 10) & 0b111;
    let b6 = u32::from(raw >> 5) & 1;
    let b2 = u32::from(raw >> 6) & 1;
    (b6 << 6) | (b5_3 << 3) | (b2 << 2)
}

/// `uimm[5:3|7:6]` (CL/CS format, doubleword-granularity: `C.FLD`/`C.FSD`).
fn cl_double_offset(raw: u16) -> u32 {
    let b5_3 = u32::from(raw >> 10) & 0b111;
    let b7_6 = u32::from(raw >> 5) & 0b11;
    (b7_6 << 6) | (b5_3 << 3)
}

/// `uimm[5|4:2|7:6]` (CI format, word-granularity loads from `sp`: `C.LWSP`/`C.FLWSP`).
fn ci_word_offset(raw: u16) -> u32 {
    let b5 = u32::from(raw >> 12) & 1;
    let b4_2 = u32::from(raw >> 4) & 0b111;
    let b7_6 = u32::from(raw >> 2) & 0b11;
    (b7_6 << 6) | (b5 << 5) | (b4_2 << 2)
}

/// `uimm[5|4:3|8:6]` (CI format, doubleword-granularity loads from `sp`: `C.FLDSP`).
fn ci_double_offset(raw: u16) -> u32 {
    let b5 = u32::from(raw >> 12) & 1;
    let b4_3 = u32::from(raw >> 5) & 0b11;
    let b8_6 = u32::from(raw >> 2) & 0b111;
    (b8_6 << 6) | (b5 << 5) | (b4_3 << 3)
}

/// `uimm[5:2|7:6]` (CSS format, word-granularity stores to `sp`: `C.SWSP`/`C.FSWSP`).
fn css_word_offset(raw: u16) -> u32 {
    let b5_2 = u32::from(raw >> 9) & 0b1111;
    let b7_6 = u32::from(raw >> 7) & 0b11;
    (b7_6 << 6) | (b5_2 << 2)
}

/// `uimm[5:3|8:6]` (CSS format, doubleword-granularity stores to `sp`: `C.FSDSP`).
fn css_double_offset(raw: u16) -> u32 {
    let b5_3 = u32::from(raw >> 10) & 0b111;
    let b8_6 = u32::from(raw >> 7) & 0b111;
    (b8_6 << 6) | (b5_3 << 3)
}

/// `nzimm[5|4:0]` (CI/CB format, sign-extended: `C.ADDI`/`C.LI`/`C.ANDI`).
fn ci_imm6(raw: u16) -> i32 {
    let b5 = u32::from(raw >> 12) & 1;
    let b4_0 = u32::from(raw >> 2) & 0x1F;
    sign_extend((b5 << 5) | b4_0, 6)
}

/// `shamt[5|4:0]` (CI format, unsigned: `C.SLLI`/`C.SRLI`/`C.SRAI`). Bit `5` (raw bit 12) must be
/// clear for an RV32-native core: a set bit would request a shift amount `>= 32`, reserved at
/// this width.
fn ci_shamt(raw: u16) -> Result<u32, DecodeError> {
    if raw & (1 << 12) != 0 {
        return Err(DecodeError::IllegalInstruction);
    }
    Ok(u32::from(raw >> 2) & 0x1F)
}

/// `nzimm[9|4|6|8:7|5]` (CI format, sign-extended, multiple of 16: `C.ADDI16SP`).
fn ci_addi16sp_imm(raw: u16) -> i32 {
    let b9 = u32::from(raw >> 12) & 1;
    let b4 = u32::from(raw >> 6) & 1;
    let b6 = u32::from(raw >> 5) & 1;
    let b8_7 = u32::from(raw >> 3) & 0b11;
    let b5 = u32::from(raw >> 2) & 1;
    let imm = (b9 << 9) | (b8_7 << 7) | (b6 << 6) | (b5 << 5) | (b4 << 4);
    sign_extend(imm, 10)
}

/// `nzimm[17|16:12]` (CI format, sign-extended): `C.LUI`'s immediate occupies the same bit
/// positions as `lui`'s (bits `31:12`), so the result is returned pre-shifted.
fn ci_lui_imm(raw: u16) -> i32 {
    let b17 = u32::from(raw >> 12) & 1;
    let b16_12 = u32::from(raw >> 2) & 0x1F;
    let six = (b17 << 5) | b16_12;
    sign_extend(six, 6) << 12
}

/// `imm[8|4:3|7:6|2:1|5]` (CB format, sign-extended, multiple of 2: `C.BEQZ`/`C.BNEZ`).
fn cb_branch_offset(raw: u16) -> i32 {
    let b8 = u32::from(raw >> 12) & 1;
    let b4_3 = u32::from(raw >> 10) & 0b11;
    let b7_6 = u32::from(raw >> 5) & 0b11;
    let b2_1 = u32::from(raw >> 3) & 0b11;
    let b5 = u32::from(raw >> 2) & 1;
    let imm = (b8 << 8) | (b7_6 << 6) | (b5 << 5) | (b4_3 << 3) | (b2_1 << 1);
    sign_extend(imm, 9)
}

/// `imm[11|4|9:8|10|6|7|3:1|5]` (CJ format, sign-extended, multiple of 2: `C.J`/`C.JAL`).
fn cj_offset(raw: u16) -> i32 {
    let b11 = u32::from(raw >> 12) & 1;
    let b4 = u32::from(raw >> 11) & 1;
    let b9_8 = u32::from(raw >> 9) & 0b11;
    let b10 = u32::from(raw >> 8) & 1;
    let b6 = u32::from(raw >> 7) & 1;
    let b7 = u32::from(raw >> 6) & 1;
    let b3_1 = u32::from(raw >> 3) & 0b111;
    let b5 = u32::from(raw >> 2) & 1;
    let imm =
        (b11 << 11) | (b10 << 10) | (b9_8 << 8) | (b7 << 7) | (b6 << 6) | (b5 << 5) | (b4 << 4) | (b3_1 << 1);
    sign_extend(imm, 12)
}

// -- 32-bit instruction-word encoding ------------------------------------------------------------
//
// Mirror images of `instruction.rs`'s `rd`/`rs1`/`rs2`/`funct3`/`funct7`/immediate decoders: each
// function here places its fields at the same bit positions the base ISA's decode functions read
// them back from.

fn r_type(opcode: u32, funct3: u16, funct7: u32, rd: u32, rs1: u32, rs2: u32) -> u32 {
    opcode | (rd << 7) | (u32::from(funct3) << 12) | (rs1 << 15) | (rs2 << 20) | (funct7 << 25)
}

/// Like [`r_type`], but for the shift-immediate family whose `rs2` field holds `shamt` instead of
/// a register number.
fn i_shift_type(opcode: u32, funct3: u16, funct7: u32, rd: u32, rs1: u32, shamt: u32) -> u32 {
    r_type(opcode, funct3, funct7, rd, rs1, shamt)
}

fn i_type(opcode: u32, funct3: u16, rd: u32, rs1: u32, imm: i32) -> u32 {
    opcode | (rd << 7) | (u32::from(funct3) << 12) | (rs1 << 15) | ((imm as u32 & 0xFFF) << 20)
}

fn s_type(opcode: u32, funct3: u16, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let imm_4_0 = imm & 0x1F;
    let imm_11_5 = (imm >> 5) & 0x7F;
    opcode | (imm_4_0 << 7) | (u32::from(funct3) << 12) | (rs1 << 15) | (rs2 << 20) | (imm_11_5 << 25)
}

fn b_type(opcode: u32, funct3: u16, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let imm11 = (imm >> 11) & 1;
    let imm4_1 = (imm >> 1) & 0xF;
    let imm10_5 = (imm >> 5) & 0x3F;
    let imm12 = (imm >> 12) & 1;
    opcode
        | (imm11 << 7)
        | (imm4_1 << 8)
        | (u32::from(funct3) << 12)
        | (rs1 << 15)
        | (rs2 << 20)
        | (imm10_5 << 25)
        | (imm12 << 31)
}

fn u_type(opcode: u32, rd: u32, imm: i32) -> u32 {
    opcode | (rd << 7) | (imm as u32 & 0xFFFF_F000)
}

fn j_type(opcode: u32, rd: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    let imm19_12 = (imm >> 12) & 0xFF;
    let imm11 = (imm >> 11) & 1;
    let imm10_1 = (imm >> 1) & 0x3FF;
    let imm20 = (imm >> 20) & 1;
    opcode | (rd << 7) | (imm19_12 << 12) | (imm11 << 20) | (imm10_1 << 21) | (imm20 << 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::Instruction;

    #[test]
    fn all_zero_parcel_is_illegal() {
        assert!(expand(0x0000).is_err());
    }

    #[test]
    fn c_nop_expands_to_addi_x0_x0_0() {
        // funct3=000 (quadrant 1), rd=rs1=0, imm=0: the canonical encoding of C.NOP.
        let expanded = expand(0b000_0_00000_00000_01).unwrap();
        let decoded = Instruction::decode(expanded).unwrap();
        match decoded {
            Instruction::OpImm { dest, src, immediate, .. } => {
                assert_eq!(u8::from(dest), 0);
                assert_eq!(u8::from(src), 0);
                assert_eq!(immediate, 0);
            }
            other => panic!("expected OpImm, got {other:?}"),
        }
    }

    #[test]
    fn c_addi4spn_zero_immediate_is_reserved() {
        // rd' = x8, all immediate bits clear: the all-zero-immediate form is reserved.
        let raw = 0b000_00000000_000_00u16;
        assert!(expand(raw).is_err());
    }

    #[test]
    fn c_jr_ra_expands_to_jalr_x0_0_ra() {
        // quadrant 2, funct3=100, bit12=0, rd/rs1=x1 (ra), rs2=0.
        let raw = 0x8082u16;
        let expanded = expand(raw).unwrap();
        let decoded = Instruction::decode(expanded).unwrap();
        match decoded {
            Instruction::Jalr { dest, base, offset } => {
                assert_eq!(u8::from(dest), 0);
                assert_eq!(u8::from(base), 1);
                assert_eq!(offset, 0);
            }
            other => panic!("expected Jalr, got {other:?}"),
        }
    }

    #[test]
    fn c_ebreak_expands_to_ebreak() {
        let raw = 0x9002u16;
        let expanded = expand(raw).unwrap();
        let decoded = Instruction::decode(expanded).unwrap();
        assert!(matches!(decoded, Instruction::Ebreak));
    }

    #[test]
    fn c_jr_x0_is_reserved() {
        // rs1 == 0 is not a legal C.JR target.
        let raw = 0b1000_00000_00000_10u16;
        assert!(expand(raw).is_err());
    }

    #[test]
    fn c_lw_maps_compressed_registers_into_x8_x15() {
        // rs1' = 0b000 -> x8, rd' = 0b001 -> x9.
        let raw = 0b010_000_000_01_000_00u16;
        let expanded = expand(raw).unwrap();
        let decoded = Instruction::decode(expanded).unwrap();
        match decoded {
            Instruction::Load { dest, base, .. } => {
                assert_eq!(u8::from(dest), 9);
                assert_eq!(u8::from(base), 8);
            }
            other => panic!("expected Load, got {other:?}"),
        }
    }
}
