use log::trace;

use super::fpcsr::flags;
use super::mmu::MemoryError;
use super::status::ExtensionContextStatus;
use super::vcsr::VectorTypeState;
use crate::core::{Core, CsrSpecifier, Exception, ExecutionResult, InjectionKind};
use crate::fp_registers::{FpFormat, Specifier as FpSpecifier};
use crate::instruction::{
    CacheBlockOp, CsrOp, FenceOrderCombination, FpCompareOp, FpFmaOp, FpOp, RoundingMode,
    VectorIntOp, VectorWidth,
};
use crate::registers::{Registers, Specifier};
use crate::system_bus::SystemBus;
use crate::vector_registers::Specifier as VSpecifier;
use crate::{Alignment, Allocator, PrivilegeLevel, RawPrivilegeLevel};

#[derive(Debug)]
pub(super) struct Executor<'a, 'c, A: Allocator, B: SystemBus<A>> {
    pub allocator: &'a mut A,
    pub core: &'c Core<A, B>,
}

impl<'a, 'c, A: Allocator, B: SystemBus<A>> Executor<'a, 'c, A, B> {
    /// Executes an `addi` instruction.
    ///
    /// Corresponds to the assembly instruction `addi dest src immediate`.
    ///
    /// > ADDI adds the sign-extended 12-bit immediate to register rs1. Arithmetic overflow is
    /// > ignored and the result is simply the low XLEN bits of the result. ADDI rd, rs1, 0 is used
    /// > to implement the MV rd, rs1 assembler pseudoinstruction.
    pub fn addi(&mut self, dest: Specifier, src: Specifier, immediate: i32) -> ExecutionResult {
        trace!("Executing addi {dest} {src} {immediate}");
        self.reg_imm_op(dest, src, immediate, |s, imm| s.wrapping_add_signed(imm))
    }

    /// Executes a `slti` instruction.
    ///
    /// Corresponds to the assembly instruction `slti dest src immediate`.
    ///
    /// > SLTI (set less than immediate) places the value 1 in register rd if register rs1 is less
    /// > than the sign-extended immediate when both are treated as signed numbers, else 0 is
    /// > written to rd.
    pub fn slti(&mut self, dest: Specifier, src: Specifier, immediate: i32) -> ExecutionResult {
        trace!("Executing slti {dest} {src} {immediate}");
        self.reg_imm_op(dest, src, immediate, |s, imm| ((s as i32) < imm) as u32)
    }

    /// Executes a `sltiu` instruction.
    ///
    /// Corresponds to the assembly instruction `sltiu dest src immediate`.
    ///
    /// > SLTI (set less than immediate) places the value 1 in register rd if register rs1 is less
    /// > than the sign-extended immediate when both are treated as signed numbers, else 0 is
    /// > written to rd. SLTIU is similar but compares the values as unsigned numbers (i.e., the
    /// > immediate is first sign-extended to XLEN bits then treated as an unsigned number). Note,
    /// > SLTIU rd, rs1, 1 sets rd to 1 if rs1 equals zero, otherwise sets rd to 0 (assembler
    /// > pseudoinstruction SEQZ rd, rs).
    pub fn sltiu(&mut self, dest: Specifier, src: Specifier, immediate: i32) -> ExecutionResult {
        trace!("Executing sltiu {dest} {src} {immediate}");
        self.reg_imm_op(dest, src, immediate, |s, imm| (s < (imm as u32)) as u32)
    }

    /// Executes an `andi` instruction.
    ///
    /// Corresponds to the assembly instruction `andi dest src immediate`.
    ///
    /// > ANDI, ORI, XORI are logical operations that perform bitwise AND, OR, and XOR on register
    /// > rs1 and the sign-extended 12-bit immediate and place the result in rd.
    pub fn andi(&mut self, dest: Specifier, src: Specifier, immediate: i32) -> ExecutionResult {
        trace!("Executing andi {dest} {src} {immediate}");
        self.reg_imm_op(dest, src, immediate, |s, imm| s & (imm as u32))
    }

    /// Executes an `ori` instruction.
    ///
    /// Corresponds to the assembly instruction `ori dest src immediate`.
    ///
    /// > ANDI, ORI, XORI are logical operations that perform bitwise AND, OR, and XOR on register
    /// > rs1 and the sign-extended 12-bit immediate and place the result in rd.
    pub fn ori(&mut self, dest: Specifier, src: Specifier, immediate: i32) -> ExecutionResult {
        trace!("Executing ori {dest} {src} {immediate}");
        self.reg_imm_op(dest, src, immediate, |s, imm| s | (imm as u32))
    }

    /// Executes a `xori` instruction.
    ///
    /// Corresponds to the assembly instruction `xori dest src immediate`.
    ///
    /// > ANDI, ORI, XORI are logical operations that perform bitwise AND, OR, and XOR on register
    /// > rs1 and the sign-extended 12-bit immediate and place the result in rd. Note, XORI rd, rs1,
    /// > -1 performs a bitwise logical inversion of register rs1 (assembler pseudoinstruction NOT
    /// > rd, rs).
    pub fn xori(&mut self, dest: Specifier, src: Specifier, immediate: i32) -> ExecutionResult {
        trace!("Executing xori {dest} {src} {immediate}");
        self.reg_imm_op(dest, src, immediate, |s, imm| s ^ (imm as u32))
    }

    /// Executes a `slli` instruction.
    ///
    /// Corresponds to the assembly instruction `slli dest src shift_amount_u5`.
    ///
    /// > SLLI is a logical left shift (zeros are shifted into the lower bits).
    ///
    /// # Panics
    ///
    /// `shift_amount` must fit in a u5 (`0..=31`), otherwise this will panic.
    pub fn slli(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        trace!("Executing slli {dest} {src} {shift_amount_u5}");
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| s << shamt)
    }

    /// Executes a `srli` instruction.
    ///
    /// Corresponds to the assembly instruction `srli dest src shift_amount_u5`.
    ///
    /// > SRLI is a logical right shift (zeros are shifted into the upper bits).
    ///
    /// # Panics
    ///
    /// `shift_amount` must fit in a u5 (`0..=31`), otherwise this will panic.
    pub fn srli(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        trace!("Executing srli {dest} {src} {shift_amount_u5}");
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| s >> shamt)
    }

    /// Executes a `srai` instruction.
    ///
    /// Corresponds to the assembly instruction `srai dest src shift_amount_u5`.
    ///
    /// > SRAI is an arithmetic right shift (the original sign bit is copied into the vacated upper
    /// > bits).
    ///
    /// # Panics
    ///
    /// `shift_amount` must fit in a u5 (`0..=31`), otherwise this will panic.
    pub fn srai(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        trace!("Executing srai {dest} {src} {shift_amount_u5}");
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| {
            ((s as i32) >> shamt) as u32
        })
    }

    /// Executes a `lui` instruction.
    ///
    /// Corresponds to the assembly instruction `lui dest immediate`.
    ///
    /// > LUI (load upper immediate) is used to build 32-bit constants and uses the U-type format.
    /// > LUI places the U-immediate value in the top 20 bits of the destination register rd,
    /// > filling in the lowest 12 bits with zeros.
    ///
    /// Note that the bottom 12 bits of `immediate` need not be zero, they will always be discarded.
    pub fn lui(&mut self, dest: Specifier, immediate: i32) -> ExecutionResult {
        trace!("Executing lui {dest} {immediate}");
        let result = immediate as u32 & !0xFFF;
        let registers = self.core.registers_mut(self.allocator);
        registers.set_x(dest, result as u64);
        increment_pc(registers);
        Ok(())
    }

    /// Executes an `auipc` instruction.
    ///
    /// Corresponds to the assembly instruction `auipc dest immediate`.
    ///
    /// > AUIPC (add upper immediate to pc) is used to build pc-relative addresses and uses the
    /// > U-type format. AUIPC forms a 32-bit offset from the 20-bit U-immediate, filling in the
    /// > lowest 12 bits with zeros, adds this offset to the address of the AUIPC instruction, then
    /// > places the result in register rd.
    ///
    /// Note that the bottom 12 bits of `immediate` need not be zero, this will take care of that.
    pub fn auipc(&mut self, dest: Specifier, immediate: i32) -> ExecutionResult {
        trace!("Executing auipc {dest} {immediate}");
        let registers = self.core.registers_mut(self.allocator);
        let result = (registers.pc() as u32).wrapping_add_signed(immediate & !0xFFF);
        registers.set_x(dest, result as u64);
        increment_pc(registers);
        Ok(())
    }

    /// Executes an `add` instruction.
    ///
    /// Corresponds to the assembly instruction `add dest src1 src2`.
    ///
    /// > ADD performs the addition of rs1 and rs2.
    pub fn add(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing add {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.wrapping_add(s2))
    }

    /// Executes a `sub` instruction.
    ///
    /// Corresponds to the assembly instruction `sub dest src1 src2`.
    ///
    /// > SUB performs the subtraction of rs2 from rs1.
    pub fn sub(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing sub {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.wrapping_sub(s2))
    }

    /// Executes a `slt` instruction.
    ///
    /// Corresponds to the assembly instruction `slt dest src1 src2`.
    ///
    /// > SLT and SLTU perform signed and unsigned compares respectively, writing 1 to rd if
    /// > rs1 < rs2, 0 otherwise.
    pub fn slt(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing slt {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            ((s1 as i32) < (s2 as i32)) as u32
        })
    }

    /// Executes a `sltu` instruction.
    ///
    /// Corresponds to the assembly instruction `sltu dest src1 src2`.
    ///
    /// > SLT and SLTU perform signed and unsigned compares respectively, writing 1 to rd if
    /// > rs1 < rs2, 0 otherwise. Note, SLTU rd, x0, rs2 sets rd to 1 if rs2 is not equal to zero,
    /// > otherwise sets rd to zero (assembler pseudoinstruction SNEZ rd, rs).
    pub fn sltu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing sltu {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| (s1 < s2) as u32)
    }

    /// Executes an `and` instruction.
    ///
    /// Corresponds to the assembly instruction `and dest src1 src2`.
    ///
    /// > AND, OR, and XOR perform bitwise logical operations.
    pub fn and(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing and {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 & s2)
    }

    /// Executes an `or` instruction.
    ///
    /// Corresponds to the assembly instruction `or dest src1 src2`.
    ///
    /// > AND, OR, and XOR perform bitwise logical operations.
    pub fn or(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing or {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 | s2)
    }

    /// Executes an `xor` instruction.
    ///
    /// Corresponds to the assembly instruction `xor dest src1 src2`.
    ///
    /// > AND, OR, and XOR perform bitwise logical operations.
    pub fn xor(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing xor {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 ^ s2)
    }

    /// Executes a `sll` instruction.
    ///
    /// Corresponds to the assembly instruction `sll dest src1 src2`.
    ///
    /// > SLL, SRL, and SRA perform logical left, logical right, and arithmetic right shifts on the
    /// > value in register rs1 by the shift amount held in the lower 5 bits of register rs2.
    pub fn sll(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing sll {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 << (s2 & 0x1F))
    }

    /// Executes a `srl` instruction.
    ///
    /// Corresponds to the assembly instruction `srl dest src1 src2`.
    ///
    /// > SLL, SRL, and SRA perform logical left, logical right, and arithmetic right shifts on the
    /// > value in register rs1 by the shift amount held in the lower 5 bits of register rs2.
    pub fn srl(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing srl {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 >> (s2 & 0x1F))
    }

    /// Executes a `sra` instruction.
    ///
    /// Corresponds to the assembly instruction `sra dest src1 src2`.
    ///
    /// > SLL, SRL, and SRA perform logical left, logical right, and arithmetic right shifts on the
    /// > value in register rs1 by the shift amount held in the lower 5 bits of register rs2.
    pub fn sra(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing sra {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            ((s1 as i32) >> (s2 & 0x1F)) as u32
        })
    }

    /// Executes a `mul` instruction.
    ///
    /// Corresponds to the assembly instruction `mul dest src1 src2`.
    ///
    /// > MUL performs an XLEN-bit×XLEN-bit multiplication of rs1 by rs2 and places the lower XLEN
    /// > bits in the destination register.
    pub fn mul(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing mul {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.wrapping_mul(s2))
    }

    /// Executes a `mulh` instruction.
    ///
    /// Corresponds to the assembly instruction `mulh dest src1 src2`.
    ///
    /// > MUL performs an XLEN-bit×XLEN-bit multiplication of rs1 by rs2 and places the lower XLEN
    /// > bits in the destination register.
    /// > MULH, MULHU, and MULHSU perform the same multiplication but return the upper XLEN bits of
    /// > the full 2×XLEN-bit product, for signed×signed, unsigned×unsigned, and signed rs1×unsigned
    /// > rs2 multiplication, respectively.
    pub fn mulh(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing mulh {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            ((s1 as i32 as i64 * s2 as i32 as i64) >> 32) as u32
        })
    }

    /// Executes a `mulhsu` instruction.
    ///
    /// Corresponds to the assembly instruction `mulhsu dest src1 src2`.
    ///
    /// > MUL performs an XLEN-bit×XLEN-bit multiplication of rs1 by rs2 and places the lower XLEN
    /// > bits in the destination register.
    /// > MULH, MULHU, and MULHSU perform the same multiplication but return the upper XLEN bits of
    /// > the full 2×XLEN-bit product, for signed×signed, unsigned×unsigned, and signed rs1×unsigned
    /// > rs2 multiplication, respectively.
    pub fn mulhsu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing mulhsu {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            ((s1 as i32 as i64 * s2 as i64) >> 32) as u32
        })
    }

    /// Executes a `mulhu` instruction.
    ///
    /// Corresponds to the assembly instruction `mulhu dest src1 src2`.
    ///
    /// > MUL performs an XLEN-bit×XLEN-bit multiplication of rs1 by rs2 and places the lower XLEN
    /// > bits in the destination register.
    /// > MULH, MULHU, and MULHSU perform the same multiplication but return the upper XLEN bits of
    /// > the full 2×XLEN-bit product, for signed×signed, unsigned×unsigned, and signed rs1×unsigned
    /// > rs2 multiplication, respectively.
    pub fn mulhu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing mulhu {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            ((s1 as u64 * s2 as u64) >> 32) as u32
        })
    }

    /// Executes a `div` instruction.
    ///
    /// Corresponds to the assembly instruction `div dest src1 src2`.
    ///
    /// > DIV and DIVU perform an XLEN bits by XLEN bits signed and unsigned integer division of rs1
    /// > by rs2, rounding towards zero.
    ///
    /// > The quotient of division by zero has all bits set, and the remainder of division by zero
    /// > equals the dividend. Signed division overflow occurs only when the most-negative integer
    /// > is divided by −1. The quotient of a signed division with overflow is equal to the
    /// > dividend, and the remainder is zero. Unsigned division overflow cannot occur.
    pub fn div(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing div {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| match s2 == 0 {
            true => 0xFFFF_FFFF,
            false => (s1 as i32).overflowing_div(s2 as i32).0 as u32,
        })
    }

    /// Executes a `divu` instruction.
    ///
    /// Corresponds to the assembly instruction `divu dest src1 src2`.
    ///
    /// > DIV and DIVU perform an XLEN bits by XLEN bits signed and unsigned integer division of rs1
    /// > by rs2, rounding towards zero.
    ///
    /// > The quotient of division by zero has all bits set, and the remainder of division by zero
    /// > equals the dividend. Signed division overflow occurs only when the most-negative integer
    /// > is divided by −1. The quotient of a signed division with overflow is equal to the
    /// > dividend, and the remainder is zero. Unsigned division overflow cannot occur.
    pub fn divu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing divu {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            s1.checked_div(s2).unwrap_or(0xFFFF_FFFF)
        })
    }

    /// Executes a `rem` instruction.
    ///
    /// Corresponds to the assembly instruction `rem dest src1 src2`.
    ///
    /// > REM and REMU provide the remainder of the corresponding division operation. For REM, the
    /// > sign of the result equals the sign of the dividend.
    ///
    /// > The quotient of division by zero has all bits set, and the remainder of division by zero
    /// > equals the dividend. Signed division overflow occurs only when the most-negative integer
    /// > is divided by −1. The quotient of a signed division with overflow is equal to the
    /// > dividend, and the remainder is zero. Unsigned division overflow cannot occur.
    pub fn rem(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing rem {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| match s2 == 0 {
            true => s1,
            false => (s1 as i32).overflowing_rem(s2 as i32).0 as u32,
        })
    }

    /// Executes a `remu` instruction.
    ///
    /// Corresponds to the assembly instruction `remu dest src1 src2`.
    ///
    /// > REM and REMU provide the remainder of the corresponding division operation. For REM, the
    /// > sign of the result equals the sign of the dividend.
    ///
    /// > The quotient of division by zero has all bits set, and the remainder of division by zero
    /// > equals the dividend. Signed division overflow occurs only when the most-negative integer
    /// > is divided by −1. The quotient of a signed division with overflow is equal to the
    /// > dividend, and the remainder is zero. Unsigned division overflow cannot occur.
    pub fn remu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing remu {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.checked_rem(s2).unwrap_or(s1))
    }

    /// Executes a `sh1add` instruction (`Zba`).
    ///
    /// > SH1ADD performs the calculation (rs1 << 1) + rs2.
    pub fn sh1add(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing sh1add {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| (s1 << 1).wrapping_add(s2))
    }

    /// Executes a `sh2add` instruction (`Zba`).
    ///
    /// > SH2ADD performs the calculation (rs1 << 2) + rs2.
    pub fn sh2add(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing sh2add {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| (s1 << 2).wrapping_add(s2))
    }

    /// Executes a `sh3add` instruction (`Zba`).
    ///
    /// > SH3ADD performs the calculation (rs1 << 3) + rs2.
    pub fn sh3add(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing sh3add {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| (s1 << 3).wrapping_add(s2))
    }

    /// Executes an `andn` instruction (`Zbb`).
    ///
    /// > ANDN, ORN, XNOR are bitwise logical operations that invert rs2 before applying the
    /// > logical operation.
    pub fn andn(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing andn {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 & !s2)
    }

    /// Executes an `orn` instruction (`Zbb`).
    pub fn orn(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing orn {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 | !s2)
    }

    /// Executes an `xnor` instruction (`Zbb`).
    pub fn xnor(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing xnor {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| !(s1 ^ s2))
    }

    /// Executes a `max` instruction (`Zbb`).
    ///
    /// > MAX and MAXU are signed and unsigned variants of the maximum operation.
    pub fn max(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing max {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            (s1 as i32).max(s2 as i32) as u32
        })
    }

    /// Executes a `maxu` instruction (`Zbb`).
    pub fn maxu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing maxu {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.max(s2))
    }

    /// Executes a `min` instruction (`Zbb`).
    ///
    /// > MIN and MINU are signed and unsigned variants of the minimum operation.
    pub fn min(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing min {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| {
            (s1 as i32).min(s2 as i32) as u32
        })
    }

    /// Executes a `minu` instruction (`Zbb`).
    pub fn minu(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing minu {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.min(s2))
    }

    /// Executes a `rol` instruction (`Zbb`).
    ///
    /// > ROL, ROLW, ROR, RORW, RORI, RORIW, perform rotate left and right operations.
    pub fn rol(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing rol {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.rotate_left(s2 & 0x1F))
    }

    /// Executes a `ror` instruction (`Zbb`).
    pub fn ror(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing ror {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1.rotate_right(s2 & 0x1F))
    }

    /// Executes a `rori` instruction (`Zbb`): rotate right by immediate.
    pub fn rori(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        trace!("Executing rori {dest} {src} {shift_amount_u5}");
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| s.rotate_right(shamt))
    }

    /// Executes a `zext.h` instruction (`Zbb`): zero-extend the low halfword. `src2` is unused
    /// (the encoding fixes it to `x0`).
    pub fn zext_h(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        _src2: Specifier,
    ) -> ExecutionResult {
        trace!("Executing zext.h {dest} {src1}");
        self.reg_reg_op(dest, src1, src1, |s1, _| s1 & 0xFFFF)
    }

    /// Executes a `bclr` instruction (`Zbs`).
    ///
    /// > BCLR, BCLRI clear a single bit, whose index is specified by rs2/shamt, in rs1.
    pub fn bclr(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing bclr {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 & !(1u32 << (s2 & 0x1F)))
    }

    /// Executes a `bext` instruction (`Zbs`).
    ///
    /// > BEXT, BEXTI extract a single bit, whose index is specified by rs2/shamt, from rs1 and
    /// > write it to the least significant bit of rd, clearing all other bits.
    pub fn bext(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing bext {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| (s1 >> (s2 & 0x1F)) & 1)
    }

    /// Executes a `binv` instruction (`Zbs`).
    ///
    /// > BINV, BINVI toggle a single bit, whose index is specified by rs2/shamt, in rs1.
    pub fn binv(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing binv {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 ^ (1u32 << (s2 & 0x1F)))
    }

    /// Executes a `bset` instruction (`Zbs`).
    ///
    /// > BSET, BSETI set a single bit, whose index is specified by rs2/shamt, in rs1.
    pub fn bset(&mut self, dest: Specifier, src1: Specifier, src2: Specifier) -> ExecutionResult {
        trace!("Executing bset {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| s1 | (1u32 << (s2 & 0x1F)))
    }

    /// Executes a `bclri` instruction (`Zbs`): clear a single bit selected by immediate.
    pub fn bclri(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        trace!("Executing bclri {dest} {src} {shift_amount_u5}");
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| s & !(1u32 << shamt))
    }

    /// Executes a `bexti` instruction (`Zbs`): extract a single bit selected by immediate.
    pub fn bexti(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        trace!("Executing bexti {dest} {src} {shift_amount_u5}");
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| (s >> shamt) & 1)
    }

    /// Executes a `binvi` instruction (`Zbs`): invert a single bit selected by immediate.
    pub fn binvi(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        trace!("Executing binvi {dest} {src} {shift_amount_u5}");
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| s ^ (1u32 << shamt))
    }

    /// Executes a `bseti` instruction (`Zbs`): set a single bit selected by immediate.
    pub fn bseti(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
    ) -> ExecutionResult {
        trace!("Executing bseti {dest} {src} {shift_amount_u5}");
        self.reg_shamt_op(dest, src, shift_amount_u5, |s, shamt| s | (1u32 << shamt))
    }

    /// Executes a `clz` instruction (`Zbb`): count leading zero bits.
    pub fn clz(&mut self, dest: Specifier, src: Specifier) -> ExecutionResult {
        trace!("Executing clz {dest} {src}");
        self.unary_op(dest, src, |s| s.leading_zeros())
    }

    /// Executes a `ctz` instruction (`Zbb`): count trailing zero bits.
    pub fn ctz(&mut self, dest: Specifier, src: Specifier) -> ExecutionResult {
        trace!("Executing ctz {dest} {src}");
        self.unary_op(dest, src, |s| s.trailing_zeros())
    }

    /// Executes a `cpop` instruction (`Zbb`): count (population) set bits.
    pub fn cpop(&mut self, dest: Specifier, src: Specifier) -> ExecutionResult {
        trace!("Executing cpop {dest} {src}");
        self.unary_op(dest, src, |s| s.count_ones())
    }

    /// Executes a `sext.b` instruction (`Zbb`): sign-extend the low byte.
    pub fn sext_b(&mut self, dest: Specifier, src: Specifier) -> ExecutionResult {
        trace!("Executing sext.b {dest} {src}");
        self.unary_op(dest, src, |s| (s as i8) as u32)
    }

    /// Executes a `sext.h` instruction (`Zbb`): sign-extend the low halfword.
    pub fn sext_h(&mut self, dest: Specifier, src: Specifier) -> ExecutionResult {
        trace!("Executing sext.h {dest} {src}");
        self.unary_op(dest, src, |s| (s as i16) as u32)
    }

    /// Executes an `orc.b` instruction (`Zbb`): byte-wise OR-combine.
    ///
    /// > ORC.B sets the bits of each byte in the result to all zeros or all ones, if any bit
    /// > within that byte of the source operand is zero or one respectively.
    pub fn orc_b(&mut self, dest: Specifier, src: Specifier) -> ExecutionResult {
        trace!("Executing orc.b {dest} {src}");
        self.unary_op(dest, src, |s| {
            let mut result = 0u32;
            for i in 0..4 {
                let byte = (s >> (i * 8)) & 0xFF;
                if byte != 0 {
                    result |= 0xFFu32 << (i * 8);
                }
            }
            result
        })
    }

    /// Executes a `rev8` instruction (`Zbb`): reverse the order of the bytes in `src`.
    pub fn rev8(&mut self, dest: Specifier, src: Specifier) -> ExecutionResult {
        trace!("Executing rev8 {dest} {src}");
        self.unary_op(dest, src, |s| s.swap_bytes())
    }

    /// Executes a `czero.eqz` instruction (`Zicond`).
    ///
    /// > czero.eqz rd, rs1, rs2: if rs2 is zero, rd is set to zero, otherwise rd is set to rs1.
    pub fn czero_eqz(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
    ) -> ExecutionResult {
        trace!("Executing czero.eqz {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| if s2 == 0 { 0 } else { s1 })
    }

    /// Executes a `czero.nez` instruction (`Zicond`).
    ///
    /// > czero.nez rd, rs1, rs2: if rs2 is nonzero, rd is set to zero, otherwise rd is set to rs1.
    pub fn czero_nez(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
    ) -> ExecutionResult {
        trace!("Executing czero.nez {dest} {src1} {src2}");
        self.reg_reg_op(dest, src1, src2, |s1, s2| if s2 != 0 { 0 } else { s1 })
    }

    pub fn jal(&mut self, dest: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing jal {dest} {offset}");
        self.jump_op(dest, |registers| {
            (registers.pc() as u32).wrapping_add_signed(offset)
        })
    }

    pub fn jalr(&mut self, dest: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing jalr {dest} {base} {offset}");
        self.jump_op(dest, |registers| {
            (registers.x(base) as u32).wrapping_add_signed(offset) & !1
        })
    }

    pub fn beq(&mut self, src1: Specifier, src2: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing beq {src1} {src2} {offset}");
        self.cond_branch(src1, src2, offset, |s1, s2| s1 == s2)
    }

    pub fn bne(&mut self, src1: Specifier, src2: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing bne {src1} {src2} {offset}");
        self.cond_branch(src1, src2, offset, |s1, s2| s1 != s2)
    }

    pub fn blt(&mut self, src1: Specifier, src2: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing blt {src1} {src2} {offset}");
        self.cond_branch(src1, src2, offset, |s1, s2| (s1 as i32) < (s2 as i32))
    }

    pub fn bltu(&mut self, src1: Specifier, src2: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing bltu {src1} {src2} {offset}");
        self.cond_branch(src1, src2, offset, |s1, s2| s1 < s2)
    }

    pub fn bge(&mut self, src1: Specifier, src2: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing bge {src1} {src2} {offset}");
        self.cond_branch(src1, src2, offset, |s1, s2| (s1 as i32) >= (s2 as i32))
    }

    pub fn bgeu(&mut self, src1: Specifier, src2: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing bgeu {src1} {src2} {offset}");
        self.cond_branch(src1, src2, offset, |s1, s2| s1 >= s2)
    }

    pub fn lb(&mut self, dest: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing lb {dest} {offset}({base})");
        self.load_op(dest, base, offset, |this, address| {
            this.core
                .mmu()
                .read_byte(this.allocator, address)
                .map(|value| value as i8 as u32)
        })
    }

    pub fn lbu(&mut self, dest: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing lbu {dest} {offset}({base})");
        self.load_op(dest, base, offset, |this, address| {
            this.core
                .mmu()
                .read_byte(this.allocator, address)
                .map(|value| value as u32)
        })
    }

    pub fn lh(&mut self, dest: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing lh {dest} {offset}({base})");
        self.load_op(dest, base, offset, |this, address| {
            this.core
                .mmu()
                .read_halfword(this.allocator, address)
                .map(|value| value as i16 as u32)
        })
    }

    pub fn lhu(&mut self, dest: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing lhu {dest} {offset}({base})");
        self.load_op(dest, base, offset, |this, address| {
            this.core
                .mmu()
                .read_halfword(this.allocator, address)
                .map(|value| value as u32)
        })
    }

    pub fn lw(&mut self, dest: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing lw {dest} {offset}({base})");
        self.load_op(dest, base, offset, |this, address| {
            this.core.mmu().read_word(this.allocator, address)
        })
    }

    pub fn sb(&mut self, src: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing sb {src} {offset}({base})");
        self.store_op(src, base, offset, |this, address, value| {
            this.core
                .mmu()
                .write_byte(this.allocator, address, value as u8)
        })
    }

    pub fn sh(&mut self, src: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing sh {src} {offset}({base})");
        self.store_op(src, base, offset, |this, address, value| {
            this.core
                .mmu()
                .write_halfword(this.allocator, address, value as u16)
        })
    }

    pub fn sw(&mut self, src: Specifier, base: Specifier, offset: i32) -> ExecutionResult {
        trace!("Executing sw {src} {offset}({base})");
        self.store_op(src, base, offset, |this, address, value| {
            this.core.mmu().write_word(this.allocator, address, value)
        })
    }

    pub fn lr(&mut self, dest: Specifier, _src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing lr {dest}, ({addr})");
        self.load_op(dest, addr, 0, |this, address| {
            if !Alignment::WORD.is_aligned(address) {
                return Err(MemoryError::MisalignedAccess);
            }
            this.core.mmu().read_word(this.allocator, address)
        })
    }

    pub fn sc(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing sc {dest}, {src}, ({addr})");
        self.store_op(src, addr, 0, |this, address, value| {
            if !Alignment::WORD.is_aligned(address) {
                return Err(MemoryError::MisalignedAccess);
            }
            // Since only one core is supported, sc always succeeds.
            this.core.registers_mut(this.allocator).set_x(dest, 0);
            this.core.mmu().write_word(this.allocator, address, value)
        })
    }

    pub fn amoswap(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amoswap {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |_, reg| reg)
    }

    pub fn amoadd(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amoadd {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |mem, reg| mem.wrapping_add(reg))
    }

    pub fn amoand(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amoand {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |mem, reg| mem & reg)
    }

    pub fn amoor(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amoor {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |mem, reg| mem | reg)
    }

    pub fn amoxor(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amoxor {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |mem, reg| mem ^ reg)
    }

    pub fn amomax(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amomax {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |mem, reg| {
            (mem as i32).max(reg as i32) as u32
        })
    }

    pub fn amomin(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amomin {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |mem, reg| {
            (mem as i32).min(reg as i32) as u32
        })
    }

    pub fn amomaxu(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amomaxu {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |mem, reg| mem.max(reg))
    }

    pub fn amominu(&mut self, dest: Specifier, src: Specifier, addr: Specifier) -> ExecutionResult {
        trace!("Executing amominu {dest}, {src}, ({addr})");
        self.amo_op(dest, src, addr, |mem, reg| mem.min(reg))
    }

    pub fn fence(
        &mut self,
        predecessor: FenceOrderCombination,
        successor: FenceOrderCombination,
    ) -> ExecutionResult {
        trace!(predecessor:?, successor:?; "Executing fence");
        // Since only one core is supported, this is equivalent to a nop instruction.
        let _ = predecessor;
        let _ = successor;
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    pub fn fence_i(&mut self) -> ExecutionResult {
        trace!("Executing fence.i");
        // There is no instruction cache to synchronize against a preceding store, so this is
        // equivalent to a nop instruction.
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    pub fn cache_block_management(&mut self, op: CacheBlockOp, base: Specifier) -> ExecutionResult {
        trace!(op:?; "Executing cbo.{{inval,clean,flush}} ({base})");
        // There is no data cache, so invalidating, cleaning or flushing a block has no
        // architecturally visible effect beyond retiring.
        let _ = op;
        let _ = self.core.registers(self.allocator).x(base);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    pub fn cache_block_zero(&mut self, base: Specifier) -> ExecutionResult {
        trace!("Executing cbo.zero ({base})");
        let address = self.core.registers(self.allocator).x(base) as u32;
        let block_address = address & !(CACHE_BLOCK_SIZE - 1);
        if let Some(exception) = self.core.take_injected_exception(
            self.allocator,
            InjectionKind::Store,
            0,
            block_address,
        ) {
            return Err(exception);
        }
        self.core
            .mmu()
            .write_range(self.allocator, block_address, &[0u8; CACHE_BLOCK_SIZE as usize])
            .map_err(|err| match err {
                MemoryError::MisalignedAccess => Exception::StoreOrAmoAddressMisaligned(block_address),
                MemoryError::AccessFault => Exception::StoreOrAmoAccessFault(block_address),
                MemoryError::PageFault => Exception::StoreOrAmoPageFault(block_address),
            })?;
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    pub fn ecall(&mut self) -> ExecutionResult {
        trace!("Executing ecall");
        match self.core.privilege_mode(self.allocator) {
            PrivilegeLevel::User => Err(Exception::EnvironmentCallFromUMode),
            PrivilegeLevel::Supervisor => Err(Exception::EnvironmentCallFromSMode),
            PrivilegeLevel::Machine => Err(Exception::EnvironmentCallFromMMode),
        }
    }

    pub fn ebreak(&mut self) -> ExecutionResult {
        trace!("Executing ebreak");
        Err(Exception::Breakpoint)
    }

    /// Executes a `csrrw` instruction.
    ///
    /// Corresponds to the assembly instruction `csrrw dest csr src`.
    ///
    /// > The CSRRW (Atomic Read/Write CSR) instruction atomically swaps values in the CSRs and
    /// > integer registers. CSRRW reads the old value of the CSR, zero-extends the value to XLEN
    /// > bits, then writes it to integer register rd. The initial value in rs1 is written to the
    /// > CSR. If rd=x0, then the instruction shall not read the CSR and shall not cause any of the
    /// > side effects that might occur on a CSR read.
    ///
    /// > A CSRRW with rs1=x0 will attempt to write zero to the destination CSR.
    ///
    /// > Attempts to access a non-existent CSR raise an illegal instruction exception. Attempts to
    /// > access a CSR without appropriate privilege level or to write a read-only register also
    /// > raise illegal instruction exceptions. A read/write register might also contain some bits
    /// > that are read-only, in which case writes to the read-only bits are ignored.
    pub fn csrrw(&mut self, dest: Specifier, csr: CsrSpecifier, src: Specifier) -> ExecutionResult {
        trace!("Executing csrrw {dest} {csr} {src}");
        self.csr_reg_op(CsrOp::ReadWrite, dest, csr, src)
    }

    /// Executes a `csrrs` instruction.
    ///
    /// Corresponds to the assembly instruction `csrrs dest csr src`.
    ///
    /// > The CSRRS (Atomic Read and Set Bits in CSR) instruction reads the value of the CSR,
    /// > zero-extends the value to XLEN bits, and writes it to integer register rd. The initial
    /// > value in integer register rs1 is treated as a bit mask that specifies bit positions to be
    /// > set in the CSR. Any bit that is high in rs1 will cause the corresponding bit to be set in
    /// > the CSR, if that CSR bit is writable. Other bits in the CSR are unaffected (though CSRs
    /// > might have side effects when written).
    ///
    /// > For both CSRRS and CSRRC, if rs1=x0, then the instruction will not write to the CSR at
    /// > all, and so shall not cause any of the side effects that might otherwise occur on a CSR
    /// > write, such as raising illegal instruction exceptions on accesses to read-only CSRs. Both
    /// > CSRRS and CSRRC always read the addressed CSR and cause any read side effects regardless
    /// > of rs1 and rd fields. Note that if rs1 specifies a register holding a zero value other
    /// > than x0, the instruction will still attempt to write the unmodified value back to the CSR
    /// > and will cause any attendant side effects.
    ///
    /// > Attempts to access a non-existent CSR raise an illegal instruction exception. Attempts to
    /// > access a CSR without appropriate privilege level or to write a read-only register also
    /// > raise illegal instruction exceptions. A read/write register might also contain some bits
    /// > that are read-only, in which case writes to the read-only bits are ignored.
    pub fn csrrs(&mut self, dest: Specifier, csr: CsrSpecifier, src: Specifier) -> ExecutionResult {
        trace!("Executing csrrs {dest} {csr} {src}");
        self.csr_reg_op(CsrOp::ReadSet, dest, csr, src)
    }

    /// Executes a `csrrc` instruction.
    ///
    /// Corresponds to the assembly instruction `csrrc dest csr src`.
    ///
    /// > The CSRRC (Atomic Read and Clear Bits in CSR) instruction reads the value of the CSR,
    /// > zero-extends the value to XLEN bits, and writes it to integer register rd. The initial
    /// > value in integer register rs1 is treated as a bit mask that specifies bit positions to be
    /// > cleared in the CSR. Any bit that is high in rs1 will cause the corresponding bit to be
    /// > cleared in the CSR, if that CSR bit is writable. Other bits in the CSR are unaffected.
    ///
    /// > For both CSRRS and CSRRC, if rs1=x0, then the instruction will not write to the CSR at
    /// > all, and so shall not cause any of the side effects that might otherwise occur on a CSR
    /// > write, such as raising illegal instruction exceptions on accesses to read-only CSRs. Both
    /// > CSRRS and CSRRC always read the addressed CSR and cause any read side effects regardless
    /// > of rs1 and rd fields. Note that if rs1 specifies a register holding a zero value other
    /// > than x0, the instruction will still attempt to write the unmodified value back to the CSR
    /// > and will cause any attendant side effects. A CSRRW with rs1=x0 will attempt to write zero
    /// > to the destination CSR.
    ///
    /// > Attempts to access a non-existent CSR raise an illegal instruction exception. Attempts to
    /// > access a CSR without appropriate privilege level or to write a read-only register also
    /// > raise illegal instruction exceptions. A read/write register might also contain some bits
    /// > that are read-only, in which case writes to the read-only bits are ignored.
    pub fn csrrc(&mut self, dest: Specifier, csr: CsrSpecifier, src: Specifier) -> ExecutionResult {
        trace!("Executing csrrc {dest} {csr} {src}");
        self.csr_reg_op(CsrOp::ReadClear, dest, csr, src)
    }

    /// Executes a `csrrwi` instruction.
    ///
    /// Corresponds to the assembly instruction `csrrwi dest csr immediate`.
    ///
    /// > The CSRRWI, CSRRSI, and CSRRCI variants are similar to CSRRW, CSRRS, and CSRRC
    /// > respectively, except they update the CSR using an XLEN-bit value obtained by
    /// > zero-extending a 5-bit unsigned immediate (uimm[4:0]) field encoded in the rs1 field
    /// > instead of a value from an integer register.
    ///
    /// > For CSRRWI, if rd=x0, then the instruction shall not read the CSR and shall not cause any
    /// > of the side effects that might occur on a CSR read.
    ///
    /// > Attempts to access a non-existent CSR raise an illegal instruction exception. Attempts to
    /// > access a CSR without appropriate privilege level or to write a read-only register also
    /// > raise illegal instruction exceptions. A read/write register might also contain some bits
    /// > that are read-only, in which case writes to the read-only bits are ignored.
    pub fn csrrwi(
        &mut self,
        dest: Specifier,
        csr: CsrSpecifier,
        immediate: u32,
    ) -> ExecutionResult {
        trace!("Executing csrrwi {dest} {csr} {immediate}");
        self.csr_imm_op(CsrOp::ReadWrite, dest, csr, immediate)
    }

    /// Executes a `csrrsi` instruction.
    ///
    /// Corresponds to the assembly instruction `csrrsi dest csr immediate`.
    ///
    /// > The CSRRWI, CSRRSI, and CSRRCI variants are similar to CSRRW, CSRRS, and CSRRC
    /// > respectively, except they update the CSR using an XLEN-bit value obtained by
    /// > zero-extending a 5-bit unsigned immediate (uimm[4:0]) field encoded in the rs1 field
    /// > instead of a value from an integer register. For CSRRSI and CSRRCI, if the uimm[4:0] field
    /// > is zero, then these instructions will not write to the CSR, and shall not cause any of the
    /// > side effects that might otherwise occur on a CSR write.
    ///
    /// > Both CSRRSI and CSRRCI will always read the CSR and cause any read side effects regardless
    /// > of rd and rs1 fields.
    ///
    /// > Attempts to access a non-existent CSR raise an illegal instruction exception. Attempts to
    /// > access a CSR without appropriate privilege level or to write a read-only register also
    /// > raise illegal instruction exceptions. A read/write register might also contain some bits
    /// > that are read-only, in which case writes to the read-only bits are ignored.
    pub fn csrrsi(
        &mut self,
        dest: Specifier,
        csr: CsrSpecifier,
        immediate: u32,
    ) -> ExecutionResult {
        trace!("Executing csrrsi {dest} {csr} {immediate}");
        self.csr_imm_op(CsrOp::ReadSet, dest, csr, immediate)
    }

    /// Executes a `csrrci` instruction.
    ///
    /// Corresponds to the assembly instruction `csrrci dest csr immediate`.
    ///
    /// > The CSRRWI, CSRRSI, and CSRRCI variants are similar to CSRRW, CSRRS, and CSRRC
    /// > respectively, except they update the CSR using an XLEN-bit value obtained by
    /// > zero-extending a 5-bit unsigned immediate (uimm[4:0]) field encoded in the rs1 field
    /// > instead of a value from an integer register. For CSRRSI and CSRRCI, if the uimm[4:0] field
    /// > is zero, then these instructions will not write to the CSR, and shall not cause any of the
    /// > side effects that might otherwise occur on a CSR write.
    ///
    /// > Both CSRRSI and CSRRCI will always read the CSR and cause any read side effects regardless
    /// > of rd and rs1 fields.
    ///
    /// > Attempts to access a non-existent CSR raise an illegal instruction exception. Attempts to
    /// > access a CSR without appropriate privilege level or to write a read-only register also
    /// > raise illegal instruction exceptions. A read/write register might also contain some bits
    /// > that are read-only, in which case writes to the read-only bits are ignored.
    pub fn csrrci(
        &mut self,
        dest: Specifier,
        csr: CsrSpecifier,
        immediate: u32,
    ) -> ExecutionResult {
        trace!("Executing csrrci {dest} {csr} {immediate}");
        self.csr_imm_op(CsrOp::ReadClear, dest, csr, immediate)
    }

    pub fn sret(&mut self) -> ExecutionResult {
        trace!("Executing sret");
        if self.core.privilege_mode(self.allocator) < PrivilegeLevel::Supervisor {
            return Err(Exception::IllegalInstruction(None));
        }
        let status = self.core.status.get_mut(self.allocator);
        if status.tsr() {
            return Err(Exception::IllegalInstruction(None));
        }
        let pp = status.spp();
        // Set xIE to xPIE.
        status.set_sie(status.spie());
        // Set xPIE = 1.
        status.set_spie(true);
        // Set xPP to lowest supported privilege level, which is U-mode.
        status.set_spp(RawPrivilegeLevel::User);
        // Set MPRV=0 if xPP != M.
        if pp != PrivilegeLevel::Machine {
            status.set_mprv(false);
        }
        // Set core's privilege mode to xPP.
        *self.core.privilege_mode.get_mut(self.allocator) = pp;
        // Set pc to xepc.
        let sepc = self.core.trap.get(self.allocator).read_sepc();
        self.core
            .registers_mut(self.allocator)
            .set_pc(sepc as u64);
        Ok(())
    }

    pub fn mret(&mut self) -> ExecutionResult {
        trace!("Executing mret");
        if self.core.privilege_mode(self.allocator) < PrivilegeLevel::Machine {
            return Err(Exception::IllegalInstruction(None));
        }
        let status = self.core.status.get_mut(self.allocator);
        let pp = status.mpp();
        // Set xIE to xPIE.
        status.set_mie(status.mpie());
        // Set xPIE = 1.
        status.set_mpie(true);
        // Set xPP to lowest supported privilege level, which is U-mode.
        status.set_mpp(RawPrivilegeLevel::User);
        // Set MPRV=0 if xPP != M.
        if pp != PrivilegeLevel::Machine {
            status.set_mprv(false);
        }
        // Set core's privilege mode to xPP.
        *self.core.privilege_mode.get_mut(self.allocator) = pp;
        // Set pc to xepc.
        let mepc = self.core.trap.get(self.allocator).read_mepc();
        self.core
            .registers_mut(self.allocator)
            .set_pc(mepc as u64);
        Ok(())
    }

    pub fn wfi(&mut self) -> ExecutionResult {
        trace!("Executing wfi");
        if self.core.privilege_mode(self.allocator) < PrivilegeLevel::Machine
            && self.core.status.get(self.allocator).tw()
        {
            return Err(Exception::IllegalInstruction(None));
        }
        // Implemented as a nop, which is allowed.
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes `wrs.nto`/`wrs.sto` (Zawrs): waits, bounded by an implementation-defined number
    /// of retired instructions, for a store to the current reservation set. Subject to the same
    /// `mstatus.TW` trap-on-wait-for-interrupt rule as [`Self::wfi`], since both are "stall until
    /// some external event, else keep retiring" instructions gated by the same privileged-mode
    /// concern. Implemented as a nop: the core has no timing model to bound a real stall against,
    /// so it always behaves as if the bound elapsed immediately.
    pub fn wrs(&mut self) -> ExecutionResult {
        trace!("Executing wrs");
        if self.core.privilege_mode(self.allocator) < PrivilegeLevel::Machine
            && self.core.status.get(self.allocator).tw()
        {
            return Err(Exception::IllegalInstruction(None));
        }
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes `sfence.vma rs1, rs2`: flushes cached address translations, restricted to `rs1`'s
    /// virtual address and/or `rs2`'s ASID unless either is `x0` (meaning "all addresses"/"all
    /// ASIDs" respectively).
    pub fn sfence_vma(&mut self, vaddr: Specifier, asid: Specifier) -> ExecutionResult {
        trace!("Executing sfence.vma {vaddr} {asid}");
        if self.core.status.get(self.allocator).tvm() {
            return Err(Exception::IllegalInstruction(None));
        }
        let vaddr = (vaddr != Specifier::X0)
            .then(|| self.core.registers(self.allocator).x(vaddr) as u32);
        let asid =
            (asid != Specifier::X0).then(|| self.core.registers(self.allocator).x(asid) as u32);
        self.core.tlb.get_mut(self.allocator).flush(vaddr, asid);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Whether hypervisor-class instructions and CSRs may currently execute: the H extension must
    /// be configured in.
    fn check_h_access(&self) -> ExecutionResult {
        if !self.core.h_accessible(self.allocator) {
            return Err(Exception::IllegalInstruction(None));
        }
        Ok(())
    }

    /// Executes `hfence.vvma rs1, rs2`. A no-op: this implementation caches no VS-stage
    /// translations to flush.
    pub fn hfence_vvma(&mut self, vaddr: Specifier, asid: Specifier) -> ExecutionResult {
        trace!("Executing hfence.vvma {vaddr} {asid}");
        self.check_h_access()?;
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes `hfence.gvma rs1, rs2`. A no-op: this implementation does not perform two-stage
    /// address translation, so there is no G-stage TLB to flush.
    pub fn hfence_gvma(&mut self, gaddr: Specifier, vmid: Specifier) -> ExecutionResult {
        trace!("Executing hfence.gvma {gaddr} {vmid}");
        self.check_h_access()?;
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes `hlv.b`/`hlv.bu`. Since two-stage address translation is not implemented, this
    /// behaves identically to [`Self::lb`]/[`Self::lbu`] rather than performing the
    /// guest-physical access the real instruction describes.
    pub fn hlv_b(&mut self, dest: Specifier, base: Specifier, unsigned: bool) -> ExecutionResult {
        trace!(
            "Executing hlv.b{} {dest} ({base})",
            if unsigned { "u" } else { "" }
        );
        self.check_h_access()?;
        self.load_op(dest, base, 0, move |this, address| {
            this.core
                .mmu()
                .read_byte(this.allocator, address)
                .map(|value| if unsigned { value as u32 } else { value as i8 as u32 })
        })
    }

    /// Executes `hlv.h`/`hlv.hu`. See [`Self::hlv_b`].
    pub fn hlv_h(&mut self, dest: Specifier, base: Specifier, unsigned: bool) -> ExecutionResult {
        trace!(
            "Executing hlv.h{} {dest} ({base})",
            if unsigned { "u" } else { "" }
        );
        self.check_h_access()?;
        self.load_op(dest, base, 0, move |this, address| {
            this.core
                .mmu()
                .read_halfword(this.allocator, address)
                .map(|value| if unsigned { value as u32 } else { value as i16 as u32 })
        })
    }

    /// Executes `hlv.w`. See [`Self::hlv_b`].
    pub fn hlv_w(&mut self, dest: Specifier, base: Specifier) -> ExecutionResult {
        trace!("Executing hlv.w {dest} ({base})");
        self.check_h_access()?;
        self.load_op(dest, base, 0, |this, address| {
            this.core.mmu().read_word(this.allocator, address)
        })
    }

    /// Executes `hsv.b`. Since two-stage address translation is not implemented, this behaves
    /// identically to [`Self::sb`] rather than performing the guest-physical access the real
    /// instruction describes.
    pub fn hsv_b(&mut self, src: Specifier, base: Specifier) -> ExecutionResult {
        trace!("Executing hsv.b {src} ({base})");
        self.check_h_access()?;
        self.store_op(src, base, 0, |this, address, value| {
            this.core.mmu().write_byte(this.allocator, address, value as u8)
        })
    }

    /// Executes `hsv.h`. See [`Self::hsv_b`].
    pub fn hsv_h(&mut self, src: Specifier, base: Specifier) -> ExecutionResult {
        trace!("Executing hsv.h {src} ({base})");
        self.check_h_access()?;
        self.store_op(src, base, 0, |this, address, value| {
            this.core
                .mmu()
                .write_halfword(this.allocator, address, value as u16)
        })
    }

    /// Executes `hsv.w`. See [`Self::hsv_b`].
    pub fn hsv_w(&mut self, src: Specifier, base: Specifier) -> ExecutionResult {
        trace!("Executing hsv.w {src} ({base})");
        self.check_h_access()?;
        self.store_op(src, base, 0, |this, address, value| {
            this.core.mmu().write_word(this.allocator, address, value)
        })
    }

    /// Executes an `flw`/`fld` instruction.
    ///
    /// > FLW loads a single-precision floating-point value from memory into floating-point
    /// > register rd. FLD loads a double-precision floating-point value from memory into
    /// > floating-point register rd.
    pub fn fp_load(
        &mut self,
        format: FpFormat,
        dest: FpSpecifier,
        base: Specifier,
        offset: i32,
    ) -> ExecutionResult {
        trace!("Executing fp load {format:?} {dest} {offset}({base})");
        self.check_fp_access(format)?;
        let address =
            (self.core.registers(self.allocator).x(base) as u32).wrapping_add_signed(offset);
        if let Some(exception) =
            self.core
                .take_injected_exception(self.allocator, InjectionKind::Load, 0, address)
        {
            return Err(exception);
        }
        let value = match format {
            FpFormat::H => self
                .core
                .mmu()
                .read_halfword(self.allocator, address)
                .map(u64::from),
            FpFormat::S => self
                .core
                .mmu()
                .read_word(self.allocator, address)
                .map(u64::from),
            FpFormat::D => self.core.mmu().read_doubleword(self.allocator, address),
        }
        .map_err(|err| match err {
            MemoryError::MisalignedAccess => Exception::LoadAddressMisaligned(address),
            MemoryError::AccessFault => Exception::LoadAccessFault(address),
            MemoryError::PageFault => Exception::LoadPageFault(address),
        })?;
        self.core
            .fp_registers_mut(self.allocator)
            .write(dest, format, value);
        self.core
            .status
            .get_mut(self.allocator)
            .set_fs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fsw`/`fsd` instruction.
    ///
    /// > FSW stores a single-precision value from floating-point register rs2 to memory. FSD
    /// > stores a double-precision value from the floating-point registers to memory.
    pub fn fp_store(
        &mut self,
        format: FpFormat,
        src: FpSpecifier,
        base: Specifier,
        offset: i32,
    ) -> ExecutionResult {
        trace!("Executing fp store {format:?} {src} {offset}({base})");
        self.check_fp_access(format)?;
        let address =
            (self.core.registers(self.allocator).x(base) as u32).wrapping_add_signed(offset);
        if let Some(exception) =
            self.core
                .take_injected_exception(self.allocator, InjectionKind::Store, 0, address)
        {
            return Err(exception);
        }
        let value = self.core.fp_registers(self.allocator).read(src, format);
        let result = match format {
            FpFormat::H => self
                .core
                .mmu()
                .write_halfword(self.allocator, address, value as u16),
            FpFormat::S => self
                .core
                .mmu()
                .write_word(self.allocator, address, value as u32),
            FpFormat::D => self
                .core
                .mmu()
                .write_doubleword(self.allocator, address, value),
        };
        result.map_err(|err| match err {
            MemoryError::MisalignedAccess => Exception::StoreOrAmoAddressMisaligned(address),
            MemoryError::AccessFault => Exception::StoreOrAmoAccessFault(address),
            MemoryError::PageFault => Exception::StoreOrAmoPageFault(address),
        })?;
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fadd`/`fsub`/`fmul`/`fdiv`/`fsgnj(n/x)`/`fmin`/`fmax` instruction.
    ///
    /// Arithmetic (add/sub/mul/div) is always computed round-to-nearest-even: Rust's safe
    /// floating-point operators don't expose control over the hardware rounding mode, so
    /// `rounding_mode` is accepted (and validated when dynamic) but otherwise unused here. Only
    /// the `NV`/`DZ`/`OF` accrued-exception flags are accurately computed; `UF`/`NX` are left
    /// clear for arithmetic results.
    pub fn fp_op(
        &mut self,
        op: FpOp,
        format: FpFormat,
        dest: FpSpecifier,
        src1: FpSpecifier,
        src2: FpSpecifier,
        rounding_mode: RoundingMode,
    ) -> ExecutionResult {
        trace!("Executing fp {op:?}.{format:?} {dest} {src1} {src2}");
        self.check_fp_access(format)?;
        self.core
            .fp_csr
            .get(self.allocator)
            .resolve_rounding_mode(rounding_mode)
            .ok_or(Exception::IllegalInstruction(None))?;
        let fp_registers = self.core.fp_registers(self.allocator);
        let a = fp_registers.read(src1, format);
        let b = fp_registers.read(src2, format);
        let (result, raised) = match format {
            FpFormat::D => {
                let (r, raised) = fp_binary(op, f64::from_bits64(a), f64::from_bits64(b));
                (r.to_bits64(), raised)
            }
            FpFormat::S | FpFormat::H => {
                let (r, raised) = fp_binary(op, f32::from_bits64(a), f32::from_bits64(b));
                (r.to_bits64(), raised)
            }
        };
        self.core
            .fp_registers_mut(self.allocator)
            .write(dest, format, result);
        self.core.fp_csr.get_mut(self.allocator).accrue(raised);
        self.core
            .status
            .get_mut(self.allocator)
            .set_fs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fsqrt` instruction. See [`Self::fp_op`] for the rounding-mode caveat.
    pub fn fp_sqrt(
        &mut self,
        format: FpFormat,
        dest: FpSpecifier,
        src: FpSpecifier,
        rounding_mode: RoundingMode,
    ) -> ExecutionResult {
        trace!("Executing fsqrt.{format:?} {dest} {src}");
        self.check_fp_access(format)?;
        self.core
            .fp_csr
            .get(self.allocator)
            .resolve_rounding_mode(rounding_mode)
            .ok_or(Exception::IllegalInstruction(None))?;
        let a = self.core.fp_registers(self.allocator).read(src, format);
        let (result, raised) = match format {
            FpFormat::D => {
                let (r, raised) = fp_sqrt_kernel(f64::from_bits64(a));
                (r.to_bits64(), raised)
            }
            FpFormat::S | FpFormat::H => {
                let (r, raised) = fp_sqrt_kernel(f32::from_bits64(a));
                (r.to_bits64(), raised)
            }
        };
        self.core
            .fp_registers_mut(self.allocator)
            .write(dest, format, result);
        self.core.fp_csr.get_mut(self.allocator).accrue(raised);
        self.core
            .status
            .get_mut(self.allocator)
            .set_fs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fmadd`/`fmsub`/`fnmsub`/`fnmadd` instruction. See [`Self::fp_op`] for the
    /// rounding-mode caveat; the fused product-then-add is still computed without an
    /// intermediate rounding step, via [`f32::mul_add`]/[`f64::mul_add`].
    pub fn fp_fma(
        &mut self,
        op: FpFmaOp,
        format: FpFormat,
        dest: FpSpecifier,
        src1: FpSpecifier,
        src2: FpSpecifier,
        src3: FpSpecifier,
        rounding_mode: RoundingMode,
    ) -> ExecutionResult {
        trace!("Executing fp fma {op:?}.{format:?} {dest} {src1} {src2} {src3}");
        self.check_fp_access(format)?;
        self.core
            .fp_csr
            .get(self.allocator)
            .resolve_rounding_mode(rounding_mode)
            .ok_or(Exception::IllegalInstruction(None))?;
        let fp_registers = self.core.fp_registers(self.allocator);
        let a = fp_registers.read(src1, format);
        let b = fp_registers.read(src2, format);
        let c = fp_registers.read(src3, format);
        let (result, raised) = match format {
            FpFormat::D => {
                let (r, raised) = fp_fma_kernel(
                    op,
                    f64::from_bits64(a),
                    f64::from_bits64(b),
                    f64::from_bits64(c),
                );
                (r.to_bits64(), raised)
            }
            FpFormat::S | FpFormat::H => {
                let (r, raised) = fp_fma_kernel(
                    op,
                    f32::from_bits64(a),
                    f32::from_bits64(b),
                    f32::from_bits64(c),
                );
                (r.to_bits64(), raised)
            }
        };
        self.core
            .fp_registers_mut(self.allocator)
            .write(dest, format, result);
        self.core.fp_csr.get_mut(self.allocator).accrue(raised);
        self.core
            .status
            .get_mut(self.allocator)
            .set_fs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `feq`/`flt`/`fle` instruction.
    pub fn fp_compare(
        &mut self,
        op: FpCompareOp,
        format: FpFormat,
        dest: Specifier,
        src1: FpSpecifier,
        src2: FpSpecifier,
    ) -> ExecutionResult {
        trace!("Executing fp compare {op:?}.{format:?} {dest} {src1} {src2}");
        self.check_fp_access(format)?;
        let fp_registers = self.core.fp_registers(self.allocator);
        let a = fp_registers.read(src1, format);
        let b = fp_registers.read(src2, format);
        let (result, raised) = match format {
            FpFormat::D => fp_compare_kernel(op, f64::from_bits64(a), f64::from_bits64(b)),
            FpFormat::S | FpFormat::H => {
                fp_compare_kernel(op, f32::from_bits64(a), f32::from_bits64(b))
            }
        };
        self.core
            .registers_mut(self.allocator)
            .set_x(dest, result as u64);
        self.core.fp_csr.get_mut(self.allocator).accrue(raised);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fclass` instruction. Never raises an accrued-exception flag, even for a
    /// signaling NaN input, per the ISA manual.
    pub fn fp_classify(
        &mut self,
        format: FpFormat,
        dest: Specifier,
        src: FpSpecifier,
    ) -> ExecutionResult {
        trace!("Executing fclass.{format:?} {dest} {src}");
        self.check_fp_access(format)?;
        let a = self.core.fp_registers(self.allocator).read(src, format);
        let result = match format {
            FpFormat::D => fp_classify_kernel(f64::from_bits64(a)),
            FpFormat::S | FpFormat::H => fp_classify_kernel(f32::from_bits64(a)),
        };
        self.core
            .registers_mut(self.allocator)
            .set_x(dest, result as u64);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fcvt.w.fmt`/`fcvt.wu.fmt` instruction. Unlike arithmetic, the rounding mode
    /// is honored exactly, since the conversion is performed explicitly rather than delegated to
    /// a hardware FPU; `NV` is raised for NaN/infinite/out-of-range inputs (which saturate to the
    /// boundary value, per the ISA manual) and `NX` whenever rounding discarded a fraction.
    pub fn fp_to_int(
        &mut self,
        format: FpFormat,
        signed: bool,
        dest: Specifier,
        src: FpSpecifier,
        rounding_mode: RoundingMode,
    ) -> ExecutionResult {
        trace!("Executing fcvt.{} {format:?} {dest} {src}", if signed { "w" } else { "wu" });
        self.check_fp_access(format)?;
        let rounding_mode = self
            .core
            .fp_csr
            .get(self.allocator)
            .resolve_rounding_mode(rounding_mode)
            .ok_or(Exception::IllegalInstruction(None))?;
        let a = self.core.fp_registers(self.allocator).read(src, format);
        let (result, raised) = match format {
            FpFormat::D => fp_to_int_kernel(rounding_mode, signed, f64::from_bits64(a)),
            FpFormat::S | FpFormat::H => fp_to_int_kernel(rounding_mode, signed, f32::from_bits64(a)),
        };
        self.core
            .registers_mut(self.allocator)
            .set_x(dest, result as u64);
        self.core.fp_csr.get_mut(self.allocator).accrue(raised);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fcvt.fmt.w`/`fcvt.fmt.wu` instruction. The integer-to-float conversion
    /// itself is always performed round-to-nearest-even (see [`Self::fp_op`]'s caveat), but `NX`
    /// is still accurately detected by comparing against a round-trip back to integer.
    pub fn fp_from_int(
        &mut self,
        format: FpFormat,
        signed: bool,
        dest: FpSpecifier,
        src: Specifier,
        rounding_mode: RoundingMode,
    ) -> ExecutionResult {
        trace!("Executing fcvt.{format:?}.{} {dest} {src}", if signed { "w" } else { "wu" });
        self.check_fp_access(format)?;
        self.core
            .fp_csr
            .get(self.allocator)
            .resolve_rounding_mode(rounding_mode)
            .ok_or(Exception::IllegalInstruction(None))?;
        let value = self.core.registers(self.allocator).x(src) as u32;
        let (result, raised) = match format {
            FpFormat::D => {
                let (r, raised) = fp_from_int_kernel::<f64>(signed, value);
                (r.to_bits64(), raised)
            }
            FpFormat::S | FpFormat::H => {
                let (r, raised) = fp_from_int_kernel::<f32>(signed, value);
                (r.to_bits64(), raised)
            }
        };
        self.core
            .fp_registers_mut(self.allocator)
            .write(dest, format, result);
        self.core.fp_csr.get_mut(self.allocator).accrue(raised);
        self.core
            .status
            .get_mut(self.allocator)
            .set_fs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fcvt.s.d`/`fcvt.d.s` instruction. Widening (`S` to `D`) is always exact;
    /// narrowing (`D` to `S`) rounds round-to-nearest-even and can raise `OF`/`NX`.
    pub fn fp_convert_format(
        &mut self,
        to: FpFormat,
        from: FpFormat,
        dest: FpSpecifier,
        src: FpSpecifier,
        rounding_mode: RoundingMode,
    ) -> ExecutionResult {
        trace!("Executing fcvt.{to:?}.{from:?} {dest} {src}");
        self.check_fp_access(to)?;
        self.check_fp_access(from)?;
        self.core
            .fp_csr
            .get(self.allocator)
            .resolve_rounding_mode(rounding_mode)
            .ok_or(Exception::IllegalInstruction(None))?;
        let bits = self.core.fp_registers(self.allocator).read(src, from);
        let (result, raised) = match from {
            FpFormat::D => {
                let (r, raised) = fp_narrow_kernel(f64::from_bits64(bits));
                (r.to_bits64(), raised)
            }
            FpFormat::S | FpFormat::H => {
                let (r, raised) = fp_widen_kernel(f32::from_bits64(bits));
                (r.to_bits64(), raised)
            }
        };
        self.core
            .fp_registers_mut(self.allocator)
            .write(dest, to, result);
        self.core.fp_csr.get_mut(self.allocator).accrue(raised);
        self.core
            .status
            .get_mut(self.allocator)
            .set_fs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fmv.x.w` instruction: moves the raw bit pattern of an `f` register into an
    /// `x` register, unmodified (no NaN-quieting, no flags).
    pub fn fp_move_to_int(
        &mut self,
        format: FpFormat,
        dest: Specifier,
        src: FpSpecifier,
    ) -> ExecutionResult {
        trace!("Executing fmv.x.{format:?} {dest} {src}");
        self.check_fp_access(format)?;
        let bits = self.core.fp_registers(self.allocator).read(src, format);
        self.core.registers_mut(self.allocator).set_x(dest, bits);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `fmv.w.x` instruction: moves the raw bit pattern of an `x` register into an
    /// `f` register, NaN-boxed.
    pub fn fp_move_from_int(
        &mut self,
        format: FpFormat,
        dest: FpSpecifier,
        src: Specifier,
    ) -> ExecutionResult {
        trace!("Executing fmv.{format:?}.x {dest} {src}");
        self.check_fp_access(format)?;
        let bits = self.core.registers(self.allocator).x(src) as u32;
        self.core
            .fp_registers_mut(self.allocator)
            .write(dest, format, u64::from(bits));
        self.core
            .status
            .get_mut(self.allocator)
            .set_fs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes a `vsetvli` instruction.
    pub fn vector_set_vli(
        &mut self,
        dest: Specifier,
        avl_src: Specifier,
        raw_vtype: u32,
    ) -> ExecutionResult {
        trace!("Executing vsetvli {dest} {avl_src} {raw_vtype:#x}");
        let avl = self.resolve_register_avl(avl_src, dest);
        self.vector_set_common(dest, avl, raw_vtype)
    }

    /// Executes a `vsetivli` instruction. Unlike `vsetvli`/`vsetvl`, the AVL is always the
    /// instruction's own 5-bit immediate: there is no "keep current vl" encoding.
    pub fn vector_set_ivli(&mut self, dest: Specifier, avl: u32, raw_vtype: u32) -> ExecutionResult {
        trace!("Executing vsetivli {dest} {avl} {raw_vtype:#x}");
        self.vector_set_common(dest, avl, raw_vtype)
    }

    /// Executes a `vsetvl` instruction: as `vsetvli`, but the new `vtype` is read from a register
    /// rather than encoded in the instruction.
    pub fn vector_set_vl(
        &mut self,
        dest: Specifier,
        avl_src: Specifier,
        vtype_src: Specifier,
    ) -> ExecutionResult {
        trace!("Executing vsetvl {dest} {avl_src} {vtype_src}");
        self.check_v_access()?;
        let avl = self.resolve_register_avl(avl_src, dest);
        let raw_vtype = self.core.registers(self.allocator).x(vtype_src) as u32;
        self.apply_vset(dest, avl, raw_vtype)
    }

    /// Resolves the AVL operand shared by `vsetvli`/`vsetvl`: read from `avl_src` unless it's
    /// `x0`, in which case the AVL is `VLMAX` if `dest != x0`, or the current `vl` is kept
    /// unchanged (`dest == x0` too, i.e. `rd` and `rs1` are both `x0`).
    fn resolve_register_avl(&self, avl_src: Specifier, dest: Specifier) -> u32 {
        if avl_src != Specifier::X0 {
            self.core.registers(self.allocator).x(avl_src) as u32
        } else if dest != Specifier::X0 {
            u32::MAX
        } else {
            self.core.vector_csr.get(self.allocator).read_vl()
        }
    }

    fn vector_set_common(&mut self, dest: Specifier, avl: u32, raw_vtype: u32) -> ExecutionResult {
        self.check_v_access()?;
        self.apply_vset(dest, avl, raw_vtype)
    }

    fn apply_vset(&mut self, dest: Specifier, avl: u32, raw_vtype: u32) -> ExecutionResult {
        let vlen = self.core.vector_registers(self.allocator).vlen();
        let new_vl = self
            .core
            .vector_csr
            .get_mut(self.allocator)
            .set_vtype_and_vl(vlen, raw_vtype, avl);
        self.core.registers_mut(self.allocator).set_x(dest, new_vl as u64);
        self.core
            .status
            .get_mut(self.allocator)
            .set_vs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes a `vle8.v`/`vle16.v`/`vle32.v`/`vle64.v` unit-stride vector load.
    ///
    /// Only elements `vstart..vl` are touched; masked-off elements (`mask_bit(i) == false` when
    /// `masked`) and the tail (`vl..VLMAX`) are left undisturbed, matching the vector extension's
    /// default (non-agnostic) behavior. `vstart` is reset to `0` once the instruction completes
    /// without faulting; a fault partway through leaves `vstart` at the faulting element so a trap
    /// handler can resume the instruction.
    pub fn vector_load(
        &mut self,
        eew: VectorWidth,
        dest: VSpecifier,
        base: Specifier,
        masked: bool,
    ) -> ExecutionResult {
        trace!("Executing vector load {eew:?} {dest} ({base}){}", if masked { " masked" } else { "" });
        self.check_v_access()?;
        let width = eew.bytes();
        let base_address = self.core.registers(self.allocator).x(base) as u32;
        let vl = self.core.vector_csr.get(self.allocator).read_vl();
        let vstart = self.core.vector_csr.get(self.allocator).read_vstart();
        for elem_ix in vstart..vl {
            if masked && !self.core.vector_registers(self.allocator).mask_bit(elem_ix as usize) {
                continue;
            }
            let address = base_address.wrapping_add(elem_ix.wrapping_mul(width as u32));
            if let Some(exception) = self.core.take_injected_exception(
                self.allocator,
                InjectionKind::Load,
                elem_ix,
                address,
            ) {
                self.core.vector_csr.get_mut(self.allocator).write_vstart(elem_ix);
                return Err(exception);
            }
            let value = match width {
                1 => self.core.mmu().read_byte(self.allocator, address).map(u64::from),
                2 => self.core.mmu().read_halfword(self.allocator, address).map(u64::from),
                4 => self.core.mmu().read_word(self.allocator, address).map(u64::from),
                8 => self.core.mmu().read_doubleword(self.allocator, address),
                _ => unreachable!("VectorWidth::bytes() only ever returns 1, 2, 4, or 8"),
            }
            .map_err(|err| match err {
                MemoryError::MisalignedAccess => Exception::LoadAddressMisaligned(address),
                MemoryError::AccessFault => Exception::LoadAccessFault(address),
                MemoryError::PageFault => Exception::LoadPageFault(address),
            });
            let value = match value {
                Ok(value) => value,
                Err(exception) => {
                    self.core.vector_csr.get_mut(self.allocator).write_vstart(elem_ix);
                    return Err(exception);
                }
            };
            self.core
                .vector_registers_mut(self.allocator)
                .write_element(dest, elem_ix as usize, width, value);
        }
        self.core.vector_csr.get_mut(self.allocator).write_vstart(0);
        self.core
            .status
            .get_mut(self.allocator)
            .set_vs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes a `vse8.v`/`vse16.v`/`vse32.v`/`vse64.v` unit-stride vector store. See
    /// [`Self::vector_load`] for the masking/`vstart` semantics.
    pub fn vector_store(
        &mut self,
        eew: VectorWidth,
        src: VSpecifier,
        base: Specifier,
        masked: bool,
    ) -> ExecutionResult {
        trace!("Executing vector store {eew:?} {src} ({base}){}", if masked { " masked" } else { "" });
        self.check_v_access()?;
        let width = eew.bytes();
        let base_address = self.core.registers(self.allocator).x(base) as u32;
        let vl = self.core.vector_csr.get(self.allocator).read_vl();
        let vstart = self.core.vector_csr.get(self.allocator).read_vstart();
        for elem_ix in vstart..vl {
            if masked && !self.core.vector_registers(self.allocator).mask_bit(elem_ix as usize) {
                continue;
            }
            let address = base_address.wrapping_add(elem_ix.wrapping_mul(width as u32));
            if let Some(exception) = self.core.take_injected_exception(
                self.allocator,
                InjectionKind::Store,
                elem_ix,
                address,
            ) {
                self.core.vector_csr.get_mut(self.allocator).write_vstart(elem_ix);
                return Err(exception);
            }
            let value =
                self.core
                    .vector_registers(self.allocator)
                    .read_element(src, elem_ix as usize, width);
            let result = match width {
                1 => self.core.mmu().write_byte(self.allocator, address, value as u8),
                2 => self.core.mmu().write_halfword(self.allocator, address, value as u16),
                4 => self.core.mmu().write_word(self.allocator, address, value as u32),
                8 => self.core.mmu().write_doubleword(self.allocator, address, value),
                _ => unreachable!("VectorWidth::bytes() only ever returns 1, 2, 4, or 8"),
            };
            if let Err(err) = result {
                let exception = match err {
                    MemoryError::MisalignedAccess => Exception::StoreOrAmoAddressMisaligned(address),
                    MemoryError::AccessFault => Exception::StoreOrAmoAccessFault(address),
                    MemoryError::PageFault => Exception::StoreOrAmoPageFault(address),
                };
                self.core.vector_csr.get_mut(self.allocator).write_vstart(elem_ix);
                return Err(exception);
            }
        }
        self.core.vector_csr.get_mut(self.allocator).write_vstart(0);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Executes an `OPIVV` vector-vector integer arithmetic instruction (`vadd.vv`/`vsub.vv`/
    /// `vand.vv`/`vor.vv`/`vxor.vv`): `vd[i] = vs2[i] op vs1[i]` for `i` in `vstart..vl`. Element
    /// width and count come from the active `vtype`/`vl`, not from the encoding. See
    /// [`Self::vector_load`] for the masking/`vstart` semantics.
    pub fn vector_op_ivv(
        &mut self,
        op: VectorIntOp,
        dest: VSpecifier,
        vs2: VSpecifier,
        vs1: VSpecifier,
        masked: bool,
    ) -> ExecutionResult {
        trace!("Executing vector {op:?} {dest}, {vs2}, {vs1}{}", if masked { " masked" } else { "" });
        self.check_v_access()?;
        let width = match self.core.vector_csr.get(self.allocator).vector_type() {
            VectorTypeState::Valid { sew, .. } => (sew.bits() / 8) as usize,
            VectorTypeState::Illegal => return Err(Exception::IllegalInstruction(None)),
        };
        let vl = self.core.vector_csr.get(self.allocator).read_vl();
        let vstart = self.core.vector_csr.get(self.allocator).read_vstart();
        for elem_ix in vstart..vl {
            if masked && !self.core.vector_registers(self.allocator).mask_bit(elem_ix as usize) {
                continue;
            }
            let a = self
                .core
                .vector_registers(self.allocator)
                .read_element(vs2, elem_ix as usize, width);
            let b = self
                .core
                .vector_registers(self.allocator)
                .read_element(vs1, elem_ix as usize, width);
            let result = match op {
                VectorIntOp::Add => a.wrapping_add(b),
                VectorIntOp::Sub => a.wrapping_sub(b),
                VectorIntOp::And => a & b,
                VectorIntOp::Or => a | b,
                VectorIntOp::Xor => a ^ b,
            };
            self.core
                .vector_registers_mut(self.allocator)
                .write_element(dest, elem_ix as usize, width, result);
        }
        self.core.vector_csr.get_mut(self.allocator).write_vstart(0);
        self.core
            .status
            .get_mut(self.allocator)
            .set_vs(ExtensionContextStatus::Dirty);
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    /// Whether vector-class instructions may currently execute: the V extension must be
    /// configured in and `mstatus.VS` must not be `Off`.
    fn check_v_access(&self) -> ExecutionResult {
        if !self.core.v_accessible(self.allocator) {
            return Err(Exception::IllegalInstruction(None));
        }
        Ok(())
    }

    /// Whether FP-class instructions using `format` may currently execute: the F extension must
    /// be configured in and `mstatus.FS` must not be `Off`, and `format` being `D` additionally
    /// requires the D extension.
    fn check_fp_access(&self, format: FpFormat) -> ExecutionResult {
        if !self.core.fp_accessible(self.allocator) {
            return Err(Exception::IllegalInstruction(None));
        }
        if format == FpFormat::D && !self.core.config().d_enabled {
            return Err(Exception::IllegalInstruction(None));
        }
        Ok(())
    }

    // Private generic implementations

    fn reg_imm_op<F>(
        &mut self,
        dest: Specifier,
        src: Specifier,
        immediate: i32,
        op: F,
    ) -> ExecutionResult
    where
        F: FnOnce(u32, i32) -> u32,
    {
        let registers = self.core.registers_mut(self.allocator);
        let result = op(registers.x(src) as u32, immediate);
        registers.set_x(dest, result as u64);
        increment_pc(registers);
        Ok(())
    }

    fn reg_shamt_op<F>(
        &mut self,
        dest: Specifier,
        src: Specifier,
        shift_amount_u5: u32,
        op: F,
    ) -> ExecutionResult
    where
        F: FnOnce(u32, u32) -> u32,
    {
        if shift_amount_u5 > 31 {
            panic!("out of range u5 used");
        }
        let registers = self.core.registers_mut(self.allocator);
        let result = op(registers.x(src) as u32, shift_amount_u5);
        registers.set_x(dest, result as u64);
        increment_pc(registers);
        Ok(())
    }

    fn unary_op<F>(&mut self, dest: Specifier, src: Specifier, op: F) -> ExecutionResult
    where
        F: FnOnce(u32) -> u32,
    {
        let registers = self.core.registers_mut(self.allocator);
        let result = op(registers.x(src) as u32);
        registers.set_x(dest, result as u64);
        increment_pc(registers);
        Ok(())
    }

    fn reg_reg_op<F>(
        &mut self,
        dest: Specifier,
        src1: Specifier,
        src2: Specifier,
        op: F,
    ) -> ExecutionResult
    where
        F: FnOnce(u32, u32) -> u32,
    {
        let registers = self.core.registers_mut(self.allocator);
        let result = op(registers.x(src1) as u32, registers.x(src2) as u32);
        registers.set_x(dest, result as u64);
        increment_pc(registers);
        Ok(())
    }

    /// First argument op `op` is the value from memory, the second from `src`.
    fn amo_op<F>(
        &mut self,
        dest: Specifier,
        src: Specifier,
        addr: Specifier,
        op: F,
    ) -> ExecutionResult
    where
        F: Fn(u32, u32) -> u32,
    {
        let registers = self.core.registers(self.allocator);
        let address = registers.x(addr) as u32;

        if !Alignment::WORD.is_aligned(address) {
            return Err(Exception::LoadAddressMisaligned(address));
        }

        let src_value = registers.x(src) as u32;

        let mem_value =
            self.core
                .mmu()
                .read_word(self.allocator, address)
                .map_err(|err| match err {
                    MemoryError::MisalignedAccess => Exception::LoadAddressMisaligned(address),
                    MemoryError::AccessFault => Exception::LoadAccessFault(address),
                    MemoryError::PageFault => Exception::StoreOrAmoPageFault(address),
                })?;

        let new_value = op(mem_value, src_value);

        self.core
            .mmu()
            .write_word(self.allocator, address, new_value)
            .map_err(|err| match err {
                MemoryError::MisalignedAccess => Exception::LoadAddressMisaligned(address),
                MemoryError::AccessFault => Exception::LoadAccessFault(address),
                MemoryError::PageFault => Exception::StoreOrAmoPageFault(address),
            })?;

        let registers = self.core.registers_mut(self.allocator);
        registers.set_x(dest, mem_value as u64);
        increment_pc(registers);
        Ok(())
    }

    fn jump_op<F>(&mut self, dest: Specifier, compute_target: F) -> ExecutionResult
    where
        F: FnOnce(&Registers) -> u32,
    {
        let registers = self.core.registers_mut(self.allocator);
        // Compute target pc
        let new_pc = compute_target(registers);
        // Check target pc is word-aligned
        if !Alignment::WORD.is_aligned(new_pc) {
            return Err(Exception::InstructionAddressMisaligned(new_pc));
        }
        // Update pc to target
        let old_pc = registers.pc() as u32;
        registers.set_pc(new_pc as u64);
        // Write incremented old pc to `dest` register
        registers.set_x(dest, old_pc.wrapping_add(4) as u64);
        Ok(())
    }

    // Takes the branch if `predicate` returns `true`.
    fn cond_branch<P>(
        &mut self,
        src1: Specifier,
        src2: Specifier,
        offset: i32,
        predicate: P,
    ) -> ExecutionResult
    where
        P: FnOnce(u32, u32) -> bool,
    {
        let registers = self.core.registers_mut(self.allocator);
        if predicate(registers.x(src1) as u32, registers.x(src2) as u32) {
            let new_pc = (registers.pc() as u32).wrapping_add_signed(offset);
            // Check target pc is word-aligned
            if !Alignment::WORD.is_aligned(new_pc) {
                return Err(Exception::InstructionAddressMisaligned(new_pc));
            }
            registers.set_pc(new_pc as u64);
        } else {
            increment_pc(registers);
        }
        Ok(())
    }

    fn load_op<F>(
        &mut self,
        dest: Specifier,
        base: Specifier,
        offset: i32,
        op: F,
    ) -> ExecutionResult
    where
        F: FnOnce(&mut Self, u32) -> Result<u32, MemoryError>,
    {
        let registers = self.core.registers(self.allocator);
        let address = (registers.x(base) as u32).wrapping_add_signed(offset);
        if let Some(exception) =
            self.core
                .take_injected_exception(self.allocator, InjectionKind::Load, 0, address)
        {
            return Err(exception);
        }
        let value = op(self, address).map_err(|err| match err {
            MemoryError::MisalignedAccess => Exception::LoadAddressMisaligned(address),
            MemoryError::AccessFault => Exception::LoadAccessFault(address),
            MemoryError::PageFault => Exception::LoadPageFault(address),
        })?;
        let registers = self.core.registers_mut(self.allocator);
        registers.set_x(dest, value as u64);
        increment_pc(registers);
        Ok(())
    }

    fn store_op<F>(
        &mut self,
        src: Specifier,
        base: Specifier,
        offset: i32,
        op: F,
    ) -> ExecutionResult
    where
        F: FnOnce(&mut Self, u32, u32) -> Result<(), MemoryError>,
    {
        let registers = self.core.registers(self.allocator);
        let value = registers.x(src) as u32;
        let address = (registers.x(base) as u32).wrapping_add_signed(offset);
        if let Some(exception) =
            self.core
                .take_injected_exception(self.allocator, InjectionKind::Store, 0, address)
        {
            return Err(exception);
        }
        op(self, address, value).map_err(|err| match err {
            MemoryError::MisalignedAccess => Exception::StoreOrAmoAddressMisaligned(address),
            MemoryError::AccessFault => Exception::StoreOrAmoAccessFault(address),
            MemoryError::PageFault => Exception::StoreOrAmoPageFault(address),
        })?;
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }

    fn csr_reg_op(
        &mut self,
        op: CsrOp,
        dest: Specifier,
        csr: CsrSpecifier,
        src: Specifier,
    ) -> ExecutionResult {
        self.csr_op(
            op,
            dest,
            csr,
            (op == CsrOp::ReadWrite || src != Specifier::X0)
                .then(|| self.core.registers(self.allocator).x(src) as u32),
        )
    }

    fn csr_imm_op(
        &mut self,
        op: CsrOp,
        dest: Specifier,
        csr: CsrSpecifier,
        immediate: u32,
    ) -> ExecutionResult {
        self.csr_op(
            op,
            dest,
            csr,
            (op == CsrOp::ReadWrite || immediate != 0).then_some(immediate),
        )
    }

    fn csr_op(
        &mut self,
        op: CsrOp,
        dest: Specifier,
        csr: CsrSpecifier,
        src_value: Option<u32>,
    ) -> ExecutionResult {
        // Read and store the core's current privilege mode, since the CSR read may cause the
        // privilege mode to be changed as a side-effect. This CSR operation should be atomic, so
        // both the read and write should be performed at the same, original privilege level.
        let privilege_level = self.core.privilege_mode(self.allocator);
        if op != CsrOp::ReadWrite || dest != Specifier::X0 {
            let old_value = self
                .core
                .read_csr(self.allocator, csr, privilege_level)
                .map_err(|_| Exception::IllegalInstruction(None))?;
            let registers = self.core.registers_mut(self.allocator);
            registers.set_x(dest, old_value as u64);
        };
        if let Some(src_value) = src_value {
            let (value, mask) = match op {
                CsrOp::ReadWrite => (src_value, 0xFFFF_FFFF),
                CsrOp::ReadSet => (0xFFFF_FFFF, src_value),
                CsrOp::ReadClear => (0x0000_0000, src_value),
            };
            self.core
                .write_csr(self.allocator, csr, privilege_level, value, mask)
                .map_err(|_| Exception::IllegalInstruction(None))?;
        }
        increment_pc(self.core.registers_mut(self.allocator));
        Ok(())
    }
}

/// Cache block size assumed for Zicbom/Zicboz operations. Not configurable: this core models no
/// real cache hierarchy, so `cbo.zero`'s only architecturally visible effect is zeroing this many
/// bytes at the block-aligned address.
const CACHE_BLOCK_SIZE: u32 = 64;

fn increment_pc(registers: &mut Registers) {
    let pc = registers.pc() as u32;
    registers.set_pc(pc.wrapping_add(registers.instruction_length()) as u64);
}

/// Minimal floating-point abstraction bridging the single- and double-precision kernels shared
/// between the F and D extensions, so the arithmetic/comparison/conversion logic below is
/// written once rather than duplicated per format.
trait FpScalar: Copy + PartialEq + PartialOrd {
    fn to_bits64(self) -> u64;
    fn from_bits64(bits: u64) -> Self;
    fn to_f64(self) -> f64;
    fn from_i64(value: i64) -> Self;
    fn to_i64_lossy(self) -> i64;
    fn is_nan(self) -> bool;
    fn is_infinite(self) -> bool;
    fn is_subnormal(self) -> bool;
    fn is_zero(self) -> bool;
    fn is_sign_negative(self) -> bool;
    /// A NaN whose quiet bit (the mantissa MSB) is clear.
    fn is_signaling_nan(self) -> bool;
    fn canonical_nan() -> Self;
    fn sign_mask() -> u64;
    fn neg(self) -> Self;
    fn add(self, other: Self) -> Self;
    fn sub(self, other: Self) -> Self;
    fn mul(self, other: Self) -> Self;
    fn div(self, other: Self) -> Self;
    fn sqrt(self) -> Self;
    fn mul_add(self, b: Self, c: Self) -> Self;
    fn round_ties_even(self) -> Self;
    fn round_half_away(self) -> Self;
    fn trunc(self) -> Self;
    fn floor(self) -> Self;
    fn ceil(self) -> Self;
}

impl FpScalar for f32 {
    fn to_bits64(self) -> u64 {
        u64::from(self.to_bits())
    }
    fn from_bits64(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
    fn to_f64(self) -> f64 {
        self as f64
    }
    fn from_i64(value: i64) -> Self {
        value as f32
    }
    fn to_i64_lossy(self) -> i64 {
        self as i64
    }
    fn is_nan(self) -> bool {
        f32::is_nan(self)
    }
    fn is_infinite(self) -> bool {
        f32::is_infinite(self)
    }
    fn is_subnormal(self) -> bool {
        f32::is_subnormal(self)
    }
    fn is_zero(self) -> bool {
        self == 0.0
    }
    fn is_sign_negative(self) -> bool {
        f32::is_sign_negative(self)
    }
    fn is_signaling_nan(self) -> bool {
        self.is_nan() && self.to_bits() & (1 << 22) == 0
    }
    fn canonical_nan() -> Self {
        f32::from_bits(crate::fp_registers::canonical_nan(FpFormat::S) as u32)
    }
    fn sign_mask() -> u64 {
        0x8000_0000
    }
    fn neg(self) -> Self {
        -self
    }
    fn add(self, other: Self) -> Self {
        self + other
    }
    fn sub(self, other: Self) -> Self {
        self - other
    }
    fn mul(self, other: Self) -> Self {
        self * other
    }
    fn div(self, other: Self) -> Self {
        self / other
    }
    fn sqrt(self) -> Self {
        f32::sqrt(self)
    }
    fn mul_add(self, b: Self, c: Self) -> Self {
        f32::mul_add(self, b, c)
    }
    fn round_ties_even(self) -> Self {
        f32::round_ties_even(self)
    }
    fn round_half_away(self) -> Self {
        f32::round(self)
    }
    fn trunc(self) -> Self {
        f32::trunc(self)
    }
    fn floor(self) -> Self {
        f32::floor(self)
    }
    fn ceil(self) -> Self {
        f32::ceil(self)
    }
}

impl FpScalar for f64 {
    fn to_bits64(self) -> u64 {
        self.to_bits()
    }
    fn from_bits64(bits: u64) -> Self {
        f64::from_bits(bits)
    }
    fn to_f64(self) -> f64 {
        self
    }
    fn from_i64(value: i64) -> Self {
        value as f64
    }
    fn to_i64_lossy(self) -> i64 {
        self as i64
    }
    fn is_nan(self) -> bool {
        f64::is_nan(self)
    }
    fn is_infinite(self) -> bool {
        f64::is_infinite(self)
    }
    fn is_subnormal(self) -> bool {
        f64::is_subnormal(self)
    }
    fn is_zero(self) -> bool {
        self == 0.0
    }
    fn is_sign_negative(self) -> bool {
        f64::is_sign_negative(self)
    }
    fn is_signaling_nan(self) -> bool {
        self.is_nan() && self.to_bits() & (1 << 51) == 0
    }
    fn canonical_nan() -> Self {
        f64::from_bits(crate::fp_registers::canonical_nan(FpFormat::D))
    }
    fn sign_mask() -> u64 {
        0x8000_0000_0000_0000
    }
    fn neg(self) -> Self {
        -self
    }
    fn add(self, other: Self) -> Self {
        self + other
    }
    fn sub(self, other: Self) -> Self {
        self - other
    }
    fn mul(self, other: Self) -> Self {
        self * other
    }
    fn div(self, other: Self) -> Self {
        self / other
    }
    fn sqrt(self) -> Self {
        f64::sqrt(self)
    }
    fn mul_add(self, b: Self, c: Self) -> Self {
        f64::mul_add(self, b, c)
    }
    fn round_ties_even(self) -> Self {
        f64::round_ties_even(self)
    }
    fn round_half_away(self) -> Self {
        f64::round(self)
    }
    fn trunc(self) -> Self {
        f64::trunc(self)
    }
    fn floor(self) -> Self {
        f64::floor(self)
    }
    fn ceil(self) -> Self {
        f64::ceil(self)
    }
}

fn round_to_integer<T: FpScalar>(mode: RoundingMode, a: T) -> T {
    match mode {
        RoundingMode::RoundNearestEven => a.round_ties_even(),
        RoundingMode::RoundTowardZero => a.trunc(),
        RoundingMode::RoundDown => a.floor(),
        RoundingMode::RoundUp => a.ceil(),
        RoundingMode::RoundNearestMaxMagnitude => a.round_half_away(),
        RoundingMode::Dynamic => unreachable!("dynamic rounding mode must be resolved before use"),
    }
}

/// Computes the `NV`/`DZ`/`OF` flags for a two-operand arithmetic result, substituting the
/// canonical quiet NaN for any NaN result (whether propagated or newly produced).
fn arith_flags<T: FpScalar>(raw_result: T, a: T, b: T, is_div: bool) -> (T, u8) {
    let mut raised = 0u8;
    if a.is_signaling_nan() || b.is_signaling_nan() {
        raised |= flags::NV;
    }
    let mut result = raw_result;
    if result.is_nan() {
        if !a.is_nan() && !b.is_nan() {
            raised |= flags::NV;
        }
        result = T::canonical_nan();
    } else if is_div && b.is_zero() && !a.is_zero() {
        raised |= flags::DZ;
    } else if result.is_infinite() && !a.is_infinite() && !b.is_infinite() {
        raised |= flags::OF | flags::NX;
    }
    (result, raised)
}

fn fp_binary<T: FpScalar>(op: FpOp, a: T, b: T) -> (T, u8) {
    match op {
        FpOp::Add => arith_flags(a.add(b), a, b, false),
        FpOp::Sub => arith_flags(a.sub(b), a, b, false),
        FpOp::Mul => arith_flags(a.mul(b), a, b, false),
        FpOp::Div => arith_flags(a.div(b), a, b, true),
        FpOp::SignInject => (sign_inject(a, b, false, false), 0),
        FpOp::SignInjectNeg => (sign_inject(a, b, true, false), 0),
        FpOp::SignInjectXor => (sign_inject(a, b, false, true), 0),
        FpOp::Min => fminmax(a, b, true),
        FpOp::Max => fminmax(a, b, false),
    }
}

/// Copies the sign of `b` (inverted if `negate`, XOR-combined with `a`'s if `xor`) onto the
/// magnitude of `a`. Never raises a flag, even for NaN operands, per the ISA manual.
fn sign_inject<T: FpScalar>(a: T, b: T, negate: bool, xor: bool) -> T {
    let magnitude = a.to_bits64() & !T::sign_mask();
    let sign = if xor {
        a.is_sign_negative() ^ b.is_sign_negative()
    } else if negate {
        !b.is_sign_negative()
    } else {
        b.is_sign_negative()
    };
    T::from_bits64(magnitude | if sign { T::sign_mask() } else { 0 })
}

/// `fmin`/`fmax`: a quiet NaN operand is ignored in favor of the other (two NaNs yield the
/// canonical quiet NaN), and `-0.0`/`+0.0` are ordered as distinct (`-0.0 < +0.0`) despite
/// comparing equal under IEEE 754.
fn fminmax<T: FpScalar>(a: T, b: T, want_min: bool) -> (T, u8) {
    let mut raised = 0u8;
    if a.is_signaling_nan() || b.is_signaling_nan() {
        raised |= flags::NV;
    }
    let result = match (a.is_nan(), b.is_nan()) {
        (true, true) => T::canonical_nan(),
        (true, false) => b,
        (false, true) => a,
        (false, false) if a.is_zero() && b.is_zero() && a.is_sign_negative() != b.is_sign_negative() => {
            if a.is_sign_negative() == want_min {
                a
            } else {
                b
            }
        }
        (false, false) => {
            if want_min == (a < b) {
                a
            } else {
                b
            }
        }
    };
    (result, raised)
}

fn fp_sqrt_kernel<T: FpScalar>(a: T) -> (T, u8) {
    let mut raised = 0u8;
    if a.is_signaling_nan() {
        raised |= flags::NV;
    }
    let mut result = a.sqrt();
    if result.is_nan() {
        if !a.is_nan() {
            raised |= flags::NV;
        }
        result = T::canonical_nan();
    }
    (result, raised)
}

fn fp_fma_kernel<T: FpScalar>(op: FpFmaOp, a: T, b: T, c: T) -> (T, u8) {
    let (x, y, z) = match op {
        FpFmaOp::Madd => (a, b, c),
        FpFmaOp::Msub => (a, b, c.neg()),
        FpFmaOp::Nmsub => (a.neg(), b, c),
        FpFmaOp::Nmadd => (a.neg(), b, c.neg()),
    };
    let mut raised = 0u8;
    if a.is_signaling_nan() || b.is_signaling_nan() || c.is_signaling_nan() {
        raised |= flags::NV;
    }
    let mut result = x.mul_add(y, z);
    if result.is_nan() {
        if !a.is_nan() && !b.is_nan() && !c.is_nan() {
            raised |= flags::NV;
        }
        result = T::canonical_nan();
    } else if result.is_infinite() && !a.is_infinite() && !b.is_infinite() && !c.is_infinite() {
        raised |= flags::OF | flags::NX;
    }
    (result, raised)
}

fn fp_compare_kernel<T: FpScalar>(op: FpCompareOp, a: T, b: T) -> (bool, u8) {
    let mut raised = 0u8;
    if a.is_signaling_nan() || b.is_signaling_nan() {
        raised |= flags::NV;
    } else if (a.is_nan() || b.is_nan()) && op != FpCompareOp::Eq {
        raised |= flags::NV;
    }
    let result = if a.is_nan() || b.is_nan() {
        false
    } else {
        match op {
            FpCompareOp::Eq => a == b,
            FpCompareOp::Lt => a < b,
            FpCompareOp::Le => a <= b,
        }
    };
    (result, raised)
}

/// `fclass`: classifies `a` into the 10-bit mask defined by the ISA manual's `fclass` table.
fn fp_classify_kernel<T: FpScalar>(a: T) -> u32 {
    if a.is_nan() {
        return if a.is_signaling_nan() { 1 << 8 } else { 1 << 9 };
    }
    if a.is_infinite() {
        return if a.is_sign_negative() { 1 << 0 } else { 1 << 7 };
    }
    if a.is_zero() {
        return if a.is_sign_negative() { 1 << 3 } else { 1 << 4 };
    }
    if a.is_subnormal() {
        return if a.is_sign_negative() { 1 << 2 } else { 1 << 5 };
    }
    if a.is_sign_negative() {
        1 << 1
    } else {
        1 << 6
    }
}

/// `fcvt.w.fmt`/`fcvt.wu.fmt`. Out-of-domain inputs (NaN, infinities, out-of-range magnitudes)
/// saturate to the boundary value and raise `NV`, per the ISA manual's invalid-conversion table.
fn fp_to_int_kernel<T: FpScalar>(mode: RoundingMode, signed: bool, a: T) -> (u32, u8) {
    let mut raised = 0u8;
    if a.is_signaling_nan() {
        raised |= flags::NV;
    }
    if a.is_nan() {
        raised |= flags::NV;
        return (if signed { i32::MAX as u32 } else { u32::MAX }, raised);
    }
    let rounded = round_to_integer(mode, a);
    if rounded != a {
        raised |= flags::NX;
    }
    let value = rounded.to_f64();
    if signed {
        if value >= 2_147_483_648.0 {
            raised |= flags::NV;
            return (i32::MAX as u32, raised);
        }
        if value < -2_147_483_648.0 {
            raised |= flags::NV;
            return (i32::MIN as u32, raised);
        }
        (value as i32 as u32, raised)
    } else {
        if value >= 4_294_967_296.0 {
            raised |= flags::NV;
            return (u32::MAX, raised);
        }
        if value < 0.0 {
            raised |= flags::NV;
            return (0, raised);
        }
        (value as u32, raised)
    }
}

/// `fcvt.fmt.w`/`fcvt.fmt.wu`. `NX` is detected exactly, by round-tripping the converted value
/// back to an integer and comparing.
fn fp_from_int_kernel<T: FpScalar>(signed: bool, value: u32) -> (T, u8) {
    let as_i64 = if signed {
        i64::from(value as i32)
    } else {
        i64::from(value)
    };
    let result = T::from_i64(as_i64);
    let raised = if result.to_i64_lossy() != as_i64 {
        flags::NX
    } else {
        0
    };
    (result, raised)
}

/// `fcvt.s.d`: narrows, which can lose precision (`NX`) or overflow to infinity (`OF`).
fn fp_narrow_kernel(a: f64) -> (f32, u8) {
    let mut raised = 0u8;
    if a.is_signaling_nan() {
        raised |= flags::NV;
    }
    let mut result = a as f32;
    if result.is_nan() {
        if !a.is_nan() {
            raised |= flags::NV;
        }
        result = f32::canonical_nan();
    } else if result.is_infinite() && !a.is_infinite() {
        raised |= flags::OF | flags::NX;
    } else if f64::from(result) != a {
        raised |= flags::NX;
    }
    (result, raised)
}

/// `fcvt.d.s`: widens, which is always exact and can't overflow.
fn fp_widen_kernel(a: f32) -> (f64, u8) {
    let mut raised = 0u8;
    if a.is_signaling_nan() {
        raised |= flags::NV;
    }
    let mut result = a as f64;
    if result.is_nan() {
        result = f64::canonical_nan();
    }
    (result, raised)
}
