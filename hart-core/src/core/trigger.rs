//! Debug trigger module, unallocated.
//!
//! Implements the RISC-V Debug Specification ch. 5 ("Trigger Module"): a bank of
//! `Config::trigger_count` independently configurable triggers, selected through `tselect` and
//! read/written through `tdata1`-`tdata3`, each able to watch for an instruction address, a data
//! address, a retired-instruction count, or a raised exception/interrupt, optionally chained to a
//! neighbouring trigger.

use bitvec::{order::Lsb0, view::BitView};

/// The kind of event a single trigger is configured to watch for, encoded in `tdata1`'s `type`
/// field (bits `XLEN-1:XLEN-4`).
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TriggerType {
    /// Trigger is disabled (`type == 0` or unsupported).
    Disabled,
    /// Address/data match trigger (`mcontrol`/`mcontrol6`, `type == 2` or `6`).
    AddressOrData,
    /// Instruction-count trigger (`icount`, `type == 3`).
    InstructionCount,
    /// Exception/interrupt trigger (`etrigger`, `type == 5`).
    Exception,
}

impl TriggerType {
    fn from_u4(value: u8) -> Self {
        match value {
            2 | 6 => Self::AddressOrData,
            3 => Self::InstructionCount,
            5 => Self::Exception,
            _ => Self::Disabled,
        }
    }

    fn to_u4(self) -> u8 {
        match self {
            Self::Disabled => 0,
            Self::AddressOrData => 6,
            Self::InstructionCount => 3,
            Self::Exception => 5,
        }
    }
}

/// Which load-store-execute access an address/data trigger matches, encoded in `mcontrol6`'s
/// `select`/`execute`/`load`/`store` fields.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct AccessMask {
    pub execute: bool,
    pub load: bool,
    pub store: bool,
}

/// Whether a trigger fires before the matching instruction retires or after.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Timing {
    Before,
    After,
}

/// The action taken when a trigger fires, encoded in `tdata1`'s 4-bit `action` field.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum TriggerAction {
    /// Raise a breakpoint exception (`action == 0` or `1`).
    Breakpoint,
    /// Enter Debug Mode (`action == 2`).
    EnterDebug,
}

impl TriggerAction {
    fn from_u4(value: u8) -> Self {
        match value {
            2 => Self::EnterDebug,
            _ => Self::Breakpoint,
        }
    }

    fn to_u4(self) -> u8 {
        match self {
            Self::Breakpoint => 1,
            Self::EnterDebug => 2,
        }
    }
}

/// A single decoded trigger, combining the fields of `tdata1` relevant to the trigger's type.
#[derive(Debug, Clone)]
pub struct Trigger {
    ty: TriggerType,
    dmode: bool,
    chain: bool,
    access: AccessMask,
    timing: Timing,
    action: TriggerAction,
    /// Whether the trigger matches in M/S/U mode respectively.
    m_enabled: bool,
    s_enabled: bool,
    u_enabled: bool,
    hit: bool,
    /// `tdata2`: comparison address/data, or exception-cause bitmask.
    data2: u64,
    /// `tdata3`: only meaningful for chained/textra-style triggers; stored but not interpreted
    /// beyond round-tripping, since `Config::trigger_count` triggers in this simulator never
    /// exercise the `sselect`/`mhselect` address-space qualifiers.
    data3: u64,
    /// Running instruction-retirement count for [`TriggerType::InstructionCount`] triggers.
    icount: u32,
}

impl Default for Trigger {
    fn default() -> Self {
        Self {
            ty: TriggerType::Disabled,
            dmode: false,
            chain: false,
            access: AccessMask::default(),
            timing: Timing::Before,
            action: TriggerAction::Breakpoint,
            m_enabled: false,
            s_enabled: false,
            u_enabled: false,
            hit: false,
            data2: 0,
            data3: 0,
            icount: 0,
        }
    }
}

mod idx {
    pub const LOAD: usize = 0;
    /// 4-bit `action` field, bits `ACTION_LO..ACTION_LO + 4`.
    pub const ACTION_LO: usize = 1;
    pub const STORE: usize = 5;
    pub const EXECUTE: usize = 6;
    pub const U: usize = 7;
    pub const S: usize = 8;
    pub const M: usize = 9;
    pub const TIMING: usize = 10;
    pub const CHAIN: usize = 11;
}

impl Trigger {
    pub fn trigger_type(&self) -> TriggerType {
        self.ty
    }

    pub fn is_chained(&self) -> bool {
        self.chain
    }

    pub fn enabled_for(&self, privilege: crate::PrivilegeLevel) -> bool {
        match privilege {
            crate::PrivilegeLevel::Machine => self.m_enabled,
            crate::PrivilegeLevel::Supervisor => self.s_enabled,
            crate::PrivilegeLevel::User => self.u_enabled,
        }
    }

    /// Reads `tdata1`, composing the `type`/`dmode` header with the type-specific payload,
    /// packed identically on RV32/RV64 per the `mcontrol6` layout (the architecture keeps the
    /// same bit positions regardless of XLEN for the fields this simulator uses).
    pub fn read_tdata1(&self, xlen_bits: u32) -> u64 {
        let mut value = 0u64;
        {
            let bits = value.view_bits_mut::<Lsb0>();
            bits.set(idx::LOAD, self.access.load);
            bits.set(idx::STORE, self.access.store);
            bits.set(idx::EXECUTE, self.access.execute);
            bits.set(idx::U, self.u_enabled);
            bits.set(idx::S, self.s_enabled);
            bits.set(idx::M, self.m_enabled);
            bits.set(idx::CHAIN, self.chain);
            bits.set(idx::TIMING, self.timing == Timing::After);
        }
        value |= (self.action.to_u4() as u64) << idx::ACTION_LO;
        value |= (self.ty.to_u4() as u64) << (xlen_bits - 4);
        if self.dmode {
            value |= 1 << (xlen_bits - 5);
        }
        value
    }

    pub fn write_tdata1(&mut self, value: u64, xlen_bits: u32) {
        let ty_field = ((value >> (xlen_bits - 4)) & 0xF) as u8;
        self.ty = TriggerType::from_u4(ty_field);
        self.dmode = (value >> (xlen_bits - 5)) & 1 != 0;
        let bits = value.view_bits::<Lsb0>();
        self.access.load = bits[idx::LOAD];
        self.access.store = bits[idx::STORE];
        self.access.execute = bits[idx::EXECUTE];
        self.u_enabled = bits[idx::U];
        self.s_enabled = bits[idx::S];
        self.m_enabled = bits[idx::M];
        self.chain = bits[idx::CHAIN];
        self.timing = if bits[idx::TIMING] { Timing::After } else { Timing::Before };
        self.action = TriggerAction::from_u4(((value >> idx::ACTION_LO) & 0xF) as u8);
    }

    pub fn action(&self) -> TriggerAction {
        self.action
    }

    pub fn read_tdata2(&self) -> u64 {
        self.data2
    }

    pub fn write_tdata2(&mut self, value: u64) {
        self.data2 = value;
    }

    pub fn read_tdata3(&self) -> u64 {
        self.data3
    }

    pub fn write_tdata3(&mut self, value: u64) {
        self.data3 = value;
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Evaluates an address/data trigger against `address` for `access`.
    pub fn matches_address(&self, address: u64, access: AccessMask) -> bool {
        self.ty == TriggerType::AddressOrData
            && ((access.execute && self.access.execute)
                || (access.load && self.access.load)
                || (access.store && self.access.store))
            && self.data2 == address
    }

    /// Evaluates an exception/interrupt trigger against a raised cause, `interrupt` distinguishing
    /// the interrupt bit of `mcause`.
    pub fn matches_exception(&self, code: u64, interrupt: bool) -> bool {
        self.ty == TriggerType::Exception
            && !interrupt
            && (self.data2 & (1 << (code & 0x3F))) != 0
    }

    /// Advances an instruction-count trigger by one retired instruction, returning `true` if it
    /// fires (count reaches zero).
    pub fn tick_icount(&mut self) -> bool {
        if self.ty != TriggerType::InstructionCount || self.icount == 0 {
            return false;
        }
        self.icount -= 1;
        self.icount == 0
    }

    pub fn set_icount(&mut self, count: u32) {
        self.icount = count;
    }
}

/// The full trigger bank. Indexed by `tselect`.
#[derive(Debug, Clone)]
pub struct TriggerUnit {
    triggers: Vec<Trigger>,
    selected: usize,
}

impl TriggerUnit {
    pub fn new(count: usize) -> Self {
        Self {
            triggers: vec![Trigger::default(); count.max(1)],
            selected: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.triggers.len()
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// `tselect` is WARL: selecting an out-of-range index is ignored.
    pub fn select(&mut self, index: u64) {
        if (index as usize) < self.triggers.len() {
            self.selected = index as usize;
        }
    }

    pub fn current(&self) -> &Trigger {
        &self.triggers[self.selected]
    }

    pub fn current_mut(&mut self) -> &mut Trigger {
        &mut self.triggers[self.selected]
    }

    pub fn get(&self, index: usize) -> Option<&Trigger> {
        self.triggers.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Trigger> {
        self.triggers.get_mut(index)
    }

    /// Advances every instruction-count trigger enabled for `privilege` by one retired
    /// instruction, returning the action of the highest-priority trigger that fired (`EnterDebug`
    /// takes priority over `Breakpoint` when more than one fires on the same retirement).
    pub fn tick_icount(&mut self, privilege: crate::PrivilegeLevel) -> Option<TriggerAction> {
        let mut fired = None;
        for t in &mut self.triggers {
            if t.enabled_for(privilege) && t.tick_icount() {
                fired = Some(strongest_action(fired, t.action()));
            }
        }
        fired
    }

    /// Checks every address/data trigger that matches `address`/`access`, honouring chaining: a
    /// chained pair only fires once *every* trigger in the chain matches (this simulator only
    /// supports chains of length 2, matching `Config::trigger_count`'s typical size). Returns the
    /// action of the highest-priority trigger that matched.
    pub fn check_address(
        &self,
        address: u64,
        access: AccessMask,
        privilege: crate::PrivilegeLevel,
    ) -> Option<TriggerAction> {
        let mut fired = None;
        let mut i = 0;
        while i < self.triggers.len() {
            let t = &self.triggers[i];
            if !t.enabled_for(privilege) {
                i += 1;
                continue;
            }
            if t.is_chained() && i + 1 < self.triggers.len() {
                let next = &self.triggers[i + 1];
                if t.matches_address(address, access) && next.matches_address(address, access) {
                    fired = Some(strongest_action(fired, t.action()));
                }
                i += 2;
            } else {
                if t.matches_address(address, access) {
                    fired = Some(strongest_action(fired, t.action()));
                }
                i += 1;
            }
        }
        fired
    }
}

/// `EnterDebug` wins over `Breakpoint` when multiple triggers fire on the same event.
fn strongest_action(current: Option<TriggerAction>, candidate: TriggerAction) -> TriggerAction {
    match (current, candidate) {
        (Some(TriggerAction::EnterDebug), _) | (_, TriggerAction::EnterDebug) => {
            TriggerAction::EnterDebug
        }
        _ => TriggerAction::Breakpoint,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PrivilegeLevel;

    #[test]
    fn test_tdata1_roundtrip() {
        let mut t = Trigger::default();
        t.write_tdata1(0, 32);
        t.m_enabled = true;
        t.access.execute = true;
        t.ty = TriggerType::AddressOrData;
        let encoded = t.read_tdata1(32);
        let mut t2 = Trigger::default();
        t2.write_tdata1(encoded, 32);
        assert_eq!(TriggerType::AddressOrData, t2.trigger_type());
        assert!(t2.enabled_for(PrivilegeLevel::Machine));
        assert!(t2.access.execute);
    }

    #[test]
    fn test_address_trigger_matches() {
        let mut unit = TriggerUnit::new(2);
        unit.select(0);
        let t = unit.current_mut();
        t.ty = TriggerType::AddressOrData;
        t.m_enabled = true;
        t.access.execute = true;
        t.write_tdata2(0x8000_0000);
        assert!(unit
            .check_address(
                0x8000_0000,
                AccessMask {
                    execute: true,
                    ..Default::default()
                },
                PrivilegeLevel::Machine
            )
            .is_some());
        assert!(unit
            .check_address(
                0x8000_0004,
                AccessMask {
                    execute: true,
                    ..Default::default()
                },
                PrivilegeLevel::Machine
            )
            .is_none());
    }

    #[test]
    fn test_chained_pair_requires_both() {
        let mut unit = TriggerUnit::new(2);
        {
            let t = unit.get_mut(0).unwrap();
            t.ty = TriggerType::AddressOrData;
            t.m_enabled = true;
            t.access.load = true;
            t.chain = true;
            t.write_tdata2(0x100);
        }
        {
            let t = unit.get_mut(1).unwrap();
            t.ty = TriggerType::AddressOrData;
            t.m_enabled = true;
            t.access.load = true;
            t.write_tdata2(0x200);
        }
        let access = AccessMask {
            load: true,
            ..Default::default()
        };
        assert!(unit
            .check_address(0x100, access, PrivilegeLevel::Machine)
            .is_none());
    }

    #[test]
    fn test_enter_debug_action_roundtrips() {
        let mut t = Trigger::default();
        t.action = TriggerAction::EnterDebug;
        let encoded = t.read_tdata1(32);
        let mut t2 = Trigger::default();
        t2.write_tdata1(encoded, 32);
        assert_eq!(TriggerAction::EnterDebug, t2.action());
    }

    #[test]
    fn test_timing_bit_roundtrips() {
        let mut t = Trigger::default();
        t.timing = Timing::After;
        let encoded = t.read_tdata1(32);
        let mut t2 = Trigger::default();
        t2.write_tdata1(encoded, 32);
        assert_eq!(Timing::After, t2.timing());
    }

    #[test]
    fn test_icount_fires_once_reaching_zero() {
        let mut t = Trigger::default();
        t.ty = TriggerType::InstructionCount;
        t.set_icount(2);
        assert!(!t.tick_icount());
        assert!(t.tick_icount());
        assert!(!t.tick_icount());
    }

    #[test]
    fn test_tselect_is_warl() {
        let mut unit = TriggerUnit::new(2);
        unit.select(5);
        assert_eq!(0, unit.selected());
        unit.select(1);
        assert_eq!(1, unit.selected());
    }
}
