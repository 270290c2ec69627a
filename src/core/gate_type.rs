use serde::{Deserialize, Serialize};

/// Common two-input boolean functions, plus the one-input `Not` and `Buf`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateType {
    And = 0,
    Nand = 1,
    Nimp = 2,
    Imp = 3, // a => b
    Ncimp = 4,
    Cimp = 5, // b => a
    Nor = 6,
    Or = 7,
    Xor,
    Xnor,
    Not,
    Buf,
}

impl GateType {
    pub const fn f(&self) -> fn(bool, bool) -> bool {
        match self {
            GateType::And => |a, b| a & b,
            GateType::Nand => |a, b| !(a & b),

            GateType::Nimp => |a, b| a & !b,
            GateType::Imp => |a, b| !a | b,

            GateType::Ncimp => |a, b| !a & b,
            GateType::Cimp => |a, b| !b | a,

            GateType::Nor => |a, b| !(a | b),
            GateType::Or => |a, b| a | b,

            GateType::Xor => |a, b| a ^ b,
            GateType::Xnor => |a, b| !(a ^ b),

            GateType::Not => |a, _| !a,
            GateType::Buf => |a, _| a,
        }
    }

    pub const fn arity(&self) -> usize {
        match self {
            GateType::Not | GateType::Buf => 1,
            _ => 2,
        }
    }

    /// Truth table rows in MSB-first order: row `r` feeds bit `n-1-i` of `r`
    /// to input `i`.
    pub fn truth_table(&self) -> Vec<bool> {
        let f = self.f();
        match self.arity() {
            1 => vec![f(false, false), f(true, false)],
            _ => (0..4u8).map(|row| f(row & 0b10 != 0, row & 0b01 != 0)).collect(),
        }
    }
}
