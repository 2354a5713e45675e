//! Table name tags for systems and extensions.
//!
//! Each known table has an enum variant; string names follow the usual
//! MRIO notation (`Z`, `F_Y`, `D_cba_reg`, ...). Lookup by name goes
//! through `FromStr`, iteration through `ALL`.
use crate::system::errors::SystemError;
use std::str::FromStr;

/// Tables owned by the economic core of an [`IOSystem`](crate::system::IOSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SystemTable {
    Z,
    Y,
    X,
    A,
    B,
    L,
    G,
}

impl SystemTable {
    pub const ALL: [SystemTable; 7] = [
        SystemTable::Z,
        SystemTable::Y,
        SystemTable::X,
        SystemTable::A,
        SystemTable::B,
        SystemTable::L,
        SystemTable::G,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SystemTable::Z => "Z",
            SystemTable::Y => "Y",
            SystemTable::X => "x",
            SystemTable::A => "A",
            SystemTable::B => "B",
            SystemTable::L => "L",
            SystemTable::G => "G",
        }
    }
}

impl FromStr for SystemTable {
    type Err = SystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SystemTable::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| SystemError::UnknownTable { name: s.to_string() })
    }
}

impl std::fmt::Display for SystemTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tables owned by an [`Extension`](crate::system::Extension).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionTable {
    F,
    FY,
    S,
    SY,
    M,
    MDown,
    DCba,
    DPba,
    DImp,
    DExp,
    DCbaReg,
    DPbaReg,
    DImpReg,
    DExpReg,
    DCbaCap,
    DPbaCap,
    DImpCap,
    DExpCap,
}

impl ExtensionTable {
    pub const ALL: [ExtensionTable; 18] = [
        ExtensionTable::F,
        ExtensionTable::FY,
        ExtensionTable::S,
        ExtensionTable::SY,
        ExtensionTable::M,
        ExtensionTable::MDown,
        ExtensionTable::DCba,
        ExtensionTable::DPba,
        ExtensionTable::DImp,
        ExtensionTable::DExp,
        ExtensionTable::DCbaReg,
        ExtensionTable::DPbaReg,
        ExtensionTable::DImpReg,
        ExtensionTable::DExpReg,
        ExtensionTable::DCbaCap,
        ExtensionTable::DPbaCap,
        ExtensionTable::DImpCap,
        ExtensionTable::DExpCap,
    ];

    /// Tables that cannot be rebuilt from others.
    pub const BASIC: [ExtensionTable; 2] = [ExtensionTable::F, ExtensionTable::FY];

    /// Tables kept by a reset to coefficients.
    pub const COEFFICIENTS: [ExtensionTable; 4] =
        [ExtensionTable::S, ExtensionTable::SY, ExtensionTable::M, ExtensionTable::MDown];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionTable::F => "F",
            ExtensionTable::FY => "F_Y",
            ExtensionTable::S => "S",
            ExtensionTable::SY => "S_Y",
            ExtensionTable::M => "M",
            ExtensionTable::MDown => "M_down",
            ExtensionTable::DCba => "D_cba",
            ExtensionTable::DPba => "D_pba",
            ExtensionTable::DImp => "D_imp",
            ExtensionTable::DExp => "D_exp",
            ExtensionTable::DCbaReg => "D_cba_reg",
            ExtensionTable::DPbaReg => "D_pba_reg",
            ExtensionTable::DImpReg => "D_imp_reg",
            ExtensionTable::DExpReg => "D_exp_reg",
            ExtensionTable::DCbaCap => "D_cba_cap",
            ExtensionTable::DPbaCap => "D_pba_cap",
            ExtensionTable::DImpCap => "D_imp_cap",
            ExtensionTable::DExpCap => "D_exp_cap",
        }
    }

    /// Columns follow the final-demand axis `(region, category)`.
    pub fn is_final_demand(&self) -> bool {
        matches!(self, ExtensionTable::FY | ExtensionTable::SY)
    }
}

impl FromStr for ExtensionTable {
    type Err = SystemError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExtensionTable::ALL
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| SystemError::UnknownTable { name: s.to_string() })
    }
}

impl std::fmt::Display for ExtensionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    // Purpose
    // -------
    // Names round-trip through `FromStr` for every variant.
    fn names_parse_back_to_variants() {
        for t in SystemTable::ALL {
            assert_eq!(t.as_str().parse::<SystemTable>().unwrap(), t);
        }
        for t in ExtensionTable::ALL {
            assert_eq!(t.as_str().parse::<ExtensionTable>().unwrap(), t);
        }
        assert!("D_foo".parse::<ExtensionTable>().is_err());
    }
}
