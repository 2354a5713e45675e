//! math — input-output accounting identities as pure functions.
//!
//! Purpose
//! -------
//! Implement the numeric core of MRIO analysis on labeled tables: output,
//! technical and Ghosh coefficients, Leontief and Ghosh inverses, stressor
//! coefficients and multipliers, the trade-embodied account decomposition
//! and gross trade.
//!
//! Key behaviors
//! -------------
//! - [`identities`]: `x`, `Z`, `A`, `B`, `L`, `G`, `S`, `F`, `S_Y`, `F_Y`,
//!   `M`, `M_down`.
//! - [`accounts`]: `D_cba`, `D_pba`, `D_imp`, `D_exp` per region × sector,
//!   per region and per capita, plus the identity residual.
//! - [`blocks`]: block diagonalization of final demand.
//! - [`inverse`]: LU inversion via `nalgebra` with singular-matrix reporting.
//! - [`trade`]: gross bilateral trade.
//!
//! Invariants & assumptions
//! ------------------------
//! - Division by zero output yields zero coefficients.
//! - A singular `I - A` or `I - B` is fatal and reported with the name of
//!   the table that could not be formed.
//! - No function mutates its inputs or keeps state.
//!
//! Downstream usage
//! ----------------
//! - `system` calls these functions in dependency order when filling in
//!   missing tables; they are equally usable on bare tables.
//!
//! Testing notes
//! -------------
//! - Unit tests pin the Miller & Blair two-sector example, the zero-output
//!   convention, the Z ↔ A round trip and the account identity.

pub mod accounts;
pub mod blocks;
pub mod errors;
pub mod identities;
pub mod inverse;
pub mod trade;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::accounts::{
    account_identity_residual, calc_accounts, calc_per_capita, calc_regional_accounts, recalc_m,
    PerCapitaAccounts, RegionalAccounts, SectorAccounts,
};
pub use self::blocks::{diagonalize_blocks, diagonalize_columns_to_sectors};
pub use self::errors::{MathError, MathResult};
pub use self::identities::{
    calc_a, calc_a_from_l, calc_b, calc_f, calc_f_y, calc_g, calc_l, calc_m, calc_m_down, calc_s, calc_s_y, calc_x,
    calc_x_from_l, calc_z, final_demand_totals,
};
pub use self::trade::{calc_gross_trade, GrossTrade};

pub mod prelude {
    pub use super::accounts::{calc_accounts, calc_regional_accounts};
    pub use super::errors::{MathError, MathResult};
    pub use super::identities::{calc_a, calc_l, calc_m, calc_s, calc_x};
}
