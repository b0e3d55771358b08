//! Filter configuration schema with serde deserialization.
//!
//! - `FilterParamConfig`: one rule descriptor (`Name`, `Domain`, `Operator`,
//!   `Type`, `Value`, `Configs`), the format existing configuration files use
//! - `OperatorKind` / `Combinator`: the fixed operator literals
//! - `FilterDocument`: a versioned file wrapping an ordered list of filters

mod document;
mod kind;
mod params;

pub use document::*;
pub use kind::*;
pub use params::*;
