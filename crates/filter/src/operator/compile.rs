//! Factory from configuration descriptors to operators.

use recflow_core::ValueType;

use crate::error::CompileError;
use crate::schema::{Combinator, Domain, FilterParamConfig, OperatorKind};

use super::compare::scalar_of;
use super::{BoolNode, FilterOperator, Leaf, Operand, Presence};

/// Compile one descriptor. `inherited` is the domain used when the
/// descriptor declares none (the parent's domain for bool children).
pub fn compile(
    config: &FilterParamConfig,
    inherited: Domain,
) -> Result<FilterOperator, CompileError> {
    let domain = config.domain.unwrap_or(inherited);
    let kind: OperatorKind = config
        .operator
        .parse()
        .map_err(|_| CompileError::UnknownOperator {
            name: config.name.clone(),
            operator: config.operator.clone(),
        })?;

    let build: fn(Leaf) -> FilterOperator = match kind {
        OperatorKind::Bool => return compile_bool(config, domain),
        OperatorKind::IsNull => return presence(config, domain).map(FilterOperator::IsNull),
        OperatorKind::IsNotNull => return presence(config, domain).map(FilterOperator::IsNotNull),
        OperatorKind::Equal => FilterOperator::Equal,
        OperatorKind::NotEqual => FilterOperator::NotEqual,
        OperatorKind::In => FilterOperator::In,
        OperatorKind::NotIn => FilterOperator::NotIn,
        OperatorKind::Contains => FilterOperator::Contains,
        OperatorKind::NotContains => FilterOperator::NotContains,
        OperatorKind::Greater => FilterOperator::Greater,
        OperatorKind::GreaterStrict => FilterOperator::GreaterStrict,
        OperatorKind::Less => FilterOperator::Less,
        OperatorKind::LessStrict => FilterOperator::LessStrict,
    };
    compile_leaf(config, kind, domain).map(build)
}

fn presence(config: &FilterParamConfig, domain: Domain) -> Result<Presence, CompileError> {
    Ok(Presence {
        property: required_name(config)?,
        domain,
    })
}

fn compile_bool(config: &FilterParamConfig, domain: Domain) -> Result<FilterOperator, CompileError> {
    let combinator: Combinator = config
        .value_type
        .parse()
        .map_err(CompileError::UnknownCombinator)?;
    if config.configs.is_empty() {
        return Err(CompileError::EmptyCombinator(config.name.clone()));
    }

    let children = config
        .configs
        .iter()
        .map(|child| compile(child, domain))
        .collect::<Result<Vec<_>, _>>()?;
    let node = BoolNode { domain, children };

    Ok(match combinator {
        Combinator::And => FilterOperator::BoolAnd(node),
        Combinator::Or => FilterOperator::BoolOr(node),
    })
}

fn compile_leaf(
    config: &FilterParamConfig,
    kind: OperatorKind,
    domain: Domain,
) -> Result<Leaf, CompileError> {
    let property = required_name(config)?;
    let ty: ValueType = config
        .value_type
        .parse()
        .map_err(|reason| CompileError::UnknownType {
            name: property.clone(),
            reason,
        })?;
    let operand_ty = operand_type(kind, ty).ok_or_else(|| CompileError::UnsupportedType {
        name: property.clone(),
        operator: kind.as_str(),
        value_type: ty.to_string(),
    })?;

    let raw = config
        .value
        .as_ref()
        .filter(|v| !v.is_null())
        .ok_or_else(|| CompileError::MissingField {
            name: property.clone(),
            field: "Value",
        })?;
    let operand = match Operand::parse(raw) {
        Operand::Literal(value) => {
            let coerced = value
                .coerce(operand_ty)
                .map_err(|source| CompileError::InvalidLiteral {
                    name: property.clone(),
                    source,
                })?;
            Operand::Literal(coerced)
        }
        reference => reference,
    };

    Ok(Leaf {
        property,
        domain,
        ty,
        operand_ty,
        operand,
    })
}

/// Operand type for `kind` on a declared `ty`, or `None` when the pair is
/// not meaningful.
fn operand_type(kind: OperatorKind, ty: ValueType) -> Option<ValueType> {
    match kind {
        OperatorKind::Equal | OperatorKind::NotEqual => (!ty.is_list()).then_some(ty),
        OperatorKind::Greater
        | OperatorKind::GreaterStrict
        | OperatorKind::Less
        | OperatorKind::LessStrict => ty.is_numeric().then_some(ty),
        OperatorKind::Contains | OperatorKind::NotContains => ty.is_list().then_some(ty),
        OperatorKind::In | OperatorKind::NotIn => scalar_of(ty).map(ValueType::List),
        OperatorKind::IsNull | OperatorKind::IsNotNull | OperatorKind::Bool => None,
    }
}

fn required_name(config: &FilterParamConfig) -> Result<String, CompileError> {
    let name = config.name.trim();
    if name.is_empty() {
        return Err(CompileError::MissingField {
            name: config.operator.clone(),
            field: "Name",
        });
    }
    Ok(name.to_string())
}
