//! Condition operators for `if` / `elseif`.

use std::net::{IpAddr, SocketAddr};

use regex::Regex;
use thiserror::Error;

use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("cannot compare string with number")]
    StringWithNumber,

    #[error("unknown number validator: {0}")]
    UnknownNumberValidator(String),

    #[error("unknown string validator: {0}")]
    UnknownStringValidator(String),

    #[error("invalid regular expression '{pattern}': {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("invalid network specification '{0}'")]
    InvalidNetwork(String),
}

impl EvalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EvalError::StringWithNumber => ErrorKind::Coercion,
            _ => ErrorKind::Validator,
        }
    }
}

/// Evaluate `p1 <validator> p2`.
///
/// When both sides are base-10 integers only `==`, `!=`, `<=` and `>=` apply
/// and compare numerically; mixing an integer with a string is an error.
/// Two strings support `==`, `!=`, `match_regex` (or `regex`), which tests
/// `p1` against the pattern `p2`, and `match_net`, which tests whether
/// address `p1` lies in the CIDR block `p2`.
pub fn eval(p1: &str, validator: &str, p2: &str) -> Result<bool, EvalError> {
    match (p1.parse::<i64>(), p2.parse::<i64>()) {
        (Ok(n1), Ok(n2)) => match validator {
            "==" => Ok(n1 == n2),
            "!=" => Ok(n1 != n2),
            "<=" => Ok(n1 <= n2),
            ">=" => Ok(n1 >= n2),
            other => Err(EvalError::UnknownNumberValidator(other.to_string())),
        },
        (Ok(_), Err(_)) | (Err(_), Ok(_)) => Err(EvalError::StringWithNumber),
        (Err(_), Err(_)) => match validator {
            "==" => Ok(p1 == p2),
            "!=" => Ok(p1 != p2),
            "match_regex" | "regex" => match_regex(p1, p2),
            "match_net" => match_net(p1, p2),
            other => Err(EvalError::UnknownStringValidator(other.to_string())),
        },
    }
}

fn match_regex(value: &str, pattern: &str) -> Result<bool, EvalError> {
    let re = compile(pattern)?;
    Ok(re.is_match(value))
}

pub(crate) fn compile(pattern: &str) -> Result<Regex, EvalError> {
    Regex::new(pattern).map_err(|e| EvalError::InvalidRegex {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

fn match_net(address: &str, network: &str) -> Result<bool, EvalError> {
    let (base, prefix) = parse_network(network)?;
    let Some(addr) = parse_address(address) else {
        return Ok(false);
    };
    Ok(match (base, addr) {
        (IpAddr::V4(base), IpAddr::V4(addr)) => {
            same_prefix(u32::from(base).into(), u32::from(addr).into(), prefix, 32)
        }
        (IpAddr::V6(base), IpAddr::V6(addr)) => {
            same_prefix(u128::from(base), u128::from(addr), prefix, 128)
        }
        _ => false,
    })
}

/// Parse `address/prefix`.
fn parse_network(network: &str) -> Result<(IpAddr, u32), EvalError> {
    let invalid = || EvalError::InvalidNetwork(network.to_string());
    let (base, prefix) = network.split_once('/').ok_or_else(invalid)?;
    let base: IpAddr = base.parse().map_err(|_| invalid())?;
    let prefix: u32 = prefix.parse().map_err(|_| invalid())?;
    let max = if base.is_ipv4() { 32 } else { 128 };
    if prefix > max {
        return Err(invalid());
    }
    Ok((base, prefix))
}

/// A bare address, or the address part of `host:port`.
fn parse_address(address: &str) -> Option<IpAddr> {
    address
        .parse::<IpAddr>()
        .ok()
        .or_else(|| address.parse::<SocketAddr>().ok().map(|s| s.ip()))
}

fn same_prefix(base: u128, addr: u128, prefix: u32, width: u32) -> bool {
    if prefix == 0 {
        return true;
    }
    let shift = width - prefix;
    (base >> shift) == (addr >> shift)
}
