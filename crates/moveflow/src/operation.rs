//! Operation descriptors handed to the external signer/submitter.
//!
//! A descriptor names one entry point, its type arguments and positional arguments, plus
//! an optional funding step whose output coin is referenced by [Argument::FundingCoin].

use crate::coin::Funding;
use serde::Serialize;

/// Pure (by-value) argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum PureValue {
    U8(u8),
    U64(u64),
    Bool(bool),
    String(String),
    Address(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Argument {
    /// Owned or shared object by id.
    Object { id: String },
    Pure { value: PureValue },
    /// The coin split off by the descriptor's funding step.
    FundingCoin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    /// `<package>::<module>::<function>`.
    pub target: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Argument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub funding: Option<Funding>,
}

impl OperationDescriptor {
    pub fn call(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            type_arguments: Vec::new(),
            arguments: Vec::new(),
            funding: None,
        }
    }

    pub fn type_arg(mut self, t: impl Into<String>) -> Self {
        self.type_arguments.push(t.into());
        self
    }

    pub fn object(mut self, id: impl Into<String>) -> Self {
        self.arguments.push(Argument::Object { id: id.into() });
        self
    }

    pub fn pure(mut self, value: PureValue) -> Self {
        self.arguments.push(Argument::Pure { value });
        self
    }

    pub fn pure_u64(self, n: u64) -> Self {
        self.pure(PureValue::U64(n))
    }

    pub fn pure_bool(self, b: bool) -> Self {
        self.pure(PureValue::Bool(b))
    }

    pub fn pure_string(self, s: impl Into<String>) -> Self {
        self.pure(PureValue::String(s.into()))
    }

    pub fn pure_address(self, a: impl Into<String>) -> Self {
        self.pure(PureValue::Address(a.into()))
    }

    /// Attach the funding step and pass its coin as the next argument.
    pub fn funded_by(mut self, funding: Funding) -> Self {
        self.funding = Some(funding);
        self.arguments.push(Argument::FundingCoin);
        self
    }

    /// Function name part of the target.
    pub fn entry(&self) -> &str {
        self.target.rsplit("::").next().unwrap_or(&self.target)
    }

    /// A funding coin is referenced exactly once iff a funding step is present.
    pub fn is_well_formed(&self) -> bool {
        let refs = self
            .arguments
            .iter()
            .filter(|a| matches!(a, Argument::FundingCoin))
            .count();
        match self.funding {
            Some(_) => refs == 1,
            None => refs == 0,
        }
    }

    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}
