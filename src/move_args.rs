//! Turning text typed by a user into call arguments for a module function.
//!
//! Coercion is best-effort by default: values are shaped into JSON the node
//! and wallet accept, without checking them against the declared type. With
//! strict checking enabled, [`check_argument`] validates each value against
//! its parsed [`MoveType`] first.

use serde_json::Value;

use crate::abi::{ExposedFunction, MoveType, UIntWidth};
use crate::error::{ExplorerError, Result};
use crate::node_rpc::ViewRequest;
use crate::wallet::EntryPayload;

const U256_MAX: &str =
    "115792089237316195423570985008687907853269984665640564039457584007913129639935";

/// Shape a raw argument string into a JSON call argument.
///
/// In order: `[`/`{` prefixed text is parsed as JSON (kept as a string when it
/// does not parse), `true`/`false` become booleans, digit strings stay
/// strings so u64/u128 values keep their precision, and everything else
/// (addresses, text) passes through.
pub fn coerce_argument(raw: &str) -> Value {
    if raw.starts_with('[') || raw.starts_with('{') {
        return serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(raw.to_string()),
    }
}

/// Hint text for an argument input of the given type.
///
/// Checked on the parsed type, outermost kind first: any `address` gives
/// `0x...`, then vector, integer, bool and string. So `vector<u64>` gets the
/// list hint rather than `0`, unlike a substring match on the raw type text
/// where `u64` would win.
pub fn suggest_placeholder(hint: &MoveType) -> &'static str {
    if hint.mentions_address() {
        return "0x...";
    }
    match hint.dereferenced() {
        MoveType::Vector(_) => "[value1, value2]",
        MoveType::UInt(_) => "0",
        MoveType::Bool => "true or false",
        t if contains(t, &|t| matches!(t, MoveType::Str)) => "text",
        _ => "value",
    }
}

/// Placeholder for a raw ABI type string; unparseable types get `value`.
pub fn suggest_placeholder_for(type_str: &str) -> &'static str {
    MoveType::parse(type_str)
        .map(|t| suggest_placeholder(&t))
        .unwrap_or("value")
}

/// Hint text for the `index`-th generic slot.
pub fn type_argument_placeholder(index: usize) -> String {
    format!(
        "Type argument {} (e.g., 0x1::aptos_coin::AptosCoin)",
        index + 1
    )
}

fn contains(ty: &MoveType, pred: &dyn Fn(&MoveType) -> bool) -> bool {
    if pred(ty) {
        return true;
    }
    match ty {
        MoveType::Vector(inner) | MoveType::Reference { inner, .. } => contains(inner, pred),
        MoveType::Struct { type_args, .. } => type_args.iter().any(|t| contains(t, pred)),
        _ => false,
    }
}

/// Validate a raw argument against its declared type.
///
/// Structs and generics are accepted as-is; the node is the authority there.
pub fn check_argument(raw: &str, hint: &MoveType) -> Result<()> {
    let invalid = |reason: &str| ExplorerError::InvalidArgument {
        type_name: hint.to_string(),
        reason: reason.to_string(),
    };

    match hint.dereferenced() {
        MoveType::Bool => match raw {
            "true" | "false" => Ok(()),
            _ => Err(invalid("expected true or false")),
        },
        MoveType::UInt(width) => check_uint(raw, *width).map_err(|r| invalid(&r)),
        MoveType::Address => {
            let ok = raw.strip_prefix("0x").is_some_and(|hex| {
                !hex.is_empty() && hex.len() <= 64 && hex.bytes().all(|b| b.is_ascii_hexdigit())
            });
            if ok {
                Ok(())
            } else {
                Err(invalid("expected 0x followed by up to 64 hex digits"))
            }
        }
        MoveType::Vector(inner) => {
            if matches!(**inner, MoveType::UInt(UIntWidth::U8)) && raw.starts_with("0x") {
                let hex = &raw[2..];
                return if hex.len() % 2 == 0 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                    Ok(())
                } else {
                    Err(invalid("expected an even number of hex digits"))
                };
            }
            let items = match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(items)) => items,
                _ => return Err(invalid("expected a JSON array")),
            };
            for item in &items {
                let text = match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                check_argument(&text, inner)?;
            }
            Ok(())
        }
        MoveType::Signer => Err(invalid("signer arguments are supplied by the wallet")),
        MoveType::Str | MoveType::Struct { .. } | MoveType::Generic(_) => Ok(()),
        MoveType::Reference { .. } => Ok(()),
    }
}

fn check_uint(raw: &str, width: UIntWidth) -> std::result::Result<(), String> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err("expected an unsigned integer".to_string());
    }
    let fits = match width {
        UIntWidth::U256 => {
            let digits = raw.trim_start_matches('0');
            digits.len() < U256_MAX.len()
                || (digits.len() == U256_MAX.len() && digits <= U256_MAX)
        }
        _ => raw
            .parse::<u128>()
            .map(|v| width.bits() == 128 || v < (1u128 << width.bits()))
            .unwrap_or(false),
    };
    if fits {
        Ok(())
    } else {
        Err(format!("value does not fit in u{}", width.bits()))
    }
}

/// Which side a call goes to: the node for views, the wallet for entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallPath {
    View,
    Entry,
}

impl CallPath {
    pub fn as_str(self) -> &'static str {
        match self {
            CallPath::View => "view",
            CallPath::Entry => "entry",
        }
    }
}

/// A module function call with its user input, ready for either path.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedCall {
    pub function_id: String,
    pub is_view: bool,
    pub is_entry: bool,
    /// Declared types of the value parameters (signers removed).
    pub param_types: Vec<String>,
    /// One raw entry per generic slot.
    pub type_arguments: Vec<String>,
    /// One raw entry per value parameter.
    pub arguments: Vec<String>,
}

impl PreparedCall {
    /// Align raw input with the function's parameters.
    ///
    /// Extra arguments are dropped, missing ones are empty. Generic slots get
    /// the same treatment against `generic_type_params`.
    pub fn new(
        address: &str,
        module: &str,
        function: &ExposedFunction,
        type_arguments: Vec<String>,
        arguments: Vec<String>,
    ) -> Self {
        let param_types: Vec<String> = function
            .value_params()
            .into_iter()
            .map(str::to_string)
            .collect();
        Self {
            function_id: function.function_id(address, module),
            is_view: function.is_view,
            is_entry: function.is_entry,
            type_arguments: resize(type_arguments, function.generic_type_params.len()),
            arguments: resize(arguments, param_types.len()),
            param_types,
        }
    }

    fn non_empty_type_arguments(&self) -> Vec<String> {
        self.type_arguments
            .iter()
            .filter(|t| !t.is_empty())
            .cloned()
            .collect()
    }

    /// Read-only request: raw strings, empty ones removed.
    pub fn view_request(&self) -> ViewRequest {
        ViewRequest {
            function: self.function_id.clone(),
            type_arguments: self.non_empty_type_arguments(),
            arguments: self
                .arguments
                .iter()
                .filter(|a| !a.is_empty())
                .cloned()
                .collect(),
        }
    }

    /// Submission payload: every positional argument coerced.
    pub fn entry_payload(&self) -> EntryPayload {
        EntryPayload {
            function: self.function_id.clone(),
            type_arguments: self.non_empty_type_arguments(),
            function_arguments: self.arguments.iter().map(|a| coerce_argument(a)).collect(),
        }
    }

    /// Path a run takes. A function flagged both view and entry is run as a
    /// view; one flagged neither cannot be run.
    pub fn path(&self) -> Option<CallPath> {
        if self.is_view {
            Some(CallPath::View)
        } else if self.is_entry {
            Some(CallPath::Entry)
        } else {
            None
        }
    }

    /// Fail unless a run would take `requested`.
    pub fn ensure_path(&self, requested: CallPath) -> Result<()> {
        match self.path() {
            Some(actual) if actual == requested => Ok(()),
            Some(actual) => Err(ExplorerError::PathMismatch {
                function: self.function_id.clone(),
                requested: requested.as_str(),
                actual: actual.as_str(),
            }),
            None => Err(ExplorerError::NotCallable(self.function_id.clone())),
        }
    }

    /// Validate every argument against its declared type.
    pub fn check_arguments(&self) -> Result<()> {
        for (raw, type_str) in self.arguments.iter().zip(&self.param_types) {
            let ty = MoveType::parse(type_str)?;
            check_argument(raw, &ty)?;
        }
        Ok(())
    }
}

fn resize(mut values: Vec<String>, len: usize) -> Vec<String> {
    values.resize(len, String::new());
    values
}
