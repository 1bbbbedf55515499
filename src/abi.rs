//! Module ABIs as served by the node, and the Move type grammar used to
//! interpret their parameter strings.
//!
//! Parameter types arrive as plain strings (`"&signer"`, `"u64"`,
//! `"vector<0x1::string::String>"`). They are parsed once into [`MoveType`]
//! so that argument hints and coercion work on structure instead of
//! substring matches.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{ExplorerError, Result};

/// Module ABI (`GET /accounts/{addr}/modules` -> `[].abi`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDescriptor {
    pub address: String,
    pub name: String,
    #[serde(default)]
    pub friends: Vec<String>,
    #[serde(default)]
    pub exposed_functions: Vec<ExposedFunction>,
    #[serde(default)]
    pub structs: Vec<StructDescriptor>,
}

impl ModuleDescriptor {
    pub fn find_function(&self, name: &str) -> Option<&ExposedFunction> {
        self.exposed_functions.iter().find(|f| f.name == name)
    }

    /// Functions that can be run from the explorer (view or entry).
    pub fn callable_functions(&self) -> impl Iterator<Item = &ExposedFunction> {
        self.exposed_functions.iter().filter(|f| f.is_callable())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GenericTypeParam {
    #[serde(default)]
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExposedFunction {
    pub name: String,
    pub visibility: String,
    pub is_entry: bool,
    pub is_view: bool,
    #[serde(default)]
    pub generic_type_params: Vec<GenericTypeParam>,
    #[serde(default)]
    pub params: Vec<String>,
    #[serde(rename = "return", default)]
    pub returns: Vec<String>,
}

impl ExposedFunction {
    /// Parameters the caller must fill in.
    ///
    /// `signer` and `&signer` are supplied by the wallet and dropped; the
    /// remaining order lines up with user argument strings.
    pub fn value_params(&self) -> Vec<&str> {
        self.params
            .iter()
            .map(String::as_str)
            .filter(|p| !is_implicit_signer(p))
            .collect()
    }

    /// [`value_params`](Self::value_params), parsed.
    pub fn parsed_value_params(&self) -> Result<Vec<MoveType>> {
        self.value_params().into_iter().map(MoveType::parse).collect()
    }

    pub fn is_callable(&self) -> bool {
        self.is_view || self.is_entry
    }

    /// `address::module::name`
    pub fn function_id(&self, address: &str, module: &str) -> String {
        format!("{}::{}::{}", address, module, self.name)
    }

    /// Short signature for listings, e.g. `transfer<T0>(address, u64)`.
    pub fn signature(&self) -> String {
        let generics = if self.generic_type_params.is_empty() {
            String::new()
        } else {
            let names: Vec<String> = (0..self.generic_type_params.len())
                .map(|i| format!("T{i}"))
                .collect();
            format!("<{}>", names.join(", "))
        };
        let mut sig = format!("{}{}({})", self.name, generics, self.value_params().join(", "));
        if !self.returns.is_empty() {
            sig.push_str(&format!(": {}", self.returns.join(", ")));
        }
        sig
    }
}

pub fn is_implicit_signer(param: &str) -> bool {
    param == "signer" || param == "&signer"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructDescriptor {
    pub name: String,
    pub is_native: bool,
    #[serde(default)]
    pub abilities: Vec<String>,
    #[serde(default)]
    pub generic_type_params: Vec<GenericTypeParam>,
    #[serde(default)]
    pub fields: Vec<StructField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UIntWidth {
    U8,
    U16,
    U32,
    U64,
    U128,
    U256,
}

impl UIntWidth {
    pub fn bits(self) -> u16 {
        match self {
            UIntWidth::U8 => 8,
            UIntWidth::U16 => 16,
            UIntWidth::U32 => 32,
            UIntWidth::U64 => 64,
            UIntWidth::U128 => 128,
            UIntWidth::U256 => 256,
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "u8" => Some(UIntWidth::U8),
            "u16" => Some(UIntWidth::U16),
            "u32" => Some(UIntWidth::U32),
            "u64" => Some(UIntWidth::U64),
            "u128" => Some(UIntWidth::U128),
            "u256" => Some(UIntWidth::U256),
            _ => None,
        }
    }
}

/// Parsed Move type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MoveType {
    Bool,
    UInt(UIntWidth),
    Address,
    Signer,
    Vector(Box<MoveType>),
    /// `0x1::string::String`
    Str,
    Struct {
        address: String,
        module: String,
        name: String,
        type_args: Vec<MoveType>,
    },
    /// Function type parameter `T{index}`
    Generic(u16),
    Reference {
        mutable: bool,
        inner: Box<MoveType>,
    },
}

impl MoveType {
    /// Parse an ABI type string.
    pub fn parse(input: &str) -> Result<MoveType> {
        let mut parser = TypeParser {
            input,
            pos: 0,
            depth: 0,
        };
        let ty = parser.parse_type()?;
        parser.skip_ws();
        if parser.pos != input.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(ty)
    }

    /// Strip references: `&mut vector<u8>` -> `vector<u8>`.
    pub fn dereferenced(&self) -> &MoveType {
        match self {
            MoveType::Reference { inner, .. } => inner.dereferenced(),
            other => other,
        }
    }

    pub fn is_signer(&self) -> bool {
        matches!(self.dereferenced(), MoveType::Signer)
    }

    /// True if an `address` appears anywhere in the type.
    pub fn mentions_address(&self) -> bool {
        match self {
            MoveType::Address => true,
            MoveType::Vector(inner) => inner.mentions_address(),
            MoveType::Reference { inner, .. } => inner.mentions_address(),
            MoveType::Struct { type_args, .. } => type_args.iter().any(MoveType::mentions_address),
            _ => false,
        }
    }
}

impl fmt::Display for MoveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveType::Bool => write!(f, "bool"),
            MoveType::UInt(w) => write!(f, "u{}", w.bits()),
            MoveType::Address => write!(f, "address"),
            MoveType::Signer => write!(f, "signer"),
            MoveType::Vector(inner) => write!(f, "vector<{inner}>"),
            MoveType::Str => write!(f, "0x1::string::String"),
            MoveType::Struct {
                address,
                module,
                name,
                type_args,
            } => {
                write!(f, "{address}::{module}::{name}")?;
                if !type_args.is_empty() {
                    let args: Vec<String> = type_args.iter().map(|t| t.to_string()).collect();
                    write!(f, "<{}>", args.join(", "))?;
                }
                Ok(())
            }
            MoveType::Generic(i) => write!(f, "T{i}"),
            MoveType::Reference { mutable, inner } => {
                if *mutable {
                    write!(f, "&mut {inner}")
                } else {
                    write!(f, "&{inner}")
                }
            }
        }
    }
}

impl std::str::FromStr for MoveType {
    type Err = ExplorerError;
    fn from_str(s: &str) -> Result<Self> {
        MoveType::parse(s)
    }
}

/// Recursive-descent parser over the ABI type syntax.
/// Deepest nesting of references, vectors and struct type arguments a type
/// may have.
const MAX_TYPE_DEPTH: usize = 64;

struct TypeParser<'a> {
    input: &'a str,
    pos: usize,
    depth: usize,
}

impl<'a> TypeParser<'a> {
    fn error(&self, reason: &str) -> ExplorerError {
        ExplorerError::TypeParse {
            input: self.input.to_string(),
            offset: self.pos,
            reason: reason.to_string(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<()> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(&format!("expected `{token}`")))
        }
    }

    /// `[A-Za-z0-9_]+`
    fn word(&mut self) -> Result<&'a str> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .bytes()
            .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
            .count();
        if len == 0 {
            return Err(self.error("expected identifier"));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn parse_type(&mut self) -> Result<MoveType> {
        if self.depth >= MAX_TYPE_DEPTH {
            return Err(self.error("type nested too deeply"));
        }
        self.depth += 1;
        let parsed = self.parse_type_at_depth();
        self.depth -= 1;
        parsed
    }

    fn parse_type_at_depth(&mut self) -> Result<MoveType> {
        if self.eat("&") {
            let mutable = self.eat_keyword("mut");
            let inner = self.parse_type()?;
            return Ok(MoveType::Reference {
                mutable,
                inner: Box::new(inner),
            });
        }

        let start = self.pos;
        let word = self.word()?;

        if self.eat("::") {
            return self.parse_struct(word);
        }

        if let Some(width) = UIntWidth::from_keyword(word) {
            return Ok(MoveType::UInt(width));
        }
        match word {
            "bool" => Ok(MoveType::Bool),
            "address" => Ok(MoveType::Address),
            "signer" => Ok(MoveType::Signer),
            "vector" => {
                self.expect("<")?;
                let inner = self.parse_type()?;
                self.expect(">")?;
                Ok(MoveType::Vector(Box::new(inner)))
            }
            generic if is_generic_name(generic) => generic[1..]
                .parse::<u16>()
                .map(MoveType::Generic)
                .map_err(|_| self.error("generic index out of range")),
            _ => {
                self.pos = start;
                Err(self.error(&format!("unknown type `{word}`")))
            }
        }
    }

    /// `mut` followed by whitespace; avoids eating the prefix of `mutex`.
    fn eat_keyword(&mut self, keyword: &str) -> bool {
        self.skip_ws();
        let rest = self.rest();
        if let Some(after) = rest.strip_prefix(keyword) {
            if after.starts_with(char::is_whitespace) {
                self.pos += keyword.len();
                return true;
            }
        }
        false
    }

    fn parse_struct(&mut self, address: &'a str) -> Result<MoveType> {
        let module = self.word()?;
        self.expect("::")?;
        let name = self.word()?;

        let mut type_args = Vec::new();
        if self.eat("<") {
            loop {
                type_args.push(self.parse_type()?);
                if self.eat(",") {
                    continue;
                }
                self.expect(">")?;
                break;
            }
        }

        if is_string_module(address, module, name) && type_args.is_empty() {
            return Ok(MoveType::Str);
        }
        Ok(MoveType::Struct {
            address: address.to_string(),
            module: module.to_string(),
            name: name.to_string(),
            type_args,
        })
    }
}

fn is_generic_name(word: &str) -> bool {
    word.len() > 1 && word.starts_with('T') && word[1..].bytes().all(|b| b.is_ascii_digit())
}

fn is_string_module(address: &str, module: &str, name: &str) -> bool {
    let addr = address.trim_start_matches("0x").trim_start_matches('0');
    (addr == "1" || address == "std") && module == "string" && name == "String"
}
