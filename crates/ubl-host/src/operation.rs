//! The operation table.
//!
//! Operations arrive as a function name plus positional string arguments.
//! Parsing checks the name and the argument count before any state is
//! touched.

use crate::error::{HostError, HostResult};

/// Name, accepted aliases, and parameter names of one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub params: &'static [&'static str],
    /// Whether the operation can stage writes.
    pub writes: bool,
}

impl Signature {
    fn matches(&self, function: &str) -> bool {
        self.name == function || self.aliases.contains(&function)
    }
}

/// Every operation the host understands.
pub const SIGNATURES: &[Signature] = &[
    Signature {
        name: "InitializeLedger",
        aliases: &["InitLedger"],
        params: &[],
        writes: true,
    },
    Signature {
        name: "UserExists",
        aliases: &[],
        params: &["id"],
        writes: false,
    },
    Signature {
        name: "CreateUser",
        aliases: &[],
        params: &["id", "name", "address"],
        writes: true,
    },
    Signature {
        name: "GetUser",
        aliases: &[],
        params: &["id"],
        writes: false,
    },
    Signature {
        name: "UpdateUser",
        aliases: &[],
        params: &["id", "name", "address"],
        writes: true,
    },
    Signature {
        name: "DeleteUser",
        aliases: &[],
        params: &["id"],
        writes: true,
    },
    Signature {
        name: "ListAllUsers",
        aliases: &["GetAllUsers"],
        params: &[],
        writes: false,
    },
    Signature {
        name: "CreateTransaction",
        aliases: &[],
        params: &["userId", "hash", "amount", "currency", "date", "bankId"],
        writes: true,
    },
    Signature {
        name: "ResolveUserByTransaction",
        aliases: &[],
        params: &["hash"],
        writes: false,
    },
    Signature {
        name: "GetBankById",
        aliases: &[],
        params: &["bankId"],
        writes: false,
    },
];

/// Look up a signature by name or alias.
pub fn signature(function: &str) -> Option<&'static Signature> {
    SIGNATURES.iter().find(|s| s.matches(function))
}

/// A parsed operation, ready to dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    InitializeLedger,
    UserExists {
        id: String,
    },
    CreateUser {
        id: String,
        name: String,
        address: String,
    },
    GetUser {
        id: String,
    },
    UpdateUser {
        id: String,
        name: String,
        address: String,
    },
    DeleteUser {
        id: String,
    },
    ListAllUsers,
    CreateTransaction {
        user_id: String,
        hash: String,
        amount: String,
        currency: String,
        date: String,
        bank_id: String,
    },
    ResolveUserByTransaction {
        hash: String,
    },
    GetBankById {
        bank_id: String,
    },
}

impl Operation {
    /// Parse `function` and its positional `args`.
    pub fn parse<A: AsRef<str>>(function: &str, args: &[A]) -> HostResult<Self> {
        let sig =
            signature(function).ok_or_else(|| HostError::UnknownFunction(function.to_string()))?;
        let arity = || HostError::Arity {
            function: sig.name.to_string(),
            expected: sig.params.len(),
            actual: args.len(),
        };
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();

        let op = match (sig.name, args.as_slice()) {
            ("InitializeLedger", []) => Operation::InitializeLedger,
            ("UserExists", [id]) => Operation::UserExists { id: id.clone() },
            ("CreateUser", [id, name, address]) => Operation::CreateUser {
                id: id.clone(),
                name: name.clone(),
                address: address.clone(),
            },
            ("GetUser", [id]) => Operation::GetUser { id: id.clone() },
            ("UpdateUser", [id, name, address]) => Operation::UpdateUser {
                id: id.clone(),
                name: name.clone(),
                address: address.clone(),
            },
            ("DeleteUser", [id]) => Operation::DeleteUser { id: id.clone() },
            ("ListAllUsers", []) => Operation::ListAllUsers,
            ("CreateTransaction", [user_id, hash, amount, currency, date, bank_id]) => {
                Operation::CreateTransaction {
                    user_id: user_id.clone(),
                    hash: hash.clone(),
                    amount: amount.clone(),
                    currency: currency.clone(),
                    date: date.clone(),
                    bank_id: bank_id.clone(),
                }
            }
            ("ResolveUserByTransaction", [hash]) => {
                Operation::ResolveUserByTransaction { hash: hash.clone() }
            }
            ("GetBankById", [bank_id]) => Operation::GetBankById {
                bank_id: bank_id.clone(),
            },
            _ => return Err(arity()),
        };
        Ok(op)
    }

    /// Canonical operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::InitializeLedger => "InitializeLedger",
            Operation::UserExists { .. } => "UserExists",
            Operation::CreateUser { .. } => "CreateUser",
            Operation::GetUser { .. } => "GetUser",
            Operation::UpdateUser { .. } => "UpdateUser",
            Operation::DeleteUser { .. } => "DeleteUser",
            Operation::ListAllUsers => "ListAllUsers",
            Operation::CreateTransaction { .. } => "CreateTransaction",
            Operation::ResolveUserByTransaction { .. } => "ResolveUserByTransaction",
            Operation::GetBankById { .. } => "GetBankById",
        }
    }
}
