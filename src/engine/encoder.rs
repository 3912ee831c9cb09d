//! Call encoding: a typed proposal request becomes a ledger-native
//! contract invocation. Pure, no network access.

use thiserror::Error;

use crate::strkey::{self, StrkeyError};
use crate::xdr::{ScAddress, ScVal};

/// Contract entry point invoked by every proposal.
pub const PROPOSE_TRANSFER_FN: &str = "propose_transfer";

#[derive(Debug, Error)]
pub enum EncodingError {
    #[error("invalid {field} address: {source}")]
    Address {
        field: &'static str,
        #[source]
        source: StrkeyError,
    },
    #[error("invalid vault contract id: {0}")]
    Contract(#[source] StrkeyError),
    #[error("invalid amount {literal:?}: {reason}")]
    Amount {
        literal: String,
        reason: &'static str,
    },
}

/// One treasury transfer proposal, as entered by the caller. Amounts travel
/// as decimal strings end to end so no floating-point representation ever
/// touches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRequest {
    pub proposer: String,
    pub recipient: String,
    pub token: String,
    pub amount: String,
    pub memo: String,
}

/// An encoded contract call: target, function symbol, ordered typed
/// arguments. Built once per proposal and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub contract: ScAddress,
    pub function: &'static str,
    pub args: Vec<ScVal>,
}

/// Parse a proposal amount into the ledger's wide integer type.
///
/// Only plain non-negative decimal literals are accepted; anything that
/// would lose precision or truncate is an error, never a silent clamp.
pub fn parse_amount(literal: &str) -> Result<i128, EncodingError> {
    if literal.is_empty() {
        return Err(EncodingError::Amount {
            literal: literal.to_string(),
            reason: "empty string",
        });
    }
    if !literal.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EncodingError::Amount {
            literal: literal.to_string(),
            reason: "contains non-digit characters",
        });
    }
    literal.parse::<i128>().map_err(|_| EncodingError::Amount {
        literal: literal.to_string(),
        reason: "exceeds the 128-bit integer range",
    })
}

/// Encode a proposal into the vault contract's `propose_transfer` call.
///
/// Argument order is fixed by the contract: proposer, recipient, token,
/// amount, memo. The memo is passed as a symbol without length or charset
/// validation; the ledger enforces its own limits on it.
pub fn encode_invocation(
    contract_id: &str,
    request: &ProposalRequest,
) -> Result<Invocation, EncodingError> {
    let contract = strkey::decode_contract(contract_id).map_err(EncodingError::Contract)?;
    let proposer = account_arg("proposer", &request.proposer)?;
    let recipient = account_arg("recipient", &request.recipient)?;
    let token = address_arg("token", &request.token)?;
    let amount = parse_amount(&request.amount)?;

    Ok(Invocation {
        contract: ScAddress::Contract(contract),
        function: PROPOSE_TRANSFER_FN,
        args: vec![
            proposer,
            recipient,
            token,
            ScVal::I128(amount),
            ScVal::Symbol(request.memo.clone()),
        ],
    })
}

fn account_arg(field: &'static str, address: &str) -> Result<ScVal, EncodingError> {
    let key = strkey::decode_account(address)
        .map_err(|source| EncodingError::Address { field, source })?;
    Ok(ScVal::Address(ScAddress::Account(key)))
}

/// Token may be a classic asset contract or any other contract, so both
/// strkey kinds are acceptable here.
fn address_arg(field: &'static str, address: &str) -> Result<ScVal, EncodingError> {
    let decoded =
        strkey::decode(address).map_err(|source| EncodingError::Address { field, source })?;
    Ok(ScVal::Address(match decoded {
        strkey::Strkey::AccountEd25519(key) => ScAddress::Account(key),
        strkey::Strkey::Contract(hash) => ScAddress::Contract(hash),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strkey::{encode_account, encode_contract};

    fn sample_request() -> ProposalRequest {
        ProposalRequest {
            proposer: encode_account(&[1u8; 32]),
            recipient: encode_account(&[2u8; 32]),
            token: encode_contract(&[3u8; 32]),
            amount: "1000000".to_string(),
            memo: "payout".to_string(),
        }
    }

    #[test]
    fn encodes_args_in_contract_order() {
        let contract_id = encode_contract(&[9u8; 32]);
        let invocation = encode_invocation(&contract_id, &sample_request()).unwrap();

        assert_eq!(invocation.function, "propose_transfer");
        assert_eq!(invocation.contract, ScAddress::Contract([9u8; 32]));
        assert_eq!(invocation.args.len(), 5);
        assert_eq!(
            invocation.args[0],
            ScVal::Address(ScAddress::Account([1u8; 32]))
        );
        assert_eq!(
            invocation.args[1],
            ScVal::Address(ScAddress::Account([2u8; 32]))
        );
        assert_eq!(
            invocation.args[2],
            ScVal::Address(ScAddress::Contract([3u8; 32]))
        );
        assert_eq!(invocation.args[3], ScVal::I128(1_000_000));
        assert_eq!(invocation.args[4], ScVal::Symbol("payout".to_string()));
    }

    #[test]
    fn amount_round_trips_wide_values() {
        assert_eq!(parse_amount("0").unwrap(), 0);
        assert_eq!(parse_amount("1000000").unwrap(), 1_000_000);
        // Larger than u64, still exact.
        assert_eq!(
            parse_amount("170141183460469231731687303715884105727").unwrap(),
            i128::MAX
        );
    }

    #[test]
    fn amount_rejects_non_digits_and_overflow() {
        assert!(matches!(
            parse_amount("abc"),
            Err(EncodingError::Amount { reason: "contains non-digit characters", .. })
        ));
        assert!(matches!(
            parse_amount("-5"),
            Err(EncodingError::Amount { reason: "contains non-digit characters", .. })
        ));
        assert!(matches!(
            parse_amount("12.5"),
            Err(EncodingError::Amount { reason: "contains non-digit characters", .. })
        ));
        assert!(matches!(
            parse_amount(""),
            Err(EncodingError::Amount { reason: "empty string", .. })
        ));
        // i128::MAX + 1 must not silently truncate.
        assert!(matches!(
            parse_amount("170141183460469231731687303715884105728"),
            Err(EncodingError::Amount { reason: "exceeds the 128-bit integer range", .. })
        ));
    }

    #[test]
    fn rejects_malformed_addresses_per_field() {
        let contract_id = encode_contract(&[9u8; 32]);

        let mut request = sample_request();
        request.recipient = "not-an-address".to_string();
        assert!(matches!(
            encode_invocation(&contract_id, &request),
            Err(EncodingError::Address { field: "recipient", .. })
        ));

        // An account strkey is not a valid contract id.
        let account_as_contract = encode_account(&[4u8; 32]);
        assert!(matches!(
            encode_invocation(&account_as_contract, &sample_request()),
            Err(EncodingError::Contract(_))
        ));
    }

    #[test]
    fn token_accepts_both_strkey_kinds() {
        let contract_id = encode_contract(&[9u8; 32]);
        let mut request = sample_request();
        request.token = encode_account(&[5u8; 32]);
        let invocation = encode_invocation(&contract_id, &request).unwrap();
        assert_eq!(
            invocation.args[2],
            ScVal::Address(ScAddress::Account([5u8; 32]))
        );
    }
}
